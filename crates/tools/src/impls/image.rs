//! GenerateImage Tool Implementation
//!
//! Generates an image from a prompt, uploads it to the CDN when an uploader
//! is configured, and records it as a project asset.

use async_trait::async_trait;
use serde_json::{json, Value};
use std::collections::HashMap;
use std::sync::Arc;

use builder_agent_core::{new_id, Asset, AssetKind, ToolContext};
use builder_agent_llm::ParameterSchema;

use crate::collaborators::{AssetUploader, ImageGenerator};
use crate::executor::{ToolError, ToolOutput};
use crate::registry::{ContinuationCondition, ContinuationRule};
use crate::trait_def::Tool;

use super::{optional_str, required_str};

pub struct GenerateImageTool {
    images: Arc<dyn ImageGenerator>,
    uploader: Option<Arc<dyn AssetUploader>>,
    /// Whether `generate_component` is registered to chain into
    chain_to_component: bool,
}

impl GenerateImageTool {
    pub fn new(images: Arc<dyn ImageGenerator>) -> Self {
        Self {
            images,
            uploader: None,
            chain_to_component: false,
        }
    }

    pub fn with_uploader(mut self, uploader: Arc<dyn AssetUploader>) -> Self {
        self.uploader = Some(uploader);
        self
    }

    /// Chain into `generate_component` when the user asked for a component.
    pub fn chaining_to_component(mut self) -> Self {
        self.chain_to_component = true;
        self
    }
}

#[async_trait]
impl Tool for GenerateImageTool {
    fn name(&self) -> &str {
        "generate_image"
    }

    fn description(&self) -> &str {
        "Generate an image from a text prompt and add it to the project's assets. Returns the asset id and URL."
    }

    fn parameters_schema(&self) -> ParameterSchema {
        let mut properties = HashMap::new();
        properties.insert(
            "prompt".to_string(),
            ParameterSchema::string(Some("Detailed description of the image to generate")),
        );
        properties.insert(
            "style".to_string(),
            ParameterSchema::string(Some("Optional visual style, e.g. 'flat illustration' or 'photo'")),
        );
        ParameterSchema::object(
            Some("Image generation parameters"),
            properties,
            vec!["prompt".to_string()],
        )
    }

    fn continuation(&self) -> Option<ContinuationRule> {
        self.chain_to_component.then(|| {
            ContinuationRule::new("generate_component")
                .when(ContinuationCondition::IfComponentRequested)
                .max_chain(1)
                .carry("/url", "image_url")
        })
    }

    async fn execute(&self, ctx: &ToolContext, args: Value) -> Result<ToolOutput, ToolError> {
        let prompt = required_str(&args, "prompt")?;
        let style = optional_str(&args, "style");

        let image = self.images.generate(prompt, style).await?;
        let asset_id = new_id("asset");

        let url = match &self.uploader {
            Some(uploader) => {
                let file_name = format!("{}.{}", asset_id, extension(image.mime_type.as_deref()));
                uploader.upload(&image.url, &file_name).await?
            }
            None => image.url,
        };

        let asset = Asset {
            id: asset_id.clone(),
            kind: AssetKind::Image,
            url: url.clone(),
            prompt: Some(prompt.to_string()),
        };
        ctx.apply(Box::new(move |mut project| {
            project.assets.push(asset);
            project
        }));

        Ok(ToolOutput::with_data(
            format!("Generated image {}", asset_id),
            json!({ "asset_id": asset_id, "url": url, "prompt": prompt }),
        ))
    }
}

fn extension(mime_type: Option<&str>) -> &'static str {
    match mime_type {
        Some("image/jpeg") => "jpg",
        Some("image/webp") => "webp",
        Some("image/svg+xml") => "svg",
        _ => "png",
    }
}
