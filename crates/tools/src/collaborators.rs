//! External Collaborators
//!
//! Narrow async interfaces to the generators and services the built-in tools
//! call. The orchestration core does not implement any of them; an
//! application supplies whichever it has through [`Collaborators`], and the
//! catalog registers only the tools whose collaborators are present.

use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use builder_agent_core::Component;

use crate::executor::ToolError;

/// A generated image, referenced by URL or data URI.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GeneratedImage {
    pub url: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mime_type: Option<String>,
}

/// Input for component generation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ComponentRequest {
    pub name: String,
    pub description: String,
    /// Reference image to build the component from
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_url: Option<String>,
    /// Summary of the project the component belongs to
    pub project_summary: String,
}

/// Output of component generation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GeneratedComponent {
    pub name: String,
    pub code: String,
}

#[async_trait]
pub trait ImageGenerator: Send + Sync {
    async fn generate(&self, prompt: &str, style: Option<&str>) -> Result<GeneratedImage, ToolError>;
}

#[async_trait]
pub trait ComponentGenerator: Send + Sync {
    async fn generate(&self, request: ComponentRequest) -> Result<GeneratedComponent, ToolError>;

    /// Return the component's new source code after applying `instructions`.
    async fn edit(&self, component: &Component, instructions: &str) -> Result<String, ToolError>;
}

/// Uploads assets to a CDN.
#[async_trait]
pub trait AssetUploader: Send + Sync {
    /// Upload the asset at `source` (URL or data URI) and return its public URL.
    async fn upload(&self, source: &str, file_name: &str) -> Result<String, ToolError>;
}

/// Renders a component and returns an image URL or data URI.
#[async_trait]
pub trait ScreenshotCapture: Send + Sync {
    async fn capture(&self, component: &Component) -> Result<String, ToolError>;
}

/// Collaborators available to the built-in tools.
#[derive(Clone, Default)]
pub struct Collaborators {
    pub images: Option<Arc<dyn ImageGenerator>>,
    pub components: Option<Arc<dyn ComponentGenerator>>,
    pub uploader: Option<Arc<dyn AssetUploader>>,
    pub screenshots: Option<Arc<dyn ScreenshotCapture>>,
}

impl Collaborators {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_images(mut self, images: Arc<dyn ImageGenerator>) -> Self {
        self.images = Some(images);
        self
    }

    pub fn with_components(mut self, components: Arc<dyn ComponentGenerator>) -> Self {
        self.components = Some(components);
        self
    }

    pub fn with_uploader(mut self, uploader: Arc<dyn AssetUploader>) -> Self {
        self.uploader = Some(uploader);
        self
    }

    pub fn with_screenshots(mut self, screenshots: Arc<dyn ScreenshotCapture>) -> Self {
        self.screenshots = Some(screenshots);
        self
    }
}

impl std::fmt::Debug for Collaborators {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Collaborators")
            .field("images", &self.images.is_some())
            .field("components", &self.components.is_some())
            .field("uploader", &self.uploader.is_some())
            .field("screenshots", &self.screenshots.is_some())
            .finish()
    }
}
