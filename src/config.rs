//! Agent Configuration
//!
//! TOML configuration for the orchestrator, its providers, and the batch
//! loop. Every field has a default, so an empty file is valid. Provider
//! credentials fall back to the provider's environment variable.
//!
//! ```toml
//! default_provider = "anthropic"
//! action_budget = 10
//! max_continuations = 8
//!
//! [providers.anthropic]
//! model = "claude-sonnet-4-20250514"
//!
//! [batch]
//! max_iterations = 10
//! auto_switch_provider = true
//! ```

use std::collections::{BTreeMap, HashMap};
use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use builder_agent_llm::{ProviderConfig, ProviderType};

use crate::batch::BatchOptions;
use crate::budget::DEFAULT_ACTION_BUDGET;
use crate::error::{AgentError, AgentResult};
use crate::orchestrator::OrchestratorConfig;

/// Per-provider overrides. Unset fields keep the provider's defaults.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ProviderSection {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub base_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_tokens: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timeout_secs: Option<u64>,
    #[serde(default, skip_serializing_if = "HashMap::is_empty")]
    pub options: HashMap<String, serde_json::Value>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BatchSection {
    #[serde(default = "default_max_iterations")]
    pub max_iterations: u32,
    #[serde(default)]
    pub auto_switch_provider: bool,
}

fn default_max_iterations() -> u32 {
    10
}

impl Default for BatchSection {
    fn default() -> Self {
        Self {
            max_iterations: default_max_iterations(),
            auto_switch_provider: false,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AgentConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default_provider: Option<ProviderType>,
    #[serde(default = "default_action_budget")]
    pub action_budget: u32,
    #[serde(default = "default_max_continuations")]
    pub max_continuations: u32,
    #[serde(default)]
    pub providers: BTreeMap<ProviderType, ProviderSection>,
    #[serde(default)]
    pub batch: BatchSection,
}

fn default_action_budget() -> u32 {
    DEFAULT_ACTION_BUDGET
}

fn default_max_continuations() -> u32 {
    OrchestratorConfig::default().max_continuations
}

impl Default for AgentConfig {
    fn default() -> Self {
        Self {
            default_provider: None,
            action_budget: default_action_budget(),
            max_continuations: default_max_continuations(),
            providers: BTreeMap::new(),
            batch: BatchSection::default(),
        }
    }
}

impl AgentConfig {
    /// Parse and validate a TOML document.
    pub fn from_toml(content: &str) -> AgentResult<Self> {
        let config: AgentConfig = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// Load from a file.
    pub fn load(path: &Path) -> AgentResult<Self> {
        let content = fs::read_to_string(path)?;
        Self::from_toml(&content)
    }

    /// Load `path` if given, else the default location if it exists, else
    /// defaults.
    pub fn load_or_default(path: Option<&Path>) -> AgentResult<Self> {
        if let Some(path) = path {
            return Self::load(path);
        }
        match default_path() {
            Ok(path) if path.exists() => Self::load(&path),
            _ => Ok(Self::default()),
        }
    }

    pub fn validate(&self) -> AgentResult<()> {
        if self.max_continuations == 0 {
            return Err(AgentError::config("max_continuations must be at least 1"));
        }
        if self.batch.max_iterations == 0 {
            return Err(AgentError::config("batch.max_iterations must be at least 1"));
        }
        for (id, section) in &self.providers {
            if let Some(t) = section.temperature {
                if !(0.0..=2.0).contains(&t) {
                    return Err(AgentError::config(format!(
                        "providers.{}.temperature must be between 0.0 and 2.0, got {}",
                        id, t
                    )));
                }
            }
            if section.model.as_deref().map(str::trim) == Some("") {
                return Err(AgentError::config(format!(
                    "providers.{}.model must not be empty",
                    id
                )));
            }
        }
        Ok(())
    }

    /// Resolve every known provider, taking credentials from the process
    /// environment where the file has none.
    pub fn provider_configs(&self) -> Vec<ProviderConfig> {
        self.provider_configs_with(|var| std::env::var(var).ok())
    }

    /// Resolve every known provider with a custom environment lookup.
    pub fn provider_configs_with(&self, env: impl Fn(&str) -> Option<String>) -> Vec<ProviderConfig> {
        ProviderType::PREFERENCE
            .iter()
            .map(|id| {
                let section = self.providers.get(id).cloned().unwrap_or_default();
                let mut config = ProviderConfig::for_provider(*id);
                config.api_key = section
                    .api_key
                    .filter(|k| !k.trim().is_empty())
                    .or_else(|| env(id.credential_env_var()).filter(|k| !k.trim().is_empty()));
                config.base_url = section.base_url;
                if let Some(model) = section.model {
                    config.model = model;
                }
                if let Some(max_tokens) = section.max_tokens {
                    config.max_tokens = max_tokens;
                }
                if let Some(temperature) = section.temperature {
                    config.temperature = temperature;
                }
                if let Some(timeout) = section.timeout_secs {
                    config.timeout_secs = timeout;
                }
                config.options = section.options;
                config
            })
            .collect()
    }

    pub fn orchestrator_config(&self) -> OrchestratorConfig {
        OrchestratorConfig {
            action_budget: self.action_budget,
            max_continuations: self.max_continuations,
        }
    }

    pub fn batch_options(&self) -> BatchOptions {
        BatchOptions {
            max_iterations: self.batch.max_iterations,
            auto_switch_provider: self.batch.auto_switch_provider,
            provider: self.default_provider,
        }
    }
}

/// Default config file location (~/.builder-agent/config.toml).
pub fn default_path() -> AgentResult<PathBuf> {
    let home =
        dirs::home_dir().ok_or_else(|| AgentError::config("Could not determine home directory"))?;
    Ok(home.join(".builder-agent").join("config.toml"))
}
