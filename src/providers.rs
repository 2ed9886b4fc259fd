//! Provider Set
//!
//! The backends an orchestrator can dispatch to. A provider is available
//! when it has a usable credential and its client could be constructed.
//! Changing one provider's credential never affects the others.

use std::collections::BTreeMap;
use std::sync::Arc;

use builder_agent_llm::{create_provider, LlmProvider, ProviderConfig, ProviderType};

pub struct ProviderSet {
    configs: BTreeMap<ProviderType, ProviderConfig>,
    instances: BTreeMap<ProviderType, Arc<dyn LlmProvider>>,
    current: ProviderType,
}

impl ProviderSet {
    /// Empty set whose default is the first preferred provider.
    pub fn new() -> Self {
        Self {
            configs: BTreeMap::new(),
            instances: BTreeMap::new(),
            current: ProviderType::PREFERENCE[0],
        }
    }

    /// Build providers from configuration. Providers without a credential
    /// stay configured but unavailable.
    pub fn from_configs(configs: Vec<ProviderConfig>, default: Option<ProviderType>) -> Self {
        let mut set = Self::new();
        for config in configs {
            set.configure(config);
        }
        set.current = default
            .or_else(|| set.available().first().copied())
            .unwrap_or(ProviderType::PREFERENCE[0]);
        set
    }

    /// Register a ready-made provider, replacing any configured one of the
    /// same type.
    pub fn insert(&mut self, provider: Arc<dyn LlmProvider>) {
        let id = provider.provider_type();
        self.configs.insert(id, provider.config().clone());
        self.instances.insert(id, provider);
    }

    /// Store a configuration and (re)build its client.
    pub fn configure(&mut self, config: ProviderConfig) {
        let id = config.provider;
        self.instances.remove(&id);

        if config.has_credential() {
            match create_provider(config.clone()) {
                Ok(provider) => {
                    self.instances.insert(id, provider);
                }
                Err(e) => {
                    tracing::warn!(provider = %id, "failed to construct provider: {}", e);
                }
            }
        } else {
            tracing::debug!(provider = %id, "provider has no credential");
        }
        self.configs.insert(id, config);
    }

    /// Set or clear one provider's credential.
    pub fn set_credential(&mut self, id: ProviderType, api_key: Option<String>) {
        let mut config = self
            .configs
            .get(&id)
            .cloned()
            .unwrap_or_else(|| ProviderConfig::for_provider(id));
        config.api_key = api_key;
        self.configure(config);
    }

    pub fn get(&self, id: ProviderType) -> Option<Arc<dyn LlmProvider>> {
        self.instances.get(&id).cloned()
    }

    pub fn is_available(&self, id: ProviderType) -> bool {
        self.instances.contains_key(&id)
    }

    /// Available providers in preference order.
    pub fn available(&self) -> Vec<ProviderType> {
        ProviderType::PREFERENCE
            .iter()
            .copied()
            .filter(|id| self.is_available(*id))
            .collect()
    }

    pub fn current(&self) -> ProviderType {
        self.current
    }

    /// Switch the default provider. Refused when it is unavailable.
    pub fn set_current(&mut self, id: ProviderType) -> bool {
        if self.is_available(id) {
            self.current = id;
            true
        } else {
            false
        }
    }

    /// Next available provider after `after` in preference order, wrapping
    /// around and skipping `after` itself.
    pub fn next_available(&self, after: ProviderType) -> Option<ProviderType> {
        let order = ProviderType::PREFERENCE;
        let start = order.iter().position(|p| *p == after).unwrap_or(0);
        (1..order.len())
            .map(|offset| order[(start + offset) % order.len()])
            .find(|id| self.is_available(*id))
    }
}

impl Default for ProviderSet {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for ProviderSet {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProviderSet")
            .field("available", &self.available())
            .field("current", &self.current)
            .finish()
    }
}
