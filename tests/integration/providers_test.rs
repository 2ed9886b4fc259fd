//! Provider and Registry Integration Tests
//!
//! Provider availability and isolation through the orchestrator's public
//! operations, and registry lookup stability.

use std::sync::Arc;

use builder_agent::{ChatErrorKind, ChatTurn, HistoryEntry, ProviderSet};
use builder_agent_core::Project;
use builder_agent_llm::{ProviderConfig, ProviderType};
use builder_agent_tools::{default_registry, Collaborators};

use crate::support::{budget, harness, image_then_reflect, text, MockProvider};

#[tokio::test]
async fn test_disabling_one_provider_leaves_the_other() {
    let anthropic = Arc::new(MockProvider::new(ProviderType::Anthropic, vec![]));
    let openai = Arc::new(MockProvider::new(
        ProviderType::OpenAI,
        vec![text("Still here.")],
    ));
    let h = harness(
        image_then_reflect(1),
        vec![anthropic.clone(), openai.clone()],
        budget(10),
    );
    assert_eq!(
        h.orchestrator.get_available_providers(),
        vec![ProviderType::Anthropic, ProviderType::OpenAI]
    );

    h.orchestrator
        .set_provider_credential(ProviderType::Anthropic, None);
    assert_eq!(
        h.orchestrator.get_available_providers(),
        vec![ProviderType::OpenAI]
    );

    let refused = h
        .orchestrator
        .chat(ChatTurn::new("hi", Project::default()).with_provider(ProviderType::Anthropic))
        .await;
    assert_eq!(refused.error_kind(), Some(ChatErrorKind::ProviderUnavailable));
    assert_eq!(anthropic.request_count(), 0);

    // Prior history still works on the remaining provider.
    let history = vec![
        HistoryEntry::user("hi"),
        HistoryEntry::assistant("hello", vec![]),
    ];
    let response = h
        .orchestrator
        .chat(
            ChatTurn::new("continue", Project::default())
                .with_history(history)
                .with_provider(ProviderType::OpenAI),
        )
        .await;
    assert!(response.success);
    assert_eq!(openai.requests()[0].messages.len(), 3);
}

#[test]
fn test_set_current_provider_requires_availability() {
    let openai = Arc::new(MockProvider::new(ProviderType::OpenAI, vec![]));
    let h = harness(image_then_reflect(1), vec![openai], budget(10));

    assert_eq!(h.orchestrator.get_current_provider(), ProviderType::OpenAI);
    assert!(!h.orchestrator.set_current_provider(ProviderType::DeepSeek));
    assert_eq!(h.orchestrator.get_current_provider(), ProviderType::OpenAI);
}

#[test]
fn test_credentials_decide_availability() {
    let configs = vec![
        ProviderConfig::for_provider(ProviderType::Anthropic),
        ProviderConfig {
            api_key: Some("sk-test".to_string()),
            ..ProviderConfig::for_provider(ProviderType::DeepSeek)
        },
    ];
    let set = ProviderSet::from_configs(configs, None);
    assert_eq!(set.available(), vec![ProviderType::DeepSeek]);
    assert_eq!(set.current(), ProviderType::DeepSeek);
}

#[test]
fn test_action_budget_operations() {
    let h = harness(image_then_reflect(1), vec![], budget(10));
    let status = h.orchestrator.get_action_budget();
    assert_eq!((status.total, status.used, status.remaining), (10, 0, 10));

    h.orchestrator.set_action_budget(4);
    assert_eq!(h.orchestrator.get_action_budget().remaining, 4);
}

#[test]
fn test_registry_lookup_is_stable() {
    let registry = default_registry(&Collaborators::new()).unwrap();
    let first = registry.get("create_plan").unwrap().clone();
    let second = registry.get("create_plan").unwrap().clone();
    assert_eq!(first.definition, second.definition);
    assert!(std::ptr::eq(
        registry.get("create_plan").unwrap(),
        registry.get("create_plan").unwrap()
    ));
    assert!(registry.get("generate_image").is_none());
}
