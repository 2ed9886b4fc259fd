//! Batch Loop Integration Tests

use std::sync::Arc;

use serde_json::json;

use builder_agent::{BatchOptions, BatchRunner, ChatErrorKind};
use builder_agent_core::Project;
use builder_agent_llm::ProviderType;

use crate::support::{
    budget, harness, image_then_reflect, network_error, text, tool_use, MockProvider,
};

fn messages(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| s.to_string()).collect()
}

#[tokio::test]
async fn test_batch_runs_every_message_with_history() {
    let provider = Arc::new(MockProvider::new(
        ProviderType::Anthropic,
        vec![text("First answer."), text("Second answer.")],
    ));
    let h = harness(image_then_reflect(1), vec![provider.clone()], budget(10));

    let report = BatchRunner::new(&h.orchestrator)
        .run(
            &messages(&["hello", "and again"]),
            Project::new("Test Project"),
            &BatchOptions::default(),
        )
        .await;

    assert_eq!(report.completed, 2);
    assert_eq!(report.iterations, 2);
    assert!(!report.stopped_by_budget);

    // The second request carries the first exchange as history.
    let second = &provider.requests()[1];
    assert_eq!(second.messages.len(), 3);
    assert_eq!(second.messages[1].text_content(), "First answer.");
}

#[tokio::test]
async fn test_auto_switch_retries_on_next_provider() {
    let anthropic = Arc::new(MockProvider::new(
        ProviderType::Anthropic,
        vec![network_error()],
    ));
    let openai = Arc::new(MockProvider::new(
        ProviderType::OpenAI,
        vec![text("Answered by OpenAI."), text("Still OpenAI.")],
    ));
    let h = harness(
        image_then_reflect(1),
        vec![anthropic.clone(), openai.clone()],
        budget(10),
    );

    let options = BatchOptions {
        auto_switch_provider: true,
        provider: Some(ProviderType::Anthropic),
        ..Default::default()
    };
    let report = BatchRunner::new(&h.orchestrator)
        .run(&messages(&["first", "second"]), Project::new("Test Project"), &options)
        .await;

    assert_eq!(report.iterations, 3);
    assert_eq!(report.completed, 2);
    let providers: Vec<ProviderType> = report.items.iter().map(|i| i.provider).collect();
    assert_eq!(
        providers,
        vec![ProviderType::Anthropic, ProviderType::OpenAI, ProviderType::OpenAI]
    );
    assert_eq!(
        report.items[0].response.error_kind(),
        Some(ChatErrorKind::Transport)
    );
    assert_eq!(report.items[1].message, "first");

    // The switch sticks for the rest of the batch.
    assert_eq!(anthropic.request_count(), 1);
    assert_eq!(openai.request_count(), 2);
}

#[tokio::test]
async fn test_auto_switch_does_not_rerun_executed_tools() {
    // The tool round succeeds, then the summary request fails.
    let anthropic = Arc::new(MockProvider::new(
        ProviderType::Anthropic,
        vec![tool_use(&[("get_status", json!({}))]), network_error()],
    ));
    let openai = Arc::new(MockProvider::new(ProviderType::OpenAI, vec![]));
    let h = harness(
        image_then_reflect(1),
        vec![anthropic.clone(), openai.clone()],
        budget(10),
    );

    let options = BatchOptions {
        auto_switch_provider: true,
        provider: Some(ProviderType::Anthropic),
        ..Default::default()
    };
    let report = BatchRunner::new(&h.orchestrator)
        .run(&messages(&["check status"]), Project::new("Test Project"), &options)
        .await;

    assert_eq!(report.iterations, 1);
    assert_eq!(report.completed, 0);
    let failed = &report.items[0].response;
    assert_eq!(failed.error_kind(), Some(ChatErrorKind::Transport));
    assert_eq!(failed.tool_calls.len(), 1);
    assert_eq!(openai.request_count(), 0);
    assert_eq!(h.orchestrator.get_action_budget().used, 1);
}

#[tokio::test]
async fn test_without_auto_switch_failures_move_on() {
    let anthropic = Arc::new(MockProvider::new(
        ProviderType::Anthropic,
        vec![network_error(), text("Recovered.")],
    ));
    let openai = Arc::new(MockProvider::new(ProviderType::OpenAI, vec![]));
    let h = harness(
        image_then_reflect(1),
        vec![anthropic.clone(), openai.clone()],
        budget(10),
    );

    let report = BatchRunner::new(&h.orchestrator)
        .run(
            &messages(&["first", "second"]),
            Project::new("Test Project"),
            &BatchOptions {
                provider: Some(ProviderType::Anthropic),
                ..Default::default()
            },
        )
        .await;

    assert_eq!(report.iterations, 2);
    assert_eq!(report.completed, 1);
    assert_eq!(openai.request_count(), 0);
}

#[tokio::test]
async fn test_budget_exhaustion_ends_the_batch() {
    let provider = Arc::new(MockProvider::new(
        ProviderType::Anthropic,
        vec![
            tool_use(&[("get_status", json!({}))]),
            text("Checked."),
        ],
    ));
    let h = harness(image_then_reflect(1), vec![provider.clone()], budget(1));

    let report = BatchRunner::new(&h.orchestrator)
        .run(
            &messages(&["check", "check again", "and once more"]),
            Project::new("Test Project"),
            &BatchOptions {
                auto_switch_provider: true,
                ..Default::default()
            },
        )
        .await;

    assert!(report.stopped_by_budget);
    assert_eq!(report.items.len(), 2);
    assert_eq!(report.completed, 1);
    assert_eq!(
        report.last_response().and_then(|r| r.error_kind()),
        Some(ChatErrorKind::BudgetExhausted)
    );
    assert_eq!(provider.request_count(), 2);
}

#[tokio::test]
async fn test_iteration_limit() {
    let provider = Arc::new(MockProvider::new(ProviderType::Anthropic, vec![]));
    let h = harness(image_then_reflect(1), vec![provider.clone()], budget(10));

    let report = BatchRunner::new(&h.orchestrator)
        .run(
            &messages(&["a", "b", "c", "d"]),
            Project::new("Test Project"),
            &BatchOptions {
                max_iterations: 2,
                ..Default::default()
            },
        )
        .await;

    assert_eq!(report.iterations, 2);
    assert_eq!(report.items.len(), 2);
    assert_eq!(provider.request_count(), 2);
}
