//! Orchestrator Integration Tests
//!
//! Drives full requests through the orchestrator with a scripted provider:
//! dispatch, budget accounting, continuation chaining, and failure handling.

use std::sync::Arc;

use serde_json::json;

use builder_agent::{ChatErrorKind, ChatTurn, HaltReason, OrchestratorConfig};
use builder_agent_core::Project;
use builder_agent_llm::{ProviderType, ToolCallMode};

use crate::support::{
    budget, harness, image_then_reflect, network_error, ping_pong, text, tool_use, MockProvider,
};

fn turn(message: &str) -> ChatTurn {
    ChatTurn::new(message, Project::new("Test Project"))
}

// ============================================================================
// Continuation scenarios
// ============================================================================

#[tokio::test]
async fn test_successful_tool_chains_its_continuation() {
    let provider = Arc::new(MockProvider::new(
        ProviderType::Anthropic,
        vec![
            tool_use(&[("generate_image", json!({"prompt": "a sunset"}))]),
            text("Here is your sunset."),
            tool_use(&[("reflect", json!({}))]),
            text("The image looks balanced."),
        ],
    ));
    let h = harness(image_then_reflect(2), vec![provider.clone()], budget(10));

    let response = h.orchestrator.chat(turn("Draw a sunset")).await;

    assert!(response.success);
    let names: Vec<&str> = response.tool_calls.iter().map(|c| c.function.as_str()).collect();
    assert_eq!(names, vec!["generate_image", "reflect"]);
    assert_eq!(h.orchestrator.get_action_budget().used, 2);
    assert_eq!(
        response.message,
        "Here is your sunset.\n\nThe image looks balanced."
    );
    assert!(response.halted.is_none());

    // The image URL was carried into the forced call.
    assert_eq!(
        response.tool_calls[1].args["image_url"],
        "https://cdn.example.com/asset-1.png"
    );

    let requests = provider.requests();
    assert_eq!(requests.len(), 4);
    assert!(requests[0].options.forced_tool.is_none());
    assert_eq!(requests[1].options.tool_call_mode, ToolCallMode::None);
    assert_eq!(requests[2].options.forced_tool.as_deref(), Some("reflect"));
    assert!(requests[2]
        .system
        .as_deref()
        .unwrap_or_default()
        .contains("https://cdn.example.com/asset-1.png"));

    // Usage from all four rounds is summed.
    assert_eq!(response.usage.input_tokens, 60);
}

#[tokio::test]
async fn test_budget_stops_continuation_before_second_call() {
    let provider = Arc::new(MockProvider::new(
        ProviderType::Anthropic,
        vec![
            tool_use(&[("generate_image", json!({"prompt": "a sunset"}))]),
            text("Here is your sunset."),
        ],
    ));
    let h = harness(image_then_reflect(2), vec![provider.clone()], budget(1));

    let response = h.orchestrator.chat(turn("Draw a sunset")).await;

    assert!(!response.success);
    assert_eq!(response.error_kind(), Some(ChatErrorKind::BudgetExhausted));
    assert_eq!(response.halted, Some(HaltReason::BudgetExhausted));
    assert_eq!(response.tool_calls.len(), 1);
    assert!(response.message.starts_with("Here is your sunset."));
    // First round plus its summary; the continuation never reached the provider.
    assert_eq!(provider.request_count(), 2);

    let status = h.orchestrator.get_action_budget();
    assert_eq!((status.used, status.remaining), (1, 0));
}

#[tokio::test]
async fn test_failed_tool_never_continues() {
    let provider = Arc::new(MockProvider::new(
        ProviderType::Anthropic,
        vec![
            tool_use(&[("generate_image", json!({"prompt": "please fail"}))]),
            text("The image service is down."),
        ],
    ));
    let h = harness(image_then_reflect(2), vec![provider.clone()], budget(10));

    let response = h.orchestrator.chat(turn("Draw something")).await;

    assert!(response.success);
    assert_eq!(response.tool_calls.len(), 1);
    let call = &response.tool_calls[0];
    assert!(!call.result.success);
    assert_eq!(call.result.error.as_deref(), Some("image service unavailable"));

    // The follow-up round still ran so the model could explain the failure.
    let requests = provider.requests();
    assert_eq!(requests.len(), 2);
    let results = requests[1].tool_results();
    assert_eq!(results.len(), 1);
    assert!(results[0].2);
    assert!(requests.iter().all(|r| r.options.forced_tool.is_none()));
}

#[tokio::test]
async fn test_missing_provider_makes_no_calls() {
    let provider = Arc::new(MockProvider::new(ProviderType::OpenAI, vec![]));
    let h = harness(image_then_reflect(2), vec![provider.clone()], budget(10));

    let response = h
        .orchestrator
        .chat(turn("Draw a sunset").with_provider(ProviderType::Anthropic))
        .await;

    assert!(!response.success);
    assert_eq!(response.error_kind(), Some(ChatErrorKind::ProviderUnavailable));
    assert!(response.message.contains("anthropic"));
    assert!(response.tool_calls.is_empty());
    assert_eq!(provider.request_count(), 0);
    assert_eq!(h.orchestrator.get_action_budget().used, 0);
}

#[tokio::test]
async fn test_only_last_call_is_eligible() {
    let provider = Arc::new(MockProvider::new(
        ProviderType::Anthropic,
        vec![
            tool_use(&[
                ("generate_image", json!({"prompt": "a sunset"})),
                ("get_status", json!({})),
            ]),
            text("Done both."),
        ],
    ));
    let h = harness(image_then_reflect(2), vec![provider.clone()], budget(10));

    let response = h.orchestrator.chat(turn("Draw a sunset")).await;

    assert!(response.success);
    assert_eq!(response.tool_calls.len(), 2);
    assert_eq!(provider.request_count(), 2);
}

// ============================================================================
// Bounds
// ============================================================================

#[tokio::test]
async fn test_budget_caps_calls_within_one_round() {
    let calls: Vec<(&str, serde_json::Value)> = (0..5).map(|_| ("get_status", json!({}))).collect();
    let provider = Arc::new(MockProvider::new(
        ProviderType::Anthropic,
        vec![tool_use(&calls), text("Checked.")],
    ));
    let h = harness(image_then_reflect(2), vec![provider.clone()], budget(3));

    let response = h.orchestrator.chat(turn("check status")).await;

    assert_eq!(response.tool_calls.len(), 3);
    assert_eq!(h.orchestrator.get_action_budget().used, 3);

    // Every requested call still gets a result; the extra ones are skipped.
    let results = provider.requests()[1].tool_results();
    assert_eq!(results.len(), 5);
    assert!(results[..3].iter().all(|(_, _, is_error)| !is_error));
    assert!(results[3..]
        .iter()
        .all(|(_, content, is_error)| *is_error && content.contains("budget")));

    // The next request is refused without a provider call.
    let refused = h.orchestrator.chat(turn("check again")).await;
    assert_eq!(refused.error_kind(), Some(ChatErrorKind::BudgetExhausted));
    assert_eq!(provider.request_count(), 2);

    // Resetting makes room again.
    h.orchestrator.reset_action_budget();
    let again = h.orchestrator.chat(turn("hello")).await;
    assert!(again.success);
    assert_eq!(provider.request_count(), 3);
}

#[tokio::test]
async fn test_budget_bounds_a_long_chain() {
    let mut script = Vec::new();
    for name in ["ping", "pong", "ping", "pong", "ping"] {
        script.push(tool_use(&[(name, json!({}))]));
        script.push(text(name));
    }
    let provider = Arc::new(MockProvider::new(ProviderType::Anthropic, script));
    let h = harness(ping_pong(10), vec![provider.clone()], budget(3));

    let response = h.orchestrator.chat(turn("go")).await;

    assert_eq!(response.tool_calls.len(), 3);
    assert_eq!(response.halted, Some(HaltReason::BudgetExhausted));
    assert_eq!(h.orchestrator.get_action_budget().used, 3);
    assert_eq!(provider.request_count(), 6);
}

#[tokio::test]
async fn test_chain_depth_prevents_cycles() {
    let mut script = Vec::new();
    for name in ["ping", "pong", "ping", "pong"] {
        script.push(tool_use(&[(name, json!({}))]));
        script.push(text(name));
    }
    let provider = Arc::new(MockProvider::new(ProviderType::Anthropic, script));
    let h = harness(ping_pong(1), vec![provider.clone()], budget(10));

    let response = h.orchestrator.chat(turn("go")).await;

    let names: Vec<&str> = response.tool_calls.iter().map(|c| c.function.as_str()).collect();
    assert_eq!(names, vec!["ping", "pong", "ping"]);
    assert!(response.success);
    assert_eq!(response.halted, Some(HaltReason::ChainLimit));
    assert_eq!(provider.request_count(), 6);
}

#[tokio::test]
async fn test_max_continuations_limit() {
    let mut script = Vec::new();
    for name in ["ping", "pong", "ping"] {
        script.push(tool_use(&[(name, json!({}))]));
        script.push(text(name));
    }
    let provider = Arc::new(MockProvider::new(ProviderType::Anthropic, script));
    let config = OrchestratorConfig {
        action_budget: 10,
        max_continuations: 1,
    };
    let h = harness(ping_pong(5), vec![provider.clone()], config);

    let response = h.orchestrator.chat(turn("go")).await;

    assert_eq!(response.tool_calls.len(), 2);
    assert_eq!(response.halted, Some(HaltReason::ContinuationLimit));
    assert!(response.success);
}

// ============================================================================
// Forcing and failures
// ============================================================================

#[tokio::test]
async fn test_forcing_falls_back_to_required_mode() {
    let provider = Arc::new(
        MockProvider::new(
            ProviderType::DeepSeek,
            vec![
                tool_use(&[("generate_image", json!({"prompt": "a sunset"}))]),
                text("Here is your sunset."),
                tool_use(&[("reflect", json!({}))]),
                text("Reviewed."),
            ],
        )
        .without_forced_choice(),
    );
    let h = harness(image_then_reflect(1), vec![provider.clone()], budget(10));

    let response = h.orchestrator.chat(turn("Draw a sunset")).await;
    assert!(response.success);
    assert_eq!(response.provider, Some(ProviderType::DeepSeek));

    let forced = &provider.requests()[2];
    assert!(forced.options.forced_tool.is_none());
    assert_eq!(forced.options.tool_call_mode, ToolCallMode::Required);
    assert!(forced
        .system
        .as_deref()
        .unwrap_or_default()
        .contains("You MUST call the `reflect` tool"));
}

#[tokio::test]
async fn test_continuation_history_carries_prior_turn() {
    let provider = Arc::new(MockProvider::new(
        ProviderType::Anthropic,
        vec![
            tool_use(&[("generate_image", json!({"prompt": "a sunset"}))]),
            text("Here is your sunset."),
            tool_use(&[("reflect", json!({}))]),
            text("Reviewed."),
        ],
    ));
    let h = harness(image_then_reflect(1), vec![provider.clone()], budget(10));

    h.orchestrator.chat(turn("Draw a sunset")).await;

    let forced = &provider.requests()[2];
    // user, assistant tool use, tool results, assistant text, continuation prompt
    assert_eq!(forced.messages.len(), 5);
    assert_eq!(forced.messages[0].text_content(), "Draw a sunset");
    assert_eq!(forced.messages[3].text_content(), "Here is your sunset.");
    assert!(forced.messages[4]
        .text_content()
        .contains("call reflect using the result of generate_image"));
}

#[tokio::test]
async fn test_unknown_tool_fails_the_turn() {
    let provider = Arc::new(MockProvider::new(
        ProviderType::Anthropic,
        vec![tool_use(&[("delete_everything", json!({}))])],
    ));
    let h = harness(image_then_reflect(1), vec![provider.clone()], budget(10));

    let response = h.orchestrator.chat(turn("oops")).await;

    assert!(!response.success);
    assert_eq!(response.error_kind(), Some(ChatErrorKind::UnknownTool));
    assert!(response.message.contains("delete_everything"));
    assert_eq!(provider.request_count(), 1);
    assert_eq!(h.orchestrator.get_action_budget().used, 0);
}

#[tokio::test]
async fn test_transport_error_becomes_apology() {
    let provider = Arc::new(MockProvider::new(
        ProviderType::OpenAI,
        vec![network_error()],
    ));
    let h = harness(image_then_reflect(1), vec![provider.clone()], budget(10));

    let response = h.orchestrator.chat(turn("hello")).await;

    assert!(!response.success);
    assert_eq!(response.error_kind(), Some(ChatErrorKind::Transport));
    assert!(response.message.starts_with("Sorry"));
    assert!(response.message.contains("connection reset"));
    assert_eq!(response.provider, Some(ProviderType::OpenAI));
}

#[tokio::test]
async fn test_invalid_arguments_are_soft_failures() {
    let provider = Arc::new(MockProvider::new(
        ProviderType::Anthropic,
        vec![
            tool_use(&[("generate_image", json!({"prompt": 42}))]),
            text("I sent a bad prompt."),
        ],
    ));
    let h = harness(image_then_reflect(1), vec![provider.clone()], budget(10));

    let response = h.orchestrator.chat(turn("Draw")).await;

    assert!(response.success);
    assert_eq!(response.tool_calls.len(), 1);
    assert!(!response.tool_calls[0].result.success);
    assert!(response.tool_calls[0]
        .result
        .error
        .as_deref()
        .unwrap_or_default()
        .contains("arguments.prompt"));
    // Still counts against the budget.
    assert_eq!(h.orchestrator.get_action_budget().used, 1);
    assert_eq!(provider.request_count(), 2);
}
