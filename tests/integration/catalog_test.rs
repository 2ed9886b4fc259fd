//! Default Catalog Integration Tests
//!
//! Runs the built-in tools through the orchestrator: image to component to
//! review chains, trigger-word conditions, and project mutations landing in
//! the caller's sink.

use std::sync::Arc;

use serde_json::json;

use builder_agent::{ChatTurn, HistoryEntry};
use builder_agent_core::{AssetKind, Project};
use builder_agent_llm::ProviderType;
use builder_agent_tools::{default_registry, Collaborators};

use crate::support::{
    budget, harness, harness_with_project, text, tool_use, FakeComponents, FakeImages,
    MockProvider,
};

fn collaborators() -> Collaborators {
    Collaborators::new()
        .with_images(Arc::new(FakeImages))
        .with_components(Arc::new(FakeComponents))
}

#[tokio::test]
async fn test_image_component_review_chain() {
    let provider = Arc::new(MockProvider::new(
        ProviderType::Anthropic,
        vec![
            tool_use(&[("generate_image", json!({"prompt": "snowy mountain range"}))]),
            text("Generated a mountain image."),
            tool_use(&[(
                "generate_component",
                json!({"name": "Hero Card", "description": "Mountain hero card"}),
            )]),
            text("Built the hero card."),
            tool_use(&[("reflect_on_component", json!({}))]),
            text("The card needs a heading level check."),
        ],
    ));
    let registry = Arc::new(default_registry(&collaborators()).unwrap());
    let h = harness(registry, vec![provider.clone()], budget(10));

    let response = h
        .orchestrator
        .chat(ChatTurn::new(
            "Create a hero card with a picture of mountains",
            Project::new("Test Project"),
        ))
        .await;

    assert!(response.success, "{}", response.message);
    let names: Vec<&str> = response.tool_calls.iter().map(|c| c.function.as_str()).collect();
    assert_eq!(
        names,
        vec!["generate_image", "generate_component", "reflect_on_component"]
    );
    assert!(response.tool_calls.iter().all(|c| c.result.success));

    let project = h.sink.get();
    assert_eq!(project.assets.len(), 1);
    assert_eq!(project.assets[0].kind, AssetKind::Image);
    assert_eq!(project.components.len(), 1);

    let component = &project.components[0];
    assert_eq!(component.name, "Hero Card");
    assert_eq!(
        component.source_image_url.as_deref(),
        Some("https://images.example.com/3.png")
    );
    // The review ran against the component created earlier in the chain.
    assert_eq!(
        response.tool_calls[2].args["component_id"],
        json!(component.id)
    );

    let requests = provider.requests();
    assert_eq!(requests.len(), 6);
    assert_eq!(
        requests[2].options.forced_tool.as_deref(),
        Some("generate_component")
    );
    assert_eq!(
        requests[4].options.forced_tool.as_deref(),
        Some("reflect_on_component")
    );
    // The continuation turn saw the updated project.
    assert!(requests[4]
        .system
        .as_deref()
        .unwrap_or_default()
        .contains("Hero Card"));
    assert_eq!(h.orchestrator.get_action_budget().used, 3);
}

#[tokio::test]
async fn test_image_without_component_request_stops() {
    let provider = Arc::new(MockProvider::new(
        ProviderType::Anthropic,
        vec![
            tool_use(&[("generate_image", json!({"prompt": "a quiet lake"}))]),
            text("Here is a lake."),
        ],
    ));
    let registry = Arc::new(default_registry(&collaborators()).unwrap());
    let h = harness(registry, vec![provider.clone()], budget(10));

    let response = h
        .orchestrator
        .chat(ChatTurn::new("Draw a quiet lake", Project::new("Test Project")))
        .await;

    assert!(response.success);
    assert_eq!(response.tool_calls.len(), 1);
    assert!(response.halted.is_none());
    assert_eq!(provider.request_count(), 2);
    assert_eq!(h.sink.get().assets.len(), 1);
}

#[tokio::test]
async fn test_edit_continues_only_for_multi_step_intent() {
    let mut project = Project::new("Test Project");
    project.components.push(builder_agent_core::Component {
        id: "comp-1".to_string(),
        name: "Navbar".to_string(),
        description: "Top navigation".to_string(),
        code: "<nav><a href=\"/\">Home</a></nav>".to_string(),
        source_image_url: None,
        revision: 0,
    });

    for (message, expected_calls) in [
        ("Make the navbar sticky", 1),
        ("Make the navbar sticky and then check it", 2),
    ] {
        let provider = Arc::new(MockProvider::new(
            ProviderType::Anthropic,
            vec![
                tool_use(&[(
                    "edit_component",
                    json!({"component_id": "comp-1", "instructions": "make it sticky"}),
                )]),
                text("Updated the navbar."),
                tool_use(&[("reflect_on_component", json!({}))]),
                text("Looks fine."),
            ],
        ));
        let registry = Arc::new(default_registry(&collaborators()).unwrap());
        let h = harness_with_project(registry, vec![provider.clone()], budget(10), project.clone());

        let response = h
            .orchestrator
            .chat(ChatTurn::new(message, project.clone()))
            .await;

        assert!(response.success);
        assert_eq!(response.tool_calls.len(), expected_calls, "{}", message);
        assert_eq!(h.sink.get().components[0].revision, 1);
    }
}

#[tokio::test]
async fn test_history_is_sent_to_the_provider() {
    let provider = Arc::new(MockProvider::new(ProviderType::Anthropic, vec![text("Sure.")]));
    let registry = Arc::new(default_registry(&Collaborators::new()).unwrap());
    let h = harness(registry, vec![provider.clone()], budget(10));

    let turn = ChatTurn::new("And now?", Project::new("Test Project")).with_history(vec![
        HistoryEntry::user("Hi"),
        HistoryEntry::assistant("Hello! What shall we build?", vec![]),
    ]);
    let response = h.orchestrator.chat(turn).await;

    assert_eq!(response.message, "Sure.");
    let request = &provider.requests()[0];
    assert_eq!(request.messages.len(), 3);
    assert_eq!(request.messages[1].text_content(), "Hello! What shall we build?");
    // Only state tools without collaborators are offered.
    assert!(request.tools.contains(&"create_plan".to_string()));
    assert!(!request.tools.contains(&"generate_image".to_string()));
}
