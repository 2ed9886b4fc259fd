//! System Prompt Builder
//!
//! Builds the system prompt every provider receives: the agent's role, the
//! available tools, the current project, and, for continuation turns, an
//! instruction naming the tool to call next.

use serde_json::{Map, Value};

use builder_agent_core::Project;
use builder_agent_llm::ToolDefinition;

/// Build the system prompt for a turn.
pub fn build_system_prompt(project: &Project, tools: &[ToolDefinition]) -> String {
    let tool_list = if tools.is_empty() {
        "(no tools available)".to_string()
    } else {
        tools
            .iter()
            .map(|t| format!("- **{}**: {}", t.name, t.description))
            .collect::<Vec<_>>()
            .join("\n")
    };

    format!(
        r#"You are a building agent that helps the user design and assemble a UI project. You work by calling tools that create and modify the project; describe what you did in plain language afterwards.

## Current Project
{project_summary}

## Available Tools
{tool_list}

## Guidelines
- Greetings and general questions need no tool. Answer directly.
- Use ids exactly as they appear in the project summary or in earlier tool results.
- For requests with several parts, create a plan first and update its steps as you go.
- Prefer editing an existing component over generating a duplicate.
- If a tool fails, explain the failure instead of retrying the same call blindly."#,
        project_summary = project.summary(),
        tool_list = tool_list,
    )
}

/// Instruction appended for a continuation turn.
///
/// `forced` is false when the provider cannot pin a specific tool, in which
/// case the wording carries the whole constraint.
pub fn continuation_instruction(tool: &str, args: &Map<String, Value>, forced: bool) -> String {
    let mut text = if forced {
        format!(
            "\n\n## Workflow Continuation\nContinue the workflow by calling `{}`.",
            tool
        )
    } else {
        format!(
            "\n\n## Workflow Continuation\nYou MUST call the `{}` tool now, and no other tool.",
            tool
        )
    };

    if !args.is_empty() {
        text.push_str(&format!(
            " Use these arguments: {}",
            Value::Object(args.clone())
        ));
    }
    text
}
