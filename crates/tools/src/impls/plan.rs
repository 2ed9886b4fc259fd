//! Plan Tool Implementations
//!
//! Work plans let the model lay out a multi-step request and tick steps off
//! as it goes. Both tools only mutate the project.

use async_trait::async_trait;
use serde_json::{json, Value};
use std::collections::HashMap;

use builder_agent_core::{new_id, Plan, PlanStep, StepStatus, ToolContext};
use builder_agent_llm::ParameterSchema;

use crate::executor::{ToolError, ToolOutput};
use crate::trait_def::Tool;

use super::required_str;

const STATUS_VALUES: &[&str] = &["pending", "in_progress", "done", "skipped"];

pub struct CreatePlanTool;

impl CreatePlanTool {
    pub fn new() -> Self {
        Self
    }
}

impl Default for CreatePlanTool {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Tool for CreatePlanTool {
    fn name(&self) -> &str {
        "create_plan"
    }

    fn description(&self) -> &str {
        "Create a step-by-step plan for a multi-part request. Use before starting work that needs several tool calls."
    }

    fn parameters_schema(&self) -> ParameterSchema {
        let mut properties = HashMap::new();
        properties.insert(
            "title".to_string(),
            ParameterSchema::string(Some("Plan title")),
        );
        properties.insert(
            "steps".to_string(),
            ParameterSchema::array(
                Some("Ordered step descriptions"),
                ParameterSchema::string(None),
            ),
        );
        ParameterSchema::object(
            Some("Plan parameters"),
            properties,
            vec!["title".to_string(), "steps".to_string()],
        )
    }

    async fn execute(&self, ctx: &ToolContext, args: Value) -> Result<ToolOutput, ToolError> {
        let title = required_str(&args, "title")?;
        let steps: Vec<PlanStep> = args["steps"]
            .as_array()
            .into_iter()
            .flatten()
            .filter_map(|s| s.as_str())
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(|description| PlanStep {
                description: description.to_string(),
                status: StepStatus::Pending,
            })
            .collect();

        if steps.is_empty() {
            return Err(ToolError::invalid_args("a plan needs at least one step"));
        }

        let plan = Plan {
            id: new_id("plan"),
            title: title.to_string(),
            steps,
        };
        let plan_id = plan.id.clone();
        let step_count = plan.steps.len();

        ctx.apply(Box::new(move |mut project| {
            project.plans.push(plan);
            project
        }));

        Ok(ToolOutput::with_data(
            format!("Created plan '{}' with {} step(s)", title, step_count),
            json!({ "plan_id": plan_id, "steps": step_count }),
        ))
    }
}

pub struct UpdatePlanStepTool;

impl UpdatePlanStepTool {
    pub fn new() -> Self {
        Self
    }
}

impl Default for UpdatePlanStepTool {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Tool for UpdatePlanStepTool {
    fn name(&self) -> &str {
        "update_plan_step"
    }

    fn description(&self) -> &str {
        "Set the status of one step of an existing plan."
    }

    fn parameters_schema(&self) -> ParameterSchema {
        let mut properties = HashMap::new();
        properties.insert(
            "plan_id".to_string(),
            ParameterSchema::string(Some("Id of the plan")),
        );
        properties.insert(
            "step_index".to_string(),
            ParameterSchema::integer(Some("Zero-based index of the step")),
        );
        properties.insert(
            "status".to_string(),
            ParameterSchema::string_enum(Some("New status"), STATUS_VALUES),
        );
        ParameterSchema::object(
            Some("Plan step update parameters"),
            properties,
            vec![
                "plan_id".to_string(),
                "step_index".to_string(),
                "status".to_string(),
            ],
        )
    }

    async fn execute(&self, ctx: &ToolContext, args: Value) -> Result<ToolOutput, ToolError> {
        let plan_id = required_str(&args, "plan_id")?;
        let status_text = required_str(&args, "status")?;
        let status = StepStatus::parse(status_text)
            .ok_or_else(|| ToolError::invalid_args(format!("unknown status '{}'", status_text)))?;
        let index = args["step_index"]
            .as_u64()
            .ok_or_else(|| ToolError::invalid_args("step_index must be a non-negative integer"))?
            as usize;

        let current = ctx.current_project();
        let plan = current
            .plans
            .iter()
            .find(|p| p.id == plan_id)
            .ok_or_else(|| ToolError::not_found(format!("plan {}", plan_id)))?;
        if index >= plan.steps.len() {
            return Err(ToolError::invalid_args(format!(
                "plan {} has {} step(s); index {} is out of range",
                plan_id,
                plan.steps.len(),
                index
            )));
        }
        let finished = plan.finished_steps()
            + usize::from(matches!(status, StepStatus::Done | StepStatus::Skipped))
            - usize::from(matches!(
                plan.steps[index].status,
                StepStatus::Done | StepStatus::Skipped
            ));
        let total = plan.steps.len();

        let id = plan_id.to_string();
        ctx.apply(Box::new(move |mut project| {
            if let Some(step) = project.plan_mut(&id).and_then(|p| p.steps.get_mut(index)) {
                step.status = status;
            }
            project
        }));

        Ok(ToolOutput::with_data(
            format!(
                "Step {} of plan {} is now {} ({}/{} finished)",
                index, plan_id, status_text, finished, total
            ),
            json!({ "plan_id": plan_id, "step_index": index, "finished": finished, "total": total }),
        ))
    }
}
