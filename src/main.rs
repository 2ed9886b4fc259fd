//! Builder Agent CLI
//!
//! Sends one or more messages to the orchestrator against a project JSON
//! file. Only the built-in project tools are available; generators that need
//! external services are not wired up here.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{bail, Context, Result};
use clap::Parser;
use tracing_subscriber::EnvFilter;

use builder_agent::{AgentConfig, BatchRunner, ChatResponse, ChatTurn, Orchestrator};
use builder_agent_core::{InMemoryProject, Project};
use builder_agent_llm::ProviderType;
use builder_agent_tools::Collaborators;

#[derive(Parser, Debug)]
#[command(version, about = "Talk to the UI building agent", long_about = None)]
struct Args {
    /// Configuration file (defaults to ~/.builder-agent/config.toml)
    #[arg(short, long, env = "BUILDER_AGENT_CONFIG")]
    config: Option<PathBuf>,

    /// Project document as JSON
    #[arg(short, long)]
    project: Option<PathBuf>,

    /// Provider to use (anthropic, openai, deepseek)
    #[arg(long)]
    provider: Option<ProviderType>,

    /// Override the action budget
    #[arg(long)]
    budget: Option<u32>,

    /// Retry on the next provider when one fails (batch mode)
    #[arg(long, default_value_t = false)]
    auto_switch: bool,

    /// Write the updated project back to --project
    #[arg(long, default_value_t = false)]
    save: bool,

    /// Print responses as JSON
    #[arg(long, default_value_t = false)]
    json: bool,

    /// Messages to send; more than one runs them as a batch
    #[arg(required = true)]
    messages: Vec<String>,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("warn,builder_agent=info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();
    if args.save && args.project.is_none() {
        bail!("--save requires --project");
    }

    let mut config = AgentConfig::load_or_default(args.config.as_deref())
        .context("failed to load configuration")?;
    if let Some(budget) = args.budget {
        config.action_budget = budget;
    }

    let project = match &args.project {
        Some(path) => {
            let content = std::fs::read_to_string(path)
                .with_context(|| format!("failed to read {}", path.display()))?;
            serde_json::from_str::<Project>(&content)
                .with_context(|| format!("failed to parse {}", path.display()))?
        }
        None => Project::default(),
    };

    let sink = InMemoryProject::new(project.clone());
    let orchestrator =
        Orchestrator::from_config(&config, &Collaborators::new(), Arc::new(sink.clone()))
            .context("failed to build the orchestrator")?;
    if orchestrator.get_available_providers().is_empty() {
        bail!(
            "no provider is configured; set one of {}",
            ProviderType::PREFERENCE
                .iter()
                .map(|p| p.credential_env_var())
                .collect::<Vec<_>>()
                .join(", ")
        );
    }

    if let Some(provider) = args.provider {
        if !orchestrator.set_current_provider(provider) {
            bail!("provider {} is not available", provider);
        }
    }

    let failed = if args.messages.len() == 1 {
        let turn = ChatTurn::new(args.messages[0].clone(), project)
            .with_provider(orchestrator.get_current_provider());
        let response = orchestrator.chat(turn).await;
        print_response(&response, args.json)?;
        !response.success
    } else {
        let mut options = config.batch_options();
        options.provider = Some(orchestrator.get_current_provider());
        options.auto_switch_provider |= args.auto_switch;

        let report = BatchRunner::new(&orchestrator)
            .run(&args.messages, project, &options)
            .await;
        if args.json {
            println!("{}", serde_json::to_string_pretty(&report)?);
        } else {
            for item in &report.items {
                println!("> {} [{}]", item.message, item.provider);
                print_response(&item.response, false)?;
            }
            println!(
                "{} of {} messages completed in {} iterations",
                report.completed,
                args.messages.len(),
                report.iterations
            );
        }
        report.completed < args.messages.len()
    };

    let budget = orchestrator.get_action_budget();
    if !args.json {
        println!("actions used: {}/{}", budget.used, budget.total);
    }

    if args.save {
        if let Some(path) = &args.project {
            let content = serde_json::to_string_pretty(&sink.get())?;
            std::fs::write(path, content)
                .with_context(|| format!("failed to write {}", path.display()))?;
        }
    }

    if failed {
        std::process::exit(1);
    }
    Ok(())
}

fn print_response(response: &ChatResponse, json: bool) -> Result<()> {
    if json {
        println!("{}", serde_json::to_string_pretty(response)?);
        return Ok(());
    }

    println!("{}", response.message);
    for call in &response.tool_calls {
        let mark = if call.result.success { "ok" } else { "failed" };
        println!("  - {} ({}): {}", call.function, mark, call.result.summary);
    }
    if let Some(reason) = response.halted {
        println!("  halted: {:?}", reason);
    }
    Ok(())
}
