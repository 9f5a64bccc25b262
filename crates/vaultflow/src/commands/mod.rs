pub mod destroy;
pub mod output;
pub mod preview;
pub mod up;

use colored::Colorize;
use std::path::Path;
use std::sync::Arc;
use vaultflow::program::{self, Deployment};
use vaultflow::ProviderContext;
use vaultflow_cloud::{ActionType, Plan, Stack, StateManager};
use vaultflow_config::VaultEnvironment;

/// Load the stack configuration and environment for `stack`
pub fn load_context(project_root: &Path, stack: &str) -> anyhow::Result<ProviderContext> {
    let config = vaultflow_config::load_stack(stack)?;
    println!("Stack: {}", stack.cyan());

    Ok(ProviderContext {
        stack: Arc::new(Stack::with_state(StateManager::new(project_root, stack))),
        config: Arc::new(config),
        env: VaultEnvironment::from_env(),
        binding: None,
    })
}

/// Run the deployment program against a freshly loaded stack
pub async fn run_program(
    project_root: &Path,
    stack: &str,
) -> anyhow::Result<(Arc<Stack>, Deployment)> {
    let ctx = load_context(project_root, stack)?;
    let stack = ctx.stack.clone();
    let deployment = program::run(ctx).await?;
    Ok((stack, deployment))
}

pub fn print_plan(plan: &Plan) {
    println!();
    println!("{}", "Plan:".bold());
    if plan.actions.is_empty() {
        println!("  (no resources)");
    }
    for action in &plan.actions {
        let marker = match action.action_type {
            ActionType::Create => "+".green(),
            ActionType::Update => "~".yellow(),
            ActionType::Delete => "-".red(),
            ActionType::NoOp => " ".normal(),
        };
        if action.changed.is_empty() {
            println!("  {} {}", marker, action.key);
        } else {
            println!(
                "  {} {} ({})",
                marker,
                action.key,
                action.changed.join(", ").dimmed()
            );
        }
    }
    println!();
    println!("{}", plan.summary().to_string().bold());
}
