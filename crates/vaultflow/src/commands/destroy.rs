use colored::Colorize;
use std::path::Path;
use std::sync::Arc;
use vaultflow::program::CLOUD_PROVIDER_KEY;
use vaultflow::get_cloud_provider;
use vaultflow_cloud::StateManager;

pub async fn handle(project_root: &Path, stack: &str, yes: bool) -> anyhow::Result<()> {
    println!("{}", "Destroying stack...".red().bold());

    let state = StateManager::new(project_root, stack).load().await?;
    if state.resources.is_empty() {
        println!("Nothing to destroy in stack '{}'", stack);
        return Ok(());
    }

    println!();
    println!(
        "{}",
        format!("Resources to delete ({}):", state.resources.len()).bold()
    );
    for (key, resource) in &state.resources {
        println!("  - {} ({}, {})", key.cyan(), resource.id, resource.status);
    }

    if !yes {
        println!();
        println!(
            "{}",
            "Warning: resources are deleted from the platform and cannot be recovered.".yellow()
        );
        println!("Run again with --yes to destroy");
        return Ok(());
    }

    let ctx = super::load_context(project_root, stack)?;
    let stack = Arc::clone(&ctx.stack);
    let provider_name = ctx.config.project().require(CLOUD_PROVIDER_KEY)?;
    let provider = get_cloud_provider(&provider_name, ctx)?;
    let backend = provider.backend();

    println!();
    let result = stack.destroy(backend.as_ref()).await?;
    for action in &result.succeeded {
        println!("  ✓ {}", action.message);
    }

    println!();
    println!(
        "{}",
        format!("Destroyed {} resource(s) in {}ms", result.succeeded.len(), result.duration_ms)
            .green()
            .bold()
    );

    Ok(())
}
