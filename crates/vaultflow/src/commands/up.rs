use colored::Colorize;
use std::path::Path;

pub async fn handle(project_root: &Path, stack: &str, yes: bool) -> anyhow::Result<()> {
    println!("{}", "Deploying Vault...".blue().bold());

    let (stack, deployment) = super::run_program(project_root, stack).await?;
    println!(
        "Provider: {}",
        deployment.deployer.cloud_provider().display_name().cyan()
    );

    let plan = stack.preview().await?;
    super::print_plan(&plan);

    if !yes {
        println!();
        if plan.has_changes {
            println!(
                "{}",
                "Warning: this creates or replaces resources on the platform.".yellow()
            );
        }
        println!("Run again with --yes to apply");
        return Ok(());
    }

    println!();
    let result = stack.up().await?;
    for action in &result.apply.succeeded {
        println!("  ✓ {}", action.message);
    }

    println!();
    println!(
        "{}",
        format!("Deployment finished in {}ms", result.apply.duration_ms)
            .green()
            .bold()
    );

    if !result.outputs.is_empty() {
        println!();
        println!("{}", "Outputs:".bold());
        for (name, value) in &result.outputs {
            println!("  {}: {}", name.cyan(), value);
        }
    }

    Ok(())
}
