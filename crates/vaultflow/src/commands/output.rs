use colored::Colorize;
use std::path::Path;
use vaultflow_cloud::StateManager;

pub async fn handle(project_root: &Path, stack: &str, name: Option<&str>) -> anyhow::Result<()> {
    let state = StateManager::new(project_root, stack).load().await?;

    match name {
        Some(name) => {
            let value = state.outputs.get(name).ok_or_else(|| {
                anyhow::anyhow!("Output '{}' not found in stack '{}'", name, stack)
            })?;
            // bare value so it can be used in scripts
            println!("{}", value);
        }
        None if state.outputs.is_empty() => {
            println!("No outputs for stack '{}'. Run `vaultflow up --yes` first.", stack);
        }
        None => {
            for (name, value) in &state.outputs {
                println!("{}: {}", name.cyan(), value);
            }
        }
    }

    Ok(())
}
