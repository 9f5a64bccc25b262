use colored::Colorize;
use serde_json::Value;
use std::path::Path;

const MASK: &str = "********";

pub async fn handle(project_root: &Path, stack: &str) -> anyhow::Result<()> {
    println!("{}", "Previewing changes...".blue().bold());

    let (stack, _deployment) = super::run_program(project_root, stack).await?;
    let plan = stack.preview().await?;
    super::print_plan(&plan);

    for resource in stack.resources().await {
        println!();
        println!(
            "{} {}",
            resource.key().bold(),
            format!("(provider: {})", resource.provider).dimmed()
        );
        let properties = mask_env_values(resource.properties.clone());
        println!("{}", serde_json::to_string_pretty(&properties)?);
    }

    let outputs = stack.export_names().await;
    if !outputs.is_empty() {
        println!();
        println!("Outputs: {}", outputs.join(", ").cyan());
    }

    Ok(())
}

/// Hide environment variable values; they carry credentials
fn mask_env_values(mut properties: Value) -> Value {
    if let Some(env) = properties.get_mut("env").and_then(Value::as_array_mut) {
        for var in env {
            match var.get_mut("value") {
                Some(value) if !value.is_null() => *value = Value::String(MASK.to_string()),
                _ => {}
            }
        }
    }
    properties
}
