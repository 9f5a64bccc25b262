mod commands;

use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(name = "vaultflow")]
#[command(about = "Deploy HashiCorp Vault to the cloud", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Deploy the stack
    Up {
        /// Stack name (dev, stg, prod)
        #[arg(short = 's', long = "stack", env = "VAULTFLOW_STACK", default_value = "dev")]
        stack: String,
        /// Apply without asking
        #[arg(short, long)]
        yes: bool,
    },
    /// Show what `up` would change without calling the platform
    Preview {
        /// Stack name (dev, stg, prod)
        #[arg(short = 's', long = "stack", env = "VAULTFLOW_STACK", default_value = "dev")]
        stack: String,
    },
    /// Print exported outputs of the last deployment
    Output {
        /// Output name (all outputs when omitted)
        name: Option<String>,
        /// Stack name (dev, stg, prod)
        #[arg(short = 's', long = "stack", env = "VAULTFLOW_STACK", default_value = "dev")]
        stack: String,
    },
    /// Delete every deployed resource of the stack
    Destroy {
        /// Stack name (dev, stg, prod)
        #[arg(short = 's', long = "stack", env = "VAULTFLOW_STACK", default_value = "dev")]
        stack: String,
        /// Delete without asking
        #[arg(short, long)]
        yes: bool,
    },
    /// Show version information
    Version,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // stdout carries command output, logs go to stderr
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let project_root = std::env::current_dir()?;

    match cli.command {
        Commands::Up { stack, yes } => {
            commands::up::handle(&project_root, &stack, yes).await?;
        }
        Commands::Preview { stack } => {
            commands::preview::handle(&project_root, &stack).await?;
        }
        Commands::Output { name, stack } => {
            commands::output::handle(&project_root, &stack, name.as_deref()).await?;
        }
        Commands::Destroy { stack, yes } => {
            commands::destroy::handle(&project_root, &stack, yes).await?;
        }
        Commands::Version => {
            println!("vaultflow {}", env!("CARGO_PKG_VERSION"));
        }
    }

    Ok(())
}
