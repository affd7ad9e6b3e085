mod commands;
mod input;
mod output;

use anyhow::Result;
use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(name = "categorize")]
#[command(about = "Categorize Norwegian companies by industry code using the Brønnøysund registry")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Categorize every company in a CSV file
    Run(Box<commands::run::RunArgs>),
    /// Show the category table
    Categories(commands::categories::CategoriesArgs),
    /// Write a sample input CSV
    Sample(commands::sample::SampleArgs),
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("categorize=info".parse()?),
        )
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    match &cli.command {
        Commands::Run(args) => commands::run::run(args.as_ref()).await?,
        Commands::Categories(args) => commands::categories::run(args)?,
        Commands::Sample(args) => commands::sample::run(args)?,
    }

    Ok(())
}
