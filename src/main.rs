use clap::Parser;
use poly_oracle::cli::{Cli, Commands};
use poly_oracle::config::Config;
use std::path::Path;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Load configuration; a missing file means defaults, a bad one is fatal
    let config = if Path::new(&cli.config).exists() {
        Config::load(&cli.config)?
    } else {
        eprintln!("Warning: {} not found, using default configuration", cli.config);
        Config::default()
    };
    config.validate()?;

    // Initialize telemetry
    let _telemetry = poly_oracle::telemetry::init_telemetry(&config.telemetry)?;

    match cli.command {
        Commands::Oracle(args) => {
            tracing::info!("Starting oracle");
            args.execute(&config).await?;
        }
        Commands::Decide(args) => {
            args.execute(&config).await?;
        }
        Commands::Status(args) => {
            args.execute(&config).await?;
        }
        Commands::Config => {
            println!("Configuration is valid:");
            println!("{:#?}", config);
        }
    }

    Ok(())
}
