//! Cutframe
//!
//! Terminal video editing session: pick a video, trim it, apply a colour
//! filter and export the result into the shared media folder.
//!
//! # Usage
//!
//! ```bash
//! cutframe session
//! cutframe edit --input clip.mp4 --start 25 --end 75 --filter sepia --save
//! cutframe gallery
//! ```

use anyhow::Result;
use clap::Parser;
use tracing::info;

use cutframe::adapters::tracing_log::{init_subscriber, LogFormat};
use cutframe::adapters::TomlConfigAdapter;
use cutframe::app::DefaultAppContainer;
use cutframe::cli::{commands, Cli, Commands};
use cutframe::config_initialization::initialize_configuration_hierarchy;

/// Main entry point for the Cutframe CLI application
#[tokio::main]
async fn main() -> Result<()> {
    // Parse command line arguments
    let cli = Cli::parse();

    let log_format = LogFormat::parse(&cli.log_format)
        .ok_or_else(|| anyhow::anyhow!("Invalid log format: {}. Valid formats: pretty, json", cli.log_format))?;

    // Resolve configuration before logging so the configured level applies
    let config = TomlConfigAdapter::new();
    let settings = initialize_configuration_hierarchy(&config, &cli).await?;
    init_subscriber(settings.log_level, log_format);

    info!("Starting Cutframe");
    if let Some(path) = &settings.config_file {
        info!("Configuration loaded from {}", path.display());
    }

    cutframe::init()?;
    let container = DefaultAppContainer::new(&settings);

    // Execute the requested command
    match cli.command {
        Commands::Session => commands::session(&container).await?,
        Commands::Edit(args) => commands::edit(&container, args).await?,
        Commands::Gallery(args) => commands::gallery(&container, args)?,
    }

    info!("Cutframe completed successfully");
    Ok(())
}
