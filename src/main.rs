//! Multimodal SVM - Main Entry Point
//!
//! Runs cross-validated SVM experiments and prints F1 summaries.

use clap::Parser;
use multimodal_svm::cli::{cmd_info, cmd_report, cmd_run, cmd_train, load_config, Cli, Commands};

fn main() -> anyhow::Result<()> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "multimodal_svm=info".into()),
        )
        .init();

    let cli = Cli::parse();
    let config = load_config(&cli)?;

    match cli.command {
        Some(Commands::Train) => cmd_train(config)?,
        Some(Commands::Report { model }) => cmd_report(config, model.as_deref())?,
        Some(Commands::Info) => cmd_info(config)?,
        None => cmd_run(config)?,
    }

    Ok(())
}
