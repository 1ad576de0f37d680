use std::fs::OpenOptions;
use std::sync::Mutex;

use anyhow::Context;
use clap::Parser;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use sns_tracker::app::AppContext;
use sns_tracker::cli::{commands, Cli, Commands};
use sns_tracker::config::Config;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();

    let mut config = Config::load(cli.config.as_deref())?;
    config.apply_process_env()?;
    cli.apply_overrides(&mut config);

    init_tracing(&config.log_level, &cli)?;

    tokio::select! {
        result = run(cli, config) => result,
        _ = tokio::signal::ctrl_c() => {
            tracing::info!("Interrupted by user");
            anyhow::bail!("Interrupted")
        }
    }
}

async fn run(cli: Cli, config: Config) -> anyhow::Result<()> {
    let ctx = if cli.dry_run {
        AppContext::dry_run(config)
    } else {
        AppContext::new(config).await?
    };

    match &cli.command {
        Commands::Init => {
            commands::init(&ctx).await?;
        }
        Commands::Track { source } => {
            commands::track(&ctx, source).await?;
        }
        Commands::Update { source } => {
            commands::update(&ctx, source).await?;
        }
        Commands::Schedule { file, when } => {
            commands::schedule(&ctx, file, when.schedule()).await?;
        }
    }

    commands::print_dry_run(&ctx);
    Ok(())
}

/// `RUST_LOG` wins over the configured level; `--log-file` adds a plain-text copy
fn init_tracing(level: &str, cli: &Cli) -> anyhow::Result<()> {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(level))
        .with_context(|| format!("Invalid log level: {}", level))?;

    let file_layer = match &cli.log_file {
        Some(path) => {
            let file = OpenOptions::new()
                .create(true)
                .append(true)
                .open(path)
                .with_context(|| format!("Failed to open log file {}", path.display()))?;
            Some(fmt::layer().with_ansi(false).with_writer(Mutex::new(file)))
        }
        None => None,
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer())
        .with(file_layer)
        .init();

    Ok(())
}
