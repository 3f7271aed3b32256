use anyhow::{Context, Result};
use brand_normalizer::app::NormalizeUseCase;
use brand_normalizer::config::Config;
use brand_normalizer::error::BrandError;
use brand_normalizer::observability::{self, metrics};
use brand_normalizer::pipeline::processing::replace::ReplaceStrategy;
use brand_normalizer::{server, storage};
use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{error, info};

#[derive(Parser)]
#[command(name = "brand_normalizer")]
#[command(about = "Normalize heterogeneous brand records into the canonical schema")]
#[command(version)]
struct Cli {
    /// TOML config file (defaults to ./brandnorm.toml when present)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Dataset file, overriding the configured store path
    #[arg(long, global = true)]
    store: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Normalize the stored dataset and replace it with the canonical records
    Normalize {
        /// How to commit the new dataset
        #[arg(long, value_enum)]
        strategy: Option<StrategyArg>,
    },
    /// Print the normalized records without writing them back
    Preview,
    /// Serve the normalizer over HTTP
    Serve {
        #[arg(long)]
        port: Option<u16>,
    },
}

#[derive(Clone, Copy, ValueEnum)]
enum StrategyArg {
    StagedSwap,
    ClearThenInsert,
}

impl From<StrategyArg> for ReplaceStrategy {
    fn from(arg: StrategyArg) -> Self {
        match arg {
            StrategyArg::StagedSwap => ReplaceStrategy::StagedSwap,
            StrategyArg::ClearThenInsert => ReplaceStrategy::ClearThenInsert,
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenv::dotenv().ok();
    let cli = Cli::parse();

    let mut config = Config::load(cli.config.as_deref()).context("loading configuration")?;
    if let Some(path) = cli.store {
        config.store.path = path;
    }

    let _log_guard = observability::init_logging(&config.logging);

    match cli.command {
        Commands::Normalize { strategy } => {
            if let Some(strategy) = strategy {
                config.replace.strategy = strategy.into();
            }
            let use_case = NormalizeUseCase::from_config(&config, storage::open(&config.store));

            match use_case.run().await {
                Ok(output) => {
                    let report = &output.report;
                    println!("✅ Normalization run {} committed", report.run_id);
                    println!("   Read: {}", report.read);
                    println!("   Written: {}", report.emitted);
                    println!("   Rejected: {}", report.rejected);
                    println!("   Fields defaulted: {}", report.field_issues);
                    println!(
                        "   Replaced: {} ({})",
                        report.commit.replaced,
                        report.commit.strategy.as_str()
                    );
                }
                Err(e) => {
                    if let BrandError::Replace(replace) = &e {
                        println!("❌ Dataset replace failed at the {} stage", replace.stage);
                    }
                    error!("Normalization run failed: {}", e);
                    return Err(e).context("normalization run failed");
                }
            }
        }
        Commands::Preview => {
            let use_case = NormalizeUseCase::from_config(&config, storage::open(&config.store));
            let report = use_case.preview().await?;
            println!("{}", serde_json::to_string_pretty(&report.brands)?);
            info!(
                read = report.read,
                rejected = report.rejected.len(),
                field_issues = report.issues.len(),
                "Preview complete"
            );
        }
        Commands::Serve { port } => {
            let port = port.unwrap_or(config.server.port);
            if let Err(e) = metrics::init() {
                error!("Metrics disabled: {}", e);
            }
            let use_case = Arc::new(NormalizeUseCase::from_config(
                &config,
                storage::open(&config.store),
            ));
            server::start_server(use_case, port)
                .await
                .map_err(|e| anyhow::anyhow!("server error: {}", e))?;
        }
    }

    Ok(())
}
