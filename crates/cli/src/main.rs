//! Pulse CLI - Main entry point

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use pulse_cli::{commands, AppContext};
use rust_decimal::Decimal;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "pulse")]
#[command(about = "Pulse - cross-border compliance engine", long_about = None)]
struct Cli {
    /// Data directory path
    #[arg(short, long, default_value = "./data")]
    data: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Write default config, rules and framework catalog
    Init,

    /// Validate a cross-border transaction
    Validate {
        /// Source jurisdiction (e.g. US)
        from: String,
        /// Destination jurisdiction (e.g. EU)
        to: String,
        /// Transaction amount
        amount: Decimal,
        /// Transaction type (payment, invoice, payroll, transfer, contract, refund)
        transaction_type: String,
    },

    /// Generate a compliance report
    Report {
        /// Only frameworks for this jurisdiction (global frameworks always apply)
        #[arg(long)]
        jurisdiction: Option<String>,
    },

    /// Show framework scores and statuses
    Frameworks,

    /// Run one alert-generation tick
    Tick,

    /// List alerts
    Alerts {
        /// Include resolved alerts
        #[arg(long)]
        all: bool,
    },

    /// Resolve an alert
    Resolve {
        /// Alert ID
        id: String,
    },

    /// Record a manual requirement review
    Review {
        /// Framework ID
        framework: String,
        /// Requirement ID
        requirement: String,
        /// New status (met, partial, not_met)
        status: String,
        /// Reviewer name
        #[arg(long, default_value = "operator")]
        reviewer: String,
    },

    /// Show the loaded rule set
    Rules,

    /// Analyze cost profiles for savings
    Optimize {
        /// JSON file with an array of cost profiles
        file: PathBuf,
    },

    /// Run the periodic ticker
    Monitor {
        /// Stop after this many ticks (runs until Ctrl-C otherwise)
        #[arg(long)]
        ticks: Option<u64>,
        /// Override the configured tick interval (seconds)
        #[arg(long)]
        interval: Option<u64>,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    // Commands that do not need the engine
    match &cli.command {
        Commands::Init => {
            let summary = commands::init(&cli.data)?;
            return commands::print_json(&summary);
        }
        Commands::Optimize { file } => {
            let summary = commands::optimize(file)?;
            return commands::print_json(&summary);
        }
        _ => {}
    }

    let ctx = AppContext::new(&cli.data)?;
    if !ctx.is_initialized() {
        tracing::warn!(
            data = %cli.data.display(),
            "Data directory not initialized, using built-in catalog"
        );
    }

    match cli.command {
        Commands::Init | Commands::Optimize { .. } => {}

        Commands::Validate {
            from,
            to,
            amount,
            transaction_type,
        } => {
            let evaluation = commands::validate(&ctx, &from, &to, amount, &transaction_type).await?;
            commands::print_json(&evaluation)?;
        }

        Commands::Report { jurisdiction } => {
            let report = commands::report(&ctx, jurisdiction.as_deref()).await?;
            commands::print_json(&report)?;
        }

        Commands::Frameworks => {
            commands::print_json(&commands::frameworks(&ctx).await)?;
        }

        Commands::Tick => {
            let summary = commands::tick(&ctx).await?;
            commands::print_json(&summary)?;
        }

        Commands::Alerts { all } => {
            commands::print_json(&commands::alerts(&ctx, all).await)?;
        }

        Commands::Resolve { id } => {
            let alert = commands::resolve(&ctx, &id).await?;
            commands::print_json(&alert)?;
        }

        Commands::Review {
            framework,
            requirement,
            status,
            reviewer,
        } => {
            let summary = commands::review(&ctx, &framework, &requirement, &status, &reviewer).await?;
            commands::print_json(&summary)?;
        }

        Commands::Rules => {
            commands::print_json(&commands::rules(&ctx))?;
        }

        Commands::Monitor { ticks, interval } => {
            let summary = commands::monitor(&ctx, ticks, interval).await?;
            commands::print_json(&summary)?;
        }
    }

    Ok(())
}
