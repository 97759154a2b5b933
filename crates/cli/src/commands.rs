//! CLI commands
//!
//! Each command returns a serializable result; `main` prints it as JSON.

use std::path::{Path, PathBuf};
use std::time::Duration;

use chrono::Utc;
use pulse_compliance::{
    builtin_frameworks, optimization, Alert, ComplianceConfig, ComplianceReport, CostProfile,
    Evaluation, FrameworkSnapshot, Optimization, RequirementStatus, Rule, RuleStore, Ticker,
    TickSummary,
};
use rust_decimal::Decimal;
use serde::Serialize;

use crate::context::{AppContext, CONFIG_FILE, FRAMEWORKS_FILE, RULES_FILE};

#[derive(Debug, Serialize)]
pub struct InitSummary {
    pub data_path: PathBuf,
    pub rules: usize,
    pub frameworks: usize,
}

#[derive(Debug, Serialize)]
pub struct RuleSetSummary {
    pub fingerprint: String,
    pub count: usize,
    pub rules: Vec<Rule>,
}

#[derive(Debug, Serialize)]
pub struct ReviewSummary {
    pub framework: String,
    pub requirement: String,
    pub previous: RequirementStatus,
    pub status: RequirementStatus,
    pub compliance_score: u8,
}

#[derive(Debug, Serialize)]
pub struct OptimizationSummary {
    pub optimizations: Vec<Optimization>,
    pub total_savings: Decimal,
}

#[derive(Debug, Serialize)]
pub struct MonitorSummary {
    pub ticks: u64,
    pub open_alerts: usize,
}

/// Write default config, rules and a framework catalog with pinned review dates
pub fn init(data_path: &Path) -> Result<InitSummary, anyhow::Error> {
    let catalog_path = data_path.join(FRAMEWORKS_FILE);
    if catalog_path.exists() {
        anyhow::bail!("Already initialized ({} exists)", catalog_path.display());
    }
    std::fs::create_dir_all(data_path)?;

    let config_path = data_path.join(CONFIG_FILE);
    if !config_path.exists() {
        write_json(&config_path, &ComplianceConfig::default())?;
    }

    let rules_path = data_path.join(RULES_FILE);
    let rule_count = if rules_path.exists() {
        RuleStore::from_file(&rules_path)?.len()
    } else {
        let store = RuleStore::builtin();
        let rules: Vec<&Rule> = store.rules().collect();
        write_json(&rules_path, &rules)?;
        rules.len()
    };

    let frameworks = builtin_frameworks(Utc::now());
    write_json(&catalog_path, &frameworks)?;

    tracing::info!(data = %data_path.display(), "Data directory initialized");

    Ok(InitSummary {
        data_path: data_path.to_path_buf(),
        rules: rule_count,
        frameworks: frameworks.len(),
    })
}

/// Validate a cross-border transaction
pub async fn validate(
    ctx: &AppContext,
    from: &str,
    to: &str,
    amount: Decimal,
    transaction_type: &str,
) -> Result<Evaluation, anyhow::Error> {
    Ok(ctx.engine.validate(from, to, amount, transaction_type).await?)
}

/// Build a compliance report
pub async fn report(
    ctx: &AppContext,
    jurisdiction: Option<&str>,
) -> Result<ComplianceReport, anyhow::Error> {
    Ok(ctx.engine.report(jurisdiction).await?)
}

/// Framework snapshots with derived scores
pub async fn frameworks(ctx: &AppContext) -> Vec<FrameworkSnapshot> {
    ctx.engine.framework_snapshots().await
}

/// Run one alert-generation tick
pub async fn tick(ctx: &AppContext) -> Result<TickSummary, anyhow::Error> {
    Ok(ctx.engine.run_tick().await?)
}

/// List open alerts, or every alert with `all`
pub async fn alerts(ctx: &AppContext, all: bool) -> Vec<Alert> {
    if all {
        ctx.engine.alerts().await
    } else {
        ctx.engine.open_alerts().await
    }
}

pub async fn resolve(ctx: &AppContext, alert_id: &str) -> Result<Alert, anyhow::Error> {
    Ok(ctx.engine.resolve_alert(alert_id).await?)
}

/// Record a manual review outcome
pub async fn review(
    ctx: &AppContext,
    framework_id: &str,
    requirement_id: &str,
    status: &str,
    reviewer: &str,
) -> Result<ReviewSummary, anyhow::Error> {
    let status: RequirementStatus = status.parse()?;
    let previous = ctx
        .engine
        .record_review(framework_id, requirement_id, status, reviewer)
        .await?;
    let snapshot = ctx.engine.framework(framework_id).await?;

    Ok(ReviewSummary {
        framework: framework_id.to_string(),
        requirement: requirement_id.to_string(),
        previous,
        status,
        compliance_score: snapshot.compliance_score,
    })
}

/// Show the loaded rule set
pub fn rules(ctx: &AppContext) -> RuleSetSummary {
    let store = ctx.engine.rules();
    RuleSetSummary {
        fingerprint: store.fingerprint(),
        count: store.len(),
        rules: store.rules().cloned().collect(),
    }
}

/// Analyze cost profiles from a JSON file
pub fn optimize(path: &Path) -> Result<OptimizationSummary, anyhow::Error> {
    let content = std::fs::read_to_string(path)?;
    let profiles: Vec<CostProfile> = serde_json::from_str(&content)?;

    let optimizations = optimization::analyze(&profiles)?;
    let total_savings = optimization::total_savings(&optimizations);

    Ok(OptimizationSummary {
        optimizations,
        total_savings,
    })
}

/// Run the periodic ticker
///
/// With `ticks`, stops after that many ticks. Otherwise runs until Ctrl-C.
pub async fn monitor(
    ctx: &AppContext,
    ticks: Option<u64>,
    interval_secs: Option<u64>,
) -> Result<MonitorSummary, anyhow::Error> {
    let period = interval_secs
        .map(Duration::from_secs)
        .unwrap_or_else(|| ctx.engine.config().tick_interval());

    let ticks = match ticks {
        Some(max) => Ticker::spawn_bounded(ctx.engine.clone(), period, max).join().await,
        None => {
            let ticker = Ticker::spawn(ctx.engine.clone(), period);
            tokio::signal::ctrl_c().await?;
            tracing::info!("Shutdown requested");
            ticker.shutdown().await
        }
    };

    Ok(MonitorSummary {
        ticks,
        open_alerts: ctx.engine.open_alerts().await.len(),
    })
}

fn write_json<T: Serialize + ?Sized>(path: &Path, value: &T) -> Result<(), anyhow::Error> {
    let json = serde_json::to_string_pretty(value)?;
    std::fs::write(path, json)?;
    Ok(())
}

/// Print a value as pretty JSON on stdout
pub fn print_json<T: Serialize + ?Sized>(value: &T) -> Result<(), anyhow::Error> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}
