//! Integration tests for the Pulse CLI
//!
//! These tests drive the commands against a temporary data directory and
//! verify that state survives a context restart through the ledger.

use pulse_cli::{commands, AppContext};
use pulse_compliance::{FrameworkStatus, OptimizationType, RequirementStatus, RiskLevel};
use rust_decimal_macros::dec;
use tempfile::TempDir;

#[tokio::test]
async fn test_init_then_validate() {
    let temp_dir = TempDir::new().unwrap();
    let data_path = temp_dir.path();

    let summary = commands::init(data_path).unwrap();
    assert_eq!(summary.frameworks, 4);
    assert!(summary.rules > 0);
    assert!(commands::init(data_path).is_err());

    let ctx = AppContext::new(data_path).unwrap();
    assert!(ctx.is_initialized());

    let eval = commands::validate(&ctx, "us", "eu", dec!(5000), "payment")
        .await
        .unwrap();
    assert!(eval.allowed);

    let gap = commands::validate(&ctx, "CA", "JP", dec!(100), "invoice")
        .await
        .unwrap();
    assert!(gap.is_config_gap());

    assert!(commands::validate(&ctx, "US", "EU", dec!(0), "payment")
        .await
        .is_err());
}

#[tokio::test]
async fn test_uninitialized_directory_uses_builtins() {
    let temp_dir = TempDir::new().unwrap();
    let ctx = AppContext::new(temp_dir.path()).unwrap();

    assert!(!ctx.is_initialized());
    assert_eq!(commands::frameworks(&ctx).await.len(), 4);
    assert!(ctx.ledger_path().exists());
}

#[tokio::test]
async fn test_state_survives_restart() {
    let temp_dir = TempDir::new().unwrap();
    let data_path = temp_dir.path();
    commands::init(data_path).unwrap();

    let alert_id = {
        let ctx = AppContext::new(data_path).unwrap();
        let summary = commands::tick(&ctx).await.unwrap();
        assert_eq!(summary.alerts_raised, 2);

        let review = commands::review(&ctx, "sox", "sox-404", "met", "auditor")
            .await
            .unwrap();
        assert_eq!(review.previous, RequirementStatus::Partial);
        assert_eq!(review.compliance_score, 100);

        let alerts = commands::alerts(&ctx, false).await;
        commands::resolve(&ctx, &alerts[0].id).await.unwrap();
        alerts[0].id.clone()
    };

    let ctx = AppContext::new(data_path).unwrap();

    let open = commands::alerts(&ctx, false).await;
    let all = commands::alerts(&ctx, true).await;
    assert_eq!(open.len(), 1);
    assert_eq!(all.len(), 2);
    assert!(all.iter().any(|a| a.id == alert_id && a.resolved));

    let report = commands::report(&ctx, Some("US")).await.unwrap();
    let sox = report.frameworks.iter().find(|f| f.id == "sox").unwrap();
    assert_eq!(sox.status, FrameworkStatus::Compliant);

    assert!(commands::resolve(&ctx, &alert_id).await.is_err());
}

#[tokio::test]
async fn test_review_rejects_unknown_status() {
    let temp_dir = TempDir::new().unwrap();
    let ctx = AppContext::new(temp_dir.path()).unwrap();

    assert!(commands::review(&ctx, "sox", "sox-404", "done", "auditor")
        .await
        .is_err());
    assert!(commands::review(&ctx, "sox", "missing", "met", "auditor")
        .await
        .is_err());
}

#[tokio::test]
async fn test_custom_rules_file() {
    let temp_dir = TempDir::new().unwrap();
    let data_path = temp_dir.path();

    std::fs::write(
        data_path.join("rules.json"),
        r#"[
            {
                "from": "CA",
                "to": "JP",
                "transaction_type": "invoice",
                "min_amount": "0",
                "max_amount": "50000",
                "reporting_threshold": "20000",
                "required_documents": ["Commercial invoice"]
            }
        ]"#,
    )
    .unwrap();

    let ctx = AppContext::new(data_path).unwrap();
    let rules = commands::rules(&ctx);
    assert_eq!(rules.count, 1);
    assert_eq!(rules.fingerprint.len(), 64);

    let eval = commands::validate(&ctx, "CA", "JP", dec!(25000), "invoice")
        .await
        .unwrap();
    assert!(eval.allowed);
    assert_eq!(eval.warnings.len(), 1);

    let gap = commands::validate(&ctx, "US", "EU", dec!(100), "payment")
        .await
        .unwrap();
    assert!(gap.is_config_gap());
}

#[test]
fn test_optimize_from_file() {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("costs.json");
    std::fs::write(
        &path,
        r#"[
            {"category": "vendor", "current_cost": "12000", "benchmark_cost": "10000", "volatility": "0.1"},
            {"category": "subscription", "current_cost": "500", "benchmark_cost": "600"},
            {"category": "tax", "current_cost": "40000", "benchmark_cost": "38000", "volatility": "0.3"}
        ]"#,
    )
    .unwrap();

    let summary = commands::optimize(&path).unwrap();
    assert_eq!(summary.optimizations.len(), 2);
    assert_eq!(summary.total_savings, dec!(4000));

    // 5% cut, but tax restructuring is never below medium
    let tax = summary
        .optimizations
        .iter()
        .find(|o| o.optimization_type == OptimizationType::Tax)
        .unwrap();
    assert_eq!(tax.savings.value(), dec!(2000));
    assert_eq!(tax.risk_level, RiskLevel::Medium);
}

#[tokio::test(start_paused = true)]
async fn test_monitor_runs_bounded_ticks() {
    let temp_dir = TempDir::new().unwrap();
    let ctx = AppContext::new(temp_dir.path()).unwrap();

    let summary = commands::monitor(&ctx, Some(3), Some(60)).await.unwrap();
    assert_eq!(summary.ticks, 3);
    assert_eq!(summary.open_alerts, 2);
}
