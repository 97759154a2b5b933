//! Periodic tick driver
//!
//! Runs [`ComplianceEngine::run_tick`] on a fixed interval until shut down.
//! A failed tick is logged and the loop keeps going.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::{interval, MissedTickBehavior};

use crate::engine::ComplianceEngine;

/// Handle to a running ticker
pub struct Ticker {
    shutdown: watch::Sender<bool>,
    handle: JoinHandle<u64>,
}

impl Ticker {
    /// Spawn a ticker for `engine`. The first tick fires immediately.
    pub fn spawn(engine: Arc<ComplianceEngine>, period: Duration) -> Self {
        let (shutdown, rx) = watch::channel(false);
        let handle = tokio::spawn(tick_loop(engine, period, rx, None));
        Self { shutdown, handle }
    }

    /// Spawn a ticker that stops by itself after `max_ticks` ticks
    pub fn spawn_bounded(engine: Arc<ComplianceEngine>, period: Duration, max_ticks: u64) -> Self {
        let (shutdown, rx) = watch::channel(false);
        let handle = tokio::spawn(tick_loop(engine, period, rx, Some(max_ticks)));
        Self { shutdown, handle }
    }

    /// Wait for a bounded ticker to finish. Returns the number of ticks run.
    pub async fn join(self) -> u64 {
        match self.handle.await {
            Ok(ticks) => ticks,
            Err(e) => {
                tracing::error!(error = %e, "Compliance ticker task failed");
                0
            }
        }
    }

    /// Signal shutdown and wait. Returns the number of ticks run.
    pub async fn shutdown(self) -> u64 {
        let _ = self.shutdown.send(true);
        self.join().await
    }
}

async fn tick_loop(
    engine: Arc<ComplianceEngine>,
    period: Duration,
    mut shutdown: watch::Receiver<bool>,
    max_ticks: Option<u64>,
) -> u64 {
    let mut ticker = interval(period);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
    let mut ticks = 0u64;

    tracing::info!(period_ms = period.as_millis() as u64, "Compliance ticker started");

    loop {
        if max_ticks.is_some_and(|max| ticks >= max) {
            break;
        }

        tokio::select! {
            _ = ticker.tick() => {
                ticks += 1;
                match engine.run_tick().await {
                    Ok(summary) => tracing::info!(
                        tick = ticks,
                        scanned = summary.requirements_scanned,
                        checks = summary.checks_run,
                        raised = summary.alerts_raised,
                        suppressed = summary.duplicates_suppressed,
                        timed_out = summary.timed_out,
                        "Tick completed"
                    ),
                    Err(e) => tracing::error!(tick = ticks, error = %e, "Tick failed"),
                }
            }
            changed = shutdown.changed() => {
                if changed.is_err() || *shutdown.borrow() {
                    break;
                }
            }
        }
    }

    tracing::info!(ticks, "Compliance ticker stopped");
    ticks
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::check::StaticCheck;
    use crate::framework::{Framework, FrameworkKind, Requirement, RequirementStatus};
    use chrono::Utc;
    use pulse_core::{Jurisdiction, Severity};

    fn engine() -> Arc<ComplianceEngine> {
        let check = Arc::new(StaticCheck::new());
        check.set("sox", "sox-302", RequirementStatus::NotMet);
        let framework = Framework::new("sox", "SOX", Jurisdiction::Us, FrameworkKind::Financial)
            .with_requirement(
                Requirement::new(
                    "sox-302",
                    "Certification",
                    Severity::Critical,
                    RequirementStatus::Met,
                    Utc::now() + chrono::Duration::days(90),
                )
                .automated(),
            );
        Arc::new(
            ComplianceEngine::builder()
                .framework(framework)
                .check(check)
                .build()
                .unwrap(),
        )
    }

    #[tokio::test(start_paused = true)]
    async fn test_bounded_ticker_runs_exact_count() {
        let engine = engine();
        let ticker = Ticker::spawn_bounded(engine.clone(), Duration::from_secs(300), 3);

        assert_eq!(ticker.join().await, 3);
        // Raised once, suppressed on the following ticks
        assert_eq!(engine.alerts().await.len(), 1);
        assert_eq!(engine.suppressed_alert_count().await, 2);
    }

    struct PanickingCheck;

    #[async_trait::async_trait]
    impl crate::check::RequirementCheck for PanickingCheck {
        fn name(&self) -> &str {
            "Panicking"
        }

        async fn check(
            &self,
            _framework_id: &str,
            _requirement: &Requirement,
        ) -> crate::error::ComplianceResult<RequirementStatus> {
            panic!("check crashed")
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_join_reports_crashed_task() {
        let framework = Framework::new("sox", "SOX", Jurisdiction::Us, FrameworkKind::Financial)
            .with_requirement(
                Requirement::new(
                    "sox-302",
                    "Certification",
                    Severity::Critical,
                    RequirementStatus::Met,
                    Utc::now() + chrono::Duration::days(90),
                )
                .automated(),
            );
        let engine = Arc::new(
            ComplianceEngine::builder()
                .framework(framework)
                .check(Arc::new(PanickingCheck))
                .build()
                .unwrap(),
        );

        let ticker = Ticker::spawn_bounded(engine, Duration::from_secs(300), 3);
        assert_eq!(ticker.join().await, 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_shutdown_stops_ticker() {
        let engine = engine();
        let ticker = Ticker::spawn(engine.clone(), Duration::from_secs(300));

        tokio::time::sleep(Duration::from_secs(650)).await;
        let ticks = ticker.shutdown().await;

        // t=0, t=300, t=600
        assert_eq!(ticks, 3);
    }
}
