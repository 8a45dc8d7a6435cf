//! The `finboard dashboard` command.

use crate::analytics::{Aggregator, Dashboard, Memo};
use crate::commands::{open, render, Out};
use crate::error::{ErrorType, IntoResult};
use crate::model::{OrgId, Snapshot};
use crate::{Config, Mode, Result};
use chrono::{DateTime, NaiveDate, Utc};
use std::time::Duration;
use tokio::time::{interval, MissedTickBehavior};
use tracing::{debug, info, warn};

/// Fetches all transactions and accounts and computes the dashboard as of `now` (default: the
/// current time).
///
/// # Errors
/// - Returns an error if the data source cannot be opened or a request fails.
pub async fn dashboard(
    config: &Config,
    mode: Mode,
    org: Option<OrgId>,
    now: Option<DateTime<Utc>>,
) -> Result<Out<Dashboard>> {
    let mut source = open(config, mode, org).await?;
    let snapshot = source.snapshot().await.pub_result(ErrorType::Request)?;
    let now = now.unwrap_or_else(Utc::now);
    let dashboard = Aggregator::new(*config.settings()).dashboard(&snapshot, now);
    Ok(out(&snapshot, dashboard))
}

/// Refetches every `secs` seconds and prints the dashboard whenever the data changed. Runs until
/// interrupted with Ctrl-C. A failed refetch is logged and retried on the next tick.
pub async fn dashboard_watch(
    config: &Config,
    mode: Mode,
    org: Option<OrgId>,
    now: Option<DateTime<Utc>>,
    secs: u64,
) -> Result<Out<()>> {
    let mut source = open(config, mode, org).await?;
    let mut watcher = Watcher::new(Aggregator::new(*config.settings()));
    let mut ticks = interval(Duration::from_secs(secs));
    ticks.set_missed_tick_behavior(MissedTickBehavior::Delay);
    info!("Refreshing every {secs}s, press Ctrl-C to stop");

    loop {
        tokio::select! {
            _ = ticks.tick() => {
                let snapshot = match source.snapshot().await {
                    Ok(snapshot) => snapshot,
                    Err(e) => {
                        warn!("Unable to refresh the dashboard: {e:#}");
                        continue;
                    }
                };
                let at = now.unwrap_or_else(Utc::now);
                match watcher.refresh(&snapshot, at) {
                    Some(dashboard) => out(&snapshot, dashboard.clone()).print(),
                    None => debug!("No changes"),
                }
            }
            signal = tokio::signal::ctrl_c() => {
                signal.pub_result(ErrorType::Io)?;
                break;
            }
        }
    }
    Ok("Stopped watching".into())
}

fn out(snapshot: &Snapshot, dashboard: Dashboard) -> Out<Dashboard> {
    let message = format!(
        "Dashboard over {} transactions and {} accounts",
        snapshot.transactions.len(),
        snapshot.accounts.len()
    );
    let table = render::dashboard(&dashboard);
    Out::new(message, dashboard).with_table(table)
}

/// Recomputes the dashboard only when the snapshot, or the day it is computed for, changes.
struct Watcher {
    aggregator: Aggregator,
    memo: Memo<Dashboard>,
}

impl Watcher {
    fn new(aggregator: Aggregator) -> Self {
        Self {
            aggregator,
            memo: Memo::new(),
        }
    }

    /// Returns the new dashboard, or `None` if it would be the same as the last one.
    fn refresh(&mut self, snapshot: &Snapshot, now: DateTime<Utc>) -> Option<&Dashboard> {
        let key: (&Snapshot, NaiveDate) = (snapshot, now.date_naive());
        if self.memo.is_current(&key) {
            return None;
        }
        let aggregator = self.aggregator;
        Some(
            self.memo
                .get_or_compute(&key, || aggregator.dashboard(snapshot, now)),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Amount, Transaction, TransactionType};
    use crate::test::{fixture_now, TestEnv};
    use chrono::Duration as ChronoDuration;

    #[tokio::test]
    async fn test_dashboard_offline() {
        let env = TestEnv::new().await;
        let out = dashboard(&env.config(), Mode::Offline, None, Some(fixture_now()))
            .await
            .unwrap();
        let dashboard = out.structure().unwrap();
        assert_eq!(dashboard.revenue.len(), 6);
        assert_eq!(dashboard.expenses.len(), 6);
        assert_eq!(dashboard.cashflow.len(), 6);
        assert_eq!(dashboard.recent.len(), 10);
        assert_eq!(dashboard.kpis.active_accounts.value, 3.0);
        assert_eq!(
            out.message(),
            "Dashboard over 42 transactions and 4 accounts"
        );
        assert!(out.table().unwrap().contains("Payroll"));
    }

    #[tokio::test]
    async fn test_dashboard_settings_come_from_config() {
        let env = TestEnv::new().await;
        let config = env.config();
        let json = std::fs::read_to_string(config.config_path()).unwrap();
        let mut value: serde_json::Value = serde_json::from_str(&json).unwrap();
        value["dashboard"]["revenue_window"] = serde_json::json!(2);
        value["dashboard"]["recent_transactions"] = serde_json::json!(3);
        std::fs::write(config.config_path(), value.to_string()).unwrap();

        let config = Config::load(config.root()).await.unwrap();
        let out = dashboard(&config, Mode::Offline, None, Some(fixture_now()))
            .await
            .unwrap();
        let dashboard = out.structure().unwrap();
        assert_eq!(dashboard.revenue.len(), 2);
        assert_eq!(dashboard.recent.len(), 3);
    }

    #[test]
    fn test_watcher_skips_unchanged_snapshots() {
        let mut watcher = Watcher::new(Aggregator::default());
        let now = fixture_now();
        let mut snapshot = crate::api::seed(now);

        assert!(watcher.refresh(&snapshot, now).is_some());
        assert!(watcher.refresh(&snapshot, now).is_none());
        assert!(watcher
            .refresh(&snapshot, now + ChronoDuration::hours(1))
            .is_none());

        snapshot.transactions.push(Transaction {
            id: "new".to_string(),
            kind: TransactionType::Income,
            amount: Amount::lenient("10"),
            date: Some("2024-03-30".to_string()),
            ..Default::default()
        });
        let refreshed = watcher.refresh(&snapshot, now).unwrap();
        assert_eq!(refreshed.recent[0].id, "new");

        assert!(watcher
            .refresh(&snapshot, now + ChronoDuration::days(1))
            .is_some());
    }
}
