use crate::analytics::{Aggregator, Report, TransactionFilter};
use crate::commands::{open, render, Out};
use crate::error::{ErrorType, IntoResult};
use crate::model::OrgId;
use crate::{Config, Mode, Result};
use anyhow::bail;
use chrono::{DateTime, Utc};

/// Computes the report as of `now` (default: the current time) over the transactions inside the
/// filter's date range. The summary compares the trailing year with the year before it.
///
/// # Errors
/// - Returns an error if `since` is after `until`, or if fetching the transactions fails.
pub async fn report(
    config: &Config,
    mode: Mode,
    org: Option<OrgId>,
    filter: TransactionFilter,
    now: Option<DateTime<Utc>>,
) -> Result<Out<Report>> {
    check_range(&filter).pub_result(ErrorType::Config)?;
    let mut source = open(config, mode, org).await?;
    let transactions = source
        .list_transactions()
        .await
        .pub_result(ErrorType::Request)?;
    let now = now.unwrap_or_else(Utc::now);
    let report = Aggregator::new(*config.settings()).report(&transactions, &filter, now);
    let message = match (filter.since, filter.until) {
        (None, None) => "Report over all transactions".to_string(),
        (Some(since), None) => format!("Report from {since}"),
        (None, Some(until)) => format!("Report up to {until}"),
        (Some(since), Some(until)) => format!("Report from {since} to {until}"),
    };
    let table = render::report(&report);
    Ok(Out::new(message, report).with_table(table))
}

fn check_range(filter: &TransactionFilter) -> Result<()> {
    if let (Some(since), Some(until)) = (filter.since, filter.until) {
        if since > until {
            bail!("--from {since} is after --to {until}");
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test::{fixture_now, TestEnv};
    use chrono::NaiveDate;

    #[tokio::test]
    async fn test_report_over_all_months() {
        let env = TestEnv::new().await;
        let out = report(
            &env.config(),
            Mode::Offline,
            None,
            TransactionFilter::default(),
            Some(fixture_now()),
        )
        .await
        .unwrap();
        let report = out.structure().unwrap();
        assert_eq!(report.cashflow.len(), 6);
        assert_eq!(report.revenue.len(), 6);
        assert_eq!(out.message(), "Report over all transactions");
    }

    #[tokio::test]
    async fn test_report_date_range_limits_series() {
        let env = TestEnv::new().await;
        let filter = TransactionFilter {
            since: NaiveDate::from_ymd_opt(2024, 1, 1),
            until: NaiveDate::from_ymd_opt(2024, 2, 29),
            ..Default::default()
        };
        let out = report(&env.config(), Mode::Offline, None, filter, Some(fixture_now()))
            .await
            .unwrap();
        let report = out.structure().unwrap();
        let months: Vec<u32> = report.cashflow.iter().map(|p| p.month_number).collect();
        assert_eq!(months, vec![1, 2]);
        // Sales 12,500 twice, consulting 3,200 in January and 4,000 in February.
        assert_eq!(report.summary.revenue.value, 32200.0);
        assert_eq!(out.message(), "Report from 2024-01-01 to 2024-02-29");
    }

    #[tokio::test]
    async fn test_report_inverted_range() {
        let env = TestEnv::new().await;
        let filter = TransactionFilter {
            since: NaiveDate::from_ymd_opt(2024, 3, 1),
            until: NaiveDate::from_ymd_opt(2024, 1, 1),
            ..Default::default()
        };
        let err = report(&env.config(), Mode::Offline, None, filter, None)
            .await
            .unwrap_err();
        assert_eq!(err.to_string(), "config error");
    }
}
