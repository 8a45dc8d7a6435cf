//! Transaction command handlers.

use crate::analytics::{filter_and_sort, transaction_rows, TransactionFilter, TransactionRow};
use crate::args::{CreateTransactionArgs, UpdateTransactionArgs};
use crate::commands::{open, plural, render, require_changes, Out};
use crate::error::{ErrorType, IntoResult};
use crate::model::{Amount, OrgId, Transaction, TransactionDate};
use crate::{utils, Config, Mode, Result};
use anyhow::{bail, Context};
use serde::Serialize;
use std::path::Path;
use tracing::debug;

/// Lists the transactions that pass `filter`, newest first, at most `limit` of them.
pub async fn transactions_list(
    config: &Config,
    mode: Mode,
    org: Option<OrgId>,
    filter: TransactionFilter,
    limit: Option<usize>,
) -> Result<Out<Vec<TransactionRow>>> {
    let mut source = open(config, mode, org).await?;
    let all = source
        .list_transactions()
        .await
        .pub_result(ErrorType::Request)?;
    let matching = filter_and_sort(&all, &filter);
    let rows = transaction_rows(&matching, limit.unwrap_or(usize::MAX));
    debug!("{} of {} transactions match", matching.len(), all.len());
    let message = if rows.len() < matching.len() {
        format!(
            "Showing {} of {} matching transactions",
            rows.len(),
            matching.len()
        )
    } else {
        format!("Found {} transaction{}", rows.len(), plural(rows.len()))
    };
    let table = render::rows(&rows);
    Ok(Out::new(message, rows).with_table(table))
}

pub async fn transactions_show(
    config: &Config,
    mode: Mode,
    org: Option<OrgId>,
    id: &str,
) -> Result<Out<Transaction>> {
    let mut source = open(config, mode, org).await?;
    let txn = source
        .get_transaction(id)
        .await
        .pub_result(ErrorType::Request)?;
    let table = render::transaction(&txn);
    Ok(Out::new(format!("Transaction {id}"), txn).with_table(table))
}

/// Creates a transaction.
///
/// # Errors
/// - Returns an error if the amount is negative or the date cannot be parsed.
/// - Returns an error if the backend rejects the request.
pub async fn transactions_create(
    config: &Config,
    mode: Mode,
    org: Option<OrgId>,
    args: CreateTransactionArgs,
) -> Result<Out<Transaction>> {
    validate(Some(args.amount()), args.date()).pub_result(ErrorType::Config)?;
    let mut source = open(config, mode, org).await?;
    let txn = source
        .create_transaction(args.request())
        .await
        .pub_result(ErrorType::Request)?;
    let table = render::transaction(&txn);
    Ok(Out::new(format!("Created transaction {}", txn.id), txn).with_table(table))
}

/// Changes the fields given in `args`. Fields that are not given keep their values.
///
/// # Errors
/// - Returns an error if no field is given, the amount is negative or the date cannot be parsed.
/// - Returns an error if the transaction does not exist.
pub async fn transactions_update(
    config: &Config,
    mode: Mode,
    org: Option<OrgId>,
    args: UpdateTransactionArgs,
) -> Result<Out<Transaction>> {
    let request = args.request();
    require_changes(request.is_empty()).pub_result(ErrorType::Config)?;
    validate(args.amount(), args.date()).pub_result(ErrorType::Config)?;
    let mut source = open(config, mode, org).await?;
    let txn = source
        .update_transaction(args.id(), request)
        .await
        .pub_result(ErrorType::Request)?;
    let table = render::transaction(&txn);
    Ok(Out::new(format!("Updated transaction {}", txn.id), txn).with_table(table))
}

pub async fn transactions_delete(
    config: &Config,
    mode: Mode,
    org: Option<OrgId>,
    id: &str,
) -> Result<Out<()>> {
    let mut source = open(config, mode, org).await?;
    source
        .delete_transaction(id)
        .await
        .pub_result(ErrorType::Request)?;
    Ok(format!("Deleted transaction {id}").into())
}

/// Writes the transactions that pass `filter`, newest first, to a CSV file at `output`.
pub async fn transactions_export(
    config: &Config,
    mode: Mode,
    org: Option<OrgId>,
    filter: TransactionFilter,
    output: &Path,
) -> Result<Out<usize>> {
    let mut source = open(config, mode, org).await?;
    let all = source
        .list_transactions()
        .await
        .pub_result(ErrorType::Request)?;
    let matching = filter_and_sort(&all, &filter);
    let csv = to_csv(&matching).pub_result(ErrorType::Io)?;
    utils::write(output, csv).await.pub_result(ErrorType::Io)?;
    let count = matching.len();
    Ok(Out::new(
        format!(
            "Exported {count} transaction{} to {}",
            plural(count),
            output.display()
        ),
        count,
    ))
}

fn validate(amount: Option<Amount>, date: Option<&str>) -> Result<()> {
    if let Some(amount) = amount {
        if amount.value().is_sign_negative() && !amount.is_zero() {
            bail!("The amount must not be negative, use --type to set the direction");
        }
    }
    if let Some(date) = date {
        if TransactionDate::parse(date).is_none() {
            bail!("Unable to parse the date '{date}', use YYYY-MM-DD or an RFC 3339 timestamp");
        }
    }
    Ok(())
}

#[derive(Debug, Serialize)]
struct CsvRow<'a> {
    id: &'a str,
    date: &'a str,
    #[serde(rename = "type")]
    kind: String,
    description: String,
    category: &'a str,
    amount: String,
    currency: &'a str,
    from_account: &'a str,
    to_account: &'a str,
    tags: String,
}

impl<'a> From<&'a Transaction> for CsvRow<'a> {
    fn from(txn: &'a Transaction) -> Self {
        Self {
            id: &txn.id,
            date: txn.date.as_deref().unwrap_or_default(),
            kind: txn.kind.to_string(),
            description: txn.description_or_default(),
            category: txn.category_or_default(),
            amount: txn.amount.to_string(),
            currency: &txn.currency,
            from_account: txn.from_account_id.as_deref().unwrap_or_default(),
            to_account: txn.to_account_id.as_deref().unwrap_or_default(),
            tags: txn.tags.join(";"),
        }
    }
}

fn to_csv(transactions: &[Transaction]) -> Result<Vec<u8>> {
    let mut writer = csv::Writer::from_writer(Vec::new());
    for txn in transactions {
        writer
            .serialize(CsvRow::from(txn))
            .with_context(|| format!("Unable to write transaction {} as CSV", txn.id))?;
    }
    writer
        .into_inner()
        .map_err(|e| anyhow::anyhow!("Unable to finish the CSV output: {e}"))
}
