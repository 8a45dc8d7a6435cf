//! Implements the `DataSource` trait over an in-memory `Snapshot`, optionally persisted to a JSON
//! file.
//!
//! Note: this is compiled even in the "production" version of this app so that the whole app can
//! run, top-to-bottom, without a backend.

use crate::api::DataSource;
use crate::model::{
    Account, AccountType, Amount, CreateAccountRequest, CreateOrganizationRequest,
    CreateTransactionRequest, OrgId, Organization, OrganizationSummary, Role, Snapshot,
    Transaction, TransactionType, UpdateAccountRequest, UpdateOrganizationRequest,
    UpdateTransactionRequest, User,
};
use crate::{utils, Result};
use anyhow::{bail, Context};
use chrono::{DateTime, Datelike, Months, SecondsFormat, Utc};
use rust_decimal::Decimal;
use std::path::{Path, PathBuf};
use tracing::{debug, info};
use uuid::Uuid;

const OFFLINE_ORG: &str = "offline";
const OFFLINE_ORG_NAME: &str = "Offline workspace";

/// A `DataSource` that keeps everything in memory. When opened from a file every change is
/// written back to that file.
#[derive(Debug, Clone)]
pub(crate) struct SnapshotSource {
    snapshot: Snapshot,
    path: Option<PathBuf>,
    org: Option<OrgId>,
}

impl SnapshotSource {
    /// An in-memory source that is never written to disk.
    #[cfg(test)]
    pub(crate) fn new(snapshot: Snapshot) -> Self {
        Self {
            snapshot,
            path: None,
            org: None,
        }
    }

    /// Loads the snapshot at `path`, or seeds demo data and saves it there if the file does not
    /// exist.
    pub(crate) async fn open(path: impl Into<PathBuf>, org: Option<OrgId>) -> Result<Self> {
        let path = path.into();
        let snapshot = if path.is_file() {
            utils::deserialize(&path)
                .await
                .context("Unable to load the offline snapshot")?
        } else {
            info!(
                "No offline snapshot at {}, seeding demo data",
                path.display()
            );
            let seeded = seed(Utc::now());
            save(&path, &seeded).await?;
            seeded
        };
        Ok(Self {
            snapshot,
            path: Some(path),
            org,
        })
    }

    #[cfg(test)]
    pub(crate) fn snapshot(&self) -> &Snapshot {
        &self.snapshot
    }

    async fn persist(&self) -> Result<()> {
        match &self.path {
            Some(path) => save(path, &self.snapshot).await,
            None => Ok(()),
        }
    }

    fn org_id(&self) -> String {
        self.org
            .as_ref()
            .map(|org| org.to_string())
            .unwrap_or_else(|| OFFLINE_ORG.to_string())
    }

    fn transaction_mut(&mut self, id: &str) -> Result<&mut Transaction> {
        match self.snapshot.transactions.iter_mut().find(|t| t.id == id) {
            Some(txn) => Ok(txn),
            None => bail!("Transaction '{id}' not found"),
        }
    }

    fn account_mut(&mut self, id: &str) -> Result<&mut Account> {
        match self.snapshot.accounts.iter_mut().find(|a| a.id == id) {
            Some(account) => Ok(account),
            None => bail!("Account '{id}' not found"),
        }
    }

    /// The stored organizations, or a single stand-in for the selected one when none are stored.
    fn organizations(&self) -> Vec<Organization> {
        if !self.snapshot.organizations.is_empty() {
            return self.snapshot.organizations.clone();
        }
        vec![Organization {
            id: self.org_id(),
            name: OFFLINE_ORG_NAME.to_string(),
            role: Role::Admin,
            created_at: None,
            updated_at: None,
        }]
    }

    fn organization_mut(&mut self, id: &str) -> Result<&mut Organization> {
        if self.snapshot.organizations.is_empty() {
            self.snapshot.organizations = self.organizations();
        }
        match self.snapshot.organizations.iter_mut().find(|o| o.id == id) {
            Some(org) => Ok(org),
            None => bail!("Organization '{id}' not found"),
        }
    }
}

/// Counts and balance totals the way the organization summary endpoint reports them. Liabilities
/// are reported as a positive amount owed, whatever the sign of the stored balance.
pub(crate) fn summarize(org: &Organization, snapshot: &Snapshot) -> OrganizationSummary {
    let mut assets = Decimal::ZERO;
    let mut liabilities = Decimal::ZERO;
    for account in &snapshot.accounts {
        let balance = account.balance.value();
        match account.kind {
            AccountType::Asset => assets = assets.saturating_add(balance),
            AccountType::Liability => liabilities = liabilities.saturating_add(balance.abs()),
            _ => {}
        }
    }
    OrganizationSummary {
        id: org.id.clone(),
        name: org.name.clone(),
        accounts_count: snapshot.accounts.len(),
        transactions_count: snapshot.transactions.len(),
        members_count: 1,
        total_assets: Amount::from(assets),
        total_liabilities: Amount::from(liabilities),
        net_worth: Amount::from(assets.saturating_sub(liabilities)),
    }
}

/// Writes `snapshot` to `path` as pretty JSON.
pub(crate) async fn save(path: &Path, snapshot: &Snapshot) -> Result<()> {
    utils::serialize(path, snapshot)
        .await
        .context("Unable to save the offline snapshot")?;
    debug!("Saved offline snapshot to {}", path.display());
    Ok(())
}

#[async_trait::async_trait]
impl DataSource for SnapshotSource {
    async fn list_transactions(&mut self) -> Result<Vec<Transaction>> {
        Ok(self.snapshot.transactions.clone())
    }

    async fn get_transaction(&mut self, id: &str) -> Result<Transaction> {
        self.transaction_mut(id).map(|txn| txn.clone())
    }

    async fn create_transaction(
        &mut self,
        request: CreateTransactionRequest,
    ) -> Result<Transaction> {
        let txn = Transaction::from_request(
            Uuid::new_v4().to_string(),
            Some(self.org_id()),
            request,
            Utc::now(),
        );
        self.snapshot.transactions.push(txn.clone());
        self.persist().await?;
        Ok(txn)
    }

    async fn update_transaction(
        &mut self,
        id: &str,
        request: UpdateTransactionRequest,
    ) -> Result<Transaction> {
        let txn = self.transaction_mut(id)?;
        txn.apply(request, Utc::now());
        let updated = txn.clone();
        self.persist().await?;
        Ok(updated)
    }

    async fn delete_transaction(&mut self, id: &str) -> Result<()> {
        let before = self.snapshot.transactions.len();
        self.snapshot.transactions.retain(|t| t.id != id);
        if self.snapshot.transactions.len() == before {
            bail!("Transaction '{id}' not found");
        }
        self.persist().await
    }

    async fn list_accounts(&mut self) -> Result<Vec<Account>> {
        Ok(self.snapshot.accounts.clone())
    }

    async fn get_account(&mut self, id: &str) -> Result<Account> {
        self.account_mut(id).map(|account| account.clone())
    }

    async fn create_account(&mut self, request: CreateAccountRequest) -> Result<Account> {
        let account = Account::from_request(
            Uuid::new_v4().to_string(),
            Some(self.org_id()),
            request,
            Utc::now(),
        );
        self.snapshot.accounts.push(account.clone());
        self.persist().await?;
        Ok(account)
    }

    async fn update_account(&mut self, id: &str, request: UpdateAccountRequest) -> Result<Account> {
        let account = self.account_mut(id)?;
        account.apply(request, Utc::now());
        let updated = account.clone();
        self.persist().await?;
        Ok(updated)
    }

    async fn delete_account(&mut self, id: &str) -> Result<()> {
        let before = self.snapshot.accounts.len();
        self.snapshot.accounts.retain(|a| a.id != id);
        if self.snapshot.accounts.len() == before {
            bail!("Account '{id}' not found");
        }
        self.persist().await
    }

    async fn list_organizations(&mut self) -> Result<Vec<Organization>> {
        Ok(self.organizations())
    }

    async fn create_organization(
        &mut self,
        request: CreateOrganizationRequest,
    ) -> Result<Organization> {
        let now = Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true);
        let org = Organization {
            id: Uuid::new_v4().to_string(),
            name: request.name,
            role: Role::Admin,
            created_at: Some(now.clone()),
            updated_at: Some(now),
        };
        self.snapshot.organizations = self.organizations();
        self.snapshot.organizations.push(org.clone());
        self.persist().await?;
        Ok(org)
    }

    async fn update_organization(
        &mut self,
        id: &str,
        request: UpdateOrganizationRequest,
    ) -> Result<Organization> {
        let org = self.organization_mut(id)?;
        org.name = request.name;
        org.updated_at = Some(Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true));
        let updated = org.clone();
        self.persist().await?;
        Ok(updated)
    }

    async fn organization_summary(&mut self, id: &str) -> Result<OrganizationSummary> {
        match self.organizations().iter().find(|o| o.id == id) {
            Some(org) => Ok(summarize(org, &self.snapshot)),
            None => bail!("Organization '{id}' not found"),
        }
    }

    async fn current_user(&mut self) -> Result<User> {
        match &self.snapshot.user {
            Some(user) => Ok(user.clone()),
            None => bail!("The offline snapshot has no user, run 'finboard pull' while logged in"),
        }
    }
}

/// Demo data covering the six months up to `now`.
pub(crate) fn seed(now: DateTime<Utc>) -> Snapshot {
    let accounts = vec![
        seed_account("acc-checking", "Operating Checking", AccountType::Asset, "48250.00", true),
        seed_account("acc-savings", "Reserve Savings", AccountType::Asset, "120000.00", true),
        seed_account("acc-card", "Company Card", AccountType::Liability, "-3420.18", true),
        seed_account("acc-legacy", "Old Payroll Account", AccountType::Asset, "0", false),
    ];

    let mut transactions = Vec::new();
    for months_ago in (0..6u32).rev() {
        let Some(month) = now.checked_sub_months(Months::new(months_ago)) else {
            continue;
        };
        let growth = Amount::from(rust_decimal::Decimal::from(800 * (6 - months_ago)));
        let mut push = |kind, amount: &str, day: u32, description: &str, category: Option<&str>| {
            let n = transactions.len() + 1;
            transactions.push(Transaction {
                id: format!("seed-txn-{n:03}"),
                organization_id: Some(OFFLINE_ORG.to_string()),
                kind,
                amount: Amount::lenient(amount),
                currency: "USD".to_string(),
                description: Some(description.to_string()),
                date: Some(day_of(month, day)),
                category: category.map(str::to_string),
                tags: Vec::new(),
                from_account_id: None,
                to_account_id: None,
                created_at: None,
                updated_at: None,
            });
        };
        push(TransactionType::Income, "12500.00", 3, "Client retainer", Some("Sales"));
        push(TransactionType::Income, &growth.to_string(), 18, "Consulting hours", Some("Services"));
        push(TransactionType::Expense, "3200.00", 1, "Office rent", Some("Rent"));
        push(TransactionType::Expense, "6100.00", 25, "Payroll", Some("Payroll"));
        push(TransactionType::Expense, "449.99", 9, "Software subscriptions", Some("Software"));
        push(TransactionType::Expense, "275.40", 14, "Team lunch", None);
        push(TransactionType::Transfer, "2000.00", 28, "Move to reserve", None);
    }

    for txn in transactions.iter_mut() {
        match txn.kind {
            TransactionType::Income => txn.to_account_id = Some("acc-checking".to_string()),
            TransactionType::Expense => txn.from_account_id = Some("acc-checking".to_string()),
            TransactionType::Transfer => {
                txn.from_account_id = Some("acc-checking".to_string());
                txn.to_account_id = Some("acc-savings".to_string());
            }
        }
    }

    Snapshot {
        transactions,
        accounts,
        organizations: vec![Organization {
            id: OFFLINE_ORG.to_string(),
            name: OFFLINE_ORG_NAME.to_string(),
            role: Role::Admin,
            created_at: None,
            updated_at: None,
        }],
        user: Some(User {
            id: "offline-user".to_string(),
            email: "demo@finboard.local".to_string(),
            name: Some("Demo User".to_string()),
            created_at: None,
            updated_at: None,
        }),
    }
}

fn seed_account(id: &str, name: &str, kind: AccountType, balance: &str, active: bool) -> Account {
    Account {
        id: id.to_string(),
        organization_id: Some(OFFLINE_ORG.to_string()),
        name: name.to_string(),
        kind,
        balance: Amount::lenient(balance),
        currency: "USD".to_string(),
        description: None,
        is_active: active,
        created_at: None,
        updated_at: None,
    }
}

/// Noon UTC on `day` of the month containing `date`, clamped to days that exist in every month.
fn day_of(date: DateTime<Utc>, day: u32) -> String {
    let day = day.clamp(1, 28);
    date.with_day(day)
        .unwrap_or(date)
        .date_naive()
        .and_hms_opt(12, 0, 0)
        .map(|naive| naive.and_utc())
        .unwrap_or(date)
        .to_rfc3339_opts(SecondsFormat::Millis, true)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_open_seeds_and_persists() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("offline.json");
        let mut source = SnapshotSource::open(&path, None).await.unwrap();
        assert!(path.is_file());
        assert_eq!(source.list_accounts().await.unwrap().len(), 4);
        assert_eq!(source.list_transactions().await.unwrap().len(), 42);

        let created = source
            .create_transaction(CreateTransactionRequest::new(
                TransactionType::Income,
                Amount::lenient("10"),
            ))
            .await
            .unwrap();
        assert!(Uuid::parse_str(&created.id).is_ok());
        assert_eq!(created.organization_id.as_deref(), Some("offline"));

        let reopened = SnapshotSource::open(&path, None).await.unwrap();
        assert_eq!(reopened.snapshot().transactions.len(), 43);
    }

    #[tokio::test]
    async fn test_crud_in_memory() {
        let mut source = SnapshotSource::new(Snapshot::default());
        let account = source
            .create_account(CreateAccountRequest::new("Cash", AccountType::Asset))
            .await
            .unwrap();
        assert!(account.is_active);

        let updated = source
            .update_account(
                &account.id,
                UpdateAccountRequest {
                    name: Some("Petty cash".to_string()),
                    ..Default::default()
                },
            )
            .await
            .unwrap();
        assert_eq!(updated.name, "Petty cash");
        assert_eq!(
            source.get_account(&account.id).await.unwrap().name,
            "Petty cash"
        );

        source.delete_account(&account.id).await.unwrap();
        assert!(source.get_account(&account.id).await.is_err());
        assert!(source.delete_account(&account.id).await.is_err());
    }

    #[tokio::test]
    async fn test_update_missing_transaction() {
        let mut source = SnapshotSource::new(Snapshot::default());
        let err = source
            .update_transaction("nope", UpdateTransactionRequest::default())
            .await
            .unwrap_err();
        assert!(err.to_string().contains("not found"));
    }

    #[tokio::test]
    async fn test_org_is_stamped_on_created_records() {
        let mut source = SnapshotSource::new(Snapshot::default());
        source.org = Some(OrgId::new("org-9"));
        let orgs = source.list_organizations().await.unwrap();
        assert_eq!(orgs[0].id, "org-9");
        let txn = source
            .create_transaction(CreateTransactionRequest::new(
                TransactionType::Expense,
                Amount::lenient("1"),
            ))
            .await
            .unwrap();
        assert_eq!(txn.organization_id.as_deref(), Some("org-9"));
    }

    #[tokio::test]
    async fn test_organizations_create_rename_persist() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("offline.json");
        let mut source = SnapshotSource::open(&path, None).await.unwrap();

        let created = source
            .create_organization(CreateOrganizationRequest {
                name: "Acme".to_string(),
            })
            .await
            .unwrap();
        assert_eq!(created.role, Role::Admin);
        let renamed = source
            .update_organization(
                &created.id,
                UpdateOrganizationRequest {
                    name: "Acme Ltd".to_string(),
                },
            )
            .await
            .unwrap();
        assert_eq!(renamed.name, "Acme Ltd");

        let mut reopened = SnapshotSource::open(&path, None).await.unwrap();
        let names: Vec<String> = reopened
            .list_organizations()
            .await
            .unwrap()
            .into_iter()
            .map(|org| org.name)
            .collect();
        assert_eq!(names, vec![OFFLINE_ORG_NAME, "Acme Ltd"]);
        assert!(reopened
            .update_organization(
                "org-404",
                UpdateOrganizationRequest {
                    name: "x".to_string()
                }
            )
            .await
            .is_err());
    }

    #[tokio::test]
    async fn test_rename_stand_in_organization() {
        let mut source = SnapshotSource::new(Snapshot::default());
        let renamed = source
            .update_organization(
                OFFLINE_ORG,
                UpdateOrganizationRequest {
                    name: "Books".to_string(),
                },
            )
            .await
            .unwrap();
        assert_eq!(renamed.name, "Books");
        assert_eq!(source.list_organizations().await.unwrap(), vec![renamed]);
    }

    #[tokio::test]
    async fn test_summary_of_seeded_organization() {
        let now = Utc.with_ymd_and_hms(2024, 3, 15, 0, 0, 0).unwrap();
        let mut source = SnapshotSource::new(seed(now));
        let summary = source.organization_summary(OFFLINE_ORG).await.unwrap();
        assert_eq!(summary.name, OFFLINE_ORG_NAME);
        assert_eq!(summary.accounts_count, 4);
        assert_eq!(summary.transactions_count, 42);
        assert_eq!(summary.members_count, 1);
        assert_eq!(summary.total_assets.to_string(), "168250.00");
        assert_eq!(summary.total_liabilities.to_string(), "3420.18");
        assert_eq!(summary.net_worth.to_string(), "164829.82");
        assert!(source.organization_summary("org-404").await.is_err());
    }

    #[tokio::test]
    async fn test_current_user() {
        let mut seeded = SnapshotSource::new(seed(Utc::now()));
        assert_eq!(
            seeded.current_user().await.unwrap().email,
            "demo@finboard.local"
        );
        let mut empty = SnapshotSource::new(Snapshot::default());
        assert!(empty.current_user().await.is_err());
    }

    #[test]
    fn test_seed_dates_parse_and_cover_six_months() {
        let now = Utc.with_ymd_and_hms(2024, 3, 31, 9, 0, 0).unwrap();
        let snapshot = seed(now);
        let mut months: Vec<(i32, u32)> = snapshot
            .transactions
            .iter()
            .map(|t| {
                let d = t.parsed_date().unwrap();
                (d.year(), d.month())
            })
            .collect();
        months.dedup();
        assert_eq!(
            months,
            vec![
                (2023, 10),
                (2023, 11),
                (2023, 12),
                (2024, 1),
                (2024, 2),
                (2024, 3)
            ]
        );
        assert_eq!(snapshot, seed(now));
    }
}
