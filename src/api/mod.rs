//! Access to the accounting backend.
//!
//! `DataSource` is the seam between the commands and wherever the data lives. `RestSource` talks
//! to the real backend, `SnapshotSource` serves an in-memory or file-backed `Snapshot` for offline
//! use and tests.

mod rest;
mod session;
mod snapshot;

use crate::model::{
    Account, CreateAccountRequest, CreateOrganizationRequest, CreateTransactionRequest, OrgId,
    Organization, OrganizationSummary, Snapshot, Transaction, UpdateAccountRequest,
    UpdateOrganizationRequest, UpdateTransactionRequest, User,
};
use crate::{Config, Result};
use tracing::debug;

pub(crate) use rest::{login, logout, register, RestSource};
pub(crate) use snapshot::{save as save_snapshot, SnapshotSource};

#[cfg(test)]
pub(crate) use snapshot::seed;

/// The environment variable that switches every command to the offline snapshot.
pub const OFFLINE_ENV: &str = "FINBOARD_OFFLINE";

/// Where data comes from.
#[derive(Debug, Default, Clone, Copy, Eq, PartialEq)]
pub enum Mode {
    /// The REST backend configured in `config.json`.
    #[default]
    Remote,
    /// `$FINBOARD_HOME/offline.json`, seeded with demo data on first use.
    Offline,
}

impl Mode {
    /// `Offline` when `FINBOARD_OFFLINE` is set and non-empty, otherwise `Remote`.
    pub fn from_env() -> Self {
        match std::env::var(OFFLINE_ENV) {
            Ok(value) if !value.is_empty() => Mode::Offline,
            _ => Mode::Remote,
        }
    }
}

/// Reads and writes the records of one organization.
#[async_trait::async_trait]
pub(crate) trait DataSource: Send {
    async fn list_transactions(&mut self) -> Result<Vec<Transaction>>;

    async fn get_transaction(&mut self, id: &str) -> Result<Transaction>;

    async fn create_transaction(&mut self, request: CreateTransactionRequest)
        -> Result<Transaction>;

    async fn update_transaction(
        &mut self,
        id: &str,
        request: UpdateTransactionRequest,
    ) -> Result<Transaction>;

    async fn delete_transaction(&mut self, id: &str) -> Result<()>;

    async fn list_accounts(&mut self) -> Result<Vec<Account>>;

    async fn get_account(&mut self, id: &str) -> Result<Account>;

    async fn create_account(&mut self, request: CreateAccountRequest) -> Result<Account>;

    async fn update_account(&mut self, id: &str, request: UpdateAccountRequest) -> Result<Account>;

    async fn delete_account(&mut self, id: &str) -> Result<()>;

    /// The organizations the current user belongs to. Not scoped by organization.
    async fn list_organizations(&mut self) -> Result<Vec<Organization>>;

    /// Creates an organization. The creator becomes its admin.
    async fn create_organization(
        &mut self,
        request: CreateOrganizationRequest,
    ) -> Result<Organization>;

    async fn update_organization(
        &mut self,
        id: &str,
        request: UpdateOrganizationRequest,
    ) -> Result<Organization>;

    async fn organization_summary(&mut self, id: &str) -> Result<OrganizationSummary>;

    /// The logged in user.
    async fn current_user(&mut self) -> Result<User>;

    /// Fetches transactions and accounts, one after the other.
    async fn snapshot(&mut self) -> Result<Snapshot> {
        let transactions = self.list_transactions().await?;
        let accounts = self.list_accounts().await?;
        debug!(
            "Fetched {} transactions and {} accounts",
            transactions.len(),
            accounts.len()
        );
        Ok(Snapshot::new(transactions, accounts))
    }
}

/// Creates the `DataSource` for `mode`, scoped to `org`.
pub(crate) async fn source(
    config: &Config,
    org: Option<OrgId>,
    mode: Mode,
) -> Result<Box<dyn DataSource>> {
    debug!("Opening {mode:?} data source for organization {org:?}");
    Ok(match mode {
        Mode::Remote => Box::new(RestSource::new(config, org).await?),
        Mode::Offline => Box::new(SnapshotSource::open(config.offline_path(), org).await?),
    })
}
