//! Command handlers for the finboard CLI.
//!
//! This module contains implementations for all CLI subcommands.

mod accounts;
mod auth;
mod dashboard;
mod init;
mod orgs;
mod pull;
mod render;
mod report;
mod transactions;

use crate::api::{self, DataSource};
use crate::error::{ErrorType, IntoResult};
use crate::model::OrgId;
use crate::{Config, Mode, Result};
use serde::Serialize;
use std::fmt::Debug;
use tracing::{debug, info};

pub use accounts::{
    accounts_create, accounts_delete, accounts_list, accounts_show, accounts_update,
};
pub use auth::{login, logout, register, whoami};
pub use dashboard::{dashboard, dashboard_watch};
pub use init::init;
pub use orgs::{orgs_create, orgs_list, orgs_rename, orgs_summary, orgs_use};
pub use pull::{pull, Pulled};
pub use report::report;
pub use transactions::{
    transactions_create, transactions_delete, transactions_export, transactions_list,
    transactions_show, transactions_update,
};

/// The output type for a command. This allows the command to return a consistent message,
/// optionally structured data, and optionally a rendered table for the terminal.
#[derive(Debug, Clone, Serialize)]
pub struct Out<T>
where
    T: Serialize + Clone + Debug,
{
    /// A message that can be printed to the user regarding the outcome of the command execution.
    message: String,

    /// Any structured data that needs to be output from the call.
    structure: Option<T>,

    /// Human-readable rendering of `structure`, written to stdout.
    #[serde(skip)]
    table: Option<String>,
}

impl<T, S> From<S> for Out<T>
where
    T: Debug + Clone + Serialize,
    S: Into<String>,
{
    fn from(value: S) -> Self {
        Out::new_message(value)
    }
}

impl<T> Out<T>
where
    T: Serialize + Clone + Debug,
{
    /// Create a new `Out` object that has `Some(structure)`.
    pub fn new<S>(message: S, structure: T) -> Self
    where
        S: Into<String>,
    {
        Self {
            message: message.into(),
            structure: Some(structure),
            table: None,
        }
    }

    /// Create a new `Out` object that has `None` for `structure`.
    pub fn new_message<S>(message: S) -> Self
    where
        S: Into<String>,
    {
        Self {
            message: message.into(),
            structure: None,
            table: None,
        }
    }

    /// Attach a rendered table.
    pub fn with_table(mut self, table: String) -> Self {
        self.table = Some(table);
        self
    }

    /// Get the `message`.
    pub fn message(&self) -> &str {
        &self.message
    }

    /// Get the structured data stored in `structure`.
    pub fn structure(&self) -> Option<&T> {
        self.structure.as_ref()
    }

    pub fn table(&self) -> Option<&str> {
        self.table.as_deref()
    }

    /// Print the table (if any) to stdout, the message to `info!` and the structured data (if it
    /// exists) as JSON to `debug!`.
    pub fn print(&self) {
        if let Some(table) = self.table() {
            println!("{table}");
        }
        info!("{}", self.message);
        if let Some(structure) = self.structure() {
            if let Ok(json) = serde_json::to_string_pretty(structure) {
                debug!("Command output:\n\n{json}\n\n");
            }
        }
    }
}

/// The organization a command works on: the `--org` override, else the one stored in config.
fn organization(config: &Config, org: Option<OrgId>) -> Option<OrgId> {
    org.or_else(|| config.organization_id())
}

/// Opens the data source for `mode`, scoped to the resolved organization.
async fn open(config: &Config, mode: Mode, org: Option<OrgId>) -> Result<Box<dyn DataSource>> {
    let org = organization(config, org);
    if org.is_none() && mode == Mode::Remote {
        debug!("No organization selected, requests go out without x-org-id");
    }
    api::source(config, org, mode)
        .await
        .pub_result(ErrorType::Config)
}

fn require_changes(is_empty: bool) -> Result<()> {
    if is_empty {
        anyhow::bail!("Nothing to update, pass at least one field");
    }
    Ok(())
}

fn plural(count: usize) -> &'static str {
    if count == 1 {
        ""
    } else {
        "s"
    }
}
