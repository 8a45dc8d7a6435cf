//! Types that represent the data model served by the accounting backend, such as `Transaction`
//! and `Account`, plus the request payloads used to change them.
mod account;
mod amount;
mod organization;
mod transaction;
mod user;

pub use account::{Account, AccountType, CreateAccountRequest, UpdateAccountRequest};
pub use amount::{format_money, Amount, AmountError};
pub use organization::{
    CreateOrganizationRequest, OrgId, Organization, OrganizationSummary, Role,
    UpdateOrganizationRequest,
};
pub use transaction::{
    CreateTransactionRequest, Transaction, TransactionDate, TransactionType,
    UpdateTransactionRequest, UNCATEGORIZED,
};
pub use user::User;

use serde::{Deserialize, Serialize};

/// Everything the aggregator reads, fetched at one point in time.
#[derive(Default, Debug, Clone, Eq, PartialEq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct Snapshot {
    pub transactions: Vec<Transaction>,
    pub accounts: Vec<Account>,
    /// The organizations the user belongs to. Only `pull` and the offline source fill this in.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub organizations: Vec<Organization>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user: Option<User>,
}

impl Snapshot {
    pub fn new(transactions: Vec<Transaction>, accounts: Vec<Account>) -> Self {
        Self {
            transactions,
            accounts,
            ..Default::default()
        }
    }
}
