use crate::model::transaction::DEFAULT_CURRENCY;
use crate::model::Amount;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// The ledger classification of an account.
#[derive(
    Debug,
    Default,
    Clone,
    Copy,
    Eq,
    PartialEq,
    Ord,
    PartialOrd,
    Hash,
    Serialize,
    Deserialize,
    clap::ValueEnum,
)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AccountType {
    #[default]
    Asset,
    Liability,
    Equity,
    Revenue,
    Expense,
}

serde_plain::derive_display_from_serialize!(AccountType);
serde_plain::derive_fromstr_from_deserialize!(AccountType);

/// An account record as returned by the `/accounts` endpoint.
#[derive(Default, Debug, Clone, Eq, PartialEq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Account {
    pub id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub organization_id: Option<String>,
    #[serde(default)]
    pub name: String,
    #[serde(rename = "type", default)]
    pub kind: AccountType,
    /// Balances may be negative, e.g. for liabilities.
    #[serde(default)]
    pub balance: Amount,
    #[serde(default)]
    pub currency: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub is_active: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<String>,
}

impl Account {
    /// Builds a new record from a create request. The balance starts at the requested opening
    /// balance, or zero.
    pub fn from_request(
        id: impl Into<String>,
        organization_id: Option<String>,
        request: CreateAccountRequest,
        now: DateTime<Utc>,
    ) -> Self {
        let timestamp = now.to_rfc3339();
        Self {
            id: id.into(),
            organization_id,
            name: request.name,
            kind: request.kind,
            balance: request.balance.unwrap_or_default(),
            currency: request.currency.unwrap_or_else(|| DEFAULT_CURRENCY.to_string()),
            description: request.description,
            is_active: request.is_active.unwrap_or(true),
            created_at: Some(timestamp.clone()),
            updated_at: Some(timestamp),
        }
    }

    /// Applies the fields present in `update`.
    pub fn apply(&mut self, update: UpdateAccountRequest, now: DateTime<Utc>) {
        let UpdateAccountRequest {
            name,
            kind,
            currency,
            description,
            is_active,
        } = update;
        if let Some(name) = name {
            self.name = name;
        }
        if let Some(kind) = kind {
            self.kind = kind;
        }
        if let Some(currency) = currency {
            self.currency = currency;
        }
        if description.is_some() {
            self.description = description;
        }
        if let Some(is_active) = is_active {
            self.is_active = is_active;
        }
        self.updated_at = Some(now.to_rfc3339());
    }
}

/// The payload for `POST /accounts`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateAccountRequest {
    pub name: String,
    #[serde(rename = "type")]
    pub kind: AccountType,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub currency: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub is_active: Option<bool>,
    /// Opening balance. Only honored by offline mode; the backend derives balances itself.
    #[serde(skip)]
    pub balance: Option<Amount>,
}

impl CreateAccountRequest {
    pub fn new(name: impl Into<String>, kind: AccountType) -> Self {
        Self {
            name: name.into(),
            kind,
            currency: None,
            description: None,
            is_active: None,
            balance: None,
        }
    }
}

/// The payload for `PATCH /accounts/{id}`.
#[derive(Debug, Default, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateAccountRequest {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub kind: Option<AccountType>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub currency: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub is_active: Option<bool>,
}

impl UpdateAccountRequest {
    /// True when no field would be changed.
    pub fn is_empty(&self) -> bool {
        self == &Self::default()
    }
}
