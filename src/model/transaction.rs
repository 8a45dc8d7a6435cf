use crate::model::Amount;
use chrono::{DateTime, Datelike, NaiveDate, NaiveDateTime, NaiveTime, Utc};
use serde::{Deserialize, Serialize, Serializer};

/// The category reported for transactions that have none.
pub const UNCATEGORIZED: &str = "Uncategorized";

/// The kind of money movement a transaction represents.
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
pub enum TransactionType {
    Income,
    #[default]
    Expense,
    Transfer,
}

serde_plain::derive_display_from_serialize!(TransactionType);
serde_plain::derive_fromstr_from_deserialize!(TransactionType);

/// A transaction record as returned by the `/transactions` endpoint.
#[derive(Default, Debug, Clone, Eq, PartialEq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Transaction {
    pub id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub organization_id: Option<String>,
    #[serde(rename = "type")]
    pub kind: TransactionType,
    #[serde(default)]
    pub amount: Amount,
    #[serde(default)]
    pub currency: String,
    #[serde(default)]
    pub description: Option<String>,
    /// ISO-8601 timestamp as sent by the backend. See `TransactionDate` for the accepted forms.
    #[serde(default)]
    pub date: Option<String>,
    #[serde(default)]
    pub category: Option<String>,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub from_account_id: Option<String>,
    #[serde(default)]
    pub to_account_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<String>,
}

impl Transaction {
    /// Returns the description, or `"<TYPE> Transaction"` when it is missing or blank.
    pub fn description_or_default(&self) -> String {
        match non_blank(self.description.as_deref()) {
            Some(description) => description.to_string(),
            None => format!("{} Transaction", self.kind),
        }
    }

    /// Returns the category, or `"Uncategorized"` when it is missing or blank.
    pub fn category_or_default(&self) -> &str {
        non_blank(self.category.as_deref()).unwrap_or(UNCATEGORIZED)
    }

    /// Parses `date`. Returns `None` when the date is missing or in an unrecognized format.
    pub fn parsed_date(&self) -> Option<TransactionDate> {
        self.date.as_deref().and_then(TransactionDate::parse)
    }

    /// True if the account is on either side of this transaction.
    pub fn involves_account(&self, account_id: &str) -> bool {
        self.from_account_id.as_deref() == Some(account_id)
            || self.to_account_id.as_deref() == Some(account_id)
    }

    /// Builds a new record from a create request, the way the backend would.
    pub fn from_request(
        id: impl Into<String>,
        organization_id: Option<String>,
        request: CreateTransactionRequest,
        now: DateTime<Utc>,
    ) -> Self {
        let timestamp = now.to_rfc3339();
        Self {
            id: id.into(),
            organization_id,
            kind: request.kind,
            amount: request.amount,
            currency: request.currency.unwrap_or_else(|| DEFAULT_CURRENCY.to_string()),
            description: request.description,
            date: Some(request.date.unwrap_or_else(|| timestamp.clone())),
            category: request.category,
            tags: request.tags.unwrap_or_default(),
            from_account_id: request.from_account_id,
            to_account_id: request.to_account_id,
            created_at: Some(timestamp.clone()),
            updated_at: Some(timestamp),
        }
    }

    /// Applies the fields present in `update`, leaving the others untouched.
    pub fn apply(&mut self, update: UpdateTransactionRequest, now: DateTime<Utc>) {
        let UpdateTransactionRequest {
            kind,
            amount,
            currency,
            description,
            date,
            category,
            tags,
            from_account_id,
            to_account_id,
        } = update;
        if let Some(kind) = kind {
            self.kind = kind;
        }
        if let Some(amount) = amount {
            self.amount = amount;
        }
        if let Some(currency) = currency {
            self.currency = currency;
        }
        if description.is_some() {
            self.description = description;
        }
        if date.is_some() {
            self.date = date;
        }
        if category.is_some() {
            self.category = category;
        }
        if let Some(tags) = tags {
            self.tags = tags;
        }
        if from_account_id.is_some() {
            self.from_account_id = from_account_id;
        }
        if to_account_id.is_some() {
            self.to_account_id = to_account_id;
        }
        self.updated_at = Some(now.to_rfc3339());
    }
}

pub(crate) const DEFAULT_CURRENCY: &str = "USD";

fn non_blank(s: Option<&str>) -> Option<&str> {
    s.map(str::trim).filter(|s| !s.is_empty())
}

/// The payload for `POST /transactions`. `kind` and `amount` are required, the backend fills in
/// the rest.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateTransactionRequest {
    #[serde(rename = "type")]
    pub kind: TransactionType,
    #[serde(serialize_with = "amount_as_number")]
    pub amount: Amount,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub currency: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub date: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tags: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub from_account_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub to_account_id: Option<String>,
}

impl CreateTransactionRequest {
    pub fn new(kind: TransactionType, amount: Amount) -> Self {
        Self {
            kind,
            amount,
            currency: None,
            description: None,
            date: None,
            category: None,
            tags: None,
            from_account_id: None,
            to_account_id: None,
        }
    }
}

/// The payload for `PATCH /transactions/{id}`. Only `Some` fields are sent.
#[derive(Debug, Default, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateTransactionRequest {
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub kind: Option<TransactionType>,
    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        serialize_with = "optional_amount_as_number"
    )]
    pub amount: Option<Amount>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub currency: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub date: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tags: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub from_account_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub to_account_id: Option<String>,
}

impl UpdateTransactionRequest {
    /// True when no field would be changed.
    pub fn is_empty(&self) -> bool {
        self == &Self::default()
    }
}

/// The backend takes amounts as JSON numbers on write.
pub(crate) fn amount_as_number<S>(amount: &Amount, serializer: S) -> Result<S::Ok, S::Error>
where
    S: Serializer,
{
    serializer.serialize_f64(amount.to_f64())
}

pub(crate) fn optional_amount_as_number<S>(
    amount: &Option<Amount>,
    serializer: S,
) -> Result<S::Ok, S::Error>
where
    S: Serializer,
{
    match amount {
        Some(amount) => amount_as_number(amount, serializer),
        None => serializer.serialize_none(),
    }
}

/// A parsed transaction date.
///
/// Accepted forms:
/// - RFC 3339 with an offset: `2024-01-15T10:30:00Z`, `2024-01-15T10:30:00+02:00`
/// - naive date-time: `2024-01-15T10:30:00`, `2024-01-15 10:30:00.250`
/// - plain date: `2024-01-15`
///
/// Naive forms are read as UTC for instant comparisons.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TransactionDate {
    /// Wall-clock time in the transaction's own offset. Month bucketing uses this.
    local: NaiveDateTime,
    /// The point in time, used for period comparisons and sorting.
    instant: DateTime<Utc>,
}

impl TransactionDate {
    pub fn parse(s: &str) -> Option<Self> {
        let s = s.trim();
        if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
            return Some(Self {
                local: dt.naive_local(),
                instant: dt.with_timezone(&Utc),
            });
        }
        for format in NAIVE_DATE_TIME_FORMATS {
            if let Ok(naive) = NaiveDateTime::parse_from_str(s, format) {
                return Some(Self::from_naive(naive));
            }
        }
        NaiveDate::parse_from_str(s, "%Y-%m-%d")
            .ok()
            .map(|date| Self::from_naive(date.and_time(NaiveTime::MIN)))
    }

    fn from_naive(local: NaiveDateTime) -> Self {
        Self {
            local,
            instant: local.and_utc(),
        }
    }

    pub fn instant(&self) -> DateTime<Utc> {
        self.instant
    }

    pub fn local_date(&self) -> NaiveDate {
        self.local.date()
    }

    pub fn year(&self) -> i32 {
        self.local.year()
    }

    /// Month number, 1 through 12.
    pub fn month(&self) -> u32 {
        self.local.month()
    }
}

const NAIVE_DATE_TIME_FORMATS: [&str; 2] = ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f"];

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use std::str::FromStr;

    fn txn_json() -> &'static str {
        r#"{
            "id": "t1",
            "organizationId": "org-1",
            "type": "EXPENSE",
            "amount": "42.50",
            "currency": "USD",
            "description": null,
            "date": "2024-03-05T12:00:00.000Z",
            "category": null,
            "tags": [],
            "fromAccountId": "a1",
            "toAccountId": null,
            "createdAt": "2024-03-05T12:00:00.000Z",
            "updatedAt": "2024-03-05T12:00:00.000Z"
        }"#
    }

    #[test]
    fn test_deserialize_backend_record() {
        let txn: Transaction = serde_json::from_str(txn_json()).unwrap();
        assert_eq!(txn.kind, TransactionType::Expense);
        assert_eq!(txn.amount.to_f64(), 42.5);
        assert_eq!(txn.from_account_id.as_deref(), Some("a1"));
        assert_eq!(txn.description_or_default(), "EXPENSE Transaction");
        assert_eq!(txn.category_or_default(), UNCATEGORIZED);
    }

    #[test]
    fn test_deserialize_minimal_record() {
        let txn: Transaction =
            serde_json::from_str(r#"{"id": "t2", "type": "INCOME", "amount": "oops"}"#).unwrap();
        assert!(txn.amount.is_zero());
        assert!(txn.parsed_date().is_none());
        assert!(txn.tags.is_empty());
    }

    #[test]
    fn test_blank_category_is_uncategorized() {
        let txn = Transaction {
            category: Some("   ".to_string()),
            ..Default::default()
        };
        assert_eq!(txn.category_or_default(), UNCATEGORIZED);
    }

    #[test]
    fn test_type_display_and_parse() {
        assert_eq!(TransactionType::Income.to_string(), "INCOME");
        assert_eq!(
            TransactionType::from_str("TRANSFER").unwrap(),
            TransactionType::Transfer
        );
    }

    #[test]
    fn test_involves_account() {
        let txn = Transaction {
            from_account_id: Some("a".to_string()),
            to_account_id: Some("b".to_string()),
            ..Default::default()
        };
        assert!(txn.involves_account("a"));
        assert!(txn.involves_account("b"));
        assert!(!txn.involves_account("c"));
    }

    #[test]
    fn test_parse_date_forms() {
        let plain = TransactionDate::parse("2024-01-15").unwrap();
        assert_eq!((plain.year(), plain.month()), (2024, 1));
        assert_eq!(
            plain.instant(),
            Utc.with_ymd_and_hms(2024, 1, 15, 0, 0, 0).unwrap()
        );

        let naive = TransactionDate::parse("2024-01-15T23:10:00").unwrap();
        assert_eq!(naive.local_date(), NaiveDate::from_ymd_opt(2024, 1, 15).unwrap());

        let spaced = TransactionDate::parse("2024-01-15 08:00:00.125").unwrap();
        assert_eq!(spaced.month(), 1);

        assert!(TransactionDate::parse("15/01/2024").is_none());
        assert!(TransactionDate::parse("").is_none());
    }

    #[test]
    fn test_offset_defines_local_month() {
        // 23:30 on Jan 31 at -05:00 is already February in UTC.
        let date = TransactionDate::parse("2024-01-31T23:30:00-05:00").unwrap();
        assert_eq!(date.month(), 1);
        assert_eq!(
            date.instant(),
            Utc.with_ymd_and_hms(2024, 2, 1, 4, 30, 0).unwrap()
        );
    }

    #[test]
    fn test_create_request_serializes_amount_as_number() {
        let mut request =
            CreateTransactionRequest::new(TransactionType::Income, Amount::lenient("100.25"));
        request.category = Some("Sales".to_string());
        let json = serde_json::to_value(&request).unwrap();
        assert_eq!(json["type"], "INCOME");
        assert_eq!(json["amount"], 100.25);
        assert_eq!(json["category"], "Sales");
        assert!(json.get("description").is_none());
    }

    #[test]
    fn test_update_request_skips_none() {
        let update = UpdateTransactionRequest {
            description: Some("Rent".to_string()),
            ..Default::default()
        };
        let json = serde_json::to_string(&update).unwrap();
        assert_eq!(json, r#"{"description":"Rent"}"#);
        assert!(!update.is_empty());
        assert!(UpdateTransactionRequest::default().is_empty());
    }

    #[test]
    fn test_from_request_and_apply() {
        let now = Utc.with_ymd_and_hms(2024, 5, 1, 9, 0, 0).unwrap();
        let request = CreateTransactionRequest::new(TransactionType::Expense, Amount::lenient("9"));
        let mut txn = Transaction::from_request("id-1", Some("org".to_string()), request, now);
        assert_eq!(txn.currency, "USD");
        assert_eq!(txn.date.as_deref(), Some("2024-05-01T09:00:00+00:00"));
        assert!(txn.parsed_date().is_some());

        let later = Utc.with_ymd_and_hms(2024, 5, 2, 9, 0, 0).unwrap();
        txn.apply(
            UpdateTransactionRequest {
                category: Some("Travel".to_string()),
                amount: Some(Amount::lenient("12")),
                ..Default::default()
            },
            later,
        );
        assert_eq!(txn.category.as_deref(), Some("Travel"));
        assert_eq!(txn.amount.to_f64(), 12.0);
        assert_eq!(txn.kind, TransactionType::Expense);
        assert_eq!(txn.updated_at.as_deref(), Some("2024-05-02T09:00:00+00:00"));
    }
}
