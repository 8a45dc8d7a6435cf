use crate::model::Amount;
use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter};

/// The caller's role within an organization.
#[derive(Debug, Default, Clone, Copy, Eq, PartialEq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    Admin,
    Member,
    #[default]
    Viewer,
}

serde_plain::derive_display_from_serialize!(Role);

/// An organization (tenant) the current user belongs to.
#[derive(Default, Debug, Clone, Eq, PartialEq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Organization {
    pub id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub role: Role,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<String>,
}

/// The body of `POST /organizations`.
#[derive(Debug, Clone, Eq, PartialEq, Serialize, Deserialize)]
pub struct CreateOrganizationRequest {
    pub name: String,
}

/// The body of `PATCH /organizations/{id}`. Only the name can change.
#[derive(Debug, Clone, Eq, PartialEq, Serialize, Deserialize)]
pub struct UpdateOrganizationRequest {
    pub name: String,
}

/// Headline figures for one organization, from `/organizations/{id}/summary`.
#[derive(Default, Debug, Clone, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrganizationSummary {
    pub id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub accounts_count: usize,
    #[serde(default)]
    pub transactions_count: usize,
    #[serde(default)]
    pub members_count: usize,
    #[serde(default)]
    pub total_assets: Amount,
    #[serde(default)]
    pub total_liabilities: Amount,
    #[serde(default)]
    pub net_worth: Amount,
}

/// Identifies which organization a data request is scoped to. It is sent as the `x-org-id`
/// header and is always passed explicitly to the data layer.
#[derive(Debug, Clone, Eq, PartialEq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct OrgId(String);

impl OrgId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Display for OrgId {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for OrgId {
    fn from(value: &str) -> Self {
        OrgId::new(value)
    }
}

#[test]
fn test_deserialize_summary_with_numbers() {
    let summary: OrganizationSummary = serde_json::from_str(
        r#"{
            "id": "o1",
            "name": "Acme",
            "accountsCount": 4,
            "transactionsCount": 42,
            "membersCount": 3,
            "totalAssets": 168250.5,
            "totalLiabilities": "3420.18",
            "netWorth": 164830.32
        }"#,
    )
    .unwrap();
    assert_eq!(summary.members_count, 3);
    assert_eq!(summary.total_assets.to_string(), "168250.5");
    assert_eq!(summary.total_liabilities.to_string(), "3420.18");
    assert_eq!(summary.net_worth.display_with_commas(), "164,830.32");
}

#[test]
fn test_deserialize_organization() {
    let org: Organization =
        serde_json::from_str(r#"{"id": "o1", "name": "Acme", "role": "admin"}"#).unwrap();
    assert_eq!(org.role, Role::Admin);
    assert_eq!(org.role.to_string(), "admin");
}
