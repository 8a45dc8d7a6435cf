use serde::{Deserialize, Serialize};

/// The logged in user, as returned by `/users/me` and by the auth endpoints.
#[derive(Default, Debug, Clone, Eq, PartialEq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<String>,
}

impl User {
    /// The name when one is set, otherwise the email.
    pub fn display_name(&self) -> &str {
        self.name
            .as_deref()
            .filter(|name| !name.trim().is_empty())
            .unwrap_or(&self.email)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_name_falls_back_to_email() {
        let user: User =
            serde_json::from_str(r#"{"id": "u1", "email": "ada@example.com", "name": null}"#)
                .unwrap();
        assert_eq!(user.display_name(), "ada@example.com");

        let named = User {
            name: Some("Ada".to_string()),
            ..user
        };
        assert_eq!(named.display_name(), "Ada");
    }
}
