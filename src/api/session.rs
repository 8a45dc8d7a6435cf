//! The stored login session: the access token and the cookies the backend uses to refresh it.

use crate::{utils, Result};
use anyhow::Context;
use chrono::{DateTime, Utc};
use reqwest::header::{HeaderMap, SET_COOKIE};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::fmt::Debug;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Represents a file that we want to `Serialize`, `Deserialize`, and read from memory in-between
/// serializations and deserialization. Saved files are only readable by the current user.
#[derive(Default, Debug, Clone)]
pub(crate) struct File<F>
where
    F: Serialize + DeserializeOwned + Clone + Debug + Default,
{
    path: PathBuf,
    data: F,
}

impl<F> File<F>
where
    F: Serialize + DeserializeOwned + Clone + Debug + Default,
{
    /// Load data from a file and create a File instance
    pub(crate) async fn load(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();
        let data: F = utils::deserialize(&path).await?;
        Ok(Self { path, data })
    }

    /// Load the file if it exists, otherwise start from `F::default()` without writing anything.
    pub(crate) async fn load_or_default(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();
        if path.is_file() {
            Self::load(path).await
        } else {
            debug!("No file at {}, using defaults", path.display());
            Ok(Self::new(path, F::default()))
        }
    }

    pub(crate) fn new(path: impl Into<PathBuf>, data: F) -> Self {
        Self {
            path: path.into(),
            data,
        }
    }

    pub(crate) async fn save(&self) -> Result<()> {
        let json =
            serde_json::to_string_pretty(&self.data).context("Failed to serialize data to JSON")?;
        utils::write_private(&self.path, json).await
    }

    /// Deletes the file, if it exists.
    pub(crate) async fn delete(&self) -> Result<()> {
        if self.path.is_file() {
            utils::remove(&self.path).await?;
        }
        Ok(())
    }

    pub(crate) fn data(&self) -> &F {
        &self.data
    }

    pub(crate) fn data_mut(&mut self) -> &mut F {
        &mut self.data
    }

    pub(crate) fn path(&self) -> &Path {
        &self.path
    }
}

/// The contents of `session.json`.
///
/// Example:
/// ```json
/// {
///   "access_token": "eyJhbGciOi...",
///   "cookies": ["refreshToken=4f0a..."],
///   "email": "ada@example.com"
/// }
/// ```
#[derive(Default, Debug, Clone, Eq, PartialEq, Serialize, Deserialize)]
pub struct Session {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    access_token: Option<String>,

    /// `name=value` pairs from the backend's `Set-Cookie` headers, sent back on refresh.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    cookies: Vec<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    email: Option<String>,
}

impl Session {
    pub(crate) fn new(access_token: impl Into<String>, email: Option<String>) -> Self {
        Self {
            access_token: Some(access_token.into()),
            cookies: Vec::new(),
            email,
        }
    }

    pub fn access_token(&self) -> Option<&str> {
        self.access_token.as_deref().filter(|t| !t.is_empty())
    }

    pub fn email(&self) -> Option<&str> {
        self.email.as_deref()
    }

    pub(crate) fn set_access_token(&mut self, token: impl Into<String>) {
        self.access_token = Some(token.into());
    }

    pub(crate) fn clear_access_token(&mut self) {
        self.access_token = None;
    }

    /// The value for a `Cookie` request header, if any cookies are stored.
    pub(crate) fn cookie_header(&self) -> Option<String> {
        if self.cookies.is_empty() {
            None
        } else {
            Some(self.cookies.join("; "))
        }
    }

    /// Stores the cookies set by a response. Cookies with the same name are replaced, and a cookie
    /// the backend clears (empty value, `Max-Age` of zero or less, or an `Expires` in the past) is
    /// removed.
    pub(crate) fn remember_cookies(&mut self, headers: &HeaderMap) {
        for value in headers.get_all(SET_COOKIE) {
            let Ok(value) = value.to_str() else {
                continue;
            };
            let mut parts = value.split(';').map(str::trim);
            let Some((name, cookie)) = parts.next().and_then(|pair| pair.split_once('=')) else {
                continue;
            };
            let prefix = format!("{name}=");
            self.cookies.retain(|existing| !existing.starts_with(&prefix));
            if cookie.is_empty() || parts.any(is_expiry) {
                debug!("Backend cleared the cookie '{name}'");
                continue;
            }
            self.cookies.push(format!("{name}={cookie}"));
        }
    }
}

/// Whether a `Set-Cookie` attribute says the cookie is already expired.
fn is_expiry(attribute: &str) -> bool {
    let Some((key, value)) = attribute.split_once('=') else {
        return false;
    };
    let value = value.trim();
    match key.trim().to_ascii_lowercase().as_str() {
        "max-age" => value.parse::<i64>().is_ok_and(|secs| secs <= 0),
        "expires" => DateTime::parse_from_rfc2822(value)
            .is_ok_and(|at| at.with_timezone(&Utc) < Utc::now()),
        _ => false,
    }
}

pub(crate) type SessionFile = File<Session>;

#[cfg(test)]
mod tests {
    use super::*;
    use reqwest::header::HeaderValue;
    use tempfile::TempDir;

    #[test]
    fn test_remember_cookies_keeps_name_value_and_replaces() {
        let mut session = Session::default();
        let mut headers = HeaderMap::new();
        headers.append(
            SET_COOKIE,
            HeaderValue::from_static("refreshToken=abc; Path=/; HttpOnly"),
        );
        headers.append(SET_COOKIE, HeaderValue::from_static("theme=dark"));
        session.remember_cookies(&headers);
        assert_eq!(
            session.cookie_header().as_deref(),
            Some("refreshToken=abc; theme=dark")
        );

        let mut headers = HeaderMap::new();
        headers.append(
            SET_COOKIE,
            HeaderValue::from_static("refreshToken=xyz; HttpOnly"),
        );
        session.remember_cookies(&headers);
        assert_eq!(
            session.cookie_header().as_deref(),
            Some("theme=dark; refreshToken=xyz")
        );
    }

    #[test]
    fn test_cleared_cookies_are_dropped() {
        let mut session = Session::default();
        let mut headers = HeaderMap::new();
        headers.append(SET_COOKIE, HeaderValue::from_static("refreshToken=abc; HttpOnly"));
        headers.append(SET_COOKIE, HeaderValue::from_static("theme=dark"));
        headers.append(SET_COOKIE, HeaderValue::from_static("lang=en"));
        session.remember_cookies(&headers);

        let mut headers = HeaderMap::new();
        headers.append(
            SET_COOKIE,
            HeaderValue::from_static("refreshToken=; Path=/; Max-Age=0"),
        );
        headers.append(
            SET_COOKIE,
            HeaderValue::from_static("theme=dark; Expires=Thu, 01 Jan 1970 00:00:00 GMT"),
        );
        session.remember_cookies(&headers);
        assert_eq!(session.cookie_header().as_deref(), Some("lang=en"));

        let mut headers = HeaderMap::new();
        headers.append(SET_COOKIE, HeaderValue::from_static("lang=; Path=/"));
        session.remember_cookies(&headers);
        assert_eq!(session.cookie_header(), None);
    }

    #[test]
    fn test_future_expiry_keeps_cookie() {
        let mut session = Session::default();
        let mut headers = HeaderMap::new();
        headers.append(
            SET_COOKIE,
            HeaderValue::from_static(
                "refreshToken=abc; Max-Age=604800; Expires=Fri, 01 Jan 2100 00:00:00 GMT",
            ),
        );
        session.remember_cookies(&headers);
        assert_eq!(session.cookie_header().as_deref(), Some("refreshToken=abc"));
    }

    #[test]
    fn test_blank_token_is_no_token() {
        let session = Session::new("", None);
        assert_eq!(session.access_token(), None);
        assert_eq!(Session::default().cookie_header(), None);
    }

    #[tokio::test]
    async fn test_session_file_save_load_delete() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("session.json");

        let missing = SessionFile::load_or_default(&path).await.unwrap();
        assert_eq!(missing.data(), &Session::default());
        assert!(!path.exists());

        let mut file = SessionFile::new(&path, Session::new("tok", Some("a@b.c".to_string())));
        file.data_mut().set_access_token("tok2");
        file.save().await.unwrap();

        let loaded = SessionFile::load(&path).await.unwrap();
        assert_eq!(loaded.data().access_token(), Some("tok2"));
        assert_eq!(loaded.data().email(), Some("a@b.c"));

        loaded.delete().await.unwrap();
        assert!(!path.exists());
    }
}
