//! Configuration file handling for finboard.
//!
//! The configuration file is stored at `$FINBOARD_HOME/config.json` and contains the backend URL,
//! the selected organization, backup settings and the dashboard settings.

use crate::analytics::Settings;
use crate::backup::Backup;
use crate::model::OrgId;
use crate::{utils, Result};
use anyhow::{bail, Context};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use url::Url;

const APP_NAME: &str = "finboard";
const CONFIG_VERSION: u8 = 1;
const BACKUP_COPIES: u32 = 5;
const SECRETS: &str = ".secrets";
const BACKUPS: &str = ".backups";
const SESSION_JSON: &str = "session.json";
const CONFIG_JSON: &str = "config.json";
const OFFLINE_JSON: &str = "offline.json";

/// The backend address used when `init` is not given one.
pub const DEFAULT_API_URL: &str = "http://localhost:3001/api/v1";

/// The `Config` object represents the configuration of the app. You instantiate it by providing
/// the path to `$FINBOARD_HOME` and from there it loads `$FINBOARD_HOME/config.json`. It provides
/// paths to other items that are either configurable or are expected in a certain location within
/// the home directory.
#[derive(Debug, Clone)]
pub struct Config {
    root: PathBuf,
    backups: PathBuf,
    secrets: PathBuf,
    config_path: PathBuf,
    config_file: ConfigFile,
    api_url: Url,
}

impl Config {
    /// Creates the data directory, its subdirectories and an initial `config.json` pointing at
    /// `api_url`.
    ///
    /// # Errors
    /// - Returns an error if `api_url` is not a valid URL or if any file operation fails.
    pub async fn create(dir: impl Into<PathBuf>, api_url: &str) -> Result<Self> {
        let api_url = parse_api_url(api_url)?;

        let maybe_relative = dir.into();
        utils::make_dir(&maybe_relative)
            .await
            .context("Unable to create the finboard home directory")?;
        let root = utils::canonicalize(&maybe_relative).await?;

        let backups = root.join(BACKUPS);
        utils::make_dir(&backups).await?;
        let secrets = root.join(SECRETS);
        utils::make_dir(&secrets).await?;

        let config_path = root.join(CONFIG_JSON);
        let config_file = ConfigFile {
            api_url: api_url.to_string(),
            ..ConfigFile::default()
        };
        config_file.save(&config_path).await?;

        Ok(Self {
            root,
            backups,
            secrets,
            config_path,
            config_file,
            api_url,
        })
    }

    /// This will
    /// - validate that the home directory exists and that the config file exists
    /// - load the config file
    /// - validate that the backups and secrets directories exist
    /// - return the loaded configuration object
    pub async fn load(home: impl Into<PathBuf>) -> Result<Self> {
        let maybe_relative = home.into();
        let root = utils::canonicalize(&maybe_relative)
            .await
            .context("The finboard home directory is missing, run 'finboard init'")?;

        let config_path = root.join(CONFIG_JSON);
        if !config_path.is_file() {
            bail!("The config file is missing '{}'", config_path.display())
        }
        let config_file = ConfigFile::load(&config_path).await?;
        let api_url = parse_api_url(&config_file.api_url)?;

        let config = Self {
            root: root.clone(),
            backups: root.join(BACKUPS),
            secrets: root.join(SECRETS),
            config_path,
            config_file,
            api_url,
        };
        if !config.backups.is_dir() {
            bail!(
                "The backups directory is missing '{}'",
                config.backups.display()
            )
        }
        if !config.secrets.is_dir() {
            bail!(
                "The secrets directory is missing '{}'",
                config.secrets.display()
            )
        }
        Ok(config)
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn config_path(&self) -> &Path {
        &self.config_path
    }

    pub fn backups(&self) -> &Path {
        &self.backups
    }

    pub fn secrets(&self) -> &Path {
        &self.secrets
    }

    pub fn api_url(&self) -> &Url {
        &self.api_url
    }

    /// The organization that data requests are scoped to, if one has been selected.
    pub fn organization_id(&self) -> Option<OrgId> {
        self.config_file
            .organization_id
            .as_deref()
            .filter(|id| !id.is_empty())
            .map(OrgId::from)
    }

    /// Selects `org` and writes the change to `config.json`.
    pub async fn set_organization_id(&mut self, org: &OrgId) -> Result<()> {
        self.config_file.organization_id = Some(org.to_string());
        self.config_file.save(&self.config_path).await
    }

    /// Forgets the selected organization, e.g. on logout.
    pub async fn clear_organization_id(&mut self) -> Result<()> {
        if self.config_file.organization_id.take().is_some() {
            self.config_file.save(&self.config_path).await?;
        }
        Ok(())
    }

    pub fn backup_copies(&self) -> u32 {
        self.config_file.backup_copies
    }

    pub fn settings(&self) -> &Settings {
        &self.config_file.dashboard
    }

    /// Where the offline snapshot lives.
    pub fn offline_path(&self) -> PathBuf {
        self.root.join(OFFLINE_JSON)
    }

    /// Returns the stored `session_path` if it is absolute, otherwise resolves the relative path.
    pub fn session_path(&self) -> PathBuf {
        let p = self.config_file.session_path();
        if p.is_absolute() {
            return p;
        }
        self.root.join(p)
    }

    /// Creates a new `Backup` instance for managing backup files.
    pub fn backup(&self) -> Backup {
        Backup::new(self)
    }
}

fn parse_api_url(s: &str) -> Result<Url> {
    let url = Url::parse(s).with_context(|| format!("Invalid API URL '{s}'"))?;
    if url.cannot_be_a_base() {
        bail!("The API URL '{s}' cannot be used as a base URL");
    }
    Ok(url)
}

/// Represents the serialization and deserialization format of the configuration file.
///
/// Example configuration:
/// ```json
/// {
///   "app_name": "finboard",
///   "config_version": 1,
///   "api_url": "http://localhost:3001/api/v1",
///   "organization_id": "org_4f1c",
///   "backup_copies": 5,
///   "session_path": ".secrets/session.json",
///   "dashboard": {
///     "revenue_window": 6,
///     "expense_window": 6,
///     "cashflow_window": 12,
///     "report_window": 12,
///     "top_categories": 6,
///     "recent_transactions": 10,
///     "target_ratio": "1.1",
///     "budget_ratio": "1.2"
///   }
/// }
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, Eq, PartialEq)]
struct ConfigFile {
    /// Application name, should always be "finboard"
    app_name: String,

    /// Configuration file version
    config_version: u8,

    /// Base URL of the REST backend, including the `/api/v1` prefix
    api_url: String,

    /// The selected organization, sent as `x-org-id`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    organization_id: Option<String>,

    /// Number of backup copies to keep
    #[serde(default = "default_backup_copies")]
    backup_copies: u32,

    /// Path to the session file (optional, relative to the home directory or absolute)
    /// Defaults to $FINBOARD_HOME/.secrets/session.json if not specified
    #[serde(default, skip_serializing_if = "Option::is_none")]
    session_path: Option<PathBuf>,

    #[serde(default)]
    dashboard: Settings,
}

fn default_backup_copies() -> u32 {
    BACKUP_COPIES
}

impl Default for ConfigFile {
    fn default() -> Self {
        Self {
            app_name: APP_NAME.to_string(),
            config_version: CONFIG_VERSION,
            api_url: DEFAULT_API_URL.to_string(),
            organization_id: None,
            backup_copies: BACKUP_COPIES,
            session_path: None,
            dashboard: Settings::default(),
        }
    }
}

impl ConfigFile {
    /// Loads a ConfigFile asynchronously from the specified path.
    ///
    /// # Errors
    /// Returns an error if the file cannot be read or parsed, or if it belongs to another app.
    async fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let config: ConfigFile = utils::deserialize(path)
            .await
            .with_context(|| format!("Failed to load config file at {}", path.display()))?;

        anyhow::ensure!(
            config.app_name == APP_NAME,
            "Invalid app_name in config file: expected '{}', got '{}'",
            APP_NAME,
            config.app_name
        );

        Ok(config)
    }

    async fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        utils::serialize(path.as_ref(), self)
            .await
            .context("Unable to write config file")
    }

    fn session_path(&self) -> PathBuf {
        self.session_path
            .clone()
            .unwrap_or_else(|| PathBuf::from(SECRETS).join(SESSION_JSON))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_config_create() {
        let dir = TempDir::new().unwrap();
        let home_dir = dir.path().join("finboard_home");

        let config = Config::create(&home_dir, "https://books.example.com/api/v1")
            .await
            .unwrap();

        assert_eq!(
            config.api_url().as_str(),
            "https://books.example.com/api/v1"
        );
        assert!(config.backups().is_dir());
        assert!(config.secrets().is_dir());
        assert!(config.config_path().is_file());
        assert_eq!(config.organization_id(), None);
        assert_eq!(config.backup_copies(), 5);
        assert_eq!(
            config.session_path(),
            config.root().join(".secrets").join("session.json")
        );
        assert_eq!(config.settings(), &Settings::default());
    }

    #[tokio::test]
    async fn test_config_create_rejects_bad_url() {
        let dir = TempDir::new().unwrap();
        let result = Config::create(dir.path(), "not a url").await;
        assert!(result.is_err());
    }

    #[tokio::test]
    async fn test_config_load_after_create_and_select_org() {
        let dir = TempDir::new().unwrap();
        let mut config = Config::create(dir.path(), DEFAULT_API_URL).await.unwrap();
        config
            .set_organization_id(&OrgId::new("org-7"))
            .await
            .unwrap();

        let loaded = Config::load(dir.path()).await.unwrap();
        assert_eq!(loaded.organization_id(), Some(OrgId::new("org-7")));
        assert_eq!(loaded.api_url().as_str(), DEFAULT_API_URL);
    }

    #[tokio::test]
    async fn test_config_load_missing_home() {
        let dir = TempDir::new().unwrap();
        let result = Config::load(dir.path().join("nothing-here")).await;
        assert!(result.is_err());
    }

    #[tokio::test]
    async fn test_config_load_missing_backups_dir() {
        let dir = TempDir::new().unwrap();
        let config = Config::create(dir.path(), DEFAULT_API_URL).await.unwrap();
        std::fs::remove_dir(config.backups()).unwrap();
        let err = Config::load(dir.path()).await.unwrap_err();
        assert!(err.to_string().contains("backups directory is missing"));
    }

    #[tokio::test]
    async fn test_config_file_load_with_minimal_config() {
        let temp_dir = TempDir::new().unwrap();
        let config_path = temp_dir.path().join("config.json");
        let json = r#"{
            "app_name": "finboard",
            "config_version": 1,
            "api_url": "http://localhost:3001/api/v1",
            "dashboard": { "top_categories": 3, "budget_ratio": "1.5" }
        }"#;
        utils::write(&config_path, json).await.unwrap();

        let config = ConfigFile::load(&config_path).await.unwrap();
        assert_eq!(config.backup_copies, 5);
        assert_eq!(config.dashboard.top_categories, 3);
        assert_eq!(config.dashboard.revenue_window, 6);
        assert_eq!(config.dashboard.budget_ratio.to_string(), "1.5");
        assert_eq!(
            config.session_path(),
            PathBuf::from(SECRETS).join(SESSION_JSON)
        );
    }

    #[tokio::test]
    async fn test_config_file_load_invalid_app_name() {
        let temp_dir = TempDir::new().unwrap();
        let config_path = temp_dir.path().join("config.json");
        let json = r#"{
            "app_name": "ledgerly",
            "config_version": 1,
            "api_url": "http://localhost:3001/api/v1"
        }"#;
        utils::write(&config_path, json).await.unwrap();

        let result = ConfigFile::load(&config_path).await;
        assert!(result.unwrap_err().to_string().contains("Invalid app_name"));
    }

    #[tokio::test]
    async fn test_config_file_save_and_load() {
        let t = TempDir::new().unwrap();
        let path = t.path().join("file.json");
        let original = ConfigFile {
            organization_id: Some("org-1".to_string()),
            session_path: Some(PathBuf::from("/tmp/session.json")),
            ..ConfigFile::default()
        };
        original.save(&path).await.unwrap();
        let read = ConfigFile::load(&path).await.unwrap();
        assert_eq!(original, read);
    }

    #[test]
    fn test_config_file_serialization_omits_none_fields() {
        let json = serde_json::to_string(&ConfigFile::default()).unwrap();
        assert!(!json.contains("organization_id"));
        assert!(!json.contains("session_path"));
    }
}
