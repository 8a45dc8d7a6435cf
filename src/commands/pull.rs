use crate::api::save_snapshot;
use crate::backup::SNAPSHOT;
use crate::commands::{open, Out};
use crate::error::{ErrorType, IntoResult};
use crate::model::OrgId;
use crate::{Config, Mode, Result};
use serde::Serialize;
use std::path::PathBuf;
use tracing::{debug, warn};

/// What `finboard pull` wrote.
#[derive(Debug, Clone, Serialize)]
pub struct Pulled {
    pub transactions: usize,
    pub accounts: usize,
    pub backup: PathBuf,
}

/// Downloads every transaction and account of the organization, along with the user's
/// organizations and profile. Saves them as a rotated backup in `.backups/` and replaces
/// `offline.json` with them so that offline mode sees the same data.
///
/// # Errors
/// - Returns an error if fetching fails or either file cannot be written.
pub async fn pull(config: &Config, mode: Mode, org: Option<OrgId>) -> Result<Out<Pulled>> {
    let mut source = open(config, mode, org).await?;
    let mut snapshot = source.snapshot().await.pub_result(ErrorType::Request)?;
    snapshot.organizations = source
        .list_organizations()
        .await
        .pub_result(ErrorType::Request)?;
    snapshot.user = match source.current_user().await {
        Ok(user) => Some(user),
        Err(e) => {
            warn!("Unable to fetch the current user: {e:#}");
            None
        }
    };

    let backup = config
        .backup()
        .save_json(SNAPSHOT, &snapshot)
        .await
        .pub_result(ErrorType::Io)?;
    debug!("Saved backup to {}", backup.display());

    save_snapshot(&config.offline_path(), &snapshot)
        .await
        .pub_result(ErrorType::Io)?;

    let pulled = Pulled {
        transactions: snapshot.transactions.len(),
        accounts: snapshot.accounts.len(),
        backup,
    };
    let message = format!(
        "Pulled {} transactions and {} accounts",
        pulled.transactions, pulled.accounts
    );
    Ok(Out::new(message, pulled))
}
