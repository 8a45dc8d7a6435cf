use crate::Result;
use anyhow::Context;
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::path::{Path, PathBuf};

/// Write a file.
pub(crate) async fn write(path: impl AsRef<Path>, contents: impl AsRef<[u8]>) -> Result<()> {
    let path = path.as_ref();
    tokio::fs::write(path, contents)
        .await
        .context(format!("Unable to write to {}", path.to_string_lossy()))
}

/// Write a file that only the current user may read, e.g. a file holding a token.
pub(crate) async fn write_private(
    path: impl AsRef<Path>,
    contents: impl AsRef<[u8]>,
) -> Result<()> {
    let path = path.as_ref();
    write(path, contents).await?;
    #[cfg(unix)]
    {
        use std::fs::Permissions;
        use std::os::unix::fs::PermissionsExt;
        tokio::fs::set_permissions(path, Permissions::from_mode(0o600))
            .await
            .with_context(|| format!("Failed to set permissions on {}", path.display()))?;
    }
    Ok(())
}

/// Read a file to a `String`.
pub async fn read(path: &Path) -> Result<String> {
    tokio::fs::read_to_string(path)
        .await
        .with_context(|| format!("Failed to read file at {}", path.display()))
}

/// Deserialize a JSON file into type `T`.
pub async fn deserialize<T>(path: &Path) -> Result<T>
where
    T: DeserializeOwned,
{
    let content = read(path).await?;
    serde_json::from_str(&content)
        .with_context(|| format!("Failed to parse JSON file at {}", path.display()))
}

/// Serialize `value` as pretty JSON and write it to `path`.
pub async fn serialize<T>(path: &Path, value: &T) -> Result<()>
where
    T: Serialize + ?Sized,
{
    let json = serde_json::to_string_pretty(value)
        .with_context(|| format!("Failed to serialize JSON for {}", path.display()))?;
    write(path, json).await
}

/// Create a directory and any missing parents.
pub(crate) async fn make_dir(p: impl AsRef<Path>) -> Result<()> {
    let p = p.as_ref();
    tokio::fs::create_dir_all(p)
        .await
        .with_context(|| format!("Unable to create directory at {}", p.to_string_lossy()))
}

pub(crate) async fn canonicalize(p: impl AsRef<Path>) -> Result<PathBuf> {
    let p = p.as_ref();
    tokio::fs::canonicalize(p)
        .await
        .with_context(|| format!("Unable to canonicalize the path {}", p.to_string_lossy()))
}

pub(crate) async fn read_dir(p: impl AsRef<Path>) -> Result<tokio::fs::ReadDir> {
    let p = p.as_ref();
    tokio::fs::read_dir(p)
        .await
        .with_context(|| format!("Unable to read directory {}", p.to_string_lossy()))
}

pub(crate) async fn remove(p: impl AsRef<Path>) -> Result<()> {
    let p = p.as_ref();
    tokio::fs::remove_file(p)
        .await
        .with_context(|| format!("Unable to remove file {}", p.to_string_lossy()))
}
