use crate::commands::Out;
use crate::error::{ErrorType, IntoResult};
use crate::{Config, Result};
use anyhow::Context;
use std::path::Path;

/// Creates the data directory, its subdirectories and an initial `config.json` file pointing at
/// `api_url` along with default settings.
///
/// # Arguments
/// - `finboard_home` - The directory that will be the root of data directory, e.g.
///   `$HOME/finboard`
/// - `api_url` - The base URL of the accounting backend, e.g. `http://localhost:3001/api/v1`
///
/// # Errors
/// - Returns an error if `api_url` is not a usable URL or if any file operations fail.
pub async fn init(finboard_home: &Path, api_url: &str) -> Result<Out<()>> {
    let config = Config::create(finboard_home, api_url)
        .await
        .context("Unable to create the data directory and configs")
        .pub_result(ErrorType::Config)?;
    Ok(format!(
        "Successfully created the finboard directory at {}",
        config.root().display()
    )
    .into())
}
