//! Session command handlers.
//!
//! This module implements the CLI commands for:
//! - `finboard register` - Create a user and log in as it
//! - `finboard login` - Exchange credentials for an access token
//! - `finboard logout` - End the session and forget the selected organization
//! - `finboard whoami` - Show the logged in user

use crate::api;
use crate::commands::{open, render, Out};
use crate::error::{ErrorType, IntoResult};
use crate::model::User;
use crate::{Config, Mode, Result};
use tracing::debug;

/// Handles the `finboard login` command.
///
/// Posts the credentials to the backend and stores the access token, and any refresh cookies the
/// backend sets, in the session file. The organization selection in `config.json` is left alone.
///
/// # Errors
/// Returns an error if the backend rejects the credentials or the session cannot be saved.
pub async fn login(config: &Config, email: &str, password: &str) -> Result<Out<()>> {
    let authenticated = api::login(config, email, password)
        .await
        .pub_result(ErrorType::Auth)?;
    debug!("Session saved to {}", config.session_path().display());
    let who = match &authenticated.user {
        Some(user) => user.display_name(),
        None => authenticated.session.email().unwrap_or(email),
    };
    Ok(format!("Logged in as {who}{}", org_hint(config)).into())
}

/// Handles the `finboard register` command.
///
/// Creates the user on the backend and stores the session it returns, exactly like `login`.
///
/// # Errors
/// Returns an error if the backend refuses the registration or the session cannot be saved.
pub async fn register(
    config: &Config,
    email: &str,
    password: &str,
    name: Option<&str>,
) -> Result<Out<()>> {
    let name = name.map(str::trim).filter(|name| !name.is_empty());
    let authenticated = api::register(config, email, password, name)
        .await
        .pub_result(ErrorType::Auth)?;
    debug!("Session saved to {}", config.session_path().display());
    let who = authenticated
        .user
        .as_ref()
        .map(User::display_name)
        .unwrap_or(email);
    Ok(format!("Registered and logged in as {who}{}", org_hint(config)).into())
}

/// Handles the `finboard whoami` command.
pub async fn whoami(config: &Config, mode: Mode) -> Result<Out<User>> {
    let mut source = open(config, mode, None).await?;
    let user = source.current_user().await.pub_result(ErrorType::Request)?;
    let message = format!("Logged in as {} <{}>", user.display_name(), user.email);
    let table = render::user(&user);
    Ok(Out::new(message, user).with_table(table))
}

fn org_hint(config: &Config) -> &'static str {
    if config.organization_id().is_none() {
        ", run 'finboard orgs list' to pick an organization"
    } else {
        ""
    }
}

/// Handles the `finboard logout` command.
///
/// Asks the backend to end the session, deletes the session file and clears the selected
/// organization. Succeeds even if the backend cannot be reached.
pub async fn logout(config: &mut Config) -> Result<Out<()>> {
    api::logout(config).await.pub_result(ErrorType::Io)?;
    config
        .clear_organization_id()
        .await
        .pub_result(ErrorType::Config)?;
    Ok("Logged out".into())
}
