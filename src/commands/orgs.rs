//! Organization command handlers.

use crate::commands::{open, organization, plural, render, Out};
use crate::error::{ErrorType, IntoResult};
use crate::model::{
    CreateOrganizationRequest, OrgId, Organization, OrganizationSummary,
    UpdateOrganizationRequest,
};
use crate::{Config, Mode, Result};
use anyhow::{anyhow, bail};
use tracing::info;

/// Lists the organizations the logged in user belongs to. The selected one is marked with `*`.
pub async fn orgs_list(config: &Config, mode: Mode) -> Result<Out<Vec<Organization>>> {
    let mut source = open(config, mode, None).await?;
    let orgs = source
        .list_organizations()
        .await
        .pub_result(ErrorType::Request)?;
    let table = render::organizations(&orgs, config.organization_id().as_ref());
    let message = format!("Found {} organization{}", orgs.len(), plural(orgs.len()));
    Ok(Out::new(message, orgs).with_table(table))
}

/// Selects the organization that later commands send as `x-org-id`. The id must be one of the
/// organizations returned by the backend.
///
/// # Errors
/// - Returns an error if the organization list cannot be fetched or `id` is not in it.
pub async fn orgs_use(config: &mut Config, mode: Mode, id: &str) -> Result<Out<Organization>> {
    let mut source = open(config, mode, None).await?;
    let orgs = source
        .list_organizations()
        .await
        .pub_result(ErrorType::Request)?;
    let org = orgs
        .into_iter()
        .find(|org| org.id == id)
        .ok_or_else(|| anyhow!("You are not a member of an organization with id '{id}'"))
        .pub_result(ErrorType::Config)?;
    config
        .set_organization_id(&OrgId::new(&org.id))
        .await
        .pub_result(ErrorType::Config)?;
    info!("Later commands will work on '{}'", org.name);
    Ok(Out::new(format!("Selected organization {}", org.id), org))
}

/// Creates an organization with the logged in user as its admin. The selection is left alone.
///
/// # Errors
/// - Returns an error if `name` is blank or the backend refuses the request.
pub async fn orgs_create(config: &Config, mode: Mode, name: &str) -> Result<Out<Organization>> {
    let name = organization_name(name).pub_result(ErrorType::Config)?;
    let mut source = open(config, mode, None).await?;
    let org = source
        .create_organization(CreateOrganizationRequest { name })
        .await
        .pub_result(ErrorType::Request)?;
    let message = format!(
        "Created organization {}, run 'finboard orgs use {}' to work on it",
        org.id, org.id
    );
    Ok(Out::new(message, org))
}

/// Renames the organization given with `--org`, else the selected one.
///
/// # Errors
/// - Returns an error if `name` is blank, no organization is selected, or the backend refuses.
pub async fn orgs_rename(
    config: &Config,
    mode: Mode,
    org: Option<OrgId>,
    name: &str,
) -> Result<Out<Organization>> {
    let name = organization_name(name).pub_result(ErrorType::Config)?;
    let id = selected(config, org.clone()).pub_result(ErrorType::Config)?;
    let mut source = open(config, mode, org).await?;
    let renamed = source
        .update_organization(id.as_str(), UpdateOrganizationRequest { name })
        .await
        .pub_result(ErrorType::Request)?;
    let message = format!("Renamed organization {} to '{}'", renamed.id, renamed.name);
    Ok(Out::new(message, renamed))
}

/// Shows member, account and transaction counts and the balance totals of the organization given
/// with `--org`, else the selected one.
pub async fn orgs_summary(
    config: &Config,
    mode: Mode,
    org: Option<OrgId>,
) -> Result<Out<OrganizationSummary>> {
    let id = selected(config, org.clone()).pub_result(ErrorType::Config)?;
    let mut source = open(config, mode, org).await?;
    let summary = source
        .organization_summary(id.as_str())
        .await
        .pub_result(ErrorType::Request)?;
    let message = format!(
        "{} has {} account{} and {} transaction{}",
        summary.name,
        summary.accounts_count,
        plural(summary.accounts_count),
        summary.transactions_count,
        plural(summary.transactions_count)
    );
    let table = render::organization_summary(&summary);
    Ok(Out::new(message, summary).with_table(table))
}

fn organization_name(name: &str) -> Result<String> {
    let name = name.trim();
    if name.is_empty() {
        bail!("The organization name must not be blank");
    }
    Ok(name.to_string())
}

fn selected(config: &Config, org: Option<OrgId>) -> Result<OrgId> {
    match organization(config, org) {
        Some(id) => Ok(id),
        None => bail!("No organization selected, run 'finboard orgs use <ID>' or pass --org"),
    }
}
