//! Account command handlers.

use crate::args::{CreateAccountArgs, UpdateAccountArgs};
use crate::commands::{open, plural, render, require_changes, Out};
use crate::error::{ErrorType, IntoResult};
use crate::model::{Account, OrgId};
use crate::{Config, Mode, Result};

pub async fn accounts_list(
    config: &Config,
    mode: Mode,
    org: Option<OrgId>,
) -> Result<Out<Vec<Account>>> {
    let mut source = open(config, mode, org).await?;
    let accounts = source.list_accounts().await.pub_result(ErrorType::Request)?;
    let active = accounts.iter().filter(|a| a.is_active).count();
    let message = format!(
        "Found {} account{}, {active} active",
        accounts.len(),
        plural(accounts.len())
    );
    let table = render::accounts(&accounts);
    Ok(Out::new(message, accounts).with_table(table))
}

pub async fn accounts_show(
    config: &Config,
    mode: Mode,
    org: Option<OrgId>,
    id: &str,
) -> Result<Out<Account>> {
    let mut source = open(config, mode, org).await?;
    let account = source.get_account(id).await.pub_result(ErrorType::Request)?;
    let table = render::accounts(std::slice::from_ref(&account));
    Ok(Out::new(format!("Account {id}"), account).with_table(table))
}

/// Creates an account. New accounts are active unless `--inactive` is given.
pub async fn accounts_create(
    config: &Config,
    mode: Mode,
    org: Option<OrgId>,
    args: CreateAccountArgs,
) -> Result<Out<Account>> {
    let mut source = open(config, mode, org).await?;
    let account = source
        .create_account(args.request())
        .await
        .pub_result(ErrorType::Request)?;
    let table = render::accounts(std::slice::from_ref(&account));
    Ok(Out::new(format!("Created account {}", account.id), account).with_table(table))
}

/// Changes the fields given in `args`.
///
/// # Errors
/// - Returns an error if no field is given or the account does not exist.
pub async fn accounts_update(
    config: &Config,
    mode: Mode,
    org: Option<OrgId>,
    args: UpdateAccountArgs,
) -> Result<Out<Account>> {
    let request = args.request();
    require_changes(request.is_empty()).pub_result(ErrorType::Config)?;
    let mut source = open(config, mode, org).await?;
    let account = source
        .update_account(args.id(), request)
        .await
        .pub_result(ErrorType::Request)?;
    let table = render::accounts(std::slice::from_ref(&account));
    Ok(Out::new(format!("Updated account {}", account.id), account).with_table(table))
}

pub async fn accounts_delete(
    config: &Config,
    mode: Mode,
    org: Option<OrgId>,
    id: &str,
) -> Result<Out<()>> {
    let mut source = open(config, mode, org).await?;
    source
        .delete_account(id)
        .await
        .pub_result(ErrorType::Request)?;
    Ok(format!("Deleted account {id}").into())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::AccountType;
    use crate::test::TestEnv;

    #[tokio::test]
    async fn test_accounts_list() {
        let env = TestEnv::new().await;
        let out = accounts_list(&env.config(), Mode::Offline, None)
            .await
            .unwrap();
        assert_eq!(out.structure().unwrap().len(), 4);
        assert_eq!(out.message(), "Found 4 accounts, 3 active");
        assert!(out.table().unwrap().contains("Operating Checking"));
    }

    #[tokio::test]
    async fn test_accounts_lifecycle() {
        let env = TestEnv::new().await;
        let config = env.config();
        let created = accounts_create(
            &config,
            Mode::Offline,
            None,
            CreateAccountArgs::new("Petty Cash", AccountType::Asset),
        )
        .await
        .unwrap();
        let account = created.structure().unwrap().clone();
        assert!(account.is_active);
        assert_eq!(account.currency, "USD");
        assert_eq!(env.snapshot().await.accounts.len(), 5);

        let updated = accounts_update(
            &config,
            Mode::Offline,
            None,
            UpdateAccountArgs::new(&account.id).with_active(false),
        )
        .await
        .unwrap();
        assert!(!updated.structure().unwrap().is_active);
        assert_eq!(updated.structure().unwrap().name, "Petty Cash");

        let shown = accounts_show(&config, Mode::Offline, None, &account.id)
            .await
            .unwrap();
        assert!(!shown.structure().unwrap().is_active);

        accounts_delete(&config, Mode::Offline, None, &account.id)
            .await
            .unwrap();
        assert_eq!(env.snapshot().await.accounts.len(), 4);
    }

    #[tokio::test]
    async fn test_update_missing_account() {
        let env = TestEnv::new().await;
        let err = accounts_update(
            &env.config(),
            Mode::Offline,
            None,
            UpdateAccountArgs::new("acc-404").with_active(true),
        )
        .await
        .unwrap_err();
        assert_eq!(err.to_string(), "request error");
    }
}
