//! These structs provide the CLI interface for the finboard CLI.

use crate::analytics::{TransactionFilter, TypeFilter};
use crate::model::{
    AccountType, Amount, CreateAccountRequest, CreateTransactionRequest, OrgId, TransactionType,
    UpdateAccountRequest, UpdateTransactionRequest,
};
use chrono::{DateTime, NaiveDate, Utc};
use clap::{Parser, Subcommand};
use std::convert::Infallible;
use std::fmt::{Display, Formatter};
use std::ops::Deref;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use tracing::error;
use tracing_subscriber::filter::LevelFilter;

/// finboard: A command-line financial dashboard.
///
/// finboard reads transactions and accounts from your organization's accounting backend and
/// shows headline KPIs, monthly revenue, expense and cashflow series, and where the money goes by
/// category. It can also list, create, edit and export transactions and accounts.
///
/// Set FINBOARD_OFFLINE=1 to work against a local demo snapshot instead of the backend.
#[derive(Debug, Parser, Clone)]
pub struct Args {
    #[clap(flatten)]
    common: Common,

    #[command(subcommand)]
    command: Command,
}

impl Args {
    pub fn new(common: Common, command: Command) -> Self {
        Self { common, command }
    }

    pub fn common(&self) -> &Common {
        &self.common
    }

    pub fn command(&self) -> &Command {
        &self.command
    }
}

#[derive(Subcommand, Debug, Clone)]
pub enum Command {
    /// Create the data directory and initialize the configuration file.
    ///
    /// This is the first command you should run. By default the data directory is
    /// $HOME/finboard, pass --home or set FINBOARD_HOME to put it somewhere else.
    Init(InitArgs),
    /// Create a user on the backend and log in as it.
    Register(RegisterArgs),
    /// Log in to the backend and store the session.
    Login(LoginArgs),
    /// End the session and delete the stored token.
    Logout,
    /// Show the logged in user.
    Whoami,
    /// List, create, rename or summarize organizations, or select the one commands work on.
    Orgs(OrgsArgs),
    /// Show KPIs, monthly series, top spending categories and recent transactions.
    Dashboard(DashboardArgs),
    /// Show the trailing-year report, optionally limited to a date range.
    Report(ReportArgs),
    /// List, show, create, update, delete or export transactions.
    Transactions(TransactionsArgs),
    /// List, show, create, update or delete accounts.
    Accounts(AccountsArgs),
    /// Download all transactions and accounts into a rotated backup and the offline snapshot.
    Pull,
}

/// Arguments common to all subcommands.
#[derive(Debug, Parser, Clone)]
pub struct Common {
    /// The logging verbosity. One of, from least to most verbose:
    /// off, error, warn, info, debug, trace
    ///
    /// This can be overridden by RUST_LOG.
    #[arg(long, global = true, default_value_t = LevelFilter::INFO)]
    log_level: LevelFilter,

    /// The directory where finboard configuration and data is held. Defaults to ~/finboard
    #[arg(long, global = true, env = "FINBOARD_HOME", default_value_t = default_finboard_home())]
    home: DisplayPath,

    /// Work on this organization instead of the one selected with 'finboard orgs use'.
    #[arg(long, global = true)]
    org: Option<String>,
}

impl Common {
    pub fn new(log_level: LevelFilter, home: PathBuf) -> Self {
        Self {
            log_level,
            home: home.into(),
            org: None,
        }
    }

    pub fn log_level(&self) -> LevelFilter {
        self.log_level
    }

    pub fn home(&self) -> &DisplayPath {
        &self.home
    }

    /// The `--org` override, if given and non-empty.
    pub fn org(&self) -> Option<OrgId> {
        self.org
            .as_deref()
            .filter(|org| !org.is_empty())
            .map(OrgId::from)
    }
}

/// Args for the `finboard init` command.
#[derive(Debug, Parser, Clone)]
pub struct InitArgs {
    /// The base URL of the accounting backend, including the API prefix.
    #[arg(long, default_value = crate::config::DEFAULT_API_URL)]
    api_url: String,
}

impl InitArgs {
    pub fn new(api_url: impl Into<String>) -> Self {
        Self {
            api_url: api_url.into(),
        }
    }

    pub fn api_url(&self) -> &str {
        &self.api_url
    }
}

/// Args for the `finboard login` command.
#[derive(Debug, Parser, Clone)]
pub struct LoginArgs {
    #[arg(long)]
    email: String,

    /// Can also be passed as FINBOARD_PASSWORD to keep it out of the shell history.
    #[arg(long, env = "FINBOARD_PASSWORD", hide_env_values = true)]
    password: String,
}

impl LoginArgs {
    pub fn email(&self) -> &str {
        &self.email
    }

    pub fn password(&self) -> &str {
        &self.password
    }
}

/// Args for the `finboard register` command.
#[derive(Debug, Parser, Clone)]
pub struct RegisterArgs {
    #[arg(long)]
    email: String,

    /// Can also be passed as FINBOARD_PASSWORD to keep it out of the shell history.
    #[arg(long, env = "FINBOARD_PASSWORD", hide_env_values = true)]
    password: String,

    /// Your display name.
    #[arg(long)]
    name: Option<String>,
}

impl RegisterArgs {
    pub fn email(&self) -> &str {
        &self.email
    }

    pub fn password(&self) -> &str {
        &self.password
    }

    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }
}

/// Args for the `finboard orgs` command.
#[derive(Debug, Parser, Clone)]
pub struct OrgsArgs {
    #[command(subcommand)]
    command: OrgsSubcommand,
}

impl OrgsArgs {
    pub fn command(&self) -> &OrgsSubcommand {
        &self.command
    }
}

#[derive(Subcommand, Debug, Clone)]
pub enum OrgsSubcommand {
    /// List the organizations you belong to.
    List,
    /// Select the organization that later commands work on.
    Use(IdArgs),
    /// Create an organization. You become its admin.
    Create(NameArgs),
    /// Rename the selected organization, or the one given with --org.
    Rename(NameArgs),
    /// Show counts and balance totals of the selected organization, or the one given with --org.
    Summary,
}

/// A name as a positional argument.
#[derive(Debug, Parser, Clone)]
pub struct NameArgs {
    name: String,
}

impl NameArgs {
    pub fn name(&self) -> &str {
        &self.name
    }
}

/// An entity id as a positional argument.
#[derive(Debug, Parser, Clone)]
pub struct IdArgs {
    id: String,
}

impl IdArgs {
    pub fn new(id: impl Into<String>) -> Self {
        Self { id: id.into() }
    }

    pub fn id(&self) -> &str {
        &self.id
    }
}

/// Args for the `finboard dashboard` command.
#[derive(Debug, Parser, Clone, Default)]
pub struct DashboardArgs {
    /// Compute the dashboard as of this instant (RFC 3339) instead of now.
    #[arg(long)]
    now: Option<DateTime<Utc>>,

    /// Keep running and refetch every SECS seconds, redrawing only when the data changed.
    #[arg(long, value_name = "SECS")]
    watch: Option<u64>,
}

impl DashboardArgs {
    pub fn new(now: Option<DateTime<Utc>>, watch: Option<u64>) -> Self {
        Self { now, watch }
    }

    pub fn now(&self) -> Option<DateTime<Utc>> {
        self.now
    }

    pub fn watch(&self) -> Option<u64> {
        self.watch.filter(|secs| *secs > 0)
    }
}

/// Args for the `finboard report` command.
#[derive(Debug, Parser, Clone, Default)]
pub struct ReportArgs {
    /// First day to include in the series and categories (YYYY-MM-DD).
    #[arg(long)]
    from: Option<NaiveDate>,

    /// Last day to include in the series and categories (YYYY-MM-DD).
    #[arg(long)]
    to: Option<NaiveDate>,

    /// Compute the report as of this instant (RFC 3339) instead of now.
    #[arg(long)]
    now: Option<DateTime<Utc>>,
}

impl ReportArgs {
    pub fn new(from: Option<NaiveDate>, to: Option<NaiveDate>, now: Option<DateTime<Utc>>) -> Self {
        Self { from, to, now }
    }

    pub fn now(&self) -> Option<DateTime<Utc>> {
        self.now
    }

    pub fn filter(&self) -> TransactionFilter {
        TransactionFilter {
            since: self.from,
            until: self.to,
            ..Default::default()
        }
    }
}

/// Args for the `finboard transactions` command.
#[derive(Debug, Parser, Clone)]
pub struct TransactionsArgs {
    #[command(subcommand)]
    command: TransactionsSubcommand,
}

impl TransactionsArgs {
    pub fn command(&self) -> &TransactionsSubcommand {
        &self.command
    }
}

#[derive(Subcommand, Debug, Clone)]
pub enum TransactionsSubcommand {
    /// List transactions, newest first.
    List(ListTransactionsArgs),
    /// Show one transaction.
    Show(IdArgs),
    /// Create a transaction.
    Create(Box<CreateTransactionArgs>),
    /// Change some fields of a transaction.
    Update(Box<UpdateTransactionArgs>),
    /// Delete a transaction.
    Delete(IdArgs),
    /// Write the filtered transaction list to a CSV file.
    Export(ExportArgs),
}

/// Filters for the transaction list. All of them are optional and they combine with AND.
#[derive(Debug, Parser, Clone, Default)]
pub struct FilterArgs {
    /// Only transactions from or to this account.
    #[arg(long)]
    account: Option<String>,

    /// Only transactions of this type.
    #[arg(long = "type", value_enum)]
    kind: Option<TransactionType>,

    /// Case-insensitive text to look for in the description or category.
    #[arg(long)]
    search: Option<String>,

    /// Only transactions on or after this day (YYYY-MM-DD).
    #[arg(long)]
    from: Option<NaiveDate>,

    /// Only transactions on or before this day (YYYY-MM-DD).
    #[arg(long)]
    to: Option<NaiveDate>,
}

impl FilterArgs {
    pub fn filter(&self) -> TransactionFilter {
        TransactionFilter {
            account_id: self.account.clone(),
            kind: TypeFilter::from(self.kind),
            search: self.search.clone(),
            since: self.from,
            until: self.to,
        }
    }
}

/// Args for `finboard transactions list`.
#[derive(Debug, Parser, Clone, Default)]
pub struct ListTransactionsArgs {
    #[clap(flatten)]
    filter: FilterArgs,

    /// Show at most this many transactions.
    #[arg(long)]
    limit: Option<usize>,
}

impl ListTransactionsArgs {
    pub fn new(filter: FilterArgs, limit: Option<usize>) -> Self {
        Self { filter, limit }
    }

    pub fn filter(&self) -> TransactionFilter {
        self.filter.filter()
    }

    pub fn limit(&self) -> Option<usize> {
        self.limit
    }
}

/// Args for `finboard transactions export`.
#[derive(Debug, Parser, Clone)]
pub struct ExportArgs {
    #[clap(flatten)]
    filter: FilterArgs,

    /// The CSV file to write.
    #[arg(long, short)]
    output: PathBuf,
}

impl ExportArgs {
    pub fn new(filter: FilterArgs, output: impl Into<PathBuf>) -> Self {
        Self {
            filter,
            output: output.into(),
        }
    }

    pub fn filter(&self) -> TransactionFilter {
        self.filter.filter()
    }

    pub fn output(&self) -> &Path {
        &self.output
    }
}

/// Args for `finboard transactions create`.
#[derive(Debug, Parser, Clone)]
pub struct CreateTransactionArgs {
    #[arg(long = "type", value_enum)]
    kind: TransactionType,

    /// A non-negative amount, e.g. 1250.50
    #[arg(long)]
    amount: Amount,

    /// Defaults to USD.
    #[arg(long)]
    currency: Option<String>,

    #[arg(long)]
    description: Option<String>,

    /// ISO 8601 date or timestamp. Defaults to now.
    #[arg(long)]
    date: Option<String>,

    #[arg(long)]
    category: Option<String>,

    /// Can be given more than once.
    #[arg(long = "tag")]
    tags: Vec<String>,

    #[arg(long)]
    from_account: Option<String>,

    #[arg(long)]
    to_account: Option<String>,
}

impl CreateTransactionArgs {
    pub fn new(kind: TransactionType, amount: Amount) -> Self {
        Self {
            kind,
            amount,
            currency: None,
            description: None,
            date: None,
            category: None,
            tags: Vec::new(),
            from_account: None,
            to_account: None,
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn with_category(mut self, category: impl Into<String>) -> Self {
        self.category = Some(category.into());
        self
    }

    pub fn with_date(mut self, date: impl Into<String>) -> Self {
        self.date = Some(date.into());
        self
    }

    pub fn amount(&self) -> Amount {
        self.amount
    }

    pub fn date(&self) -> Option<&str> {
        self.date.as_deref()
    }

    pub fn request(&self) -> CreateTransactionRequest {
        CreateTransactionRequest {
            kind: self.kind,
            amount: self.amount,
            currency: self.currency.clone(),
            description: self.description.clone(),
            date: self.date.clone(),
            category: self.category.clone(),
            tags: if self.tags.is_empty() {
                None
            } else {
                Some(self.tags.clone())
            },
            from_account_id: self.from_account.clone(),
            to_account_id: self.to_account.clone(),
        }
    }
}

/// Args for `finboard transactions update`. Only the given fields change.
#[derive(Debug, Parser, Clone, Default)]
pub struct UpdateTransactionArgs {
    id: String,

    #[arg(long = "type", value_enum)]
    kind: Option<TransactionType>,

    #[arg(long)]
    amount: Option<Amount>,

    #[arg(long)]
    currency: Option<String>,

    #[arg(long)]
    description: Option<String>,

    #[arg(long)]
    date: Option<String>,

    #[arg(long)]
    category: Option<String>,

    /// Replaces all tags. Can be given more than once.
    #[arg(long = "tag")]
    tags: Vec<String>,

    #[arg(long)]
    from_account: Option<String>,

    #[arg(long)]
    to_account: Option<String>,
}

impl UpdateTransactionArgs {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            ..Default::default()
        }
    }

    pub fn with_category(mut self, category: impl Into<String>) -> Self {
        self.category = Some(category.into());
        self
    }

    pub fn with_amount(mut self, amount: Amount) -> Self {
        self.amount = Some(amount);
        self
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn amount(&self) -> Option<Amount> {
        self.amount
    }

    pub fn date(&self) -> Option<&str> {
        self.date.as_deref()
    }

    pub fn request(&self) -> UpdateTransactionRequest {
        UpdateTransactionRequest {
            kind: self.kind,
            amount: self.amount,
            currency: self.currency.clone(),
            description: self.description.clone(),
            date: self.date.clone(),
            category: self.category.clone(),
            tags: if self.tags.is_empty() {
                None
            } else {
                Some(self.tags.clone())
            },
            from_account_id: self.from_account.clone(),
            to_account_id: self.to_account.clone(),
        }
    }
}

/// Args for the `finboard accounts` command.
#[derive(Debug, Parser, Clone)]
pub struct AccountsArgs {
    #[command(subcommand)]
    command: AccountsSubcommand,
}

impl AccountsArgs {
    pub fn command(&self) -> &AccountsSubcommand {
        &self.command
    }
}

#[derive(Subcommand, Debug, Clone)]
pub enum AccountsSubcommand {
    /// List accounts.
    List,
    /// Show one account.
    Show(IdArgs),
    /// Create an account.
    Create(CreateAccountArgs),
    /// Change some fields of an account.
    Update(UpdateAccountArgs),
    /// Delete an account.
    Delete(IdArgs),
}

/// Args for `finboard accounts create`.
#[derive(Debug, Parser, Clone)]
pub struct CreateAccountArgs {
    #[arg(long)]
    name: String,

    #[arg(long = "type", value_enum)]
    kind: AccountType,

    /// Defaults to USD.
    #[arg(long)]
    currency: Option<String>,

    #[arg(long)]
    description: Option<String>,

    /// Create the account as inactive.
    #[arg(long)]
    inactive: bool,

    /// Opening balance. Only used in offline mode, the backend derives balances itself.
    #[arg(long, allow_hyphen_values = true)]
    balance: Option<Amount>,
}

impl CreateAccountArgs {
    pub fn new(name: impl Into<String>, kind: AccountType) -> Self {
        Self {
            name: name.into(),
            kind,
            currency: None,
            description: None,
            inactive: false,
            balance: None,
        }
    }

    pub fn request(&self) -> CreateAccountRequest {
        CreateAccountRequest {
            name: self.name.clone(),
            kind: self.kind,
            currency: self.currency.clone(),
            description: self.description.clone(),
            is_active: if self.inactive { Some(false) } else { None },
            balance: self.balance,
        }
    }
}

/// Args for `finboard accounts update`. Only the given fields change.
#[derive(Debug, Parser, Clone, Default)]
pub struct UpdateAccountArgs {
    id: String,

    #[arg(long)]
    name: Option<String>,

    #[arg(long = "type", value_enum)]
    kind: Option<AccountType>,

    #[arg(long)]
    currency: Option<String>,

    #[arg(long)]
    description: Option<String>,

    /// true or false
    #[arg(long)]
    active: Option<bool>,
}

impl UpdateAccountArgs {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            ..Default::default()
        }
    }

    pub fn with_active(mut self, active: bool) -> Self {
        self.active = Some(active);
        self
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn request(&self) -> UpdateAccountRequest {
        UpdateAccountRequest {
            name: self.name.clone(),
            kind: self.kind,
            currency: self.currency.clone(),
            description: self.description.clone(),
            is_active: self.active,
        }
    }
}

fn default_finboard_home() -> DisplayPath {
    DisplayPath(match dirs::home_dir() {
        Some(home) => home.join("finboard"),
        None => {
            error!(
                "There was an error when trying to get your home directory. You can get around \
                this by providing --home or FINBOARD_HOME instead of relying on the default \
                finboard home directory. If you continue using the program right now, you may \
                have problems!",
            );
            PathBuf::from("finboard")
        }
    })
}

#[derive(Debug, Default, Clone, Eq, PartialEq, Ord, PartialOrd, Hash)]
pub struct DisplayPath(PathBuf);

impl From<PathBuf> for DisplayPath {
    fn from(value: PathBuf) -> Self {
        DisplayPath(value)
    }
}

impl Deref for DisplayPath {
    type Target = Path;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl AsRef<Path> for DisplayPath {
    fn as_ref(&self) -> &Path {
        &self.0
    }
}

impl Display for DisplayPath {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0.to_string_lossy())
    }
}

impl FromStr for DisplayPath {
    type Err = Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self(PathBuf::from(s)))
    }
}

impl DisplayPath {
    pub fn path(&self) -> &Path {
        &self.0
    }
}
