use clap::Parser;
use finboard::args::{
    AccountsSubcommand, Args, Command, OrgsSubcommand, TransactionsSubcommand,
};
use finboard::{commands, Config, Mode, Result};
use std::process::ExitCode;
use tracing::{debug, error, trace};
use tracing_subscriber::filter::LevelFilter;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> ExitCode {
    let args = Args::parse();
    let log_level = args.common().log_level();
    init_logger(log_level);
    debug!("Log level set to {}", log_level.to_string().to_lowercase());

    match main_inner(args).await {
        Ok(_) => ExitCode::SUCCESS,
        Err(e) => {
            error!("Exiting with error: {e:#}");
            ExitCode::FAILURE
        }
    }
}

pub async fn main_inner(args: Args) -> Result<()> {
    trace!("{args:?}");
    let home = args.common().home().path();
    let org = args.common().org();

    // When FINBOARD_OFFLINE is set and non-empty every command reads and writes the local
    // offline.json snapshot instead of calling the backend.
    let mode = Mode::from_env();

    let _: () = match args.command() {
        Command::Init(init_args) => commands::init(home, init_args.api_url()).await?.print(),

        Command::Register(register_args) => {
            let config = Config::load(home).await?;
            commands::register(
                &config,
                register_args.email(),
                register_args.password(),
                register_args.name(),
            )
            .await?
            .print()
        }

        Command::Login(login_args) => {
            let config = Config::load(home).await?;
            commands::login(&config, login_args.email(), login_args.password())
                .await?
                .print()
        }

        Command::Logout => {
            let mut config = Config::load(home).await?;
            commands::logout(&mut config).await?.print()
        }

        Command::Whoami => {
            let config = Config::load(home).await?;
            commands::whoami(&config, mode).await?.print()
        }

        Command::Orgs(orgs_args) => {
            let mut config = Config::load(home).await?;
            match orgs_args.command() {
                OrgsSubcommand::List => commands::orgs_list(&config, mode).await?.print(),
                OrgsSubcommand::Use(id) => commands::orgs_use(&mut config, mode, id.id())
                    .await?
                    .print(),
                OrgsSubcommand::Create(name) => commands::orgs_create(&config, mode, name.name())
                    .await?
                    .print(),
                OrgsSubcommand::Rename(name) => {
                    commands::orgs_rename(&config, mode, org, name.name())
                        .await?
                        .print()
                }
                OrgsSubcommand::Summary => commands::orgs_summary(&config, mode, org).await?.print(),
            }
        }

        Command::Dashboard(dashboard_args) => {
            let config = Config::load(home).await?;
            match dashboard_args.watch() {
                Some(secs) => {
                    commands::dashboard_watch(&config, mode, org, dashboard_args.now(), secs)
                        .await?
                        .print()
                }
                None => commands::dashboard(&config, mode, org, dashboard_args.now())
                    .await?
                    .print(),
            }
        }

        Command::Report(report_args) => {
            let config = Config::load(home).await?;
            commands::report(&config, mode, org, report_args.filter(), report_args.now())
                .await?
                .print()
        }

        Command::Transactions(transactions_args) => {
            let config = Config::load(home).await?;
            match transactions_args.command() {
                TransactionsSubcommand::List(list) => {
                    commands::transactions_list(&config, mode, org, list.filter(), list.limit())
                        .await?
                        .print()
                }
                TransactionsSubcommand::Show(id) => {
                    commands::transactions_show(&config, mode, org, id.id())
                        .await?
                        .print()
                }
                TransactionsSubcommand::Create(create) => {
                    commands::transactions_create(&config, mode, org, *create.clone())
                        .await?
                        .print()
                }
                TransactionsSubcommand::Update(update) => {
                    commands::transactions_update(&config, mode, org, *update.clone())
                        .await?
                        .print()
                }
                TransactionsSubcommand::Delete(id) => {
                    commands::transactions_delete(&config, mode, org, id.id())
                        .await?
                        .print()
                }
                TransactionsSubcommand::Export(export) => commands::transactions_export(
                    &config,
                    mode,
                    org,
                    export.filter(),
                    export.output(),
                )
                .await?
                .print(),
            }
        }

        Command::Accounts(accounts_args) => {
            let config = Config::load(home).await?;
            match accounts_args.command() {
                AccountsSubcommand::List => {
                    commands::accounts_list(&config, mode, org).await?.print()
                }
                AccountsSubcommand::Show(id) => {
                    commands::accounts_show(&config, mode, org, id.id())
                        .await?
                        .print()
                }
                AccountsSubcommand::Create(create) => {
                    commands::accounts_create(&config, mode, org, create.clone())
                        .await?
                        .print()
                }
                AccountsSubcommand::Update(update) => {
                    commands::accounts_update(&config, mode, org, update.clone())
                        .await?
                        .print()
                }
                AccountsSubcommand::Delete(id) => {
                    commands::accounts_delete(&config, mode, org, id.id())
                        .await?
                        .print()
                }
            }
        }

        Command::Pull => {
            let config = Config::load(home).await?;
            commands::pull(&config, mode, org).await?.print()
        }
    };
    Ok(())
}

/// Initializes the tracing subscriber.
pub fn init_logger(level: LevelFilter) {
    let filter = match std::env::var("RUST_LOG").ok() {
        Some(_) => {
            // RUST_LOG exists; use it.
            EnvFilter::from_default_env()
        }
        None => {
            // RUST_LOG does not exist; use default log level for this crate only.
            EnvFilter::new(format!(
                "{}={},{}={}",
                env!("CARGO_CRATE_NAME"),
                level,
                env!("CARGO_BIN_NAME"),
                level
            ))
        }
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}
