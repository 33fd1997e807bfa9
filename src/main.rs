use clap::Parser;
use pennypal::args::{
    Args, Command, DeleteSubcommand, InsertSubcommand, QuerySubcommand, ReportSubcommand,
    UpdateSubcommand,
};
use pennypal::{commands, Config, Mode, Result};
use std::process::ExitCode;
use tracing::{debug, error, trace};
use tracing_subscriber::filter::LevelFilter;
use tracing_subscriber::EnvFilter;

#[tokio::main(flavor = "current_thread")]
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
    let home = args.common().pennypal_home().path();

    // This allows for running the program without an Up Bank account. When
    // PENNYPAL_IN_TEST_MODE is set and non-empty, seed transactions are served instead.
    let mode = Mode::from_env();

    let _: () = match args.command() {
        Command::Init(init_args) => commands::init(
            home,
            init_args.token_file(),
            init_args.api_url(),
            init_args.utc_offset_minutes(),
        )
        .await?
        .print(),

        Command::Sync(_sync_args) => commands::sync(Config::load(home).await?, mode)
            .await?
            .print(),

        Command::Insert(insert_args) => {
            let config = Config::load(home).await?;
            match insert_args.entity() {
                InsertSubcommand::Transaction(args) => {
                    commands::insert_transaction(config, args.clone())
                        .await?
                        .print()
                }
            }
        }

        Command::Delete(delete_args) => {
            let config = Config::load(home).await?;
            match delete_args.entity() {
                DeleteSubcommand::Transactions(args) => {
                    commands::delete_transactions(config, args.clone())
                        .await?
                        .print()
                }
            }
        }

        Command::Update(update_args) => {
            let config = Config::load(home).await?;
            match update_args.entity() {
                UpdateSubcommand::Transactions(args) => {
                    commands::update_transactions(config, args.clone())
                        .await?
                        .print()
                }
                UpdateSubcommand::Budgets(args) => commands::update_budgets(config, args.clone())
                    .await?
                    .print(),
            }
        }

        Command::Query(query_args) => {
            let config = Config::load(home).await?;
            match query_args.entity() {
                QuerySubcommand::Transactions(args) => {
                    commands::query_transactions(config, args.clone())
                        .await?
                        .print_rows()
                }
                QuerySubcommand::Periods(args) => commands::query_periods(config, args.clone())
                    .await?
                    .print_rows(),
                QuerySubcommand::Budgets(args) => commands::query_budgets(config, args.clone())
                    .await?
                    .print_rows(),
            }
        }

        Command::Report(report_args) => {
            let config = Config::load(home).await?;
            match report_args.entity() {
                ReportSubcommand::Budget(args) => commands::report_budget(config, args.clone())
                    .await?
                    .print_rows(),
                ReportSubcommand::Overview(args) => {
                    commands::report_overview(config, args.clone())
                        .await?
                        .print_rows()
                }
            }
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
