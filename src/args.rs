//! These structs provide the CLI interface for the pennypal CLI.

use crate::commands::OutputFormat;
use crate::db::SortBy;
use crate::model::{Amount, Category, TransactionUpdates};
use crate::period::{Period, PeriodMode};
use anyhow::Context;
use clap::{Parser, Subcommand};
use std::convert::Infallible;
use std::fmt::{Display, Formatter};
use std::ops::Deref;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use tracing::error;
use tracing_subscriber::filter::LevelFilter;

/// pennypal: A personal budgeting tool for Up Bank customers.
///
/// The purpose of this program is to download your spending from the Up Bank API into a local
/// SQLite database, bucket it into weeks or months, and show you how it compares to a weekly
/// budget for each spending category.
///
/// You will need a personal access token from https://api.up.com.au. Pass the file that holds
/// it to `pennypal init --token-file`.
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
    /// Create the data directory, the configuration file and the database.
    ///
    /// This is the first command you should run. By default the data directory is
    /// $HOME/pennypal; pass --pennypal-home to put it somewhere else. Pass --utc-offset-minutes
    /// with your local offset (e.g. 600 for Brisbane) so that weeks and months start at your
    /// midnight rather than UTC midnight.
    Init(InitArgs),
    /// Download new transactions from Up Bank and store the expenses among them.
    Sync(SyncArgs),
    /// Add a transaction by hand.
    Insert(InsertArgs),
    /// Delete transactions by id.
    Delete(DeleteArgs),
    /// Edit transactions or budget targets.
    Update(UpdateArgs),
    /// List transactions, periods or budget targets.
    Query(QueryArgs),
    /// Show budget progress or the spending overview.
    Report(ReportArgs),
}

/// Arguments common to all subcommands.
#[derive(Debug, Parser, Clone)]
pub struct Common {
    /// The logging verbosity. One of, from least to most verbose:
    /// off, error, warn, info, debug, trace
    ///
    /// This can be overridden by RUST_LOG.
    #[arg(long, default_value_t = LevelFilter::INFO)]
    log_level: LevelFilter,

    /// The directory where pennypal data and configuration is held. Defaults to ~/pennypal
    #[arg(long, env = "PENNYPAL_HOME", default_value_t = default_pennypal_home())]
    pennypal_home: DisplayPath,
}

impl Common {
    pub fn new(log_level: LevelFilter, pennypal_home: PathBuf) -> Self {
        Self {
            log_level,
            pennypal_home: pennypal_home.into(),
        }
    }

    pub fn log_level(&self) -> LevelFilter {
        self.log_level
    }

    pub fn pennypal_home(&self) -> &DisplayPath {
        &self.pennypal_home
    }
}

/// Args for the `pennypal init` command.
#[derive(Debug, Parser, Clone)]
pub struct InitArgs {
    /// A file containing your Up Bank personal access token. It is copied to
    /// $PENNYPAL_HOME/.secrets/token. Not needed in test mode.
    #[arg(long)]
    token_file: Option<PathBuf>,

    /// The base URL of the Up Bank API.
    #[arg(long)]
    api_url: Option<String>,

    /// Your local offset from UTC in minutes, used to decide which week or month a transaction
    /// falls in.
    #[arg(long, default_value_t = 0, allow_hyphen_values = true)]
    utc_offset_minutes: i32,
}

impl InitArgs {
    pub fn new(
        token_file: Option<PathBuf>,
        api_url: Option<String>,
        utc_offset_minutes: i32,
    ) -> Self {
        Self {
            token_file,
            api_url,
            utc_offset_minutes,
        }
    }

    pub fn token_file(&self) -> Option<&Path> {
        self.token_file.as_deref()
    }

    pub fn api_url(&self) -> Option<&str> {
        self.api_url.as_deref()
    }

    pub fn utc_offset_minutes(&self) -> i32 {
        self.utc_offset_minutes
    }
}

/// Args for the `pennypal sync` command.
#[derive(Debug, Parser, Clone, Default)]
pub struct SyncArgs {}

#[derive(Debug, Parser, Clone)]
pub struct InsertArgs {
    #[command(subcommand)]
    entity: InsertSubcommand,
}

impl InsertArgs {
    pub fn entity(&self) -> &InsertSubcommand {
        &self.entity
    }
}

#[derive(Subcommand, Debug, Clone)]
pub enum InsertSubcommand {
    /// Add an expense that did not come from the bank, e.g. a cash purchase.
    Transaction(InsertTransactionArgs),
}

/// Args for `pennypal insert transaction`.
#[derive(Debug, Parser, Clone)]
pub struct InsertTransactionArgs {
    #[arg(long)]
    description: String,

    /// The amount spent, a positive number such as 12.50 or $1,200.
    #[arg(long, allow_hyphen_values = true)]
    amount: Amount,

    /// RFC 3339 timestamp, or YYYY-MM-DD for local midnight.
    #[arg(long)]
    date: String,

    #[arg(long)]
    category: Option<Category>,

    #[arg(long)]
    note: Option<String>,
}

impl InsertTransactionArgs {
    pub fn new(
        description: impl Into<String>,
        amount: Amount,
        date: impl Into<String>,
        category: Option<Category>,
        note: Option<String>,
    ) -> Self {
        Self {
            description: description.into(),
            amount,
            date: date.into(),
            category,
            note,
        }
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    pub fn amount(&self) -> Amount {
        self.amount
    }

    pub fn date(&self) -> &str {
        &self.date
    }

    pub fn category(&self) -> Option<Category> {
        self.category
    }

    pub fn note(&self) -> Option<&str> {
        self.note.as_deref()
    }
}

#[derive(Debug, Parser, Clone)]
pub struct DeleteArgs {
    #[command(subcommand)]
    entity: DeleteSubcommand,
}

impl DeleteArgs {
    pub fn entity(&self) -> &DeleteSubcommand {
        &self.entity
    }
}

#[derive(Subcommand, Debug, Clone)]
pub enum DeleteSubcommand {
    /// Delete transactions. Either all of them are deleted or, if any id does not exist, none.
    Transactions(DeleteTransactionsArgs),
}

/// Args for `pennypal delete transactions`.
#[derive(Debug, Parser, Clone)]
pub struct DeleteTransactionsArgs {
    #[arg(required = true, num_args = 1..)]
    ids: Vec<i64>,
}

impl DeleteTransactionsArgs {
    pub fn new(ids: impl IntoIterator<Item = i64>) -> Self {
        Self {
            ids: ids.into_iter().collect(),
        }
    }

    pub fn ids(&self) -> &[i64] {
        &self.ids
    }
}

#[derive(Debug, Parser, Clone)]
pub struct UpdateArgs {
    #[command(subcommand)]
    entity: UpdateSubcommand,
}

impl UpdateArgs {
    pub fn entity(&self) -> &UpdateSubcommand {
        &self.entity
    }
}

#[derive(Subcommand, Debug, Clone)]
pub enum UpdateSubcommand {
    /// Edit the description, amount, category or note of transactions.
    ///
    /// Either apply the same changes to every --id, or pass --edits with a JSON file holding a
    /// list of per-row edits such as [{"id": 3, "category": "Groceries"}]. All edits are saved
    /// together; if any id does not exist nothing is changed.
    Transactions(UpdateTransactionsArgs),
    /// Set weekly budget targets, e.g. --set Groceries=150 --set "Life Admin=40".
    Budgets(UpdateBudgetsArgs),
}

/// Args for `pennypal update transactions`.
#[derive(Debug, Parser, Clone, Default)]
pub struct UpdateTransactionsArgs {
    #[arg(long = "id")]
    ids: Vec<i64>,

    #[arg(long)]
    description: Option<String>,

    #[arg(long, allow_hyphen_values = true)]
    amount: Option<Amount>,

    #[arg(long)]
    category: Option<Category>,

    /// Move the transactions back to uncategorised.
    #[arg(long, conflicts_with = "category")]
    clear_category: bool,

    #[arg(long)]
    note: Option<String>,

    /// A JSON file of per-row edits.
    #[arg(
        long,
        conflicts_with_all = ["ids", "description", "amount", "category", "clear_category", "note"]
    )]
    edits: Option<PathBuf>,
}

impl UpdateTransactionsArgs {
    pub fn new(ids: impl IntoIterator<Item = i64>, updates: TransactionUpdates) -> Self {
        Self {
            ids: ids.into_iter().collect(),
            description: updates.description,
            amount: updates.amount,
            category: updates.category,
            clear_category: updates.clear_category,
            note: updates.note,
            edits: None,
        }
    }

    pub fn from_edits_file(path: impl Into<PathBuf>) -> Self {
        Self {
            edits: Some(path.into()),
            ..Self::default()
        }
    }

    pub fn ids(&self) -> &[i64] {
        &self.ids
    }

    pub fn updates(&self) -> TransactionUpdates {
        TransactionUpdates {
            description: self.description.clone(),
            amount: self.amount,
            category: self.category,
            note: self.note.clone(),
            clear_category: self.clear_category,
        }
    }

    pub fn edits(&self) -> Option<&Path> {
        self.edits.as_deref()
    }
}

/// Args for `pennypal update budgets`.
#[derive(Debug, Parser, Clone)]
pub struct UpdateBudgetsArgs {
    /// CATEGORY=AMOUNT, may be repeated.
    #[arg(long = "set", required = true)]
    assignments: Vec<BudgetAssignment>,
}

impl UpdateBudgetsArgs {
    pub fn new(assignments: impl IntoIterator<Item = BudgetAssignment>) -> Self {
        Self {
            assignments: assignments.into_iter().collect(),
        }
    }

    pub fn assignments(&self) -> &[BudgetAssignment] {
        &self.assignments
    }
}

/// A weekly target for one category, written `CATEGORY=AMOUNT`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BudgetAssignment {
    pub category: Category,
    pub amount: Amount,
}

impl FromStr for BudgetAssignment {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (category, amount) = s
            .split_once('=')
            .with_context(|| format!("Expected CATEGORY=AMOUNT, got '{s}'"))?;
        Ok(Self {
            category: category.parse()?,
            amount: amount
                .parse()
                .with_context(|| format!("Invalid amount in '{s}'"))?,
        })
    }
}

#[derive(Debug, Parser, Clone)]
pub struct QueryArgs {
    #[command(subcommand)]
    entity: QuerySubcommand,
}

impl QueryArgs {
    pub fn entity(&self) -> &QuerySubcommand {
        &self.entity
    }
}

#[derive(Subcommand, Debug, Clone)]
pub enum QuerySubcommand {
    /// The transaction table for one period, or for all time with --period all.
    Transactions(QueryTransactionsArgs),
    /// Every period that has transactions, newest first, with its total.
    Periods(QueryPeriodsArgs),
    /// The weekly budget target of every category.
    Budgets(QueryBudgetsArgs),
}

/// Either every transaction or one period's worth.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PeriodSelection {
    All,
    One(Period),
}

impl FromStr for PeriodSelection {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.trim().eq_ignore_ascii_case("all") {
            return Ok(PeriodSelection::All);
        }
        Ok(PeriodSelection::One(s.parse()?))
    }
}

/// Args for `pennypal query transactions`.
#[derive(Debug, Parser, Clone, Default)]
pub struct QueryTransactionsArgs {
    #[arg(long, value_enum, default_value_t)]
    mode: PeriodMode,

    /// A period key such as 2025-W03 or 2025-03, or "all". Defaults to the most recent period
    /// that has transactions.
    #[arg(long)]
    period: Option<PeriodSelection>,

    #[arg(long)]
    category: Option<Category>,

    #[arg(long, value_enum, default_value_t)]
    sort_by: SortBy,

    /// Sort ascending instead of descending.
    #[arg(long)]
    ascending: bool,

    #[arg(long, value_enum, default_value_t)]
    format: OutputFormat,
}

impl QueryTransactionsArgs {
    pub fn new(mode: PeriodMode, period: Option<PeriodSelection>, format: OutputFormat) -> Self {
        Self {
            mode,
            period,
            format,
            ..Self::default()
        }
    }

    pub fn with_category(mut self, category: Category) -> Self {
        self.category = Some(category);
        self
    }

    pub fn with_sort(mut self, sort_by: SortBy, ascending: bool) -> Self {
        self.sort_by = sort_by;
        self.ascending = ascending;
        self
    }

    pub fn mode(&self) -> PeriodMode {
        self.mode
    }

    pub fn period(&self) -> Option<PeriodSelection> {
        self.period
    }

    pub fn category(&self) -> Option<Category> {
        self.category
    }

    pub fn sort_by(&self) -> SortBy {
        self.sort_by
    }

    pub fn ascending(&self) -> bool {
        self.ascending
    }

    pub fn format(&self) -> OutputFormat {
        self.format
    }
}

/// Args for `pennypal query periods`.
#[derive(Debug, Parser, Clone, Default)]
pub struct QueryPeriodsArgs {
    #[arg(long, value_enum, default_value_t)]
    mode: PeriodMode,

    #[arg(long, value_enum, default_value_t)]
    format: OutputFormat,
}

impl QueryPeriodsArgs {
    pub fn new(mode: PeriodMode, format: OutputFormat) -> Self {
        Self { mode, format }
    }

    pub fn mode(&self) -> PeriodMode {
        self.mode
    }

    pub fn format(&self) -> OutputFormat {
        self.format
    }
}

/// Args for `pennypal query budgets`.
#[derive(Debug, Parser, Clone, Default)]
pub struct QueryBudgetsArgs {
    #[arg(long, value_enum, default_value_t)]
    format: OutputFormat,
}

impl QueryBudgetsArgs {
    pub fn new(format: OutputFormat) -> Self {
        Self { format }
    }

    pub fn format(&self) -> OutputFormat {
        self.format
    }
}

#[derive(Debug, Parser, Clone)]
pub struct ReportArgs {
    #[command(subcommand)]
    entity: ReportSubcommand,
}

impl ReportArgs {
    pub fn entity(&self) -> &ReportSubcommand {
        &self.entity
    }
}

#[derive(Subcommand, Debug, Clone)]
pub enum ReportSubcommand {
    /// Spending against the budget for each category in one period.
    Budget(ReportBudgetArgs),
    /// Spending per period over a window, with the current period compared to the budget.
    Overview(ReportOverviewArgs),
}

/// Args for `pennypal report budget`.
#[derive(Debug, Parser, Clone, Default)]
pub struct ReportBudgetArgs {
    #[arg(long, value_enum, default_value_t)]
    mode: PeriodMode,

    /// A period key such as 2025-W03 or 2025-03. Defaults to the most recent period that has
    /// transactions.
    #[arg(long)]
    period: Option<Period>,

    #[arg(long, value_enum, default_value_t)]
    format: OutputFormat,
}

impl ReportBudgetArgs {
    pub fn new(mode: PeriodMode, period: Option<Period>, format: OutputFormat) -> Self {
        Self {
            mode,
            period,
            format,
        }
    }

    pub fn mode(&self) -> PeriodMode {
        self.mode
    }

    pub fn period(&self) -> Option<Period> {
        self.period
    }

    pub fn format(&self) -> OutputFormat {
        self.format
    }
}

pub const DEFAULT_OVERVIEW_PERIODS: u16 = 5;
pub const MIN_OVERVIEW_PERIODS: u16 = 5;
pub const MAX_OVERVIEW_PERIODS: u16 = 52;

/// Args for `pennypal report overview`.
#[derive(Debug, Parser, Clone)]
pub struct ReportOverviewArgs {
    #[arg(long, value_enum, default_value_t)]
    mode: PeriodMode,

    /// How many periods to show, between 5 and 52.
    #[arg(
        long,
        default_value_t = DEFAULT_OVERVIEW_PERIODS,
        value_parser = clap::value_parser!(u16).range(5..=52)
    )]
    periods: u16,

    /// The last period of the window. Defaults to the period containing today.
    #[arg(long)]
    until: Option<Period>,

    #[arg(long, value_enum, default_value_t)]
    format: OutputFormat,
}

impl ReportOverviewArgs {
    pub fn new(
        mode: PeriodMode,
        periods: u16,
        until: Option<Period>,
        format: OutputFormat,
    ) -> Self {
        Self {
            mode,
            periods,
            until,
            format,
        }
    }

    pub fn mode(&self) -> PeriodMode {
        self.mode
    }

    pub fn periods(&self) -> u16 {
        self.periods
    }

    pub fn until(&self) -> Option<Period> {
        self.until
    }

    pub fn format(&self) -> OutputFormat {
        self.format
    }
}

fn default_pennypal_home() -> DisplayPath {
    DisplayPath(match dirs::home_dir() {
        Some(home) => home.join("pennypal"),
        None => {
            error!(
                "There was an error when trying to get your home directory. You can get around \
                this by providing --pennypal-home or PENNYPAL_HOME instead of relying on the \
                default pennypal home directory. If you continue using the program right now, \
                you may have problems!",
            );
            PathBuf::from("pennypal")
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
