//! Command handlers for the pennypal CLI.
//!
//! Each handler takes the loaded `Config` and its parsed arguments and returns an `Out`. Handlers
//! that produce a listing return `Out<Rows>`, already rendered in the requested `OutputFormat`.

mod delete;
mod init;
mod insert;
mod query;
mod report;
mod sync;
mod update;

use crate::Result;
use anyhow::{anyhow, Context};
use serde::Serialize;
use std::fmt::{Debug, Display, Formatter};
use tracing::{debug, info};

pub use crate::ingest::IngestSummary;
pub use delete::delete_transactions;
pub use init::init;
pub use insert::insert_transaction;
pub use query::{query_budgets, query_periods, query_transactions};
pub use report::{report_budget, report_overview};
pub use sync::sync;
pub use update::{update_budgets, update_transactions};

/// The output type for a command. This allows the command to return a consistent message and,
/// optionally, structured data.
#[derive(Debug, Clone, Serialize)]
pub struct Out<T>
where
    T: Serialize + Clone + Debug,
{
    /// A message that can be printed to the user regarding the outcome of the command execution.
    message: String,

    /// Any structured data that needs to be output from the call.
    structure: Option<T>,
}

impl<T, S> From<S> for Out<T>
where
    T: Debug + Clone + Serialize,
    S: Into<String>,
{
    fn from(value: S) -> Self {
        Out::new_message(value)
    }
}

impl<T> Out<T>
where
    T: Serialize + Clone + Debug,
{
    /// Create a new `Out` object that has `Some(structure)`.
    pub fn new<S>(message: S, structure: T) -> Self
    where
        S: Into<String>,
    {
        Self {
            message: message.into(),
            structure: Some(structure),
        }
    }

    /// Create a new `Out` object that has `None` for `structure`.
    pub fn new_message<S>(message: S) -> Self
    where
        S: Into<String>,
    {
        Self {
            message: message.into(),
            structure: None,
        }
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub fn structure(&self) -> Option<&T> {
        self.structure.as_ref()
    }

    /// Print the message to `info!` and the structured data (if it exists) as JSON to `debug!`.
    pub fn print(&self) {
        info!("{}", self.message);
        if let Some(structure) = self.structure() {
            if let Ok(json) = serde_json::to_string_pretty(structure) {
                debug!("Command output:\n\n{json}\n\n");
            }
        }
    }
}

impl Out<Rows> {
    /// Print the message to `info!` (stderr) and the rendered rows to stdout.
    pub fn print_rows(&self) {
        info!("{}", self.message);
        if let Some(rows) = self.structure() {
            println!("{rows}");
        }
    }
}

/// How listings and reports are rendered.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Default,
    serde::Serialize,
    serde::Deserialize,
    clap::ValueEnum,
)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    /// An aligned Markdown table.
    #[default]
    Table,
    Csv,
    /// The structured data as pretty-printed JSON.
    Json,
}

serde_plain::derive_display_from_serialize!(OutputFormat);
serde_plain::derive_fromstr_from_deserialize!(OutputFormat);

/// Rows in the requested output format.
#[derive(Clone, Serialize)]
#[serde(untagged)]
pub enum Rows {
    Json(serde_json::Value),
    /// Markdown table as a single formatted string.
    Table(String),
    /// CSV data as a properly escaped string.
    Csv(String),
}

impl Rows {
    /// Renders `data` as JSON, or `headers` and `cells` as a table or CSV.
    pub(crate) fn render<T: Serialize>(
        format: OutputFormat,
        headers: &[&str],
        cells: &[Vec<String>],
        data: &T,
    ) -> Result<Self> {
        Ok(match format {
            OutputFormat::Json => {
                Rows::Json(serde_json::to_value(data).context("Unable to serialize output")?)
            }
            OutputFormat::Table => Rows::Table(markdown_table(headers, cells)),
            OutputFormat::Csv => Rows::Csv(csv_text(headers, cells)?),
        })
    }

    /// The JSON value, if this was rendered as JSON.
    pub fn json(&self) -> Option<&serde_json::Value> {
        match self {
            Rows::Json(v) => Some(v),
            _ => None,
        }
    }
}

impl Debug for Rows {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Rows::Json(v) => write!(f, "Rows::Json({:?})", v),
            Rows::Table(s) => write!(f, "Rows::Table({} chars)", s.len()),
            Rows::Csv(s) => write!(f, "Rows::Csv({} chars)", s.len()),
        }
    }
}

impl Display for Rows {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Rows::Json(v) => {
                if let Ok(s) = serde_json::to_string_pretty(v) {
                    write!(f, "{}", s)
                } else {
                    write!(f, "{:?}", v)
                }
            }
            Rows::Table(s) => write!(f, "{}", s),
            Rows::Csv(s) => write!(f, "{}", s),
        }
    }
}

fn markdown_table(headers: &[&str], cells: &[Vec<String>]) -> String {
    let mut widths: Vec<usize> = headers.iter().map(|h| h.chars().count().max(3)).collect();
    for row in cells {
        for (i, cell) in row.iter().enumerate() {
            if let Some(w) = widths.get_mut(i) {
                *w = (*w).max(cell.chars().count());
            }
        }
    }

    let line = |values: Vec<&str>| -> String {
        let padded: Vec<String> = values
            .iter()
            .zip(&widths)
            .map(|(v, w)| format!("{v:<width$}", width = *w))
            .collect();
        format!("| {} |", padded.join(" | "))
    };

    let mut out = Vec::with_capacity(cells.len() + 2);
    out.push(line(headers.to_vec()));
    out.push(format!(
        "|{}|",
        widths
            .iter()
            .map(|w| "-".repeat(w + 2))
            .collect::<Vec<_>>()
            .join("|")
    ));
    for row in cells {
        out.push(line(row.iter().map(String::as_str).collect()));
    }
    out.join("\n")
}

fn csv_text(headers: &[&str], cells: &[Vec<String>]) -> Result<String> {
    let mut writer = csv::Writer::from_writer(Vec::new());
    writer
        .write_record(headers)
        .context("Unable to write CSV header")?;
    for row in cells {
        writer.write_record(row).context("Unable to write CSV row")?;
    }
    let bytes = writer
        .into_inner()
        .map_err(|e| anyhow!("Unable to finish CSV output: {}", e.error()))?;
    String::from_utf8(bytes).context("CSV output is not UTF-8")
}

/// A text bar for `fraction` of `width` characters, e.g. `#####.....`.
pub(crate) fn bar(fraction: f64, width: usize) -> String {
    let filled = ((fraction.clamp(0.0, 1.0) * width as f64).round() as usize).min(width);
    format!("{}{}", "#".repeat(filled), ".".repeat(width - filled))
}

fn plural(count: usize, singular: &str, plural: &str) -> String {
    format!("{count} {}", if count == 1 { singular } else { plural })
}
