//! Report command handlers: budget progress for one period and the multi-period overview.

use super::query::{check_mode, latest_period};
use crate::args::{
    ReportBudgetArgs, ReportOverviewArgs, MAX_OVERVIEW_PERIODS, MIN_OVERVIEW_PERIODS,
};
use crate::commands::{bar, Out, Rows};
use crate::error::{ErrorType, IntoResult};
use crate::model::Amount;
use crate::period::Period;
use crate::report::{budget_report, overview, CategoryBudget, Overview};
use crate::{Config, Result};
use anyhow::anyhow;
use chrono::Utc;
use tracing::debug;

const BAR_WIDTH: usize = 10;
const BUDGET_HEADERS: [&str; 6] = ["category", "spent", "budget", "remaining", "status", "progress"];
const OVERVIEW_HEADERS: [&str; 4] = ["period", "label", "spent", "chart"];

/// Shows spending against the scaled budget for each category in one period.
///
/// Without `--period` the most recent period that has transactions is used, or the current
/// period if nothing is stored yet. Weekly targets are multiplied by four in monthly mode.
pub async fn report_budget(config: Config, args: ReportBudgetArgs) -> Result<Out<Rows>> {
    let offset = config.offset().pub_result(ErrorType::Config)?;
    let period = match args.period() {
        Some(p) => {
            check_mode(p, args.mode()).pub_result(ErrorType::Input)?;
            p
        }
        None => latest_period(&config, args.mode()).await?,
    };
    let (from, to) = period.utc_bounds(offset).pub_result(ErrorType::Input)?;
    debug!("Budget report for {period} covers {from} to {to}");

    let db = config.db();
    let spent = db
        .spending_by_category(&from, &to)
        .await
        .pub_result(ErrorType::Database)?;
    let targets = db.budget_targets().await.pub_result(ErrorType::Database)?;
    let report = budget_report(period, &spent, &targets);

    let mut cells: Vec<Vec<String>> = report
        .categories
        .iter()
        .map(|(c, b)| budget_cells(&c.to_string(), b))
        .collect();
    if !report.uncategorized.is_zero() {
        cells.push(vec![
            "Uncategorized".to_string(),
            report.uncategorized.to_string(),
            String::new(),
            String::new(),
            String::new(),
            String::new(),
        ]);
    }
    cells.push(budget_cells("Total", &report.total));

    let message = format!(
        "Spent {} of {} in {} ({})",
        report.total.spent, report.total.target, report.label, report.total.status
    );
    let rows = Rows::render(args.format(), &BUDGET_HEADERS, &cells, &report)?;
    Ok(Out::new(message, rows))
}

/// Shows spending for the last `--periods` periods ending with `--until`, or with the current
/// period, along with how the latest period compares to the one before and to the budget.
pub async fn report_overview(config: Config, args: ReportOverviewArgs) -> Result<Out<Rows>> {
    let n = args.periods();
    if !(MIN_OVERVIEW_PERIODS..=MAX_OVERVIEW_PERIODS).contains(&n) {
        return Err(anyhow!(
            "The overview covers between {MIN_OVERVIEW_PERIODS} and {MAX_OVERVIEW_PERIODS} \
             periods, got {n}"
        ))
        .pub_result(ErrorType::Input);
    }
    let offset = config.offset().pub_result(ErrorType::Config)?;
    let mode = args.mode();
    let until = match args.until() {
        Some(p) => {
            check_mode(p, mode).pub_result(ErrorType::Input)?;
            p
        }
        None => Period::containing(mode, &Utc::now(), offset),
    };
    let window = Period::recent(mode, until.start(), usize::from(n)).pub_result(ErrorType::Input)?;

    let db = config.db();
    let totals = db
        .spending_by_period(mode, config.utc_offset_minutes())
        .await
        .pub_result(ErrorType::Database)?;
    let targets = db.budget_targets().await.pub_result(ErrorType::Database)?;
    let overview = overview(mode, &window, &totals, &targets)?;

    let highest = overview
        .series
        .iter()
        .map(|s| s.spent)
        .max()
        .unwrap_or_default();
    let cells: Vec<Vec<String>> = overview
        .series
        .iter()
        .map(|s| {
            vec![
                s.period.key(),
                s.label.clone(),
                s.spent.to_string(),
                bar(s.spent.ratio(highest).unwrap_or_default(), BAR_WIDTH),
            ]
        })
        .collect();
    let rows = Rows::render(args.format(), &OVERVIEW_HEADERS, &cells, &overview)?;
    Ok(Out::new(headline(&overview, until), rows))
}

fn budget_cells(name: &str, b: &CategoryBudget) -> Vec<String> {
    vec![
        name.to_string(),
        b.spent.to_string(),
        b.target.to_string(),
        (b.target - b.spent).to_string(),
        b.status.to_string(),
        bar(b.progress, BAR_WIDTH),
    ]
}

fn signed(amount: Amount) -> String {
    if amount.is_positive() {
        format!("+{amount}")
    } else {
        amount.to_string()
    }
}

fn headline(o: &Overview, current: Period) -> String {
    format!(
        "{}: spent {} ({} on the previous {}), budget {}, remaining {} ({}), average {}",
        current.label(),
        o.current,
        signed(o.change),
        o.mode.unit(),
        o.budget,
        o.remaining,
        o.status,
        o.average
    )
}
