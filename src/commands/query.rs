//! Query command handlers: read-only listings of what is stored.

use crate::args::{PeriodSelection, QueryBudgetsArgs, QueryPeriodsArgs, QueryTransactionsArgs};
use crate::commands::{plural, Out, Rows};
use crate::db::TransactionFilter;
use crate::error::{ErrorType, IntoResult};
use crate::model::Transaction;
use crate::period::{Period, PeriodMode};
use crate::report::PeriodSpend;
use crate::{Config, Result};
use anyhow::ensure;
use chrono::Utc;

/// Lists transactions for one period, or for all time with `--period all`.
///
/// Without `--period` the most recent period that has transactions is shown, or the current
/// period if nothing is stored yet.
pub async fn query_transactions(config: Config, args: QueryTransactionsArgs) -> Result<Out<Rows>> {
    let offset = config.offset().pub_result(ErrorType::Config)?;
    let period = match args.period() {
        Some(PeriodSelection::All) => None,
        Some(PeriodSelection::One(p)) => {
            check_mode(p, args.mode()).pub_result(ErrorType::Input)?;
            Some(p)
        }
        None => Some(latest_period(&config, args.mode()).await?),
    };
    let range = period
        .map(|p| p.utc_bounds(offset))
        .transpose()
        .pub_result(ErrorType::Input)?;

    let filter = TransactionFilter {
        range,
        category: args.category(),
        sort_by: args.sort_by(),
        ascending: args.ascending(),
    };
    let transactions = config
        .db()
        .list_transactions(&filter)
        .await
        .pub_result(ErrorType::Database)?;

    let cells: Vec<Vec<String>> = transactions.iter().map(Transaction::cells).collect();
    let rows = Rows::render(args.format(), &Transaction::HEADERS, &cells, &transactions)?;
    let scope = match period {
        Some(p) => p.label(),
        None => "all time".to_string(),
    };
    let message = format!(
        "Found {} for {scope}",
        plural(transactions.len(), "transaction", "transactions")
    );
    Ok(Out::new(message, rows))
}

/// Lists every period that has transactions, newest first, with its total spend.
pub async fn query_periods(config: Config, args: QueryPeriodsArgs) -> Result<Out<Rows>> {
    let totals = config
        .db()
        .spending_by_period(args.mode(), config.utc_offset_minutes())
        .await
        .pub_result(ErrorType::Database)?;
    let periods: Vec<PeriodSpend> = totals
        .iter()
        .rev()
        .map(|(p, spent)| PeriodSpend {
            period: *p,
            label: p.label(),
            spent: *spent,
        })
        .collect();

    let cells: Vec<Vec<String>> = periods
        .iter()
        .map(|p| vec![p.period.key(), p.label.clone(), p.spent.to_string()])
        .collect();
    let rows = Rows::render(args.format(), &["period", "label", "spent"], &cells, &periods)?;
    let unit = args.mode().unit();
    Ok(Out::new(
        format!("Found {} {unit}s with transactions", periods.len()),
        rows,
    ))
}

/// Lists the weekly budget target of every category, with the monthly equivalent.
pub async fn query_budgets(config: Config, args: QueryBudgetsArgs) -> Result<Out<Rows>> {
    let targets = config
        .db()
        .budget_targets()
        .await
        .pub_result(ErrorType::Database)?;
    let monthly = PeriodMode::Monthly.multiplier();
    let mut cells: Vec<Vec<String>> = targets
        .iter()
        .map(|(c, weekly)| {
            vec![
                c.to_string(),
                weekly.to_string(),
                (weekly * monthly).to_string(),
            ]
        })
        .collect();
    let total = targets.weekly_total();
    cells.push(vec![
        "Total".to_string(),
        total.to_string(),
        (total * monthly).to_string(),
    ]);
    let rows = Rows::render(
        args.format(),
        &["category", "weekly", "monthly"],
        &cells,
        &targets,
    )?;
    Ok(Out::new(format!("The weekly budget is {total}"), rows))
}

/// The most recent period of `mode` that has transactions, or the current period if there are
/// none.
pub(super) async fn latest_period(config: &Config, mode: PeriodMode) -> Result<Period> {
    let offset = config.offset().pub_result(ErrorType::Config)?;
    let totals = config
        .db()
        .spending_by_period(mode, config.utc_offset_minutes())
        .await
        .pub_result(ErrorType::Database)?;
    Ok(match totals.keys().next_back() {
        Some(p) => *p,
        None => Period::containing(mode, &Utc::now(), offset),
    })
}

/// Fails if `period` was written for a different mode than the one requested.
pub(super) fn check_mode(period: Period, mode: PeriodMode) -> Result<()> {
    ensure!(
        period.mode() == mode,
        "Period {period} is not a {} period, pass --mode {}",
        mode.unit(),
        period.mode()
    );
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::OutputFormat;
    use crate::db::SortBy;
    use crate::error::error_type;
    use crate::model::Category;
    use crate::test::TestEnv;
    use serde_json::Value;
    use std::str::FromStr;

    fn json(out: &Out<Rows>) -> &Value {
        out.structure().unwrap().json().unwrap()
    }

    fn descriptions(out: &Out<Rows>) -> Vec<String> {
        json(out)
            .as_array()
            .unwrap()
            .iter()
            .map(|t| t["description"].as_str().unwrap().to_string())
            .collect()
    }

    #[tokio::test]
    async fn test_default_period_is_latest_with_data() {
        let env = TestEnv::new().await;
        env.sync_seed_data().await;

        let args = QueryTransactionsArgs::new(PeriodMode::Weekly, None, OutputFormat::Json);
        let out = query_transactions(env.config(), args).await.unwrap();
        // Week 02 of 2025 starts on Monday 13 January
        assert_eq!(
            descriptions(&out),
            vec!["Coles", "Wilson Parking", "ATM Withdrawal", "Bunnings Warehouse"]
        );
        assert!(out.message().contains("W02 2025"), "{}", out.message());
    }

    #[tokio::test]
    async fn test_all_time_sorted_by_amount() {
        let env = TestEnv::new().await;
        env.sync_seed_data().await;

        let args = QueryTransactionsArgs::new(
            PeriodMode::Weekly,
            Some(PeriodSelection::All),
            OutputFormat::Json,
        )
        .with_sort(SortBy::Amount, false);
        let out = query_transactions(env.config(), args).await.unwrap();
        let d = descriptions(&out);
        assert_eq!(d.len(), 9);
        assert_eq!(d[0], "Coles");
        assert_eq!(d[8], "Opal Travel");
        assert_eq!(out.message(), "Found 9 transactions for all time");
    }

    #[tokio::test]
    async fn test_category_filter_in_month() {
        let env = TestEnv::new().await;
        env.sync_seed_data().await;

        let period = Period::from_str("2025-01").unwrap();
        let args = QueryTransactionsArgs::new(
            PeriodMode::Monthly,
            Some(PeriodSelection::One(period)),
            OutputFormat::Json,
        )
        .with_category(Category::Groceries)
        .with_sort(SortBy::Date, true);
        let out = query_transactions(env.config(), args).await.unwrap();
        assert_eq!(descriptions(&out), vec!["Woolworths Metro", "Coles"]);
    }

    #[tokio::test]
    async fn test_period_mode_mismatch() {
        let env = TestEnv::new().await;
        let period = Period::from_str("2025-01").unwrap();
        let args = QueryTransactionsArgs::new(
            PeriodMode::Weekly,
            Some(PeriodSelection::One(period)),
            OutputFormat::Table,
        );
        let err = query_transactions(env.config(), args).await.unwrap_err();
        assert_eq!(error_type(&err), Some(ErrorType::Input));
    }

    #[tokio::test]
    async fn test_empty_table_has_headers() {
        let env = TestEnv::new().await;
        let args = QueryTransactionsArgs::new(PeriodMode::Weekly, None, OutputFormat::Table);
        let out = query_transactions(env.config(), args).await.unwrap();
        let table = out.structure().unwrap().to_string();
        assert!(table.starts_with("| id "));
        assert_eq!(table.lines().count(), 2);
    }

    #[tokio::test]
    async fn test_query_periods_newest_first() {
        let env = TestEnv::new().await;
        env.sync_seed_data().await;

        let out = query_periods(
            env.config(),
            QueryPeriodsArgs::new(PeriodMode::Weekly, OutputFormat::Json),
        )
        .await
        .unwrap();
        let periods: Vec<&str> = json(&out)
            .as_array()
            .unwrap()
            .iter()
            .map(|p| p["period"].as_str().unwrap())
            .collect();
        assert_eq!(periods, vec!["2025-W02", "2025-W01"]);

        let out = query_periods(
            env.config(),
            QueryPeriodsArgs::new(PeriodMode::Monthly, OutputFormat::Csv),
        )
        .await
        .unwrap();
        assert_eq!(
            out.structure().unwrap().to_string(),
            "period,label,spent\n2025-01,January 2025,$299.04\n"
        );
    }

    #[tokio::test]
    async fn test_query_budgets() {
        let env = TestEnv::new().await;
        let out = query_budgets(env.config(), QueryBudgetsArgs::new(OutputFormat::Csv))
            .await
            .unwrap();
        let csv = out.structure().unwrap().to_string();
        // Ten categories, a total and the header
        assert_eq!(csv.lines().count(), 12);
        assert!(csv.contains("Groceries,$0.00,$0.00"));
        assert!(csv.ends_with("Total,$0.00,$0.00\n"));
    }
}
