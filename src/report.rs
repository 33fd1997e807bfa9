//! Budget aggregation and spending overview.
//!
//! These functions are pure: they take totals that were already summed by the database and
//! the weekly budget targets, and produce the structures that the `report` commands render.

use crate::model::{Amount, BudgetTargets, Category};
use crate::period::{Period, PeriodMode};
use crate::Result;
use anyhow::ensure;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Where spending stands relative to its ceiling.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Status {
    Under,
    AtLimit,
    Over,
}

serde_plain::derive_display_from_serialize!(Status);

impl Status {
    /// Classifies `spent` against `target`. A zero target with no spending is `Under`; a zero
    /// target with any spending is `AtLimit`.
    pub fn of(spent: Amount, target: Amount) -> Self {
        if spent.is_zero() || spent < target {
            Status::Under
        } else if target.is_zero() || spent == target {
            Status::AtLimit
        } else {
            Status::Over
        }
    }
}

/// The fraction of `target` used by `spent`, clamped to `[0, 1]`.
pub fn progress(spent: Amount, target: Amount) -> f64 {
    match spent.ratio(target) {
        Some(r) => r.clamp(0.0, 1.0),
        None if spent.is_positive() => 1.0,
        None => 0.0,
    }
}

/// Spending against the scaled ceiling for one category.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CategoryBudget {
    pub spent: Amount,
    pub target: Amount,
    pub status: Status,
    pub progress: f64,
}

impl CategoryBudget {
    fn new(spent: Amount, target: Amount) -> Self {
        Self {
            spent,
            target,
            status: Status::of(spent, target),
            progress: progress(spent, target),
        }
    }
}

/// Per-category budget progress for one period.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BudgetReport {
    pub period: Period,
    pub label: String,
    pub categories: BTreeMap<Category, CategoryBudget>,
    /// Spending on transactions that have no category. Counted in `total`.
    pub uncategorized: Amount,
    pub total: CategoryBudget,
}

/// Builds the budget report for `period`.
///
/// `spent` holds the summed spending per category for the period; the `None` key holds
/// uncategorised spending. Categories missing from `spent` count as zero. Weekly `targets` are
/// scaled by the period's mode.
pub fn budget_report(
    period: Period,
    spent: &BTreeMap<Option<Category>, Amount>,
    targets: &BudgetTargets,
) -> BudgetReport {
    let multiplier = period.mode().multiplier();
    let categories: BTreeMap<Category, CategoryBudget> = Category::ALL
        .iter()
        .map(|c| {
            let s = spent.get(&Some(*c)).copied().unwrap_or_default();
            (*c, CategoryBudget::new(s, targets.weekly(*c) * multiplier))
        })
        .collect();
    let uncategorized = spent.get(&None).copied().unwrap_or_default();
    let total_spent = categories.values().map(|b| b.spent).sum::<Amount>() + uncategorized;
    let total_target = targets.weekly_total() * multiplier;
    BudgetReport {
        period,
        label: period.label(),
        categories,
        uncategorized,
        total: CategoryBudget::new(total_spent, total_target),
    }
}

/// Spending in one period of the overview window.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PeriodSpend {
    pub period: Period,
    pub label: String,
    pub spent: Amount,
}

/// Headline numbers for the most recent periods, plus the series they are drawn from.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Overview {
    pub mode: PeriodMode,
    /// Spending per period, oldest first, with zero for periods that had no transactions.
    pub series: Vec<PeriodSpend>,
    pub current: Amount,
    pub previous: Amount,
    /// `current - previous`.
    pub change: Amount,
    /// The sum of all weekly targets scaled to the mode.
    pub budget: Amount,
    /// `budget - current`; negative when over budget.
    pub remaining: Amount,
    pub status: Status,
    pub average: Amount,
}

/// Builds the overview for `window`, which must be non-empty and oldest first. `totals` holds
/// spending per period as summed by the database; periods outside the window are ignored.
pub fn overview(
    mode: PeriodMode,
    window: &[Period],
    totals: &BTreeMap<Period, Amount>,
    targets: &BudgetTargets,
) -> Result<Overview> {
    ensure!(!window.is_empty(), "The overview needs at least one period");
    let series: Vec<PeriodSpend> = window
        .iter()
        .map(|p| PeriodSpend {
            period: *p,
            label: p.label(),
            spent: totals.get(p).copied().unwrap_or_default(),
        })
        .collect();

    let current = series.last().map(|s| s.spent).unwrap_or_default();
    let previous = if series.len() > 1 {
        series[series.len() - 2].spent
    } else {
        Amount::ZERO
    };
    let budget = targets.weekly_total() * mode.multiplier();
    let sum: Amount = series.iter().map(|s| s.spent).sum();
    let average = Amount::new(sum.value() / rust_decimal::Decimal::from(series.len())).rounded();

    Ok(Overview {
        mode,
        series,
        current,
        previous,
        change: current - previous,
        budget,
        remaining: budget - current,
        status: Status::of(current, budget),
        average,
    })
}
