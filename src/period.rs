//! Period bucketing: maps timestamps onto weeks or calendar months.
//!
//! Weeks follow the `%W` convention used by both `chrono` and SQLite's `strftime`: weeks start
//! on Monday, week `01` begins on the first Monday of the year and any days before it belong
//! to week `00`. Keys always carry the year (`2025-W03`, `2025-03`) so that sorting keys as
//! text gives chronological order, including across year boundaries.

use crate::{utils, Result};
use anyhow::{bail, Context};
use chrono::{DateTime, Datelike, Days, FixedOffset, NaiveDate, Utc};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt::{Display, Formatter};
use std::str::FromStr;

/// Whether spending is bucketed by week or by calendar month.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    Default,
    Serialize,
    Deserialize,
    clap::ValueEnum,
)]
#[serde(rename_all = "lowercase")]
pub enum PeriodMode {
    #[default]
    Weekly,
    Monthly,
}

serde_plain::derive_display_from_serialize!(PeriodMode);
serde_plain::derive_fromstr_from_deserialize!(PeriodMode);

impl PeriodMode {
    /// Budget targets are weekly; a month is budgeted as four weeks.
    pub const fn multiplier(&self) -> u32 {
        match self {
            PeriodMode::Weekly => 1,
            PeriodMode::Monthly => 4,
        }
    }

    /// The SQLite `strftime` format that produces the same keys as `Period::key`.
    pub const fn sql_format(&self) -> &'static str {
        match self {
            PeriodMode::Weekly => "%Y-W%W",
            PeriodMode::Monthly => "%Y-%m",
        }
    }

    /// The singular noun for one period, e.g. "week".
    pub const fn unit(&self) -> &'static str {
        match self {
            PeriodMode::Weekly => "week",
            PeriodMode::Monthly => "month",
        }
    }
}

/// The SQLite date modifier that shifts a stored UTC timestamp into local time.
pub(crate) fn sql_offset_modifier(utc_offset_minutes: i32) -> String {
    format!("{utc_offset_minutes:+} minutes")
}

/// A single week or month. Ordering is chronological within a mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Period {
    mode: PeriodMode,
    /// The first day of the period. For week `00` this is January 1st, for every other week it is
    /// a Monday, for months it is the first of the month.
    start: NaiveDate,
}

/// `%W` week number: days before the first Monday are week 0.
fn week_number(date: NaiveDate) -> u32 {
    (date.ordinal0() + 7 - date.weekday().num_days_from_monday()) / 7
}

fn jan_first(year: i32) -> Result<NaiveDate> {
    NaiveDate::from_yo_opt(year, 1).with_context(|| format!("Year {year} is out of range"))
}

fn first_monday(year: i32) -> Result<NaiveDate> {
    let jan1 = jan_first(year)?;
    let days = (7 - jan1.weekday().num_days_from_monday()) % 7;
    jan1.checked_add_days(Days::new(u64::from(days)))
        .with_context(|| format!("Year {year} is out of range"))
}

impl Period {
    /// The period of `mode` that contains `date`.
    pub fn of(mode: PeriodMode, date: NaiveDate) -> Self {
        let start = match mode {
            PeriodMode::Weekly => {
                let back = u64::from(date.weekday().num_days_from_monday());
                match date.checked_sub_days(Days::new(back)) {
                    Some(monday) if monday.year() == date.year() => monday,
                    // The week began last year, so this is week 00 which starts on January 1st
                    _ => date.with_ordinal(1).unwrap_or(date),
                }
            }
            PeriodMode::Monthly => date.with_day(1).unwrap_or(date),
        };
        Self { mode, start }
    }

    /// The period of `mode` that contains `timestamp` when viewed at `offset`.
    pub fn containing(mode: PeriodMode, timestamp: &DateTime<Utc>, offset: FixedOffset) -> Self {
        Self::of(mode, timestamp.with_timezone(&offset).date_naive())
    }

    /// The `n` periods ending with the one that contains `today`, oldest first.
    pub fn recent(mode: PeriodMode, today: NaiveDate, n: usize) -> Result<Vec<Self>> {
        let mut periods = Vec::with_capacity(n);
        let mut current = Self::of(mode, today);
        for i in 0..n {
            periods.push(current);
            if i + 1 < n {
                current = current.prev()?;
            }
        }
        periods.reverse();
        Ok(periods)
    }

    pub fn mode(&self) -> PeriodMode {
        self.mode
    }

    /// The first day of the period.
    pub fn start(&self) -> NaiveDate {
        self.start
    }

    /// The first day after the period.
    pub fn end(&self) -> Result<NaiveDate> {
        let year = self.start.year();
        match self.mode {
            PeriodMode::Weekly => {
                let days = 7 - self.start.weekday().num_days_from_monday();
                let next_monday = self
                    .start
                    .checked_add_days(Days::new(u64::from(days)))
                    .with_context(|| format!("Period {self} is out of range"))?;
                if next_monday.year() == year {
                    Ok(next_monday)
                } else {
                    // The last week of a year is cut short at December 31st
                    jan_first(year + 1)
                }
            }
            PeriodMode::Monthly => {
                let (y, m) = if self.start.month() == 12 {
                    (year + 1, 1)
                } else {
                    (year, self.start.month() + 1)
                };
                NaiveDate::from_ymd_opt(y, m, 1)
                    .with_context(|| format!("Period {self} is out of range"))
            }
        }
    }

    pub fn next(&self) -> Result<Self> {
        Ok(Self::of(self.mode, self.end()?))
    }

    pub fn prev(&self) -> Result<Self> {
        let before = self
            .start
            .pred_opt()
            .with_context(|| format!("Period {self} is out of range"))?;
        Ok(Self::of(self.mode, before))
    }

    /// The half-open UTC range `[start, end)` covered by this period at `offset`.
    pub fn utc_bounds(&self, offset: FixedOffset) -> Result<(DateTime<Utc>, DateTime<Utc>)> {
        Ok((
            utils::local_midnight(self.start, offset)?,
            utils::local_midnight(self.end()?, offset)?,
        ))
    }

    /// The sortable key, e.g. `2025-W03` or `2025-03`.
    pub fn key(&self) -> String {
        match self.mode {
            PeriodMode::Weekly => format!(
                "{:04}-W{:02}",
                self.start.year(),
                week_number(self.start)
            ),
            PeriodMode::Monthly => format!("{:04}-{:02}", self.start.year(), self.start.month()),
        }
    }

    /// A human label, e.g. `W03 2025` or `March 2025`.
    pub fn label(&self) -> String {
        match self.mode {
            PeriodMode::Weekly => {
                format!("W{:02} {}", week_number(self.start), self.start.year())
            }
            PeriodMode::Monthly => self.start.format("%B %Y").to_string(),
        }
    }
}

impl Display for Period {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.key())
    }
}

impl FromStr for Period {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        let s = s.trim();
        if let Some((year, week)) = s.split_once("-W") {
            let year: i32 = year
                .parse()
                .with_context(|| format!("Invalid year in period '{s}'"))?;
            let week: u32 = week
                .parse()
                .with_context(|| format!("Invalid week in period '{s}'"))?;
            let start = if week == 0 {
                jan_first(year)?
            } else {
                first_monday(year)?
                    .checked_add_days(Days::new(u64::from(week - 1) * 7))
                    .with_context(|| format!("Invalid period '{s}'"))?
            };
            let period = Self::of(PeriodMode::Weekly, start);
            if start.year() != year || period.key() != format!("{year:04}-W{week:02}") {
                bail!("Week {week:02} does not exist in {year}");
            }
            return Ok(period);
        }

        let Some((year, month)) = s.split_once('-') else {
            bail!("Invalid period '{s}', expected YYYY-Www or YYYY-MM");
        };
        let year: i32 = year
            .parse()
            .with_context(|| format!("Invalid year in period '{s}'"))?;
        let month: u32 = month
            .parse()
            .with_context(|| format!("Invalid month in period '{s}'"))?;
        let start = NaiveDate::from_ymd_opt(year, month, 1)
            .with_context(|| format!("Month {month} does not exist"))?;
        Ok(Self::of(PeriodMode::Monthly, start))
    }
}

impl Serialize for Period {
    fn serialize<S>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&self.key())
    }
}

impl<'de> Deserialize<'de> for Period {
    fn deserialize<D>(deserializer: D) -> std::result::Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        Period::from_str(&s).map_err(serde::de::Error::custom)
    }
}
