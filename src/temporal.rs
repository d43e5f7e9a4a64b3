use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::str::FromStr;

use chrono::{Datelike, NaiveDate};
use serde::{Serialize, Serializer};
use tracing::debug;

use crate::dataset::{is_weekend, Dataset};
use crate::error::QueryError;

/// A calendar month, ordered chronologically. Prints and parses as `YYYY-MM`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Period {
    pub year: i32,
    pub month: u32,
}

impl Period {
    pub fn of(date: NaiveDate) -> Self {
        Period {
            year: date.year(),
            month: date.month(),
        }
    }

    pub fn contains(&self, date: NaiveDate) -> bool {
        date.year() == self.year && date.month() == self.month
    }
}

impl fmt::Display for Period {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:04}-{:02}", self.year, self.month)
    }
}

impl FromStr for Period {
    type Err = QueryError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || QueryError::InvalidPeriod(s.to_string());
        let (year, month) = s.trim().split_once('-').ok_or_else(invalid)?;
        let year: i32 = year.parse().map_err(|_| invalid())?;
        let month: u32 = month.parse().map_err(|_| invalid())?;
        if !(1..=12).contains(&month) {
            return Err(invalid());
        }
        Ok(Period { year, month })
    }
}

impl Serialize for Period {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct DailyCount {
    pub date: NaiveDate,
    pub count: u64,
}

/// Mean transactions per day on weekdays and on weekend days.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct WeekSplit {
    pub weekday_mean: Option<f64>,
    pub weekend_mean: Option<f64>,
}

/// Distinct months with activity, ascending.
pub fn periods_available(dataset: &Dataset) -> Vec<Period> {
    let periods: BTreeSet<Period> = dataset.transactions().iter().map(|t| t.period).collect();
    periods.into_iter().collect()
}

/// Dense daily resample of transaction counts.
///
/// Covers every calendar day from the first to the last active day of the selected
/// rows, with zero for idle days. An empty selection yields an empty series.
pub fn daily_counts(dataset: &Dataset, period: Option<Period>) -> Vec<DailyCount> {
    let mut per_day: BTreeMap<NaiveDate, u64> = BTreeMap::new();
    for t in dataset.transactions() {
        if period.is_some_and(|p| t.period != p) {
            continue;
        }
        *per_day.entry(t.date()).or_insert(0) += 1;
    }

    let (first, last) = match (per_day.keys().next(), per_day.keys().next_back()) {
        (Some(first), Some(last)) => (*first, *last),
        _ => {
            debug!(period = ?period.map(|p| p.to_string()), "no transactions in selection");
            return Vec::new();
        }
    };

    let series: Vec<DailyCount> = first
        .iter_days()
        .take_while(|d| *d <= last)
        .map(|date| DailyCount {
            date,
            count: per_day.get(&date).copied().unwrap_or(0),
        })
        .collect();
    debug!(days = series.len(), "resampled daily counts");
    series
}

/// Saturdays and Sundays present in the series.
pub fn weekend_days(series: &[DailyCount]) -> BTreeSet<NaiveDate> {
    series
        .iter()
        .map(|d| d.date)
        .filter(|d| is_weekend(*d))
        .collect()
}

pub fn week_split(series: &[DailyCount]) -> WeekSplit {
    let mean = |weekend: bool| {
        let days: Vec<u64> = series
            .iter()
            .filter(|d| is_weekend(d.date) == weekend)
            .map(|d| d.count)
            .collect();
        if days.is_empty() {
            None
        } else {
            Some(days.iter().sum::<u64>() as f64 / days.len() as f64)
        }
    };
    WeekSplit {
        weekday_mean: mean(false),
        weekend_mean: mean(true),
    }
}
