//! Grouped reductions and ranking.
//!
//! Groups appear in the order their key is first seen in the dataset. Ranking is a
//! stable descending sort, so that order also breaks ties.

use std::cmp::Ordering;
use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;

use serde::Serialize;
use tracing::debug;

use crate::dataset::{Column, Dataset};
use crate::error::QueryError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Reducer {
    Sum,
    Mean,
    Count,
}

impl fmt::Display for Reducer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Reducer::Sum => "sum",
            Reducer::Mean => "mean",
            Reducer::Count => "count",
        })
    }
}

impl FromStr for Reducer {
    type Err = QueryError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "sum" => Ok(Reducer::Sum),
            "mean" | "avg" => Ok(Reducer::Mean),
            "count" | "size" => Ok(Reducer::Count),
            _ => Err(QueryError::UnknownReducer(s.to_string())),
        }
    }
}

/// One group's reduced value. `metric` is `None` when the reduction is undefined,
/// i.e. the mean of a group with no non-missing values.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GroupMetric {
    pub group: String,
    pub metric: Option<f64>,
}

impl GroupMetric {
    pub fn require(&self) -> Result<f64, QueryError> {
        self.metric.ok_or_else(|| QueryError::UndefinedMetric {
            metric: Reducer::Mean.to_string(),
            group: self.group.clone(),
        })
    }
}

#[derive(Default)]
struct Accumulator {
    sum: f64,
    present: u64,
}

/// Reduces `value_column` per distinct value of `group_key`.
///
/// `Sum` and `Mean` need a numeric value column and skip missing cells. `Count`
/// accepts any column and counts its non-missing cells.
pub fn group_reduce(
    dataset: &Dataset,
    group_key: Column,
    value_column: Column,
    reducer: Reducer,
) -> Result<Vec<GroupMetric>, QueryError> {
    if reducer != Reducer::Count && !value_column.is_numeric() {
        return Err(QueryError::NotNumeric(value_column));
    }

    let mut index: HashMap<String, usize> = HashMap::new();
    let mut groups: Vec<(String, Accumulator)> = Vec::new();

    for t in dataset.transactions() {
        let key = t.key(group_key);
        let slot = match index.get(&key) {
            Some(&i) => i,
            None => {
                index.insert(key.clone(), groups.len());
                groups.push((key, Accumulator::default()));
                groups.len() - 1
            }
        };
        let acc = &mut groups[slot].1;
        match reducer {
            Reducer::Count => {
                if t.is_present(value_column) {
                    acc.present += 1;
                }
            }
            Reducer::Sum | Reducer::Mean => {
                if let Some(v) = t.numeric(value_column) {
                    acc.sum += v;
                    acc.present += 1;
                }
            }
        }
    }

    debug!(%group_key, %value_column, %reducer, groups = groups.len(), "grouped reduction");

    Ok(groups
        .into_iter()
        .map(|(group, acc)| {
            let metric = match reducer {
                Reducer::Sum => Some(acc.sum),
                Reducer::Count => Some(acc.present as f64),
                Reducer::Mean if acc.present == 0 => None,
                Reducer::Mean => Some(acc.sum / acc.present as f64),
            };
            GroupMetric { group, metric }
        })
        .collect())
}

/// Highest metric first; undefined metrics sink to the end. Stable on ties.
pub fn rank_descending(mut result: Vec<GroupMetric>) -> Vec<GroupMetric> {
    result.sort_by(|a, b| match (a.metric, b.metric) {
        (Some(x), Some(y)) => y.total_cmp(&x),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    });
    result
}

/// The first `n` ranked groups; shorter when fewer groups exist.
pub fn top_n(result: Vec<GroupMetric>, n: usize) -> Vec<GroupMetric> {
    let mut ranked = rank_descending(result);
    ranked.truncate(n);
    ranked
}
