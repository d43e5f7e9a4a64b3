use std::collections::HashMap;

use serde::Serialize;
use tracing::{debug, warn};

use crate::dataset::{Column, Dataset};
use crate::error::QueryError;
use crate::grouping::{group_reduce, top_n, GroupMetric, Reducer};

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FraudComparison {
    pub group_id: String,
    pub total_transactions: u64,
    pub fraudulent_transactions: u64,
}

impl FraudComparison {
    /// Share of fraudulent transactions, undefined without any counted total.
    pub fn fraud_rate(&self) -> Option<f64> {
        if self.total_transactions == 0 {
            None
        } else {
            Some(self.fraudulent_transactions as f64 / self.total_transactions as f64)
        }
    }
}

/// Number of fraudulent transactions per group.
pub fn fraud_by_group(dataset: &Dataset, group_key: Column) -> Result<Vec<GroupMetric>, QueryError> {
    group_reduce(dataset, group_key, Column::FraudResult, Reducer::Sum)
}

/// Number of transactions per group. Counts the transaction id, which is never missing.
pub fn total_by_group(dataset: &Dataset, group_key: Column) -> Result<Vec<GroupMetric>, QueryError> {
    group_reduce(dataset, group_key, Column::TransactionId, Reducer::Count)
}

/// Side-by-side totals and fraud counts for `group_ids`, in the order given.
///
/// Ids missing from `totals` report a total of 0; ids missing from `fraud` report 0
/// fraudulent transactions. No id is dropped.
pub fn compare(
    fraud: &[GroupMetric],
    totals: &[GroupMetric],
    group_ids: &[String],
) -> Vec<FraudComparison> {
    let fraud_lookup = as_counts(fraud);
    let total_lookup = as_counts(totals);

    group_ids
        .iter()
        .map(|id| {
            let total_transactions = total_lookup.get(id.as_str()).copied().unwrap_or_else(|| {
                warn!(group = %id, "group missing from totals, reporting 0");
                0
            });
            FraudComparison {
                group_id: id.clone(),
                total_transactions,
                fraudulent_transactions: fraud_lookup.get(id.as_str()).copied().unwrap_or(0),
            }
        })
        .collect()
}

/// Compares the `n` groups with the most fraud, highest first.
pub fn top_fraud_comparison(
    dataset: &Dataset,
    group_key: Column,
    n: usize,
) -> Result<Vec<FraudComparison>, QueryError> {
    let fraud = fraud_by_group(dataset, group_key)?;
    let totals = total_by_group(dataset, group_key)?;
    let ids: Vec<String> = top_n(fraud.clone(), n).into_iter().map(|g| g.group).collect();
    debug!(%group_key, n, selected = ids.len(), "comparing top fraud groups");
    Ok(compare(&fraud, &totals, &ids))
}

fn as_counts(metrics: &[GroupMetric]) -> HashMap<&str, u64> {
    metrics
        .iter()
        .map(|m| (m.group.as_str(), m.metric.unwrap_or(0.0).max(0.0) as u64))
        .collect()
}
