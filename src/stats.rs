//! Descriptive statistics: per-column summary, null audit, schema and the Pearson
//! correlation matrix over numeric columns.

use ndarray::Array2;
use serde::Serialize;
use tracing::debug;

use crate::dataset::{Column, ColumnKind, Dataset, Transaction};
use crate::error::QueryError;

/// Summary of one numeric column over its non-missing cells.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ColumnStats {
    pub column: Column,
    pub count: usize,
    pub mean: Option<f64>,
    pub std: Option<f64>, // sample std, needs at least two values
    pub min: Option<f64>,
    pub q1: Option<f64>,
    pub median: Option<f64>,
    pub q3: Option<f64>,
    pub max: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Summary {
    pub count: usize,
    pub null_counts: Vec<(Column, usize)>,
    pub numeric: Vec<ColumnStats>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ColumnInfo {
    pub column: Column,
    pub kind: ColumnKind,
    pub non_null: usize,
}

/// Symmetric matrix of Pearson coefficients. Undefined cells are stored as NaN and
/// surface as `None` through [`CorrelationMatrix::get`].
#[derive(Debug, Clone, Serialize)]
pub struct CorrelationMatrix {
    pub columns: Vec<Column>,
    pub values: Array2<f64>,
}

impl CorrelationMatrix {
    pub fn get(&self, a: Column, b: Column) -> Option<f64> {
        let i = self.columns.iter().position(|c| *c == a)?;
        let j = self.columns.iter().position(|c| *c == b)?;
        let r = self.values[[i, j]];
        if r.is_nan() {
            None
        } else {
            Some(r)
        }
    }
}

pub fn summarize(dataset: &Dataset) -> Summary {
    let numeric = Column::NUMERIC
        .into_iter()
        .map(|column| {
            let values: Vec<f64> = dataset
                .transactions()
                .iter()
                .filter_map(|t| t.numeric(column))
                .collect();
            describe(column, values)
        })
        .collect();

    Summary {
        count: dataset.len(),
        null_counts: null_counts(dataset),
        numeric,
    }
}

/// Missing cells per column, in column order.
pub fn null_counts(dataset: &Dataset) -> Vec<(Column, usize)> {
    Column::ALL
        .into_iter()
        .map(|c| (c, dataset.len() - non_null(dataset.transactions(), c)))
        .collect()
}

pub fn schema(dataset: &Dataset) -> Vec<ColumnInfo> {
    Column::ALL
        .into_iter()
        .map(|column| ColumnInfo {
            column,
            kind: column.kind(),
            non_null: non_null(dataset.transactions(), column),
        })
        .collect()
}

/// First `n` rows, or all of them when the dataset is shorter.
pub fn preview(dataset: &Dataset, n: usize) -> &[Transaction] {
    let rows = dataset.transactions();
    &rows[..n.min(rows.len())]
}

pub fn correlation_matrix(
    dataset: &Dataset,
    columns: &[Column],
) -> Result<CorrelationMatrix, QueryError> {
    let cells = columns
        .iter()
        .map(|c| dataset.numeric_column(*c))
        .collect::<Result<Vec<_>, _>>()?;

    let n = columns.len();
    let mut values = Array2::from_elem((n, n), f64::NAN);
    for i in 0..n {
        for j in i..n {
            let r = if i == j {
                let present: Vec<f64> = cells[i].iter().flatten().copied().collect();
                if variance(&present).is_some_and(|v| v > 0.0) {
                    1.0
                } else {
                    f64::NAN
                }
            } else {
                pearson(&cells[i], &cells[j]).unwrap_or(f64::NAN)
            };
            values[[i, j]] = r;
            values[[j, i]] = r;
        }
    }
    debug!(columns = n, rows = dataset.len(), "computed correlation matrix");

    Ok(CorrelationMatrix {
        columns: columns.to_vec(),
        values,
    })
}

/// Pearson coefficient over the rows where both cells are present.
pub fn pearson(xs: &[Option<f64>], ys: &[Option<f64>]) -> Option<f64> {
    let pairs: Vec<(f64, f64)> = xs
        .iter()
        .zip(ys)
        .filter_map(|(x, y)| Some(((*x)?, (*y)?)))
        .collect();
    if pairs.len() < 2 {
        return None;
    }

    let n = pairs.len() as f64;
    let mean_x = pairs.iter().map(|p| p.0).sum::<f64>() / n;
    let mean_y = pairs.iter().map(|p| p.1).sum::<f64>() / n;
    let (mut cov, mut var_x, mut var_y) = (0.0, 0.0, 0.0);
    for (x, y) in &pairs {
        let dx = x - mean_x;
        let dy = y - mean_y;
        cov += dx * dy;
        var_x += dx * dx;
        var_y += dy * dy;
    }
    if var_x == 0.0 || var_y == 0.0 {
        return None;
    }
    Some((cov / (var_x.sqrt() * var_y.sqrt())).clamp(-1.0, 1.0))
}

fn describe(column: Column, mut values: Vec<f64>) -> ColumnStats {
    values.sort_by(|a, b| a.total_cmp(b));
    ColumnStats {
        column,
        count: values.len(),
        mean: mean(&values),
        std: variance(&values).map(f64::sqrt),
        min: values.first().copied(),
        q1: quantile(&values, 0.25),
        median: quantile(&values, 0.5),
        q3: quantile(&values, 0.75),
        max: values.last().copied(),
    }
}

fn mean(values: &[f64]) -> Option<f64> {
    if values.is_empty() {
        return None;
    }
    Some(values.iter().sum::<f64>() / values.len() as f64)
}

// Sample variance (n - 1 denominator)
fn variance(values: &[f64]) -> Option<f64> {
    if values.len() < 2 {
        return None;
    }
    let m = mean(values)?;
    let ss: f64 = values.iter().map(|v| (v - m).powi(2)).sum();
    Some(ss / (values.len() - 1) as f64)
}

// Linear interpolation at position (n - 1) * q of sorted input
fn quantile(sorted: &[f64], q: f64) -> Option<f64> {
    if sorted.is_empty() {
        return None;
    }
    let pos = (sorted.len() - 1) as f64 * q;
    let lower = pos.floor() as usize;
    let upper = pos.ceil() as usize;
    let frac = pos - lower as f64;
    Some(sorted[lower] + (sorted[upper] - sorted[lower]) * frac)
}

fn non_null(rows: &[Transaction], column: Column) -> usize {
    rows.iter().filter(|t| t.is_present(column)).count()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn quantiles_interpolate_between_ranks() {
        let sorted = [1.0, 2.0, 3.0, 4.0];
        assert_eq!(quantile(&sorted, 0.25), Some(1.75));
        assert_eq!(quantile(&sorted, 0.5), Some(2.5));
        assert_eq!(quantile(&sorted, 0.75), Some(3.25));
        assert_eq!(quantile(&[], 0.5), None);
    }

    #[test]
    fn variance_needs_two_values() {
        assert_eq!(variance(&[3.0]), None);
        assert_eq!(variance(&[1.0, 3.0]), Some(2.0));
    }

    #[test]
    fn pearson_skips_incomplete_pairs() {
        let xs = [Some(1.0), Some(2.0), None, Some(3.0)];
        let ys = [Some(2.0), Some(4.0), Some(100.0), Some(6.0)];
        let r = pearson(&xs, &ys).unwrap();
        assert!((r - 1.0).abs() < 1e-12);
    }

    #[test]
    fn pearson_is_undefined_for_constant_input() {
        let xs = [Some(1.0), Some(1.0), Some(1.0)];
        let ys = [Some(2.0), Some(4.0), Some(6.0)];
        assert_eq!(pearson(&xs, &ys), None);
    }
}
