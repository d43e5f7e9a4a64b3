use chrono::NaiveDate;
use serde::Serialize;
use tracing::info;

use crate::dataset::{Column, Dataset, Transaction};
use crate::error::QueryError;
use crate::fraud::{fraud_by_group, top_fraud_comparison, FraudComparison};
use crate::frequency::{frequency, CategoryCount};
use crate::grouping::{group_reduce, rank_descending, top_n, GroupMetric, Reducer};
use crate::stats::{correlation_matrix, preview, schema, summarize, ColumnInfo, CorrelationMatrix, Summary};
use crate::temporal::{daily_counts, periods_available, week_split, weekend_days, DailyCount, Period, WeekSplit};

#[derive(Debug, Clone)]
pub struct ReportOptions {
    /// Month for the daily series. `None` picks the earliest available month.
    pub period: Option<Period>,
    pub top_n: usize,
    pub preview_rows: usize,
}

impl Default for ReportOptions {
    fn default() -> Self {
        Self {
            period: None,
            top_n: 10,
            preview_rows: 5,
        }
    }
}

/// Every view of the transaction dashboard, computed from one dataset.
#[derive(Debug, Clone, Serialize)]
pub struct AnalyticsReport {
    pub preview: Vec<Transaction>,
    pub schema: Vec<ColumnInfo>,
    pub summary: Summary,
    pub correlation: CorrelationMatrix,

    pub periods: Vec<Period>,
    pub selected_period: Option<Period>,
    pub daily_counts: Vec<DailyCount>,
    pub weekend_days: Vec<NaiveDate>,
    pub week_split: WeekSplit,

    pub product_category_frequency: Vec<CategoryCount>,
    pub channel_frequency: Vec<CategoryCount>,

    pub mean_amount_by_category: Vec<GroupMetric>,
    pub value_by_pricing_strategy: Vec<GroupMetric>,
    pub fraud_by_pricing_strategy: Vec<GroupMetric>,
    pub top_accounts_by_value: Vec<GroupMetric>,
    pub top_fraud_accounts: Vec<GroupMetric>,
    pub fraud_vs_total: Vec<FraudComparison>,
}

pub fn build(dataset: &Dataset, options: &ReportOptions) -> Result<AnalyticsReport, QueryError> {
    let periods = periods_available(dataset);
    let selected_period = options.period.or_else(|| periods.first().copied());
    let daily = daily_counts(dataset, selected_period);
    let weekends = weekend_days(&daily).into_iter().collect();
    let split = week_split(&daily);

    let report = AnalyticsReport {
        preview: preview(dataset, options.preview_rows).to_vec(),
        schema: schema(dataset),
        summary: summarize(dataset),
        correlation: correlation_matrix(dataset, &Column::NUMERIC)?,
        periods,
        selected_period,
        daily_counts: daily,
        weekend_days: weekends,
        week_split: split,
        product_category_frequency: frequency(dataset, Column::ProductCategory),
        channel_frequency: frequency(dataset, Column::ChannelId),
        mean_amount_by_category: rank_descending(group_reduce(
            dataset,
            Column::ProductCategory,
            Column::Amount,
            Reducer::Mean,
        )?),
        value_by_pricing_strategy: rank_descending(group_reduce(
            dataset,
            Column::PricingStrategy,
            Column::Value,
            Reducer::Sum,
        )?),
        fraud_by_pricing_strategy: rank_descending(fraud_by_group(dataset, Column::PricingStrategy)?),
        top_accounts_by_value: top_n(
            group_reduce(dataset, Column::AccountId, Column::Value, Reducer::Sum)?,
            options.top_n,
        ),
        top_fraud_accounts: top_n(fraud_by_group(dataset, Column::AccountId)?, options.top_n),
        fraud_vs_total: top_fraud_comparison(dataset, Column::AccountId, options.top_n)?,
    };

    info!(
        rows = dataset.len(),
        period = ?report.selected_period.map(|p| p.to_string()),
        "built analytics report"
    );
    Ok(report)
}
