//! The in-memory transaction table.
//!
//! A `Dataset` is built once from raw records, resolves every timestamp up front and
//! caches the derived period and weekend flag on each row. After construction it is
//! read-only; every query module takes `&Dataset`.

use std::fmt;
use std::path::Path;
use std::str::FromStr;

use chrono::{DateTime, Datelike, NaiveDate, NaiveDateTime, Weekday};
use serde::Serialize;
use tracing::info;

use crate::csv_reader::{read_transactions, TransactionRecord};
use crate::error::{LoadError, QueryError};
use crate::temporal::Period;

/// Key used for a categorical cell that has no value.
pub const MISSING: &str = "<missing>";

const TIMESTAMP_FORMATS: [&str; 4] = [
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M:%S%.f",
];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum Column {
    TransactionId,
    BatchId,
    AccountId,
    SubscriptionId,
    CustomerId,
    CurrencyCode,
    CountryCode,
    ProviderId,
    ProductId,
    ProductCategory,
    ChannelId,
    Amount,
    Value,
    TransactionStartTime,
    PricingStrategy,
    FraudResult,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ColumnKind {
    Categorical,
    Numeric,
    Temporal,
}

impl Column {
    /// Every column in source file order.
    pub const ALL: [Column; 16] = [
        Column::TransactionId,
        Column::BatchId,
        Column::AccountId,
        Column::SubscriptionId,
        Column::CustomerId,
        Column::CurrencyCode,
        Column::CountryCode,
        Column::ProviderId,
        Column::ProductId,
        Column::ProductCategory,
        Column::ChannelId,
        Column::Amount,
        Column::Value,
        Column::TransactionStartTime,
        Column::PricingStrategy,
        Column::FraudResult,
    ];

    pub const NUMERIC: [Column; 4] = [
        Column::Amount,
        Column::Value,
        Column::PricingStrategy,
        Column::FraudResult,
    ];

    pub fn name(self) -> &'static str {
        match self {
            Column::TransactionId => "TransactionId",
            Column::BatchId => "BatchId",
            Column::AccountId => "AccountId",
            Column::SubscriptionId => "SubscriptionId",
            Column::CustomerId => "CustomerId",
            Column::CurrencyCode => "CurrencyCode",
            Column::CountryCode => "CountryCode",
            Column::ProviderId => "ProviderId",
            Column::ProductId => "ProductId",
            Column::ProductCategory => "ProductCategory",
            Column::ChannelId => "ChannelId",
            Column::Amount => "Amount",
            Column::Value => "Value",
            Column::TransactionStartTime => "TransactionStartTime",
            Column::PricingStrategy => "PricingStrategy",
            Column::FraudResult => "FraudResult",
        }
    }

    pub fn kind(self) -> ColumnKind {
        match self {
            Column::Amount | Column::Value | Column::PricingStrategy | Column::FraudResult => {
                ColumnKind::Numeric
            }
            Column::TransactionStartTime => ColumnKind::Temporal,
            _ => ColumnKind::Categorical,
        }
    }

    pub fn is_numeric(self) -> bool {
        self.kind() == ColumnKind::Numeric
    }
}

impl fmt::Display for Column {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Accepts the source header (`ProductCategory`) as well as snake/lower case
/// spellings (`product_category`, `productcategory`).
impl FromStr for Column {
    type Err = QueryError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted: String = s
            .chars()
            .filter(|c| *c != '_' && *c != '-')
            .map(|c| c.to_ascii_lowercase())
            .collect();
        Column::ALL
            .into_iter()
            .find(|c| c.name().to_ascii_lowercase() == wanted)
            .ok_or_else(|| QueryError::UnknownColumn(s.to_string()))
    }
}

/// A resolved transaction row with its derived time fields.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Transaction {
    pub transaction_id: String,
    pub batch_id: Option<String>,
    pub account_id: String,
    pub subscription_id: Option<String>,
    pub customer_id: Option<String>,
    pub currency_code: Option<String>,
    pub country_code: Option<String>,
    pub provider_id: Option<String>,
    pub product_id: Option<String>,
    pub product_category: Option<String>,
    pub channel_id: Option<String>,
    pub amount: Option<f64>,
    pub value: Option<f64>,
    pub pricing_strategy: Option<i64>,
    pub fraud_result: u8,
    pub start_time: NaiveDateTime,
    pub period: Period,
    pub is_weekend: bool,
}

impl Transaction {
    /// Builds a row from its raw record. `row` is the 1-based data row, used in errors.
    pub fn from_record(row: usize, record: TransactionRecord) -> Result<Self, LoadError> {
        let start_time = parse_timestamp(&record.transaction_start_time).ok_or_else(|| {
            LoadError::Timestamp {
                row,
                value: record.transaction_start_time.clone(),
            }
        })?;
        let fraud_result = match record.fraud_result {
            0 => 0,
            1 => 1,
            other => return Err(LoadError::InvalidFraudFlag { row, value: other }),
        };
        if record.transaction_id.is_empty() {
            return Err(LoadError::EmptyIdentifier { row, column: Column::TransactionId });
        }
        if record.account_id.is_empty() {
            return Err(LoadError::EmptyIdentifier { row, column: Column::AccountId });
        }

        Ok(Transaction {
            transaction_id: record.transaction_id,
            batch_id: non_empty(record.batch_id),
            account_id: record.account_id,
            subscription_id: non_empty(record.subscription_id),
            customer_id: non_empty(record.customer_id),
            currency_code: non_empty(record.currency_code),
            country_code: non_empty(record.country_code),
            provider_id: non_empty(record.provider_id),
            product_id: non_empty(record.product_id),
            product_category: non_empty(record.product_category),
            channel_id: non_empty(record.channel_id),
            amount: finite(record.amount),
            value: finite(record.value),
            pricing_strategy: record.pricing_strategy,
            fraud_result,
            period: Period::of(start_time.date()),
            is_weekend: is_weekend(start_time.date()),
            start_time,
        })
    }

    pub fn date(&self) -> NaiveDate {
        self.start_time.date()
    }

    /// Numeric cell, `None` when missing or when `column` is not numeric.
    pub fn numeric(&self, column: Column) -> Option<f64> {
        match column {
            Column::Amount => self.amount,
            Column::Value => self.value,
            Column::PricingStrategy => self.pricing_strategy.map(|p| p as f64),
            Column::FraudResult => Some(f64::from(self.fraud_result)),
            _ => None,
        }
    }

    fn text(&self, column: Column) -> Option<&str> {
        let cell = match column {
            Column::TransactionId => return Some(self.transaction_id.as_str()),
            Column::AccountId => return Some(self.account_id.as_str()),
            Column::BatchId => &self.batch_id,
            Column::SubscriptionId => &self.subscription_id,
            Column::CustomerId => &self.customer_id,
            Column::CurrencyCode => &self.currency_code,
            Column::CountryCode => &self.country_code,
            Column::ProviderId => &self.provider_id,
            Column::ProductId => &self.product_id,
            Column::ProductCategory => &self.product_category,
            Column::ChannelId => &self.channel_id,
            _ => return None,
        };
        cell.as_deref()
    }

    pub fn is_present(&self, column: Column) -> bool {
        match column.kind() {
            ColumnKind::Numeric => self.numeric(column).is_some(),
            ColumnKind::Temporal => true,
            ColumnKind::Categorical => self.text(column).is_some(),
        }
    }

    /// Opaque grouping token for `column`. Missing cells map to [`MISSING`].
    pub fn key(&self, column: Column) -> String {
        match column.kind() {
            ColumnKind::Categorical => self.text(column).unwrap_or(MISSING).to_string(),
            ColumnKind::Temporal => self.start_time.format("%Y-%m-%d %H:%M:%S").to_string(),
            ColumnKind::Numeric => match column {
                Column::PricingStrategy => self
                    .pricing_strategy
                    .map(|p| p.to_string())
                    .unwrap_or_else(|| MISSING.to_string()),
                _ => self
                    .numeric(column)
                    .map(|v| (if v == 0.0 { 0.0 } else { v }).to_string()) // -0 keys as 0
                    .unwrap_or_else(|| MISSING.to_string()),
            },
        }
    }
}

/// Immutable table of transactions.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Dataset {
    transactions: Vec<Transaction>,
}

impl Dataset {
    /// Resolves every record; the first bad row fails the whole load.
    pub fn from_records(records: Vec<TransactionRecord>) -> Result<Self, LoadError> {
        let transactions = records
            .into_iter()
            .enumerate()
            .map(|(i, record)| Transaction::from_record(i + 1, record))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Dataset { transactions })
    }

    pub fn from_transactions(transactions: Vec<Transaction>) -> Self {
        Dataset { transactions }
    }

    pub fn load(path: &Path) -> Result<Self, LoadError> {
        let records = read_transactions(path)?;
        let dataset = Self::from_records(records)?;
        info!(source = %path.display(), rows = dataset.len(), "loaded transaction dataset");
        Ok(dataset)
    }

    pub fn transactions(&self) -> &[Transaction] {
        &self.transactions
    }

    pub fn len(&self) -> usize {
        self.transactions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.transactions.is_empty()
    }

    /// All cells of a numeric column, in row order.
    pub fn numeric_column(&self, column: Column) -> Result<Vec<Option<f64>>, QueryError> {
        if !column.is_numeric() {
            return Err(QueryError::NotNumeric(column));
        }
        Ok(self.transactions.iter().map(|t| t.numeric(column)).collect())
    }
}

pub fn parse_timestamp(raw: &str) -> Option<NaiveDateTime> {
    let raw = raw.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt.naive_local());
    }
    if let Some(dt) = TIMESTAMP_FORMATS
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(raw, fmt).ok())
    {
        return Some(dt);
    }
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
}

pub fn is_weekend(date: NaiveDate) -> bool {
    matches!(date.weekday(), Weekday::Sat | Weekday::Sun)
}

// NaN and infinities read from the file count as missing cells
fn finite(cell: Option<f64>) -> Option<f64> {
    cell.filter(|v| v.is_finite())
}

fn non_empty(cell: Option<String>) -> Option<String> {
    cell.filter(|s| !s.is_empty())
}
