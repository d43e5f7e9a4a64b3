//! # Fraud Analytics
//!
//! Descriptive analytics over a static ledger of transactions: summary statistics,
//! correlation, daily activity, categorical frequencies and grouped rankings used to
//! surface fraud signals.
//!
//! Every query is a pure function over an immutable [`Dataset`]; load it once (or
//! through [`DatasetCache`]) and pass the handle to the query functions.

pub mod cache;
pub mod csv_reader;
pub mod dataset;
pub mod error;
pub mod fraud;
pub mod frequency;
pub mod grouping;
pub mod logging;
pub mod report;
pub mod settings;
pub mod stats;
pub mod temporal;


pub use cache::DatasetCache;
pub use dataset::{Column, Dataset, Transaction, MISSING};
pub use error::{LoadError, QueryError};
pub use fraud::{compare, fraud_by_group, total_by_group, FraudComparison};
pub use frequency::{frequency, CategoryCount};
pub use grouping::{group_reduce, rank_descending, top_n, GroupMetric, Reducer};
pub use report::{AnalyticsReport, ReportOptions};
pub use stats::{correlation_matrix, summarize, CorrelationMatrix, Summary};
pub use temporal::{daily_counts, periods_available, weekend_days, DailyCount, Period};
