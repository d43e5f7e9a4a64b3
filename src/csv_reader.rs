use std::fs::File;
use std::io::Read;
use std::path::Path;

use serde::Deserialize;

use crate::error::LoadError;

const REQUIRED_HEADERS: [&str; 9] = [
    "TransactionId",
    "AccountId",
    "ProductCategory",
    "ChannelId",
    "Amount",
    "Value",
    "TransactionStartTime",
    "PricingStrategy",
    "FraudResult",
];

/// One raw row of the transactions file, before timestamps are resolved.
///
/// Column names follow the source export. The identifier columns beyond the
/// account/channel/category triple are optional so trimmed exports still load.
#[derive(Debug, Deserialize, Clone)]
pub struct TransactionRecord {
    #[serde(rename = "TransactionId")]
    pub transaction_id: String,
    #[serde(rename = "BatchId", default)]
    pub batch_id: Option<String>,
    #[serde(rename = "AccountId")]
    pub account_id: String,
    #[serde(rename = "SubscriptionId", default)]
    pub subscription_id: Option<String>,
    #[serde(rename = "CustomerId", default)]
    pub customer_id: Option<String>,
    #[serde(rename = "CurrencyCode", default)]
    pub currency_code: Option<String>,
    #[serde(rename = "CountryCode", default)]
    pub country_code: Option<String>,
    #[serde(rename = "ProviderId", default)]
    pub provider_id: Option<String>,
    #[serde(rename = "ProductId", default)]
    pub product_id: Option<String>,
    #[serde(rename = "ProductCategory")]
    pub product_category: Option<String>,
    #[serde(rename = "ChannelId")]
    pub channel_id: Option<String>,
    #[serde(rename = "Amount")]
    pub amount: Option<f64>,
    #[serde(rename = "Value")]
    pub value: Option<f64>,
    #[serde(rename = "TransactionStartTime")]
    pub transaction_start_time: String,
    #[serde(rename = "PricingStrategy")]
    pub pricing_strategy: Option<i64>,
    #[serde(rename = "FraudResult")]
    pub fraud_result: i64,
}

// Reads every record from a CSV stream with a header row
// Inputs: any reader over CSV text
// Outputs: all records, or the first header/deserialization error
pub fn read_records<R: Read>(reader: R) -> Result<Vec<TransactionRecord>, LoadError> {
    let mut rdr = csv::ReaderBuilder::new().trim(csv::Trim::All).from_reader(reader);

    let headers = rdr.headers()?;
    if let Some(missing) = REQUIRED_HEADERS
        .iter()
        .find(|h| !headers.iter().any(|found| found == **h))
    {
        return Err(LoadError::MissingColumn(missing.to_string()));
    }

    let records: Vec<TransactionRecord> = rdr
        .deserialize()
        .collect::<Result<Vec<TransactionRecord>, csv::Error>>()?;

    Ok(records)
}

pub fn read_transactions(file_path: &Path) -> Result<Vec<TransactionRecord>, LoadError> {
    let file = File::open(file_path)?;
    read_records(file)
}
