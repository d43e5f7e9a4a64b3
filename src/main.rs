// Entry point for the transaction analytics report. Loads the dataset, builds every view and prints it.
use std::error::Error;
use std::path::PathBuf;

use clap::Parser;
use tracing::info;

use fraud_analytics::report::{self, AnalyticsReport, ReportOptions};
use fraud_analytics::settings::AnalyticsConfig;
use fraud_analytics::{logging, DatasetCache, GroupMetric, Period, MISSING};

const PREVIEW_ROWS: usize = 5;

/// Descriptive fraud analytics over a transactions CSV.
#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Configuration file (TOML). Defaults to ./analytics.toml when present.
    #[arg(long)]
    config: Option<PathBuf>,

    /// Transactions CSV to analyse.
    #[arg(long)]
    data: Option<PathBuf>,

    /// Month for the daily series (format: YYYY-MM).
    #[arg(long)]
    period: Option<Period>,

    /// How many accounts to show in the rankings.
    #[arg(long)]
    top_n: Option<usize>,

    /// Print the report as JSON instead of text.
    #[arg(long)]
    json: bool,
}

fn print_ranking(title: &str, rows: &[GroupMetric]) {
    println!("\n{}", title);
    for (i, row) in rows.iter().enumerate() {
        match row.metric {
            Some(m) => println!("{:>3}. {:<24} {:>16.2}", i + 1, row.group, m),
            None => println!("{:>3}. {:<24} {:>16}", i + 1, row.group, "undefined"),
        }
    }
}

// Builds the preview and schema sections
// Inputs: the assembled report
// Outputs: one line per printed row
fn overview_lines(report: &AnalyticsReport) -> Vec<String> {
    let cell = |v: &Option<String>| v.clone().unwrap_or_else(|| MISSING.to_string());
    let number = |v: Option<f64>| v.map(|x| x.to_string()).unwrap_or_else(|| MISSING.to_string());

    let mut lines = vec!["First rows:".to_string()];
    for t in &report.preview {
        lines.push(format!(
            "  {} {} {} {} amount={} value={} {} fraud={}",
            t.transaction_id,
            t.account_id,
            cell(&t.product_category),
            cell(&t.channel_id),
            number(t.amount),
            number(t.value),
            t.start_time,
            t.fraud_result
        ));
    }

    lines.push(String::new());
    lines.push("Columns:".to_string());
    for info in &report.schema {
        lines.push(format!(
            "  {:<22} {:<12} {} non-null",
            info.column.name(),
            format!("{:?}", info.kind),
            info.non_null
        ));
    }
    lines
}

// Prints the report as plain text
// Inputs: the assembled report
// Outputs: Prints formatted sections to console
fn print_report(report: &AnalyticsReport) {
    println!("Transactions: {}\n", report.summary.count);
    for line in overview_lines(report) {
        println!("{}", line);
    }

    println!("\nMissing values:");
    for (column, nulls) in &report.summary.null_counts {
        println!("  {:<22} {}", column.name(), nulls);
    }

    println!("\nNumeric columns:");
    println!("  {:<16} {:>12} {:>12} {:>12} {:>12} {:>12}", "column", "mean", "std", "min", "median", "max");
    let fmt = |v: Option<f64>| v.map(|x| format!("{:.2}", x)).unwrap_or_else(|| "-".into());
    for stats in &report.summary.numeric {
        println!(
            "  {:<16} {:>12} {:>12} {:>12} {:>12} {:>12}",
            stats.column.name(),
            fmt(stats.mean),
            fmt(stats.std),
            fmt(stats.min),
            fmt(stats.median),
            fmt(stats.max)
        );
    }

    println!("\nCorrelation:");
    let columns = &report.correlation.columns;
    for a in columns {
        let row: Vec<String> = columns
            .iter()
            .map(|b| format!("{:>8}", fmt(report.correlation.get(*a, *b))))
            .collect();
        println!("  {:<16}{}", a.name(), row.join(""));
    }

    if let Some(period) = report.selected_period {
        println!("\nDaily transactions for {} (* = weekend):", period);
        for day in &report.daily_counts {
            let mark = if report.weekend_days.contains(&day.date) { "*" } else { " " };
            println!("  {} {} {}", day.date, mark, day.count);
        }
        println!(
            "  weekday mean {} / weekend mean {}",
            fmt(report.week_split.weekday_mean),
            fmt(report.week_split.weekend_mean)
        );
    }

    println!("\nProduct categories:");
    for c in &report.product_category_frequency {
        println!("  {:<24} {}", c.category, c.count);
    }
    println!("\nChannels:");
    for c in &report.channel_frequency {
        println!("  {:<24} {}", c.category, c.count);
    }

    print_ranking("Mean amount by product category:", &report.mean_amount_by_category);
    print_ranking("Total value by pricing strategy:", &report.value_by_pricing_strategy);
    print_ranking("Fraud count by pricing strategy:", &report.fraud_by_pricing_strategy);
    print_ranking("Top accounts by total value:", &report.top_accounts_by_value);
    print_ranking("Top accounts by fraud count:", &report.top_fraud_accounts);

    println!("\nTotal vs fraudulent transactions:");
    for row in &report.fraud_vs_total {
        println!(
            "  {:<24} {:>8} total {:>8} fraud ({})",
            row.group_id,
            row.total_transactions,
            row.fraudulent_transactions,
            row.fraud_rate().map(|r| format!("{:.1}%", r * 100.0)).unwrap_or_else(|| "-".into())
        );
    }
}

// Main entry point
// Key steps:
// 1. Resolve configuration and command-line overrides
// 2. Load the dataset through the cache
// 3. Build and print the report
fn main() -> Result<(), Box<dyn Error>> {
    let cli = Cli::parse();
    let mut config = AnalyticsConfig::load(cli.config.as_deref())?;
    config.apply_overrides(cli.data, cli.period, cli.top_n)?;
    let period = config.selected_period()?;

    logging::init(&config.log.level, config.log.json);
    info!(source = %config.data_path.display(), "starting analytics run");

    let cache = DatasetCache::new();
    let dataset = cache.get_or_load(&config.data_path)?;
    if dataset.is_empty() {
        println!("No transactions in {}", config.data_path.display());
        return Ok(());
    }

    let options = ReportOptions {
        period,
        top_n: config.top_n,
        preview_rows: PREVIEW_ROWS,
    };
    let report = report::build(&dataset, &options)?;

    if cli.json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        print_report(&report);
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use fraud_analytics::csv_reader::TransactionRecord;
    use fraud_analytics::Dataset;

    fn create_test_report() -> AnalyticsReport {
        let record = TransactionRecord {
            transaction_id: "TransactionId_1".to_string(),
            batch_id: None,
            account_id: "AccountId_7".to_string(),
            subscription_id: None,
            customer_id: None,
            currency_code: None,
            country_code: None,
            provider_id: None,
            product_id: None,
            product_category: Some("airtime".to_string()),
            channel_id: None,
            amount: Some(250.0),
            value: Some(250.0),
            transaction_start_time: "2018-11-15T02:18:49Z".to_string(),
            pricing_strategy: Some(2),
            fraud_result: 0,
        };
        let dataset = Dataset::from_records(vec![record]).unwrap();
        report::build(&dataset, &ReportOptions::default()).unwrap()
    }

    #[test]
    fn test_overview_includes_preview_and_schema() {
        let report = create_test_report();
        let lines = overview_lines(&report);

        let row = lines.iter().find(|l| l.contains("TransactionId_1")).expect("Preview row should be printed");
        assert!(row.contains("AccountId_7"), "Preview should show the account");
        assert!(row.contains(MISSING), "Missing channel should show the placeholder");

        let channel = lines
            .iter()
            .find(|l| l.trim_start().starts_with("ChannelId"))
            .expect("Schema should list every column");
        assert!(channel.contains("0 non-null"));
        let schema_rows = lines.iter().filter(|l| l.contains("non-null")).count();
        assert_eq!(schema_rows, report.schema.len());
    }
}
