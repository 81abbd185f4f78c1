// Import transactions from JSON or CSV exports into a user's collection
//
// JSON files hold the stored format directly. CSV files use the columns
// id,name,amount,type,category,date; an empty id gets a fresh UUID.

use crate::error::{DashboardError, DashboardResult};
use crate::models::{parse_amount, Category, DisplayZone, Transaction, TransactionType};
use chrono::{Offset, Utc};
use serde::Deserialize;
use std::fs;
use std::path::Path;
use tracing::info;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImportFormat {
    Json,
    Csv,
}

impl ImportFormat {
    pub fn detect(path: &Path) -> DashboardResult<Self> {
        let extension = path
            .extension()
            .and_then(|ext| ext.to_str())
            .map(|ext| ext.to_lowercase());

        match extension.as_deref() {
            Some("json") => Ok(ImportFormat::Json),
            Some("csv") => Ok(ImportFormat::Csv),
            _ => Err(DashboardError::Import(format!(
                "unsupported file type: {} (expected .json or .csv)",
                path.display()
            ))),
        }
    }
}

#[derive(Debug, Deserialize)]
struct CsvRow {
    #[serde(default)]
    id: String,
    name: String,
    amount: String,
    #[serde(rename = "type")]
    transaction_type: String,
    category: String,
    date: String,
}

pub fn load_import_file(path: &Path) -> DashboardResult<Vec<Transaction>> {
    let transactions = match ImportFormat::detect(path)? {
        ImportFormat::Json => parse_json(&fs::read_to_string(path)?)?,
        ImportFormat::Csv => parse_csv(fs::File::open(path)?)?,
    };

    validate_dates(&transactions)?;
    info!(path = %path.display(), count = transactions.len(), "read import file");
    Ok(transactions)
}

pub fn parse_json(text: &str) -> DashboardResult<Vec<Transaction>> {
    Ok(serde_json::from_str(text)?)
}

pub fn parse_csv<R: std::io::Read>(reader: R) -> DashboardResult<Vec<Transaction>> {
    let mut rdr = csv::ReaderBuilder::new().trim(csv::Trim::All).from_reader(reader);
    let mut transactions = Vec::new();

    for result in rdr.deserialize() {
        let row: CsvRow = result?;
        transactions.push(row_to_transaction(row)?);
    }

    Ok(transactions)
}

fn row_to_transaction(row: CsvRow) -> DashboardResult<Transaction> {
    let id = if row.id.is_empty() {
        uuid::Uuid::new_v4().to_string()
    } else {
        row.id
    };

    let amount = parse_amount(&row.amount).ok_or_else(|| DashboardError::InvalidAmount {
        id: id.clone(),
        value: row.amount.clone(),
    })?;

    let transaction_type: TransactionType = row
        .transaction_type
        .parse()
        .map_err(|e| DashboardError::Import(format!("transaction {}: {}", id, e)))?;

    Ok(Transaction {
        id,
        name: row.name,
        amount,
        transaction_type,
        category: Category::from_key(&row.category),
        date: row.date,
    })
}

/// Reject rows the dashboard could not place on a calendar
fn validate_dates(transactions: &[Transaction]) -> DashboardResult<()> {
    let utc = DisplayZone::Fixed(Utc.fix());
    for tx in transactions {
        tx.local_datetime(utc)?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal::Decimal;

    const CSV: &str = "\
id,name,amount,type,category,date
a1,Salário,5000.00,positive,salary,2024-06-05T12:00:00.000Z
,Mercado,  312.45 ,negative,purchases,2024-06-07
";

    #[test]
    fn test_detect_format() {
        assert_eq!(ImportFormat::detect(Path::new("x.JSON")).unwrap(), ImportFormat::Json);
        assert_eq!(ImportFormat::detect(Path::new("dir/x.csv")).unwrap(), ImportFormat::Csv);
        assert!(ImportFormat::detect(Path::new("x.txt")).is_err());
    }

    #[test]
    fn test_parse_csv_rows() {
        let transactions = parse_csv(CSV.as_bytes()).unwrap();

        assert_eq!(transactions.len(), 2);
        assert_eq!(transactions[0].id, "a1");
        assert_eq!(transactions[0].category, Category::from_key("salary"));
        assert_eq!(transactions[1].amount, Decimal::new(31245, 2));
        assert_eq!(transactions[1].transaction_type, TransactionType::Negative);

        // Blank id gets a generated UUID
        assert_eq!(transactions[1].id.len(), 36);
    }

    #[test]
    fn test_csv_bad_amount() {
        let csv = "id,name,amount,type,category,date\nx,Bad,12abc,negative,food,2024-01-01\n";

        match parse_csv(csv.as_bytes()) {
            Err(DashboardError::InvalidAmount { id, value }) => {
                assert_eq!(id, "x");
                assert_eq!(value, "12abc");
            }
            other => panic!("expected InvalidAmount, got {:?}", other),
        }
    }

    #[test]
    fn test_csv_bad_type() {
        let csv = "id,name,amount,type,category,date\nx,Bad,1,maybe,food,2024-01-01\n";
        assert!(matches!(parse_csv(csv.as_bytes()), Err(DashboardError::Import(_))));
    }

    #[test]
    fn test_validate_dates() {
        let mut transactions = parse_csv(CSV.as_bytes()).unwrap();
        assert!(validate_dates(&transactions).is_ok());

        transactions[0].date = "ontem".to_string();
        assert!(matches!(
            validate_dates(&transactions),
            Err(DashboardError::InvalidDate { .. })
        ));
    }

    #[test]
    fn test_parse_json_stored_format() {
        let json = r#"[{"id":"1","name":"Aluguel","amount":"1500","type":"negative",
            "category":{"name":"Casa","icon":"home"},"date":"2024-06-01T10:00:00Z"}]"#;

        let transactions = parse_json(json).unwrap();
        assert_eq!(transactions[0].category.icon, "home");
    }
}
