use crate::error::{DashboardError, DashboardResult};
use chrono::{DateTime, Duration, FixedOffset, NaiveDate, NaiveDateTime, Offset, TimeZone};
use chrono_tz::Tz;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// Direction of a transaction: money coming in or going out
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TransactionType {
    Positive,
    Negative,
}

impl TransactionType {
    pub fn as_str(&self) -> &'static str {
        match self {
            TransactionType::Positive => "positive",
            TransactionType::Negative => "negative",
        }
    }
}

impl FromStr for TransactionType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "positive" | "up" | "income" => Ok(TransactionType::Positive),
            "negative" | "down" | "outcome" => Ok(TransactionType::Negative),
            other => Err(format!("unknown transaction type '{}'", other)),
        }
    }
}

// ============================================================================
// CATEGORY
// ============================================================================

/// Display category attached to a transaction
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "StoredCategory")]
pub struct Category {
    pub name: String,
    pub icon: String,
}

/// Categories known to the register screen, keyed the way it stores them
const KNOWN_CATEGORIES: &[(&str, &str, &str)] = &[
    ("purchases", "Compras", "shopping-bag"),
    ("food", "Alimentação", "coffee"),
    ("salary", "Salário", "dollar-sign"),
    ("car", "Carro", "crosshair"),
    ("leisure", "Lazer", "heart"),
    ("studies", "Estudos", "book"),
];

const FALLBACK_ICON: &str = "tag";

impl Category {
    pub fn new(name: impl Into<String>, icon: impl Into<String>) -> Self {
        Category {
            name: name.into(),
            icon: icon.into(),
        }
    }

    /// Resolve a bare category key ("food") into its display form
    pub fn from_key(key: &str) -> Self {
        KNOWN_CATEGORIES
            .iter()
            .find(|(k, _, _)| *k == key)
            .map(|(_, name, icon)| Category::new(*name, *icon))
            .unwrap_or_else(|| Category::new(key, FALLBACK_ICON))
    }
}

/// Stored records carry either the full category object or only its key
#[derive(Deserialize)]
#[serde(untagged)]
enum StoredCategory {
    Key(String),
    Full { name: String, icon: String },
}

impl From<StoredCategory> for Category {
    fn from(stored: StoredCategory) -> Self {
        match stored {
            StoredCategory::Key(key) => Category::from_key(&key),
            StoredCategory::Full { name, icon } => Category { name, icon },
        }
    }
}

// ============================================================================
// TRANSACTION
// ============================================================================

/// A single recorded income or expense, exactly as persisted
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Transaction {
    pub id: String,

    pub name: String,

    /// Exact decimal; stored as a string, older records hold a JSON number
    #[serde(with = "amount_format")]
    pub amount: Decimal,

    #[serde(rename = "type")]
    pub transaction_type: TransactionType,

    pub category: Category,

    /// ISO-8601 text as written by the register screen
    pub date: String,
}

impl Transaction {
    pub fn is_entry(&self) -> bool {
        self.transaction_type == TransactionType::Positive
    }

    /// Instant of the transaction seen from the display zone
    ///
    /// RFC 3339 timestamps are converted, naive date-times and bare dates are
    /// read as wall-clock values in `zone`.
    pub fn local_datetime(&self, zone: DisplayZone) -> DashboardResult<DateTime<FixedOffset>> {
        parse_date(&self.date, zone).ok_or_else(|| DashboardError::InvalidDate {
            id: self.id.clone(),
            value: self.date.clone(),
        })
    }
}

// ============================================================================
// DISPLAY ZONE
// ============================================================================

/// Zone whose wall clock decides which calendar day a transaction falls on
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DisplayZone {
    Fixed(FixedOffset),
    /// IANA zone with its historical daylight saving rules
    Named(Tz),
}

impl DisplayZone {
    fn from_utc(&self, utc: &NaiveDateTime) -> DateTime<FixedOffset> {
        match self {
            DisplayZone::Fixed(offset) => offset.from_utc_datetime(utc),
            DisplayZone::Named(tz) => {
                let dt = tz.from_utc_datetime(utc);
                dt.with_timezone(&dt.offset().fix())
            }
        }
    }

    /// Wall-clock time in this zone. A time skipped by a DST jump resolves
    /// to the same time one hour later.
    fn from_local(&self, local: &NaiveDateTime) -> Option<DateTime<FixedOffset>> {
        self.resolve_local(local).or_else(|| {
            let shifted = local.checked_add_signed(Duration::hours(1))?;
            self.resolve_local(&shifted)
        })
    }

    fn resolve_local(&self, local: &NaiveDateTime) -> Option<DateTime<FixedOffset>> {
        match self {
            DisplayZone::Fixed(offset) => offset.from_local_datetime(local).single(),
            DisplayZone::Named(tz) => tz
                .from_local_datetime(local)
                .earliest()
                .map(|dt| dt.with_timezone(&dt.offset().fix())),
        }
    }
}

fn parse_date(value: &str, zone: DisplayZone) -> Option<DateTime<FixedOffset>> {
    let value = value.trim();

    if let Ok(dt) = DateTime::parse_from_rfc3339(value) {
        return Some(zone.from_utc(&dt.naive_utc()));
    }

    if let Ok(naive) = NaiveDateTime::parse_from_str(value, "%Y-%m-%dT%H:%M:%S%.f") {
        return zone.from_local(&naive);
    }

    let date = NaiveDate::parse_from_str(value, "%Y-%m-%d").ok()?;
    zone.from_local(&date.and_hms_opt(0, 0, 0)?)
}

/// Parse a plain decimal string ("1200.50") or scientific notation ("1.2e3")
pub fn parse_amount(value: &str) -> Option<Decimal> {
    let value = value.trim();
    Decimal::from_str(value)
        .or_else(|_| Decimal::from_scientific(value))
        .ok()
}

mod amount_format {
    use super::parse_amount;
    use rust_decimal::Decimal;
    use serde::de::Error;
    use serde::{Deserialize, Deserializer, Serializer};

    #[derive(Deserialize)]
    #[serde(untagged)]
    enum StoredAmount {
        Text(String),
        Number(serde_json::Number),
    }

    pub fn serialize<S: Serializer>(amount: &Decimal, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&amount.to_string())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Decimal, D::Error> {
        let raw = match StoredAmount::deserialize(deserializer)? {
            StoredAmount::Text(text) => text,
            StoredAmount::Number(number) => number.to_string(),
        };

        parse_amount(&raw).ok_or_else(|| D::Error::custom(format!("invalid amount '{}'", raw)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal::Decimal;

    fn brasilia() -> DisplayZone {
        DisplayZone::Fixed(FixedOffset::west_opt(3 * 3600).unwrap())
    }

    fn tx_at(date: &str) -> Transaction {
        Transaction {
            id: "8".to_string(),
            name: "Feira".to_string(),
            amount: Decimal::ONE,
            transaction_type: TransactionType::Negative,
            category: Category::from_key("food"),
            date: date.to_string(),
        }
    }

    #[test]
    fn test_decode_stored_record() {
        let json = r#"{
            "id": "1",
            "name": "Desenvolvimento de site",
            "amount": "12000.00",
            "type": "positive",
            "category": { "name": "Vendas", "icon": "dollar-sign" },
            "date": "2024-04-13T10:00:00.000Z"
        }"#;

        let tx: Transaction = serde_json::from_str(json).unwrap();

        assert_eq!(tx.amount, Decimal::new(1200000, 2));
        assert_eq!(tx.transaction_type, TransactionType::Positive);
        assert_eq!(tx.category.icon, "dollar-sign");
        assert!(tx.is_entry());
    }

    #[test]
    fn test_numeric_amount_and_category_key() {
        let json = r#"{
            "id": "2",
            "name": "Hamburgueria",
            "amount": 59.9,
            "type": "negative",
            "category": "food",
            "date": "2024-04-10"
        }"#;

        let tx: Transaction = serde_json::from_str(json).unwrap();

        assert_eq!(tx.amount, Decimal::new(599, 1));
        assert_eq!(tx.category, Category::new("Alimentação", "coffee"));
    }

    #[test]
    fn test_unknown_category_key_keeps_name() {
        let category = Category::from_key("pets");
        assert_eq!(category.name, "pets");
        assert_eq!(category.icon, FALLBACK_ICON);
    }

    #[test]
    fn test_unknown_type_is_rejected() {
        let json = r#"{"id":"3","name":"x","amount":"1","type":"sideways",
            "category":"food","date":"2024-01-01"}"#;

        assert!(serde_json::from_str::<Transaction>(json).is_err());
    }

    #[test]
    fn test_rejects_garbage_amount() {
        let json = r#"{"id":"4","name":"x","amount":"abc","type":"positive",
            "category":"food","date":"2024-01-01"}"#;

        assert!(serde_json::from_str::<Transaction>(json).is_err());
    }

    #[test]
    fn test_utc_timestamp_shifts_to_local_day() {
        let tx = Transaction {
            id: "5".to_string(),
            name: "late".to_string(),
            amount: Decimal::ONE,
            transaction_type: TransactionType::Negative,
            category: Category::from_key("car"),
            date: "2024-02-01T01:30:00Z".to_string(),
        };

        // 01:30 UTC is still the previous evening in Brasília
        assert_eq!(
            tx.local_datetime(brasilia()).unwrap().date_naive(),
            NaiveDate::from_ymd_opt(2024, 1, 31).unwrap()
        );
    }

    #[test]
    fn test_bare_date_is_calendar_date() {
        let tx = Transaction {
            id: "6".to_string(),
            name: "bare".to_string(),
            amount: Decimal::ONE,
            transaction_type: TransactionType::Positive,
            category: Category::from_key("salary"),
            date: "2024-01-20".to_string(),
        };

        assert_eq!(
            tx.local_datetime(brasilia()).unwrap().date_naive(),
            NaiveDate::from_ymd_opt(2024, 1, 20).unwrap()
        );
    }

    #[test]
    fn test_invalid_date_reports_transaction() {
        let tx = Transaction {
            id: "7".to_string(),
            name: "broken".to_string(),
            amount: Decimal::ONE,
            transaction_type: TransactionType::Positive,
            category: Category::from_key("salary"),
            date: "20/01/2024".to_string(),
        };

        match tx.local_datetime(brasilia()) {
            Err(DashboardError::InvalidDate { id, .. }) => assert_eq!(id, "7"),
            other => panic!("expected InvalidDate, got {:?}", other),
        }
    }

    #[test]
    fn test_sao_paulo_summer_time_keeps_day() {
        let tx = tx_at("2018-01-15T02:30:00Z");
        let day = NaiveDate::from_ymd_opt(2018, 1, 15).unwrap();

        // UTC-02:00 in the 2017/18 summer puts this at 00:30 on the 15th
        let local = tx.local_datetime(DisplayZone::Named(Tz::America__Sao_Paulo)).unwrap();
        assert_eq!(local.date_naive(), day);
        assert_eq!(local.offset().local_minus_utc(), -2 * 3600);

        // A fixed UTC-03:00 still lands on the evening before
        assert_eq!(
            tx.local_datetime(brasilia()).unwrap().date_naive(),
            day.pred_opt().unwrap()
        );
    }

    #[test]
    fn test_bare_date_on_dst_start_day() {
        // Clocks jumped from 00:00 to 01:00 on 2017-10-15 in São Paulo
        let local = tx_at("2017-10-15")
            .local_datetime(DisplayZone::Named(Tz::America__Sao_Paulo))
            .unwrap();

        assert_eq!(local.date_naive(), NaiveDate::from_ymd_opt(2017, 10, 15).unwrap());
    }

    #[test]
    fn test_type_from_str() {
        assert_eq!("positive".parse::<TransactionType>(), Ok(TransactionType::Positive));
        assert_eq!(" Negative ".parse::<TransactionType>(), Ok(TransactionType::Negative));
        assert!("".parse::<TransactionType>().is_err());
    }
}
