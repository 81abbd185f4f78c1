// Error taxonomy for loading and presenting the dashboard
//
// Storage and decode failures become a visible screen state instead of a crash,
// so every fallible library call returns DashboardError.

use thiserror::Error;

pub type DashboardResult<T> = Result<T, DashboardError>;

#[derive(Debug, Error)]
pub enum DashboardError {
    /// Key/value store could not be read or written
    #[error("Storage error: {0}")]
    Storage(#[from] rusqlite::Error),

    /// Stored JSON does not match the transaction schema
    #[error("Malformed stored data: {0}")]
    Decode(#[from] serde_json::Error),

    #[error("Invalid amount '{value}' in transaction {id}")]
    InvalidAmount { id: String, value: String },

    #[error("Invalid date '{value}' in transaction {id}")]
    InvalidDate { id: String, value: String },

    /// Sum of the stored amounts does not fit in a Decimal
    #[error("Amounts overflow the {total} total")]
    AmountOverflow { total: &'static str },

    /// Background load ended without reporting a result
    #[error("Load worker stopped: {0}")]
    Worker(String),

    /// Import file could not be read or parsed
    #[error("Import failed: {0}")]
    Import(String),

    #[error("No user is signed in")]
    NotSignedIn,

    #[error("Configuration error: {0}")]
    Config(#[from] ::config::ConfigError),
}

impl From<csv::Error> for DashboardError {
    fn from(err: csv::Error) -> Self {
        DashboardError::Import(err.to_string())
    }
}

impl From<std::io::Error> for DashboardError {
    fn from(err: std::io::Error) -> Self {
        DashboardError::Import(err.to_string())
    }
}

impl DashboardError {
    /// True when the failure comes from the stored data rather than the store itself
    pub fn is_data_error(&self) -> bool {
        matches!(
            self,
            DashboardError::Decode(_)
                | DashboardError::InvalidAmount { .. }
                | DashboardError::InvalidDate { .. }
                | DashboardError::AmountOverflow { .. }
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decode_error_is_data_error() {
        let err: DashboardError = serde_json::from_str::<Vec<u8>>("not json")
            .unwrap_err()
            .into();

        assert!(err.is_data_error());
        assert!(err.to_string().starts_with("Malformed stored data"));
    }

    #[test]
    fn test_not_signed_in_is_not_data_error() {
        assert!(!DashboardError::NotSignedIn.is_data_error());
    }

    #[test]
    fn test_overflow_is_data_error() {
        let err = DashboardError::AmountOverflow { total: "entries" };

        assert!(err.is_data_error());
        assert!(!DashboardError::Worker("panicked".to_string()).is_data_error());
    }
}
