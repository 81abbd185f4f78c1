// GoFinances dashboard - core library
// Exposes all modules for use in the terminal UI, the API server, and tests

pub mod auth;
pub mod config;
pub mod dashboard;
pub mod error;
pub mod format;
pub mod import;
pub mod logging;
pub mod models;
pub mod storage;
pub mod summary;

#[cfg(feature = "tui")]
pub mod ui;

// Re-export commonly used types
pub use auth::{AuthProvider, SessionAuth, User};
pub use config::AppConfig;
pub use dashboard::{DashboardLoader, DashboardScreen, RefreshGuard, RefreshTrigger, ScreenState};
pub use error::{DashboardError, DashboardResult};
pub use format::{format_currency, format_short_date};
pub use models::{Category, DisplayZone, Transaction, TransactionType};
pub use storage::{
    append_transactions, load_transactions, transactions_key, MemoryStorage, SqliteStorage,
    Storage,
};
pub use summary::{
    summarize, Dashboard, DisplayOptions, HighlightSummary, Highlights, TotalIntervalAnchor,
    TransactionRow,
};
