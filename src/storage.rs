use crate::error::DashboardResult;
use crate::models::Transaction;
use rusqlite::{params, Connection, OptionalExtension};
use std::collections::{HashMap, HashSet};
use std::path::Path;
use std::sync::Mutex;
use tracing::{debug, info};

/// Prefix shared by every key this app writes
pub const KEY_PREFIX: &str = "@gofinances";

/// Key holding the signed-in user
pub const USER_KEY: &str = "@gofinances:user";

/// Storage key for one user's transaction collection
pub fn transactions_key(user_id: &str) -> String {
    format!("{}:transactions_user:{}", KEY_PREFIX, user_id)
}

/// Key/value storage collaborator. Values are JSON text.
pub trait Storage: Send + Sync {
    fn get(&self, key: &str) -> DashboardResult<Option<String>>;
    fn set(&self, key: &str, value: &str) -> DashboardResult<()>;
    fn remove(&self, key: &str) -> DashboardResult<()>;
}

// ============================================================================
// SQLite store (same table layout as the mobile async storage)
// ============================================================================

pub struct SqliteStorage {
    conn: Mutex<Connection>,
}

impl SqliteStorage {
    pub fn open(path: &Path) -> DashboardResult<Self> {
        let conn = Connection::open(path)?;
        setup_database(&conn)?;
        info!(path = %path.display(), "opened storage");
        Ok(Self::from_connection(conn))
    }

    pub fn open_in_memory() -> DashboardResult<Self> {
        let conn = Connection::open_in_memory()?;
        setup_database(&conn)?;
        Ok(Self::from_connection(conn))
    }

    fn from_connection(conn: Connection) -> Self {
        SqliteStorage {
            conn: Mutex::new(conn),
        }
    }

    fn with_conn<T>(&self, f: impl FnOnce(&Connection) -> rusqlite::Result<T>) -> DashboardResult<T> {
        // Poisoning leaves the connection usable
        let conn = self.conn.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
        Ok(f(&conn)?)
    }
}

pub fn setup_database(conn: &Connection) -> rusqlite::Result<()> {
    // Enable WAL mode for crash recovery (in-memory databases report "memory")
    conn.pragma_update(None, "journal_mode", "WAL")?;

    conn.execute(
        "CREATE TABLE IF NOT EXISTS catalystLocalStorage (
            key TEXT PRIMARY KEY,
            value TEXT NOT NULL
        )",
        [],
    )?;

    Ok(())
}

impl Storage for SqliteStorage {
    fn get(&self, key: &str) -> DashboardResult<Option<String>> {
        self.with_conn(|conn| {
            conn.query_row(
                "SELECT value FROM catalystLocalStorage WHERE key = ?1",
                params![key],
                |row| row.get(0),
            )
            .optional()
        })
    }

    fn set(&self, key: &str, value: &str) -> DashboardResult<()> {
        self.with_conn(|conn| {
            conn.execute(
                "INSERT INTO catalystLocalStorage (key, value) VALUES (?1, ?2)
                 ON CONFLICT(key) DO UPDATE SET value = excluded.value",
                params![key, value],
            )
        })?;
        Ok(())
    }

    fn remove(&self, key: &str) -> DashboardResult<()> {
        self.with_conn(|conn| {
            conn.execute("DELETE FROM catalystLocalStorage WHERE key = ?1", params![key])
        })?;
        Ok(())
    }
}

// ============================================================================
// In-memory store
// ============================================================================

#[derive(Default)]
pub struct MemoryStorage {
    values: Mutex<HashMap<String, String>>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }

    fn values(&self) -> std::sync::MutexGuard<'_, HashMap<String, String>> {
        self.values.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl Storage for MemoryStorage {
    fn get(&self, key: &str) -> DashboardResult<Option<String>> {
        Ok(self.values().get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> DashboardResult<()> {
        self.values().insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&self, key: &str) -> DashboardResult<()> {
        self.values().remove(key);
        Ok(())
    }
}

// ============================================================================
// Transaction collection helpers
// ============================================================================

/// Read and decode a user's collection; a missing key is an empty collection
pub fn load_transactions(storage: &dyn Storage, user_id: &str) -> DashboardResult<Vec<Transaction>> {
    let key = transactions_key(user_id);

    match storage.get(&key)? {
        Some(raw) => {
            let transactions: Vec<Transaction> = serde_json::from_str(&raw)?;
            debug!(key = %key, count = transactions.len(), "loaded transactions");
            Ok(transactions)
        }
        None => {
            debug!(key = %key, "no stored transactions");
            Ok(Vec::new())
        }
    }
}

/// Append transactions to a user's collection, skipping ids already stored.
/// Returns how many were added.
pub fn append_transactions(
    storage: &dyn Storage,
    user_id: &str,
    transactions: &[Transaction],
) -> DashboardResult<usize> {
    let mut stored = load_transactions(storage, user_id)?;
    let mut seen: HashSet<String> = stored.iter().map(|tx| tx.id.clone()).collect();

    let before = stored.len();
    for tx in transactions {
        if seen.insert(tx.id.clone()) {
            stored.push(tx.clone());
        }
    }
    let added = stored.len() - before;

    if added > 0 {
        let json = serde_json::to_string(&stored)?;
        storage.set(&transactions_key(user_id), &json)?;
    }

    info!(
        user_id,
        added,
        skipped = transactions.len() - added,
        "appended transactions"
    );

    Ok(added)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Category, TransactionType};
    use rust_decimal::Decimal;

    fn create_test_transaction(id: &str, amount: i64, transaction_type: TransactionType) -> Transaction {
        Transaction {
            id: id.to_string(),
            name: format!("tx {}", id),
            amount: Decimal::new(amount, 2),
            transaction_type,
            category: Category::from_key("food"),
            date: "2024-01-05T12:00:00.000Z".to_string(),
        }
    }

    #[test]
    fn test_transactions_key_is_user_scoped() {
        assert_eq!(
            transactions_key("42"),
            "@gofinances:transactions_user:42"
        );
    }

    #[test]
    fn test_sqlite_get_set_remove() {
        let storage = SqliteStorage::open_in_memory().unwrap();

        assert_eq!(storage.get("a").unwrap(), None);

        storage.set("a", "1").unwrap();
        storage.set("a", "2").unwrap();
        assert_eq!(storage.get("a").unwrap().as_deref(), Some("2"));

        storage.set("b", "3").unwrap();
        storage.remove("a").unwrap();
        assert_eq!(storage.get("a").unwrap(), None);
        assert_eq!(storage.get("b").unwrap().as_deref(), Some("3"));
    }

    #[test]
    fn test_missing_collection_is_empty() {
        let storage = MemoryStorage::new();
        assert!(load_transactions(&storage, "nobody").unwrap().is_empty());
    }

    #[test]
    fn test_malformed_collection_is_error() {
        let storage = MemoryStorage::new();
        storage.set(&transactions_key("u1"), "{not json").unwrap();

        let err = load_transactions(&storage, "u1").unwrap_err();
        assert!(err.is_data_error());
    }

    #[test]
    fn test_append_is_idempotent() {
        let storage = SqliteStorage::open_in_memory().unwrap();
        let transactions = vec![
            create_test_transaction("1", 10000, TransactionType::Positive),
            create_test_transaction("2", 2550, TransactionType::Negative),
        ];

        let first = append_transactions(&storage, "u1", &transactions).unwrap();
        let second = append_transactions(&storage, "u1", &transactions).unwrap();

        assert_eq!(first, 2);
        assert_eq!(second, 0);

        let stored = load_transactions(&storage, "u1").unwrap();
        assert_eq!(stored, transactions);

        // Other users are untouched
        assert!(load_transactions(&storage, "u2").unwrap().is_empty());
    }
}
