// Auth collaborator: who is looking at the dashboard
//
// The session is the signed-in user's profile stored as JSON under USER_KEY.
// Signing out deletes it.

use crate::error::{DashboardError, DashboardResult};
use crate::storage::{Storage, USER_KEY};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::info;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub id: String,
    pub name: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,

    /// Avatar URL
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub photo: Option<String>,
}

impl User {
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        User {
            id: id.into(),
            name: name.into(),
            email: None,
            photo: None,
        }
    }

    pub fn with_photo(mut self, photo: impl Into<String>) -> Self {
        self.photo = Some(photo.into());
        self
    }
}

pub trait AuthProvider: Send + Sync {
    fn current_user(&self) -> DashboardResult<Option<User>>;
    fn sign_out(&self) -> DashboardResult<()>;

    fn require_user(&self) -> DashboardResult<User> {
        self.current_user()?.ok_or(DashboardError::NotSignedIn)
    }
}

/// Session kept in the same key/value store as the transactions
#[derive(Clone)]
pub struct SessionAuth {
    storage: Arc<dyn Storage>,
}

impl SessionAuth {
    pub fn new(storage: Arc<dyn Storage>) -> Self {
        SessionAuth { storage }
    }

    pub fn sign_in(&self, user: &User) -> DashboardResult<()> {
        let json = serde_json::to_string(user)?;
        self.storage.set(USER_KEY, &json)?;
        info!(user_id = %user.id, "signed in");
        Ok(())
    }
}

impl AuthProvider for SessionAuth {
    fn current_user(&self) -> DashboardResult<Option<User>> {
        match self.storage.get(USER_KEY)? {
            Some(raw) => Ok(Some(serde_json::from_str(&raw)?)),
            None => Ok(None),
        }
    }

    fn sign_out(&self) -> DashboardResult<()> {
        self.storage.remove(USER_KEY)?;
        info!("signed out");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::MemoryStorage;

    #[test]
    fn test_sign_in_and_out() {
        let storage: Arc<dyn Storage> = Arc::new(MemoryStorage::new());
        let auth = SessionAuth::new(storage.clone());

        assert_eq!(auth.current_user().unwrap(), None);
        assert!(matches!(auth.require_user(), Err(DashboardError::NotSignedIn)));

        let user = User::new("u1", "Maria Souza").with_photo("https://example.com/maria.png");
        auth.sign_in(&user).unwrap();
        assert_eq!(auth.current_user().unwrap(), Some(user));

        auth.sign_out().unwrap();
        assert_eq!(auth.current_user().unwrap(), None);
        assert_eq!(storage.get(USER_KEY).unwrap(), None);
    }

    #[test]
    fn test_session_accepts_extra_fields() {
        let storage: Arc<dyn Storage> = Arc::new(MemoryStorage::new());
        storage
            .set(USER_KEY, r#"{"id":"9","name":"Ana","email":"ana@example.com","locale":"pt-BR"}"#)
            .unwrap();

        let user = SessionAuth::new(storage).require_user().unwrap();
        assert_eq!(user.email.as_deref(), Some("ana@example.com"));
        assert_eq!(user.photo, None);
    }
}
