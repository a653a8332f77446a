//! # Session Store
//!
//! Holds the logged-in staff member for the lifetime of the process.
//!
//! ```text
//!   login ok ──► set(user) ──► token attached to staff calls
//!   logout   ──► clear()
//!   any Unauthorized response ──► clear()
//! ```
//!
//! Cloning shares the same slot, so the API client and the dashboard see
//! one session.

use std::sync::Arc;

use tokio::sync::RwLock;

use cafe_core::{Role, SessionUser};

#[derive(Debug, Clone, Default)]
pub struct SessionStore {
    user: Arc<RwLock<Option<SessionUser>>>,
}

impl SessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn set(&self, user: SessionUser) {
        *self.user.write().await = Some(user);
    }

    /// Forgets the session. Returns the user that was logged in, if any.
    pub async fn clear(&self) -> Option<SessionUser> {
        self.user.write().await.take()
    }

    pub async fn current(&self) -> Option<SessionUser> {
        self.user.read().await.clone()
    }

    pub async fn token(&self) -> Option<String> {
        self.user.read().await.as_ref().map(|user| user.token.clone())
    }

    pub async fn role(&self) -> Option<Role> {
        self.user.read().await.as_ref().map(|user| user.role)
    }

    pub async fn is_logged_in(&self) -> bool {
        self.user.read().await.is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_shared_between_clones() {
        let store = SessionStore::new();
        let shared = store.clone();
        assert!(!shared.is_logged_in().await);

        store
            .set(SessionUser {
                username: "meena".to_string(),
                name: "Meena".to_string(),
                role: Role::Kitchen,
                token: "tok".to_string(),
            })
            .await;

        assert_eq!(shared.token().await.as_deref(), Some("tok"));
        assert_eq!(shared.role().await, Some(Role::Kitchen));

        let previous = shared.clear().await;
        assert_eq!(previous.map(|u| u.username), Some("meena".to_string()));
        assert!(!store.is_logged_in().await);
        assert_eq!(store.clear().await, None);
    }
}
