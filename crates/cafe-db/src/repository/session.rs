//! # Session Repository
//!
//! One row per issued bearer token, keyed by the token's `jti`. A token is
//! honoured only while its row exists and has not expired, so logout,
//! password changes and account deletion take effect immediately.

use chrono::{DateTime, Utc};
use sqlx::SqlitePool;
use tracing::debug;

use crate::error::DbResult;

#[derive(Debug, Clone)]
pub struct SessionRepository {
    pool: SqlitePool,
}

impl SessionRepository {
    pub fn new(pool: SqlitePool) -> Self {
        SessionRepository { pool }
    }

    /// Records a newly issued token.
    pub async fn create(
        &self,
        token_id: &str,
        username: &str,
        expires_at: DateTime<Utc>,
    ) -> DbResult<()> {
        sqlx::query(
            "INSERT INTO sessions (token_id, username, created_at, expires_at) VALUES (?, ?, ?, ?)",
        )
        .bind(token_id)
        .bind(username)
        .bind(Utc::now())
        .bind(expires_at)
        .execute(&self.pool)
        .await?;

        debug!(username, "Session created");
        Ok(())
    }

    /// True if the token id belongs to `username` and is unexpired.
    pub async fn is_active(&self, token_id: &str, username: &str) -> DbResult<bool> {
        let found: Option<i64> = sqlx::query_scalar(
            "SELECT 1 FROM sessions WHERE token_id = ? AND username = ? AND expires_at > ?",
        )
        .bind(token_id)
        .bind(username)
        .bind(Utc::now())
        .fetch_optional(&self.pool)
        .await?;

        Ok(found.is_some())
    }

    /// Revokes one token (logout).
    pub async fn revoke(&self, token_id: &str) -> DbResult<()> {
        sqlx::query("DELETE FROM sessions WHERE token_id = ?")
            .bind(token_id)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    /// Revokes every token of a user (password change or reset).
    /// Returns how many were revoked.
    pub async fn revoke_all_for(&self, username: &str) -> DbResult<u64> {
        let result = sqlx::query("DELETE FROM sessions WHERE username = ?")
            .bind(username)
            .execute(&self.pool)
            .await?;

        debug!(username, revoked = result.rows_affected(), "Sessions revoked");
        Ok(result.rows_affected())
    }

    /// Revokes every token of a user except `keep_token_id` (own password
    /// change keeps the current session alive).
    pub async fn revoke_others(&self, username: &str, keep_token_id: &str) -> DbResult<u64> {
        let result = sqlx::query("DELETE FROM sessions WHERE username = ? AND token_id <> ?")
            .bind(username)
            .bind(keep_token_id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected())
    }

    /// Drops expired rows. Returns how many were removed.
    pub async fn purge_expired(&self) -> DbResult<u64> {
        let result = sqlx::query("DELETE FROM sessions WHERE expires_at <= ?")
            .bind(Utc::now())
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected())
    }
}

#[cfg(test)]
mod tests {
    use chrono::{Duration, Utc};

    use crate::pool::{Database, DbConfig};
    use cafe_core::Role;

    #[tokio::test]
    async fn test_session_lifecycle() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        db.users().insert("ravi", "Ravi", Role::Waiter, "hash").await.unwrap();
        let sessions = db.sessions();

        let later = Utc::now() + Duration::hours(1);
        sessions.create("jti-1", "ravi", later).await.unwrap();
        sessions.create("jti-2", "ravi", later).await.unwrap();
        sessions.create("jti-old", "ravi", Utc::now() - Duration::hours(1)).await.unwrap();

        assert!(sessions.is_active("jti-1", "ravi").await.unwrap());
        assert!(!sessions.is_active("jti-1", "meena").await.unwrap());
        assert!(!sessions.is_active("jti-old", "ravi").await.unwrap());

        sessions.revoke("jti-1").await.unwrap();
        assert!(!sessions.is_active("jti-1", "ravi").await.unwrap());

        assert_eq!(sessions.purge_expired().await.unwrap(), 1);

        sessions.create("jti-3", "ravi", later).await.unwrap();
        assert_eq!(sessions.revoke_others("ravi", "jti-3").await.unwrap(), 1);
        assert!(sessions.is_active("jti-3", "ravi").await.unwrap());

        assert_eq!(sessions.revoke_all_for("ravi").await.unwrap(), 1);
        assert!(!sessions.is_active("jti-3", "ravi").await.unwrap());
    }

    #[tokio::test]
    async fn test_deleting_user_drops_sessions() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        db.users().insert("ravi", "Ravi", Role::Waiter, "hash").await.unwrap();
        db.sessions()
            .create("jti-1", "ravi", Utc::now() + Duration::hours(1))
            .await
            .unwrap();

        db.users().delete("ravi").await.unwrap();
        assert!(!db.sessions().is_active("jti-1", "ravi").await.unwrap());
    }
}
