//! # User Repository
//!
//! Staff accounts. Password hashes are produced and checked by cafe-api;
//! this layer only stores them.

use chrono::{DateTime, Utc};
use sqlx::SqlitePool;
use tracing::{debug, info};

use cafe_core::{Role, UserProfile};

use crate::error::{DbError, DbResult};

/// A stored account, hash included. Never serialized to clients.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct UserRecord {
    pub username: String,
    pub name: String,
    pub role: Role,
    pub password_hash: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<UserRecord> for UserProfile {
    fn from(record: UserRecord) -> Self {
        UserProfile {
            username: record.username,
            name: record.name,
            role: record.role,
        }
    }
}

/// Repository for staff accounts.
#[derive(Debug, Clone)]
pub struct UserRepository {
    pool: SqlitePool,
}

impl UserRepository {
    pub fn new(pool: SqlitePool) -> Self {
        UserRepository { pool }
    }

    /// Looks up an account by username.
    pub async fn find(&self, username: &str) -> DbResult<Option<UserRecord>> {
        let record = sqlx::query_as::<_, UserRecord>(
            "SELECT username, name, role, password_hash, created_at, updated_at FROM users WHERE username = ?",
        )
        .bind(username)
        .fetch_optional(&self.pool)
        .await?;

        Ok(record)
    }

    /// Like [`find`](Self::find) but missing is an error.
    pub async fn get(&self, username: &str) -> DbResult<UserRecord> {
        self.find(username)
            .await?
            .ok_or_else(|| DbError::not_found("User", username))
    }

    /// All accounts, ordered by username.
    pub async fn list(&self) -> DbResult<Vec<UserProfile>> {
        let records = sqlx::query_as::<_, UserRecord>(
            "SELECT username, name, role, password_hash, created_at, updated_at FROM users ORDER BY username",
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(records.into_iter().map(UserProfile::from).collect())
    }

    /// Creates an account. A taken username is a UniqueViolation.
    pub async fn insert(
        &self,
        username: &str,
        name: &str,
        role: Role,
        password_hash: &str,
    ) -> DbResult<UserProfile> {
        let now = Utc::now();

        sqlx::query(
            r#"
            INSERT INTO users (username, name, role, password_hash, created_at, updated_at)
            VALUES (?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(username)
        .bind(name)
        .bind(role)
        .bind(password_hash)
        .bind(now)
        .bind(now)
        .execute(&self.pool)
        .await
        .map_err(|err| match DbError::from(err) {
            DbError::UniqueViolation { .. } => DbError::duplicate("username", username),
            other => other,
        })?;

        info!(username, %role, "User created");
        Ok(UserProfile {
            username: username.to_string(),
            name: name.to_string(),
            role,
        })
    }

    /// Changes display name and/or role. `None` leaves a field alone.
    pub async fn update_profile(
        &self,
        username: &str,
        name: Option<&str>,
        role: Option<Role>,
    ) -> DbResult<UserProfile> {
        let result = sqlx::query(
            r#"
            UPDATE users SET
                name = COALESCE(?, name),
                role = COALESCE(?, role),
                updated_at = ?
            WHERE username = ?
            "#,
        )
        .bind(name)
        .bind(role)
        .bind(Utc::now())
        .bind(username)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("User", username));
        }

        debug!(username, "User profile updated");
        self.get(username).await.map(UserProfile::from)
    }

    /// Replaces the stored password hash.
    pub async fn set_password_hash(&self, username: &str, password_hash: &str) -> DbResult<()> {
        let result = sqlx::query("UPDATE users SET password_hash = ?, updated_at = ? WHERE username = ?")
            .bind(password_hash)
            .bind(Utc::now())
            .bind(username)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("User", username));
        }
        Ok(())
    }

    /// Deletes an account. Its sessions go with it (ON DELETE CASCADE).
    pub async fn delete(&self, username: &str) -> DbResult<()> {
        let result = sqlx::query("DELETE FROM users WHERE username = ?")
            .bind(username)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("User", username));
        }

        info!(username, "User deleted");
        Ok(())
    }

    /// Number of accounts. Zero on a fresh database.
    pub async fn count(&self) -> DbResult<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM users")
            .fetch_one(&self.pool)
            .await?;
        Ok(count)
    }

    /// Number of accounts holding `role`.
    pub async fn count_with_role(&self, role: Role) -> DbResult<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM users WHERE role = ?")
            .bind(role)
            .fetch_one(&self.pool)
            .await?;
        Ok(count)
    }
}
