//! # Newsletter Repository

use chrono::Utc;
use sqlx::SqlitePool;
use tracing::info;

use crate::error::DbResult;

#[derive(Debug, Clone)]
pub struct NewsletterRepository {
    pool: SqlitePool,
}

impl NewsletterRepository {
    pub fn new(pool: SqlitePool) -> Self {
        NewsletterRepository { pool }
    }

    /// Records a sign-up. Returns false if the address was already
    /// subscribed; subscribing twice is not an error.
    pub async fn subscribe(&self, email: &str) -> DbResult<bool> {
        let email = email.trim().to_lowercase();

        let result = sqlx::query(
            "INSERT OR IGNORE INTO newsletter_subscribers (email, subscribed_at) VALUES (?, ?)",
        )
        .bind(email.as_str())
        .bind(Utc::now())
        .execute(&self.pool)
        .await?;

        let created = result.rows_affected() == 1;
        if created {
            info!("Newsletter subscription added");
        }
        Ok(created)
    }

    pub async fn count(&self) -> DbResult<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM newsletter_subscribers")
            .fetch_one(&self.pool)
            .await?;
        Ok(count)
    }
}
