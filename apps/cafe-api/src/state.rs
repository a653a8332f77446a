//! Shared application state.

use std::sync::Arc;

use tracing::{info, warn};

use cafe_core::Role;
use cafe_db::Database;

use crate::auth::{hash_password, JwtManager};
use crate::config::ApiConfig;
use crate::error::ApiResult;

/// Username of the account created on an empty users table.
pub const BOOTSTRAP_ADMIN: &str = "admin";

/// Handed to every handler. Cheap to clone.
#[derive(Clone)]
pub struct AppState {
    pub db: Database,
    pub config: Arc<ApiConfig>,
    pub jwt: Arc<JwtManager>,
}

impl AppState {
    pub fn new(db: Database, config: ApiConfig) -> Self {
        let jwt = JwtManager::new(config.jwt_secret.clone(), config.token_lifetime_secs);
        AppState {
            db,
            config: Arc::new(config),
            jwt: Arc::new(jwt),
        }
    }

    /// Creates the `admin` account when no users exist yet.
    ///
    /// Returns true if an account was created. Without a configured
    /// bootstrap password nothing happens and a warning is logged.
    pub async fn bootstrap_admin(&self) -> ApiResult<bool> {
        if self.db.users().count().await? > 0 {
            return Ok(false);
        }

        let Some(password) = self.config.bootstrap_admin_password.as_deref() else {
            warn!("No users exist and CAFE_BOOTSTRAP_ADMIN_PASSWORD is not set; nobody can log in");
            return Ok(false);
        };

        let hash = hash_password(password)?;
        self.db
            .users()
            .insert(BOOTSTRAP_ADMIN, "Administrator", Role::Admin, &hash)
            .await?;

        info!(username = BOOTSTRAP_ADMIN, "Bootstrap admin account created");
        Ok(true)
    }
}
