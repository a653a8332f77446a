//! # Cafe API
//!
//! HTTP server for the café's single action endpoint.
//!
//! ## Architecture
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                          Cafe API Server                                │
//! │                                                                         │
//! │  order page ─┐                                                          │
//! │              ├─► /exec ──► routes ──► actions ──► cafe-core rules       │
//! │  dashboards ─┘   (GET|POST)            │                                │
//! │                                        ▼                                │
//! │                                   cafe-db (SQLite)                      │
//! │                                                                         │
//! │  ┌──────────────┐  ┌──────────────┐  ┌──────────────────────────────┐  │
//! │  │  auth        │  │  config      │  │  error                       │  │
//! │  │  JWT+argon2  │  │  CAFE_* env  │  │  envelope + HTTP status      │  │
//! │  └──────────────┘  └──────────────┘  └──────────────────────────────┘  │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Configuration
//! See [`config::ApiConfig`]. Environment variables:
//! - `CAFE_PORT` - HTTP port (default: 8080)
//! - `CAFE_DATABASE_PATH` - SQLite file (default: ./cafe.db)
//! - `CAFE_JWT_SECRET` - Secret for token signing
//! - `CAFE_PUBLIC_API_KEY` - Key the public order page sends
//! - `CAFE_BOOTSTRAP_ADMIN_PASSWORD` - Password for the first admin

pub mod actions;
pub mod auth;
pub mod config;
pub mod error;
pub mod routes;
pub mod state;

// Re-exports
pub use crate::config::{ApiConfig, ConfigError};
pub use crate::error::{ApiError, ApiResult};
pub use crate::routes::build_router;
pub use crate::state::AppState;
