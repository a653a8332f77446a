//! # cafe-db: Database Layer for Cafe Ops
//!
//! SQLite storage behind the action endpoint, using sqlx for async access.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        Cafe Ops Data Flow                               │
//! │                                                                         │
//! │  POST /exec?action=updateItemStatus                                    │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                     cafe-db (THIS CRATE)                        │   │
//! │  │                                                                 │   │
//! │  │   ┌───────────────┐    ┌───────────────┐    ┌──────────────┐  │   │
//! │  │   │   Database    │    │  Repositories │    │  Migrations  │  │   │
//! │  │   │   (pool.rs)   │    │               │    │  (embedded)  │  │   │
//! │  │   │               │    │ OrderRepo     │    │ 001_init.sql │  │   │
//! │  │   │ SqlitePool    │◄───│ UserRepo      │    │              │  │   │
//! │  │   │               │    │ SessionRepo   │    │              │  │   │
//! │  │   │               │    │ MenuRepo      │    │              │  │   │
//! │  │   └───────────────┘    └───────────────┘    └──────────────┘  │   │
//! │  │                              │                                  │   │
//! │  │                              ▼                                  │   │
//! │  │              cafe-core lifecycle rules (inside the txn)         │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  SQLite (WAL)                                                          │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Module Organization
//!
//! - [`pool`] - Connection pool creation and configuration
//! - [`migrations`] - Embedded database migrations
//! - [`error`] - Database error types
//! - [`repository`] - Repository implementations
//!
//! ## Usage
//!
//! ```rust,ignore
//! use cafe_db::{Database, DbConfig};
//!
//! let db = Database::new(DbConfig::new("cafe.db")).await?;
//! let order = db.orders().get("ORD-20260131-1a2b3c4d").await?;
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod error;
pub mod migrations;
pub mod pool;
pub mod repository;

// =============================================================================
// Re-exports
// =============================================================================

pub use error::{DbError, DbResult};
pub use pool::{Database, DbConfig};

pub use repository::menu::MenuRepository;
pub use repository::newsletter::NewsletterRepository;
pub use repository::order::OrderRepository;
pub use repository::session::SessionRepository;
pub use repository::user::{UserRecord, UserRepository};
