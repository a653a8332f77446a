//! # Repository Module
//!
//! ## Repository Pattern
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  Action handler                                                         │
//! │       │  db.orders().transition("ORD-…", READY, Role::Kitchen, true)    │
//! │       ▼                                                                 │
//! │  OrderRepository                                                        │
//! │  ├── lock the order row (write lock first, then read)                   │
//! │  ├── ask cafe-core whether the change is legal                          │
//! │  └── UPDATE ... WHERE status = <status read>                            │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  SQLite                                                                 │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Available Repositories
//!
//! - [`order::OrderRepository`] - Orders, line items, status writes
//! - [`user::UserRepository`] - Staff accounts
//! - [`session::SessionRepository`] - Issued bearer tokens
//! - [`menu::MenuRepository`] - Menu items and locations
//! - [`newsletter::NewsletterRepository`] - Newsletter sign-ups

pub mod menu;
pub mod newsletter;
pub mod order;
pub mod session;
pub mod user;
