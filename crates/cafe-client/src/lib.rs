//! # cafe-client: Typed Client for Cafe Ops
//!
//! The front-end half of the system: one typed call per action, the order
//! builder behind the menu page, and the role dashboards.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                          cafe-client                                    │
//! │                                                                         │
//! │   ┌──────────────┐     ┌──────────────┐     ┌──────────────────────┐   │
//! │   │  Cart        │     │  Dashboard   │◄────│  OrderPoller         │   │
//! │   │  (cart.rs)   │     │ (dashboard)  │     │  (every 15 s)        │   │
//! │   └──────┬───────┘     └──────┬───────┘     └──────────────────────┘   │
//! │          │ CreateOrder        │ StaffBackend                            │
//! │          ▼                    ▼                                         │
//! │   ┌─────────────────────────────────────────────────────────────────┐  │
//! │   │   CafeClient (api.rs)  ──  SessionStore (session.rs)            │  │
//! │   └─────────────────────────────┬───────────────────────────────────┘  │
//! └─────────────────────────────────┼──────────────────────────────────────┘
//!                                   │  GET/POST /exec?action=...
//!                                   ▼
//!                               cafe-api
//! ```
//!
//! ## Module Organization
//!
//! - [`api`] - HTTP client and the [`StaffBackend`] seam
//! - [`cart`] - Order builder for the public menu and staff ordering
//! - [`dashboard`] - Role dashboards, order/item actions, close and edit dialogs
//! - [`poller`] - Periodic refresh
//! - [`session`] - Logged-in user
//! - [`config`] - Endpoint and timing
//! - [`error`] - Client and cart errors

// =============================================================================
// Module Declarations
// =============================================================================

pub mod api;
pub mod cart;
pub mod config;
pub mod dashboard;
pub mod error;
pub mod poller;
pub mod session;

#[cfg(test)]
pub(crate) mod testing;

// =============================================================================
// Re-exports
// =============================================================================

pub use api::{CafeClient, StaffBackend};
pub use cart::{Cart, CartItem, CartTarget, CartTotals, CustomerDetails};
pub use config::ClientConfig;
pub use dashboard::{
    item_actions, order_actions, CloseForm, Dashboard, EditForm, ItemAction, OrderAction,
    ServeAllReport,
};
pub use error::{CartError, ClientError, ClientResult};
pub use poller::{OrderPoller, PollerExit, PollerHandle};
pub use session::SessionStore;
