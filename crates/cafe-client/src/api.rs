//! # Remote API Client
//!
//! One typed method per action of the `/exec` endpoint.
//!
//! ## Wire Shape
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  reads      GET  {endpoint}?action=orders                               │
//! │                  Authorization: Bearer <token>   (staff reads only)     │
//! │                                                                         │
//! │  mutations  POST {endpoint}?action=closeOrder                           │
//! │                  { "action": "closeOrder", "orderId": "…", … }          │
//! │                  Authorization: Bearer <token>   (staff actions)        │
//! │                                                                         │
//! │  response   { "success": true,  "data": … }           ──► Ok(data)      │
//! │             { "success": false, "message": "…" }      ──► Err(…)        │
//! │             anything without "success": true          ──► Err(…)        │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! An Unauthorized answer clears the shared [`SessionStore`] before the
//! error is returned.

use std::sync::Arc;

use async_trait::async_trait;
use reqwest::RequestBuilder;
use serde::de::{DeserializeOwned, IgnoredAny};
use serde::Deserialize;
use tracing::{debug, info, warn};

use cafe_core::action::{
    ActionRequest, AdminResetPassword, ApiResponse, BatchUpdateMenuItems, CancelOrder,
    ChangePassword, CloseOrder, CloseOrderResult, CreateOrder, CreateOrderResult, CreateUser,
    DeleteUser, EditOrder, Login, MenuItemUpdate, Newsletter, ReadAction, UpdateItemStatus,
    UpdateOrderStatus, UpdateUser,
};
use cafe_core::{
    ItemStatus, LineItem, Location, MenuItem, Order, OrderStatus, SessionUser, UserProfile,
};

use crate::config::ClientConfig;
use crate::error::{ClientError, ClientResult};
use crate::session::SessionStore;

/// Longest slice of a non-JSON error body kept in [`ClientError::Http`].
const MAX_ERROR_BODY: usize = 200;

// =============================================================================
// Backend Trait
// =============================================================================

/// The calls a staff dashboard makes.
///
/// [`CafeClient`] is the production implementation; tests drive the
/// dashboard with an in-memory fake.
#[async_trait]
pub trait StaffBackend: Send + Sync {
    async fn orders(&self) -> ClientResult<Vec<Order>>;

    async fn update_order_status(
        &self,
        order_id: &str,
        next: OrderStatus,
        cascade: bool,
    ) -> ClientResult<Order>;

    async fn update_item_status(
        &self,
        order_id: &str,
        item_id: &str,
        next: ItemStatus,
    ) -> ClientResult<Order>;

    async fn close_order(&self, request: CloseOrder) -> ClientResult<CloseOrderResult>;

    async fn cancel_order(&self, order_id: &str, reason: Option<String>) -> ClientResult<Order>;

    async fn edit_order(&self, order_id: &str, items: Vec<LineItem>) -> ClientResult<Order>;

    async fn logout(&self) -> ClientResult<()>;
}

// =============================================================================
// HTTP Client
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Auth {
    /// Public action; no token sent.
    None,
    /// Token sent when someone is logged in (staff-placed orders).
    Optional,
    /// Fails locally with Unauthorized when no one is logged in.
    Required,
}

#[derive(Deserialize)]
struct BatchResult {
    updated: usize,
}

/// reqwest-backed client for the action endpoint.
#[derive(Debug, Clone)]
pub struct CafeClient {
    http: reqwest::Client,
    config: Arc<ClientConfig>,
    session: SessionStore,
}

impl CafeClient {
    pub fn new(config: ClientConfig) -> ClientResult<Self> {
        Self::with_session(config, SessionStore::new())
    }

    /// Client sharing an existing session slot.
    pub fn with_session(config: ClientConfig, session: SessionStore) -> ClientResult<Self> {
        let http = reqwest::Client::builder()
            .timeout(config.request_timeout)
            .build()?;

        Ok(CafeClient {
            http,
            config: Arc::new(config),
            session,
        })
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    pub fn session(&self) -> &SessionStore {
        &self.session
    }

    // =========================================================================
    // Public Reads
    // =========================================================================

    /// Available menu items in display order.
    pub async fn menu(&self) -> ClientResult<Vec<MenuItem>> {
        self.read(ReadAction::Menu).await
    }

    pub async fn locations(&self) -> ClientResult<Vec<Location>> {
        self.read(ReadAction::Locations).await
    }

    // =========================================================================
    // Staff Reads
    // =========================================================================

    /// Orders the logged-in role may see.
    pub async fn orders(&self) -> ClientResult<Vec<Order>> {
        self.read(ReadAction::Orders).await
    }

    pub async fn get_users(&self) -> ClientResult<Vec<UserProfile>> {
        self.read(ReadAction::GetUsers).await
    }

    /// Every menu item, including unavailable ones.
    pub async fn manager_menu(&self) -> ClientResult<Vec<MenuItem>> {
        self.read(ReadAction::GetManagerMenu).await
    }

    // =========================================================================
    // Orders
    // =========================================================================

    /// Places an order. The public key from the config is filled in when
    /// the request carries none; a staff token is attached when logged in.
    pub async fn create_order(&self, mut order: CreateOrder) -> ClientResult<CreateOrderResult> {
        if order.secret.is_none() {
            order.secret = self.config.public_api_key.clone();
        }
        let result: CreateOrderResult = self
            .execute_data(ActionRequest::CreateOrder(order), Auth::Optional)
            .await?;
        info!(order_id = %result.order_id, total = %result.total, "Order placed");
        Ok(result)
    }

    pub async fn update_order_status(
        &self,
        order_id: &str,
        next: OrderStatus,
        cascade: bool,
    ) -> ClientResult<Order> {
        let request = ActionRequest::UpdateOrderStatus(UpdateOrderStatus {
            order_id: order_id.to_string(),
            next_status: next,
            cascade,
        });
        self.execute_data(request, Auth::Required).await
    }

    pub async fn update_item_status(
        &self,
        order_id: &str,
        item_id: &str,
        next: ItemStatus,
    ) -> ClientResult<Order> {
        let request = ActionRequest::UpdateItemStatus(UpdateItemStatus {
            order_id: order_id.to_string(),
            item_id: item_id.to_string(),
            next_status: next,
        });
        self.execute_data(request, Auth::Required).await
    }

    pub async fn close_order(&self, request: CloseOrder) -> ClientResult<CloseOrderResult> {
        self.execute_data(ActionRequest::CloseOrder(request), Auth::Required)
            .await
    }

    pub async fn cancel_order(&self, order_id: &str, reason: Option<String>) -> ClientResult<Order> {
        let request = ActionRequest::CancelOrder(CancelOrder {
            order_id: order_id.to_string(),
            reason,
        });
        self.execute_data(request, Auth::Required).await
    }

    /// Replaces the order's items. The server re-prices them and recomputes
    /// the delivery fee.
    pub async fn edit_order(&self, order_id: &str, items: Vec<LineItem>) -> ClientResult<Order> {
        let request = ActionRequest::EditOrder(EditOrder {
            order_id: order_id.to_string(),
            items,
        });
        self.execute_data(request, Auth::Required).await
    }

    // =========================================================================
    // Session
    // =========================================================================

    /// Logs in and stores the session.
    pub async fn login(&self, username: &str, password: &str) -> ClientResult<SessionUser> {
        let request = ActionRequest::Login(Login {
            username: username.to_string(),
            password: password.to_string(),
        });
        let user: SessionUser = self.execute_data(request, Auth::None).await?;
        info!(username = %user.username, role = %user.role, "Logged in");
        self.session.set(user.clone()).await;
        Ok(user)
    }

    /// Revokes the token server-side, then forgets it locally whatever the
    /// server said.
    pub async fn logout(&self) -> ClientResult<()> {
        if !self.session.is_logged_in().await {
            return Ok(());
        }
        let result = self.execute(ActionRequest::Logout, Auth::Required).await;
        self.session.clear().await;
        result.map(|_| ())
    }

    /// Changes the caller's password. The current session stays valid.
    pub async fn change_password(&self, old_password: &str, new_password: &str) -> ClientResult<()> {
        let request = ActionRequest::ChangePassword(ChangePassword {
            old_password: old_password.to_string(),
            new_password: new_password.to_string(),
        });
        self.execute(request, Auth::Required).await.map(|_| ())
    }

    // =========================================================================
    // User Administration
    // =========================================================================

    pub async fn admin_reset_password(
        &self,
        target_username: &str,
        new_password: &str,
    ) -> ClientResult<()> {
        let request = ActionRequest::AdminResetPassword(AdminResetPassword {
            target_username: target_username.to_string(),
            new_password: new_password.to_string(),
        });
        self.execute(request, Auth::Required).await.map(|_| ())
    }

    pub async fn create_user(&self, user: CreateUser) -> ClientResult<UserProfile> {
        self.execute_data(ActionRequest::CreateUser(user), Auth::Required)
            .await
    }

    pub async fn delete_user(&self, target_username: &str) -> ClientResult<()> {
        let request = ActionRequest::DeleteUser(DeleteUser {
            target_username: target_username.to_string(),
        });
        self.execute(request, Auth::Required).await.map(|_| ())
    }

    pub async fn update_user(&self, update: UpdateUser) -> ClientResult<UserProfile> {
        self.execute_data(ActionRequest::UpdateUser(update), Auth::Required)
            .await
    }

    // =========================================================================
    // Menu Management
    // =========================================================================

    pub async fn update_menu_item(&self, update: MenuItemUpdate) -> ClientResult<MenuItem> {
        self.execute_data(ActionRequest::UpdateMenuItem(update), Auth::Required)
            .await
    }

    /// Applies every update or none. Returns how many items changed.
    pub async fn batch_update_menu_items(&self, updates: Vec<MenuItemUpdate>) -> ClientResult<usize> {
        let request = ActionRequest::BatchUpdateMenuItems(BatchUpdateMenuItems { updates });
        let result: BatchResult = self.execute_data(request, Auth::Required).await?;
        Ok(result.updated)
    }

    // =========================================================================
    // Public Forms
    // =========================================================================

    /// Newsletter signup. Returns the server's message ("Subscribed" or
    /// "Already subscribed").
    pub async fn subscribe_newsletter(&self, email: &str) -> ClientResult<String> {
        let request = ActionRequest::Newsletter(Newsletter {
            email: email.to_string(),
            secret: self.config.public_api_key.clone(),
        });
        let envelope = self.execute(request, Auth::None).await?;
        Ok(envelope.message.unwrap_or_default())
    }

    // =========================================================================
    // Transport
    // =========================================================================

    async fn read<T: DeserializeOwned>(&self, action: ReadAction) -> ClientResult<T> {
        let auth = if action.is_public() {
            Auth::None
        } else {
            Auth::Required
        };

        let request = self
            .http
            .get(&self.config.endpoint)
            .query(&[("action", action.as_str())]);
        let request = self.authorize(request, auth).await?;

        let envelope = self.send(action.as_str(), request).await?;
        into_data(action.as_str(), envelope)
    }

    async fn execute_data<T: DeserializeOwned>(
        &self,
        action: ActionRequest,
        auth: Auth,
    ) -> ClientResult<T> {
        let name = action.name();
        let envelope = self.post(action, auth).await?;
        into_data(name, envelope)
    }

    /// POST whose reply carries no data worth decoding.
    async fn execute(
        &self,
        action: ActionRequest,
        auth: Auth,
    ) -> ClientResult<ApiResponse<IgnoredAny>> {
        self.post(action, auth).await
    }

    async fn post<T: DeserializeOwned>(
        &self,
        action: ActionRequest,
        auth: Auth,
    ) -> ClientResult<ApiResponse<T>> {
        let name = action.name();
        let request = self
            .http
            .post(&self.config.endpoint)
            .query(&[("action", name)])
            .json(&action);
        let request = self.authorize(request, auth).await?;

        self.send(name, request).await
    }

    async fn authorize(&self, request: RequestBuilder, auth: Auth) -> ClientResult<RequestBuilder> {
        let token = match auth {
            Auth::None => None,
            Auth::Optional => self.session.token().await,
            Auth::Required => Some(self.session.token().await.ok_or_else(|| {
                ClientError::Unauthorized("Unauthorized: not logged in".to_string())
            })?),
        };

        Ok(match token {
            Some(token) => request.bearer_auth(token),
            None => request,
        })
    }

    async fn send<T: DeserializeOwned>(
        &self,
        action: &str,
        request: RequestBuilder,
    ) -> ClientResult<ApiResponse<T>> {
        debug!(action, "Calling endpoint");

        let response = request.send().await?;
        let status = response.status();
        let body = response.text().await?;

        let envelope: ApiResponse<T> = match serde_json::from_str(&body) {
            Ok(envelope) => envelope,
            Err(e) if status.is_success() => {
                return Err(ClientError::Decode(format!("{}: {}", action, e)));
            }
            Err(_) => {
                let error = ClientError::Http {
                    status: status.as_u16(),
                    message: body.chars().take(MAX_ERROR_BODY).collect(),
                };
                return Err(self.reject(action, error).await);
            }
        };

        if envelope.success {
            return Ok(envelope);
        }

        let message = envelope
            .message
            .unwrap_or_else(|| format!("{} failed", action));
        Err(self
            .reject(action, ClientError::from_failure(status.as_u16(), message))
            .await)
    }

    /// Drops the session when the server no longer accepts it.
    async fn reject(&self, action: &str, error: ClientError) -> ClientError {
        if error.is_unauthorized() && self.session.clear().await.is_some() {
            warn!(action, "Session rejected by server, logged out");
        } else {
            debug!(action, error = %error, "Action failed");
        }
        error
    }
}

fn into_data<T>(action: &str, envelope: ApiResponse<T>) -> ClientResult<T> {
    envelope
        .data
        .ok_or_else(|| ClientError::Decode(format!("{} returned no data", action)))
}

#[async_trait]
impl StaffBackend for CafeClient {
    async fn orders(&self) -> ClientResult<Vec<Order>> {
        CafeClient::orders(self).await
    }

    async fn update_order_status(
        &self,
        order_id: &str,
        next: OrderStatus,
        cascade: bool,
    ) -> ClientResult<Order> {
        CafeClient::update_order_status(self, order_id, next, cascade).await
    }

    async fn update_item_status(
        &self,
        order_id: &str,
        item_id: &str,
        next: ItemStatus,
    ) -> ClientResult<Order> {
        CafeClient::update_item_status(self, order_id, item_id, next).await
    }

    async fn close_order(&self, request: CloseOrder) -> ClientResult<CloseOrderResult> {
        CafeClient::close_order(self, request).await
    }

    async fn cancel_order(&self, order_id: &str, reason: Option<String>) -> ClientResult<Order> {
        CafeClient::cancel_order(self, order_id, reason).await
    }

    async fn edit_order(&self, order_id: &str, items: Vec<LineItem>) -> ClientResult<Order> {
        CafeClient::edit_order(self, order_id, items).await
    }

    async fn logout(&self) -> ClientResult<()> {
        CafeClient::logout(self).await
    }
}

#[async_trait]
impl<T: StaffBackend + ?Sized> StaffBackend for Arc<T> {
    async fn orders(&self) -> ClientResult<Vec<Order>> {
        (**self).orders().await
    }

    async fn update_order_status(
        &self,
        order_id: &str,
        next: OrderStatus,
        cascade: bool,
    ) -> ClientResult<Order> {
        (**self).update_order_status(order_id, next, cascade).await
    }

    async fn update_item_status(
        &self,
        order_id: &str,
        item_id: &str,
        next: ItemStatus,
    ) -> ClientResult<Order> {
        (**self).update_item_status(order_id, item_id, next).await
    }

    async fn close_order(&self, request: CloseOrder) -> ClientResult<CloseOrderResult> {
        (**self).close_order(request).await
    }

    async fn cancel_order(&self, order_id: &str, reason: Option<String>) -> ClientResult<Order> {
        (**self).cancel_order(order_id, reason).await
    }

    async fn edit_order(&self, order_id: &str, items: Vec<LineItem>) -> ClientResult<Order> {
        (**self).edit_order(order_id, items).await
    }

    async fn logout(&self) -> ClientResult<()> {
        (**self).logout().await
    }
}
