//! # Action Handlers
//!
//! One function per `action` value. The HTTP layer decodes the request,
//! then calls [`read`] for GET actions or [`execute`] for POST actions.
//!
//! ## Dispatch
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  GET  ?action=menu            ─► menu::public_menu        (public)     │
//! │  GET  ?action=locations       ─► menu::locations          (public)     │
//! │  GET  ?action=orders          ─► orders::list             (token)      │
//! │  GET  ?action=getUsers        ─► users::list              (admin)      │
//! │  GET  ?action=getManagerMenu  ─► menu::manager_menu       (manager)    │
//! │                                                                         │
//! │  POST createOrder, newsletter ─► secret key or staff token             │
//! │  POST login                   ─► public                                │
//! │  POST everything else         ─► token                                 │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Authority checks beyond "has a session" live in cafe-core (status
//! transitions) or in the individual handler (user and menu admin).

pub mod menu;
pub mod newsletter;
pub mod orders;
pub mod session;
pub mod users;

use serde::Serialize;
use serde_json::Value;
use tracing::debug;

use cafe_core::action::{ActionRequest, ApiResponse, ReadAction};
use cafe_core::Role;

use crate::error::{ApiError, ApiResult};
use crate::state::AppState;

/// What every handler returns: the success envelope.
pub type Reply = ApiResponse<Value>;

/// The authenticated staff member behind a request.
#[derive(Debug, Clone)]
pub struct Caller {
    pub username: String,
    pub name: String,
    /// Role as currently stored, not as issued in the token.
    pub role: Role,
    /// `jti` of the presented token.
    pub token_id: String,
}

impl Caller {
    pub fn require_manager(&self, action: &str) -> ApiResult<()> {
        if self.role.is_manager() {
            Ok(())
        } else {
            Err(ApiError::forbidden(format!("{} is not allowed to {}", self.role, action)))
        }
    }

    pub fn require_admin(&self, action: &str) -> ApiResult<()> {
        if self.role.is_admin() {
            Ok(())
        } else {
            Err(ApiError::forbidden(format!("{} is not allowed to {}", self.role, action)))
        }
    }
}

/// Resolves a bearer token to a live session.
///
/// Fails with Unauthorized when the token is missing, forged, expired,
/// revoked, or its user has been deleted.
pub async fn authenticate(state: &AppState, token: Option<&str>) -> ApiResult<Caller> {
    let token = token.ok_or(ApiError::Unauthorized)?;
    let claims = state.jwt.validate(token)?;

    if !state.db.sessions().is_active(&claims.jti, &claims.sub).await? {
        debug!(username = %claims.sub, "Token has no live session");
        return Err(ApiError::Unauthorized);
    }

    let user = state
        .db
        .users()
        .find(&claims.sub)
        .await?
        .ok_or(ApiError::Unauthorized)?;

    Ok(Caller {
        username: user.username,
        name: user.name,
        role: user.role,
        token_id: claims.jti,
    })
}

/// Serves a GET action.
pub async fn read(state: &AppState, action: ReadAction, token: Option<&str>) -> ApiResult<Reply> {
    match action {
        ReadAction::Menu => menu::public_menu(state).await,
        ReadAction::Locations => menu::locations(state).await,
        ReadAction::Orders => {
            let caller = authenticate(state, token).await?;
            orders::list(state, &caller).await
        }
        ReadAction::GetUsers => {
            let caller = authenticate(state, token).await?;
            users::list(state, &caller).await
        }
        ReadAction::GetManagerMenu => {
            let caller = authenticate(state, token).await?;
            menu::manager_menu(state, &caller).await
        }
    }
}

/// Serves a POST action.
pub async fn execute(state: &AppState, request: ActionRequest, token: Option<&str>) -> ApiResult<Reply> {
    match request {
        // Public, key-guarded
        ActionRequest::CreateOrder(req) => orders::create(state, req, token).await,
        ActionRequest::Newsletter(req) => newsletter::subscribe(state, req).await,
        ActionRequest::Login(req) => session::login(state, req).await,

        other => {
            let caller = authenticate(state, token).await?;
            debug!(action = other.name(), username = %caller.username, role = %caller.role, "Dispatching action");

            match other {
                ActionRequest::UpdateOrderStatus(req) => orders::update_status(state, &caller, req).await,
                ActionRequest::UpdateItemStatus(req) => orders::update_item(state, &caller, req).await,
                ActionRequest::CloseOrder(req) => orders::close(state, &caller, req).await,
                ActionRequest::CancelOrder(req) => orders::cancel(state, &caller, req).await,
                ActionRequest::EditOrder(req) => orders::edit(state, &caller, req).await,

                ActionRequest::Logout => session::logout(state, &caller).await,
                ActionRequest::ChangePassword(req) => session::change_password(state, &caller, req).await,

                ActionRequest::AdminResetPassword(req) => users::reset_password(state, &caller, req).await,
                ActionRequest::CreateUser(req) => users::create(state, &caller, req).await,
                ActionRequest::DeleteUser(req) => users::delete(state, &caller, req).await,
                ActionRequest::UpdateUser(req) => users::update(state, &caller, req).await,

                ActionRequest::UpdateMenuItem(req) => menu::update_item(state, &caller, req).await,
                ActionRequest::BatchUpdateMenuItems(req) => menu::batch_update(state, &caller, req).await,

                ActionRequest::CreateOrder(_) | ActionRequest::Newsletter(_) | ActionRequest::Login(_) => {
                    Err(ApiError::Internal("public action reached the token branch".to_string()))
                }
            }
        }
    }
}

/// Wraps a serializable value in the success envelope.
pub(crate) fn reply<T: Serialize>(data: T) -> ApiResult<Reply> {
    serde_json::to_value(data)
        .map(ApiResponse::ok)
        .map_err(|e| ApiError::Internal(format!("Failed to encode response: {}", e)))
}

/// Success envelope with only a message.
pub(crate) fn reply_message(message: impl Into<String>) -> ApiResult<Reply> {
    Ok(ApiResponse::ok_message(message))
}

/// Constant-time comparison of the public submission key.
pub(crate) fn check_public_key(state: &AppState, secret: Option<&str>) -> ApiResult<()> {
    let expected = state.config.public_api_key.as_bytes();
    let given = secret.unwrap_or_default().as_bytes();

    let same_len = expected.len() == given.len();
    let diff = expected
        .iter()
        .zip(given.iter())
        .fold(0u8, |acc, (a, b)| acc | (a ^ b));

    if same_len && diff == 0 {
        Ok(())
    } else {
        Err(ApiError::Unauthorized)
    }
}
