//! Login, logout and self-service password change.

use tracing::{info, warn};

use cafe_core::action::{ChangePassword, Login};
use cafe_core::validation::validate_password;
use cafe_core::SessionUser;

use super::{reply, reply_message, Caller, Reply};
use crate::auth::{hash_password, verify_password};
use crate::error::{ApiError, ApiResult};
use crate::state::AppState;

const BAD_CREDENTIALS: &str = "Invalid username or password";

/// `login`: checks the password, issues a token and records its session.
pub async fn login(state: &AppState, req: Login) -> ApiResult<Reply> {
    let username = req.username.trim();
    if username.is_empty() || req.password.is_empty() {
        return Err(ApiError::bad_request("Username and password are required"));
    }

    let Some(user) = state.db.users().find(username).await? else {
        warn!(username, "Login for unknown user");
        return Err(ApiError::bad_request(BAD_CREDENTIALS));
    };

    if !verify_password(&req.password, &user.password_hash) {
        warn!(username, "Login with wrong password");
        return Err(ApiError::bad_request(BAD_CREDENTIALS));
    }

    let (token, claims) = state.jwt.issue(&user.username, user.role)?;
    state
        .db
        .sessions()
        .create(&claims.jti, &user.username, claims.expires_at())
        .await?;

    let purged = state.db.sessions().purge_expired().await?;
    info!(username = %user.username, role = %user.role, purged, "User logged in");

    reply(SessionUser {
        username: user.username,
        name: user.name,
        role: user.role,
        token,
    })
}

/// `logout`: revokes the presented token only.
pub async fn logout(state: &AppState, caller: &Caller) -> ApiResult<Reply> {
    state.db.sessions().revoke(&caller.token_id).await?;
    info!(username = %caller.username, "User logged out");
    reply_message("Logged out")
}

/// `changePassword`: other sessions of the same user are revoked, the
/// current one stays.
pub async fn change_password(
    state: &AppState,
    caller: &Caller,
    req: ChangePassword,
) -> ApiResult<Reply> {
    let user = state.db.users().get(&caller.username).await?;

    if !verify_password(&req.old_password, &user.password_hash) {
        return Err(ApiError::bad_request("Current password is incorrect"));
    }
    validate_password(&req.new_password)?;

    let hash = hash_password(&req.new_password)?;
    state.db.users().set_password_hash(&caller.username, &hash).await?;
    let revoked = state
        .db
        .sessions()
        .revoke_others(&caller.username, &caller.token_id)
        .await?;

    info!(username = %caller.username, revoked, "Password changed");
    reply_message("Password updated")
}
