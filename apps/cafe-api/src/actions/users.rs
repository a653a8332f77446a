//! Staff account administration. Admin only.

use tracing::info;

use cafe_core::action::{AdminResetPassword, CreateUser, DeleteUser, UpdateUser};
use cafe_core::validation::{validate_name, validate_password, validate_username};
use cafe_core::Role;

use super::{reply, reply_message, Caller, Reply};
use crate::auth::hash_password;
use crate::error::{ApiError, ApiResult};
use crate::state::AppState;

/// `getUsers`
pub async fn list(state: &AppState, caller: &Caller) -> ApiResult<Reply> {
    caller.require_admin("list users")?;
    reply(state.db.users().list().await?)
}

/// `createUser`
pub async fn create(state: &AppState, caller: &Caller, req: CreateUser) -> ApiResult<Reply> {
    caller.require_admin("create users")?;

    let username = req.username.trim();
    validate_username(username)?;
    validate_name("name", &req.name)?;
    validate_password(&req.password)?;

    let hash = hash_password(&req.password)?;
    let profile = state
        .db
        .users()
        .insert(username, req.name.trim(), req.role, &hash)
        .await?;

    info!(by = %caller.username, username, role = %req.role, "Account created");
    reply(profile)
}

/// `updateUser`: name and/or role.
pub async fn update(state: &AppState, caller: &Caller, req: UpdateUser) -> ApiResult<Reply> {
    caller.require_admin("update users")?;

    if let Some(name) = &req.name {
        validate_name("name", name)?;
    }
    if req.target_username == caller.username && req.role.is_some_and(|role| role != Role::Admin) {
        return Err(ApiError::bad_request("You cannot remove your own admin role"));
    }

    let profile = state
        .db
        .users()
        .update_profile(&req.target_username, req.name.as_deref().map(str::trim), req.role)
        .await?;

    info!(by = %caller.username, username = %profile.username, role = %profile.role, "Account updated");
    reply(profile)
}

/// `deleteUser`: the account and all its sessions.
pub async fn delete(state: &AppState, caller: &Caller, req: DeleteUser) -> ApiResult<Reply> {
    caller.require_admin("delete users")?;

    if req.target_username == caller.username {
        return Err(ApiError::bad_request("You cannot delete your own account"));
    }

    state.db.users().delete(&req.target_username).await?;
    info!(by = %caller.username, username = %req.target_username, "Account deleted");
    reply_message("User deleted")
}

/// `adminResetPassword`: sets a new password and logs the target out
/// everywhere.
pub async fn reset_password(
    state: &AppState,
    caller: &Caller,
    req: AdminResetPassword,
) -> ApiResult<Reply> {
    caller.require_admin("reset passwords")?;
    validate_password(&req.new_password)?;

    let hash = hash_password(&req.new_password)?;
    state
        .db
        .users()
        .set_password_hash(&req.target_username, &hash)
        .await?;
    let revoked = state.db.sessions().revoke_all_for(&req.target_username).await?;

    info!(by = %caller.username, username = %req.target_username, revoked, "Password reset");
    reply_message("Password reset")
}
