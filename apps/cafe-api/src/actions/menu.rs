//! Menu and seating reads, and manager menu management.

use tracing::info;

use cafe_core::action::{BatchUpdateMenuItems, MenuItemUpdate};

use super::{reply, Caller, Reply};
use crate::error::{ApiError, ApiResult};
use crate::state::AppState;

/// `menu`: available items in display order.
pub async fn public_menu(state: &AppState) -> ApiResult<Reply> {
    reply(state.db.menu().list_available().await?)
}

/// `locations`
pub async fn locations(state: &AppState) -> ApiResult<Reply> {
    reply(state.db.menu().locations().await?)
}

/// `getManagerMenu`: every item including unavailable ones.
pub async fn manager_menu(state: &AppState, caller: &Caller) -> ApiResult<Reply> {
    caller.require_manager("manage the menu")?;
    reply(state.db.menu().list_all().await?)
}

/// `updateMenuItem`
pub async fn update_item(state: &AppState, caller: &Caller, req: MenuItemUpdate) -> ApiResult<Reply> {
    caller.require_manager("manage the menu")?;
    if req.is_empty() {
        return Err(ApiError::bad_request("Nothing to update"));
    }

    let item = state.db.menu().apply_update(&req).await?;
    info!(by = %caller.username, item_id = %item.item_id, available = item.available, price = %item.price, "Menu item changed");
    reply(item)
}

/// `batchUpdateMenuItems`: all updates apply or none do.
pub async fn batch_update(
    state: &AppState,
    caller: &Caller,
    req: BatchUpdateMenuItems,
) -> ApiResult<Reply> {
    caller.require_manager("manage the menu")?;
    if req.updates.is_empty() || req.updates.iter().any(MenuItemUpdate::is_empty) {
        return Err(ApiError::bad_request("Every update must change at least one field"));
    }

    let updated = state.db.menu().apply_batch(&req.updates).await?;
    info!(by = %caller.username, updated, "Menu batch applied");
    reply(serde_json::json!({ "updated": updated }))
}
