//! Newsletter sign-up from the public site.

use cafe_core::action::Newsletter;
use cafe_core::validation::validate_email;

use super::{check_public_key, reply_message, Reply};
use crate::error::ApiResult;
use crate::state::AppState;

/// `newsletter`: idempotent, a second sign-up for the same address
/// succeeds without creating a row.
pub async fn subscribe(state: &AppState, req: Newsletter) -> ApiResult<Reply> {
    check_public_key(state, req.secret.as_deref())?;

    let email = req.email.trim();
    validate_email(email)?;

    if state.db.newsletter().subscribe(email).await? {
        reply_message("Subscribed")
    } else {
        reply_message("Already subscribed")
    }
}
