//! HTTP surface: `/exec` and `/health`.
//!
//! ## Request Decoding
//! ```text
//! GET  /exec?action=orders&token=…
//!      └─► ReadAction ─► actions::read
//!
//! POST /exec?action=closeOrder          (body is JSON, any content type)
//!      { "action": "closeOrder", "token": "…", "orderId": "…", … }
//!      │
//!      ├─ token:  Authorization header > body "token" > query "token"
//!      ├─ action: body "action", else query "action"
//!      └─► ActionRequest ─► actions::execute
//! ```
//!
//! The browser client posts with `text/plain` to avoid a CORS preflight,
//! so the body is read as a string rather than through the `Json`
//! extractor.

use axum::extract::{Query, State};
use axum::http::{header, HeaderMap, HeaderValue, Method};
use axum::routing::get;
use axum::{Json, Router};
use serde::Deserialize;
use serde_json::{json, Value};
use tower_http::cors::{AllowOrigin, Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::warn;

use cafe_core::action::{ActionRequest, ReadAction};

use crate::actions::{self, Reply};
use crate::auth::extract_bearer_token;
use crate::error::{ApiError, ApiResult};
use crate::state::AppState;

/// Query string of `/exec`.
#[derive(Debug, Default, Deserialize)]
pub struct ExecQuery {
    pub action: Option<String>,
    pub token: Option<String>,
}

/// Builds the application router.
pub fn build_router(state: AppState) -> Router {
    let cors = cors_layer(&state.config.cors_origins);

    Router::new()
        .route("/exec", get(exec_get).post(exec_post))
        .route("/health", get(health))
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}

fn cors_layer(origins: &[String]) -> CorsLayer {
    let layer = CorsLayer::new()
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers([header::CONTENT_TYPE, header::AUTHORIZATION]);

    if origins.is_empty() {
        return layer.allow_origin(Any);
    }

    let allowed: Vec<HeaderValue> = origins
        .iter()
        .filter_map(|origin| match HeaderValue::from_str(origin.trim()) {
            Ok(value) => Some(value),
            Err(_) => {
                warn!(origin, "Ignoring malformed CORS origin");
                None
            }
        })
        .collect();

    layer.allow_origin(AllowOrigin::list(allowed))
}

async fn exec_get(
    State(state): State<AppState>,
    Query(query): Query<ExecQuery>,
    headers: HeaderMap,
) -> ApiResult<Json<Reply>> {
    let name = query
        .action
        .as_deref()
        .ok_or_else(|| ApiError::bad_request("Missing action"))?;

    let action: ReadAction = serde_json::from_value(Value::String(name.to_string()))
        .map_err(|_| ApiError::bad_request(format!("Unknown action: {}", name)))?;

    let token = header_token(&headers).or(query.token.as_deref());
    actions::read(&state, action, token).await.map(Json)
}

async fn exec_post(
    State(state): State<AppState>,
    Query(query): Query<ExecQuery>,
    headers: HeaderMap,
    body: String,
) -> ApiResult<Json<Reply>> {
    let mut payload: Value = if body.trim().is_empty() {
        json!({})
    } else {
        serde_json::from_str(&body)
            .map_err(|e| ApiError::bad_request(format!("Invalid JSON body: {}", e)))?
    };

    let fields = payload
        .as_object_mut()
        .ok_or_else(|| ApiError::bad_request("Request body must be a JSON object"))?;

    let body_token = match fields.remove("token") {
        Some(Value::String(token)) if !token.is_empty() => Some(token),
        _ => None,
    };

    if !fields.contains_key("action") {
        let name = query
            .action
            .clone()
            .ok_or_else(|| ApiError::bad_request("Missing action"))?;
        fields.insert("action".to_string(), Value::String(name));
    }

    let request: ActionRequest = serde_json::from_value(payload)
        .map_err(|e| ApiError::bad_request(format!("Invalid request: {}", e)))?;

    let token = header_token(&headers)
        .or(body_token.as_deref())
        .or(query.token.as_deref());

    actions::execute(&state, request, token).await.map(Json)
}

async fn health(State(state): State<AppState>) -> Json<Value> {
    let database = state.db.health_check().await;
    Json(json!({
        "status": if database { "ok" } else { "degraded" },
        "database": database,
        "version": env!("CARGO_PKG_VERSION"),
    }))
}

fn header_token(headers: &HeaderMap) -> Option<&str> {
    headers
        .get(header::AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .and_then(extract_bearer_token)
}
