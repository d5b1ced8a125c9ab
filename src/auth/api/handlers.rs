//! API请求处理器（轻量）

use axum::{
    extract::{rejection::JsonRejection, Json, State},
};
use serde_json::{json, Value};
use std::sync::Arc;
use tracing::info;

use crate::api::types::RestResponse;
use crate::auth::{
    errors::AuthError,
    gate::Principal,
    types::{AuthenticatedPrincipal, LoginRequest},
    AuthService,
};

/// 微信登录处理器
pub async fn login(
    State(service): State<Arc<AuthService>>,
    payload: Result<Json<LoginRequest>, JsonRejection>,
) -> Result<Json<RestResponse<String>>, AuthError> {
    let Json(req) = payload.map_err(|e| AuthError::ValidationError(e.body_text()))?;
    info!("API: 收到Login request");

    let token = service.login(&req.code).await?;
    Ok(Json(RestResponse::success(token)))
}

/// fetch当前principal处理器
pub async fn current_user(
    Principal(principal): Principal,
) -> Json<RestResponse<AuthenticatedPrincipal>> {
    Json(RestResponse::success(principal))
}

pub async fn health() -> Json<Value> {
    Json(json!({ "status": "ok" }))
}
