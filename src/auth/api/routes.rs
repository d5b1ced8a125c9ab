//! API路由定义

use axum::{
    middleware,
    routing::{get, post},
    Router,
};
use std::sync::Arc;

use crate::auth::{gate, AuthService};
use super::handlers;

/// 创建认证路由
///
/// The bearer gate wraps every route, login included.
pub fn create_auth_routes(service: Arc<AuthService>) -> Router {
    Router::new()
        // 登录
        .route("/api/auth/login", post(handlers::login))

        // 需要认证
        .route("/api/user/me", get(handlers::current_user))

        // 健康检查
        .route("/api/health", get(handlers::health))

        .layer(middleware::from_fn_with_state(
            service.token_service(),
            gate::authenticate,
        ))
        .with_state(service)
}
