use crate::api::server_config::*;
use crate::api::types::RestResponse;
use crate::auth::{create_auth_routes, AuthError, AuthService};
use axum::{
    error_handling::HandleErrorLayer,
    http::{header, HeaderValue, Method, StatusCode},
    Json, Router,
};
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpListener;
use tower::{limit::ConcurrencyLimitLayer, timeout::TimeoutLayer, BoxError, ServiceBuilder};
use tower_http::{
    cors::{AllowOrigin, CorsLayer},
    limit::RequestBodyLimitLayer,
    trace::TraceLayer,
};

#[derive(Clone)]
pub struct AuthServer {
    pub service: Arc<AuthService>,
    pub host: String,
    pub port: u16,
}

impl AuthServer {
    pub fn new(service: Arc<AuthService>) -> Self {
        let host = service.config().server.host.clone();
        let port = service.config().server.port;
        Self { service, host, port }
    }

    fn cors_layer(origins: &str) -> Result<CorsLayer, AuthError> {
        let base = CorsLayer::new()
            .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
            .allow_headers([header::AUTHORIZATION, header::CONTENT_TYPE, header::ACCEPT, header::ORIGIN])
            .max_age(CORS_MAX_AGE);

        if origins.trim() == "*" {
            // credentials cannot be combined with a wildcard origin
            return Ok(base.allow_origin(AllowOrigin::any()));
        }

        let list = origins
            .split(',')
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(|s| {
                HeaderValue::from_str(s)
                    .map_err(|_| AuthError::Configuration(format!("invalid CORS origin: {}", s)))
            })
            .collect::<Result<Vec<_>, _>>()?;

        Ok(base.allow_origin(AllowOrigin::list(list)).allow_credentials(true))
    }

    pub fn create_router(&self) -> Result<Router, AuthError> {
        let server_config = &self.service.config().server;
        tracing::info!("CORS configured to allow origin: {}", server_config.cors_allow_origin);

        let cors = Self::cors_layer(&server_config.cors_allow_origin)?;
        let timeout = Duration::from_secs(server_config.request_timeout_secs.max(1));

        Ok(create_auth_routes(self.service.clone())
            .layer(
                ServiceBuilder::new()
                    // Convert middleware errors (timeout/overload) into HTTP responses
                    .layer(HandleErrorLayer::new(|err: BoxError| async move {
                        if err.is::<tower::timeout::error::Elapsed>() {
                            (
                                StatusCode::REQUEST_TIMEOUT,
                                Json(RestResponse::<()>::failure(408, "request timed out")),
                            )
                        } else {
                            (
                                StatusCode::SERVICE_UNAVAILABLE,
                                Json(RestResponse::<()>::failure(503, "service overloaded")),
                            )
                        }
                    }))
                    .layer(ConcurrencyLimitLayer::new(MAX_CONCURRENCY))
                    .layer(RequestBodyLimitLayer::new(server_config.max_body_bytes))
                    .layer(TimeoutLayer::new(timeout))
                    .layer(TraceLayer::new_for_http()),
            )
            .layer(cors))
    }

    pub async fn start(self) -> Result<(), anyhow::Error> {
        let app = self.create_router()?;
        let addr = format!("{}:{}", self.host, self.port);
        tracing::info!("Server listening on {}", addr);
        let listener = TcpListener::bind(&addr).await?;
        axum::serve(listener, app.into_make_service()).await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cors_origin_parsing() {
        assert!(AuthServer::cors_layer("http://localhost:3000").is_ok());
        assert!(AuthServer::cors_layer("http://a.example, http://b.example").is_ok());
        assert!(AuthServer::cors_layer("*").is_ok());
        assert!(matches!(
            AuthServer::cors_layer("http://bad\norigin"),
            Err(AuthError::Configuration(_))
        ));
    }
}
