//! HTTP surface of the sector configuration service
//!
//! 只读的行业配置查询、缓存失效和运维端点，所有响应使用统一的 `ApiResponse` 信封。

pub mod error;
pub mod handlers;
pub mod middleware;
pub mod response;
pub mod routes;

use axum::Router;
use orgair_config::{ApiConfig, ObservabilityConfig};
use std::time::Duration;
use tower::ServiceBuilder;

pub use error::{ApiError, ApiResult};
pub use routes::{create_routes, AppState};

pub fn create_app(state: AppState, api: &ApiConfig, observability: &ObservabilityConfig) -> Router {
    let metrics_endpoint = if observability.metrics_enabled && state.metrics_handle.is_some() {
        Some(observability.metrics_endpoint.as_str())
    } else {
        None
    };

    let mut app = create_routes(state, &api.prefix, metrics_endpoint).layer(
        ServiceBuilder::new()
            .layer(middleware::trace_layer())
            .layer(axum::middleware::from_fn(middleware::correlation_id))
            .layer(axum::middleware::from_fn(middleware::request_logging))
            .layer(axum::middleware::from_fn_with_state(
                Duration::from_secs(api.request_timeout_seconds),
                middleware::request_timeout,
            )),
    );

    if api.cors_enabled {
        app = app.layer(middleware::cors_layer(api));
    }

    app
}
