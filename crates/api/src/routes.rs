use axum::{
    routing::{get, post},
    Router,
};
use metrics_exporter_prometheus::PrometheusHandle;
use orgair_application::SectorConfigService;
use orgair_config::AppSection;
use std::sync::Arc;

use crate::handlers::{
    cache::cache_stats,
    health::health_check,
    metrics::render_metrics,
    sectors::{get_sector, invalidate_all_sectors, invalidate_sector, list_sectors},
};

#[derive(Clone)]
pub struct AppState {
    pub sector_service: Arc<SectorConfigService>,
    pub app: AppSection,
    pub metrics_handle: Option<PrometheusHandle>,
}

impl AppState {
    pub fn new(sector_service: Arc<SectorConfigService>, app: AppSection) -> Self {
        Self {
            sector_service,
            app,
            metrics_handle: None,
        }
    }

    pub fn with_metrics(mut self, handle: PrometheusHandle) -> Self {
        self.metrics_handle = Some(handle);
        self
    }
}

/// 行业配置路由，挂载在版本前缀下
fn sector_routes() -> Router<AppState> {
    Router::new()
        .route("/sectors", get(list_sectors))
        .route("/sectors/invalidate", post(invalidate_all_sectors))
        .route("/sectors/{sector_id}", get(get_sector))
        .route("/sectors/{sector_id}/invalidate", post(invalidate_sector))
        .route("/cache/stats", get(cache_stats))
}

pub fn create_routes(state: AppState, prefix: &str, metrics_endpoint: Option<&str>) -> Router {
    let mut router = Router::new().route("/health", get(health_check));

    let prefix = prefix.trim_end_matches('/');
    router = if prefix.is_empty() {
        router.merge(sector_routes())
    } else {
        router.nest(prefix, sector_routes())
    };

    if let Some(endpoint) = metrics_endpoint {
        router = router.route(endpoint, get(render_metrics));
    }

    router.with_state(state)
}
