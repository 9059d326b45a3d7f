use axum::{extract::State, response::IntoResponse};
use serde::{Deserialize, Serialize};

use crate::{response::success, routes::AppState};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheStatsView {
    pub hits: u64,
    pub misses: u64,
    pub sets: u64,
    pub deletes: u64,
    pub expirations: u64,
    pub entries: usize,
    pub hit_rate: f64,
    pub miss_rate: f64,
    pub ttl_seconds: u64,
}

pub async fn cache_stats(State(state): State<AppState>) -> impl IntoResponse {
    let stats = state.sector_service.cache_stats();
    success(CacheStatsView {
        hits: stats.hits,
        misses: stats.misses,
        sets: stats.sets,
        deletes: stats.deletes,
        expirations: stats.expirations,
        entries: stats.entries,
        hit_rate: stats.hit_rate(),
        miss_rate: stats.miss_rate(),
        ttl_seconds: state.sector_service.ttl().as_secs(),
    })
}
