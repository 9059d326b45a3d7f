use axum::{
    extract::State,
    http::header,
    response::IntoResponse,
};

use crate::{
    error::{ApiError, ApiResult},
    routes::AppState,
};

const PROMETHEUS_CONTENT_TYPE: &str = "text/plain; version=0.0.4";

/// Prometheus 文本格式导出
pub async fn render_metrics(State(state): State<AppState>) -> ApiResult<impl IntoResponse> {
    let handle = state.metrics_handle.as_ref().ok_or(ApiError::NotFound)?;
    Ok((
        [(header::CONTENT_TYPE, PROMETHEUS_CONTENT_TYPE)],
        handle.render(),
    ))
}
