use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use orgair_errors::OrgAirError;
use serde_json::{json, Value};

#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("服务错误: {0}")]
    OrgAir(#[from] OrgAirError),

    #[error("未找到资源")]
    NotFound,

    #[error("请求超时")]
    Timeout,

    #[error("内部服务器错误: {0}")]
    Internal(String),
}

impl ApiError {
    /// (状态码, 消息, 错误类型, 详情)
    fn parts(&self) -> (StatusCode, String, &'static str, Value) {
        match self {
            ApiError::OrgAir(OrgAirError::SectorNotFound { id }) => (
                StatusCode::NOT_FOUND,
                format!("行业配置 {id} 不存在"),
                "SECTOR_NOT_FOUND",
                json!({ "sector_id": id }),
            ),
            ApiError::OrgAir(OrgAirError::Contract {
                sector_id,
                violations,
            }) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                format!("行业配置 {sector_id} 违反合约"),
                "SECTOR_CONTRACT_VIOLATION",
                json!({
                    "sector_id": sector_id,
                    "violations": violations,
                }),
            ),
            ApiError::OrgAir(err @ OrgAirError::StoreUnavailable(_)) => (
                StatusCode::SERVICE_UNAVAILABLE,
                err.user_message().to_string(),
                "STORE_UNAVAILABLE",
                Value::Null,
            ),
            ApiError::OrgAir(err @ OrgAirError::StoreQuery(_)) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                err.user_message().to_string(),
                "STORE_ERROR",
                Value::Null,
            ),
            ApiError::OrgAir(err @ OrgAirError::Configuration(_)) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                err.user_message().to_string(),
                "CONFIGURATION_ERROR",
                Value::Null,
            ),
            ApiError::OrgAir(err) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                err.user_message().to_string(),
                "INTERNAL_ERROR",
                Value::Null,
            ),
            ApiError::NotFound => (
                StatusCode::NOT_FOUND,
                "请求的资源不存在".to_string(),
                "NOT_FOUND",
                Value::Null,
            ),
            ApiError::Timeout => (
                StatusCode::REQUEST_TIMEOUT,
                "请求处理超时".to_string(),
                "REQUEST_TIMEOUT",
                Value::Null,
            ),
            ApiError::Internal(_) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "系统遇到内部错误，请稍后重试".to_string(),
                "INTERNAL_ERROR",
                Value::Null,
            ),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, error_message, error_type, details) = self.parts();

        if status.is_server_error() {
            tracing::error!(error = %self, error_type, "请求处理失败");
        }

        let body = Json(json!({
            "error": {
                "message": error_message,
                "type": error_type,
                "code": status.as_u16(),
                "details": details,
                "timestamp": chrono::Utc::now().to_rfc3339(),
            }
        }));

        (status, body).into_response()
    }
}

pub type ApiResult<T> = Result<T, ApiError>;
