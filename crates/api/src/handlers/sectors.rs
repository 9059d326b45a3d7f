use axum::{
    extract::{Path, State},
    response::IntoResponse,
};
use orgair_domain::{OrgAirError, SectorConfigContract};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::{
    error::{ApiError, ApiResult},
    response::{success, success_with_message},
    routes::AppState,
};

/// 对外的合约视图，十进制数一律渲染为字符串
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SectorView {
    pub sector_id: String,
    pub sector_name: String,
    pub sector_code: String,
    pub dimension_weights: BTreeMap<String, String>,
    pub calibrations: BTreeMap<String, String>,
    pub weights_sum: String,
}

impl From<&SectorConfigContract> for SectorView {
    fn from(contract: &SectorConfigContract) -> Self {
        let render = |values: &BTreeMap<String, Decimal>| -> BTreeMap<String, String> {
            values
                .iter()
                .map(|(key, value)| (key.clone(), value.to_string()))
                .collect()
        };

        Self {
            sector_id: contract.sector_id().to_string(),
            sector_name: contract.sector_name().to_string(),
            sector_code: contract.sector_code().to_string(),
            dimension_weights: render(contract.dimension_weights()),
            calibrations: render(contract.calibrations()),
            weights_sum: contract.weights_sum().to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InvalidationResult {
    pub sector_id: Option<String>,
    pub removed: usize,
}

pub async fn list_sectors(State(state): State<AppState>) -> ApiResult<impl IntoResponse> {
    let contracts = state.sector_service.get_all().await?;
    let views: Vec<SectorView> = contracts.iter().map(SectorView::from).collect();
    Ok(success(views))
}

pub async fn get_sector(
    State(state): State<AppState>,
    Path(sector_id): Path<String>,
) -> ApiResult<impl IntoResponse> {
    match state.sector_service.get(&sector_id).await? {
        Some(contract) => Ok(success(SectorView::from(&contract))),
        None => Err(ApiError::from(OrgAirError::sector_not_found(sector_id))),
    }
}

pub async fn invalidate_sector(
    State(state): State<AppState>,
    Path(sector_id): Path<String>,
) -> impl IntoResponse {
    let removed = state.sector_service.invalidate(Some(&sector_id));
    success_with_message(
        InvalidationResult {
            sector_id: Some(sector_id.clone()),
            removed,
        },
        format!("行业配置 {sector_id} 的缓存已失效"),
    )
}

pub async fn invalidate_all_sectors(State(state): State<AppState>) -> impl IntoResponse {
    let removed = state.sector_service.invalidate(None);
    success_with_message(
        InvalidationResult {
            sector_id: None,
            removed,
        },
        "行业配置列表缓存已失效",
    )
}
