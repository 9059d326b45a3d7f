use orgair_domain::{
    ContractViolation, SectorConfig, StoreAccessPort, StoreRow, StoreValue, SECTOR_CODE,
    SECTOR_ID, SECTOR_NAME,
};
use orgair_errors::{OrgAirError, OrgAirResult};
use rust_decimal::Decimal;
use std::collections::BTreeMap;
use std::sync::Arc;
use tracing::{debug, error, info, warn};

use crate::queries;

/// 行业配置组装器 - 通过三次查询从存储构建行业配置实体
///
/// 只做行到实体的映射，不做缓存，也不做合约校验。
pub struct SectorConfigAssembler {
    store: Arc<dyn StoreAccessPort>,
    platform: String,
}

impl SectorConfigAssembler {
    pub fn new(store: Arc<dyn StoreAccessPort>, platform: impl Into<String>) -> Self {
        Self {
            store,
            platform: platform.into(),
        }
    }

    pub fn platform(&self) -> &str {
        &self.platform
    }

    /// 组装单个行业配置
    ///
    /// 行业不存在或未启用时返回 `Ok(None)`；无法转换的行视为数据违约。
    pub async fn assemble(&self, focus_group_id: &str) -> OrgAirResult<Option<SectorConfig>> {
        let params = [
            StoreValue::from(focus_group_id),
            StoreValue::from(self.platform.as_str()),
        ];
        let Some(identity) = self
            .store
            .fetch_one(queries::FOCUS_GROUP_BY_ID, &params)
            .await?
        else {
            debug!(sector_id = focus_group_id, "行业不存在或未启用");
            return Ok(None);
        };

        let mut violations = Vec::new();
        let sector_id = text_column(&identity, "focus_group_id", SECTOR_ID, &mut violations);
        let sector_name = text_column(&identity, "group_name", SECTOR_NAME, &mut violations);
        let sector_code = text_column(&identity, "group_code", SECTOR_CODE, &mut violations);

        let id_param = [StoreValue::from(focus_group_id)];
        let weight_rows = self
            .store
            .fetch_many(queries::DIMENSION_WEIGHTS, &id_param)
            .await?;
        let dimension_weights = fold_decimal_rows(
            &weight_rows,
            "dimension_code",
            "weight",
            "dimension_weights",
            &mut violations,
        );

        let calibration_rows = self
            .store
            .fetch_many(queries::CALIBRATIONS, &id_param)
            .await?;
        let calibrations = fold_decimal_rows(
            &calibration_rows,
            "parameter_name",
            "parameter_value",
            "calibrations",
            &mut violations,
        );

        if !violations.is_empty() {
            return Err(OrgAirError::contract(focus_group_id, violations));
        }

        debug!(
            sector_id = focus_group_id,
            weights = dimension_weights.len(),
            calibrations = calibrations.len(),
            "行业配置组装完成"
        );

        Ok(Some(SectorConfig {
            focus_group_id: sector_id,
            group_name: sector_name,
            group_code: sector_code,
            dimension_weights,
            calibrations,
        }))
    }

    /// 按展示顺序列出所有启用行业的 id
    pub async fn active_sector_ids(&self) -> OrgAirResult<Vec<String>> {
        let rows = self
            .store
            .fetch_many(
                queries::ACTIVE_FOCUS_GROUPS,
                &[StoreValue::from(self.platform.as_str())],
            )
            .await?;

        let mut ids = Vec::with_capacity(rows.len());
        for row in &rows {
            match row.get("focus_group_id").and_then(StoreValue::as_text) {
                Some(focus_group_id) => ids.push(focus_group_id.to_string()),
                None => warn!("行业列表中存在无效的focus_group_id，跳过"),
            }
        }

        Ok(ids)
    }

    /// 按展示顺序组装所有启用的行业配置
    ///
    /// 列表查询失败直接返回错误；单个行业失败只记录日志并跳过。
    pub async fn assemble_all(&self) -> OrgAirResult<Vec<SectorConfig>> {
        let ids = self.active_sector_ids().await?;

        let mut configs = Vec::with_capacity(ids.len());
        let mut skipped = 0;

        for focus_group_id in &ids {
            match self.assemble(focus_group_id).await {
                Ok(Some(config)) => configs.push(config),
                Ok(None) => {
                    // 列表查询与单项查询之间被停用
                    debug!(sector_id = %focus_group_id, "行业已不可用，跳过");
                    skipped += 1;
                }
                Err(e) if e.is_store_unavailable() => {
                    warn!(sector_id = %focus_group_id, error = %e, "sector_config_db_unavailable");
                    skipped += 1;
                }
                Err(e) => {
                    error!(sector_id = %focus_group_id, error = %e, "行业配置组装失败，跳过");
                    skipped += 1;
                }
            }
        }

        info!(
            "行业配置批量组装完成: 总计 {} 个，成功 {} 个，跳过 {} 个",
            ids.len(),
            configs.len(),
            skipped
        );

        Ok(configs)
    }
}

fn describe(value: Option<&StoreValue>) -> String {
    match value {
        None => "missing column".to_string(),
        Some(StoreValue::Text(text)) => format!("text '{text}'"),
        Some(other) => format!("{} {other}", other.type_name()),
    }
}

fn text_column(
    row: &StoreRow,
    column: &str,
    field: &str,
    violations: &mut Vec<ContractViolation>,
) -> String {
    match row.get(column) {
        Some(StoreValue::Text(text)) => text.clone(),
        None | Some(StoreValue::Null) => {
            violations.push(ContractViolation::MissingField {
                field: field.to_string(),
            });
            String::new()
        }
        other => {
            violations.push(ContractViolation::InvalidType {
                field: field.to_string(),
                expected: "string".to_string(),
                found: describe(other),
            });
            String::new()
        }
    }
}

/// 将 (键, 值) 行折叠为映射，重复键以结果顺序中最后一行为准
fn fold_decimal_rows(
    rows: &[StoreRow],
    key_column: &str,
    value_column: &str,
    field: &str,
    violations: &mut Vec<ContractViolation>,
) -> BTreeMap<String, Decimal> {
    let mut values = BTreeMap::new();

    for row in rows {
        let Some(key) = row.get(key_column).and_then(StoreValue::as_text) else {
            violations.push(ContractViolation::InvalidType {
                field: format!("{field}.{key_column}"),
                expected: "string".to_string(),
                found: describe(row.get(key_column)),
            });
            continue;
        };

        let value = row.get(value_column);
        match value.and_then(StoreValue::to_decimal) {
            Some(decimal) => {
                values.insert(key.to_string(), decimal);
            }
            None => violations.push(ContractViolation::InvalidType {
                field: format!("{field}.{key}"),
                expected: "decimal".to_string(),
                found: describe(value),
            }),
        }
    }

    values
}
