use rust_decimal::Decimal;
use serde::Serialize;
use thiserror::Error;

/// 单条合约违规，携带违规字段和具体取值
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "invariant", rename_all = "snake_case")]
pub enum ContractViolation {
    MissingField {
        field: String,
    },
    UnknownField {
        field: String,
    },
    InvalidType {
        field: String,
        expected: String,
        found: String,
    },
    FieldTooShort {
        field: String,
        min_length: usize,
        actual_length: usize,
        value: String,
    },
    NegativeWeight {
        dimension: String,
        weight: Decimal,
    },
    WeightSumOutOfTolerance {
        sum: Decimal,
        expected: Decimal,
        tolerance: Decimal,
    },
    MissingCalibrationKeys {
        keys: Vec<String>,
    },
}

impl ContractViolation {
    /// 违规对应的不变量名称
    pub fn invariant(&self) -> &'static str {
        match self {
            ContractViolation::MissingField { .. } => "missing_field",
            ContractViolation::UnknownField { .. } => "unknown_field",
            ContractViolation::InvalidType { .. } => "invalid_type",
            ContractViolation::FieldTooShort { .. } => "field_too_short",
            ContractViolation::NegativeWeight { .. } => "negative_weight",
            ContractViolation::WeightSumOutOfTolerance { .. } => "weight_sum_out_of_tolerance",
            ContractViolation::MissingCalibrationKeys { .. } => "missing_calibration_keys",
        }
    }
}

impl std::fmt::Display for ContractViolation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ContractViolation::MissingField { field } => write!(f, "缺少必填字段: {field}"),
            ContractViolation::UnknownField { field } => write!(f, "存在未声明的字段: {field}"),
            ContractViolation::InvalidType {
                field,
                expected,
                found,
            } => write!(f, "字段 {field} 类型无效: 期望 {expected}, 实际 {found}"),
            ContractViolation::FieldTooShort {
                field,
                min_length,
                actual_length,
                value,
            } => write!(
                f,
                "字段 {field} 长度不足: 最小 {min_length}, 实际 {actual_length} ('{value}')"
            ),
            ContractViolation::NegativeWeight { dimension, weight } => {
                write!(f, "维度 {dimension} 的权重为负数: {weight}")
            }
            ContractViolation::WeightSumOutOfTolerance {
                sum,
                expected,
                tolerance,
            } => write!(f, "维度权重之和 {sum} 超出 {expected} ± {tolerance}"),
            ContractViolation::MissingCalibrationKeys { keys } => {
                write!(f, "缺少必需的校准参数: {}", keys.join(", "))
            }
        }
    }
}

fn join_violations(violations: &[ContractViolation]) -> String {
    violations
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}

#[derive(Debug, Error)]
pub enum OrgAirError {
    #[error("行业配置未找到: {id}")]
    SectorNotFound { id: String },
    #[error("存储不可用: {0}")]
    StoreUnavailable(String),
    #[error("存储查询错误: {0}")]
    StoreQuery(String),
    #[error("行业配置 {sector_id} 违反合约: {}", join_violations(.violations))]
    Contract {
        sector_id: String,
        violations: Vec<ContractViolation>,
    },
    #[error("配置错误: {0}")]
    Configuration(String),
    #[error("序列化错误: {0}")]
    Serialization(String),
    #[error("缓存错误: {0}")]
    Cache(String),
    #[error("内部错误: {0}")]
    Internal(String),
}

pub type OrgAirResult<T> = Result<T, OrgAirError>;

impl OrgAirError {
    pub fn sector_not_found<S: Into<String>>(id: S) -> Self {
        Self::SectorNotFound { id: id.into() }
    }
    pub fn store_unavailable<S: Into<String>>(msg: S) -> Self {
        Self::StoreUnavailable(msg.into())
    }
    pub fn contract<S: Into<String>>(sector_id: S, violations: Vec<ContractViolation>) -> Self {
        Self::Contract {
            sector_id: sector_id.into(),
            violations,
        }
    }
    pub fn config_error<S: Into<String>>(msg: S) -> Self {
        Self::Configuration(msg.into())
    }
    pub fn is_store_unavailable(&self) -> bool {
        matches!(self, OrgAirError::StoreUnavailable(_))
    }
    pub fn is_store_error(&self) -> bool {
        matches!(
            self,
            OrgAirError::StoreUnavailable(_) | OrgAirError::StoreQuery(_)
        )
    }
    pub fn is_contract_violation(&self) -> bool {
        matches!(self, OrgAirError::Contract { .. })
    }
    pub fn violations(&self) -> &[ContractViolation] {
        match self {
            OrgAirError::Contract { violations, .. } => violations,
            _ => &[],
        }
    }
    pub fn user_message(&self) -> &str {
        match self {
            OrgAirError::SectorNotFound { .. } => "请求的行业配置不存在",
            OrgAirError::StoreUnavailable(_) => "配置存储暂不可用，请稍后重试",
            OrgAirError::Contract { .. } => "行业配置数据不符合合约，请联系数据维护人员",
            OrgAirError::Configuration(_) => "服务配置有误",
            _ => "系统繁忙，请稍后重试",
        }
    }
}

impl From<sqlx::Error> for OrgAirError {
    fn from(err: sqlx::Error) -> Self {
        match err {
            sqlx::Error::Configuration(_)
            | sqlx::Error::Io(_)
            | sqlx::Error::Tls(_)
            | sqlx::Error::PoolTimedOut
            | sqlx::Error::PoolClosed
            | sqlx::Error::WorkerCrashed => OrgAirError::StoreUnavailable(err.to_string()),
            other => OrgAirError::StoreQuery(other.to_string()),
        }
    }
}

impl From<serde_json::Error> for OrgAirError {
    fn from(err: serde_json::Error) -> Self {
        OrgAirError::Serialization(err.to_string())
    }
}

impl From<anyhow::Error> for OrgAirError {
    fn from(err: anyhow::Error) -> Self {
        OrgAirError::Internal(err.to_string())
    }
}

#[cfg(test)]
mod tests;
