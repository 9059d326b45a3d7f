use orgair_errors::OrgAirResult;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// 所有行业配置都必须具备的校准参数
pub const REQUIRED_CALIBRATION_KEYS: [&str; 4] = [
    "ebitda_multiplier",
    "h_r_baseline",
    "position_factor_delta",
    "talent_concentration_threshold",
];

/// 校准参数缺失时的回退值
pub mod defaults {
    use rust_decimal::Decimal;

    pub fn h_r_baseline() -> Decimal {
        Decimal::from(75)
    }

    pub fn ebitda_multiplier() -> Decimal {
        Decimal::ONE
    }

    pub fn position_factor_delta() -> Decimal {
        Decimal::new(15, 2)
    }

    pub fn talent_concentration_threshold() -> Decimal {
        Decimal::new(25, 2)
    }
}

/// 从存储加载的行业配置实体
///
/// 每次存储加载都会重新构建，缓存中保存的是它的序列化形式。
/// 权重和校准参数只记录存储中真实存在的行，默认值通过访问器提供。
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SectorConfig {
    pub focus_group_id: String,
    pub group_name: String,
    pub group_code: String,
    #[serde(default)]
    pub dimension_weights: BTreeMap<String, Decimal>,
    #[serde(default)]
    pub calibrations: BTreeMap<String, Decimal>,
}

impl SectorConfig {
    pub fn new(
        focus_group_id: impl Into<String>,
        group_name: impl Into<String>,
        group_code: impl Into<String>,
    ) -> Self {
        Self {
            focus_group_id: focus_group_id.into(),
            group_name: group_name.into(),
            group_code: group_code.into(),
            dimension_weights: BTreeMap::new(),
            calibrations: BTreeMap::new(),
        }
    }

    pub fn with_weight(mut self, dimension_code: impl Into<String>, weight: Decimal) -> Self {
        self.dimension_weights.insert(dimension_code.into(), weight);
        self
    }

    pub fn with_calibration(mut self, parameter: impl Into<String>, value: Decimal) -> Self {
        self.calibrations.insert(parameter.into(), value);
        self
    }

    /// 未配置的维度权重视为0
    pub fn dimension_weight(&self, dimension_code: &str) -> Decimal {
        self.dimension_weights
            .get(dimension_code)
            .copied()
            .unwrap_or(Decimal::ZERO)
    }

    pub fn calibration(&self, parameter: &str) -> Option<Decimal> {
        self.calibrations.get(parameter).copied()
    }

    pub fn h_r_baseline(&self) -> Decimal {
        self.calibration("h_r_baseline")
            .unwrap_or_else(defaults::h_r_baseline)
    }

    pub fn ebitda_multiplier(&self) -> Decimal {
        self.calibration("ebitda_multiplier")
            .unwrap_or_else(defaults::ebitda_multiplier)
    }

    pub fn position_factor_delta(&self) -> Decimal {
        self.calibration("position_factor_delta")
            .unwrap_or_else(defaults::position_factor_delta)
    }

    pub fn talent_concentration_threshold(&self) -> Decimal {
        self.calibration("talent_concentration_threshold")
            .unwrap_or_else(defaults::talent_concentration_threshold)
    }

    pub fn weights_sum(&self) -> Decimal {
        self.dimension_weights
            .values()
            .fold(Decimal::ZERO, |acc, weight| acc.saturating_add(*weight))
    }

    /// 转换为合约形状的载荷，交给校验器
    pub fn to_payload(&self) -> serde_json::Value {
        serde_json::json!({
            "sector_id": self.focus_group_id,
            "sector_name": self.group_name,
            "sector_code": self.group_code,
            "dimension_weights": decimal_map(&self.dimension_weights),
            "calibrations": decimal_map(&self.calibrations),
        })
    }

    /// 缓存使用的文本编码，十进制数以字符串保存以保留精度
    pub fn to_cache_value(&self) -> OrgAirResult<String> {
        Ok(serde_json::to_string(self)?)
    }

    pub fn from_cache_value(value: &str) -> OrgAirResult<Self> {
        Ok(serde_json::from_str(value)?)
    }
}

fn decimal_map(values: &BTreeMap<String, Decimal>) -> serde_json::Map<String, serde_json::Value> {
    values
        .iter()
        .map(|(key, value)| (key.clone(), serde_json::Value::String(value.to_string())))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    fn dec(value: &str) -> Decimal {
        Decimal::from_str(value).unwrap()
    }

    #[test]
    fn test_accessor_defaults() {
        let config = SectorConfig::new("pe_empty", "Empty", "EMPTY");

        assert_eq!(config.h_r_baseline(), Decimal::from(75));
        assert_eq!(config.ebitda_multiplier(), Decimal::ONE);
        assert_eq!(config.position_factor_delta(), dec("0.15"));
        assert_eq!(config.talent_concentration_threshold(), dec("0.25"));
        assert_eq!(config.dimension_weight("AI_GOV"), Decimal::ZERO);
        // 默认值不会写入映射
        assert!(config.calibrations.is_empty());
    }

    #[test]
    fn test_accessors_prefer_stored_values() {
        let config = SectorConfig::new("pe_technology", "Technology", "TECHNOLOGY")
            .with_weight("AI_GOV", dec("0.15"))
            .with_calibration("h_r_baseline", dec("82"));

        assert_eq!(config.h_r_baseline(), Decimal::from(82));
        assert_eq!(config.dimension_weight("AI_GOV"), dec("0.15"));
    }

    #[test]
    fn test_cache_value_preserves_decimal_scale() {
        let config = SectorConfig::new("pe_technology", "Technology", "TECHNOLOGY")
            .with_weight("TECH_STACK", dec("0.30"));

        let encoded = config.to_cache_value().unwrap();
        assert!(encoded.contains("\"0.30\""));

        let decoded = SectorConfig::from_cache_value(&encoded).unwrap();
        assert_eq!(decoded, config);
        assert_eq!(decoded.dimension_weights["TECH_STACK"].to_string(), "0.30");
    }

    #[test]
    fn test_cache_value_rejects_garbage() {
        assert!(SectorConfig::from_cache_value("{not json").is_err());
        assert!(SectorConfig::from_cache_value(r#"{"focus_group_id":"x"}"#).is_err());
    }

    #[test]
    fn test_payload_uses_contract_field_names() {
        let payload = SectorConfig::new("pe_technology", "Technology", "TECHNOLOGY")
            .with_weight("AI_GOV", dec("0.15"))
            .to_payload();

        assert_eq!(payload["sector_id"], "pe_technology");
        assert_eq!(payload["sector_code"], "TECHNOLOGY");
        assert_eq!(payload["dimension_weights"]["AI_GOV"], "0.15");
        assert!(payload["calibrations"].as_object().unwrap().is_empty());
    }
}
