use orgair_errors::{ContractViolation, OrgAirError};
use rust_decimal::Decimal;
use serde_json::{Map, Value};
use std::collections::BTreeMap;
use thiserror::Error;

use crate::contract::*;
use crate::entities::{SectorConfig, REQUIRED_CALIBRATION_KEYS};
use crate::ports::store::parse_decimal;

pub const SECTOR_ID_MIN_LENGTH: usize = 3;
pub const SECTOR_NAME_MIN_LENGTH: usize = 1;
pub const SECTOR_CODE_MIN_LENGTH: usize = 2;

/// 权重之和的期望值
pub fn weight_sum_target() -> Decimal {
    Decimal::ONE
}

/// 权重之和允许的绝对误差（含边界）
pub fn weight_sum_tolerance() -> Decimal {
    Decimal::new(1, 3)
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("合约校验失败: {}", describe(.violations))]
pub struct ValidationFailure {
    pub violations: Vec<ContractViolation>,
}

fn describe(violations: &[ContractViolation]) -> String {
    violations
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}

impl ValidationFailure {
    fn new(violations: Vec<ContractViolation>) -> Self {
        Self { violations }
    }

    pub fn into_error(self, sector_id: impl Into<String>) -> OrgAirError {
        OrgAirError::contract(sector_id, self.violations)
    }
}

/// Stateless contract validator.
///
/// Checks run in order: payload shape, field lengths, weight sum, required
/// calibration keys. A shape failure stops validation since the later checks
/// would have nothing typed to look at; the remaining checks are all reported
/// together.
pub struct ContractValidator;

impl ContractValidator {
    pub fn validate(payload: &Value) -> Result<SectorConfigContract, ValidationFailure> {
        let shape = Self::check_shape(payload).map_err(ValidationFailure::new)?;

        let mut violations = Vec::new();
        Self::check_lengths(&shape, &mut violations);
        Self::check_weights(&shape.dimension_weights, &mut violations);
        Self::check_calibrations(&shape.calibrations, &mut violations);

        if !violations.is_empty() {
            return Err(ValidationFailure::new(violations));
        }

        Ok(SectorConfigContract::new(
            shape.sector_id,
            shape.sector_name,
            shape.sector_code,
            shape.dimension_weights,
            shape.calibrations,
        ))
    }

    pub fn validate_entity(
        entity: &SectorConfig,
    ) -> Result<SectorConfigContract, ValidationFailure> {
        Self::validate(&entity.to_payload())
    }

    fn check_shape(payload: &Value) -> Result<Shape, Vec<ContractViolation>> {
        let object = payload.as_object().ok_or_else(|| {
            vec![ContractViolation::InvalidType {
                field: "$".to_string(),
                expected: "object".to_string(),
                found: json_type(payload).to_string(),
            }]
        })?;

        let mut violations = Vec::new();

        for key in object.keys() {
            if !CONTRACT_FIELDS.contains(&key.as_str()) {
                violations.push(ContractViolation::UnknownField { field: key.clone() });
            }
        }

        let sector_id = string_field(object, SECTOR_ID, &mut violations);
        let sector_name = string_field(object, SECTOR_NAME, &mut violations);
        let sector_code = string_field(object, SECTOR_CODE, &mut violations);
        let dimension_weights = decimal_map_field(object, DIMENSION_WEIGHTS, &mut violations);
        let calibrations = decimal_map_field(object, CALIBRATIONS, &mut violations);

        match (
            sector_id,
            sector_name,
            sector_code,
            dimension_weights,
            calibrations,
        ) {
            (
                Some(sector_id),
                Some(sector_name),
                Some(sector_code),
                Some(dimension_weights),
                Some(calibrations),
            ) if violations.is_empty() => Ok(Shape {
                sector_id,
                sector_name,
                sector_code,
                dimension_weights,
                calibrations,
            }),
            _ => Err(violations),
        }
    }

    fn check_lengths(shape: &Shape, violations: &mut Vec<ContractViolation>) {
        let fields = [
            (SECTOR_ID, &shape.sector_id, SECTOR_ID_MIN_LENGTH),
            (SECTOR_NAME, &shape.sector_name, SECTOR_NAME_MIN_LENGTH),
            (SECTOR_CODE, &shape.sector_code, SECTOR_CODE_MIN_LENGTH),
        ];

        for (field, value, min_length) in fields {
            let actual_length = value.chars().count();
            if actual_length < min_length {
                violations.push(ContractViolation::FieldTooShort {
                    field: field.to_string(),
                    min_length,
                    actual_length,
                    value: value.clone(),
                });
            }
        }
    }

    fn check_weights(weights: &BTreeMap<String, Decimal>, violations: &mut Vec<ContractViolation>) {
        for (dimension, weight) in weights {
            if weight.is_sign_negative() && !weight.is_zero() {
                violations.push(ContractViolation::NegativeWeight {
                    dimension: dimension.clone(),
                    weight: *weight,
                });
            }
        }

        // 溢出时按饱和值报告，不能 panic
        let checked_sum = weights
            .values()
            .try_fold(Decimal::ZERO, |acc, weight| acc.checked_add(*weight));
        let within_tolerance = checked_sum
            .and_then(|sum| sum.checked_sub(weight_sum_target()))
            .is_some_and(|delta| delta.abs() <= weight_sum_tolerance());

        if !within_tolerance {
            let sum = checked_sum.unwrap_or_else(|| {
                weights
                    .values()
                    .fold(Decimal::ZERO, |acc, weight| acc.saturating_add(*weight))
            });
            violations.push(ContractViolation::WeightSumOutOfTolerance {
                sum,
                expected: weight_sum_target(),
                tolerance: weight_sum_tolerance(),
            });
        }
    }

    fn check_calibrations(
        calibrations: &BTreeMap<String, Decimal>,
        violations: &mut Vec<ContractViolation>,
    ) {
        let missing: Vec<String> = REQUIRED_CALIBRATION_KEYS
            .iter()
            .filter(|key| !calibrations.contains_key(**key))
            .map(|key| key.to_string())
            .collect();

        if !missing.is_empty() {
            violations.push(ContractViolation::MissingCalibrationKeys { keys: missing });
        }
    }
}

struct Shape {
    sector_id: String,
    sector_name: String,
    sector_code: String,
    dimension_weights: BTreeMap<String, Decimal>,
    calibrations: BTreeMap<String, Decimal>,
}

fn json_type(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

fn string_field(
    object: &Map<String, Value>,
    field: &str,
    violations: &mut Vec<ContractViolation>,
) -> Option<String> {
    match object.get(field) {
        None | Some(Value::Null) => {
            violations.push(ContractViolation::MissingField {
                field: field.to_string(),
            });
            None
        }
        Some(Value::String(value)) => Some(value.clone()),
        Some(other) => {
            violations.push(ContractViolation::InvalidType {
                field: field.to_string(),
                expected: "string".to_string(),
                found: json_type(other).to_string(),
            });
            None
        }
    }
}

fn decimal_map_field(
    object: &Map<String, Value>,
    field: &str,
    violations: &mut Vec<ContractViolation>,
) -> Option<BTreeMap<String, Decimal>> {
    let entries = match object.get(field) {
        None | Some(Value::Null) => {
            violations.push(ContractViolation::MissingField {
                field: field.to_string(),
            });
            return None;
        }
        Some(Value::Object(entries)) => entries,
        Some(other) => {
            violations.push(ContractViolation::InvalidType {
                field: field.to_string(),
                expected: "object".to_string(),
                found: json_type(other).to_string(),
            });
            return None;
        }
    };

    let mut values = BTreeMap::new();
    let mut valid = true;
    for (key, value) in entries {
        let parsed = match value {
            Value::String(text) => parse_decimal(text.trim()),
            Value::Number(number) => parse_decimal(&number.to_string()),
            _ => None,
        };

        match parsed {
            Some(decimal) => {
                values.insert(key.clone(), decimal);
            }
            None => {
                valid = false;
                violations.push(ContractViolation::InvalidType {
                    field: format!("{field}.{key}"),
                    expected: "decimal".to_string(),
                    found: match value {
                        Value::String(text) => format!("string '{text}'"),
                        other => json_type(other).to_string(),
                    },
                });
            }
        }
    }

    valid.then_some(values)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::str::FromStr;

    fn dec(value: &str) -> Decimal {
        Decimal::from_str(value).unwrap()
    }

    fn calibrations() -> Value {
        json!({
            "h_r_baseline": "75",
            "ebitda_multiplier": "1.0",
            "position_factor_delta": "0.15",
            "talent_concentration_threshold": "0.25",
        })
    }

    fn payload_with_weights(weights: Value) -> Value {
        json!({
            "sector_id": "pe_technology",
            "sector_name": "Technology",
            "sector_code": "TECHNOLOGY",
            "dimension_weights": weights,
            "calibrations": calibrations(),
        })
    }

    fn technology_payload() -> Value {
        payload_with_weights(json!({
            "AI_GOV": "0.15",
            "TECH_STACK": "0.30",
            "TALENT": "0.20",
            "LEADERSHIP": "0.10",
            "USE_CASES": "0.15",
            "CULTURE": "0.10",
        }))
    }

    #[test]
    fn test_technology_payload_is_valid() {
        let contract = ContractValidator::validate(&technology_payload()).unwrap();

        assert_eq!(contract.sector_id(), "pe_technology");
        assert_eq!(contract.weights_sum(), dec("1.00"));
        assert_eq!(contract.dimension_weight("TECH_STACK"), dec("0.30"));
        assert_eq!(contract.h_r_baseline(), Decimal::from(75));
    }

    #[test]
    fn test_weight_sum_inside_tolerance_passes() {
        let payload = payload_with_weights(json!({"A": "0.5", "B": "0.5005"}));
        assert!(ContractValidator::validate(&payload).is_ok());
    }

    #[test]
    fn test_weight_sum_on_tolerance_boundary_passes() {
        let payload = payload_with_weights(json!({"A": "0.5", "B": "0.499"}));
        assert!(ContractValidator::validate(&payload).is_ok());
    }

    #[test]
    fn test_weight_sum_outside_tolerance_fails() {
        let payload = payload_with_weights(json!({"A": "0.5", "B": "0.5011"}));
        let failure = ContractValidator::validate(&payload).unwrap_err();

        assert_eq!(
            failure.violations,
            vec![ContractViolation::WeightSumOutOfTolerance {
                sum: dec("1.0011"),
                expected: Decimal::ONE,
                tolerance: dec("0.001"),
            }]
        );
    }

    #[test]
    fn test_empty_weights_fail_sum_check() {
        let payload = payload_with_weights(json!({}));
        let failure = ContractValidator::validate(&payload).unwrap_err();
        assert_eq!(failure.violations[0].invariant(), "weight_sum_out_of_tolerance");
    }

    #[test]
    fn test_json_numbers_are_accepted_as_decimals() {
        let payload = payload_with_weights(json!({"A": 0.25, "B": 0.75}));
        let contract = ContractValidator::validate(&payload).unwrap();
        assert_eq!(contract.dimension_weight("A"), dec("0.25"));
    }

    #[test]
    fn test_missing_calibration_key_is_named() {
        let mut payload = technology_payload();
        payload["calibrations"]
            .as_object_mut()
            .unwrap()
            .remove("talent_concentration_threshold");

        let failure = ContractValidator::validate(&payload).unwrap_err();
        assert_eq!(
            failure.violations,
            vec![ContractViolation::MissingCalibrationKeys {
                keys: vec!["talent_concentration_threshold".to_string()],
            }]
        );
        assert!(failure.to_string().contains("talent_concentration_threshold"));
    }

    #[test]
    fn test_extra_calibration_keys_are_allowed() {
        let mut payload = technology_payload();
        payload["calibrations"]["sector_premium"] = json!("0.05");

        let contract = ContractValidator::validate(&payload).unwrap();
        assert_eq!(contract.calibrations().len(), 5);
    }

    #[test]
    fn test_short_fields_are_all_reported() {
        let mut payload = technology_payload();
        payload["sector_id"] = json!("pe");
        payload["sector_name"] = json!("");
        payload["sector_code"] = json!("T");

        let failure = ContractValidator::validate(&payload).unwrap_err();
        let fields: Vec<_> = failure
            .violations
            .iter()
            .map(|violation| match violation {
                ContractViolation::FieldTooShort { field, .. } => field.as_str(),
                other => panic!("unexpected violation: {other:?}"),
            })
            .collect();
        assert_eq!(fields, vec!["sector_id", "sector_name", "sector_code"]);
    }

    #[test]
    fn test_lengths_count_characters_not_bytes() {
        let mut payload = technology_payload();
        payload["sector_id"] = json!("科技业");
        payload["sector_code"] = json!("科技");

        assert!(ContractValidator::validate(&payload).is_ok());
    }

    #[test]
    fn test_later_checks_are_accumulated() {
        let mut payload = payload_with_weights(json!({"A": "0.9"}));
        payload["sector_code"] = json!("T");
        payload["calibrations"] = json!({});

        let failure = ContractValidator::validate(&payload).unwrap_err();
        let invariants: Vec<_> = failure.violations.iter().map(|v| v.invariant()).collect();
        assert_eq!(
            invariants,
            vec![
                "field_too_short",
                "weight_sum_out_of_tolerance",
                "missing_calibration_keys"
            ]
        );
    }

    #[test]
    fn test_negative_weight_is_reported() {
        let payload = payload_with_weights(json!({"A": "1.2", "B": "-0.2"}));
        let failure = ContractValidator::validate(&payload).unwrap_err();

        assert_eq!(
            failure.violations,
            vec![ContractViolation::NegativeWeight {
                dimension: "B".to_string(),
                weight: dec("-0.2"),
            }]
        );
    }

    #[test]
    fn test_overflowing_weight_sum_is_reported() {
        let payload = payload_with_weights(json!({
            "A": "79228162514264337593543950335",
            "B": "79228162514264337593543950335",
        }));

        let failure = ContractValidator::validate(&payload).unwrap_err();
        assert_eq!(
            failure.violations,
            vec![ContractViolation::WeightSumOutOfTolerance {
                sum: Decimal::MAX,
                expected: Decimal::ONE,
                tolerance: dec("0.001"),
            }]
        );
    }

    #[test]
    fn test_unknown_field_rejected() {
        let mut payload = technology_payload();
        payload["owner"] = json!("someone");

        let failure = ContractValidator::validate(&payload).unwrap_err();
        assert_eq!(
            failure.violations,
            vec![ContractViolation::UnknownField {
                field: "owner".to_string()
            }]
        );
    }

    #[test]
    fn test_shape_failure_short_circuits() {
        let payload = json!({
            "sector_id": "pe",
            "sector_name": 42,
            "dimension_weights": {"A": "abc"},
            "calibrations": {},
        });

        let failure = ContractValidator::validate(&payload).unwrap_err();
        let invariants: Vec<_> = failure.violations.iter().map(|v| v.invariant()).collect();
        // 只报告结构问题，不会出现长度或权重违规
        assert_eq!(invariants, vec!["invalid_type", "missing_field", "invalid_type"]);
    }

    #[test]
    fn test_non_object_payload() {
        let failure = ContractValidator::validate(&json!([1, 2, 3])).unwrap_err();
        assert_eq!(
            failure.violations,
            vec![ContractViolation::InvalidType {
                field: "$".to_string(),
                expected: "object".to_string(),
                found: "array".to_string(),
            }]
        );
    }

    #[test]
    fn test_validate_entity_and_into_error() {
        let entity = SectorConfig::new("pe_technology", "Technology", "TECHNOLOGY")
            .with_weight("AI_GOV", dec("1.0"));

        let error = ContractValidator::validate_entity(&entity)
            .unwrap_err()
            .into_error("pe_technology");
        assert!(error.is_contract_violation());
        assert_eq!(error.violations().len(), 1);
    }
}
