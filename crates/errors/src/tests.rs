use crate::*;
use std::str::FromStr;

#[test]
fn test_orgair_error_display() {
    let not_found = OrgAirError::sector_not_found("pe_does_not_exist");
    assert_eq!(not_found.to_string(), "行业配置未找到: pe_does_not_exist");

    let unavailable = OrgAirError::store_unavailable("DATABASE_URL not set");
    assert_eq!(unavailable.to_string(), "存储不可用: DATABASE_URL not set");

    let config_error = OrgAirError::config_error("bad ttl");
    assert_eq!(config_error.to_string(), "配置错误: bad ttl");
}

#[test]
fn test_contract_error_lists_every_violation() {
    let error = OrgAirError::contract(
        "pe_technology",
        vec![
            ContractViolation::MissingCalibrationKeys {
                keys: vec!["h_r_baseline".to_string()],
            },
            ContractViolation::WeightSumOutOfTolerance {
                sum: Decimal::from_str("1.40").unwrap(),
                expected: Decimal::ONE,
                tolerance: Decimal::from_str("0.001").unwrap(),
            },
        ],
    );

    let message = error.to_string();
    assert!(message.contains("pe_technology"));
    assert!(message.contains("h_r_baseline"));
    assert!(message.contains("1.40"));
    assert!(error.is_contract_violation());
    assert_eq!(error.violations().len(), 2);
}

#[test]
fn test_error_classification() {
    assert!(OrgAirError::store_unavailable("down").is_store_unavailable());
    assert!(OrgAirError::store_unavailable("down").is_store_error());
    assert!(OrgAirError::StoreQuery("syntax".to_string()).is_store_error());
    assert!(!OrgAirError::StoreQuery("syntax".to_string()).is_store_unavailable());
    assert!(!OrgAirError::sector_not_found("x").is_store_error());
    assert!(OrgAirError::sector_not_found("x").violations().is_empty());
}

#[test]
fn test_sqlx_error_conversion() {
    let timed_out: OrgAirError = sqlx::Error::PoolTimedOut.into();
    assert!(timed_out.is_store_unavailable());

    let io: OrgAirError = sqlx::Error::Io(std::io::Error::new(
        std::io::ErrorKind::ConnectionRefused,
        "connection refused",
    ))
    .into();
    assert!(io.is_store_unavailable());

    let row_not_found: OrgAirError = sqlx::Error::RowNotFound.into();
    assert!(matches!(row_not_found, OrgAirError::StoreQuery(_)));
}

#[test]
fn test_violation_invariant_names() {
    let violation = ContractViolation::FieldTooShort {
        field: "sector_id".to_string(),
        min_length: 3,
        actual_length: 2,
        value: "pe".to_string(),
    };
    assert_eq!(violation.invariant(), "field_too_short");
    assert!(violation.to_string().contains("sector_id"));

    let json = serde_json::to_value(&violation).unwrap();
    assert_eq!(json["invariant"], "field_too_short");
    assert_eq!(json["min_length"], 3);
}

#[test]
fn test_user_messages() {
    assert_eq!(
        OrgAirError::sector_not_found("x").user_message(),
        "请求的行业配置不存在"
    );
    assert_eq!(
        OrgAirError::Internal("boom".to_string()).user_message(),
        "系统繁忙，请稍后重试"
    );
}

#[test]
fn test_from_serde_json_error() {
    let err = serde_json::from_str::<serde_json::Value>("{not json").unwrap_err();
    let converted: OrgAirError = err.into();
    assert!(matches!(converted, OrgAirError::Serialization(_)));
}
