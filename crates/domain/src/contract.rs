use rust_decimal::Decimal;
use serde::Serialize;
use std::collections::BTreeMap;

use crate::entities::defaults;

pub const SECTOR_ID: &str = "sector_id";
pub const SECTOR_NAME: &str = "sector_name";
pub const SECTOR_CODE: &str = "sector_code";
pub const DIMENSION_WEIGHTS: &str = "dimension_weights";
pub const CALIBRATIONS: &str = "calibrations";

/// 合约声明的全部字段
pub const CONTRACT_FIELDS: [&str; 5] = [
    SECTOR_ID,
    SECTOR_NAME,
    SECTOR_CODE,
    DIMENSION_WEIGHTS,
    CALIBRATIONS,
];

/// Validated, immutable sector configuration.
///
/// Only [`crate::ContractValidator`] can build one, so holding a value means
/// the weight sum, calibration key and field length invariants all held at
/// construction time. Decimals serialize as strings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SectorConfigContract {
    sector_id: String,
    sector_name: String,
    sector_code: String,
    dimension_weights: BTreeMap<String, Decimal>,
    calibrations: BTreeMap<String, Decimal>,
}

impl SectorConfigContract {
    pub(crate) fn new(
        sector_id: String,
        sector_name: String,
        sector_code: String,
        dimension_weights: BTreeMap<String, Decimal>,
        calibrations: BTreeMap<String, Decimal>,
    ) -> Self {
        Self {
            sector_id,
            sector_name,
            sector_code,
            dimension_weights,
            calibrations,
        }
    }

    pub fn sector_id(&self) -> &str {
        &self.sector_id
    }

    pub fn sector_name(&self) -> &str {
        &self.sector_name
    }

    pub fn sector_code(&self) -> &str {
        &self.sector_code
    }

    pub fn dimension_weights(&self) -> &BTreeMap<String, Decimal> {
        &self.dimension_weights
    }

    pub fn calibrations(&self) -> &BTreeMap<String, Decimal> {
        &self.calibrations
    }

    pub fn dimension_weight(&self, dimension_code: &str) -> Decimal {
        self.dimension_weights
            .get(dimension_code)
            .copied()
            .unwrap_or(Decimal::ZERO)
    }

    pub fn weights_sum(&self) -> Decimal {
        self.dimension_weights
            .values()
            .fold(Decimal::ZERO, |acc, weight| acc.saturating_add(*weight))
    }

    pub fn h_r_baseline(&self) -> Decimal {
        self.calibrations
            .get("h_r_baseline")
            .copied()
            .unwrap_or_else(defaults::h_r_baseline)
    }

    pub fn ebitda_multiplier(&self) -> Decimal {
        self.calibrations
            .get("ebitda_multiplier")
            .copied()
            .unwrap_or_else(defaults::ebitda_multiplier)
    }

    pub fn position_factor_delta(&self) -> Decimal {
        self.calibrations
            .get("position_factor_delta")
            .copied()
            .unwrap_or_else(defaults::position_factor_delta)
    }

    pub fn talent_concentration_threshold(&self) -> Decimal {
        self.calibrations
            .get("talent_concentration_threshold")
            .copied()
            .unwrap_or_else(defaults::talent_concentration_threshold)
    }
}
