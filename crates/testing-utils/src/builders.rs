//! Test data builders for sector fixtures

use orgair_domain::StoreValue;

pub const DEFAULT_PLATFORM: &str = "pe_org_air";

/// A sector as it would be stored: identity row plus weight and calibration rows
#[derive(Debug, Clone)]
pub struct SectorFixture {
    pub focus_group_id: String,
    pub group_name: String,
    pub group_code: Option<String>,
    pub platform: String,
    pub is_active: bool,
    pub display_order: i64,
    /// (dimension_code, weight) in dimension display order
    pub weights: Vec<(String, StoreValue)>,
    /// (parameter_name, parameter_value)
    pub calibrations: Vec<(String, StoreValue)>,
}

impl SectorFixture {
    pub fn new(focus_group_id: &str, group_name: &str, group_code: &str) -> Self {
        Self {
            focus_group_id: focus_group_id.to_string(),
            group_name: group_name.to_string(),
            group_code: Some(group_code.to_string()),
            platform: DEFAULT_PLATFORM.to_string(),
            is_active: true,
            display_order: 0,
            weights: Vec::new(),
            calibrations: Vec::new(),
        }
    }

    pub fn pe_technology() -> Self {
        Self::new("pe_technology", "Technology", "TECHNOLOGY")
            .weight("AI_GOV", "0.15")
            .weight("TECH_STACK", "0.30")
            .weight("TALENT", "0.20")
            .weight("LEADERSHIP", "0.10")
            .weight("USE_CASES", "0.15")
            .weight("CULTURE", "0.10")
            .calibration("h_r_baseline", "82")
            .calibration("ebitda_multiplier", "1.15")
            .calibration("position_factor_delta", "0.15")
            .calibration("talent_concentration_threshold", "0.25")
    }

    pub fn pe_healthcare() -> Self {
        Self::new("pe_healthcare", "Healthcare", "HEALTHCARE")
            .weight("AI_GOV", "0.20")
            .weight("TECH_STACK", "0.15")
            .weight("TALENT", "0.20")
            .weight("LEADERSHIP", "0.15")
            .weight("USE_CASES", "0.20")
            .weight("CULTURE", "0.10")
            .calibration("h_r_baseline", "78")
            .calibration("ebitda_multiplier", "1.00")
            .calibration("position_factor_delta", "0.12")
            .calibration("talent_concentration_threshold", "0.30")
    }

    pub fn id(mut self, focus_group_id: &str) -> Self {
        self.focus_group_id = focus_group_id.to_string();
        self
    }

    pub fn platform(mut self, platform: &str) -> Self {
        self.platform = platform.to_string();
        self
    }

    pub fn inactive(mut self) -> Self {
        self.is_active = false;
        self
    }

    pub fn display_order(mut self, display_order: i64) -> Self {
        self.display_order = display_order;
        self
    }

    pub fn without_code(mut self) -> Self {
        self.group_code = None;
        self
    }

    /// Append a weight row; a repeated dimension adds a second row
    pub fn weight(self, dimension_code: &str, weight: &str) -> Self {
        self.weight_value(dimension_code, StoreValue::from(weight))
    }

    pub fn weight_value(mut self, dimension_code: &str, weight: StoreValue) -> Self {
        self.weights.push((dimension_code.to_string(), weight));
        self
    }

    pub fn calibration(mut self, parameter_name: &str, value: &str) -> Self {
        self.calibrations
            .push((parameter_name.to_string(), StoreValue::from(value)));
        self
    }

    pub fn without_calibration(mut self, parameter_name: &str) -> Self {
        self.calibrations.retain(|(name, _)| name != parameter_name);
        self
    }
}
