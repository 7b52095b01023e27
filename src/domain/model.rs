use crate::utils::error::{FarmCalcError, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// 公頃換算英畝的固定係數
pub const HECTARE_TO_ACRE: f64 = 2.47;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CropProfile {
    pub id: String,
    pub display_name: String,
    /// quintals per acre
    pub baseline_yield_per_acre: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FertilizerFormulation {
    pub fertilizer_code: String,
    /// kg of product per acre
    pub application_rate_per_acre: f64,
    /// currency per kg
    pub unit_price: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FertilizerProduct {
    pub code: String,
    pub display_name: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[cfg_attr(feature = "cli", derive(clap::ValueEnum))]
#[serde(rename_all = "lowercase")]
pub enum AreaUnit {
    #[default]
    Acres,
    Hectares,
}

impl AreaUnit {
    pub fn to_acres(self, value: f64) -> f64 {
        match self {
            AreaUnit::Acres => value,
            AreaUnit::Hectares => value * HECTARE_TO_ACRE,
        }
    }
}

impl fmt::Display for AreaUnit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AreaUnit::Acres => write!(f, "acres"),
            AreaUnit::Hectares => write!(f, "hectares"),
        }
    }
}

impl FromStr for AreaUnit {
    type Err = FarmCalcError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "" | "acre" | "acres" | "ac" => Ok(AreaUnit::Acres),
            "hectare" | "hectares" | "ha" => Ok(AreaUnit::Hectares),
            other => Err(FarmCalcError::InvalidArea {
                value: other.to_string(),
                reason: "unit must be acres or hectares".to_string(),
            }),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CalculationRequest {
    pub area_value: f64,
    pub area_unit: AreaUnit,
    pub crop_id: String,
    pub target_yield_per_acre: Option<f64>,
}

impl CalculationRequest {
    pub fn new(area_value: f64, area_unit: AreaUnit, crop_id: impl Into<String>) -> Self {
        Self {
            area_value,
            area_unit,
            crop_id: crop_id.into(),
            target_yield_per_acre: None,
        }
    }

    pub fn with_target_yield(mut self, target_yield_per_acre: f64) -> Self {
        self.target_yield_per_acre = Some(target_yield_per_acre);
        self
    }

    /// 從表單或 CSV 的原始字串建立請求；空白的目標產量視為未提供
    pub fn from_fields(
        area: &str,
        area_unit: AreaUnit,
        crop_id: &str,
        target_yield: Option<&str>,
    ) -> Result<Self> {
        let area_value = area
            .trim()
            .parse::<f64>()
            .map_err(|_| FarmCalcError::InvalidArea {
                value: area.to_string(),
                reason: "not a number".to_string(),
            })?;

        let target_yield_per_acre = match target_yield.map(str::trim) {
            None | Some("") => None,
            Some(raw) => Some(raw.parse::<f64>().map_err(|_| FarmCalcError::InvalidYield {
                value: raw.to_string(),
                reason: "not a number".to_string(),
            })?),
        };

        Ok(Self {
            area_value,
            area_unit,
            crop_id: crop_id.trim().to_string(),
            target_yield_per_acre,
        })
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FertilizerLine {
    pub fertilizer_code: String,
    pub display_name: String,
    pub quantity_kg: f64,
    pub rate_used: f64,
    pub unit_price: f64,
    pub cost: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CalculationResult {
    pub crop_id: String,
    pub area_in_acres: f64,
    /// Same order as the reference table's formulations for the crop.
    pub per_fertilizer: Vec<FertilizerLine>,
    pub total_cost: f64,
    pub expected_yield_quintals: f64,
    pub cost_per_quintal: f64,
}

impl CalculationResult {
    pub fn fertilizer(&self, code: &str) -> Option<&FertilizerLine> {
        self.per_fertilizer.iter().find(|line| line.fertilizer_code == code)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SoilProfile {
    pub nitrogen: f64,
    pub phosphorus: f64,
    pub potassium: f64,
    pub ph: f64,
    /// e.g. "60-80%"
    pub soil_moisture: String,
    pub rainfall_mm: f64,
    pub soil_type: String,
    #[serde(default)]
    pub recommendations: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SoilQuery {
    pub district: String,
    pub soil_color: String,
    pub temperature_c: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SoilReport {
    pub district: String,
    pub soil_color: String,
    pub temperature_c: f64,
    /// false when the fallback profile was used
    pub matched: bool,
    pub profile: SoilProfile,
}

/// 批次輸入的一列
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlotRow {
    pub plot_id: String,
    pub area: String,
    #[serde(default)]
    pub unit: String,
    pub crop: String,
    #[serde(default)]
    pub target_yield: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlotPlan {
    pub plot_id: String,
    pub result: CalculationResult,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlotFailure {
    pub plot_id: String,
    pub error: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlanReport {
    pub generated_at: chrono::DateTime<chrono::Utc>,
    pub plots: Vec<PlotPlan>,
    pub failed: Vec<PlotFailure>,
    pub grand_total_cost: f64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_area_unit_parsing() {
        assert_eq!("acres".parse::<AreaUnit>().unwrap(), AreaUnit::Acres);
        assert_eq!("Hectares".parse::<AreaUnit>().unwrap(), AreaUnit::Hectares);
        assert_eq!(" ha ".parse::<AreaUnit>().unwrap(), AreaUnit::Hectares);
        assert_eq!("".parse::<AreaUnit>().unwrap(), AreaUnit::Acres);
        assert!(matches!(
            "bigha".parse::<AreaUnit>(),
            Err(FarmCalcError::InvalidArea { .. })
        ));
    }

    #[test]
    fn test_from_fields() {
        let req = CalculationRequest::from_fields("10", AreaUnit::Acres, "wheat", Some("")).unwrap();
        assert_eq!(req.area_value, 10.0);
        assert_eq!(req.target_yield_per_acre, None);

        let req = CalculationRequest::from_fields("4", AreaUnit::Hectares, " rice ", Some("30")).unwrap();
        assert_eq!(req.area_unit, AreaUnit::Hectares);
        assert_eq!(req.crop_id, "rice");
        assert_eq!(req.target_yield_per_acre, Some(30.0));
    }

    #[test]
    fn test_from_fields_rejects_non_numeric() {
        assert!(matches!(
            CalculationRequest::from_fields("ten", AreaUnit::Acres, "wheat", None),
            Err(FarmCalcError::InvalidArea { .. })
        ));
        assert!(matches!(
            CalculationRequest::from_fields("", AreaUnit::Acres, "wheat", None),
            Err(FarmCalcError::InvalidArea { .. })
        ));
        assert!(matches!(
            CalculationRequest::from_fields("10", AreaUnit::Acres, "wheat", Some("lots")),
            Err(FarmCalcError::InvalidYield { .. })
        ));
    }
}
