//! Soil-parameter lookup by district and soil colour.

use crate::domain::model::{SoilProfile, SoilQuery, SoilReport};
use crate::utils::error::{FarmCalcError, Result};
use std::collections::HashMap;

#[derive(Debug, Clone, PartialEq)]
pub struct SoilEntry {
    pub district: String,
    pub soil_color: String,
    pub profile: SoilProfile,
}

#[derive(Debug, Clone)]
pub struct SoilTable {
    entries: Vec<SoilEntry>,
    index: HashMap<String, usize>,
    fallback: SoilProfile,
}

fn soil_key(district: &str, soil_color: &str) -> String {
    format!(
        "{}-{}",
        district.trim().to_lowercase(),
        soil_color.trim().to_lowercase()
    )
}

impl SoilTable {
    pub fn new(entries: Vec<SoilEntry>, fallback: SoilProfile) -> Result<Self> {
        let mut index = HashMap::with_capacity(entries.len());
        for (i, entry) in entries.iter().enumerate() {
            let key = soil_key(&entry.district, &entry.soil_color);
            if index.insert(key.clone(), i).is_some() {
                return Err(FarmCalcError::ConfigValidationError {
                    field: format!("soils[{}]", i),
                    message: format!("duplicate soil entry '{}'", key),
                });
            }
        }
        Ok(Self {
            entries,
            index,
            fallback,
        })
    }

    pub fn builtin() -> Self {
        let entries: Vec<SoilEntry> = BUILTIN_SOILS
            .iter()
            .map(|(district, color, row)| SoilEntry {
                district: district.to_string(),
                soil_color: color.to_string(),
                profile: row.to_profile(),
            })
            .collect();
        let index = entries
            .iter()
            .enumerate()
            .map(|(i, e)| (soil_key(&e.district, &e.soil_color), i))
            .collect();

        Self {
            entries,
            index,
            fallback: FALLBACK_SOIL.to_profile(),
        }
    }

    pub fn entries(&self) -> &[SoilEntry] {
        &self.entries
    }

    pub fn fallback(&self) -> &SoilProfile {
        &self.fallback
    }

    /// Distinct districts, first-seen order.
    pub fn districts(&self) -> Vec<&str> {
        let mut out: Vec<&str> = Vec::new();
        for entry in &self.entries {
            if !out.iter().any(|d| d.eq_ignore_ascii_case(&entry.district)) {
                out.push(entry.district.as_str());
            }
        }
        out
    }

    /// Case-insensitive lookup; `None` when no entry matches.
    pub fn lookup(&self, district: &str, soil_color: &str) -> Option<&SoilProfile> {
        self.index
            .get(&soil_key(district, soil_color))
            .map(|&i| &self.entries[i].profile)
    }

    pub fn analyze(&self, query: &SoilQuery) -> Result<SoilReport> {
        if query.district.trim().is_empty() || query.soil_color.trim().is_empty() {
            return Err(FarmCalcError::InvalidSoilQuery {
                message: "district and soil colour are required".to_string(),
            });
        }
        if !query.temperature_c.is_finite() {
            return Err(FarmCalcError::InvalidSoilQuery {
                message: format!("temperature '{}' is not a number", query.temperature_c),
            });
        }

        let (matched, profile) = match self.lookup(&query.district, &query.soil_color) {
            Some(profile) => (true, profile.clone()),
            None => {
                tracing::info!(
                    "No soil data for {} / {}, using fallback profile",
                    query.district,
                    query.soil_color
                );
                (false, self.fallback.clone())
            }
        };

        Ok(SoilReport {
            district: query.district.trim().to_string(),
            soil_color: query.soil_color.trim().to_string(),
            temperature_c: query.temperature_c,
            matched,
            profile,
        })
    }
}

impl Default for SoilTable {
    fn default() -> Self {
        Self::builtin()
    }
}

struct BuiltinSoil {
    n: f64,
    p: f64,
    k: f64,
    ph: f64,
    moisture: &'static str,
    rainfall: f64,
    soil_type: &'static str,
    recommendations: [&'static str; 4],
}

impl BuiltinSoil {
    fn to_profile(&self) -> SoilProfile {
        SoilProfile {
            nitrogen: self.n,
            phosphorus: self.p,
            potassium: self.k,
            ph: self.ph,
            soil_moisture: self.moisture.to_string(),
            rainfall_mm: self.rainfall,
            soil_type: self.soil_type.to_string(),
            recommendations: self.recommendations.iter().map(|r| r.to_string()).collect(),
        }
    }
}

const BUILTIN_SOILS: &[(&str, &str, BuiltinSoil)] = &[
    (
        "Kolhapur",
        "Black",
        BuiltinSoil {
            n: 75.0,
            p: 50.0,
            k: 100.0,
            ph: 6.5,
            moisture: "60-80%",
            rainfall: 1000.0,
            soil_type: "Loamy",
            recommendations: [
                "Add balanced NPK fertilizer with emphasis on potassium",
                "Maintain soil moisture between 60-80%",
                "Ideal for sugarcane cultivation",
                "Monitor pH levels regularly to maintain optimal range",
            ],
        },
    ),
    (
        "Kolhapur",
        "Red",
        BuiltinSoil {
            n: 85.0,
            p: 60.0,
            k: 110.0,
            ph: 7.0,
            moisture: "50-70%",
            rainfall: 1100.0,
            soil_type: "Loamy",
            recommendations: [
                "Increase organic matter content",
                "Apply phosphorus-rich fertilizers",
                "Suitable for various crops with proper irrigation",
                "Consider crop rotation to maintain soil health",
            ],
        },
    ),
    (
        "Satara",
        "Black",
        BuiltinSoil {
            n: 80.0,
            p: 55.0,
            k: 105.0,
            ph: 6.8,
            moisture: "55-75%",
            rainfall: 1200.0,
            soil_type: "Loamy",
            recommendations: [
                "Maintain adequate moisture levels",
                "Add potassium supplements during dry seasons",
                "Good for cotton and soybean cultivation",
                "Regular soil testing recommended",
            ],
        },
    ),
    (
        "Sangli",
        "Black",
        BuiltinSoil {
            n: 90.0,
            p: 50.0,
            k: 100.0,
            ph: 6.5,
            moisture: "50-70%",
            rainfall: 1000.0,
            soil_type: "Loamy",
            recommendations: [
                "Excellent for sugarcane production",
                "Maintain pH around 6.5 for optimal yield",
                "Add nitrogen-based fertilizers during growing season",
                "Ensure proper drainage to prevent waterlogging",
            ],
        },
    ),
];

const FALLBACK_SOIL: BuiltinSoil = BuiltinSoil {
    n: 80.0,
    p: 55.0,
    k: 105.0,
    ph: 6.7,
    moisture: "55-75%",
    rainfall: 1100.0,
    soil_type: "Loamy",
    recommendations: [
        "Conduct detailed soil test for accurate analysis",
        "Maintain balanced NPK ratio",
        "Monitor moisture levels regularly",
        "Consider local crop patterns for best results",
    ],
};
