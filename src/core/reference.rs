//! Crop and fertilizer reference data.
//!
//! The table is built once (built-in defaults or a TOML file), validated, and
//! then only read. Crops and formulations keep their definition order so every
//! listing and every calculation result comes out in the same order.

use crate::domain::model::{CropProfile, FertilizerFormulation, FertilizerProduct};
use crate::utils::error::{FarmCalcError, Result};
use std::collections::{HashMap, HashSet};

/// A formulation row before it is attached to its crop.
#[derive(Debug, Clone, PartialEq)]
pub struct CropFormulation {
    pub crop_id: String,
    pub formulation: FertilizerFormulation,
}

#[derive(Debug, Clone)]
pub struct ReferenceTable {
    crops: Vec<CropProfile>,
    formulations: Vec<Vec<FertilizerFormulation>>,
    crop_index: HashMap<String, usize>,
    products: Vec<FertilizerProduct>,
}

impl ReferenceTable {
    pub fn new(
        crops: Vec<CropProfile>,
        formulations: Vec<CropFormulation>,
        products: Vec<FertilizerProduct>,
    ) -> Result<Self> {
        validate_parts(&crops, &formulations, &products)?;
        let table = Self::assemble(crops, formulations, products);
        tracing::debug!(
            "Reference table ready: {} crops, {} fertilizer products",
            table.crops.len(),
            table.products.len()
        );
        Ok(table)
    }

    /// 內建資料表
    pub fn builtin() -> Self {
        let crops = BUILTIN_CROPS
            .iter()
            .map(|(id, name, baseline, _)| crop(id, name, *baseline))
            .collect();
        let formulations = BUILTIN_CROPS
            .iter()
            .flat_map(|(id, _, _, rows)| {
                rows.iter()
                    .map(move |(code, rate, price)| formulation(id, code, *rate, *price))
            })
            .collect();
        let products = BUILTIN_PRODUCTS
            .iter()
            .map(|(code, name)| FertilizerProduct {
                code: code.to_string(),
                display_name: name.to_string(),
            })
            .collect();

        Self::assemble(crops, formulations, products)
    }

    fn assemble(
        crops: Vec<CropProfile>,
        formulations: Vec<CropFormulation>,
        products: Vec<FertilizerProduct>,
    ) -> Self {
        let crop_index: HashMap<String, usize> = crops
            .iter()
            .enumerate()
            .map(|(i, c)| (c.id.clone(), i))
            .collect();

        let mut grouped = vec![Vec::new(); crops.len()];
        for row in formulations {
            if let Some(&i) = crop_index.get(&row.crop_id) {
                grouped[i].push(row.formulation);
            }
        }

        Self {
            crops,
            formulations: grouped,
            crop_index,
            products,
        }
    }

    pub fn list_crops(&self) -> &[CropProfile] {
        &self.crops
    }

    pub fn crop(&self, crop_id: &str) -> Result<&CropProfile> {
        self.crop_index
            .get(crop_id)
            .map(|&i| &self.crops[i])
            .ok_or_else(|| FarmCalcError::UnknownCrop {
                crop_id: crop_id.to_string(),
            })
    }

    /// Formulations for a crop, in definition order.
    pub fn get_formulations(&self, crop_id: &str) -> Result<&[FertilizerFormulation]> {
        self.crop_index
            .get(crop_id)
            .map(|&i| self.formulations[i].as_slice())
            .ok_or_else(|| FarmCalcError::UnknownCrop {
                crop_id: crop_id.to_string(),
            })
    }

    /// Flattened (crop, formulation) rows in definition order.
    pub fn formulation_rows(&self) -> Vec<CropFormulation> {
        self.crops
            .iter()
            .zip(&self.formulations)
            .flat_map(|(c, rows)| {
                rows.iter().map(move |f| CropFormulation {
                    crop_id: c.id.clone(),
                    formulation: f.clone(),
                })
            })
            .collect()
    }

    pub fn products(&self) -> &[FertilizerProduct] {
        &self.products
    }

    /// Catalog name for a fertilizer code, or the code upper-cased when the
    /// catalog has no entry.
    pub fn fertilizer_name(&self, code: &str) -> String {
        self.products
            .iter()
            .find(|p| p.code == code)
            .map(|p| p.display_name.clone())
            .unwrap_or_else(|| code.to_uppercase())
    }
}

impl Default for ReferenceTable {
    fn default() -> Self {
        Self::builtin()
    }
}

fn validate_parts(
    crops: &[CropProfile],
    formulations: &[CropFormulation],
    products: &[FertilizerProduct],
) -> Result<()> {
    if crops.is_empty() {
        return Err(FarmCalcError::MissingConfigError {
            field: "crops".to_string(),
        });
    }

    let mut seen_crops = HashSet::new();
    for (i, c) in crops.iter().enumerate() {
        if c.id.trim().is_empty() {
            return Err(invalid(format!("crops[{}].id", i), "crop id cannot be empty"));
        }
        if !seen_crops.insert(c.id.as_str()) {
            return Err(invalid(format!("crops[{}].id", i), format!("duplicate crop id '{}'", c.id)));
        }
        // 基準產量允許為 0（例如綠肥作物），計算時才會回報
        if !c.baseline_yield_per_acre.is_finite() || c.baseline_yield_per_acre < 0.0 {
            return Err(invalid(
                format!("crops[{}].baseline_yield_per_acre", i),
                "baseline yield must be a finite number >= 0",
            ));
        }
    }

    let mut seen_pairs = HashSet::new();
    for (i, row) in formulations.iter().enumerate() {
        if !seen_crops.contains(row.crop_id.as_str()) {
            return Err(invalid(
                format!("formulations[{}].crop", i),
                format!("no crop profile for '{}'", row.crop_id),
            ));
        }
        let f = &row.formulation;
        if f.fertilizer_code.trim().is_empty() {
            return Err(invalid(format!("formulations[{}].fertilizer", i), "fertilizer code cannot be empty"));
        }
        if !seen_pairs.insert((row.crop_id.as_str(), f.fertilizer_code.as_str())) {
            return Err(invalid(
                format!("formulations[{}].fertilizer", i),
                format!("'{}' listed twice for crop '{}'", f.fertilizer_code, row.crop_id),
            ));
        }
        if !f.application_rate_per_acre.is_finite() || f.application_rate_per_acre <= 0.0 {
            return Err(invalid(format!("formulations[{}].rate", i), "rate must be greater than 0"));
        }
        if !f.unit_price.is_finite() || f.unit_price <= 0.0 {
            return Err(invalid(format!("formulations[{}].price", i), "price must be greater than 0"));
        }
    }

    let mut seen_products = HashSet::new();
    for (i, p) in products.iter().enumerate() {
        if !seen_products.insert(p.code.as_str()) {
            return Err(invalid(
                format!("fertilizers[{}].code", i),
                format!("duplicate fertilizer code '{}'", p.code),
            ));
        }
    }

    Ok(())
}

fn invalid(field: String, message: impl Into<String>) -> FarmCalcError {
    FarmCalcError::ConfigValidationError {
        field,
        message: message.into(),
    }
}

fn crop(id: &str, name: &str, baseline: f64) -> CropProfile {
    CropProfile {
        id: id.to_string(),
        display_name: name.to_string(),
        baseline_yield_per_acre: baseline,
    }
}

fn formulation(crop_id: &str, code: &str, rate: f64, price: f64) -> CropFormulation {
    CropFormulation {
        crop_id: crop_id.to_string(),
        formulation: FertilizerFormulation {
            fertilizer_code: code.to_string(),
            application_rate_per_acre: rate,
            unit_price: price,
        },
    }
}

type BuiltinCrop = (&'static str, &'static str, f64, &'static [(&'static str, f64, f64)]);

// (id, name, baseline quintals/acre, [(fertilizer, kg/acre, price/kg)])
const BUILTIN_CROPS: &[BuiltinCrop] = &[
    ("wheat", "Wheat", 25.0, &[("urea", 130.0, 6.5), ("dap", 100.0, 27.0), ("mop", 50.0, 17.0)]),
    ("rice", "Rice", 20.0, &[("urea", 120.0, 6.5), ("ssp", 150.0, 8.0), ("mop", 40.0, 17.0)]),
    ("maize", "Maize", 30.0, &[("urea", 140.0, 6.5), ("dap", 120.0, 27.0), ("mop", 60.0, 17.0)]),
    ("cotton", "Cotton", 15.0, &[("urea", 100.0, 6.5), ("dap", 80.0, 27.0), ("mop", 40.0, 17.0)]),
    ("sugarcane", "Sugarcane", 350.0, &[("urea", 200.0, 6.5), ("dap", 150.0, 27.0), ("mop", 100.0, 17.0)]),
];

const BUILTIN_PRODUCTS: &[(&str, &str)] = &[
    ("urea", "Urea (46% N)"),
    ("dap", "DAP (18-46-0)"),
    ("ssp", "SSP (16% P2O5)"),
    ("mop", "MOP (60% K2O)"),
];
