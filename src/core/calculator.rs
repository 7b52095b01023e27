use crate::core::reference::ReferenceTable;
use crate::domain::model::{CalculationRequest, CalculationResult, FertilizerLine};
use crate::utils::error::{FarmCalcError, Result};
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::{Decimal, RoundingStrategy};
use std::sync::Arc;

/// Rounds to `places` decimals, half away from zero, judged on the exact
/// decimal value of the `f64` rather than on `value * 10^places`.
///
/// Values outside the `Decimal` range have no fractional digits left and are
/// returned unchanged.
pub fn round_to(value: f64, places: u32) -> f64 {
    Decimal::from_f64_retain(value)
        .map(|d| d.round_dp_with_strategy(places, RoundingStrategy::MidpointAwayFromZero))
        .and_then(|d| d.to_f64())
        .unwrap_or(value)
}

fn area_overflow(request: &CalculationRequest) -> FarmCalcError {
    FarmCalcError::InvalidArea {
        value: request.area_value.to_string(),
        reason: "area is too large to calculate".to_string(),
    }
}

/// Computes fertilizer quantities, costs and yield metrics for one request.
///
/// Pure: no I/O and no shared mutable state, so it can run from any number of
/// threads against the same table.
pub fn calculate(table: &ReferenceTable, request: &CalculationRequest) -> Result<CalculationResult> {
    if !request.area_value.is_finite() || request.area_value <= 0.0 {
        return Err(FarmCalcError::InvalidArea {
            value: request.area_value.to_string(),
            reason: "area must be a finite number greater than 0".to_string(),
        });
    }

    let crop = table.crop(&request.crop_id)?;
    let formulations = table.get_formulations(&request.crop_id)?;

    if let Some(target) = request.target_yield_per_acre {
        if !target.is_finite() || target <= 0.0 {
            return Err(FarmCalcError::InvalidYield {
                value: target.to_string(),
                reason: "target yield must be a finite number greater than 0".to_string(),
            });
        }
    }

    let area_in_acres = request.area_unit.to_acres(request.area_value);
    if !area_in_acres.is_finite() {
        return Err(area_overflow(request));
    }

    // 總成本是各項已四捨五入成本的加總
    let mut total_cost = 0.0;
    let mut per_fertilizer = Vec::with_capacity(formulations.len());
    for f in formulations {
        let quantity_kg = round_to(f.application_rate_per_acre * area_in_acres, 1);
        let cost = round_to(quantity_kg * f.unit_price, 2);
        total_cost += cost;
        per_fertilizer.push(FertilizerLine {
            fertilizer_code: f.fertilizer_code.clone(),
            display_name: table.fertilizer_name(&f.fertilizer_code),
            quantity_kg,
            rate_used: f.application_rate_per_acre,
            unit_price: f.unit_price,
            cost,
        });
    }

    let yield_per_acre = request
        .target_yield_per_acre
        .unwrap_or(crop.baseline_yield_per_acre);
    let expected_yield = yield_per_acre * area_in_acres;
    if expected_yield == 0.0 {
        return Err(FarmCalcError::DegenerateYield {
            crop_id: crop.id.clone(),
        });
    }

    let result = CalculationResult {
        crop_id: crop.id.clone(),
        area_in_acres,
        per_fertilizer,
        total_cost: round_to(total_cost, 2),
        expected_yield_quintals: round_to(expected_yield, 1),
        cost_per_quintal: round_to(total_cost / expected_yield, 2),
    };

    let all_finite = result
        .per_fertilizer
        .iter()
        .all(|l| l.quantity_kg.is_finite() && l.cost.is_finite())
        && result.total_cost.is_finite()
        && result.expected_yield_quintals.is_finite()
        && result.cost_per_quintal.is_finite();
    if !all_finite {
        return Err(area_overflow(request));
    }

    tracing::debug!(
        "Calculated {} fertilizers for {} ({:.2} acres)",
        result.per_fertilizer.len(),
        result.crop_id,
        result.area_in_acres
    );

    Ok(result)
}

/// Calculator bound to a shared reference table.
#[derive(Debug, Clone)]
pub struct FertilizerCalculator {
    table: Arc<ReferenceTable>,
}

impl FertilizerCalculator {
    pub fn new(table: Arc<ReferenceTable>) -> Self {
        Self { table }
    }

    pub fn table(&self) -> &ReferenceTable {
        &self.table
    }

    pub fn calculate(&self, request: &CalculationRequest) -> Result<CalculationResult> {
        calculate(&self.table, request)
    }
}
