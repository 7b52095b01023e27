use anyhow::Result;
use approx::assert_abs_diff_eq;
use farm_calc::core::calculator::round_to;
use farm_calc::domain::model::HECTARE_TO_ACRE;
use farm_calc::{calculate, AreaUnit, CalculationRequest, FarmCalcError, ReferenceTable};

fn acres(area: f64, crop: &str) -> CalculationRequest {
    CalculationRequest::new(area, AreaUnit::Acres, crop)
}

#[test]
fn test_wheat_ten_acres_end_to_end() -> Result<()> {
    let table = ReferenceTable::builtin();
    let result = calculate(&table, &acres(10.0, "wheat"))?;

    let expected = [
        ("urea", 1300.0, 8450.0),
        ("dap", 1000.0, 27000.0),
        ("mop", 500.0, 8500.0),
    ];
    assert_eq!(result.per_fertilizer.len(), expected.len());
    for (line, (code, qty, cost)) in result.per_fertilizer.iter().zip(expected) {
        assert_eq!(line.fertilizer_code, code);
        assert_eq!(line.quantity_kg, qty);
        assert_eq!(line.cost, cost);
    }

    assert_eq!(result.total_cost, 43950.0);
    assert_eq!(result.expected_yield_quintals, 250.0);
    assert_eq!(result.cost_per_quintal, 175.8);
    Ok(())
}

#[test]
fn test_wheat_four_hectares() -> Result<()> {
    let table = ReferenceTable::builtin();
    let result = calculate(&table, &CalculationRequest::new(4.0, AreaUnit::Hectares, "wheat"))?;

    assert_abs_diff_eq!(result.area_in_acres, 9.88, epsilon = 1e-9);
    let urea = result.fertilizer("urea").expect("urea line");
    assert_abs_diff_eq!(urea.quantity_kg, 1284.4, epsilon = 1e-9);
    assert_abs_diff_eq!(urea.cost, 8348.6, epsilon = 1e-9);
    Ok(())
}

#[test]
fn test_sugarcane_target_yield_override() -> Result<()> {
    let table = ReferenceTable::builtin();
    let result = calculate(&table, &acres(1.0, "sugarcane").with_target_yield(400.0))?;

    assert_eq!(result.expected_yield_quintals, 400.0);
    let rates: Vec<f64> = result.per_fertilizer.iter().map(|l| l.rate_used).collect();
    assert_eq!(rates, vec![200.0, 150.0, 100.0]);
    Ok(())
}

#[test]
fn test_total_is_sum_of_line_costs() -> Result<()> {
    let table = ReferenceTable::builtin();
    for crop in table.list_crops() {
        for area in [0.3, 1.0, 2.75, 13.1, 250.0] {
            let result = calculate(&table, &acres(area, &crop.id))?;
            let sum: f64 = result.per_fertilizer.iter().map(|l| l.cost).sum();

            assert_abs_diff_eq!(result.total_cost, round_to(sum, 2), epsilon = 1e-9);
            for line in &result.per_fertilizer {
                assert!(line.quantity_kg >= 0.0);
                assert!(line.cost >= 0.0);
            }
        }
    }
    Ok(())
}

#[test]
fn test_identical_input_gives_identical_output() -> Result<()> {
    let table = ReferenceTable::builtin();
    let request = CalculationRequest::new(3.3, AreaUnit::Hectares, "maize").with_target_yield(28.5);

    let first = calculate(&table, &request)?;
    let second = calculate(&table, &request)?;
    assert_eq!(first, second);
    assert_eq!(first.total_cost.to_bits(), second.total_cost.to_bits());
    Ok(())
}

#[test]
fn test_hectares_match_converted_acres() -> Result<()> {
    let table = ReferenceTable::builtin();
    for x in [0.5, 1.0, 4.0, 7.25] {
        let ha = calculate(&table, &CalculationRequest::new(x, AreaUnit::Hectares, "rice"))?;
        let ac = calculate(&table, &acres(x * HECTARE_TO_ACRE, "rice"))?;

        for (h, a) in ha.per_fertilizer.iter().zip(&ac.per_fertilizer) {
            assert_abs_diff_eq!(h.quantity_kg, a.quantity_kg, epsilon = 0.1);
            assert_abs_diff_eq!(h.cost, a.cost, epsilon = 0.01 + 0.1 * h.unit_price);
        }
        assert_abs_diff_eq!(ha.total_cost, ac.total_cost, epsilon = 1.0);
    }
    Ok(())
}

#[test]
fn test_costs_never_decrease_with_area() -> Result<()> {
    let table = ReferenceTable::builtin();
    let mut previous = calculate(&table, &acres(0.1, "cotton"))?;

    for step in 2..=200 {
        let current = calculate(&table, &acres(step as f64 * 0.1, "cotton"))?;
        assert!(current.total_cost >= previous.total_cost);
        for (c, p) in current.per_fertilizer.iter().zip(&previous.per_fertilizer) {
            assert!(c.quantity_kg >= p.quantity_kg);
            assert!(c.cost >= p.cost);
        }
        previous = current;
    }
    Ok(())
}

#[test]
fn test_boundary_inputs() {
    let table = ReferenceTable::builtin();

    assert!(matches!(
        calculate(&table, &acres(0.0, "wheat")),
        Err(FarmCalcError::InvalidArea { .. })
    ));
    assert!(matches!(
        calculate(&table, &acres(-5.0, "wheat")),
        Err(FarmCalcError::InvalidArea { .. })
    ));
    assert!(matches!(
        calculate(&table, &acres(1.0, "unknown_crop")),
        Err(FarmCalcError::UnknownCrop { .. })
    ));
    assert!(matches!(
        CalculationRequest::from_fields("1O", AreaUnit::Acres, "wheat", None),
        Err(FarmCalcError::InvalidArea { .. })
    ));
}
