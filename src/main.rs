use clap::Parser;
use farm_calc::config::{BatchArgs, CalcArgs, Command, SoilArgs};
use farm_calc::domain::model::{CalculationResult, SoilQuery, SoilReport};
use farm_calc::utils::{logger, validation::Validate};
use farm_calc::{
    BatchPipeline, BatchSettings, CalculationRequest, CliConfig, FertilizerCalculator,
    LocalStorage, PlannerEngine, ReferenceConfig, ReferenceTable, Result,
};
use serde::Serialize;
use std::sync::Arc;

#[derive(Serialize)]
struct CropListing<'a> {
    id: &'a str,
    display_name: &'a str,
    baseline_yield_per_acre: f64,
    formulations: &'a [farm_calc::domain::model::FertilizerFormulation],
}

#[tokio::main]
async fn main() {
    let config = CliConfig::parse();

    // 初始化日誌
    if config.json_logs {
        logger::init_json_logger(config.verbose);
    } else {
        logger::init_cli_logger(config.verbose);
    }

    tracing::debug!("CLI config: {:?}", config);

    if let Err(e) = run(config).await {
        tracing::error!(
            "❌ farm-calc failed: {} (Category: {:?}, Severity: {:?})",
            e,
            e.category(),
            e.severity()
        );
        tracing::error!("💡 Recovery suggestion: {}", e.recovery_suggestion());

        eprintln!("❌ {}", e.user_friendly_message());
        eprintln!("💡 {}", e.recovery_suggestion());

        std::process::exit(e.severity().exit_code());
    }
}

async fn run(config: CliConfig) -> Result<()> {
    let reference = match &config.reference {
        Some(path) => {
            tracing::info!("📁 Loading reference data from: {}", path);
            let reference = ReferenceConfig::from_file(path)?;
            reference.validate()?;
            reference
        }
        None => ReferenceConfig::default(),
    };
    let table = Arc::new(reference.reference_table()?);

    match config.command {
        Command::Crops { json } => list_crops(&table, json),
        Command::Calc(args) => calculate(table, args),
        Command::Soil(args) => analyze_soil(&reference, args),
        Command::Batch(args) => run_batch(&reference, table, args).await,
    }
}

fn list_crops(table: &ReferenceTable, json: bool) -> Result<()> {
    let mut listings = Vec::new();
    for crop in table.list_crops() {
        listings.push(CropListing {
            id: &crop.id,
            display_name: &crop.display_name,
            baseline_yield_per_acre: crop.baseline_yield_per_acre,
            formulations: table.get_formulations(&crop.id)?,
        });
    }

    if json {
        println!("{}", serde_json::to_string_pretty(&listings)?);
        return Ok(());
    }

    for listing in &listings {
        println!(
            "{} ({}): baseline {} quintals/acre",
            listing.display_name, listing.id, listing.baseline_yield_per_acre
        );
        for f in listing.formulations {
            println!(
                "  {:<16} {:>6} kg/acre @ ₹{:.2}/kg",
                table.fertilizer_name(&f.fertilizer_code),
                f.application_rate_per_acre,
                f.unit_price
            );
        }
    }
    Ok(())
}

fn calculate(table: Arc<ReferenceTable>, args: CalcArgs) -> Result<()> {
    let request = CalculationRequest::from_fields(
        &args.area,
        args.unit,
        &args.crop,
        args.target_yield.as_deref(),
    )?;
    let calculator = FertilizerCalculator::new(table);
    let result = calculator.calculate(&request)?;

    if args.json {
        println!("{}", serde_json::to_string_pretty(&result)?);
    } else {
        print_result(&result);
    }
    Ok(())
}

fn print_result(result: &CalculationResult) {
    println!("Crop: {}  Area: {:.2} acres", result.crop_id, result.area_in_acres);
    for line in &result.per_fertilizer {
        println!(
            "  {:<16} {:>10.1} kg  @ ₹{:.2}/kg ({} kg/acre)  ₹{:.2}",
            line.display_name, line.quantity_kg, line.unit_price, line.rate_used, line.cost
        );
    }
    println!("Total fertilizer cost: ₹{:.2}", result.total_cost);
    println!("Expected yield: {:.1} quintals", result.expected_yield_quintals);
    println!("Cost per quintal: ₹{:.2}", result.cost_per_quintal);
}

fn analyze_soil(reference: &ReferenceConfig, args: SoilArgs) -> Result<()> {
    let soils = reference.soil_table()?;

    let Some(district) = args.district else {
        let districts = soils.districts();
        if args.json {
            println!("{}", serde_json::to_string_pretty(&districts)?);
        } else {
            println!("Districts with local soil data:");
            for district in districts {
                println!("  {}", district);
            }
        }
        return Ok(());
    };

    let report = soils.analyze(&SoilQuery {
        district,
        soil_color: args.soil_color.unwrap_or_default(),
        temperature_c: args.temperature.unwrap_or(f64::NAN),
    })?;

    if args.json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        print_soil(&report);
    }
    Ok(())
}

fn print_soil(report: &SoilReport) {
    let p = &report.profile;
    println!(
        "{} / {} soil at {}°C{}",
        report.district,
        report.soil_color,
        report.temperature_c,
        if report.matched { "" } else { " (no local data, general profile)" }
    );
    println!("  Nitrogen: {}  Phosphorus: {}  Potassium: {}", p.nitrogen, p.phosphorus, p.potassium);
    println!("  pH: {}  Moisture: {}  Rainfall: {} mm  Type: {}", p.ph, p.soil_moisture, p.rainfall_mm, p.soil_type);
    for rec in &p.recommendations {
        println!("  - {}", rec);
    }
}

async fn run_batch(
    reference: &ReferenceConfig,
    table: Arc<ReferenceTable>,
    args: BatchArgs,
) -> Result<()> {
    let settings = BatchSettings::resolve(
        args.input,
        args.output,
        args.formats,
        reference.batch.as_ref(),
    )?;
    settings.validate()?;

    tracing::info!("🚀 Planning plots from {}", settings.input_path);

    let pipeline = BatchPipeline::new(LocalStorage::new("."), settings, table);
    let engine = PlannerEngine::new(pipeline);

    let saved = engine.run().await?;

    tracing::info!("✅ Batch planning completed");
    println!("✅ Batch planning completed successfully!");
    println!("📁 Report saved to: {}", saved);
    Ok(())
}
