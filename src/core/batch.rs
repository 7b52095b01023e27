use crate::core::calculator::{round_to, FertilizerCalculator};
use crate::core::reference::ReferenceTable;
use crate::core::{ConfigProvider, Pipeline, PlotInput, Storage};
use crate::domain::model::{
    AreaUnit, CalculationRequest, PlanReport, PlotFailure, PlotPlan, PlotRow,
};
use crate::utils::error::{FarmCalcError, Result};
use serde::Serialize;
use std::path::Path;
use std::sync::Arc;

pub const REPORT_CSV: &str = "plan_report.csv";
pub const REPORT_JSON: &str = "plan_report.json";

/// One CSV line: a plot × fertilizer, or a failed plot with its error.
#[derive(Debug, Serialize)]
struct ReportRow<'a> {
    plot_id: &'a str,
    crop: Option<&'a str>,
    area_acres: Option<f64>,
    fertilizer: Option<&'a str>,
    quantity_kg: Option<f64>,
    unit_price: Option<f64>,
    cost: Option<f64>,
    plot_total_cost: Option<f64>,
    expected_yield_quintals: Option<f64>,
    cost_per_quintal: Option<f64>,
    error: Option<&'a str>,
}

pub struct BatchPipeline<S: Storage, C: ConfigProvider> {
    storage: S,
    config: C,
    calculator: FertilizerCalculator,
}

impl<S: Storage, C: ConfigProvider> BatchPipeline<S, C> {
    pub fn new(storage: S, config: C, table: Arc<ReferenceTable>) -> Self {
        Self {
            storage,
            config,
            calculator: FertilizerCalculator::new(table),
        }
    }

    fn writes(&self, format: &str) -> bool {
        self.config.output_formats().iter().any(|f| f == format)
    }

    fn output_file(&self, name: &str) -> String {
        Path::new(self.config.output_path())
            .join(name)
            .to_string_lossy()
            .into_owned()
    }
}

fn parse_row(row: &PlotRow) -> Result<CalculationRequest> {
    let unit = row.unit.parse::<AreaUnit>()?;
    CalculationRequest::from_fields(&row.area, unit, &row.crop, row.target_yield.as_deref())
}

fn render_csv(report: &PlanReport) -> Result<Vec<u8>> {
    let mut writer = csv::Writer::from_writer(Vec::new());

    for plan in &report.plots {
        let result = &plan.result;
        for line in &result.per_fertilizer {
            writer.serialize(ReportRow {
                plot_id: &plan.plot_id,
                crop: Some(result.crop_id.as_str()),
                area_acres: Some(round_to(result.area_in_acres, 2)),
                fertilizer: Some(line.fertilizer_code.as_str()),
                quantity_kg: Some(line.quantity_kg),
                unit_price: Some(line.unit_price),
                cost: Some(line.cost),
                plot_total_cost: Some(result.total_cost),
                expected_yield_quintals: Some(result.expected_yield_quintals),
                cost_per_quintal: Some(result.cost_per_quintal),
                error: None,
            })?;
        }
    }

    for failure in &report.failed {
        writer.serialize(ReportRow {
            plot_id: &failure.plot_id,
            crop: None,
            area_acres: None,
            fertilizer: None,
            quantity_kg: None,
            unit_price: None,
            cost: None,
            plot_total_cost: None,
            expected_yield_quintals: None,
            cost_per_quintal: None,
            error: Some(failure.error.as_str()),
        })?;
    }

    writer
        .into_inner()
        .map_err(|e| FarmCalcError::IoError(e.into_error()))
}

#[async_trait::async_trait]
impl<S: Storage, C: ConfigProvider> Pipeline for BatchPipeline<S, C> {
    async fn extract(&self) -> Result<Vec<PlotInput>> {
        tracing::debug!("Reading plots from: {}", self.config.input_path());
        let data = self.storage.read_file(self.config.input_path()).await?;

        let mut reader = csv::ReaderBuilder::new()
            .trim(csv::Trim::All)
            .flexible(true)
            .from_reader(data.as_slice());

        let mut plots = Vec::new();
        for (i, record) in reader.deserialize::<PlotRow>().enumerate() {
            let fallback_id = format!("row-{}", i + 1);
            let input = match record {
                Ok(row) => PlotInput {
                    plot_id: if row.plot_id.is_empty() {
                        fallback_id
                    } else {
                        row.plot_id.clone()
                    },
                    request: parse_row(&row).map_err(|e| e.to_string()),
                },
                // 單列格式錯誤只影響該列
                Err(e) => {
                    tracing::warn!("⚠️ Unreadable plot row {}: {}", i + 1, e);
                    PlotInput {
                        plot_id: fallback_id,
                        request: Err(format!("Unreadable row: {}", e)),
                    }
                }
            };
            plots.push(input);
        }

        if plots.is_empty() {
            return Err(FarmCalcError::ProcessingError {
                message: format!("no plots found in {}", self.config.input_path()),
            });
        }

        Ok(plots)
    }

    async fn transform(&self, plots: Vec<PlotInput>) -> Result<PlanReport> {
        let mut planned = Vec::new();
        let mut failed = Vec::new();

        for plot in plots {
            let outcome = match plot.request {
                Ok(request) => self.calculator.calculate(&request).map_err(|e| e.to_string()),
                Err(message) => Err(message),
            };

            match outcome {
                Ok(result) => planned.push(PlotPlan {
                    plot_id: plot.plot_id,
                    result,
                }),
                Err(error) => {
                    tracing::warn!("⚠️ Plot {} skipped: {}", plot.plot_id, error);
                    failed.push(PlotFailure {
                        plot_id: plot.plot_id,
                        error,
                    });
                }
            }
        }

        let grand_total_cost = round_to(planned.iter().map(|p| p.result.total_cost).sum(), 2);

        Ok(PlanReport {
            generated_at: chrono::Utc::now(),
            plots: planned,
            failed,
            grand_total_cost,
        })
    }

    async fn load(&self, report: PlanReport) -> Result<String> {
        if self.writes("csv") {
            let data = render_csv(&report)?;
            self.storage.write_file(&self.output_file(REPORT_CSV), &data).await?;
            tracing::debug!("Wrote {}", REPORT_CSV);
        }

        if self.writes("json") {
            let data = serde_json::to_vec_pretty(&report)?;
            self.storage.write_file(&self.output_file(REPORT_JSON), &data).await?;
            tracing::debug!("Wrote {}", REPORT_JSON);
        }

        Ok(self.config.output_path().to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::cli::LocalStorage;
    use crate::config::BatchSettings;
    use tempfile::TempDir;

    fn pipeline(dir: &TempDir, csv: &str) -> BatchPipeline<LocalStorage, BatchSettings> {
        std::fs::write(dir.path().join("plots.csv"), csv).unwrap();
        BatchPipeline::new(
            LocalStorage::new(dir.path()),
            BatchSettings::new("plots.csv", "out"),
            Arc::new(ReferenceTable::builtin()),
        )
    }

    #[tokio::test]
    async fn test_extract_parses_rows_and_keeps_bad_ones() {
        let dir = TempDir::new().unwrap();
        let pipeline = pipeline(
            &dir,
            "plot_id,area,unit,crop,target_yield\nnorth,10,acres,wheat,\n,abc,acres,rice,\n",
        );

        let plots = pipeline.extract().await.unwrap();
        assert_eq!(plots.len(), 2);
        assert_eq!(plots[0].plot_id, "north");
        assert!(plots[0].request.is_ok());
        assert_eq!(plots[1].plot_id, "row-2");
        assert!(plots[1].request.is_err());
    }

    #[tokio::test]
    async fn test_short_rows_do_not_abort_extract() {
        let dir = TempDir::new().unwrap();
        let pipeline = pipeline(
            &dir,
            "plot_id,area,unit,crop,target_yield\na,10,acres,wheat,\nb,2,acres,rice\nc\n",
        );

        let plots = pipeline.extract().await.unwrap();
        assert_eq!(plots.len(), 3);

        let rice = plots[1].request.as_ref().unwrap();
        assert_eq!(rice.crop_id, "rice");
        assert_eq!(rice.target_yield_per_acre, None);

        assert_eq!(plots[2].plot_id, "row-3");
        assert!(plots[2].request.is_err());

        let report = pipeline.transform(plots).await.unwrap();
        assert_eq!(report.plots.len(), 2);
        assert_eq!(report.failed.len(), 1);
    }

    #[tokio::test]
    async fn test_empty_input_is_processing_error() {
        let dir = TempDir::new().unwrap();
        let pipeline = pipeline(&dir, "plot_id,area,unit,crop,target_yield\n");

        assert!(matches!(
            pipeline.extract().await,
            Err(FarmCalcError::ProcessingError { .. })
        ));
    }

    #[tokio::test]
    async fn test_transform_sums_successful_plots() {
        let dir = TempDir::new().unwrap();
        let pipeline = pipeline(
            &dir,
            "plot_id,area,unit,crop,target_yield\na,10,acres,wheat,\nb,1,acres,sugarcane,400\nc,2,acres,barley,\n",
        );

        let plots = pipeline.extract().await.unwrap();
        let report = pipeline.transform(plots).await.unwrap();

        assert_eq!(report.plots.len(), 2);
        assert_eq!(report.failed.len(), 1);
        assert!(report.failed[0].error.contains("barley"));
        assert_eq!(report.grand_total_cost, 43950.0 + 7050.0);
    }

    #[test]
    fn test_render_csv_has_one_line_per_fertilizer() {
        let calculator = FertilizerCalculator::new(Arc::new(ReferenceTable::builtin()));
        let report = PlanReport {
            generated_at: chrono::Utc::now(),
            plots: vec![PlotPlan {
                plot_id: "a".to_string(),
                result: calculator
                    .calculate(&CalculationRequest::new(10.0, AreaUnit::Acres, "wheat"))
                    .unwrap(),
            }],
            failed: vec![PlotFailure {
                plot_id: "b".to_string(),
                error: "Unknown crop: barley".to_string(),
            }],
            grand_total_cost: 43950.0,
        };

        let text = String::from_utf8(render_csv(&report).unwrap()).unwrap();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines.len(), 5);
        assert!(lines[0].starts_with("plot_id,crop,area_acres,fertilizer"));
        assert!(lines[1].starts_with("a,wheat,10.0,urea,1300.0,6.5,8450.0"));
        assert!(lines[4].starts_with("b,,,,"));
        assert!(lines[4].ends_with("Unknown crop: barley"));
    }
}
