use crate::core::Pipeline;
use crate::utils::error::Result;

pub struct PlannerEngine<P: Pipeline> {
    pipeline: P,
}

impl<P: Pipeline> PlannerEngine<P> {
    pub fn new(pipeline: P) -> Self {
        Self { pipeline }
    }

    pub async fn run(&self) -> Result<String> {
        tracing::info!("Starting batch planning...");

        // Extract
        let plots = self.pipeline.extract().await?;
        tracing::info!("Read {} plots", plots.len());

        // Transform
        let report = self.pipeline.transform(plots).await?;
        tracing::info!(
            "Planned {} plots ({} failed), grand total ₹{:.2}",
            report.plots.len(),
            report.failed.len(),
            report.grand_total_cost
        );

        // Load
        let output_path = self.pipeline.load(report).await?;
        tracing::info!("Report saved to: {}", output_path);

        Ok(output_path)
    }
}
