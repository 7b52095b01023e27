use crate::domain::model::{CalculationRequest, PlanReport};
use crate::utils::error::Result;
use async_trait::async_trait;

pub trait Storage: Send + Sync {
    fn read_file(&self, path: &str) -> impl std::future::Future<Output = Result<Vec<u8>>> + Send;
    fn write_file(
        &self,
        path: &str,
        data: &[u8],
    ) -> impl std::future::Future<Output = Result<()>> + Send;
}

pub trait ConfigProvider: Send + Sync {
    fn input_path(&self) -> &str;
    fn output_path(&self) -> &str;
    fn output_formats(&self) -> &[String];
}

/// A plot waiting to be planned. Rows that failed to parse keep their error.
#[derive(Debug, Clone)]
pub struct PlotInput {
    pub plot_id: String,
    pub request: std::result::Result<CalculationRequest, String>,
}

#[async_trait]
pub trait Pipeline: Send + Sync {
    async fn extract(&self) -> Result<Vec<PlotInput>>;
    async fn transform(&self, plots: Vec<PlotInput>) -> Result<PlanReport>;
    async fn load(&self, report: PlanReport) -> Result<String>;
}
