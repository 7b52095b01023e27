pub mod batch;
pub mod calculator;
pub mod engine;
pub mod reference;
pub mod soil;

pub use crate::domain::model::{CalculationRequest, CalculationResult, PlanReport};
pub use crate::domain::ports::{ConfigProvider, Pipeline, PlotInput, Storage};
pub use crate::utils::error::Result;
