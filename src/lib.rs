pub mod config;
pub mod core;
pub mod domain;
pub mod utils;

#[cfg(feature = "cli")]
pub use config::CliConfig;

pub use config::{cli::LocalStorage, toml_config::ReferenceConfig, BatchSettings};
pub use crate::core::{
    batch::BatchPipeline,
    calculator::{calculate, FertilizerCalculator},
    engine::PlannerEngine,
    reference::ReferenceTable,
    soil::SoilTable,
};
pub use domain::model::{AreaUnit, CalculationRequest, CalculationResult, FertilizerLine};
pub use utils::error::{FarmCalcError, Result};
