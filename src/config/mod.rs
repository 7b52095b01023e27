pub mod cli;
pub mod toml_config;

use crate::core::ConfigProvider;
use crate::utils::error::{FarmCalcError, Result};
use crate::utils::validation::{self, Validate};
use serde::{Deserialize, Serialize};
use toml_config::BatchSection;

#[cfg(feature = "cli")]
use crate::domain::model::AreaUnit;
#[cfg(feature = "cli")]
use clap::{Args, Parser, Subcommand};

pub const DEFAULT_OUTPUT_PATH: &str = "./output";
pub const SUPPORTED_FORMATS: &[&str] = &["csv", "json"];

#[cfg(feature = "cli")]
#[derive(Debug, Clone, Parser)]
#[command(name = "farm-calc")]
#[command(about = "Fertilizer requirement calculator and soil parameter lookup")]
pub struct CliConfig {
    /// Reference data TOML (crops, formulations, fertilizers, soils)
    #[arg(long, global = true)]
    pub reference: Option<String>,

    #[arg(short, long, global = true, help = "Enable verbose output")]
    pub verbose: bool,

    #[arg(long, global = true, help = "Emit logs as JSON lines")]
    pub json_logs: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[cfg(feature = "cli")]
#[derive(Debug, Clone, Subcommand)]
pub enum Command {
    /// List supported crops and their fertilizer schedules
    Crops {
        #[arg(long)]
        json: bool,
    },
    /// Calculate fertilizer quantities and cost for one farm
    Calc(CalcArgs),
    /// Look up soil parameters for a district and soil colour
    Soil(SoilArgs),
    /// Plan every plot in a CSV file and write a report
    Batch(BatchArgs),
}

#[cfg(feature = "cli")]
#[derive(Debug, Clone, Args)]
pub struct CalcArgs {
    #[arg(long)]
    pub area: String,

    #[arg(long, value_enum, default_value_t = AreaUnit::Acres)]
    pub unit: AreaUnit,

    #[arg(long)]
    pub crop: String,

    /// Quintals per acre; defaults to the crop's baseline yield
    #[arg(long)]
    pub target_yield: Option<String>,

    #[arg(long)]
    pub json: bool,
}

#[cfg(feature = "cli")]
#[derive(Debug, Clone, Args)]
pub struct SoilArgs {
    /// Omit to list the districts with local soil data
    #[arg(long, requires_all = ["soil_color", "temperature"])]
    pub district: Option<String>,

    #[arg(long, requires = "district")]
    pub soil_color: Option<String>,

    /// Degrees Celsius
    #[arg(long, allow_negative_numbers = true, requires = "district")]
    pub temperature: Option<f64>,

    #[arg(long)]
    pub json: bool,
}

#[cfg(feature = "cli")]
#[derive(Debug, Clone, Args)]
pub struct BatchArgs {
    /// CSV with columns plot_id,area,unit,crop,target_yield
    #[arg(long)]
    pub input: Option<String>,

    #[arg(long)]
    pub output: Option<String>,

    #[arg(long, value_delimiter = ',')]
    pub formats: Vec<String>,
}

/// 批次規劃設定：命令列優先，其次是參考資料檔的 [batch]
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BatchSettings {
    pub input_path: String,
    pub output_path: String,
    pub output_formats: Vec<String>,
}

impl BatchSettings {
    pub fn new(input_path: impl Into<String>, output_path: impl Into<String>) -> Self {
        Self {
            input_path: input_path.into(),
            output_path: output_path.into(),
            output_formats: SUPPORTED_FORMATS.iter().map(|f| f.to_string()).collect(),
        }
    }

    pub fn resolve(
        input: Option<String>,
        output: Option<String>,
        formats: Vec<String>,
        section: Option<&BatchSection>,
    ) -> Result<Self> {
        let input_path = input
            .or_else(|| section.and_then(|s| s.input_path.clone()))
            .ok_or_else(|| FarmCalcError::MissingConfigError {
                field: "batch.input_path".to_string(),
            })?;
        let output_path = output
            .or_else(|| section.and_then(|s| s.output_path.clone()))
            .unwrap_or_else(|| DEFAULT_OUTPUT_PATH.to_string());
        let output_formats = if formats.is_empty() {
            section
                .and_then(|s| s.output_formats.clone())
                .unwrap_or_else(|| SUPPORTED_FORMATS.iter().map(|f| f.to_string()).collect())
        } else {
            formats
        };

        Ok(Self {
            input_path,
            output_path,
            output_formats,
        })
    }
}

impl ConfigProvider for BatchSettings {
    fn input_path(&self) -> &str {
        &self.input_path
    }

    fn output_path(&self) -> &str {
        &self.output_path
    }

    fn output_formats(&self) -> &[String] {
        &self.output_formats
    }
}

impl Validate for BatchSettings {
    fn validate(&self) -> Result<()> {
        validation::validate_path("batch.input_path", &self.input_path)?;
        validation::validate_path("batch.output_path", &self.output_path)?;
        validation::validate_output_formats("batch.output_formats", &self.output_formats, SUPPORTED_FORMATS)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_values_win_over_file() {
        let section = BatchSection {
            input_path: Some("file.csv".to_string()),
            output_path: Some("./file-out".to_string()),
            output_formats: Some(vec!["json".to_string()]),
        };
        let settings = BatchSettings::resolve(
            Some("cli.csv".to_string()),
            None,
            vec![],
            Some(&section),
        )
        .unwrap();

        assert_eq!(settings.input_path, "cli.csv");
        assert_eq!(settings.output_path, "./file-out");
        assert_eq!(settings.output_formats, vec!["json".to_string()]);
    }

    #[test]
    fn test_defaults_and_missing_input() {
        let settings = BatchSettings::resolve(Some("plots.csv".to_string()), None, vec![], None).unwrap();
        assert_eq!(settings.output_path, DEFAULT_OUTPUT_PATH);
        assert_eq!(settings.output_formats.len(), 2);
        assert!(settings.validate().is_ok());

        assert!(matches!(
            BatchSettings::resolve(None, None, vec![], None),
            Err(FarmCalcError::MissingConfigError { .. })
        ));
    }

    #[test]
    fn test_unsupported_format_rejected() {
        let settings = BatchSettings::resolve(
            Some("plots.csv".to_string()),
            None,
            vec!["xml".to_string()],
            None,
        )
        .unwrap();
        assert!(settings.validate().is_err());
    }

    #[cfg(feature = "cli")]
    #[test]
    fn test_parse_calc_command() {
        let config = CliConfig::parse_from([
            "farm-calc", "calc", "--area", "4", "--unit", "hectares", "--crop", "wheat",
        ]);
        match config.command {
            Command::Calc(args) => {
                assert_eq!(args.area, "4");
                assert_eq!(args.unit, AreaUnit::Hectares);
                assert_eq!(args.target_yield, None);
            }
            other => panic!("unexpected command {:?}", other),
        }
    }

    #[cfg(feature = "cli")]
    #[test]
    fn test_parse_batch_formats() {
        let config = CliConfig::parse_from([
            "farm-calc", "--verbose", "batch", "--input", "plots.csv", "--formats", "csv,json",
        ]);
        assert!(config.verbose);
        match config.command {
            Command::Batch(args) => assert_eq!(args.formats, vec!["csv", "json"]),
            other => panic!("unexpected command {:?}", other),
        }
    }

    #[cfg(feature = "cli")]
    #[test]
    fn test_parse_soil_command() {
        let config = CliConfig::parse_from([
            "farm-calc", "soil", "--district", "Kolhapur", "--soil-color", "Black", "--temperature", "-2.5",
        ]);
        match config.command {
            Command::Soil(args) => {
                assert_eq!(args.district.as_deref(), Some("Kolhapur"));
                assert_eq!(args.temperature, Some(-2.5));
            }
            other => panic!("unexpected command {:?}", other),
        }

        // 不帶參數時列出地區
        let config = CliConfig::parse_from(["farm-calc", "soil"]);
        assert!(matches!(config.command, Command::Soil(SoilArgs { district: None, .. })));

        assert!(CliConfig::try_parse_from(["farm-calc", "soil", "--district", "Kolhapur"]).is_err());
    }
}
