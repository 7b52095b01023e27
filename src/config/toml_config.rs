use crate::core::reference::{CropFormulation, ReferenceTable};
use crate::core::soil::{SoilEntry, SoilTable};
use crate::domain::model::{CropProfile, FertilizerFormulation, FertilizerProduct, SoilProfile};
use crate::utils::error::{FarmCalcError, Result};
use crate::utils::validation::{self, Validate};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// 參考資料檔：作物、肥料配方、肥料名稱、土壤資料與批次設定
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ReferenceConfig {
    #[serde(default)]
    pub crops: Vec<CropSection>,
    #[serde(default)]
    pub formulations: Vec<FormulationSection>,
    #[serde(default)]
    pub fertilizers: Vec<FertilizerSection>,
    #[serde(default)]
    pub soils: Vec<SoilSection>,
    pub soil_fallback: Option<SoilProfile>,
    pub batch: Option<BatchSection>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CropSection {
    pub id: String,
    pub display_name: String,
    pub baseline_yield_per_acre: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FormulationSection {
    pub crop: String,
    pub fertilizer: String,
    /// kg per acre
    pub rate: f64,
    /// price per kg
    pub price: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FertilizerSection {
    pub code: String,
    pub display_name: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SoilSection {
    pub district: String,
    pub soil_color: String,
    #[serde(flatten)]
    pub profile: SoilProfile,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct BatchSection {
    pub input_path: Option<String>,
    pub output_path: Option<String>,
    pub output_formats: Option<Vec<String>>,
}

impl ReferenceConfig {
    /// 從 TOML 檔案載入配置
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(&path).map_err(FarmCalcError::IoError)?;
        Self::from_toml_str(&content)
    }

    /// 從 TOML 字串解析配置
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let processed_content = Self::substitute_env_vars(content)?;

        toml::from_str(&processed_content).map_err(|e| FarmCalcError::ConfigValidationError {
            field: "toml_parsing".to_string(),
            message: format!("TOML parsing error: {}", e),
        })
    }

    /// 替換環境變數 (例如 ${UREA_PRICE})，找不到的變數保持原樣
    fn substitute_env_vars(content: &str) -> Result<String> {
        use regex::Regex;
        let re = Regex::new(r"\$\{([^}]+)\}").map_err(|e| FarmCalcError::ConfigError {
            message: format!("env substitution pattern: {}", e),
        })?;

        let result = re.replace_all(content, |caps: &regex::Captures| {
            let var_name = &caps[1];
            std::env::var(var_name).unwrap_or_else(|_| format!("${{{}}}", var_name))
        });

        Ok(result.to_string())
    }

    /// Crop table from the file, or the built-in one when the file has no crops.
    pub fn reference_table(&self) -> Result<ReferenceTable> {
        if self.crops.is_empty() {
            if !self.formulations.is_empty() {
                return Err(FarmCalcError::MissingConfigError {
                    field: "crops".to_string(),
                });
            }
            let builtin = ReferenceTable::builtin();
            if self.fertilizers.is_empty() {
                return Ok(builtin);
            }
            // 只覆寫肥料名稱
            return self.table_from_parts(builtin.list_crops().to_vec(), builtin.formulation_rows());
        }

        let crops = self
            .crops
            .iter()
            .map(|c| CropProfile {
                id: c.id.clone(),
                display_name: c.display_name.clone(),
                baseline_yield_per_acre: c.baseline_yield_per_acre,
            })
            .collect();
        let formulations = self
            .formulations
            .iter()
            .map(|f| CropFormulation {
                crop_id: f.crop.clone(),
                formulation: FertilizerFormulation {
                    fertilizer_code: f.fertilizer.clone(),
                    application_rate_per_acre: f.rate,
                    unit_price: f.price,
                },
            })
            .collect();

        self.table_from_parts(crops, formulations)
    }

    fn table_from_parts(
        &self,
        crops: Vec<CropProfile>,
        formulations: Vec<CropFormulation>,
    ) -> Result<ReferenceTable> {
        let products = if self.fertilizers.is_empty() {
            ReferenceTable::builtin().products().to_vec()
        } else {
            self.fertilizers
                .iter()
                .map(|f| FertilizerProduct {
                    code: f.code.clone(),
                    display_name: f.display_name.clone(),
                })
                .collect()
        };
        ReferenceTable::new(crops, formulations, products)
    }

    pub fn soil_table(&self) -> Result<SoilTable> {
        if self.soils.is_empty() && self.soil_fallback.is_none() {
            return Ok(SoilTable::builtin());
        }

        let fallback = self
            .soil_fallback
            .clone()
            .unwrap_or_else(|| SoilTable::builtin().fallback().clone());
        let entries = self
            .soils
            .iter()
            .map(|s| SoilEntry {
                district: s.district.clone(),
                soil_color: s.soil_color.clone(),
                profile: s.profile.clone(),
            })
            .collect();

        SoilTable::new(entries, fallback)
    }

    pub fn validate_config(&self) -> Result<()> {
        for (i, crop) in self.crops.iter().enumerate() {
            validation::validate_non_empty_string(&format!("crops[{}].id", i), &crop.id)?;
            validation::validate_non_empty_string(
                &format!("crops[{}].display_name", i),
                &crop.display_name,
            )?;
        }

        for (i, f) in self.formulations.iter().enumerate() {
            validation::validate_positive_f64(&format!("formulations[{}].rate", i), f.rate)?;
            validation::validate_positive_f64(&format!("formulations[{}].price", i), f.price)?;
        }

        for (i, soil) in self.soils.iter().enumerate() {
            validation::validate_non_empty_string(&format!("soils[{}].district", i), &soil.district)?;
            validation::validate_non_empty_string(
                &format!("soils[{}].soil_color", i),
                &soil.soil_color,
            )?;
            validation::validate_range(&format!("soils[{}].ph", i), soil.profile.ph, 0.0, 14.0)?;
        }

        if let Some(batch) = &self.batch {
            if let Some(output) = &batch.output_path {
                validation::validate_path("batch.output_path", output)?;
            }
            if let Some(formats) = &batch.output_formats {
                validation::validate_output_formats("batch.output_formats", formats, &["csv", "json"])?;
            }
        }

        // 交叉檢查交給資料表建構
        self.reference_table()?;
        self.soil_table()?;

        Ok(())
    }
}

impl Validate for ReferenceConfig {
    fn validate(&self) -> Result<()> {
        self.validate_config()
    }
}
