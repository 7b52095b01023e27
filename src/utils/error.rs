use thiserror::Error;

#[derive(Error, Debug)]
pub enum FarmCalcError {
    #[error("Invalid farm area '{value}': {reason}")]
    InvalidArea { value: String, reason: String },

    #[error("Invalid target yield '{value}': {reason}")]
    InvalidYield { value: String, reason: String },

    #[error("Unknown crop: {crop_id}")]
    UnknownCrop { crop_id: String },

    #[error("Expected yield for crop '{crop_id}' is zero, cost per quintal is undefined")]
    DegenerateYield { crop_id: String },

    #[error("Invalid soil query: {message}")]
    InvalidSoilQuery { message: String },

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("CSV processing error: {0}")]
    CsvError(#[from] csv::Error),

    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    #[error("Configuration error: {message}")]
    ConfigError { message: String },

    #[error("Configuration validation failed for '{field}': {message}")]
    ConfigValidationError { field: String, message: String },

    #[error("Invalid value '{value}' for '{field}': {reason}")]
    InvalidConfigValueError {
        field: String,
        value: String,
        reason: String,
    },

    #[error("Missing required configuration: {field}")]
    MissingConfigError { field: String },

    #[error("Data processing error: {message}")]
    ProcessingError { message: String },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    Input,
    ReferenceData,
    Configuration,
    Io,
    Processing,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum ErrorSeverity {
    Medium,
    High,
    Critical,
}

impl ErrorSeverity {
    /// CLI 結束代碼
    pub fn exit_code(self) -> i32 {
        match self {
            Self::Medium => 2,
            Self::High => 1,
            Self::Critical => 3,
        }
    }
}

impl FarmCalcError {
    pub fn category(&self) -> ErrorCategory {
        match self {
            Self::InvalidArea { .. }
            | Self::InvalidYield { .. }
            | Self::UnknownCrop { .. }
            | Self::InvalidSoilQuery { .. } => ErrorCategory::Input,
            Self::DegenerateYield { .. } => ErrorCategory::ReferenceData,
            Self::ConfigError { .. }
            | Self::ConfigValidationError { .. }
            | Self::InvalidConfigValueError { .. }
            | Self::MissingConfigError { .. } => ErrorCategory::Configuration,
            Self::IoError(_) => ErrorCategory::Io,
            Self::CsvError(_) | Self::SerializationError(_) | Self::ProcessingError { .. } => {
                ErrorCategory::Processing
            }
        }
    }

    pub fn severity(&self) -> ErrorSeverity {
        match self.category() {
            ErrorCategory::Input => ErrorSeverity::High,
            ErrorCategory::Processing => ErrorSeverity::Medium,
            ErrorCategory::Configuration => ErrorSeverity::High,
            ErrorCategory::ReferenceData | ErrorCategory::Io => ErrorSeverity::Critical,
        }
    }

    /// 給終端使用者看的簡短訊息
    pub fn user_friendly_message(&self) -> String {
        match self {
            Self::InvalidArea { value, .. } => {
                format!("Farm area '{}' is not a positive number", value)
            }
            Self::InvalidYield { value, .. } => {
                format!("Target yield '{}' is not a positive number", value)
            }
            Self::UnknownCrop { crop_id } => format!("Crop '{}' is not supported", crop_id),
            Self::DegenerateYield { crop_id } => format!(
                "Crop '{}' has no expected yield, cost per quintal cannot be computed",
                crop_id
            ),
            Self::InvalidSoilQuery { message } => format!("Soil analysis input: {}", message),
            Self::IoError(e) => format!("File access failed: {}", e),
            Self::CsvError(e) => format!("Could not read or write CSV: {}", e),
            Self::SerializationError(e) => format!("Could not produce JSON: {}", e),
            Self::ConfigError { message } => format!("Configuration problem: {}", message),
            Self::ConfigValidationError { field, message } => {
                format!("Configuration field '{}' is invalid: {}", field, message)
            }
            Self::InvalidConfigValueError { field, reason, .. } => {
                format!("Configuration field '{}' is invalid: {}", field, reason)
            }
            Self::MissingConfigError { field } => {
                format!("Configuration field '{}' is required", field)
            }
            Self::ProcessingError { message } => format!("Processing failed: {}", message),
        }
    }

    pub fn recovery_suggestion(&self) -> &'static str {
        match self {
            Self::InvalidArea { .. } => "Enter the farm area as a number greater than zero",
            Self::InvalidYield { .. } => {
                "Leave the target yield empty or enter a number greater than zero"
            }
            Self::UnknownCrop { .. } => "Run `farm-calc crops` to list the supported crops",
            Self::DegenerateYield { .. } => {
                "Give the crop a positive baseline yield in the reference file or pass --target-yield"
            }
            Self::InvalidSoilQuery { .. } => "Fill in district, soil colour and temperature",
            Self::IoError(_) => "Check that the path exists and is readable/writable",
            Self::CsvError(_) => "Check the CSV header: plot_id,area,unit,crop,target_yield",
            Self::SerializationError(_) => "Retry with --formats csv",
            Self::ConfigError { .. }
            | Self::ConfigValidationError { .. }
            | Self::InvalidConfigValueError { .. }
            | Self::MissingConfigError { .. } => "Fix the reference TOML file and run again",
            Self::ProcessingError { .. } => "Check the input file contents",
        }
    }
}

pub type Result<T> = std::result::Result<T, FarmCalcError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_calculator_errors_are_input_errors() {
        let err = FarmCalcError::UnknownCrop {
            crop_id: "unknown_crop".to_string(),
        };
        assert_eq!(err.category(), ErrorCategory::Input);
        assert_eq!(err.severity(), ErrorSeverity::High);
        assert!(err.user_friendly_message().contains("unknown_crop"));
    }

    #[test]
    fn test_degenerate_yield_is_critical() {
        let err = FarmCalcError::DegenerateYield {
            crop_id: "fallow".to_string(),
        };
        assert_eq!(err.category(), ErrorCategory::ReferenceData);
        assert_eq!(err.severity(), ErrorSeverity::Critical);
    }

    #[test]
    fn test_io_error_conversion() {
        let io = std::io::Error::new(std::io::ErrorKind::NotFound, "plots.csv");
        let err: FarmCalcError = io.into();
        assert_eq!(err.category(), ErrorCategory::Io);
        assert!(err.to_string().contains("plots.csv"));
    }

    #[test]
    fn test_exit_codes_follow_severity() {
        let input = FarmCalcError::InvalidArea {
            value: "abc".to_string(),
            reason: "not a number".to_string(),
        };
        let batch = FarmCalcError::ProcessingError {
            message: "no plots".to_string(),
        };
        let io: FarmCalcError = std::io::Error::other("disk").into();

        assert_eq!(input.severity().exit_code(), 1);
        assert_eq!(batch.severity().exit_code(), 2);
        assert_eq!(io.severity().exit_code(), 3);
    }
}
