use thiserror::Error;

#[derive(Error, Debug)]
pub enum CompError {
    #[error("Invalid value for '{field}' ({value}): {reason}")]
    InvalidConfigValueError {
        field: String,
        value: String,
        reason: String,
    },

    #[error("Missing required column: {column}")]
    MissingColumnError { column: String },

    #[error("Malformed input at line {line}: {message}")]
    MalformedInputError { line: u64, message: String },

    #[error("CSV processing error: {0}")]
    CsvError(#[from] csv::Error),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("TOML parsing error: {0}")]
    TomlError(#[from] toml::de::Error),

    #[error("Zip operation failed: {0}")]
    ZipError(#[from] zip::result::ZipError),

    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    #[error("PDF rendering failed: {0}")]
    PdfError(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    Configuration,
    Input,
    Rendering,
    System,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum ErrorSeverity {
    Medium,
    High,
    Critical,
}

impl ErrorSeverity {
    /// 任何錯誤都以非零結束，0 只留給成功的執行
    pub fn exit_code(self) -> i32 {
        match self {
            ErrorSeverity::Medium => 2,
            ErrorSeverity::High => 1,
            ErrorSeverity::Critical => 3,
        }
    }
}

impl CompError {
    pub fn category(&self) -> ErrorCategory {
        match self {
            CompError::InvalidConfigValueError { .. } | CompError::TomlError(_) => {
                ErrorCategory::Configuration
            }
            CompError::MissingColumnError { .. }
            | CompError::MalformedInputError { .. }
            | CompError::CsvError(_) => ErrorCategory::Input,
            CompError::PdfError(_) | CompError::ZipError(_) | CompError::SerializationError(_) => {
                ErrorCategory::Rendering
            }
            CompError::IoError(_) => ErrorCategory::System,
        }
    }

    pub fn severity(&self) -> ErrorSeverity {
        match self.category() {
            ErrorCategory::Configuration | ErrorCategory::Input => ErrorSeverity::High,
            ErrorCategory::Rendering => ErrorSeverity::Medium,
            ErrorCategory::System => ErrorSeverity::Critical,
        }
    }

    pub fn recovery_suggestion(&self) -> String {
        match self {
            CompError::InvalidConfigValueError { field, .. } => {
                format!("Check the value given for '{}' and run again", field)
            }
            CompError::MissingColumnError { column } => format!(
                "Add a '{}' column to the header row of the competitor CSV",
                column
            ),
            CompError::MalformedInputError { line, .. } => {
                format!("Fix line {} of the competitor CSV", line)
            }
            CompError::CsvError(_) => {
                "Make sure every row has the same number of fields as the header".to_string()
            }
            CompError::TomlError(_) => "Check the TOML config file syntax".to_string(),
            CompError::IoError(_) => {
                "Check that the paths exist and that you have permission to write the output folder"
                    .to_string()
            }
            CompError::PdfError(_) | CompError::ZipError(_) | CompError::SerializationError(_) => {
                "Retry the run; if it keeps failing, run with --verbose and report the log"
                    .to_string()
            }
        }
    }

    pub fn user_friendly_message(&self) -> String {
        match self.category() {
            ErrorCategory::Configuration => format!("Configuration problem: {}", self),
            ErrorCategory::Input => format!("Could not read the competitor table: {}", self),
            ErrorCategory::Rendering => format!("Could not produce the output files: {}", self),
            ErrorCategory::System => format!("System error: {}", self),
        }
    }
}

pub type Result<T> = std::result::Result<T, CompError>;
