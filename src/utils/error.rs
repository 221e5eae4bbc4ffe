use thiserror::Error;

#[derive(Error, Debug)]
pub enum EtlError {
    #[error("Zip operation failed: {0}")]
    ZipError(#[from] zip::result::ZipError),

    #[error("CSV processing error: {0}")]
    CsvError(#[from] csv::Error),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

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

    #[error("Invalid parameters: {message}")]
    InvalidParamsError { message: String },

    #[error("Data processing error: {message}")]
    ProcessingError { message: String },

    #[error("Validation error: {message}")]
    ValidationError { message: String },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    Io,
    Input,
    Configuration,
    Processing,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum ErrorSeverity {
    Low,
    Medium,
    High,
    Critical,
}

impl EtlError {
    pub fn category(&self) -> ErrorCategory {
        match self {
            EtlError::IoError(_) | EtlError::ZipError(_) => ErrorCategory::Io,
            EtlError::CsvError(_)
            | EtlError::InvalidParamsError { .. }
            | EtlError::ValidationError { .. } => ErrorCategory::Input,
            EtlError::ConfigError { .. }
            | EtlError::ConfigValidationError { .. }
            | EtlError::InvalidConfigValueError { .. } => ErrorCategory::Configuration,
            EtlError::SerializationError(_) | EtlError::ProcessingError { .. } => {
                ErrorCategory::Processing
            }
        }
    }

    pub fn severity(&self) -> ErrorSeverity {
        match self.category() {
            // 使用者輸入錯誤，修正後重跑即可
            ErrorCategory::Input => ErrorSeverity::Medium,
            ErrorCategory::Configuration | ErrorCategory::Processing => ErrorSeverity::High,
            ErrorCategory::Io => ErrorSeverity::Critical,
        }
    }

    /// 給終端使用者看的簡短訊息
    pub fn user_friendly_message(&self) -> String {
        match self {
            EtlError::IoError(e) => format!("無法讀寫檔案: {}", e),
            EtlError::ZipError(e) => format!("無法建立壓縮檔: {}", e),
            EtlError::CsvError(e) => format!("CSV 檔案格式錯誤: {}", e),
            EtlError::SerializationError(e) => format!("結果序列化失敗: {}", e),
            EtlError::InvalidParamsError { message } => format!("參數 JSON 無效: {}", message),
            EtlError::ValidationError { message } => format!("輸入驗證失敗: {}", message),
            EtlError::ProcessingError { message } => format!("資料處理失敗: {}", message),
            EtlError::ConfigError { .. }
            | EtlError::ConfigValidationError { .. }
            | EtlError::InvalidConfigValueError { .. } => format!("設定錯誤: {}", self),
        }
    }

    pub fn recovery_suggestion(&self) -> &'static str {
        match self {
            EtlError::IoError(_) => "Check that the input file exists and the output directory is writable",
            EtlError::ZipError(_) => "Retry without --compress or check free disk space",
            EtlError::CsvError(_) => "Make sure the upload is a CSV file with a header row",
            EtlError::SerializationError(_) => "Report this issue together with the input file",
            EtlError::InvalidParamsError { .. } => {
                "Check the parameter JSON against the documented keys and enum values"
            }
            EtlError::ValidationError { .. } => "Adjust the offending value and run again",
            EtlError::ProcessingError { .. } => "Inspect the input data for unexpected values",
            EtlError::ConfigError { .. }
            | EtlError::ConfigValidationError { .. }
            | EtlError::InvalidConfigValueError { .. } => {
                "Review the configuration file and command-line arguments"
            }
        }
    }
}

pub type Result<T> = std::result::Result<T, EtlError>;
