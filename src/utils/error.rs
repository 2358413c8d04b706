use thiserror::Error;

#[derive(Error, Debug)]
pub enum ProxyError {
    #[error("API request failed: {0}")]
    ApiError(#[from] reqwest::Error),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    #[error("Configuration error: {message}")]
    ConfigError { message: String },

    #[error("Missing required configuration: {field}")]
    MissingConfigError { field: String },

    #[error("Invalid value '{value}' for {field}: {reason}")]
    InvalidConfigValueError {
        field: String,
        value: String,
        reason: String,
    },

    #[error("Configuration validation failed for {field}: {message}")]
    ConfigValidationError { field: String, message: String },

    #[error("Validation error: {message}")]
    ValidationError { message: String },

    #[error("SerpApi returned HTTP {status}: {message}")]
    UpstreamStatus { status: u16, message: String },

}

/// 錯誤分類，用於日誌與退出碼
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    Configuration,
    Network,
    Upstream,
    Data,
    System,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum ErrorSeverity {
    Low,
    Medium,
    High,
    Critical,
}

impl ProxyError {
    pub fn category(&self) -> ErrorCategory {
        match self {
            ProxyError::ConfigError { .. }
            | ProxyError::MissingConfigError { .. }
            | ProxyError::InvalidConfigValueError { .. }
            | ProxyError::ConfigValidationError { .. } => ErrorCategory::Configuration,
            ProxyError::ApiError(_) => ErrorCategory::Network,
            ProxyError::UpstreamStatus { .. } => ErrorCategory::Upstream,
            ProxyError::SerializationError(_) | ProxyError::ValidationError { .. } => {
                ErrorCategory::Data
            }
            ProxyError::IoError(_) => ErrorCategory::System,
        }
    }

    pub fn severity(&self) -> ErrorSeverity {
        match self {
            ProxyError::ValidationError { .. } => ErrorSeverity::Low,
            ProxyError::ApiError(_) | ProxyError::UpstreamStatus { .. } => ErrorSeverity::Medium,
            ProxyError::ConfigError { .. }
            | ProxyError::MissingConfigError { .. }
            | ProxyError::InvalidConfigValueError { .. }
            | ProxyError::ConfigValidationError { .. }
            | ProxyError::SerializationError(_) => ErrorSeverity::High,
            ProxyError::IoError(_) => ErrorSeverity::Critical,
        }
    }

    /// 上游回應的 HTTP 狀態碼（若有）
    pub fn upstream_status(&self) -> Option<u16> {
        match self {
            ProxyError::UpstreamStatus { status, .. } => Some(*status),
            ProxyError::ApiError(e) => e.status().map(|s| s.as_u16()),
            _ => None,
        }
    }

    pub fn recovery_suggestion(&self) -> String {
        match self {
            ProxyError::MissingConfigError { field } => format!(
                "Set the {} environment variable (or add it to your .env / config file) and restart",
                field
            ),
            ProxyError::InvalidConfigValueError { field, .. }
            | ProxyError::ConfigValidationError { field, .. } => {
                format!("Check the value of '{}' in your flags, environment or config file", field)
            }
            ProxyError::ConfigError { .. } => {
                "Check the configuration file exists and is valid TOML".to_string()
            }
            ProxyError::ApiError(_) => {
                "Check network connectivity to SerpApi or increase SERPAPI_TIMEOUT_SECS".to_string()
            }
            ProxyError::UpstreamStatus { status: 429, .. } => {
                "Wait before retrying or upgrade the SerpApi plan".to_string()
            }
            ProxyError::UpstreamStatus { status: 401 | 403, .. } => {
                "Verify the SerpApi API key and subscription".to_string()
            }
            ProxyError::UpstreamStatus { .. } => {
                "Check the search parameters against the SerpApi engine documentation".to_string()
            }
            ProxyError::SerializationError(_) | ProxyError::ValidationError { .. } => {
                "Check the request payload format".to_string()
            }
            ProxyError::IoError(_) => {
                "Check the listen address is free and the process has permission to bind it"
                    .to_string()
            }
        }
    }

    pub fn user_friendly_message(&self) -> String {
        match self.category() {
            ErrorCategory::Configuration => format!("Configuration problem: {}", self),
            ErrorCategory::Network => format!("Could not reach SerpApi: {}", self),
            ErrorCategory::Upstream => format!("SerpApi rejected the request: {}", self),
            ErrorCategory::Data => format!("Invalid data: {}", self),
            ErrorCategory::System => format!("System failure: {}", self),
        }
    }

    /// 依嚴重程度決定程序退出碼
    pub fn exit_code(&self) -> i32 {
        match self.severity() {
            ErrorSeverity::Low => 0,
            ErrorSeverity::Medium => 2,
            ErrorSeverity::High => 1,
            ErrorSeverity::Critical => 3,
        }
    }
}

pub type Result<T> = std::result::Result<T, ProxyError>;
