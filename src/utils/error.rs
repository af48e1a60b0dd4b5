use thiserror::Error;

#[derive(Error, Debug)]
pub enum StudioError {
    #[error("Upstream returned status {status_code}: {body}")]
    Upstream {
        status_code: u16,
        body: serde_json::Value,
    },

    #[error("Could not find image URL in upstream response: {body}")]
    MalformedResponse { body: serde_json::Value },

    #[error("Transport error: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("Generation cancelled at variant index {index}")]
    Cancelled { index: usize },

    #[error("Prompt cannot be empty or whitespace-only")]
    EmptyPrompt,

    #[error("No generated result with id {id}")]
    UnknownResult { id: String },

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    #[error("Configuration error in '{field}': {message}")]
    ConfigValidationError { field: String, message: String },

    #[error("Invalid value '{value}' for '{field}': {reason}")]
    InvalidConfigValueError {
        field: String,
        value: String,
        reason: String,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    Upstream,
    Network,
    Input,
    Configuration,
    System,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum ErrorSeverity {
    Low,
    Medium,
    High,
    Critical,
}

impl StudioError {
    pub fn category(&self) -> ErrorCategory {
        match self {
            StudioError::Upstream { .. } | StudioError::MalformedResponse { .. } => {
                ErrorCategory::Upstream
            }
            StudioError::Transport(_) => ErrorCategory::Network,
            StudioError::Cancelled { .. }
            | StudioError::EmptyPrompt
            | StudioError::UnknownResult { .. } => ErrorCategory::Input,
            StudioError::ConfigValidationError { .. }
            | StudioError::InvalidConfigValueError { .. } => ErrorCategory::Configuration,
            StudioError::IoError(_) | StudioError::SerializationError(_) => ErrorCategory::System,
        }
    }

    pub fn severity(&self) -> ErrorSeverity {
        match self {
            StudioError::Cancelled { .. } => ErrorSeverity::Low,
            StudioError::Transport(_) => ErrorSeverity::Medium,
            StudioError::Upstream { status_code, .. } if *status_code >= 500 => {
                ErrorSeverity::Medium
            }
            StudioError::Upstream { .. }
            | StudioError::MalformedResponse { .. }
            | StudioError::EmptyPrompt
            | StudioError::UnknownResult { .. } => ErrorSeverity::High,
            StudioError::ConfigValidationError { .. }
            | StudioError::InvalidConfigValueError { .. }
            | StudioError::IoError(_)
            | StudioError::SerializationError(_) => ErrorSeverity::Critical,
        }
    }

    /// 暫時性錯誤才值得重試：連線失敗、逾時、5xx 與 429
    pub fn is_retryable(&self) -> bool {
        match self {
            StudioError::Transport(_) => true,
            StudioError::Upstream { status_code, .. } => {
                *status_code >= 500 || *status_code == 429
            }
            _ => false,
        }
    }

    pub fn recovery_suggestion(&self) -> String {
        match self {
            StudioError::Upstream { status_code, .. } => match status_code {
                401 | 403 => "Check the API key (WAVE_API_KEY or --api-key)".to_string(),
                429 => "Rate limited; raise --variant-delay-ms or --max-retries".to_string(),
                s if *s >= 500 => "Upstream service is failing; try again later".to_string(),
                _ => "Inspect the upstream response body for details".to_string(),
            },
            StudioError::MalformedResponse { .. } => {
                "The endpoint answered in an unrecognized format; check the endpoint and model"
                    .to_string()
            }
            StudioError::Transport(e) if e.is_timeout() => {
                "Request timed out; raise --timeout-seconds".to_string()
            }
            StudioError::Transport(_) => {
                "Check network connectivity and the endpoint URL".to_string()
            }
            StudioError::Cancelled { .. } => "Run the generation again".to_string(),
            StudioError::EmptyPrompt => "Provide a non-empty prompt".to_string(),
            StudioError::UnknownResult { .. } => {
                "List results first and use one of their ids".to_string()
            }
            StudioError::ConfigValidationError { .. }
            | StudioError::InvalidConfigValueError { .. } => {
                "Fix the configuration file or command-line flags".to_string()
            }
            StudioError::IoError(_) => "Check file paths and permissions".to_string(),
            StudioError::SerializationError(_) => "Check the JSON payload".to_string(),
        }
    }

    pub fn user_friendly_message(&self) -> String {
        match self {
            StudioError::Upstream { status_code, body } => {
                format!("Failed to generate image: API returned {}: {}", status_code, body)
            }
            StudioError::MalformedResponse { body } => format!(
                "Failed to generate image: could not find image URL in API response: {}",
                body
            ),
            StudioError::Transport(e) => format!("Failed to reach the image service: {}", e),
            other => other.to_string(),
        }
    }
}

pub type Result<T> = std::result::Result<T, StudioError>;
