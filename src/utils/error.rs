use crate::domain::model::WorkflowPhase;
use crate::core::state::PhaseEvent;
use thiserror::Error;

/// Why the validator refused a candidate file.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    #[error("unsupported file type")]
    UnsupportedType { extension: String },

    #[error("file too large")]
    TooLarge { size: u64, limit: u64 },
}

/// A user action invoked without the state it needs. No request is issued.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum PreconditionError {
    #[error("please select a file first")]
    NoFile,

    #[error("no data available to download")]
    NoResult,
}

#[derive(Error, Debug)]
pub enum CutFrameError {
    #[error("HTTP request failed: {0}")]
    HttpError(#[from] reqwest::Error),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    #[error("Configuration error: {message}")]
    ConfigError { message: String },

    #[error("Configuration error in {field}: {message}")]
    ConfigValidationError { field: String, message: String },

    #[error("Invalid value '{value}' for {field}: {reason}")]
    InvalidConfigValueError {
        field: String,
        value: String,
        reason: String,
    },

    #[error("Missing required configuration: {field}")]
    MissingConfigError { field: String },

    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error("HTTP error! status: {status}")]
    TransportError { status: u16 },

    #[error("{message}")]
    ApplicationError { message: String },

    #[error(transparent)]
    Precondition(#[from] PreconditionError),

    #[error("Transition '{event}' is not allowed while {from}")]
    InvalidTransition {
        from: WorkflowPhase,
        event: PhaseEvent,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    Configuration,
    Validation,
    Transport,
    Application,
    Precondition,
    System,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum ErrorSeverity {
    Low,
    Medium,
    High,
    Critical,
}

impl CutFrameError {
    pub fn category(&self) -> ErrorCategory {
        match self {
            CutFrameError::ConfigError { .. }
            | CutFrameError::ConfigValidationError { .. }
            | CutFrameError::InvalidConfigValueError { .. }
            | CutFrameError::MissingConfigError { .. } => ErrorCategory::Configuration,
            CutFrameError::Validation(_) => ErrorCategory::Validation,
            CutFrameError::HttpError(_) | CutFrameError::TransportError { .. } => {
                ErrorCategory::Transport
            }
            CutFrameError::ApplicationError { .. } | CutFrameError::SerializationError(_) => {
                ErrorCategory::Application
            }
            CutFrameError::Precondition(_) | CutFrameError::InvalidTransition { .. } => {
                ErrorCategory::Precondition
            }
            CutFrameError::IoError(_) => ErrorCategory::System,
        }
    }

    pub fn severity(&self) -> ErrorSeverity {
        match self.category() {
            ErrorCategory::Precondition => ErrorSeverity::Low,
            ErrorCategory::Transport => ErrorSeverity::Medium,
            ErrorCategory::Validation | ErrorCategory::Application => ErrorSeverity::High,
            ErrorCategory::Configuration | ErrorCategory::System => ErrorSeverity::Critical,
        }
    }

    /// One line suitable for showing to the person at the keyboard.
    pub fn user_friendly_message(&self) -> String {
        match self {
            CutFrameError::HttpError(e) if e.is_connect() => {
                "Could not reach the cutting service".to_string()
            }
            CutFrameError::HttpError(e) if e.is_timeout() => {
                "The cutting service did not answer in time".to_string()
            }
            CutFrameError::Validation(e) => format!("File rejected: {}", e),
            CutFrameError::TransportError { .. } | CutFrameError::ApplicationError { .. } => {
                format!("Error processing file: {}", self)
            }
            _ => self.to_string(),
        }
    }

    pub fn recovery_suggestion(&self) -> &'static str {
        match self {
            CutFrameError::Validation(ValidationError::UnsupportedType { .. }) => {
                "Choose an Excel file (.xlsx, .xls, .xlsm)"
            }
            CutFrameError::Validation(ValidationError::TooLarge { .. }) => {
                "Split the workbook so each file stays under 10MB"
            }
            CutFrameError::Precondition(PreconditionError::NoFile) => {
                "Select a spreadsheet before submitting"
            }
            CutFrameError::Precondition(PreconditionError::NoResult) => {
                "Process a file successfully before downloading"
            }
            CutFrameError::InvalidTransition { .. } => "Wait for the current request to finish",
            CutFrameError::HttpError(_) | CutFrameError::TransportError { .. } => {
                "Check that the service URL is correct and the service is running, then retry"
            }
            CutFrameError::ApplicationError { .. } | CutFrameError::SerializationError(_) => {
                "Check the spreadsheet contents and the selected process type, then resubmit"
            }
            CutFrameError::IoError(_) => "Check that the output directory is writable",
            CutFrameError::ConfigError { .. }
            | CutFrameError::ConfigValidationError { .. }
            | CutFrameError::InvalidConfigValueError { .. }
            | CutFrameError::MissingConfigError { .. } => {
                "Fix the configuration file or command line arguments"
            }
        }
    }
}

pub type Result<T> = std::result::Result<T, CutFrameError>;
