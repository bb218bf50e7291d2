pub mod adapters;
pub mod config;
pub mod core;
pub mod domain;
pub mod utils;

#[cfg(feature = "cli")]
pub use config::CliConfig;
pub use config::TomlConfig;

pub use adapters::{ConsolePresenter, HttpCuttingApi, LocalStorage};
pub use crate::core::{
    CandidateFile, CutFrameEngine, DownloadOutcome, DownloadReceipt, ProcessFailure,
    SubmitOutcome,
};
pub use domain::model::{ExportFormat, ProcessType, ProcessedResult, WorkflowPhase};
pub use domain::notification::Notification;
pub use domain::ports::{ConfigProvider, CuttingApi, Presenter, Storage};
pub use utils::error::{CutFrameError, Result};
