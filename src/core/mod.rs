pub mod download;
pub mod engine;
pub mod process;
pub mod renderer;
pub mod state;
pub mod validator;

#[cfg(test)]
pub(crate) mod testing;

pub use download::{DownloadOutcome, DownloadReceipt};
pub use engine::CutFrameEngine;
pub use process::{FailureKind, ProcessFailure, SubmitOutcome};
pub use validator::CandidateFile;
