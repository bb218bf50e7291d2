use crate::core::download::{DownloadOutcome, DownloadReceipt};
use crate::core::process::SubmitOutcome;
use crate::core::state::WorkflowState;
use crate::core::validator::{self, CandidateFile};
use crate::domain::model::{
    ExportFormat, ProcessType, ProcessedResult, UploadPolicy, UploadedFile, WorkflowPhase,
};
use crate::domain::notification::{Notification, StatusLine};
use crate::domain::ports::{CuttingApi, Presenter, Storage};
use crate::utils::error::{CutFrameError, Result};
use crate::utils::format::format_file_size;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::sync::Mutex;

/// Owns the workflow state and drives it: file selection here, submit in
/// `core::process`, download in `core::download`.
///
/// State is only touched between awaits. Each remote call also holds an
/// in-flight flag until its reply is handled, so a second click is turned away
/// even when a newer file moved the phase back to `Ready` in the meantime.
pub struct CutFrameEngine<A: CuttingApi, S: Storage, P: Presenter> {
    pub(crate) api: A,
    pub(crate) storage: S,
    pub(crate) presenter: P,
    pub(crate) state: Mutex<WorkflowState>,
    pub(crate) process_in_flight: AtomicBool,
    pub(crate) download_in_flight: AtomicBool,
    policy: UploadPolicy,
    process_type: Mutex<ProcessType>,
}

/// Set while a remote call is outstanding; cleared on every exit path.
pub(crate) struct InFlight<'a>(&'a AtomicBool);

impl<'a> InFlight<'a> {
    pub(crate) fn acquire(flag: &'a AtomicBool) -> Option<Self> {
        match flag.compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire) {
            Ok(_) => Some(Self(flag)),
            Err(_) => None,
        }
    }
}

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

impl<A: CuttingApi, S: Storage, P: Presenter> CutFrameEngine<A, S, P> {
    pub fn new(api: A, storage: S, presenter: P) -> Self {
        Self::with_policy(api, storage, presenter, UploadPolicy::default())
    }

    pub fn with_policy(api: A, storage: S, presenter: P, policy: UploadPolicy) -> Self {
        Self {
            api,
            storage,
            presenter,
            state: Mutex::new(WorkflowState::new()),
            process_in_flight: AtomicBool::new(false),
            download_in_flight: AtomicBool::new(false),
            policy,
            process_type: Mutex::new(ProcessType::default()),
        }
    }

    pub fn policy(&self) -> &UploadPolicy {
        &self.policy
    }

    pub fn storage(&self) -> &S {
        &self.storage
    }

    pub async fn phase(&self) -> WorkflowPhase {
        self.state.lock().await.phase()
    }

    pub async fn uploaded_file(&self) -> Option<Arc<UploadedFile>> {
        self.state.lock().await.file().cloned()
    }

    pub async fn processed_result(&self) -> Option<Arc<ProcessedResult>> {
        self.state.lock().await.result().cloned()
    }

    pub async fn process_type(&self) -> ProcessType {
        *self.process_type.lock().await
    }

    pub async fn set_process_type(&self, process_type: ProcessType) {
        tracing::debug!("Process type set to {}", process_type);
        *self.process_type.lock().await = process_type;
    }

    /// Validates and holds a newly selected file. A rejected file leaves the
    /// current state as it was.
    pub async fn select_file(&self, candidate: CandidateFile) -> Result<WorkflowPhase> {
        let name = candidate.name.clone();
        let file = match validator::validate(candidate, &self.policy) {
            Ok(file) => file,
            Err(e) => {
                tracing::warn!("Rejected {}: {}", name, e);
                self.presenter.notify(Notification::ValidationRejected {
                    reason: e.to_string(),
                });
                return Err(e.into());
            }
        };

        let size = format_file_size(file.size());
        let phase = self.state.lock().await.accept_file(file)?;
        let type_label = self.process_type().await.to_string();

        tracing::info!("Accepted {} ({})", name, size);
        self.presenter.notify(Notification::FileAccepted {
            name,
            type_label,
            size,
        });
        self.notify_phase(phase, None);
        Ok(phase)
    }

    pub(crate) fn notify_phase(&self, phase: WorkflowPhase, detail: Option<&str>) {
        self.presenter.notify(Notification::PhaseChanged {
            phase,
            status: StatusLine::for_phase(phase, detail),
        });
    }

    /// Select, submit, then download every requested format, stopping at the
    /// first failure.
    pub async fn run(
        &self,
        candidate: CandidateFile,
        process_type: ProcessType,
        formats: &[ExportFormat],
    ) -> Result<Vec<DownloadReceipt>> {
        self.set_process_type(process_type).await;
        self.select_file(candidate).await?;

        match self.submit().await? {
            SubmitOutcome::Completed(result) => {
                tracing::debug!("Processed {} rows", result.rows.len());
            }
            SubmitOutcome::Failed(failure) => return Err(failure.into_error()),
            other => {
                return Err(CutFrameError::ApplicationError {
                    message: format!("processing did not complete: {:?}", other),
                })
            }
        }

        let mut receipts = Vec::with_capacity(formats.len());
        for format in formats {
            match self.download(*format).await? {
                DownloadOutcome::Delivered(receipt) => receipts.push(receipt),
                DownloadOutcome::Failed(failure) => return Err(failure.into_error()),
                DownloadOutcome::AlreadyDownloading => {
                    return Err(CutFrameError::ApplicationError {
                        message: format!("{} export did not start", format),
                    })
                }
            }
        }

        Ok(receipts)
    }
}
