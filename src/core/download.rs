use crate::core::engine::{CutFrameEngine, InFlight};
use crate::core::process::ProcessFailure;
use crate::domain::model::{ExportFormat, ExportRequest};
use crate::domain::notification::Notification;
use crate::domain::ports::{CuttingApi, Presenter, Storage};
use crate::utils::error::{PreconditionError, Result};
use chrono::{DateTime, Utc};

pub const EXPORT_SUFFIX: &str = "_CutFrame";

/// `plan.xlsx` + csv -> `plan_CutFrame.csv`. Directory parts of the upload
/// name are dropped, so the export always lands directly in storage's root.
pub fn export_filename(original: &str, format: ExportFormat) -> String {
    format!(
        "{}{}.{}",
        strip_extension(base_name(original)),
        EXPORT_SUFFIX,
        format.extension()
    )
}

fn base_name(name: &str) -> &str {
    name.rsplit(['/', '\\']).next().unwrap_or(name)
}

fn strip_extension(name: &str) -> &str {
    match name.rfind('.') {
        Some(idx) if idx > 0 && idx + 1 < name.len() => &name[..idx],
        _ => name,
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DownloadReceipt {
    pub filename: String,
    pub location: String,
    pub bytes: usize,
    pub delivered_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DownloadOutcome {
    Delivered(DownloadReceipt),
    Failed(ProcessFailure),
    /// Another download was still running; nothing was sent.
    AlreadyDownloading,
}

impl<A: CuttingApi, S: Storage, P: Presenter> CutFrameEngine<A, S, P> {
    /// Exports the held result in `format` and saves it through storage.
    ///
    /// Fails with [`PreconditionError::NoResult`] before any request when no
    /// result is held. Never changes the workflow phase.
    pub async fn download(&self, format: ExportFormat) -> Result<DownloadOutcome> {
        let held = {
            let state = self.state.lock().await;
            match (state.file(), state.result()) {
                (Some(file), Some(result)) => Some((file.clone(), result.clone())),
                _ => None,
            }
        };
        let (file, result) = match held {
            Some(held) => held,
            None => {
                let err = PreconditionError::NoResult;
                tracing::warn!("Download refused: {}", err);
                self.presenter.notify(Notification::UserError {
                    message: err.to_string(),
                });
                return Err(err.into());
            }
        };

        let _in_flight = match InFlight::acquire(&self.download_in_flight) {
            Some(guard) => guard,
            None => {
                tracing::info!("Download ignored, another download is in flight");
                return Ok(DownloadOutcome::AlreadyDownloading);
            }
        };

        let filename = export_filename(file.name(), format);
        tracing::info!("Requesting {} export as {}", format, filename);
        self.presenter.notify(Notification::DownloadStarted {
            filename: filename.clone(),
            format,
        });

        let request = ExportRequest {
            data: &result,
            format,
            filename: file.name(),
        };
        let reply = match self.api.export(&request).await {
            Ok(reply) if reply.is_success() => reply,
            Ok(reply) => return Ok(self.download_failed(ProcessFailure::transport(reply.status))),
            Err(e) => {
                tracing::error!("Export request did not complete: {}", e);
                return Ok(self.download_failed(ProcessFailure::unreachable(&e)));
            }
        };

        let bytes = reply.body;
        let location = match self.storage.write_file(&filename, &bytes).await {
            Ok(location) => location,
            Err(e) => {
                tracing::error!("Could not save {}: {}", filename, e);
                self.presenter.notify(Notification::DownloadFailed {
                    error: format!("Error downloading file: {}", e),
                });
                return Err(e);
            }
        };

        tracing::info!("Saved {} to {}", filename, location);
        self.presenter.notify(Notification::DownloadCompleted {
            filename: filename.clone(),
            location: location.clone(),
        });

        Ok(DownloadOutcome::Delivered(DownloadReceipt {
            filename,
            location,
            bytes: bytes.len(),
            delivered_at: Utc::now(),
        }))
    }

    fn download_failed(&self, failure: ProcessFailure) -> DownloadOutcome {
        tracing::warn!("Download failed: {}", failure);
        self.presenter.notify(Notification::DownloadFailed {
            error: format!("Error downloading file: {}", failure),
        });
        DownloadOutcome::Failed(failure)
    }
}
