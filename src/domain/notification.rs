use crate::domain::model::{ExportFormat, RenderedResult, WorkflowPhase};

/// The status card shown for a phase.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatusLine {
    pub css_class: &'static str,
    pub icon: &'static str,
    pub title: &'static str,
    pub message: String,
}

impl StatusLine {
    /// `detail` replaces the default message; the failed card always carries one.
    pub fn for_phase(phase: WorkflowPhase, detail: Option<&str>) -> Self {
        let (css_class, icon, title, default_message) = match phase {
            WorkflowPhase::Idle => ("idle", "📁", "Waiting for file", "Select an Excel file to begin"),
            WorkflowPhase::Ready => ("uploaded", "✅", "File uploaded", "Ready to process"),
            WorkflowPhase::Processing => (
                "processing",
                "🔄",
                "Processing",
                "Cutting optimization in progress...",
            ),
            WorkflowPhase::Succeeded => (
                "success",
                "🎉",
                "Processing complete",
                "Cutting optimization completed successfully",
            ),
            WorkflowPhase::Failed => ("error", "❌", "Processing failed", "processing failed"),
        };

        Self {
            css_class,
            icon,
            title,
            message: detail.unwrap_or(default_message).to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Notification {
    PhaseChanged {
        phase: WorkflowPhase,
        status: StatusLine,
    },
    ValidationRejected {
        reason: String,
    },
    FileAccepted {
        name: String,
        type_label: String,
        size: String,
    },
    ResultReady(RenderedResult),
    /// An action was refused before anything was sent; the phase is unchanged.
    UserError {
        message: String,
    },
    DownloadStarted {
        filename: String,
        format: ExportFormat,
    },
    DownloadCompleted {
        filename: String,
        location: String,
    },
    DownloadFailed {
        error: String,
    },
}
