use crate::core::process::ProcessFailure;
use crate::domain::model::{ProcessedResult, UploadedFile, WorkflowPhase};
use crate::utils::error::{CutFrameError, PreconditionError, Result};
use std::fmt;
use std::sync::Arc;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PhaseEvent {
    FileAccepted,
    Submit,
    ProcessSucceeded,
    ProcessFailed,
}

impl fmt::Display for PhaseEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            PhaseEvent::FileAccepted => "file accepted",
            PhaseEvent::Submit => "submit",
            PhaseEvent::ProcessSucceeded => "process succeeded",
            PhaseEvent::ProcessFailed => "process failed",
        };
        f.write_str(name)
    }
}

/// The transition table. `None` means the event is not allowed in that phase.
pub fn next_phase(from: WorkflowPhase, event: PhaseEvent) -> Option<WorkflowPhase> {
    use PhaseEvent::*;
    use WorkflowPhase::*;

    match (from, event) {
        (Idle, FileAccepted) => Some(Ready),
        (Ready, FileAccepted) => Some(Ready),
        (Processing, FileAccepted) => Some(Ready),
        (Succeeded, FileAccepted) => Some(Ready),
        (Failed, FileAccepted) => Some(Ready),

        (Ready, Submit) => Some(Processing),
        (Succeeded, Submit) => Some(Processing),
        (Failed, Submit) => Some(Processing),
        (Idle, Submit) => None,
        (Processing, Submit) => None,

        (Processing, ProcessSucceeded) => Some(Succeeded),
        (Processing, ProcessFailed) => Some(Failed),
        (Idle | Ready | Succeeded | Failed, ProcessSucceeded | ProcessFailed) => None,
    }
}

#[derive(Debug, Clone, Default)]
enum Slot {
    #[default]
    Idle,
    Ready {
        file: Arc<UploadedFile>,
    },
    Processing {
        file: Arc<UploadedFile>,
    },
    Succeeded {
        file: Arc<UploadedFile>,
        result: Arc<ProcessedResult>,
    },
    Failed {
        file: Arc<UploadedFile>,
        message: String,
    },
}

/// Handed out when processing starts; needed to apply the response later.
#[derive(Debug, Clone)]
pub struct SubmitTicket {
    pub epoch: u64,
    pub file: Arc<UploadedFile>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Completion {
    Applied(WorkflowPhase),
    /// The ticket belongs to a request that was superseded; nothing changed.
    Stale,
}

/// Held file, held result and current phase.
///
/// A result exists only in the `Succeeded` phase. Every accepted file and
/// every submit moves the epoch forward, so a response can only be applied
/// by the ticket of the most recent submit.
#[derive(Debug, Clone, Default)]
pub struct WorkflowState {
    slot: Slot,
    epoch: u64,
}

impl WorkflowState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn phase(&self) -> WorkflowPhase {
        match self.slot {
            Slot::Idle => WorkflowPhase::Idle,
            Slot::Ready { .. } => WorkflowPhase::Ready,
            Slot::Processing { .. } => WorkflowPhase::Processing,
            Slot::Succeeded { .. } => WorkflowPhase::Succeeded,
            Slot::Failed { .. } => WorkflowPhase::Failed,
        }
    }

    pub fn epoch(&self) -> u64 {
        self.epoch
    }

    pub fn file(&self) -> Option<&Arc<UploadedFile>> {
        match &self.slot {
            Slot::Idle => None,
            Slot::Ready { file }
            | Slot::Processing { file }
            | Slot::Succeeded { file, .. }
            | Slot::Failed { file, .. } => Some(file),
        }
    }

    pub fn result(&self) -> Option<&Arc<ProcessedResult>> {
        match &self.slot {
            Slot::Succeeded { result, .. } => Some(result),
            _ => None,
        }
    }

    pub fn failure_message(&self) -> Option<&str> {
        match &self.slot {
            Slot::Failed { message, .. } => Some(message),
            _ => None,
        }
    }

    fn transition(&self, event: PhaseEvent) -> Result<WorkflowPhase> {
        let from = self.phase();
        next_phase(from, event).ok_or(CutFrameError::InvalidTransition { from, event })
    }

    /// Replaces whatever was held with `file` and drops any held result.
    pub fn accept_file(&mut self, file: UploadedFile) -> Result<WorkflowPhase> {
        let next = self.transition(PhaseEvent::FileAccepted)?;
        self.epoch += 1;
        self.slot = Slot::Ready {
            file: Arc::new(file),
        };
        Ok(next)
    }

    pub fn begin_processing(&mut self) -> Result<SubmitTicket> {
        let file = match self.file() {
            Some(file) => Arc::clone(file),
            None => return Err(PreconditionError::NoFile.into()),
        };
        self.transition(PhaseEvent::Submit)?;

        self.epoch += 1;
        self.slot = Slot::Processing {
            file: Arc::clone(&file),
        };
        Ok(SubmitTicket {
            epoch: self.epoch,
            file,
        })
    }

    pub fn finish_processing(
        &mut self,
        epoch: u64,
        outcome: std::result::Result<ProcessedResult, ProcessFailure>,
    ) -> Result<Completion> {
        if epoch != self.epoch || self.phase() != WorkflowPhase::Processing {
            return Ok(Completion::Stale);
        }

        let event = if outcome.is_ok() {
            PhaseEvent::ProcessSucceeded
        } else {
            PhaseEvent::ProcessFailed
        };
        let next = self.transition(event)?;

        let file = match self.file() {
            Some(file) => Arc::clone(file),
            None => return Err(PreconditionError::NoFile.into()),
        };
        self.slot = match outcome {
            Ok(result) => Slot::Succeeded {
                file,
                result: Arc::new(result),
            },
            Err(failure) => Slot::Failed {
                file,
                message: failure.message,
            },
        };
        Ok(Completion::Applied(next))
    }
}
