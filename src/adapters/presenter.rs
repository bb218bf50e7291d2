use crate::core::renderer::NO_DATA_PLACEHOLDER;
use crate::domain::model::{Preview, PreviewTable, RenderedResult};
use crate::domain::notification::Notification;
use crate::domain::ports::Presenter;
use tokio::sync::mpsc::UnboundedSender;

/// Prints notifications to the terminal.
#[derive(Debug, Clone, Default)]
pub struct ConsolePresenter {
    quiet: bool,
}

impl ConsolePresenter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Only failures are printed.
    pub fn quiet() -> Self {
        Self { quiet: true }
    }
}

impl Presenter for ConsolePresenter {
    fn notify(&self, notification: Notification) {
        let is_failure = matches!(
            notification,
            Notification::ValidationRejected { .. }
                | Notification::UserError { .. }
                | Notification::DownloadFailed { .. }
        );
        if is_failure {
            for line in console_lines(&notification) {
                eprintln!("{}", line);
            }
        } else if !self.quiet {
            for line in console_lines(&notification) {
                println!("{}", line);
            }
        }
    }
}

/// Forwards notifications to another task, e.g. a UI event loop.
impl Presenter for UnboundedSender<Notification> {
    fn notify(&self, notification: Notification) {
        if self.send(notification).is_err() {
            tracing::debug!("Notification dropped, receiver is gone");
        }
    }
}

pub fn console_lines(notification: &Notification) -> Vec<String> {
    match notification {
        Notification::PhaseChanged { status, .. } => {
            vec![format!("{} {}: {}", status.icon, status.title, status.message)]
        }
        Notification::ValidationRejected { reason } => vec![format!("❌ {}", reason)],
        Notification::FileAccepted {
            name,
            type_label,
            size,
        } => vec![format!("📄 {} ({}, {})", name, type_label, size)],
        Notification::ResultReady(rendered) => result_lines(rendered),
        Notification::UserError { message } => vec![format!("⚠️  {}", message)],
        Notification::DownloadStarted { filename, format } => {
            vec![format!("⬇️  Downloading {} ({})", filename, format)]
        }
        Notification::DownloadCompleted { filename, location } => {
            vec![format!("📁 {} saved to {}", filename, location)]
        }
        Notification::DownloadFailed { error } => vec![format!("❌ {}", error)],
    }
}

fn result_lines(rendered: &RenderedResult) -> Vec<String> {
    let summary = &rendered.summary;
    let mut lines = vec![
        format!("Total rows:     {}", summary.total_rows),
        format!("Material types: {}", summary.material_types),
        format!("Cutting groups: {}", summary.cutting_groups),
        format!("Total length:   {}", summary.total_length_label()),
    ];

    match &rendered.preview {
        Preview::NoData => lines.push(NO_DATA_PLACEHOLDER.to_string()),
        Preview::Table(table) => lines.extend(table_lines(table)),
    }
    lines
}

fn table_lines(table: &PreviewTable) -> Vec<String> {
    let mut widths: Vec<usize> = table.columns.iter().map(|c| c.chars().count()).collect();
    for row in &table.rows {
        for (width, cell) in widths.iter_mut().zip(row) {
            *width = (*width).max(cell.chars().count());
        }
    }

    let format_row = |cells: &[String]| {
        cells
            .iter()
            .zip(&widths)
            .map(|(cell, width)| format!("{:<width$}", cell, width = *width))
            .collect::<Vec<_>>()
            .join(" | ")
            .trim_end()
            .to_string()
    };

    let mut lines = Vec::with_capacity(table.rows.len() + 2);
    lines.push(format_row(table.columns.as_slice()));
    lines.push(
        widths
            .iter()
            .map(|w| "-".repeat(*w))
            .collect::<Vec<_>>()
            .join("-+-"),
    );
    lines.extend(table.rows.iter().map(|row| format_row(row.as_slice())));
    lines
}
