use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// One record of the processed table; keys keep the order the service sent.
pub type Row = serde_json::Map<String, serde_json::Value>;

pub const DEFAULT_ALLOWED_EXTENSIONS: [&str; 3] = ["xlsx", "xls", "xlsm"];
pub const DEFAULT_MAX_UPLOAD_BYTES: u64 = 10 * 1024 * 1024;

/// A spreadsheet that passed validation. Only the validator builds these.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadedFile {
    name: String,
    size: u64,
    extension: String,
    payload: Vec<u8>,
}

impl UploadedFile {
    pub(crate) fn accepted(name: String, size: u64, extension: String, payload: Vec<u8>) -> Self {
        Self {
            name,
            size,
            extension,
            payload,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn size(&self) -> u64 {
        self.size
    }

    pub fn extension(&self) -> &str {
        &self.extension
    }

    pub fn payload(&self) -> &[u8] {
        &self.payload
    }

    pub fn mime_type(&self) -> &'static str {
        match self.extension.as_str() {
            "xlsx" => "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet",
            "xls" => "application/vnd.ms-excel",
            "xlsm" => "application/vnd.ms-excel.sheet.macroEnabled.12",
            _ => "application/octet-stream",
        }
    }
}

/// Limits applied by the validator.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadPolicy {
    pub allowed_extensions: Vec<String>,
    pub max_size_bytes: u64,
}

impl Default for UploadPolicy {
    fn default() -> Self {
        Self {
            allowed_extensions: DEFAULT_ALLOWED_EXTENSIONS
                .iter()
                .map(|ext| ext.to_string())
                .collect(),
            max_size_bytes: DEFAULT_MAX_UPLOAD_BYTES,
        }
    }
}

impl UploadPolicy {
    pub fn allows_extension(&self, extension: &str) -> bool {
        self.allowed_extensions.iter().any(|ext| ext == extension)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum ProcessType {
    #[default]
    Windows,
    Doors,
}

impl ProcessType {
    /// Value of the `processType` form field.
    pub fn as_str(&self) -> &'static str {
        match self {
            ProcessType::Windows => "Windows",
            ProcessType::Doors => "Doors",
        }
    }
}

impl fmt::Display for ProcessType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ProcessType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "windows" | "window" => Ok(ProcessType::Windows),
            "doors" | "door" => Ok(ProcessType::Doors),
            other => Err(format!(
                "unknown process type '{}', expected Windows or Doors",
                other
            )),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExportFormat {
    Excel,
    Csv,
}

impl ExportFormat {
    pub fn token(&self) -> &'static str {
        match self {
            ExportFormat::Excel => "excel",
            ExportFormat::Csv => "csv",
        }
    }

    pub fn extension(&self) -> &'static str {
        match self {
            ExportFormat::Excel => "xlsx",
            ExportFormat::Csv => "csv",
        }
    }
}

impl fmt::Display for ExportFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.token())
    }
}

impl FromStr for ExportFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "excel" | "xlsx" => Ok(ExportFormat::Excel),
            "csv" => Ok(ExportFormat::Csv),
            other => Err(format!("unknown export format '{}', expected excel or csv", other)),
        }
    }
}

/// Output of one successful processing call.
///
/// Fields the client does not interpret (`columns`, `stats`, ...) are kept in
/// `extra` so an export sends back exactly what the service produced.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProcessedResult {
    pub rows: Vec<Row>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub material_types: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_cutting_id: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub total_length: Option<f64>,
    #[serde(flatten)]
    pub extra: Row,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum WorkflowPhase {
    #[default]
    Idle,
    Ready,
    Processing,
    Succeeded,
    Failed,
}

impl fmt::Display for WorkflowPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            WorkflowPhase::Idle => "idle",
            WorkflowPhase::Ready => "ready",
            WorkflowPhase::Processing => "processing",
            WorkflowPhase::Succeeded => "succeeded",
            WorkflowPhase::Failed => "failed",
        };
        f.write_str(name)
    }
}

/// Status code and body of a remote call, before interpretation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpReply {
    pub status: u16,
    pub body: Vec<u8>,
}

impl HttpReply {
    pub fn new(status: u16, body: impl Into<Vec<u8>>) -> Self {
        Self {
            status,
            body: body.into(),
        }
    }

    pub fn json(status: u16, value: &serde_json::Value) -> Self {
        Self::new(status, value.to_string())
    }

    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// Body of the export call.
#[derive(Debug, Clone, Serialize)]
pub struct ExportRequest<'a> {
    pub data: &'a ProcessedResult,
    pub format: ExportFormat,
    pub filename: &'a str,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ResultSummary {
    pub total_rows: usize,
    pub material_types: i64,
    pub cutting_groups: i64,
    pub total_length: f64,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PreviewTable {
    pub columns: Vec<String>,
    pub rows: Vec<Vec<String>>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Preview {
    NoData,
    Table(PreviewTable),
}

#[derive(Debug, Clone, PartialEq)]
pub struct RenderedResult {
    pub summary: ResultSummary,
    pub preview: Preview,
}
