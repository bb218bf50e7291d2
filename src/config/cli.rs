use crate::adapters::http::{DEFAULT_DOWNLOAD_PATH, DEFAULT_PROCESS_PATH};
use crate::config::{DEFAULT_OUTPUT_PATH, DEFAULT_SERVICE_URL};
use crate::domain::model::{ExportFormat, ProcessType, UploadPolicy};
use crate::domain::ports::ConfigProvider;
use crate::utils::error::{CutFrameError, Result};
use crate::utils::validation::{self, Validate};
use clap::Parser;
use std::path::PathBuf;
use std::time::Duration;

#[derive(Debug, Clone, Parser)]
#[command(name = "cutframe")]
#[command(about = "Upload a cutting plan spreadsheet, process it and download the result")]
pub struct CliConfig {
    /// Spreadsheet to upload (.xlsx, .xls, .xlsm)
    pub file: PathBuf,

    #[arg(long, default_value = "Windows")]
    pub process_type: ProcessType,

    #[arg(long = "format", value_delimiter = ',', default_value = "excel")]
    pub formats: Vec<ExportFormat>,

    #[arg(long)]
    pub service_url: Option<String>,

    #[arg(long)]
    pub output_path: Option<String>,

    #[arg(long)]
    pub timeout_seconds: Option<u64>,

    #[arg(long, help = "Read service and upload settings from a TOML file")]
    pub config: Option<PathBuf>,

    #[arg(long, help = "Enable verbose output")]
    pub verbose: bool,

    #[arg(long, help = "Log as JSON lines")]
    pub log_json: bool,
}

impl ConfigProvider for CliConfig {
    fn service_url(&self) -> &str {
        self.service_url.as_deref().unwrap_or(DEFAULT_SERVICE_URL)
    }

    fn process_path(&self) -> &str {
        DEFAULT_PROCESS_PATH
    }

    fn download_path(&self) -> &str {
        DEFAULT_DOWNLOAD_PATH
    }

    fn output_path(&self) -> &str {
        self.output_path.as_deref().unwrap_or(DEFAULT_OUTPUT_PATH)
    }

    fn request_timeout(&self) -> Option<Duration> {
        self.timeout_seconds.map(Duration::from_secs)
    }

    fn upload_policy(&self) -> UploadPolicy {
        UploadPolicy::default()
    }
}

impl Validate for CliConfig {
    fn validate(&self) -> Result<()> {
        validation::validate_url("--service-url", self.service_url())?;
        validation::validate_path("--output-path", self.output_path())?;
        if let Some(timeout) = self.timeout_seconds {
            validation::validate_positive_number("--timeout-seconds", timeout, 1)?;
        }
        if self.formats.is_empty() {
            return Err(CutFrameError::MissingConfigError {
                field: "--format".to_string(),
            });
        }
        Ok(())
    }
}
