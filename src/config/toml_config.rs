use crate::adapters::http::{DEFAULT_DOWNLOAD_PATH, DEFAULT_PROCESS_PATH};
use crate::config::{DEFAULT_OUTPUT_PATH, DEFAULT_SERVICE_URL};
use crate::domain::model::UploadPolicy;
use crate::domain::ports::ConfigProvider;
use crate::utils::error::{CutFrameError, Result};
use crate::utils::validation::{self, Validate};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TomlConfig {
    #[serde(default)]
    pub service: ServiceConfig,
    #[serde(default)]
    pub upload: UploadConfig,
    #[serde(default)]
    pub download: DownloadConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServiceConfig {
    #[serde(default = "default_base_url")]
    pub base_url: String,
    pub process_path: Option<String>,
    pub download_path: Option<String>,
    pub timeout_seconds: Option<u64>,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            process_path: None,
            download_path: None,
            timeout_seconds: None,
        }
    }
}

fn default_base_url() -> String {
    DEFAULT_SERVICE_URL.to_string()
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UploadConfig {
    pub max_size_bytes: Option<u64>,
    pub allowed_extensions: Option<Vec<String>>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DownloadConfig {
    pub output_path: Option<String>,
}

impl TomlConfig {
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(&path).map_err(CutFrameError::IoError)?;
        Self::from_toml_str(&content)
    }

    pub fn from_toml_str(content: &str) -> Result<Self> {
        let processed_content = Self::substitute_env_vars(content)?;

        toml::from_str(&processed_content).map_err(|e| CutFrameError::ConfigValidationError {
            field: "toml_parsing".to_string(),
            message: format!("TOML parsing error: {}", e),
        })
    }

    /// Replaces `${VAR}` with the variable's value; unset variables are left as written.
    fn substitute_env_vars(content: &str) -> Result<String> {
        let re = Regex::new(r"\$\{([^}]+)\}").map_err(|e| CutFrameError::ConfigError {
            message: e.to_string(),
        })?;

        let result = re.replace_all(content, |caps: &regex::Captures| {
            let var_name = &caps[1];
            std::env::var(var_name).unwrap_or_else(|_| format!("${{{}}}", var_name))
        });

        Ok(result.into_owned())
    }

    /// Command-line values win over the file.
    pub fn with_overrides(
        mut self,
        service_url: Option<&str>,
        output_path: Option<&str>,
        timeout_seconds: Option<u64>,
    ) -> Self {
        if let Some(url) = service_url {
            self.service.base_url = url.to_string();
        }
        if let Some(path) = output_path {
            self.download.output_path = Some(path.to_string());
        }
        if timeout_seconds.is_some() {
            self.service.timeout_seconds = timeout_seconds;
        }
        self
    }

    pub fn validate_config(&self) -> Result<()> {
        validation::validate_url("service.base_url", &self.service.base_url)?;
        validation::validate_endpoint_path("service.process_path", self.process_path())?;
        validation::validate_endpoint_path("service.download_path", self.download_path())?;
        validation::validate_path("download.output_path", self.output_path())?;

        if let Some(timeout) = self.service.timeout_seconds {
            validation::validate_range("service.timeout_seconds", timeout, 1, 3600)?;
        }
        if let Some(max) = self.upload.max_size_bytes {
            validation::validate_positive_number("upload.max_size_bytes", max, 1)?;
        }
        if let Some(extensions) = &self.upload.allowed_extensions {
            validation::validate_extensions("upload.allowed_extensions", extensions)?;
        }

        Ok(())
    }
}

impl ConfigProvider for TomlConfig {
    fn service_url(&self) -> &str {
        &self.service.base_url
    }

    fn process_path(&self) -> &str {
        self.service
            .process_path
            .as_deref()
            .unwrap_or(DEFAULT_PROCESS_PATH)
    }

    fn download_path(&self) -> &str {
        self.service
            .download_path
            .as_deref()
            .unwrap_or(DEFAULT_DOWNLOAD_PATH)
    }

    fn output_path(&self) -> &str {
        self.download
            .output_path
            .as_deref()
            .unwrap_or(DEFAULT_OUTPUT_PATH)
    }

    fn request_timeout(&self) -> Option<Duration> {
        self.service.timeout_seconds.map(Duration::from_secs)
    }

    fn upload_policy(&self) -> UploadPolicy {
        let defaults = UploadPolicy::default();
        UploadPolicy {
            allowed_extensions: self
                .upload
                .allowed_extensions
                .clone()
                .unwrap_or(defaults.allowed_extensions),
            max_size_bytes: self.upload.max_size_bytes.unwrap_or(defaults.max_size_bytes),
        }
    }
}

impl Validate for TomlConfig {
    fn validate(&self) -> Result<()> {
        self.validate_config()
    }
}
