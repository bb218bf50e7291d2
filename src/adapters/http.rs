use crate::domain::model::{ExportRequest, HttpReply, ProcessType, UploadedFile};
use crate::domain::ports::{ConfigProvider, CuttingApi};
use crate::utils::error::{CutFrameError, Result};
use async_trait::async_trait;
use reqwest::multipart::{Form, Part};
use reqwest::{Client, Response};
use std::time::Duration;
use url::Url;

pub const DEFAULT_PROCESS_PATH: &str = "/api/process";
pub const DEFAULT_DOWNLOAD_PATH: &str = "/api/download";

/// Talks to the cutting service over HTTP.
///
/// Any status the server answers with is handed back as an [`HttpReply`];
/// interpreting it is left to the engine.
pub struct HttpCuttingApi {
    client: Client,
    process_url: Url,
    download_url: Url,
}

impl HttpCuttingApi {
    pub fn new(base_url: &str) -> Result<Self> {
        Self::with_paths(base_url, DEFAULT_PROCESS_PATH, DEFAULT_DOWNLOAD_PATH, None)
    }

    pub fn from_config<C: ConfigProvider>(config: &C) -> Result<Self> {
        Self::with_paths(
            config.service_url(),
            config.process_path(),
            config.download_path(),
            config.request_timeout(),
        )
    }

    pub fn with_paths(
        base_url: &str,
        process_path: &str,
        download_path: &str,
        timeout: Option<Duration>,
    ) -> Result<Self> {
        let base = Url::parse(base_url).map_err(|e| CutFrameError::InvalidConfigValueError {
            field: "service.base_url".to_string(),
            value: base_url.to_string(),
            reason: format!("Invalid URL format: {}", e),
        })?;
        let join = |field: &str, path: &str| {
            base.join(path)
                .map_err(|e| CutFrameError::InvalidConfigValueError {
                    field: field.to_string(),
                    value: path.to_string(),
                    reason: e.to_string(),
                })
        };
        let process_url = join("service.process_path", process_path)?;
        let download_url = join("service.download_path", download_path)?;

        let mut builder = Client::builder();
        if let Some(timeout) = timeout {
            builder = builder.timeout(timeout);
        }

        Ok(Self {
            client: builder.build()?,
            process_url,
            download_url,
        })
    }

    pub fn process_url(&self) -> &Url {
        &self.process_url
    }

    pub fn download_url(&self) -> &Url {
        &self.download_url
    }

    async fn into_reply(response: Response) -> Result<HttpReply> {
        let status = response.status().as_u16();
        let body = response.bytes().await?;
        tracing::debug!("Service replied {} with {} bytes", status, body.len());
        Ok(HttpReply::new(status, body.to_vec()))
    }
}

#[async_trait]
impl CuttingApi for HttpCuttingApi {
    async fn process(&self, file: &UploadedFile, process_type: ProcessType) -> Result<HttpReply> {
        let part = Part::bytes(file.payload().to_vec())
            .file_name(file.name().to_string())
            .mime_str(file.mime_type())?;
        let form = Form::new()
            .part("file", part)
            .text("processType", process_type.as_str());

        tracing::debug!("POST {} ({})", self.process_url, file.name());
        let response = self
            .client
            .post(self.process_url.clone())
            .multipart(form)
            .send()
            .await?;
        Self::into_reply(response).await
    }

    async fn export(&self, request: &ExportRequest<'_>) -> Result<HttpReply> {
        tracing::debug!("POST {} ({} export)", self.download_url, request.format);
        let response = self
            .client
            .post(self.download_url.clone())
            .json(request)
            .send()
            .await?;
        Self::into_reply(response).await
    }
}
