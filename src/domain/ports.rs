use crate::domain::model::{ExportRequest, HttpReply, ProcessType, UploadPolicy, UploadedFile};
use crate::domain::notification::Notification;
use crate::utils::error::Result;
use async_trait::async_trait;
use std::time::Duration;

/// Where exported files end up. Returns the location that was written.
pub trait Storage: Send + Sync {
    fn write_file(
        &self,
        path: &str,
        data: &[u8],
    ) -> impl std::future::Future<Output = Result<String>> + Send;
}

/// The remote cutting service.
///
/// Implementations only move bytes: any HTTP status comes back as an
/// [`HttpReply`], and `Err` is reserved for calls that never got a reply.
#[async_trait]
pub trait CuttingApi: Send + Sync {
    async fn process(&self, file: &UploadedFile, process_type: ProcessType) -> Result<HttpReply>;
    async fn export(&self, request: &ExportRequest<'_>) -> Result<HttpReply>;
}

/// Receives every state change the UI has to reflect.
pub trait Presenter: Send + Sync {
    fn notify(&self, notification: Notification);
}

pub trait ConfigProvider: Send + Sync {
    fn service_url(&self) -> &str;
    fn process_path(&self) -> &str;
    fn download_path(&self) -> &str;
    fn output_path(&self) -> &str;
    fn request_timeout(&self) -> Option<Duration>;
    fn upload_policy(&self) -> UploadPolicy;
}
