//! In-memory doubles for the engine's ports.

use crate::core::engine::CutFrameEngine;
use crate::core::validator::CandidateFile;
use crate::domain::model::{ExportRequest, HttpReply, ProcessType, UploadedFile};
use crate::domain::notification::Notification;
use crate::domain::ports::{CuttingApi, Presenter, Storage};
use crate::utils::error::{CutFrameError, Result};
use async_trait::async_trait;
use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use tokio::sync::Notify;

/// Holds a mocked call until the test opens it.
#[derive(Clone, Default)]
pub struct Gate(Arc<Notify>);

impl Gate {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn open(&self) {
        self.0.notify_one();
    }

    async fn pass(&self) {
        self.0.notified().await;
    }
}

type ReplyQueue = Arc<Mutex<VecDeque<Result<HttpReply>>>>;

/// Scripted service. Clones share queues and counters, so a test keeps a
/// handle after the engine takes ownership.
#[derive(Clone, Default)]
pub struct MockApi {
    process_replies: ReplyQueue,
    export_replies: ReplyQueue,
    process_calls: Arc<AtomicUsize>,
    export_calls: Arc<AtomicUsize>,
    process_gate: Option<Gate>,
    export_gate: Option<Gate>,
    last_process_type: Arc<Mutex<Option<ProcessType>>>,
    last_export: Arc<Mutex<Option<serde_json::Value>>>,
}

impl MockApi {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_process_reply(self, reply: Result<HttpReply>) -> Self {
        self.process_replies.lock().unwrap().push_back(reply);
        self
    }

    pub fn with_export_reply(self, reply: Result<HttpReply>) -> Self {
        self.export_replies.lock().unwrap().push_back(reply);
        self
    }

    pub fn with_process_gate(mut self, gate: Gate) -> Self {
        self.process_gate = Some(gate);
        self
    }

    pub fn with_export_gate(mut self, gate: Gate) -> Self {
        self.export_gate = Some(gate);
        self
    }

    pub fn process_calls(&self) -> usize {
        self.process_calls.load(Ordering::SeqCst)
    }

    pub fn export_calls(&self) -> usize {
        self.export_calls.load(Ordering::SeqCst)
    }

    pub async fn last_process_type(&self) -> Option<ProcessType> {
        *self.last_process_type.lock().unwrap()
    }

    pub async fn last_export(&self) -> Option<serde_json::Value> {
        self.last_export.lock().unwrap().clone()
    }

    fn next(queue: &ReplyQueue) -> Result<HttpReply> {
        queue
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| {
                Err(CutFrameError::ConfigError {
                    message: "no scripted reply".to_string(),
                })
            })
    }
}

#[async_trait]
impl CuttingApi for MockApi {
    async fn process(&self, _file: &UploadedFile, process_type: ProcessType) -> Result<HttpReply> {
        self.process_calls.fetch_add(1, Ordering::SeqCst);
        *self.last_process_type.lock().unwrap() = Some(process_type);
        if let Some(gate) = &self.process_gate {
            gate.pass().await;
        }
        Self::next(&self.process_replies)
    }

    async fn export(&self, request: &ExportRequest<'_>) -> Result<HttpReply> {
        self.export_calls.fetch_add(1, Ordering::SeqCst);
        *self.last_export.lock().unwrap() = Some(serde_json::to_value(request)?);
        if let Some(gate) = &self.export_gate {
            gate.pass().await;
        }
        Self::next(&self.export_replies)
    }
}

#[derive(Default)]
pub struct MemoryStorage {
    files: tokio::sync::Mutex<HashMap<String, Vec<u8>>>,
}

impl MemoryStorage {
    pub async fn saved(&self, path: &str) -> Option<Vec<u8>> {
        self.files.lock().await.get(path).cloned()
    }
}

impl Storage for MemoryStorage {
    async fn write_file(&self, path: &str, data: &[u8]) -> Result<String> {
        self.files
            .lock()
            .await
            .insert(path.to_string(), data.to_vec());
        Ok(format!("memory://{}", path))
    }
}

#[derive(Clone, Default)]
pub struct RecordingPresenter {
    seen: Arc<Mutex<Vec<Notification>>>,
}

impl RecordingPresenter {
    pub fn notifications(&self) -> Vec<Notification> {
        self.seen.lock().unwrap().clone()
    }
}

impl Presenter for RecordingPresenter {
    fn notify(&self, notification: Notification) {
        self.seen.lock().unwrap().push(notification);
    }
}

pub type TestEngine = CutFrameEngine<MockApi, MemoryStorage, RecordingPresenter>;

pub fn harness(api: MockApi) -> (TestEngine, MockApi, RecordingPresenter) {
    let presenter = RecordingPresenter::default();
    let engine = CutFrameEngine::new(api.clone(), MemoryStorage::default(), presenter.clone());
    (engine, api, presenter)
}

/// A candidate whose declared size is `size`; the payload stays tiny.
pub fn candidate(name: &str, size: u64) -> CandidateFile {
    CandidateFile::new(name, b"PK\x03\x04".to_vec()).with_declared_size(size)
}
