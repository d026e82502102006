//! TraceRepository の実装
//!
//! - InMemoryTraceRepository: テスト用（記録を Vec に溜める）
//! - LogTraceRepository: tracing の info イベントとして出力
//! - NoopTraceRepository: 何もしない

use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::Mutex;
use tracing::info;

use crate::domain::Trace;
use crate::ports::{TraceError, TraceRepository};

#[derive(Clone, Default)]
pub struct InMemoryTraceRepository {
    traces: Arc<Mutex<Vec<Trace>>>,
}

impl InMemoryTraceRepository {
    pub fn new() -> Self {
        Self::default()
    }

    /// Everything recorded so far, oldest first.
    pub async fn traces(&self) -> Vec<Trace> {
        self.traces.lock().await.clone()
    }
}

#[async_trait]
impl TraceRepository for InMemoryTraceRepository {
    async fn record(&self, trace: Trace) -> Result<(), TraceError> {
        self.traces.lock().await.push(trace);
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct LogTraceRepository;

#[async_trait]
impl TraceRepository for LogTraceRepository {
    async fn record(&self, trace: Trace) -> Result<(), TraceError> {
        let intent = serde_json::to_string(&trace.intent)?;
        info!(target: "convoy::trace", created_at_ms = trace.created_at_ms, %intent, "intent trace");
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct NoopTraceRepository;

#[async_trait]
impl TraceRepository for NoopTraceRepository {
    async fn record(&self, _trace: Trace) -> Result<(), TraceError> {
        Ok(())
    }
}
