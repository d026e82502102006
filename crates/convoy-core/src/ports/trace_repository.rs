//! TraceRepository port - 監査トレースの記録
//!
//! # 実装
//! - InMemoryTraceRepository: テスト用
//! - LogTraceRepository: tracing のイベントとして出力
//! - NoopTraceRepository: 何もしない
//!
//! 記録はベストエフォート。呼び出し側は失敗しても処理を続ける。

use async_trait::async_trait;

use crate::domain::Trace;

#[derive(Debug, thiserror::Error)]
pub enum TraceError {
    #[error("trace sink unavailable: {0}")]
    Unavailable(String),

    #[error("trace could not be encoded: {0}")]
    Encode(#[from] serde_json::Error),
}

#[async_trait]
pub trait TraceRepository: Send + Sync {
    async fn record(&self, trace: Trace) -> Result<(), TraceError>;
}
