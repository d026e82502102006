//! IntentProcessor trait - intent を work order に変換する processor の定義
//!
//! # 二層構造
//! - `IntentProcessor<I>`: 型付き。`I` しか受け取れない
//! - `DynIntentProcessor`: object-safe。JSON を受け取り、内部で `I` に decode
//!
//! TypedProcessor<I, P> が前者を後者に型消去します。

use async_trait::async_trait;
use std::marker::PhantomData;

use super::intent::Intent;
use crate::domain::OrchestrationRequest;

#[derive(Debug, thiserror::Error)]
pub enum ConvergeError {
    #[error("no processor supports intent kind '{0}'")]
    NoProcessor(String),

    #[error("intent of kind '{kind}' could not be decoded: {source}")]
    Decode {
        kind: String,
        #[source]
        source: serde_json::Error,
    },
}

/// IntentProcessor は intent から orchestration request を生成する
///
/// # ジェネリクスによる型安全性
/// - `IntentProcessor<ParrotIntent>` は `ParrotIntent` しか受け取れない
#[async_trait]
pub trait IntentProcessor<I: Intent>: Send + Sync {
    fn supports(&self, kind: &str) -> bool {
        kind == I::KIND
    }

    async fn converge(&self, intent: I) -> Result<Vec<OrchestrationRequest>, ConvergeError>;
}

/// DynIntentProcessor は object-safe な IntentProcessor の抽象化
#[async_trait]
pub trait DynIntentProcessor: Send + Sync {
    fn kind(&self) -> &'static str;

    fn supports(&self, kind: &str) -> bool;

    async fn converge_dyn(
        &self,
        payload: serde_json::Value,
    ) -> Result<Vec<OrchestrationRequest>, ConvergeError>;
}

pub struct TypedProcessor<I: Intent, P: IntentProcessor<I>> {
    processor: P,
    _marker: PhantomData<fn(I)>,
}

impl<I: Intent, P: IntentProcessor<I>> TypedProcessor<I, P> {
    pub fn new(processor: P) -> Self {
        Self {
            processor,
            _marker: PhantomData,
        }
    }
}

#[async_trait]
impl<I: Intent, P: IntentProcessor<I>> DynIntentProcessor for TypedProcessor<I, P> {
    fn kind(&self) -> &'static str {
        I::KIND
    }

    fn supports(&self, kind: &str) -> bool {
        self.processor.supports(kind)
    }

    async fn converge_dyn(
        &self,
        payload: serde_json::Value,
    ) -> Result<Vec<OrchestrationRequest>, ConvergeError> {
        let intent: I = serde_json::from_value(payload).map_err(|source| ConvergeError::Decode {
            kind: I::KIND.to_string(),
            source,
        })?;
        self.processor.converge(intent).await
    }
}
