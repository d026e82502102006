//! ProcessorRegistry - IntentProcessor の登録と dispatch
//!
//! # 内部実装
//! - `register::<I, P>(processor)` で登録
//! - 内部的に TypedProcessor でラップして DynIntentProcessor に変換
//! - HashMap<String, Arc<dyn DynIntentProcessor>> で管理

use std::collections::HashMap;
use std::sync::Arc;

use tracing::debug;

use super::intent::Intent;
use super::processor::{ConvergeError, DynIntentProcessor, IntentProcessor, TypedProcessor};
use crate::domain::OrchestrationRequest;

#[derive(Debug, thiserror::Error)]
pub enum RegistryError {
    #[error("processor for intent kind '{0}' is already registered")]
    AlreadyRegistered(String),
}

#[derive(Default)]
pub struct ProcessorRegistry {
    processors: HashMap<String, Arc<dyn DynIntentProcessor>>,
}

impl ProcessorRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register<I: Intent, P: IntentProcessor<I> + 'static>(
        &mut self,
        processor: P,
    ) -> Result<(), RegistryError> {
        let erased: Arc<dyn DynIntentProcessor> = Arc::new(TypedProcessor::<I, P>::new(processor));
        let kind = erased.kind().to_string();
        if self.processors.contains_key(&kind) {
            return Err(RegistryError::AlreadyRegistered(kind));
        }
        self.processors.insert(kind, erased);
        Ok(())
    }

    /// The processor whose `supports` accepts `kind`.
    pub fn get(&self, kind: &str) -> Option<Arc<dyn DynIntentProcessor>> {
        self.processors
            .get(kind)
            .filter(|processor| processor.supports(kind))
            .cloned()
    }

    pub fn registered_kinds(&self) -> Vec<String> {
        let mut kinds: Vec<String> = self.processors.keys().cloned().collect();
        kinds.sort();
        kinds
    }

    pub async fn converge(
        &self,
        kind: &str,
        payload: serde_json::Value,
    ) -> Result<Vec<OrchestrationRequest>, ConvergeError> {
        let processor = self
            .get(kind)
            .ok_or_else(|| ConvergeError::NoProcessor(kind.to_string()))?;
        debug!(kind = processor.kind(), "converging intent");
        processor.converge_dyn(payload).await
    }
}
