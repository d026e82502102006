//! AppBuilder - アプリケーションの構築とワイヤリング
//!
//! # 学習ポイント
//! - Builder パターンの実装
//! - 起動時検証（Fail-fast 設計）
//! - 依存は全て明示的に渡す（リフレクションや DI コンテナなし）

use std::sync::Arc;

use crate::domain::OrchestrationRequest;
use crate::ports::ArtifactRepository;
use crate::typed::{ConvergeError, Intent, IntentProcessor, ProcessorRegistry, RegistryError};

/// AppBuilder はアプリケーションを構築
///
/// # 使用例
/// ```ignore
/// let app = AppBuilder::new()
///     .with_artifacts(repository)
///     .register::<ParrotIntent, _>(ParrotIntentProcessor::new(clock))?
///     .expect_intents(&[ParrotIntent::KIND])
///     .build()?;
/// ```
///
/// # Fail-fast 設計
/// - build() 時に「期待集合 ⊆ 登録済み集合」をチェック
/// - artifact ストアが未設定なら BuildError
pub struct AppBuilder {
    processors: ProcessorRegistry,
    expected_kinds: Option<Vec<String>>,
    artifacts: Option<Arc<dyn ArtifactRepository>>,
}

#[derive(Debug, thiserror::Error)]
pub enum BuildError {
    #[error("Missing intent processors: {0:?}. These intent kinds were expected but not registered.")]
    MissingIntentKinds(Vec<String>),

    #[error("No artifact repository was configured.")]
    MissingArtifactRepository,
}

impl AppBuilder {
    pub fn new() -> Self {
        Self {
            processors: ProcessorRegistry::new(),
            expected_kinds: None,
            artifacts: None,
        }
    }

    pub fn with_artifacts(mut self, artifacts: Arc<dyn ArtifactRepository>) -> Self {
        self.artifacts = Some(artifacts);
        self
    }

    pub fn register<I: Intent, P: IntentProcessor<I> + 'static>(
        mut self,
        processor: P,
    ) -> Result<Self, RegistryError> {
        self.processors.register::<I, P>(processor)?;
        Ok(self)
    }

    pub fn expect_intents(mut self, kinds: &[&str]) -> Self {
        self.expected_kinds = Some(kinds.iter().map(|kind| kind.to_string()).collect());
        self
    }

    pub fn build(self) -> Result<App, BuildError> {
        if let Some(expected) = &self.expected_kinds {
            let registered = self.processors.registered_kinds();
            let missing: Vec<String> = expected
                .iter()
                .filter(|kind| !registered.contains(kind))
                .cloned()
                .collect();
            if !missing.is_empty() {
                return Err(BuildError::MissingIntentKinds(missing));
            }
        }
        let artifacts = self
            .artifacts
            .ok_or(BuildError::MissingArtifactRepository)?;
        Ok(App {
            processors: self.processors,
            artifacts,
        })
    }
}

impl Default for AppBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// App は構築済みのアプリケーション
pub struct App {
    processors: ProcessorRegistry,
    artifacts: Arc<dyn ArtifactRepository>,
}

impl App {
    pub fn artifacts(&self) -> &Arc<dyn ArtifactRepository> {
        &self.artifacts
    }

    pub fn processors(&self) -> &ProcessorRegistry {
        &self.processors
    }

    pub async fn converge(
        &self,
        kind: &str,
        intent: serde_json::Value,
    ) -> Result<Vec<OrchestrationRequest>, ConvergeError> {
        self.processors.converge(kind, intent).await
    }
}
