//! InMemoryArtifactRepository - 開発用・テスト用の artifact ストア
//!
//! # 実装詳細
//! - HashMap<(name, type), RegisteredArtifact> で artifact を管理
//! - HashMap<uid, BTreeMap<version, provenance>> でバージョンを管理
//! - tokio::sync::Mutex で排他制御（1 操作 = 1 ロック区間 = 1 トランザクション相当）

use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::Mutex;
use tracing::debug;

use crate::domain::{
    ArtifactError, ArtifactType, ArtifactUid, DeliveryArtifact, DeliveryArtifactVersion,
    Provenance, RegisteredArtifact, VersionOrdering,
};
use crate::ports::{ArtifactRegistry, ArtifactVersionStore, IdGenerator};

#[derive(Default)]
struct InMemoryArtifactState {
    artifacts: HashMap<(String, ArtifactType), RegisteredArtifact>,
    versions: HashMap<ArtifactUid, BTreeMap<String, Provenance>>,
}

impl InMemoryArtifactState {
    fn uid_of(&self, name: &str, artifact_type: ArtifactType) -> Option<ArtifactUid> {
        self.artifacts
            .get(&(name.to_string(), artifact_type))
            .map(|registered| registered.uid)
    }
}

pub struct InMemoryArtifactRepository {
    state: Arc<Mutex<InMemoryArtifactState>>,
    ids: Arc<dyn IdGenerator>,
    ordering: VersionOrdering,
}

impl InMemoryArtifactRepository {
    pub fn new(ids: Arc<dyn IdGenerator>, ordering: VersionOrdering) -> Self {
        Self {
            state: Arc::new(Mutex::new(InMemoryArtifactState::default())),
            ids,
            ordering,
        }
    }
}

#[async_trait]
impl ArtifactRegistry for InMemoryArtifactRepository {
    async fn register(&self, artifact: &DeliveryArtifact) -> Result<ArtifactUid, ArtifactError> {
        let mut state = self.state.lock().await;
        let key = (artifact.name().to_string(), artifact.artifact_type());
        if state.artifacts.contains_key(&key) {
            return Err(ArtifactError::AlreadyRegistered(artifact.clone()));
        }
        let uid = self.ids.generate_artifact_uid();
        state.artifacts.insert(
            key,
            RegisteredArtifact {
                uid,
                artifact: artifact.clone(),
            },
        );
        debug!(%artifact, %uid, "registered artifact");
        Ok(uid)
    }

    async fn is_registered(
        &self,
        name: &str,
        artifact_type: ArtifactType,
    ) -> Result<bool, ArtifactError> {
        let state = self.state.lock().await;
        Ok(state.uid_of(name, artifact_type).is_some())
    }

    async fn get(
        &self,
        name: &str,
        artifact_type: ArtifactType,
    ) -> Result<Option<RegisteredArtifact>, ArtifactError> {
        let state = self.state.lock().await;
        Ok(state
            .artifacts
            .get(&(name.to_string(), artifact_type))
            .cloned())
    }
}

#[async_trait]
impl ArtifactVersionStore for InMemoryArtifactRepository {
    async fn store(&self, version: &DeliveryArtifactVersion) -> Result<bool, ArtifactError> {
        let mut state = self.state.lock().await;
        let artifact = &version.artifact;
        let uid = state
            .uid_of(artifact.name(), artifact.artifact_type())
            .ok_or_else(|| ArtifactError::NoSuchArtifact(artifact.clone()))?;

        let versions = state.versions.entry(uid).or_default();
        if versions.contains_key(&version.version) {
            return Ok(false);
        }
        versions.insert(version.version.clone(), version.provenance.clone());
        Ok(true)
    }

    async fn versions(
        &self,
        artifact: &DeliveryArtifact,
    ) -> Result<Vec<DeliveryArtifactVersion>, ArtifactError> {
        let state = self.state.lock().await;
        let uid = state
            .uid_of(artifact.name(), artifact.artifact_type())
            .ok_or_else(|| ArtifactError::NoSuchArtifact(artifact.clone()))?;

        let mut versions: Vec<DeliveryArtifactVersion> = state
            .versions
            .get(&uid)
            .into_iter()
            .flatten()
            .map(|(label, provenance)| {
                DeliveryArtifactVersion::new(artifact.clone(), label.clone(), provenance.clone())
            })
            .collect();
        drop(state);

        self.ordering.sort_descending(&mut versions);
        Ok(versions)
    }
}
