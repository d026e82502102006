//! Errors - エラー型と分類
//!
//! # 分類
//! - ドメインエラー（AlreadyRegistered / NoSuchArtifact）は常に区別可能な値として返す
//! - インフラエラー（DB 障害・タイムアウト）は InfrastructureError に包んで伝播
//! - リトライは呼び出し側の責務（このクレートは内部でリトライしない）

use std::time::Duration;

use super::artifact::DeliveryArtifact;

/// ErrorKind は呼び出し側がリトライ方針を決めるための運用分類
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// 競合（同じものが既に存在する）。状態は壊れていない
    Conflict,
    /// 前提条件の違反（先に register が必要など）
    Precondition,
    /// ストアの障害。呼び出し側の判断でリトライ可能
    Infrastructure,
}

/// Errors surfaced by the artifact registry and version store.
#[derive(Debug, thiserror::Error)]
pub enum ArtifactError {
    #[error("artifact {0} is already registered")]
    AlreadyRegistered(DeliveryArtifact),

    #[error("no such artifact {0}")]
    NoSuchArtifact(DeliveryArtifact),

    #[error(transparent)]
    Infrastructure(#[from] InfrastructureError),
}

impl ArtifactError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::AlreadyRegistered(_) => ErrorKind::Conflict,
            Self::NoSuchArtifact(_) => ErrorKind::Precondition,
            Self::Infrastructure(_) => ErrorKind::Infrastructure,
        }
    }
}

/// InfrastructureError はストア側の障害
#[derive(Debug, thiserror::Error)]
pub enum InfrastructureError {
    #[error("storage error: {0}")]
    Storage(#[source] Box<dyn std::error::Error + Send + Sync>),

    #[error("store is busy: {0}")]
    Contended(String),

    #[error("operation timed out after {0:?}")]
    Timeout(Duration),

    #[error("store connection lock poisoned")]
    LockPoisoned,

    #[error("storage task failed: {0}")]
    TaskJoin(String),

    #[error("corrupt row: {0}")]
    CorruptRow(String),
}

/// ValidationError はドメイン値の構築時エラー
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ValidationError {
    #[error("artifact name must not be empty")]
    EmptyName,

    #[error("unknown artifact type '{0}'")]
    UnknownArtifactType(String),

    #[error("invalid provenance '{0}': expected a URI with a scheme")]
    InvalidProvenance(String),

    #[error("invalid artifact uid {0}")]
    InvalidUid(String),
}
