//! ArtifactRegistry / ArtifactVersionStore ports - artifact 管理の正本
//!
//! 2 つの契約を定義します：
//! - **ArtifactRegistry**: `(name, type)` → uid の重複なしカタログ
//! - **ArtifactVersionStore**: 登録済み artifact の不変バージョン（provenance 付き）
//!
//! # 設計原則
//! - 一意性はストア側の制約で保証する（アプリ側のロックに頼らない）
//! - 重複の判定は影響行数で行う（例外の種類では判定しない）
//! - キャッシュしない。毎回ストアが source of truth
//! - 書き込み操作は 1 トランザクションで完結し、await をまたがない

use async_trait::async_trait;

use crate::domain::{
    ArtifactError, ArtifactType, ArtifactUid, DeliveryArtifact, DeliveryArtifactVersion,
    RegisteredArtifact,
};

/// ArtifactRegistry は artifact の重複なしカタログ
///
/// # 並行性
/// 同じ `(name, type)` を同時に register した場合、成功するのは 1 つだけで、
/// 残りは全て [`ArtifactError::AlreadyRegistered`] を受け取る。
#[async_trait]
pub trait ArtifactRegistry: Send + Sync {
    /// Registers a new artifact and returns its freshly generated uid.
    async fn register(&self, artifact: &DeliveryArtifact) -> Result<ArtifactUid, ArtifactError>;

    /// Pure existence check against committed state.
    async fn is_registered(
        &self,
        name: &str,
        artifact_type: ArtifactType,
    ) -> Result<bool, ArtifactError>;

    /// Resolves an artifact's uid.
    async fn get(
        &self,
        name: &str,
        artifact_type: ArtifactType,
    ) -> Result<Option<RegisteredArtifact>, ArtifactError>;
}

/// ArtifactVersionStore は登録済み artifact のバージョンを記録・取得
///
/// # 冪等性
/// - 同じ `(artifact, version)` の二回目の store は `Ok(false)`（エラーではない）
/// - 未登録 artifact は [`ArtifactError::NoSuchArtifact`]
#[async_trait]
pub trait ArtifactVersionStore: Send + Sync {
    /// Returns `true` only when a new version row was created.
    async fn store(&self, version: &DeliveryArtifactVersion) -> Result<bool, ArtifactError>;

    /// All recorded versions, newest first.
    async fn versions(
        &self,
        artifact: &DeliveryArtifact,
    ) -> Result<Vec<DeliveryArtifactVersion>, ArtifactError>;
}

/// Both contracts over one backing store.
pub trait ArtifactRepository: ArtifactRegistry + ArtifactVersionStore {}

impl<T: ArtifactRegistry + ArtifactVersionStore> ArtifactRepository for T {}
