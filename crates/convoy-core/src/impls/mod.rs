//! Impls - ports の実装
//!
//! # 含まれる実装
//! - **SqliteArtifactRepository**: 本番用の artifact ストア
//! - **InMemoryArtifactRepository**: 開発用・テスト用の artifact ストア
//! - **InMemoryTraceRepository / LogTraceRepository / NoopTraceRepository**: 監査トレース

pub mod inmem_artifacts;
pub mod sqlite_artifacts;
pub mod traces;

pub use self::inmem_artifacts::InMemoryArtifactRepository;
pub use self::sqlite_artifacts::SqliteArtifactRepository;
pub use self::traces::{InMemoryTraceRepository, LogTraceRepository, NoopTraceRepository};
