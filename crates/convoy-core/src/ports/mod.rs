//! Ports - 抽象化レイヤー
//!
//! このモジュールは Hexagonal Architecture の「ポート」を定義します。
//! 各 trait は外部システム（SQLite, 監査ログ, 時計など）への
//! インターフェースを提供し、実装の詳細を隠蔽します。
//!
//! # 設計原則
//! - トランザクショナルストアが source of truth（正本）
//! - コンポーネントは呼び出し間で状態を持たない
//! - 依存は明示的にコンストラクタで渡す（DI コンテナなし）

pub mod artifact_repository;
pub mod clock;
pub mod id_generator;
pub mod trace_repository;

pub use self::artifact_repository::{ArtifactRegistry, ArtifactRepository, ArtifactVersionStore};
pub use self::clock::{Clock, FixedClock, SystemClock};
pub use self::id_generator::{IdGenerator, UlidGenerator};
pub use self::trace_repository::{TraceError, TraceRepository};
