//! convoy-core
//!
//! Delivery artifact registry: which artifacts exist and which immutable
//! versions of each have been seen, plus a thin intent-convergence layer.
//!
//! # モジュール構成
//! - **domain**: ドメインモデル（artifact, version, ids, errors, orchestration, trace）
//! - **ports**: 抽象化レイヤー（ArtifactRegistry, ArtifactVersionStore, Clock, IdGenerator, TraceRepository）
//! - **impls**: 実装（SQLite / InMemory の artifact ストア、トレース記録先）
//! - **typed**: 型付き intent API（Intent trait, IntentProcessor trait, ProcessorRegistry）
//! - **processors**: intent processor の実装（parrot）
//! - **app**: ワイヤリング（AppBuilder）
//! - **config**: 設定（TOML）

pub mod app;
pub mod config;
pub mod domain;
pub mod impls;
pub mod ports;
pub mod processors;
pub mod typed;
