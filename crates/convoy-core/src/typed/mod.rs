//! Typed - 型付き intent processor API
//!
//! このモジュールは intent kind の typo を型で排除し、
//! processor との対応付けを静的に保証します。
//!
//! # 二層構造
//! - **表層（Typed）**: `Intent` trait, `IntentProcessor<I>` trait - 型安全
//! - **内部（Dyn）**: `DynIntentProcessor` trait - object-safe, type erasure

pub mod intent;
pub mod processor;
pub mod registry;

pub use self::intent::Intent;
pub use self::processor::{ConvergeError, DynIntentProcessor, IntentProcessor};
pub use self::registry::{ProcessorRegistry, RegistryError};
