//! App - アプリケーション層
//!
//! ports と processors を組み合わせて 1 つのアプリケーションにまとめます。

pub mod builder;

pub use self::builder::{App, AppBuilder, BuildError};
