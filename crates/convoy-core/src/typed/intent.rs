//! Intent trait - 型付き intent の定義
//!
//! # 学習ポイント
//! - Associated Constants (`const KIND`)
//! - Trait bounds の組み合わせ (Serialize + DeserializeOwned + Send + Sync + 'static)

use serde::Serialize;
use serde::de::DeserializeOwned;

/// Intent は宣言された望ましい状態と kind を対応付ける
///
/// # 使用例
/// ```ignore
/// #[derive(Serialize, Deserialize)]
/// struct DeployIntent {
///     application: String,
/// }
///
/// impl Intent for DeployIntent {
///     const KIND: &'static str = "Deploy";
/// }
/// ```
pub trait Intent: Serialize + DeserializeOwned + Send + Sync + 'static {
    /// 処理する processor を選ぶためのキー
    const KIND: &'static str;
}
