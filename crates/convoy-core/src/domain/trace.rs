//! Trace - intent 収束の監査記録
//!
//! 何を受け取り、いつ処理したかを残すだけのレコードです。
//! 記録先は [`crate::ports::TraceRepository`] が決めます。

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Trace {
    /// 収束開始時点の観測状態（parrot では常に空）
    pub start_state: serde_json::Map<String, serde_json::Value>,
    /// 受け取った intent そのもの
    pub intent: serde_json::Value,
    /// Clock から取得したミリ秒タイムスタンプ
    pub created_at_ms: i64,
}

impl Trace {
    pub fn new(intent: serde_json::Value, created_at_ms: i64) -> Self {
        Self {
            start_state: serde_json::Map::new(),
            intent,
            created_at_ms,
        }
    }
}
