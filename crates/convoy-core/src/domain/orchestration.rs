//! Orchestration - 外部の実行エンジンへ渡す work order
//!
//! processor は intent を受け取り、ここで定義する request の列を返します。
//! 実行そのものはこのクレートの外側の責務です。

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Job は orchestration の 1 ステップ（例: `{"type": "wait", "waitTime": 1}`）
///
/// `type` 以外のパラメータは同じ階層に平坦化して出力される。
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Job {
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(flatten)]
    pub params: BTreeMap<String, serde_json::Value>,
}

impl Job {
    pub fn new(kind: impl Into<String>) -> Self {
        Self {
            kind: kind.into(),
            params: BTreeMap::new(),
        }
    }

    pub fn with_param(mut self, key: impl Into<String>, value: impl Into<serde_json::Value>) -> Self {
        self.params.insert(key.into(), value.into());
        self
    }
}

/// OrchestrationRequest は intent に対して生成される作業単位
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrchestrationRequest {
    pub name: String,
    pub application: String,
    pub description: String,
    pub job: Vec<Job>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn job_params_flatten_next_to_type() {
        let job = Job::new("wait").with_param("waitTime", 1);
        assert_eq!(
            serde_json::to_value(&job).unwrap(),
            json!({ "type": "wait", "waitTime": 1 })
        );
    }
}
