//! Parrot - 最小の intent processor
//!
//! 何を受け取っても、実行エンジンに「1 秒待つ」ことだけを依頼します。
//! 収束経路を端から端まで通すための processor です。
//!
//! # トレース
//! - TraceRepository が設定されていれば、処理前に intent を記録する
//! - 記録はベストエフォート（失敗・タイムアウトは warn ログのみで、結果は変わらない）

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::domain::{Job, OrchestrationRequest, Trace};
use crate::ports::{Clock, TraceRepository};
use crate::typed::{ConvergeError, Intent, IntentProcessor};

/// Parrot が生成する request の name
pub const PARROT_REQUEST_NAME: &str = "Squawk!";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ParrotSpec {
    pub application: String,
    #[serde(default)]
    pub description: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ParrotIntent {
    pub spec: ParrotSpec,
}

impl Intent for ParrotIntent {
    const KIND: &'static str = "Parrot";
}

/// ParrotIntentProcessor は 1 件の wait request だけを返す
pub struct ParrotIntentProcessor {
    traces: Option<Arc<dyn TraceRepository>>,
    clock: Arc<dyn Clock>,
    trace_timeout: Duration,
}

impl ParrotIntentProcessor {
    pub fn new(clock: Arc<dyn Clock>) -> Self {
        Self {
            traces: None,
            clock,
            trace_timeout: Duration::from_secs(1),
        }
    }

    pub fn with_traces(mut self, traces: Arc<dyn TraceRepository>) -> Self {
        self.traces = Some(traces);
        self
    }

    pub fn with_trace_timeout(mut self, trace_timeout: Duration) -> Self {
        self.trace_timeout = trace_timeout;
        self
    }

    /// 失敗はログに残して握りつぶす
    async fn record_trace(&self, traces: &dyn TraceRepository, intent: &ParrotIntent) {
        let payload = match serde_json::to_value(intent) {
            Ok(payload) => payload,
            Err(error) => {
                warn!(%error, "could not encode intent for trace");
                return;
            }
        };
        let trace = Trace::new(payload, self.clock.millis());

        match tokio::time::timeout(self.trace_timeout, traces.record(trace)).await {
            Ok(Ok(())) => debug!(application = %intent.spec.application, "recorded intent trace"),
            Ok(Err(error)) => warn!(%error, "failed to record intent trace"),
            Err(_) => warn!(timeout = ?self.trace_timeout, "intent trace timed out"),
        }
    }
}

#[async_trait]
impl IntentProcessor<ParrotIntent> for ParrotIntentProcessor {
    async fn converge(
        &self,
        intent: ParrotIntent,
    ) -> Result<Vec<OrchestrationRequest>, ConvergeError> {
        if let Some(traces) = &self.traces {
            self.record_trace(traces.as_ref(), &intent).await;
        }

        Ok(vec![OrchestrationRequest {
            name: PARROT_REQUEST_NAME.to_string(),
            application: intent.spec.application,
            description: intent.spec.description,
            job: vec![Job::new("wait").with_param("waitTime", 1)],
        }])
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::impls::InMemoryTraceRepository;
    use crate::ports::{FixedClock, TraceError};
    use chrono::{TimeZone, Utc};
    use serde_json::json;

    fn clock() -> Arc<dyn Clock> {
        Arc::new(FixedClock::new(
            Utc.with_ymd_and_hms(2024, 1, 1, 12, 0, 0).unwrap(),
        ))
    }

    fn intent() -> ParrotIntent {
        ParrotIntent {
            spec: ParrotSpec {
                application: "keel".into(),
                description: "hello".into(),
            },
        }
    }

    struct FailingTraces;

    #[async_trait]
    impl TraceRepository for FailingTraces {
        async fn record(&self, _trace: Trace) -> Result<(), TraceError> {
            Err(TraceError::Unavailable("down".into()))
        }
    }

    struct HangingTraces;

    #[async_trait]
    impl TraceRepository for HangingTraces {
        async fn record(&self, _trace: Trace) -> Result<(), TraceError> {
            std::future::pending::<()>().await;
            Ok(())
        }
    }

    fn assert_single_wait(requests: &[OrchestrationRequest]) {
        assert_eq!(requests.len(), 1);
        let request = &requests[0];
        assert_eq!(request.name, "Squawk!");
        assert_eq!(request.application, "keel");
        assert_eq!(request.description, "hello");
        assert_eq!(request.job, vec![Job::new("wait").with_param("waitTime", 1)]);
    }

    #[tokio::test]
    async fn emits_one_wait_order_without_traces() {
        let processor = ParrotIntentProcessor::new(clock());
        let requests = processor.converge(intent()).await.unwrap();
        assert_single_wait(&requests);
    }

    #[tokio::test]
    async fn records_trace_with_clock_time_and_intent() {
        let traces = InMemoryTraceRepository::new();
        let processor = ParrotIntentProcessor::new(clock()).with_traces(Arc::new(traces.clone()));

        let requests = processor.converge(intent()).await.unwrap();
        assert_single_wait(&requests);

        let recorded = traces.traces().await;
        assert_eq!(recorded.len(), 1);
        assert_eq!(recorded[0].created_at_ms, 1_704_110_400_000);
        assert!(recorded[0].start_state.is_empty());
        assert_eq!(
            recorded[0].intent,
            json!({ "spec": { "application": "keel", "description": "hello" } })
        );
    }

    #[tokio::test]
    async fn trace_failure_does_not_fail_convergence() {
        let processor = ParrotIntentProcessor::new(clock()).with_traces(Arc::new(FailingTraces));
        let requests = processor.converge(intent()).await.unwrap();
        assert_single_wait(&requests);
    }

    #[tokio::test]
    async fn hanging_trace_sink_is_abandoned() {
        let processor = ParrotIntentProcessor::new(clock())
            .with_traces(Arc::new(HangingTraces))
            .with_trace_timeout(Duration::from_millis(20));

        let requests = tokio::time::timeout(Duration::from_secs(5), processor.converge(intent()))
            .await
            .expect("convergence must not wait on the trace sink")
            .unwrap();
        assert_single_wait(&requests);
    }

    #[test]
    fn intent_decodes_without_description() {
        let intent: ParrotIntent =
            serde_json::from_value(json!({ "spec": { "application": "keel" } })).unwrap();
        assert_eq!(intent.spec.description, "");
        assert_eq!(ParrotIntent::KIND, "Parrot");
    }
}
