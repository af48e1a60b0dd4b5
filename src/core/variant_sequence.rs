use crate::core::pipeline::GenerationPipeline;
use crate::domain::model::{GenerationRequest, GenerationResult, Platform, VariantBatch, VariantStyle};
use crate::domain::ports::ImageGenerator;
use crate::utils::error::StudioError;
use std::collections::HashMap;
use std::time::Duration;
use thiserror::Error;
use tokio::sync::watch;

pub const DEFAULT_VARIANT_DELAY: Duration = Duration::from_millis(1000);

/// 每個變體送出前回報的進度
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VariantProgress {
    pub current: usize,
    pub total: usize,
    pub label: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunState {
    Idle,
    Running(usize),
    Completed,
    Failed(usize),
    Cancelled(usize),
}

/// 變體執行失敗；`completed` 保留失敗前已成功的結果，不做回滾
#[derive(Debug, Error)]
#[error("{label} (variant index {index}) failed: {source}")]
pub struct VariantRunError {
    pub index: usize,
    pub label: String,
    pub source: StudioError,
    pub completed: Vec<GenerationResult>,
}

impl VariantRunError {
    pub fn is_cancelled(&self) -> bool {
        matches!(self.source, StudioError::Cancelled { .. })
    }
}

pub struct CancelHandle {
    sender: watch::Sender<bool>,
}

impl CancelHandle {
    pub fn cancel(&self) {
        self.sender.send_replace(true);
    }
}

#[derive(Debug, Clone)]
pub struct CancelToken {
    receiver: watch::Receiver<bool>,
}

impl CancelToken {
    /// 建立一組取消控制：handle 觸發，token 交給執行端等待
    pub fn pair() -> (CancelHandle, CancelToken) {
        let (sender, receiver) = watch::channel(false);
        (CancelHandle { sender }, CancelToken { receiver })
    }

    /// 永遠不會觸發的取消訊號
    pub fn never() -> CancelToken {
        let (_, token) = Self::pair();
        token
    }

    pub fn is_cancelled(&self) -> bool {
        *self.receiver.borrow()
    }

    pub async fn cancelled(&mut self) {
        loop {
            if *self.receiver.borrow_and_update() {
                return;
            }
            if self.receiver.changed().await.is_err() {
                // handle 已被丟棄，不可能再被取消
                std::future::pending::<()>().await;
            }
        }
    }
}

/// 依序執行每個變體：一次只有一個請求，成功後固定間隔再送下一個
pub struct VariantSequence {
    styles: Vec<VariantStyle>,
    delay: Duration,
    state: RunState,
}

impl VariantSequence {
    pub fn new(styles: Vec<VariantStyle>, delay: Duration) -> Self {
        Self {
            styles,
            delay,
            state: RunState::Idle,
        }
    }

    pub fn with_defaults() -> Self {
        Self::new(VariantStyle::defaults(), DEFAULT_VARIANT_DELAY)
    }

    pub fn state(&self) -> RunState {
        self.state
    }

    pub fn styles(&self) -> &[VariantStyle] {
        &self.styles
    }

    pub fn delay(&self) -> Duration {
        self.delay
    }

    /// `on_result` 在每個變體成功後立即呼叫，早於下一次等待
    pub async fn execute_all<G, F, R>(
        &mut self,
        pipeline: &GenerationPipeline<G>,
        base_prompt: &str,
        platforms: &[Platform],
        mut on_progress: F,
        mut on_result: R,
        cancel: &mut CancelToken,
    ) -> Result<Vec<GenerationResult>, VariantRunError>
    where
        G: ImageGenerator,
        F: FnMut(&VariantProgress) + Send,
        R: FnMut(&GenerationResult) + Send,
    {
        let batch = VariantBatch::derive(base_prompt, &self.styles).map_err(|source| {
            VariantRunError {
                index: 0,
                label: self
                    .styles
                    .first()
                    .map(|style| style.label.clone())
                    .unwrap_or_default(),
                source,
                completed: Vec::new(),
            }
        })?;

        if batch.is_empty() {
            tracing::warn!("⚠️ No variant styles configured, nothing to generate");
            self.state = RunState::Completed;
            return Ok(Vec::new());
        }

        let total = batch.len();
        let mut results: Vec<GenerationResult> = Vec::with_capacity(total);
        tracing::info!("🎬 Starting {} variants for prompt: {}", total, base_prompt);

        for variant in batch.iter() {
            self.state = RunState::Running(variant.index);

            let progress = VariantProgress {
                current: variant.index + 1,
                total,
                label: variant.label.clone(),
            };
            on_progress(&progress);
            tracing::info!(
                "🎨 Generating {} ({}/{})",
                variant.label,
                progress.current,
                progress.total
            );

            let outcome = if cancel.is_cancelled() {
                Err(StudioError::Cancelled {
                    index: variant.index,
                })
            } else {
                match GenerationRequest::new(variant.prompt.clone(), platforms) {
                    Ok(request) => {
                        tokio::select! {
                            biased;
                            _ = cancel.cancelled() => Err(StudioError::Cancelled { index: variant.index }),
                            result = pipeline.run(&request) => result,
                        }
                    }
                    Err(e) => Err(e),
                }
            };

            match outcome {
                Ok(result) => {
                    tracing::info!("✅ {} generated: {}", variant.label, result.image_url);
                    on_result(&result);
                    results.push(result);
                }
                Err(source) => {
                    return Err(self.fail(variant.index, &variant.label, source, results));
                }
            }

            if variant.index + 1 < total {
                tracing::debug!("⏳ Waiting {:?} before next variant", self.delay);
                tokio::select! {
                    biased;
                    _ = cancel.cancelled() => {
                        let source = StudioError::Cancelled { index: variant.index + 1 };
                        return Err(self.fail(variant.index + 1, &variant.label, source, results));
                    }
                    _ = tokio::time::sleep(self.delay) => {}
                }
            }
        }

        self.state = RunState::Completed;
        tracing::info!("🎉 All {} variants generated", results.len());
        Ok(results)
    }

    fn fail(
        &mut self,
        index: usize,
        label: &str,
        source: StudioError,
        completed: Vec<GenerationResult>,
    ) -> VariantRunError {
        let label = self
            .styles
            .get(index)
            .map(|style| style.label.clone())
            .unwrap_or_else(|| label.to_string());

        if matches!(source, StudioError::Cancelled { .. }) {
            self.state = RunState::Cancelled(index);
            tracing::warn!("⏹️ Variant run cancelled at {} (index {})", label, index);
        } else {
            self.state = RunState::Failed(index);
            tracing::error!("❌ {} (index {}) failed: {}", label, index, source);
        }

        VariantRunError {
            index,
            label,
            source,
            completed,
        }
    }

    /// 取得執行摘要
    pub fn get_execution_summary(results: &[GenerationResult]) -> HashMap<String, serde_json::Value> {
        let mut summary = HashMap::new();

        summary.insert(
            "total_results".to_string(),
            serde_json::Value::Number(results.len().into()),
        );

        let span_ms = match (results.first(), results.last()) {
            (Some(first), Some(last)) => (last.created_at - first.created_at)
                .num_milliseconds()
                .max(0),
            _ => 0,
        };
        summary.insert(
            "span_ms".to_string(),
            serde_json::Value::Number(span_ms.into()),
        );

        let urls: Vec<serde_json::Value> = results
            .iter()
            .map(|r| serde_json::Value::String(r.image_url.clone()))
            .collect();
        summary.insert("image_urls".to_string(), serde_json::Value::Array(urls));

        summary
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::model::{NormalizedImage, ResponseSchema};
    use crate::utils::error::Result;
    use std::sync::Mutex;
    use tokio::time::Instant;

    /// 記錄每次呼叫的提示詞與完成時間
    struct ScriptedGenerator {
        fail_on_call: Option<usize>,
        calls: Mutex<Vec<(String, Instant)>>,
        latency: Duration,
    }

    impl ScriptedGenerator {
        fn new() -> Self {
            Self {
                fail_on_call: None,
                calls: Mutex::new(Vec::new()),
                latency: Duration::ZERO,
            }
        }

        fn failing_on(mut self, call: usize) -> Self {
            self.fail_on_call = Some(call);
            self
        }

        fn with_latency(mut self, latency: Duration) -> Self {
            self.latency = latency;
            self
        }

        fn prompts(&self) -> Vec<String> {
            self.calls.lock().unwrap().iter().map(|(p, _)| p.clone()).collect()
        }

        fn completion_times(&self) -> Vec<Instant> {
            self.calls.lock().unwrap().iter().map(|(_, t)| *t).collect()
        }
    }

    #[async_trait::async_trait]
    impl ImageGenerator for ScriptedGenerator {
        async fn generate(&self, prompt: &str) -> Result<NormalizedImage> {
            if !self.latency.is_zero() {
                tokio::time::sleep(self.latency).await;
            }
            let call = {
                let mut calls = self.calls.lock().unwrap();
                calls.push((prompt.to_string(), Instant::now()));
                calls.len() - 1
            };
            if self.fail_on_call == Some(call) {
                return Err(StudioError::Upstream {
                    status_code: 500,
                    body: serde_json::json!({"error": "boom"}),
                });
            }
            Ok(NormalizedImage {
                url: format!("https://x.test/{}.png", call),
                schema: ResponseSchema::DataArray,
            })
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_all_variants_succeed_in_order_with_pacing() {
        let pipeline = GenerationPipeline::new(ScriptedGenerator::new());
        let mut sequence = VariantSequence::with_defaults();
        let mut progress = Vec::new();
        let mut delivered = Vec::new();

        let results = sequence
            .execute_all(
                &pipeline,
                "cat",
                &Platform::default_selection(),
                |p| progress.push(p.clone()),
                |r| delivered.push(r.id),
                &mut CancelToken::never(),
            )
            .await
            .unwrap();

        assert_eq!(results.len(), 3);
        assert_eq!(results[0].prompt_text, "cat - variant A with vibrant neon colors");
        assert_eq!(results[1].prompt_text, "cat - variant B with minimalist cyberpunk style");
        assert_eq!(results[2].prompt_text, "cat - variant C with bold flowing composition");
        assert_eq!(results[0].image_url, "https://x.test/0.png");

        let expected: Vec<VariantProgress> = ["Variant A", "Variant B", "Variant C"]
            .iter()
            .enumerate()
            .map(|(i, label)| VariantProgress {
                current: i + 1,
                total: 3,
                label: label.to_string(),
            })
            .collect();
        assert_eq!(progress, expected);
        let ids: Vec<_> = results.iter().map(|r| r.id).collect();
        assert_eq!(delivered, ids);

        let times = pipeline.generator().completion_times();
        assert!(times[2] - times[0] >= Duration::from_millis(2000));
        assert_eq!(sequence.state(), RunState::Completed);
    }

    #[tokio::test(start_paused = true)]
    async fn test_failure_at_second_variant_stops_run() {
        let pipeline = GenerationPipeline::new(ScriptedGenerator::new().failing_on(1));
        let mut sequence = VariantSequence::with_defaults();

        let err = sequence
            .execute_all(
                &pipeline,
                "cat",
                &Platform::default_selection(),
                |_| {},
                |_| {},
                &mut CancelToken::never(),
            )
            .await
            .unwrap_err();

        assert_eq!(err.index, 1);
        assert_eq!(err.label, "Variant B");
        assert!(matches!(err.source, StudioError::Upstream { status_code: 500, .. }));
        assert_eq!(err.completed.len(), 1);
        assert_eq!(err.completed[0].prompt_text, "cat - variant A with vibrant neon colors");

        // 變體 C 從未送出
        let prompts = pipeline.generator().prompts();
        assert_eq!(prompts.len(), 2);
        assert!(!prompts.iter().any(|p| p.contains("variant C")));
        assert_eq!(sequence.state(), RunState::Failed(1));
    }

    #[tokio::test]
    async fn test_empty_base_prompt_issues_no_requests() {
        let pipeline = GenerationPipeline::new(ScriptedGenerator::new());
        let mut sequence = VariantSequence::with_defaults();

        let err = sequence
            .execute_all(&pipeline, "  ", &[], |_| {}, |_| {}, &mut CancelToken::never())
            .await
            .unwrap_err();

        assert!(matches!(err.source, StudioError::EmptyPrompt));
        assert!(pipeline.generator().prompts().is_empty());
        assert_eq!(sequence.state(), RunState::Idle);
    }

    #[tokio::test(start_paused = true)]
    async fn test_cancel_during_delay_is_distinct_from_failure() {
        let pipeline = GenerationPipeline::new(ScriptedGenerator::new());
        let mut sequence = VariantSequence::new(VariantStyle::defaults(), Duration::from_secs(10));
        let (handle, mut token) = CancelToken::pair();

        let canceller = tokio::spawn(async move {
            tokio::time::sleep(Duration::from_secs(1)).await;
            handle.cancel();
        });

        let err = sequence
            .execute_all(&pipeline, "cat", &[], |_| {}, |_| {}, &mut token)
            .await
            .unwrap_err();
        canceller.await.unwrap();

        assert!(err.is_cancelled());
        assert_eq!(err.index, 1);
        assert_eq!(err.completed.len(), 1);
        assert_eq!(pipeline.generator().prompts().len(), 1);
        assert_eq!(sequence.state(), RunState::Cancelled(1));
    }

    #[tokio::test(start_paused = true)]
    async fn test_cancel_during_inflight_request() {
        let pipeline =
            GenerationPipeline::new(ScriptedGenerator::new().with_latency(Duration::from_secs(30)));
        let mut sequence = VariantSequence::with_defaults();
        let (handle, mut token) = CancelToken::pair();

        let canceller = tokio::spawn(async move {
            tokio::time::sleep(Duration::from_secs(5)).await;
            handle.cancel();
        });

        let err = sequence
            .execute_all(&pipeline, "cat", &[], |_| {}, |_| {}, &mut token)
            .await
            .unwrap_err();
        canceller.await.unwrap();

        assert!(err.is_cancelled());
        assert_eq!(err.index, 0);
        assert!(err.completed.is_empty());
    }

    #[tokio::test]
    async fn test_no_styles_completes_without_requests() {
        let pipeline = GenerationPipeline::new(ScriptedGenerator::new());
        let mut sequence = VariantSequence::new(Vec::new(), DEFAULT_VARIANT_DELAY);

        let results = sequence
            .execute_all(&pipeline, "cat", &[], |_| {}, |_| {}, &mut CancelToken::never())
            .await
            .unwrap();

        assert!(results.is_empty());
        assert!(pipeline.generator().prompts().is_empty());
        assert_eq!(sequence.state(), RunState::Completed);
    }

    #[test]
    fn test_execution_summary() {
        let request = GenerationRequest::new("cat", &[]).unwrap();
        let results: Vec<GenerationResult> = (0..2)
            .map(|i| {
                GenerationResult::from_normalized(
                    &request,
                    NormalizedImage {
                        url: format!("https://x.test/{}.png", i),
                        schema: ResponseSchema::ImageUrl,
                    },
                )
            })
            .collect();

        let summary = VariantSequence::get_execution_summary(&results);
        assert_eq!(summary.get("total_results").unwrap(), &serde_json::Value::Number(2.into()));
        let urls = summary.get("image_urls").unwrap().as_array().unwrap();
        assert_eq!(urls[1], serde_json::Value::String("https://x.test/1.png".to_string()));
    }
}
