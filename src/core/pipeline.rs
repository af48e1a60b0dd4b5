use crate::domain::model::{GenerationRequest, GenerationResult};
use crate::domain::ports::ImageGenerator;
use crate::utils::error::Result;
use std::time::Duration;

/// 重試策略，預設不重試
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub max_retries: u32,
    pub backoff: Duration,
}

impl RetryPolicy {
    pub fn none() -> Self {
        Self {
            max_retries: 0,
            backoff: Duration::from_millis(500),
        }
    }

    pub fn new(max_retries: u32, backoff: Duration) -> Self {
        Self {
            max_retries,
            backoff,
        }
    }

    /// 線性退避：第 n 次重試前等待 n × backoff
    pub fn delay_for(&self, attempt: u32) -> Duration {
        self.backoff * attempt
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::none()
    }
}

/// 發出請求 → 正規化回應 → 建立結果
pub struct GenerationPipeline<G: ImageGenerator> {
    generator: G,
    retry: RetryPolicy,
}

impl<G: ImageGenerator> GenerationPipeline<G> {
    pub fn new(generator: G) -> Self {
        Self {
            generator,
            retry: RetryPolicy::none(),
        }
    }

    pub fn with_retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    pub fn generator(&self) -> &G {
        &self.generator
    }

    pub fn retry_policy(&self) -> RetryPolicy {
        self.retry
    }

    pub async fn run(&self, request: &GenerationRequest) -> Result<GenerationResult> {
        let mut attempt = 0;
        loop {
            match self.generator.generate(request.prompt_text()).await {
                Ok(image) => return Ok(GenerationResult::from_normalized(request, image)),
                Err(e) if e.is_retryable() && attempt < self.retry.max_retries => {
                    attempt += 1;
                    let delay = self.retry.delay_for(attempt);
                    tracing::warn!(
                        "🔁 Generation attempt {} failed: {} (retrying in {:?})",
                        attempt,
                        e,
                        delay
                    );
                    tokio::time::sleep(delay).await;
                }
                Err(e) => return Err(e),
            }
        }
    }
}
