use crate::config::StudioConfig;
use crate::core::analytics;
use crate::core::client::HttpImageGenerator;
use crate::core::pipeline::GenerationPipeline;
use crate::core::result_log::ResultLog;
use crate::core::scheduler;
use crate::core::variant_sequence::{
    CancelToken, VariantProgress, VariantRunError, VariantSequence, DEFAULT_VARIANT_DELAY,
};
use crate::domain::model::{
    AnalyticsSnapshot, GenerationRequest, GenerationResult, Platform, ResultId, ScheduledPost,
    VariantStyle,
};
use crate::domain::ports::ImageGenerator;
use crate::utils::error::{Result, StudioError};
use std::sync::{Mutex, MutexGuard};
use std::time::Duration;

#[derive(Debug, Default)]
struct StudioState {
    log: ResultLog,
    analytics: AnalyticsSnapshot,
    scheduled: Vec<ScheduledPost>,
    platforms: Vec<Platform>,
}

/// 對外的生成入口：單張生成、A/B/C 變體、排程與分析
pub struct Studio<G: ImageGenerator> {
    pipeline: GenerationPipeline<G>,
    variant_styles: Vec<VariantStyle>,
    variant_delay: Duration,
    state: Mutex<StudioState>,
}

impl Studio<HttpImageGenerator<StudioConfig>> {
    pub fn from_config(config: StudioConfig) -> Result<Self> {
        let retry = config.retry_policy();
        let variant_delay = config.variant_delay();
        let variant_styles = config.variant_styles();
        let platforms = config.selected_platforms()?;

        let generator = HttpImageGenerator::new(config)?;
        Ok(Studio::new(GenerationPipeline::new(generator).with_retry(retry))
            .with_variant_styles(variant_styles)
            .with_variant_delay(variant_delay)
            .with_platforms(platforms))
    }
}

impl<G: ImageGenerator> Studio<G> {
    pub fn new(pipeline: GenerationPipeline<G>) -> Self {
        Self {
            pipeline,
            variant_styles: VariantStyle::defaults(),
            variant_delay: DEFAULT_VARIANT_DELAY,
            state: Mutex::new(StudioState {
                platforms: Platform::default_selection(),
                ..StudioState::default()
            }),
        }
    }

    pub fn with_variant_styles(mut self, styles: Vec<VariantStyle>) -> Self {
        self.variant_styles = styles;
        self
    }

    pub fn with_variant_delay(mut self, delay: Duration) -> Self {
        self.variant_delay = delay;
        self
    }

    pub fn with_platforms(self, platforms: Vec<Platform>) -> Self {
        self.set_platforms(platforms);
        self
    }

    pub fn pipeline(&self) -> &GenerationPipeline<G> {
        &self.pipeline
    }

    fn state(&self) -> MutexGuard<'_, StudioState> {
        self.state
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    pub async fn generate_one(&self, prompt_text: &str) -> Result<GenerationResult> {
        let request = GenerationRequest::new(prompt_text, &self.selected_platforms())?;
        tracing::info!("🎨 Generating image for prompt: {}", request.prompt_text());

        let result = self.pipeline.run(&request).await?;
        tracing::info!("✅ Image generated: {}", result.image_url);

        self.record(result.clone());
        Ok(result)
    }

    pub async fn generate_variants<F>(
        &self,
        base_prompt: &str,
        on_progress: F,
    ) -> std::result::Result<Vec<GenerationResult>, VariantRunError>
    where
        F: FnMut(&VariantProgress) + Send,
    {
        self.generate_variants_with_cancel(base_prompt, on_progress, &mut CancelToken::never())
            .await
    }

    pub async fn generate_variants_with_cancel<F>(
        &self,
        base_prompt: &str,
        on_progress: F,
        cancel: &mut CancelToken,
    ) -> std::result::Result<Vec<GenerationResult>, VariantRunError>
    where
        F: FnMut(&VariantProgress) + Send,
    {
        let platforms = self.selected_platforms();
        let mut sequence = VariantSequence::new(self.variant_styles.clone(), self.variant_delay);

        // 每個成功的變體立即寫入紀錄，執行中途被中止也不會遺失
        sequence
            .execute_all(
                &self.pipeline,
                base_prompt,
                &platforms,
                on_progress,
                |result| self.record(result.clone()),
                cancel,
            )
            .await
    }

    fn record(&self, result: GenerationResult) {
        let mut state = self.state();
        state.analytics = analytics::estimate(&result.prompt_text, &mut rand::thread_rng());
        state.log.record(result);
    }

    /// 新到舊的結果快照
    pub fn results(&self) -> Vec<GenerationResult> {
        self.state().log.snapshot()
    }

    pub fn result(&self, id: &ResultId) -> Option<GenerationResult> {
        self.state().log.get(id).cloned()
    }

    pub fn analytics(&self) -> AnalyticsSnapshot {
        self.state().analytics
    }

    pub fn schedule(&self, id: &ResultId) -> Result<ScheduledPost> {
        let mut state = self.state();
        let result = state
            .log
            .get(id)
            .cloned()
            .ok_or_else(|| StudioError::UnknownResult { id: id.to_string() })?;

        let post = scheduler::schedule(&result, chrono::Utc::now(), &mut rand::thread_rng());
        state.scheduled.push(post.clone());
        Ok(post)
    }

    pub fn scheduled_posts(&self) -> Vec<ScheduledPost> {
        self.state().scheduled.clone()
    }

    pub fn selected_platforms(&self) -> Vec<Platform> {
        self.state().platforms.clone()
    }

    pub fn set_platforms(&self, platforms: Vec<Platform>) {
        let mut deduped: Vec<Platform> = Vec::with_capacity(platforms.len());
        for platform in platforms {
            if !deduped.contains(&platform) {
                deduped.push(platform);
            }
        }
        self.state().platforms = deduped;
    }

    /// 切換平台勾選，回傳切換後是否為選取狀態
    pub fn toggle_platform(&self, platform: Platform) -> bool {
        let mut state = self.state();
        if let Some(position) = state.platforms.iter().position(|p| *p == platform) {
            state.platforms.remove(position);
            false
        } else {
            state.platforms.push(platform);
            true
        }
    }
}
