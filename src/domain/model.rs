use crate::utils::error::{Result, StudioError};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Platform {
    Instagram,
    Twitter,
    Facebook,
    #[serde(rename = "linkedin")]
    LinkedIn,
}

impl Platform {
    pub const ALL: [Platform; 4] = [
        Platform::Instagram,
        Platform::Twitter,
        Platform::Facebook,
        Platform::LinkedIn,
    ];

    pub fn id(&self) -> &'static str {
        match self {
            Platform::Instagram => "instagram",
            Platform::Twitter => "twitter",
            Platform::Facebook => "facebook",
            Platform::LinkedIn => "linkedin",
        }
    }

    pub fn display_name(&self) -> &'static str {
        match self {
            Platform::Instagram => "Instagram",
            Platform::Twitter => "Twitter",
            Platform::Facebook => "Facebook",
            Platform::LinkedIn => "LinkedIn",
        }
    }

    pub fn from_id(id: &str) -> Option<Self> {
        let normalized = id.trim().to_lowercase();
        Self::ALL
            .iter()
            .copied()
            .find(|platform| platform.id() == normalized)
    }

    /// 預設勾選的平台
    pub fn default_selection() -> Vec<Platform> {
        vec![Platform::Instagram, Platform::Twitter, Platform::Facebook]
    }
}

impl fmt::Display for Platform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.id())
    }
}

/// 單次生成請求，建立後不可變
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GenerationRequest {
    prompt_text: String,
    target_platforms: Vec<Platform>,
}

impl GenerationRequest {
    pub fn new(prompt_text: impl Into<String>, target_platforms: &[Platform]) -> Result<Self> {
        let prompt_text = prompt_text.into();
        if prompt_text.trim().is_empty() {
            return Err(StudioError::EmptyPrompt);
        }

        let mut platforms = Vec::with_capacity(target_platforms.len());
        for platform in target_platforms {
            if !platforms.contains(platform) {
                platforms.push(*platform);
            }
        }

        Ok(Self {
            prompt_text,
            target_platforms: platforms,
        })
    }

    pub fn prompt_text(&self) -> &str {
        &self.prompt_text
    }

    pub fn target_platforms(&self) -> &[Platform] {
        &self.target_platforms
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ResultId(Uuid);

impl ResultId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for ResultId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for ResultId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.0, f)
    }
}

/// 上游回應的格式方言，依解析時命中的欄位決定
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResponseSchema {
    /// `choices[0].message.content`
    ChatContent,
    /// `url`
    TopLevelUrl,
    /// `data[0].url`
    DataArray,
    /// `image_url`
    ImageUrl,
    /// `images[0]`
    ImagesArray,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NormalizedImage {
    pub url: String,
    pub schema: ResponseSchema,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GenerationResult {
    pub id: ResultId,
    pub image_url: String,
    pub prompt_text: String,
    pub created_at: DateTime<Utc>,
    pub target_platforms: Vec<Platform>,
    pub schema: ResponseSchema,
}

impl GenerationResult {
    pub fn from_normalized(request: &GenerationRequest, image: NormalizedImage) -> Self {
        Self {
            id: ResultId::new(),
            image_url: image.url,
            prompt_text: request.prompt_text().to_string(),
            created_at: Utc::now(),
            target_platforms: request.target_platforms().to_vec(),
            schema: image.schema,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VariantStyle {
    pub label: String,
    pub suffix: String,
}

impl VariantStyle {
    pub fn new(label: impl Into<String>, suffix: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            suffix: suffix.into(),
        }
    }

    pub fn apply(&self, base_prompt: &str) -> String {
        format!("{} - {}", base_prompt, self.suffix)
    }

    /// A/B/C 三種固定風格
    pub fn defaults() -> Vec<VariantStyle> {
        vec![
            VariantStyle::new("Variant A", "variant A with vibrant neon colors"),
            VariantStyle::new("Variant B", "variant B with minimalist cyberpunk style"),
            VariantStyle::new("Variant C", "variant C with bold flowing composition"),
        ]
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VariantPrompt {
    pub index: usize,
    pub label: String,
    pub prompt: String,
}

/// 由基礎提示詞推導出的變體，只在一次執行期間存在
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VariantBatch {
    prompts: Vec<VariantPrompt>,
}

impl VariantBatch {
    pub fn derive(base_prompt: &str, styles: &[VariantStyle]) -> Result<Self> {
        if base_prompt.trim().is_empty() {
            return Err(StudioError::EmptyPrompt);
        }

        let prompts = styles
            .iter()
            .enumerate()
            .map(|(index, style)| VariantPrompt {
                index,
                label: style.label.clone(),
                prompt: style.apply(base_prompt),
            })
            .collect();

        Ok(Self { prompts })
    }

    pub fn len(&self) -> usize {
        self.prompts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.prompts.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &VariantPrompt> {
        self.prompts.iter()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PostStatus {
    Scheduled,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScheduledPost {
    pub result: GenerationResult,
    pub scheduled_for: DateTime<Utc>,
    pub status: PostStatus,
}

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct EmotionalImpact {
    pub excitement: f64,
    pub innovation: f64,
    pub trust: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct AnalyticsSnapshot {
    pub predicted_engagement: f64,
    pub viral_score: f64,
    pub emotional_impact: EmotionalImpact,
}

pub const PRESET_PROMPTS: [&str; 5] = [
    "Stunning 3D holographic product launch with neon lighting and particle effects",
    "Viral social media post design with bold typography and electric cyan waves",
    "Premium tech brand announcement with glowing circuits and futuristic UI elements",
    "Eye-catching advertisement with dynamic motion blur and vibrant gradient overlays",
    "Creative social content with abstract fluid shapes and neon color splash effects",
];
