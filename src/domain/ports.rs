use crate::domain::model::NormalizedImage;
use crate::utils::error::Result;
use async_trait::async_trait;
use std::time::Duration;

/// 上游生成服務：送出提示詞，回傳正規化後的圖片網址
#[async_trait]
pub trait ImageGenerator: Send + Sync {
    async fn generate(&self, prompt: &str) -> Result<NormalizedImage>;
}

pub trait EndpointConfig: Send + Sync {
    fn endpoint(&self) -> &str;
    fn api_key(&self) -> Option<&str>;
    fn model(&self) -> &str;
    fn request_timeout(&self) -> Duration;
}
