use crate::core::normalizer::normalize_response;
use crate::domain::model::NormalizedImage;
use crate::domain::ports::{EndpointConfig, ImageGenerator};
use crate::utils::error::Result;
use reqwest::Client;
use serde::Serialize;
use serde_json::Value;

#[derive(Debug, Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Debug, Serialize)]
struct ChatCompletionRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
}

/// 以聊天補全格式呼叫上游生成服務
pub struct HttpImageGenerator<C: EndpointConfig> {
    config: C,
    client: Client,
}

impl<C: EndpointConfig> HttpImageGenerator<C> {
    pub fn new(config: C) -> Result<Self> {
        let client = Client::builder()
            .timeout(config.request_timeout())
            .build()?;
        Ok(Self { config, client })
    }

    pub fn config(&self) -> &C {
        &self.config
    }
}

#[async_trait::async_trait]
impl<C: EndpointConfig> ImageGenerator for HttpImageGenerator<C> {
    async fn generate(&self, prompt: &str) -> Result<NormalizedImage> {
        let payload = ChatCompletionRequest {
            model: self.config.model(),
            messages: vec![ChatMessage {
                role: "user",
                content: prompt,
            }],
        };

        tracing::debug!("Making generation request to: {}", self.config.endpoint());
        let mut request = self.client.post(self.config.endpoint()).json(&payload);
        if let Some(api_key) = self.config.api_key() {
            request = request.bearer_auth(api_key);
        }

        let response = request.send().await?;
        let status = response.status();
        tracing::debug!("Generation response status: {}", status);

        // 非 JSON 回應保留原文，讓錯誤訊息仍帶有診斷資訊
        let text = response.text().await?;
        let body = serde_json::from_str::<Value>(&text).unwrap_or(Value::String(text));

        let image = normalize_response(status.as_u16(), &body).inspect_err(|e| {
            tracing::error!("❌ Unexpected generation response: {}", e);
        })?;
        tracing::debug!("🖼️ Image URL resolved via {:?}: {}", image.schema, image.url);

        Ok(image)
    }
}
