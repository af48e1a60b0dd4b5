//! 將上游生成服務的回應正規化成單一圖片網址。
//!
//! 上游沒有版本欄位，不同部署回傳的 JSON 形狀不同。以下依序比對五種已知形狀，
//! 第一個命中者勝出，順序即各方言之間的優先權：
//!
//! 1. `choices[0].message.content`（聊天補全格式，內容本身或其中的第一個網址）
//! 2. `url`
//! 3. `data[0].url`
//! 4. `image_url`
//! 5. `images[0]`
//!
//! 聊天內容中找不到網址時不算命中，繼續比對後面的形狀。

use crate::domain::model::{NormalizedImage, ResponseSchema};
use crate::utils::error::{Result, StudioError};
use regex::Regex;
use serde_json::Value;
use std::sync::OnceLock;
use url::Url;

fn embedded_url_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"https?://[^\s)]+").unwrap())
}

/// 純函式：相同的 (status, body) 永遠得到相同結果
pub fn normalize_response(status_code: u16, body: &Value) -> Result<NormalizedImage> {
    if !(200..300).contains(&status_code) {
        return Err(StudioError::Upstream {
            status_code,
            body: body.clone(),
        });
    }

    let image = chat_content_url(body)
        .map(|url| (url, ResponseSchema::ChatContent))
        .or_else(|| non_empty_str(body.get("url")).map(|url| (url, ResponseSchema::TopLevelUrl)))
        .or_else(|| {
            let first = body.get("data").and_then(|d| d.get(0));
            non_empty_str(first.and_then(|item| item.get("url")))
                .map(|url| (url, ResponseSchema::DataArray))
        })
        .or_else(|| non_empty_str(body.get("image_url")).map(|url| (url, ResponseSchema::ImageUrl)))
        .or_else(|| {
            non_empty_str(body.get("images").and_then(|images| images.get(0)))
                .map(|url| (url, ResponseSchema::ImagesArray))
        });

    match image {
        Some((url, schema)) => Ok(NormalizedImage { url, schema }),
        None => Err(StudioError::MalformedResponse { body: body.clone() }),
    }
}

fn chat_content_url(body: &Value) -> Option<String> {
    let content = body
        .get("choices")
        .and_then(|choices| choices.get(0))
        .and_then(|choice| choice.get("message"))
        .and_then(|message| message.get("content"))
        .and_then(|content| content.as_str())?;

    if is_absolute_http_url(content) {
        return Some(content.to_string());
    }

    embedded_url_pattern()
        .find(content)
        .map(|found| found.as_str().to_string())
}

fn is_absolute_http_url(candidate: &str) -> bool {
    if !(candidate.starts_with("http://") || candidate.starts_with("https://")) {
        return false;
    }
    if candidate.chars().any(char::is_whitespace) {
        return false;
    }
    Url::parse(candidate).is_ok()
}

fn non_empty_str(value: Option<&Value>) -> Option<String> {
    value
        .and_then(|v| v.as_str())
        .filter(|s| !s.is_empty())
        .map(|s| s.to_string())
}
