use crate::core::pipeline::RetryPolicy;
use crate::domain::model::{Platform, VariantStyle};
use crate::domain::ports::EndpointConfig;
use crate::utils::error::{Result, StudioError};
use crate::utils::validation::{self, Validate};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

pub const DEFAULT_ENDPOINT: &str = "https://api.blackbox.ai/chat/completions";
pub const DEFAULT_MODEL: &str = "blackboxai/black-forest-labs/flux-pro";
pub const DEFAULT_TIMEOUT_SECONDS: u64 = 60;
pub const DEFAULT_VARIANT_DELAY_MS: u64 = 1000;
pub const DEFAULT_RETRY_BACKOFF_MS: u64 = 500;
pub const MAX_RETRIES_LIMIT: u32 = 10;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StudioConfig {
    pub endpoint: EndpointSection,
    pub variants: Option<VariantsConfig>,
    pub retry: Option<RetryConfig>,
    pub platforms: Option<PlatformsConfig>,
    pub logging: Option<LoggingConfig>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EndpointSection {
    pub url: String,
    pub api_key: Option<String>,
    pub model: Option<String>,
    pub timeout_seconds: Option<u64>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VariantsConfig {
    pub delay_ms: Option<u64>,
    pub styles: Option<Vec<VariantStyleConfig>>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VariantStyleConfig {
    pub label: String,
    pub suffix: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RetryConfig {
    pub max_retries: Option<u32>,
    pub backoff_ms: Option<u64>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlatformsConfig {
    pub selected: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    pub json: Option<bool>,
}

impl Default for StudioConfig {
    fn default() -> Self {
        Self {
            endpoint: EndpointSection {
                url: DEFAULT_ENDPOINT.to_string(),
                api_key: None,
                model: None,
                timeout_seconds: None,
            },
            variants: None,
            retry: None,
            platforms: None,
            logging: None,
        }
    }
}

impl StudioConfig {
    /// 從 TOML 檔案載入配置
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(&path).map_err(StudioError::IoError)?;
        Self::from_toml_str(&content)
    }

    /// 從 TOML 字串解析配置
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let processed_content = Self::substitute_env_vars(content)?;

        toml::from_str(&processed_content).map_err(|e| StudioError::ConfigValidationError {
            field: "toml_parsing".to_string(),
            message: format!("TOML parsing error: {}", e),
        })
    }

    /// 替換環境變數 (例如 ${WAVE_API_KEY})，找不到的變數保持原樣
    fn substitute_env_vars(content: &str) -> Result<String> {
        use regex::Regex;
        let re = Regex::new(r"\$\{([^}]+)\}").map_err(|e| StudioError::ConfigValidationError {
            field: "env_substitution".to_string(),
            message: e.to_string(),
        })?;

        let result = re.replace_all(content, |caps: &regex::Captures| {
            let var_name = &caps[1];
            std::env::var(var_name).unwrap_or_else(|_| format!("${{{}}}", var_name))
        });

        Ok(result.to_string())
    }

    pub fn variant_delay(&self) -> Duration {
        Duration::from_millis(
            self.variants
                .as_ref()
                .and_then(|v| v.delay_ms)
                .unwrap_or(DEFAULT_VARIANT_DELAY_MS),
        )
    }

    pub fn variant_styles(&self) -> Vec<VariantStyle> {
        match self.variants.as_ref().and_then(|v| v.styles.as_ref()) {
            Some(styles) if !styles.is_empty() => styles
                .iter()
                .map(|s| VariantStyle::new(s.label.clone(), s.suffix.clone()))
                .collect(),
            _ => VariantStyle::defaults(),
        }
    }

    pub fn retry_policy(&self) -> RetryPolicy {
        let retry = self.retry.as_ref();
        RetryPolicy::new(
            retry.and_then(|r| r.max_retries).unwrap_or(0),
            Duration::from_millis(
                retry
                    .and_then(|r| r.backoff_ms)
                    .unwrap_or(DEFAULT_RETRY_BACKOFF_MS),
            ),
        )
    }

    pub fn selected_platforms(&self) -> Result<Vec<Platform>> {
        match &self.platforms {
            None => Ok(Platform::default_selection()),
            Some(platforms) => platforms
                .selected
                .iter()
                .map(|id| {
                    Platform::from_id(id).ok_or_else(|| StudioError::InvalidConfigValueError {
                        field: "platforms.selected".to_string(),
                        value: id.clone(),
                        reason: format!(
                            "Unknown platform. Valid platforms: {}",
                            Platform::ALL
                                .iter()
                                .map(|p| p.id())
                                .collect::<Vec<_>>()
                                .join(", ")
                        ),
                    })
                })
                .collect(),
        }
    }

    pub fn json_logging(&self) -> bool {
        self.logging.as_ref().and_then(|l| l.json).unwrap_or(false)
    }

    /// 驗證配置的合理性
    pub fn validate_config(&self) -> Result<()> {
        validation::validate_url("endpoint.url", &self.endpoint.url)?;

        if let Some(model) = &self.endpoint.model {
            validation::validate_non_empty_string("endpoint.model", model)?;
        }

        if let Some(timeout) = self.endpoint.timeout_seconds {
            validation::validate_positive_number("endpoint.timeout_seconds", timeout, 1)?;
        }

        if let Some(max_retries) = self.retry.as_ref().and_then(|r| r.max_retries) {
            validation::validate_range("retry.max_retries", max_retries, 0, MAX_RETRIES_LIMIT)?;
        }

        if let Some(styles) = self.variants.as_ref().and_then(|v| v.styles.as_ref()) {
            for style in styles {
                validation::validate_non_empty_string("variants.styles.label", &style.label)?;
                validation::validate_non_empty_string("variants.styles.suffix", &style.suffix)?;
            }
        }

        self.selected_platforms()?;
        Ok(())
    }
}

impl EndpointConfig for StudioConfig {
    fn endpoint(&self) -> &str {
        &self.endpoint.url
    }

    /// 空字串或未替換的 ${VAR} 視為沒有金鑰
    fn api_key(&self) -> Option<&str> {
        self.endpoint
            .api_key
            .as_deref()
            .map(str::trim)
            .filter(|key| !key.is_empty() && !key.starts_with("${"))
    }

    fn model(&self) -> &str {
        self.endpoint.model.as_deref().unwrap_or(DEFAULT_MODEL)
    }

    fn request_timeout(&self) -> Duration {
        Duration::from_secs(
            self.endpoint
                .timeout_seconds
                .unwrap_or(DEFAULT_TIMEOUT_SECONDS),
        )
    }
}

impl Validate for StudioConfig {
    fn validate(&self) -> Result<()> {
        self.validate_config()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_full_config_parsing() {
        let toml_content = r#"
[endpoint]
url = "https://images.example.com/v1/chat/completions"
api_key = "sk-test"
model = "flux-dev"
timeout_seconds = 30

[variants]
delay_ms = 250

[[variants.styles]]
label = "Warm"
suffix = "warm sunset palette"

[[variants.styles]]
label = "Cold"
suffix = "icy blue palette"

[retry]
max_retries = 2
backoff_ms = 100

[platforms]
selected = ["linkedin", "Twitter"]

[logging]
json = true
"#;

        let config = StudioConfig::from_toml_str(toml_content).unwrap();
        assert!(config.validate().is_ok());
        assert_eq!(config.endpoint(), "https://images.example.com/v1/chat/completions");
        assert_eq!(config.api_key(), Some("sk-test"));
        assert_eq!(config.model(), "flux-dev");
        assert_eq!(config.request_timeout(), Duration::from_secs(30));
        assert_eq!(config.variant_delay(), Duration::from_millis(250));
        assert_eq!(config.variant_styles()[1].apply("cat"), "cat - icy blue palette");
        assert_eq!(
            config.retry_policy(),
            RetryPolicy::new(2, Duration::from_millis(100))
        );
        assert_eq!(
            config.selected_platforms().unwrap(),
            vec![Platform::LinkedIn, Platform::Twitter]
        );
        assert!(config.json_logging());
    }

    #[test]
    fn test_minimal_config_uses_defaults() {
        let config = StudioConfig::from_toml_str(
            r#"
[endpoint]
url = "https://api.blackbox.ai/chat/completions"
"#,
        )
        .unwrap();

        assert_eq!(config.model(), DEFAULT_MODEL);
        assert_eq!(config.api_key(), None);
        assert_eq!(config.request_timeout(), Duration::from_secs(60));
        assert_eq!(config.variant_delay(), Duration::from_millis(1000));
        assert_eq!(config.variant_styles(), VariantStyle::defaults());
        assert_eq!(config.retry_policy().max_retries, 0);
        assert_eq!(config.selected_platforms().unwrap(), Platform::default_selection());
    }

    #[test]
    fn test_unresolved_api_key_placeholder_is_ignored() {
        let config = StudioConfig::from_toml_str(
            r#"
[endpoint]
url = "https://api.blackbox.ai/chat/completions"
api_key = "${WAVE_STUDIO_SURELY_UNSET_VARIABLE}"
"#,
        )
        .unwrap();

        assert_eq!(config.api_key(), None);
    }

    #[test]
    fn test_validation_rejects_bad_values() {
        let mut config = StudioConfig::default();
        config.endpoint.url = "ftp://example.com".to_string();
        assert!(config.validate().is_err());

        let mut config = StudioConfig::default();
        config.endpoint.timeout_seconds = Some(0);
        assert!(config.validate().is_err());

        let mut config = StudioConfig::default();
        config.retry = Some(RetryConfig {
            max_retries: Some(50),
            backoff_ms: None,
        });
        assert!(config.validate().is_err());

        let mut config = StudioConfig::default();
        config.platforms = Some(PlatformsConfig {
            selected: vec!["myspace".to_string()],
        });
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_invalid_toml_reports_parsing_field() {
        match StudioConfig::from_toml_str("[endpoint\nurl = 1") {
            Err(StudioError::ConfigValidationError { field, .. }) => {
                assert_eq!(field, "toml_parsing")
            }
            other => panic!("expected config error, got {:?}", other),
        }
    }
}
