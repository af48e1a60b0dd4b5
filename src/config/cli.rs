use crate::config::toml_config::{
    PlatformsConfig, RetryConfig, StudioConfig, VariantsConfig,
};
use crate::utils::error::Result;
use clap::{Parser, Subcommand};

#[derive(Debug, Clone, Parser)]
#[command(name = "wave-studio")]
#[command(about = "Generate social media images and A/B/C prompt variants")]
pub struct CliConfig {
    #[command(subcommand)]
    pub command: Command,

    /// Path to a TOML configuration file
    #[arg(short, long, global = true)]
    pub config: Option<String>,

    /// Generation endpoint (chat-completions style)
    #[arg(long, global = true)]
    pub endpoint: Option<String>,

    #[arg(long, global = true, env = "WAVE_API_KEY", hide_env_values = true)]
    pub api_key: Option<String>,

    #[arg(long, global = true)]
    pub model: Option<String>,

    #[arg(long, global = true)]
    pub timeout_seconds: Option<u64>,

    /// Pause between variant requests
    #[arg(long, global = true)]
    pub variant_delay_ms: Option<u64>,

    #[arg(long, global = true)]
    pub max_retries: Option<u32>,

    /// Target platforms (comma-separated)
    #[arg(long, global = true, value_delimiter = ',')]
    pub platforms: Vec<String>,

    /// Schedule every generated image at a random time in the next 48 hours
    #[arg(long, global = true)]
    pub schedule: bool,

    #[arg(short, long, global = true, help = "Enable verbose output")]
    pub verbose: bool,
}

#[derive(Debug, Clone, Subcommand)]
pub enum Command {
    /// Generate a single image
    Generate {
        #[arg(short, long)]
        prompt: String,
    },
    /// Generate variants A, B and C one after another
    Variants {
        #[arg(short, long)]
        prompt: String,
    },
    /// List preset prompts
    Presets,
    /// List supported platforms
    Platforms,
}

impl CliConfig {
    /// 載入設定檔（若有），再以命令列參數覆寫
    pub fn load_studio_config(&self) -> Result<StudioConfig> {
        let mut config = match &self.config {
            Some(path) => StudioConfig::from_file(path)?,
            None => StudioConfig::default(),
        };
        self.apply_overrides(&mut config);
        Ok(config)
    }

    pub fn apply_overrides(&self, config: &mut StudioConfig) {
        if let Some(endpoint) = &self.endpoint {
            config.endpoint.url = endpoint.clone();
        }
        if let Some(api_key) = &self.api_key {
            config.endpoint.api_key = Some(api_key.clone());
        }
        if let Some(model) = &self.model {
            config.endpoint.model = Some(model.clone());
        }
        if let Some(timeout) = self.timeout_seconds {
            config.endpoint.timeout_seconds = Some(timeout);
        }
        if let Some(delay_ms) = self.variant_delay_ms {
            config
                .variants
                .get_or_insert(VariantsConfig {
                    delay_ms: None,
                    styles: None,
                })
                .delay_ms = Some(delay_ms);
        }
        if let Some(max_retries) = self.max_retries {
            config
                .retry
                .get_or_insert(RetryConfig {
                    max_retries: None,
                    backoff_ms: None,
                })
                .max_retries = Some(max_retries);
        }
        if !self.platforms.is_empty() {
            config.platforms = Some(PlatformsConfig {
                selected: self.platforms.clone(),
            });
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::model::Platform;
    use crate::domain::ports::EndpointConfig;
    use std::time::Duration;

    #[test]
    fn test_cli_overrides_defaults() {
        let cli = CliConfig::try_parse_from([
            "wave-studio",
            "variants",
            "--prompt",
            "cat",
            "--endpoint",
            "http://localhost:9000/chat",
            "--variant-delay-ms",
            "10",
            "--max-retries",
            "1",
            "--platforms",
            "linkedin,instagram",
        ])
        .unwrap();

        let config = cli.load_studio_config().unwrap();
        assert_eq!(config.endpoint(), "http://localhost:9000/chat");
        assert_eq!(config.variant_delay(), Duration::from_millis(10));
        assert_eq!(config.retry_policy().max_retries, 1);
        assert_eq!(
            config.selected_platforms().unwrap(),
            vec![Platform::LinkedIn, Platform::Instagram]
        );
        assert!(matches!(cli.command, Command::Variants { ref prompt } if prompt == "cat"));
    }

    #[test]
    fn test_cli_requires_prompt_for_generate() {
        assert!(CliConfig::try_parse_from(["wave-studio", "generate"]).is_err());
    }
}
