use anyhow::Context;
use clap::Parser;
use wave_studio::config::Command;
use wave_studio::domain::model::{Platform, PRESET_PROMPTS};
use wave_studio::utils::error::ErrorSeverity;
use wave_studio::utils::{logger, validation::Validate};
use wave_studio::{CliConfig, GenerationResult, Studio, StudioError, VariantSequence};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = CliConfig::parse();

    match &cli.command {
        Command::Presets => {
            for (index, prompt) in PRESET_PROMPTS.iter().enumerate() {
                println!("{}. {}", index + 1, prompt);
            }
            return Ok(());
        }
        Command::Platforms => {
            for platform in Platform::ALL {
                println!("{:<10} {}", platform.id(), platform.display_name());
            }
            return Ok(());
        }
        _ => {}
    }

    let config = cli
        .load_studio_config()
        .context("Failed to load studio configuration")?;

    // 初始化日誌
    if config.json_logging() {
        logger::init_json_logger();
    } else {
        logger::init_cli_logger(cli.verbose);
    }

    tracing::info!("🚀 Starting wave-studio");
    if cli.verbose {
        tracing::debug!("Studio config: {:?}", config);
    }

    // 驗證配置
    if let Err(e) = config.validate() {
        tracing::error!("❌ Configuration validation failed: {}", e);
        tracing::error!("💡 Suggestion: {}", e.recovery_suggestion());
        eprintln!("❌ {}", e.user_friendly_message());
        std::process::exit(exit_code(&e));
    }

    let studio = Studio::from_config(config)?;

    let outcome = match &cli.command {
        Command::Generate { prompt } => studio.generate_one(prompt).await.map(|r| vec![r]),
        Command::Variants { prompt } => {
            let run = studio
                .generate_variants(prompt, |progress| {
                    println!(
                        "🎨 Generating {} ({}/{})...",
                        progress.label, progress.current, progress.total
                    );
                })
                .await;

            match run {
                Ok(results) => {
                    let summary = VariantSequence::get_execution_summary(&results);
                    tracing::info!("📊 Variant summary: {:?}", summary);
                    Ok(results)
                }
                Err(e) => {
                    for result in &e.completed {
                        print_result(result);
                    }
                    eprintln!("❌ {} (index {}) did not complete", e.label, e.index);
                    Err(e.source)
                }
            }
        }
        Command::Presets | Command::Platforms => Ok(Vec::new()),
    };

    match outcome {
        Ok(results) => {
            for result in &results {
                print_result(result);
                if cli.schedule {
                    let post = studio.schedule(&result.id)?;
                    println!(
                        "🌊 Wave scheduled for {}",
                        post.scheduled_for.format("%Y-%m-%d %H:%M UTC")
                    );
                }
            }

            let analytics = studio.analytics();
            println!(
                "📈 Predicted engagement: {:.0}% | Viral score: {:.0}/100",
                analytics.predicted_engagement, analytics.viral_score
            );
            println!(
                "   Excitement {:.0} | Innovation {:.0} | Trust {:.0}",
                analytics.emotional_impact.excitement,
                analytics.emotional_impact.innovation,
                analytics.emotional_impact.trust
            );
        }
        Err(e) => {
            tracing::error!(
                "❌ Generation failed: {} (Category: {:?}, Severity: {:?})",
                e,
                e.category(),
                e.severity()
            );
            tracing::error!("💡 Recovery suggestion: {}", e.recovery_suggestion());

            eprintln!("❌ {}", e.user_friendly_message());
            eprintln!("💡 Suggestion: {}", e.recovery_suggestion());

            let code = exit_code(&e);
            if code > 0 {
                std::process::exit(code);
            }
        }
    }

    Ok(())
}

fn print_result(result: &GenerationResult) {
    let platforms: Vec<&str> = result
        .target_platforms
        .iter()
        .map(|p| p.display_name())
        .collect();
    println!("🖼️  {}", result.image_url);
    println!("   id: {} | prompt: {}", result.id, result.prompt_text);
    println!("   platforms: {}", platforms.join(", "));
}

fn exit_code(error: &StudioError) -> i32 {
    match error.severity() {
        ErrorSeverity::Low => 0,
        ErrorSeverity::Medium => 2,
        ErrorSeverity::High => 1,
        ErrorSeverity::Critical => 3,
    }
}
