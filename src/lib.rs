pub mod config;
pub mod core;
pub mod domain;
pub mod utils;

#[cfg(feature = "cli")]
pub use crate::config::CliConfig;

pub use crate::config::StudioConfig;
pub use crate::core::{
    client::HttpImageGenerator,
    normalizer::normalize_response,
    pipeline::{GenerationPipeline, RetryPolicy},
    studio::Studio,
    variant_sequence::{CancelToken, VariantProgress, VariantRunError, VariantSequence},
};
pub use crate::domain::model::{GenerationResult, Platform, ResponseSchema};
pub use crate::utils::error::{Result, StudioError};
