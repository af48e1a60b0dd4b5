pub mod analytics;
pub mod client;
pub mod normalizer;
pub mod pipeline;
pub mod result_log;
pub mod scheduler;
pub mod studio;
pub mod variant_sequence;

pub use crate::domain::model::{GenerationRequest, GenerationResult, NormalizedImage};
pub use crate::domain::ports::{EndpointConfig, ImageGenerator};
pub use crate::utils::error::Result;
