pub mod generation;
pub mod metrics;
pub mod parser;
pub mod prompts;
pub mod providers;

pub use generation::{GenerationError, GenerationService};
