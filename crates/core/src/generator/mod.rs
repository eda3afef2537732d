//! Optional language-model response generation.
//!
//! Specialists compose responses from knowledge base templates by default.
//! When a generator is configured they build a prompt from the ticket,
//! customer and knowledge base data and use the generated text instead,
//! falling back to the template if generation fails.

mod config;
mod gemini;
mod ollama;
mod traits;

pub use config::{build_generator, GeneratorConfig, GeneratorProvider, GEMINI_API_KEY_ENV};
pub use gemini::GeminiClient;
pub use ollama::OllamaClient;
pub use traits::{GeneratedText, GenerationRequest, GeneratorError, ResponseGenerator};
