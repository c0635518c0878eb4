//! AI service integration for chat generation
//!
//! Wraps Gemini's `generateContent` endpoint behind [`GenerationService`],
//! absorbing every AI-layer failure into a user-facing apology string.

pub mod gemini;
pub mod mock;
pub mod retry;

pub use gemini::GeminiClient;
pub use mock::MockGenerationClient;

use async_trait::async_trait;
use gemini::types::GenerationPayload;

pub const CONNECTIVITY_FALLBACK: &str = "I'm sorry, I am unable to connect to the AI service right now. Please check your network and try again.";
pub const NO_RESPONSE_FALLBACK: &str = "Sorry, I couldn't generate a response. Please try again.";
pub const PROCESSING_FALLBACK: &str =
    "An unexpected error occurred while processing the AI response.";

#[async_trait]
pub trait GenerationService: Send + Sync {
    /// Send a payload and return the generated text, or a fallback string.
    async fn invoke(&self, payload: &GenerationPayload) -> String;
}
