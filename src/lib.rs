//! Backend relay for the farmer assistant chat
//!
//! Accepts text or photo questions over HTTP, builds a Gemini prompt suited to
//! each, and returns the generated answer.

pub mod ai;
pub mod app;
pub mod error;
pub mod models;
pub mod prompts;
pub mod router;

pub use error::{Error, Result};
