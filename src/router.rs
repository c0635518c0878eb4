//! Request routing between text-only and image diagnosis prompts.

use crate::ai::gemini::types::{
    Content, GenerationConfig, GenerationPayload, GoogleSearch, InlineData, Part, Tool,
};
use crate::ai::GenerationService;
use crate::{prompts, Error, Result};
use std::sync::Arc;

/// Uploaded photos are always forwarded as JPEG regardless of the data URL header.
pub const IMAGE_MIME_TYPE: &str = "image/jpeg";
pub const IMAGE_TEMPERATURE: f64 = 0.2;
pub const TEXT_TEMPERATURE: f64 = 0.7;

/// Picks a payload shape for each chat request and hands it to the generator.
pub struct ChatRouter {
    generation: Arc<dyn GenerationService>,
}

impl ChatRouter {
    pub fn new(generation: Arc<dyn GenerationService>) -> Self {
        Self { generation }
    }

    /// Fails only when `image_data` is present but not a data URL.
    pub async fn route(&self, message: &str, image_data: Option<&str>) -> Result<String> {
        let payload = match image_data.filter(|data| !data.is_empty()) {
            Some(data) => {
                tracing::debug!("Routing chat request to image diagnosis");
                build_image_payload(message, data)?
            }
            None => {
                tracing::debug!("Routing chat request to grounded text query");
                build_text_payload(message)
            }
        };

        Ok(self.generation.invoke(&payload).await)
    }
}

/// Single user message with search grounding and the farmer persona.
pub fn build_text_payload(message: &str) -> GenerationPayload {
    GenerationPayload {
        contents: vec![Content {
            parts: vec![Part::text(message)],
        }],
        tools: Some(vec![Tool {
            google_search: GoogleSearch {},
        }]),
        system_instruction: Some(Content {
            parts: vec![Part::text(prompts::FARMER_SYSTEM)],
        }),
        generation_config: GenerationConfig {
            temperature: TEXT_TEMPERATURE,
        },
    }
}

/// Diagnosis instruction, the inline photo, then the user's message, in that order.
pub fn build_image_payload(message: &str, image_data: &str) -> Result<GenerationPayload> {
    let data = strip_data_url(image_data)?;

    Ok(GenerationPayload {
        contents: vec![Content {
            parts: vec![
                Part::text(prompts::IMAGE_DIAGNOSIS),
                Part::InlineData {
                    inline_data: InlineData {
                        mime_type: IMAGE_MIME_TYPE.to_string(),
                        data: data.to_string(),
                    },
                },
                Part::text(message),
            ],
        }],
        tools: None,
        system_instruction: None,
        generation_config: GenerationConfig {
            temperature: IMAGE_TEMPERATURE,
        },
    })
}

/// `data:image/jpeg;base64,AAAA` -> `AAAA`
pub fn strip_data_url(image_data: &str) -> Result<&str> {
    image_data
        .split_once(',')
        .map(|(_, data)| data)
        .ok_or(Error::MalformedImageData)
}
