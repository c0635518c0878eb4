use super::types::{GenerateContentResponse, GenerationPayload};
use crate::ai::retry::{with_backoff, RetryPolicy};
use crate::ai::{
    GenerationService, CONNECTIVITY_FALLBACK, NO_RESPONSE_FALLBACK, PROCESSING_FALLBACK,
};
use crate::models::{ApiKey, Config};
use crate::{Error, Result};
use async_trait::async_trait;
use reqwest::Client;
use std::time::Duration;

/// Gemini REST client with bounded retries around `generateContent`.
pub struct GeminiClient {
    client: Client,
    api_key: ApiKey,
    model: String,
    base_url: String,
    timeout: Duration,
    retry: RetryPolicy,
}

impl GeminiClient {
    pub fn new(config: &Config) -> Self {
        Self::new_with_client(config, Client::new())
    }

    pub fn new_with_client(config: &Config, client: Client) -> Self {
        let model = config
            .gemini_model
            .strip_prefix("models/")
            .unwrap_or(&config.gemini_model)
            .to_string();

        Self {
            client,
            api_key: config.gemini_api_key.clone(),
            model,
            base_url: config.gemini_base_url.trim_end_matches('/').to_string(),
            timeout: config.request_timeout,
            retry: config.retry,
        }
    }

    /// Returns the configured model ID without the `models/` prefix.
    pub fn model(&self) -> &str {
        &self.model
    }

    fn endpoint(&self) -> String {
        format!(
            "{}/v1beta/models/{}:generateContent",
            self.base_url, self.model
        )
    }

    /// One attempt: POST the payload and pull out the first candidate's text.
    async fn generate_content(&self, payload: &GenerationPayload) -> Result<String> {
        tracing::debug!(model = %self.model, "Sending generateContent request to Gemini");

        let response = self
            .client
            .post(self.endpoint())
            .query(&[("key", self.api_key.expose())])
            .timeout(self.timeout)
            .json(payload)
            .send()
            .await
            .map_err(redact_url)?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(Error::AiStatus {
                status: status.as_u16(),
                body,
            });
        }

        // A body that is not JSON at all surfaces as a reqwest decode error and
        // is retried like any other transport failure.
        let body: serde_json::Value = response.json().await.map_err(redact_url)?;
        extract_text(body)
    }
}

/// reqwest errors print their URL, which carries the API key.
fn redact_url(e: reqwest::Error) -> Error {
    Error::Http(e.without_url())
}

/// Pull `candidates[0].content.parts[0].text` out of a decoded response body.
pub fn extract_text(body: serde_json::Value) -> Result<String> {
    let response: GenerateContentResponse =
        serde_json::from_value(body).map_err(|e| Error::MalformedResponse(e.to_string()))?;

    let candidate = match response.candidates.as_deref() {
        Some([first, ..]) => first,
        _ => return Err(Error::NoCandidates),
    };

    candidate
        .content
        .as_ref()
        .and_then(|content| content.parts.as_deref())
        .and_then(|parts| parts.first())
        .and_then(|part| part.text.clone())
        .ok_or_else(|| {
            Error::MalformedResponse("candidate has no content.parts[0].text".to_string())
        })
}

#[async_trait]
impl GenerationService for GeminiClient {
    async fn invoke(&self, payload: &GenerationPayload) -> String {
        match with_backoff(&self.retry, |_| self.generate_content(payload)).await {
            Ok(text) => text,
            Err(Error::NoCandidates) => {
                tracing::warn!("Gemini returned no candidates");
                NO_RESPONSE_FALLBACK.to_string()
            }
            Err(Error::MalformedResponse(detail)) => {
                tracing::error!("Error parsing Gemini API response: {}", detail);
                PROCESSING_FALLBACK.to_string()
            }
            Err(e) => {
                tracing::error!(
                    "Gemini unreachable after {} attempts: {}",
                    self.retry.max_attempts,
                    e
                );
                CONNECTIVITY_FALLBACK.to_string()
            }
        }
    }
}
