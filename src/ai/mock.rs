use super::gemini::types::GenerationPayload;
use super::GenerationService;
use async_trait::async_trait;
use std::sync::{Arc, Mutex};

/// Records every payload it receives and replies from a canned list.
#[derive(Clone)]
pub struct MockGenerationClient {
    responses: Arc<Mutex<Vec<String>>>,
    payloads: Arc<Mutex<Vec<GenerationPayload>>>,
}

impl MockGenerationClient {
    pub fn new() -> Self {
        Self {
            responses: Arc::new(Mutex::new(Vec::new())),
            payloads: Arc::new(Mutex::new(Vec::new())),
        }
    }

    pub fn with_response(self, response: String) -> Self {
        self.responses.lock().unwrap().push(response);
        self
    }

    pub fn get_call_count(&self) -> usize {
        self.payloads.lock().unwrap().len()
    }

    pub fn payloads(&self) -> Vec<GenerationPayload> {
        self.payloads.lock().unwrap().clone()
    }

    pub fn last_payload(&self) -> Option<GenerationPayload> {
        self.payloads.lock().unwrap().last().cloned()
    }
}

impl Default for MockGenerationClient {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl GenerationService for MockGenerationClient {
    async fn invoke(&self, payload: &GenerationPayload) -> String {
        let mut payloads = self.payloads.lock().unwrap();
        payloads.push(payload.clone());
        let count = payloads.len();

        let responses = self.responses.lock().unwrap();
        if responses.is_empty() {
            "Mock generated answer".to_string()
        } else {
            responses[(count - 1) % responses.len()].clone()
        }
    }
}
