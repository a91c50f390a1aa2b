use log::debug;
use reqwest::Client;

use crate::error::{GlosaError, Result};
use crate::llm::types::*;

const GEMINI_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta";
pub const DEFAULT_EXTRACTION_MODEL: &str = "gemini-2.5-pro";
pub const DEFAULT_DRAFTING_MODEL: &str = "gemini-2.5-flash";

#[derive(Debug, Clone)]
pub struct GeminiConfig {
    pub api_key: String,
    pub base_url: String,
    pub extraction_model: String,
    pub drafting_model: String,
}

impl GeminiConfig {
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            base_url: GEMINI_BASE_URL.to_string(),
            extraction_model: DEFAULT_EXTRACTION_MODEL.to_string(),
            drafting_model: DEFAULT_DRAFTING_MODEL.to_string(),
        }
    }

    /// Reads the key from `GEMINI_API_KEY`, falling back to `API_KEY`.
    pub fn from_env() -> Result<Self> {
        std::env::var("GEMINI_API_KEY")
            .or_else(|_| std::env::var("API_KEY"))
            .ok()
            .filter(|key| !key.trim().is_empty())
            .map(Self::new)
            .ok_or(GlosaError::MissingApiKey)
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    pub fn with_extraction_model(mut self, model: impl Into<String>) -> Self {
        self.extraction_model = model.into();
        self
    }

    pub fn with_drafting_model(mut self, model: impl Into<String>) -> Self {
        self.drafting_model = model.into();
        self
    }
}

#[derive(Clone)]
pub struct GeminiClient {
    client: Client,
    api_key: String,
    base_url: String,
}

impl GeminiClient {
    pub fn new(api_key: String) -> Self {
        Self {
            client: Client::new(),
            api_key,
            base_url: GEMINI_BASE_URL.to_string(),
        }
    }

    pub fn from_config(config: &GeminiConfig) -> Self {
        let mut client = Self::new(config.api_key.clone());
        client.base_url = config.base_url.clone();
        client
    }

    pub(crate) async fn generate_content(
        &self,
        model: &str,
        system_prompt: Option<&str>,
        messages: Vec<Content>,
        response_mime_type: Option<&str>,
    ) -> Result<GenerationOutcome> {
        let url = format!(
            "{}/models/{}:generateContent?key={}",
            self.base_url, model, self.api_key
        );

        let payload = GenerateContentRequest {
            contents: messages,
            system_instruction: system_prompt.map(Content::user),
            generation_config: GenerationConfig {
                response_mime_type: response_mime_type.map(str::to_string),
            },
        };

        debug!("Calling {} with {} message(s)", model, payload.contents.len());
        let res = self.client.post(&url).json(&payload).send().await?;
        let status = res.status();

        if !status.is_success() {
            let err_text = res.text().await?;
            return Err(GlosaError::ExtractionFailed(format!(
                "Gemini API Error (status {}): {}",
                status, err_text
            )));
        }

        let body: GenerateContentResponse = res.json().await?;
        Ok(body.into())
    }
}
