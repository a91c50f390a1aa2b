use log::{info, warn};

use crate::adapters::AppealDrafter;
use crate::error::{BlockReason, GlosaError, Result};
use crate::llm::client::GeminiClient;
use crate::llm::prompts;
use crate::llm::types::Content;
use crate::record::WorkflowRecord;

/// The text shown in place of a letter when drafting failed.
pub fn draft_error_text(error: &GlosaError) -> String {
    match error {
        GlosaError::ResponseBlocked(BlockReason::PromptBlocked(code)) => {
            prompts::draft_blocked(code)
        }
        GlosaError::ResponseBlocked(BlockReason::Safety) => prompts::draft_blocked("SAFETY"),
        GlosaError::ResponseBlocked(BlockReason::Recitation) => {
            prompts::draft_blocked("RECITATION")
        }
        GlosaError::ResponseBlocked(BlockReason::Truncated(_)) | GlosaError::EmptyResponse => {
            prompts::draft_empty()
        }
        _ => prompts::DRAFT_FAILED.to_string(),
    }
}

pub struct GeminiDrafter {
    client: GeminiClient,
    model: String,
}

impl GeminiDrafter {
    pub fn new(client: GeminiClient, model: impl Into<String>) -> Self {
        Self {
            client,
            model: model.into(),
        }
    }

    async fn request(&self, record: &WorkflowRecord) -> Result<String> {
        let prompt = prompts::appeal_prompt(record);
        let text = self
            .client
            .generate_content(
                &self.model,
                Some(prompts::DRAFTING_SYSTEM_PROMPT),
                vec![Content::user(prompt)],
                None,
            )
            .await?
            .into_text()?;
        Ok(text.trim().to_string())
    }
}

impl AppealDrafter for GeminiDrafter {
    async fn draft(&self, record: &WorkflowRecord) -> String {
        info!(
            "Drafting appeal for claim '{}' ({} item(s))",
            record.claim_number, record.item_count
        );
        match self.request(record).await {
            Ok(text) => text,
            Err(e) => {
                warn!("Appeal drafting failed: {}", e);
                draft_error_text(&e)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::session::is_draft_error;

    #[test]
    fn test_every_failure_is_marked() {
        let errors = [
            GlosaError::ResponseBlocked(BlockReason::PromptBlocked("OTHER".to_string())),
            GlosaError::ResponseBlocked(BlockReason::Safety),
            GlosaError::ResponseBlocked(BlockReason::Recitation),
            GlosaError::ResponseBlocked(BlockReason::Truncated("MAX_TOKENS".to_string())),
            GlosaError::EmptyResponse,
            GlosaError::ExtractionFailed("Gemini API Error (status 500)".to_string()),
            GlosaError::MissingApiKey,
        ];
        for error in &errors {
            assert!(is_draft_error(&draft_error_text(error)), "{:?}", error);
        }
    }

    #[test]
    fn test_block_reason_is_named() {
        let text = draft_error_text(&GlosaError::ResponseBlocked(BlockReason::Safety));
        assert!(text.contains("(Motivo: SAFETY)"));
    }
}
