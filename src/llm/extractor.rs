use base64::Engine;
use log::{debug, info, warn};
use tokio::sync::mpsc::Sender;

use crate::adapters::{DenialExtractor, ExtractionEvent};
use crate::error::{GlosaError, Result};
use crate::llm::client::GeminiClient;
use crate::llm::prompts;
use crate::llm::spreadsheet::first_sheet_to_csv;
use crate::llm::types::*;
use crate::schema::ExtractionResult;
use crate::source::{SourceFile, SourceKind};

/// Removes a surrounding Markdown code fence (```` ```json ```` or ```` ``` ````)
/// from a model answer.
pub fn strip_code_fence(raw: &str) -> &str {
    let trimmed = raw.trim();
    let Some(rest) = trimmed.strip_prefix("```") else {
        return trimmed;
    };
    let rest = rest.strip_prefix("json").unwrap_or(rest);
    rest.strip_suffix("```").unwrap_or(rest).trim()
}

/// Parses the model's answer into an [`ExtractionResult`].
pub fn parse_extraction(raw: &str) -> Result<ExtractionResult> {
    serde_json::from_str(strip_code_fence(raw))
        .map_err(|e| GlosaError::MalformedJson(e.to_string()))
}

pub struct GeminiExtractor {
    client: GeminiClient,
    model: String,
    progress: Option<Sender<ExtractionEvent>>,
}

impl GeminiExtractor {
    pub fn new(client: GeminiClient, model: impl Into<String>) -> Self {
        Self {
            client,
            model: model.into(),
            progress: None,
        }
    }

    /// Reports each extraction step on `sender`.
    pub fn with_progress(mut self, sender: Sender<ExtractionEvent>) -> Self {
        self.progress = Some(sender);
        self
    }

    async fn send_event(&self, event: ExtractionEvent) {
        if let Some(tx) = &self.progress {
            let _ = tx.send(event).await;
        }
    }

    async fn build_message(&self, file: &SourceFile) -> Result<Content> {
        let message = match file.kind()? {
            SourceKind::Text => {
                Content::user(prompts::text_source_prompt(&file.name, &file.text()))
            }
            SourceKind::Spreadsheet => {
                self.send_event(ExtractionEvent::ConvertingSpreadsheet).await;
                let csv = first_sheet_to_csv(&file.bytes)?;
                debug!("Converted {} to {} bytes of CSV", file.name, csv.len());
                Content::user(prompts::spreadsheet_source_prompt(&file.name, &csv))
            }
            SourceKind::Pdf => Content::user_with_parts(vec![
                Part::InlineData {
                    inline_data: Blob {
                        mime_type: file.mime_type.clone(),
                        data: base64::engine::general_purpose::STANDARD.encode(&file.bytes),
                    },
                },
                Part::Text {
                    text: prompts::extraction_prompt(),
                },
            ]),
        };
        Ok(message)
    }

    async fn run(&self, file: &SourceFile) -> Result<ExtractionResult> {
        let message = self.build_message(file).await?;

        self.send_event(ExtractionEvent::Requesting).await;
        let raw = self
            .client
            .generate_content(&self.model, None, vec![message], Some("application/json"))
            .await?
            .into_text()?;

        self.send_event(ExtractionEvent::ProcessingResponse).await;
        parse_extraction(&raw)
    }
}

impl DenialExtractor for GeminiExtractor {
    async fn extract(&self, file: &SourceFile) -> Result<ExtractionResult> {
        info!("Extracting denials from {} ({})", file.name, file.mime_type);
        self.send_event(ExtractionEvent::Starting {
            filename: file.name.clone(),
        })
        .await;

        match self.run(file).await {
            Ok(result) => {
                info!(
                    "Extracted {} item(s) from {} (claim '{}')",
                    result.items.len(),
                    file.name,
                    result.claim_number
                );
                self.send_event(ExtractionEvent::Success {
                    items: result.items.len(),
                })
                .await;
                Ok(result)
            }
            Err(e) => {
                warn!("Extraction of {} failed: {}", file.name, e);
                self.send_event(ExtractionEvent::Failed {
                    reason: e.to_string(),
                })
                .await;
                Err(e)
            }
        }
    }
}
