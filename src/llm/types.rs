use serde::{Deserialize, Serialize};

use crate::error::{BlockReason, GlosaError, Result};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Content {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub role: Option<String>,
    #[serde(default)]
    pub parts: Vec<Part>,
}

impl Content {
    pub fn user(text: impl Into<String>) -> Self {
        Self {
            role: Some("user".to_string()),
            parts: vec![Part::Text { text: text.into() }],
        }
    }

    pub fn user_with_parts(parts: Vec<Part>) -> Self {
        Self {
            role: Some("user".to_string()),
            parts,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Part {
    Text {
        text: String,
    },
    InlineData {
        #[serde(rename = "inlineData")]
        inline_data: Blob,
    },
    Other(serde_json::Value),
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Blob {
    pub mime_type: String,
    /// Base64-encoded payload.
    pub data: String,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerationConfig {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub response_mime_type: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerateContentRequest {
    pub contents: Vec<Content>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub system_instruction: Option<Content>,
    pub generation_config: GenerationConfig,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum FinishReason {
    Stop,
    MaxTokens,
    Safety,
    Recitation,
    Other,
    #[serde(other)]
    Unspecified,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Candidate {
    pub content: Option<Content>,
    pub finish_reason: Option<FinishReason>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PromptFeedback {
    pub block_reason: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerateContentResponse {
    #[serde(default)]
    pub candidates: Vec<Candidate>,
    pub prompt_feedback: Option<PromptFeedback>,
}

/// What came back from one `generateContent` call, before deciding whether
/// it is usable.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GenerationOutcome {
    pub text: String,
    pub finish_reason: Option<FinishReason>,
    pub block_reason: Option<String>,
}

impl From<GenerateContentResponse> for GenerationOutcome {
    fn from(response: GenerateContentResponse) -> Self {
        let first = response.candidates.into_iter().next();
        let finish_reason = first.as_ref().and_then(|c| c.finish_reason);

        let text = first
            .and_then(|c| c.content)
            .map(|content| {
                content
                    .parts
                    .into_iter()
                    .filter_map(|part| match part {
                        Part::Text { text } => Some(text),
                        _ => None,
                    })
                    .collect::<String>()
            })
            .unwrap_or_default();

        Self {
            text,
            finish_reason,
            block_reason: response.prompt_feedback.and_then(|f| f.block_reason),
        }
    }
}

impl GenerationOutcome {
    /// The response text, or the reason there is none.
    pub fn into_text(self) -> Result<String> {
        if let Some(code) = self.block_reason {
            return Err(GlosaError::ResponseBlocked(BlockReason::PromptBlocked(code)));
        }

        if self.text.trim().is_empty() {
            return Err(match self.finish_reason {
                Some(FinishReason::Safety) => GlosaError::ResponseBlocked(BlockReason::Safety),
                Some(FinishReason::Recitation) => {
                    GlosaError::ResponseBlocked(BlockReason::Recitation)
                }
                Some(FinishReason::MaxTokens) => {
                    GlosaError::ResponseBlocked(BlockReason::Truncated("MAX_TOKENS".to_string()))
                }
                Some(FinishReason::Other) => {
                    GlosaError::ResponseBlocked(BlockReason::Truncated("OTHER".to_string()))
                }
                _ => GlosaError::EmptyResponse,
            });
        }

        Ok(self.text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn outcome(raw: &str) -> GenerationOutcome {
        let response: GenerateContentResponse = serde_json::from_str(raw).unwrap();
        response.into()
    }

    #[test]
    fn test_request_serialization() {
        let request = GenerateContentRequest {
            contents: vec![Content::user_with_parts(vec![
                Part::InlineData {
                    inline_data: Blob {
                        mime_type: "application/pdf".to_string(),
                        data: "JVBERi0=".to_string(),
                    },
                },
                Part::Text {
                    text: "Analise".to_string(),
                },
            ])],
            system_instruction: None,
            generation_config: GenerationConfig {
                response_mime_type: Some("application/json".to_string()),
            },
        };

        let json = serde_json::to_value(&request).unwrap();
        assert_eq!(json["contents"][0]["role"], "user");
        assert_eq!(
            json["contents"][0]["parts"][0]["inlineData"]["mimeType"],
            "application/pdf"
        );
        assert_eq!(json["contents"][0]["parts"][1]["text"], "Analise");
        assert_eq!(
            json["generationConfig"]["responseMimeType"],
            "application/json"
        );
        assert!(json.get("systemInstruction").is_none());
    }

    #[test]
    fn test_text_parts_are_concatenated() {
        let text = outcome(
            r#"{"candidates": [{"content": {"role": "model", "parts": [{"text": "{\"guia"}, {"text": "Number\": \"1\"}"}]}, "finishReason": "STOP"}]}"#,
        )
        .into_text()
        .unwrap();
        assert_eq!(text, r#"{"guiaNumber": "1"}"#);
    }

    #[test]
    fn test_prompt_block_wins() {
        let err = outcome(r#"{"promptFeedback": {"blockReason": "SAFETY"}}"#)
            .into_text()
            .unwrap_err();
        assert!(matches!(
            err,
            GlosaError::ResponseBlocked(BlockReason::PromptBlocked(code)) if code == "SAFETY"
        ));
    }

    #[test]
    fn test_empty_text_maps_finish_reason() {
        let cases = [
            ("SAFETY", BlockReason::Safety),
            ("RECITATION", BlockReason::Recitation),
            ("MAX_TOKENS", BlockReason::Truncated("MAX_TOKENS".to_string())),
            ("OTHER", BlockReason::Truncated("OTHER".to_string())),
        ];
        for (finish, expected) in cases {
            let raw = format!(
                r#"{{"candidates": [{{"content": {{"parts": []}}, "finishReason": "{}"}}]}}"#,
                finish
            );
            match outcome(&raw).into_text() {
                Err(GlosaError::ResponseBlocked(reason)) => assert_eq!(reason, expected),
                other => panic!("{} gave {:?}", finish, other),
            }
        }
    }

    #[test]
    fn test_no_candidates_is_empty_response() {
        assert!(matches!(
            outcome("{}").into_text(),
            Err(GlosaError::EmptyResponse)
        ));
        assert!(matches!(
            outcome(r#"{"candidates": [{"finishReason": "STOP", "content": {"parts": [{"text": "  "}]}}]}"#)
                .into_text(),
            Err(GlosaError::EmptyResponse)
        ));
        assert!(matches!(
            outcome(r#"{"candidates": [{"finishReason": "BLOCKLIST"}]}"#).into_text(),
            Err(GlosaError::EmptyResponse)
        ));
    }
}
