use std::fmt;

use thiserror::Error;

use crate::session::WizardStage;

/// Why the model refused to produce (or finish) a response.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BlockReason {
    /// The prompt itself was rejected; carries the API's block reason code.
    PromptBlocked(String),
    Safety,
    Recitation,
    /// Generation stopped early (`MAX_TOKENS` or `OTHER`).
    Truncated(String),
}

impl fmt::Display for BlockReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BlockReason::PromptBlocked(code) => {
                write!(f, "the request was blocked by safety filters (reason: {})", code)
            }
            BlockReason::Safety => write!(
                f,
                "the response was blocked by safety filters; documents with sensitive data can trigger this"
            ),
            BlockReason::Recitation => write!(
                f,
                "the response was blocked for reciting quoted material; try a different file"
            ),
            BlockReason::Truncated(code) => write!(
                f,
                "the model stopped unexpectedly (reason: {}); the file may be too large or complex",
                code
            ),
        }
    }
}

#[derive(Error, Debug)]
pub enum GlosaError {
    #[error("Unsupported file type: {0}. Use PDF, CSV, XML or XLSX")]
    UnsupportedFileType(String),

    #[error("Could not read the XLSX spreadsheet: {0}")]
    SpreadsheetConversion(String),

    #[error("Analysis blocked: {0}")]
    ResponseBlocked(BlockReason),

    #[error("The model returned no response; the file may be empty or unreadable")]
    EmptyResponse,

    #[error("The model response is not valid JSON: {0}")]
    MalformedJson(String),

    #[error("Extraction failed: {0}")]
    ExtractionFailed(String),

    #[error("Missing API key: set GEMINI_API_KEY")]
    MissingApiKey,

    #[error("Action '{action}' is not allowed in stage {stage:?}")]
    InvalidTransition {
        stage: WizardStage,
        action: &'static str,
    },

    #[error("Group '{0}' was already processed in this session")]
    GroupAlreadyProcessed(String),

    #[error("No group with key '{0}'")]
    UnknownGroup(String),

    #[error("A {0} request is already in flight")]
    OperationInFlight(&'static str),

    #[error("The appeal text is empty or failed to generate")]
    DraftNotReady,

    #[error("Unsupported attachment '{0}': use PDF, DOC, DOCX, JPG or PNG")]
    UnsupportedAttachment(String),

    #[error("Export error: {0}")]
    Export(String),

    #[cfg(feature = "gemini")]
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, GlosaError>;
