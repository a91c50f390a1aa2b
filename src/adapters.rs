//! Seams to the services the wizard depends on.

use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::record::WorkflowRecord;
use crate::schema::ExtractionResult;
use crate::source::SourceFile;

/// Progress notifications emitted while a report is being extracted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum ExtractionEvent {
    Starting { filename: String },
    ConvertingSpreadsheet,
    Requesting,
    ProcessingResponse,
    Success { items: usize },
    Failed { reason: String },
}

/// Turns an uploaded report into structured denial items.
#[allow(async_fn_in_trait)]
pub trait DenialExtractor {
    async fn extract(&self, file: &SourceFile) -> Result<ExtractionResult>;
}

/// Writes the appeal letter for a filled-in record.
///
/// Drafting never fails: implementations report any failure as text that
/// starts with [`crate::DRAFT_ERROR_MARKER`].
#[allow(async_fn_in_trait)]
pub trait AppealDrafter {
    async fn draft(&self, record: &WorkflowRecord) -> String;
}
