use crate::error::{GlosaError, Result};

const TEXT_MIME_TYPES: [&str; 4] = ["text/csv", "application/xml", "text/xml", "text/plain"];
const PDF_MIME_TYPE: &str = "application/pdf";
pub const XLSX_MIME_TYPE: &str =
    "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet";

/// How an uploaded report is handed to the model.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceKind {
    /// Sent as raw text inside the prompt.
    Text,
    /// Sent inline as a binary part.
    Pdf,
    /// First sheet converted to CSV, then sent as text.
    Spreadsheet,
}

/// An uploaded glosa report.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceFile {
    pub name: String,
    pub mime_type: String,
    pub bytes: Vec<u8>,
}

impl SourceFile {
    pub fn new(name: impl Into<String>, mime_type: impl Into<String>, bytes: Vec<u8>) -> Self {
        Self {
            name: name.into(),
            mime_type: mime_type.into(),
            bytes,
        }
    }

    /// Reads a report from disk, guessing its MIME type from the extension.
    #[cfg(feature = "gemini")]
    pub async fn from_path(path: &std::path::Path) -> Result<Self> {
        let name = path
            .file_name()
            .and_then(|n| n.to_str())
            .ok_or_else(|| GlosaError::ExtractionFailed("Invalid file name".to_string()))?
            .to_string();
        let mime_type = mime_guess::from_path(path)
            .first_or_octet_stream()
            .to_string();
        let bytes = tokio::fs::read(path).await?;

        Ok(Self {
            name,
            mime_type,
            bytes,
        })
    }

    pub fn kind(&self) -> Result<SourceKind> {
        let mime = self.mime_type.to_ascii_lowercase();

        if TEXT_MIME_TYPES.contains(&mime.as_str()) {
            Ok(SourceKind::Text)
        } else if mime == PDF_MIME_TYPE {
            Ok(SourceKind::Pdf)
        } else if mime == XLSX_MIME_TYPE || self.name.to_ascii_lowercase().ends_with(".xlsx") {
            Ok(SourceKind::Spreadsheet)
        } else if self.mime_type.is_empty() {
            Err(GlosaError::UnsupportedFileType(self.name.clone()))
        } else {
            Err(GlosaError::UnsupportedFileType(self.mime_type.clone()))
        }
    }

    /// File content decoded as text; invalid UTF-8 sequences are replaced.
    pub fn text(&self) -> String {
        String::from_utf8_lossy(&self.bytes).into_owned()
    }
}
