use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::error::{GlosaError, Result};
use crate::grouping::DenialGroup;
use crate::schema::DenialItem;

const ACCEPTED_ATTACHMENT_EXTENSIONS: [&str; 5] = ["pdf", "doc", "docx", "jpg", "png"];

/// A yes/no questionnaire answer that may still be unanswered.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum YesNo {
    #[serde(rename = "sim")]
    Yes,
    #[serde(rename = "nao")]
    No,
    #[default]
    #[serde(rename = "")]
    Unanswered,
}

impl YesNo {
    pub fn is_yes(self) -> bool {
        self == YesNo::Yes
    }
}

/// Metadata of a supporting document the user attached. The drafting step
/// only needs to know that it exists.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Attachment {
    pub file_name: String,
    pub size: u64,
    pub mime_type: String,
}

impl Attachment {
    pub fn new(file_name: impl Into<String>, size: u64, mime_type: impl Into<String>) -> Self {
        Self {
            file_name: file_name.into(),
            size,
            mime_type: mime_type.into(),
        }
    }

    fn extension(&self) -> Option<String> {
        self.file_name
            .rsplit_once('.')
            .map(|(_, ext)| ext.to_ascii_lowercase())
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AttachmentList(Vec<Attachment>);

impl AttachmentList {
    /// Adds an attachment unless one with the same name and size is already
    /// present. Only PDF, Word and JPG/PNG files are accepted.
    pub fn add(&mut self, attachment: Attachment) -> Result<()> {
        let accepted = attachment
            .extension()
            .is_some_and(|ext| ACCEPTED_ATTACHMENT_EXTENSIONS.contains(&ext.as_str()));
        if !accepted {
            return Err(GlosaError::UnsupportedAttachment(attachment.file_name));
        }

        let duplicate = self
            .0
            .iter()
            .any(|a| a.file_name == attachment.file_name && a.size == attachment.size);
        if !duplicate {
            self.0.push(attachment);
        }
        Ok(())
    }

    pub fn remove(&mut self, file_name: &str) {
        self.0.retain(|a| a.file_name != file_name);
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Attachment> {
        self.0.iter()
    }
}

/// Answers to the fixed appeal questionnaire.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Questionnaire {
    /// Was the procedure performed as medically requested?
    pub medical_request: YesNo,
    pub medical_request_files: AttachmentList,
    /// Is the procedure covered by the contract?
    pub contract_compliance: YesNo,
    pub contract_clause: String,
    pub prior_authorization: YesNo,
    pub prior_authorization_files: AttachmentList,
    pub is_correct_procedure_code: YesNo,
    pub correct_procedure_code: String,
    pub is_correct_value: YesNo,
    pub correct_value: String,
    pub has_additional_documents: YesNo,
    pub additional_files: AttachmentList,
    pub technical_comments: String,
    pub deadline: Option<NaiveDate>,
}

/// The case currently being worked on: the selected group's data plus the
/// questionnaire answers for it.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct WorkflowRecord {
    pub claim_number: String,
    pub items: Vec<DenialItem>,
    pub item_count: usize,
    pub total_value: f64,
    pub answers: Questionnaire,
}

impl WorkflowRecord {
    pub fn empty() -> Self {
        Self::default()
    }

    /// Builds a fresh record for `group`. Answers always start blank so
    /// nothing leaks over from a previously processed group.
    pub fn for_group(group: &DenialGroup) -> Self {
        Self {
            claim_number: group.claim_number().to_string(),
            items: group.items().to_vec(),
            item_count: group.item_count(),
            total_value: group.total_value(),
            answers: Questionnaire::default(),
        }
    }

    /// The justification shared by every item of the group.
    pub fn justification(&self) -> Option<&str> {
        self.items
            .first()
            .map(|item| item.justification.as_str())
            .filter(|j| !j.is_empty())
    }
}
