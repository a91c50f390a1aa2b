//! The appeal wizard as an explicit state container.
//!
//! [`Session::apply`] is a reducer: it takes the current state and a
//! [`WizardAction`] and returns the next state, leaving the original
//! untouched. Illegal actions are rejected with an error and change nothing.

use std::collections::BTreeSet;

use log::{debug, info, warn};
use serde::Serialize;

use crate::error::{GlosaError, Result};
use crate::grouping::{group_items, DenialGroup};
use crate::record::{Questionnaire, WorkflowRecord};
use crate::schema::ExtractionResult;

/// Every drafting failure is reported as appeal text starting with this
/// marker, so the preview can refuse to continue without an error channel.
pub const DRAFT_ERROR_MARKER: &str = "Ocorreu um erro";

pub fn is_draft_error(text: &str) -> bool {
    text.starts_with(DRAFT_ERROR_MARKER)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub enum WizardStage {
    Upload,
    Confirm,
    Questions,
    Preview,
    Success,
}

impl WizardStage {
    pub const ALL: [WizardStage; 5] = [
        WizardStage::Upload,
        WizardStage::Confirm,
        WizardStage::Questions,
        WizardStage::Preview,
        WizardStage::Success,
    ];

    /// 1-based position shown in the progress tracker.
    pub fn step_number(self) -> u8 {
        match self {
            WizardStage::Upload => 1,
            WizardStage::Confirm => 2,
            WizardStage::Questions => 3,
            WizardStage::Preview => 4,
            WizardStage::Success => 5,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            WizardStage::Upload => "Upload",
            WizardStage::Confirm => "Confirmar",
            WizardStage::Questions => "Perguntas",
            WizardStage::Preview => "Pré-visualizar",
            WizardStage::Success => "Sucesso",
        }
    }
}

/// The two faces of the Confirm stage.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfirmView {
    GroupList,
    GroupDetail,
}

/// Keys of the groups already appealed in this session. Grows only through
/// [`WizardAction::ProcessAnother`] and is emptied only by a full restart.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ProcessedKeySet(BTreeSet<String>);

impl ProcessedKeySet {
    pub fn contains(&self, key: &str) -> bool {
        self.0.contains(key)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.0.iter().map(String::as_str)
    }

    fn insert(&mut self, key: String) {
        self.0.insert(key);
    }
}

#[derive(Debug, Clone)]
pub enum WizardAction {
    BeginExtraction { file_name: String },
    ExtractionSucceeded(ExtractionResult),
    ExtractionFailed(String),
    SelectGroup(String),
    DeselectGroup,
    ConfirmGroup,
    UpdateAnswers(Questionnaire),
    BackToConfirm,
    SubmitQuestions,
    DraftReady(String),
    BackToQuestions,
    ConfirmPreview,
    ProcessAnother,
    StartOver,
}

impl WizardAction {
    pub fn name(&self) -> &'static str {
        match self {
            WizardAction::BeginExtraction { .. } => "begin_extraction",
            WizardAction::ExtractionSucceeded(_) => "extraction_succeeded",
            WizardAction::ExtractionFailed(_) => "extraction_failed",
            WizardAction::SelectGroup(_) => "select_group",
            WizardAction::DeselectGroup => "deselect_group",
            WizardAction::ConfirmGroup => "confirm_group",
            WizardAction::UpdateAnswers(_) => "update_answers",
            WizardAction::BackToConfirm => "back_to_confirm",
            WizardAction::SubmitQuestions => "submit_questions",
            WizardAction::DraftReady(_) => "draft_ready",
            WizardAction::BackToQuestions => "back_to_questions",
            WizardAction::ConfirmPreview => "confirm_preview",
            WizardAction::ProcessAnother => "process_another",
            WizardAction::StartOver => "start_over",
        }
    }
}

/// A group as presented in the selection list.
#[derive(Debug, Clone, Copy)]
pub struct GroupListing<'a> {
    pub group: &'a DenialGroup,
    pub processed: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Session {
    stage: WizardStage,
    extracting: bool,
    drafting: bool,
    file_name: String,
    upload_error: Option<String>,
    claim_number: String,
    groups: Vec<DenialGroup>,
    selected_key: Option<String>,
    record: WorkflowRecord,
    processed: ProcessedKeySet,
    appeal_text: String,
}

impl Default for Session {
    fn default() -> Self {
        Self::new()
    }
}

impl Session {
    pub fn new() -> Self {
        Self {
            stage: WizardStage::Upload,
            extracting: false,
            drafting: false,
            file_name: String::new(),
            upload_error: None,
            claim_number: String::new(),
            groups: Vec::new(),
            selected_key: None,
            record: WorkflowRecord::empty(),
            processed: ProcessedKeySet::default(),
            appeal_text: String::new(),
        }
    }

    pub fn stage(&self) -> WizardStage {
        self.stage
    }

    /// Only meaningful while in [`WizardStage::Confirm`].
    pub fn confirm_view(&self) -> ConfirmView {
        if self.selected_key.is_some() {
            ConfirmView::GroupDetail
        } else {
            ConfirmView::GroupList
        }
    }

    pub fn is_extracting(&self) -> bool {
        self.extracting
    }

    pub fn is_drafting(&self) -> bool {
        self.drafting
    }

    pub fn file_name(&self) -> &str {
        &self.file_name
    }

    pub fn upload_error(&self) -> Option<&str> {
        self.upload_error.as_deref()
    }

    /// Main claim number reported by the last extraction.
    pub fn claim_number(&self) -> &str {
        &self.claim_number
    }

    pub fn groups(&self) -> &[DenialGroup] {
        &self.groups
    }

    pub fn selected_key(&self) -> Option<&str> {
        self.selected_key.as_deref()
    }

    pub fn selected_group(&self) -> Option<&DenialGroup> {
        let key = self.selected_key.as_deref()?;
        self.groups.iter().find(|g| g.key() == key)
    }

    pub fn record(&self) -> &WorkflowRecord {
        &self.record
    }

    pub fn processed(&self) -> &ProcessedKeySet {
        &self.processed
    }

    pub fn appeal_text(&self) -> &str {
        &self.appeal_text
    }

    /// Groups in extraction order, each flagged with whether it was already
    /// appealed. Callers must not offer processed groups for selection.
    pub fn group_listings(&self) -> Vec<GroupListing<'_>> {
        self.groups
            .iter()
            .map(|group| GroupListing {
                group,
                processed: self.processed.contains(group.key()),
            })
            .collect()
    }

    pub fn pending_groups(&self) -> impl Iterator<Item = &DenialGroup> {
        self.groups
            .iter()
            .filter(|g| !self.processed.contains(g.key()))
    }

    pub fn can_confirm_preview(&self) -> bool {
        self.stage == WizardStage::Preview
            && !self.drafting
            && !self.appeal_text.trim().is_empty()
            && !is_draft_error(&self.appeal_text)
    }

    pub fn apply(&self, action: WizardAction) -> Result<Session> {
        let name = action.name();
        let mut next = self.clone();

        match action {
            WizardAction::BeginExtraction { file_name } => {
                self.expect_stage(WizardStage::Upload, name)?;
                if self.extracting {
                    return Err(GlosaError::OperationInFlight("extraction"));
                }
                info!("Extracting denial items from {}", file_name);
                next.extracting = true;
                next.upload_error = None;
                next.file_name = file_name;
            }
            WizardAction::ExtractionSucceeded(result) => {
                self.expect_extracting(name)?;
                let groups = group_items(&result.items, &result.claim_number);
                info!(
                    "Extracted {} items in {} groups from {}",
                    result.items.len(),
                    groups.len(),
                    self.file_name
                );
                next.extracting = false;
                next.claim_number = result.claim_number;
                next.groups = groups;
                next.selected_key = None;
                next.record = WorkflowRecord::empty();
                next.stage = WizardStage::Confirm;
            }
            WizardAction::ExtractionFailed(message) => {
                self.expect_extracting(name)?;
                warn!("Extraction of {} failed: {}", self.file_name, message);
                next.extracting = false;
                next.file_name = String::new();
                next.upload_error = Some(message);
            }
            WizardAction::SelectGroup(key) => {
                self.expect_confirm_view(ConfirmView::GroupList, name)?;
                if self.processed.contains(&key) {
                    return Err(GlosaError::GroupAlreadyProcessed(key));
                }
                let group = self
                    .groups
                    .iter()
                    .find(|g| g.key() == key)
                    .ok_or_else(|| GlosaError::UnknownGroup(key.clone()))?;
                next.record = WorkflowRecord::for_group(group);
                next.selected_key = Some(key);
            }
            WizardAction::DeselectGroup => {
                self.expect_confirm_view(ConfirmView::GroupDetail, name)?;
                next.selected_key = None;
                next.record = WorkflowRecord::empty();
            }
            WizardAction::ConfirmGroup => {
                self.expect_confirm_view(ConfirmView::GroupDetail, name)?;
                next.stage = WizardStage::Questions;
            }
            WizardAction::UpdateAnswers(answers) => {
                self.expect_stage(WizardStage::Questions, name)?;
                next.record.answers = answers;
            }
            WizardAction::BackToConfirm => {
                self.expect_stage(WizardStage::Questions, name)?;
                next.stage = WizardStage::Confirm;
            }
            WizardAction::SubmitQuestions => {
                self.expect_stage(WizardStage::Questions, name)?;
                if self.drafting {
                    return Err(GlosaError::OperationInFlight("drafting"));
                }
                next.drafting = true;
                next.appeal_text = String::new();
                next.stage = WizardStage::Preview;
            }
            WizardAction::DraftReady(text) => {
                self.expect_stage(WizardStage::Preview, name)?;
                if !self.drafting {
                    return Err(self.invalid(name));
                }
                if is_draft_error(&text) {
                    warn!("Appeal drafting failed: {}", text);
                }
                next.drafting = false;
                next.appeal_text = text;
            }
            WizardAction::BackToQuestions => {
                self.expect_stage(WizardStage::Preview, name)?;
                if self.drafting {
                    return Err(GlosaError::OperationInFlight("drafting"));
                }
                next.stage = WizardStage::Questions;
            }
            WizardAction::ConfirmPreview => {
                self.expect_stage(WizardStage::Preview, name)?;
                if !self.can_confirm_preview() {
                    return Err(GlosaError::DraftNotReady);
                }
                next.stage = WizardStage::Success;
            }
            WizardAction::ProcessAnother => {
                self.expect_stage(WizardStage::Success, name)?;
                if let Some(key) = next.selected_key.take() {
                    info!("Group {} appealed", key);
                    next.processed.insert(key);
                }
                next.appeal_text = String::new();
                next.record = WorkflowRecord::empty();
                next.stage = WizardStage::Confirm;
            }
            WizardAction::StartOver => {
                info!("Starting over");
                next = Session::new();
            }
        }

        debug!("{:?} --{}--> {:?}", self.stage, name, next.stage);
        Ok(next)
    }

    fn invalid(&self, action: &'static str) -> GlosaError {
        GlosaError::InvalidTransition {
            stage: self.stage,
            action,
        }
    }

    fn expect_stage(&self, stage: WizardStage, action: &'static str) -> Result<()> {
        if self.stage == stage {
            Ok(())
        } else {
            Err(self.invalid(action))
        }
    }

    fn expect_extracting(&self, action: &'static str) -> Result<()> {
        self.expect_stage(WizardStage::Upload, action)?;
        if self.extracting {
            Ok(())
        } else {
            Err(self.invalid(action))
        }
    }

    fn expect_confirm_view(&self, view: ConfirmView, action: &'static str) -> Result<()> {
        self.expect_stage(WizardStage::Confirm, action)?;
        if self.confirm_view() == view {
            Ok(())
        } else {
            Err(self.invalid(action))
        }
    }
}
