//! Drives a [`Session`] through the asynchronous steps of the wizard.

use chrono::{DateTime, Utc};
use log::info;

use crate::adapters::{AppealDrafter, DenialExtractor};
use crate::error::{GlosaError, Result};
use crate::export::{export_appeal, AppealExporter, ExportedFile};
use crate::session::{Session, WizardAction, WizardStage};
use crate::source::SourceFile;

pub struct GlosaWizard<E, D> {
    extractor: E,
    drafter: D,
    session: Session,
}

impl<E: DenialExtractor, D: AppealDrafter> GlosaWizard<E, D> {
    pub fn new(extractor: E, drafter: D) -> Self {
        Self {
            extractor,
            drafter,
            session: Session::new(),
        }
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    /// Applies a synchronous action. On error the session is unchanged.
    pub fn dispatch(&mut self, action: WizardAction) -> Result<&Session> {
        self.session = self.session.apply(action)?;
        Ok(&self.session)
    }

    /// Extracts and groups the denials in `file`. A failed extraction leaves
    /// the wizard on the upload stage with the error recorded, and is also
    /// returned so the caller can react to it.
    pub async fn upload(&mut self, file: &SourceFile) -> Result<&Session> {
        self.dispatch(WizardAction::BeginExtraction {
            file_name: file.name.clone(),
        })?;

        match self.extractor.extract(file).await {
            Ok(result) => self.dispatch(WizardAction::ExtractionSucceeded(result)),
            Err(e) => {
                self.dispatch(WizardAction::ExtractionFailed(e.to_string()))?;
                Err(e)
            }
        }
    }

    /// Moves to the preview and waits for the drafted appeal. Drafting
    /// failures arrive as marked text, never as an error.
    pub async fn submit_questions(&mut self) -> Result<&Session> {
        self.dispatch(WizardAction::SubmitQuestions)?;
        let text = self.drafter.draft(self.session.record()).await;
        self.dispatch(WizardAction::DraftReady(text))
    }

    /// Renders the confirmed appeal with `exporter`.
    pub fn export(&self, exporter: &dyn AppealExporter, at: DateTime<Utc>) -> Result<ExportedFile> {
        if self.session.stage() != WizardStage::Success {
            return Err(GlosaError::InvalidTransition {
                stage: self.session.stage(),
                action: "export",
            });
        }

        let file = export_appeal(
            exporter,
            self.session.record(),
            self.session.appeal_text(),
            at,
        )?;
        info!("Appeal exported as {}", file.file_name);
        Ok(file)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::export::TextExporter;
    use crate::record::{WorkflowRecord, YesNo};
    use crate::schema::{DenialItem, ExtractionResult};
    use crate::session::{is_draft_error, DRAFT_ERROR_MARKER};
    use std::sync::Mutex;

    /// Returns the canned result, or a malformed-JSON failure when there is none.
    struct FakeExtractor(Option<ExtractionResult>);

    impl DenialExtractor for FakeExtractor {
        async fn extract(&self, _file: &SourceFile) -> Result<ExtractionResult> {
            self.0
                .clone()
                .ok_or_else(|| GlosaError::MalformedJson("expected value".to_string()))
        }
    }

    /// Echoes the record it was given so tests can see what was drafted.
    #[derive(Default)]
    struct RecordingDrafter {
        seen: Mutex<Vec<WorkflowRecord>>,
        fail: bool,
    }

    impl AppealDrafter for RecordingDrafter {
        async fn draft(&self, record: &WorkflowRecord) -> String {
            self.seen.lock().unwrap().push(record.clone());
            if self.fail {
                format!("{} ao gerar o texto do recurso.", DRAFT_ERROR_MARKER)
            } else {
                format!("Recurso da guia {}", record.claim_number)
            }
        }
    }

    fn extraction() -> ExtractionResult {
        ExtractionResult {
            claim_number: "G1".to_string(),
            items: vec![
                DenialItem {
                    insurance_id: "G1".to_string(),
                    justification: "J1".to_string(),
                    denial_value: "100,00".to_string(),
                    ..Default::default()
                },
                DenialItem {
                    insurance_id: "G1".to_string(),
                    justification: "J2".to_string(),
                    denial_value: "50,00".to_string(),
                    ..Default::default()
                },
            ],
        }
    }

    fn report() -> SourceFile {
        SourceFile::new("glosas.csv", "text/csv", b"...".to_vec())
    }

    #[tokio::test]
    async fn test_full_flow() {
        let mut wizard = GlosaWizard::new(
            FakeExtractor(Some(extraction())),
            RecordingDrafter::default(),
        );

        wizard.upload(&report()).await.unwrap();
        assert_eq!(wizard.session().stage(), WizardStage::Confirm);
        assert_eq!(wizard.session().groups().len(), 2);

        wizard
            .dispatch(WizardAction::SelectGroup("G1::J1".to_string()))
            .unwrap();
        wizard.dispatch(WizardAction::ConfirmGroup).unwrap();

        let mut answers = wizard.session().record().answers.clone();
        answers.prior_authorization = YesNo::Yes;
        wizard.dispatch(WizardAction::UpdateAnswers(answers)).unwrap();

        let session = wizard.submit_questions().await.unwrap();
        assert_eq!(session.stage(), WizardStage::Preview);
        assert!(!session.is_drafting());
        assert_eq!(session.appeal_text(), "Recurso da guia G1");

        let seen = wizard.drafter.seen.lock().unwrap().clone();
        assert_eq!(seen.len(), 1);
        assert_eq!(seen[0].answers.prior_authorization, YesNo::Yes);
        assert_eq!(seen[0].item_count, 1);

        wizard.dispatch(WizardAction::ConfirmPreview).unwrap();
        let file = wizard.export(&TextExporter, Utc::now()).unwrap();
        assert!(file.file_name.starts_with("Recurso_Glosa_G1_"));
        assert_eq!(file.bytes, b"Recurso da guia G1");
    }

    #[tokio::test]
    async fn test_failed_upload_is_recorded_and_returned() {
        let mut wizard = GlosaWizard::new(
            FakeExtractor(None),
            RecordingDrafter::default(),
        );

        let err = wizard.upload(&report()).await.unwrap_err();
        assert!(matches!(err, GlosaError::MalformedJson(_)));

        let session = wizard.session();
        assert_eq!(session.stage(), WizardStage::Upload);
        assert!(!session.is_extracting());
        assert_eq!(session.upload_error(), Some(err.to_string().as_str()));
    }

    #[tokio::test]
    async fn test_failed_draft_blocks_confirmation() {
        let mut wizard = GlosaWizard::new(
            FakeExtractor(Some(extraction())),
            RecordingDrafter {
                fail: true,
                ..Default::default()
            },
        );
        wizard.upload(&report()).await.unwrap();
        wizard
            .dispatch(WizardAction::SelectGroup("G1::J2".to_string()))
            .unwrap();
        wizard.dispatch(WizardAction::ConfirmGroup).unwrap();

        let session = wizard.submit_questions().await.unwrap();
        assert!(is_draft_error(session.appeal_text()));
        assert!(matches!(
            wizard.dispatch(WizardAction::ConfirmPreview).unwrap_err(),
            GlosaError::DraftNotReady
        ));
        assert_eq!(wizard.session().stage(), WizardStage::Preview);
    }

    #[tokio::test]
    async fn test_export_requires_success_stage() {
        let mut wizard = GlosaWizard::new(
            FakeExtractor(Some(extraction())),
            RecordingDrafter::default(),
        );
        wizard.upload(&report()).await.unwrap();

        let err = wizard.export(&TextExporter, Utc::now()).unwrap_err();
        assert!(matches!(
            err,
            GlosaError::InvalidTransition {
                stage: WizardStage::Confirm,
                action: "export"
            }
        ));
    }

    #[tokio::test]
    async fn test_submit_outside_questions_is_rejected() {
        let mut wizard = GlosaWizard::new(
            FakeExtractor(Some(extraction())),
            RecordingDrafter::default(),
        );
        assert!(wizard.submit_questions().await.is_err());
        assert!(wizard.drafter.seen.lock().unwrap().is_empty());
    }
}
