use anyhow::{bail, Context};
use chrono::{Days, Local, Utc};
use dotenv::dotenv;
use glosa_appeal_builder::llm::{GeminiClient, GeminiConfig, GeminiDrafter, GeminiExtractor};
use glosa_appeal_builder::*;
use std::path::{Path, PathBuf};
use tokio::sync::mpsc;

const OUTPUT_DIR: &str = "recursos";

fn exporters() -> Vec<Box<dyn AppealExporter>> {
    vec![
        Box::new(TextExporter),
        Box::new(XmlExporter),
        Box::new(CsvExporter),
        Box::new(SheetExporter),
        Box::new(PdfExporter),
        Box::new(DocxExporter),
    ]
}

/// Canned questionnaire answers; a real front-end asks the user.
fn sample_answers(current: &Questionnaire) -> Questionnaire {
    Questionnaire {
        medical_request: YesNo::Yes,
        contract_compliance: YesNo::Yes,
        prior_authorization: YesNo::Yes,
        is_correct_procedure_code: YesNo::Yes,
        is_correct_value: YesNo::Yes,
        technical_comments: "Procedimento indicado pelo médico assistente.".to_string(),
        deadline: Local::now().date_naive().checked_add_days(Days::new(30)),
        ..current.clone()
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv().ok();
    println!("🚀 Starting Glosa Appeal Builder example...");

    let path: PathBuf = std::env::args()
        .nth(1)
        .map(PathBuf::from)
        .context("usage: glosa_wizard <report.pdf|csv|xml|xlsx>")?;

    let config = GeminiConfig::from_env()?;
    let client = GeminiClient::from_config(&config);

    let (tx, mut rx) = mpsc::channel(16);
    tokio::spawn(async move {
        while let Some(event) = rx.recv().await {
            println!("   ⏳ {:?}", event);
        }
    });

    let extractor =
        GeminiExtractor::new(client.clone(), config.extraction_model.clone()).with_progress(tx);
    let drafter = GeminiDrafter::new(client, config.drafting_model.clone());
    let mut wizard = GlosaWizard::new(extractor, drafter);

    let report = SourceFile::from_path(&path).await?;
    println!("📄 Uploading {} ({})", report.name, report.mime_type);
    if let Err(e) = wizard.upload(&report).await {
        bail!("extraction failed: {}", e);
    }

    let session = wizard.session();
    println!(
        "✅ Claim {}: {} group(s) found",
        session.claim_number(),
        session.groups().len()
    );
    for listing in session.group_listings() {
        println!(
            "   • {} | {} item(s) | {}",
            listing.group.justification(),
            listing.group.item_count(),
            format_currency(listing.group.total_value())
        );
    }

    let keys: Vec<String> = session
        .pending_groups()
        .map(|g| g.key().to_string())
        .collect();
    std::fs::create_dir_all(OUTPUT_DIR)?;

    for key in keys {
        println!("\n📝 [{}] {}", wizard.session().stage().label(), key);
        wizard.dispatch(WizardAction::SelectGroup(key.clone()))?;
        wizard.dispatch(WizardAction::ConfirmGroup)?;

        let answers = sample_answers(&wizard.session().record().answers);
        wizard.dispatch(WizardAction::UpdateAnswers(answers))?;

        println!("🤖 Drafting appeal with {}...", config.drafting_model);
        let session = wizard.submit_questions().await?;
        if !session.can_confirm_preview() {
            eprintln!("⚠️  {}", session.appeal_text());
            wizard.dispatch(WizardAction::BackToQuestions)?;
            wizard.dispatch(WizardAction::BackToConfirm)?;
            wizard.dispatch(WizardAction::DeselectGroup)?;
            continue;
        }

        wizard.dispatch(WizardAction::ConfirmPreview)?;
        let now = Utc::now();
        for exporter in exporters() {
            let file = wizard.export(exporter.as_ref(), now)?;
            let target = Path::new(OUTPUT_DIR).join(&file.file_name);
            std::fs::write(&target, &file.bytes)?;
            println!("💾 Saved {}", target.display());
        }

        wizard.dispatch(WizardAction::ProcessAnother)?;
    }

    println!(
        "\n🏁 {} group(s) appealed",
        wizard.session().processed().len()
    );
    Ok(())
}
