//! # Glosa Appeal Builder
//!
//! A library for turning a health-insurance denial ("glosa") report into
//! formal appeal letters, one per group of denials sharing a claim number
//! and a justification.
//!
//! ## Core Concepts
//!
//! - **Extraction**: An uploaded report (PDF, CSV, XML or XLSX) is read by an LLM into
//!   structured [`DenialItem`]s
//! - **Grouping**: Items are grouped by claim number and justification, so one letter
//!   answers one denial reason
//! - **Questionnaire**: For the selected group the user answers a fixed set of questions
//!   that become the arguments of the appeal
//! - **Drafting**: The LLM writes the letter; failures come back as text starting with
//!   [`DRAFT_ERROR_MARKER`]
//! - **Session**: A five-stage wizard (Upload, Confirm, Questions, Preview, Success) that
//!   remembers which groups were already appealed
//!
//! ## Example
//!
//! ```rust,ignore
//! use glosa_appeal_builder::*;
//!
//! let items = vec![
//!     DenialItem {
//!         insurance_id: "123456".to_string(),
//!         denial_value: "1.500,50".to_string(),
//!         justification: "Procedimento não autorizado".to_string(),
//!         ..Default::default()
//!     },
//! ];
//!
//! let groups = group_items(&items, "123456");
//! assert_eq!(groups[0].key(), "123456::Procedimento não autorizado");
//! assert_eq!(format_currency(groups[0].total_value()), "R$ 1.500,50");
//! ```

pub mod adapters;
pub mod error;
pub mod export;
pub mod grouping;
pub mod money;
pub mod record;
pub mod schema;
pub mod session;
pub mod source;
pub mod wizard;

#[cfg(feature = "gemini")]
pub mod llm;

pub use adapters::{AppealDrafter, DenialExtractor, ExtractionEvent};
pub use error::{BlockReason, GlosaError, Result};
pub use export::*;
pub use grouping::*;
pub use money::*;
pub use record::*;
pub use schema::*;
pub use session::*;
pub use source::*;
pub use wizard::GlosaWizard;
