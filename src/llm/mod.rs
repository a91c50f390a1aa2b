pub mod client;
pub mod drafter;
pub mod extractor;
pub mod prompts;
pub mod spreadsheet;
pub mod types;

pub use client::*;
pub use drafter::*;
pub use extractor::*;
pub use spreadsheet::*;
pub use types::*;
