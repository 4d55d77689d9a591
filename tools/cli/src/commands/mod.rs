//! CLI commands

pub mod session;

pub use session::{TranslationSession, parse_number};
