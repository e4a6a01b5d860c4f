//! Use cases - User story orchestration.
//!
//! Each module contains use cases for a specific area.
//! Use cases orchestrate across port traits to fulfill user stories.

pub mod narrative;
pub mod runs;
pub mod transfer;

pub use narrative::NarrativeUseCases;
pub use runs::RunUseCases;
pub use transfer::TemplateTransfer;
