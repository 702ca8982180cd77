//! Structured extractors, one per document shape the portal serves.

pub mod absences;
pub mod grades;
pub mod registry;
pub mod report_card;
pub mod rows;
