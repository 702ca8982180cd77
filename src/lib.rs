//! Decoding and structured extraction for GAPS portal responses.
//!
//! The portal answers its RPC calls with semi-structured markup wrapped in a
//! sajax-style envelope. [`Payload::decode`] peels the envelope; the
//! extractors then turn the inner markup into typed records: grades per
//! class, the module report card, the absence report and the directory of
//! rooms, teachers and students.

mod dom;
pub mod envelope;
pub mod error;
pub mod extract;

pub use envelope::Payload;
pub use error::{Error, Result, Stage};
pub use extract::absences::{AbsenceReport, CourseAbsence};
pub use extract::grades::{ClassGrades, Grade, GradeGroup};
pub use extract::registry::{Registry, RegistryEntry};
pub use extract::report_card::{ClassGrade, ModuleClass, ModuleReport};
