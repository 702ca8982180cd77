use thiserror::Error;

/// The parse stage a structural failure was detected in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    ClassHeader,
    GroupHeader,
    GradeRow,
    DateCell,
    WeightCell,
    ReportCardHeader,
    ModuleRow,
    UnitRow,
    StudentId,
}

impl Stage {
    fn as_str(self) -> &'static str {
        match self {
            Stage::ClassHeader => "class header",
            Stage::GroupHeader => "group header",
            Stage::GradeRow => "grade row",
            Stage::DateCell => "grade date cell",
            Stage::WeightCell => "grade weight cell",
            Stage::ReportCardHeader => "report card header",
            Stage::ModuleRow => "module row",
            Stage::UnitRow => "unit row",
            Stage::StudentId => "student id marker",
        }
    }
}

impl std::fmt::Display for Stage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Everything that can go wrong between a raw response body and typed records.
#[derive(Debug, Error)]
pub enum Error {
    /// The server itself signalled a failure inside the envelope.
    #[error("sajax raised error: {0}")]
    Remote(String),

    /// The envelope's quoted-string framing is not valid JSON.
    #[error("malformed envelope payload: {0}")]
    Envelope(#[from] serde_json::Error),

    /// A document shape or embedded pattern failed to match.
    #[error("could not parse {0}")]
    Structure(Stage),

    /// A class filter matched nothing.
    #[error("no class found with name {0}")]
    ClassNotFound(String),
}

pub type Result<T> = std::result::Result<T, Error>;
