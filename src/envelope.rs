//! Decoding of the sajax-style envelope the portal wraps every response in.

use std::sync::LazyLock;

use regex::Regex;
use scraper::Html;

use crate::error::{Error, Result, Stage};
use crate::extract::absences::{self, AbsenceReport};
use crate::extract::grades::{self, ClassGrades};
use crate::extract::registry::{self, Registry};
use crate::extract::report_card::{self, ModuleReport};

/// Marker framing the interesting part of a smart-replace response.
const SMART_SEPARATOR: &str = "@££@";

static STUDENT_ID_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?m)const DEFAULT_STUDENT_ID = (\d+?);").unwrap());

/// A decoded response body, ready for structured extraction.
///
/// Decoding peels three layers in order: the `-:`/`+:` status prefix, the
/// JSON string quoting, and the smart separator framing. Text that carries
/// none of them passes through unchanged, so decoding is idempotent.
#[derive(Debug, Clone)]
pub struct Payload {
    text: String,
}

impl Payload {
    /// Strip the envelope from a raw response body.
    pub fn decode(raw: &str) -> Result<Self> {
        if let Some(message) = raw.strip_prefix("-:") {
            return Err(Error::Remote(message.to_string()));
        }

        let mut text = raw.strip_prefix("+:").unwrap_or(raw).to_string();

        if text.starts_with('"') {
            text = serde_json::from_str(&text)?;
        }

        if text.contains(SMART_SEPARATOR) {
            text = text
                .splitn(3, SMART_SEPARATOR)
                .nth(1)
                .unwrap_or_default()
                .to_string();
        }

        Ok(Payload { text })
    }

    /// Same as [`Payload::decode`] for a body read as bytes; invalid UTF-8
    /// sequences are replaced.
    pub fn from_bytes(raw: &[u8]) -> Result<Self> {
        Self::decode(&String::from_utf8_lossy(raw))
    }

    /// The decoded payload text.
    pub fn as_str(&self) -> &str {
        &self.text
    }

    fn document(&self) -> Html {
        Html::parse_document(&self.text)
    }

    /// Continuous-assessment grades, one entry per class header.
    pub fn grades(&self) -> Result<Vec<ClassGrades>> {
        grades::extract(&self.document())
    }

    /// The module report card (bulletin).
    pub fn report_card(&self) -> Result<Vec<ModuleReport>> {
        report_card::extract(&self.document())
    }

    /// The per-course absence report.
    pub fn absences(&self) -> Result<AbsenceReport> {
        absences::extract(&self.document())
    }

    /// The rooms/teachers/students directory of the schedule menu.
    pub fn registry(&self) -> Result<Registry> {
        registry::extract(&self.document())
    }

    /// The numeric student id planted in the landing page scripts.
    pub fn student_id(&self) -> Result<u32> {
        let caps = STUDENT_ID_RE
            .captures(&self.text)
            .ok_or(Error::Structure(Stage::StudentId))?;
        caps[1].parse().map_err(|_| Error::Structure(Stage::StudentId))
    }
}
