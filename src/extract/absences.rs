//! Extraction of the per-course absence report.

use std::sync::LazyLock;

use regex::Regex;
use scraper::{Html, Selector};
use serde::{Deserialize, Serialize};

use crate::dom;
use crate::error::Result;

static STUDENT: LazyLock<Selector> = LazyLock::new(|| Selector::parse(".s_cell").unwrap());
static ORIENTATION: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse(".l_cell.s_cell").unwrap());
static ROWS: LazyLock<Selector> = LazyLock::new(|| Selector::parse("tr.a_r_0").unwrap());
static LABEL: LazyLock<Selector> = LazyLock::new(|| Selector::parse("td.l_cell").unwrap());
static COURSE_NAME: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("td.l_cell:not(.s_cell)").unwrap());
static COUNTERS: LazyLock<Selector> = LazyLock::new(|| Selector::parse("td.b_cell").unwrap());

// "<count> [<justified>]" period cells.
static JUSTIFIED_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(\d+)\s*\[(\d+)\]").unwrap());

/// The absence report of one student.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AbsenceReport {
    pub student: String,
    /// Study orientation line under the student name.
    pub orientation: String,
    pub courses: Vec<CourseAbsence>,
}

/// Absence counters of one course, all counted in periods.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CourseAbsence {
    pub name: String,
    /// Summer term, before the school year starts.
    pub ete: u32,
    pub term1: u32,
    pub term2: u32,
    pub term3: u32,
    pub term4: u32,
    pub total: u32,
    /// Sum of the bracketed justified counts across the term cells.
    pub justified: u32,
    /// Periods held so far; may be 0, so guard before dividing.
    pub relative_periods: u32,
    /// Periods planned over the whole year.
    pub absolute_periods: u32,
}

/// Extract the student header and one entry per course row.
pub fn extract(doc: &Html) -> Result<AbsenceReport> {
    let mut report = AbsenceReport {
        student: dom::first_text(doc, &STUDENT),
        orientation: dom::first_text(doc, &ORIENTATION),
        courses: Vec::new(),
    };

    for row in doc.select(&ROWS) {
        // Separator rows carry the stripe class but no label cell.
        if row.select(&LABEL).next().is_none() {
            continue;
        }

        let name = row
            .select(&COURSE_NAME)
            .next()
            .map(dom::trimmed_text)
            .unwrap_or_default();

        let cells: Vec<String> = row.select(&COUNTERS).map(dom::text).collect();
        let counter = |index: usize| cells.get(index).map(String::as_str).unwrap_or("");

        let mut justified = 0;
        let mut period = |index: usize| {
            let (count, excused) = parse_period_cell(counter(index));
            justified += excused;
            count
        };
        let ete = period(0);
        let term1 = period(1);
        let term2 = period(2);
        let term3 = period(3);
        let term4 = period(4);

        report.courses.push(CourseAbsence {
            name,
            ete,
            term1,
            term2,
            term3,
            term4,
            total: parse_count(counter(5)),
            justified,
            relative_periods: parse_count(counter(6)),
            absolute_periods: parse_count(counter(7)),
        });
    }

    Ok(report)
}

// Period cells read "<count> [<justified>]", a bare count, or a placeholder.
// Malformed text degrades to zero, never to an error.
fn parse_period_cell(text: &str) -> (u32, u32) {
    let text = text.trim();
    if is_blank(text) {
        return (0, 0);
    }
    if let Some(caps) = JUSTIFIED_RE.captures(text) {
        let count = caps[1].parse().unwrap_or(0);
        let justified = caps[2].parse().unwrap_or(0);
        return (count, justified);
    }
    (text.parse().unwrap_or(0), 0)
}

// Summary cells may carry a bracketed annotation; only what precedes it
// counts.
fn parse_count(text: &str) -> u32 {
    let text = text.trim();
    if is_blank(text) {
        return 0;
    }
    let text = match text.split_once('[') {
        Some((head, _)) => head.trim(),
        None => text,
    };
    text.parse().unwrap_or(0)
}

// The portal leaves unescaped "&nbsp" markers in empty cells.
fn is_blank(text: &str) -> bool {
    text.is_empty() || text == "&nbsp" || text == "&nbsp;"
}
