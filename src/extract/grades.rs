//! Extraction of continuous-assessment grades, grouped by class.

use std::sync::LazyLock;

use chrono::NaiveDate;
use regex::Regex;
use scraper::{ElementRef, Html, Selector};
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::rows::{GradeRowKind, RowShape};
use crate::dom;
use crate::error::{Error, Result, Stage};

static ROWS: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("table.displayArray tbody tr").unwrap());
static BIG_HEADER: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("td.bigheader").unwrap());
static EXPANDABLE: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("div[onclick]").unwrap());
static NESTED_DIV: LazyLock<Selector> = LazyLock::new(|| Selector::parse("div div").unwrap());

// "<name> - moyenne [(]hors examen[)] : <mean>", mean being a number or the
// dash the portal shows before any grade exists.
static CLASS_HEADER_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?m)^([\w-]{3,}) - moyenne\s+?\(?(hors examen)?\)?.+(\d.\d+|-)$").unwrap()
});
// Group header cells hold three lines separated by <br>, matched on inner
// HTML: name, group mean, group weight.
static GROUP_HEADER_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?m)^(.+)<br\s*?/?>moyenne : (\d.\d|-)<br\s*?/?>poids : (\d+)$").unwrap()
});
// "Travail écrit (15%)" style weight cells.
static WEIGHT_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(?m)^.+?\(([\d.]+)%\)$").unwrap());

/// One class of the grades view with its grade groups, in document order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClassGrades {
    pub name: String,
    /// Mean over all groups as the portal prints it, `-` before any grade.
    pub global_mean: String,
    /// Whether the mean excludes the exam ("hors examen").
    pub has_exam: bool,
    pub grade_groups: Vec<GradeGroup>,
}

/// A weighted group of grades, such as written tests or labs.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GradeGroup {
    pub name: String,
    /// Group mean as printed, `-` before any grade.
    pub mean: String,
    /// Weight of the group inside the class mean, in percent.
    pub weight: u32,
    pub grades: Vec<Grade>,
}

/// A single graded assessment.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Grade {
    pub description: String,
    pub date: NaiveDate,
    /// Weight inside the group, in percent.
    pub weight: f32,
    /// The obtained grade as printed; not always numeric (`ABS`, `-`).
    pub grade: String,
    /// Class-wide mean for this assessment, as printed.
    pub class_mean: String,
}

/// Accumulator for the class tree. Rows attach to the most recently opened
/// container of the expected kind, so the attach rules live in one place.
#[derive(Default)]
struct GradesTree {
    classes: Vec<ClassGrades>,
}

impl GradesTree {
    fn open_class(&mut self, class: ClassGrades) {
        self.classes.push(class);
    }

    fn open_group(&mut self, group: GradeGroup) -> Result<()> {
        let class = self
            .classes
            .last_mut()
            .ok_or(Error::Structure(Stage::GroupHeader))?;
        class.grade_groups.push(group);
        Ok(())
    }

    /// Attach a grade to the last open group. Returns false when no group is
    /// open yet; the caller drops such rows.
    fn push_grade(&mut self, grade: Grade) -> bool {
        let group = self
            .classes
            .last_mut()
            .and_then(|class| class.grade_groups.last_mut());
        match group {
            Some(group) => {
                group.grades.push(grade);
                true
            }
            None => false,
        }
    }
}

/// Extract every class with its grade groups and grades, in document order.
pub fn extract(doc: &Html) -> Result<Vec<ClassGrades>> {
    let mut tree = GradesTree::default();

    for row in doc.select(&ROWS) {
        match GradeRowKind::classify(&RowShape::of(row)) {
            GradeRowKind::ClassHeader => tree.open_class(parse_class_header(row)?),
            GradeRowKind::GroupHeader => tree.open_group(parse_group_header(row)?)?,
            GradeRowKind::Grade => {
                let grade = parse_grade_row(row)?;
                if !tree.push_grade(grade) {
                    debug!("dropping grade row without an open group");
                }
            }
            GradeRowKind::Unknown => {
                debug!("unknown grade row with content: {}", dom::trimmed_text(row));
                return Err(Error::Structure(Stage::GradeRow));
            }
        }
    }

    Ok(tree.classes)
}

/// Keep only the classes whose name matches exactly, preserving order.
pub fn filter_classes(classes: Vec<ClassGrades>, name: &str) -> Result<Vec<ClassGrades>> {
    let filtered: Vec<_> = classes.into_iter().filter(|c| c.name == name).collect();
    if filtered.is_empty() {
        return Err(Error::ClassNotFound(name.to_string()));
    }
    Ok(filtered)
}

fn parse_class_header(row: ElementRef<'_>) -> Result<ClassGrades> {
    let text = row
        .select(&BIG_HEADER)
        .next()
        .map(dom::text)
        .unwrap_or_default();

    let caps = CLASS_HEADER_RE
        .captures(&text)
        .ok_or(Error::Structure(Stage::ClassHeader))?;

    Ok(ClassGrades {
        name: caps[1].to_string(),
        global_mean: caps[3].to_string(),
        has_exam: caps.get(2).is_some(),
        grade_groups: Vec::new(),
    })
}

fn parse_group_header(row: ElementRef<'_>) -> Result<GradeGroup> {
    let html = row
        .select(&dom::TD)
        .next()
        .map(|cell| cell.inner_html())
        .unwrap_or_default();

    let caps = GROUP_HEADER_RE
        .captures(&html)
        .ok_or(Error::Structure(Stage::GroupHeader))?;
    let weight = caps[3]
        .parse()
        .map_err(|_| Error::Structure(Stage::GroupHeader))?;

    Ok(GradeGroup {
        name: caps[1].to_string(),
        mean: caps[2].to_string(),
        weight,
        grades: Vec::new(),
    })
}

fn parse_grade_row(row: ElementRef<'_>) -> Result<Grade> {
    let cells: Vec<_> = row.select(&dom::TD).collect();
    let &[date_cell, description_cell, mean_cell, weight_cell, grade_cell] = cells.as_slice()
    else {
        return Err(Error::Structure(Stage::GradeRow));
    };

    let date = NaiveDate::parse_from_str(dom::text(date_cell).trim(), "%d.%m.%Y")
        .map_err(|_| Error::Structure(Stage::DateCell))?;

    Ok(Grade {
        description: parse_description(description_cell),
        date,
        weight: parse_weight(weight_cell)?,
        grade: dom::text(grade_cell),
        class_mean: dom::text(mean_cell),
    })
}

// Expandable descriptions keep their full text in the last nested div; plain
// cells are taken verbatim.
fn parse_description(cell: ElementRef<'_>) -> String {
    if cell.select(&EXPANDABLE).next().is_some() {
        cell.select(&NESTED_DIV)
            .last()
            .map(dom::trimmed_text)
            .unwrap_or_default()
    } else {
        dom::text(cell)
    }
}

fn parse_weight(cell: ElementRef<'_>) -> Result<f32> {
    let text = dom::text(cell);
    let caps = WEIGHT_RE
        .captures(&text)
        .ok_or(Error::Structure(Stage::WeightCell))?;
    caps[1].parse().map_err(|_| Error::Structure(Stage::WeightCell))
}
