//! Extraction of the module report card (bulletin).

use std::sync::LazyLock;

use scraper::{ElementRef, Html, Selector};
use serde::{Deserialize, Serialize};

use super::rows::{ReportRowKind, RowShape};
use crate::dom;
use crate::error::{Error, Result, Stage};

static ROWS: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("table#record_table tr").unwrap());
static MODULE_CODE: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("td.module-code").unwrap());

// The module name cell reads "<name> (<code>) [seuil : <grade>]".
const PASSING_GRADE_PREFIX: &str = ") [seuil : ";

/// One module of the report card with the class units it contains.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ModuleReport {
    /// Module code, such as `ISC1`.
    pub identifier: String,
    pub name: String,
    /// Starting year of the academic year, 0 when the cell is not a year.
    pub year: u32,
    /// Grade needed to pass the module, as printed.
    pub passing_grade: String,
    /// Module grade as printed, `-` while the module is open.
    pub global_grade: String,
    pub credits: u32,
    /// Standing of the module, such as `Réussi`.
    pub situation: String,
    pub classes: Vec<ModuleClass>,
}

/// One class unit inside a module.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModuleClass {
    pub identifier: String,
    pub name: String,
    pub grades: Vec<ClassGrade>,
    /// Class mean as printed.
    pub mean: String,
    /// Weight of the class inside the module, 0 when not printed.
    pub weight: u32,
}

/// One named grade line of a class unit, such as an exam or lab part.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClassGrade {
    pub name: String,
    /// Weight in percent, 0 when the descriptor has no annotation.
    pub weight: u32,
    /// The grade as printed, possibly empty while not yet given.
    pub grade: String,
}

/// Accumulator for the module tree; unit rows attach to the last open module.
#[derive(Default)]
struct ReportTree {
    modules: Vec<ModuleReport>,
}

impl ReportTree {
    fn open_module(&mut self, module: ModuleReport) {
        self.modules.push(module);
    }

    fn push_class(&mut self, class: ModuleClass) -> Result<()> {
        let module = self
            .modules
            .last_mut()
            .ok_or(Error::Structure(Stage::UnitRow))?;
        module.classes.push(class);
        Ok(())
    }
}

/// Extract every module with its class units, in document order.
pub fn extract(doc: &Html) -> Result<Vec<ModuleReport>> {
    let mut tree = ReportTree::default();

    for (index, row) in doc.select(&ROWS).enumerate() {
        let shape = RowShape::of(row);
        let kind = ReportRowKind::classify(&shape);

        // The first row must be the column header, and a header narrower
        // than the known layout means the table changed shape.
        if index == 0 && kind != ReportRowKind::Header {
            return Err(Error::Structure(Stage::ReportCardHeader));
        }

        match kind {
            ReportRowKind::Header => {
                if shape.children < 6 {
                    return Err(Error::Structure(Stage::ReportCardHeader));
                }
            }
            ReportRowKind::Module => tree.open_module(parse_module_row(row)?),
            ReportRowKind::Unit => tree.push_class(parse_unit_row(row)?)?,
            ReportRowKind::CreditsTotal => {}
            ReportRowKind::Unknown => {}
        }
    }

    Ok(tree.modules)
}

fn parse_module_row(row: ElementRef<'_>) -> Result<ModuleReport> {
    let cells: Vec<_> = row.select(&dom::TD).collect();

    let identifier = row
        .select(&MODULE_CODE)
        .next()
        .map(dom::text)
        .ok_or(Error::Structure(Stage::ModuleRow))?;

    let name_text = cell_text(&cells, 1);
    let (name, passing_grade) = split_module_name(&name_text, &identifier)
        .ok_or(Error::Structure(Stage::ModuleRow))?;

    let year = cell_text(&cells, 3)
        .split(" - ")
        .next()
        .unwrap_or_default()
        .trim()
        .parse()
        .unwrap_or(0);

    let credits = cell_text(&cells, 6)
        .trim()
        .parse()
        .map_err(|_| Error::Structure(Stage::ModuleRow))?;

    Ok(ModuleReport {
        identifier,
        name,
        year,
        passing_grade,
        global_grade: cell_text(&cells, 4),
        credits,
        situation: cell_text(&cells, 2),
        classes: Vec::new(),
    })
}

fn split_module_name(text: &str, code: &str) -> Option<(String, String)> {
    if code.is_empty() {
        return None;
    }
    let (before, after) = text.split_once(code)?;
    let name = before.trim_end().strip_suffix('(')?.trim().to_string();
    let passing_grade = after
        .trim()
        .strip_prefix(PASSING_GRADE_PREFIX)?
        .strip_suffix(']')?
        .trim()
        .to_string();
    Some((name, passing_grade))
}

fn parse_unit_row(row: ElementRef<'_>) -> Result<ModuleClass> {
    let cells: Vec<_> = row.select(&dom::TD).collect();

    let contents = cells
        .get(1)
        .copied()
        .map(dom::child_texts)
        .unwrap_or_default();
    let name = contents
        .first()
        .map(|t| t.trim().to_string())
        .unwrap_or_default();

    // Child nodes from index 2 on alternate descriptor and value; an empty
    // descriptor ends the run, a missing value leaves the grade empty.
    let mut grades = Vec::new();
    let mut i = 2;
    while i < contents.len() {
        let descriptor = contents[i].trim();
        if descriptor.is_empty() {
            break;
        }
        let (name, weight) = split_grade_descriptor(descriptor);
        let grade = contents
            .get(i + 1)
            .map(|t| t.trim().to_string())
            .unwrap_or_default();
        grades.push(ClassGrade { name, weight, grade });
        i += 2;
    }

    Ok(ModuleClass {
        identifier: cell_text(&cells, 0),
        name,
        grades,
        mean: cell_text(&cells, 4),
        weight: cell_text(&cells, 5).trim().parse().unwrap_or(0),
    })
}

// "Quiz (30%)" gives name "Quiz" and weight 30; descriptors without an
// annotation keep the whole text and weight 0.
fn split_grade_descriptor(descriptor: &str) -> (String, u32) {
    match descriptor.split_once('(') {
        Some((name, rest)) => {
            let weight = rest
                .split('%')
                .next()
                .unwrap_or_default()
                .trim()
                .parse()
                .unwrap_or(0);
            (name.trim().to_string(), weight)
        }
        None => (descriptor.to_string(), 0),
    }
}

fn cell_text(cells: &[ElementRef<'_>], index: usize) -> String {
    cells.get(index).copied().map(dom::text).unwrap_or_default()
}
