//! Row classification for the grade and report-card tables.
//!
//! The portal renders those tables without stable ids, so rows are told apart
//! by structural markers alone. [`RowShape`] takes the fingerprint once and
//! the classifiers decide from it, never from cell text.

use scraper::ElementRef;

use crate::dom;

/// Structural fingerprint of one table row.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RowShape {
    /// Classes on the row element itself.
    pub row_classes: Vec<String>,
    /// Union of the classes across the row's cells.
    pub cell_classes: Vec<String>,
    /// Whether any cell spans rows.
    pub has_merged_cell: bool,
    /// Number of `td` cells under the row.
    pub cells: usize,
    /// Number of direct element children, header cells included.
    pub children: usize,
}

impl RowShape {
    pub fn of(row: ElementRef<'_>) -> Self {
        let row_classes = row.value().classes().map(|c| c.to_string()).collect();

        let mut cell_classes = Vec::new();
        let mut has_merged_cell = false;
        let mut cells = 0;
        for cell in row.select(&dom::TD) {
            cells += 1;
            if cell.value().attr("rowspan").is_some() {
                has_merged_cell = true;
            }
            cell_classes.extend(cell.value().classes().map(|c| c.to_string()));
        }

        let children = row
            .children()
            .filter(|node| node.value().is_element())
            .count();

        RowShape {
            row_classes,
            cell_classes,
            has_merged_cell,
            cells,
            children,
        }
    }

    fn row_has(&self, class: &str) -> bool {
        self.row_classes.iter().any(|c| c == class)
    }

    fn cell_has(&self, class: &str) -> bool {
        self.cell_classes.iter().any(|c| c == class)
    }
}

/// Row kinds of the continuous-assessment grades table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GradeRowKind {
    /// Wide `bigheader` banner opening a class.
    ClassHeader,
    /// Merged-cell header opening a grade group.
    GroupHeader,
    /// One graded assessment, exactly five cells.
    Grade,
    Unknown,
}

impl GradeRowKind {
    pub fn classify(shape: &RowShape) -> Self {
        if shape.cell_has("bigheader") {
            GradeRowKind::ClassHeader
        } else if shape.has_merged_cell {
            GradeRowKind::GroupHeader
        } else if shape.cells == 5 {
            GradeRowKind::Grade
        } else {
            GradeRowKind::Unknown
        }
    }
}

/// Row kinds of the report-card (bulletin) table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReportRowKind {
    Header,
    Module,
    Unit,
    /// Credits sum at the bottom; recognized but carries no record.
    CreditsTotal,
    Unknown,
}

impl ReportRowKind {
    pub fn classify(shape: &RowShape) -> Self {
        if shape.row_has("bulletin_header_row") {
            ReportRowKind::Header
        } else if shape.row_has("bulletin_module_row") {
            if shape.row_has("total-credits-row") {
                ReportRowKind::CreditsTotal
            } else {
                ReportRowKind::Module
            }
        } else if shape.row_has("bulletin_unit_row") {
            ReportRowKind::Unit
        } else {
            ReportRowKind::Unknown
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use scraper::Html;

    fn shape_of(row_html: &str) -> RowShape {
        let doc = Html::parse_document(&format!("<table>{row_html}</table>"));
        let sel = scraper::Selector::parse("tr").unwrap();
        RowShape::of(doc.select(&sel).next().unwrap())
    }

    #[test]
    fn fingerprint_captures_the_structural_markers() {
        let shape = shape_of(
            r#"<tr class="odd"><td class="bigheader" colspan="5">x</td><td rowspan="2">y</td></tr>"#,
        );
        assert_eq!(shape.row_classes, vec!["odd"]);
        assert_eq!(shape.cell_classes, vec!["bigheader"]);
        assert!(shape.has_merged_cell);
        assert_eq!(shape.cells, 2);
        assert_eq!(shape.children, 2);
    }

    #[test]
    fn grade_rows_classify_by_marker_precedence() {
        let header = shape_of(r#"<tr><td class="bigheader">h</td></tr>"#);
        assert_eq!(GradeRowKind::classify(&header), GradeRowKind::ClassHeader);

        let group = shape_of(r#"<tr><td rowspan="3">g</td></tr>"#);
        assert_eq!(GradeRowKind::classify(&group), GradeRowKind::GroupHeader);

        let grade = shape_of("<tr><td>a</td><td>b</td><td>c</td><td>d</td><td>e</td></tr>");
        assert_eq!(GradeRowKind::classify(&grade), GradeRowKind::Grade);

        let stray = shape_of("<tr><td>a</td><td>b</td></tr>");
        assert_eq!(GradeRowKind::classify(&stray), GradeRowKind::Unknown);
    }

    #[test]
    fn bigheader_wins_over_merged_cells() {
        let both = shape_of(r#"<tr><td class="bigheader" rowspan="2">h</td></tr>"#);
        assert_eq!(GradeRowKind::classify(&both), GradeRowKind::ClassHeader);
    }

    #[test]
    fn report_rows_classify_by_row_class() {
        let header = shape_of(r#"<tr class="bulletin_header_row"><td>h</td></tr>"#);
        assert_eq!(ReportRowKind::classify(&header), ReportRowKind::Header);

        let module = shape_of(r#"<tr class="bulletin_module_row"><td>m</td></tr>"#);
        assert_eq!(ReportRowKind::classify(&module), ReportRowKind::Module);

        let credits = shape_of(r#"<tr class="bulletin_module_row total-credits-row"><td>t</td></tr>"#);
        assert_eq!(ReportRowKind::classify(&credits), ReportRowKind::CreditsTotal);

        let unit = shape_of(r#"<tr class="bulletin_unit_row"><td>u</td></tr>"#);
        assert_eq!(ReportRowKind::classify(&unit), ReportRowKind::Unit);

        let spacer = shape_of("<tr><td></td></tr>");
        assert_eq!(ReportRowKind::classify(&spacer), ReportRowKind::Unknown);
    }
}
