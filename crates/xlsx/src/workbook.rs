//! In-memory two-column workbook.

use deck_core::{Definition, FlashCard, RestructuredSection};

/// Width of the term/title column, in characters.
pub const TERM_WIDTH: f64 = 40.0;

/// Width of the definition column in sectioned workbooks.
pub const SECTIONED_DEFINITION_WIDTH: f64 = 120.0;

/// Width of the content column in flat and merged workbooks.
pub const FLAT_DEFINITION_WIDTH: f64 = 100.0;

/// What a row represents; drives its styling.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RowKind {
    /// Column titles.
    ColumnHeader,
    /// A section title merged across both columns.
    SectionHeader,
    /// A term and its definition.
    Data,
    /// Blank row between sections.
    Spacer,
}

/// One row of two cells.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Row {
    pub kind: RowKind,
    pub cells: [String; 2],
}

impl Row {
    pub fn new(kind: RowKind, first: impl Into<String>, second: impl Into<String>) -> Self {
        Self {
            kind,
            cells: [first.into(), second.into()],
        }
    }

    fn spacer() -> Self {
        Self::new(RowKind::Spacer, "", "")
    }
}

/// A single-sheet, two-column workbook.
///
/// Rows are only ever appended, so a row's index never changes once added.
#[derive(Debug, Clone, PartialEq)]
pub struct Workbook {
    sheet_name: String,
    column_widths: [f64; 2],
    rows: Vec<Row>,
}

impl Workbook {
    /// Create an empty workbook.
    pub fn new(sheet_name: impl Into<String>, column_widths: [f64; 2]) -> Self {
        Self {
            sheet_name: sheet_name.into(),
            column_widths,
            rows: Vec::new(),
        }
    }

    /// One section header per restructured section, followed by its items
    /// and a blank spacer row.
    pub fn sectioned(sections: &[RestructuredSection]) -> Self {
        let mut workbook = Self::new("Summary", [TERM_WIDTH, SECTIONED_DEFINITION_WIDTH]);
        workbook.push(Row::new(RowKind::ColumnHeader, "Term", "Definition"));

        for section in sections {
            workbook.push(Row::new(RowKind::SectionHeader, section.keys.as_str(), ""));
            for item in &section.items {
                workbook.push_card(item);
            }
            workbook.push(Row::spacer());
        }

        workbook
    }

    /// One row per card under a `Title`/`Content` header.
    pub fn flat(cards: &[FlashCard]) -> Self {
        let mut workbook = Self::new("Slides", [TERM_WIDTH, FLAT_DEFINITION_WIDTH]);
        workbook.push(Row::new(RowKind::ColumnHeader, "Title", "Content"));

        for card in cards {
            workbook.push_card(card);
        }

        workbook
    }

    /// Rebuild a workbook from raw cell values.
    ///
    /// The first row is taken as the column header and blank rows as spacers.
    pub fn from_rows(sheet_name: impl Into<String>, rows: Vec<[String; 2]>) -> Self {
        let mut workbook = Self::new(sheet_name, [TERM_WIDTH, FLAT_DEFINITION_WIDTH]);

        for (idx, [first, second]) in rows.into_iter().enumerate() {
            let kind = if idx == 0 {
                RowKind::ColumnHeader
            } else if first.is_empty() && second.is_empty() {
                RowKind::Spacer
            } else {
                RowKind::Data
            };
            workbook.push(Row::new(kind, first, second));
        }

        workbook
    }

    pub fn sheet_name(&self) -> &str {
        &self.sheet_name
    }

    pub fn column_widths(&self) -> [f64; 2] {
        self.column_widths
    }

    pub fn rows(&self) -> &[Row] {
        &self.rows
    }

    fn push(&mut self, row: Row) {
        self.rows.push(row);
    }

    /// A nested card contributes one row per sub-card.
    fn push_card(&mut self, card: &FlashCard) {
        match &card.definition {
            Definition::Text(text) => {
                self.push(Row::new(RowKind::Data, card.term.as_str(), text.as_str()));
            }
            Definition::Nested(subs) => {
                for sub in subs {
                    self.push_card(sub);
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cells(workbook: &Workbook) -> Vec<(RowKind, &str, &str)> {
        workbook
            .rows()
            .iter()
            .map(|r| (r.kind, r.cells[0].as_str(), r.cells[1].as_str()))
            .collect()
    }

    #[test]
    fn test_sectioned_layout() {
        let sections = vec![
            RestructuredSection {
                keys: "Eye".to_string(),
                items: vec![
                    FlashCard::new("Lens", "focuses light"),
                    FlashCard::new("Retina", "senses light"),
                ],
            },
            RestructuredSection {
                keys: "Ear".to_string(),
                items: vec![FlashCard::new("Cochlea", "hearing")],
            },
        ];

        let workbook = Workbook::sectioned(&sections);
        assert_eq!(
            cells(&workbook),
            vec![
                (RowKind::ColumnHeader, "Term", "Definition"),
                (RowKind::SectionHeader, "Eye", ""),
                (RowKind::Data, "Lens", "focuses light"),
                (RowKind::Data, "Retina", "senses light"),
                (RowKind::Spacer, "", ""),
                (RowKind::SectionHeader, "Ear", ""),
                (RowKind::Data, "Cochlea", "hearing"),
                (RowKind::Spacer, "", ""),
            ]
        );
        assert_eq!(workbook.column_widths(), [40.0, 120.0]);
    }

    #[test]
    fn test_flat_layout_expands_nested_cards() {
        let cards = vec![
            FlashCard::new("A", "first"),
            FlashCard::nested(
                "Group",
                vec![FlashCard::new("B", "second"), FlashCard::new("C", "third")],
            ),
        ];

        let workbook = Workbook::flat(&cards);
        assert_eq!(
            cells(&workbook),
            vec![
                (RowKind::ColumnHeader, "Title", "Content"),
                (RowKind::Data, "A", "first"),
                (RowKind::Data, "B", "second"),
                (RowKind::Data, "C", "third"),
            ]
        );
        assert_eq!(workbook.column_widths(), [40.0, 100.0]);
    }

    #[test]
    fn test_empty_sections_still_have_header() {
        let workbook = Workbook::sectioned(&[]);
        assert_eq!(workbook.rows().len(), 1);
        assert_eq!(workbook.rows()[0].kind, RowKind::ColumnHeader);
    }

    #[test]
    fn test_from_rows_marks_header_and_spacers() {
        let workbook = Workbook::from_rows(
            "Merged Data",
            vec![
                ["Title".to_string(), "Content".to_string()],
                ["A".to_string(), "a".to_string()],
                [String::new(), String::new()],
            ],
        );
        let kinds: Vec<RowKind> = workbook.rows().iter().map(|r| r.kind).collect();
        assert_eq!(kinds, vec![RowKind::ColumnHeader, RowKind::Data, RowKind::Spacer]);
        assert_eq!(workbook.rows()[2].cells, [String::new(), String::new()]);
    }
}
