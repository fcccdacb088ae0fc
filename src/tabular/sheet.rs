//! In-memory sheet model and processed-column insertion.

use thiserror::Error;

/// Errors from column resolution and sheet processing. Any error is
/// reported before the sheet is touched; there are no partial writes.
#[derive(Debug, Error)]
pub enum TabularError {
    #[error("column index {index} is out of range (sheet has {columns} columns)")]
    IndexOutOfRange { index: usize, columns: usize },
    #[error("column reference '{0}' matches no header and is not a column letter")]
    UnknownColumn(String),
    #[error("column letter '{letter}' names column {index}, beyond the sheet's {columns} columns")]
    LetterOutOfRange {
        letter: String,
        index: usize,
        columns: usize,
    },
    #[error("sheet has no header row")]
    EmptySheet,
}

/// A column reference as written by the caller. A string key resolves
/// against headers first and only then as a spreadsheet letter; a numeric
/// reference is always a 1-based index.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ColumnRef {
    /// 1-based column index.
    Index(usize),
    /// Header name, or failing that a spreadsheet-style letter.
    Key(String),
}

impl ColumnRef {
    /// Parse a CLI-style reference: digits mean an index, anything else a
    /// key.
    pub fn parse(s: &str) -> Self {
        match s.trim().parse::<usize>() {
            Ok(index) => ColumnRef::Index(index),
            Err(_) => ColumnRef::Key(s.trim().to_string()),
        }
    }
}

/// 1-based column index for a spreadsheet letter ("A" = 1, "Z" = 26,
/// "AA" = 27). `None` for anything that is not pure ASCII letters.
pub fn column_index_from_letter(letter: &str) -> Option<usize> {
    if letter.is_empty() || !letter.chars().all(|c| c.is_ascii_alphabetic()) {
        return None;
    }
    let mut index = 0usize;
    for c in letter.chars() {
        index = index * 26 + (c.to_ascii_uppercase() as usize - 'A' as usize + 1);
    }
    Some(index)
}

/// Spreadsheet letter for a 1-based column index.
pub fn column_letter(mut index: usize) -> String {
    debug_assert!(index >= 1);
    let mut letters = Vec::new();
    while index > 0 {
        let rem = (index - 1) % 26;
        letters.push((b'A' + rem as u8) as char);
        index = (index - 1) / 26;
    }
    letters.iter().rev().collect()
}

/// One cell's value.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum CellValue {
    #[default]
    Empty,
    Text(String),
    Number(f64),
}

impl CellValue {
    /// Rendered form, as written to CSV and measured for column widths.
    pub fn to_display(&self) -> String {
        match self {
            CellValue::Empty => String::new(),
            CellValue::Text(s) => s.clone(),
            CellValue::Number(n) => {
                if n.fract() == 0.0 && n.abs() < 1e15 {
                    format!("{}", *n as i64)
                } else {
                    n.to_string()
                }
            }
        }
    }

    pub fn is_empty(&self) -> bool {
        matches!(self, CellValue::Empty)
    }
}

/// Formatting carried from a source cell to its processed twin.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct CellStyle {
    pub bold: bool,
    pub wrap_text: bool,
    pub number_format: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct Cell {
    pub value: CellValue,
    pub style: CellStyle,
}

impl Cell {
    pub fn text(value: impl Into<String>) -> Self {
        Self {
            value: CellValue::Text(value.into()),
            style: CellStyle::default(),
        }
    }

    pub fn number(value: f64) -> Self {
        Self {
            value: CellValue::Number(value),
            style: CellStyle::default(),
        }
    }
}

/// A pure value→value cell transform.
pub type Transform = Box<dyn Fn(&CellValue) -> CellValue + Send + Sync>;

/// One column to process: where to read, what to call the result, and how
/// to transform each cell.
pub struct ColumnSpec {
    pub source: ColumnRef,
    /// Custom name for the new column; default is `{source}_Processed`.
    pub rename: Option<String>,
    pub transform: Transform,
}

/// Formatting switches for the inserted columns.
#[derive(Debug, Clone, Copy, Default)]
pub struct ProcessOptions {
    pub word_wrap: bool,
    pub auto_row_height: bool,
}

/// Points of row height per estimated wrapped line.
const LINE_HEIGHT: f64 = 15.0;
const DEFAULT_COLUMN_WIDTH: f64 = 10.0;

/// A rectangular sheet: row 0 is the header row. Column widths and row
/// heights ride along with insertions.
pub struct Sheet {
    rows: Vec<Vec<Cell>>,
    column_widths: Vec<Option<f64>>,
    row_heights: Vec<Option<f64>>,
}

impl Sheet {
    /// Build a sheet from rows, padding short rows so the grid is
    /// rectangular. The first row is the header row.
    pub fn from_rows(mut rows: Vec<Vec<Cell>>) -> Self {
        let columns = rows.iter().map(Vec::len).max().unwrap_or(0);
        for row in &mut rows {
            row.resize(columns, Cell::default());
        }
        let row_count = rows.len();
        Self {
            rows,
            column_widths: vec![None; columns],
            row_heights: vec![None; row_count],
        }
    }

    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    pub fn column_count(&self) -> usize {
        self.rows.first().map_or(0, Vec::len)
    }

    /// Header text per column; empty string for non-text header cells.
    pub fn headers(&self) -> Vec<String> {
        self.rows
            .first()
            .map(|row| row.iter().map(|cell| cell.value.to_display()).collect())
            .unwrap_or_default()
    }

    /// Cell at (row, column), 0-based.
    pub fn cell(&self, row: usize, column: usize) -> Option<&Cell> {
        self.rows.get(row).and_then(|r| r.get(column))
    }

    pub fn cell_mut(&mut self, row: usize, column: usize) -> Option<&mut Cell> {
        self.rows.get_mut(row).and_then(|r| r.get_mut(column))
    }

    pub fn rows(&self) -> &[Vec<Cell>] {
        &self.rows
    }

    pub fn column_width(&self, column: usize) -> Option<f64> {
        self.column_widths.get(column).copied().flatten()
    }

    pub fn row_height(&self, row: usize) -> Option<f64> {
        self.row_heights.get(row).copied().flatten()
    }

    /// Resolve a column reference to a 0-based index.
    ///
    /// Priority: exact 1-based index > exact header match > letter parse.
    pub fn resolve_column(&self, reference: &ColumnRef) -> Result<usize, TabularError> {
        let columns = self.column_count();
        match reference {
            ColumnRef::Index(index) => {
                if *index >= 1 && *index <= columns {
                    Ok(index - 1)
                } else {
                    Err(TabularError::IndexOutOfRange {
                        index: *index,
                        columns,
                    })
                }
            }
            ColumnRef::Key(key) => {
                if let Some(position) = self.headers().iter().position(|h| h == key) {
                    return Ok(position);
                }
                match column_index_from_letter(key) {
                    Some(index) if index <= columns => Ok(index - 1),
                    Some(index) => Err(TabularError::LetterOutOfRange {
                        letter: key.clone(),
                        index,
                        columns,
                    }),
                    None => Err(TabularError::UnknownColumn(key.clone())),
                }
            }
        }
    }

    /// Insert one processed column per spec, each immediately right of its
    /// source, carrying the source's per-row formatting.
    ///
    /// All references are resolved before anything is written; resolution
    /// failure leaves the sheet untouched. Insertions run in descending
    /// source order so earlier insertions never shift a later pending
    /// index.
    pub fn process_columns(
        &mut self,
        specs: Vec<ColumnSpec>,
        options: &ProcessOptions,
    ) -> Result<(), TabularError> {
        if self.rows.is_empty() {
            return Err(TabularError::EmptySheet);
        }

        let mut resolved: Vec<(usize, ColumnSpec)> = Vec::with_capacity(specs.len());
        for spec in specs {
            let source = self.resolve_column(&spec.source)?;
            resolved.push((source, spec));
        }
        resolved.sort_by(|a, b| b.0.cmp(&a.0));

        for (source, spec) in resolved {
            self.insert_processed_column(source, &spec, options);
        }
        Ok(())
    }

    fn insert_processed_column(
        &mut self,
        source: usize,
        spec: &ColumnSpec,
        options: &ProcessOptions,
    ) {
        let target = source + 1;

        let source_header = self.rows[0][source].value.to_display();
        let source_header = if source_header.is_empty() {
            "Column".to_string()
        } else {
            source_header
        };
        let header = spec
            .rename
            .clone()
            .unwrap_or_else(|| format!("{source_header}_Processed"));

        let mut max_len = header.chars().count();

        for (row_index, row) in self.rows.iter_mut().enumerate() {
            let mut cell = Cell {
                value: CellValue::Empty,
                style: row[source].style.clone(),
            };
            if row_index == 0 {
                cell.value = CellValue::Text(header.clone());
            } else {
                let processed = (spec.transform)(&row[source].value);
                if !processed.is_empty() {
                    max_len = max_len.max(processed.to_display().chars().count());
                }
                cell.value = processed;
            }
            if options.word_wrap {
                cell.style.wrap_text = true;
            }
            row.insert(target, cell);
        }

        let width = max_len as f64 + 2.0;
        self.column_widths.insert(target, Some(width));

        if options.word_wrap && options.auto_row_height {
            let column_width = if width > 0.0 { width } else { DEFAULT_COLUMN_WIDTH };
            for row_index in 1..self.rows.len() {
                let value = &self.rows[row_index][target].value;
                if value.is_empty() {
                    continue;
                }
                let text_len = value.to_display().chars().count();
                let estimated_lines = ((text_len as f64 / column_width) as usize + 1).max(1);
                self.row_heights[row_index] = Some(estimated_lines as f64 * LINE_HEIGHT);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn uppercase() -> Transform {
        Box::new(|value| match value {
            CellValue::Text(s) => CellValue::Text(s.to_uppercase()),
            other => other.clone(),
        })
    }

    fn double() -> Transform {
        Box::new(|value| match value {
            CellValue::Number(n) => CellValue::Number(n * 2.0),
            other => other.clone(),
        })
    }

    fn reverse() -> Transform {
        Box::new(|value| match value {
            CellValue::Text(s) => CellValue::Text(s.chars().rev().collect()),
            other => other.clone(),
        })
    }

    fn sample_sheet() -> Sheet {
        // Five columns so letter "E" resolves.
        Sheet::from_rows(vec![
            vec![
                Cell::text("Name"),
                Cell::text("Amount"),
                Cell::text("Qty"),
                Cell::text("Code"),
                Cell::text("Note"),
            ],
            vec![
                Cell::text("widget"),
                Cell::number(3.0),
                Cell::number(2.0),
                Cell::text("ab"),
                Cell::text("fast"),
            ],
            vec![
                Cell::text("gadget"),
                Cell::number(5.0),
                Cell::number(1.0),
                Cell::text("cd"),
                Cell::text("slow"),
            ],
        ])
    }

    #[test]
    fn letter_arithmetic_round_trips() {
        for (index, letter) in [(1, "A"), (26, "Z"), (27, "AA"), (52, "AZ"), (703, "AAA")] {
            assert_eq!(column_letter(index), letter);
            assert_eq!(column_index_from_letter(letter), Some(index));
        }
        assert_eq!(column_index_from_letter("a"), Some(1));
        assert_eq!(column_index_from_letter("A1"), None);
        assert_eq!(column_index_from_letter(""), None);
    }

    #[test]
    fn resolve_priority_index_header_letter() {
        let sheet = sample_sheet();
        assert_eq!(sheet.resolve_column(&ColumnRef::Index(3)).unwrap(), 2);
        assert_eq!(
            sheet.resolve_column(&ColumnRef::Key("Amount".into())).unwrap(),
            1
        );
        // No header named "C": falls back to the letter parse.
        assert_eq!(sheet.resolve_column(&ColumnRef::Key("C".into())).unwrap(), 2);
    }

    #[test]
    fn header_match_beats_letter_parse() {
        let sheet = Sheet::from_rows(vec![
            vec![Cell::text("Id"), Cell::text("B"), Cell::text("Total")],
            vec![Cell::number(1.0), Cell::text("x"), Cell::number(9.0)],
        ]);
        // "B" is a real header at position 1; the letter parse would also
        // say column 2 here, but the header match must be what fires.
        assert_eq!(sheet.resolve_column(&ColumnRef::Key("B".into())).unwrap(), 1);
    }

    #[test]
    fn resolution_errors() {
        let sheet = sample_sheet();
        assert!(matches!(
            sheet.resolve_column(&ColumnRef::Index(0)),
            Err(TabularError::IndexOutOfRange { .. })
        ));
        assert!(matches!(
            sheet.resolve_column(&ColumnRef::Index(9)),
            Err(TabularError::IndexOutOfRange { .. })
        ));
        assert!(matches!(
            sheet.resolve_column(&ColumnRef::Key("Missing Header".into())),
            Err(TabularError::UnknownColumn(_))
        ));
        assert!(matches!(
            sheet.resolve_column(&ColumnRef::Key("ZZ".into())),
            Err(TabularError::LetterOutOfRange { .. })
        ));
    }

    #[test]
    fn header_and_letter_sources_in_one_call_stay_intact() {
        let mut sheet = sample_sheet();
        sheet
            .process_columns(
                vec![
                    ColumnSpec {
                        source: ColumnRef::Key("Amount".into()),
                        rename: None,
                        transform: double(),
                    },
                    ColumnSpec {
                        source: ColumnRef::Key("E".into()),
                        rename: None,
                        transform: reverse(),
                    },
                ],
                &ProcessOptions::default(),
            )
            .unwrap();

        assert_eq!(
            sheet.headers(),
            vec![
                "Name",
                "Amount",
                "Amount_Processed",
                "Qty",
                "Code",
                "Note",
                "Note_Processed",
            ]
        );
        // Source columns untouched.
        assert_eq!(sheet.cell(1, 1).unwrap().value, CellValue::Number(3.0));
        assert_eq!(
            sheet.cell(1, 5).unwrap().value,
            CellValue::Text("fast".into())
        );
        // Processed columns landed right of their sources.
        assert_eq!(sheet.cell(1, 2).unwrap().value, CellValue::Number(6.0));
        assert_eq!(sheet.cell(2, 2).unwrap().value, CellValue::Number(10.0));
        assert_eq!(
            sheet.cell(1, 6).unwrap().value,
            CellValue::Text("tsaf".into())
        );
    }

    #[test]
    fn unresolvable_reference_leaves_sheet_untouched() {
        let mut sheet = sample_sheet();
        let before: Vec<Vec<Cell>> = sheet.rows().to_vec();

        let result = sheet.process_columns(
            vec![
                ColumnSpec {
                    source: ColumnRef::Key("Amount".into()),
                    rename: None,
                    transform: double(),
                },
                ColumnSpec {
                    source: ColumnRef::Key("No Such Column".into()),
                    rename: None,
                    transform: uppercase(),
                },
            ],
            &ProcessOptions::default(),
        );

        assert!(result.is_err());
        assert_eq!(sheet.rows(), &before[..]);
        assert_eq!(sheet.column_count(), 5);
    }

    #[test]
    fn custom_rename_is_used_verbatim() {
        let mut sheet = sample_sheet();
        sheet
            .process_columns(
                vec![ColumnSpec {
                    source: ColumnRef::Index(1),
                    rename: Some("Shouty Name".into()),
                    transform: uppercase(),
                }],
                &ProcessOptions::default(),
            )
            .unwrap();

        assert_eq!(sheet.headers()[1], "Shouty Name");
        assert_eq!(
            sheet.cell(1, 1).unwrap().value,
            CellValue::Text("WIDGET".into())
        );
    }

    #[test]
    fn empty_source_header_falls_back_to_column() {
        let mut sheet = Sheet::from_rows(vec![
            vec![Cell::default(), Cell::text("Other")],
            vec![Cell::text("x"), Cell::text("y")],
        ]);
        sheet
            .process_columns(
                vec![ColumnSpec {
                    source: ColumnRef::Index(1),
                    rename: None,
                    transform: uppercase(),
                }],
                &ProcessOptions::default(),
            )
            .unwrap();
        assert_eq!(sheet.headers()[1], "Column_Processed");
    }

    #[test]
    fn style_is_carried_to_processed_column() {
        let mut rows = sample_sheet().rows.clone();
        rows[1][1].style.bold = true;
        rows[1][1].style.number_format = Some("#,##0.00".into());
        let mut sheet = Sheet::from_rows(rows);

        sheet
            .process_columns(
                vec![ColumnSpec {
                    source: ColumnRef::Key("Amount".into()),
                    rename: None,
                    transform: double(),
                }],
                &ProcessOptions::default(),
            )
            .unwrap();

        let copied = &sheet.cell(1, 2).unwrap().style;
        assert!(copied.bold);
        assert_eq!(copied.number_format.as_deref(), Some("#,##0.00"));
    }

    #[test]
    fn column_width_tracks_longest_rendered_value() {
        let mut sheet = Sheet::from_rows(vec![
            vec![Cell::text("Note")],
            vec![Cell::text("a much longer note value")],
            vec![Cell::text("short")],
        ]);
        sheet
            .process_columns(
                vec![ColumnSpec {
                    source: ColumnRef::Index(1),
                    rename: None,
                    transform: uppercase(),
                }],
                &ProcessOptions::default(),
            )
            .unwrap();

        // "A MUCH LONGER NOTE VALUE" is 24 chars; width = 24 + 2.
        assert_eq!(sheet.column_width(1), Some(26.0));
    }

    #[test]
    fn word_wrap_and_auto_height_estimate_lines() {
        let mut sheet = Sheet::from_rows(vec![
            vec![Cell::text("Note")],
            vec![Cell::text("abcdefghijklmnopqrstuvwxyz abcdefghijklmnopqrstuvwxyz")],
        ]);
        sheet
            .process_columns(
                vec![ColumnSpec {
                    source: ColumnRef::Index(1),
                    rename: None,
                    transform: uppercase(),
                }],
                &ProcessOptions {
                    word_wrap: true,
                    auto_row_height: true,
                },
            )
            .unwrap();

        assert!(sheet.cell(0, 1).unwrap().style.wrap_text);
        assert!(sheet.cell(1, 1).unwrap().style.wrap_text);
        // 53 chars, width 55: one estimated line.
        assert_eq!(sheet.row_height(1), Some(15.0));
        assert_eq!(sheet.row_height(0), None);
    }

    #[test]
    fn process_on_empty_sheet_errors() {
        let mut sheet = Sheet::from_rows(Vec::new());
        let result = sheet.process_columns(
            vec![ColumnSpec {
                source: ColumnRef::Index(1),
                rename: None,
                transform: uppercase(),
            }],
            &ProcessOptions::default(),
        );
        assert!(matches!(result, Err(TabularError::EmptySheet)));
    }
}
