//! Sheet ingestion and export: CSV both ways, XLSX read-only.

use anyhow::{Context, Result};
use calamine::{open_workbook_auto, Data, Reader};
use std::io::{Read, Write};
use std::path::Path;

use super::sheet::{Cell, CellValue, Sheet};

/// Parse one CSV field: empty → Empty, numeric → Number, otherwise Text.
fn parse_field(field: &str) -> CellValue {
    if field.is_empty() {
        return CellValue::Empty;
    }
    match field.parse::<f64>() {
        Ok(n) => CellValue::Number(n),
        Err(_) => CellValue::Text(field.to_string()),
    }
}

/// Read a sheet from CSV. The first record is taken as the header row.
pub fn sheet_from_csv_reader<R: Read>(reader: R) -> Result<Sheet> {
    let mut csv_reader = csv::ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .from_reader(reader);

    let mut rows = Vec::new();
    for record in csv_reader.records() {
        let record = record.context("Failed to read CSV record")?;
        rows.push(
            record
                .iter()
                .map(|field| Cell {
                    value: parse_field(field),
                    ..Cell::default()
                })
                .collect(),
        );
    }
    Ok(Sheet::from_rows(rows))
}

pub fn sheet_from_csv_path(path: &Path) -> Result<Sheet> {
    let file = std::fs::File::open(path)
        .with_context(|| format!("Failed to open input file: {}", path.display()))?;
    sheet_from_csv_reader(file)
}

/// Write a sheet's rendered values as CSV. Styles, widths, and heights are
/// not representable in CSV and are dropped on export.
pub fn sheet_to_csv_writer<W: Write>(sheet: &Sheet, writer: W) -> Result<()> {
    let mut csv_writer = csv::Writer::from_writer(writer);
    for row in sheet.rows() {
        let record: Vec<String> = row.iter().map(|cell| cell.value.to_display()).collect();
        csv_writer
            .write_record(&record)
            .context("Failed to write CSV record")?;
    }
    csv_writer.flush().context("Failed to flush CSV output")?;
    Ok(())
}

pub fn sheet_to_csv_path(sheet: &Sheet, path: &Path) -> Result<()> {
    let file = std::fs::File::create(path)
        .with_context(|| format!("Failed to create output file: {}", path.display()))?;
    sheet_to_csv_writer(sheet, file)
}

fn convert_xlsx_cell(data: &Data) -> CellValue {
    match data {
        Data::Empty => CellValue::Empty,
        Data::String(s) => CellValue::Text(s.clone()),
        Data::Float(f) => CellValue::Number(*f),
        Data::Int(i) => CellValue::Number(*i as f64),
        Data::Bool(b) => CellValue::Text(b.to_string()),
        Data::DateTime(dt) => CellValue::Number(dt.as_f64()),
        Data::DateTimeIso(s) | Data::DurationIso(s) => CellValue::Text(s.clone()),
        Data::Error(e) => CellValue::Text(format!("#ERR:{e:?}")),
    }
}

/// Read the first worksheet of an XLSX/XLS/ODS file. Cell values only;
/// styles are not read and default.
pub fn sheet_from_workbook_path(path: &Path) -> Result<Sheet> {
    let mut workbook = open_workbook_auto(path)
        .with_context(|| format!("Failed to open workbook: {}", path.display()))?;
    let range = workbook
        .worksheet_range_at(0)
        .context("Workbook has no worksheets")?
        .context("Failed to read first worksheet")?;

    let rows = range
        .rows()
        .map(|row| {
            row.iter()
                .map(|data| Cell {
                    value: convert_xlsx_cell(data),
                    ..Cell::default()
                })
                .collect()
        })
        .collect();
    Ok(Sheet::from_rows(rows))
}
