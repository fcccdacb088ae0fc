//! Tabular post-processing: insert transformed copies of source columns
//! into a sheet, carrying formatting over.
//!
//! The two contracts that matter here: column references resolve with
//! priority exact index > exact header match > letter parse, and processed
//! columns are inserted in descending source order so earlier insertions
//! never invalidate later references still pending resolution.

pub mod io;
pub mod sheet;

pub use io::{
    sheet_from_csv_path, sheet_from_csv_reader, sheet_from_workbook_path, sheet_to_csv_path,
    sheet_to_csv_writer,
};
pub use sheet::{
    column_index_from_letter, column_letter, Cell, CellStyle, CellValue, ColumnRef, ColumnSpec,
    ProcessOptions, Sheet, TabularError, Transform,
};

/// Upper-case text values; everything else passes through.
pub fn uppercase(value: &CellValue) -> CellValue {
    match value {
        CellValue::Text(s) => CellValue::Text(s.to_uppercase()),
        other => other.clone(),
    }
}

/// Double numeric values; everything else passes through.
pub fn double(value: &CellValue) -> CellValue {
    match value {
        CellValue::Number(n) => CellValue::Number(n * 2.0),
        other => other.clone(),
    }
}

/// Reverse text values; everything else passes through.
pub fn reverse(value: &CellValue) -> CellValue {
    match value {
        CellValue::Text(s) => CellValue::Text(s.chars().rev().collect()),
        other => other.clone(),
    }
}

/// Look up a builtin transform by its CLI name.
pub fn builtin_transform(name: &str) -> Option<Transform> {
    match name {
        "uppercase" => Some(Box::new(uppercase)),
        "double" => Some(Box::new(double)),
        "reverse" => Some(Box::new(reverse)),
        _ => None,
    }
}

// ── CLI handler ──

fn load_sheet(path: &std::path::Path) -> anyhow::Result<Sheet> {
    let extension = path
        .extension()
        .and_then(|e| e.to_str())
        .map(str::to_ascii_lowercase)
        .unwrap_or_default();
    match extension.as_str() {
        "csv" => sheet_from_csv_path(path),
        "xlsx" | "xls" | "ods" => sheet_from_workbook_path(path),
        other => anyhow::bail!(
            "Unsupported input format: {other:?}. Expected .csv, .xlsx, .xls, or .ods."
        ),
    }
}

/// Handle `deskbot sheet <subcommand>` CLI commands.
pub fn handle_sheet_command(command: crate::SheetCommands) -> anyhow::Result<()> {
    match command {
        crate::SheetCommands::Process {
            input,
            output,
            columns,
            transforms,
            renames,
            word_wrap,
            auto_row_height,
        } => {
            if transforms.len() != 1 && transforms.len() != columns.len() {
                anyhow::bail!(
                    "Provide one --transform per --column, or a single --transform for all columns"
                );
            }

            let mut specs = Vec::with_capacity(columns.len());
            for (i, column) in columns.iter().enumerate() {
                let name = if transforms.len() == 1 {
                    &transforms[0]
                } else {
                    &transforms[i]
                };
                let Some(transform) = builtin_transform(name) else {
                    anyhow::bail!(
                        "Unknown transform: {name}. Expected uppercase, double, or reverse."
                    );
                };
                specs.push(ColumnSpec {
                    source: ColumnRef::parse(column),
                    rename: renames.get(i).cloned(),
                    transform,
                });
            }

            let mut sheet = load_sheet(&input)?;
            sheet.process_columns(
                specs,
                &ProcessOptions {
                    word_wrap,
                    auto_row_height,
                },
            )?;
            sheet_to_csv_path(&sheet, &output)?;
            println!("Processing complete. Output saved as {}", output.display());
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn uppercase_only_touches_text() {
        assert_eq!(
            uppercase(&CellValue::Text("abc".into())),
            CellValue::Text("ABC".into())
        );
        assert_eq!(uppercase(&CellValue::Number(2.0)), CellValue::Number(2.0));
        assert_eq!(uppercase(&CellValue::Empty), CellValue::Empty);
    }

    #[test]
    fn double_only_touches_numbers() {
        assert_eq!(double(&CellValue::Number(3.5)), CellValue::Number(7.0));
        assert_eq!(
            double(&CellValue::Text("3".into())),
            CellValue::Text("3".into())
        );
    }

    #[test]
    fn reverse_handles_multibyte_text() {
        assert_eq!(
            reverse(&CellValue::Text("héllo".into())),
            CellValue::Text("olléh".into())
        );
    }

    #[test]
    fn builtin_transform_lookup() {
        assert!(builtin_transform("uppercase").is_some());
        assert!(builtin_transform("double").is_some());
        assert!(builtin_transform("reverse").is_some());
        assert!(builtin_transform("sqrt").is_none());
    }
}
