use rust_xlsxwriter::Workbook;
use std::path::Path;
use tracing::info;

use crate::errors::ExportError;
use crate::report::ReportTable;
use crate::types::{Cell, FileType};

/// Excel limits worksheet names to 31 characters.
const MAX_SHEET_NAME: usize = 31;
const DEFAULT_SHEET_NAME: &str = "namespaceReport";

/// Writes the report to `path` in the requested format. The file is closed
/// before this returns.
pub fn write_report(
    table: &ReportTable,
    path: &Path,
    file_type: FileType,
) -> Result<(), ExportError> {
    info!("Saving file {}", path.display());
    match file_type {
        FileType::Csv => write_csv(table, path),
        FileType::Xlsx => write_xlsx(table, path),
    }
}

pub fn write_csv(table: &ReportTable, path: &Path) -> Result<(), ExportError> {
    let mut writer = csv::Writer::from_path(path)?;
    writer.write_record(&table.headers)?;
    for row in &table.rows {
        writer.write_record(row.iter().map(Cell::to_field))?;
    }
    writer.flush()?;
    Ok(())
}

pub fn write_xlsx(table: &ReportTable, path: &Path) -> Result<(), ExportError> {
    let mut workbook = Workbook::new();
    let worksheet = workbook.add_worksheet();
    worksheet.set_name(sheet_name(path))?;

    for (col, header) in table.headers.iter().enumerate() {
        worksheet.write_string(0, col as u16, header)?;
    }
    for (r, row) in table.rows.iter().enumerate() {
        let row_idx = (r + 1) as u32;
        for (col, cell) in row.iter().enumerate() {
            match cell {
                Cell::Text(s) => {
                    worksheet.write_string(row_idx, col as u16, s)?;
                }
                Cell::Number(v) => {
                    worksheet.write_number(row_idx, col as u16, *v)?;
                }
                Cell::Empty => {}
            }
        }
    }

    workbook.save(path)?;
    Ok(())
}

/// Worksheet name derived from the file stem.
pub fn sheet_name(path: &Path) -> String {
    let stem = path.file_stem().and_then(|s| s.to_str()).unwrap_or_default();
    // Characters Excel rejects in sheet names
    let cleaned: String = stem
        .chars()
        .filter(|c| !matches!(c, '[' | ']' | ':' | '*' | '?' | '/' | '\\'))
        .collect();
    // Names may not start or end with an apostrophe
    let name: String = cleaned.trim_matches('\'').chars().take(MAX_SHEET_NAME).collect();
    let name = name.trim_end_matches('\'');
    if name.is_empty() {
        DEFAULT_SHEET_NAME.to_string()
    } else {
        name.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sheet_name() {
        assert_eq!(
            sheet_name(Path::new("/tmp/namespaceReport_2024-03-01.xlsx")),
            "namespaceReport_2024-03-01"
        );
        assert_eq!(sheet_name(Path::new("/tmp/a:b*c.xlsx")), "abc");
        assert_eq!(sheet_name(Path::new("/tmp/.xlsx")), ".xlsx");
        assert_eq!(sheet_name(Path::new("/tmp/")), "tmp");
        assert_eq!(
            sheet_name(Path::new("a_very_long_report_name_that_exceeds_the_limit.xlsx")).len(),
            31
        );
    }

    #[test]
    fn test_sheet_name_never_blank_or_quoted() {
        assert_eq!(sheet_name(Path::new("/tmp/***.xlsx")), "namespaceReport");
        assert_eq!(sheet_name(Path::new("/tmp/'quoted'.xlsx")), "quoted");
        assert_eq!(sheet_name(Path::new("/tmp/''.xlsx")), "namespaceReport");
        assert_eq!(sheet_name(Path::new("/tmp/report_2024-03-01_'x'.xlsx")), "report_2024-03-01_'x");
    }

    #[test]
    fn test_csv_write_failure_is_reported() {
        let table = ReportTable {
            headers: vec!["Namespace".to_string()],
            rows: Vec::new(),
        };
        let result = write_csv(&table, Path::new("/nonexistent-dir/for/report.csv"));
        assert!(result.is_err());
    }

    #[test]
    fn test_xlsx_write_with_unusable_stem() {
        let dir = tempfile::tempdir().unwrap();
        let table = ReportTable {
            headers: vec!["Namespace".to_string(), "VCPU Average (Mhz)".to_string()],
            rows: vec![vec![Cell::text(Some("payments")), Cell::number(Some(125.0))]],
        };
        for name in ["***.xlsx", "'quoted'.xlsx"] {
            let path = dir.path().join(name);
            write_xlsx(&table, &path).unwrap();
            assert!(path.exists());
        }
    }
}
