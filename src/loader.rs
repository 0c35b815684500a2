use crate::models::StudentRecord;
use anyhow::{Context, Result};
use calamine::{open_workbook_auto, Data, Reader};
use std::path::Path;

// The grade tracker form's column headers. Exact matches are tried first so
// renamed exports still load as long as the keywords survive.
const NAME_HEADER: &str = "Full Name";
const SCHOOL_HEADER: &str = "School You Attend";
const YEAR_HEADER: &str = "What year are you in";
const CURRENT_HEADER: &str =
    "Please list all the subjects you are currently taking and your current grades";
const PREDICTED_HEADER: &str = "Please list all your predicted grades for each subject";

struct Columns {
    name: usize,
    school: Option<usize>,
    year: Option<usize>,
    current: Option<usize>,
    predicted: Option<usize>,
}

/// Load student rows from a spreadsheet. `.csv` goes through the csv crate,
/// anything else is opened as an Excel workbook.
pub fn load_records(path: &Path, sheet_name: &str) -> Result<Vec<StudentRecord>> {
    let extension = path
        .extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| ext.to_lowercase());

    match extension.as_deref() {
        Some("csv") => load_csv(path),
        _ => load_workbook(path, sheet_name),
    }
}

fn load_workbook(path: &Path, sheet_name: &str) -> Result<Vec<StudentRecord>> {
    let mut workbook = open_workbook_auto(path)
        .with_context(|| format!("Failed to open workbook: {}", path.display()))?;
    let range = workbook
        .worksheet_range(sheet_name)
        .with_context(|| format!("Worksheet '{}' not found in {}", sheet_name, path.display()))?;

    let mut rows = range.rows();
    let headers: Vec<String> = rows
        .next()
        .map(|row| row.iter().map(cell_text).collect())
        .unwrap_or_default();
    let columns = resolve_columns(&headers)?;

    let mut records = Vec::new();
    for row in rows {
        let cells: Vec<String> = row.iter().map(cell_text).collect();
        if let Some(record) = build_record(&cells, &columns) {
            records.push(record);
        }
    }
    Ok(records)
}

fn load_csv(path: &Path) -> Result<Vec<StudentRecord>> {
    let mut reader = csv::Reader::from_path(path)
        .with_context(|| format!("Failed to read file: {}", path.display()))?;
    let headers: Vec<String> = reader
        .headers()?
        .iter()
        .map(|header| header.trim().to_string())
        .collect();
    let columns = resolve_columns(&headers)?;

    let mut records = Vec::new();
    for row in reader.records() {
        let row = row?;
        let cells: Vec<String> = row.iter().map(|cell| cell.to_string()).collect();
        if let Some(record) = build_record(&cells, &columns) {
            records.push(record);
        }
    }
    Ok(records)
}

fn resolve_columns(headers: &[String]) -> Result<Columns> {
    let name = find_column(headers, NAME_HEADER, "name")
        .ok_or_else(|| anyhow::anyhow!("Column '{}' not found in input", NAME_HEADER))?;

    Ok(Columns {
        name,
        school: find_column(headers, SCHOOL_HEADER, "school"),
        year: find_column(headers, YEAR_HEADER, "year"),
        current: find_column(headers, CURRENT_HEADER, "current grades"),
        predicted: find_column(headers, PREDICTED_HEADER, "predicted grades"),
    })
}

fn find_column(headers: &[String], exact: &str, keyword: &str) -> Option<usize> {
    headers
        .iter()
        .position(|header| header.trim().eq_ignore_ascii_case(exact))
        .or_else(|| {
            headers
                .iter()
                .position(|header| header.to_lowercase().contains(keyword))
        })
}

/// Rows without a student name are skipped; missing school/year fall back
/// to "Unknown" and missing grade cells to the empty string.
fn build_record(cells: &[String], columns: &Columns) -> Option<StudentRecord> {
    let name = cells.get(columns.name)?.trim().to_string();
    if name.is_empty() || name.eq_ignore_ascii_case("nan") {
        return None;
    }

    let fetch = |column: Option<usize>| {
        column
            .and_then(|index| cells.get(index))
            .map(|cell| cell.trim().to_string())
            .unwrap_or_default()
    };
    let or_unknown = |value: String| {
        if value.is_empty() {
            "Unknown".to_string()
        } else {
            value
        }
    };

    Some(StudentRecord {
        name,
        school: or_unknown(fetch(columns.school)),
        year: or_unknown(fetch(columns.year)),
        raw_current: fetch(columns.current),
        raw_predicted: fetch(columns.predicted),
    })
}

fn cell_text(cell: &Data) -> String {
    match cell {
        Data::Empty => String::new(),
        Data::String(text) => text.trim().to_string(),
        Data::Float(value) => {
            if value.fract() == 0.0 {
                format!("{}", *value as i64)
            } else {
                value.to_string()
            }
        }
        Data::Int(value) => value.to_string(),
        Data::Bool(value) => value.to_string(),
        other => other.to_string().trim().to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    #[test]
    fn test_load_csv_with_form_headers() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("grades.csv");
        let content = format!(
            "{},{},{},{},{}\n\
             Alice,Town Grammar,Year 11,Maths - 7,Maths - 8\n\
             ,Ignored School,Year 11,Maths - 7,Maths - 8\n\
             Bob,,,Biology: 6,\n",
            NAME_HEADER, SCHOOL_HEADER, YEAR_HEADER, "Current grades", "Predicted grades"
        );
        fs::write(&path, content).unwrap();

        let records = load_records(&path, "Sheet1").unwrap();
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].name, "Alice");
        assert_eq!(records[0].school, "Town Grammar");
        assert_eq!(records[0].raw_current, "Maths - 7");
        assert_eq!(records[0].raw_predicted, "Maths - 8");
        assert_eq!(records[1].name, "Bob");
        assert_eq!(records[1].school, "Unknown");
        assert_eq!(records[1].year, "Unknown");
        assert_eq!(records[1].raw_current, "Biology: 6");
        assert_eq!(records[1].raw_predicted, "");
    }

    #[test]
    fn test_load_csv_missing_name_column() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("grades.csv");
        fs::write(&path, "School,Year\nTown Grammar,Year 11\n").unwrap();

        let result = load_records(&path, "Sheet1");
        assert!(result.is_err());
    }

    #[test]
    fn test_load_xlsx_round_trip() {
        use rust_xlsxwriter::Workbook;

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("grades.xlsx");

        let mut workbook = Workbook::new();
        let sheet = workbook.add_worksheet();
        sheet.set_name("Sheet1").unwrap();
        let headers = [
            NAME_HEADER,
            SCHOOL_HEADER,
            YEAR_HEADER,
            CURRENT_HEADER,
            PREDICTED_HEADER,
        ];
        for (col, header) in headers.iter().enumerate() {
            sheet.write_string(0, col as u16, *header).unwrap();
        }
        sheet.write_string(1, 0, "Alice").unwrap();
        sheet.write_string(1, 1, "Town Grammar").unwrap();
        sheet.write_string(1, 2, "Year 11").unwrap();
        sheet.write_string(1, 3, "Sociology - C").unwrap();
        sheet.write_string(1, 4, "Sociology - A").unwrap();
        workbook.save(&path).unwrap();

        let records = load_records(&path, "Sheet1").unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].name, "Alice");
        assert_eq!(records[0].raw_current, "Sociology - C");
        assert_eq!(records[0].raw_predicted, "Sociology - A");
    }
}
