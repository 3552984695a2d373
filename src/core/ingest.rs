// src/core/ingest.rs
//! Spreadsheet decoding - first sheet, header row as column labels

use calamine::{open_workbook_auto_from_rs, Data, Reader};
use std::io::Cursor;
use tracing::{debug, info, warn};

use crate::error::IngestionError;
use crate::types::{CellValue, RowRecord};
use crate::utils::get_file_extension;

pub const SPREADSHEET_EXTENSIONS: [&str; 2] = ["xlsx", "xls"];

/// Reject file names that do not look like a spreadsheet.
pub fn check_spreadsheet_name(file_name: &str) -> Result<(), IngestionError> {
    match get_file_extension(file_name) {
        Some(ext) if SPREADSHEET_EXTENSIONS.contains(&ext.as_str()) => Ok(()),
        _ => Err(IngestionError::UnsupportedFile(file_name.to_string())),
    }
}

/// Decode the first sheet of an `.xlsx`/`.xls` payload into row records.
pub fn read_rows(bytes: &[u8]) -> Result<Vec<RowRecord>, IngestionError> {
    let mut workbook = open_workbook_auto_from_rs(Cursor::new(bytes.to_vec()))
        .map_err(|e| IngestionError::Unreadable(e.to_string()))?;

    let sheet_name = workbook
        .sheet_names()
        .first()
        .cloned()
        .ok_or(IngestionError::NoSheets)?;

    let range = workbook
        .worksheet_range(&sheet_name)
        .map_err(|e| IngestionError::Unreadable(e.to_string()))?;

    let mut rows = range.rows();
    let headers: Vec<Option<String>> = match rows.next() {
        Some(header_row) => header_row.iter().map(header_label).collect(),
        None => return Err(IngestionError::NoRows(sheet_name)),
    };

    let mut records = Vec::new();
    for (index, row) in rows.enumerate() {
        let mut record = RowRecord::new();

        for (label, cell) in headers.iter().zip(row.iter()) {
            let Some(label) = label else { continue };
            let value = cell_value(cell);
            if value.is_empty() || record.get(label).is_some() {
                continue;
            }
            record.insert(label, value);
        }

        if record.is_empty() {
            debug!("Skipping blank row {} in sheet {}", index + 2, sheet_name);
            continue;
        }
        records.push(record);
    }

    if records.is_empty() {
        warn!("Sheet {} has a header but no data rows", sheet_name);
        return Err(IngestionError::NoRows(sheet_name));
    }

    info!("Decoded {} rows from sheet {}", records.len(), sheet_name);
    Ok(records)
}

/// Decode a named upload, checking the extension first.
pub fn read_named(file_name: &str, bytes: &[u8]) -> Result<Vec<RowRecord>, IngestionError> {
    check_spreadsheet_name(file_name)?;
    read_rows(bytes)
}

fn header_label(cell: &Data) -> Option<String> {
    let label = cell_value(cell).as_text().trim().to_string();
    (!label.is_empty()).then_some(label)
}

fn cell_value(cell: &Data) -> CellValue {
    match cell {
        Data::Empty => CellValue::Empty,
        Data::String(s) => CellValue::Text(s.clone()),
        Data::Int(i) => CellValue::Number(*i as f64),
        Data::Float(f) => CellValue::Number(*f),
        Data::Bool(b) => CellValue::Bool(*b),
        Data::DateTime(dt) => CellValue::Number(dt.as_f64()),
        Data::DateTimeIso(s) | Data::DurationIso(s) => CellValue::Text(s.clone()),
        Data::Error(e) => CellValue::Text(format!("{:?}", e)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_check_spreadsheet_name() {
        assert!(check_spreadsheet_name("referrals.xlsx").is_ok());
        assert!(check_spreadsheet_name("REFERRALS.XLS").is_ok());
        assert_eq!(
            check_spreadsheet_name("referrals.csv"),
            Err(IngestionError::UnsupportedFile("referrals.csv".to_string()))
        );
        assert!(check_spreadsheet_name("referrals").is_err());
    }

    #[test]
    fn test_garbage_is_unreadable() {
        let result = read_rows(b"definitely not a workbook");
        assert!(matches!(result, Err(IngestionError::Unreadable(_))));
    }

    #[test]
    fn test_empty_payload_is_unreadable() {
        assert!(read_rows(&[]).is_err());
    }
}
