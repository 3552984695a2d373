// src/core/sample.rs
//! Downloadable example spreadsheet with the expected column layout

use anyhow::{Context, Result};
use rust_xlsxwriter::{Format, Workbook, XlsxError};
use std::path::{Path, PathBuf};
use tracing::info;

use crate::types::ReferralField;

pub const SAMPLE_FILE_NAME: &str = "referral_template.xlsx";
pub const SAMPLE_SHEET_NAME: &str = "Sheet1";

/// The single example row, in `ReferralField::ALL` order
pub const SAMPLE_ROW: [&str; 6] = [
    "John Smith",
    "Software Engineer",
    "Tech Corp",
    "JD123456",
    "https://company.com/jobs/123456",
    "I have 5 years of experience in similar roles.",
];

/// Build the template workbook in memory.
pub fn sample_template_bytes() -> Result<Vec<u8>, XlsxError> {
    let mut workbook = Workbook::new();
    let worksheet = workbook.add_worksheet();
    worksheet.set_name(SAMPLE_SHEET_NAME)?;

    let header_format = Format::new().set_bold();

    for (col, (field, example)) in ReferralField::ALL.iter().zip(SAMPLE_ROW).enumerate() {
        let col = col as u16;
        worksheet.write_with_format(0, col, field.label(), &header_format)?;
        worksheet.write(1, col, example)?;

        let width = field.label().len().max(example.len()) as f64 + 2.0;
        worksheet.set_column_width(col, width)?;
    }

    workbook.save_to_buffer()
}

/// Write `referral_template.xlsx` into `dir`, returning the file path.
pub async fn write_sample_template(dir: &Path) -> Result<PathBuf> {
    tokio::fs::create_dir_all(dir)
        .await
        .with_context(|| format!("Failed to create directory: {}", dir.display()))?;

    let bytes = sample_template_bytes().context("Failed to build sample template")?;
    let path = dir.join(SAMPLE_FILE_NAME);

    tokio::fs::write(&path, bytes)
        .await
        .with_context(|| format!("Failed to write file: {}", path.display()))?;

    info!("Sample template written to {}", path.display());
    Ok(path)
}
