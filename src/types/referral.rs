// src/types/referral.rs
//! Row and referral data structures shared by the whole pipeline

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::sync::Arc;

// ===== Decoded spreadsheet rows =====

/// One scalar cell value as produced by the spreadsheet decoder.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum CellValue {
    Empty,
    Bool(bool),
    Number(f64),
    Text(String),
}

impl CellValue {
    pub fn is_empty(&self) -> bool {
        match self {
            CellValue::Empty => true,
            CellValue::Text(s) => s.trim().is_empty(),
            _ => false,
        }
    }

    /// Text form used when a cell is copied into a referral field.
    ///
    /// Integral numbers drop the fractional part so a job id typed as
    /// `123456` does not come back as `123456.0`.
    pub fn as_text(&self) -> String {
        match self {
            CellValue::Empty => String::new(),
            CellValue::Bool(b) => b.to_string(),
            CellValue::Number(n) if n.fract() == 0.0 && n.abs() < 1e15 => {
                format!("{}", *n as i64)
            }
            CellValue::Number(n) => n.to_string(),
            CellValue::Text(s) => s.clone(),
        }
    }
}

impl From<&str> for CellValue {
    fn from(value: &str) -> Self {
        CellValue::Text(value.to_string())
    }
}

impl From<String> for CellValue {
    fn from(value: String) -> Self {
        CellValue::Text(value)
    }
}

impl From<f64> for CellValue {
    fn from(value: f64) -> Self {
        CellValue::Number(value)
    }
}

/// The columns the referral pipeline knows how to read.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ReferralField {
    CandidateName,
    Position,
    Company,
    JobId,
    JobUrl,
    CustomMessage,
}

impl ReferralField {
    pub const ALL: [ReferralField; 6] = [
        ReferralField::CandidateName,
        ReferralField::Position,
        ReferralField::Company,
        ReferralField::JobId,
        ReferralField::JobUrl,
        ReferralField::CustomMessage,
    ];

    /// Canonical header label, as written in the sample template
    pub fn label(self) -> &'static str {
        match self {
            ReferralField::CandidateName => "candidateName",
            ReferralField::Position => "position",
            ReferralField::Company => "company",
            ReferralField::JobId => "jobID",
            ReferralField::JobUrl => "jobURL",
            ReferralField::CustomMessage => "customMessage",
        }
    }

    /// Match a header label against a field, ignoring case, spaces and punctuation.
    pub fn from_header(header: &str) -> Option<Self> {
        let key = normalize_header(header);
        Self::ALL
            .into_iter()
            .find(|field| normalize_header(field.label()) == key)
    }
}

fn normalize_header(header: &str) -> String {
    header
        .chars()
        .filter(|c| c.is_alphanumeric())
        .flat_map(char::to_lowercase)
        .collect()
}

/// One decoded spreadsheet row: header label -> cell value.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RowRecord {
    cells: BTreeMap<String, CellValue>,
}

impl RowRecord {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style insert, mostly convenient in tests
    pub fn with(mut self, label: &str, value: impl Into<CellValue>) -> Self {
        self.insert(label, value.into());
        self
    }

    pub fn insert(&mut self, label: &str, value: CellValue) {
        self.cells.insert(label.to_string(), value);
    }

    pub fn get(&self, label: &str) -> Option<&CellValue> {
        self.cells.get(label)
    }

    pub fn len(&self) -> usize {
        self.cells.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    pub fn labels(&self) -> impl Iterator<Item = &str> {
        self.cells.keys().map(String::as_str)
    }

    /// Text value of a known field; absent columns read as an empty string.
    ///
    /// An exact label match wins over a normalized one.
    pub fn field(&self, field: ReferralField) -> String {
        if let Some(value) = self.cells.get(field.label()) {
            return value.as_text();
        }

        self.cells
            .iter()
            .find(|(label, _)| ReferralField::from_header(label) == Some(field))
            .map(|(_, value)| value.as_text())
            .unwrap_or_default()
    }
}

// ===== Derived referral records =====

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReferralRecord {
    #[serde(rename = "candidateName")]
    pub candidate_name: String,
    pub position: String,
    pub company: String,
    #[serde(rename = "jobID")]
    pub job_id: String,
    #[serde(rename = "jobURL")]
    pub job_url: String,
    #[serde(rename = "customMessage")]
    pub custom_message: String,
    #[serde(rename = "generatedEmail")]
    pub generated_email: String,
    #[serde(rename = "isValidEmail")]
    pub is_valid_email: bool,
}

impl ReferralRecord {
    /// First whitespace token of the candidate name, case preserved.
    pub fn first_name(&self) -> &str {
        self.candidate_name.split_whitespace().next().unwrap_or("")
    }
}

// ===== Attachment =====

/// The resume sent along with every message of a batch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Attachment {
    pub file_name: String,
    pub content_type: String,
    pub data: Arc<[u8]>,
}

impl Attachment {
    pub fn size(&self) -> usize {
        self.data.len()
    }

    pub fn info(&self) -> AttachmentInfo {
        AttachmentInfo {
            file_name: self.file_name.clone(),
            content_type: self.content_type.clone(),
            size: self.size(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AttachmentInfo {
    pub file_name: String,
    pub content_type: String,
    pub size: usize,
}
