// src/error.rs
//! Error taxonomy for the referral pipeline.
//!
//! Every variant here is caught by the component that detects it and turned
//! into session state; the HTTP layer and the CLI only ever see them through
//! `SessionController` results or `anyhow` context.

use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum IngestionError {
    #[error("Unsupported spreadsheet file: {0}. Use an .xlsx or .xls file")]
    UnsupportedFile(String),

    #[error("File could not be read as a spreadsheet: {0}")]
    Unreadable(String),

    #[error("Spreadsheet contains no sheets")]
    NoSheets,

    #[error("First sheet '{0}' contains no data rows")]
    NoRows(String),
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PreconditionError {
    #[error("Please upload your resume first")]
    MissingAttachment,

    #[error("No valid email addresses to send to")]
    NoValidRecords,

    #[error("Some email addresses could not be generated due to invalid name formats")]
    InvalidRecordsPresent,

    #[error("Emails are already being sent")]
    AlreadySending,

    #[error("There is no confirmed batch awaiting dispatch")]
    NotAwaitingConfirmation,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DispatchError {
    #[error("Mail service request failed: {0}")]
    Transport(String),

    #[error("Mail service returned status {status}: {message}")]
    Rejected { status: u16, message: String },

    #[error("Could not build mail request: {0}")]
    Request(String),
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AttachmentError {
    #[error("Unsupported attachment: {0}. Allowed: .pdf, .doc, .docx")]
    UnsupportedFile(String),

    #[error("Attachment {0} is empty")]
    Empty(String),
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TemplateError {
    #[error("Unknown placeholder in message template: {{{{{0}}}}}")]
    UnknownPlaceholder(String),

    #[error("Unclosed placeholder in message template near: {0}")]
    Unclosed(String),

    #[error("Failed to read message template {path}: {message}")]
    Unreadable { path: String, message: String },
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SessionError {
    #[error("Cannot {action} while session is {phase}")]
    InvalidTransition {
        action: &'static str,
        phase: &'static str,
    },

    #[error(transparent)]
    Precondition(#[from] PreconditionError),

    #[error(transparent)]
    Ingestion(#[from] IngestionError),

    #[error(transparent)]
    Attachment(#[from] AttachmentError),
}
