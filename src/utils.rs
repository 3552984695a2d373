// src/utils.rs
use anyhow::{Context, Result};
use std::path::Path;
use std::sync::Arc;

use crate::error::AttachmentError;
use crate::types::Attachment;

/// Get file extension in lowercase
pub fn get_file_extension(filename: &str) -> Option<String> {
    Path::new(filename)
        .extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| ext.to_lowercase())
}

/// Strip any directory part a browser may send along with an upload name
pub fn base_file_name(name: &str) -> String {
    name.rsplit(['/', '\\'])
        .next()
        .filter(|n| !n.is_empty())
        .unwrap_or(name)
        .to_string()
}

/// Content type for an attachment, by extension
pub fn attachment_content_type(filename: &str) -> Option<&'static str> {
    match get_file_extension(filename)?.as_str() {
        "pdf" => Some("application/pdf"),
        "doc" => Some("application/msword"),
        "docx" => Some("application/vnd.openxmlformats-officedocument.wordprocessingml.document"),
        _ => None,
    }
}

/// Wrap uploaded resume bytes, checking the extension and that there is content
pub fn build_attachment(file_name: &str, data: Vec<u8>) -> Result<Attachment, AttachmentError> {
    let file_name = base_file_name(file_name);
    let content_type = attachment_content_type(&file_name)
        .ok_or_else(|| AttachmentError::UnsupportedFile(file_name.clone()))?;

    if data.is_empty() {
        return Err(AttachmentError::Empty(file_name));
    }

    Ok(Attachment {
        file_name,
        content_type: content_type.to_string(),
        data: Arc::from(data),
    })
}

/// Read an attachment from disk
pub async fn read_attachment(path: &Path) -> Result<Attachment> {
    let data = tokio::fs::read(path)
        .await
        .with_context(|| format!("Failed to read file: {}", path.display()))?;

    let file_name = path
        .file_name()
        .and_then(|n| n.to_str())
        .ok_or_else(|| anyhow::anyhow!("Invalid attachment path: {}", path.display()))?;

    Ok(build_attachment(file_name, data)?)
}
