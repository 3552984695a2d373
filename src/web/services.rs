// src/web/services.rs
use rocket::fs::TempFile;
use std::path::PathBuf;
use tracing::{info, warn};

use crate::core::DispatchRun;
use crate::utils::base_file_name;
use crate::web::types::{SharedEndpoint, SharedSession};

/// Drive a confirmed batch to the end, one send at a time.
///
/// The session lock is taken only to fold each step in, never across a send,
/// so the presentation can poll progress while the batch runs.
pub async fn drive_dispatch(mut run: DispatchRun, session: SharedSession, endpoint: SharedEndpoint) {
    while let Some(step) = run.next(endpoint.as_ref()).await {
        session.lock().await.apply_step(step);
    }

    let phase = session.lock().await.phase();
    info!(
        "Dispatch finished in phase {} ({}/{} sent)",
        phase,
        run.completed(),
        run.total()
    );
}

/// Client-side file name of an upload, directory parts removed
pub fn upload_file_name(file: &TempFile<'_>) -> Option<String> {
    file.raw_name()
        .map(|name| name.dangerous_unsafe_unsanitized_raw().as_str())
        .map(base_file_name)
        .filter(|name| !name.is_empty())
}

/// Read an uploaded file fully into memory
pub async fn read_upload(file: &mut TempFile<'_>) -> anyhow::Result<Vec<u8>> {
    let temp_path: PathBuf = std::env::temp_dir().join(format!("referral_upload_{}", uuid::Uuid::new_v4()));

    file.persist_to(&temp_path).await?;
    let bytes = tokio::fs::read(&temp_path).await;

    if let Err(e) = tokio::fs::remove_file(&temp_path).await {
        warn!("Failed to remove temporary upload {}: {}", temp_path.display(), e);
    }

    Ok(bytes?)
}
