// src/web/handlers/referral_handlers.rs
//! Session handlers: upload, attachment, review, send, cancel, reset

use rocket::form::Form;
use rocket::http::Status;
use rocket::response::status::Custom;
use rocket::serde::json::Json;
use rocket::State;
use tracing::{error, info, warn};

use crate::core::sample::{sample_template_bytes, SAMPLE_FILE_NAME};
use crate::core::SessionSnapshot;
use crate::error::{PreconditionError, SessionError};
use crate::utils::build_attachment;
use crate::web::services::{drive_dispatch, read_upload, upload_file_name};
use crate::web::types::*;

fn session_error(e: SessionError) -> ApiError {
    let (status, code, suggestions): (Status, &str, Vec<&str>) = match &e {
        SessionError::InvalidTransition { .. } => (
            Status::Conflict,
            "INVALID_STATE",
            vec!["Reset the session to start a new batch"],
        ),
        SessionError::Precondition(PreconditionError::MissingAttachment) => (
            Status::Conflict,
            "MISSING_ATTACHMENT",
            vec!["Upload your resume (.pdf, .doc or .docx) first"],
        ),
        SessionError::Precondition(PreconditionError::NoValidRecords)
        | SessionError::Precondition(PreconditionError::InvalidRecordsPresent) => (
            Status::Conflict,
            "INVALID_RECORDS",
            vec!["Ensure candidate names are in \"First Last\" format"],
        ),
        SessionError::Precondition(PreconditionError::AlreadySending) => (
            Status::Conflict,
            "ALREADY_SENDING",
            vec!["Wait for the current batch to finish"],
        ),
        SessionError::Precondition(PreconditionError::NotAwaitingConfirmation) => (
            Status::Conflict,
            "NOTHING_TO_SEND",
            vec!["Upload a referral spreadsheet first"],
        ),
        SessionError::Ingestion(_) => (
            Status::UnprocessableEntity,
            "INGESTION_ERROR",
            vec![
                "Upload an .xlsx or .xls file",
                "Download the sample template for the expected columns",
            ],
        ),
        SessionError::Attachment(_) => (
            Status::UnprocessableEntity,
            "INVALID_ATTACHMENT",
            vec!["Upload a PDF or Word document (.pdf, .doc, .docx)"],
        ),
    };

    StandardErrorResponse::new(
        e.to_string(),
        code,
        suggestions.into_iter().map(String::from).collect(),
    )
    .with_status(status)
}

fn upload_error(message: &str) -> ApiError {
    StandardErrorResponse::new(
        message.to_string(),
        "FILE_SAVE_ERROR",
        vec!["Try uploading the file again".to_string()],
    )
    .with_status(Status::InternalServerError)
}

pub async fn get_session_handler(
    session: &State<SharedSession>,
) -> Json<DataResponse<SessionSnapshot>> {
    let snapshot = session.lock().await.snapshot();
    Json(DataResponse::success(
        format!("Session is {}", snapshot.phase),
        snapshot,
    ))
}

pub async fn upload_spreadsheet_handler(
    mut upload: Form<UploadForm<'_>>,
    session: &State<SharedSession>,
) -> Result<Json<ActionResponse<SessionSnapshot>>, ApiError> {
    let file_name = upload_file_name(&upload.file);
    info!(
        "Spreadsheet upload: {} ({} bytes)",
        file_name.as_deref().unwrap_or("<unnamed>"),
        upload.file.len()
    );

    let bytes = read_upload(&mut upload.file).await.map_err(|e| {
        error!("Failed to read uploaded spreadsheet: {}", e);
        upload_error("Failed to process uploaded spreadsheet")
    })?;

    let mut controller = session.lock().await;
    let records = controller
        .load_spreadsheet(file_name.as_deref(), &bytes)
        .map_err(session_error)?;

    let invalid = records.iter().filter(|r| !r.is_valid_email).count();
    let mut next_actions = vec!["Review the generated email addresses".to_string()];
    if invalid > 0 {
        next_actions.push(
            "Some email addresses could not be generated due to invalid name formats. \
             Please ensure all names are in \"First Last\" format."
                .to_string(),
        );
    }
    next_actions.push("Confirm to send, or cancel".to_string());

    let message = format!("{} referral rows loaded", records.len());
    Ok(Json(
        ActionResponse::success(message, "review", controller.snapshot())
            .with_next_actions(next_actions),
    ))
}

pub async fn upload_attachment_handler(
    mut upload: Form<UploadForm<'_>>,
    session: &State<SharedSession>,
) -> Result<Json<ActionResponse<SessionSnapshot>>, ApiError> {
    let file_name = upload_file_name(&upload.file).unwrap_or_else(|| "resume".to_string());

    let bytes = read_upload(&mut upload.file).await.map_err(|e| {
        error!("Failed to read uploaded attachment: {}", e);
        upload_error("Failed to process uploaded resume")
    })?;

    let attachment = build_attachment(&file_name, bytes)
        .map_err(|e| session_error(SessionError::Attachment(e)))?;

    let mut controller = session.lock().await;
    controller
        .set_attachment(attachment)
        .map_err(session_error)?;

    Ok(Json(ActionResponse::success(
        format!("Resume uploaded: {}", file_name),
        "attached",
        controller.snapshot(),
    )))
}

pub async fn send_handler(
    session: &State<SharedSession>,
    endpoint: &State<SharedEndpoint>,
) -> Result<Custom<Json<ActionResponse<SessionSnapshot>>>, ApiError> {
    let (run, snapshot) = {
        let mut controller = session.lock().await;
        let run = controller.begin_send().map_err(|e| {
            warn!("Send refused: {}", e);
            session_error(e)
        })?;
        (run, controller.snapshot())
    };

    let total = run.total();
    tokio::spawn(drive_dispatch(
        run,
        session.inner().clone(),
        endpoint.inner().clone(),
    ));

    Ok(Custom(
        Status::Accepted,
        Json(
            ActionResponse::success(
                format!("Sending {} emails", total),
                "sending",
                snapshot,
            )
            .with_next_actions(vec!["Poll the session for progress".to_string()]),
        ),
    ))
}

pub async fn cancel_handler(
    session: &State<SharedSession>,
) -> Result<Json<ActionResponse<SessionSnapshot>>, ApiError> {
    let mut controller = session.lock().await;
    controller.cancel().map_err(session_error)?;

    Ok(Json(ActionResponse::success(
        "Review cancelled".to_string(),
        "cancelled",
        controller.snapshot(),
    )))
}

pub async fn reset_handler(
    session: &State<SharedSession>,
) -> Result<Json<ActionResponse<SessionSnapshot>>, ApiError> {
    let mut controller = session.lock().await;
    controller.reset().map_err(session_error)?;

    Ok(Json(
        ActionResponse::success("Session reset".to_string(), "reset", controller.snapshot())
            .with_next_actions(vec!["Process another batch".to_string()]),
    ))
}

pub async fn download_template_handler() -> Result<XlsxResponse, ApiError> {
    match sample_template_bytes() {
        Ok(bytes) => Ok(XlsxResponse::new(bytes, SAMPLE_FILE_NAME)),
        Err(e) => {
            error!("Failed to build sample template: {}", e);
            Err(StandardErrorResponse::new(
                "Failed to build sample template".to_string(),
                "TEMPLATE_ERROR",
                vec!["Try again in a few moments".to_string()],
            )
            .with_status(Status::InternalServerError))
        }
    }
}
