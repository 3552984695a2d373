// src/web/mod.rs

pub mod handlers;
pub mod services;
pub mod types;

pub use handlers::*;
pub use types::*;

use anyhow::{Context, Result};
use rocket::data::{Limits, ToByteUnit};
use rocket::fairing::{Fairing, Info, Kind};
use rocket::form::Form;
use rocket::http::{Header, Status};
use rocket::response::status::Custom;
use rocket::serde::json::Json;
use rocket::{catchers, get, options, post, routes, Build, Request, Response, Rocket, State};
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::info;

use crate::core::{
    ConfigManager, MailServiceClient, MessageTemplate, SessionController, SessionSnapshot,
};

// CORS Fairing
pub struct Cors;

#[rocket::async_trait]
impl Fairing for Cors {
    fn info(&self) -> Info {
        Info {
            name: "Add CORS headers to responses",
            kind: Kind::Response,
        }
    }

    async fn on_response<'r>(&self, _request: &'r Request<'_>, response: &mut Response<'r>) {
        response.set_header(Header::new("Access-Control-Allow-Origin", "*"));
        response.set_header(Header::new(
            "Access-Control-Allow-Methods",
            "POST, GET, OPTIONS",
        ));
        response.set_header(Header::new("Access-Control-Allow-Headers", "*"));
        response.set_header(Header::new("Access-Control-Allow-Credentials", "true"));
    }
}

#[get("/referrals/session")]
pub async fn get_session(session: &State<SharedSession>) -> Json<DataResponse<SessionSnapshot>> {
    handlers::get_session_handler(session).await
}

#[post("/referrals/upload", data = "<upload>")]
pub async fn upload_spreadsheet(
    upload: Form<UploadForm<'_>>,
    session: &State<SharedSession>,
) -> Result<Json<ActionResponse<SessionSnapshot>>, ApiError> {
    handlers::upload_spreadsheet_handler(upload, session).await
}

#[post("/referrals/attachment", data = "<upload>")]
pub async fn upload_attachment(
    upload: Form<UploadForm<'_>>,
    session: &State<SharedSession>,
) -> Result<Json<ActionResponse<SessionSnapshot>>, ApiError> {
    handlers::upload_attachment_handler(upload, session).await
}

#[post("/referrals/send")]
pub async fn send_referrals(
    session: &State<SharedSession>,
    endpoint: &State<SharedEndpoint>,
) -> Result<Custom<Json<ActionResponse<SessionSnapshot>>>, ApiError> {
    handlers::send_handler(session, endpoint).await
}

#[post("/referrals/cancel")]
pub async fn cancel_review(
    session: &State<SharedSession>,
) -> Result<Json<ActionResponse<SessionSnapshot>>, ApiError> {
    handlers::cancel_handler(session).await
}

#[post("/referrals/reset")]
pub async fn reset_session(
    session: &State<SharedSession>,
) -> Result<Json<ActionResponse<SessionSnapshot>>, ApiError> {
    handlers::reset_handler(session).await
}

#[get("/referrals/template")]
pub async fn download_template() -> Result<XlsxResponse, ApiError> {
    handlers::download_template_handler().await
}

#[get("/health")]
pub async fn health() -> Json<TextResponse> {
    handlers::health_handler().await
}

#[options("/<_..>")]
pub async fn options() -> Status {
    Status::Ok
}

// Error catchers
#[rocket::catch(400)]
pub fn bad_request() -> Json<StandardErrorResponse> {
    Json(StandardErrorResponse::new(
        "Invalid request format".to_string(),
        "BAD_REQUEST",
        vec!["Send the file as multipart form field 'file'".to_string()],
    ))
}

#[rocket::catch(404)]
pub fn not_found() -> Json<StandardErrorResponse> {
    Json(StandardErrorResponse::new(
        "Not found".to_string(),
        "NOT_FOUND",
        vec!["Check the request path".to_string()],
    ))
}

#[rocket::catch(413)]
pub fn payload_too_large() -> Json<StandardErrorResponse> {
    Json(StandardErrorResponse::new(
        "Uploaded file is too large".to_string(),
        "FILE_TOO_LARGE",
        vec!["Use a file smaller than 10MB".to_string()],
    ))
}

#[rocket::catch(500)]
pub fn internal_error() -> Json<StandardErrorResponse> {
    Json(StandardErrorResponse::new(
        "Internal server error".to_string(),
        "INTERNAL_ERROR",
        vec![
            "Try again in a few moments".to_string(),
            "Contact support if the problem persists".to_string(),
        ],
    ))
}

/// Assemble the rocket instance around an existing session and endpoint.
pub fn build_rocket(
    figment: rocket::figment::Figment,
    session: SharedSession,
    endpoint: SharedEndpoint,
) -> Rocket<Build> {
    rocket::custom(figment)
        .attach(Cors)
        .manage(session)
        .manage(endpoint)
        .register(
            "/api",
            catchers![bad_request, not_found, payload_too_large, internal_error],
        )
        .mount(
            "/api",
            routes![
                get_session,
                upload_spreadsheet,
                upload_attachment,
                send_referrals,
                cancel_review,
                reset_session,
                download_template,
                health,
                options,
            ],
        )
}

/// Rocket settings derived from the configuration file
pub fn server_figment(config: &ConfigManager) -> rocket::figment::Figment {
    let limits = Limits::default()
        .limit("file", 10.mebibytes())
        .limit("data-form", 12.mebibytes());

    rocket::Config::figment()
        .merge(("address", config.server.address))
        .merge(("port", config.server.port))
        .merge(("limits", limits))
}

// Main server start function
pub async fn start_web_server(config: ConfigManager) -> Result<()> {
    let template = MessageTemplate::from_config(&config.message)
        .context("Failed to load message template")?;
    let controller =
        SessionController::new(template).with_require_all_valid(config.ingest.require_all_valid);
    let client = MailServiceClient::from_config(&config.mail_service)?;

    info!("Starting referral automation server");
    info!("Mail service: {}", client.send_url());
    info!(
        "Server: http://{}:{}",
        config.server.address, config.server.port
    );

    let session: SharedSession = Arc::new(Mutex::new(controller));
    let endpoint: SharedEndpoint = Arc::new(client);

    let _rocket = build_rocket(server_figment(&config), session, endpoint)
        .launch()
        .await
        .context("Web server failed")?;

    Ok(())
}
