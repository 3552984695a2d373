// src/core/mod.rs
//! Referral pipeline: ingest -> derive -> confirm -> dispatch

pub mod config_manager;
pub mod dispatcher;
pub mod ingest;
pub mod recipient;
pub mod sample;
pub mod service_client;
pub mod session;
pub mod template_engine;

pub use config_manager::ConfigManager;
pub use dispatcher::{DispatchRun, DispatchStep, OutboundMessage, SendEndpoint};
pub use service_client::MailServiceClient;
pub use session::{SessionController, SessionPhase, SessionSnapshot};
pub use template_engine::MessageTemplate;
