//! Referral request automation: read a spreadsheet of openings, derive each
//! candidate's address, review, then send personalised emails one by one.

pub mod cli;
pub mod core;
pub mod error;
pub mod types;
pub mod utils;
pub mod web;

pub use crate::core::{ConfigManager, SessionController, SessionPhase};
pub use crate::error::{DispatchError, IngestionError, PreconditionError, SessionError};
pub use crate::web::start_web_server;
