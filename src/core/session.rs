// src/core/session.rs
//! The single working session and its transition table.
//!
//! ```text
//! Idle --drop ok--> AwaitingConfirmation --confirm--> Sending --all sent--> Complete
//!  ^  \--drop err--> Idle        |                        \--one failed--> Failed
//!  |                             \--cancel--> Idle
//!  \------------------------------- reset ------------- Complete | Failed
//! ```
//!
//! Every mutation goes through a method on [`SessionController`]; nothing
//! else holds a mutable reference to [`Session`].

use chrono::{DateTime, Utc};
use serde::Serialize;
use std::fmt;
use tracing::{info, warn};

use crate::core::dispatcher::{DispatchRun, DispatchStep, SendEndpoint};
use crate::core::ingest;
use crate::core::recipient::{derive_records, validity_counts};
use crate::core::template_engine::MessageTemplate;
use crate::error::{PreconditionError, SessionError};
use crate::types::{Attachment, AttachmentInfo, ReferralRecord};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionPhase {
    Idle,
    AwaitingConfirmation,
    Sending,
    Complete,
    Failed,
}

impl SessionPhase {
    pub fn as_str(self) -> &'static str {
        match self {
            SessionPhase::Idle => "idle",
            SessionPhase::AwaitingConfirmation => "awaiting_confirmation",
            SessionPhase::Sending => "sending",
            SessionPhase::Complete => "complete",
            SessionPhase::Failed => "failed",
        }
    }
}

impl fmt::Display for SessionPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DispatchFailure {
    pub candidate_name: String,
    pub email: String,
    pub reason: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Session {
    pub records: Vec<ReferralRecord>,
    pub attachment: Option<Attachment>,
    pub phase: SessionPhase,
    pub progress_percent: u8,
    pub last_error: Option<String>,
    pub delivered: Vec<String>,
    pub failure: Option<DispatchFailure>,
    pub started_at: Option<DateTime<Utc>>,
    pub finished_at: Option<DateTime<Utc>>,
}

impl Default for Session {
    fn default() -> Self {
        Self {
            records: Vec::new(),
            attachment: None,
            phase: SessionPhase::Idle,
            progress_percent: 0,
            last_error: None,
            delivered: Vec::new(),
            failure: None,
            started_at: None,
            finished_at: None,
        }
    }
}

/// Read-only view handed to the presentation layer
#[derive(Debug, Clone, Serialize)]
pub struct SessionSnapshot {
    pub phase: SessionPhase,
    pub records: Vec<ReferralRecord>,
    pub valid_count: usize,
    pub invalid_count: usize,
    pub attachment: Option<AttachmentInfo>,
    pub progress_percent: u8,
    pub last_error: Option<String>,
    pub can_send: bool,
    pub send_blocker: Option<String>,
    pub delivered: Vec<String>,
    pub failure: Option<DispatchFailure>,
    pub started_at: Option<DateTime<Utc>>,
    pub finished_at: Option<DateTime<Utc>>,
}

pub struct SessionController {
    session: Session,
    template: MessageTemplate,
    require_all_valid: bool,
}

impl SessionController {
    pub fn new(template: MessageTemplate) -> Self {
        Self {
            session: Session::default(),
            template,
            require_all_valid: false,
        }
    }

    /// Also refuse to send while any row failed email derivation.
    pub fn with_require_all_valid(mut self, require_all_valid: bool) -> Self {
        self.require_all_valid = require_all_valid;
        self
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    pub fn phase(&self) -> SessionPhase {
        self.session.phase
    }

    pub fn template(&self) -> &MessageTemplate {
        &self.template
    }

    pub fn snapshot(&self) -> SessionSnapshot {
        let (valid_count, invalid_count) = validity_counts(&self.session.records);
        let blocker = self.send_blocker();

        SessionSnapshot {
            phase: self.session.phase,
            records: self.session.records.clone(),
            valid_count,
            invalid_count,
            attachment: self.session.attachment.as_ref().map(Attachment::info),
            progress_percent: self.session.progress_percent,
            last_error: self.session.last_error.clone(),
            can_send: blocker.is_none(),
            send_blocker: blocker.map(|b| b.to_string()),
            delivered: self.session.delivered.clone(),
            failure: self.session.failure.clone(),
            started_at: self.session.started_at,
            finished_at: self.session.finished_at,
        }
    }

    fn invalid_transition(&self, action: &'static str) -> SessionError {
        SessionError::InvalidTransition {
            action,
            phase: self.session.phase.as_str(),
        }
    }

    // ===== Spreadsheet drop =====

    /// Accept a dropped spreadsheet: decode, derive, and move to review.
    ///
    /// A decode failure lands in `Idle` with `last_error` set and no records.
    pub fn load_spreadsheet(
        &mut self,
        file_name: Option<&str>,
        bytes: &[u8],
    ) -> Result<&[ReferralRecord], SessionError> {
        match self.session.phase {
            SessionPhase::Idle | SessionPhase::AwaitingConfirmation => {}
            _ => return Err(self.invalid_transition("load a spreadsheet")),
        }

        let decoded = match file_name {
            Some(name) => ingest::read_named(name, bytes),
            None => ingest::read_rows(bytes),
        };

        match decoded {
            Ok(rows) => {
                let records = derive_records(&rows);
                let (valid, invalid) = validity_counts(&records);
                info!(
                    "Loaded {} referral rows ({} valid, {} invalid)",
                    records.len(),
                    valid,
                    invalid
                );

                self.session.records = records;
                self.session.last_error = None;
                self.session.phase = SessionPhase::AwaitingConfirmation;
                Ok(&self.session.records)
            }
            Err(e) => {
                warn!("Spreadsheet rejected: {}", e);
                self.session.records.clear();
                self.session.last_error = Some(e.to_string());
                self.session.phase = SessionPhase::Idle;
                Err(e.into())
            }
        }
    }

    // ===== Attachment =====

    pub fn set_attachment(&mut self, attachment: Attachment) -> Result<(), SessionError> {
        match self.session.phase {
            SessionPhase::Idle | SessionPhase::AwaitingConfirmation => {}
            _ => return Err(self.invalid_transition("change the attachment")),
        }

        info!(
            "Attachment selected: {} ({} bytes)",
            attachment.file_name,
            attachment.size()
        );
        self.session.attachment = Some(attachment);
        Ok(())
    }

    // ===== Review =====

    /// Leave review without sending; records are discarded, the attachment kept.
    pub fn cancel(&mut self) -> Result<(), SessionError> {
        if self.session.phase != SessionPhase::AwaitingConfirmation {
            return Err(self.invalid_transition("cancel"));
        }

        info!("Review cancelled, {} records discarded", self.session.records.len());
        self.session.records.clear();
        self.session.last_error = None;
        self.session.phase = SessionPhase::Idle;
        Ok(())
    }

    /// Why sending is unavailable right now, if it is.
    pub fn send_blocker(&self) -> Option<PreconditionError> {
        match self.session.phase {
            SessionPhase::AwaitingConfirmation => {}
            SessionPhase::Sending => return Some(PreconditionError::AlreadySending),
            _ => return Some(PreconditionError::NotAwaitingConfirmation),
        }

        if self.session.attachment.is_none() {
            return Some(PreconditionError::MissingAttachment);
        }

        let (valid, invalid) = validity_counts(&self.session.records);
        if valid == 0 {
            return Some(PreconditionError::NoValidRecords);
        }
        if self.require_all_valid && invalid > 0 {
            return Some(PreconditionError::InvalidRecordsPresent);
        }

        None
    }

    // ===== Dispatch =====

    /// Confirm the batch and enter `Sending`.
    ///
    /// The returned run is driven by the caller; each step it yields must be
    /// handed back through [`Self::apply_step`]. Refused without any state
    /// change when a precondition does not hold.
    pub fn begin_send(&mut self) -> Result<DispatchRun, SessionError> {
        if let Some(blocker) = self.send_blocker() {
            return Err(blocker.into());
        }
        let Some(attachment) = self.session.attachment.clone() else {
            return Err(PreconditionError::MissingAttachment.into());
        };

        let run = DispatchRun::new(&self.session.records, attachment, self.template.clone());
        info!("Dispatch started for {} valid records", run.total());

        self.session.phase = SessionPhase::Sending;
        self.session.progress_percent = 0;
        self.session.last_error = None;
        self.session.delivered.clear();
        self.session.failure = None;
        self.session.started_at = Some(Utc::now());
        self.session.finished_at = None;

        Ok(run)
    }

    /// Fold one dispatch step into the session.
    pub fn apply_step(&mut self, step: DispatchStep) {
        if self.session.phase != SessionPhase::Sending {
            warn!(
                "Ignoring dispatch step while session is {}",
                self.session.phase
            );
            return;
        }

        let last = step.is_last();
        match step {
            DispatchStep::Delivered {
                email,
                completed,
                total,
                ..
            } => {
                self.session.delivered.push(email);
                self.session.progress_percent =
                    crate::core::dispatcher::progress_percent(completed, total);

                if last {
                    self.session.progress_percent = 100;
                    self.session.phase = SessionPhase::Complete;
                    self.session.finished_at = Some(Utc::now());
                    info!("All {} emails have been sent successfully", total);
                }
            }
            DispatchStep::Failed {
                candidate_name,
                email,
                reason,
                ..
            } => {
                self.session.last_error = Some(format!("Failed to send email to {}", candidate_name));
                self.session.failure = Some(DispatchFailure {
                    candidate_name,
                    email,
                    reason,
                });
                self.session.phase = SessionPhase::Failed;
                self.session.finished_at = Some(Utc::now());
            }
        }
    }

    /// Confirm and run the whole batch in place, one awaited send at a time.
    pub async fn send<E>(&mut self, endpoint: &E) -> Result<SessionPhase, SessionError>
    where
        E: SendEndpoint + ?Sized,
    {
        let mut run = self.begin_send()?;

        while let Some(step) = run.next(endpoint).await {
            self.apply_step(step);
        }

        Ok(self.session.phase)
    }

    // ===== Reset =====

    /// Discard everything and return to the initial state.
    pub fn reset(&mut self) -> Result<(), SessionError> {
        match self.session.phase {
            SessionPhase::Complete | SessionPhase::Failed => {}
            _ => return Err(self.invalid_transition("reset")),
        }

        info!("Session reset from {}", self.session.phase);
        self.session = Session::default();
        Ok(())
    }
}
