// src/core/dispatcher.rs
//! Sequential, fail-fast batch dispatch.
//!
//! A [`DispatchRun`] walks the confirmed valid records in order and performs
//! exactly one awaited send per [`DispatchRun::next`] call. The first failure
//! ends the run; nothing is retried and nothing after it is attempted. Sends
//! are never issued concurrently.

use async_trait::async_trait;
use std::collections::VecDeque;
use tracing::{error, info, info_span, Instrument};

use crate::core::template_engine::MessageTemplate;
use crate::error::DispatchError;
use crate::types::{Attachment, ReferralRecord};

/// Everything one request to the mail endpoint carries.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutboundMessage {
    pub to: String,
    pub subject: String,
    pub body: String,
    pub attachment: Attachment,
}

/// The external mail-sending endpoint.
#[async_trait]
pub trait SendEndpoint: Send + Sync {
    async fn send(&self, message: &OutboundMessage) -> Result<(), DispatchError>;
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DispatchStep {
    Delivered {
        candidate_name: String,
        email: String,
        completed: usize,
        total: usize,
    },
    Failed {
        candidate_name: String,
        email: String,
        reason: String,
        completed: usize,
        total: usize,
    },
}

impl DispatchStep {
    pub fn progress_percent(&self) -> u8 {
        match self {
            DispatchStep::Delivered {
                completed, total, ..
            }
            | DispatchStep::Failed {
                completed, total, ..
            } => progress_percent(*completed, *total),
        }
    }

    pub fn is_last(&self) -> bool {
        match self {
            DispatchStep::Delivered {
                completed, total, ..
            } => completed == total,
            DispatchStep::Failed { .. } => true,
        }
    }
}

/// `round(100 * completed / total)`, 0 for an empty batch
pub fn progress_percent(completed: usize, total: usize) -> u8 {
    if total == 0 {
        return 0;
    }
    ((completed as f64 / total as f64) * 100.0).round().min(100.0) as u8
}

/// One in-flight batch, detached from the session that started it.
#[derive(Debug)]
pub struct DispatchRun {
    queue: VecDeque<ReferralRecord>,
    attachment: Attachment,
    template: MessageTemplate,
    completed: usize,
    total: usize,
    halted: bool,
}

impl DispatchRun {
    /// Queue the valid records of `records`, in order. Invalid records are
    /// dropped here and can never be sent.
    pub fn new(
        records: &[ReferralRecord],
        attachment: Attachment,
        template: MessageTemplate,
    ) -> Self {
        let queue: VecDeque<ReferralRecord> = records
            .iter()
            .filter(|r| r.is_valid_email)
            .cloned()
            .collect();
        let total = queue.len();

        Self {
            queue,
            attachment,
            template,
            completed: 0,
            total,
            halted: false,
        }
    }

    pub fn total(&self) -> usize {
        self.total
    }

    pub fn completed(&self) -> usize {
        self.completed
    }

    pub fn is_finished(&self) -> bool {
        self.halted || self.queue.is_empty()
    }

    /// Candidates still waiting, in send order
    pub fn pending(&self) -> impl Iterator<Item = &ReferralRecord> {
        self.queue.iter()
    }

    /// Build the request for one record; the body is rendered here, at send time.
    pub fn message_for(&self, record: &ReferralRecord) -> OutboundMessage {
        OutboundMessage {
            to: record.generated_email.clone(),
            subject: self.template.subject(record),
            body: self.template.render(record),
            attachment: self.attachment.clone(),
        }
    }

    /// Send the next queued record. `None` once the queue is drained or a
    /// send has failed.
    pub async fn next<E>(&mut self, endpoint: &E) -> Option<DispatchStep>
    where
        E: SendEndpoint + ?Sized,
    {
        if self.halted {
            return None;
        }
        let record = self.queue.pop_front()?;
        let message = self.message_for(&record);

        let span = info_span!(
            "dispatch",
            candidate = %record.candidate_name,
            position = self.completed + 1,
            total = self.total
        );
        let result = endpoint.send(&message).instrument(span.clone()).await;
        let _enter = span.enter();

        match result {
            Ok(()) => {
                self.completed += 1;
                info!(
                    "Sent referral request to {} ({}/{})",
                    message.to, self.completed, self.total
                );
                Some(DispatchStep::Delivered {
                    candidate_name: record.candidate_name,
                    email: message.to,
                    completed: self.completed,
                    total: self.total,
                })
            }
            Err(e) => {
                self.halted = true;
                error!(
                    "Failed to send email to {}: {}. {} queued message(s) abandoned",
                    message.to,
                    e,
                    self.queue.len()
                );
                Some(DispatchStep::Failed {
                    candidate_name: record.candidate_name,
                    email: message.to,
                    reason: e.to_string(),
                    completed: self.completed,
                    total: self.total,
                })
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_progress_percent_rounding() {
        assert_eq!(progress_percent(0, 3), 0);
        assert_eq!(progress_percent(1, 3), 33);
        assert_eq!(progress_percent(2, 3), 67);
        assert_eq!(progress_percent(3, 3), 100);
        assert_eq!(progress_percent(1, 8), 13);
        assert_eq!(progress_percent(0, 0), 0);
    }
}
