// src/core/recipient.rs
//! Row -> referral record derivation

use crate::types::{ReferralField, ReferralRecord, RowRecord};

/// Mailbox domain every generated address is placed under.
pub const EMAIL_DOMAIN: &str = "gmail.com";

/// Candidate address from a full name: `first.last@gmail.com`, middle names
/// ignored. `None` when the name has fewer than two tokens.
pub fn derive_email(candidate_name: &str) -> Option<String> {
    let tokens: Vec<&str> = candidate_name.split_whitespace().collect();

    match tokens.as_slice() {
        [first, .., last] => Some(format!(
            "{}.{}@{}",
            first.to_lowercase(),
            last.to_lowercase(),
            EMAIL_DOMAIN
        )),
        _ => None,
    }
}

/// Derive one referral record. Pure: a malformed name only flips the
/// validity flag.
pub fn derive_record(row: &RowRecord) -> ReferralRecord {
    let candidate_name = row.field(ReferralField::CandidateName).trim().to_string();
    let generated_email = derive_email(&candidate_name);

    ReferralRecord {
        is_valid_email: generated_email.is_some(),
        generated_email: generated_email.unwrap_or_default(),
        position: row.field(ReferralField::Position),
        company: row.field(ReferralField::Company),
        job_id: row.field(ReferralField::JobId),
        job_url: row.field(ReferralField::JobUrl),
        custom_message: row.field(ReferralField::CustomMessage),
        candidate_name,
    }
}

pub fn derive_records(rows: &[RowRecord]) -> Vec<ReferralRecord> {
    rows.iter().map(derive_record).collect()
}

/// Valid / invalid record counts, in that order
pub fn validity_counts(records: &[ReferralRecord]) -> (usize, usize) {
    let valid = records.iter().filter(|r| r.is_valid_email).count();
    (valid, records.len() - valid)
}
