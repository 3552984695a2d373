// src/types/mod.rs
pub mod referral;

pub use referral::{
    Attachment, AttachmentInfo, CellValue, ReferralField, ReferralRecord, RowRecord,
};
