#![allow(dead_code)]
use async_trait::async_trait;
use referral_automation::core::config_manager::MessageConfig;
use referral_automation::core::{MessageTemplate, OutboundMessage, SendEndpoint, SessionController};
use referral_automation::error::DispatchError;
use referral_automation::types::Attachment;
use referral_automation::utils::build_attachment;
use rust_xlsxwriter::Workbook;
use std::sync::Mutex;

pub const HEADERS: [&str; 6] = [
    "candidateName",
    "position",
    "company",
    "jobID",
    "jobURL",
    "customMessage",
];

/// Mail endpoint that remembers every message and can fail on the Nth send (1-based)
#[derive(Default)]
pub struct RecordingEndpoint {
    sent: Mutex<Vec<OutboundMessage>>,
    fail_on: Option<usize>,
}

impl RecordingEndpoint {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn failing_on(n: usize) -> Self {
        Self {
            sent: Mutex::new(Vec::new()),
            fail_on: Some(n),
        }
    }

    /// Messages the endpoint accepted, in order
    pub fn sent(&self) -> Vec<OutboundMessage> {
        self.sent.lock().unwrap().clone()
    }

    pub fn recipients(&self) -> Vec<String> {
        self.sent().into_iter().map(|m| m.to).collect()
    }
}

#[async_trait]
impl SendEndpoint for RecordingEndpoint {
    async fn send(&self, message: &OutboundMessage) -> Result<(), DispatchError> {
        let mut sent = self.sent.lock().unwrap();
        if self.fail_on == Some(sent.len() + 1) {
            return Err(DispatchError::Rejected {
                status: 500,
                message: "mailbox unavailable".to_string(),
            });
        }
        sent.push(message.clone());
        Ok(())
    }
}

/// Build an in-memory .xlsx with a header row and string cells
pub fn xlsx_bytes(headers: &[&str], rows: &[Vec<&str>]) -> Vec<u8> {
    let mut workbook = Workbook::new();
    let worksheet = workbook.add_worksheet();

    for (col, header) in headers.iter().enumerate() {
        worksheet.write(0, col as u16, *header).unwrap();
    }
    for (r, row) in rows.iter().enumerate() {
        for (col, value) in row.iter().enumerate() {
            if !value.is_empty() {
                worksheet.write(r as u32 + 1, col as u16, *value).unwrap();
            }
        }
    }

    workbook.save_to_buffer().unwrap()
}

/// Spreadsheet with one row per candidate name, other columns filled in
pub fn referral_sheet(names: &[&str]) -> Vec<u8> {
    let rows: Vec<Vec<&str>> = names
        .iter()
        .map(|name| {
            vec![
                *name,
                "Software Engineer",
                "Acme",
                "JD-1",
                "https://acme.example/jobs/1",
                "",
            ]
        })
        .collect();
    xlsx_bytes(&HEADERS, &rows)
}

pub fn resume() -> Attachment {
    build_attachment("resume.pdf", b"%PDF-1.7 test resume".to_vec()).unwrap()
}

pub fn controller() -> SessionController {
    let template = MessageTemplate::from_config(&MessageConfig::default()).unwrap();
    SessionController::new(template)
}

/// Controller in review with `names` loaded and a resume attached
pub fn reviewing(names: &[&str]) -> SessionController {
    let mut controller = controller();
    controller
        .load_spreadsheet(Some("referrals.xlsx"), &referral_sheet(names))
        .unwrap();
    controller.set_attachment(resume()).unwrap();
    controller
}
