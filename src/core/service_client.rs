// src/core/service_client.rs
//! HTTP client for the external mail-sending service

use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::multipart::{Form, Part};
use std::time::Duration;
use tracing::{error, trace};

use crate::core::config_manager::MailServiceConfig;
use crate::core::dispatcher::{OutboundMessage, SendEndpoint};
use crate::error::DispatchError;

/// Multipart field carrying the attachment
pub const ATTACHMENT_FIELD: &str = "resume";

pub struct MailServiceClient {
    client: reqwest::Client,
    send_url: String,
}

impl MailServiceClient {
    pub fn new(base_url: &str, send_path: &str, timeout_seconds: u64) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(timeout_seconds))
            .build()
            .context("Failed to create HTTP client")?;

        Ok(Self {
            client,
            send_url: format!("{}{}", base_url.trim_end_matches('/'), send_path),
        })
    }

    pub fn from_config(config: &MailServiceConfig) -> Result<Self> {
        Self::new(&config.base_url, &config.send_path, config.timeout_seconds)
    }

    pub fn send_url(&self) -> &str {
        &self.send_url
    }

    fn build_form(message: &OutboundMessage) -> Result<Form, DispatchError> {
        let attachment = &message.attachment;
        let part = Part::bytes(attachment.data.to_vec())
            .file_name(attachment.file_name.clone())
            .mime_str(&attachment.content_type)
            .map_err(|e| DispatchError::Request(e.to_string()))?;

        Ok(Form::new()
            .text("to", message.to.clone())
            .text("subject", message.subject.clone())
            .text("body", message.body.clone())
            .part(ATTACHMENT_FIELD, part))
    }
}

#[async_trait]
impl SendEndpoint for MailServiceClient {
    async fn send(&self, message: &OutboundMessage) -> Result<(), DispatchError> {
        let form = Self::build_form(message)?;

        trace!("POST {} for {}", self.send_url, message.to);

        let response = self
            .client
            .post(&self.send_url)
            .multipart(form)
            .send()
            .await
            .map_err(|e| DispatchError::Transport(e.to_string()))?;

        let status = response.status();
        trace!("Mail service response status: {}", status);

        if status.is_success() {
            Ok(())
        } else {
            let error_text = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());

            error!("Mail service error response: {}", error_text);
            Err(DispatchError::Rejected {
                status: status.as_u16(),
                message: error_text,
            })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_send_url_joins_cleanly() {
        let client =
            MailServiceClient::new("http://127.0.0.1:5555/", "/api/send-referral-mail", 5)
                .unwrap();
        assert_eq!(
            client.send_url(),
            "http://127.0.0.1:5555/api/send-referral-mail"
        );
    }

    #[tokio::test]
    async fn test_unreachable_service_is_a_transport_error() {
        // Port 9 (discard) on localhost is not expected to accept HTTP.
        let client = MailServiceClient::new("http://127.0.0.1:9", "/send", 2).unwrap();
        let message = OutboundMessage {
            to: "john.smith@gmail.com".to_string(),
            subject: "s".to_string(),
            body: "b".to_string(),
            attachment: crate::types::Attachment {
                file_name: "resume.pdf".to_string(),
                content_type: "application/pdf".to_string(),
                data: std::sync::Arc::from(&b"%PDF"[..]),
            },
        };

        assert!(matches!(
            client.send(&message).await,
            Err(DispatchError::Transport(_))
        ));
    }
}
