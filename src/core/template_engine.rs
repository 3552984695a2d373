// src/core/template_engine.rs
//! Referral message rendering

use std::path::Path;
use tracing::info;

use crate::core::config_manager::MessageConfig;
use crate::error::TemplateError;
use crate::types::ReferralRecord;

const SUBJECT_PREFIX: &str = "Regarding referral opportunity at ";

/// Placeholders a template may reference. Each one maps to a record field.
pub const PLACEHOLDERS: [&str; 7] = [
    "first_name",
    "candidate_name",
    "position",
    "company",
    "custom_message",
    "job_id",
    "job_url",
];

pub const DEFAULT_TEMPLATE: &str = "\
Hi {{first_name}},
I hope you're doing well!

This is {{sender_name}}, {{sender_pitch}}.

I recently came across some open {{position}} positions at {{company}} that match my skill sets and thought I would reach out to see if you might be able to help me with a referral. I've been following {{company}}'s work and truly admire the impact it's making in the industry.
{{custom_message}}

Here are the details of the roles I'm interested in:
Job ID: {{job_id}}
Job URL: {{job_url}}

I believe my background and experience would make me a good fit for these positions, and I'd greatly appreciate any guidance or assistance you could offer in this process.

Thanks in advance. Have a nice time!
Best regards,
{{sender_name}}
";

#[derive(Debug, Clone, PartialEq, Eq)]
enum Segment {
    Literal(String),
    Field(&'static str),
}

/// A parsed message template. Sender placeholders are already resolved to
/// literal text; only record fields remain to be filled in.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MessageTemplate {
    segments: Vec<Segment>,
}

impl MessageTemplate {
    pub fn new(
        template: &str,
        sender_name: &str,
        sender_pitch: &str,
    ) -> Result<Self, TemplateError> {
        let mut segments = Vec::new();
        let mut rest = template;

        while let Some(start) = rest.find("{{") {
            push_literal(&mut segments, &rest[..start]);
            let after = &rest[start + 2..];
            let end = after
                .find("}}")
                .ok_or_else(|| TemplateError::Unclosed(after.chars().take(20).collect()))?;

            match after[..end].trim() {
                "sender_name" => push_literal(&mut segments, sender_name),
                "sender_pitch" => push_literal(&mut segments, sender_pitch),
                name => {
                    let field = PLACEHOLDERS
                        .iter()
                        .find(|p| **p == name)
                        .ok_or_else(|| TemplateError::UnknownPlaceholder(name.to_string()))?;
                    segments.push(Segment::Field(*field));
                }
            }
            rest = &after[end + 2..];
        }
        push_literal(&mut segments, rest);

        Ok(Self { segments })
    }

    /// Load from configuration: a template file when one is set, the
    /// built-in wording otherwise.
    pub fn from_config(config: &MessageConfig) -> Result<Self, TemplateError> {
        let template = match &config.template_path {
            Some(path) => read_template(path)?,
            None => DEFAULT_TEMPLATE.to_string(),
        };

        Self::new(&template, &config.sender_name, &config.sender_pitch)
    }

    pub fn subject(&self, record: &ReferralRecord) -> String {
        render_subject(record)
    }

    /// Render the body for one record. Field values are copied verbatim and
    /// never expanded again.
    pub fn render(&self, record: &ReferralRecord) -> String {
        let mut out = String::new();
        for segment in &self.segments {
            match segment {
                Segment::Literal(text) => out.push_str(text),
                Segment::Field(name) => out.push_str(field_value(record, name)),
            }
        }
        out.trim().to_string()
    }
}

pub fn render_subject(record: &ReferralRecord) -> String {
    format!("{}{}", SUBJECT_PREFIX, record.company)
}

fn push_literal(segments: &mut Vec<Segment>, text: &str) {
    if text.is_empty() {
        return;
    }
    match segments.last_mut() {
        Some(Segment::Literal(prev)) => prev.push_str(text),
        _ => segments.push(Segment::Literal(text.to_string())),
    }
}

fn field_value<'a>(record: &'a ReferralRecord, name: &str) -> &'a str {
    match name {
        "first_name" => record.first_name(),
        "candidate_name" => &record.candidate_name,
        "position" => &record.position,
        "company" => &record.company,
        "custom_message" => &record.custom_message,
        "job_id" => &record.job_id,
        "job_url" => &record.job_url,
        _ => "",
    }
}

fn read_template(path: &Path) -> Result<String, TemplateError> {
    info!("Loading message template from {}", path.display());
    std::fs::read_to_string(path).map_err(|e| TemplateError::Unreadable {
        path: path.display().to_string(),
        message: e.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record() -> ReferralRecord {
        ReferralRecord {
            candidate_name: "John Smith".to_string(),
            position: "Software Engineer".to_string(),
            company: "Tech Corp".to_string(),
            job_id: "JD123456".to_string(),
            job_url: "https://company.com/jobs/123456".to_string(),
            custom_message: "I have 5 years of experience in similar roles.".to_string(),
            generated_email: "john.smith@gmail.com".to_string(),
            is_valid_email: true,
        }
    }

    #[test]
    fn test_default_template_substitutes_everything() {
        let template = MessageTemplate::new(DEFAULT_TEMPLATE, "Jane Doe", "a backend engineer")
            .unwrap();
        let body = template.render(&record());

        assert!(body.starts_with("Hi John,"));
        assert!(body.contains("This is Jane Doe, a backend engineer."));
        assert!(body.contains("open Software Engineer positions at Tech Corp"));
        assert!(body.contains("Tech Corp's work"));
        assert!(body.contains("I have 5 years of experience in similar roles."));
        assert!(body.contains("Job ID: JD123456"));
        assert!(body.contains("Job URL: https://company.com/jobs/123456"));
        assert!(body.ends_with("Best regards,\nJane Doe"));
        assert!(!body.contains("{{"));
    }

    #[test]
    fn test_subject() {
        assert_eq!(
            render_subject(&record()),
            "Regarding referral opportunity at Tech Corp"
        );
    }

    #[test]
    fn test_unknown_placeholder_rejected() {
        let err = MessageTemplate::new("Hi {{nickname}}", "a", "b").unwrap_err();
        assert_eq!(err, TemplateError::UnknownPlaceholder("nickname".to_string()));
    }

    #[test]
    fn test_unclosed_placeholder_rejected() {
        assert!(matches!(
            MessageTemplate::new("Hi {{first_name", "a", "b"),
            Err(TemplateError::Unclosed(_))
        ));
    }

    #[test]
    fn test_values_are_not_expanded_twice() {
        let mut rec = record();
        rec.custom_message = "literal {{company}}".to_string();
        let template = MessageTemplate::new("{{custom_message}}", "a", "b").unwrap();
        assert_eq!(template.render(&rec), "literal {{company}}");
    }

    #[test]
    fn test_sender_values_are_not_expanded() {
        let template = MessageTemplate::new("{{sender_name}} {{first_name}}", "{{company}}", "")
            .unwrap();
        assert_eq!(template.render(&record()), "{{company}} John");
    }

    #[test]
    fn test_rendering_is_deterministic() {
        let template = MessageTemplate::from_config(&MessageConfig::default()).unwrap();
        assert_eq!(template.render(&record()), template.render(&record()));
    }
}
