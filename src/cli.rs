// src/cli.rs
use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};
use tracing::{error, info};

use crate::core::config_manager::DEFAULT_CONFIG_FILE;
use crate::core::recipient::{derive_records, validity_counts};
use crate::core::sample::write_sample_template;
use crate::core::{
    ingest, ConfigManager, MailServiceClient, MessageTemplate, SessionController, SessionPhase,
};
use crate::types::ReferralRecord;
use crate::utils::read_attachment;

#[derive(Parser)]
#[command(name = "referral-automation")]
#[command(about = "Send personalised referral requests from a spreadsheet")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    /// Configuration file
    #[arg(long, global = true, default_value = DEFAULT_CONFIG_FILE)]
    pub config: PathBuf,
}

#[derive(Subcommand)]
pub enum Command {
    /// Start the HTTP server
    Serve,
    /// Write the sample spreadsheet template
    Template {
        /// Directory to write into (defaults to the configured output path)
        #[arg(long)]
        output_dir: Option<PathBuf>,
    },
    /// Show the derived recipients of a spreadsheet without sending anything
    Preview { spreadsheet: PathBuf },
    /// Review a spreadsheet, then send every valid referral request
    Send {
        spreadsheet: PathBuf,
        /// Resume to attach (.pdf, .doc, .docx)
        #[arg(long)]
        attachment: PathBuf,
        /// Confirm sending without stopping at the review
        #[arg(long)]
        yes: bool,
    },
}

pub async fn handle_command(cli: Cli) -> Result<()> {
    match cli.command {
        Command::Serve => {
            let config = ConfigManager::load_from(&cli.config)?;
            config.ensure_directories().await?;
            crate::web::start_web_server(config).await
        }

        Command::Template { output_dir } => {
            let dir = match output_dir {
                Some(dir) => dir,
                None => {
                    let config = ConfigManager::load_from(&cli.config)?;
                    config.output_path
                }
            };
            let path = write_sample_template(&dir).await?;
            println!("✓ Sample template written to {}", path.display());
            Ok(())
        }

        Command::Preview { spreadsheet } => {
            let (file_name, bytes) = read_spreadsheet(&spreadsheet).await?;
            let rows = ingest::read_named(&file_name, &bytes)
                .with_context(|| format!("Failed to read {}", spreadsheet.display()))?;
            let records = derive_records(&rows);
            print_review(&records);
            Ok(())
        }

        Command::Send {
            spreadsheet,
            attachment,
            yes,
        } => {
            let config = ConfigManager::load_from(&cli.config)?;
            send_batch(&config, &spreadsheet, &attachment, yes).await
        }
    }
}

async fn read_spreadsheet(path: &Path) -> Result<(String, Vec<u8>)> {
    let bytes = tokio::fs::read(path)
        .await
        .with_context(|| format!("Failed to read file: {}", path.display()))?;
    let file_name = path
        .file_name()
        .and_then(|n| n.to_str())
        .ok_or_else(|| anyhow::anyhow!("Invalid spreadsheet path: {}", path.display()))?
        .to_string();
    Ok((file_name, bytes))
}

fn print_review(records: &[ReferralRecord]) {
    let (valid, invalid) = validity_counts(records);

    println!("{:<4} {:<28} {:<36} {:<24} {}", "#", "Candidate", "Email", "Company", "Position");
    for (i, record) in records.iter().enumerate() {
        let email = if record.is_valid_email {
            record.generated_email.as_str()
        } else {
            "(invalid name format)"
        };
        println!(
            "{:<4} {:<28} {:<36} {:<24} {}",
            i + 1,
            record.candidate_name,
            email,
            record.company,
            record.position
        );
    }
    println!();
    println!("{} rows: {} valid, {} invalid", records.len(), valid, invalid);

    if invalid > 0 {
        println!(
            "⚠ Some email addresses could not be generated due to invalid name formats. \
             Please ensure all names are in \"First Last\" format."
        );
    }
}

async fn send_batch(
    config: &ConfigManager,
    spreadsheet: &Path,
    attachment: &Path,
    confirmed: bool,
) -> Result<()> {
    let template = MessageTemplate::from_config(&config.message)
        .context("Failed to load message template")?;
    let mut controller =
        SessionController::new(template).with_require_all_valid(config.ingest.require_all_valid);

    let (file_name, bytes) = read_spreadsheet(spreadsheet).await?;
    let records = controller
        .load_spreadsheet(Some(file_name.as_str()), &bytes)
        .with_context(|| format!("Failed to read {}", spreadsheet.display()))?;
    print_review(records);

    let resume = read_attachment(attachment).await?;
    controller.set_attachment(resume)?;

    if let Some(blocker) = controller.send_blocker() {
        anyhow::bail!("Cannot send: {}", blocker);
    }

    if !confirmed {
        controller.cancel()?;
        println!("Nothing sent. Re-run with --yes to send these emails.");
        return Ok(());
    }

    let client = MailServiceClient::from_config(&config.mail_service)?;
    info!("Sending through {}", client.send_url());

    let mut run = controller.begin_send()?;
    while let Some(step) = run.next(&client).await {
        let progress = step.progress_percent();
        controller.apply_step(step);
        println!("  {:>3}%", progress);
    }

    let session = controller.session();
    match session.phase {
        SessionPhase::Complete => {
            println!("✓ Sent {} referral requests", session.delivered.len());
            Ok(())
        }
        _ => {
            let message = session
                .last_error
                .clone()
                .unwrap_or_else(|| "Dispatch failed".to_string());
            error!("{}", message);
            anyhow::bail!(
                "{} ({} of {} sent before stopping)",
                message,
                run.completed(),
                run.total()
            )
        }
    }
}
