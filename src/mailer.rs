use anyhow::{anyhow, Context, Result};
use lettre::message::header::ContentType;
use lettre::message::{Attachment, Mailbox, MultiPart, SinglePart};
use lettre::transport::smtp::authentication::Credentials;
use lettre::{AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor};
use std::path::Path;
use tracing::info;

use crate::types::{EmailConfig, FileType};

/// Builds the report email with `report` as its only attachment.
pub fn build_report_message(
    cfg: &EmailConfig,
    report: &Path,
    file_type: FileType,
) -> Result<Message> {
    let content = std::fs::read(report)
        .with_context(|| format!("Failed to read report {}", report.display()))?;
    let file_name = report
        .file_name()
        .and_then(|n| n.to_str())
        .ok_or_else(|| anyhow!("report path {} has no file name", report.display()))?
        .to_string();

    let from: Mailbox = cfg
        .from_addr
        .parse()
        .with_context(|| format!("Invalid sender address {}", cfg.from_addr))?;
    let mut builder = Message::builder().from(from).subject(cfg.subject.clone());
    for to in &cfg.to_addrs {
        let mailbox: Mailbox = to
            .parse()
            .with_context(|| format!("Invalid recipient address {}", to))?;
        builder = builder.to(mailbox);
    }

    let content_type = ContentType::parse(file_type.mime_type())
        .map_err(|e| anyhow!("invalid attachment content type: {}", e))?;
    let attachment = Attachment::new(file_name).body(content, content_type);

    let body = cfg.body.clone().unwrap_or_default();
    let multipart = MultiPart::mixed()
        .singlepart(SinglePart::plain(body))
        .singlepart(attachment);

    builder
        .multipart(multipart)
        .context("Failed to build report email")
}

fn build_transport(cfg: &EmailConfig) -> Result<AsyncSmtpTransport<Tokio1Executor>> {
    let mut builder = if cfg.tls {
        AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(&cfg.smtp_server)
            .with_context(|| format!("Failed to configure STARTTLS for {}", cfg.smtp_server))?
    } else {
        AsyncSmtpTransport::<Tokio1Executor>::builder_dangerous(&cfg.smtp_server)
    };
    builder = builder.port(cfg.smtp_port);
    if let Some((username, password)) = &cfg.credentials {
        builder = builder.credentials(Credentials::new(username.clone(), password.clone()));
    }
    Ok(builder.build())
}

/// Emails the report. Send failures are returned to the caller.
pub async fn send_report(cfg: &EmailConfig, report: &Path, file_type: FileType) -> Result<()> {
    let message = build_report_message(cfg, report, file_type)?;
    let transport = build_transport(cfg)?;

    info!("Emailing file {} to {:?}", report.display(), cfg.to_addrs);
    transport
        .send(message)
        .await
        .with_context(|| {
            format!("Failed to send report via {}:{}", cfg.smtp_server, cfg.smtp_port)
        })?;
    Ok(())
}
