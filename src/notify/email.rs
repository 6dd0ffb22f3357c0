use anyhow::{Context, Result};
use async_trait::async_trait;
use lettre::message::header::{ContentType, Header, HeaderName, HeaderValue};
use lettre::message::Mailbox;
use lettre::transport::smtp::authentication::Credentials;
use lettre::{AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor};
use std::error::Error as StdError;

use super::template::{alert_subject, AlertRenderer};
use super::Notifier;
use crate::error::NotifyError;
use crate::types::{Config, FailedServiceRecord, SmtpConfig};

/// `X-Priority: 1` marks alerts as high priority in most mail clients.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct XPriority(u8);

impl Header for XPriority {
    fn name() -> HeaderName {
        HeaderName::new_from_ascii_str("X-Priority")
    }

    fn parse(s: &str) -> Result<Self, Box<dyn StdError + Send + Sync>> {
        Ok(XPriority(s.trim().parse()?))
    }

    fn display(&self) -> HeaderValue {
        HeaderValue::new(Self::name(), self.0.to_string())
    }
}

/// Sends HTML alert mails over SMTP.
///
/// The owner is the primary recipient; the team DL and the operations
/// mailbox are copied.
pub struct EmailNotifier {
    transport: AsyncSmtpTransport<Tokio1Executor>,
    renderer: AlertRenderer,
    from: Mailbox,
    operations_mailbox: Mailbox,
}

impl EmailNotifier {
    pub fn from_config(cfg: &Config) -> Result<Self> {
        let transport = build_transport(&cfg.smtp)?;
        let renderer = AlertRenderer::new(cfg.cluster_name.clone(), cfg.smtp.operations_mailbox.clone())
            .context("Failed to compile alert template")?;
        let from = cfg.smtp.from.parse::<Mailbox>().context("Invalid smtp.from address")?;
        let operations_mailbox = cfg
            .smtp
            .operations_mailbox
            .parse::<Mailbox>()
            .context("Invalid smtp.operations_mailbox address")?;

        Ok(Self {
            transport,
            renderer,
            from,
            operations_mailbox,
        })
    }

    /// Build the alert message without sending it.
    pub fn build_message(&self, record: &FailedServiceRecord) -> Result<Message, NotifyError> {
        let body = self.renderer.render(record)?;
        let owner = parse_mailbox(&record.workload.owner_email)?;
        let team_dl = parse_mailbox(&record.workload.owner_dl_email)?;

        let message = Message::builder()
            .from(self.from.clone())
            .to(owner)
            .cc(team_dl)
            .cc(self.operations_mailbox.clone())
            .subject(alert_subject(record))
            .header(ContentType::TEXT_HTML)
            .header(XPriority(1))
            .body(body)?;
        Ok(message)
    }
}

#[async_trait]
impl Notifier for EmailNotifier {
    async fn send(&self, record: &FailedServiceRecord) -> Result<(), NotifyError> {
        let message = self.build_message(record)?;
        self.transport.send(message).await?;
        Ok(())
    }
}

fn parse_mailbox(address: &str) -> Result<Mailbox, NotifyError> {
    address.parse().map_err(|source| NotifyError::Address {
        address: address.to_string(),
        source,
    })
}

fn build_transport(smtp: &SmtpConfig) -> Result<AsyncSmtpTransport<Tokio1Executor>> {
    if smtp.no_auth {
        // Whitelisted relay: plain connection, no credentials
        return Ok(AsyncSmtpTransport::<Tokio1Executor>::builder_dangerous(&smtp.host)
            .port(smtp.port)
            .build());
    }

    let creds = Credentials::new(
        smtp.username.clone().unwrap_or_default(),
        smtp.password.clone().unwrap_or_default(),
    );
    Ok(AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(&smtp.host)
        .context("Failed to create SMTP transport")?
        .port(smtp.port)
        .credentials(creds)
        .build())
}
