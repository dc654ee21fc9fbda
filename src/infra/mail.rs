//! SMTP delivery for outgoing mail.

use async_trait::async_trait;
use lettre::{
    AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor,
    message::{Mailbox, header::ContentType},
    transport::smtp::authentication::Credentials,
};
use tracing::info;

use crate::application::share::{MailError, Mailer, OutgoingEmail};
use crate::config::MailSettings;

use super::error::InfraError;

/// Mail transport backed by an SMTP relay. When no SMTP host is configured
/// the transport runs disabled: outgoing messages are logged and dropped,
/// which keeps local development working without a mail server.
pub struct SmtpMailer {
    transport: Option<AsyncSmtpTransport<Tokio1Executor>>,
    from: Mailbox,
}

impl SmtpMailer {
    pub fn from_settings(settings: &MailSettings) -> Result<Self, InfraError> {
        let from: Mailbox = settings.from.parse().map_err(|err| {
            InfraError::mail(format!(
                "invalid sender address `{}`: {err}",
                settings.from
            ))
        })?;

        if settings.smtp_host.trim().is_empty() {
            return Ok(Self {
                transport: None,
                from,
            });
        }

        let mut builder = if settings.use_starttls {
            AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(&settings.smtp_host)
        } else {
            AsyncSmtpTransport::<Tokio1Executor>::relay(&settings.smtp_host)
        }
        .map_err(|err| InfraError::mail(format!("failed to configure SMTP relay: {err}")))?
        .port(settings.smtp_port);

        if let (Some(username), Some(password)) =
            (settings.username.as_ref(), settings.password.as_ref())
        {
            builder = builder.credentials(Credentials::new(username.clone(), password.clone()));
        }

        Ok(Self {
            transport: Some(builder.build()),
            from,
        })
    }
}

#[async_trait]
impl Mailer for SmtpMailer {
    async fn send(&self, email: OutgoingEmail) -> Result<(), MailError> {
        let Some(transport) = self.transport.as_ref() else {
            info!(
                target = "quaderno::mail",
                to = %email.to,
                subject = %email.subject,
                "mail transport disabled; dropping message"
            );
            return Ok(());
        };

        let to: Mailbox = email
            .to
            .parse()
            .map_err(|_| MailError::InvalidAddress(email.to.clone()))?;

        let message = Message::builder()
            .from(self.from.clone())
            .to(to)
            .subject(email.subject)
            .header(ContentType::TEXT_PLAIN)
            .body(email.body)
            .map_err(|err| MailError::Transport(err.to_string()))?;

        transport
            .send(message)
            .await
            .map_err(|err| MailError::Transport(err.to_string()))?;

        Ok(())
    }
}
