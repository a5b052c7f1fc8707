//! Email delivery over SMTP.
//!
//! Transport security follows the port: 465 uses implicit TLS, 587 uses
//! STARTTLS, anything else (e.g. a local relay on 25 or 1025) is plain.

use crate::config::EmailConfig;
use crate::error::DeliveryError;
use lettre::message::header::ContentType;
use lettre::message::Mailbox;
use lettre::transport::smtp::authentication::Credentials;
use lettre::{AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor};
use tracing::{debug, info};

/// Sends the HTML digest to the configured recipients.
pub struct EmailPublisher {
    config: EmailConfig,
    host: String,
}

impl EmailPublisher {
    /// `host` is the SMTP server; the rest comes from `config`.
    pub fn new(host: String, config: EmailConfig) -> Self {
        Self { config, host }
    }

    /// Build the message without sending it.
    pub fn build_message(&self, html: String) -> Result<Message, DeliveryError> {
        let from: Mailbox = self.config.from_address().parse()?;
        let mut builder = Message::builder()
            .from(from)
            .subject(self.config.subject.clone())
            .header(ContentType::TEXT_HTML);

        for recipient in self.config.to_addresses() {
            let to: Mailbox = recipient.parse()?;
            builder = builder.to(to);
        }

        Ok(builder.body(html)?)
    }

    fn transport(&self) -> Result<AsyncSmtpTransport<Tokio1Executor>, DeliveryError> {
        let port = self.config.smtp_port;
        let mut builder = match port {
            465 => AsyncSmtpTransport::<Tokio1Executor>::relay(&self.host)?,
            587 => AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(&self.host)?,
            _ => AsyncSmtpTransport::<Tokio1Executor>::builder_dangerous(&self.host),
        }
        .port(port);

        if let (Some(user), Some(password)) = (&self.config.smtp_user, &self.config.smtp_password) {
            builder = builder.credentials(Credentials::new(user.clone(), password.clone()));
        }

        Ok(builder.build())
    }

    /// Build and send the digest email.
    pub async fn send(&self, html: String) -> Result<(), DeliveryError> {
        let message = self.build_message(html)?;
        debug!("Connecting to SMTP server {}:{}", self.host, self.config.smtp_port);

        let response = self.transport()?.send(message).await?;

        info!(
            "SMTP server accepted digest for {} recipient(s) ({})",
            self.config.to_addresses().len(),
            response.code()
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config() -> EmailConfig {
        EmailConfig {
            smtp_host: Some("smtp.example.com".to_string()),
            from: Some("digest@example.com".to_string()),
            to: Some("ann@example.com, bob@example.com".to_string()),
            ..EmailConfig::default()
        }
    }

    #[test]
    fn test_build_message_headers() {
        let publisher = EmailPublisher::new("smtp.example.com".to_string(), config());
        let message = publisher
            .build_message("<p>hello</p>".to_string())
            .unwrap();
        let raw = String::from_utf8(message.formatted()).unwrap();

        assert!(raw.contains("From: digest@example.com"));
        assert!(raw.contains("ann@example.com"));
        assert!(raw.contains("bob@example.com"));
        assert!(raw.contains("Subject: Issue Digest"));
        assert!(raw.contains("text/html"));
    }

    #[test]
    fn test_build_message_uses_fallback_addresses() {
        let publisher = EmailPublisher::new(
            "smtp.example.com".to_string(),
            EmailConfig {
                smtp_user: Some("bot@example.com".to_string()),
                ..EmailConfig::default()
            },
        );
        let message = publisher.build_message("<p>hi</p>".to_string()).unwrap();
        let envelope = message.envelope();

        assert_eq!(envelope.from().map(|a| a.to_string()).as_deref(), Some("bot@example.com"));
        assert_eq!(envelope.to().len(), 1);
        assert_eq!(envelope.to()[0].to_string(), "bot@example.com");
    }

    #[test]
    fn test_invalid_address() {
        let publisher = EmailPublisher::new(
            "smtp.example.com".to_string(),
            EmailConfig {
                from: Some("not an address".to_string()),
                ..EmailConfig::default()
            },
        );

        let err = publisher.build_message(String::new()).unwrap_err();
        assert!(matches!(err, DeliveryError::Address(_)));
    }

    #[tokio::test]
    async fn test_unreachable_server_is_delivery_error() {
        let publisher = EmailPublisher::new(
            "127.0.0.1".to_string(),
            EmailConfig {
                smtp_port: 1,
                ..config()
            },
        );

        let err = publisher.send("<p>hi</p>".to_string()).await.unwrap_err();
        assert!(matches!(err, DeliveryError::Smtp(_)));
    }
}
