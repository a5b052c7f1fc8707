//! Digest delivery to the configured sinks.
//!
//! Each sink is optional: a sink with no destination configured is skipped
//! without error. Sinks are delivered one after another by default, and the
//! first failure stops the run. In parallel mode every sink is attempted and
//! all failures are reported together.

pub mod smtp;
pub mod webhook;

pub use smtp::EmailPublisher;
pub use webhook::WebhookPublisher;

use crate::config::Config;
use crate::error::DeliveryError;
use crate::models::StatsSummary;
use crate::report::{render_chat_payload, render_email_html};
use tracing::info;

/// A delivery target with its destination resolved.
pub enum Sink {
    Webhook(WebhookPublisher),
    Email(EmailPublisher),
}

impl Sink {
    pub fn name(&self) -> &'static str {
        match self {
            Sink::Webhook(_) => "webhook",
            Sink::Email(_) => "email",
        }
    }

    /// Render the summary in this sink's format and deliver it.
    pub async fn deliver(&self, summary: &StatsSummary, config: &Config) -> Result<(), DeliveryError> {
        match self {
            Sink::Webhook(publisher) => {
                let payload = render_chat_payload(
                    summary,
                    &config.digest.title,
                    config.digest.chat_overdue_limit,
                );
                publisher.send(&payload).await
            }
            Sink::Email(publisher) => {
                let html = render_email_html(
                    summary,
                    &config.email.subject,
                    config.digest.email_overdue_limit,
                );
                publisher.send(html).await
            }
        }
    }
}

/// Build the sinks that have a destination configured, chat first.
pub fn configured_sinks(config: &Config) -> Result<Vec<Sink>, DeliveryError> {
    let mut sinks = Vec::new();

    match config.webhook.url {
        Some(ref url) => sinks.push(Sink::Webhook(WebhookPublisher::new(
            url.clone(),
            config.tracker.timeout_seconds,
        )?)),
        None => info!("No webhook URL configured, skipping chat digest"),
    }

    match config.email.smtp_host {
        Some(ref host) => sinks.push(Sink::Email(EmailPublisher::new(
            host.clone(),
            config.email.clone(),
        ))),
        None => info!("No SMTP host configured, skipping email digest"),
    }

    Ok(sinks)
}

/// Deliver the summary to every sink. Returns the names of the sinks that
/// received it.
pub async fn deliver_all(
    sinks: &[Sink],
    summary: &StatsSummary,
    config: &Config,
) -> Result<Vec<&'static str>, DeliveryError> {
    if config.digest.parallel_delivery {
        deliver_concurrently(sinks, summary, config).await
    } else {
        deliver_sequentially(sinks, summary, config).await
    }
}

async fn deliver_sequentially(
    sinks: &[Sink],
    summary: &StatsSummary,
    config: &Config,
) -> Result<Vec<&'static str>, DeliveryError> {
    let mut delivered = Vec::new();

    for sink in sinks {
        info!("Delivering digest via {}", sink.name());
        sink.deliver(summary, config).await?;
        delivered.push(sink.name());
    }

    Ok(delivered)
}

async fn deliver_concurrently(
    sinks: &[Sink],
    summary: &StatsSummary,
    config: &Config,
) -> Result<Vec<&'static str>, DeliveryError> {
    info!("Delivering digest to {} sinks concurrently", sinks.len());

    let results =
        futures::future::join_all(sinks.iter().map(|sink| sink.deliver(summary, config))).await;

    let mut delivered = Vec::new();
    let mut failures = Vec::new();
    for (sink, result) in sinks.iter().zip(results) {
        match result {
            Ok(()) => delivered.push(sink.name()),
            Err(e) => {
                tracing::error!("Delivery via {} failed: {}", sink.name(), e);
                failures.push(e);
            }
        }
    }

    match failures.len() {
        0 => Ok(delivered),
        1 => Err(failures.remove(0)),
        _ => Err(DeliveryError::Multiple(failures)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::compute_stats;
    use crate::models::fixtures::{issue, now};
    use mockito::Server;

    fn summary() -> StatsSummary {
        compute_stats(&[issue("ENG-1")], now())
    }

    #[test]
    fn test_no_sinks_configured() {
        let sinks = configured_sinks(&Config::default()).unwrap();
        assert!(sinks.is_empty());
    }

    #[test]
    fn test_only_email_when_webhook_absent() {
        let mut config = Config::default();
        config.email.smtp_host = Some("smtp.example.com".to_string());

        let sinks = configured_sinks(&config).unwrap();
        let names: Vec<_> = sinks.iter().map(Sink::name).collect();
        assert_eq!(names, vec!["email"]);
    }

    #[test]
    fn test_chat_runs_before_email() {
        let mut config = Config::default();
        config.webhook.url = Some("https://hooks.example.com/x".to_string());
        config.email.smtp_host = Some("smtp.example.com".to_string());

        let sinks = configured_sinks(&config).unwrap();
        let names: Vec<_> = sinks.iter().map(Sink::name).collect();
        assert_eq!(names, vec!["webhook", "email"]);
    }

    #[tokio::test]
    async fn test_webhook_not_called_when_unconfigured() {
        let mut server = Server::new_async().await;
        let hook = server
            .mock("POST", "/hook")
            .with_status(204)
            .expect(1)
            .create_async()
            .await;

        let mut config = Config::default();
        config.email.smtp_host = Some("127.0.0.1".to_string());
        config.email.smtp_port = 1;

        // With the URL set, the webhook runs first and reaches the server.
        config.webhook.url = Some(format!("{}/hook", server.url()));
        let sinks = configured_sinks(&config).unwrap();
        let err = deliver_all(&sinks, &summary(), &config).await.unwrap_err();
        assert!(matches!(err, DeliveryError::Smtp(_)));

        // Without it, only the email sink is selected and the server sees nothing more.
        config.webhook.url = None;
        let sinks = configured_sinks(&config).unwrap();
        let names: Vec<_> = sinks.iter().map(Sink::name).collect();
        assert_eq!(names, vec!["email"]);

        let err = deliver_all(&sinks, &summary(), &config).await.unwrap_err();
        assert!(matches!(err, DeliveryError::Smtp(_)));
        hook.assert_async().await;
    }

    #[tokio::test]
    async fn test_sequential_failure_stops_later_sinks() {
        let mut server = Server::new_async().await;
        let hook = server
            .mock("POST", "/hook")
            .with_status(500)
            .expect(1)
            .create_async()
            .await;

        let mut config = Config::default();
        config.webhook.url = Some(format!("{}/hook", server.url()));
        config.email.smtp_host = Some("127.0.0.1".to_string());
        config.email.smtp_port = 1;

        let sinks = configured_sinks(&config).unwrap();
        let err = deliver_all(&sinks, &summary(), &config).await.unwrap_err();

        hook.assert_async().await;
        assert!(matches!(err, DeliveryError::WebhookStatus(..)));
    }

    #[tokio::test]
    async fn test_parallel_attempts_every_sink() {
        let mut server = Server::new_async().await;
        let hook = server
            .mock("POST", "/hook")
            .with_status(500)
            .expect(1)
            .create_async()
            .await;

        let mut config = Config::default();
        config.webhook.url = Some(format!("{}/hook", server.url()));
        config.email.smtp_host = Some("127.0.0.1".to_string());
        config.email.smtp_port = 1;
        config.digest.parallel_delivery = true;

        let sinks = configured_sinks(&config).unwrap();
        let err = deliver_all(&sinks, &summary(), &config).await.unwrap_err();

        hook.assert_async().await;
        match err {
            DeliveryError::Multiple(errors) => assert_eq!(errors.len(), 2),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[tokio::test]
    async fn test_successful_delivery_reports_sinks() {
        let mut server = Server::new_async().await;
        let hook = server
            .mock("POST", "/hook")
            .with_status(204)
            .expect(1)
            .create_async()
            .await;

        let mut config = Config::default();
        config.webhook.url = Some(format!("{}/hook", server.url()));

        let sinks = configured_sinks(&config).unwrap();
        let delivered = deliver_all(&sinks, &summary(), &config).await.unwrap();

        hook.assert_async().await;
        assert_eq!(delivered, vec!["webhook"]);
    }
}
