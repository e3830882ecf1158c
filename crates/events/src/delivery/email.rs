//! SMTP channel for email-worthy notifications.
//!
//! Mails go to the owners and admins of the tenant, in French, as plain text.
//! SMTP is optional: without `SMTP_HOST` the dispatcher only writes in-app
//! notifications.

use atelier_core::notification::{event_types, NotificationEvent};
use lettre::message::header::ContentType;
use lettre::message::Mailbox;
use lettre::transport::smtp::authentication::Credentials;
use lettre::{AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor};

#[derive(Debug, thiserror::Error)]
pub enum EmailError {
    #[error("SMTP error: {0}")]
    Transport(#[from] lettre::transport::smtp::Error),

    /// Sender or recipient is not a valid mailbox.
    #[error("Invalid email address: {0}")]
    Address(#[from] lettre::address::AddressError),

    #[error("Could not build email: {0}")]
    Build(String),
}

const DEFAULT_SMTP_PORT: u16 = 587;
const DEFAULT_FROM_ADDRESS: &str = "noreply@atelier.local";

/// SMTP relay settings.
#[derive(Debug, Clone)]
pub struct EmailConfig {
    pub smtp_host: String,
    /// STARTTLS port, 587 unless `SMTP_PORT` says otherwise.
    pub smtp_port: u16,
    pub from_address: String,
    pub smtp_user: Option<String>,
    pub smtp_password: Option<String>,
}

impl EmailConfig {
    /// Read `SMTP_HOST`, `SMTP_PORT`, `SMTP_FROM`, `SMTP_USER` and
    /// `SMTP_PASSWORD`. `None` when no host is configured.
    pub fn from_env() -> Option<Self> {
        let smtp_host = std::env::var("SMTP_HOST").ok().filter(|h| !h.is_empty())?;
        let smtp_port = match std::env::var("SMTP_PORT") {
            Ok(raw) => raw.parse().unwrap_or_else(|_| {
                tracing::warn!(value = %raw, "Ignoring invalid SMTP_PORT");
                DEFAULT_SMTP_PORT
            }),
            Err(_) => DEFAULT_SMTP_PORT,
        };

        Some(Self {
            smtp_host,
            smtp_port,
            from_address: std::env::var("SMTP_FROM")
                .unwrap_or_else(|_| DEFAULT_FROM_ADDRESS.to_string()),
            smtp_user: std::env::var("SMTP_USER").ok(),
            smtp_password: std::env::var("SMTP_PASSWORD").ok(),
        })
    }

    fn credentials(&self) -> Option<Credentials> {
        match (&self.smtp_user, &self.smtp_password) {
            (Some(user), Some(password)) => Some(Credentials::new(user.clone(), password.clone())),
            _ => None,
        }
    }
}

fn data_str<'a>(event: &'a NotificationEvent, key: &str) -> &'a str {
    event.data.get(key).and_then(|v| v.as_str()).unwrap_or("?")
}

pub fn subject_for(event: &NotificationEvent) -> String {
    match event.event_type.as_str() {
        event_types::QUOTE_SIGNED => format!(
            "[Atelier] Devis {} signé par {}",
            data_str(event, "numero"),
            data_str(event, "signer_name")
        ),
        event_types::INVOICE_PAID => {
            format!("[Atelier] Facture {} payée", data_str(event, "numero"))
        }
        event_types::STOCK_ALERT => format!(
            "[Atelier] Stock bas : {} ({})",
            data_str(event, "name"),
            data_str(event, "reference")
        ),
        other => format!("[Atelier] {other}"),
    }
}

pub fn body_for(event: &NotificationEvent) -> String {
    format!(
        "Événement : {}\nDate : {}\nDétails :\n{}",
        event.event_type,
        event.timestamp.format("%d/%m/%Y %H:%M UTC"),
        serde_json::to_string_pretty(&event.data).unwrap_or_default()
    )
}

/// Emails notification events through the configured relay.
pub struct EmailDelivery {
    config: EmailConfig,
}

impl EmailDelivery {
    pub fn new(config: EmailConfig) -> Self {
        Self { config }
    }

    /// Build the message for `to` without sending it.
    pub fn compose(&self, to: &str, event: &NotificationEvent) -> Result<Message, EmailError> {
        let from: Mailbox = self.config.from_address.parse()?;
        let to: Mailbox = to.parse()?;

        Message::builder()
            .from(from)
            .to(to)
            .subject(subject_for(event))
            .header(ContentType::TEXT_PLAIN)
            .body(body_for(event))
            .map_err(|e| EmailError::Build(e.to_string()))
    }

    /// Send `event` to one recipient.
    pub async fn deliver(&self, to: &str, event: &NotificationEvent) -> Result<(), EmailError> {
        let message = self.compose(to, event)?;

        let mut relay = AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(&self.config.smtp_host)?
            .port(self.config.smtp_port);
        if let Some(credentials) = self.config.credentials() {
            relay = relay.credentials(credentials);
        }
        relay.build().send(message).await?;

        tracing::info!(
            to,
            tenant_id = %event.tenant_id,
            event_type = %event.event_type,
            "Notification email sent",
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;
    use atelier_core::types::DbId;

    fn delivery(from_address: &str) -> EmailDelivery {
        EmailDelivery::new(EmailConfig {
            smtp_host: "localhost".into(),
            smtp_port: 2525,
            from_address: from_address.into(),
            smtp_user: Some("atelier".into()),
            smtp_password: None,
        })
    }

    #[test]
    fn quote_signed_subject_names_signer() {
        let event = NotificationEvent::new(event_types::QUOTE_SIGNED, DbId::nil()).with_data(
            serde_json::json!({"numero": "DEV-2026-0012", "signer_name": "Jean Martin"}),
        );
        assert_eq!(subject_for(&event), "[Atelier] Devis DEV-2026-0012 signé par Jean Martin");
    }

    #[test]
    fn stock_alert_subject_names_powder() {
        let event = NotificationEvent::new(event_types::STOCK_ALERT, DbId::nil())
            .with_data(serde_json::json!({"name": "Noir sablé", "reference": "RAL-9005"}));
        assert_eq!(subject_for(&event), "[Atelier] Stock bas : Noir sablé (RAL-9005)");
    }

    #[test]
    fn missing_data_renders_placeholder() {
        let event = NotificationEvent::new(event_types::INVOICE_PAID, DbId::nil());
        assert_eq!(subject_for(&event), "[Atelier] Facture ? payée");
    }

    #[test]
    fn unknown_event_subject_falls_back_to_type() {
        let event = NotificationEvent::new("project.status_changed", DbId::nil());
        assert_eq!(subject_for(&event), "[Atelier] project.status_changed");
    }

    #[test]
    fn body_includes_details() {
        let event = NotificationEvent::new(event_types::STOCK_ALERT, DbId::nil())
            .with_data(serde_json::json!({"reference": "RAL-9005"}));
        let body = body_for(&event);
        assert!(body.contains("stock.alert"));
        assert!(body.contains("RAL-9005"));
    }

    #[test]
    fn compose_rejects_bad_recipient() {
        let event = NotificationEvent::new(event_types::INVOICE_PAID, DbId::nil());
        let err = delivery("noreply@atelier.local")
            .compose("patron-at-atelier", &event)
            .unwrap_err();
        assert_matches!(err, EmailError::Address(_));
    }

    #[test]
    fn compose_accepts_valid_mailboxes() {
        let event = NotificationEvent::new(event_types::INVOICE_PAID, DbId::nil());
        assert!(delivery("noreply@atelier.local")
            .compose("patron@atelier.example", &event)
            .is_ok());
    }

    #[test]
    fn credentials_need_user_and_password() {
        assert!(delivery("noreply@atelier.local").config.credentials().is_none());
    }
}
