//! Email delivery for the `email` mechanism — SMTP via lettre.

use std::fmt::Display;

use lettre::transport::smtp::authentication::Credentials;
use lettre::{SmtpTransport, Transport};
use secrecy::{ExposeSecret, SecretString};

use crate::error::{ConfigError, DeliveryError};

/// Anything that can deliver a built email synchronously.
///
/// Implemented for every lettre [`Transport`], so `SmtpTransport`,
/// `StubTransport` or a custom recorder can be plugged in.
pub trait Mailer: Send + Sync {
    fn deliver(&self, email: &lettre::Message) -> Result<(), DeliveryError>;
}

impl<T> Mailer for T
where
    T: Transport + Send + Sync,
    T::Error: Display,
{
    fn deliver(&self, email: &lettre::Message) -> Result<(), DeliveryError> {
        self.send(email)
            .map(|_| ())
            .map_err(|e| DeliveryError::Send(e.to_string()))
    }
}

// ── Configuration ───────────────────────────────────────────────────

/// SMTP settings, built from environment variables.
#[derive(Debug, Clone)]
pub struct SmtpConfig {
    pub host: String,
    pub port: u16,
    pub username: String,
    pub password: SecretString,
}

impl SmtpConfig {
    /// Build config from environment variables.
    /// Returns `Ok(None)` if `SMS_SAFE_SMTP_HOST` is not set (email delivery disabled).
    pub fn from_env() -> Result<Option<Self>, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub(crate) fn from_lookup<F>(lookup: F) -> Result<Option<Self>, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let Some(host) = lookup("SMS_SAFE_SMTP_HOST") else {
            return Ok(None);
        };

        let port = match lookup("SMS_SAFE_SMTP_PORT") {
            Some(port) => port.trim().parse().map_err(|e| ConfigError::InvalidValue {
                key: "SMS_SAFE_SMTP_PORT".into(),
                message: format!("{port:?}: {e}"),
            })?,
            None => 587,
        };

        Ok(Some(Self {
            host,
            port,
            username: lookup("SMS_SAFE_SMTP_USERNAME").unwrap_or_default(),
            password: SecretString::from(lookup("SMS_SAFE_SMTP_PASSWORD").unwrap_or_default()),
        }))
    }

    /// Build a relay transport for these settings.
    pub fn transport(&self) -> Result<SmtpTransport, DeliveryError> {
        let creds = Credentials::new(
            self.username.clone(),
            self.password.expose_secret().to_string(),
        );

        let transport = SmtpTransport::relay(&self.host)
            .map_err(|e| DeliveryError::Relay(e.to_string()))?
            .port(self.port)
            .credentials(creds)
            .build();

        tracing::info!(host = %self.host, port = self.port, "SMTP transport ready");
        Ok(transport)
    }
}
