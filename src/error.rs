//! Error types for sms-safe.

/// Top-level error type for the guard.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Delivery error: {0}")]
    Delivery(#[from] DeliveryError),
}

/// Configuration-related errors.
///
/// `InvalidSetting` is raised at decision time, when a message actually
/// needs the setting; it is never swallowed by the engine.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Invalid setting {key}: {message}")]
    InvalidSetting { key: String, message: String },

    #[error("Invalid configuration value for {key}: {message}")]
    InvalidValue { key: String, message: String },
}

impl ConfigError {
    pub(crate) fn invalid_setting(key: &str, message: impl Into<String>) -> Self {
        Self::InvalidSetting {
            key: key.to_string(),
            message: message.into(),
        }
    }
}

/// Email delivery errors for the `email` mechanism.
#[derive(Debug, thiserror::Error)]
pub enum DeliveryError {
    #[error("Invalid email address {address}: {reason}")]
    Address { address: String, reason: String },

    #[error("Failed to build email: {0}")]
    Build(String),

    #[error("Email send failed: {0}")]
    Send(String),

    #[error("SMTP relay error: {0}")]
    Relay(String),

    #[error("No mailer configured for the email mechanism")]
    NoMailer,
}

/// Failure of a send routed through a [`GuardedTransport`](crate::hooks::GuardedTransport).
#[derive(Debug, thiserror::Error)]
pub enum SendError<E>
where
    E: std::error::Error + 'static,
{
    #[error(transparent)]
    Guard(#[from] Error),

    #[error("SMS transport failed: {0}")]
    Transport(#[source] E),
}

/// Result type alias for the guard.
pub type Result<T> = std::result::Result<T, Error>;
