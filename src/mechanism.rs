//! What happens to an intercepted message.
//!
//! [`resolve`] turns the configured mechanism into an [`Interception`]
//! (pure, apart from calling target functions). The interception is then
//! executed either on the calling thread ([`Interception::execute`]) or on a
//! tokio runtime ([`Interception::execute_async`]).

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use lettre::message::Mailbox;
use lettre::message::header::ContentType;
use tracing::info;

use crate::config::{Mechanism, Settings};
use crate::error::{ConfigError, DeliveryError, Result};
use crate::mail::Mailer;
use crate::message::{Message, Redirected, redirect_text};
use crate::targets;

/// The action decided for an external message.
#[derive(Debug)]
pub enum Interception {
    /// Send this instead of the original.
    Redirect(Redirected),
    /// Deliver this email and drop the SMS.
    Email(Box<lettre::Message>),
    /// Drop the SMS, optionally after a delay.
    Discard(Option<Duration>),
}

/// Decide what to do with an external message under the current settings.
pub fn resolve(message: &Message<'_>, settings: &Settings) -> Result<Interception> {
    match &settings.intercept_mechanism {
        Mechanism::Redirect => {
            let to = targets::redirect_target(settings.redirect_target.as_ref(), message)?;
            info!(
                from = %message.from,
                original_to = %message.to,
                %to,
                "Redirecting intercepted SMS"
            );
            Ok(Interception::Redirect(Redirected {
                to,
                text: redirect_text(message),
            }))
        }
        Mechanism::Email => {
            let recipient = targets::email_target(settings.email_target.as_ref(), message)?;
            info!(
                from = %message.from,
                original_to = %message.to,
                %recipient,
                "Emailing intercepted SMS"
            );
            let email = build_email(message, &recipient)?;
            Ok(Interception::Email(Box::new(email)))
        }
        Mechanism::Discard => {
            let delay = discard_delay(settings.discard_delay_ms);
            info!(
                from = %message.from,
                original_to = %message.to,
                ?delay,
                "Discarding intercepted SMS"
            );
            Ok(Interception::Discard(delay))
        }
        Mechanism::Unrecognized(name) => Err(ConfigError::invalid_setting(
            "intercept_mechanism",
            format!("ensure it is either redirect, email or discard. It was: {name:?}"),
        )
        .into()),
    }
}

impl Interception {
    /// Carry out the interception on the calling thread.
    ///
    /// Returns the message to send in place of the original, or `None` if
    /// nothing should be sent.
    pub fn execute(self, mailer: Option<&dyn Mailer>) -> Result<Option<Redirected>> {
        match self {
            Self::Redirect(redirected) => Ok(Some(redirected)),
            Self::Email(email) => {
                let mailer = mailer.ok_or(DeliveryError::NoMailer)?;
                mailer.deliver(&email)?;
                info!("Intercepted SMS delivered by email");
                Ok(None)
            }
            Self::Discard(delay) => {
                if let Some(delay) = delay {
                    std::thread::sleep(delay);
                }
                Ok(None)
            }
        }
    }

    /// Carry out the interception without blocking the runtime: the delay
    /// is a tokio sleep and the SMTP send runs on the blocking pool.
    pub async fn execute_async(
        self,
        mailer: Option<Arc<dyn Mailer>>,
    ) -> Result<Option<Redirected>> {
        match self {
            Self::Redirect(redirected) => Ok(Some(redirected)),
            Self::Email(email) => {
                let mailer = mailer.ok_or(DeliveryError::NoMailer)?;
                tokio::task::spawn_blocking(move || mailer.deliver(&email))
                    .await
                    .map_err(|e| DeliveryError::Send(format!("mail task failed: {e}")))??;
                info!("Intercepted SMS delivered by email");
                Ok(None)
            }
            Self::Discard(delay) => {
                if let Some(delay) = delay {
                    tokio::time::sleep(delay).await;
                }
                Ok(None)
            }
        }
    }
}

/// Zero, negative and unset delays mean no sleep at all.
fn discard_delay(delay_ms: Option<i64>) -> Option<Duration> {
    delay_ms
        .filter(|ms| *ms > 0)
        .map(|ms| Duration::from_millis(ms.unsigned_abs()))
}

/// Build the email that replaces an intercepted SMS. Sent from and to `recipient`.
fn build_email(
    message: &Message<'_>,
    recipient: &str,
) -> std::result::Result<lettre::Message, DeliveryError> {
    let mailbox: Mailbox = recipient.parse().map_err(|e| DeliveryError::Address {
        address: recipient.to_string(),
        reason: format!("{e}"),
    })?;

    let body = format!(
        "This email was originally an SMS that SmsSafe intercepted:\n\
         \n\
         From: {}\n\
         To: {}\n\
         Text: {}\n\
         Intercepted at: {}\n\
         \n\
         Full object: {:#?}\n",
        message.from,
        message.to,
        message.text,
        Utc::now().to_rfc3339(),
        message.original,
    );

    // Header values must stay on one line.
    let subject = format!("SmsSafe: {} - {}", message.to, message.text).replace(['\r', '\n'], " ");

    lettre::Message::builder()
        .from(mailbox.clone())
        .to(mailbox)
        .subject(subject)
        .header(ContentType::TEXT_PLAIN)
        .body(body)
        .map_err(|e| DeliveryError::Build(e.to_string()))
}
