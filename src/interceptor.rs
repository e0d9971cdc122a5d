//! The interception engine.
//!
//! Every outbound SMS flows through:
//! 1. `Adapter::to_generic()` — provider-specific mapping
//! 2. `rules::is_external()` — internal recipients pass through untouched
//! 3. `mechanism::resolve()` — redirect, email or discard
//! 4. `Adapter::redirect()` — only when the result is a redirected message

use std::fmt;
use std::sync::Arc;

use tracing::debug;

use crate::config::{self, SettingsHandle};
use crate::error::Result;
use crate::mail::Mailer;
use crate::mechanism::{self, Interception};
use crate::message::{Message, Redirected};
use crate::rules;

/// Maps one provider's message type to and from the generic [`Message`].
pub trait Adapter: Send + Sync {
    /// The provider-native message.
    type Provider: fmt::Debug;

    /// View a provider message as a generic one.
    fn to_generic<'a>(&self, message: &'a Self::Provider) -> Message<'a>;

    /// Apply a redirect: overwrite recipient and body, keep every other attribute.
    fn redirect(&self, message: Self::Provider, redirected: Redirected) -> Self::Provider;
}

/// Decides, per message, whether to let an SMS through or intercept it.
pub struct Interceptor<A> {
    adapter: A,
    settings: Arc<SettingsHandle>,
    mailer: Option<Arc<dyn Mailer>>,
    global_mailer: bool,
}

impl<A: Adapter> Interceptor<A> {
    /// An interceptor reading the process-wide settings and, unless
    /// [`with_mailer`](Self::with_mailer) is used, the process-wide mailer.
    pub fn new(adapter: A) -> Self {
        Self {
            global_mailer: true,
            ..Self::with_settings(adapter, config::configuration())
        }
    }

    /// An interceptor reading its own settings handle.
    pub fn with_settings(adapter: A, settings: Arc<SettingsHandle>) -> Self {
        Self {
            adapter,
            settings,
            mailer: None,
            global_mailer: false,
        }
    }

    /// Mailer used by the `email` mechanism.
    pub fn with_mailer(mut self, mailer: Arc<dyn Mailer>) -> Self {
        self.mailer = Some(mailer);
        self
    }

    pub fn adapter(&self) -> &A {
        &self.adapter
    }

    pub fn settings(&self) -> &Arc<SettingsHandle> {
        &self.settings
    }

    /// Process an outgoing message.
    ///
    /// Returns the message to send — the original itself if the recipient is
    /// internal, a redirected copy otherwise — or `None` if nothing should be
    /// sent. Configuration errors propagate unchanged.
    pub fn process(&self, message: A::Provider) -> Result<Option<A::Provider>> {
        let Some(interception) = self.decide(&message)? else {
            return Ok(Some(message));
        };
        let mailer = self.mailer();
        let outcome = interception.execute(mailer.as_deref())?;
        Ok(outcome.map(|redirected| self.adapter.redirect(message, redirected)))
    }

    /// Same as [`process`](Self::process), but never blocks the async runtime.
    pub async fn process_async(&self, message: A::Provider) -> Result<Option<A::Provider>> {
        let Some(interception) = self.decide(&message)? else {
            return Ok(Some(message));
        };
        let outcome = interception.execute_async(self.mailer()).await?;
        Ok(outcome.map(|redirected| self.adapter.redirect(message, redirected)))
    }

    fn mailer(&self) -> Option<Arc<dyn Mailer>> {
        match &self.mailer {
            Some(mailer) => Some(Arc::clone(mailer)),
            None if self.global_mailer => config::mailer(),
            None => None,
        }
    }

    /// `None` for internal recipients, the planned interception otherwise.
    fn decide(&self, message: &A::Provider) -> Result<Option<Interception>> {
        let generic = self.adapter.to_generic(message);

        let settings = self.settings.snapshot();
        if !rules::is_external(&generic, &settings.internal_phone_numbers)? {
            debug!(to = %generic.to, "Internal recipient, letting SMS through");
            return Ok(None);
        }

        Ok(Some(mechanism::resolve(&generic, &settings)?))
    }
}
