//! Routing a provider's send path through the interceptor.
//!
//! The real SMS client is wrapped in a [`GuardedTransport`]; every send goes
//! through [`Interceptor::process`] first and the client only sees what the
//! interceptor returns. A suppressed message never reaches the client.

use std::fmt;
use std::str::FromStr;

use tracing::debug;

use crate::adapters::{Params, ParamsAdapter, TextMessage, TextMessageAdapter};
use crate::error::{ConfigError, SendError};
use crate::interceptor::{Adapter, Interceptor};

/// The SMS libraries the guard can be hooked into.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Provider {
    ActionTexter,
    Twilio,
    Nexmo,
}

impl Provider {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::ActionTexter => "action_texter",
            Self::Twilio => "twilio",
            Self::Nexmo => "nexmo",
        }
    }
}

impl FromStr for Provider {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "action_texter" => Ok(Self::ActionTexter),
            "twilio" => Ok(Self::Twilio),
            "nexmo" => Ok(Self::Nexmo),
            _ => Err(ConfigError::invalid_setting(
                "texter_gem",
                format!("ensure it is either action_texter, twilio or nexmo. It was: {s:?}"),
            )),
        }
    }
}

impl fmt::Display for Provider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The actual outbound SMS client of a provider.
pub trait SmsTransport {
    type Message;
    type Receipt;
    type Error: std::error::Error + 'static;

    fn send(&self, message: Self::Message) -> Result<Self::Receipt, Self::Error>;
}

/// A transport whose sends are checked by an [`Interceptor`] first.
pub struct GuardedTransport<T, A> {
    inner: T,
    interceptor: Interceptor<A>,
}

impl<T, A> GuardedTransport<T, A>
where
    A: Adapter,
    T: SmsTransport<Message = A::Provider>,
{
    pub fn new(inner: T, interceptor: Interceptor<A>) -> Self {
        Self { inner, interceptor }
    }

    pub fn inner(&self) -> &T {
        &self.inner
    }

    pub fn interceptor(&self) -> &Interceptor<A> {
        &self.interceptor
    }

    /// Send `message`, or whatever the interceptor substitutes for it.
    ///
    /// `Ok(None)` means the interceptor suppressed the message and the
    /// inner transport was not called.
    pub fn send(&self, message: A::Provider) -> Result<Option<T::Receipt>, SendError<T::Error>> {
        let Some(message) = self.interceptor.process(message)? else {
            debug!("SMS suppressed, skipping transport");
            return Ok(None);
        };
        self.inner
            .send(message)
            .map(Some)
            .map_err(SendError::Transport)
    }
}

/// Guard a client that sends [`TextMessage`]s (ActionTexter style).
pub fn action_texter<T>(inner: T) -> GuardedTransport<T, TextMessageAdapter>
where
    T: SmsTransport<Message = TextMessage>,
{
    GuardedTransport::new(inner, Interceptor::new(TextMessageAdapter))
}

/// Guard a client that takes Twilio-style parameters.
pub fn twilio<T>(inner: T) -> GuardedTransport<T, ParamsAdapter>
where
    T: SmsTransport<Message = Params>,
{
    GuardedTransport::new(inner, Interceptor::new(ParamsAdapter::twilio()))
}

/// Guard a client that takes Nexmo-style parameters.
pub fn nexmo<T>(inner: T) -> GuardedTransport<T, ParamsAdapter>
where
    T: SmsTransport<Message = Params>,
{
    GuardedTransport::new(inner, Interceptor::new(ParamsAdapter::nexmo()))
}

#[cfg(test)]
mod tests {
    use std::convert::Infallible;
    use std::sync::{Arc, Mutex};

    use lettre::Transport;
    use lettre::address::Envelope;

    use super::*;
    use crate::config::{self, Mechanism, Settings, SettingsHandle};
    use crate::error::Error;

    /// Client that records what it was asked to send.
    #[derive(Default)]
    struct RecordingClient {
        deliveries: Mutex<Vec<TextMessage>>,
    }

    impl SmsTransport for RecordingClient {
        type Message = TextMessage;
        type Receipt = usize;
        type Error = Infallible;

        fn send(&self, message: TextMessage) -> Result<usize, Infallible> {
            let mut deliveries = self.deliveries.lock().unwrap();
            deliveries.push(message);
            Ok(deliveries.len())
        }
    }

    /// Mail transport that keeps every email instead of sending it.
    #[derive(Default)]
    struct MailRecorder {
        sent: Mutex<Vec<Envelope>>,
    }

    impl Transport for MailRecorder {
        type Ok = ();
        type Error = Infallible;

        fn send_raw(&self, envelope: &Envelope, _email: &[u8]) -> Result<(), Infallible> {
            self.sent.lock().unwrap().push(envelope.clone());
            Ok(())
        }
    }

    fn guarded(settings: Settings) -> GuardedTransport<RecordingClient, TextMessageAdapter> {
        let handle = Arc::new(SettingsHandle::new(settings));
        GuardedTransport::new(
            RecordingClient::default(),
            Interceptor::with_settings(TextMessageAdapter, handle),
        )
    }

    fn base_settings() -> Settings {
        Settings::default()
            .with_internal_numbers(["+447111222222"])
            .with_mechanism(Mechanism::Discard)
            .with_discard_delay_ms(None)
            .with_redirect_target("+447111222222")
    }

    #[test]
    fn provider_parses_known_names() {
        assert_eq!(
            "action_texter".parse::<Provider>().unwrap(),
            Provider::ActionTexter
        );
        assert_eq!("twilio".parse::<Provider>().unwrap(), Provider::Twilio);
        assert_eq!("nexmo".parse::<Provider>().unwrap(), Provider::Nexmo);
    }

    #[test]
    fn provider_rejects_unknown_names() {
        assert!("Twilio".parse::<Provider>().is_err());
        let err = "carrier_pigeon".parse::<Provider>().unwrap_err();
        assert!(matches!(
            err,
            ConfigError::InvalidSetting { ref key, .. } if key == "texter_gem"
        ));
    }

    #[test]
    fn discarded_message_never_reaches_client() {
        let transport = guarded(base_settings());
        let message = TextMessage::new("+447111222222", "+447222333444", "Foo");

        assert_eq!(transport.send(message).unwrap(), None);
        assert!(transport.inner().deliveries.lock().unwrap().is_empty());
    }

    #[test]
    fn redirected_message_reaches_client() {
        let transport = guarded(base_settings());
        transport
            .interceptor()
            .settings()
            .configure(|s| s.intercept_mechanism = Mechanism::Redirect);

        let message =
            TextMessage::new("+447111222222", "+447222333444", "Foo").with_reference("r");
        assert_eq!(transport.send(message).unwrap(), Some(1));

        let deliveries = transport.inner().deliveries.lock().unwrap();
        assert_eq!(deliveries[0].to, "+447111222222");
        assert_eq!(deliveries[0].text, "Foo (SmsSafe: +447222333444)");
        assert_eq!(deliveries[0].reference.as_deref(), Some("r"));
    }

    #[test]
    fn internal_message_reaches_client_unchanged() {
        let transport = guarded(base_settings());
        let message = TextMessage::new("+447222333444", "+447111222222", "Foo");

        assert_eq!(transport.send(message.clone()).unwrap(), Some(1));
        assert_eq!(transport.inner().deliveries.lock().unwrap()[0], message);
    }

    #[test]
    fn configuration_errors_surface_to_sender() {
        let settings = base_settings().with_mechanism(Mechanism::Unrecognized("x".into()));
        let transport = guarded(settings);
        let message = TextMessage::new("+447111222222", "+447222333444", "Foo");

        let err = transport.send(message).unwrap_err();
        assert!(matches!(err, SendError::Guard(Error::Config(_))));
        assert!(transport.inner().deliveries.lock().unwrap().is_empty());
    }

    #[test]
    fn email_mechanism_uses_the_process_wide_mailer() {
        let mailer = Arc::new(MailRecorder::default());
        config::set_mailer(mailer.clone());
        config::configuration().replace(
            Settings::default()
                .with_internal_numbers(["+447111222222"])
                .with_mechanism(Mechanism::Email)
                .with_email_target("qa@example.com"),
        );

        let transport = action_texter(RecordingClient::default());
        let message = TextMessage::new("+447111222222", "+447222333444", "Foo");

        assert_eq!(transport.send(message).unwrap(), None);
        assert_eq!(mailer.sent.lock().unwrap().len(), 1);
        assert!(transport.inner().deliveries.lock().unwrap().is_empty());
    }
}
