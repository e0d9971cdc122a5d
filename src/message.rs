//! Provider-agnostic message the decision core works on.

use std::fmt;

/// An outbound SMS as seen by the guard.
///
/// Built by an [`Adapter`](crate::interceptor::Adapter) right before
/// interception and dropped once the call returns. `original` borrows the
/// provider's own message; the core only ever formats it with `Debug`.
#[derive(Clone, Copy)]
pub struct Message<'a> {
    /// Name or phone number of the sender.
    pub from: &'a str,
    /// Phone number of the recipient.
    pub to: &'a str,
    /// Body of the SMS.
    pub text: &'a str,
    /// The provider-native message, unmapped.
    pub original: &'a dyn fmt::Debug,
}

impl<'a> Message<'a> {
    pub fn new(from: &'a str, to: &'a str, text: &'a str, original: &'a dyn fmt::Debug) -> Self {
        Self {
            from,
            to,
            text,
            original,
        }
    }
}

impl fmt::Debug for Message<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Message")
            .field("from", &self.from)
            .field("to", &self.to)
            .field("text", &self.text)
            .finish_non_exhaustive()
    }
}

/// A message rewritten by the redirect mechanism.
///
/// Owned, so the adapter can move the provider message while applying it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Redirected {
    pub to: String,
    pub text: String,
}

/// Text marker appended to redirected messages: `"<text> (SmsSafe: <to>)"`.
pub fn redirect_text(message: &Message<'_>) -> String {
    format!("{} (SmsSafe: {})", message.text, message.to)
}
