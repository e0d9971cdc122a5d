//! ActionTexter-style message struct.

use serde::{Deserialize, Serialize};

use crate::interceptor::Adapter;
use crate::message::{Message, Redirected};

/// An SMS represented as a struct, with an optional client reference.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TextMessage {
    pub from: String,
    pub to: String,
    pub text: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reference: Option<String>,
}

impl TextMessage {
    pub fn new(from: impl Into<String>, to: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            from: from.into(),
            to: to.into(),
            text: text.into(),
            reference: None,
        }
    }

    pub fn with_reference(mut self, reference: impl Into<String>) -> Self {
        self.reference = Some(reference.into());
        self
    }
}

/// Adapter for [`TextMessage`].
#[derive(Debug, Clone, Copy, Default)]
pub struct TextMessageAdapter;

impl Adapter for TextMessageAdapter {
    type Provider = TextMessage;

    fn to_generic<'a>(&self, message: &'a TextMessage) -> Message<'a> {
        Message::new(&message.from, &message.to, &message.text, message)
    }

    fn redirect(&self, mut message: TextMessage, redirected: Redirected) -> TextMessage {
        message.to = redirected.to;
        message.text = redirected.text;
        message
    }
}
