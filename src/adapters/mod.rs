//! Provider adapters.
//!
//! Each adapter maps one SMS library's message shape to the generic
//! [`Message`](crate::message::Message) and applies redirects back onto it.
//! No decision logic lives here.

pub mod params;
pub mod text_message;

pub use params::{Params, ParamsAdapter};
pub use text_message::{TextMessage, TextMessageAdapter};
