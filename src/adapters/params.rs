//! Parameter-map messages, as passed to Twilio- and Nexmo-style clients.
//!
//! Both take a flat map of request parameters; they differ only in the name
//! of the body field (`body` for Twilio, `text` for Nexmo).

use serde_json::Value;

use crate::interceptor::Adapter;
use crate::message::{Message, Redirected};

/// Request parameters of a send call.
pub type Params = serde_json::Map<String, Value>;

/// Adapter for [`Params`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ParamsAdapter {
    body_key: &'static str,
}

impl ParamsAdapter {
    /// Twilio: `{ from, to, body }`.
    pub fn twilio() -> Self {
        Self { body_key: "body" }
    }

    /// Nexmo: `{ from, to, text }`.
    pub fn nexmo() -> Self {
        Self { body_key: "text" }
    }

    pub fn body_key(&self) -> &'static str {
        self.body_key
    }
}

/// Missing or non-string parameters read as empty.
fn field<'a>(params: &'a Params, key: &str) -> &'a str {
    params.get(key).and_then(Value::as_str).unwrap_or_default()
}

impl Adapter for ParamsAdapter {
    type Provider = Params;

    fn to_generic<'a>(&self, params: &'a Params) -> Message<'a> {
        Message::new(
            field(params, "from"),
            field(params, "to"),
            field(params, self.body_key),
            params,
        )
    }

    fn redirect(&self, mut params: Params, redirected: Redirected) -> Params {
        params.insert("to".into(), Value::String(redirected.to));
        params.insert(self.body_key.into(), Value::String(redirected.text));
        params
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    fn params(value: Value) -> Params {
        match value {
            Value::Object(map) => map,
            other => panic!("Expected object, got {other:?}"),
        }
    }

    #[test]
    fn twilio_reads_body_field() {
        let p = params(json!({ "from": "+1000", "to": "+2000", "body": "Foo" }));
        let generic = ParamsAdapter::twilio().to_generic(&p);
        assert_eq!(
            (generic.from, generic.to, generic.text),
            ("+1000", "+2000", "Foo")
        );
    }

    #[test]
    fn nexmo_reads_text_field() {
        let p = params(json!({ "from": "+1000", "to": "+2000", "text": "Foo" }));
        let generic = ParamsAdapter::nexmo().to_generic(&p);
        assert_eq!(generic.text, "Foo");
    }

    #[test]
    fn missing_fields_read_as_empty() {
        let p = params(json!({ "to": 42 }));
        let generic = ParamsAdapter::nexmo().to_generic(&p);
        assert_eq!((generic.from, generic.to, generic.text), ("", "", ""));
    }

    #[test]
    fn redirect_overwrites_only_recipient_and_body() {
        let p = params(json!({
            "from": "+1000",
            "to": "+2000",
            "body": "Foo",
            "status_callback": "https://example.com/cb"
        }));
        let redirected = ParamsAdapter::twilio().redirect(
            p,
            Redirected {
                to: "+1000".into(),
                text: "Foo (SmsSafe: +2000)".into(),
            },
        );
        assert_eq!(
            Value::Object(redirected),
            json!({
                "from": "+1000",
                "to": "+1000",
                "body": "Foo (SmsSafe: +2000)",
                "status_callback": "https://example.com/cb"
            })
        );
    }
}
