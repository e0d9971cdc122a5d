//! Internal-recipient matching.
//!
//! A message is internal if *any* configured rule matches it, and external
//! otherwise. An empty rule list makes every message external.

use tracing::debug;

use crate::config::Rule;
use crate::error::ConfigError;
use crate::message::Message;

/// Decide whether `message` goes to an external recipient and must be intercepted.
///
/// Rules are tried in order and the first match wins. An `Unsupported` rule
/// reached before any match aborts with [`ConfigError::InvalidSetting`].
pub fn is_external(message: &Message<'_>, rules: &[Rule]) -> Result<bool, ConfigError> {
    for rule in rules {
        if matches(rule, message)? {
            debug!(to = %message.to, rule = ?rule, "Recipient matched internal rule");
            return Ok(false);
        }
    }
    Ok(true)
}

fn matches(rule: &Rule, message: &Message<'_>) -> Result<bool, ConfigError> {
    match rule {
        Rule::Exact(number) => Ok(message.to == number),
        Rule::Pattern(regex) => Ok(regex.is_match(message.to)),
        Rule::Predicate(predicate) => Ok(predicate(message)),
        Rule::Unsupported(value) => Err(ConfigError::invalid_setting(
            "internal_phone_numbers",
            format!(
                "ensure it is a String, a Regex or a predicate (or a list of them). It was: {value}"
            ),
        )),
    }
}
