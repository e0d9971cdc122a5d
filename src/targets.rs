//! Resolution of redirect and email destinations.
//!
//! Targets are resolved on every call since a function target may depend on
//! the message or on load.

use crate::config::Target;
use crate::error::ConfigError;
use crate::message::Message;

/// Phone number a redirected message should go to.
pub fn redirect_target(
    target: Option<&Target>,
    message: &Message<'_>,
) -> Result<String, ConfigError> {
    resolve("redirect_target", target, message)
}

/// Email address an intercepted message should be sent to.
pub fn email_target(target: Option<&Target>, message: &Message<'_>) -> Result<String, ConfigError> {
    resolve("email_target", target, message)
}

fn resolve(
    key: &str,
    target: Option<&Target>,
    message: &Message<'_>,
) -> Result<String, ConfigError> {
    match target {
        Some(Target::Literal(value)) => Ok(value.clone()),
        Some(Target::Function(f)) => Ok(f(message)),
        Some(Target::Unsupported(value)) => Err(ConfigError::invalid_setting(
            key,
            format!("ensure it is a String or a function of the message. It was: {value}"),
        )),
        None => Err(ConfigError::invalid_setting(
            key,
            "ensure it is a String or a function of the message. It was not set",
        )),
    }
}
