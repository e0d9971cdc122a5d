//! SmsSafe — keeps non-production environments from texting real people.
//!
//! Outbound SMS are routed through an [`Interceptor`]. Messages to internal
//! recipients go out untouched; everything else is redirected to an
//! internal number, turned into an email, or discarded.

pub mod adapters;
pub mod config;
pub mod error;
pub mod hooks;
pub mod interceptor;
pub mod mail;
pub mod mechanism;
pub mod message;
pub mod rules;
pub mod targets;

pub use config::{
    Mechanism, Rule, Settings, SettingsHandle, Target, configuration, configure, set_mailer,
};
pub use error::{ConfigError, DeliveryError, Error, Result, SendError};
pub use interceptor::{Adapter, Interceptor};
pub use message::{Message, Redirected};
