//! Configuration types.
//!
//! Settings live in a [`SettingsHandle`]: an `Arc<Settings>` behind a
//! `RwLock`. Readers take a snapshot per decision step, writers swap the
//! whole value. No lock is held while a message is being handled, so a
//! reconfiguration racing with `process` is last-write-wins.

use std::fmt;
use std::str::FromStr;
use std::sync::{Arc, LazyLock, RwLock};

use regex::Regex;

use crate::error::ConfigError;
use crate::mail::Mailer;
use crate::message::Message;

/// Predicate deciding whether a message goes to an internal recipient.
pub type RulePredicate = Arc<dyn Fn(&Message<'_>) -> bool + Send + Sync>;

/// Function computing a redirect number or email address from a message.
pub type TargetFn = Arc<dyn Fn(&Message<'_>) -> String + Send + Sync>;

/// Default delay applied when discarding, in milliseconds.
pub const DEFAULT_DISCARD_DELAY_MS: i64 = 50;

// ── Rules ───────────────────────────────────────────────────────────

/// One entry of `internal_phone_numbers`.
#[derive(Clone)]
pub enum Rule {
    /// Exact, case-sensitive match against the recipient.
    Exact(String),
    /// Regex matched anywhere in the recipient.
    Pattern(Regex),
    /// Arbitrary check over the whole message.
    Predicate(RulePredicate),
    /// A configured value that is none of the above, such as a `re:` entry
    /// whose regex does not compile. Rejected when evaluated.
    Unsupported(String),
}

impl Rule {
    pub fn exact(number: impl Into<String>) -> Self {
        Self::Exact(number.into())
    }

    pub fn pattern(pattern: &str) -> Result<Self, regex::Error> {
        Ok(Self::Pattern(Regex::new(pattern)?))
    }

    pub fn predicate<F>(f: F) -> Self
    where
        F: Fn(&Message<'_>) -> bool + Send + Sync + 'static,
    {
        Self::Predicate(Arc::new(f))
    }

    /// Parse a textual rule: `re:<regex>` is a pattern, anything else is an
    /// exact number. A pattern that does not compile stays in the list as
    /// `Unsupported` so the misconfiguration surfaces on the first message.
    pub fn parse(entry: &str) -> Self {
        match entry.strip_prefix("re:") {
            Some(pattern) => match Regex::new(pattern) {
                Ok(regex) => Self::Pattern(regex),
                Err(e) => {
                    tracing::warn!(entry, error = %e, "Unparseable internal number pattern");
                    Self::Unsupported(entry.to_string())
                }
            },
            None => Self::Exact(entry.to_string()),
        }
    }
}

impl fmt::Debug for Rule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Exact(s) => write!(f, "{s:?}"),
            Self::Pattern(re) => write!(f, "/{}/", re.as_str()),
            Self::Predicate(_) => f.write_str("<predicate>"),
            Self::Unsupported(v) => write!(f, "{v}"),
        }
    }
}

impl From<&str> for Rule {
    fn from(number: &str) -> Self {
        Self::Exact(number.to_string())
    }
}

impl From<String> for Rule {
    fn from(number: String) -> Self {
        Self::Exact(number)
    }
}

impl From<Regex> for Rule {
    fn from(regex: Regex) -> Self {
        Self::Pattern(regex)
    }
}

// ── Targets ─────────────────────────────────────────────────────────

/// A redirect number or email address: literal, or computed per message.
#[derive(Clone)]
pub enum Target {
    Literal(String),
    Function(TargetFn),
    /// A configured value that is neither. Rejected when resolved.
    Unsupported(String),
}

impl Target {
    pub fn function<F>(f: F) -> Self
    where
        F: Fn(&Message<'_>) -> String + Send + Sync + 'static,
    {
        Self::Function(Arc::new(f))
    }
}

impl fmt::Debug for Target {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Literal(s) => write!(f, "{s:?}"),
            Self::Function(_) => f.write_str("<function>"),
            Self::Unsupported(v) => write!(f, "{v}"),
        }
    }
}

impl From<&str> for Target {
    fn from(value: &str) -> Self {
        Self::Literal(value.to_string())
    }
}

impl From<String> for Target {
    fn from(value: String) -> Self {
        Self::Literal(value)
    }
}

// ── Mechanism ───────────────────────────────────────────────────────

/// What to do with an intercepted message.
///
/// Names are matched exactly (`redirect`, `email`, `discard`); anything else
/// parses to `Unrecognized`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Mechanism {
    /// Send to `redirect_target` instead, with the original recipient noted in the text.
    Redirect,
    /// Send an email to `email_target` instead of the SMS.
    Email,
    /// Send nothing, after `discard_delay_ms`.
    Discard,
    /// A name that is none of the above. Rejected when an external message arrives.
    Unrecognized(String),
}

impl Mechanism {
    pub fn as_str(&self) -> &str {
        match self {
            Self::Redirect => "redirect",
            Self::Email => "email",
            Self::Discard => "discard",
            Self::Unrecognized(name) => name,
        }
    }
}

impl FromStr for Mechanism {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(match s {
            "redirect" => Self::Redirect,
            "email" => Self::Email,
            "discard" => Self::Discard,
            _ => Self::Unrecognized(s.to_string()),
        })
    }
}

impl fmt::Display for Mechanism {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ── Settings ────────────────────────────────────────────────────────

/// Guard settings.
#[derive(Debug, Clone)]
pub struct Settings {
    /// Recipients allowed to receive real SMS. Empty means every message is intercepted.
    pub internal_phone_numbers: Vec<Rule>,
    /// What to do with messages to anyone else.
    pub intercept_mechanism: Mechanism,
    /// Where redirected messages go. Required for `Mechanism::Redirect`.
    pub redirect_target: Option<Target>,
    /// Where emailed messages go. Required for `Mechanism::Email`.
    pub email_target: Option<Target>,
    /// Sleep before discarding, to simulate provider latency under load.
    /// Unset, zero or negative skips the sleep.
    pub discard_delay_ms: Option<i64>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            internal_phone_numbers: Vec::new(),
            intercept_mechanism: Mechanism::Redirect,
            redirect_target: None,
            email_target: None,
            discard_delay_ms: Some(DEFAULT_DISCARD_DELAY_MS),
        }
    }
}

impl Settings {
    /// Build settings from environment variables, starting from the defaults.
    ///
    /// - `SMS_SAFE_INTERNAL_NUMBERS`: comma-separated; `re:` prefix for patterns
    /// - `SMS_SAFE_MECHANISM`: `redirect`, `email` or `discard`
    /// - `SMS_SAFE_REDIRECT_TARGET`, `SMS_SAFE_EMAIL_TARGET`
    /// - `SMS_SAFE_DISCARD_DELAY_MS`
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub(crate) fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut settings = Self::default();

        if let Some(numbers) = lookup("SMS_SAFE_INTERNAL_NUMBERS") {
            settings.internal_phone_numbers = numbers
                .split(',')
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(Rule::parse)
                .collect();
        }

        if let Some(mechanism) = lookup("SMS_SAFE_MECHANISM") {
            // Infallible; unknown names are kept and rejected at decision time.
            settings.intercept_mechanism = mechanism.trim().parse().unwrap_or(Mechanism::Redirect);
        }

        settings.redirect_target = lookup("SMS_SAFE_REDIRECT_TARGET").map(Target::Literal);
        settings.email_target = lookup("SMS_SAFE_EMAIL_TARGET").map(Target::Literal);

        if let Some(delay) = lookup("SMS_SAFE_DISCARD_DELAY_MS") {
            let delay = delay.trim();
            settings.discard_delay_ms = if delay.is_empty() {
                None
            } else {
                Some(delay.parse().map_err(|e| ConfigError::InvalidValue {
                    key: "SMS_SAFE_DISCARD_DELAY_MS".into(),
                    message: format!("{delay:?} is not an integer: {e}"),
                })?)
            };
        }

        Ok(settings)
    }

    pub fn with_internal_numbers<I, R>(mut self, rules: I) -> Self
    where
        I: IntoIterator<Item = R>,
        R: Into<Rule>,
    {
        self.internal_phone_numbers = rules.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_mechanism(mut self, mechanism: Mechanism) -> Self {
        self.intercept_mechanism = mechanism;
        self
    }

    pub fn with_redirect_target(mut self, target: impl Into<Target>) -> Self {
        self.redirect_target = Some(target.into());
        self
    }

    pub fn with_email_target(mut self, target: impl Into<Target>) -> Self {
        self.email_target = Some(target.into());
        self
    }

    pub fn with_discard_delay_ms(mut self, delay: Option<i64>) -> Self {
        self.discard_delay_ms = delay;
        self
    }
}

// ── Handle ──────────────────────────────────────────────────────────

/// Shared, mutable holder for [`Settings`].
#[derive(Debug, Default)]
pub struct SettingsHandle {
    inner: RwLock<Arc<Settings>>,
}

impl SettingsHandle {
    pub fn new(settings: Settings) -> Self {
        Self {
            inner: RwLock::new(Arc::new(settings)),
        }
    }

    /// Current settings. The lock is released before this returns.
    pub fn snapshot(&self) -> Arc<Settings> {
        match self.inner.read() {
            Ok(guard) => Arc::clone(&guard),
            Err(poisoned) => Arc::clone(&poisoned.into_inner()),
        }
    }

    /// Edit the settings in place.
    pub fn configure<F>(&self, f: F)
    where
        F: FnOnce(&mut Settings),
    {
        let mut guard = match self.inner.write() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        f(Arc::make_mut(&mut guard));
    }

    /// Replace the settings wholesale.
    pub fn replace(&self, settings: Settings) {
        self.configure(|current| *current = settings);
    }
}

static GLOBAL: LazyLock<Arc<SettingsHandle>> = LazyLock::new(Arc::default);

/// The process-wide settings used by [`Interceptor::new`](crate::Interceptor::new).
pub fn configuration() -> Arc<SettingsHandle> {
    Arc::clone(&GLOBAL)
}

/// Edit the process-wide settings.
pub fn configure<F>(f: F)
where
    F: FnOnce(&mut Settings),
{
    GLOBAL.configure(f);
}

static MAILER: RwLock<Option<Arc<dyn Mailer>>> = RwLock::new(None);

/// Set the process-wide mailer used by the `email` mechanism.
///
/// Interceptors built with [`Interceptor::new`](crate::Interceptor::new) and
/// no mailer of their own read it when an email has to be sent.
pub fn set_mailer(mailer: Arc<dyn Mailer>) {
    let mut guard = match MAILER.write() {
        Ok(guard) => guard,
        Err(poisoned) => poisoned.into_inner(),
    };
    *guard = Some(mailer);
}

/// The process-wide mailer, if one was set.
pub fn mailer() -> Option<Arc<dyn Mailer>> {
    match MAILER.read() {
        Ok(guard) => guard.clone(),
        Err(poisoned) => poisoned.into_inner().clone(),
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn defaults_match_documented_values() {
        let settings = Settings::default();
        assert!(settings.internal_phone_numbers.is_empty());
        assert_eq!(settings.intercept_mechanism, Mechanism::Redirect);
        assert!(settings.redirect_target.is_none());
        assert!(settings.email_target.is_none());
        assert_eq!(settings.discard_delay_ms, Some(50));
    }

    #[test]
    fn mechanism_parses_known_names() {
        assert_eq!(
            "redirect".parse::<Mechanism>().unwrap(),
            Mechanism::Redirect
        );
        assert_eq!("email".parse::<Mechanism>().unwrap(), Mechanism::Email);
        assert_eq!("discard".parse::<Mechanism>().unwrap(), Mechanism::Discard);
    }

    #[test]
    fn mechanism_names_are_exact() {
        let parsed: Mechanism = "EMAIL".parse().unwrap();
        assert_eq!(parsed, Mechanism::Unrecognized("EMAIL".into()));
        let parsed: Mechanism = " discard".parse().unwrap();
        assert_eq!(parsed, Mechanism::Unrecognized(" discard".into()));
    }

    #[test]
    fn mechanism_keeps_unknown_names() {
        let parsed: Mechanism = "carrier_pigeon".parse().unwrap();
        assert_eq!(parsed, Mechanism::Unrecognized("carrier_pigeon".into()));
        assert_eq!(parsed.to_string(), "carrier_pigeon");
    }

    #[test]
    fn rule_parse_distinguishes_patterns() {
        assert!(matches!(
            Rule::parse("+447111222222"),
            Rule::Exact(ref s) if s == "+447111222222"
        ));
        assert!(matches!(Rule::parse(r"re:^\+44711"), Rule::Pattern(_)));
        assert!(matches!(
            Rule::parse("re:("),
            Rule::Unsupported(ref s) if s == "re:("
        ));
        assert!(matches!(Rule::parse("5"), Rule::Exact(ref s) if s == "5"));
    }

    #[test]
    fn from_env_reads_all_fields() {
        let settings = Settings::from_lookup(lookup(&[
            ("SMS_SAFE_INTERNAL_NUMBERS", "+1000, re:^\\+44 ,,"),
            ("SMS_SAFE_MECHANISM", " email "),
            ("SMS_SAFE_REDIRECT_TARGET", "+1000"),
            ("SMS_SAFE_EMAIL_TARGET", "qa@example.com"),
            ("SMS_SAFE_DISCARD_DELAY_MS", "0"),
        ]))
        .unwrap();

        assert_eq!(settings.internal_phone_numbers.len(), 2);
        assert!(matches!(
            settings.internal_phone_numbers[1],
            Rule::Pattern(_)
        ));
        assert_eq!(settings.intercept_mechanism, Mechanism::Email);
        assert!(matches!(
            settings.redirect_target,
            Some(Target::Literal(ref s)) if s == "+1000"
        ));
        assert!(matches!(
            settings.email_target,
            Some(Target::Literal(ref s)) if s == "qa@example.com"
        ));
        assert_eq!(settings.discard_delay_ms, Some(0));
    }

    #[test]
    fn from_env_empty_delay_unsets_it() {
        let settings =
            Settings::from_lookup(lookup(&[("SMS_SAFE_DISCARD_DELAY_MS", "")])).unwrap();
        assert_eq!(settings.discard_delay_ms, None);
    }

    #[test]
    fn from_env_rejects_non_numeric_delay() {
        let err =
            Settings::from_lookup(lookup(&[("SMS_SAFE_DISCARD_DELAY_MS", "soon")])).unwrap_err();
        assert!(matches!(
            err,
            ConfigError::InvalidValue { ref key, .. } if key == "SMS_SAFE_DISCARD_DELAY_MS"
        ));
    }

    #[test]
    fn handle_configure_is_visible_to_later_snapshots() {
        let handle = SettingsHandle::default();
        let before = handle.snapshot();
        handle.configure(|s| s.intercept_mechanism = Mechanism::Discard);

        assert_eq!(before.intercept_mechanism, Mechanism::Redirect);
        assert_eq!(handle.snapshot().intercept_mechanism, Mechanism::Discard);
    }

    #[test]
    fn handle_replace_swaps_everything() {
        let handle = SettingsHandle::new(Settings::default().with_redirect_target("+1"));
        handle.replace(Settings::default().with_discard_delay_ms(None));
        let snapshot = handle.snapshot();
        assert!(snapshot.redirect_target.is_none());
        assert_eq!(snapshot.discard_delay_ms, None);
    }
}
