use std::sync::Arc;

use anyhow::{Context, bail};
use serde::Serialize;
use serde_json::Value;

use sms_safe::adapters::{Params, ParamsAdapter, TextMessage, TextMessageAdapter};
use sms_safe::hooks::Provider;
use sms_safe::mail::SmtpConfig;
use sms_safe::{Adapter, Interceptor, Settings};

/// Outcome printed for a single message.
#[derive(Debug, Serialize)]
struct Decision {
    provider: &'static str,
    mechanism: String,
    /// What the provider would actually be asked to send; `null` if suppressed.
    send: Option<Value>,
}

fn run<A>(interceptor: Interceptor<A>, message: A::Provider) -> anyhow::Result<Option<Value>>
where
    A: Adapter,
    A::Provider: Serialize,
{
    let result = interceptor.process(message)?;
    result
        .map(|m| serde_json::to_value(m).context("Failed to serialize message"))
        .transpose()
}

fn main() -> anyhow::Result<()> {
    // Install rustls crypto provider before any TLS usage
    rustls::crypto::ring::default_provider()
        .install_default()
        .map_err(|_| anyhow::anyhow!("Failed to install rustls crypto provider"))?;

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let args: Vec<String> = std::env::args().skip(1).collect();
    let [provider, from, to, text] = args.as_slice() else {
        bail!("usage: sms-safe <action_texter|twilio|nexmo> <from> <to> <text>");
    };
    let provider: Provider = provider.parse()?;

    let settings = Settings::from_env()?;
    let mechanism = settings.intercept_mechanism.to_string();
    sms_safe::configuration().replace(settings);

    let email = match SmtpConfig::from_env()? {
        Some(smtp) => {
            sms_safe::set_mailer(Arc::new(smtp.transport()?));
            "SMTP"
        }
        None => "disabled",
    };

    eprintln!("📵 SmsSafe v{}", env!("CARGO_PKG_VERSION"));
    eprintln!("   Provider: {provider}");
    eprintln!("   Mechanism: {mechanism}");
    eprintln!("   Email: {email}");

    let send = match provider {
        Provider::ActionTexter => {
            run(
                Interceptor::new(TextMessageAdapter),
                TextMessage::new(from, to, text),
            )?
        }
        Provider::Twilio | Provider::Nexmo => {
            let adapter = if provider == Provider::Twilio {
                ParamsAdapter::twilio()
            } else {
                ParamsAdapter::nexmo()
            };
            let mut params = Params::new();
            params.insert("from".into(), Value::String(from.clone()));
            params.insert("to".into(), Value::String(to.clone()));
            params.insert(adapter.body_key().into(), Value::String(text.clone()));

            run(Interceptor::new(adapter), params)?
        }
    };

    let decision = Decision {
        provider: provider.as_str(),
        mechanism,
        send,
    };
    println!("{}", serde_json::to_string_pretty(&decision)?);
    Ok(())
}
