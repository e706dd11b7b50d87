use std::time::Duration;

use lettre::message::header::ContentType;
use lettre::message::{Mailbox, Mailboxes, MultiPart};
use lettre::transport::smtp::authentication::Credentials;
use lettre::transport::smtp::client::{Tls, TlsParameters};
use lettre::{Message, SmtpTransport, Transport};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{error, info};

pub const CONNECT_TIMEOUT: Duration = Duration::from_secs(10);

const ENV_USER: &str = "EMAIL_USER";
// The misspelling is part of the deployed configuration contract.
const ENV_PASSWORD: &str = "EMAIL_PASSOWRD";
const ENV_HOST: &str = "EMAIL_HOST";
const ENV_PORT: &str = "EMAIL_PORT";
const ENV_SSL: &str = "EMAIL_SSL";
const ENV_TLS: &str = "EMAIL_TLS";
const ENV_SEND_ENABLED: &str = "EMAIL_SEND_ENABLED";

#[derive(Debug, Error)]
pub enum MailError {
    #[error("invalid address '{address}': {source}")]
    Address {
        address: String,
        #[source]
        source: lettre::address::AddressError,
    },
    #[error("failed to build message: {0}")]
    Build(#[from] lettre::error::Error),
    #[error("mail relay host is not configured (EMAIL_HOST)")]
    MissingHost,
    #[error("invalid EMAIL_PORT value '{0}'")]
    InvalidPort(String),
    #[error("failed to send message: {0}")]
    Transport(String),
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EmailMessage {
    pub to: String,
    pub from: String,
    #[serde(default)]
    pub subject: Option<String>,
    #[serde(default)]
    pub text: Option<String>,
    #[serde(default)]
    pub html: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MailReceipt {
    /// Sending is disabled; the message was logged instead.
    Skipped,
    Sent,
}

/// Relay settings read from the `EMAIL_*` environment variables.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MailConfig {
    pub user: Option<String>,
    pub password: Option<String>,
    pub host: Option<String>,
    pub port: Option<u16>,
    pub ssl: bool,
    pub tls: bool,
    pub send_enabled: bool,
}

impl MailConfig {
    pub fn from_env() -> Result<Self, MailError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, MailError> {
        let port = match non_empty(lookup(ENV_PORT)) {
            Some(raw) => Some(
                raw.trim()
                    .parse::<u16>()
                    .map_err(|_| MailError::InvalidPort(raw.clone()))?,
            ),
            None => None,
        };

        Ok(Self {
            user: non_empty(lookup(ENV_USER)),
            password: non_empty(lookup(ENV_PASSWORD)),
            host: non_empty(lookup(ENV_HOST)),
            port,
            ssl: is_truthy(lookup(ENV_SSL)),
            tls: is_truthy(lookup(ENV_TLS)),
            send_enabled: is_truthy(lookup(ENV_SEND_ENABLED)),
        })
    }

    pub fn effective_port(&self) -> u16 {
        self.port.unwrap_or(if self.ssl {
            465
        } else if self.tls {
            587
        } else {
            25
        })
    }
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|text| !text.trim().is_empty())
}

fn is_truthy(value: Option<String>) -> bool {
    match non_empty(value) {
        Some(text) => !matches!(
            text.trim().to_ascii_lowercase().as_str(),
            "0" | "false" | "no" | "off"
        ),
        None => false,
    }
}

pub trait MailTransport {
    fn deliver(&self, message: &Message) -> Result<(), MailError>;
}

/// SMTP relay transport built from [`MailConfig`].
pub struct SmtpRelay {
    transport: SmtpTransport,
}

impl SmtpRelay {
    pub fn from_config(config: &MailConfig) -> Result<Self, MailError> {
        let host = config.host.as_deref().ok_or(MailError::MissingHost)?;
        let tls = if config.ssl || config.tls {
            let parameters = TlsParameters::new(host.to_string())
                .map_err(|error| MailError::Transport(error.to_string()))?;
            if config.ssl {
                Tls::Wrapper(parameters)
            } else {
                Tls::Required(parameters)
            }
        } else {
            Tls::None
        };

        let mut builder = SmtpTransport::builder_dangerous(host)
            .port(config.effective_port())
            .tls(tls)
            .timeout(Some(CONNECT_TIMEOUT));
        if let Some(user) = &config.user {
            builder = builder.credentials(Credentials::new(
                user.clone(),
                config.password.clone().unwrap_or_default(),
            ));
        }

        Ok(Self {
            transport: builder.build(),
        })
    }
}

impl MailTransport for SmtpRelay {
    fn deliver(&self, message: &Message) -> Result<(), MailError> {
        self.transport
            .send(message)
            .map(|_| ())
            .map_err(|error| MailError::Transport(error.to_string()))
    }
}

pub struct Mailer<T> {
    config: MailConfig,
    transport: T,
}

/// Mailer whose relay is only built when sending is enabled.
pub type RelayMailer = Mailer<Option<SmtpRelay>>;

impl RelayMailer {
    /// Mailer for the relay described by the environment.
    ///
    /// No relay is required while sending is disabled.
    pub fn from_env() -> Result<Self, MailError> {
        let config = MailConfig::from_env()?;
        let transport = if config.send_enabled {
            Some(SmtpRelay::from_config(&config)?)
        } else {
            None
        };
        Ok(Mailer::new(config, transport))
    }
}

impl MailTransport for Option<SmtpRelay> {
    fn deliver(&self, message: &Message) -> Result<(), MailError> {
        match self {
            Some(relay) => relay.deliver(message),
            None => Err(MailError::MissingHost),
        }
    }
}

impl<T: MailTransport> Mailer<T> {
    pub fn new(config: MailConfig, transport: T) -> Self {
        Self { config, transport }
    }

    pub fn config(&self) -> &MailConfig {
        &self.config
    }

    pub fn send(&self, message: EmailMessage) -> Result<MailReceipt, MailError> {
        if !self.config.send_enabled {
            info!("skipping actual sending of e-mail in development environment");
            info!(
                to = %message.to,
                from = %message.from,
                subject = message.subject.as_deref().unwrap_or_default(),
                "e-mail not sent"
            );
            return Ok(MailReceipt::Skipped);
        }

        let built = build_message(message)?;
        self.transport.deliver(&built)?;
        Ok(MailReceipt::Sent)
    }

    /// Send and report the outcome through `done`, which runs exactly once.
    pub fn send_then<F>(&self, message: EmailMessage, done: F)
    where
        F: FnOnce(Result<MailReceipt, MailError>),
    {
        done(self.send(message));
    }

    /// Send and log the outcome.
    pub fn send_logged(&self, message: EmailMessage) {
        self.send_then(message, log_outcome);
    }
}

fn log_outcome(outcome: Result<MailReceipt, MailError>) {
    match outcome {
        Ok(receipt) => info!(?receipt, "e-mail dispatch finished"),
        Err(err) => error!(error = %err, "e-mail dispatch failed"),
    }
}

/// Build the wire message. An HTML body is sent as the alternative part of a
/// `multipart/alternative` next to the plain-text body.
pub fn build_message(message: EmailMessage) -> Result<Message, MailError> {
    let from = parse_mailbox(&message.from)?;
    let mut builder = Message::builder()
        .from(from)
        .subject(message.subject.unwrap_or_default());

    let recipients = message
        .to
        .parse::<Mailboxes>()
        .map_err(|source| MailError::Address {
            address: message.to.clone(),
            source,
        })?;
    for recipient in recipients {
        builder = builder.to(recipient);
    }

    let text = message.text.unwrap_or_default();
    let built = match message.html {
        Some(html) if !html.is_empty() => {
            builder.multipart(MultiPart::alternative_plain_html(text, html))?
        }
        _ => builder.header(ContentType::TEXT_PLAIN).body(text)?,
    };
    Ok(built)
}

fn parse_mailbox(address: &str) -> Result<Mailbox, MailError> {
    address
        .parse::<Mailbox>()
        .map_err(|source| MailError::Address {
            address: address.to_string(),
            source,
        })
}
