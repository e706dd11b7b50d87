//! Helpers shared by task handlers at runtime.
//!
//! Everything here is independent of packaging: template rendering, e-mail
//! dispatch through an SMTP relay, HTTP downloads to disk and a couple of
//! string formatting helpers.

pub mod fetch;
pub mod format;
pub mod mail;
pub mod template;

pub use fetch::{Download, FetchError, Fetcher};
pub use format::{format_plural, ordinal_suffix};
pub use mail::{EmailMessage, MailConfig, MailError, MailReceipt, Mailer, RelayMailer};
pub use template::{render, render_html, TemplateError};
