//! SMTP mail notifier.
//!
//! Delivers notifications as plain-text emails through `lettre`. When both a
//! username and a password are configured the transport logs in with
//! `AUTH PLAIN`; otherwise the relay is used without login (see
//! [`crate::smtp`]). Neither path negotiates TLS.

use std::future::Future;
use std::time::Duration;

use lettre::{message::Mailbox, transport::smtp::authentication::Credentials, AsyncTransport};
use tokio::net::TcpStream;

use crate::config::MailNotifierConfig;
use crate::payload::{ErrorNotification, ResponseTimeNotification};
use crate::smtp::{self, strip_line_breaks, wire_bytes};
use crate::traits::{Notifier, NotifyError};

/// Label reported by [`Notifier::client_name`].
pub const CLIENT_NAME: &str = "Smtp Mail";

/// Upper bound for the reachability check in [`Notifier::initialize`].
pub const CONNECT_TIMEOUT: Duration = Duration::from_secs(3);

/// How messages are handed to the SMTP server.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthMode {
    /// `AUTH PLAIN` with the configured credentials.
    Authenticated,
    /// Plain MAIL/RCPT/DATA without login.
    Unauthenticated,
}

impl AuthMode {
    /// Authenticated only when both username and password are non-empty.
    pub fn from_credentials(username: &str, password: &str) -> Self {
        if !username.is_empty() && !password.is_empty() {
            Self::Authenticated
        } else {
            Self::Unauthenticated
        }
    }
}

/// Sends notifications as emails via SMTP.
#[derive(Debug)]
pub struct MailNotifier {
    config: MailNotifierConfig,
    auth_mode: AuthMode,
}

impl MailNotifier {
    /// Build a notifier; the delivery mode is fixed here for the lifetime
    /// of the instance.
    pub fn new(config: MailNotifierConfig) -> Self {
        let auth_mode = AuthMode::from_credentials(&config.username, &config.password);
        Self { config, auth_mode }
    }

    pub fn auth_mode(&self) -> AuthMode {
        self.auth_mode
    }

    pub fn config(&self) -> &MailNotifierConfig {
        &self.config
    }

    /// Prepend `From`, `To` and (when set) `Subject` headers to `body`.
    ///
    /// Header values are stripped of line breaks.
    pub fn format_mail_message(&self, body: &str) -> String {
        let subject = strip_line_breaks(&self.config.subject);

        let mut message = String::with_capacity(body.len() + 128);
        message.push_str("From: ");
        message.push_str(&display_address(&self.config.sender_name, &self.config.from));
        message.push('\n');
        message.push_str("To: ");
        message.push_str(&display_address(&self.config.receiver_name, &self.config.to));
        message.push('\n');
        if !subject.is_empty() {
            message.push_str("Subject: ");
            message.push_str(&subject);
            message.push('\n');
        }
        message.push('\n');
        message.push_str(body);
        message
    }

    /// Frame `body` as a mail message and deliver it using the configured mode.
    pub async fn send_mail_message(&self, body: &str) -> Result<(), NotifyError> {
        let message = self.format_mail_message(body);
        match self.auth_mode {
            AuthMode::Authenticated => self.send_authenticated(&message).await?,
            AuthMode::Unauthenticated => self.send_unauthenticated(&message).await?,
        }

        tracing::info!(
            channel = CLIENT_NAME,
            mode = ?self.auth_mode,
            subject = %self.config.subject,
            "notification delivered"
        );
        Ok(())
    }

    async fn send_authenticated(&self, message: &str) -> Result<(), NotifyError> {
        let envelope = smtp::envelope(&self.config.from, std::slice::from_ref(&self.config.to))?;
        let credentials = Credentials::new(self.config.username.clone(), self.config.password.clone());

        smtp::transport(&self.config.host, self.config.port, Some(credentials))
            .send_raw(&envelope, &wire_bytes(message))
            .await
            .map_err(|e| NotifyError::Delivery(e.to_string()))?;
        Ok(())
    }

    async fn send_unauthenticated(&self, message: &str) -> Result<(), NotifyError> {
        smtp::send_mail(
            &self.config.host,
            self.config.port,
            &self.config.from,
            message,
            std::slice::from_ref(&self.config.to),
        )
        .await
    }
}

#[async_trait::async_trait]
impl Notifier for MailNotifier {
    fn client_name(&self) -> &str {
        CLIENT_NAME
    }

    /// Validate both addresses, then check that `host:port` accepts TCP
    /// connections. The check connection is closed straight away.
    async fn initialize(&self) -> Result<(), NotifyError> {
        parse_mailbox("from", &self.config.from)?;
        parse_mailbox("to", &self.config.to)?;

        let addr = self.config.server_addr();
        bounded_connect(&addr, CONNECT_TIMEOUT, TcpStream::connect(addr.as_str())).await?;

        tracing::info!(
            channel = CLIENT_NAME,
            %addr,
            mode = ?self.auth_mode,
            "mail channel initialized"
        );
        Ok(())
    }

    async fn send_response_time_notification(
        &self,
        notification: &ResponseTimeNotification,
    ) -> Result<(), NotifyError> {
        self.send_mail_message(&notification.message()).await
    }

    async fn send_error_notification(
        &self,
        notification: &ErrorNotification,
    ) -> Result<(), NotifyError> {
        self.send_mail_message(&notification.message()).await
    }
}

/// Await `connect` for at most `limit`, dropping the stream on success.
pub(crate) async fn bounded_connect<F>(
    addr: &str,
    limit: Duration,
    connect: F,
) -> Result<(), NotifyError>
where
    F: Future<Output = std::io::Result<TcpStream>>,
{
    match tokio::time::timeout(limit, connect).await {
        Ok(Ok(stream)) => {
            drop(stream);
            Ok(())
        }
        Ok(Err(e)) => Err(NotifyError::Connectivity {
            addr: addr.to_string(),
            reason: e.to_string(),
        }),
        Err(_) => Err(NotifyError::Connectivity {
            addr: addr.to_string(),
            reason: format!("no answer within {}ms", limit.as_millis()),
        }),
    }
}

fn display_address(name: &str, address: &str) -> String {
    let address = strip_line_breaks(address);
    let name = strip_line_breaks(name);
    if name.is_empty() {
        address
    } else {
        format!("{name} <{address}>")
    }
}

fn parse_mailbox(field: &str, value: &str) -> Result<Mailbox, NotifyError> {
    value
        .parse()
        .map_err(|e: lettre::address::AddressError| {
            NotifyError::Validation(format!("invalid '{field}' address '{value}': {e}"))
        })
}
