//! Plain SMTP delivery through `lettre`.
//!
//! Every send builds its own transport, so each message gets a fresh
//! connect / EHLO / MAIL / RCPT / DATA / QUIT cycle. Envelope addresses
//! are stripped of line breaks before they are parsed.

use lettre::{
    address::Envelope,
    message::Mailbox,
    transport::smtp::authentication::{Credentials, Mechanism},
    Address, AsyncSmtpTransport, AsyncTransport, Tokio1Executor,
};

use crate::traits::NotifyError;

/// Strip CR, LF and their URL-encoded forms (`%0a`, `%0d`, any case) so a
/// value cannot inject extra SMTP commands or mail headers.
pub fn strip_line_breaks(value: &str) -> String {
    let mut current = strip_once(value);
    // Removing one sequence can splice a new one together ("%0%0da").
    loop {
        let next = strip_once(&current);
        if next == current {
            return current;
        }
        current = next;
    }
}

fn strip_once(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    let mut rest = value;
    while let Some(ch) = rest.chars().next() {
        let bytes = rest.as_bytes();
        if ch == '\r' || ch == '\n' {
            rest = &rest[1..];
        } else if bytes.len() >= 3
            && (bytes[..3].eq_ignore_ascii_case(b"%0a") || bytes[..3].eq_ignore_ascii_case(b"%0d"))
        {
            rest = &rest[3..];
        } else {
            out.push(ch);
            rest = &rest[ch.len_utf8()..];
        }
    }
    out
}

/// Bare address for the envelope; `Name <addr>` is reduced to `addr`.
pub(crate) fn envelope_address(value: &str) -> String {
    value
        .parse::<Mailbox>()
        .map(|mailbox| mailbox.email.to_string())
        .unwrap_or_else(|_| value.to_string())
}

fn parse_envelope_address(value: &str) -> Result<Address, NotifyError> {
    let cleaned = strip_line_breaks(&envelope_address(value));
    cleaned
        .parse()
        .map_err(|e: lettre::address::AddressError| {
            NotifyError::Delivery(format!("invalid envelope address '{cleaned}': {e}"))
        })
}

/// Sanitized envelope with one recipient per entry in `to`.
pub fn envelope(from: &str, to: &[String]) -> Result<Envelope, NotifyError> {
    let from = parse_envelope_address(from)?;
    let to = to
        .iter()
        .map(|addr| parse_envelope_address(addr))
        .collect::<Result<Vec<_>, _>>()?;
    Envelope::new(Some(from), to).map_err(|e| NotifyError::Delivery(e.to_string()))
}

/// Cleartext transport for `host:port`, logging in with `AUTH PLAIN` when
/// credentials are given.
pub fn transport(
    host: &str,
    port: u16,
    credentials: Option<Credentials>,
) -> AsyncSmtpTransport<Tokio1Executor> {
    let builder = AsyncSmtpTransport::<Tokio1Executor>::builder_dangerous(host).port(port);
    match credentials {
        Some(credentials) => builder
            .credentials(credentials)
            .authentication(vec![Mechanism::Plain])
            .build(),
        None => builder.build(),
    }
}

/// Normalise line endings to CRLF; lettre handles dot-stuffing and the
/// end-of-data marker.
pub(crate) fn wire_bytes(message: &str) -> Vec<u8> {
    message
        .split('\n')
        .map(|line| line.strip_suffix('\r').unwrap_or(line))
        .collect::<Vec<_>>()
        .join("\r\n")
        .into_bytes()
}

/// Send `body` (headers included) from `from` to every address in `to`
/// through the relay at `host:port`, without authentication.
pub async fn send_mail(
    host: &str,
    port: u16,
    from: &str,
    body: &str,
    to: &[String],
) -> Result<(), NotifyError> {
    let envelope = envelope(from, to)?;
    transport(host, port, None)
        .send_raw(&envelope, &wire_bytes(body))
        .await
        .map_err(|e| NotifyError::Delivery(e.to_string()))?;

    tracing::debug!(%host, port, recipients = to.len(), "unauthenticated SMTP send completed");
    Ok(())
}
