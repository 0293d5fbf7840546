//! In-process mock SMTP server for delivery tests.
//!
//! Records every command line and every DATA payload so tests can assert on
//! exactly what went over the wire.

#![allow(dead_code)]

use std::net::SocketAddr;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::net::tcp::OwnedWriteHalf;
use tokio::net::{TcpListener, TcpStream};
use tokio::task::JoinHandle;

/// `AUTH PLAIN` payload for username `bot`, password `secret`.
pub const BOT_CREDENTIALS: &str = "AGJvdABzZWNyZXQ=";

#[derive(Debug, Clone, Copy, Default)]
pub struct MockOptions {
    /// Advertise `AUTH PLAIN` in the EHLO reply.
    pub advertise_auth: bool,
    /// Answer every RCPT with 550.
    pub reject_rcpt: bool,
}

#[derive(Default)]
struct Recorded {
    commands: Mutex<Vec<String>>,
    messages: Mutex<Vec<Vec<String>>>,
    connections: AtomicUsize,
}

pub struct MockSmtpServer {
    pub addr: SocketAddr,
    recorded: Arc<Recorded>,
    handle: JoinHandle<()>,
}

impl MockSmtpServer {
    pub async fn start(options: MockOptions) -> Self {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let recorded = Arc::new(Recorded::default());

        let rec = recorded.clone();
        let handle = tokio::spawn(async move {
            while let Ok((stream, _)) = listener.accept().await {
                rec.connections.fetch_add(1, Ordering::SeqCst);
                let rec = rec.clone();
                tokio::spawn(async move {
                    let _ = session(stream, options, rec).await;
                });
            }
        });

        Self {
            addr,
            recorded,
            handle,
        }
    }

    pub fn port(&self) -> u16 {
        self.addr.port()
    }

    /// All command lines received, across connections, in arrival order.
    pub fn commands(&self) -> Vec<String> {
        self.recorded.commands.lock().unwrap().clone()
    }

    /// Commands starting with `verb` (case-insensitive).
    pub fn commands_starting_with(&self, verb: &str) -> Vec<String> {
        self.commands()
            .into_iter()
            .filter(|c| c.to_ascii_uppercase().starts_with(verb))
            .collect()
    }

    /// Raw DATA payload lines of each accepted message (terminator excluded).
    pub fn messages(&self) -> Vec<Vec<String>> {
        self.recorded.messages.lock().unwrap().clone()
    }

    pub fn connections(&self) -> usize {
        self.recorded.connections.load(Ordering::SeqCst)
    }
}

impl Drop for MockSmtpServer {
    fn drop(&mut self) {
        self.handle.abort();
    }
}

async fn reply(writer: &mut OwnedWriteHalf, text: &str) -> std::io::Result<()> {
    writer.write_all(text.as_bytes()).await?;
    writer.flush().await
}

async fn session(stream: TcpStream, options: MockOptions, rec: Arc<Recorded>) -> std::io::Result<()> {
    let (read_half, mut writer) = stream.into_split();
    let mut reader = BufReader::new(read_half);
    let mut line = String::new();

    reply(&mut writer, "220 mock.local ESMTP ready\r\n").await?;

    loop {
        line.clear();
        if reader.read_line(&mut line).await? == 0 {
            return Ok(());
        }
        let command = line.trim_end_matches(['\r', '\n']).to_string();
        rec.commands.lock().unwrap().push(command.clone());
        let upper = command.to_ascii_uppercase();

        if upper.starts_with("EHLO") {
            if options.advertise_auth {
                reply(&mut writer, "250-mock.local\r\n250 AUTH PLAIN\r\n").await?;
            } else {
                reply(&mut writer, "250 mock.local\r\n").await?;
            }
        } else if upper.starts_with("HELO") {
            reply(&mut writer, "250 mock.local\r\n").await?;
        } else if upper.starts_with("AUTH PLAIN") {
            let mut credentials = command.get(11..).unwrap_or("").trim().to_string();
            if credentials.is_empty() {
                reply(&mut writer, "334 \r\n").await?;
                line.clear();
                reader.read_line(&mut line).await?;
                credentials = line.trim().to_string();
            }
            if credentials == BOT_CREDENTIALS {
                reply(&mut writer, "235 2.7.0 Authentication successful\r\n").await?;
            } else {
                reply(&mut writer, "535 5.7.8 Authentication credentials invalid\r\n").await?;
            }
        } else if upper.starts_with("MAIL FROM:") {
            reply(&mut writer, "250 2.1.0 OK\r\n").await?;
        } else if upper.starts_with("RCPT TO:") {
            if options.reject_rcpt {
                reply(&mut writer, "550 5.1.1 No such user\r\n").await?;
            } else {
                reply(&mut writer, "250 2.1.5 OK\r\n").await?;
            }
        } else if upper == "DATA" {
            reply(&mut writer, "354 End data with <CR><LF>.<CR><LF>\r\n").await?;
            let mut data = Vec::new();
            loop {
                line.clear();
                if reader.read_line(&mut line).await? == 0 {
                    return Ok(());
                }
                let data_line = line.trim_end_matches(['\r', '\n']).to_string();
                if data_line == "." {
                    break;
                }
                data.push(data_line);
            }
            rec.messages.lock().unwrap().push(data);
            reply(&mut writer, "250 2.0.0 Queued\r\n").await?;
        } else if upper == "QUIT" {
            reply(&mut writer, "221 2.0.0 Bye\r\n").await?;
            return Ok(());
        } else if upper == "RSET" || upper == "NOOP" {
            reply(&mut writer, "250 2.0.0 OK\r\n").await?;
        } else {
            reply(&mut writer, "502 5.5.2 Command not recognized\r\n").await?;
        }
    }
}
