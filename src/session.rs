use log::{debug, info};
use thiserror::Error;

use crate::base64;
use crate::message::{generate_boundary, OutgoingMessage};
use crate::transport::{TcpTransportProvider, Transport, TransportError, TransportProvider};

/// Size of the buffer a server reply is read into. Replies longer than
/// this are truncated; they are only kept for diagnostics.
const REPLY_BUFFER_SIZE: usize = 1024;

#[derive(Error, Debug)]
pub enum SessionError {
    #[error("Connection failed: {0}")]
    Connect(TransportError),

    #[error("SMTP dialogue failed at {step}: {source}")]
    Dialogue {
        step: &'static str,
        source: TransportError,
    },
}

/// Immutable per-session settings. Shared by every `send_email` call on
/// the session.
#[derive(Debug, Clone)]
pub struct SessionConfig {
    pub server: String,
    pub port: u16,
    pub username: String,
    pub password: String,
    /// Hostname announced in the EHLO command.
    pub ehlo_hostname: String,
}

/// SMTP client session.
///
/// Each `send_email` call opens its own connection, runs the fixed command
/// script and closes the connection; no state is carried between calls.
///
/// The dialogue is deliberately script-driven: server replies are read and
/// logged but their reply codes are not parsed, matching the wire behavior
/// this client is a drop-in for. `STARTTLS` is announced on port 587 but
/// no TLS upgrade is performed; do not point this at servers that require
/// encryption.
pub struct SmtpSession {
    config: SessionConfig,
    provider: Box<dyn TransportProvider>,
}

impl SmtpSession {
    /// Session over plain TCP with the default timeout policy.
    pub fn new(server: &str, port: u16, username: &str, password: &str) -> Self {
        let config = SessionConfig {
            server: server.to_string(),
            port,
            username: username.to_string(),
            password: password.to_string(),
            ehlo_hostname: "localhost".to_string(),
        };
        Self::with_provider(config, Box::new(TcpTransportProvider::new()))
    }

    /// Session over a caller-supplied transport provider.
    pub fn with_provider(config: SessionConfig, provider: Box<dyn TransportProvider>) -> Self {
        Self { config, provider }
    }

    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    /// Send one email. Opens a connection, runs the SMTP command script,
    /// transmits the MIME payload and disconnects.
    ///
    /// Fails on connection errors and on any transport read/write error
    /// during the dialogue. Server rejections expressed purely through
    /// reply codes are not detected.
    pub fn send_email(&self, message: &OutgoingMessage) -> Result<(), SessionError> {
        let transport = self
            .provider
            .connect(&self.config.server, self.config.port)
            .map_err(SessionError::Connect)?;

        let mut dialogue = Dialogue::new(transport);

        dialogue.read_reply("greeting")?;

        dialogue.command("EHLO", &format!("EHLO {}\r\n", self.config.ehlo_hostname))?;

        // Submission port: announce STARTTLS. The connection is not
        // actually upgraded; see the type-level docs.
        if self.config.port == 587 {
            dialogue.command("STARTTLS", "STARTTLS\r\n")?;
        }

        dialogue.command("AUTH LOGIN", "AUTH LOGIN\r\n")?;
        dialogue.credential("username", &self.config.username)?;
        dialogue.credential("password", &self.config.password)?;

        dialogue.command("MAIL FROM", &format!("MAIL FROM:<{}>\r\n", message.from))?;
        dialogue.command("RCPT TO", &format!("RCPT TO:<{}>\r\n", message.to))?;
        dialogue.command("DATA", "DATA\r\n")?;

        let boundary = generate_boundary();
        let payload = message.to_mime(&boundary);
        debug!("> [message payload, {} bytes]", payload.len());
        dialogue.send("message", payload.as_bytes())?;
        dialogue.command("end of DATA", ".\r\n")?;
        if let Some(reply) = dialogue.last_reply() {
            debug!("Server reply after DATA: {}", reply);
        }

        debug!("> QUIT");
        dialogue.send("QUIT", b"QUIT\r\n")?;

        info!(
            "Sent email to {} via {}:{} ({} attachment(s))",
            message.to,
            self.config.server,
            self.config.port,
            message.attachments.len()
        );
        Ok(())
    }
}

/// One in-flight command/response exchange. Owns the transport for the
/// duration of the call; dropping it closes the connection on every exit
/// path.
struct Dialogue {
    transport: Box<dyn Transport>,
    /// Most recent server reply, kept for diagnostics only.
    last_reply: Option<String>,
}

impl Dialogue {
    fn new(transport: Box<dyn Transport>) -> Self {
        Self {
            transport,
            last_reply: None,
        }
    }

    fn last_reply(&self) -> Option<&str> {
        self.last_reply.as_deref()
    }

    /// Send a command line and read (but not validate) the reply.
    fn command(&mut self, step: &'static str, line: &str) -> Result<(), SessionError> {
        debug!("> {}", line.trim_end());
        self.send(step, line.as_bytes())?;
        self.read_reply(step)
    }

    /// Send a Base64-encoded AUTH LOGIN credential line. Logged without
    /// the credential itself.
    fn credential(&mut self, step: &'static str, value: &str) -> Result<(), SessionError> {
        let line = format!("{}\r\n", base64::encode(value.as_bytes()));
        debug!("> <base64 {}>", step);
        self.send(step, line.as_bytes())?;
        self.read_reply(step)
    }

    fn send(&mut self, step: &'static str, bytes: &[u8]) -> Result<(), SessionError> {
        self.transport
            .send(bytes)
            .map_err(|source| SessionError::Dialogue { step, source })?;
        Ok(())
    }

    /// Read whatever the server replied into a bounded buffer. The reply
    /// is kept for diagnostics only; its code is never inspected.
    fn read_reply(&mut self, step: &'static str) -> Result<(), SessionError> {
        let mut buf = [0u8; REPLY_BUFFER_SIZE];
        let n = self
            .transport
            .receive(&mut buf)
            .map_err(|source| SessionError::Dialogue { step, source })?;
        let reply = String::from_utf8_lossy(&buf[..n]).trim_end().to_string();
        debug!("< {}", reply);
        self.last_reply = Some(reply);
        Ok(())
    }
}
