pub mod base64;
pub mod config;
pub mod message;
pub mod session;
pub mod transport;

// Re-export commonly used types
pub use config::{Config, ConfigError, SmtpAccount};
pub use message::{Attachment, OutgoingMessage};
pub use session::{SessionConfig, SessionError, SmtpSession};
pub use transport::{TcpTransportProvider, Transport, TransportError, TransportProvider};
