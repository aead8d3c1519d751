use std::fs;

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use log::debug;

use smtpmail::config::{Config, SmtpAccount};
use smtpmail::message::{Attachment, OutgoingMessage};
use smtpmail::session::{SessionConfig, SmtpSession};
use smtpmail::transport::TcpTransportProvider;

/// Command-line SMTP client for sending emails with attachments
#[derive(Parser, Debug)]
#[clap(author, version, about)]
struct Args {
    /// Path to config file (defaults to smtpmail/config.json in the user
    /// config directory)
    #[clap(short, long)]
    config: Option<String>,

    /// Enable debug logging
    #[clap(short, long)]
    debug: bool,

    #[clap(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Add a new SMTP account
    AddAccount {
        /// Account name
        #[clap(short, long)]
        name: String,

        /// Email address
        #[clap(short, long)]
        email: String,

        /// SMTP server address
        #[clap(long)]
        smtp_server: String,

        /// SMTP server port
        #[clap(long, default_value = "587")]
        smtp_port: u16,

        /// SMTP username
        #[clap(long)]
        smtp_username: String,

        /// SMTP password
        #[clap(long)]
        smtp_password: String,

        /// Hostname announced in the EHLO command
        #[clap(long, default_value = "localhost")]
        ehlo_hostname: String,
    },

    /// List configured accounts
    ListAccounts,

    /// Set default account
    SetDefaultAccount {
        /// Account index (starting from 0)
        #[clap(short, long)]
        index: usize,
    },

    /// Send an email
    Send {
        /// Account name (defaults to the default account)
        #[clap(short, long)]
        account: Option<String>,

        /// Recipient address
        #[clap(short, long)]
        to: String,

        /// Subject line
        #[clap(short, long)]
        subject: String,

        /// Body text
        #[clap(short, long, conflicts_with = "body_file")]
        body: Option<String>,

        /// Read the body text from a file
        #[clap(long)]
        body_file: Option<String>,

        /// Attach a file (may be given multiple times)
        #[clap(long = "attach")]
        attachments: Vec<String>,
    },
}

fn main() -> Result<()> {
    // Parse command line arguments
    let args = Args::parse();

    // Initialize logger
    env_logger::Builder::new()
        .filter_level(if args.debug {
            log::LevelFilter::Debug
        } else {
            log::LevelFilter::Info
        })
        .init();

    // Load configuration
    let config_path = match &args.config {
        Some(path) => shellexpand::tilde(path).into_owned(),
        None => default_config_path()?,
    };
    let mut config = Config::load(&config_path)
        .with_context(|| format!("Failed to load config from {}", config_path))?;

    match args.command {
        Commands::AddAccount {
            name,
            email,
            smtp_server,
            smtp_port,
            smtp_username,
            smtp_password,
            ehlo_hostname,
        } => {
            config.add_account(SmtpAccount {
                name: name.clone(),
                email,
                smtp_server,
                smtp_port,
                smtp_username,
                smtp_password,
                ehlo_hostname,
            });
            config.save(&config_path).context("Failed to save config")?;
            println!("Account '{}' added.", name);
        }

        Commands::ListAccounts => {
            if config.accounts.is_empty() {
                println!("No accounts configured.");
            }
            for (i, account) in config.accounts.iter().enumerate() {
                let marker = if i == config.default_account { "*" } else { " " };
                println!(
                    "{} [{}] {} <{}> via {}:{}",
                    marker, i, account.name, account.email, account.smtp_server, account.smtp_port
                );
            }
        }

        Commands::SetDefaultAccount { index } => {
            config
                .set_default_account(index)
                .map_err(|e| anyhow::anyhow!(e))?;
            config.save(&config_path).context("Failed to save config")?;
            println!("Default account set to {}.", index);
        }

        Commands::Send {
            account,
            to,
            subject,
            body,
            body_file,
            attachments,
        } => {
            let account = match account {
                Some(ref name) => config
                    .find_account(name)
                    .with_context(|| format!("No account named '{}'", name))?,
                None => config
                    .get_default_account()
                    .map_err(|e| anyhow::anyhow!(e))?,
            };

            let body = match (body, body_file) {
                (Some(text), _) => text,
                (None, Some(path)) => fs::read_to_string(&path)
                    .with_context(|| format!("Failed to read body file {}", path))?,
                (None, None) => bail!("Either --body or --body-file is required"),
            };

            let mut message = OutgoingMessage::new(&account.email, &to, &subject, &body);
            for path in &attachments {
                message.attach(load_attachment(path)?);
            }

            let session_config = SessionConfig {
                server: account.smtp_server.clone(),
                port: account.smtp_port,
                username: account.smtp_username.clone(),
                password: account.smtp_password.clone(),
                ehlo_hostname: account.ehlo_hostname.clone(),
            };
            let session = SmtpSession::with_provider(
                session_config,
                Box::new(TcpTransportProvider::new()),
            );

            debug!("Sending '{}' to {}", subject, to);
            session
                .send_email(&message)
                .with_context(|| format!("Failed to send email to {}", to))?;
            println!("Email sent to {}.", to);
        }
    }

    Ok(())
}

fn default_config_path() -> Result<String> {
    let dir = dirs::config_dir().context("Could not determine the user config directory")?;
    Ok(dir.join("smtpmail").join("config.json").to_string_lossy().into_owned())
}

fn load_attachment(path: &str) -> Result<Attachment> {
    let data =
        fs::read(path).with_context(|| format!("Failed to read attachment {}", path))?;
    let filename = std::path::Path::new(path)
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.to_string());
    let content_type = guess_content_type(&filename).to_string();

    Ok(Attachment {
        filename,
        content_type,
        data,
    })
}

/// Map a filename extension to a MIME type for the attachment headers.
fn guess_content_type(filename: &str) -> &'static str {
    let extension = filename
        .rsplit('.')
        .next()
        .unwrap_or_default()
        .to_lowercase();
    match extension.as_str() {
        "txt" | "log" => "text/plain",
        "html" | "htm" => "text/html",
        "csv" => "text/csv",
        "json" => "application/json",
        "pdf" => "application/pdf",
        "zip" => "application/zip",
        "png" => "image/png",
        "jpg" | "jpeg" => "image/jpeg",
        "gif" => "image/gif",
        _ => "application/octet-stream",
    }
}
