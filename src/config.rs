use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    ReadError(#[from] std::io::Error),

    #[error("Failed to parse config file: {0}")]
    ParseError(#[from] serde_json::Error),

    #[error("Failed to create config directory")]
    CreateDirError,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SmtpAccount {
    pub name: String,
    pub email: String,
    pub smtp_server: String,
    pub smtp_port: u16,
    pub smtp_username: String,
    pub smtp_password: String,
    #[serde(default = "default_ehlo_hostname")]
    pub ehlo_hostname: String,
}

fn default_ehlo_hostname() -> String {
    "localhost".to_string()
}

impl Default for SmtpAccount {
    fn default() -> Self {
        Self {
            name: "Default Account".to_string(),
            email: "user@example.com".to_string(),
            smtp_server: "smtp.example.com".to_string(),
            smtp_port: 587,
            smtp_username: "user@example.com".to_string(),
            smtp_password: "".to_string(),
            ehlo_hostname: default_ehlo_hostname(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub accounts: Vec<SmtpAccount>,
    pub default_account: usize,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            accounts: vec![],
            default_account: 0,
        }
    }
}

impl Config {
    pub fn load(path: &str) -> Result<Self, ConfigError> {
        let path = Path::new(path);

        // If the file doesn't exist, return default config
        if !path.exists() {
            return Ok(Config::default());
        }

        let content = fs::read_to_string(path)?;
        let config = serde_json::from_str(&content)?;

        Ok(config)
    }

    pub fn save(&self, path: &str) -> Result<(), ConfigError> {
        let path = Path::new(path);

        // Create parent directory if it doesn't exist
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(|_| ConfigError::CreateDirError)?;
        }

        let content = serde_json::to_string_pretty(self)?;
        fs::write(path, content)?;

        Ok(())
    }

    pub fn get_default_account(&self) -> Result<&SmtpAccount, &'static str> {
        if self.accounts.is_empty() {
            return Err("No accounts configured");
        }

        if self.default_account >= self.accounts.len() {
            return Err("Default account index out of bounds");
        }

        Ok(&self.accounts[self.default_account])
    }

    pub fn find_account(&self, name: &str) -> Option<&SmtpAccount> {
        self.accounts.iter().find(|a| a.name == name)
    }

    pub fn add_account(&mut self, account: SmtpAccount) {
        self.accounts.push(account);
    }

    pub fn set_default_account(&mut self, index: usize) -> Result<(), &'static str> {
        if index >= self.accounts.len() {
            return Err("Account index out of bounds");
        }

        self.default_account = index;
        Ok(())
    }
}
