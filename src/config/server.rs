use std::env;
use std::net::SocketAddr;
use std::path::PathBuf;

use crate::error::{Error, Result};
use crate::secrets::SecretString;

#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub data_dir: PathBuf,
}

impl ServerConfig {
    pub fn socket_addr(&self) -> std::result::Result<SocketAddr, std::net::AddrParseError> {
        format!("{}:{}", self.host, self.port).parse()
    }

    #[must_use]
    pub fn db_path(&self) -> PathBuf {
        self.data_dir.join("botforge.db")
    }

    /// Location of the hex-encoded AES key that seals provider tokens at
    /// rest. Generated on first `serve` if missing.
    #[must_use]
    pub fn token_key_path(&self) -> PathBuf {
        self.data_dir.join(".token_key")
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 8080,
            data_dir: PathBuf::from("./data"),
        }
    }
}

/// OAuth application credentials plus the host endpoint bases. The secret is
/// confidential and only ever sent to the token endpoint.
#[derive(Debug, Clone)]
pub struct GitHubConfig {
    pub client_id: String,
    pub client_secret: SecretString,
    /// Base for the OAuth endpoints (authorize, access_token).
    pub oauth_base_url: String,
    /// Base for the REST API (user, repos).
    pub api_base_url: String,
}

impl GitHubConfig {
    /// Loads credentials from `BOTFORGE_GITHUB_CLIENT_ID` and
    /// `BOTFORGE_GITHUB_CLIENT_SECRET`. Endpoint bases may be overridden with
    /// `BOTFORGE_GITHUB_OAUTH_URL` / `BOTFORGE_GITHUB_API_URL`.
    pub fn from_env() -> Result<Self> {
        let client_id = env::var("BOTFORGE_GITHUB_CLIENT_ID")
            .map_err(|_| Error::Config("BOTFORGE_GITHUB_CLIENT_ID is not set".to_string()))?;
        let client_secret = env::var("BOTFORGE_GITHUB_CLIENT_SECRET")
            .map_err(|_| Error::Config("BOTFORGE_GITHUB_CLIENT_SECRET is not set".to_string()))?;

        let oauth_base_url = env::var("BOTFORGE_GITHUB_OAUTH_URL")
            .unwrap_or_else(|_| "https://github.com".to_string());
        let api_base_url = env::var("BOTFORGE_GITHUB_API_URL")
            .unwrap_or_else(|_| "https://api.github.com".to_string());

        Ok(Self {
            client_id,
            client_secret: SecretString::new(client_secret),
            oauth_base_url: trim_base(&oauth_base_url),
            api_base_url: trim_base(&api_base_url),
        })
    }

    pub fn validate(&self) -> Result<()> {
        if self.client_id.is_empty() {
            return Err(Error::Config("client_id cannot be empty".to_string()));
        }
        if self.client_secret.is_empty() {
            return Err(Error::Config("client_secret cannot be empty".to_string()));
        }
        Ok(())
    }
}

fn trim_base(url: &str) -> String {
    url.trim_end_matches('/').to_string()
}
