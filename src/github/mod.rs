mod client;

pub use client::GitHubClient;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::secrets::SecretString;

/// Errors from the repository host, split so callers can pick a retry
/// policy: provider rejections are not retryable with the same input,
/// transport failures may be retried (with a fresh one-time code for the
/// OAuth exchange, since codes are single-use).
#[derive(Debug, thiserror::Error)]
pub enum HostError {
    /// The host rejected the call (bad code, bad token, error payload).
    #[error("provider error: {0}")]
    Provider(String),

    /// Network failure, timeout, or an unparseable body.
    #[error("transport error: {0}")]
    Transport(String),

    /// The host reported a repository name collision.
    #[error("repository name already exists")]
    NameConflict,
}

impl From<HostError> for crate::error::Error {
    fn from(err: HostError) -> Self {
        match err {
            HostError::Provider(msg) => crate::error::Error::Provider(msg),
            HostError::Transport(msg) => crate::error::Error::Transport(msg),
            HostError::NameConflict => {
                crate::error::Error::NameConflict("remote repository".to_string())
            }
        }
    }
}

/// Profile of the authenticated user, as returned by the host's
/// current-user endpoint. `id` is the stable identifier used as the
/// identity primary key; `login` may change over time.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HostProfile {
    pub id: i64,
    pub login: String,
    #[serde(default)]
    pub avatar_url: Option<String>,
}

/// A repository confirmed created on the host.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreatedRepo {
    pub name: String,
    pub html_url: String,
}

/// Capability interface over the repository host. The login flow and the
/// provisioner depend only on this trait; tests substitute a fake.
#[async_trait]
pub trait RepoHost: Send + Sync {
    /// Trades a one-time OAuth authorization code for an access token.
    /// The code is single-use; a second exchange with the same code is a
    /// [`HostError::Provider`].
    async fn exchange_code(&self, code: &str) -> Result<SecretString, HostError>;

    /// Fetches the profile of the user the token belongs to.
    async fn fetch_profile(&self, token: &SecretString) -> Result<HostProfile, HostError>;

    /// Creates a repository under the token owner's account.
    async fn create_repo(
        &self,
        token: &SecretString,
        name: &str,
        description: &str,
    ) -> Result<CreatedRepo, HostError>;

    /// Deletes a repository under the token owner's account. Only used to
    /// compensate a failed provisioning run.
    async fn delete_repo(
        &self,
        token: &SecretString,
        owner: &str,
        name: &str,
    ) -> Result<(), HostError>;
}
