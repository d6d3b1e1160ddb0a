use std::time::Duration;

use reqwest::StatusCode;
use serde::Deserialize;
use url::Url;

use super::{CreatedRepo, HostError, HostProfile, RepoHost};
use crate::config::GitHubConfig;
use crate::error::{Error, Result};
use crate::secrets::SecretString;

const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);
const CONNECT_TIMEOUT: Duration = Duration::from_secs(10);
const API_VERSION: &str = "2022-11-28";

/// GitHub-backed [`RepoHost`]. Endpoint bases are taken from the config so
/// tests and forge-compatible hosts can point elsewhere.
pub struct GitHubClient {
    config: GitHubConfig,
    http: reqwest::Client,
}

#[derive(Debug, Deserialize)]
struct TokenExchangeResponse {
    #[serde(default)]
    access_token: Option<String>,
    #[serde(default)]
    error: Option<String>,
    #[serde(default)]
    error_description: Option<String>,
}

#[derive(Debug, serde::Serialize)]
struct CreateRepoBody<'a> {
    name: &'a str,
    description: &'a str,
    private: bool,
    auto_init: bool,
}

impl GitHubClient {
    pub fn new(config: GitHubConfig) -> Result<Self> {
        config.validate()?;
        let http = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .connect_timeout(CONNECT_TIMEOUT)
            .build()
            .map_err(|e| Error::Config(format!("failed to build http client: {e}")))?;

        Ok(Self { config, http })
    }

    /// Builds the authorization URL the frontend sends users to. The `state`
    /// value is the caller's CSRF token and must be verified on callback.
    pub fn authorization_url(&self, state: &str) -> Result<String> {
        let mut url = Url::parse(&self.config.oauth_base_url)
            .map_err(|e| Error::Config(format!("invalid oauth base url: {e}")))?;
        url.set_path("/login/oauth/authorize");
        url.query_pairs_mut()
            .append_pair("client_id", &self.config.client_id)
            .append_pair("scope", "read:user public_repo delete_repo")
            .append_pair("state", state);
        Ok(url.to_string())
    }

    fn token_url(&self) -> String {
        format!("{}/login/oauth/access_token", self.config.oauth_base_url)
    }

    fn api_url(&self, path: &str) -> String {
        format!("{}{}", self.config.api_base_url, path)
    }
}

fn transport(err: &reqwest::Error) -> HostError {
    HostError::Transport(err.to_string())
}

#[async_trait::async_trait]
impl RepoHost for GitHubClient {
    #[tracing::instrument(skip_all, name = "GitHubClient::exchange_code")]
    async fn exchange_code(&self, code: &str) -> std::result::Result<SecretString, HostError> {
        tracing::debug!("exchanging authorization code for access token");

        let response = self
            .http
            .post(self.token_url())
            .header("Accept", "application/json")
            .form(&[
                ("client_id", self.config.client_id.as_str()),
                ("client_secret", self.config.client_secret.expose()),
                ("code", code),
            ])
            .send()
            .await
            .map_err(|e| transport(&e))?;

        let body: TokenExchangeResponse = response.json().await.map_err(|e| transport(&e))?;

        if let Some(error) = body.error {
            return Err(HostError::Provider(
                body.error_description.unwrap_or(error),
            ));
        }

        match body.access_token {
            Some(token) if !token.is_empty() => Ok(SecretString::new(token)),
            _ => Err(HostError::Provider(
                "token response missing access_token".to_string(),
            )),
        }
    }

    #[tracing::instrument(skip_all, name = "GitHubClient::fetch_profile")]
    async fn fetch_profile(
        &self,
        token: &SecretString,
    ) -> std::result::Result<HostProfile, HostError> {
        let response = self
            .http
            .get(self.api_url("/user"))
            .header("Accept", "application/vnd.github+json")
            .header("X-GitHub-Api-Version", API_VERSION)
            .bearer_auth(token.expose())
            .send()
            .await
            .map_err(|e| transport(&e))?;

        if !response.status().is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(HostError::Provider(format!("failed to fetch profile: {body}")));
        }

        response
            .json()
            .await
            .map_err(|e| HostError::Provider(format!("unexpected profile response: {e}")))
    }

    #[tracing::instrument(skip_all, name = "GitHubClient::create_repo", fields(repo = name))]
    async fn create_repo(
        &self,
        token: &SecretString,
        name: &str,
        description: &str,
    ) -> std::result::Result<CreatedRepo, HostError> {
        let response = self
            .http
            .post(self.api_url("/user/repos"))
            .header("Accept", "application/vnd.github+json")
            .header("X-GitHub-Api-Version", API_VERSION)
            .bearer_auth(token.expose())
            .json(&CreateRepoBody {
                name,
                description,
                private: false,
                auto_init: true,
            })
            .send()
            .await
            .map_err(|e| transport(&e))?;

        // GitHub reports a name collision as 422 on this endpoint.
        match response.status() {
            StatusCode::UNPROCESSABLE_ENTITY | StatusCode::CONFLICT => Err(HostError::NameConflict),
            status if !status.is_success() => {
                let body = response.text().await.unwrap_or_default();
                Err(HostError::Provider(format!("failed to create repo: {body}")))
            }
            _ => response
                .json()
                .await
                .map_err(|e| HostError::Provider(format!("unexpected create response: {e}"))),
        }
    }

    #[tracing::instrument(skip_all, name = "GitHubClient::delete_repo", fields(repo = name))]
    async fn delete_repo(
        &self,
        token: &SecretString,
        owner: &str,
        name: &str,
    ) -> std::result::Result<(), HostError> {
        let response = self
            .http
            .delete(self.api_url(&format!("/repos/{owner}/{name}")))
            .header("Accept", "application/vnd.github+json")
            .header("X-GitHub-Api-Version", API_VERSION)
            .bearer_auth(token.expose())
            .send()
            .await
            .map_err(|e| transport(&e))?;

        if !response.status().is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(HostError::Provider(format!("failed to delete repo: {body}")));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_config() -> GitHubConfig {
        GitHubConfig {
            client_id: "test_client_id".to_string(),
            client_secret: SecretString::new("test_secret"),
            oauth_base_url: "https://github.com".to_string(),
            api_base_url: "https://api.github.com".to_string(),
        }
    }

    #[test]
    fn test_authorization_url_contains_required_params() {
        let client = GitHubClient::new(test_config()).unwrap();
        let url = client.authorization_url("state_123").unwrap();

        assert!(url.starts_with("https://github.com/login/oauth/authorize"));
        assert!(url.contains("client_id=test_client_id"));
        assert!(url.contains("state=state_123"));
        assert!(url.contains("scope="));
    }

    #[test]
    fn test_token_exchange_response_with_error_payload() {
        let body: TokenExchangeResponse = serde_json::from_str(
            r#"{"error": "bad_verification_code", "error_description": "The code passed is incorrect or expired."}"#,
        )
        .unwrap();

        assert!(body.access_token.is_none());
        assert_eq!(body.error.as_deref(), Some("bad_verification_code"));
    }

    #[test]
    fn test_token_exchange_response_with_token() {
        let body: TokenExchangeResponse =
            serde_json::from_str(r#"{"access_token": "gho_xxx", "token_type": "bearer", "scope": "public_repo"}"#)
                .unwrap();

        assert_eq!(body.access_token.as_deref(), Some("gho_xxx"));
        assert!(body.error.is_none());
    }

    #[test]
    fn test_profile_deserializes_with_null_fields() {
        let profile: HostProfile = serde_json::from_str(
            r#"{"id": 583231, "login": "octocat", "name": null, "avatar_url": null}"#,
        )
        .unwrap();

        assert_eq!(profile.id, 583231);
        assert_eq!(profile.login, "octocat");
        assert!(profile.avatar_url.is_none());
    }
}
