use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use axum::Router;
use axum::body::Body;
use axum::http::{Request, StatusCode, header};
use axum::response::Response;
use serde_json::Value;
use tempfile::TempDir;
use tower::ServiceExt;

use botforge::github::{CreatedRepo, HostError, HostProfile, RepoHost};
use botforge::secrets::{SecretString, TokenCipher};
use botforge::server::{AppState, create_router};
use botforge::store::{SqliteStore, Store};

/// A scripted GitHub stand-in. One-time codes are registered up front and
/// consumed on exchange; created repositories live in a vec so tests can
/// assert on the remote side.
pub struct FakeHost {
    codes: Mutex<HashMap<String, (i64, String)>>,
    tokens: Mutex<HashMap<String, (i64, String)>>,
    repos: Mutex<Vec<String>>,
}

impl FakeHost {
    pub fn new() -> Self {
        Self {
            codes: Mutex::new(HashMap::new()),
            tokens: Mutex::new(HashMap::new()),
            repos: Mutex::new(Vec::new()),
        }
    }

    /// Registers a one-time code resolving to the given GitHub user.
    pub fn register_code(&self, code: &str, id: i64, login: &str) {
        self.codes
            .lock()
            .unwrap()
            .insert(code.to_string(), (id, login.to_string()));
    }

    pub fn remote_repos(&self) -> Vec<String> {
        self.repos.lock().unwrap().clone()
    }
}

#[async_trait]
impl RepoHost for FakeHost {
    async fn exchange_code(&self, code: &str) -> Result<SecretString, HostError> {
        // Codes are single-use: remove wins, a second exchange fails.
        let (id, login) = self
            .codes
            .lock()
            .unwrap()
            .remove(code)
            .ok_or_else(|| HostError::Provider("bad_verification_code".to_string()))?;

        let token = format!("gho_{id}_{login}");
        self.tokens
            .lock()
            .unwrap()
            .insert(token.clone(), (id, login));
        Ok(SecretString::new(token))
    }

    async fn fetch_profile(&self, token: &SecretString) -> Result<HostProfile, HostError> {
        let tokens = self.tokens.lock().unwrap();
        let (id, login) = tokens
            .get(token.expose())
            .ok_or_else(|| HostError::Provider("bad credentials".to_string()))?;

        Ok(HostProfile {
            id: *id,
            login: login.clone(),
            avatar_url: Some(format!("https://avatars.test/{id}")),
        })
    }

    async fn create_repo(
        &self,
        token: &SecretString,
        name: &str,
        _description: &str,
    ) -> Result<CreatedRepo, HostError> {
        let login = {
            let tokens = self.tokens.lock().unwrap();
            let (_, login) = tokens
                .get(token.expose())
                .ok_or_else(|| HostError::Provider("bad credentials".to_string()))?;
            login.clone()
        };

        let full_name = format!("{login}/{name}");
        let mut repos = self.repos.lock().unwrap();
        if repos.iter().any(|r| r == &full_name) {
            return Err(HostError::NameConflict);
        }
        repos.push(full_name.clone());

        Ok(CreatedRepo {
            name: name.to_string(),
            html_url: format!("https://github.test/{full_name}"),
        })
    }

    async fn delete_repo(
        &self,
        _token: &SecretString,
        owner: &str,
        name: &str,
    ) -> Result<(), HostError> {
        let full_name = format!("{owner}/{name}");
        self.repos.lock().unwrap().retain(|r| r != &full_name);
        Ok(())
    }
}

/// An in-process server: real router, real SQLite store in a temp dir,
/// fake GitHub.
pub struct TestApp {
    pub router: Router,
    pub store: Arc<SqliteStore>,
    pub host: Arc<FakeHost>,
    _temp_dir: TempDir,
}

impl TestApp {
    pub fn new() -> Self {
        let temp_dir = TempDir::new().expect("create temp dir");
        let store = Arc::new(SqliteStore::new(temp_dir.path().join("botforge.db")).unwrap());
        store.initialize().unwrap();

        let host = Arc::new(FakeHost::new());
        let state = Arc::new(AppState::new(
            store.clone(),
            host.clone(),
            TokenCipher::generate(),
        ));

        Self {
            router: create_router(state),
            store,
            host,
            _temp_dir: temp_dir,
        }
    }

    pub async fn request(
        &self,
        method: &str,
        path: &str,
        token: Option<&str>,
        body: Option<Value>,
    ) -> (StatusCode, Value) {
        let mut builder = Request::builder().method(method).uri(path);
        if let Some(token) = token {
            builder = builder.header(header::AUTHORIZATION, format!("Bearer {token}"));
        }

        let request = match body {
            Some(json) => builder
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(json.to_string()))
                .unwrap(),
            None => builder.body(Body::empty()).unwrap(),
        };

        let response = self.router.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let value = read_json(response).await;
        (status, value)
    }

    /// Logs in with a fresh one-time code and returns (session_token, user).
    pub async fn login(&self, id: i64, login: &str) -> (String, Value) {
        let code = format!("code-{login}-{id}");
        self.host.register_code(&code, id, login);

        let (status, body) = self
            .request(
                "POST",
                "/api/v1/auth/github",
                None,
                Some(serde_json::json!({ "code": code })),
            )
            .await;
        assert_eq!(status, StatusCode::CREATED, "login failed: {body}");

        let token = body["data"]["token"].as_str().unwrap().to_string();
        let user = body["data"]["user"].clone();
        (token, user)
    }

    /// Logs in and promotes the identity to admin, as `admin promote` would.
    pub async fn login_admin(&self, id: i64, login: &str) -> String {
        let (token, user) = self.login(id, login).await;
        self.store
            .set_role(user["id"].as_str().unwrap(), botforge::types::Role::Admin)
            .unwrap();
        token
    }
}

async fn read_json(response: Response) -> Value {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap_or(Value::Null)
    }
}
