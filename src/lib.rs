//! # Botforge
//!
//! A backend for provisioning template-based chatbot repositories on GitHub,
//! usable both as a standalone binary and as a library.
//!
//! Users authenticate with GitHub OAuth; the service records their identity,
//! lets admins curate a catalog of template repositories, and creates a
//! repository from a chosen template under the user's own GitHub account while
//! keeping a local record of the provisioned chatbot and its content
//! (config, news, questions).
//!
//! ## Library Usage
//!
//! ```toml
//! [dependencies]
//! botforge = { version = "0.1", default-features = false }
//! ```
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use botforge::config::GitHubConfig;
//! use botforge::github::GitHubClient;
//! use botforge::secrets::TokenCipher;
//! use botforge::server::{AppState, create_router};
//! use botforge::store::{SqliteStore, Store};
//!
//! let store = SqliteStore::new("./data/botforge.db").unwrap();
//! store.initialize().unwrap();
//!
//! let github = GitHubClient::new(GitHubConfig::from_env().unwrap()).unwrap();
//! let cipher = TokenCipher::generate();
//!
//! let state = Arc::new(AppState::new(Arc::new(store), Arc::new(github), cipher));
//! let router = create_router(state);
//! // Serve with axum...
//! ```
//!
//! ## Feature Flags
//!
//! - `cli` (default): Includes the binary entrypoint. Disable with `default-features = false`.

pub mod auth;
pub mod config;
pub mod error;
pub mod github;
pub mod provision;
pub mod secrets;
pub mod server;
pub mod store;
pub mod types;
