use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A GitHub account known to this server. `id` is the provider's stable
/// identifier and never changes across re-logins; everything else is
/// overwritten on each successful login.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Identity {
    pub id: String,
    pub login: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub avatar_url: Option<String>,
    /// AES-GCM sealed GitHub access token. Never serialized.
    #[serde(skip)]
    pub sealed_token: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// A login session. The raw session token is shown to the client exactly
/// once; only its argon2 hash and lookup prefix are stored.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Session {
    pub id: String,
    #[serde(skip)]
    pub token_hash: String,
    #[serde(skip)]
    pub token_lookup: String,
    pub identity_id: String,
    pub created_at: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub expires_at: Option<DateTime<Utc>>,
}

/// An admin-curated template repository eligible for provisioning.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Template {
    pub id: String,
    pub owner_identity_id: String,
    pub name: String,
    pub url: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// A chatbot repository provisioned from a template into a user's GitHub
/// account. Written exactly once, after the remote repository is confirmed.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Chatbot {
    pub id: String,
    pub identity_id: String,
    pub template_id: String,
    pub repo_name: String,
    pub repo_url: String,
    pub display_name: String,
    pub created_at: DateTime<Utc>,
}

/// Per-chatbot landing configuration. One row per chatbot, created empty at
/// provisioning time.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatbotConfig {
    pub chatbot_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub subtitle: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewsItem {
    pub id: String,
    pub chatbot_id: String,
    pub title: String,
    pub url: String,
    pub full_text: String,
    pub published_at: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Question {
    pub id: String,
    pub chatbot_id: String,
    pub question: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}
