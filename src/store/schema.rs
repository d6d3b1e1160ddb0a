pub const SCHEMA: &str = r#"
-- GitHub identities; id is the provider's stable user id
CREATE TABLE IF NOT EXISTS identities (
    id TEXT PRIMARY KEY,
    login TEXT NOT NULL,
    avatar_url TEXT,

    -- AES-GCM sealed provider access token, base64(nonce || ciphertext)
    github_token TEXT NOT NULL,

    created_at TEXT DEFAULT (datetime('now')),
    updated_at TEXT DEFAULT (datetime('now'))
);

-- Exactly one role per identity, defaulted to 'user' at first login
CREATE TABLE IF NOT EXISTS identity_roles (
    identity_id TEXT PRIMARY KEY REFERENCES identities(id) ON DELETE CASCADE,
    role TEXT NOT NULL DEFAULT 'user' CHECK (role IN ('admin', 'user')),
    created_at TEXT DEFAULT (datetime('now'))
);

-- Login sessions; the raw token is never stored
CREATE TABLE IF NOT EXISTS sessions (
    id TEXT PRIMARY KEY,
    token_hash TEXT NOT NULL,          -- argon2id hash with embedded salt
    token_lookup TEXT NOT NULL,        -- first 8 chars of ID for fast lookup
    identity_id TEXT NOT NULL REFERENCES identities(id) ON DELETE CASCADE,
    created_at TEXT DEFAULT (datetime('now')),
    expires_at TEXT                    -- NULL = never
);

-- Admin-curated template repositories
CREATE TABLE IF NOT EXISTS templates (
    id TEXT PRIMARY KEY,
    owner_identity_id TEXT NOT NULL REFERENCES identities(id) ON DELETE CASCADE,
    name TEXT NOT NULL,
    url TEXT NOT NULL,
    description TEXT,
    active INTEGER NOT NULL DEFAULT 1,
    created_at TEXT DEFAULT (datetime('now')),
    updated_at TEXT DEFAULT (datetime('now'))
);

-- Provisioned chatbot repositories; a row exists iff the remote repository
-- creation was confirmed
CREATE TABLE IF NOT EXISTS chatbots (
    id TEXT PRIMARY KEY,
    identity_id TEXT NOT NULL REFERENCES identities(id) ON DELETE CASCADE,
    template_id TEXT NOT NULL REFERENCES templates(id),
    repo_name TEXT NOT NULL,
    repo_url TEXT NOT NULL,
    display_name TEXT NOT NULL,
    created_at TEXT DEFAULT (datetime('now')),

    UNIQUE(identity_id, repo_name)
);

-- Landing configuration, one row per chatbot, created empty at provisioning
CREATE TABLE IF NOT EXISTS chatbot_configs (
    chatbot_id TEXT PRIMARY KEY REFERENCES chatbots(id) ON DELETE CASCADE,
    title TEXT,
    subtitle TEXT,
    created_at TEXT DEFAULT (datetime('now')),
    updated_at TEXT DEFAULT (datetime('now'))
);

-- News entries shown by a chatbot
CREATE TABLE IF NOT EXISTS news (
    id TEXT PRIMARY KEY,
    chatbot_id TEXT NOT NULL REFERENCES chatbots(id) ON DELETE CASCADE,
    title TEXT NOT NULL,
    url TEXT NOT NULL,
    full_text TEXT NOT NULL,
    published_at TEXT NOT NULL,
    created_at TEXT DEFAULT (datetime('now')),
    updated_at TEXT DEFAULT (datetime('now'))
);

-- Suggested questions shown by a chatbot
CREATE TABLE IF NOT EXISTS questions (
    id TEXT PRIMARY KEY,
    chatbot_id TEXT NOT NULL REFERENCES chatbots(id) ON DELETE CASCADE,
    question TEXT NOT NULL,
    created_at TEXT DEFAULT (datetime('now')),
    updated_at TEXT DEFAULT (datetime('now'))
);

-- Create indexes
CREATE UNIQUE INDEX IF NOT EXISTS idx_sessions_lookup ON sessions(token_lookup);
CREATE INDEX IF NOT EXISTS idx_sessions_identity ON sessions(identity_id);
CREATE INDEX IF NOT EXISTS idx_identities_login ON identities(login);
CREATE INDEX IF NOT EXISTS idx_templates_owner ON templates(owner_identity_id);
CREATE INDEX IF NOT EXISTS idx_chatbots_identity ON chatbots(identity_id);
CREATE INDEX IF NOT EXISTS idx_news_chatbot ON news(chatbot_id);
CREATE INDEX IF NOT EXISTS idx_questions_chatbot ON questions(chatbot_id);
"#;
