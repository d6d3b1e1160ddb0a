use std::path::Path;
use std::sync::Mutex;

use chrono::{DateTime, Utc};
use rusqlite::{Connection, ErrorCode, OptionalExtension, params};

use super::Store;
use super::schema::SCHEMA;
use crate::error::{Error, Result};
use crate::types::*;

pub struct SqliteStore {
    conn: Mutex<Connection>,
}

impl SqliteStore {
    pub fn new<P: AsRef<Path>>(db_path: P) -> Result<Self> {
        let conn = Connection::open(db_path)?;

        conn.pragma_update(None, "foreign_keys", "ON")?;
        conn.pragma_update(None, "journal_mode", "WAL")?;

        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    fn conn(&self) -> std::sync::MutexGuard<'_, Connection> {
        self.conn.lock().unwrap_or_else(|e| e.into_inner())
    }
}

fn parse_datetime(s: &str) -> DateTime<Utc> {
    DateTime::parse_from_rfc3339(s)
        .map(|dt| dt.with_timezone(&Utc))
        .or_else(|_| {
            // Handle SQLite's default datetime format: "YYYY-MM-DD HH:MM:SS"
            chrono::NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S").map(|ndt| ndt.and_utc())
        })
        .unwrap_or_else(|e| {
            tracing::error!("Invalid datetime in database: '{}' - {}", s, e);
            Utc::now()
        })
}

fn format_datetime(dt: &DateTime<Utc>) -> String {
    dt.to_rfc3339()
}

fn is_constraint_violation(err: &rusqlite::Error) -> bool {
    matches!(
        err,
        rusqlite::Error::SqliteFailure(e, _) if e.code == ErrorCode::ConstraintViolation
    )
}

impl Store for SqliteStore {
    fn initialize(&self) -> Result<()> {
        self.conn().execute_batch(SCHEMA)?;
        Ok(())
    }

    // Identity operations

    fn upsert_identity(&self, identity: &Identity) -> Result<()> {
        // Single statement so a concurrent login of the same identity can
        // never observe a half-written record.
        self.conn().execute(
            "INSERT INTO identities (id, login, avatar_url, github_token, created_at, updated_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)
             ON CONFLICT(id) DO UPDATE SET
                 login = excluded.login,
                 avatar_url = excluded.avatar_url,
                 github_token = excluded.github_token,
                 updated_at = excluded.updated_at",
            params![
                identity.id,
                identity.login,
                identity.avatar_url,
                identity.sealed_token,
                format_datetime(&identity.created_at),
                format_datetime(&identity.updated_at),
            ],
        )?;
        Ok(())
    }

    fn get_identity(&self, id: &str) -> Result<Option<Identity>> {
        let conn = self.conn();
        conn.query_row(
            "SELECT id, login, avatar_url, github_token, created_at, updated_at
             FROM identities WHERE id = ?1",
            params![id],
            |row| {
                Ok(Identity {
                    id: row.get(0)?,
                    login: row.get(1)?,
                    avatar_url: row.get(2)?,
                    sealed_token: row.get(3)?,
                    created_at: parse_datetime(&row.get::<_, String>(4)?),
                    updated_at: parse_datetime(&row.get::<_, String>(5)?),
                })
            },
        )
        .optional()
        .map_err(Error::from)
    }

    fn get_identity_by_login(&self, login: &str) -> Result<Option<Identity>> {
        let conn = self.conn();
        conn.query_row(
            "SELECT id, login, avatar_url, github_token, created_at, updated_at
             FROM identities WHERE login = ?1",
            params![login],
            |row| {
                Ok(Identity {
                    id: row.get(0)?,
                    login: row.get(1)?,
                    avatar_url: row.get(2)?,
                    sealed_token: row.get(3)?,
                    created_at: parse_datetime(&row.get::<_, String>(4)?),
                    updated_at: parse_datetime(&row.get::<_, String>(5)?),
                })
            },
        )
        .optional()
        .map_err(Error::from)
    }

    // Role operations

    fn ensure_role(&self, identity_id: &str) -> Result<Role> {
        let conn = self.conn();

        // The primary key on identity_id makes this idempotent: the insert
        // is a no-op on every call after the first.
        conn.execute(
            "INSERT OR IGNORE INTO identity_roles (identity_id, role) VALUES (?1, 'user')",
            params![identity_id],
        )?;

        let role: String = conn.query_row(
            "SELECT role FROM identity_roles WHERE identity_id = ?1",
            params![identity_id],
            |row| row.get(0),
        )?;

        role.parse()
    }

    fn get_role(&self, identity_id: &str) -> Result<Option<Role>> {
        let conn = self.conn();
        let role: Option<String> = conn
            .query_row(
                "SELECT role FROM identity_roles WHERE identity_id = ?1",
                params![identity_id],
                |row| row.get(0),
            )
            .optional()?;

        role.map(|r| r.parse()).transpose()
    }

    fn set_role(&self, identity_id: &str, role: Role) -> Result<()> {
        let rows = self.conn().execute(
            "UPDATE identity_roles SET role = ?1 WHERE identity_id = ?2",
            params![role.as_str(), identity_id],
        )?;

        if rows == 0 {
            return Err(Error::NotFound);
        }
        Ok(())
    }

    // Session operations

    fn create_session(&self, session: &Session) -> Result<()> {
        self.conn()
            .execute(
                "INSERT INTO sessions (id, token_hash, token_lookup, identity_id, created_at, expires_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
                params![
                    session.id,
                    session.token_hash,
                    session.token_lookup,
                    session.identity_id,
                    format_datetime(&session.created_at),
                    session.expires_at.as_ref().map(format_datetime),
                ],
            )
            .map_err(|e| {
                if is_constraint_violation(&e) {
                    Error::SessionLookupCollision
                } else {
                    Error::from(e)
                }
            })?;
        Ok(())
    }

    fn get_session_by_lookup(&self, lookup: &str) -> Result<Option<Session>> {
        let conn = self.conn();
        conn.query_row(
            "SELECT id, token_hash, token_lookup, identity_id, created_at, expires_at
             FROM sessions WHERE token_lookup = ?1",
            params![lookup],
            |row| {
                Ok(Session {
                    id: row.get(0)?,
                    token_hash: row.get(1)?,
                    token_lookup: row.get(2)?,
                    identity_id: row.get(3)?,
                    created_at: parse_datetime(&row.get::<_, String>(4)?),
                    expires_at: row
                        .get::<_, Option<String>>(5)?
                        .map(|s| parse_datetime(&s)),
                })
            },
        )
        .optional()
        .map_err(Error::from)
    }

    fn delete_session(&self, id: &str) -> Result<bool> {
        let rows = self
            .conn()
            .execute("DELETE FROM sessions WHERE id = ?1", params![id])?;
        Ok(rows > 0)
    }

    fn delete_identity_sessions(&self, identity_id: &str) -> Result<()> {
        self.conn().execute(
            "DELETE FROM sessions WHERE identity_id = ?1",
            params![identity_id],
        )?;
        Ok(())
    }

    // Template operations

    fn create_template(&self, template: &Template) -> Result<()> {
        self.conn().execute(
            "INSERT INTO templates (id, owner_identity_id, name, url, description, active, created_at, updated_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
            params![
                template.id,
                template.owner_identity_id,
                template.name,
                template.url,
                template.description,
                template.active,
                format_datetime(&template.created_at),
                format_datetime(&template.updated_at),
            ],
        )?;
        Ok(())
    }

    fn get_template(&self, id: &str) -> Result<Option<Template>> {
        let conn = self.conn();
        conn.query_row(
            "SELECT id, owner_identity_id, name, url, description, active, created_at, updated_at
             FROM templates WHERE id = ?1",
            params![id],
            |row| {
                Ok(Template {
                    id: row.get(0)?,
                    owner_identity_id: row.get(1)?,
                    name: row.get(2)?,
                    url: row.get(3)?,
                    description: row.get(4)?,
                    active: row.get(5)?,
                    created_at: parse_datetime(&row.get::<_, String>(6)?),
                    updated_at: parse_datetime(&row.get::<_, String>(7)?),
                })
            },
        )
        .optional()
        .map_err(Error::from)
    }

    fn list_templates(&self) -> Result<Vec<Template>> {
        let conn = self.conn();
        let mut stmt = conn.prepare(
            "SELECT id, owner_identity_id, name, url, description, active, created_at, updated_at
             FROM templates ORDER BY created_at DESC",
        )?;

        let rows = stmt.query_map([], |row| {
            Ok(Template {
                id: row.get(0)?,
                owner_identity_id: row.get(1)?,
                name: row.get(2)?,
                url: row.get(3)?,
                description: row.get(4)?,
                active: row.get(5)?,
                created_at: parse_datetime(&row.get::<_, String>(6)?),
                updated_at: parse_datetime(&row.get::<_, String>(7)?),
            })
        })?;

        rows.collect::<std::result::Result<Vec<_>, _>>()
            .map_err(Error::from)
    }

    fn list_active_templates(&self) -> Result<Vec<Template>> {
        let conn = self.conn();
        let mut stmt = conn.prepare(
            "SELECT id, owner_identity_id, name, url, description, active, created_at, updated_at
             FROM templates WHERE active = 1 ORDER BY created_at DESC",
        )?;

        let rows = stmt.query_map([], |row| {
            Ok(Template {
                id: row.get(0)?,
                owner_identity_id: row.get(1)?,
                name: row.get(2)?,
                url: row.get(3)?,
                description: row.get(4)?,
                active: row.get(5)?,
                created_at: parse_datetime(&row.get::<_, String>(6)?),
                updated_at: parse_datetime(&row.get::<_, String>(7)?),
            })
        })?;

        rows.collect::<std::result::Result<Vec<_>, _>>()
            .map_err(Error::from)
    }

    fn update_template(&self, template: &Template) -> Result<()> {
        let rows = self.conn().execute(
            "UPDATE templates SET name = ?1, url = ?2, description = ?3, active = ?4, updated_at = ?5
             WHERE id = ?6",
            params![
                template.name,
                template.url,
                template.description,
                template.active,
                format_datetime(&template.updated_at),
                template.id,
            ],
        )?;

        if rows == 0 {
            return Err(Error::NotFound);
        }
        Ok(())
    }

    fn delete_template(&self, id: &str) -> Result<bool> {
        let rows = self
            .conn()
            .execute("DELETE FROM templates WHERE id = ?1", params![id])
            .map_err(|e| {
                // Chatbots keep a foreign key to their template; deleting a
                // referenced template is a conflict, not a server fault.
                if is_constraint_violation(&e) {
                    Error::Conflict("template is referenced by existing chatbots".to_string())
                } else {
                    Error::from(e)
                }
            })?;
        Ok(rows > 0)
    }

    // Chatbot operations

    fn create_chatbot(&self, chatbot: &Chatbot) -> Result<()> {
        let mut conn = self.conn();
        let tx = conn.transaction()?;

        tx.execute(
            "INSERT INTO chatbots (id, identity_id, template_id, repo_name, repo_url, display_name, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
            params![
                chatbot.id,
                chatbot.identity_id,
                chatbot.template_id,
                chatbot.repo_name,
                chatbot.repo_url,
                chatbot.display_name,
                format_datetime(&chatbot.created_at),
            ],
        )
        .map_err(|e| {
            if is_constraint_violation(&e) {
                Error::AlreadyExists
            } else {
                Error::from(e)
            }
        })?;

        // The empty config row rides in the same transaction so a chatbot
        // can never exist without one.
        tx.execute(
            "INSERT INTO chatbot_configs (chatbot_id, created_at, updated_at)
             VALUES (?1, ?2, ?2)",
            params![chatbot.id, format_datetime(&chatbot.created_at)],
        )?;

        tx.commit()?;
        Ok(())
    }

    fn get_chatbot(&self, id: &str) -> Result<Option<Chatbot>> {
        let conn = self.conn();
        conn.query_row(
            "SELECT id, identity_id, template_id, repo_name, repo_url, display_name, created_at
             FROM chatbots WHERE id = ?1",
            params![id],
            |row| {
                Ok(Chatbot {
                    id: row.get(0)?,
                    identity_id: row.get(1)?,
                    template_id: row.get(2)?,
                    repo_name: row.get(3)?,
                    repo_url: row.get(4)?,
                    display_name: row.get(5)?,
                    created_at: parse_datetime(&row.get::<_, String>(6)?),
                })
            },
        )
        .optional()
        .map_err(Error::from)
    }

    fn get_chatbot_by_repo_name(
        &self,
        identity_id: &str,
        repo_name: &str,
    ) -> Result<Option<Chatbot>> {
        let conn = self.conn();
        conn.query_row(
            "SELECT id, identity_id, template_id, repo_name, repo_url, display_name, created_at
             FROM chatbots WHERE identity_id = ?1 AND repo_name = ?2",
            params![identity_id, repo_name],
            |row| {
                Ok(Chatbot {
                    id: row.get(0)?,
                    identity_id: row.get(1)?,
                    template_id: row.get(2)?,
                    repo_name: row.get(3)?,
                    repo_url: row.get(4)?,
                    display_name: row.get(5)?,
                    created_at: parse_datetime(&row.get::<_, String>(6)?),
                })
            },
        )
        .optional()
        .map_err(Error::from)
    }

    fn list_identity_chatbots(&self, identity_id: &str) -> Result<Vec<Chatbot>> {
        let conn = self.conn();
        let mut stmt = conn.prepare(
            "SELECT id, identity_id, template_id, repo_name, repo_url, display_name, created_at
             FROM chatbots WHERE identity_id = ?1 ORDER BY created_at DESC",
        )?;

        let rows = stmt.query_map(params![identity_id], |row| {
            Ok(Chatbot {
                id: row.get(0)?,
                identity_id: row.get(1)?,
                template_id: row.get(2)?,
                repo_name: row.get(3)?,
                repo_url: row.get(4)?,
                display_name: row.get(5)?,
                created_at: parse_datetime(&row.get::<_, String>(6)?),
            })
        })?;

        rows.collect::<std::result::Result<Vec<_>, _>>()
            .map_err(Error::from)
    }

    // Chatbot config operations

    fn get_chatbot_config(&self, chatbot_id: &str) -> Result<Option<ChatbotConfig>> {
        let conn = self.conn();
        conn.query_row(
            "SELECT chatbot_id, title, subtitle, created_at, updated_at
             FROM chatbot_configs WHERE chatbot_id = ?1",
            params![chatbot_id],
            |row| {
                Ok(ChatbotConfig {
                    chatbot_id: row.get(0)?,
                    title: row.get(1)?,
                    subtitle: row.get(2)?,
                    created_at: parse_datetime(&row.get::<_, String>(3)?),
                    updated_at: parse_datetime(&row.get::<_, String>(4)?),
                })
            },
        )
        .optional()
        .map_err(Error::from)
    }

    fn update_chatbot_config(&self, config: &ChatbotConfig) -> Result<()> {
        let rows = self.conn().execute(
            "UPDATE chatbot_configs SET title = ?1, subtitle = ?2, updated_at = ?3
             WHERE chatbot_id = ?4",
            params![
                config.title,
                config.subtitle,
                format_datetime(&config.updated_at),
                config.chatbot_id,
            ],
        )?;

        if rows == 0 {
            return Err(Error::NotFound);
        }
        Ok(())
    }

    // News operations

    fn create_news_item(&self, item: &NewsItem) -> Result<()> {
        self.conn().execute(
            "INSERT INTO news (id, chatbot_id, title, url, full_text, published_at, created_at, updated_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
            params![
                item.id,
                item.chatbot_id,
                item.title,
                item.url,
                item.full_text,
                format_datetime(&item.published_at),
                format_datetime(&item.created_at),
                format_datetime(&item.updated_at),
            ],
        )?;
        Ok(())
    }

    fn get_news_item(&self, id: &str) -> Result<Option<NewsItem>> {
        let conn = self.conn();
        conn.query_row(
            "SELECT id, chatbot_id, title, url, full_text, published_at, created_at, updated_at
             FROM news WHERE id = ?1",
            params![id],
            |row| {
                Ok(NewsItem {
                    id: row.get(0)?,
                    chatbot_id: row.get(1)?,
                    title: row.get(2)?,
                    url: row.get(3)?,
                    full_text: row.get(4)?,
                    published_at: parse_datetime(&row.get::<_, String>(5)?),
                    created_at: parse_datetime(&row.get::<_, String>(6)?),
                    updated_at: parse_datetime(&row.get::<_, String>(7)?),
                })
            },
        )
        .optional()
        .map_err(Error::from)
    }

    fn list_chatbot_news(&self, chatbot_id: &str) -> Result<Vec<NewsItem>> {
        let conn = self.conn();
        let mut stmt = conn.prepare(
            "SELECT id, chatbot_id, title, url, full_text, published_at, created_at, updated_at
             FROM news WHERE chatbot_id = ?1 ORDER BY published_at DESC",
        )?;

        let rows = stmt.query_map(params![chatbot_id], |row| {
            Ok(NewsItem {
                id: row.get(0)?,
                chatbot_id: row.get(1)?,
                title: row.get(2)?,
                url: row.get(3)?,
                full_text: row.get(4)?,
                published_at: parse_datetime(&row.get::<_, String>(5)?),
                created_at: parse_datetime(&row.get::<_, String>(6)?),
                updated_at: parse_datetime(&row.get::<_, String>(7)?),
            })
        })?;

        rows.collect::<std::result::Result<Vec<_>, _>>()
            .map_err(Error::from)
    }

    fn update_news_item(&self, item: &NewsItem) -> Result<()> {
        let rows = self.conn().execute(
            "UPDATE news SET title = ?1, url = ?2, full_text = ?3, published_at = ?4, updated_at = ?5
             WHERE id = ?6",
            params![
                item.title,
                item.url,
                item.full_text,
                format_datetime(&item.published_at),
                format_datetime(&item.updated_at),
                item.id,
            ],
        )?;

        if rows == 0 {
            return Err(Error::NotFound);
        }
        Ok(())
    }

    fn delete_news_item(&self, id: &str) -> Result<bool> {
        let rows = self
            .conn()
            .execute("DELETE FROM news WHERE id = ?1", params![id])?;
        Ok(rows > 0)
    }

    // Question operations

    fn create_question(&self, question: &Question) -> Result<()> {
        self.conn().execute(
            "INSERT INTO questions (id, chatbot_id, question, created_at, updated_at)
             VALUES (?1, ?2, ?3, ?4, ?5)",
            params![
                question.id,
                question.chatbot_id,
                question.question,
                format_datetime(&question.created_at),
                format_datetime(&question.updated_at),
            ],
        )?;
        Ok(())
    }

    fn get_question(&self, id: &str) -> Result<Option<Question>> {
        let conn = self.conn();
        conn.query_row(
            "SELECT id, chatbot_id, question, created_at, updated_at
             FROM questions WHERE id = ?1",
            params![id],
            |row| {
                Ok(Question {
                    id: row.get(0)?,
                    chatbot_id: row.get(1)?,
                    question: row.get(2)?,
                    created_at: parse_datetime(&row.get::<_, String>(3)?),
                    updated_at: parse_datetime(&row.get::<_, String>(4)?),
                })
            },
        )
        .optional()
        .map_err(Error::from)
    }

    fn list_chatbot_questions(&self, chatbot_id: &str) -> Result<Vec<Question>> {
        let conn = self.conn();
        let mut stmt = conn.prepare(
            "SELECT id, chatbot_id, question, created_at, updated_at
             FROM questions WHERE chatbot_id = ?1 ORDER BY created_at ASC",
        )?;

        let rows = stmt.query_map(params![chatbot_id], |row| {
            Ok(Question {
                id: row.get(0)?,
                chatbot_id: row.get(1)?,
                question: row.get(2)?,
                created_at: parse_datetime(&row.get::<_, String>(3)?),
                updated_at: parse_datetime(&row.get::<_, String>(4)?),
            })
        })?;

        rows.collect::<std::result::Result<Vec<_>, _>>()
            .map_err(Error::from)
    }

    fn update_question(&self, question: &Question) -> Result<()> {
        let rows = self.conn().execute(
            "UPDATE questions SET question = ?1, updated_at = ?2 WHERE id = ?3",
            params![
                question.question,
                format_datetime(&question.updated_at),
                question.id,
            ],
        )?;

        if rows == 0 {
            return Err(Error::NotFound);
        }
        Ok(())
    }

    fn delete_question(&self, id: &str) -> Result<bool> {
        let rows = self
            .conn()
            .execute("DELETE FROM questions WHERE id = ?1", params![id])?;
        Ok(rows > 0)
    }
}
