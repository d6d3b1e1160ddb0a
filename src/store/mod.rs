mod schema;
mod sqlite;

pub use sqlite::SqliteStore;

use crate::error::Result;
use crate::types::*;

/// Store defines the database interface.
pub trait Store: Send + Sync {
    fn initialize(&self) -> Result<()>;

    // Identity operations
    fn upsert_identity(&self, identity: &Identity) -> Result<()>;
    fn get_identity(&self, id: &str) -> Result<Option<Identity>>;
    fn get_identity_by_login(&self, login: &str) -> Result<Option<Identity>>;

    // Role operations
    fn ensure_role(&self, identity_id: &str) -> Result<Role>;
    fn get_role(&self, identity_id: &str) -> Result<Option<Role>>;
    fn set_role(&self, identity_id: &str, role: Role) -> Result<()>;

    // Session operations
    fn create_session(&self, session: &Session) -> Result<()>;
    fn get_session_by_lookup(&self, lookup: &str) -> Result<Option<Session>>;
    fn delete_session(&self, id: &str) -> Result<bool>;
    fn delete_identity_sessions(&self, identity_id: &str) -> Result<()>;

    // Template operations
    fn create_template(&self, template: &Template) -> Result<()>;
    fn get_template(&self, id: &str) -> Result<Option<Template>>;
    fn list_templates(&self) -> Result<Vec<Template>>;
    fn list_active_templates(&self) -> Result<Vec<Template>>;
    fn update_template(&self, template: &Template) -> Result<()>;
    fn delete_template(&self, id: &str) -> Result<bool>;

    // Chatbot operations. create_chatbot also inserts the empty config row
    // in the same transaction.
    fn create_chatbot(&self, chatbot: &Chatbot) -> Result<()>;
    fn get_chatbot(&self, id: &str) -> Result<Option<Chatbot>>;
    fn get_chatbot_by_repo_name(
        &self,
        identity_id: &str,
        repo_name: &str,
    ) -> Result<Option<Chatbot>>;
    fn list_identity_chatbots(&self, identity_id: &str) -> Result<Vec<Chatbot>>;

    // Chatbot config operations
    fn get_chatbot_config(&self, chatbot_id: &str) -> Result<Option<ChatbotConfig>>;
    fn update_chatbot_config(&self, config: &ChatbotConfig) -> Result<()>;

    // News operations
    fn create_news_item(&self, item: &NewsItem) -> Result<()>;
    fn get_news_item(&self, id: &str) -> Result<Option<NewsItem>>;
    fn list_chatbot_news(&self, chatbot_id: &str) -> Result<Vec<NewsItem>>;
    fn update_news_item(&self, item: &NewsItem) -> Result<()>;
    fn delete_news_item(&self, id: &str) -> Result<bool>;

    // Question operations
    fn create_question(&self, question: &Question) -> Result<()>;
    fn get_question(&self, id: &str) -> Result<Option<Question>>;
    fn list_chatbot_questions(&self, chatbot_id: &str) -> Result<Vec<Question>>;
    fn update_question(&self, question: &Question) -> Result<()>;
    fn delete_question(&self, id: &str) -> Result<bool>;
}
