use crate::server::response::{ApiError, StoreOptionExt, StoreResultExt};
use crate::store::Store;
use crate::types::Chatbot;

/// Loads a chatbot and verifies it belongs to the calling identity.
/// Someone else's chatbot id reads as not-found, not forbidden, so ids
/// cannot be probed.
pub fn require_owned_chatbot(
    store: &dyn Store,
    identity_id: &str,
    chatbot_id: &str,
) -> Result<Chatbot, ApiError> {
    let chatbot = store
        .get_chatbot(chatbot_id)
        .api_err("Failed to get chatbot")?
        .or_not_found("Chatbot not found")?;

    if chatbot.identity_id != identity_id {
        return Err(ApiError::not_found("Chatbot not found"));
    }

    Ok(chatbot)
}
