use crate::server::response::ApiError;

const MAX_NAME_LEN: usize = 100;
const MAX_QUESTION_LEN: usize = 500;

fn validate_non_empty(value: &str, entity: &str, max_len: usize) -> Result<(), ApiError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(ApiError::bad_request(format!("{entity} cannot be empty")));
    }
    if trimmed.len() > max_len {
        return Err(ApiError::bad_request(format!(
            "{entity} cannot exceed {max_len} characters"
        )));
    }
    Ok(())
}

pub fn validate_template_name(name: &str) -> Result<(), ApiError> {
    validate_non_empty(name, "Template name", MAX_NAME_LEN)
}

pub fn validate_chatbot_name(name: &str) -> Result<(), ApiError> {
    validate_non_empty(name, "Chatbot name", MAX_NAME_LEN)
}

pub fn validate_repo_url(url: &str) -> Result<(), ApiError> {
    if !url.starts_with("https://") && !url.starts_with("http://") {
        return Err(ApiError::bad_request(
            "Repository URL must start with http:// or https://",
        ));
    }
    Ok(())
}

pub fn validate_news_title(title: &str) -> Result<(), ApiError> {
    validate_non_empty(title, "News title", MAX_NAME_LEN)
}

pub fn validate_question(question: &str) -> Result<(), ApiError> {
    validate_non_empty(question, "Question", MAX_QUESTION_LEN)
}
