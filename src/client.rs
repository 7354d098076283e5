use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};

/// Fixed user-facing explanations, rendered into the transcript as bot
/// messages. Failures never surface as raw statuses or panics.
pub const MSG_UNAUTHORIZED: &str =
    "Sorry, authentication failed. Please check the widget configuration.";
pub const MSG_NOT_FOUND: &str = "Sorry, this bot could not be found.";
pub const MSG_INVALID_REQUEST: &str = "Sorry, the request format was invalid.";
pub const MSG_NETWORK: &str =
    "Sorry, a network error occurred. Please check your connection and try again.";
pub const MSG_GENERIC: &str = "Sorry, I encountered an error. Please try again.";

/// Failure classes for a single chat exchange.
#[derive(Debug, thiserror::Error)]
pub enum ChatError {
    /// The backend rejected the API key (HTTP 401).
    #[error("authentication failed: {detail}")]
    Unauthorized { detail: String },

    /// The bot id does not exist on the backend (HTTP 404).
    #[error("bot not found: {detail}")]
    NotFound { detail: String },

    /// The backend could not parse the request (HTTP 422).
    #[error("invalid request: {detail}")]
    InvalidRequest { detail: String },

    /// The request never reached the server.
    #[error("network error: {0}")]
    Network(String),

    /// A success response whose body was not the expected shape.
    #[error("malformed response: {0}")]
    Malformed(String),

    /// Any other non-success status.
    #[error("request failed with status {status}: {detail}")]
    Api { status: u16, detail: String },

    /// The in-flight send task died before settling.
    #[error("internal error: {0}")]
    Internal(String),
}

impl ChatError {
    /// The fixed transcript message for this failure class.
    pub fn user_message(&self) -> &'static str {
        match self {
            Self::Unauthorized { .. } => MSG_UNAUTHORIZED,
            Self::NotFound { .. } => MSG_NOT_FOUND,
            Self::InvalidRequest { .. } => MSG_INVALID_REQUEST,
            Self::Network(_) => MSG_NETWORK,
            Self::Malformed(_) | Self::Api { .. } | Self::Internal(_) => MSG_GENERIC,
        }
    }

    fn from_status(status: StatusCode, detail: String) -> Self {
        match status {
            StatusCode::UNAUTHORIZED => Self::Unauthorized { detail },
            StatusCode::NOT_FOUND => Self::NotFound { detail },
            StatusCode::UNPROCESSABLE_ENTITY => Self::InvalidRequest { detail },
            _ => Self::Api { status: status.as_u16(), detail },
        }
    }
}

#[derive(Serialize)]
struct ChatRequest<'a> {
    message: &'a str,
}

#[derive(Deserialize)]
struct BotReply {
    bot_response: String,
}

/// HTTP client for one website bot. Cheap to clone; a clone is moved into the
/// spawned task for each in-flight send.
#[derive(Clone)]
pub struct BotClient {
    client: Client,
    base_url: String,
    bot_id: String,
    api_key: String,
}

impl BotClient {
    pub fn new(base_url: &str, bot_id: &str, api_key: &str) -> Self {
        Self {
            client: Client::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
            bot_id: bot_id.to_string(),
            api_key: api_key.to_string(),
        }
    }

    /// Perform the single POST for one user message. One best-effort attempt,
    /// no retries.
    pub async fn send_message(&self, message: &str) -> Result<String, ChatError> {
        let url = format!("{}/bots/website/{}/chat", self.base_url, self.bot_id);

        let response = self
            .client
            .post(&url)
            .header("X-API-Key", &self.api_key)
            .json(&ChatRequest { message })
            .send()
            .await
            .map_err(|e| ChatError::Network(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(ChatError::from_status(status, error_detail(&body)));
        }

        let reply: BotReply = response
            .json()
            .await
            .map_err(|e| ChatError::Malformed(e.to_string()))?;
        Ok(reply.bot_response)
    }
}

/// Extract the `detail` field from an error body, falling back to the raw
/// response text when the body is not JSON or has no such field.
fn error_detail(body: &str) -> String {
    match serde_json::from_str::<serde_json::Value>(body) {
        Ok(value) => match value.get("detail") {
            Some(serde_json::Value::String(s)) => s.clone(),
            Some(other) => other.to_string(),
            None => body.to_string(),
        },
        Err(_) => body.to_string(),
    }
}
