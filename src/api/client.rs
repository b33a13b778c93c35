//! HTTP client for the chat backend.
//!
//! The backend authenticates with a session cookie set by `/auth/login`,
//! so the underlying `reqwest::Client` keeps a cookie store for the
//! lifetime of the [`ApiClient`].
//!
//! # Example
//!
//! ```rust,no_run
//! use queuechat::api::ApiClient;
//! use queuechat::chat::ChatId;
//! use queuechat::config::ApiConfig;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let client = ApiClient::new(&ApiConfig::default())?;
//!     client.login("ann@example.com", "secret").await?;
//!
//!     let chat = client.fetch_chat(ChatId(1)).await?;
//!     println!("{} is at queue position {}", chat.title, chat.queue_position);
//!     Ok(())
//! }
//! ```

use crate::api::types::{
    ConfirmEmailRequest, LoginRequest, LoginSession, RegisterRequest, SendMessageRequest,
    UserProfile,
};
use crate::chat::{ChatId, ChatSession, ChatSummary, CreateChatRequest, MessageRole};
use crate::config::ApiConfig;
use reqwest::header::{HeaderMap, HeaderValue, COOKIE};
use reqwest::{Client, Method, RequestBuilder, Response, StatusCode};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, info, warn};

/// Errors that can occur during client operations.
#[derive(Error, Debug)]
pub enum ClientError {
    /// Transport failure (connection refused, timeout, TLS, ...).
    #[error("Network error: {0}")]
    Network(String),

    /// Backend answered with a non-success status.
    #[error("Server error ({status}): {message}")]
    Server {
        /// HTTP status code.
        status: u16,
        /// Response body.
        message: String,
    },

    /// Session missing or expired (HTTP 401).
    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    /// Resource not found (HTTP 404).
    #[error("Not found: {0}")]
    NotFound(String),

    /// Response body did not match the expected shape.
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Client could not be built from the given settings.
    #[error("Invalid client configuration: {0}")]
    Config(String),
}

impl From<reqwest::Error> for ClientError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_timeout() {
            Self::Network(format!("request timed out: {}", e))
        } else {
            Self::Network(e.to_string())
        }
    }
}

/// Name of the cookie carrying the backend session.
pub const SESSION_COOKIE: &str = "token";

impl ClientError {
    /// Returns true for failures a later retry may not hit again.
    pub fn is_transient(&self) -> bool {
        match self {
            Self::Network(_) => true,
            Self::Server { status, .. } => *status >= 500,
            _ => false,
        }
    }

    /// Returns true when the caller has to log in again.
    pub fn is_unauthorized(&self) -> bool {
        matches!(self, Self::Unauthorized(_))
    }
}

/// HTTP client for the chat backend.
#[derive(Debug, Clone)]
pub struct ApiClient {
    client: Client,
    base_url: String,
}

impl ApiClient {
    /// Creates a new client.
    ///
    /// # Errors
    ///
    /// Returns `ClientError::Network` if the HTTP client cannot be created
    /// and `ClientError::Config` if the configured session token is not a
    /// valid header value.
    pub fn new(config: &ApiConfig) -> Result<Self, ClientError> {
        let mut headers = HeaderMap::new();
        if let Some(token) = &config.session_token {
            let value = HeaderValue::from_str(&format!("{}={}", SESSION_COOKIE, token))
                .map_err(|e| ClientError::Config(format!("invalid session token: {}", e)))?;
            headers.insert(COOKIE, value);
        }

        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .user_agent(config.user_agent.clone())
            .default_headers(headers)
            .cookie_store(true)
            .build()?;

        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
        })
    }

    /// Base URL requests are resolved against.
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn build_request(&self, method: Method, path: &str) -> RequestBuilder {
        let url = format!("{}{}", self.base_url, path);
        self.client
            .request(method, &url)
            .header("Accept", "application/json")
    }

    async fn send_json<T, B>(
        &self,
        method: Method,
        path: &str,
        body: Option<&B>,
    ) -> Result<T, ClientError>
    where
        T: DeserializeOwned,
        B: Serialize + ?Sized,
    {
        let mut request = self.build_request(method.clone(), path);
        if let Some(body) = body {
            request = request.json(body);
        }

        debug!(method = %method, path = %path, "Sending request");
        let response = check_status(request.send().await?, path).await?;
        let text = response.text().await?;
        Ok(serde_json::from_str(&text)?)
    }

    async fn send_empty<B>(
        &self,
        method: Method,
        path: &str,
        body: Option<&B>,
    ) -> Result<(), ClientError>
    where
        B: Serialize + ?Sized,
    {
        let mut request = self.build_request(method.clone(), path);
        if let Some(body) = body {
            request = request.json(body);
        }

        debug!(method = %method, path = %path, "Sending request");
        check_status(request.send().await?, path).await?;
        Ok(())
    }

    /// Lists the current user's chats.
    pub async fn list_chats(&self) -> Result<Vec<ChatSummary>, ClientError> {
        self.send_json(Method::GET, "/chats/", None::<&()>).await
    }

    /// Creates a chat and returns its first snapshot.
    pub async fn create_chat(
        &self,
        request: &CreateChatRequest,
    ) -> Result<ChatSession, ClientError> {
        let chat: ChatSession = self
            .send_json(Method::POST, "/chats/", Some(request))
            .await?;
        info!(chat_id = %chat.id, title = %chat.title, "Created chat");
        Ok(chat)
    }

    /// Fetches the full snapshot of a chat.
    ///
    /// # Errors
    ///
    /// Returns `ClientError::NotFound` if the chat does not exist or is archived.
    pub async fn fetch_chat(&self, chat_id: ChatId) -> Result<ChatSession, ClientError> {
        self.send_json(Method::GET, &format!("/chats/{}", chat_id), None::<&()>)
            .await
    }

    /// Appends a user message and returns the updated snapshot, including
    /// the chat's new queue position.
    pub async fn send_message(
        &self,
        chat_id: ChatId,
        content: &str,
    ) -> Result<ChatSession, ClientError> {
        let body = SendMessageRequest {
            content,
            role: MessageRole::User,
        };
        self.send_json(
            Method::POST,
            &format!("/chats/{}/messages", chat_id),
            Some(&body),
        )
        .await
    }

    /// Registers a new account.
    pub async fn register(
        &self,
        email: &str,
        username: &str,
        password: &str,
    ) -> Result<UserProfile, ClientError> {
        let body = RegisterRequest {
            email,
            username,
            password,
        };
        let user: UserProfile = self
            .send_json(Method::POST, "/auth/register", Some(&body))
            .await?;
        info!(user_id = user.id, "Registered account");
        Ok(user)
    }

    /// Logs in.
    ///
    /// The session cookie is retained by this client and also returned so
    /// that it can be reused by later processes.
    pub async fn login(&self, email: &str, password: &str) -> Result<LoginSession, ClientError> {
        let path = "/auth/login";
        let body = LoginRequest { email, password };
        let response = self
            .build_request(Method::POST, path)
            .json(&body)
            .send()
            .await?;
        let response = check_status(response, path).await?;

        let session_token = response
            .cookies()
            .find(|c| c.name() == SESSION_COOKIE)
            .map(|c| c.value().to_string());
        let user: UserProfile = serde_json::from_str(&response.text().await?)?;

        info!(user_id = user.id, "Logged in");
        Ok(LoginSession {
            user,
            session_token,
        })
    }

    /// Ends the current session.
    pub async fn logout(&self) -> Result<(), ClientError> {
        self.send_empty(Method::POST, "/auth/logout/", None::<&()>)
            .await
    }

    /// Returns the logged-in account.
    pub async fn me(&self) -> Result<UserProfile, ClientError> {
        self.send_json(Method::GET, "/users/me", None::<&()>).await
    }

    /// Confirms the account email with the emailed PIN code.
    pub async fn confirm_email(&self, pin: u32) -> Result<UserProfile, ClientError> {
        let body = ConfirmEmailRequest { key: pin };
        self.send_json(Method::PATCH, "/users/confirm-email", Some(&body))
            .await
    }

    /// Asks the backend to email a fresh confirmation PIN.
    pub async fn request_new_key(&self) -> Result<(), ClientError> {
        self.send_empty(Method::POST, "/users/key", None::<&()>)
            .await
    }
}

async fn check_status(response: Response, path: &str) -> Result<Response, ClientError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let body = response.text().await.unwrap_or_default();
    warn!(status = status.as_u16(), path = %path, "Request failed");
    match status {
        StatusCode::UNAUTHORIZED => Err(ClientError::Unauthorized(body)),
        StatusCode::NOT_FOUND => Err(ClientError::NotFound(path.to_string())),
        _ => Err(ClientError::Server {
            status: status.as_u16(),
            message: body,
        }),
    }
}
