//! Request and response bodies for the backend REST API.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Account role as reported by the backend
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SystemRole {
    Admin,
    User,
    /// Not logged in
    Anonym,
}

impl fmt::Display for SystemRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Admin => "admin",
            Self::User => "user",
            Self::Anonym => "anonym",
        };
        f.write_str(s)
    }
}

/// Account returned by the auth and user endpoints
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserProfile {
    /// Backend user id
    pub id: u64,
    /// Login email, absent for anonymous accounts
    #[serde(default)]
    pub email: Option<String>,
    /// Display name
    #[serde(default)]
    pub username: Option<String>,
    /// Account role
    pub role: SystemRole,
    /// Whether the email address has been confirmed
    #[serde(default, alias = "isActivated")]
    pub is_activated: bool,
}

/// Result of a successful login
#[derive(Debug, Clone)]
pub struct LoginSession {
    /// Logged-in account
    pub user: UserProfile,
    /// Value of the session cookie, when the backend set one
    pub session_token: Option<String>,
}

#[derive(Debug, Serialize)]
pub(crate) struct RegisterRequest<'a> {
    pub email: &'a str,
    pub username: &'a str,
    pub password: &'a str,
}

#[derive(Debug, Serialize)]
pub(crate) struct LoginRequest<'a> {
    pub email: &'a str,
    pub password: &'a str,
}

#[derive(Debug, Serialize)]
pub(crate) struct SendMessageRequest<'a> {
    pub content: &'a str,
    pub role: crate::chat::MessageRole,
}

#[derive(Debug, Serialize)]
pub(crate) struct ConfirmEmailRequest {
    pub key: u32,
}
