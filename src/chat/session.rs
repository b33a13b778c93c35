//! Chat data model
//!
//! A [`ChatSession`] is the client's snapshot of one chat as last reported
//! by the backend. Snapshots are replaced wholesale on every accepted
//! fetch; individual messages are never edited in place.

use crate::error::QueuechatError;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Stable identifier of a chat on the backend
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ChatId(pub u64);

impl fmt::Display for ChatId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<u64> for ChatId {
    fn from(value: u64) -> Self {
        Self(value)
    }
}

impl FromStr for ChatId {
    type Err = std::num::ParseIntError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.trim().parse::<u64>().map(ChatId)
    }
}

/// Author of a message
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MessageRole {
    /// Written by the user
    User,
    /// Reply produced by the backend model
    Assistant,
    /// Context injected by the backend
    System,
}

impl fmt::Display for MessageRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::User => "user",
            Self::Assistant => "assistant",
            Self::System => "system",
        };
        f.write_str(s)
    }
}

/// One entry of a chat's message log
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Message {
    /// Backend message id, absent for messages the backend has not persisted
    #[serde(default)]
    pub id: Option<u64>,
    /// Message text
    pub content: String,
    /// Author role
    pub role: MessageRole,
    /// Creation time
    #[serde(alias = "createdAt", with = "timestamp")]
    pub created_at: DateTime<Utc>,
}

/// Notable event the backend attached to a chat
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatEvent {
    /// Event id
    pub id: u64,
    /// Event text
    pub content: String,
}

/// Full snapshot of a single chat
///
/// `queue_position == 0` means every user message has been answered.
/// Any positive value is the server's estimate of the chat's rank in the
/// processing queue; it is not guaranteed to decrease between polls.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatSession {
    /// Chat identifier
    pub id: ChatId,
    /// Display title
    pub title: String,
    /// Ordered message log
    #[serde(default)]
    pub messages: Vec<Message>,
    /// Events attached to the chat
    #[serde(default)]
    pub events: Vec<ChatEvent>,
    /// Rank in the reply queue, 0 when answered
    #[serde(default)]
    pub queue_position: u32,
    /// Creation time
    #[serde(with = "timestamp")]
    pub created_at: DateTime<Utc>,
    /// Last modification time
    #[serde(with = "timestamp")]
    pub updated_at: DateTime<Utc>,
}

impl ChatSession {
    /// Returns true while a reply is still being computed.
    pub fn in_queue(&self) -> bool {
        self.queue_position > 0
    }

    /// Returns true once every user message has a reply.
    pub fn is_answered(&self) -> bool {
        self.queue_position == 0
    }

    /// Last message in the log, if any.
    pub fn last_message(&self) -> Option<&Message> {
        self.messages.last()
    }

    /// Last assistant reply in the log, if any.
    pub fn last_reply(&self) -> Option<&Message> {
        self.messages
            .iter()
            .rev()
            .find(|m| m.role == MessageRole::Assistant)
    }

    /// Checks that a queued chat ends with an unanswered user message.
    ///
    /// A chat that is not in queue is always consistent.
    pub fn has_consistent_queue_state(&self) -> bool {
        if !self.in_queue() {
            return true;
        }
        matches!(self.last_message(), Some(m) if m.role == MessageRole::User)
    }
}

/// Chat entry as returned by the list endpoint
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatSummary {
    /// Chat identifier
    pub id: ChatId,
    /// Display title
    pub title: String,
    /// Last modification time
    #[serde(with = "timestamp")]
    pub updated_at: DateTime<Utc>,
}

/// Parameters for creating a new chat
///
/// Rating fields use a 0..=4 scale, `progression_type` is 0 (arithmetic)
/// or 1 (geometric), and `language` is a 0..=9 identifier.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreateChatRequest {
    /// Chat title
    pub title: String,
    /// Optional opening context for the assistant
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub initial_context: Option<String>,
    /// How difficulty grows over the chat (0 arithmetic, 1 geometric)
    pub progression_type: u8,
    /// Starting difficulty rating
    pub difficulty: u8,
    /// Politeness rating of the assistant
    pub politeness: u8,
    /// Friendliness rating of the assistant
    pub friendliness: u8,
    /// How strictly the assistant sticks to the topic
    pub rigidity: u8,
    /// How much detail answers carry
    pub detail_orientation: u8,
    /// How quickly the conversation moves on
    pub pacing: u8,
    /// Conversation language identifier
    pub language: u8,
}

const MAX_RATING: u8 = 4;
const MAX_PROGRESSION: u8 = 1;
const MAX_LANGUAGE: u8 = 9;

impl CreateChatRequest {
    /// Creates a request with the given title and mid-scale ratings.
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            initial_context: None,
            progression_type: 0,
            difficulty: 2,
            politeness: 2,
            friendliness: 2,
            rigidity: 2,
            detail_orientation: 2,
            pacing: 2,
            language: 0,
        }
    }

    /// Validates field ranges before the request is sent.
    ///
    /// # Errors
    ///
    /// Returns `QueuechatError::InvalidRequest` naming the first offending field.
    pub fn validate(&self) -> Result<(), QueuechatError> {
        if self.title.trim().is_empty() {
            return Err(QueuechatError::InvalidRequest(
                "title cannot be empty".to_string(),
            ));
        }

        if self.progression_type > MAX_PROGRESSION {
            return Err(QueuechatError::InvalidRequest(format!(
                "progression_type must be 0..={}",
                MAX_PROGRESSION
            )));
        }

        let ratings = [
            ("difficulty", self.difficulty),
            ("politeness", self.politeness),
            ("friendliness", self.friendliness),
            ("rigidity", self.rigidity),
            ("detail_orientation", self.detail_orientation),
            ("pacing", self.pacing),
        ];
        for (name, value) in ratings {
            if value > MAX_RATING {
                return Err(QueuechatError::InvalidRequest(format!(
                    "{} must be 0..={}",
                    name, MAX_RATING
                )));
            }
        }

        if self.language > MAX_LANGUAGE {
            return Err(QueuechatError::InvalidRequest(format!(
                "language must be 0..={}",
                MAX_LANGUAGE
            )));
        }

        Ok(())
    }
}

/// Serde adapter for backend timestamps.
///
/// Accepts RFC 3339 and naive ISO-8601 values (interpreted as UTC);
/// always writes RFC 3339.
pub(crate) mod timestamp {
    use chrono::{DateTime, NaiveDateTime, Utc};
    use serde::{Deserialize, Deserializer, Serializer};

    const NAIVE_FORMAT: &str = "%Y-%m-%dT%H:%M:%S%.f";

    pub fn serialize<S>(value: &DateTime<Utc>, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&value.to_rfc3339())
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<DateTime<Utc>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw = String::deserialize(deserializer)?;
        parse(&raw).map_err(serde::de::Error::custom)
    }

    pub fn parse(raw: &str) -> Result<DateTime<Utc>, String> {
        if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
            return Ok(dt.with_timezone(&Utc));
        }
        NaiveDateTime::parse_from_str(raw, NAIVE_FORMAT)
            .map(|naive| naive.and_utc())
            .map_err(|e| format!("invalid timestamp '{}': {}", raw, e))
    }
}
