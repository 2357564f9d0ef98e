//! Encoding and decoding helpers between Rust domain types and the plain-text
//! representations stored in SQLite columns.
//!
//! All timestamps are stored as RFC 3339 strings. UUIDs are stored as
//! hyphenated lowercase strings. Flags are stored as 0/1 integers.

use chrono::{DateTime, Utc};
use missive_core::{
  derived::{MessageHistory, Notification},
  inbox::MessageSummary,
  message::Message,
  user::User,
};
use uuid::Uuid;

use crate::{Error, Result};

// ─── Uuid ─────────────────────────────────────────────────────────────────────

pub fn encode_uuid(id: Uuid) -> String { id.hyphenated().to_string() }

pub fn decode_uuid(s: &str) -> Result<Uuid> { Ok(Uuid::parse_str(s)?) }

// ─── DateTime<Utc> ───────────────────────────────────────────────────────────

pub fn encode_dt(dt: DateTime<Utc>) -> String { dt.to_rfc3339() }

pub fn decode_dt(s: &str) -> Result<DateTime<Utc>> {
  DateTime::parse_from_rfc3339(s)
    .map(|dt| dt.with_timezone(&Utc))
    .map_err(|e| Error::DateParse(e.to_string()))
}

// ─── Row types ───────────────────────────────────────────────────────────────

/// Raw strings read directly from a `users` row.
pub struct RawUser {
  pub user_id:    String,
  pub username:   String,
  pub created_at: String,
}

impl RawUser {
  pub fn into_user(self) -> Result<User> {
    Ok(User {
      user_id:    decode_uuid(&self.user_id)?,
      username:   self.username,
      created_at: decode_dt(&self.created_at)?,
    })
  }
}

/// Raw strings read directly from a `messages` row.
pub struct RawMessage {
  pub message_id:  String,
  pub sender_id:   String,
  pub receiver_id: String,
  pub content:     String,
  pub created_at:  String,
  pub is_read:     bool,
  pub edited:      bool,
  pub parent_id:   Option<String>,
}

impl RawMessage {
  pub fn into_message(self) -> Result<Message> {
    Ok(Message {
      message_id:  decode_uuid(&self.message_id)?,
      sender_id:   decode_uuid(&self.sender_id)?,
      receiver_id: decode_uuid(&self.receiver_id)?,
      content:     self.content,
      created_at:  decode_dt(&self.created_at)?,
      is_read:     self.is_read,
      edited:      self.edited,
      parent_id:   self
        .parent_id
        .as_deref()
        .map(decode_uuid)
        .transpose()?,
    })
  }
}

/// Raw strings read directly from a `notifications` row.
pub struct RawNotification {
  pub notification_id: String,
  pub user_id:         String,
  pub message_id:      String,
  pub created_at:      String,
  pub is_read:         bool,
}

impl RawNotification {
  pub fn into_notification(self) -> Result<Notification> {
    Ok(Notification {
      notification_id: decode_uuid(&self.notification_id)?,
      user_id:         decode_uuid(&self.user_id)?,
      message_id:      decode_uuid(&self.message_id)?,
      created_at:      decode_dt(&self.created_at)?,
      is_read:         self.is_read,
    })
  }
}

/// Raw strings read directly from a `message_history` row.
pub struct RawHistory {
  pub history_id:  String,
  pub message_id:  String,
  pub old_content: String,
  pub edited_at:   String,
  pub editor_id:   String,
}

impl RawHistory {
  pub fn into_history(self) -> Result<MessageHistory> {
    Ok(MessageHistory {
      history_id:  decode_uuid(&self.history_id)?,
      message_id:  decode_uuid(&self.message_id)?,
      old_content: self.old_content,
      edited_at:   decode_dt(&self.edited_at)?,
      editor_id:   decode_uuid(&self.editor_id)?,
    })
  }
}

/// Raw strings read from the unread-inbox projection (messages joined with
/// the sender's username).
pub struct RawSummary {
  pub message_id:      String,
  pub sender_id:       String,
  pub sender_username: String,
  pub content:         String,
  pub created_at:      String,
  pub parent_id:       Option<String>,
}

impl RawSummary {
  pub fn into_summary(self) -> Result<MessageSummary> {
    Ok(MessageSummary {
      message_id:      decode_uuid(&self.message_id)?,
      sender_id:       decode_uuid(&self.sender_id)?,
      sender_username: self.sender_username,
      content:         self.content,
      created_at:      decode_dt(&self.created_at)?,
      parent_id:       self
        .parent_id
        .as_deref()
        .map(decode_uuid)
        .transpose()?,
    })
  }
}
