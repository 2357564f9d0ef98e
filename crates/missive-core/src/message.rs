//! Message types — the fundamental unit of the Missive store.
//!
//! A message's sender, receiver, and parent link are fixed at creation time.
//! Only `content` (via an edit, which snapshots the old content into history)
//! and `is_read` (a read receipt) ever change afterwards.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

// ─── Message ─────────────────────────────────────────────────────────────────

/// A persisted direct message. The default listing order everywhere in the
/// store is reverse-chronological by `created_at`; reply trees are the one
/// deliberate exception (see [`crate::thread`]).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Message {
  pub message_id:  Uuid,
  pub sender_id:   Uuid,
  pub receiver_id: Uuid,
  pub content:     String,
  /// Server-assigned timestamp; never changes after creation.
  pub created_at:  DateTime<Utc>,
  pub is_read:     bool,
  /// Set to `true` by the first content-changing edit and never reset.
  pub edited:      bool,
  /// Reply link. Always references a message that existed before this one,
  /// so parent chains can never form a cycle.
  pub parent_id:   Option<Uuid>,
}

// ─── NewMessage ──────────────────────────────────────────────────────────────

/// Input to [`crate::store::MessageStore::send_message`].
/// The id and `created_at` are always assigned by the store.
#[derive(Debug, Clone)]
pub struct NewMessage {
  pub sender_id:   Uuid,
  pub receiver_id: Uuid,
  pub content:     String,
  pub parent_id:   Option<Uuid>,
}

impl NewMessage {
  /// A top-level message (not a reply).
  pub fn new(
    sender_id: Uuid,
    receiver_id: Uuid,
    content: impl Into<String>,
  ) -> Self {
    Self {
      sender_id,
      receiver_id,
      content: content.into(),
      parent_id: None,
    }
  }

  /// A reply to an existing message.
  pub fn reply_to(
    parent_id: Uuid,
    sender_id: Uuid,
    receiver_id: Uuid,
    content: impl Into<String>,
  ) -> Self {
    Self {
      sender_id,
      receiver_id,
      content: content.into(),
      parent_id: Some(parent_id),
    }
  }
}
