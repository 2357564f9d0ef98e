//! Records derived from message lifecycle transitions.
//!
//! Neither type is ever written directly by callers: notifications and
//! history snapshots are produced by the propagation hooks in
//! [`crate::propagation`] and committed in the same transaction as the write
//! that triggered them.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// An unread-message notice, created exactly once per message at creation
/// time and targeted at the receiver.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Notification {
  pub notification_id: Uuid,
  /// The user being notified — always the message's receiver.
  pub user_id:         Uuid,
  pub message_id:      Uuid,
  pub created_at:      DateTime<Utc>,
  pub is_read:         bool,
}

/// A snapshot of a message's content as it was immediately before a
/// content-changing edit. Appended once per such edit, never updated.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MessageHistory {
  pub history_id:  Uuid,
  pub message_id:  Uuid,
  pub old_content: String,
  pub edited_at:   DateTime<Utc>,
  pub editor_id:   Uuid,
}

/// Counts of rows directly deleted by a user cascade. Rows removed by the
/// store's own foreign-key cascades (replies, a deleted message's
/// notifications and history) are not included.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct CascadeReport {
  pub messages:        u64,
  pub notifications:   u64,
  pub history_entries: u64,
}
