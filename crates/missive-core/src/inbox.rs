//! The unread/inbox read model: the projection rows and the explicit cache
//! in front of them.
//!
//! The cache is a capability handed to [`crate::service::Messaging`], not an
//! ambient global. It has no expiry: an entry stays valid until something
//! explicitly invalidates it, which the facade does on every write that could
//! change a user's inbox.

use std::{collections::HashMap, sync::Mutex};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

// ─── Projection ──────────────────────────────────────────────────────────────

/// One unread message as the inbox shows it: just the fields callers render,
/// with the sender's username joined in by the same query that fetched the
/// row. No per-row follow-up fetches.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MessageSummary {
  pub message_id:      Uuid,
  pub sender_id:       Uuid,
  pub sender_username: String,
  pub content:         String,
  pub created_at:      DateTime<Utc>,
  pub parent_id:       Option<Uuid>,
}

// ─── Cache ───────────────────────────────────────────────────────────────────

/// A per-user materialisation of the unread list.
///
/// `get` misses until `put` fills the entry; `invalidate` drops a single
/// user's entry and `clear` drops them all.
#[derive(Default)]
pub struct InboxCache {
  entries: Mutex<HashMap<Uuid, Vec<MessageSummary>>>,
}

impl InboxCache {
  pub fn new() -> Self { Self::default() }

  pub fn get(&self, user_id: Uuid) -> Option<Vec<MessageSummary>> {
    self.entries.lock().expect("inbox cache poisoned").get(&user_id).cloned()
  }

  pub fn put(&self, user_id: Uuid, inbox: Vec<MessageSummary>) {
    self
      .entries
      .lock()
      .expect("inbox cache poisoned")
      .insert(user_id, inbox);
  }

  pub fn invalidate(&self, user_id: Uuid) {
    self.entries.lock().expect("inbox cache poisoned").remove(&user_id);
  }

  pub fn clear(&self) {
    self.entries.lock().expect("inbox cache poisoned").clear();
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  fn summary(content: &str) -> MessageSummary {
    MessageSummary {
      message_id:      Uuid::new_v4(),
      sender_id:       Uuid::new_v4(),
      sender_username: "sender".into(),
      content:         content.into(),
      created_at:      Utc::now(),
      parent_id:       None,
    }
  }

  #[test]
  fn miss_then_put_then_hit() {
    let cache = InboxCache::new();
    let user = Uuid::new_v4();

    assert!(cache.get(user).is_none());

    let inbox = vec![summary("hi")];
    cache.put(user, inbox.clone());
    assert_eq!(cache.get(user), Some(inbox));
  }

  #[test]
  fn invalidate_is_scoped_per_user() {
    let cache = InboxCache::new();
    let alice = Uuid::new_v4();
    let bob = Uuid::new_v4();

    cache.put(alice, vec![summary("for alice")]);
    cache.put(bob, vec![summary("for bob")]);

    cache.invalidate(alice);
    assert!(cache.get(alice).is_none());
    assert!(cache.get(bob).is_some());
  }

  #[test]
  fn clear_drops_everything() {
    let cache = InboxCache::new();
    let alice = Uuid::new_v4();
    let bob = Uuid::new_v4();

    cache.put(alice, vec![summary("a")]);
    cache.put(bob, vec![summary("b")]);

    cache.clear();
    assert!(cache.get(alice).is_none());
    assert!(cache.get(bob).is_none());
  }
}
