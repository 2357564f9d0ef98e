//! [`Messaging`] — the facade a transport layer mounts.
//!
//! Wires a [`MessageStore`] to an [`InboxCache`] and exposes the messaging
//! operations. The facade owns the invalidate-on-write contract: every write
//! that could change a user's inbox drops that user's cached view before the
//! write is reported back to the caller.

use uuid::Uuid;

use crate::{
  derived::{CascadeReport, MessageHistory, Notification},
  inbox::{InboxCache, MessageSummary},
  message::{Message, NewMessage},
  store::MessageStore,
  thread::{self, ThreadNode},
  user::User,
};

pub struct Messaging<S> {
  store: S,
  cache: InboxCache,
}

impl<S: MessageStore> Messaging<S> {
  pub fn new(store: S) -> Self {
    Self { store, cache: InboxCache::new() }
  }

  /// The underlying store, for callers that need backend-specific access.
  pub fn store(&self) -> &S { &self.store }

  // ── Users ─────────────────────────────────────────────────────────────

  pub async fn add_user(&self, username: String) -> Result<User, S::Error> {
    self.store.add_user(username).await
  }

  pub async fn get_user(&self, id: Uuid) -> Result<Option<User>, S::Error> {
    self.store.get_user(id).await
  }

  /// Delete a user and everything they touched, transactionally. The whole
  /// cache is dropped: counterparty inboxes may have referenced the deleted
  /// messages.
  pub async fn delete_user(
    &self,
    id: Uuid,
  ) -> Result<CascadeReport, S::Error> {
    let report = self.store.delete_user(id).await?;
    self.cache.clear();
    tracing::info!(
      user = %id,
      messages = report.messages,
      notifications = report.notifications,
      history = report.history_entries,
      "user deleted, cascade complete"
    );
    Ok(report)
  }

  // ── Messages ──────────────────────────────────────────────────────────

  pub async fn send_message(
    &self,
    input: NewMessage,
  ) -> Result<Message, S::Error> {
    let message = self.store.send_message(input).await?;
    self.cache.invalidate(message.receiver_id);
    Ok(message)
  }

  pub async fn edit_message(
    &self,
    id: Uuid,
    new_content: String,
    editor: Uuid,
  ) -> Result<Message, S::Error> {
    let message = self.store.edit_message(id, new_content, editor).await?;
    self.cache.invalidate(message.receiver_id);
    Ok(message)
  }

  pub async fn mark_read(&self, id: Uuid) -> Result<Message, S::Error> {
    let message = self.store.mark_read(id).await?;
    self.cache.invalidate(message.receiver_id);
    Ok(message)
  }

  pub async fn get_message(
    &self,
    id: Uuid,
  ) -> Result<Option<Message>, S::Error> {
    self.store.get_message(id).await
  }

  // ── Read models ───────────────────────────────────────────────────────

  /// The reply tree rooted at `id`; `None` if the root does not exist.
  pub async fn get_thread(
    &self,
    id: Uuid,
  ) -> Result<Option<ThreadNode>, S::Error> {
    thread::resolve_thread(&self.store, id).await
  }

  /// The live unread list, always one storage round trip. Use
  /// [`Self::inbox_view`] for the cached variant.
  pub async fn unread_for(
    &self,
    user_id: Uuid,
  ) -> Result<Vec<MessageSummary>, S::Error> {
    self.store.unread_for(user_id).await
  }

  /// The cached inbox view. The first read per user populates the cache;
  /// later reads are served from memory until a write invalidates the entry.
  pub async fn inbox_view(
    &self,
    user_id: Uuid,
  ) -> Result<Vec<MessageSummary>, S::Error> {
    if let Some(inbox) = self.cache.get(user_id) {
      tracing::debug!(user = %user_id, "inbox cache hit");
      return Ok(inbox);
    }

    tracing::debug!(user = %user_id, "inbox cache miss, materialising");
    let inbox = self.store.unread_for(user_id).await?;
    self.cache.put(user_id, inbox.clone());
    Ok(inbox)
  }

  pub async fn notifications_for(
    &self,
    user_id: Uuid,
  ) -> Result<Vec<Notification>, S::Error> {
    self.store.notifications_for(user_id).await
  }

  pub async fn history_for(
    &self,
    message_id: Uuid,
  ) -> Result<Vec<MessageHistory>, S::Error> {
    self.store.history_for(message_id).await
  }
}
