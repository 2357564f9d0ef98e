//! The `MessageStore` trait.
//!
//! The trait is implemented by storage backends (e.g. `missive-store-sqlite`).
//! Higher layers ([`crate::service::Messaging`], [`crate::thread`]) depend on
//! this abstraction, not on any concrete backend.
//!
//! Every mutation is one atomic unit of work: the primary write and the
//! effects emitted by the backend's registered [`crate::propagation::HookSet`]
//! commit or roll back together.

use std::future::Future;

use uuid::Uuid;

use crate::{
  derived::{CascadeReport, MessageHistory, Notification},
  inbox::MessageSummary,
  message::{Message, NewMessage},
  user::User,
};

/// Abstraction over a Missive storage backend.
///
/// All methods return `Send` futures so the trait can be used in
/// multi-threaded async runtimes.
pub trait MessageStore: Send + Sync {
  type Error: std::error::Error + Send + Sync + 'static;

  // ── Users ─────────────────────────────────────────────────────────────

  /// Create and persist a new user.
  fn add_user(
    &self,
    username: String,
  ) -> impl Future<Output = Result<User, Self::Error>> + Send + '_;

  /// Retrieve a user by id. Returns `None` if not found.
  fn get_user(
    &self,
    id: Uuid,
  ) -> impl Future<Output = Result<Option<User>, Self::Error>> + Send + '_;

  /// Delete a user and cascade: history they recorded, notifications
  /// targeting them, and every message they sent or received, all in one
  /// transaction. Fails without partial effect if any step fails.
  fn delete_user(
    &self,
    id: Uuid,
  ) -> impl Future<Output = Result<CascadeReport, Self::Error>> + Send + '_;

  // ── Messages ──────────────────────────────────────────────────────────

  /// Persist a new message and run post-create hooks. Sender, receiver, and
  /// parent (if any) must already exist.
  fn send_message(
    &self,
    input: NewMessage,
  ) -> impl Future<Output = Result<Message, Self::Error>> + Send + '_;

  /// Replace a message's content as `editor`. Pre-update hooks observe the
  /// transition before it commits; with the standard hooks a content change
  /// appends a history snapshot and sets the `edited` flag.
  fn edit_message(
    &self,
    id: Uuid,
    new_content: String,
    editor: Uuid,
  ) -> impl Future<Output = Result<Message, Self::Error>> + Send + '_;

  /// Flag a message as read. Goes through the same update pipeline as
  /// [`Self::edit_message`] but changes no content, so no history results.
  fn mark_read(
    &self,
    id: Uuid,
  ) -> impl Future<Output = Result<Message, Self::Error>> + Send + '_;

  /// Retrieve a message by id. Returns `None` if not found.
  fn get_message(
    &self,
    id: Uuid,
  ) -> impl Future<Output = Result<Option<Message>, Self::Error>> + Send + '_;

  /// Direct replies to any of `parent_ids`, in one batched query, ordered by
  /// creation time ascending. This is the thread resolver's primitive: one
  /// call per tree level, never one per node.
  fn replies_to(
    &self,
    parent_ids: Vec<Uuid>,
  ) -> impl Future<Output = Result<Vec<Message>, Self::Error>> + Send + '_;

  // ── Read models ───────────────────────────────────────────────────────

  /// All unread messages for `user_id`, newest first, as projections carrying
  /// only the fields inbox callers need. One storage round trip.
  fn unread_for(
    &self,
    user_id: Uuid,
  ) -> impl Future<Output = Result<Vec<MessageSummary>, Self::Error>> + Send + '_;

  /// Notifications targeting `user_id`, newest first.
  fn notifications_for(
    &self,
    user_id: Uuid,
  ) -> impl Future<Output = Result<Vec<Notification>, Self::Error>> + Send + '_;

  /// Edit history for a message, newest first.
  fn history_for(
    &self,
    message_id: Uuid,
  ) -> impl Future<Output = Result<Vec<MessageHistory>, Self::Error>> + Send + '_;
}
