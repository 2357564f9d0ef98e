//! [`SqliteStore`] — the SQLite implementation of [`MessageStore`].

use std::{
  path::Path,
  sync::{
    Arc,
    atomic::{AtomicU64, Ordering},
  },
};

use chrono::Utc;
use rusqlite::OptionalExtension as _;
use uuid::Uuid;

use missive_core::{
  derived::{CascadeReport, MessageHistory, Notification},
  inbox::MessageSummary,
  message::{Message, NewMessage},
  propagation::{Effect, HookSet, UpdateContext},
  store::MessageStore,
  user::User,
};

use crate::{
  Error, Result,
  encode::{
    RawHistory, RawMessage, RawNotification, RawSummary, RawUser, encode_dt,
    encode_uuid,
  },
  schema::SCHEMA,
};

// ─── Store ───────────────────────────────────────────────────────────────────

/// A Missive messaging store backed by a single SQLite file.
///
/// Cloning is cheap — the inner connection is reference-counted and the hook
/// set is shared. Every mutation runs its primary write and its hook effects
/// in one SQLite transaction.
#[derive(Clone)]
pub struct SqliteStore {
  conn:        tokio_rusqlite::Connection,
  hooks:       HookSet,
  round_trips: Arc<AtomicU64>,
}

impl SqliteStore {
  /// Open (or create) a store at `path` with the standard propagation hooks
  /// (edit capture, notification fan-out, user cascade).
  pub async fn open(path: impl AsRef<Path>) -> Result<Self> {
    Self::open_with_hooks(path, HookSet::standard()).await
  }

  /// Open (or create) a store at `path` with an explicit hook set.
  pub async fn open_with_hooks(
    path: impl AsRef<Path>,
    hooks: HookSet,
  ) -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open(path).await?;
    let store = Self::wrap(conn, hooks);
    store.init_schema().await?;
    Ok(store)
  }

  /// Open an in-memory store with the standard hooks — useful for testing.
  pub async fn open_in_memory() -> Result<Self> {
    Self::open_in_memory_with_hooks(HookSet::standard()).await
  }

  /// Open an in-memory store with an explicit hook set.
  pub async fn open_in_memory_with_hooks(hooks: HookSet) -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open_in_memory().await?;
    let store = Self::wrap(conn, hooks);
    store.init_schema().await?;
    Ok(store)
  }

  fn wrap(conn: tokio_rusqlite::Connection, hooks: HookSet) -> Self {
    Self { conn, hooks, round_trips: Arc::new(AtomicU64::new(0)) }
  }

  async fn init_schema(&self) -> Result<()> {
    self
      .conn
      .call(|conn| {
        conn.execute_batch(SCHEMA)?;
        Ok(())
      })
      .await?;
    Ok(())
  }

  /// Number of round trips to the database thread since this store (or a
  /// clone sharing its counter) was opened. Instrumentation for the read-model
  /// contracts: a cached inbox read must not move this number.
  pub fn round_trips(&self) -> u64 { self.round_trips.load(Ordering::Relaxed) }

  /// Ship `f` to the database thread, counting the round trip.
  async fn call<F, R>(&self, f: F) -> Result<R>
  where
    F: FnOnce(&mut rusqlite::Connection) -> tokio_rusqlite::Result<R>
      + Send
      + 'static,
    R: Send + 'static,
  {
    self.round_trips.fetch_add(1, Ordering::Relaxed);
    Ok(self.conn.call(f).await?)
  }
}

#[cfg(test)]
impl SqliteStore {
  /// Raw row count for post-condition assertions. Bypasses the round-trip
  /// counter so it never disturbs the read-model contract tests.
  pub(crate) async fn count_rows(&self, sql: String) -> Result<i64> {
    Ok(
      self
        .conn
        .call(move |conn| Ok(conn.query_row(&sql, [], |r| r.get(0))?))
        .await?,
    )
  }
}

// ─── MessageStore impl ───────────────────────────────────────────────────────

impl MessageStore for SqliteStore {
  type Error = Error;

  // ── Users ─────────────────────────────────────────────────────────────────

  async fn add_user(&self, username: String) -> Result<User> {
    let user = User {
      user_id:    Uuid::new_v4(),
      username,
      created_at: Utc::now(),
    };

    let id_str = encode_uuid(user.user_id);
    let at_str = encode_dt(user.created_at);
    let name = user.username.clone();

    self
      .call(move |conn| {
        conn.execute(
          "INSERT INTO users (user_id, username, created_at) VALUES (?1, ?2, ?3)",
          rusqlite::params![id_str, name, at_str],
        )?;
        Ok(())
      })
      .await?;

    Ok(user)
  }

  async fn get_user(&self, id: Uuid) -> Result<Option<User>> {
    let id_str = encode_uuid(id);

    let raw: Option<RawUser> = self
      .call(move |conn| {
        Ok(conn
          .query_row(
            "SELECT user_id, username, created_at FROM users WHERE user_id = ?1",
            rusqlite::params![id_str],
            |row| {
              Ok(RawUser {
                user_id:    row.get(0)?,
                username:   row.get(1)?,
                created_at: row.get(2)?,
              })
            },
          )
          .optional()?)
      })
      .await?;

    raw.map(RawUser::into_user).transpose()
  }

  async fn delete_user(&self, id: Uuid) -> Result<CascadeReport> {
    let hooks = self.hooks.clone();
    let out = self.call(move |conn| Ok(delete_user_tx(conn, &hooks, id))).await;

    let flat = match out {
      Ok(inner) => inner,
      Err(e) => Err(e),
    };

    // A missing user is the caller's mistake, not a failed cascade. Anything
    // else means the transaction rolled back.
    flat.map_err(|e| match e {
      e @ Error::Core(missive_core::Error::UserNotFound(_)) => e,
      other => Error::CascadeFailed { user_id: id, source: Box::new(other) },
    })
  }

  // ── Messages ──────────────────────────────────────────────────────────────

  async fn send_message(&self, input: NewMessage) -> Result<Message> {
    let hooks = self.hooks.clone();
    self.call(move |conn| Ok(send_message_tx(conn, &hooks, input))).await?
  }

  async fn edit_message(
    &self,
    id: Uuid,
    new_content: String,
    editor: Uuid,
  ) -> Result<Message> {
    let hooks = self.hooks.clone();
    let change = MessageChange::Content { content: new_content, editor };
    self
      .call(move |conn| Ok(update_message_tx(conn, &hooks, id, change)))
      .await?
  }

  async fn mark_read(&self, id: Uuid) -> Result<Message> {
    let hooks = self.hooks.clone();
    self
      .call(move |conn| {
        Ok(update_message_tx(conn, &hooks, id, MessageChange::Read))
      })
      .await?
  }

  async fn get_message(&self, id: Uuid) -> Result<Option<Message>> {
    let id_str = encode_uuid(id);

    let raw: Option<RawMessage> = self
      .call(move |conn| Ok(query_message(conn, &id_str)?))
      .await?;

    raw.map(RawMessage::into_message).transpose()
  }

  async fn replies_to(&self, parent_ids: Vec<Uuid>) -> Result<Vec<Message>> {
    if parent_ids.is_empty() {
      return Ok(Vec::new());
    }

    let id_strs: Vec<String> =
      parent_ids.into_iter().map(encode_uuid).collect();

    let raws: Vec<RawMessage> = self
      .call(move |conn| {
        let placeholders = vec!["?"; id_strs.len()].join(", ");
        let sql = format!(
          "SELECT message_id, sender_id, receiver_id, content, created_at,
                  is_read, edited, parent_id
           FROM messages
           WHERE parent_id IN ({placeholders})
           ORDER BY created_at ASC, message_id ASC"
        );

        let mut stmt = conn.prepare(&sql)?;
        let rows = stmt
          .query_map(rusqlite::params_from_iter(id_strs.iter()), read_message_row)?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    raws.into_iter().map(RawMessage::into_message).collect()
  }

  // ── Read models ───────────────────────────────────────────────────────────

  async fn unread_for(&self, user_id: Uuid) -> Result<Vec<MessageSummary>> {
    let user_str = encode_uuid(user_id);

    let raws: Vec<RawSummary> = self
      .call(move |conn| {
        let mut stmt = conn.prepare(
          "SELECT m.message_id, m.sender_id, u.username, m.content,
                  m.created_at, m.parent_id
           FROM messages m
           JOIN users u ON u.user_id = m.sender_id
           WHERE m.receiver_id = ?1 AND m.is_read = 0
           ORDER BY m.created_at DESC, m.message_id DESC",
        )?;

        let rows = stmt
          .query_map(rusqlite::params![user_str], |row| {
            Ok(RawSummary {
              message_id:      row.get(0)?,
              sender_id:       row.get(1)?,
              sender_username: row.get(2)?,
              content:         row.get(3)?,
              created_at:      row.get(4)?,
              parent_id:       row.get(5)?,
            })
          })?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    raws.into_iter().map(RawSummary::into_summary).collect()
  }

  async fn notifications_for(&self, user_id: Uuid) -> Result<Vec<Notification>> {
    let user_str = encode_uuid(user_id);

    let raws: Vec<RawNotification> = self
      .call(move |conn| {
        let mut stmt = conn.prepare(
          "SELECT notification_id, user_id, message_id, created_at, is_read
           FROM notifications
           WHERE user_id = ?1
           ORDER BY created_at DESC, notification_id DESC",
        )?;

        let rows = stmt
          .query_map(rusqlite::params![user_str], |row| {
            Ok(RawNotification {
              notification_id: row.get(0)?,
              user_id:         row.get(1)?,
              message_id:      row.get(2)?,
              created_at:      row.get(3)?,
              is_read:         row.get(4)?,
            })
          })?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    raws.into_iter().map(RawNotification::into_notification).collect()
  }

  async fn history_for(&self, message_id: Uuid) -> Result<Vec<MessageHistory>> {
    let msg_str = encode_uuid(message_id);

    let raws: Vec<RawHistory> = self
      .call(move |conn| {
        let mut stmt = conn.prepare(
          "SELECT history_id, message_id, old_content, edited_at, editor_id
           FROM message_history
           WHERE message_id = ?1
           ORDER BY edited_at DESC, history_id DESC",
        )?;

        let rows = stmt
          .query_map(rusqlite::params![msg_str], |row| {
            Ok(RawHistory {
              history_id:  row.get(0)?,
              message_id:  row.get(1)?,
              old_content: row.get(2)?,
              edited_at:   row.get(3)?,
              editor_id:   row.get(4)?,
            })
          })?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    raws.into_iter().map(RawHistory::into_history).collect()
  }
}

// ─── Transaction bodies ──────────────────────────────────────────────────────
//
// The mutation pipelines run as plain functions on the database thread: one
// transaction each, hooks invoked in the middle, commit at the end. Returning
// early drops the transaction and rolls everything back.

enum MessageChange {
  Content { content: String, editor: Uuid },
  Read,
}

fn send_message_tx(
  conn: &mut rusqlite::Connection,
  hooks: &HookSet,
  input: NewMessage,
) -> Result<Message> {
  let tx = conn.transaction()?;

  require_user(&tx, "sender", input.sender_id)?;
  require_user(&tx, "receiver", input.receiver_id)?;
  if let Some(parent) = input.parent_id {
    if load_message(&tx, parent)?.is_none() {
      return Err(
        missive_core::Error::ReferentialIntegrity {
          reference: "parent",
          id:        parent,
        }
        .into(),
      );
    }
  }

  let message = Message {
    message_id:  Uuid::new_v4(),
    sender_id:   input.sender_id,
    receiver_id: input.receiver_id,
    content:     input.content,
    created_at:  Utc::now(),
    is_read:     false,
    edited:      false,
    parent_id:   input.parent_id,
  };

  tx.execute(
    "INSERT INTO messages (
       message_id, sender_id, receiver_id, content, created_at,
       is_read, edited, parent_id
     ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
    rusqlite::params![
      encode_uuid(message.message_id),
      encode_uuid(message.sender_id),
      encode_uuid(message.receiver_id),
      message.content,
      encode_dt(message.created_at),
      message.is_read,
      message.edited,
      message.parent_id.map(encode_uuid),
    ],
  )?;

  for effect in hooks.after_create(&message)? {
    apply_effect(&tx, &effect)?;
  }

  tx.commit()?;
  Ok(message)
}

fn update_message_tx(
  conn: &mut rusqlite::Connection,
  hooks: &HookSet,
  id: Uuid,
  change: MessageChange,
) -> Result<Message> {
  let tx = conn.transaction()?;

  let current = load_message(&tx, id)?
    .ok_or(missive_core::Error::MessageNotFound(id))?;

  let (updated, editor) = match change {
    MessageChange::Content { content, editor } => {
      require_user(&tx, "editor", editor)?;
      let mut next = current.clone();
      next.content = content;
      (next, editor)
    }
    MessageChange::Read => {
      // A read receipt is attributed to the receiver.
      let mut next = current.clone();
      next.is_read = true;
      let reader = current.receiver_id;
      (next, reader)
    }
  };

  let ctx = UpdateContext { current, updated, editor };
  let effects = hooks.before_update(&ctx)?;

  tx.execute(
    "UPDATE messages SET content = ?2, is_read = ?3 WHERE message_id = ?1",
    rusqlite::params![
      encode_uuid(id),
      ctx.updated.content,
      ctx.updated.is_read,
    ],
  )?;

  for effect in effects {
    apply_effect(&tx, &effect)?;
  }

  // Reload so the returned row reflects hook effects (the `edited` flag).
  let message = load_message(&tx, id)?
    .ok_or(missive_core::Error::MessageNotFound(id))?;

  tx.commit()?;
  Ok(message)
}

fn delete_user_tx(
  conn: &mut rusqlite::Connection,
  hooks: &HookSet,
  id: Uuid,
) -> Result<CascadeReport> {
  let tx = conn.transaction()?;

  let user = load_user(&tx, id)?
    .ok_or(missive_core::Error::UserNotFound(id))?;

  let mut report = CascadeReport::default();
  for effect in hooks.after_delete(&user)? {
    let n = apply_effect(&tx, &effect)? as u64;
    match effect {
      Effect::DeleteMessagesInvolving { .. } => report.messages += n,
      Effect::DeleteNotificationsFor { .. } => report.notifications += n,
      Effect::DeleteHistoryByEditor { .. } => report.history_entries += n,
      _ => {}
    }
  }

  tx.execute(
    "DELETE FROM users WHERE user_id = ?1",
    rusqlite::params![encode_uuid(id)],
  )?;

  tx.commit()?;
  tracing::debug!(
    user = %id,
    messages = report.messages,
    notifications = report.notifications,
    history = report.history_entries,
    "user cascade committed"
  );
  Ok(report)
}

// ─── Effect application ──────────────────────────────────────────────────────

/// Apply one hook effect inside the current transaction. Returns the number
/// of rows directly affected. Ids and timestamps for inserted rows are
/// assigned here.
fn apply_effect(tx: &rusqlite::Transaction<'_>, effect: &Effect) -> Result<usize> {
  let n = match effect {
    Effect::InsertNotification { user_id, message_id } => tx.execute(
      "INSERT INTO notifications (notification_id, user_id, message_id, created_at, is_read)
       VALUES (?1, ?2, ?3, ?4, 0)",
      rusqlite::params![
        encode_uuid(Uuid::new_v4()),
        encode_uuid(*user_id),
        encode_uuid(*message_id),
        encode_dt(Utc::now()),
      ],
    )?,
    Effect::InsertHistory { message_id, old_content, editor_id } => tx.execute(
      "INSERT INTO message_history (history_id, message_id, old_content, edited_at, editor_id)
       VALUES (?1, ?2, ?3, ?4, ?5)",
      rusqlite::params![
        encode_uuid(Uuid::new_v4()),
        encode_uuid(*message_id),
        old_content,
        encode_dt(Utc::now()),
        encode_uuid(*editor_id),
      ],
    )?,
    Effect::MarkEdited { message_id } => tx.execute(
      "UPDATE messages SET edited = 1 WHERE message_id = ?1",
      rusqlite::params![encode_uuid(*message_id)],
    )?,
    Effect::DeleteMessagesInvolving { user_id } => {
      let id_str = encode_uuid(*user_id);
      tx.execute(
        "DELETE FROM messages WHERE sender_id = ?1 OR receiver_id = ?1",
        rusqlite::params![id_str],
      )?
    }
    Effect::DeleteNotificationsFor { user_id } => tx.execute(
      "DELETE FROM notifications WHERE user_id = ?1",
      rusqlite::params![encode_uuid(*user_id)],
    )?,
    Effect::DeleteHistoryByEditor { user_id } => tx.execute(
      "DELETE FROM message_history WHERE editor_id = ?1",
      rusqlite::params![encode_uuid(*user_id)],
    )?,
  };
  Ok(n)
}

// ─── Row helpers ─────────────────────────────────────────────────────────────

fn read_message_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<RawMessage> {
  Ok(RawMessage {
    message_id:  row.get(0)?,
    sender_id:   row.get(1)?,
    receiver_id: row.get(2)?,
    content:     row.get(3)?,
    created_at:  row.get(4)?,
    is_read:     row.get(5)?,
    edited:      row.get(6)?,
    parent_id:   row.get(7)?,
  })
}

fn query_message(
  conn: &rusqlite::Connection,
  id_str: &str,
) -> rusqlite::Result<Option<RawMessage>> {
  conn
    .query_row(
      "SELECT message_id, sender_id, receiver_id, content, created_at,
              is_read, edited, parent_id
       FROM messages WHERE message_id = ?1",
      rusqlite::params![id_str],
      read_message_row,
    )
    .optional()
}

fn load_message(
  conn: &rusqlite::Connection,
  id: Uuid,
) -> Result<Option<Message>> {
  query_message(conn, &encode_uuid(id))?
    .map(RawMessage::into_message)
    .transpose()
}

fn load_user(conn: &rusqlite::Connection, id: Uuid) -> Result<Option<User>> {
  conn
    .query_row(
      "SELECT user_id, username, created_at FROM users WHERE user_id = ?1",
      rusqlite::params![encode_uuid(id)],
      |row| {
        Ok(RawUser {
          user_id:    row.get(0)?,
          username:   row.get(1)?,
          created_at: row.get(2)?,
        })
      },
    )
    .optional()?
    .map(RawUser::into_user)
    .transpose()
}

/// Referential-integrity check for a user reference about to be written.
fn require_user(
  conn: &rusqlite::Connection,
  reference: &'static str,
  id: Uuid,
) -> Result<()> {
  let exists: bool = conn
    .query_row(
      "SELECT 1 FROM users WHERE user_id = ?1",
      rusqlite::params![encode_uuid(id)],
      |_| Ok(true),
    )
    .optional()?
    .unwrap_or(false);

  if exists {
    Ok(())
  } else {
    Err(missive_core::Error::ReferentialIntegrity { reference, id }.into())
  }
}
