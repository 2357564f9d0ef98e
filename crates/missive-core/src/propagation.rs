//! The event propagation engine: lifecycle hooks and the effects they emit.
//!
//! Hooks are explicit objects registered on a [`HookSet`] that the storage
//! backend receives at construction. There is no ambient registry: the store
//! invokes the set synchronously, in registration order, inside the same
//! transaction as the primary write. Hooks themselves are pure — they inspect
//! the transition and return [`Effect`]s, and the store applies those effects
//! transactionally. A hook error aborts the whole write.

use std::sync::Arc;

use uuid::Uuid;

use crate::{Result, message::Message, user::User};

// ─── Effects ─────────────────────────────────────────────────────────────────

/// A derived write requested by a hook. Ids and timestamps for inserted rows
/// are assigned by the store when the effect is applied.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Effect {
  /// Insert an unread [`crate::derived::Notification`] for `user_id`.
  InsertNotification { user_id: Uuid, message_id: Uuid },
  /// Append a [`crate::derived::MessageHistory`] snapshot.
  InsertHistory {
    message_id:  Uuid,
    old_content: String,
    editor_id:   Uuid,
  },
  /// Set the message's `edited` flag. Monotonic: there is no effect that
  /// clears it.
  MarkEdited { message_id: Uuid },
  /// Delete every message where `user_id` is sender or receiver.
  DeleteMessagesInvolving { user_id: Uuid },
  /// Delete every notification targeting `user_id`.
  DeleteNotificationsFor { user_id: Uuid },
  /// Delete every history snapshot recorded by `user_id`.
  DeleteHistoryByEditor { user_id: Uuid },
}

// ─── Update context ──────────────────────────────────────────────────────────

/// The transition handed to [`MessageHook::before_update`]: the currently
/// persisted row and the row about to replace it.
#[derive(Debug, Clone)]
pub struct UpdateContext {
  pub current: Message,
  pub updated: Message,
  /// The acting user, passed explicitly by the caller. Never inferred from
  /// ambient state.
  pub editor:  Uuid,
}

impl UpdateContext {
  pub fn content_changed(&self) -> bool {
    self.current.content != self.updated.content
  }
}

// ─── Hook traits ─────────────────────────────────────────────────────────────

/// Observes message lifecycle transitions.
pub trait MessageHook: Send + Sync {
  /// Invoked before an update to an existing message commits.
  fn before_update(&self, _ctx: &UpdateContext) -> Result<Vec<Effect>> {
    Ok(Vec::new())
  }

  /// Invoked after a message is newly created (never on update).
  fn after_create(&self, _message: &Message) -> Result<Vec<Effect>> {
    Ok(Vec::new())
  }
}

/// Observes user deletion.
pub trait UserHook: Send + Sync {
  /// Invoked after a user row is slated for deletion, inside the cascade
  /// transaction.
  fn after_delete(&self, _user: &User) -> Result<Vec<Effect>> {
    Ok(Vec::new())
  }
}

// ─── Standard hooks ──────────────────────────────────────────────────────────

/// Captures edit history: iff the incoming content differs from the persisted
/// content, snapshot the old content and mark the message edited. Read-receipt
/// toggles and other non-content updates pass through untouched.
#[derive(Debug, Default)]
pub struct EditCapture;

impl MessageHook for EditCapture {
  fn before_update(&self, ctx: &UpdateContext) -> Result<Vec<Effect>> {
    if !ctx.content_changed() {
      return Ok(Vec::new());
    }
    tracing::debug!(
      message = %ctx.current.message_id,
      editor = %ctx.editor,
      "content edit detected, capturing history"
    );
    Ok(vec![
      Effect::InsertHistory {
        message_id:  ctx.current.message_id,
        old_content: ctx.current.content.clone(),
        editor_id:   ctx.editor,
      },
      Effect::MarkEdited { message_id: ctx.current.message_id },
    ])
  }
}

/// Creates exactly one unread notification for the receiver of every newly
/// created message.
#[derive(Debug, Default)]
pub struct NotificationFanout;

impl MessageHook for NotificationFanout {
  fn after_create(&self, message: &Message) -> Result<Vec<Effect>> {
    Ok(vec![Effect::InsertNotification {
      user_id:    message.receiver_id,
      message_id: message.message_id,
    }])
  }
}

/// Cleans up everything a deleted user touched: history they recorded,
/// notifications aimed at them, and messages they sent or received. History
/// goes first so nothing references rows deleted later in the same pass; the
/// store's own foreign-key cascades then remove replies and the derived rows
/// of each deleted message.
#[derive(Debug, Default)]
pub struct UserCascade;

impl UserHook for UserCascade {
  fn after_delete(&self, user: &User) -> Result<Vec<Effect>> {
    let user_id = user.user_id;
    Ok(vec![
      Effect::DeleteHistoryByEditor { user_id },
      Effect::DeleteNotificationsFor { user_id },
      Effect::DeleteMessagesInvolving { user_id },
    ])
  }
}

// ─── HookSet ─────────────────────────────────────────────────────────────────

/// The ordered collection of hooks a store invokes. Cloning is cheap — hooks
/// are reference-counted.
#[derive(Clone, Default)]
pub struct HookSet {
  message: Vec<Arc<dyn MessageHook>>,
  user:    Vec<Arc<dyn UserHook>>,
}

impl HookSet {
  /// An empty set: no derived state is produced at all.
  pub fn new() -> Self { Self::default() }

  /// The standard engine: edit capture, notification fan-out, user cascade.
  pub fn standard() -> Self {
    let mut hooks = Self::new();
    hooks.register_message_hook(Arc::new(EditCapture));
    hooks.register_message_hook(Arc::new(NotificationFanout));
    hooks.register_user_hook(Arc::new(UserCascade));
    hooks
  }

  pub fn register_message_hook(&mut self, hook: Arc<dyn MessageHook>) {
    self.message.push(hook);
  }

  pub fn register_user_hook(&mut self, hook: Arc<dyn UserHook>) {
    self.user.push(hook);
  }

  /// Run every message hook's `before_update`, concatenating effects in
  /// registration order. The first hook error aborts the write.
  pub fn before_update(&self, ctx: &UpdateContext) -> Result<Vec<Effect>> {
    let mut effects = Vec::new();
    for hook in &self.message {
      effects.extend(hook.before_update(ctx)?);
    }
    Ok(effects)
  }

  /// Run every message hook's `after_create`.
  pub fn after_create(&self, message: &Message) -> Result<Vec<Effect>> {
    let mut effects = Vec::new();
    for hook in &self.message {
      effects.extend(hook.after_create(message)?);
    }
    Ok(effects)
  }

  /// Run every user hook's `after_delete`.
  pub fn after_delete(&self, user: &User) -> Result<Vec<Effect>> {
    let mut effects = Vec::new();
    for hook in &self.user {
      effects.extend(hook.after_delete(user)?);
    }
    Ok(effects)
  }
}

#[cfg(test)]
mod tests {
  use chrono::Utc;

  use super::*;

  fn message(content: &str) -> Message {
    Message {
      message_id:  Uuid::new_v4(),
      sender_id:   Uuid::new_v4(),
      receiver_id: Uuid::new_v4(),
      content:     content.into(),
      created_at:  Utc::now(),
      is_read:     false,
      edited:      false,
      parent_id:   None,
    }
  }

  #[test]
  fn edit_capture_snapshots_changed_content() {
    let current = message("hello");
    let mut updated = current.clone();
    updated.content = "hello, edited".into();
    let editor = current.sender_id;

    let effects = EditCapture
      .before_update(&UpdateContext { current: current.clone(), updated, editor })
      .unwrap();

    assert_eq!(effects, vec![
      Effect::InsertHistory {
        message_id:  current.message_id,
        old_content: "hello".into(),
        editor_id:   editor,
      },
      Effect::MarkEdited { message_id: current.message_id },
    ]);
  }

  #[test]
  fn edit_capture_ignores_read_receipt() {
    let current = message("hello");
    let mut updated = current.clone();
    updated.is_read = true;

    let effects = EditCapture
      .before_update(&UpdateContext {
        editor: current.receiver_id,
        current,
        updated,
      })
      .unwrap();

    assert!(effects.is_empty());
  }

  #[test]
  fn fanout_targets_receiver_exactly_once() {
    let msg = message("ping");
    let effects = NotificationFanout.after_create(&msg).unwrap();

    assert_eq!(effects, vec![Effect::InsertNotification {
      user_id:    msg.receiver_id,
      message_id: msg.message_id,
    }]);
  }

  #[test]
  fn fanout_never_fires_on_update() {
    let current = message("a");
    let mut updated = current.clone();
    updated.content = "b".into();

    let effects = NotificationFanout
      .before_update(&UpdateContext {
        editor: current.sender_id,
        current,
        updated,
      })
      .unwrap();

    assert!(effects.is_empty());
  }

  #[test]
  fn cascade_deletes_history_before_messages() {
    let user = User {
      user_id:    Uuid::new_v4(),
      username:   "departing".into(),
      created_at: Utc::now(),
    };

    let effects = UserCascade.after_delete(&user).unwrap();

    assert_eq!(effects, vec![
      Effect::DeleteHistoryByEditor { user_id: user.user_id },
      Effect::DeleteNotificationsFor { user_id: user.user_id },
      Effect::DeleteMessagesInvolving { user_id: user.user_id },
    ]);
  }

  #[test]
  fn hookset_runs_in_registration_order() {
    struct Tagged(Uuid);
    impl MessageHook for Tagged {
      fn after_create(&self, msg: &Message) -> Result<Vec<Effect>> {
        Ok(vec![Effect::InsertNotification {
          user_id:    self.0,
          message_id: msg.message_id,
        }])
      }
    }

    let first = Uuid::new_v4();
    let second = Uuid::new_v4();
    let mut hooks = HookSet::new();
    hooks.register_message_hook(Arc::new(Tagged(first)));
    hooks.register_message_hook(Arc::new(Tagged(second)));

    let effects = hooks.after_create(&message("x")).unwrap();
    let targets: Vec<Uuid> = effects
      .iter()
      .map(|e| match e {
        Effect::InsertNotification { user_id, .. } => *user_id,
        other => panic!("unexpected effect: {other:?}"),
      })
      .collect();

    assert_eq!(targets, vec![first, second]);
  }

  #[test]
  fn hook_error_propagates() {
    struct Refuser;
    impl MessageHook for Refuser {
      fn after_create(&self, _: &Message) -> Result<Vec<Effect>> {
        Err(crate::Error::HookFailed {
          hook:   "refuser",
          reason: "nope".into(),
        })
      }
    }

    let mut hooks = HookSet::standard();
    hooks.register_message_hook(Arc::new(Refuser));

    let err = hooks.after_create(&message("x")).unwrap_err();
    assert!(matches!(err, crate::Error::HookFailed { hook: "refuser", .. }));
  }
}
