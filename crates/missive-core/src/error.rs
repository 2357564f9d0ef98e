//! Error types for `missive-core`.

use thiserror::Error;
use uuid::Uuid;

#[derive(Debug, Error)]
pub enum Error {
  #[error("user not found: {0}")]
  UserNotFound(Uuid),

  #[error("message not found: {0}")]
  MessageNotFound(Uuid),

  /// A write referenced an entity that does not exist. `reference` names the
  /// dangling field ("sender", "receiver", "parent", "editor").
  #[error("dangling {reference} reference: {id}")]
  ReferentialIntegrity { reference: &'static str, id: Uuid },

  /// A registered propagation hook refused the write.
  #[error("propagation hook {hook} failed: {reason}")]
  HookFailed { hook: &'static str, reason: String },
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
