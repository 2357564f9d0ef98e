//! User — the referenced identity that sends and receives messages.
//!
//! Users are thin: authentication and profile data live elsewhere. The store
//! owns user rows only so that referential-integrity checks and cascade
//! deletion have something to anchor to.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
  pub user_id:    Uuid,
  pub username:   String,
  pub created_at: DateTime<Utc>,
}
