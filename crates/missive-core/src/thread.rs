//! Thread resolution: rebuilding a reply tree from the flat message table.
//!
//! Messages store their parent as an optional id, so a thread of depth D is
//! reconstructed by a breadth-first sweep — one batched
//! [`MessageStore::replies_to`] call per level, never one fetch per node.
//! Total cost: 1 + D storage round trips regardless of fan-out.

use std::collections::{HashMap, HashSet};

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{message::Message, store::MessageStore};

/// A message with its direct replies, recursively. Replies are chronological
/// (oldest first) — threads read top-down, unlike the newest-first inbox.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ThreadNode {
  pub message: Message,
  pub replies: Vec<ThreadNode>,
}

impl ThreadNode {
  /// Number of messages in the whole subtree, the root included.
  pub fn size(&self) -> usize {
    1 + self.replies.iter().map(ThreadNode::size).sum::<usize>()
  }

  /// Depth of the deepest reply below this node; 0 for a leaf.
  pub fn depth(&self) -> usize {
    self.replies.iter().map(|r| 1 + r.depth()).max().unwrap_or(0)
  }
}

/// Resolve the thread rooted at `root_id`. Returns `None` if the root does
/// not exist.
pub async fn resolve_thread<S: MessageStore>(
  store: &S,
  root_id: Uuid,
) -> Result<Option<ThreadNode>, S::Error> {
  let Some(root) = store.get_message(root_id).await? else {
    return Ok(None);
  };

  // Level-by-level sweep over the flat table. `seen` guards against
  // malformed parent links looping the traversal.
  let mut children: HashMap<Uuid, Vec<Message>> = HashMap::new();
  let mut seen: HashSet<Uuid> = HashSet::from([root_id]);
  let mut frontier = vec![root_id];

  while !frontier.is_empty() {
    let level = store.replies_to(frontier).await?;
    frontier = Vec::new();

    for reply in level {
      if !seen.insert(reply.message_id) {
        continue;
      }
      frontier.push(reply.message_id);
      let parent = reply.parent_id.unwrap_or(root_id);
      children.entry(parent).or_default().push(reply);
    }
  }

  Ok(Some(assemble(root, &mut children)))
}

/// Attach each message's replies from the pre-grouped `children` map. The
/// per-parent ordering produced by `replies_to` is preserved.
fn assemble(
  message: Message,
  children: &mut HashMap<Uuid, Vec<Message>>,
) -> ThreadNode {
  let replies = children
    .remove(&message.message_id)
    .unwrap_or_default()
    .into_iter()
    .map(|reply| assemble(reply, children))
    .collect();

  ThreadNode { message, replies }
}

#[cfg(test)]
mod tests {
  use chrono::Utc;

  use super::*;

  fn message(id: Uuid, parent: Option<Uuid>) -> Message {
    Message {
      message_id:  id,
      sender_id:   Uuid::new_v4(),
      receiver_id: Uuid::new_v4(),
      content:     "reply".into(),
      created_at:  Utc::now(),
      is_read:     false,
      edited:      false,
      parent_id:   parent,
    }
  }

  #[test]
  fn assemble_builds_nested_tree() {
    let root_id = Uuid::new_v4();
    let child_id = Uuid::new_v4();
    let grandchild_id = Uuid::new_v4();

    let mut children = HashMap::new();
    children.insert(root_id, vec![message(child_id, Some(root_id))]);
    children.insert(child_id, vec![message(grandchild_id, Some(child_id))]);

    let tree = assemble(message(root_id, None), &mut children);

    assert_eq!(tree.size(), 3);
    assert_eq!(tree.depth(), 2);
    assert_eq!(tree.replies.len(), 1);
    assert_eq!(tree.replies[0].message.message_id, child_id);
    assert_eq!(tree.replies[0].replies[0].message.message_id, grandchild_id);
  }

  #[test]
  fn assemble_preserves_sibling_order() {
    let root_id = Uuid::new_v4();
    let first = Uuid::new_v4();
    let second = Uuid::new_v4();

    let mut children = HashMap::new();
    children.insert(root_id, vec![
      message(first, Some(root_id)),
      message(second, Some(root_id)),
    ]);

    let tree = assemble(message(root_id, None), &mut children);

    let order: Vec<Uuid> =
      tree.replies.iter().map(|r| r.message.message_id).collect();
    assert_eq!(order, vec![first, second]);
  }
}
