use serde::{Deserialize, Serialize};

use super::ids::PostId;

/// Reference to one promotable post inside a collection
///
/// Position is implied by the order of the sequence the entry came from;
/// the remote service is the source of truth for that order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Entry {
    pub post_id: PostId,
}

impl Entry {
    pub fn new(post_id: PostId) -> Self {
        Self { post_id }
    }
}

impl From<PostId> for Entry {
    fn from(post_id: PostId) -> Self {
        Self { post_id }
    }
}

/// Opaque continuation token for a paginated read
///
/// Only meaningful within the read sequence that produced it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TruncationCursor(pub u64);

/// One page of a collection read
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Page {
    /// Entries in remote order (head first)
    pub entries: Vec<Entry>,
    /// Where the next page starts, if the service returned one
    pub next_cursor: Option<TruncationCursor>,
    /// Whether more entries exist past this page
    pub was_truncated: bool,
}

impl Page {
    /// A final page (no truncation) holding the given entries
    pub fn last(entries: Vec<Entry>) -> Self {
        Self {
            entries,
            next_cursor: None,
            was_truncated: false,
        }
    }

    /// A truncated page continuing at `cursor`
    pub fn truncated(entries: Vec<Entry>, cursor: TruncationCursor) -> Self {
        Self {
            entries,
            next_cursor: Some(cursor),
            was_truncated: true,
        }
    }
}
