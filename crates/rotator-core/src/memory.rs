//! In-memory `CollectionService`
//!
//! Holds collections and post records in process memory, records every call
//! it receives, and lets callers inject failures per post or per collection.
//! Used by the engine and CLI tests.
//!
//! Cursor tokens are plain offsets into the collection.

use std::collections::{BTreeMap, HashMap, HashSet};
use std::sync::{Mutex, MutexGuard};

use serde_json::json;

use crate::errors::{Result, RotatorError};
use crate::model::{
    CollectionId, Entry, Page, PostId, PostRecord, RemoteAck, TruncationCursor,
};
use crate::service::CollectionService;

/// One call received by the in-memory service
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RemoteCall {
    FetchPage {
        collection: CollectionId,
        cursor: Option<TruncationCursor>,
    },
    AddEntry {
        collection: CollectionId,
        post: PostId,
    },
    RemoveEntry {
        collection: CollectionId,
        post: PostId,
    },
    Reposition {
        collection: CollectionId,
        post: PostId,
        relative_to: PostId,
    },
    FetchPost {
        post: PostId,
    },
    Retweet {
        post: PostId,
    },
    Unretweet {
        post: PostId,
    },
}

#[derive(Default)]
struct State {
    collections: BTreeMap<CollectionId, Vec<PostId>>,
    posts: HashMap<PostId, PostRecord>,
    calls: Vec<RemoteCall>,
    retweet_failures: HashMap<PostId, RotatorError>,
    fetch_post_failures: HashSet<PostId>,
    rejected_adds: HashSet<PostId>,
    rejected_removes: HashSet<PostId>,
    failing_writes: HashSet<PostId>,
    /// Collection -> number of pages served before reads start failing
    page_failures: HashMap<CollectionId, usize>,
    pages_served: HashMap<CollectionId, usize>,
}

/// In-memory collection host
#[derive(Default)]
pub struct InMemoryCollections {
    state: Mutex<State>,
}

fn ack_body(op: &str, post: PostId, reason: Option<&str>) -> serde_json::Value {
    match reason {
        None => json!({ "objects": {}, "response": { "errors": [] } }),
        Some(reason) => json!({
            "objects": {},
            "response": {
                "errors": [{
                    "change": { "op": op, "tweet_id": post.to_string() },
                    "reason": reason
                }]
            }
        }),
    }
}

impl InMemoryCollections {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed a collection with posts (head first). Unknown posts get a
    /// minimal record so `fetch_post` can resolve them.
    pub fn with_collection(self, id: CollectionId, posts: impl IntoIterator<Item = u64>) -> Self {
        {
            let mut state = self.lock();
            let ids: Vec<PostId> = posts.into_iter().map(PostId).collect();
            for post in &ids {
                state
                    .posts
                    .entry(*post)
                    .or_insert_with(|| default_record(*post));
            }
            state.collections.insert(id, ids);
        }
        self
    }

    /// Register or replace a post record
    pub fn with_post(self, record: PostRecord) -> Self {
        self.lock().posts.insert(record.id, record);
        self
    }

    /// Mark a post as already retweeted by the account
    pub fn with_retweeted(self, post: u64) -> Self {
        {
            let mut state = self.lock();
            let record = state
                .posts
                .entry(PostId(post))
                .or_insert_with(|| default_record(PostId(post)));
            record.retweeted = true;
        }
        self
    }

    /// Make `retweet(post)` fail with a generic API refusal
    pub fn fail_retweet(&self, post: u64) {
        self.fail_retweet_with(
            post,
            RotatorError::Api {
                code: 136,
                message: "You have been blocked from retweeting this Tweet".to_string(),
            },
        );
    }

    pub fn fail_retweet_with(&self, post: u64, error: RotatorError) {
        self.lock().retweet_failures.insert(PostId(post), error);
    }

    /// Make `fetch_post(post)` fail with `PostNotFound`
    pub fn fail_fetch_post(&self, post: u64) {
        self.lock().fetch_post_failures.insert(PostId(post));
    }

    /// Acknowledge adds of `post` as rejected
    pub fn reject_add(&self, post: u64) {
        self.lock().rejected_adds.insert(PostId(post));
    }

    /// Acknowledge removes of `post` as rejected
    pub fn reject_remove(&self, post: u64) {
        self.lock().rejected_removes.insert(PostId(post));
    }

    /// Make every add/remove of `post` fail with a transport error
    pub fn fail_writes(&self, post: u64) {
        self.lock().failing_writes.insert(PostId(post));
    }

    /// Serve `pages_ok` pages of `collection`, then fail every further read
    pub fn fail_pages_after(&self, collection: CollectionId, pages_ok: usize) {
        self.lock().page_failures.insert(collection, pages_ok);
    }

    /// Current contents of a collection (head first)
    pub fn entries(&self, collection: CollectionId) -> Vec<PostId> {
        self.lock()
            .collections
            .get(&collection)
            .cloned()
            .unwrap_or_default()
    }

    pub fn is_retweeted(&self, post: u64) -> bool {
        self.lock()
            .posts
            .get(&PostId(post))
            .map(|p| p.retweeted)
            .unwrap_or(false)
    }

    /// Every call received so far, in order
    pub fn calls(&self) -> Vec<RemoteCall> {
        self.lock().calls.clone()
    }

    /// Count calls matching a predicate
    pub fn count_calls<F>(&self, predicate: F) -> usize
    where
        F: Fn(&RemoteCall) -> bool,
    {
        self.lock().calls.iter().filter(|c| predicate(c)).count()
    }

    pub fn clear_calls(&self) {
        self.lock().calls.clear();
    }

    fn lock(&self) -> MutexGuard<'_, State> {
        // A poisoned lock only means a test panicked mid-call; the data is
        // still usable for inspection.
        self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn record(&self, call: RemoteCall) -> MutexGuard<'_, State> {
        let mut state = self.lock();
        state.calls.push(call);
        state
    }
}

fn default_record(post: PostId) -> PostRecord {
    PostRecord::new(post)
        .with_field("id_str", json!(post.to_string()))
        .with_field("text", json!(format!("post {}", post)))
}

impl CollectionService for InMemoryCollections {
    fn fetch_page(
        &self,
        collection: CollectionId,
        cursor: Option<TruncationCursor>,
        page_size: usize,
    ) -> Result<Page> {
        let mut state = self.record(RemoteCall::FetchPage { collection, cursor });

        let served = state.pages_served.entry(collection).or_insert(0);
        *served += 1;
        let served = *served;
        if let Some(limit) = state.page_failures.get(&collection) {
            if served > *limit {
                return Err(RotatorError::Transport {
                    message: format!("connection reset reading collection {}", collection),
                });
            }
        }

        let posts = state
            .collections
            .get(&collection)
            .cloned()
            .unwrap_or_default();
        let page_size = page_size.max(1);
        let offset = cursor.map(|c| c.0 as usize).unwrap_or(0).min(posts.len());
        let end = (offset + page_size).min(posts.len());
        let entries = posts[offset..end].iter().copied().map(Entry::new).collect();

        if end < posts.len() {
            Ok(Page::truncated(entries, TruncationCursor(end as u64)))
        } else {
            Ok(Page::last(entries))
        }
    }

    fn add_entry(&self, collection: CollectionId, post: PostId) -> Result<RemoteAck> {
        let mut state = self.record(RemoteCall::AddEntry { collection, post });

        if state.failing_writes.contains(&post) {
            return Err(RotatorError::Transport {
                message: format!("connection reset adding {}", post),
            });
        }
        if state.rejected_adds.contains(&post) {
            return Ok(RemoteAck::rejected(
                "not_authorized",
                ack_body("add", post, Some("not_authorized")),
            ));
        }

        let entries = state.collections.entry(collection).or_default();
        if entries.contains(&post) {
            return Ok(RemoteAck::already_applied(
                "duplicate",
                ack_body("add", post, Some("duplicate")),
            ));
        }
        entries.push(post);
        Ok(RemoteAck::applied(ack_body("add", post, None)))
    }

    fn remove_entry(&self, collection: CollectionId, post: PostId) -> Result<RemoteAck> {
        let mut state = self.record(RemoteCall::RemoveEntry { collection, post });

        if state.failing_writes.contains(&post) {
            return Err(RotatorError::Transport {
                message: format!("connection reset removing {}", post),
            });
        }
        if state.rejected_removes.contains(&post) {
            return Ok(RemoteAck::rejected(
                "not_authorized",
                ack_body("remove", post, Some("not_authorized")),
            ));
        }

        let entries = state.collections.entry(collection).or_default();
        match entries.iter().position(|p| *p == post) {
            Some(index) => {
                entries.remove(index);
                Ok(RemoteAck::applied(ack_body("remove", post, None)))
            }
            None => Ok(RemoteAck::rejected(
                "not_found",
                ack_body("remove", post, Some("not_found")),
            )),
        }
    }

    fn reposition(
        &self,
        collection: CollectionId,
        post: PostId,
        relative_to: PostId,
    ) -> Result<RemoteAck> {
        let mut state = self.record(RemoteCall::Reposition {
            collection,
            post,
            relative_to,
        });

        let entries = state.collections.entry(collection).or_default();
        let Some(from) = entries.iter().position(|p| *p == post) else {
            return Ok(RemoteAck::rejected(
                "not_found",
                ack_body("move", post, Some("not_found")),
            ));
        };
        if !entries.contains(&relative_to) || post == relative_to {
            return Ok(RemoteAck::rejected(
                "invalid_relative_to",
                ack_body("move", post, Some("invalid_relative_to")),
            ));
        }

        entries.remove(from);
        let anchor = entries
            .iter()
            .position(|p| *p == relative_to)
            .map(|i| i + 1)
            .unwrap_or(entries.len());
        entries.insert(anchor, post);
        Ok(RemoteAck::applied(ack_body("move", post, None)))
    }

    fn fetch_post(&self, post: PostId) -> Result<PostRecord> {
        let state = self.record(RemoteCall::FetchPost { post });

        if state.fetch_post_failures.contains(&post) {
            return Err(RotatorError::PostNotFound { post_id: post });
        }
        state
            .posts
            .get(&post)
            .cloned()
            .ok_or(RotatorError::PostNotFound { post_id: post })
    }

    fn retweet(&self, post: PostId) -> Result<()> {
        let mut state = self.record(RemoteCall::Retweet { post });

        if let Some(err) = state.retweet_failures.get(&post) {
            return Err(err.clone());
        }
        let record = state
            .posts
            .get_mut(&post)
            .ok_or(RotatorError::PostNotFound { post_id: post })?;
        if record.retweeted {
            return Err(RotatorError::AlreadyRetweeted { post_id: post });
        }
        record.retweeted = true;
        Ok(())
    }

    fn unretweet(&self, post: PostId) -> Result<()> {
        let mut state = self.record(RemoteCall::Unretweet { post });

        let record = state
            .posts
            .get_mut(&post)
            .ok_or(RotatorError::PostNotFound { post_id: post })?;
        record.retweeted = false;
        Ok(())
    }
}
