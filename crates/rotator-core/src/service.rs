//! Remote collection contract
//!
//! `CollectionService` is the seam between the rotation engine and whatever
//! hosts the collections. The HTTP client in `rotator-remote` is the
//! production implementation; `memory::InMemoryCollections` backs tests.
//!
//! Implementations own their rate-limit handling. Callers never see
//! rate-limit errors unless the implementation was configured to fail fast.

use crate::errors::Result;
use crate::model::{CollectionId, Page, PostId, PostRecord, RemoteAck, TruncationCursor};

pub trait CollectionService {
    /// Read one page of a collection.
    ///
    /// `cursor = None` starts from the head of the collection.
    fn fetch_page(
        &self,
        collection: CollectionId,
        cursor: Option<TruncationCursor>,
        page_size: usize,
    ) -> Result<Page>;

    /// Append a post to a collection. Re-adding a present post is tolerated
    /// by the service and reported as `AckOutcome::AlreadyApplied`.
    fn add_entry(&self, collection: CollectionId, post: PostId) -> Result<RemoteAck>;

    /// Remove a post from a collection. Failure is reported in the ack.
    fn remove_entry(&self, collection: CollectionId, post: PostId) -> Result<RemoteAck>;

    /// Move `post` so it sits next to `relative_to`.
    fn reposition(
        &self,
        collection: CollectionId,
        post: PostId,
        relative_to: PostId,
    ) -> Result<RemoteAck>;

    /// Fetch the full record of a post, including its retweet state.
    fn fetch_post(&self, post: PostId) -> Result<PostRecord>;

    /// Retweet a post. Fails with `AlreadyRetweeted` if it is already retweeted.
    fn retweet(&self, post: PostId) -> Result<()>;

    /// Undo a retweet.
    fn unretweet(&self, post: PostId) -> Result<()>;
}

impl<S: CollectionService + ?Sized> CollectionService for &S {
    fn fetch_page(
        &self,
        collection: CollectionId,
        cursor: Option<TruncationCursor>,
        page_size: usize,
    ) -> Result<Page> {
        (**self).fetch_page(collection, cursor, page_size)
    }

    fn add_entry(&self, collection: CollectionId, post: PostId) -> Result<RemoteAck> {
        (**self).add_entry(collection, post)
    }

    fn remove_entry(&self, collection: CollectionId, post: PostId) -> Result<RemoteAck> {
        (**self).remove_entry(collection, post)
    }

    fn reposition(
        &self,
        collection: CollectionId,
        post: PostId,
        relative_to: PostId,
    ) -> Result<RemoteAck> {
        (**self).reposition(collection, post, relative_to)
    }

    fn fetch_post(&self, post: PostId) -> Result<PostRecord> {
        (**self).fetch_post(post)
    }

    fn retweet(&self, post: PostId) -> Result<()> {
        (**self).retweet(post)
    }

    fn unretweet(&self, post: PostId) -> Result<()> {
        (**self).unretweet(post)
    }
}
