//! Pagination accumulator
//!
//! Follows truncation cursors until a collection has been read end to end.
//! There is no retry here: an error on any page aborts the read and the
//! pages already received are dropped.

#![allow(clippy::result_large_err)]

use rotator_core::errors::{ExError, ExErrorKind};
use rotator_core::{CollectionId, CollectionService, Entry, RotatorError, TruncationCursor};
use rotator_store::errors::Result;

/// Largest page the remote service serves
pub const DEFAULT_PAGE_SIZE: usize = 200;

/// Read every entry of `collection` in the service's order (head first).
pub fn fetch_all(
    service: &dyn CollectionService,
    collection: CollectionId,
    page_size: usize,
) -> Result<Vec<Entry>> {
    collect_pages(service, collection, page_size, None)
}

/// Read at least `limit` entries (or the whole collection if smaller) and
/// return the first `limit`.
pub fn fetch_sample(
    service: &dyn CollectionService,
    collection: CollectionId,
    page_size: usize,
    limit: usize,
) -> Result<Vec<Entry>> {
    let mut entries = collect_pages(service, collection, page_size, Some(limit))?;
    entries.truncate(limit);
    Ok(entries)
}

/// A collection with zero or one entries counts as empty.
///
/// Reads a single page.
pub fn is_effectively_empty(
    service: &dyn CollectionService,
    collection: CollectionId,
    page_size: usize,
) -> Result<bool> {
    let page = service
        .fetch_page(collection, None, page_size)
        .map_err(|e| read_error(e, collection))?;
    Ok(page.entries.len() <= 1)
}

fn collect_pages(
    service: &dyn CollectionService,
    collection: CollectionId,
    page_size: usize,
    limit: Option<usize>,
) -> Result<Vec<Entry>> {
    let mut entries = Vec::new();
    let mut cursor: Option<TruncationCursor> = None;
    let mut page_count = 0usize;

    loop {
        let page = service
            .fetch_page(collection, cursor, page_size)
            .map_err(|e| read_error(e, collection))?;
        page_count += 1;
        entries.extend(page.entries);

        if !page.was_truncated || limit.is_some_and(|limit| entries.len() >= limit) {
            break;
        }

        match page.next_cursor {
            Some(next) if Some(next) != cursor => cursor = Some(next),
            Some(next) => {
                return Err(malformed(
                    collection,
                    format!("cursor {} did not advance", next.0),
                ))
            }
            None => {
                return Err(malformed(
                    collection,
                    "truncated page without a cursor".to_string(),
                ))
            }
        }
    }

    tracing::debug!(
        collection_id = collection.get(),
        page_count = page_count,
        entry_count = entries.len(),
        "Collection read"
    );
    Ok(entries)
}

fn read_error(err: RotatorError, collection: CollectionId) -> ExError {
    ExError::from(err)
        .with_op("fetch_page")
        .with_collection_id(collection)
}

fn malformed(collection: CollectionId, message: String) -> ExError {
    ExError::new(ExErrorKind::MalformedResponse)
        .with_op("fetch_page")
        .with_collection_id(collection)
        .with_message(message)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rotator_core::{InMemoryCollections, Page, PostId, PostRecord, RemoteAck};

    const MAIN: CollectionId = CollectionId(1);

    fn ids(entries: &[Entry]) -> Vec<u64> {
        entries.iter().map(|e| e.post_id.0).collect()
    }

    /// Claims every page is truncated and always hands back the same cursor
    struct StuckCursor;

    impl CollectionService for StuckCursor {
        fn fetch_page(
            &self,
            _collection: CollectionId,
            _cursor: Option<TruncationCursor>,
            _page_size: usize,
        ) -> rotator_core::Result<Page> {
            Ok(Page::truncated(vec![Entry::new(PostId(1))], TruncationCursor(9)))
        }

        fn add_entry(&self, _: CollectionId, _: PostId) -> rotator_core::Result<RemoteAck> {
            unreachable!()
        }

        fn remove_entry(&self, _: CollectionId, _: PostId) -> rotator_core::Result<RemoteAck> {
            unreachable!()
        }

        fn reposition(
            &self,
            _: CollectionId,
            _: PostId,
            _: PostId,
        ) -> rotator_core::Result<RemoteAck> {
            unreachable!()
        }

        fn fetch_post(&self, _: PostId) -> rotator_core::Result<PostRecord> {
            unreachable!()
        }

        fn retweet(&self, _: PostId) -> rotator_core::Result<()> {
            unreachable!()
        }

        fn unretweet(&self, _: PostId) -> rotator_core::Result<()> {
            unreachable!()
        }
    }

    #[test]
    fn test_fetch_all_single_page() {
        let svc = InMemoryCollections::new().with_collection(MAIN, [5, 6, 7]);
        let entries = fetch_all(&svc, MAIN, 200).unwrap();
        assert_eq!(ids(&entries), vec![5, 6, 7]);
    }

    #[test]
    fn test_fetch_sample_stops_early() {
        let svc = InMemoryCollections::new().with_collection(MAIN, 1..=10);

        let entries = fetch_sample(&svc, MAIN, 3, 4).unwrap();

        assert_eq!(ids(&entries), vec![1, 2, 3, 4]);
        // Two pages of three cover the four entries needed
        assert_eq!(svc.calls().len(), 2);
    }

    #[test]
    fn test_stuck_cursor_is_malformed() {
        let err = fetch_all(&StuckCursor, MAIN, 200).unwrap_err();
        assert_eq!(err.kind(), ExErrorKind::MalformedResponse);
        assert_eq!(err.collection_id(), Some(MAIN));
    }

    #[test]
    fn test_effectively_empty() {
        let svc = InMemoryCollections::new()
            .with_collection(CollectionId(1), Vec::<u64>::new())
            .with_collection(CollectionId(2), [9])
            .with_collection(CollectionId(3), [9, 10]);

        assert!(is_effectively_empty(&svc, CollectionId(1), 200).unwrap());
        assert!(is_effectively_empty(&svc, CollectionId(2), 200).unwrap());
        assert!(!is_effectively_empty(&svc, CollectionId(3), 200).unwrap());
    }
}
