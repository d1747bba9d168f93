pub mod ack;
pub mod entry;
pub mod ids;
pub mod post;

pub use ack::{AckOutcome, RemoteAck};
pub use entry::{Entry, Page, TruncationCursor};
pub use ids::{CollectionId, PostId};
pub use post::PostRecord;
