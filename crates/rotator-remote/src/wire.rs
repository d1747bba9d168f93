//! Wire format of the remote collections API
//!
//! Response bodies are decoded into private serde shapes, then converted into
//! `rotator_core` model types. Nothing outside this module sees the JSON
//! layout.

use rotator_core::{
    CollectionId, Entry, Page, PostId, PostRecord, RemoteAck, RotatorError, TruncationCursor,
};
use serde::Deserialize;

/// Ack reason the service uses when an add targets a post already present
pub const REASON_DUPLICATE: &str = "duplicate";

/// Remote error codes with a dedicated meaning
pub mod codes {
    pub const COULD_NOT_AUTHENTICATE: i64 = 32;
    pub const RATE_LIMIT_EXCEEDED: i64 = 88;
    pub const INVALID_TOKEN: i64 = 89;
    pub const NO_STATUS_FOUND: i64 = 144;
    pub const BAD_AUTHENTICATION_DATA: i64 = 215;
    pub const ALREADY_RETWEETED: i64 = 327;
}

/// Ids arrive either as JSON numbers or as decimal strings
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum WireId {
    Num(u64),
    Str(String),
}

impl WireId {
    fn value(&self) -> Result<u64, RotatorError> {
        match self {
            WireId::Num(n) => Ok(*n),
            WireId::Str(s) => s.parse().map_err(|_| RotatorError::MalformedResponse {
                message: format!("id is not numeric: {}", s),
            }),
        }
    }
}

#[derive(Debug, Deserialize)]
struct EntriesEnvelope {
    response: EntriesBody,
}

#[derive(Debug, Deserialize)]
struct EntriesBody {
    #[serde(default)]
    timeline: Vec<TimelineItem>,
    position: Position,
}

#[derive(Debug, Deserialize)]
struct TimelineItem {
    tweet: TweetRef,
}

#[derive(Debug, Deserialize)]
struct TweetRef {
    id: WireId,
}

#[derive(Debug, Deserialize)]
struct Position {
    #[serde(default)]
    was_truncated: bool,
    min_position: Option<WireId>,
}

#[derive(Debug, Deserialize)]
struct AckEnvelope {
    #[serde(default)]
    response: Option<AckBody>,
}

#[derive(Debug, Deserialize)]
struct AckBody {
    #[serde(default)]
    errors: Vec<AckError>,
}

#[derive(Debug, Deserialize)]
struct AckError {
    reason: String,
}

#[derive(Debug, Deserialize)]
struct ErrorEnvelope {
    #[serde(default)]
    errors: Vec<ApiErrorItem>,
}

#[derive(Debug, Deserialize)]
struct ApiErrorItem {
    code: i64,
    #[serde(default)]
    message: String,
}

fn malformed(what: &str, err: impl std::fmt::Display) -> RotatorError {
    RotatorError::MalformedResponse {
        message: format!("{}: {}", what, err),
    }
}

/// Decode a `collections/entries` response into a page.
///
/// The next cursor is the page's `min_position`, which the caller sends back
/// as `max_position` to read the following page.
pub fn parse_entries_page(body: &[u8]) -> Result<Page, RotatorError> {
    let envelope: EntriesEnvelope =
        serde_json::from_slice(body).map_err(|e| malformed("collection entries", e))?;
    let body = envelope.response;

    let entries = body
        .timeline
        .iter()
        .map(|item| item.tweet.id.value().map(|id| Entry::new(PostId(id))))
        .collect::<Result<Vec<_>, _>>()?;

    if !body.position.was_truncated {
        return Ok(Page::last(entries));
    }

    let cursor = body
        .position
        .min_position
        .as_ref()
        .ok_or_else(|| RotatorError::MalformedResponse {
            message: "truncated page without min_position".to_string(),
        })?
        .value()?;

    Ok(Page::truncated(entries, TruncationCursor(cursor)))
}

/// Decode the acknowledgement of an add, remove or move.
///
/// An empty `errors` list means the change was applied. A `duplicate` reason
/// means the collection already was in the requested state. Anything else is
/// a rejection; multiple reasons are joined with commas.
pub fn parse_ack(body: &[u8]) -> Result<RemoteAck, RotatorError> {
    let raw: serde_json::Value =
        serde_json::from_slice(body).map_err(|e| malformed("write ack", e))?;
    let envelope: AckEnvelope =
        serde_json::from_value(raw.clone()).map_err(|e| malformed("write ack", e))?;

    let errors = envelope.response.map(|r| r.errors).unwrap_or_default();
    if errors.is_empty() {
        return Ok(RemoteAck::applied(raw));
    }

    if errors.iter().all(|e| e.reason == REASON_DUPLICATE) {
        return Ok(RemoteAck::already_applied(REASON_DUPLICATE, raw));
    }

    let reason = errors
        .iter()
        .map(|e| e.reason.as_str())
        .collect::<Vec<_>>()
        .join(",");
    Ok(RemoteAck::rejected(reason, raw))
}

/// Decode a `statuses/show` response.
pub fn parse_post(body: &[u8]) -> Result<PostRecord, RotatorError> {
    serde_json::from_slice(body).map_err(|e| malformed("post record", e))
}

/// Map a non-success response to an error.
///
/// `post` is the post the request was about, when there is one; it turns
/// codes 144 and 327 into their dedicated variants.
pub fn classify_error(
    status: u16,
    body: &[u8],
    endpoint: &str,
    post: Option<PostId>,
) -> RotatorError {
    let first = serde_json::from_slice::<ErrorEnvelope>(body)
        .ok()
        .and_then(|envelope| envelope.errors.into_iter().next());

    match (first, post) {
        (Some(item), Some(post_id)) if item.code == codes::ALREADY_RETWEETED => {
            RotatorError::AlreadyRetweeted { post_id }
        }
        (Some(item), Some(post_id)) if item.code == codes::NO_STATUS_FOUND => {
            RotatorError::PostNotFound { post_id }
        }
        (Some(item), _) if item.code == codes::RATE_LIMIT_EXCEEDED => {
            RotatorError::RateLimited {
                endpoint: endpoint.to_string(),
            }
        }
        (Some(item), _)
            if matches!(
                item.code,
                codes::COULD_NOT_AUTHENTICATE
                    | codes::INVALID_TOKEN
                    | codes::BAD_AUTHENTICATION_DATA
            ) =>
        {
            RotatorError::Unauthorised {
                message: item.message,
            }
        }
        (Some(_), _) | (None, _) if status == 401 => RotatorError::Unauthorised {
            message: String::from_utf8_lossy(body).into_owned(),
        },
        (None, _) if status == 429 => RotatorError::RateLimited {
            endpoint: endpoint.to_string(),
        },
        (Some(item), _) => RotatorError::Api {
            code: item.code,
            message: item.message,
        },
        (None, _) => RotatorError::Http {
            status,
            message: String::from_utf8_lossy(body).chars().take(200).collect(),
        },
    }
}

/// Query value identifying a collection
pub fn collection_param(collection: CollectionId) -> String {
    collection.timeline_id()
}
