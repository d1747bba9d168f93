use serde::{Deserialize, Serialize};

use crate::errors::RotatorError;
use crate::model::{CollectionId, PostId};

/// What the remote service reported for a single write
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum AckOutcome {
    /// The change was applied
    Applied,
    /// The collection was already in the requested state (e.g. duplicate add)
    AlreadyApplied { reason: String },
    /// The change was refused
    Rejected { reason: String },
}

/// Acknowledgement of a collection write (add, remove, reposition)
///
/// The remote protocol reports write failures inside a successful response
/// body, so callers must branch on `outcome` instead of relying on an error.
#[derive(Debug, Clone, PartialEq)]
pub struct RemoteAck {
    pub outcome: AckOutcome,
    /// Response body as received
    pub raw: serde_json::Value,
}

impl RemoteAck {
    pub fn applied(raw: serde_json::Value) -> Self {
        Self {
            outcome: AckOutcome::Applied,
            raw,
        }
    }

    pub fn already_applied(reason: impl Into<String>, raw: serde_json::Value) -> Self {
        Self {
            outcome: AckOutcome::AlreadyApplied {
                reason: reason.into(),
            },
            raw,
        }
    }

    pub fn rejected(reason: impl Into<String>, raw: serde_json::Value) -> Self {
        Self {
            outcome: AckOutcome::Rejected {
                reason: reason.into(),
            },
            raw,
        }
    }

    /// Applied or already applied
    pub fn is_success(&self) -> bool {
        !matches!(self.outcome, AckOutcome::Rejected { .. })
    }

    pub fn rejection_reason(&self) -> Option<&str> {
        match &self.outcome {
            AckOutcome::Rejected { reason } => Some(reason),
            _ => None,
        }
    }

    /// Turn a rejected ack into an `AckRejected` error
    pub fn into_result(
        self,
        op: &str,
        collection_id: CollectionId,
        post_id: PostId,
    ) -> Result<Self, RotatorError> {
        match self.outcome {
            AckOutcome::Rejected { reason } => Err(RotatorError::AckRejected {
                op: op.to_string(),
                collection_id,
                post_id,
                reason,
            }),
            _ => Ok(self),
        }
    }
}
