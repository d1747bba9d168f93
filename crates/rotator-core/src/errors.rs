use rotator_core_types::RequestId;
use thiserror::Error;

use crate::model::{CollectionId, PostId};

/// Result type alias using RotatorError
pub type Result<T> = std::result::Result<T, RotatorError>;

// ========== Error Facility ==========

/// Canonical error kind taxonomy
///
/// Each kind maps to a stable error code used in log events, CLI output and
/// test assertions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExErrorKind {
    // Input/validation
    InvalidInput,
    Configuration,

    // Remote semantic failures
    NotFound,
    AlreadyRetweeted,
    AckRejected,
    CollectionTooSmall,

    // Remote transport/protocol
    RateLimited,
    Unauthorised,
    ExternalService,
    MalformedResponse,
    Transport,

    // Local IO
    Io,
    Serialization,
    Persistence,

    // Internal
    Internal,
}

impl ExErrorKind {
    /// Get the stable error code for this kind
    pub fn code(&self) -> &'static str {
        match self {
            ExErrorKind::InvalidInput => "ERR_INVALID_INPUT",
            ExErrorKind::Configuration => "ERR_CONFIGURATION",
            ExErrorKind::NotFound => "ERR_NOT_FOUND",
            ExErrorKind::AlreadyRetweeted => "ERR_ALREADY_RETWEETED",
            ExErrorKind::AckRejected => "ERR_ACK_REJECTED",
            ExErrorKind::CollectionTooSmall => "ERR_COLLECTION_TOO_SMALL",
            ExErrorKind::RateLimited => "ERR_RATE_LIMITED",
            ExErrorKind::Unauthorised => "ERR_UNAUTHORISED",
            ExErrorKind::ExternalService => "ERR_EXTERNAL_SERVICE",
            ExErrorKind::MalformedResponse => "ERR_MALFORMED_RESPONSE",
            ExErrorKind::Transport => "ERR_TRANSPORT",
            ExErrorKind::Io => "ERR_IO",
            ExErrorKind::Serialization => "ERR_SERIALIZATION",
            ExErrorKind::Persistence => "ERR_PERSISTENCE",
            ExErrorKind::Internal => "ERR_INTERNAL",
        }
    }
}

/// Canonical structured error type
///
/// Carries a classification for programmatic handling plus the collection,
/// post and request the failure belongs to.
#[derive(Debug, Clone)]
pub struct ExError {
    kind: ExErrorKind,
    op: Option<String>,
    collection_id: Option<CollectionId>,
    post_id: Option<PostId>,
    request_id: Option<RequestId>,
    message: String,
    source: Option<Box<ExError>>,
}

impl ExError {
    /// Create a new error with the specified kind
    pub fn new(kind: ExErrorKind) -> Self {
        Self {
            kind,
            op: None,
            collection_id: None,
            post_id: None,
            request_id: None,
            message: String::new(),
            source: None,
        }
    }

    /// Add operation context
    pub fn with_op(mut self, op: impl Into<String>) -> Self {
        self.op = Some(op.into());
        self
    }

    /// Add collection context
    pub fn with_collection_id(mut self, id: CollectionId) -> Self {
        self.collection_id = Some(id);
        self
    }

    /// Add post context
    pub fn with_post_id(mut self, id: PostId) -> Self {
        self.post_id = Some(id);
        self
    }

    /// Add request ID context
    pub fn with_request_id(mut self, request_id: RequestId) -> Self {
        self.request_id = Some(request_id);
        self
    }

    /// Add custom message
    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.message = message.into();
        self
    }

    /// Add source error
    pub fn with_source(mut self, source: ExError) -> Self {
        self.source = Some(Box::new(source));
        self
    }

    pub fn kind(&self) -> ExErrorKind {
        self.kind
    }

    pub fn code(&self) -> &'static str {
        self.kind.code()
    }

    pub fn op(&self) -> Option<&str> {
        self.op.as_deref()
    }

    pub fn collection_id(&self) -> Option<CollectionId> {
        self.collection_id
    }

    pub fn post_id(&self) -> Option<PostId> {
        self.post_id
    }

    pub fn request_id(&self) -> Option<&RequestId> {
        self.request_id.as_ref()
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub fn source_error(&self) -> Option<&ExError> {
        self.source.as_deref()
    }
}

impl std::fmt::Display for ExError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[{}]", self.code())?;
        if let Some(op) = &self.op {
            write!(f, " in operation '{}'", op)?;
        }
        if !self.message.is_empty() {
            write!(f, ": {}", self.message)?;
        }
        if let Some(collection_id) = self.collection_id {
            write!(f, " (collection_id: {})", collection_id)?;
        }
        if let Some(post_id) = self.post_id {
            write!(f, " (post_id: {})", post_id)?;
        }
        if let Some(source) = &self.source {
            write!(f, " caused by {}", source)?;
        }
        Ok(())
    }
}

impl std::error::Error for ExError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        self.source
            .as_deref()
            .map(|s| s as &(dyn std::error::Error + 'static))
    }
}

// ========== End Error Facility ==========

/// Domain error taxonomy for remote and local operations
#[derive(Error, Debug, Clone, PartialEq)]
pub enum RotatorError {
    // ===== Remote semantic errors =====
    /// The post is already retweeted by the authenticated account
    #[error("Post already retweeted: {post_id}")]
    AlreadyRetweeted { post_id: PostId },

    /// The post does not exist or is not visible to the account
    #[error("Post not found: {post_id}")]
    PostNotFound { post_id: PostId },

    /// The collection holds too few entries for the requested operation
    #[error("Collection {collection_id} has {len} entries, need more than {required}")]
    CollectionTooSmall {
        collection_id: CollectionId,
        len: usize,
        required: usize,
    },

    /// A write was acknowledged as rejected by the remote service
    #[error("{op} of post {post_id} in collection {collection_id} rejected: {reason}")]
    AckRejected {
        op: String,
        collection_id: CollectionId,
        post_id: PostId,
        reason: String,
    },

    /// Remote API error body that maps to no more specific variant
    #[error("Remote API error {code}: {message}")]
    Api { code: i64, message: String },

    // ===== Remote transport errors =====
    /// Rate limit hit and the client is configured not to wait
    #[error("Rate limited on {endpoint}")]
    RateLimited { endpoint: String },

    /// Credentials rejected
    #[error("Unauthorised: {message}")]
    Unauthorised { message: String },

    /// Non-success HTTP status without a recognised error body
    #[error("HTTP {status}: {message}")]
    Http { status: u16, message: String },

    /// Network-level failure
    #[error("Transport failure: {message}")]
    Transport { message: String },

    /// Response body did not have the documented shape
    #[error("Malformed response: {message}")]
    MalformedResponse { message: String },

    // ===== Configuration errors =====
    /// A required configuration value is absent
    #[error("Missing configuration: {key}")]
    MissingConfiguration { key: String },

    /// A configuration value is present but unusable
    #[error("Invalid configuration for {key}: {reason}")]
    InvalidConfiguration { key: String, reason: String },

    // ===== Local errors =====
    #[error("Serialization error: {message}")]
    Serialization { message: String },

    #[error("IO error during {op}: {message}")]
    Io { op: String, message: String },

    #[error("Internal error: {message}")]
    Internal { message: String },
}

impl RotatorError {
    /// Whether this is a semantic rejection by the remote service for one
    /// specific post, as opposed to a transport or local failure.
    pub fn is_semantic(&self) -> bool {
        matches!(
            self,
            RotatorError::AlreadyRetweeted { .. }
                | RotatorError::PostNotFound { .. }
                | RotatorError::AckRejected { .. }
                | RotatorError::Api { .. }
        )
    }

    /// Whether this error stems from configuration and must not be retried
    pub fn is_fatal_configuration(&self) -> bool {
        matches!(
            self,
            RotatorError::MissingConfiguration { .. } | RotatorError::InvalidConfiguration { .. }
        )
    }
}

/// Conversion from RotatorError to ExError
impl From<RotatorError> for ExError {
    fn from(err: RotatorError) -> Self {
        match err {
            RotatorError::AlreadyRetweeted { post_id } => {
                ExError::new(ExErrorKind::AlreadyRetweeted)
                    .with_post_id(post_id)
                    .with_message("Post already retweeted")
            }

            RotatorError::PostNotFound { post_id } => ExError::new(ExErrorKind::NotFound)
                .with_post_id(post_id)
                .with_message("Post not found"),

            RotatorError::CollectionTooSmall {
                collection_id,
                len,
                required,
            } => ExError::new(ExErrorKind::CollectionTooSmall)
                .with_collection_id(collection_id)
                .with_message(format!(
                    "Collection has {} entries, need more than {}",
                    len, required
                )),

            RotatorError::AckRejected {
                op,
                collection_id,
                post_id,
                reason,
            } => ExError::new(ExErrorKind::AckRejected)
                .with_op(op)
                .with_collection_id(collection_id)
                .with_post_id(post_id)
                .with_message(reason),

            RotatorError::Api { code, message } => ExError::new(ExErrorKind::ExternalService)
                .with_message(format!("API error {}: {}", code, message)),

            RotatorError::RateLimited { endpoint } => ExError::new(ExErrorKind::RateLimited)
                .with_message(format!("Rate limited on {}", endpoint)),

            RotatorError::Unauthorised { message } => {
                ExError::new(ExErrorKind::Unauthorised).with_message(message)
            }

            RotatorError::Http { status, message } => ExError::new(ExErrorKind::ExternalService)
                .with_message(format!("HTTP {}: {}", status, message)),

            RotatorError::Transport { message } => {
                ExError::new(ExErrorKind::Transport).with_message(message)
            }

            RotatorError::MalformedResponse { message } => {
                ExError::new(ExErrorKind::MalformedResponse).with_message(message)
            }

            RotatorError::MissingConfiguration { key } => {
                ExError::new(ExErrorKind::Configuration)
                    .with_op("load_config")
                    .with_message(format!("Missing required value: {}", key))
            }

            RotatorError::InvalidConfiguration { key, reason } => {
                ExError::new(ExErrorKind::Configuration)
                    .with_op("load_config")
                    .with_message(format!("Invalid value for {}: {}", key, reason))
            }

            RotatorError::Serialization { message } => {
                ExError::new(ExErrorKind::Serialization).with_message(message)
            }

            RotatorError::Io { op, message } => ExError::new(ExErrorKind::Io)
                .with_op(op)
                .with_message(message),

            RotatorError::Internal { message } => {
                ExError::new(ExErrorKind::Internal).with_message(message)
            }
        }
    }
}

/// Conversion from serde_json::Error to RotatorError
impl From<serde_json::Error> for RotatorError {
    fn from(err: serde_json::Error) -> Self {
        RotatorError::Serialization {
            message: err.to_string(),
        }
    }
}
