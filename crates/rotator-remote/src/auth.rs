//! Request signing
//!
//! Credential acquisition happens outside this crate. A `SessionAuth` is
//! handed an outgoing request and attaches whatever the authenticated
//! session needs.

use reqwest::blocking::RequestBuilder;
use rotator_core_types::Sensitive;

pub trait SessionAuth: Send + Sync {
    fn authorize(&self, request: RequestBuilder) -> RequestBuilder;
}

/// User-context bearer token
#[derive(Debug, Clone)]
pub struct BearerSession {
    token: Sensitive<String>,
}

impl BearerSession {
    pub fn new(token: Sensitive<String>) -> Self {
        Self { token }
    }
}

impl SessionAuth for BearerSession {
    fn authorize(&self, request: RequestBuilder) -> RequestBuilder {
        request.bearer_auth(self.token.expose())
    }
}
