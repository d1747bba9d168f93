//! Blocking HTTP implementation of `CollectionService`

use reqwest::blocking::Client;
use reqwest::Method;
use rotator_core::{
    CollectionId, CollectionService, Page, PostId, PostRecord, RemoteAck, RotatorError,
    TruncationCursor,
};

use crate::auth::SessionAuth;
use crate::config::ClientConfig;
use crate::events::EventSink;
use crate::rate_limit::{parse_headers, RateLimitGate};
use crate::wire;

mod endpoints {
    pub const ENTRIES: &str = "collections/entries";
    pub const ENTRIES_ADD: &str = "collections/entries/add";
    pub const ENTRIES_REMOVE: &str = "collections/entries/remove";
    pub const ENTRIES_MOVE: &str = "collections/entries/move";
    pub const STATUS_SHOW: &str = "statuses/show";
    pub const RETWEET: &str = "statuses/retweet";
    pub const UNRETWEET: &str = "statuses/unretweet";
}

/// One request to the remote service
struct Call {
    /// Rate-limit bucket; also used in logs and errors
    endpoint: &'static str,
    method: Method,
    /// Path relative to the base url, without the `.json` suffix
    path: String,
    query: Vec<(&'static str, String)>,
    /// Post the request is about, for error classification
    post: Option<PostId>,
}

impl Call {
    fn get(endpoint: &'static str) -> Self {
        Self {
            endpoint,
            method: Method::GET,
            path: endpoint.to_string(),
            query: Vec::new(),
            post: None,
        }
    }

    fn post(endpoint: &'static str) -> Self {
        Self {
            method: Method::POST,
            ..Self::get(endpoint)
        }
    }

    fn path(mut self, path: String) -> Self {
        self.path = path;
        self
    }

    fn param(mut self, key: &'static str, value: impl ToString) -> Self {
        self.query.push((key, value.to_string()));
        self
    }

    fn about(mut self, post: PostId) -> Self {
        self.post = Some(post);
        self
    }
}

pub struct HttpCollectionClient {
    http: Client,
    config: ClientConfig,
    auth: Box<dyn SessionAuth>,
    gate: RateLimitGate,
}

impl HttpCollectionClient {
    /// # Errors
    ///
    /// Returns `Transport` if the HTTP client cannot be constructed.
    pub fn new(config: ClientConfig, auth: Box<dyn SessionAuth>) -> Result<Self, RotatorError> {
        let mut builder = Client::builder().user_agent(config.user_agent.clone());
        if is_loopback(&config.base_url) {
            builder = builder.no_proxy();
        }
        let http = builder.build().map_err(|e| RotatorError::Transport {
            message: e.to_string(),
        })?;
        let gate = RateLimitGate::new(config.rate_limit, config.fallback_wait_secs);

        Ok(Self {
            http,
            config,
            auth,
            gate,
        })
    }

    /// Receive rate-limit events from this client
    pub fn with_event_sink(mut self, sink: EventSink) -> Self {
        self.gate = self.gate.with_event_sink(sink);
        self
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{}.json", self.config.base_url, path)
    }

    /// Issue a call, waiting out rate limits according to the policy.
    fn execute(&self, call: &Call) -> Result<Vec<u8>, RotatorError> {
        loop {
            self.gate.before_request(call.endpoint)?;

            let request = self
                .http
                .request(call.method.clone(), self.url(&call.path))
                .query(&call.query);
            let response = self
                .auth
                .authorize(request)
                .send()
                .map_err(|e| RotatorError::Transport {
                    message: format!("{}: {}", call.endpoint, e),
                })?;

            let status = response.status();
            let (remaining, reset_at) = parse_headers(response.headers());
            self.gate.tracker().record(call.endpoint, remaining, reset_at);

            let body = response
                .bytes()
                .map_err(|e| RotatorError::Transport {
                    message: format!("{}: {}", call.endpoint, e),
                })?
                .to_vec();

            tracing::debug!(
                endpoint = call.endpoint,
                status = status.as_u16(),
                remaining = ?remaining,
                "Remote call completed"
            );

            if status.is_success() {
                return Ok(body);
            }

            match wire::classify_error(status.as_u16(), &body, call.endpoint, call.post) {
                RotatorError::RateLimited { .. } => {
                    self.gate.on_limited(call.endpoint, reset_at)?;
                }
                err => return Err(err),
            }
        }
    }
}

fn is_loopback(base_url: &str) -> bool {
    reqwest::Url::parse(base_url)
        .ok()
        .and_then(|url| url.host_str().map(|h| h == "localhost" || h == "127.0.0.1"))
        .unwrap_or(false)
}

impl CollectionService for HttpCollectionClient {
    fn fetch_page(
        &self,
        collection: CollectionId,
        cursor: Option<TruncationCursor>,
        page_size: usize,
    ) -> Result<Page, RotatorError> {
        let mut call = Call::get(endpoints::ENTRIES)
            .param("id", wire::collection_param(collection))
            .param("count", page_size);
        if let Some(cursor) = cursor {
            call = call.param("max_position", cursor.0);
        }

        let body = self.execute(&call)?;
        wire::parse_entries_page(&body)
    }

    fn add_entry(&self, collection: CollectionId, post: PostId) -> Result<RemoteAck, RotatorError> {
        let call = Call::post(endpoints::ENTRIES_ADD)
            .param("id", wire::collection_param(collection))
            .param("tweet_id", post)
            .about(post);
        wire::parse_ack(&self.execute(&call)?)
    }

    fn remove_entry(
        &self,
        collection: CollectionId,
        post: PostId,
    ) -> Result<RemoteAck, RotatorError> {
        let call = Call::post(endpoints::ENTRIES_REMOVE)
            .param("id", wire::collection_param(collection))
            .param("tweet_id", post)
            .about(post);
        wire::parse_ack(&self.execute(&call)?)
    }

    fn reposition(
        &self,
        collection: CollectionId,
        post: PostId,
        relative_to: PostId,
    ) -> Result<RemoteAck, RotatorError> {
        let call = Call::post(endpoints::ENTRIES_MOVE)
            .param("id", wire::collection_param(collection))
            .param("tweet_id", post)
            .param("relative_to", relative_to)
            .about(post);
        wire::parse_ack(&self.execute(&call)?)
    }

    fn fetch_post(&self, post: PostId) -> Result<PostRecord, RotatorError> {
        let call = Call::get(endpoints::STATUS_SHOW)
            .param("id", post)
            .param("include_my_retweet", "true")
            .about(post);
        wire::parse_post(&self.execute(&call)?)
    }

    fn retweet(&self, post: PostId) -> Result<(), RotatorError> {
        let call = Call::post(endpoints::RETWEET)
            .path(format!("{}/{}", endpoints::RETWEET, post))
            .about(post);
        self.execute(&call).map(|_| ())
    }

    fn unretweet(&self, post: PostId) -> Result<(), RotatorError> {
        let call = Call::post(endpoints::UNRETWEET)
            .path(format!("{}/{}", endpoints::UNRETWEET, post))
            .about(post);
        self.execute(&call).map(|_| ())
    }
}
