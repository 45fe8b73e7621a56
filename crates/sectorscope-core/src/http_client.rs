use std::collections::{BTreeMap, VecDeque};
use std::fmt::{Display, Formatter};
use std::future::Future;
use std::pin::Pin;
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

/// Boxed future returned by [`HttpClient::execute`].
pub type HttpFuture<'a> = Pin<Box<dyn Future<Output = Result<HttpResponse, HttpError>> + Send + 'a>>;

/// GET request issued against the screener backend.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpRequest {
    pub url: String,
    pub headers: BTreeMap<String, String>,
    pub timeout_ms: u64,
}

impl HttpRequest {
    pub fn get(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            headers: BTreeMap::from([(String::from("accept"), String::from("application/json"))]),
            timeout_ms: 10_000,
        }
    }

    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers
            .insert(name.into().to_ascii_lowercase(), value.into());
        self
    }

    pub fn with_timeout_ms(mut self, timeout_ms: u64) -> Self {
        self.timeout_ms = timeout_ms;
        self
    }

    /// URL without its query string.
    pub fn path(&self) -> &str {
        self.url
            .split_once('?')
            .map_or(self.url.as_str(), |(path, _)| path)
    }
}

/// Status and body returned by a transport.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpResponse {
    pub status: u16,
    pub body: String,
}

impl HttpResponse {
    pub fn new(status: u16, body: impl Into<String>) -> Self {
        Self {
            status,
            body: body.into(),
        }
    }

    pub fn ok_json(body: impl Into<String>) -> Self {
        Self::new(200, body)
    }

    pub const fn is_success(&self) -> bool {
        self.status >= 200 && self.status < 300
    }
}

/// Why a request produced no response.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HttpErrorKind {
    /// The backend could not be reached.
    Connect,
    Timeout,
    /// A response started but its body could not be read.
    Body,
    Other,
}

/// Transport-level HTTP error.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpError {
    kind: HttpErrorKind,
    message: String,
}

impl HttpError {
    pub fn new(kind: HttpErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }

    pub fn connect(message: impl Into<String>) -> Self {
        Self::new(HttpErrorKind::Connect, message)
    }

    pub fn timeout(message: impl Into<String>) -> Self {
        Self::new(HttpErrorKind::Timeout, message)
    }

    pub fn kind(&self) -> HttpErrorKind {
        self.kind
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    /// True when no server answered at all.
    pub const fn is_unreachable(&self) -> bool {
        matches!(self.kind, HttpErrorKind::Connect | HttpErrorKind::Timeout)
    }
}

impl Display for HttpError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.message)
    }
}

impl std::error::Error for HttpError {}

/// Transport contract used by the REST client.
pub trait HttpClient: Send + Sync {
    fn execute<'a>(&'a self, request: HttpRequest) -> HttpFuture<'a>;
}

/// Production transport backed by reqwest.
#[derive(Debug, Clone)]
pub struct ReqwestHttpClient {
    client: Arc<reqwest::Client>,
}

impl ReqwestHttpClient {
    pub fn new() -> Self {
        Self {
            client: Arc::new(
                reqwest::Client::builder()
                    .user_agent(concat!("sectorscope/", env!("CARGO_PKG_VERSION")))
                    .build()
                    .unwrap_or_else(|_| reqwest::Client::new()),
            ),
        }
    }

    pub fn with_client(client: reqwest::Client) -> Self {
        Self {
            client: Arc::new(client),
        }
    }
}

impl Default for ReqwestHttpClient {
    fn default() -> Self {
        Self::new()
    }
}

impl HttpClient for ReqwestHttpClient {
    fn execute<'a>(&'a self, request: HttpRequest) -> HttpFuture<'a> {
        Box::pin(async move {
            let mut builder = self
                .client
                .get(&request.url)
                .timeout(Duration::from_millis(request.timeout_ms));

            for (name, value) in &request.headers {
                builder = builder.header(name, value);
            }

            let response = builder.send().await.map_err(|e| {
                if e.is_timeout() {
                    HttpError::timeout(format!("request timeout: {e}"))
                } else if e.is_connect() {
                    HttpError::connect(format!("connection failed: {e}"))
                } else {
                    HttpError::new(HttpErrorKind::Other, format!("request failed: {e}"))
                }
            })?;

            let status = response.status().as_u16();
            let body = response.text().await.map_err(|e| {
                HttpError::new(
                    HttpErrorKind::Body,
                    format!("failed to read response body: {e}"),
                )
            })?;

            Ok(HttpResponse { status, body })
        })
    }
}

/// One scripted reply, optionally delayed.
#[derive(Debug, Clone)]
pub struct ScriptedReply {
    outcome: Result<HttpResponse, HttpError>,
    delay: Duration,
}

impl ScriptedReply {
    pub fn json(status: u16, body: impl Into<String>) -> Self {
        Self {
            outcome: Ok(HttpResponse::new(status, body)),
            delay: Duration::ZERO,
        }
    }

    pub fn error(error: HttpError) -> Self {
        Self {
            outcome: Err(error),
            delay: Duration::ZERO,
        }
    }

    pub fn delayed(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }
}

#[derive(Debug)]
struct ScriptedRoute {
    path_suffix: String,
    queued: VecDeque<ScriptedReply>,
    fallback: Option<ScriptedReply>,
}

#[derive(Debug, Default)]
struct ScriptState {
    routes: Vec<ScriptedRoute>,
    requests: Vec<HttpRequest>,
}

/// In-process transport answering from a script, for offline runs and tests.
///
/// Routes match when the request path ends with the registered suffix.
/// Queued replies are consumed first, then the route's fixed reply is
/// repeated. Unmatched requests get a 404.
#[derive(Debug, Clone, Default)]
pub struct ScriptedHttpClient {
    state: Arc<Mutex<ScriptState>>,
}

impl ScriptedHttpClient {
    pub fn new() -> Self {
        Self::default()
    }

    /// Always answers `path_suffix` with `reply`.
    pub fn route(self, path_suffix: &str, reply: ScriptedReply) -> Self {
        self.with_route(path_suffix, |route| route.fallback = Some(reply));
        self
    }

    /// Answers the next request to `path_suffix` with `reply`.
    pub fn enqueue(&self, path_suffix: &str, reply: ScriptedReply) {
        self.with_route(path_suffix, |route| route.queued.push_back(reply));
    }

    /// Every request seen so far, in arrival order.
    pub fn requests(&self) -> Vec<HttpRequest> {
        self.lock().requests.clone()
    }

    /// Number of requests whose path ends with `path_suffix`.
    pub fn request_count(&self, path_suffix: &str) -> usize {
        self.lock()
            .requests
            .iter()
            .filter(|request| request.path().ends_with(path_suffix))
            .count()
    }

    fn lock(&self) -> MutexGuard<'_, ScriptState> {
        self.state
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn with_route(&self, path_suffix: &str, update: impl FnOnce(&mut ScriptedRoute)) {
        let mut state = self.lock();
        let index = match state
            .routes
            .iter()
            .position(|route| route.path_suffix == path_suffix)
        {
            Some(index) => index,
            None => {
                state.routes.push(ScriptedRoute {
                    path_suffix: path_suffix.to_owned(),
                    queued: VecDeque::new(),
                    fallback: None,
                });
                state.routes.len() - 1
            }
        };
        update(&mut state.routes[index]);
    }

    fn next_reply(&self, request: &HttpRequest) -> ScriptedReply {
        let mut state = self.lock();
        state.requests.push(request.clone());
        let path = request.path().to_owned();
        state
            .routes
            .iter_mut()
            .filter(|route| path.ends_with(&route.path_suffix))
            .max_by_key(|route| route.path_suffix.len())
            .and_then(|route| route.queued.pop_front().or_else(|| route.fallback.clone()))
            .unwrap_or_else(|| ScriptedReply::json(404, r#"{"detail": "Not found."}"#))
    }
}

impl HttpClient for ScriptedHttpClient {
    fn execute<'a>(&'a self, request: HttpRequest) -> HttpFuture<'a> {
        let reply = self.next_reply(&request);
        Box::pin(async move {
            if !reply.delay.is_zero() {
                tokio::time::sleep(reply.delay).await;
            }
            reply.outcome
        })
    }
}
