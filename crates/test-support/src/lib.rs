//! In-process HTTP stub standing in for SW360 and `CouchDB` in tests.
//!
//! Every request is recorded (method, path, query, headers, Basic credentials, JSON body) so
//! tests can assert exactly which calls were made, or that none were. [`LogCapture`] collects
//! the `tracing` output of the code under test.

use anyhow::Context as _;
use axum::Router;
use axum::body::Bytes;
use axum::extract::State;
use axum::http::{HeaderMap, Method, StatusCode, Uri, header::AUTHORIZATION};
use base64::Engine as _;
use parking_lot::Mutex;
use serde_json::{Value, json};
use std::collections::HashMap;
use std::io;
use std::sync::Arc;
use tokio::net::TcpListener;
use tokio::sync::oneshot;

#[derive(Debug, Clone)]
pub struct RecordedRequest {
    pub method: String,
    pub path: String,
    pub query: Option<String>,
    /// Header names are lowercased.
    pub headers: HashMap<String, String>,
    pub basic_auth: Option<(String, String)>,
    pub body: Option<Value>,
}

impl RecordedRequest {
    #[must_use]
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .get(&name.to_ascii_lowercase())
            .map(String::as_str)
    }

    /// Decoded query parameters in request order.
    #[must_use]
    pub fn query_pairs(&self) -> Vec<(String, String)> {
        self.query
            .as_deref()
            .map(|q| {
                url::form_urlencoded::parse(q.as_bytes())
                    .into_owned()
                    .collect()
            })
            .unwrap_or_default()
    }
}

#[derive(Default)]
struct StubState {
    routes: Mutex<HashMap<(String, String), (u16, Value)>>,
    requests: Mutex<Vec<RecordedRequest>>,
}

/// A running stub server; shut down on drop.
pub struct StubServer {
    base_url: String,
    state: Arc<StubState>,
    shutdown: Option<oneshot::Sender<()>>,
}

impl StubServer {
    /// Bind an ephemeral localhost port and start serving.
    ///
    /// Unconfigured routes answer `404` with `{"error": "not_found"}`.
    ///
    /// # Errors
    ///
    /// Returns an error if the listener cannot be bound.
    pub async fn start() -> anyhow::Result<Self> {
        let state = Arc::new(StubState::default());
        let app = Router::new()
            .fallback(record_and_respond)
            .with_state(Arc::clone(&state));

        let listener = TcpListener::bind("127.0.0.1:0")
            .await
            .context("bind stub listener")?;
        let addr = listener.local_addr().context("stub local_addr")?;

        let (shutdown_tx, shutdown_rx) = oneshot::channel::<()>();
        tokio::spawn(async move {
            let _ = axum::serve(listener, app)
                .with_graceful_shutdown(async move {
                    let _ = shutdown_rx.await;
                })
                .await;
        });

        Ok(Self {
            base_url: format!("http://{addr}"),
            state,
            shutdown: Some(shutdown_tx),
        })
    }

    #[must_use]
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Answer `method` + `path` (e.g. `"GET"`, `"/authorization/client-management"`) with
    /// `status` and a JSON `body`. Later calls replace earlier ones.
    pub fn respond(&self, method: &str, path: &str, status: u16, body: Value) {
        self.state.routes.lock().insert(
            (method.to_ascii_uppercase(), path.to_string()),
            (status, body),
        );
    }

    #[must_use]
    pub fn requests(&self) -> Vec<RecordedRequest> {
        self.state.requests.lock().clone()
    }

    #[must_use]
    pub fn request_count(&self) -> usize {
        self.state.requests.lock().len()
    }
}

impl Drop for StubServer {
    fn drop(&mut self) {
        if let Some(tx) = self.shutdown.take() {
            let _ = tx.send(());
        }
    }
}

async fn record_and_respond(
    State(state): State<Arc<StubState>>,
    method: Method,
    uri: Uri,
    headers: HeaderMap,
    body: Bytes,
) -> (StatusCode, axum::Json<Value>) {
    let recorded = RecordedRequest {
        method: method.as_str().to_string(),
        path: uri.path().to_string(),
        query: uri.query().map(str::to_string),
        headers: headers
            .iter()
            .filter_map(|(name, value)| {
                value
                    .to_str()
                    .ok()
                    .map(|v| (name.as_str().to_string(), v.to_string()))
            })
            .collect(),
        basic_auth: headers
            .get(AUTHORIZATION)
            .and_then(|v| v.to_str().ok())
            .and_then(decode_basic),
        body: serde_json::from_slice(&body).ok(),
    };

    let key = (recorded.method.clone(), recorded.path.clone());
    state.requests.lock().push(recorded);

    let route = state.routes.lock().get(&key).cloned();
    match route {
        Some((status, body)) => (
            StatusCode::from_u16(status).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR),
            axum::Json(body),
        ),
        None => (
            StatusCode::NOT_FOUND,
            axum::Json(json!({"error": "not_found"})),
        ),
    }
}

/// In-memory sink for formatted `tracing` output.
///
/// [`LogCapture::install`] makes it the subscriber of the current thread until the guard drops,
/// which covers a `#[tokio::test]` on its default current-thread runtime.
#[derive(Clone, Default)]
pub struct LogCapture {
    buf: Arc<Mutex<Vec<u8>>>,
}

impl LogCapture {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Capture every event at any level, without ANSI colouring.
    #[must_use = "capturing stops when the guard is dropped"]
    pub fn install(&self) -> tracing::subscriber::DefaultGuard {
        let sink = self.clone();
        let subscriber = tracing_subscriber::fmt()
            .with_max_level(tracing::Level::TRACE)
            .with_ansi(false)
            .with_writer(move || sink.clone())
            .finish();
        tracing::subscriber::set_default(subscriber)
    }

    #[must_use]
    pub fn contents(&self) -> String {
        String::from_utf8_lossy(&self.buf.lock()).into_owned()
    }

    /// Captured lines logged at `level` (`"ERROR"`, `"INFO"`, ...).
    #[must_use]
    pub fn lines_at(&self, level: &str) -> Vec<String> {
        self.contents()
            .lines()
            .filter(|line| line.split_whitespace().any(|word| word == level))
            .map(str::to_string)
            .collect()
    }
}

impl io::Write for LogCapture {
    fn write(&mut self, bytes: &[u8]) -> io::Result<usize> {
        self.buf.lock().extend_from_slice(bytes);
        Ok(bytes.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

fn decode_basic(header: &str) -> Option<(String, String)> {
    let encoded = header.strip_prefix("Basic ")?;
    let decoded = base64::engine::general_purpose::STANDARD
        .decode(encoded)
        .ok()?;
    let text = String::from_utf8(decoded).ok()?;
    let (user, password) = text.split_once(':')?;
    Some((user.to_string(), password.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decode_basic_splits_on_first_colon() {
        // "client:pa:ss"
        assert_eq!(
            decode_basic("Basic Y2xpZW50OnBhOnNz"),
            Some(("client".to_string(), "pa:ss".to_string()))
        );
        assert_eq!(decode_basic("Bearer abc"), None);
    }

    #[test]
    fn log_capture_collects_events_by_level() {
        let logs = LogCapture::new();
        {
            let _guard = logs.install();
            tracing::error!("Error code: 500");
            tracing::info!(status = 200, "listed");
        }
        tracing::error!("after the guard");

        assert_eq!(logs.lines_at("ERROR").len(), 1);
        assert!(logs.lines_at("ERROR")[0].contains("Error code: 500"));
        assert!(logs.lines_at("INFO")[0].contains("status=200"));
        assert!(!logs.contents().contains("after the guard"));
    }
}
