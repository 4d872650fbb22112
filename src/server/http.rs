//! HTTP server implementation
//!
//! Uses hyper http1 with TokioIo for async handling.

use bytes::Bytes;
use http_body_util::{BodyExt, Full};
use hyper::body::Incoming;
use hyper::server::conn::http1;
use hyper::service::service_fn;
use hyper::{Method, Request, Response, StatusCode};
use hyper_util::rt::TokioIo;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpListener;
use tracing::{debug, error, info};

use crate::config::Args;
use crate::model::CacheEnvelope;
use crate::routes;
use crate::sync::{ChangeWatcher, Synchronizer};
use crate::types::SyncError;

type BoxBody = http_body_util::combinators::BoxBody<Bytes, hyper::Error>;

/// Shared application state
pub struct AppState {
    pub args: Args,
    /// Store, loader, fanout and writer
    pub sync: Arc<Synchronizer>,
}

impl AppState {
    pub fn new(args: Args, sync: Arc<Synchronizer>) -> Self {
        Self { args, sync }
    }

    /// Current generation, refetched first if a remote envelope went stale
    pub async fn snapshot(&self) -> Arc<CacheEnvelope> {
        self.sync.ensure_fresh().await;
        self.sync.store().snapshot().await
    }
}

/// Load the initial data, start background tasks and serve until the
/// listener fails
pub async fn run(state: Arc<AppState>) -> Result<(), SyncError> {
    let summary = state.sync.reload(crate::sync::fanout::EVENT_REFRESH).await;
    info!(
        initiatives = summary.initiatives_count,
        events = summary.events_count,
        "Initial load complete"
    );

    // Kept alive for the lifetime of the server
    let _watcher: Option<ChangeWatcher> = match state.sync.watch(state.args.watch_debounce()) {
        Ok(watcher) => watcher,
        Err(e) => {
            error!(error = %e, "Failed to start workbook watcher; live reload disabled");
            None
        }
    };
    let _heartbeat = state.sync.hub().spawn_heartbeat(state.args.heartbeat_interval());

    let listener = TcpListener::bind(state.args.listen).await?;
    info!("SAAP sync listening on {}", state.args.listen);

    loop {
        match listener.accept().await {
            Ok((stream, addr)) => {
                let state = Arc::clone(&state);
                tokio::spawn(async move {
                    let io = TokioIo::new(stream);

                    let service = service_fn(move |req| {
                        let state = Arc::clone(&state);
                        async move { handle_request(state, addr, req).await }
                    });

                    if let Err(err) = http1::Builder::new()
                        .serve_connection(io, service)
                        .await
                    {
                        debug!("Error serving connection from {}: {:?}", addr, err);
                    }
                });
            }
            Err(e) => {
                error!("Error accepting connection: {:?}", e);
            }
        }
    }
}

/// Route incoming HTTP requests
async fn handle_request(
    state: Arc<AppState>,
    addr: SocketAddr,
    req: Request<Incoming>,
) -> Result<Response<BoxBody>, hyper::Error> {
    let method = req.method().clone();
    let path = req.uri().path().to_string();
    let query = req.uri().query().map(str::to_string);

    info!("[{}] {} {}", addr, method, path);

    let body = if method == Method::PUT || method == Method::POST {
        req.into_body().collect().await?.to_bytes()
    } else {
        Bytes::new()
    };

    Ok(route(&state, &method, &path, query.as_deref(), &body).await)
}

/// Dispatch a request whose body has already been read
async fn route(
    state: &AppState,
    method: &Method,
    path: &str,
    query: Option<&str>,
    body: &[u8],
) -> Response<BoxBody> {
    let segments: Vec<&str> = path.trim_matches('/').split('/').collect();

    let response = match (method, segments.as_slice()) {
        (&Method::OPTIONS, _) => preflight_response(),

        (&Method::GET, ["api", "health"]) => routes::health_check(),

        // Initiatives
        (&Method::GET, ["api", "initiatives"]) => routes::list_initiatives(state, query).await,
        (&Method::GET, ["api", "initiatives", id]) => routes::get_initiative(state, id).await,
        (&Method::PUT, ["api", "initiatives", id]) => {
            routes::update_initiative(state, id, body).await
        }
        (&Method::PUT, ["api", "initiatives", id, "status"]) => {
            routes::update_initiative_status(state, id, body).await
        }

        // Events
        (&Method::GET, ["api", "events"]) => routes::list_events(state, query).await,
        (&Method::GET, ["api", "events", id]) => routes::get_event(state, id).await,
        (&Method::PUT, ["api", "events", id]) => routes::update_event(state, id, body).await,

        (&Method::GET, ["api", "dashboard", "stats"]) => routes::dashboard_stats(state).await,

        // Sync
        (&Method::GET, ["api", "sync", "stream"]) => {
            return match routes::sync_stream(state) {
                Some(stream) => stream.map(|body| body.map_err(|never| match never {}).boxed()),
                None => to_boxed(not_found_response(path)),
            };
        }
        (&Method::POST, ["api", "sync", "refresh"]) => routes::sync_refresh(state).await,
        (&Method::GET, ["api", "sync", "status"]) => routes::sync_status(state).await,

        _ => not_found_response(path),
    };

    to_boxed(response)
}

/// Convert a Full<Bytes> body to BoxBody
fn to_boxed(response: Response<Full<Bytes>>) -> Response<BoxBody> {
    response.map(|body| body.map_err(|never| match never {}).boxed())
}

/// CORS preflight response
fn preflight_response() -> Response<Full<Bytes>> {
    Response::builder()
        .status(StatusCode::OK)
        .header("Access-Control-Allow-Origin", "*")
        .header("Access-Control-Allow-Headers", "*")
        .header("Access-Control-Allow-Methods", "GET, POST, PUT, OPTIONS")
        .body(Full::new(Bytes::new()))
        .unwrap()
}

/// Not found response
fn not_found_response(path: &str) -> Response<Full<Bytes>> {
    let body = serde_json::json!({
        "success": false,
        "message": "Not Found",
        "path": path,
    });

    Response::builder()
        .status(StatusCode::NOT_FOUND)
        .header("Content-Type", "application/json")
        .header("Access-Control-Allow-Origin", "*")
        .body(Full::new(Bytes::from(body.to_string())))
        .unwrap()
}
