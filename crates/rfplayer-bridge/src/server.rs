//! HTTP surface.
//!
//! | Path          | Method    | Device command           |
//! |---------------|-----------|--------------------------|
//! | `/v1/read`    | any       | none, drain only         |
//! | `/v1/command` | POST      | order from the JSON body |
//! | `/v1/ping`    | any       | `PING`                   |
//! | `/v1/status`  | any       | `STATUS SYSTEM JSON`     |
//!
//! Replies are returned verbatim with the `ZIA--` prefix removed.

use std::future::Future;
use std::time::Duration;

use axum::{
    body::Bytes,
    extract::State,
    http::{header, StatusCode, Uri},
    response::{IntoResponse, Response},
    routing::{any, post},
    Router,
};
use axum_server::tls_rustls::RustlsConfig;
use rfplayer_metrics::{metric_defs, request_labels};
use rfplayer_protocol::{Command, Order, ProtocolError, Reply};
use tower_http::trace::TraceLayer;
use tracing::{info, warn};

use crate::config::HttpConfig;
use crate::error::{BridgeError, BridgeResult};
use crate::worker::SerialHandle;

/// How long in-flight requests get to finish on shutdown.
const SHUTDOWN_GRACE: Duration = Duration::from_secs(5);

/// Message for orders missing a required field.
pub const MISSING_FIELD_MESSAGE: &str = "Missing JSON field order, address or protocol";

/// State shared by all handlers.
#[derive(Clone)]
pub struct AppState {
    serial: SerialHandle,
}

/// Build the router.
pub fn router(serial: SerialHandle) -> Router {
    Router::new()
        .route("/v1/read", any(read))
        .route("/v1/command", post(command).fallback(method_not_allowed))
        .route("/v1/ping", any(ping))
        .route("/v1/status", any(status))
        .fallback(not_found)
        .with_state(AppState { serial })
        .layer(TraceLayer::new_for_http())
}

// ============================================================================
// Handlers
// ============================================================================

async fn read(State(state): State<AppState>, uri: Uri) -> Response {
    let result = state.serial.read().await;
    finish("read", &uri, result)
}

async fn command(State(state): State<AppState>, uri: Uri, body: Bytes) -> Response {
    let result = match parse_order(&body) {
        Ok(order) => state.serial.send(Command::Order(order)).await,
        Err(e) => {
            metrics::counter!(metric_defs::ORDERS_REJECTED.name).increment(1);
            Err(e)
        }
    };
    finish("command", &uri, result)
}

async fn ping(State(state): State<AppState>, uri: Uri) -> Response {
    let result = state.serial.send(Command::Ping).await;
    finish("ping", &uri, result)
}

async fn status(State(state): State<AppState>, uri: Uri) -> Response {
    let result = state.serial.send(Command::Status).await;
    finish("status", &uri, result)
}

async fn method_not_allowed(uri: Uri) -> Response {
    record("command", &uri, StatusCode::METHOD_NOT_ALLOWED);
    (
        StatusCode::METHOD_NOT_ALLOWED,
        [(header::ALLOW, "POST")],
        "method not allowed",
    )
        .into_response()
}

async fn not_found(uri: Uri) -> Response {
    record("unknown", &uri, StatusCode::NOT_FOUND);
    (StatusCode::NOT_FOUND, "404 page not found").into_response()
}

/// Decode and validate an order. Nothing is sent to the device here.
fn parse_order(body: &[u8]) -> BridgeResult<Order> {
    let order: Order =
        serde_json::from_slice(body).map_err(|e| BridgeError::BadRequest(e.to_string()))?;
    order.validate()?;
    Ok(order)
}

/// Turn an exchange result into a response, logging and counting it.
fn finish(operation: &'static str, uri: &Uri, result: BridgeResult<Reply>) -> Response {
    match result {
        Ok(reply) => {
            info!(
                path = %uri.path(),
                body = %String::from_utf8_lossy(reply.as_bytes()),
                "reply"
            );
            record(operation, uri, StatusCode::OK);
            reply_response(reply)
        }
        Err(e) => {
            let response = e.into_response();
            record(operation, uri, response.status());
            response
        }
    }
}

fn record(operation: &'static str, uri: &Uri, status: StatusCode) {
    if !status.is_success() {
        warn!(path = %uri.path(), status = status.as_u16(), "request failed");
    }
    metrics::counter!(
        metric_defs::HTTP_REQUESTS.name,
        &request_labels(operation, status.as_u16())
    )
    .increment(1);
}

fn reply_response(reply: Reply) -> Response {
    let content_type = reply.content_type();
    (
        StatusCode::OK,
        [(header::CONTENT_TYPE, content_type)],
        reply.into_bytes(),
    )
        .into_response()
}

impl IntoResponse for BridgeError {
    fn into_response(self) -> Response {
        let status = match &self {
            BridgeError::Validation(_) => StatusCode::NOT_ACCEPTABLE,
            BridgeError::BadRequest(_) => StatusCode::BAD_REQUEST,
            BridgeError::Transport(_) | BridgeError::LinkDown => StatusCode::SERVICE_UNAVAILABLE,
            BridgeError::Config(_) | BridgeError::ConfigFile(_) | BridgeError::Io(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        };
        let message = match &self {
            BridgeError::Validation(ProtocolError::MissingField(_)) => {
                MISSING_FIELD_MESSAGE.to_string()
            }
            other => other.to_string(),
        };
        (status, message).into_response()
    }
}

// ============================================================================
// Serving
// ============================================================================

/// Serve the API until `shutdown` resolves or the serial link goes down.
///
/// Returns [`BridgeError::LinkDown`] if the server stopped because of a link
/// failure, so the process can exit with an error.
pub async fn serve<F>(config: &HttpConfig, serial: SerialHandle, shutdown: F) -> BridgeResult<()>
where
    F: Future<Output = ()> + Send + 'static,
{
    let app = router(serial.clone());

    let link = serial.clone();
    let stop = async move {
        tokio::select! {
            _ = shutdown => info!("shutdown requested"),
            state = link.link_down() => warn!(?state, "serial link down, shutting down"),
        }
    };

    if config.tls {
        let tls = RustlsConfig::from_pem_file(&config.cert_path, &config.key_path).await?;
        let handle = axum_server::Handle::new();
        let stopper = handle.clone();
        tokio::spawn(async move {
            stop.await;
            stopper.graceful_shutdown(Some(SHUTDOWN_GRACE));
        });

        info!(addr = %config.listen, "starting server with TLS enabled");
        axum_server::bind_rustls(config.listen, tls)
            .handle(handle)
            .serve(app.into_make_service())
            .await?;
    } else {
        let listener = tokio::net::TcpListener::bind(config.listen).await?;
        info!(addr = %config.listen, "starting server without TLS");
        axum::serve(listener, app)
            .with_graceful_shutdown(stop)
            .await?;
    }

    if serial.link_state().is_down() {
        return Err(BridgeError::LinkDown);
    }
    Ok(())
}
