//! HTTP binding for the dispatcher.
//!
//! One endpoint: `POST /` takes an `RCall` JSON body and answers with an
//! `RCallResult`, or an `RpcError` with a status derived from its code.
//! Mount it elsewhere with `Router::nest`.

use std::future::Future;
use std::sync::Arc;

use axum::body::Bytes;
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::post;
use axum::{Json, Router};
use rodcall_protocol::{ErrorCode, RCall, RpcError};
use serde::de::DeserializeOwned;
use serde::Serialize;
use tokio::net::TcpListener;
use tracing::{debug, info, warn};

use crate::dispatcher::Dispatcher;

/// HTTP status for an error code.
pub fn status_for(code: ErrorCode) -> StatusCode {
    match code {
        ErrorCode::AuthenticationFailed | ErrorCode::InvalidSession => StatusCode::UNAUTHORIZED,
        ErrorCode::NoSuchMethod => StatusCode::NOT_FOUND,
        ErrorCode::BrokenChain => StatusCode::CONFLICT,
        ErrorCode::InvalidRequest | ErrorCode::InvalidArguments => StatusCode::BAD_REQUEST,
        ErrorCode::ShuttingDown => StatusCode::SERVICE_UNAVAILABLE,
        _ => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

fn error_response(error: RpcError) -> Response {
    (status_for(error.code), Json(error)).into_response()
}

/// Build the router for a dispatcher.
pub fn router<S>(dispatcher: Arc<Dispatcher<S>>) -> Router
where
    S: Serialize + DeserializeOwned + Send + 'static,
{
    Router::new()
        .route("/", post(handle_call::<S>))
        .with_state(dispatcher)
}

async fn handle_call<S>(State(dispatcher): State<Arc<Dispatcher<S>>>, body: Bytes) -> Response
where
    S: Serialize + DeserializeOwned + Send + 'static,
{
    let call: RCall = match serde_json::from_slice(&body) {
        Ok(call) => call,
        Err(e) => {
            warn!(error = %e, "rejecting malformed request body");
            return error_response(RpcError::invalid_request(format!("malformed RCall: {}", e)));
        }
    };

    match dispatcher.handle(call).await {
        Ok(result) => Json(result).into_response(),
        Err(e) => {
            debug!(error = %e, code = %e.code(), "call failed");
            error_response(e.to_rpc_error())
        }
    }
}

/// Serve `dispatcher` on `listener` until `shutdown` resolves.
///
/// The dispatcher is not closed here; callers drain it once the listener
/// has stopped accepting connections.
pub async fn serve<S, F>(
    listener: TcpListener,
    dispatcher: Arc<Dispatcher<S>>,
    shutdown: F,
) -> std::io::Result<()>
where
    S: Serialize + DeserializeOwned + Send + 'static,
    F: Future<Output = ()> + Send + 'static,
{
    if let Ok(addr) = listener.local_addr() {
        info!(%addr, "listening for calls");
    }
    axum::serve(listener, router(dispatcher))
        .with_graceful_shutdown(shutdown)
        .await
}
