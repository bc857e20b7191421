//! Request handling for the rate limited endpoint.

use std::net::SocketAddr;
use std::sync::Arc;

use axum::{
    extract::{ConnectInfo, Request, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::get,
    Router,
};
use tracing::debug;

use crate::ratelimit::{AdmissionControl, ClientKey};

/// Body returned with every rejected request.
pub const REJECTED_BODY: &str = "error";

/// Build the router serving `GET /` against `limiter`.
pub fn router<R: AdmissionControl + 'static>(limiter: Arc<R>) -> Router {
    Router::new()
        .route("/", get(admit_handler::<R>))
        .with_state(limiter)
}

/// Resolve the client, ask the limiter, and shape the response.
async fn admit_handler<R: AdmissionControl>(
    State(limiter): State<Arc<R>>,
    request: Request,
) -> Response {
    let peer = request
        .extensions()
        .get::<ConnectInfo<SocketAddr>>()
        .map(|ConnectInfo(addr)| *addr);
    let key = ClientKey::resolve(request.headers(), peer);

    let admission = limiter.admit(key.as_str());

    debug!(
        client = %key,
        allowed = admission.allowed,
        count = admission.count,
        "Rate limit decision made"
    );

    if admission.allowed {
        (StatusCode::OK, admission.count.to_string()).into_response()
    } else {
        (StatusCode::TOO_MANY_REQUESTS, REJECTED_BODY).into_response()
    }
}
