use axum::{
    extract::{Request, State},
    http::HeaderValue,
    middleware::Next,
    response::Response,
};
use tracing::Instrument;
use uuid::Uuid;

use crate::service::AppState;
use crate::settings::parse_flag;

pub const CORRELATION_ID_HEADER: &str = "x-correlation-id";
pub const DEBUG_HEADER: &str = "x-debug";

/// Request-scoped switch for verbose error bodies.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct DebugMode(pub bool);

/// Tags the request with a correlation id, echoes it on the response and runs
/// the rest of the stack inside a span carrying it.
pub async fn correlation_id_middleware(mut request: Request, next: Next) -> Response {
    let correlation_id = Uuid::new_v4().to_string();
    let header_value = HeaderValue::from_str(&correlation_id).ok();

    if let Some(value) = &header_value {
        request
            .headers_mut()
            .insert(CORRELATION_ID_HEADER, value.clone());
    }

    let span = tracing::info_span!("http_request", correlation_id = %correlation_id);
    let mut response = next.run(request).instrument(span).await;

    if let Some(value) = header_value {
        response.headers_mut().insert(CORRELATION_ID_HEADER, value);
    }
    response
}

/// Sets [`DebugMode`] from the `x-debug` header, falling back to the
/// process-wide default.
pub async fn debug_mode_middleware(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Response {
    let debug = request
        .headers()
        .get(DEBUG_HEADER)
        .and_then(|v| v.to_str().ok())
        .map(parse_flag)
        .unwrap_or(state.debug_default);

    request.extensions_mut().insert(DebugMode(debug));
    next.run(request).await
}
