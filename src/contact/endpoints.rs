use axum::{
    Json,
    extract::State,
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Response},
};
use bytes::Bytes;
use tracing::{Instrument, info, info_span, warn};
use uuid::Uuid;

use super::delegates::{client_ip, relay_submission};
use crate::{
    AppState,
    apex::utils::{RelayError, with_cors},
};

pub async fn contact_endpoint(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Bytes,
) -> Response {
    let span = info_span!("contact", request_id = %Uuid::new_v4());
    let remote_ip = client_ip(&headers);

    let outcome = relay_submission(&state, remote_ip.as_deref(), &body)
        .instrument(span.clone())
        .await;

    let response = match outcome {
        Ok(reply) => {
            span.in_scope(|| info!(id = ?reply.id, "contact form relayed"));
            (StatusCode::OK, Json(reply)).into_response()
        }
        Err(error) => {
            span.in_scope(|| {
                warn!(
                    kind = error.kind(),
                    status = error.status().as_u16(),
                    %error,
                    "contact form rejected"
                )
            });
            error.into_response()
        }
    };

    with_cors(response, &state.settings.allowed_origin)
}

pub async fn contact_preflight(State(state): State<AppState>) -> Response {
    with_cors(
        StatusCode::NO_CONTENT.into_response(),
        &state.settings.allowed_origin,
    )
}

pub async fn contact_method_not_allowed(State(state): State<AppState>) -> Response {
    with_cors(
        RelayError::MethodNotAllowed.into_response(),
        &state.settings.allowed_origin,
    )
}
