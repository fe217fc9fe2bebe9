use axum::{
    extract::{rejection::JsonRejection, State},
    http::header,
    response::{IntoResponse, Response},
    Extension, Json,
};
use trendbroker_core::TrendRequest;

use crate::middleware::RequestId;

use super::{ApiError, AppState};

/// Marks whether the body came from the result cache.
pub(super) const CACHE_STATUS_HEADER: &str = "x-cache";

/// `POST /v1/summarize/trend`
///
/// The body is written as the exact serialized string so cache hits are
/// byte-identical to the response that populated them.
pub(super) async fn summarize_trend(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    payload: Result<Json<TrendRequest>, JsonRejection>,
) -> Result<Response, ApiError> {
    let Json(request) = payload.map_err(|rejection| {
        tracing::debug!(error = %rejection, "rejected summarize payload");
        ApiError::new(req_id.0.clone(), "validation_error", rejection.body_text())
    })?;

    let summarized = state
        .broker
        .summarize(request)
        .await
        .map_err(|e| ApiError::from_broker(req_id.0.clone(), &e))?;

    tracing::info!(
        request_id = %req_id.0,
        providers = summarized.response.provider_outputs.len(),
        from_cache = summarized.from_cache,
        "trend summary served"
    );

    let cache_status = if summarized.from_cache { "hit" } else { "miss" };
    Ok((
        [
            (header::CONTENT_TYPE, "application/json"),
            (header::HeaderName::from_static(CACHE_STATUS_HEADER), cache_status),
        ],
        summarized.body,
    )
        .into_response())
}
