use axum::{extract::State, Json};
use serde::Serialize;

use super::{AppState, SERVICE_NAME};

#[derive(Debug, Serialize, PartialEq, Eq)]
pub(super) struct HealthData {
    ok: bool,
    service: &'static str,
    providers: ProviderFlags,
    cache: bool,
}

#[derive(Debug, Serialize, PartialEq, Eq)]
struct ProviderFlags {
    gemini: bool,
    claude: bool,
}

pub(super) async fn health(State(state): State<AppState>) -> Json<HealthData> {
    Json(HealthData {
        ok: true,
        service: SERVICE_NAME,
        providers: ProviderFlags {
            gemini: state.broker.has_provider("gemini"),
            claude: state.broker.has_provider("claude"),
        },
        cache: state.broker.has_cache(),
    })
}
