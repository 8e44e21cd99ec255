//! Visit counter handler.

use std::sync::Arc;

use axum::{extract::State, Json};
use pixbin_core::CounterResponse;

use crate::state::AppState;
use crate::utils::ClientIp;

/// Record a visit and return the unique-visitor total.
///
/// Each client identity counts once; `total` and `unique` report the same
/// figure since only unique visits are tracked.
#[utoipa::path(
    get,
    path = "/counter",
    tag = "counter",
    responses(
        (status = 200, description = "Current visit totals", body = CounterResponse)
    )
)]
pub async fn counter(
    State(state): State<Arc<AppState>>,
    ClientIp(client_ip): ClientIp,
) -> Json<CounterResponse> {
    let total = state.visits.record(&client_ip).await;
    Json(CounterResponse {
        total,
        unique: total,
    })
}
