use axum::Json;
use axum::extract::State;

use crate::state::AppState;
use crate::stats::StatsSnapshot;

pub async fn event_stats(State(state): State<AppState>) -> Json<StatsSnapshot> {
    Json(state.stats.snapshot())
}
