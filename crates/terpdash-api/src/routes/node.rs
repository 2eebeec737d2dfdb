//! Home chain node status

use axum::{extract::State, routing::get, Json, Router};
use lcd_client::status::probe_status;
use lcd_client::NodeStatus;

use crate::AppState;

pub fn router() -> Router<AppState> {
    Router::new().route("/status", get(get_status))
}

/// GET /node/status - Probe the home chain LCD
///
/// Always 200; an unreachable node is reported with `is_online: false`.
pub async fn get_status(State(state): State<AppState>) -> Json<NodeStatus> {
    Json(probe_status(&state.home_lcd()).await)
}
