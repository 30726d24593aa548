//! Admin dashboard endpoints

use axum::{extract::State, Json};

use crate::admin::{self, RecentActivity, SystemStats};
use crate::error::Result;
use crate::server::state::AppState;

/// GET /api/admin/stats
pub async fn stats(State(state): State<AppState>) -> Result<Json<SystemStats>> {
    let stats = admin::system_stats(
        state.db(),
        state.retrieval().as_ref(),
        state.generation().as_ref(),
    )
    .await?;
    Ok(Json(stats))
}

/// GET /api/admin/recent-activity
pub async fn recent_activity(State(state): State<AppState>) -> Result<Json<RecentActivity>> {
    Ok(Json(admin::recent_activity(state.db())?))
}
