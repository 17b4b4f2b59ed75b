//! HTTP endpoint handlers. These are thin wrappers that forward to core logic.
//! Each handler is instrumented; logs include parameters and basic result info.

use std::sync::Arc;

use axum::{
    extract::{Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use tracing::{error, info, instrument};

use crate::domain::DailyChallengeSet;
use crate::logic::*;
use crate::protocol::*;
use crate::state::AppState;
use crate::store::StoreError;

/// Store-level failure surfaced as a 500 with a JSON body. The engine never
/// raises NotFound here — missing sets degrade to no-op results upstream.
pub struct ApiError(StoreError);

impl From<StoreError> for ApiError {
    fn from(e: StoreError) -> Self {
        ApiError(e)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        error!(target: "prepdeck_backend", error = %self.0, "Request failed at the store");
        (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(serde_json::json!({ "error": self.0.to_string() })),
        )
            .into_response()
    }
}

#[instrument(level = "info")]
pub async fn http_health() -> impl IntoResponse {
    Json(HealthOut { ok: true })
}

#[instrument(level = "info", skip(state), fields(visitor = %q.visitor_id))]
pub async fn http_get_daily(
    State(state): State<Arc<AppState>>,
    Query(q): Query<VisitorQuery>,
) -> Result<Json<Option<DailyChallengeSet>>, ApiError> {
    let set = get_daily(&state, &q.visitor_id).await?;
    info!(target: "challenge", visitor = %q.visitor_id, found = set.is_some(), "HTTP daily challenges served");
    Ok(Json(set))
}

#[instrument(level = "info", skip(state, body), fields(visitor = %body.visitor_id))]
pub async fn http_generate_daily(
    State(state): State<Arc<AppState>>,
    Json(body): Json<GenerateIn>,
) -> Result<Json<DailyChallengeSet>, ApiError> {
    let set = get_or_create(&state, &body.visitor_id).await?;
    info!(target: "challenge", visitor = %body.visitor_id, date = %set.date, "HTTP daily challenges generated");
    Ok(Json(set))
}

#[instrument(level = "info", skip(state, body), fields(visitor = %body.visitor_id, updates = body.updates.len()))]
pub async fn http_post_progress(
    State(state): State<Arc<AppState>>,
    Json(body): Json<ProgressIn>,
) -> Result<Json<ProgressOut>, ApiError> {
    let (newly_completed, all_completed) =
        update_progress(&state, &body.visitor_id, &body.updates).await?;
    info!(
        target: "challenge",
        visitor = %body.visitor_id,
        newly = newly_completed.len(),
        all_completed,
        "HTTP progress update applied"
    );
    Ok(Json(ProgressOut { newly_completed, all_completed }))
}

#[instrument(level = "info", skip(state, body), fields(visitor = %body.visitor_id))]
pub async fn http_post_bonus(
    State(state): State<Arc<AppState>>,
    Json(body): Json<ClaimIn>,
) -> Result<Json<ClaimOut>, ApiError> {
    let (success, bonus) = claim_bonus(&state, &body.visitor_id).await?;
    info!(target: "challenge", visitor = %body.visitor_id, success, bonus, "HTTP bonus claim evaluated");
    Ok(Json(ClaimOut { success, bonus }))
}

#[instrument(level = "info", skip(state), fields(visitor = %q.visitor_id))]
pub async fn http_get_history(
    State(state): State<Arc<AppState>>,
    Query(q): Query<HistoryQuery>,
) -> Result<Json<Vec<DailyChallengeSet>>, ApiError> {
    let sets = history(&state, &q.visitor_id, q.limit).await?;
    info!(target: "challenge", visitor = %q.visitor_id, count = sets.len(), "HTTP history served");
    Ok(Json(sets))
}

#[instrument(level = "info", skip(state), fields(visitor = %q.visitor_id))]
pub async fn http_get_streak(
    State(state): State<Arc<AppState>>,
    Query(q): Query<VisitorQuery>,
) -> Result<Json<StreakOut>, ApiError> {
    let streak = completion_streak(&state, &q.visitor_id).await?;
    info!(target: "challenge", visitor = %q.visitor_id, streak, "HTTP streak served");
    Ok(Json(StreakOut { streak }))
}
