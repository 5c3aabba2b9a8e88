//! GET / POST / PUT /<region>/rankings

use crate::{
    AppState,
    dto::{self, RankingDto, RankingEntryDto},
    error::ApiResult,
    routes::{require_region, require_region_admin},
};
use app_core::{ActivityWindow, CoreError, DbpRanking, Ranking};
use axum::{
    Json,
    extract::{Path, State},
};
use axum_extra::extract::cookie::CookieJar;
use chrono::Utc;
use serde::{Deserialize, Serialize};

#[derive(Serialize)]
pub struct RankingResponse {
    pub ranking: RankingDto,
    pub ranking_entries: Vec<RankingEntryDto>,
}

fn render(ranking: &Ranking) -> RankingResponse {
    RankingResponse {
        ranking: RankingDto::from(ranking),
        ranking_entries: dto::ranking_entries(ranking),
    }
}

pub async fn latest(
    State(state): State<AppState>,
    Path(region): Path<String>,
) -> ApiResult<Json<RankingResponse>> {
    require_region(&state, &region).await?;
    let ranking = state
        .core
        .database
        .get_latest_ranking(&region)
        .await
        .map_err(CoreError::from)?
        .ok_or_else(|| CoreError::not_found("ranking"))?;
    Ok(Json(render(&ranking)))
}

/// Regenerate with the configured activity thresholds.
pub async fn generate(
    State(state): State<AppState>,
    Path(region): Path<String>,
    jar: CookieJar,
) -> ApiResult<Json<RankingResponse>> {
    require_region(&state, &region).await?;
    require_region_admin(&state, &jar, &region).await?;

    let ranking = state
        .core
        .generate_ranking(&region, Utc::now(), None)
        .await?;
    Ok(Json(render(&ranking)))
}

#[derive(Debug, Default, Deserialize)]
pub struct RankingPutBody {
    pub day_limit: Option<i64>,
    pub num_tourneys: Option<usize>,
}

/// Regenerate with explicit activity thresholds; unset fields fall back to
/// the region's configured window.
pub async fn generate_with_overrides(
    State(state): State<AppState>,
    Path(region): Path<String>,
    jar: CookieJar,
    Json(body): Json<RankingPutBody>,
) -> ApiResult<Json<RankingResponse>> {
    require_region(&state, &region).await?;
    require_region_admin(&state, &jar, &region).await?;

    let configured = state.core.config.activity.for_region(&region);
    let window = ActivityWindow {
        day_limit: body.day_limit.unwrap_or(configured.day_limit),
        num_tourneys: body.num_tourneys.unwrap_or(configured.num_tourneys),
    };

    let ranking = state
        .core
        .generate_ranking(&region, Utc::now(), Some(window))
        .await?;
    Ok(Json(render(&ranking)))
}
