//! Merge administration: list, apply, undo.

use crate::{
    AppState,
    dto::MergeDto,
    error::ApiResult,
    routes::{parse_id, require_region, require_region_admin},
};
use app_core::{CoreError, DbpMerge, DbpPlayer, DbpUser};
use axum::{
    Json,
    extract::{Path, State},
};
use axum_extra::extract::cookie::CookieJar;
use chrono::Utc;
use serde::{Deserialize, Serialize};

#[derive(Serialize)]
pub struct MergesResponse {
    pub merges: Vec<MergeDto>,
}

pub async fn list(
    State(state): State<AppState>,
    Path(region): Path<String>,
    jar: CookieJar,
) -> ApiResult<Json<MergesResponse>> {
    require_region(&state, &region).await?;
    require_region_admin(&state, &jar, &region).await?;

    let mut merges = Vec::new();
    for merge in state
        .core
        .database
        .get_all_merges()
        .await
        .map_err(CoreError::from)?
    {
        let requester = state
            .core
            .database
            .get_user(merge.requester)
            .await
            .map_err(CoreError::from)?;
        let source = state
            .core
            .database
            .get_player(merge.source_player)
            .await
            .map_err(CoreError::from)?;
        let target = state
            .core
            .database
            .get_player(merge.target_player)
            .await
            .map_err(CoreError::from)?;
        merges.push(MergeDto::new(
            &merge,
            requester.as_ref(),
            source.as_ref(),
            target.as_ref(),
        ));
    }
    Ok(Json(MergesResponse { merges }))
}

#[derive(Debug, Deserialize)]
pub struct MergePutBody {
    pub source_player_id: String,
    pub target_player_id: String,
}

#[derive(Serialize)]
pub struct MergeCreatedResponse {
    pub status: &'static str,
    pub id: String,
}

pub async fn create(
    State(state): State<AppState>,
    Path(region): Path<String>,
    jar: CookieJar,
    Json(body): Json<MergePutBody>,
) -> ApiResult<Json<MergeCreatedResponse>> {
    require_region(&state, &region).await?;
    let user = require_region_admin(&state, &jar, &region).await?;

    let source = parse_id(&body.source_player_id)?;
    let target = parse_id(&body.target_player_id)?;
    let merge = state
        .core
        .apply_merge(&region, user.id, source, target, Utc::now())
        .await?;
    Ok(Json(MergeCreatedResponse {
        status: "success",
        id: merge.id.to_string(),
    }))
}

#[derive(Serialize)]
pub struct MergeUndoneResponse {
    pub status: &'static str,
}

pub async fn undo(
    State(state): State<AppState>,
    Path((region, id)): Path<(String, String)>,
    jar: CookieJar,
) -> ApiResult<Json<MergeUndoneResponse>> {
    require_region(&state, &region).await?;
    require_region_admin(&state, &jar, &region).await?;
    let id = parse_id(&id)?;

    state.core.undo_merge(&region, id).await?;
    Ok(Json(MergeUndoneResponse { status: "success" }))
}
