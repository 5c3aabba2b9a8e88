//! GET /<region>/players, GET/PUT /<region>/players/<id>

use crate::{
    AppState,
    dto::PlayerDto,
    error::ApiResult,
    routes::{parse_id, require_region, require_region_admin},
};
use app_core::{CoreError, DbpPlayer, PlayerEdit, utils::normalize::normalize_alias};
use axum::{
    Json,
    extract::{Path, Query, State},
};
use axum_extra::extract::cookie::CookieJar;
use serde::{Deserialize, Serialize};

/// cap for typeahead responses
const QUERY_LIMIT: usize = 20;

#[derive(Debug, Default, Deserialize)]
pub struct PlayerListParams {
    pub alias: Option<String>,
    pub query: Option<String>,
    pub all: Option<bool>,
}

#[derive(Serialize)]
pub struct PlayersResponse {
    pub players: Vec<PlayerDto>,
}

pub async fn list(
    State(state): State<AppState>,
    Path(region): Path<String>,
    Query(params): Query<PlayerListParams>,
) -> ApiResult<Json<PlayersResponse>> {
    require_region(&state, &region).await?;

    let players = if let Some(alias) = params.alias {
        // single player matching the alias within the region
        state
            .core
            .database
            .get_player_by_alias(&alias, &region)
            .await
            .map_err(CoreError::from)?
            .into_iter()
            .collect()
    } else if params.all.unwrap_or(false) {
        state
            .core
            .database
            .get_all_players(None, false)
            .await
            .map_err(CoreError::from)?
    } else if let Some(query) = params.query {
        // typeahead over the region's aliases
        let needle = normalize_alias(&query);
        state
            .core
            .database
            .get_all_players(Some(&region), false)
            .await
            .map_err(CoreError::from)?
            .into_iter()
            .filter(|p| p.aliases.iter().any(|alias| alias.contains(&needle)))
            .take(QUERY_LIMIT)
            .collect()
    } else {
        state
            .core
            .database
            .get_all_players(Some(&region), false)
            .await
            .map_err(CoreError::from)?
    };

    Ok(Json(PlayersResponse {
        players: players.iter().map(PlayerDto::from).collect(),
    }))
}

pub async fn get(
    State(state): State<AppState>,
    Path((region, id)): Path<(String, String)>,
) -> ApiResult<Json<PlayerDto>> {
    require_region(&state, &region).await?;
    let id = parse_id(&id)?;
    let player = state
        .core
        .database
        .get_player(id)
        .await
        .map_err(CoreError::from)?
        .ok_or_else(|| CoreError::not_found("player"))?;
    Ok(Json(PlayerDto::from(&player)))
}

#[derive(Debug, Deserialize)]
pub struct PlayerPutBody {
    pub name: Option<String>,
    pub aliases: Option<Vec<String>>,
    pub regions: Option<Vec<String>>,
}

pub async fn update(
    State(state): State<AppState>,
    Path((region, id)): Path<(String, String)>,
    jar: CookieJar,
    Json(body): Json<PlayerPutBody>,
) -> ApiResult<Json<PlayerDto>> {
    require_region(&state, &region).await?;
    require_region_admin(&state, &jar, &region).await?;
    let id = parse_id(&id)?;

    let player = state
        .core
        .update_player(
            id,
            PlayerEdit {
                name: body.name,
                aliases: body.aliases,
                regions: body.regions,
            },
        )
        .await?;
    Ok(Json(PlayerDto::from(&player)))
}
