//! Tournament resources: listing, submission, detail, edits, deletion,
//! alias mapping updates and finalization.

use crate::{
    AppState,
    dto::{self, PendingTournamentDto, PlayerSummaryDto, TournamentDto, TournamentSummaryDto},
    error::{ApiResult, bad_request},
    routes::{parse_id, require_region, require_region_admin},
    scrapers,
};
use app_core::{
    CoreError, DbpPendingTournament, DbpPlayer, DbpTournament, Match, SourceType,
    utils::validation::FieldError,
};
use axum::{
    Json,
    extract::{Path, Query, State},
    response::{IntoResponse, Response},
};
use axum_extra::extract::cookie::CookieJar;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeSet, HashMap};
use uuid::Uuid;

// --- list ---

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TournamentListParams {
    pub include_pending: Option<String>,
}

#[derive(Serialize)]
pub struct TournamentsResponse {
    pub tournaments: Vec<TournamentSummaryDto>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pending_tournaments: Option<Vec<TournamentSummaryDto>>,
}

pub async fn list(
    State(state): State<AppState>,
    Path(region): Path<String>,
    Query(params): Query<TournamentListParams>,
    jar: CookieJar,
) -> ApiResult<Json<TournamentsResponse>> {
    require_region(&state, &region).await?;
    let include_pending = params.include_pending.as_deref() == Some("true");
    if include_pending {
        require_region_admin(&state, &jar, &region).await?;
    }

    let tournaments = state
        .core
        .database
        .get_all_tournaments(&[], &[region.clone()], app_core::QueryOp::And)
        .await
        .map_err(CoreError::from)?;

    let pending_tournaments = if include_pending {
        let pending = state
            .core
            .database
            .get_all_pending_tournaments(&[region])
            .await
            .map_err(CoreError::from)?;
        Some(pending.iter().map(TournamentSummaryDto::from).collect())
    } else {
        None
    };

    Ok(Json(TournamentsResponse {
        tournaments: tournaments.iter().map(TournamentSummaryDto::from).collect(),
        pending_tournaments,
    }))
}

// --- create (scrape into a pending tournament) ---

#[derive(Debug, Deserialize)]
pub struct TournamentPostBody {
    #[serde(rename = "type")]
    pub source_type: Option<String>,
    pub data: Option<String>,
    /// bracket name inside a tio file; consumed by the tio scraper
    #[allow(dead_code)]
    pub bracket: Option<String>,
    /// phase selection for smashgg events; consumed by that scraper
    #[allow(dead_code)]
    pub included_phases: Option<Vec<String>>,
}

#[derive(Serialize)]
pub struct CreatedResponse {
    pub id: String,
}

pub async fn create(
    State(state): State<AppState>,
    Path(region): Path<String>,
    jar: CookieJar,
    Json(body): Json<TournamentPostBody>,
) -> ApiResult<Json<CreatedResponse>> {
    require_region(&state, &region).await?;
    require_region_admin(&state, &jar, &region).await?;

    let source_type: SourceType = body
        .source_type
        .as_deref()
        .ok_or_else(|| bad_request("type required"))?
        .parse()?;
    let data = body.data.ok_or_else(|| bad_request("data required"))?;

    let scraper = scrapers::scraper_for(source_type, &data)?;
    let pending = state
        .core
        .create_pending_tournament(source_type, &scraper, &region)
        .await?;
    Ok(Json(CreatedResponse {
        id: pending.id.to_string(),
    }))
}

// --- detail ---

#[derive(Serialize)]
pub struct MatchDetailDto {
    pub winner_id: String,
    pub winner_name: String,
    pub loser_id: String,
    pub loser_name: String,
}

#[derive(Serialize)]
pub struct TournamentDetailResponse {
    pub tournament: TournamentDto,
    pub players: Vec<PlayerSummaryDto>,
    pub matches: Vec<MatchDetailDto>,
}

#[derive(Serialize)]
pub struct PendingDetailResponse {
    pub tournament: PendingTournamentDto,
}

async fn player_names(
    state: &AppState,
    ids: impl IntoIterator<Item = Uuid>,
) -> ApiResult<HashMap<Uuid, String>> {
    let mut names = HashMap::new();
    for id in ids {
        let name = state
            .core
            .database
            .get_player(id)
            .await
            .map_err(CoreError::from)?
            .map(|p| p.name)
            .unwrap_or_else(|| id.to_string());
        names.insert(id, name);
    }
    Ok(names)
}

pub async fn get(
    State(state): State<AppState>,
    Path((region, id)): Path<(String, String)>,
    jar: CookieJar,
) -> ApiResult<Response> {
    require_region(&state, &region).await?;
    let id = parse_id(&id)?;

    if let Some(tournament) = state
        .core
        .database
        .get_tournament(id)
        .await
        .map_err(CoreError::from)?
    {
        let names = player_names(&state, tournament.players.iter().copied()).await?;
        let players = tournament
            .players
            .iter()
            .map(|player_id| PlayerSummaryDto {
                id: player_id.to_string(),
                name: names[player_id].clone(),
            })
            .collect();
        let matches = tournament
            .matches
            .iter()
            .map(|m| MatchDetailDto {
                winner_id: m.winner.to_string(),
                winner_name: names.get(&m.winner).cloned().unwrap_or_default(),
                loser_id: m.loser.to_string(),
                loser_name: names.get(&m.loser).cloned().unwrap_or_default(),
            })
            .collect();
        return Ok(Json(TournamentDetailResponse {
            tournament: TournamentDto::from(&tournament),
            players,
            matches,
        })
        .into_response());
    }

    // pending tournaments are visible to region admins only
    let Some(pending) = state
        .core
        .database
        .get_pending_tournament(id)
        .await
        .map_err(CoreError::from)?
    else {
        return Err(CoreError::not_found("tournament").into());
    };
    require_region_admin(&state, &jar, &region).await?;
    Ok(Json(PendingDetailResponse {
        tournament: PendingTournamentDto::from(&pending),
    })
    .into_response())
}

// --- edit ---

#[derive(Debug, Deserialize)]
pub struct MatchPutBody {
    pub winner: String,
    pub loser: String,
}

#[derive(Debug, Deserialize)]
pub struct TournamentPutBody {
    pub name: Option<String>,
    /// MM/DD/YY
    pub date: Option<String>,
    pub regions: Option<Vec<String>>,
    /// player ids for canonical tournaments, raw aliases for pending ones
    pub players: Option<Vec<String>>,
    pub matches: Option<Vec<MatchPutBody>>,
}

pub async fn update(
    State(state): State<AppState>,
    Path((region, id)): Path<(String, String)>,
    jar: CookieJar,
    Json(body): Json<TournamentPutBody>,
) -> ApiResult<Response> {
    require_region(&state, &region).await?;
    require_region_admin(&state, &jar, &region).await?;
    let id = parse_id(&id)?;

    let date = match &body.date {
        Some(raw) => Some(
            dto::decode_date(raw).ok_or_else(|| bad_request(format!("invalid date '{raw}'")))?,
        ),
        None => None,
    };
    let mut regions_update: Option<BTreeSet<String>> = None;
    if let Some(region_ids) = &body.regions {
        let mut set = BTreeSet::new();
        for region_id in region_ids {
            require_region(&state, region_id).await?;
            set.insert(region_id.clone());
        }
        regions_update = Some(set);
    }

    if let Some(mut tournament) = state
        .core
        .database
        .get_tournament(id)
        .await
        .map_err(CoreError::from)?
    {
        if let Some(name) = body.name {
            tournament.name = name;
        }
        if let Some(date) = date {
            tournament.date = date;
        }
        if let Some(regions) = regions_update {
            tournament.regions = regions;
        }
        if let Some(players) = body.players {
            let mut ids = BTreeSet::new();
            for raw in &players {
                ids.insert(parse_id(raw)?);
            }
            // an explicit participant edit re-snapshots the originals
            tournament.orig_ids = ids.clone();
            tournament.players = ids;
        }
        if let Some(matches) = body.matches {
            let mut parsed = Vec::with_capacity(matches.len());
            for m in &matches {
                parsed.push(Match::new(parse_id(&m.winner)?, parse_id(&m.loser)?));
            }
            tournament.matches = parsed;
        }

        tournament.validate().map_err(CoreError::from)?;
        for player_id in &tournament.players {
            let merged = state
                .core
                .database
                .get_player(*player_id)
                .await
                .map_err(CoreError::from)?
                .is_none_or(|p| p.merged);
            if merged {
                return Err(CoreError::from(FieldError::invalid(
                    "players",
                    format!("player {player_id} is merged or unknown"),
                ))
                .into());
            }
        }

        state
            .core
            .database
            .save_tournament(&tournament)
            .await
            .map_err(CoreError::from)?;
        return Ok(Json(TournamentDto::from(&tournament)).into_response());
    }

    let Some(mut pending) = state
        .core
        .database
        .get_pending_tournament(id)
        .await
        .map_err(CoreError::from)?
    else {
        return Err(CoreError::not_found("tournament").into());
    };

    if let Some(name) = body.name {
        pending.name = name;
    }
    if let Some(date) = date {
        pending.date = date;
    }
    if let Some(regions) = regions_update {
        pending.regions = regions;
    }
    if let Some(players) = body.players {
        pending.aliases = players;
    }
    if let Some(matches) = body.matches {
        pending.alias_matches = matches
            .into_iter()
            .map(|m| app_core::AliasMatch {
                winner: m.winner,
                loser: m.loser,
            })
            .collect();
    }

    pending.validate().map_err(CoreError::from)?;
    state
        .core
        .database
        .save_pending_tournament(&pending)
        .await
        .map_err(CoreError::from)?;
    Ok(Json(PendingTournamentDto::from(&pending)).into_response())
}

// --- delete ---

#[derive(Serialize)]
pub struct SuccessResponse {
    pub success: bool,
}

/// Deletes a tournament (canonical or pending). Be VERY careful with this.
pub async fn delete(
    State(state): State<AppState>,
    Path((region, id)): Path<(String, String)>,
    jar: CookieJar,
) -> ApiResult<Json<SuccessResponse>> {
    require_region(&state, &region).await?;
    require_region_admin(&state, &jar, &region).await?;
    let id = parse_id(&id)?;

    if state
        .core
        .database
        .get_tournament(id)
        .await
        .map_err(CoreError::from)?
        .is_some()
    {
        state
            .core
            .database
            .delete_tournament(id)
            .await
            .map_err(CoreError::from)?;
    } else {
        match state.core.database.delete_pending_tournament(id).await {
            Ok(()) => {}
            Err(app_core::DbError::NotFound) => {
                return Err(CoreError::not_found("tournament").into());
            }
            Err(err) => return Err(CoreError::from(err).into()),
        }
    }
    Ok(Json(SuccessResponse { success: true }))
}

// --- alias mappings ---

#[derive(Debug, Deserialize)]
pub struct AliasMappingPutBody {
    pub alias_to_id_map: Vec<AliasMappingEntry>,
}

#[derive(Debug, Deserialize)]
pub struct AliasMappingEntry {
    pub player_alias: String,
    pub player_id: Option<String>,
}

pub async fn update_alias_mappings(
    State(state): State<AppState>,
    Path((region, id)): Path<(String, String)>,
    jar: CookieJar,
    Json(body): Json<AliasMappingPutBody>,
) -> ApiResult<Json<PendingTournamentDto>> {
    require_region(&state, &region).await?;
    require_region_admin(&state, &jar, &region).await?;
    let id = parse_id(&id)?;

    let mut entries = Vec::with_capacity(body.alias_to_id_map.len());
    for entry in &body.alias_to_id_map {
        let player_id = match &entry.player_id {
            Some(raw) => Some(parse_id(raw)?),
            None => None,
        };
        entries.push((entry.player_alias.clone(), player_id));
    }

    let pending = state.core.update_alias_mappings(id, &entries).await?;
    Ok(Json(PendingTournamentDto::from(&pending)))
}

// --- finalize ---

#[derive(Serialize)]
pub struct FinalizeResponse {
    pub success: bool,
    pub tournament_id: String,
}

pub async fn finalize(
    State(state): State<AppState>,
    Path((region, id)): Path<(String, String)>,
    jar: CookieJar,
) -> ApiResult<Json<FinalizeResponse>> {
    require_region(&state, &region).await?;
    require_region_admin(&state, &jar, &region).await?;
    let id = parse_id(&id)?;

    let tournament = state.core.finalize_pending_tournament(&region, id).await?;
    Ok(Json(FinalizeResponse {
        success: true,
        tournament_id: tournament.id.to_string(),
    }))
}
