//! GET /<region>/matches/<playerId>: per-player match history.

use crate::{
    AppState,
    dto::{self, PlayerSummaryDto},
    error::ApiResult,
    routes::{parse_id, require_region},
};
use app_core::{CoreError, DbpPlayer, DbpTournament, Player, QueryOp};
use axum::{
    Json,
    extract::{Path, Query, State},
};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use uuid::Uuid;

#[derive(Debug, Default, Deserialize)]
pub struct MatchHistoryParams {
    pub opponent: Option<String>,
}

#[derive(Serialize)]
pub struct MatchHistoryEntry {
    pub tournament_id: String,
    pub tournament_name: String,
    pub tournament_date: String,
    pub opponent_id: String,
    pub opponent_name: String,
    pub result: &'static str,
}

#[derive(Serialize)]
pub struct MatchHistoryResponse {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub player: Option<PlayerSummaryDto>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub opponent: Option<PlayerSummaryDto>,
    pub matches: Vec<MatchHistoryEntry>,
    pub wins: u32,
    pub losses: u32,
}

fn summary(player: &Player) -> PlayerSummaryDto {
    PlayerSummaryDto {
        id: player.id.to_string(),
        name: player.name.clone(),
    }
}

pub async fn history(
    State(state): State<AppState>,
    Path((region, id)): Path<(String, String)>,
    Query(params): Query<MatchHistoryParams>,
) -> ApiResult<Json<MatchHistoryResponse>> {
    require_region(&state, &region).await?;
    let player_id = parse_id(&id)?;

    let Some(player) = state
        .core
        .database
        .get_player(player_id)
        .await
        .map_err(CoreError::from)?
    else {
        return Err(CoreError::not_found("player").into());
    };

    // merged players have no live history
    if player.merged {
        return Ok(Json(MatchHistoryResponse {
            player: None,
            opponent: None,
            matches: Vec::new(),
            wins: 0,
            losses: 0,
        }));
    }

    let mut filter_players = vec![player_id];
    let opponent = match &params.opponent {
        Some(raw) => {
            let opponent_id = parse_id(raw)?;
            let Some(opponent) = state
                .core
                .database
                .get_player(opponent_id)
                .await
                .map_err(CoreError::from)?
            else {
                return Err(CoreError::not_found("opponent").into());
            };
            filter_players.push(opponent_id);
            Some(opponent)
        }
        None => None,
    };

    let tournaments = state
        .core
        .database
        .get_all_tournaments(&filter_players, &[], QueryOp::And)
        .await
        .map_err(CoreError::from)?;

    let mut names: HashMap<Uuid, String> = HashMap::new();
    let mut matches = Vec::new();
    let mut wins = 0u32;
    let mut losses = 0u32;

    for tournament in &tournaments {
        for m in &tournament.matches {
            let relevant = match &opponent {
                Some(opponent) => m.contains_players(player_id, opponent.id),
                None => m.contains_player(player_id),
            };
            if !relevant {
                continue;
            }
            let Some(opposing_id) = m.get_opposing_player(player_id) else {
                continue;
            };
            let opponent_name = match names.get(&opposing_id) {
                Some(name) => name.clone(),
                None => {
                    let name = state
                        .core
                        .database
                        .get_player(opposing_id)
                        .await
                        .map_err(CoreError::from)?
                        .map(|p| p.name)
                        .unwrap_or_else(|| opposing_id.to_string());
                    names.insert(opposing_id, name.clone());
                    name
                }
            };
            let result = if m.did_player_win(player_id) {
                wins += 1;
                "win"
            } else {
                losses += 1;
                "lose"
            };
            matches.push(MatchHistoryEntry {
                tournament_id: tournament.id.to_string(),
                tournament_name: tournament.name.clone(),
                tournament_date: dto::encode_date(&tournament.date),
                opponent_id: opposing_id.to_string(),
                opponent_name,
                result,
            });
        }
    }

    Ok(Json(MatchHistoryResponse {
        player: Some(summary(&player)),
        opponent: opponent.as_ref().map(summary),
        matches,
        wins,
        losses,
    }))
}
