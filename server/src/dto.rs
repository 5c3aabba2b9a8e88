//! Web-context encoding of core entities: opaque ids as strings, dates
//! formatted `MM/DD/YY`. The persistence context lives in `db_postgres`;
//! this is the only other serialization surface.

use app_core::{
    Merge, PendingTournament, Player, Ranking, Rating, Region, Tournament, User,
};
use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use serde::Serialize;
use std::collections::BTreeMap;

pub const WEB_DATE_FORMAT: &str = "%m/%d/%y";

pub fn encode_date(date: &DateTime<Utc>) -> String {
    date.format(WEB_DATE_FORMAT).to_string()
}

pub fn decode_date(raw: &str) -> Option<DateTime<Utc>> {
    let date = NaiveDate::parse_from_str(raw.trim(), WEB_DATE_FORMAT).ok()?;
    Some(date.and_time(NaiveTime::MIN).and_utc())
}

#[derive(Debug, Serialize)]
pub struct RegionDto {
    pub id: String,
    pub display_name: String,
}

impl From<&Region> for RegionDto {
    fn from(region: &Region) -> Self {
        RegionDto {
            id: region.id.clone(),
            display_name: region.display_name.clone(),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct RatingDto {
    pub mu: f64,
    pub sigma: f64,
}

impl From<Rating> for RatingDto {
    fn from(rating: Rating) -> Self {
        RatingDto {
            mu: rating.mu,
            sigma: rating.sigma,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct PlayerDto {
    pub id: String,
    pub name: String,
    pub aliases: Vec<String>,
    pub regions: Vec<String>,
    pub ratings: BTreeMap<String, RatingDto>,
    pub merged: bool,
    pub merge_parent: Option<String>,
    pub merge_children: Vec<String>,
}

impl From<&Player> for PlayerDto {
    fn from(player: &Player) -> Self {
        PlayerDto {
            id: player.id.to_string(),
            name: player.name.clone(),
            aliases: player.aliases.iter().cloned().collect(),
            regions: player.regions.iter().cloned().collect(),
            ratings: player
                .ratings
                .iter()
                .map(|(region, rating)| (region.clone(), RatingDto::from(*rating)))
                .collect(),
            merged: player.merged,
            merge_parent: player.merge_parent.map(|id| id.to_string()),
            merge_children: player
                .merge_children
                .iter()
                .map(|id| id.to_string())
                .collect(),
        }
    }
}

/// Short form used inside tournament payloads.
#[derive(Debug, Serialize)]
pub struct PlayerSummaryDto {
    pub id: String,
    pub name: String,
}

/// Listing form: the heavyweight fields (raw, players, matches, orig_ids)
/// are deliberately absent.
#[derive(Debug, Serialize)]
pub struct TournamentSummaryDto {
    pub id: String,
    pub name: String,
    pub source_type: String,
    pub date: String,
    pub regions: Vec<String>,
}

impl From<&Tournament> for TournamentSummaryDto {
    fn from(t: &Tournament) -> Self {
        TournamentSummaryDto {
            id: t.id.to_string(),
            name: t.name.clone(),
            source_type: t.source_type.as_str().to_string(),
            date: encode_date(&t.date),
            regions: t.regions.iter().cloned().collect(),
        }
    }
}

impl From<&PendingTournament> for TournamentSummaryDto {
    fn from(p: &PendingTournament) -> Self {
        TournamentSummaryDto {
            id: p.id.to_string(),
            name: p.name.clone(),
            source_type: p.source_type.as_str().to_string(),
            date: encode_date(&p.date),
            regions: p.regions.iter().cloned().collect(),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct TournamentDto {
    pub id: String,
    pub name: String,
    pub source_type: String,
    pub date: String,
    pub regions: Vec<String>,
    pub players: Vec<String>,
    pub orig_ids: Vec<String>,
}

impl From<&Tournament> for TournamentDto {
    fn from(t: &Tournament) -> Self {
        TournamentDto {
            id: t.id.to_string(),
            name: t.name.clone(),
            source_type: t.source_type.as_str().to_string(),
            date: encode_date(&t.date),
            regions: t.regions.iter().cloned().collect(),
            players: t.players.iter().map(|id| id.to_string()).collect(),
            orig_ids: t.orig_ids.iter().map(|id| id.to_string()).collect(),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct AliasMappingDto {
    pub player_alias: String,
    pub player_id: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct AliasMatchDto {
    pub winner: String,
    pub loser: String,
}

#[derive(Debug, Serialize)]
pub struct PendingTournamentDto {
    pub id: String,
    pub name: String,
    pub source_type: String,
    pub date: String,
    pub regions: Vec<String>,
    pub aliases: Vec<String>,
    pub alias_matches: Vec<AliasMatchDto>,
    pub alias_mappings: Vec<AliasMappingDto>,
}

impl From<&PendingTournament> for PendingTournamentDto {
    fn from(p: &PendingTournament) -> Self {
        PendingTournamentDto {
            id: p.id.to_string(),
            name: p.name.clone(),
            source_type: p.source_type.as_str().to_string(),
            date: encode_date(&p.date),
            regions: p.regions.iter().cloned().collect(),
            aliases: p.aliases.clone(),
            alias_matches: p
                .alias_matches
                .iter()
                .map(|m| AliasMatchDto {
                    winner: m.winner.clone(),
                    loser: m.loser.clone(),
                })
                .collect(),
            alias_mappings: p
                .alias_mappings
                .iter()
                .map(|m| AliasMappingDto {
                    player_alias: m.player_alias.clone(),
                    player_id: m.player_id.map(|id| id.to_string()),
                })
                .collect(),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct RankingEntryDto {
    pub rank: u32,
    pub player_id: String,
    pub name: String,
    pub rating: RatingDto,
}

#[derive(Debug, Serialize)]
pub struct RankingDto {
    pub id: String,
    pub region: String,
    pub time: String,
    pub tournaments: Vec<String>,
}

impl From<&Ranking> for RankingDto {
    fn from(r: &Ranking) -> Self {
        RankingDto {
            id: r.id.to_string(),
            region: r.region.clone(),
            time: encode_date(&r.time),
            tournaments: r.tournaments.iter().map(|id| id.to_string()).collect(),
        }
    }
}

pub fn ranking_entries(r: &Ranking) -> Vec<RankingEntryDto> {
    r.entries
        .iter()
        .map(|entry| RankingEntryDto {
            rank: entry.rank,
            player_id: entry.player.to_string(),
            name: entry.name.clone(),
            rating: RatingDto::from(entry.rating),
        })
        .collect()
}

#[derive(Debug, Serialize)]
pub struct MergeDto {
    pub id: String,
    pub requester_name: Option<String>,
    pub source_player_name: Option<String>,
    pub target_player_name: Option<String>,
    pub source_player_id: String,
    pub target_player_id: String,
    pub time: String,
}

impl MergeDto {
    pub fn new(
        merge: &Merge,
        requester: Option<&User>,
        source: Option<&Player>,
        target: Option<&Player>,
    ) -> Self {
        MergeDto {
            id: merge.id.to_string(),
            requester_name: requester.map(|u| u.username.clone()),
            source_player_name: source.map(|p| p.name.clone()),
            target_player_name: target.map(|p| p.name.clone()),
            source_player_id: merge.source_player.to_string(),
            target_player_id: merge.target_player.to_string(),
            time: encode_date(&merge.time),
        }
    }
}
