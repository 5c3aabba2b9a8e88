//! Ranking pipeline: replay a region's matches in tournament order,
//! refresh ratings, filter for activity and materialize the leaderboard.

use crate::{
    ActivityWindow, Core, CoreError, CoreResult, DbpPlayer, DbpRanking, DbpRegion, DbpTournament,
    Player, QueryOp, Rating, skill::rate_1v1, utils::ids::new_id,
};
use anyhow::anyhow;
use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::collections::HashMap;
use tracing::{info, instrument};
use uuid::Uuid;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RankingEntry {
    /// 1-based; excluded players do not consume a rank
    pub rank: u32,
    pub player: Uuid,
    /// display name at ranking time
    pub name: String,
    pub rating: Rating,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Ranking {
    pub id: Uuid,
    pub region: String,
    pub time: DateTime<Utc>,
    /// tournaments replayed for this ranking, in replay order
    pub tournaments: Vec<Uuid>,
    pub entries: Vec<RankingEntry>,
}

impl Core {
    /// Generate and persist a fresh ranking for a region.
    ///
    /// Exactly one generation per region runs at a time. Every player's
    /// region rating is reset to the default prior the first time this run
    /// sees them, so reruns over the same tournaments are deterministic.
    #[instrument(name = "ranking.generate", skip(self, window_override))]
    pub async fn generate_ranking(
        &self,
        region: &str,
        now: DateTime<Utc>,
        window_override: Option<ActivityWindow>,
    ) -> CoreResult<Ranking> {
        let lock = self.locks.ranking(region);
        let _guard = lock.lock().await;

        if self.database.get_region(region).await?.is_none() {
            return Err(CoreError::not_found(format!("region '{region}'")));
        }
        let window = window_override.unwrap_or_else(|| self.config.activity.for_region(region));

        let tournaments = self
            .database
            .get_all_tournaments(&[], &[region.to_string()], QueryOp::And)
            .await?;

        let mut refreshed: HashMap<Uuid, Player> = HashMap::new();
        let mut last_active: HashMap<Uuid, DateTime<Utc>> = HashMap::new();

        for tournament in &tournaments {
            // ascending replay order: the latest tournament wins
            for player_id in &tournament.players {
                last_active.insert(*player_id, tournament.date);
            }

            for m in &tournament.matches {
                for player_id in [m.winner, m.loser] {
                    if !refreshed.contains_key(&player_id) {
                        let mut player =
                            self.database.get_player(player_id).await?.ok_or_else(|| {
                                CoreError::Internal(anyhow!(
                                    "tournament {} references unknown player {player_id}",
                                    tournament.id
                                ))
                            })?;
                        player.update_rating(region, Rating::default());
                        refreshed.insert(player_id, player);
                    }
                }

                let winner_rating = refreshed[&m.winner].get_rating(region).unwrap_or_default();
                let loser_rating = refreshed[&m.loser].get_rating(region).unwrap_or_default();
                let (new_winner, new_loser) = rate_1v1(winner_rating, loser_rating);
                if let Some(winner) = refreshed.get_mut(&m.winner) {
                    winner.update_rating(region, new_winner);
                }
                if let Some(loser) = refreshed.get_mut(&m.loser) {
                    loser.update_rating(region, new_loser);
                }
            }
        }

        // conservative score descending, id ascending on exact ties
        let mut rated: Vec<&Player> = refreshed.values().collect();
        rated.sort_by(|a, b| {
            let score_a = a.get_rating(region).unwrap_or_default().score();
            let score_b = b.get_rating(region).unwrap_or_default().score();
            score_b
                .partial_cmp(&score_a)
                .unwrap_or(Ordering::Equal)
                .then(a.id.cmp(&b.id))
        });

        let cutoff = now - Duration::days(window.day_limit);
        let mut qualifying: HashMap<Uuid, usize> = HashMap::new();
        for tournament in tournaments.iter().filter(|t| t.date >= cutoff) {
            for player_id in &tournament.players {
                *qualifying.entry(*player_id).or_default() += 1;
            }
        }

        let mut entries = Vec::new();
        let mut rank = 1u32;
        for player in rated {
            let active = last_active
                .get(&player.id)
                .is_some_and(|date| *date >= cutoff);
            let enough_tournaments =
                qualifying.get(&player.id).copied().unwrap_or(0) >= window.num_tourneys;
            let still_in_region = player.regions.contains(region);
            if active && enough_tournaments && still_in_region {
                entries.push(RankingEntry {
                    rank,
                    player: player.id,
                    name: player.name.clone(),
                    rating: player.get_rating(region).unwrap_or_default(),
                });
                rank += 1;
            }
        }

        let ranking = Ranking {
            id: new_id(),
            region: region.to_string(),
            time: now,
            tournaments: tournaments.iter().map(|t| t.id).collect(),
            entries,
        };

        let players: Vec<Player> = refreshed.into_values().collect();
        self.database.save_players(&players).await?;
        self.database.save_ranking(&ranking).await?;
        info!(
            region,
            tournaments = ranking.tournaments.len(),
            entries = ranking.entries.len(),
            "ranking generated"
        );
        Ok(ranking)
    }
}
