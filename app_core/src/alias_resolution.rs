//! Best-guess mapping from scraped aliases to registered players.
//!
//! Read-only: a pure function of the current database state.

use crate::{
    AliasMapping, Core, CoreResult, DbpPlayer, utils::normalize::normalize_alias,
    utils::similarity::closeness,
};
use tracing::instrument;
use uuid::Uuid;

impl Core {
    /// Propose the best-matching player for every alias of a pending
    /// tournament; unresolved aliases map to `None`.
    #[instrument(name = "alias.resolve", skip(self, aliases), fields(count = aliases.len()))]
    pub async fn get_alias_mappings(
        &self,
        region: &str,
        aliases: &[String],
    ) -> CoreResult<Vec<AliasMapping>> {
        let mut mappings = Vec::with_capacity(aliases.len());
        for alias in aliases {
            mappings.push(AliasMapping {
                player_alias: alias.clone(),
                player_id: self.top_suggestion_for_alias(region, alias).await?,
            });
        }
        Ok(mappings)
    }

    /// Resolution policy: an exact alias match inside the region wins;
    /// otherwise the similar-alias candidate closest to the query by edit
    /// distance. Candidates arrive ordered by id ascending (v7 ids:
    /// creation order), so on equal closeness the earliest player wins.
    async fn top_suggestion_for_alias(
        &self,
        region: &str,
        alias: &str,
    ) -> CoreResult<Option<Uuid>> {
        if let Some(player) = self.database.get_player_by_alias(alias, region).await? {
            return Ok(Some(player.id));
        }

        let query = normalize_alias(alias);
        let mut best: Option<(f64, Uuid)> = None;
        for candidate in self.find_similar_aliases(alias).await? {
            let score = candidate
                .aliases
                .iter()
                .map(|candidate_alias| closeness(&query, candidate_alias))
                .fold(0.0, f64::max);
            if best.is_none_or(|(best_score, _)| score > best_score) {
                best = Some((score, candidate.id));
            }
        }
        Ok(best.map(|(_, id)| id))
    }
}
