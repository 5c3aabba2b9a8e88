//! Pending-tournament lifecycle: capture from a scraper, admin mapping
//! edits, and finalization into a canonical tournament.

use crate::{
    Core, CoreError, CoreResult, DbpPendingTournament, DbpPlayer, DbpRegion, PendingTournament,
    Scraper, SourceType, Tournament,
};
use std::collections::BTreeMap;
use tracing::{info, instrument};
use uuid::Uuid;

impl Core {
    /// Capture a scraped bracket as a pending tournament in one region and
    /// seed its alias mappings with best-guess suggestions.
    #[instrument(name = "pending.create", skip(self, scraper))]
    pub async fn create_pending_tournament(
        &self,
        source_type: SourceType,
        scraper: &dyn Scraper,
        region: &str,
    ) -> CoreResult<PendingTournament> {
        if self.database.get_region(region).await?.is_none() {
            return Err(CoreError::not_found(format!("region '{region}'")));
        }
        let mut pending =
            PendingTournament::from_scraper(source_type, scraper, [region.to_string()]);
        pending.validate()?;
        pending.alias_mappings = self.get_alias_mappings(region, &pending.aliases).await?;
        self.database.save_pending_tournament(&pending).await?;
        info!(pending = %pending.id, aliases = pending.aliases.len(), "pending tournament captured");
        Ok(pending)
    }

    /// Upsert admin-provided alias mappings on a pending tournament.
    #[instrument(name = "pending.map_aliases", skip(self, entries))]
    pub async fn update_alias_mappings(
        &self,
        pending_id: Uuid,
        entries: &[(String, Option<Uuid>)],
    ) -> CoreResult<PendingTournament> {
        let Some(mut pending) = self.database.get_pending_tournament(pending_id).await? else {
            return Err(CoreError::not_found("pending tournament"));
        };
        for (alias, player_id) in entries {
            pending.set_alias_mapping(alias, *player_id)?;
        }
        pending.validate()?;
        self.database.save_pending_tournament(&pending).await?;
        Ok(pending)
    }

    /// Turn a fully mapped pending tournament into a canonical one.
    ///
    /// Unmapped aliases become new players in the pending tournament's
    /// region. A mapping pointing at a player merged since it was made is a
    /// conflict; the admin has to remap or undo that merge first. On
    /// success the canonical tournament is persisted and the pending record
    /// deleted in one atomic write; on any validation failure nothing of
    /// the pending record is lost.
    #[instrument(name = "pending.finalize", skip(self))]
    pub async fn finalize_pending_tournament(
        &self,
        region: &str,
        pending_id: Uuid,
    ) -> CoreResult<Tournament> {
        let lock = self.locks.finalization(pending_id);
        let _guard = lock.lock().await;

        let Some(mut pending) = self.database.get_pending_tournament(pending_id).await? else {
            return Err(CoreError::not_found("pending tournament"));
        };

        for alias in pending.aliases.clone() {
            let unmapped = pending
                .get_alias_mapping(&alias)
                .is_none_or(|mapping| mapping.player_id.is_none());
            if unmapped {
                let player = self.create_player(&alias, region).await?;
                pending.set_alias_mapping(&alias, Some(player.id))?;
            }
        }

        let mut resolved = BTreeMap::new();
        for alias in &pending.aliases {
            let player_id = pending
                .get_alias_mapping(alias)
                .and_then(|mapping| mapping.player_id)
                .ok_or_else(|| CoreError::not_found(format!("mapping for alias '{alias}'")))?;
            let Some(player) = self.database.get_player(player_id).await? else {
                return Err(CoreError::not_found(format!("player mapped to '{alias}'")));
            };
            if player.merged {
                return Err(CoreError::conflict("player already merged"));
            }
            resolved.insert(alias.clone(), player_id);
        }

        let tournament = pending.clone_into_tournament(&resolved)?;

        // keep the freshly created players mapped even if the atomic step
        // below fails and the admin retries
        self.database.save_pending_tournament(&pending).await?;
        self.database
            .finalize_pending_tournament(&tournament, pending.id)
            .await?;
        info!(
            pending = %pending.id,
            tournament = %tournament.id,
            players = tournament.players.len(),
            "pending tournament finalized"
        );
        Ok(tournament)
    }
}
