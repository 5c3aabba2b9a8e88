//! Identity merge engine: declaring that two player records are the same
//! person, rewriting tournament references, and undoing that declaration.
//!
//! `orig_ids` on tournaments is the only stable record of original
//! identities once merges chain; every unmerge decision is driven by it.

use crate::{
    Core, CoreResult, DbpMerge, DbpPlayer, DbpTournament, QueryOp, utils::ids::new_id,
    utils::validation::FieldError,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use tracing::{info, instrument};
use uuid::Uuid;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Merge {
    pub id: Uuid,
    /// user who requested the merge
    pub requester: Uuid,
    pub source_player: Uuid,
    pub target_player: Uuid,
    pub time: DateTime<Utc>,
}

impl Core {
    /// Absorb `source` into `target`: union aliases and regions, record the
    /// merge relationship, and rewrite every tournament where `source` is a
    /// live participant. All writes land in one atomic commit.
    ///
    /// Rejected when either player is already merged or when the two have
    /// competed in the same tournament (merging would create self-play).
    #[instrument(name = "merge.apply", skip(self))]
    pub async fn apply_merge(
        &self,
        region: &str,
        requester: Uuid,
        source_id: Uuid,
        target_id: Uuid,
        time: DateTime<Utc>,
    ) -> CoreResult<Merge> {
        let lock = self.locks.merge(region);
        let _guard = lock.lock().await;

        if source_id == target_id {
            return Err(FieldError::invalid(
                "source_player",
                "source and target must be different",
            )
            .into());
        }

        let Some(mut source) = self.database.get_player(source_id).await? else {
            return Err(crate::CoreError::not_found("source player"));
        };
        let Some(mut target) = self.database.get_player(target_id).await? else {
            return Err(crate::CoreError::not_found("target player"));
        };

        if source.merged {
            return Err(FieldError::invalid("source_player", "source is already merged").into());
        }
        if target.merged {
            return Err(FieldError::invalid("target_player", "target is already merged").into());
        }

        // players who have faced each other must stay distinct
        let shared = self
            .database
            .get_all_tournaments(&[source_id, target_id], &[], QueryOp::And)
            .await?;
        if !shared.is_empty() {
            return Err(FieldError::invalid(
                "source_player",
                "source and target have played in same tournament",
            )
            .into());
        }

        target.aliases.extend(source.aliases.iter().cloned());
        target.regions.extend(source.regions.iter().cloned());
        target.merge_children.insert(source.id);
        target
            .merge_children
            .extend(source.merge_children.iter().copied());
        source.merge_parent = Some(target.id);
        source.merged = true;
        source.validate()?;
        target.validate()?;

        let mut tournaments = self
            .database
            .get_all_tournaments(&[source_id], &[], QueryOp::And)
            .await?;
        for tournament in &mut tournaments {
            tournament.replace_player(source_id, target_id);
        }

        let merge = Merge {
            id: new_id(),
            requester,
            source_player: source_id,
            target_player: target_id,
            time,
        };
        self.database
            .commit_merge(&merge, &[source, target], &tournaments)
            .await?;
        info!(merge = %merge.id, rewritten = tournaments.len(), "players merged");
        Ok(merge)
    }

    /// Undo a merge: restore the source player and hand back every
    /// tournament whose original participants (`orig_ids`) belonged to the
    /// source or one of its absorbed children.
    ///
    /// Aliases and regions unioned by the merge stay on the target; the
    /// merge record does not carry enough to reverse them.
    #[instrument(name = "merge.undo", skip(self))]
    pub async fn undo_merge(&self, region: &str, merge_id: Uuid) -> CoreResult<()> {
        let lock = self.locks.merge(region);
        let _guard = lock.lock().await;

        let Some(merge) = self.database.get_merge(merge_id).await? else {
            return Err(crate::CoreError::not_found("merge"));
        };
        let Some(mut source) = self.database.get_player(merge.source_player).await? else {
            return Err(crate::CoreError::not_found("source player"));
        };
        let Some(mut target) = self.database.get_player(merge.target_player).await? else {
            return Err(crate::CoreError::not_found("target player"));
        };

        if source.merge_parent != Some(target.id) {
            return Err(
                FieldError::invalid("source_player", "source not merged into target").into(),
            );
        }
        if target.merged {
            return Err(FieldError::invalid(
                "target_player",
                "target has been merged; undo that merge first",
            )
            .into());
        }

        let mut source_family: BTreeSet<Uuid> = source.merge_children.clone();
        source_family.insert(source.id);

        source.merge_parent = None;
        source.merged = false;
        target
            .merge_children
            .retain(|child| !source_family.contains(child));
        source.validate()?;
        target.validate()?;

        let candidates = self
            .database
            .get_all_tournaments(&[merge.source_player, merge.target_player], &[], QueryOp::Or)
            .await?;
        let mut rewritten = Vec::new();
        for mut tournament in candidates {
            let originally_sources = tournament
                .orig_ids
                .iter()
                .any(|orig| source_family.contains(orig));
            if tournament.players.contains(&target.id) && originally_sources {
                tournament.replace_player(target.id, source.id);
                rewritten.push(tournament);
            }
        }

        self.database
            .commit_unmerge(merge.id, &[source, target], &rewritten)
            .await?;
        info!(merge = %merge_id, restored = rewritten.len(), "merge undone");
        Ok(())
    }
}
