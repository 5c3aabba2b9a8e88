//! Player registry: creation, edits and similar-alias search.

use crate::{
    Core, CoreError, CoreResult, DbpPlayer, DbpRegion, Player,
    utils::{
        normalize::{normalize_alias, normalize_ws},
        similar_aliases::similar_aliases,
        validation::FieldError,
    },
};
use std::collections::BTreeSet;
use tracing::instrument;
use uuid::Uuid;

/// Admin edit of a player; absent fields stay untouched.
#[derive(Debug, Clone, Default)]
pub struct PlayerEdit {
    pub name: Option<String>,
    pub aliases: Option<Vec<String>>,
    pub regions: Option<Vec<String>>,
}

impl Core {
    /// Create a player known only by its name in one region.
    #[instrument(name = "registry.create_player", skip(self))]
    pub async fn create_player(&self, name: &str, region: &str) -> CoreResult<Player> {
        if self.database.get_region(region).await?.is_none() {
            return Err(CoreError::not_found(format!("region '{region}'")));
        }
        let player = Player::new(normalize_ws(name), region);
        player.validate()?;
        self.database.save_player(&player).await?;
        Ok(player)
    }

    /// Apply an admin edit. Aliases are lowercased on the way in and must
    /// contain the player's name; regions must exist.
    #[instrument(name = "registry.update_player", skip(self, edit))]
    pub async fn update_player(&self, id: Uuid, edit: PlayerEdit) -> CoreResult<Player> {
        let Some(mut player) = self.database.get_player(id).await? else {
            return Err(CoreError::not_found("player"));
        };

        if let Some(name) = edit.name {
            player.name = normalize_ws(name);
            if edit.aliases.is_none() {
                // keep the name-in-aliases invariant without forcing the
                // admin to resend the alias list
                player.aliases.insert(normalize_alias(&player.name));
            }
        }

        if let Some(aliases) = edit.aliases {
            let new_aliases: BTreeSet<String> =
                aliases.iter().map(normalize_alias).collect();
            if !new_aliases.contains(&normalize_alias(&player.name)) {
                return Err(FieldError::invalid(
                    "aliases",
                    "aliases must contain the player's name",
                )
                .into());
            }
            player.aliases = new_aliases;
        }

        if let Some(regions) = edit.regions {
            let mut new_regions = BTreeSet::new();
            for region in regions {
                if self.database.get_region(&region).await?.is_none() {
                    return Err(CoreError::not_found(format!("region '{region}'")));
                }
                new_regions.insert(region);
            }
            player.regions = new_regions;
        }

        player.validate()?;
        self.database.save_player(&player).await?;
        Ok(player)
    }

    /// Players across all regions (non-merged) whose aliases intersect the
    /// generated similar-alias set; ordered by player id ascending.
    #[instrument(name = "registry.find_similar_aliases", skip(self))]
    pub async fn find_similar_aliases(&self, alias: &str) -> CoreResult<Vec<Player>> {
        let candidates = similar_aliases(alias);
        if candidates.is_empty() {
            return Ok(Vec::new());
        }
        Ok(self.database.get_players_by_any_alias(&candidates).await?)
    }
}
