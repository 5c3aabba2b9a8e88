// implementation of the player collection

use crate::{
    PgDb, corrupt,
    helpers::lower,
    map_db_err,
    schema::player::{self, dsl},
};
use app_core::{DbResult, DbpPlayer, Player, Rating, utils::normalize::normalize_alias};
use async_trait::async_trait;
use diesel::prelude::*;
use diesel_async::RunQueryDsl;
use std::collections::{BTreeMap, BTreeSet};
use tracing::{debug, instrument};
use uuid::Uuid;

// ------------------- DB-Row (SELECT/RETURNING) -------------------
#[derive(Debug, Queryable)]
pub struct DbPlayer {
    pub id: Uuid,
    pub name: String,
    pub aliases: Vec<String>,
    pub regions: Vec<String>,
    pub ratings: serde_json::Value,
    pub merged: bool,
    pub merge_parent: Option<Uuid>,
    pub merge_children: Vec<Uuid>,
}

// Mapping DB -> Core
impl TryFrom<DbPlayer> for Player {
    type Error = app_core::DbError;

    fn try_from(r: DbPlayer) -> Result<Self, Self::Error> {
        let ratings: BTreeMap<String, Rating> =
            serde_json::from_value(r.ratings).map_err(|e| corrupt("player", "ratings", e))?;
        Ok(Player {
            id: r.id,
            name: r.name,
            aliases: r.aliases.into_iter().collect(),
            regions: r.regions.into_iter().collect(),
            ratings,
            merged: r.merged,
            merge_parent: r.merge_parent,
            merge_children: r.merge_children.into_iter().collect(),
        })
    }
}

// ------------------- INSERT / UPDATE -------------------
#[derive(Debug, Insertable, AsChangeset)]
#[diesel(table_name = player)]
#[diesel(treat_none_as_null = true)]
pub struct WriteDbPlayer {
    pub id: Uuid,
    pub name: String,
    pub aliases: Vec<String>,
    pub regions: Vec<String>,
    pub ratings: serde_json::Value,
    pub merged: bool,
    pub merge_parent: Option<Uuid>,
    pub merge_children: Vec<Uuid>,
}

// Mapping Core -> DB
impl From<&Player> for WriteDbPlayer {
    fn from(p: &Player) -> Self {
        WriteDbPlayer {
            id: p.id,
            name: p.name.clone(),
            aliases: set_to_vec(&p.aliases),
            regions: set_to_vec(&p.regions),
            ratings: serde_json::to_value(&p.ratings).unwrap_or_default(),
            merged: p.merged,
            merge_parent: p.merge_parent,
            merge_children: p.merge_children.iter().copied().collect(),
        }
    }
}

fn set_to_vec(set: &BTreeSet<String>) -> Vec<String> {
    set.iter().cloned().collect()
}

pub(crate) async fn upsert_player(
    conn: &mut diesel_async::AsyncPgConnection,
    w: &WriteDbPlayer,
) -> Result<(), diesel::result::Error> {
    diesel::insert_into(player::table)
        .values(w)
        .on_conflict(dsl::id)
        .do_update()
        .set(w)
        .execute(conn)
        .await?;
    Ok(())
}

// ------------------- Impl trait --------------------

#[async_trait]
impl DbpPlayer for PgDb {
    #[instrument(name = "db.player.get", skip(self), fields(id = %player_id))]
    async fn get_player(&self, player_id: Uuid) -> DbResult<Option<Player>> {
        let mut conn = self.conn().await?;
        let row = dsl::player
            .filter(dsl::id.eq(player_id))
            .first::<DbPlayer>(&mut conn)
            .await
            .optional()
            .map_err(map_db_err)?;
        row.map(Player::try_from).transpose()
    }

    #[instrument(name = "db.player.by_alias", skip(self))]
    async fn get_player_by_alias(&self, alias: &str, region: &str) -> DbResult<Option<Player>> {
        let alias = normalize_alias(alias);
        let mut conn = self.conn().await?;
        let row = dsl::player
            .filter(dsl::aliases.contains(vec![alias]))
            .filter(dsl::regions.contains(vec![region.to_string()]))
            .filter(dsl::merged.eq(false))
            .order(dsl::id.asc())
            .first::<DbPlayer>(&mut conn)
            .await
            .optional()
            .map_err(map_db_err)?;
        match row {
            Some(row) => {
                debug!("row_found");
                Ok(Some(Player::try_from(row)?))
            }
            None => Ok(None),
        }
    }

    #[instrument(name = "db.player.by_alias_all_regions", skip(self))]
    async fn get_players_by_alias(
        &self,
        alias: &str,
        include_merged: bool,
    ) -> DbResult<Vec<Player>> {
        let alias = normalize_alias(alias);
        let mut conn = self.conn().await?;
        let mut query = dsl::player
            .filter(dsl::aliases.contains(vec![alias]))
            .order(dsl::id.asc())
            .into_boxed();
        if !include_merged {
            query = query.filter(dsl::merged.eq(false));
        }
        let rows = query.load::<DbPlayer>(&mut conn).await.map_err(map_db_err)?;
        rows.into_iter().map(Player::try_from).collect()
    }

    #[instrument(name = "db.player.by_any_alias", skip(self, aliases), fields(count = aliases.len()))]
    async fn get_players_by_any_alias(&self, aliases: &[String]) -> DbResult<Vec<Player>> {
        let mut conn = self.conn().await?;
        let rows = dsl::player
            .filter(dsl::aliases.overlaps_with(aliases.to_vec()))
            .filter(dsl::merged.eq(false))
            .order(dsl::id.asc())
            .load::<DbPlayer>(&mut conn)
            .await
            .map_err(map_db_err)?;
        rows.into_iter().map(Player::try_from).collect()
    }

    #[instrument(name = "db.player.all", skip(self))]
    async fn get_all_players(
        &self,
        region: Option<&str>,
        include_merged: bool,
    ) -> DbResult<Vec<Player>> {
        let mut conn = self.conn().await?;
        let mut query = dsl::player
            .order((lower(dsl::name).asc(), dsl::id.asc()))
            .into_boxed();
        if let Some(region) = region {
            query = query.filter(dsl::regions.contains(vec![region.to_string()]));
        }
        if !include_merged {
            query = query.filter(dsl::merged.eq(false));
        }
        let rows = query.load::<DbPlayer>(&mut conn).await.map_err(map_db_err)?;
        rows.into_iter().map(Player::try_from).collect()
    }

    #[instrument(name = "db.player.save", skip(self, p), fields(id = %p.id))]
    async fn save_player(&self, p: &Player) -> DbResult<()> {
        let mut conn = self.conn().await?;
        upsert_player(&mut conn, &WriteDbPlayer::from(p))
            .await
            .map_err(map_db_err)
    }

    #[instrument(name = "db.player.save_many", skip(self, players), fields(count = players.len()))]
    async fn save_players(&self, players: &[Player]) -> DbResult<()> {
        let mut conn = self.conn().await?;
        for p in players {
            upsert_player(&mut conn, &WriteDbPlayer::from(p))
                .await
                .map_err(map_db_err)?;
        }
        Ok(())
    }
}
