// implementation of the merge collection and its atomic commits

use crate::{
    PgDb, map_db_err,
    player::{WriteDbPlayer, upsert_player},
    schema::merge::{self, dsl},
    tournament::{WriteDbTournament, upsert_tournament},
};
use app_core::{DbResult, DbpMerge, Merge, Player, Tournament};
use async_trait::async_trait;
use diesel::prelude::*;
use diesel_async::{AsyncConnection, RunQueryDsl, scoped_futures::ScopedFutureExt};
use tracing::{info, instrument};
use uuid::Uuid;

#[derive(Debug, Queryable, Insertable)]
#[diesel(table_name = merge)]
pub struct DbMerge {
    pub id: Uuid,
    pub requester: Uuid,
    pub source_player: Uuid,
    pub target_player: Uuid,
    pub time: chrono::DateTime<chrono::Utc>,
}

impl From<DbMerge> for Merge {
    fn from(r: DbMerge) -> Self {
        Merge {
            id: r.id,
            requester: r.requester,
            source_player: r.source_player,
            target_player: r.target_player,
            time: r.time,
        }
    }
}

impl From<&Merge> for DbMerge {
    fn from(m: &Merge) -> Self {
        DbMerge {
            id: m.id,
            requester: m.requester,
            source_player: m.source_player,
            target_player: m.target_player,
            time: m.time,
        }
    }
}

#[async_trait]
impl DbpMerge for PgDb {
    #[instrument(name = "db.merge.get", skip(self), fields(id = %merge_id))]
    async fn get_merge(&self, merge_id: Uuid) -> DbResult<Option<Merge>> {
        let mut conn = self.conn().await?;
        let row = dsl::merge
            .filter(dsl::id.eq(merge_id))
            .first::<DbMerge>(&mut conn)
            .await
            .optional()
            .map_err(map_db_err)?;
        Ok(row.map(Merge::from))
    }

    #[instrument(name = "db.merge.all", skip(self))]
    async fn get_all_merges(&self) -> DbResult<Vec<Merge>> {
        let mut conn = self.conn().await?;
        let rows = dsl::merge
            .order((dsl::time.asc(), dsl::id.asc()))
            .load::<DbMerge>(&mut conn)
            .await
            .map_err(map_db_err)?;
        Ok(rows.into_iter().map(Merge::from).collect())
    }

    #[instrument(
        name = "db.merge.commit",
        skip(self, m, players, tournaments),
        fields(id = %m.id, players = players.len(), tournaments = tournaments.len())
    )]
    async fn commit_merge(
        &self,
        m: &Merge,
        players: &[Player],
        tournaments: &[Tournament],
    ) -> DbResult<()> {
        let mut conn = self.conn().await?;
        let record = DbMerge::from(m);
        let player_writes: Vec<WriteDbPlayer> = players.iter().map(WriteDbPlayer::from).collect();
        let tournament_writes: Vec<WriteDbTournament> =
            tournaments.iter().map(WriteDbTournament::from).collect();

        conn.transaction::<(), diesel::result::Error, _>(|conn| {
            async move {
                diesel::insert_into(merge::table)
                    .values(&record)
                    .execute(conn)
                    .await?;
                for w in &player_writes {
                    upsert_player(conn, w).await?;
                }
                for w in &tournament_writes {
                    upsert_tournament(conn, w).await?;
                }
                Ok(())
            }
            .scope_boxed()
        })
        .await
        .map_err(map_db_err)?;
        info!("merge committed");
        Ok(())
    }

    #[instrument(
        name = "db.merge.rollback",
        skip(self, players, tournaments),
        fields(id = %merge_id, players = players.len(), tournaments = tournaments.len())
    )]
    async fn commit_unmerge(
        &self,
        merge_id: Uuid,
        players: &[Player],
        tournaments: &[Tournament],
    ) -> DbResult<()> {
        let mut conn = self.conn().await?;
        let player_writes: Vec<WriteDbPlayer> = players.iter().map(WriteDbPlayer::from).collect();
        let tournament_writes: Vec<WriteDbTournament> =
            tournaments.iter().map(WriteDbTournament::from).collect();

        conn.transaction::<(), diesel::result::Error, _>(|conn| {
            async move {
                let deleted = diesel::delete(
                    crate::schema::merge::dsl::merge
                        .filter(crate::schema::merge::dsl::id.eq(merge_id)),
                )
                .execute(conn)
                .await?;
                if deleted == 0 {
                    return Err(diesel::result::Error::NotFound);
                }
                for w in &player_writes {
                    upsert_player(conn, w).await?;
                }
                for w in &tournament_writes {
                    upsert_tournament(conn, w).await?;
                }
                Ok(())
            }
            .scope_boxed()
        })
        .await
        .map_err(map_db_err)?;
        info!("merge undone");
        Ok(())
    }
}
