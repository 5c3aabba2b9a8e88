// implementation of the tournament collection

use crate::{
    PgDb, corrupt, map_db_err,
    schema::tournament::{self, dsl},
};
use app_core::{DbError, DbResult, DbpTournament, Match, QueryOp, SourceType, Tournament};
use async_trait::async_trait;
use diesel::prelude::*;
use diesel_async::RunQueryDsl;
use tracing::instrument;
use uuid::Uuid;

// ------------------- DB-Row (SELECT/RETURNING) -------------------
#[derive(Debug, Queryable)]
pub struct DbTournament {
    pub id: Uuid,
    pub name: String,
    pub source_type: String,
    pub date: chrono::DateTime<chrono::Utc>,
    pub regions: Vec<String>,
    pub raw: String,
    pub players: Vec<Uuid>,
    pub matches: serde_json::Value,
    pub orig_ids: Vec<Uuid>,
}

impl TryFrom<DbTournament> for Tournament {
    type Error = DbError;

    fn try_from(r: DbTournament) -> Result<Self, Self::Error> {
        let source_type: SourceType = r
            .source_type
            .parse()
            .map_err(|e| corrupt("tournament", "source_type", e))?;
        let matches: Vec<Match> =
            serde_json::from_value(r.matches).map_err(|e| corrupt("tournament", "matches", e))?;
        Ok(Tournament {
            id: r.id,
            name: r.name,
            source_type,
            date: r.date,
            regions: r.regions.into_iter().collect(),
            raw: r.raw,
            players: r.players.into_iter().collect(),
            matches,
            orig_ids: r.orig_ids.into_iter().collect(),
        })
    }
}

// ------------------- INSERT / UPDATE -------------------
#[derive(Debug, Insertable, AsChangeset)]
#[diesel(table_name = tournament)]
pub struct WriteDbTournament {
    pub id: Uuid,
    pub name: String,
    pub source_type: String,
    pub date: chrono::DateTime<chrono::Utc>,
    pub regions: Vec<String>,
    pub raw: String,
    pub players: Vec<Uuid>,
    pub matches: serde_json::Value,
    pub orig_ids: Vec<Uuid>,
}

impl From<&Tournament> for WriteDbTournament {
    fn from(t: &Tournament) -> Self {
        WriteDbTournament {
            id: t.id,
            name: t.name.clone(),
            source_type: t.source_type.as_str().to_string(),
            date: t.date,
            regions: t.regions.iter().cloned().collect(),
            raw: t.raw.clone(),
            players: t.players.iter().copied().collect(),
            matches: serde_json::to_value(&t.matches).unwrap_or_default(),
            orig_ids: t.orig_ids.iter().copied().collect(),
        }
    }
}

pub(crate) async fn upsert_tournament(
    conn: &mut diesel_async::AsyncPgConnection,
    w: &WriteDbTournament,
) -> Result<(), diesel::result::Error> {
    diesel::insert_into(tournament::table)
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
impl DbpTournament for PgDb {
    #[instrument(name = "db.tournament.get", skip(self), fields(id = %tournament_id))]
    async fn get_tournament(&self, tournament_id: Uuid) -> DbResult<Option<Tournament>> {
        let mut conn = self.conn().await?;
        let row = dsl::tournament
            .filter(dsl::id.eq(tournament_id))
            .first::<DbTournament>(&mut conn)
            .await
            .optional()
            .map_err(map_db_err)?;
        row.map(Tournament::try_from).transpose()
    }

    #[instrument(
        name = "db.tournament.all",
        skip(self, players, regions),
        fields(players = players.len(), regions = regions.len())
    )]
    async fn get_all_tournaments(
        &self,
        players: &[Uuid],
        regions: &[String],
        op: QueryOp,
    ) -> DbResult<Vec<Tournament>> {
        let mut conn = self.conn().await?;
        let mut query = dsl::tournament
            .order((dsl::date.asc(), dsl::id.asc()))
            .into_boxed();

        match op {
            QueryOp::And => {
                for p in players {
                    query = query.filter(dsl::players.contains(vec![*p]));
                }
                for r in regions {
                    query = query.filter(dsl::regions.contains(vec![r.clone()]));
                }
            }
            QueryOp::Or => {
                for p in players {
                    query = query.or_filter(dsl::players.contains(vec![*p]));
                }
                for r in regions {
                    query = query.or_filter(dsl::regions.contains(vec![r.clone()]));
                }
            }
        }

        let rows = query
            .load::<DbTournament>(&mut conn)
            .await
            .map_err(map_db_err)?;
        rows.into_iter().map(Tournament::try_from).collect()
    }

    #[instrument(name = "db.tournament.save", skip(self, t), fields(id = %t.id))]
    async fn save_tournament(&self, t: &Tournament) -> DbResult<()> {
        let mut conn = self.conn().await?;
        upsert_tournament(&mut conn, &WriteDbTournament::from(t))
            .await
            .map_err(map_db_err)
    }

    #[instrument(name = "db.tournament.delete", skip(self), fields(id = %tournament_id))]
    async fn delete_tournament(&self, tournament_id: Uuid) -> DbResult<()> {
        let mut conn = self.conn().await?;
        let deleted = diesel::delete(dsl::tournament.filter(dsl::id.eq(tournament_id)))
            .execute(&mut conn)
            .await
            .map_err(map_db_err)?;
        if deleted == 0 {
            return Err(DbError::NotFound);
        }
        Ok(())
    }
}
