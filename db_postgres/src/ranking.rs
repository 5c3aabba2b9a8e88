// implementation of the ranking collection

use crate::{
    PgDb, corrupt, map_db_err,
    schema::ranking::{self, dsl},
};
use app_core::{DbError, DbResult, DbpRanking, Ranking, RankingEntry};
use async_trait::async_trait;
use diesel::prelude::*;
use diesel_async::RunQueryDsl;
use tracing::instrument;
use uuid::Uuid;

#[derive(Debug, Queryable)]
pub struct DbRanking {
    pub id: Uuid,
    pub region: String,
    pub time: chrono::DateTime<chrono::Utc>,
    pub tournaments: Vec<Uuid>,
    pub entries: serde_json::Value,
}

impl TryFrom<DbRanking> for Ranking {
    type Error = DbError;

    fn try_from(r: DbRanking) -> Result<Self, Self::Error> {
        let entries: Vec<RankingEntry> =
            serde_json::from_value(r.entries).map_err(|e| corrupt("ranking", "entries", e))?;
        Ok(Ranking {
            id: r.id,
            region: r.region,
            time: r.time,
            tournaments: r.tournaments,
            entries,
        })
    }
}

#[derive(Debug, Insertable)]
#[diesel(table_name = ranking)]
pub struct WriteDbRanking {
    pub id: Uuid,
    pub region: String,
    pub time: chrono::DateTime<chrono::Utc>,
    pub tournaments: Vec<Uuid>,
    pub entries: serde_json::Value,
}

impl From<&Ranking> for WriteDbRanking {
    fn from(r: &Ranking) -> Self {
        WriteDbRanking {
            id: r.id,
            region: r.region.clone(),
            time: r.time,
            tournaments: r.tournaments.clone(),
            entries: serde_json::to_value(&r.entries).unwrap_or_default(),
        }
    }
}

#[async_trait]
impl DbpRanking for PgDb {
    #[instrument(name = "db.ranking.latest", skip(self))]
    async fn get_latest_ranking(&self, region_id: &str) -> DbResult<Option<Ranking>> {
        let mut conn = self.conn().await?;
        let row = dsl::ranking
            .filter(dsl::region.eq(region_id))
            .order((dsl::time.desc(), dsl::id.desc()))
            .first::<DbRanking>(&mut conn)
            .await
            .optional()
            .map_err(map_db_err)?;
        row.map(Ranking::try_from).transpose()
    }

    #[instrument(name = "db.ranking.save", skip(self, r), fields(id = %r.id, region = %r.region))]
    async fn save_ranking(&self, r: &Ranking) -> DbResult<()> {
        let mut conn = self.conn().await?;
        // rankings are append-only
        diesel::insert_into(ranking::table)
            .values(WriteDbRanking::from(r))
            .execute(&mut conn)
            .await
            .map_err(map_db_err)?;
        Ok(())
    }
}
