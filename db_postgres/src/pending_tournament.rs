// implementation of the pending_tournament collection

use crate::{
    PgDb, corrupt, map_db_err,
    schema::pending_tournament::{self, dsl},
    tournament::{WriteDbTournament, upsert_tournament},
};
use app_core::{
    AliasMapping, AliasMatch, DbError, DbResult, DbpPendingTournament, PendingTournament,
    SourceType, Tournament,
};
use async_trait::async_trait;
use diesel::prelude::*;
use diesel_async::{AsyncConnection, RunQueryDsl, scoped_futures::ScopedFutureExt};
use tracing::{info, instrument};
use uuid::Uuid;

// ------------------- DB-Row (SELECT/RETURNING) -------------------
#[derive(Debug, Queryable)]
pub struct DbPendingTournament {
    pub id: Uuid,
    pub name: String,
    pub source_type: String,
    pub date: chrono::DateTime<chrono::Utc>,
    pub regions: Vec<String>,
    pub raw: String,
    pub aliases: Vec<String>,
    pub alias_matches: serde_json::Value,
    pub alias_mappings: serde_json::Value,
}

impl TryFrom<DbPendingTournament> for PendingTournament {
    type Error = DbError;

    fn try_from(r: DbPendingTournament) -> Result<Self, Self::Error> {
        let source_type: SourceType = r
            .source_type
            .parse()
            .map_err(|e| corrupt("pending_tournament", "source_type", e))?;
        let alias_matches: Vec<AliasMatch> = serde_json::from_value(r.alias_matches)
            .map_err(|e| corrupt("pending_tournament", "alias_matches", e))?;
        let alias_mappings: Vec<AliasMapping> = serde_json::from_value(r.alias_mappings)
            .map_err(|e| corrupt("pending_tournament", "alias_mappings", e))?;
        Ok(PendingTournament {
            id: r.id,
            name: r.name,
            source_type,
            date: r.date,
            regions: r.regions.into_iter().collect(),
            raw: r.raw,
            aliases: r.aliases,
            alias_matches,
            alias_mappings,
        })
    }
}

// ------------------- INSERT / UPDATE -------------------
#[derive(Debug, Insertable, AsChangeset)]
#[diesel(table_name = pending_tournament)]
pub struct WriteDbPendingTournament {
    pub id: Uuid,
    pub name: String,
    pub source_type: String,
    pub date: chrono::DateTime<chrono::Utc>,
    pub regions: Vec<String>,
    pub raw: String,
    pub aliases: Vec<String>,
    pub alias_matches: serde_json::Value,
    pub alias_mappings: serde_json::Value,
}

impl From<&PendingTournament> for WriteDbPendingTournament {
    fn from(p: &PendingTournament) -> Self {
        WriteDbPendingTournament {
            id: p.id,
            name: p.name.clone(),
            source_type: p.source_type.as_str().to_string(),
            date: p.date,
            regions: p.regions.iter().cloned().collect(),
            raw: p.raw.clone(),
            aliases: p.aliases.clone(),
            alias_matches: serde_json::to_value(&p.alias_matches).unwrap_or_default(),
            alias_mappings: serde_json::to_value(&p.alias_mappings).unwrap_or_default(),
        }
    }
}

// ------------------- Impl trait --------------------

#[async_trait]
impl DbpPendingTournament for PgDb {
    #[instrument(name = "db.pending.get", skip(self), fields(id = %pending_id))]
    async fn get_pending_tournament(&self, pending_id: Uuid) -> DbResult<Option<PendingTournament>> {
        let mut conn = self.conn().await?;
        let row = dsl::pending_tournament
            .filter(dsl::id.eq(pending_id))
            .first::<DbPendingTournament>(&mut conn)
            .await
            .optional()
            .map_err(map_db_err)?;
        row.map(PendingTournament::try_from).transpose()
    }

    #[instrument(name = "db.pending.all", skip(self, regions), fields(regions = regions.len()))]
    async fn get_all_pending_tournaments(
        &self,
        regions: &[String],
    ) -> DbResult<Vec<PendingTournament>> {
        let mut conn = self.conn().await?;
        let mut query = dsl::pending_tournament
            .order((dsl::date.asc(), dsl::id.asc()))
            .into_boxed();
        if !regions.is_empty() {
            query = query.filter(dsl::regions.overlaps_with(regions.to_vec()));
        }
        let rows = query
            .load::<DbPendingTournament>(&mut conn)
            .await
            .map_err(map_db_err)?;
        rows.into_iter().map(PendingTournament::try_from).collect()
    }

    #[instrument(name = "db.pending.save", skip(self, p), fields(id = %p.id))]
    async fn save_pending_tournament(&self, p: &PendingTournament) -> DbResult<()> {
        let mut conn = self.conn().await?;
        let w = WriteDbPendingTournament::from(p);
        diesel::insert_into(pending_tournament::table)
            .values(&w)
            .on_conflict(dsl::id)
            .do_update()
            .set(&w)
            .execute(&mut conn)
            .await
            .map_err(map_db_err)?;
        Ok(())
    }

    #[instrument(name = "db.pending.delete", skip(self), fields(id = %pending_id))]
    async fn delete_pending_tournament(&self, pending_id: Uuid) -> DbResult<()> {
        let mut conn = self.conn().await?;
        let deleted = diesel::delete(dsl::pending_tournament.filter(dsl::id.eq(pending_id)))
            .execute(&mut conn)
            .await
            .map_err(map_db_err)?;
        if deleted == 0 {
            return Err(DbError::NotFound);
        }
        Ok(())
    }

    #[instrument(
        name = "db.pending.finalize",
        skip(self, t),
        fields(tournament = %t.id, pending = %pending_id)
    )]
    async fn finalize_pending_tournament(
        &self,
        t: &Tournament,
        pending_id: Uuid,
    ) -> DbResult<()> {
        let mut conn = self.conn().await?;
        let w = WriteDbTournament::from(t);
        conn.transaction::<(), diesel::result::Error, _>(|conn| {
            async move {
                let deleted = diesel::delete(
                    crate::schema::pending_tournament::dsl::pending_tournament
                        .filter(crate::schema::pending_tournament::dsl::id.eq(pending_id)),
                )
                .execute(conn)
                .await?;
                if deleted == 0 {
                    // pending already finalized or removed; roll back
                    return Err(diesel::result::Error::NotFound);
                }
                upsert_tournament(conn, &w).await?;
                Ok(())
            }
            .scope_boxed()
        })
        .await
        .map_err(map_db_err)?;
        info!(tournament = %t.id, "pending tournament finalized");
        Ok(())
    }
}
