// diesel postgres implementation of the database port

pub mod helpers;
pub mod merge;
pub mod pending_tournament;
pub mod player;
pub mod ranking;
pub mod region;
pub mod schema;
pub mod tournament;
pub mod user;

pub use helpers::*;

use anyhow::anyhow;
use app_core::{DatabasePort, DbError, DbResult};
use async_trait::async_trait;
use diesel::sql_types::Integer;
use diesel_async::{
    AsyncMigrationHarness, AsyncPgConnection, RunQueryDsl,
    pooled_connection::{
        AsyncDieselConnectionManager,
        bb8::{Pool, PooledConnection},
    },
};
use diesel_migrations::{EmbeddedMigrations, MigrationHarness, embed_migrations};
use tracing::{info, instrument};
use url::Url;

const MIGRATIONS: EmbeddedMigrations = embed_migrations!();

/// Connection pool over the document collections. One instance lives for
/// the whole process; every port method checks a connection out per call.
pub struct PgDb {
    pool: Pool<AsyncPgConnection>,
}

impl PgDb {
    /// Build the pool. Fails when the pool itself cannot be constructed;
    /// an unreachable database surfaces on first checkout instead.
    pub async fn connect(database: Url) -> DbResult<Self> {
        let manager = AsyncDieselConnectionManager::new(database);
        let pool = Pool::builder()
            .build(manager)
            .await
            .map_err(|e| DbError::Other(anyhow!("building connection pool: {e}")))?;
        Ok(PgDb { pool })
    }

    /// Bring the collections up to date. The migration harness is
    /// blocking, so it gets its own connection on the blocking pool.
    #[instrument(name = "db.migrate", skip(self))]
    pub async fn migrate_to_latest(&self) -> DbResult<()> {
        let conn = self
            .pool
            .get_owned()
            .await
            .map_err(|e| DbError::Other(anyhow!("checking out migration connection: {e}")))?;

        let applied = tokio::task::spawn_blocking(move || {
            AsyncMigrationHarness::new(conn)
                .run_pending_migrations(MIGRATIONS)
                .map(|versions| versions.len())
                .map_err(|e| DbError::Other(anyhow!("running migrations: {e}")))
        })
        .await
        .map_err(|e| DbError::Other(anyhow!("migration task failed: {e}")))??;

        info!(applied, "collections migrated");
        Ok(())
    }

    /// One pooled connection per port call; checkout failures (exhausted
    /// pool, dead database) fold into the port's error type.
    pub(crate) async fn conn(&self) -> DbResult<PooledConnection<'_, AsyncPgConnection>> {
        self.pool
            .get()
            .await
            .map_err(|e| DbError::Other(anyhow!("checking out connection: {e}")))
    }
}

#[async_trait]
impl DatabasePort for PgDb {
    #[instrument(name = "db.ping", skip(self))]
    async fn ping_db(&self) -> DbResult<()> {
        let mut conn = self.conn().await?;
        diesel::select(diesel::dsl::sql::<Integer>("1"))
            .get_result::<i32>(&mut conn)
            .await
            .map_err(map_db_err)?;
        Ok(())
    }
}
