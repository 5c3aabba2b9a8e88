// implementation of the region collection

use crate::{PgDb, map_db_err, schema::region::dsl};
use app_core::{DbResult, DbpRegion, Region};
use async_trait::async_trait;
use diesel::prelude::*;
use diesel_async::RunQueryDsl;
use tracing::instrument;

#[derive(Debug, Queryable, Insertable)]
#[diesel(table_name = crate::schema::region)]
pub struct DbRegion {
    pub id: String,
    pub display_name: String,
}

impl From<DbRegion> for Region {
    fn from(r: DbRegion) -> Self {
        Region {
            id: r.id,
            display_name: r.display_name,
        }
    }
}

#[async_trait]
impl DbpRegion for PgDb {
    #[instrument(name = "db.region.get", skip(self))]
    async fn get_region(&self, region_id: &str) -> DbResult<Option<Region>> {
        let mut conn = self.conn().await?;
        let row = dsl::region
            .filter(dsl::id.eq(region_id))
            .first::<DbRegion>(&mut conn)
            .await
            .optional()
            .map_err(map_db_err)?;
        Ok(row.map(Region::from))
    }

    #[instrument(name = "db.region.all", skip(self))]
    async fn get_all_regions(&self) -> DbResult<Vec<Region>> {
        let mut conn = self.conn().await?;
        let rows = dsl::region
            .order((dsl::display_name.asc(), dsl::id.asc()))
            .load::<DbRegion>(&mut conn)
            .await
            .map_err(map_db_err)?;
        Ok(rows.into_iter().map(Region::from).collect())
    }

    #[instrument(name = "db.region.save", skip(self, region), fields(id = %region.id))]
    async fn save_region(&self, region: &Region) -> DbResult<()> {
        let mut conn = self.conn().await?;
        // regions are immutable once created
        diesel::insert_into(dsl::region)
            .values(DbRegion {
                id: region.id.clone(),
                display_name: region.display_name.clone(),
            })
            .on_conflict_do_nothing()
            .execute(&mut conn)
            .await
            .map_err(map_db_err)?;
        Ok(())
    }
}
