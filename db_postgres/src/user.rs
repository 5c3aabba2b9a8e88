// implementation of the user and session collections

use crate::{
    PgDb, corrupt, map_db_err,
    schema::{session, user},
};
use app_core::{AdminLevel, DbError, DbResult, DbpSession, DbpUser, User};
use async_trait::async_trait;
use diesel::prelude::*;
use diesel_async::{AsyncConnection, RunQueryDsl, scoped_futures::ScopedFutureExt};
use tracing::instrument;
use uuid::Uuid;

fn admin_level_to_db(level: Option<AdminLevel>) -> Option<String> {
    level.map(|l| {
        match l {
            AdminLevel::Region => "REGION",
            AdminLevel::Super => "SUPER",
        }
        .to_string()
    })
}

fn admin_level_from_db(raw: Option<String>) -> Result<Option<AdminLevel>, DbError> {
    match raw.as_deref() {
        None => Ok(None),
        Some("REGION") => Ok(Some(AdminLevel::Region)),
        Some("SUPER") => Ok(Some(AdminLevel::Super)),
        Some(other) => Err(corrupt("user", "admin_level", other)),
    }
}

#[derive(Debug, Queryable)]
pub struct DbUser {
    pub id: Uuid,
    pub username: String,
    pub salt: String,
    pub hashed_password: String,
    pub admin_regions: Vec<String>,
    pub admin_level: Option<String>,
}

impl TryFrom<DbUser> for User {
    type Error = DbError;

    fn try_from(r: DbUser) -> Result<Self, Self::Error> {
        Ok(User {
            id: r.id,
            username: r.username,
            salt: r.salt,
            hashed_password: r.hashed_password,
            admin_regions: r.admin_regions.into_iter().collect(),
            admin_level: admin_level_from_db(r.admin_level)?,
        })
    }
}

#[derive(Debug, Insertable, AsChangeset)]
#[diesel(table_name = user)]
#[diesel(treat_none_as_null = true)]
pub struct WriteDbUser {
    pub id: Uuid,
    pub username: String,
    pub salt: String,
    pub hashed_password: String,
    pub admin_regions: Vec<String>,
    pub admin_level: Option<String>,
}

impl From<&User> for WriteDbUser {
    fn from(u: &User) -> Self {
        WriteDbUser {
            id: u.id,
            username: u.username.clone(),
            salt: u.salt.clone(),
            hashed_password: u.hashed_password.clone(),
            admin_regions: u.admin_regions.iter().cloned().collect(),
            admin_level: admin_level_to_db(u.admin_level),
        }
    }
}

#[derive(Debug, Queryable, Insertable)]
#[diesel(table_name = session)]
pub struct DbSession {
    pub id: String,
    pub user_id: Uuid,
}

#[async_trait]
impl DbpUser for PgDb {
    #[instrument(name = "db.user.get", skip(self), fields(id = %user_id))]
    async fn get_user(&self, user_id: Uuid) -> DbResult<Option<User>> {
        let mut conn = self.conn().await?;
        let row = user::dsl::user
            .filter(user::dsl::id.eq(user_id))
            .first::<DbUser>(&mut conn)
            .await
            .optional()
            .map_err(map_db_err)?;
        row.map(User::try_from).transpose()
    }

    #[instrument(name = "db.user.by_username", skip(self, username))]
    async fn get_user_by_username(&self, username: &str) -> DbResult<Option<User>> {
        let mut conn = self.conn().await?;
        let row = user::dsl::user
            .filter(user::dsl::username.eq(username))
            .first::<DbUser>(&mut conn)
            .await
            .optional()
            .map_err(map_db_err)?;
        row.map(User::try_from).transpose()
    }

    #[instrument(name = "db.user.all", skip(self))]
    async fn get_all_users(&self) -> DbResult<Vec<User>> {
        let mut conn = self.conn().await?;
        let rows = user::dsl::user
            .order((user::dsl::username.asc(), user::dsl::id.asc()))
            .load::<DbUser>(&mut conn)
            .await
            .map_err(map_db_err)?;
        rows.into_iter().map(User::try_from).collect()
    }

    #[instrument(name = "db.user.save", skip(self, u), fields(id = %u.id))]
    async fn save_user(&self, u: &User) -> DbResult<()> {
        let mut conn = self.conn().await?;
        let w = WriteDbUser::from(u);
        diesel::insert_into(user::table)
            .values(&w)
            .on_conflict(user::dsl::id)
            .do_update()
            .set(&w)
            .execute(&mut conn)
            .await
            .map_err(map_db_err)?;
        Ok(())
    }
}

#[async_trait]
impl DbpSession for PgDb {
    #[instrument(name = "db.session.resolve", skip_all)]
    async fn get_user_by_session(&self, session_id: &str) -> DbResult<Option<User>> {
        let mut conn = self.conn().await?;
        let session = session::dsl::session
            .filter(session::dsl::id.eq(session_id))
            .first::<DbSession>(&mut conn)
            .await
            .optional()
            .map_err(map_db_err)?;
        let Some(session) = session else {
            return Ok(None);
        };
        let row = user::dsl::user
            .filter(user::dsl::id.eq(session.user_id))
            .first::<DbUser>(&mut conn)
            .await
            .optional()
            .map_err(map_db_err)?;
        row.map(User::try_from).transpose()
    }

    #[instrument(name = "db.session.replace", skip_all, fields(user = %user_id))]
    async fn replace_session_for_user(&self, user_id: Uuid, session_id: &str) -> DbResult<()> {
        let mut conn = self.conn().await?;
        let record = DbSession {
            id: session_id.to_string(),
            user_id,
        };
        // one session per user: drop any prior one in the same transaction
        conn.transaction::<(), diesel::result::Error, _>(|conn| {
            async move {
                diesel::delete(
                    session::dsl::session.filter(session::dsl::user_id.eq(user_id)),
                )
                .execute(conn)
                .await?;
                diesel::insert_into(session::table)
                    .values(&record)
                    .execute(conn)
                    .await?;
                Ok(())
            }
            .scope_boxed()
        })
        .await
        .map_err(map_db_err)?;
        Ok(())
    }

    #[instrument(name = "db.session.delete", skip_all, fields(user = %user_id))]
    async fn delete_session_for_user(&self, user_id: Uuid) -> DbResult<()> {
        let mut conn = self.conn().await?;
        diesel::delete(session::dsl::session.filter(session::dsl::user_id.eq(user_id)))
            .execute(&mut conn)
            .await
            .map_err(map_db_err)?;
        Ok(())
    }
}
