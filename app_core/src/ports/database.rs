// database port

use crate::{Merge, Player, PendingTournament, Ranking, Region, Tournament, User};
use async_trait::async_trait;
use thiserror::Error;
use uuid::Uuid;

/// How the filters of a tournament query combine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum QueryOp {
    /// every listed player and region must match
    #[default]
    And,
    /// any listed player or region matching is enough
    Or,
}

/// database port trait
#[async_trait]
pub trait DatabasePort:
    DbpRegion
    + DbpPlayer
    + DbpTournament
    + DbpPendingTournament
    + DbpRanking
    + DbpMerge
    + DbpUser
    + DbpSession
{
    /// liveness probe
    async fn ping_db(&self) -> DbResult<()>;
}

#[async_trait]
pub trait DbpRegion: Send + Sync {
    async fn get_region(&self, id: &str) -> DbResult<Option<Region>>;
    /// sorted by display name ascending
    async fn get_all_regions(&self) -> DbResult<Vec<Region>>;
    async fn save_region(&self, region: &Region) -> DbResult<()>;
}

#[async_trait]
pub trait DbpPlayer: Send + Sync {
    async fn get_player(&self, id: Uuid) -> DbResult<Option<Player>>;
    /// the unique non-merged player in `region` whose aliases contain the
    /// lowercased alias
    async fn get_player_by_alias(&self, alias: &str, region: &str) -> DbResult<Option<Player>>;
    /// cross-region alias lookup
    async fn get_players_by_alias(
        &self,
        alias: &str,
        include_merged: bool,
    ) -> DbResult<Vec<Player>>;
    /// cross-region, non-merged players whose alias set intersects the
    /// given aliases; ordered by player id ascending
    async fn get_players_by_any_alias(&self, aliases: &[String]) -> DbResult<Vec<Player>>;
    /// sorted by name ascending, case-insensitive, id as tiebreak
    async fn get_all_players(
        &self,
        region: Option<&str>,
        include_merged: bool,
    ) -> DbResult<Vec<Player>>;
    async fn save_player(&self, player: &Player) -> DbResult<()>;
    async fn save_players(&self, players: &[Player]) -> DbResult<()>;
}

#[async_trait]
pub trait DbpTournament: Send + Sync {
    async fn get_tournament(&self, id: Uuid) -> DbResult<Option<Tournament>>;
    /// filter by participating players and by regions, combined per `op`;
    /// sorted by date ascending, id as tiebreak
    async fn get_all_tournaments(
        &self,
        players: &[Uuid],
        regions: &[String],
        op: QueryOp,
    ) -> DbResult<Vec<Tournament>>;
    async fn save_tournament(&self, tournament: &Tournament) -> DbResult<()>;
    async fn delete_tournament(&self, id: Uuid) -> DbResult<()>;
}

#[async_trait]
pub trait DbpPendingTournament: Send + Sync {
    async fn get_pending_tournament(&self, id: Uuid) -> DbResult<Option<PendingTournament>>;
    /// sorted by date ascending
    async fn get_all_pending_tournaments(
        &self,
        regions: &[String],
    ) -> DbResult<Vec<PendingTournament>>;
    async fn save_pending_tournament(&self, pending: &PendingTournament) -> DbResult<()>;
    async fn delete_pending_tournament(&self, id: Uuid) -> DbResult<()>;
    /// persist the canonical tournament and delete the pending record as
    /// one atomic write
    async fn finalize_pending_tournament(
        &self,
        tournament: &Tournament,
        pending_id: Uuid,
    ) -> DbResult<()>;
}

#[async_trait]
pub trait DbpRanking: Send + Sync {
    /// the ranking with the greatest time for the region
    async fn get_latest_ranking(&self, region: &str) -> DbResult<Option<Ranking>>;
    async fn save_ranking(&self, ranking: &Ranking) -> DbResult<()>;
}

#[async_trait]
pub trait DbpMerge: Send + Sync {
    async fn get_merge(&self, id: Uuid) -> DbResult<Option<Merge>>;
    /// sorted by time ascending
    async fn get_all_merges(&self) -> DbResult<Vec<Merge>>;
    /// persist the merge record plus every rewritten player and
    /// tournament as one atomic write
    async fn commit_merge(
        &self,
        merge: &Merge,
        players: &[Player],
        tournaments: &[Tournament],
    ) -> DbResult<()>;
    /// delete the merge record and persist every rewritten player and
    /// tournament as one atomic write
    async fn commit_unmerge(
        &self,
        merge_id: Uuid,
        players: &[Player],
        tournaments: &[Tournament],
    ) -> DbResult<()>;
}

#[async_trait]
pub trait DbpUser: Send + Sync {
    async fn get_user(&self, id: Uuid) -> DbResult<Option<User>>;
    async fn get_user_by_username(&self, username: &str) -> DbResult<Option<User>>;
    /// sorted by username ascending
    async fn get_all_users(&self) -> DbResult<Vec<User>>;
    async fn save_user(&self, user: &User) -> DbResult<()>;
}

#[async_trait]
pub trait DbpSession: Send + Sync {
    async fn get_user_by_session(&self, session_id: &str) -> DbResult<Option<User>>;
    /// enforce one session per user: delete any prior session, then store
    /// the new one
    async fn replace_session_for_user(&self, user_id: Uuid, session_id: &str) -> DbResult<()>;
    async fn delete_session_for_user(&self, user_id: Uuid) -> DbResult<()>;
}

#[derive(Debug, Error)]
pub enum DbError {
    /// ID does not exist
    #[error("entity not found")]
    NotFound,

    /// constraint name if it is returned from db
    #[error("unique violation{0:?}")]
    UniqueViolation(Option<String>),

    /// constraint name if it is returned from db
    #[error("foreign key violation{0:?}")]
    ForeignKeyViolation(Option<String>),

    /// constraint name if it is returned from db
    #[error("check violation{0:?}")]
    CheckViolation(Option<String>),

    /// malformed row that cannot be mapped back to a core entity
    #[error("corrupt row: {0}")]
    CorruptRow(String),

    // transient DB problems (retry may work)
    #[error("serialization failure")]
    SerializationFailure,

    // connection, pool, or other DB errors
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

pub type DbResult<T> = Result<T, DbError>;
