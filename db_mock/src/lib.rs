// in-memory implementation of the database port, for tests and local
// development without a running postgres

use app_core::{
    DatabasePort, DbError, DbResult, DbpMerge, DbpPendingTournament, DbpPlayer, DbpRanking,
    DbpRegion, DbpSession, DbpTournament, DbpUser, Merge, PendingTournament, Player, QueryOp,
    Ranking, Region, Session, Tournament, User, utils::normalize::normalize_alias,
};
use async_trait::async_trait;
use std::collections::BTreeMap;
use std::sync::{Arc, Mutex};
use uuid::Uuid;

/// All collections live behind one mutex so that the atomic commits of the
/// port (merge, unmerge, finalize) are trivially all-or-nothing.
#[derive(Default)]
struct Inner {
    regions: BTreeMap<String, Region>,
    players: BTreeMap<Uuid, Player>,
    tournaments: BTreeMap<Uuid, Tournament>,
    pending_tournaments: BTreeMap<Uuid, PendingTournament>,
    rankings: BTreeMap<Uuid, Ranking>,
    merges: BTreeMap<Uuid, Merge>,
    users: BTreeMap<Uuid, User>,
    sessions: BTreeMap<String, Session>,
}

#[derive(Clone, Default)]
pub struct MockDb {
    inner: Arc<Mutex<Inner>>,
    fail_next_save_player: Arc<Mutex<bool>>,
    fail_next_save_ranking: Arc<Mutex<bool>>,
    fail_next_commit: Arc<Mutex<bool>>,
}

impl MockDb {
    pub fn new() -> Self {
        Self::default()
    }

    // --- seeding helpers ---

    pub fn seed_region(&self, region: Region) {
        self.inner
            .lock()
            .unwrap()
            .regions
            .insert(region.id.clone(), region);
    }

    pub fn seed_player(&self, player: Player) -> Uuid {
        let id = player.id;
        self.inner.lock().unwrap().players.insert(id, player);
        id
    }

    pub fn seed_tournament(&self, tournament: Tournament) -> Uuid {
        let id = tournament.id;
        self.inner.lock().unwrap().tournaments.insert(id, tournament);
        id
    }

    pub fn seed_pending_tournament(&self, pending: PendingTournament) -> Uuid {
        let id = pending.id;
        self.inner
            .lock()
            .unwrap()
            .pending_tournaments
            .insert(id, pending);
        id
    }

    pub fn seed_user(&self, user: User) -> Uuid {
        let id = user.id;
        self.inner.lock().unwrap().users.insert(id, user);
        id
    }

    // --- failure injection ---

    pub fn fail_save_player_once(&self) {
        *self.fail_next_save_player.lock().unwrap() = true;
    }
    pub fn fail_save_ranking_once(&self) {
        *self.fail_next_save_ranking.lock().unwrap() = true;
    }
    pub fn fail_commit_once(&self) {
        *self.fail_next_commit.lock().unwrap() = true;
    }

    fn take_flag(flag: &Arc<Mutex<bool>>) -> bool {
        let mut guard = flag.lock().unwrap();
        std::mem::take(&mut *guard)
    }
}

fn tournament_matches_filters(
    tournament: &Tournament,
    players: &[Uuid],
    regions: &[String],
    op: QueryOp,
) -> bool {
    let mut conditions: Vec<bool> = players
        .iter()
        .map(|p| tournament.players.contains(p))
        .collect();
    conditions.extend(regions.iter().map(|r| tournament.regions.contains(r)));
    if conditions.is_empty() {
        return true;
    }
    match op {
        QueryOp::And => conditions.iter().all(|c| *c),
        QueryOp::Or => conditions.iter().any(|c| *c),
    }
}

#[async_trait]
impl DbpRegion for MockDb {
    async fn get_region(&self, id: &str) -> DbResult<Option<Region>> {
        Ok(self.inner.lock().unwrap().regions.get(id).cloned())
    }

    async fn get_all_regions(&self) -> DbResult<Vec<Region>> {
        let mut rows: Vec<Region> = self
            .inner
            .lock()
            .unwrap()
            .regions
            .values()
            .cloned()
            .collect();
        rows.sort_by(|a, b| a.display_name.cmp(&b.display_name).then(a.id.cmp(&b.id)));
        Ok(rows)
    }

    async fn save_region(&self, region: &Region) -> DbResult<()> {
        self.inner
            .lock()
            .unwrap()
            .regions
            .insert(region.id.clone(), region.clone());
        Ok(())
    }
}

#[async_trait]
impl DbpPlayer for MockDb {
    async fn get_player(&self, id: Uuid) -> DbResult<Option<Player>> {
        Ok(self.inner.lock().unwrap().players.get(&id).cloned())
    }

    async fn get_player_by_alias(&self, alias: &str, region: &str) -> DbResult<Option<Player>> {
        let alias = normalize_alias(alias);
        // BTreeMap iteration is id-ascending: the earliest player wins
        Ok(self
            .inner
            .lock()
            .unwrap()
            .players
            .values()
            .find(|p| !p.merged && p.regions.contains(region) && p.aliases.contains(&alias))
            .cloned())
    }

    async fn get_players_by_alias(
        &self,
        alias: &str,
        include_merged: bool,
    ) -> DbResult<Vec<Player>> {
        let alias = normalize_alias(alias);
        Ok(self
            .inner
            .lock()
            .unwrap()
            .players
            .values()
            .filter(|p| (include_merged || !p.merged) && p.aliases.contains(&alias))
            .cloned()
            .collect())
    }

    async fn get_players_by_any_alias(&self, aliases: &[String]) -> DbResult<Vec<Player>> {
        Ok(self
            .inner
            .lock()
            .unwrap()
            .players
            .values()
            .filter(|p| !p.merged && aliases.iter().any(|a| p.aliases.contains(a)))
            .cloned()
            .collect())
    }

    async fn get_all_players(
        &self,
        region: Option<&str>,
        include_merged: bool,
    ) -> DbResult<Vec<Player>> {
        let mut rows: Vec<Player> = self
            .inner
            .lock()
            .unwrap()
            .players
            .values()
            .filter(|p| include_merged || !p.merged)
            .filter(|p| region.is_none_or(|r| p.regions.contains(r)))
            .cloned()
            .collect();
        // case-insensitive by name, id as tiebreak
        rows.sort_by(|a, b| {
            a.name
                .to_lowercase()
                .cmp(&b.name.to_lowercase())
                .then(a.id.cmp(&b.id))
        });
        Ok(rows)
    }

    async fn save_player(&self, player: &Player) -> DbResult<()> {
        if Self::take_flag(&self.fail_next_save_player) {
            return Err(DbError::Other(anyhow::anyhow!("injected save failure")));
        }
        self.inner
            .lock()
            .unwrap()
            .players
            .insert(player.id, player.clone());
        Ok(())
    }

    async fn save_players(&self, players: &[Player]) -> DbResult<()> {
        if Self::take_flag(&self.fail_next_save_player) {
            return Err(DbError::Other(anyhow::anyhow!("injected save failure")));
        }
        let mut guard = self.inner.lock().unwrap();
        for player in players {
            guard.players.insert(player.id, player.clone());
        }
        Ok(())
    }
}

#[async_trait]
impl DbpTournament for MockDb {
    async fn get_tournament(&self, id: Uuid) -> DbResult<Option<Tournament>> {
        Ok(self.inner.lock().unwrap().tournaments.get(&id).cloned())
    }

    async fn get_all_tournaments(
        &self,
        players: &[Uuid],
        regions: &[String],
        op: QueryOp,
    ) -> DbResult<Vec<Tournament>> {
        let mut rows: Vec<Tournament> = self
            .inner
            .lock()
            .unwrap()
            .tournaments
            .values()
            .filter(|t| tournament_matches_filters(t, players, regions, op))
            .cloned()
            .collect();
        rows.sort_by(|a, b| a.date.cmp(&b.date).then(a.id.cmp(&b.id)));
        Ok(rows)
    }

    async fn save_tournament(&self, tournament: &Tournament) -> DbResult<()> {
        self.inner
            .lock()
            .unwrap()
            .tournaments
            .insert(tournament.id, tournament.clone());
        Ok(())
    }

    async fn delete_tournament(&self, id: Uuid) -> DbResult<()> {
        match self.inner.lock().unwrap().tournaments.remove(&id) {
            Some(_) => Ok(()),
            None => Err(DbError::NotFound),
        }
    }
}

#[async_trait]
impl DbpPendingTournament for MockDb {
    async fn get_pending_tournament(&self, id: Uuid) -> DbResult<Option<PendingTournament>> {
        Ok(self
            .inner
            .lock()
            .unwrap()
            .pending_tournaments
            .get(&id)
            .cloned())
    }

    async fn get_all_pending_tournaments(
        &self,
        regions: &[String],
    ) -> DbResult<Vec<PendingTournament>> {
        let mut rows: Vec<PendingTournament> = self
            .inner
            .lock()
            .unwrap()
            .pending_tournaments
            .values()
            .filter(|p| regions.is_empty() || regions.iter().any(|r| p.regions.contains(r)))
            .cloned()
            .collect();
        rows.sort_by(|a, b| a.date.cmp(&b.date).then(a.id.cmp(&b.id)));
        Ok(rows)
    }

    async fn save_pending_tournament(&self, pending: &PendingTournament) -> DbResult<()> {
        self.inner
            .lock()
            .unwrap()
            .pending_tournaments
            .insert(pending.id, pending.clone());
        Ok(())
    }

    async fn delete_pending_tournament(&self, id: Uuid) -> DbResult<()> {
        match self.inner.lock().unwrap().pending_tournaments.remove(&id) {
            Some(_) => Ok(()),
            None => Err(DbError::NotFound),
        }
    }

    async fn finalize_pending_tournament(
        &self,
        tournament: &Tournament,
        pending_id: Uuid,
    ) -> DbResult<()> {
        if Self::take_flag(&self.fail_next_commit) {
            return Err(DbError::Other(anyhow::anyhow!("injected commit failure")));
        }
        let mut guard = self.inner.lock().unwrap();
        if guard.pending_tournaments.remove(&pending_id).is_none() {
            return Err(DbError::NotFound);
        }
        guard.tournaments.insert(tournament.id, tournament.clone());
        Ok(())
    }
}

#[async_trait]
impl DbpRanking for MockDb {
    async fn get_latest_ranking(&self, region: &str) -> DbResult<Option<Ranking>> {
        Ok(self
            .inner
            .lock()
            .unwrap()
            .rankings
            .values()
            .filter(|r| r.region == region)
            .max_by(|a, b| a.time.cmp(&b.time).then(a.id.cmp(&b.id)))
            .cloned())
    }

    async fn save_ranking(&self, ranking: &Ranking) -> DbResult<()> {
        if Self::take_flag(&self.fail_next_save_ranking) {
            return Err(DbError::Other(anyhow::anyhow!("injected save failure")));
        }
        self.inner
            .lock()
            .unwrap()
            .rankings
            .insert(ranking.id, ranking.clone());
        Ok(())
    }
}

#[async_trait]
impl DbpMerge for MockDb {
    async fn get_merge(&self, id: Uuid) -> DbResult<Option<Merge>> {
        Ok(self.inner.lock().unwrap().merges.get(&id).cloned())
    }

    async fn get_all_merges(&self) -> DbResult<Vec<Merge>> {
        let mut rows: Vec<Merge> = self.inner.lock().unwrap().merges.values().cloned().collect();
        rows.sort_by(|a, b| a.time.cmp(&b.time).then(a.id.cmp(&b.id)));
        Ok(rows)
    }

    async fn commit_merge(
        &self,
        merge: &Merge,
        players: &[Player],
        tournaments: &[Tournament],
    ) -> DbResult<()> {
        if Self::take_flag(&self.fail_next_commit) {
            return Err(DbError::Other(anyhow::anyhow!("injected commit failure")));
        }
        let mut guard = self.inner.lock().unwrap();
        guard.merges.insert(merge.id, merge.clone());
        for player in players {
            guard.players.insert(player.id, player.clone());
        }
        for tournament in tournaments {
            guard.tournaments.insert(tournament.id, tournament.clone());
        }
        Ok(())
    }

    async fn commit_unmerge(
        &self,
        merge_id: Uuid,
        players: &[Player],
        tournaments: &[Tournament],
    ) -> DbResult<()> {
        if Self::take_flag(&self.fail_next_commit) {
            return Err(DbError::Other(anyhow::anyhow!("injected commit failure")));
        }
        let mut guard = self.inner.lock().unwrap();
        if guard.merges.remove(&merge_id).is_none() {
            return Err(DbError::NotFound);
        }
        for player in players {
            guard.players.insert(player.id, player.clone());
        }
        for tournament in tournaments {
            guard.tournaments.insert(tournament.id, tournament.clone());
        }
        Ok(())
    }
}

#[async_trait]
impl DbpUser for MockDb {
    async fn get_user(&self, id: Uuid) -> DbResult<Option<User>> {
        Ok(self.inner.lock().unwrap().users.get(&id).cloned())
    }

    async fn get_user_by_username(&self, username: &str) -> DbResult<Option<User>> {
        Ok(self
            .inner
            .lock()
            .unwrap()
            .users
            .values()
            .find(|u| u.username == username)
            .cloned())
    }

    async fn get_all_users(&self) -> DbResult<Vec<User>> {
        let mut rows: Vec<User> = self.inner.lock().unwrap().users.values().cloned().collect();
        rows.sort_by(|a, b| a.username.cmp(&b.username).then(a.id.cmp(&b.id)));
        Ok(rows)
    }

    async fn save_user(&self, user: &User) -> DbResult<()> {
        let mut guard = self.inner.lock().unwrap();
        let taken = guard
            .users
            .values()
            .any(|u| u.username == user.username && u.id != user.id);
        if taken {
            return Err(DbError::UniqueViolation(Some("user_username_key".into())));
        }
        guard.users.insert(user.id, user.clone());
        Ok(())
    }
}

#[async_trait]
impl DbpSession for MockDb {
    async fn get_user_by_session(&self, session_id: &str) -> DbResult<Option<User>> {
        let guard = self.inner.lock().unwrap();
        let Some(session) = guard.sessions.get(session_id) else {
            return Ok(None);
        };
        Ok(guard.users.get(&session.user_id).cloned())
    }

    async fn replace_session_for_user(&self, user_id: Uuid, session_id: &str) -> DbResult<()> {
        let mut guard = self.inner.lock().unwrap();
        guard.sessions.retain(|_, s| s.user_id != user_id);
        guard.sessions.insert(
            session_id.to_string(),
            Session {
                id: session_id.to_string(),
                user_id,
            },
        );
        Ok(())
    }

    async fn delete_session_for_user(&self, user_id: Uuid) -> DbResult<()> {
        self.inner
            .lock()
            .unwrap()
            .sessions
            .retain(|_, s| s.user_id != user_id);
        Ok(())
    }
}

#[async_trait]
impl DatabasePort for MockDb {
    async fn ping_db(&self) -> DbResult<()> {
        Ok(())
    }
}
