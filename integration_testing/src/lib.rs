//! Shared fixtures for the cross-crate tests.

use app_core::{
    AppConfig, Core, CoreBuilder, Match, Player, Region, SourceType, Tournament,
};
use chrono::{DateTime, TimeZone, Utc};
use db_mock::MockDb;
use std::collections::BTreeSet;
use std::sync::Arc;
use uuid::Uuid;

/// A core wired to a fresh in-memory database, plus direct access to it
/// for seeding and inspection.
pub fn core_with_mock() -> (Core, MockDb) {
    let db = MockDb::new();
    let core = CoreBuilder::new()
        .set_db(Arc::new(db.clone()))
        .set_config(AppConfig::for_testing())
        .build();
    (core, db)
}

pub fn date(year: i32, month: u32, day: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(year, month, day, 0, 0, 0).unwrap()
}

/// Seed one region and return its id.
pub fn seed_norcal(db: &MockDb) -> String {
    db.seed_region(Region::new("norcal", "Norcal"));
    "norcal".to_string()
}

pub fn seed_player(db: &MockDb, name: &str, region: &str) -> Player {
    let player = Player::new(name, region);
    db.seed_player(player.clone());
    player
}

/// A canonical tournament whose participant set is derived from its
/// matches, with `orig_ids` snapshotted accordingly.
pub fn make_tournament(
    name: &str,
    region: &str,
    when: DateTime<Utc>,
    results: &[(Uuid, Uuid)],
) -> Tournament {
    let mut players = BTreeSet::new();
    let mut matches = Vec::with_capacity(results.len());
    for (winner, loser) in results {
        players.insert(*winner);
        players.insert(*loser);
        matches.push(Match::new(*winner, *loser));
    }
    Tournament {
        id: Uuid::now_v7(),
        name: name.to_string(),
        source_type: SourceType::Other,
        date: when,
        regions: BTreeSet::from([region.to_string()]),
        raw: String::new(),
        orig_ids: players.clone(),
        players,
        matches,
    }
}

pub fn seed_tournament(
    db: &MockDb,
    name: &str,
    region: &str,
    when: DateTime<Utc>,
    results: &[(Uuid, Uuid)],
) -> Tournament {
    let tournament = make_tournament(name, region, when, results);
    db.seed_tournament(tournament.clone());
    tournament
}
