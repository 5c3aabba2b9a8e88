//! Ranking pipeline: skill replay, activity filtering, determinism.

use app_core::{ActivityWindow, DbpPlayer, Rating};
use integration_testing::{core_with_mock, date, seed_norcal, seed_player, seed_tournament};

fn window(day_limit: i64, num_tourneys: usize) -> Option<ActivityWindow> {
    Some(ActivityWindow {
        day_limit,
        num_tourneys,
    })
}

#[tokio::test]
async fn rate_progression_after_one_match() {
    let (core, db) = core_with_mock();
    let region = seed_norcal(&db);
    let gar = seed_player(&db, "gar", &region);
    let sfat = seed_player(&db, "sfat", &region);
    seed_tournament(
        &db,
        "Weekly",
        &region,
        date(2013, 10, 16),
        &[(gar.id, sfat.id)],
    );

    let ranking = core
        .generate_ranking(&region, date(2013, 10, 17), window(30, 1))
        .await
        .unwrap();

    let gar_after = db.get_player(gar.id).await.unwrap().unwrap();
    let sfat_after = db.get_player(sfat.id).await.unwrap().unwrap();
    assert!(gar_after.get_rating(&region).unwrap().mu > 25.0);
    assert!(sfat_after.get_rating(&region).unwrap().mu < 25.0);

    assert_eq!(ranking.entries.len(), 2);
    assert_eq!(ranking.entries[0].player, gar.id);
    assert_eq!(ranking.entries[0].rank, 1);
    assert_eq!(ranking.entries[1].player, sfat.id);
    assert_eq!(ranking.entries[1].rank, 2);
}

#[tokio::test]
async fn activity_filter_drops_players_outside_the_window() {
    let (core, db) = core_with_mock();
    let region = seed_norcal(&db);
    let players: Vec<_> = (1..=5)
        .map(|i| seed_player(&db, &format!("p{i}"), &region))
        .collect();
    let (p1, p2, p3, p4, p5) = (
        players[0].id,
        players[1].id,
        players[2].id,
        players[3].id,
        players[4].id,
    );

    // T1 is older than the 45-day window relative to `now`
    seed_tournament(
        &db,
        "T1",
        &region,
        date(2013, 10, 10),
        &[(p2, p3), (p4, p5)],
    );
    seed_tournament(
        &db,
        "T2",
        &region,
        date(2013, 10, 16),
        &[(p1, p2), (p3, p4)],
    );

    let ranking = core
        .generate_ranking(&region, date(2013, 11, 25), window(45, 1))
        .await
        .unwrap();

    let ranked: Vec<_> = ranking.entries.iter().map(|e| e.player).collect();
    assert_eq!(ranked.len(), 4);
    for included in [p1, p2, p3, p4] {
        assert!(ranked.contains(&included));
    }
    assert!(!ranked.contains(&p5));

    // ranks are dense over the included players only
    let ranks: Vec<_> = ranking.entries.iter().map(|e| e.rank).collect();
    assert_eq!(ranks, vec![1, 2, 3, 4]);
}

#[tokio::test]
async fn too_few_tournaments_in_window_excludes_a_player() {
    let (core, db) = core_with_mock();
    let region = seed_norcal(&db);
    let regular = seed_player(&db, "regular", &region);
    let visitor = seed_player(&db, "visitor", &region);
    let third = seed_player(&db, "third", &region);

    seed_tournament(
        &db,
        "T1",
        &region,
        date(2013, 10, 1),
        &[(regular.id, third.id)],
    );
    seed_tournament(
        &db,
        "T2",
        &region,
        date(2013, 10, 8),
        &[(regular.id, visitor.id), (third.id, regular.id)],
    );

    let ranking = core
        .generate_ranking(&region, date(2013, 10, 20), window(60, 2))
        .await
        .unwrap();

    let ranked: Vec<_> = ranking.entries.iter().map(|e| e.player).collect();
    assert!(ranked.contains(&regular.id));
    assert!(ranked.contains(&third.id));
    // only one qualifying tournament for the visitor
    assert!(!ranked.contains(&visitor.id));
}

#[tokio::test]
async fn players_who_dropped_the_region_are_excluded() {
    let (core, db) = core_with_mock();
    let region = seed_norcal(&db);
    let stayed = seed_player(&db, "stayed", &region);
    let mut moved = seed_player(&db, "moved", &region);
    seed_tournament(
        &db,
        "Weekly",
        &region,
        date(2013, 10, 16),
        &[(stayed.id, moved.id)],
    );

    moved.regions.remove(&region);
    db.seed_player(moved.clone());

    let ranking = core
        .generate_ranking(&region, date(2013, 10, 17), window(30, 1))
        .await
        .unwrap();
    let ranked: Vec<_> = ranking.entries.iter().map(|e| e.player).collect();
    assert_eq!(ranked, vec![stayed.id]);
}

#[tokio::test]
async fn stale_ratings_are_reset_before_replay() {
    let (core, db) = core_with_mock();
    let region = seed_norcal(&db);
    let mut winner = seed_player(&db, "winner", &region);
    let loser = seed_player(&db, "loser", &region);

    // stale state from a previous configuration of the pipeline
    winner.update_rating(&region, Rating::new(90.0, 0.1));
    db.seed_player(winner.clone());

    seed_tournament(
        &db,
        "Weekly",
        &region,
        date(2013, 10, 16),
        &[(winner.id, loser.id)],
    );
    core.generate_ranking(&region, date(2013, 10, 17), window(30, 1))
        .await
        .unwrap();

    let refreshed = db.get_player(winner.id).await.unwrap().unwrap();
    let mu = refreshed.get_rating(&region).unwrap().mu;
    // replay starts from the default prior, not from the stale 90
    assert!(mu > 25.0 && mu < 40.0);
}

#[tokio::test]
async fn reruns_with_the_same_now_are_identical() {
    let (core, db) = core_with_mock();
    let region = seed_norcal(&db);
    let a = seed_player(&db, "a", &region);
    let b = seed_player(&db, "b", &region);
    let c = seed_player(&db, "c", &region);
    seed_tournament(
        &db,
        "T1",
        &region,
        date(2013, 10, 10),
        &[(a.id, b.id), (b.id, c.id)],
    );
    seed_tournament(
        &db,
        "T2",
        &region,
        date(2013, 10, 16),
        &[(c.id, a.id), (a.id, b.id)],
    );

    let now = date(2013, 10, 20);
    let first = core
        .generate_ranking(&region, now, window(30, 1))
        .await
        .unwrap();
    let second = core
        .generate_ranking(&region, now, window(30, 1))
        .await
        .unwrap();

    assert_eq!(first.entries, second.entries);
    assert_eq!(first.tournaments, second.tournaments);
}

#[tokio::test]
async fn failed_writes_surface_as_database_errors() {
    let (core, db) = core_with_mock();
    let region = seed_norcal(&db);
    let a = seed_player(&db, "a", &region);
    let b = seed_player(&db, "b", &region);
    seed_tournament(&db, "T", &region, date(2013, 10, 16), &[(a.id, b.id)]);

    db.fail_save_player_once();
    let err = core
        .generate_ranking(&region, date(2013, 10, 17), window(30, 1))
        .await
        .unwrap_err();
    assert!(matches!(err, app_core::CoreError::Db(_)));

    db.fail_save_ranking_once();
    let err = core
        .generate_ranking(&region, date(2013, 10, 17), window(30, 1))
        .await
        .unwrap_err();
    assert!(matches!(err, app_core::CoreError::Db(_)));

    // a later run is unaffected
    core.generate_ranking(&region, date(2013, 10, 17), window(30, 1))
        .await
        .unwrap();
}

#[tokio::test]
async fn ranking_for_unknown_region_is_not_found() {
    let (core, db) = core_with_mock();
    seed_norcal(&db);
    let err = core
        .generate_ranking("narnia", date(2013, 10, 17), None)
        .await
        .unwrap_err();
    assert!(matches!(err, app_core::CoreError::NotFound(_)));
}

#[tokio::test]
async fn latest_ranking_is_the_most_recent_one() {
    let (core, db) = core_with_mock();
    let region = seed_norcal(&db);
    let a = seed_player(&db, "a", &region);
    let b = seed_player(&db, "b", &region);
    seed_tournament(&db, "T", &region, date(2013, 10, 16), &[(a.id, b.id)]);

    core.generate_ranking(&region, date(2013, 10, 17), window(30, 1))
        .await
        .unwrap();
    let newer = core
        .generate_ranking(&region, date(2013, 10, 18), window(30, 1))
        .await
        .unwrap();

    use app_core::DbpRanking;
    let latest = db.get_latest_ranking(&region).await.unwrap().unwrap();
    assert_eq!(latest.id, newer.id);
}
