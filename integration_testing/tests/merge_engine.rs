//! Identity merges: application, rejection rules, and reversibility.

use app_core::{CoreError, DbpMerge, DbpPlayer, DbpTournament, Match};
use integration_testing::{core_with_mock, date, seed_norcal, seed_player, seed_tournament};
use uuid::Uuid;

fn requester() -> Uuid {
    Uuid::now_v7()
}

#[tokio::test]
async fn merge_rewrites_tournaments_and_unions_identity() {
    let (core, db) = core_with_mock();
    let region = seed_norcal(&db);
    let mut source = seed_player(&db, "fake mango", &region);
    source.regions.insert("socal".to_string());
    db.seed_player(source.clone());
    let target = seed_player(&db, "mango", &region);
    let other = seed_player(&db, "other", &region);

    let t = seed_tournament(
        &db,
        "Weekly",
        &region,
        date(2013, 10, 16),
        &[(source.id, other.id)],
    );

    let merge = core
        .apply_merge(&region, requester(), source.id, target.id, date(2013, 11, 1))
        .await
        .unwrap();

    let source_after = db.get_player(source.id).await.unwrap().unwrap();
    let target_after = db.get_player(target.id).await.unwrap().unwrap();
    assert!(source_after.merged);
    assert_eq!(source_after.merge_parent, Some(target.id));
    assert!(target_after.merge_children.contains(&source.id));
    // aliases and regions are unioned onto the target
    assert!(target_after.aliases.contains("fake mango"));
    assert!(target_after.regions.contains("socal"));

    let t_after = db.get_tournament(t.id).await.unwrap().unwrap();
    assert!(t_after.players.contains(&target.id));
    assert!(!t_after.players.contains(&source.id));
    assert_eq!(t_after.matches, vec![Match::new(target.id, other.id)]);
    // the original participant snapshot is untouched
    assert_eq!(t_after.orig_ids, t.orig_ids);

    assert!(db.get_merge(merge.id).await.unwrap().is_some());
}

#[tokio::test]
async fn merge_of_coparticipants_is_rejected_and_nothing_changes() {
    let (core, db) = core_with_mock();
    let region = seed_norcal(&db);
    let a = seed_player(&db, "A", &region);
    let b = seed_player(&db, "B", &region);
    let c = seed_player(&db, "C", &region);
    let t1 = seed_tournament(&db, "T1", &region, date(2013, 10, 1), &[(a.id, b.id)]);
    let t2 = seed_tournament(&db, "T2", &region, date(2013, 10, 8), &[(a.id, c.id)]);

    // A and C met in T2; merging them would create self-play
    let err = core
        .apply_merge(&region, requester(), c.id, a.id, date(2013, 11, 1))
        .await
        .unwrap_err();
    assert!(matches!(err, CoreError::Field(_)));

    // all entities unchanged
    assert_eq!(db.get_player(a.id).await.unwrap().unwrap(), a);
    assert_eq!(db.get_player(c.id).await.unwrap().unwrap(), c);
    assert_eq!(db.get_tournament(t1.id).await.unwrap().unwrap(), t1);
    assert_eq!(db.get_tournament(t2.id).await.unwrap().unwrap(), t2);
    assert!(db.get_all_merges().await.unwrap().is_empty());
}

#[tokio::test]
async fn merge_rejects_identical_and_already_merged_players() {
    let (core, db) = core_with_mock();
    let region = seed_norcal(&db);
    let a = seed_player(&db, "A", &region);
    let b = seed_player(&db, "B", &region);
    let c = seed_player(&db, "C", &region);

    let err = core
        .apply_merge(&region, requester(), a.id, a.id, date(2013, 11, 1))
        .await
        .unwrap_err();
    assert!(matches!(err, CoreError::Field(_)));

    core.apply_merge(&region, requester(), b.id, a.id, date(2013, 11, 1))
        .await
        .unwrap();

    // b is merged now: neither side of a new merge may be merged
    let err = core
        .apply_merge(&region, requester(), b.id, c.id, date(2013, 11, 2))
        .await
        .unwrap_err();
    assert!(matches!(err, CoreError::Field(_)));
    let err = core
        .apply_merge(&region, requester(), c.id, b.id, date(2013, 11, 2))
        .await
        .unwrap_err();
    assert!(matches!(err, CoreError::Field(_)));
}

#[tokio::test]
async fn undo_restores_tournaments_to_their_premerge_state() {
    let (core, db) = core_with_mock();
    let region = seed_norcal(&db);
    let a = seed_player(&db, "A", &region);
    let b = seed_player(&db, "B", &region);
    let c = seed_player(&db, "C", &region);
    let d = seed_player(&db, "D", &region);

    let t1 = seed_tournament(&db, "T1", &region, date(2013, 10, 1), &[(a.id, b.id)]);
    let t2 = seed_tournament(&db, "T2", &region, date(2013, 10, 8), &[(c.id, d.id)]);

    let merge = core
        .apply_merge(&region, requester(), c.id, a.id, date(2013, 11, 1))
        .await
        .unwrap();
    let rewritten = db.get_tournament(t2.id).await.unwrap().unwrap();
    assert!(rewritten.players.contains(&a.id));

    core.undo_merge(&region, merge.id).await.unwrap();

    // both tournaments equal their pre-merge state
    assert_eq!(db.get_tournament(t1.id).await.unwrap().unwrap(), t1);
    assert_eq!(db.get_tournament(t2.id).await.unwrap().unwrap(), t2);

    let c_after = db.get_player(c.id).await.unwrap().unwrap();
    assert!(!c_after.merged);
    assert_eq!(c_after.merge_parent, None);
    let a_after = db.get_player(a.id).await.unwrap().unwrap();
    assert!(!a_after.merge_children.contains(&c.id));
    assert!(db.get_merge(merge.id).await.unwrap().is_none());
}

#[tokio::test]
async fn undo_only_returns_tournaments_that_originally_had_the_source() {
    let (core, db) = core_with_mock();
    let region = seed_norcal(&db);
    let a = seed_player(&db, "A", &region);
    let c = seed_player(&db, "C", &region);
    let d = seed_player(&db, "D", &region);
    let e = seed_player(&db, "E", &region);

    // A's own tournament must stay with A after the undo
    let t_a = seed_tournament(&db, "A own", &region, date(2013, 10, 1), &[(a.id, d.id)]);
    let t_c = seed_tournament(&db, "C own", &region, date(2013, 10, 8), &[(c.id, e.id)]);

    let merge = core
        .apply_merge(&region, requester(), c.id, a.id, date(2013, 11, 1))
        .await
        .unwrap();
    core.undo_merge(&region, merge.id).await.unwrap();

    let t_a_after = db.get_tournament(t_a.id).await.unwrap().unwrap();
    assert!(t_a_after.players.contains(&a.id));
    assert!(!t_a_after.players.contains(&c.id));
    let t_c_after = db.get_tournament(t_c.id).await.unwrap().unwrap();
    assert!(t_c_after.players.contains(&c.id));
    assert!(!t_c_after.players.contains(&a.id));
}

#[tokio::test]
async fn chained_merges_must_unwind_from_the_top() {
    let (core, db) = core_with_mock();
    let region = seed_norcal(&db);
    let a = seed_player(&db, "A", &region);
    let b = seed_player(&db, "B", &region);
    let c = seed_player(&db, "C", &region);

    let first = core
        .apply_merge(&region, requester(), b.id, c.id, date(2013, 11, 1))
        .await
        .unwrap();
    core.apply_merge(&region, requester(), c.id, a.id, date(2013, 11, 2))
        .await
        .unwrap();

    // c (the target of the first merge) is itself merged now
    let err = core.undo_merge(&region, first.id).await.unwrap_err();
    assert!(matches!(err, CoreError::Field(_)));

    let a_after = db.get_player(a.id).await.unwrap().unwrap();
    assert!(a_after.merge_children.contains(&b.id));
    assert!(a_after.merge_children.contains(&c.id));
}

#[tokio::test]
async fn absorbed_children_travel_with_their_parent_through_undo() {
    let (core, db) = core_with_mock();
    let region = seed_norcal(&db);
    let a = seed_player(&db, "A", &region);
    let b = seed_player(&db, "B", &region);
    let c = seed_player(&db, "C", &region);
    let d = seed_player(&db, "D", &region);

    // B competed, then was merged into C, which was merged into A
    let t = seed_tournament(&db, "T", &region, date(2013, 10, 1), &[(b.id, d.id)]);
    core.apply_merge(&region, requester(), b.id, c.id, date(2013, 11, 1))
        .await
        .unwrap();
    let second = core
        .apply_merge(&region, requester(), c.id, a.id, date(2013, 11, 2))
        .await
        .unwrap();
    assert!(
        db.get_tournament(t.id)
            .await
            .unwrap()
            .unwrap()
            .players
            .contains(&a.id)
    );

    // undoing C -> A hands B's tournament back to C, not to B
    core.undo_merge(&region, second.id).await.unwrap();
    let t_after = db.get_tournament(t.id).await.unwrap().unwrap();
    assert!(t_after.players.contains(&c.id));
    assert!(!t_after.players.contains(&a.id));
    assert!(!t_after.players.contains(&b.id));
}
