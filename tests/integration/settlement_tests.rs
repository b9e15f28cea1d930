use rank_processor::{
    database::memory::MemoryStore,
    model::{
        rank_manager::{RankManager, SettlementError},
        rank_table::RankTable,
        structures::{game::Game, rank_change_reason::RankChangeReason}
    },
    utils::test_utils::{generate_match, generate_outcome, generate_outcomes, generate_profile}
};

use crate::common::init_test_env;

fn manager() -> RankManager<MemoryStore> {
    init_test_env();
    RankManager::new(MemoryStore::new(), RankTable::default())
}

#[tokio::test]
async fn test_mvp_earns_more_at_same_mmr() {
    let manager = manager();
    let store = manager.store();
    store.insert_profile(generate_profile(1, Game::Valorant, 1400, "Platinum"));
    store.insert_profile(generate_profile(2, Game::Valorant, 1400, "Platinum"));

    let (completed, lines) = generate_match(
        1,
        Game::Valorant,
        &[
            (1, generate_outcome(true, 20, 5, true)),
            (2, generate_outcome(true, 5, 5, false)),
        ]
    );
    store.insert_match(completed, lines);

    let changes = manager.settle_match(1).await.unwrap();
    let mvp = changes.iter().find(|c| c.player_id == 1).unwrap();
    let average = changes.iter().find(|c| c.player_id == 2).unwrap();

    assert_eq!(mvp.points_earned, 25);
    assert_eq!(average.points_earned, 17);
}

#[tokio::test]
async fn test_low_mmr_moves_faster_than_high_mmr() {
    let manager = manager();
    let store = manager.store();
    store.insert_profile(generate_profile(1, Game::MarvelRivals, 200, "Iron"));
    store.insert_profile(generate_profile(2, Game::MarvelRivals, 3100, "Master"));

    let (completed, lines) = generate_match(
        2,
        Game::MarvelRivals,
        &[
            (1, generate_outcome(true, 10, 10, false)),
            (2, generate_outcome(true, 10, 10, false)),
        ]
    );
    store.insert_match(completed, lines);

    let changes = manager.settle_match(2).await.unwrap();
    let low = changes.iter().find(|c| c.player_id == 1).unwrap();
    let high = changes.iter().find(|c| c.player_id == 2).unwrap();

    assert_eq!(low.points_earned, 20);
    assert_eq!(high.points_earned, 8);
    // Master is capped below the elite bands on MMR alone
    assert_eq!(high.new_rank, "Master");
}

#[tokio::test]
async fn test_peak_never_decreases() {
    let manager = manager();
    let store = manager.store();
    store.insert_profile(generate_profile(1, Game::Valorant, 1000, "Gold"));

    let outcomes = generate_outcomes(40, 99);
    for (i, outcome) in outcomes.into_iter().enumerate() {
        let match_id = i as i64 + 1;
        let (completed, lines) = generate_match(match_id, Game::Valorant, &[(1, outcome)]);
        store.insert_match(completed, lines);

        let before = store.profile(1, Game::Valorant).unwrap();
        manager.settle_match(match_id).await.unwrap();
        let after = store.profile(1, Game::Valorant).unwrap();

        assert!(after.peak_mmr >= before.peak_mmr);
        assert!(after.peak_mmr >= after.current_mmr);
        assert!(after.current_mmr >= 0);
    }
}

#[tokio::test]
async fn test_failing_player_is_skipped() {
    let manager = manager();
    let store = manager.store();
    for id in 1..=3 {
        store.insert_profile(generate_profile(id, Game::Valorant, 1000, "Gold"));
    }
    store.fail_player(2);

    let (completed, lines) = generate_match(
        5,
        Game::Valorant,
        &[
            (1, generate_outcome(true, 10, 10, false)),
            (2, generate_outcome(true, 10, 10, false)),
            (3, generate_outcome(false, 10, 10, false)),
        ]
    );
    store.insert_match(completed, lines);

    let changes = manager.settle_match(5).await.unwrap();

    assert_eq!(changes.len(), 2);
    assert!(changes.iter().all(|c| c.player_id != 2));
    assert_eq!(store.profile(2, Game::Valorant).unwrap().current_mmr, 1000);
}

#[tokio::test]
async fn test_missing_profile_is_skipped() {
    let manager = manager();
    let store = manager.store();
    store.insert_profile(generate_profile(1, Game::Valorant, 1000, "Gold"));

    let (completed, lines) = generate_match(
        6,
        Game::Valorant,
        &[(1, generate_outcome(true, 10, 10, false)), (42, generate_outcome(false, 1, 9, false))]
    );
    store.insert_match(completed, lines);

    let changes = manager.settle_match(6).await.unwrap();

    assert_eq!(changes.len(), 1);
    assert_eq!(changes[0].player_id, 1);
}

#[tokio::test]
async fn test_nothing_settled_is_an_error() {
    let manager = manager();
    let store = manager.store();
    store.insert_profile(generate_profile(1, Game::Valorant, 1000, "Gold"));
    store.fail_player(1);

    let (completed, lines) = generate_match(7, Game::Valorant, &[(1, generate_outcome(true, 10, 10, false))]);
    store.insert_match(completed, lines);

    let result = manager.settle_match(7).await;

    assert!(matches!(
        result,
        Err(SettlementError::NothingSettled {
            match_id: 7,
            attempted: 1
        })
    ));
}

#[tokio::test]
async fn test_elite_holder_keeps_label_above_floor() {
    let manager = manager();
    let store = manager.store();
    store.insert_profile(generate_profile(1, Game::Valorant, 3300, "Apex"));

    let (completed, lines) = generate_match(8, Game::Valorant, &[(1, generate_outcome(false, 0, 0, false))]);
    store.insert_match(completed, lines);

    let changes = manager.settle_match(8).await.unwrap();

    assert_eq!(changes[0].new_mmr, 3290);
    assert_eq!(changes[0].new_rank, "Apex");
    assert!(!changes[0].rank_changed);
    assert!(store.history().is_empty());
}

#[tokio::test]
async fn test_elite_holder_below_floor_drops_to_standard() {
    let manager = manager();
    let store = manager.store();
    store.insert_profile(generate_profile(1, Game::Valorant, 3205, "Apex"));

    let (completed, lines) = generate_match(9, Game::Valorant, &[(1, generate_outcome(false, 0, 0, false))]);
    store.insert_match(completed, lines);

    let changes = manager.settle_match(9).await.unwrap();
    let history = store.history();

    assert_eq!(changes[0].new_mmr, 3195);
    assert_eq!(changes[0].new_rank, "Master");
    assert_eq!(history.len(), 1);
    assert_eq!(history[0].old_rank, "Apex");
    assert_eq!(history[0].reason, RankChangeReason::Match);
}

#[tokio::test]
async fn test_settle_pending_leaves_failures_pending() {
    let manager = manager();
    let store = manager.store();
    store.insert_profile(generate_profile(1, Game::Valorant, 1000, "Gold"));
    store.insert_profile(generate_profile(2, Game::Valorant, 1000, "Gold"));
    store.insert_profile(generate_profile(3, Game::MarvelRivals, 1000, "Gold"));
    store.fail_player(2);

    for (match_id, game, player) in [(10, Game::Valorant, 1), (11, Game::Valorant, 2), (12, Game::MarvelRivals, 3)] {
        let (completed, lines) = generate_match(match_id, game, &[(player, generate_outcome(true, 10, 10, false))]);
        store.insert_match(completed, lines);
    }

    let report = manager.settle_pending(Some(Game::Valorant)).await.unwrap();

    assert_eq!(report.settled, vec![10]);
    assert_eq!(report.failed, vec![11]);
    assert_eq!(report.changes.len(), 1);
    assert!(store.is_settled(10));
    assert!(!store.is_settled(11));
    assert!(!store.is_settled(12));

    let rest = manager.settle_pending(None).await.unwrap();
    assert_eq!(rest.settled, vec![12]);
    assert_eq!(rest.failed, vec![11]);
}

#[tokio::test]
async fn test_settled_match_is_not_pending() {
    let manager = manager();
    let store = manager.store();
    store.insert_profile(generate_profile(1, Game::Valorant, 1000, "Gold"));

    let (completed, lines) = generate_match(5, Game::Valorant, &[(1, generate_outcome(true, 10, 10, false))]);
    store.insert_match(completed, lines);

    manager.settle_match(5).await.unwrap();
    assert_eq!(store.profile(1, Game::Valorant).unwrap().current_mmr, 1020);

    let report = manager.settle_pending(None).await.unwrap();

    assert!(report.settled.is_empty());
    assert!(report.changes.is_empty());
    assert_eq!(store.profile(1, Game::Valorant).unwrap().current_mmr, 1020);
}
