use chrono::Utc;
use rank_processor::{
    database::{
        db::DbClient,
        db_structs::{RankHistoryEntry, RankUpdate},
        store::{HistoryLog, MatchFeed, PlayerStore}
    },
    model::{
        rank_manager::RankManager,
        rank_table::RankTable,
        structures::{game::Game, rank_change_reason::RankChangeReason}
    }
};
use serial_test::serial;

use super::test_helpers::TestDatabase;
use crate::common::init_test_env;

async fn seeded() -> (TestDatabase, DbClient) {
    init_test_env();
    let test_db = TestDatabase::new().await.expect("Failed to create test database");
    test_db.seed_test_data().await.expect("Failed to seed test data");

    let client = DbClient::connect(&test_db.connection_string)
        .await
        .expect("Failed to connect");

    (test_db, client)
}

#[tokio::test]
#[serial]
#[ignore = "requires docker"]
async fn test_get_profile() {
    let (_db, client) = seeded().await;

    let profile = client.get_profile(2, Game::Valorant).await.unwrap().unwrap();
    assert_eq!(profile.current_mmr, 1450);
    assert_eq!(profile.peak_mmr, 1500);
    assert_eq!(profile.rank_label, "Platinum");

    assert!(client.get_profile(2, Game::MarvelRivals).await.unwrap().is_none());
}

#[tokio::test]
#[serial]
#[ignore = "requires docker"]
async fn test_update_rank_never_lowers_peak() {
    let (_db, client) = seeded().await;

    let update = RankUpdate {
        player_id: 2,
        game: Game::Valorant,
        rank_label: "Gold".to_string(),
        rank_value: 4,
        mmr: 1100
    };
    assert!(client.update_rank(&update).await.unwrap());

    let profile = client.get_profile(2, Game::Valorant).await.unwrap().unwrap();
    assert_eq!(profile.current_mmr, 1100);
    assert_eq!(profile.peak_mmr, 1500);

    let missing = RankUpdate {
        player_id: 999,
        ..update
    };
    assert!(!client.update_rank(&missing).await.unwrap());
}

#[tokio::test]
#[serial]
#[ignore = "requires docker"]
async fn test_top_profiles_order() {
    let (_db, client) = seeded().await;

    let top = client.top_profiles(Game::Valorant, 3).await.unwrap();
    let ids: Vec<i64> = top.iter().map(|p| p.player_id).collect();

    assert_eq!(ids, vec![4, 3, 2]);
}

#[tokio::test]
#[serial]
#[ignore = "requires docker"]
async fn test_profiles_with_ranks() {
    let (_db, client) = seeded().await;

    let labels = vec!["Apex".to_string(), "Grandmaster".to_string()];
    let holders = client.profiles_with_ranks(Game::Valorant, &labels).await.unwrap();

    assert_eq!(holders.len(), 1);
    assert_eq!(holders[0].player_id, 4);
}

#[tokio::test]
#[serial]
#[ignore = "requires docker"]
async fn test_pending_matches_and_mark_settled() {
    let (_db, client) = seeded().await;

    let pending = client.pending_matches(None).await.unwrap();
    assert_eq!(pending.iter().map(|m| m.id).collect::<Vec<_>>(), vec![1, 2]);
    assert!(client.pending_matches(Some(Game::MarvelRivals)).await.unwrap().is_empty());

    assert!(!client.is_match_settled(1).await.unwrap());
    client.mark_settled(1).await.unwrap();
    assert!(client.is_match_settled(1).await.unwrap());
    assert!(!client.is_match_settled(999).await.unwrap());
    let pending = client.pending_matches(Some(Game::Valorant)).await.unwrap();
    assert_eq!(pending.len(), 1);
    assert_eq!(pending[0].id, 2);
}

#[tokio::test]
#[serial]
#[ignore = "requires docker"]
async fn test_match_stats_defaults_missing_columns() {
    let (_db, client) = seeded().await;

    let lines = client.match_stats(2).await.unwrap();
    let missing = lines.iter().find(|l| l.player_id == 4).unwrap();

    assert!(!missing.outcome.won);
    assert_eq!(missing.outcome.kills, 0);
    assert_eq!(missing.outcome.deaths, 0);
    assert!(!missing.outcome.is_mvp);
    assert_eq!(missing.outcome.expected_score, None);
}

#[tokio::test]
#[serial]
#[ignore = "requires docker"]
async fn test_append_history() {
    let (db, client) = seeded().await;

    let entry = RankHistoryEntry {
        player_id: 1,
        game: Game::Valorant,
        old_rank: "Gold".to_string(),
        new_rank: "Platinum".to_string(),
        old_mmr: 1190,
        new_mmr: 1213,
        reason: RankChangeReason::Match,
        match_id: Some(1),
        timestamp: Utc::now()
    };
    client.append(&entry).await.unwrap();

    let raw = db.get_client().await.unwrap();
    let row = raw
        .query_one("SELECT new_rank, reason FROM rank_history WHERE player_id = 1", &[])
        .await
        .unwrap();
    assert_eq!(row.get::<_, String>(0), "Platinum");
    assert_eq!(row.get::<_, i32>(1), RankChangeReason::Match as i32);
}

#[tokio::test]
#[serial]
#[ignore = "requires docker"]
async fn test_settle_pending_against_postgres() {
    let (db, client) = seeded().await;
    let manager = RankManager::new(client, RankTable::default());

    let report = manager.settle_pending(None).await.unwrap();
    assert_eq!(report.settled, vec![1, 2]);
    assert!(report.failed.is_empty());

    let store = manager.store();
    let promoted = store.get_profile(1, Game::Valorant).await.unwrap().unwrap();
    assert_eq!(promoted.current_mmr, 1213);
    assert_eq!(promoted.rank_label, "Platinum");

    let loser = store.get_profile(2, Game::Valorant).await.unwrap().unwrap();
    assert_eq!(loser.current_mmr, 1433);
    assert_eq!(loser.peak_mmr, 1500);

    // Held elite label survives a small loss above the floor
    let apex = store.get_profile(4, Game::Valorant).await.unwrap().unwrap();
    assert_eq!(apex.current_mmr, 3290);
    assert_eq!(apex.rank_label, "Apex");

    assert!(store.pending_matches(None).await.unwrap().is_empty());

    let raw = db.get_client().await.unwrap();
    let history: i64 = raw
        .query_one("SELECT COUNT(*) FROM rank_history", &[])
        .await
        .unwrap()
        .get(0);
    assert_eq!(history, 1);
}

#[tokio::test]
#[serial]
#[ignore = "requires docker"]
async fn test_sweep_against_postgres() {
    let (_db, client) = seeded().await;
    let manager = RankManager::new(client, RankTable::default());

    let first = manager.sweep_elite_ranks(Game::Valorant).await.unwrap();
    assert_eq!(first.promoted, 1);
    assert_eq!(first.applied[0].player_id, 3);
    assert_eq!(first.applied[0].new_rank, "Grandmaster");

    let second = manager.sweep_elite_ranks(Game::Valorant).await.unwrap();
    assert!(second.applied.is_empty());
}
