use chrono::{Duration, TimeZone, Utc};
use rank_processor::{
    database::memory::MemoryStore,
    model::{
        placement::{LifetimeStats, PlacementRequest},
        rank_manager::{PlacementError, RankManager},
        rank_table::RankTable,
        structures::{game::Game, rank_change_reason::RankChangeReason},
        usage::UsageTracker
    }
};

use crate::common::init_test_env;

fn manager() -> RankManager<MemoryStore> {
    init_test_env();
    RankManager::new(MemoryStore::new(), RankTable::default())
}

fn request(source_rank: &str, source_elo: f64) -> PlacementRequest {
    PlacementRequest {
        source_rank: source_rank.to_string(),
        source_elo,
        lifetime: None
    }
}

#[tokio::test]
async fn test_placement_stays_in_bottom_band() {
    let manager = manager();
    let ceiling = manager.table().bottom_band().max_mmr;
    let strong = PlacementRequest {
        source_rank: "Radiant".to_string(),
        source_elo: 5000.0,
        lifetime: Some(LifetimeStats {
            wins: 400,
            games_played: 500,
            peak_rank: Some("Radiant".to_string())
        })
    };

    let placement = manager.place_player(1, Game::Valorant, &strong).await.unwrap();

    assert!(placement.profile.current_mmr <= ceiling);
    assert_eq!(placement.profile.rank_label, "Iron");
    assert_eq!(placement.profile.peak_mmr, placement.profile.current_mmr);
}

#[tokio::test]
async fn test_placement_history_starts_unranked() {
    let manager = manager();

    manager
        .place_player(1, Game::MarvelRivals, &request("Diamond 1", 1000.0))
        .await
        .unwrap();
    let history = manager.store().history();

    assert_eq!(history.len(), 1);
    assert_eq!(history[0].old_rank, "Unranked");
    assert_eq!(history[0].reason, RankChangeReason::Placement);
}

#[tokio::test]
async fn test_games_are_placed_separately() {
    let manager = manager();

    let valorant = manager.place_player(1, Game::Valorant, &request("Iron", 0.0)).await.unwrap();
    let rivals = manager
        .place_player(1, Game::MarvelRivals, &request("Celestial", 5000.0))
        .await
        .unwrap();

    assert!(!valorant.already_placed);
    assert!(!rivals.already_placed);
    assert_eq!(valorant.profile.current_mmr, 0);
    assert_eq!(rivals.profile.current_mmr, 280);
}

#[tokio::test]
async fn test_limited_placement() {
    let manager = manager();
    let mut usage = UsageTracker::new(2);
    let now = Utc.with_ymd_and_hms(2025, 6, 1, 18, 0, 0).unwrap();
    let req = request("Gold", 0.0);

    assert!(manager
        .place_player_limited(&mut usage, now, 1, Game::Valorant, &req)
        .await
        .is_ok());
    let repeat = manager
        .place_player_limited(&mut usage, now, 1, Game::Valorant, &req)
        .await
        .unwrap();
    assert!(repeat.already_placed);

    let limited = manager
        .place_player_limited(&mut usage, now, 1, Game::MarvelRivals, &req)
        .await;
    assert!(matches!(limited, Err(PlacementError::Limited(_))));
    assert!(manager.store().profile(1, Game::MarvelRivals).is_none());

    let tomorrow = now + Duration::hours(7);
    assert!(manager
        .place_player_limited(&mut usage, tomorrow, 1, Game::MarvelRivals, &req)
        .await
        .is_ok());
}
