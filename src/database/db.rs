use super::{
    db_structs::{CompletedMatch, MatchStatLine, RankHistoryEntry, RankUpdate, RatingProfile},
    store::{HistoryLog, MatchFeed, PlayerStore, StoreError}
};
use crate::model::structures::{game::Game, match_outcome::MatchOutcomeInput};
use postgres_types::ToSql;
use std::sync::Arc;
use tokio_postgres::{Client, NoTls, Row};
use tracing::{debug, error, info, warn};

#[derive(Clone)]
pub struct DbClient {
    client: Arc<Client>
}

impl DbClient {
    // Connect to the database and return a DbClient instance
    pub async fn connect(connection_str: &str) -> Result<Self, StoreError> {
        let (client, connection) = tokio_postgres::connect(connection_str, NoTls).await?;

        // Spawn the connection object to run in the background
        tokio::spawn(async move {
            if let Err(e) = connection.await {
                error!("connection error: {}", e);
            }
        });

        Ok(DbClient {
            client: Arc::new(client)
        })
    }

    fn profile_from_row(row: &Row) -> Result<RatingProfile, StoreError> {
        Ok(RatingProfile {
            player_id: row.try_get("player_id")?,
            game: Self::game_from_row(row)?,
            current_mmr: row.try_get("current_mmr")?,
            peak_mmr: row.try_get("peak_mmr")?,
            rank_label: row.try_get("rank_label")?,
            rank_value: row.try_get("rank_value")?
        })
    }

    fn game_from_row(row: &Row) -> Result<Game, StoreError> {
        let game_id = row.try_get::<_, i32>("game")?;
        Game::try_from(game_id).map_err(|_| StoreError::UnknownGame(game_id))
    }

    /// Stat columns are nullable because they are filled in by external stat
    /// lookups. Missing values are treated as zero.
    fn stat_line_from_row(row: &Row) -> Result<MatchStatLine, StoreError> {
        let match_id: i64 = row.try_get("match_id")?;
        let player_id: i64 = row.try_get("player_id")?;

        let coerced = MatchOutcomeInput::from_columns(
            row.try_get("won")?,
            row.try_get("kills")?,
            row.try_get("deaths")?,
            row.try_get("assists")?,
            row.try_get("is_mvp")?,
            row.try_get("is_team_mvp")?,
            row.try_get("expected_score")?
        );

        if !coerced.is_clean() {
            warn!(
                "Match {} player {}: defaulted stat fields {:?}",
                match_id, player_id, coerced.defaulted
            );
        }

        Ok(MatchStatLine {
            match_id,
            player_id,
            game: Self::game_from_row(row)?,
            outcome: coerced.value
        })
    }

    // Access the underlying Client
    pub fn client(&self) -> Arc<Client> {
        Arc::clone(&self.client)
    }
}

impl PlayerStore for DbClient {
    async fn get_profile(&self, player_id: i64, game: Game) -> Result<Option<RatingProfile>, StoreError> {
        let row = self
            .client
            .query_opt(
                "SELECT player_id, game, current_mmr, peak_mmr, rank_label, rank_value \
                FROM rating_profiles WHERE player_id = $1 AND game = $2",
                &[&player_id, &(game as i32)]
            )
            .await?;

        row.as_ref().map(Self::profile_from_row).transpose()
    }

    async fn create_profile(&self, profile: &RatingProfile) -> Result<bool, StoreError> {
        let query = "INSERT INTO rating_profiles (player_id, game, current_mmr, peak_mmr, rank_label, rank_value) \
        VALUES ($1, $2, $3, $4, $5, $6) ON CONFLICT (player_id, game) DO NOTHING";
        let values: &[&(dyn ToSql + Sync)] = &[
            &profile.player_id,
            &(profile.game as i32),
            &profile.current_mmr,
            &profile.peak_mmr.max(profile.current_mmr),
            &profile.rank_label,
            &profile.rank_value
        ];

        let inserted = self.client.execute(query, values).await?;
        Ok(inserted > 0)
    }

    async fn update_rank(&self, update: &RankUpdate) -> Result<bool, StoreError> {
        let query = "UPDATE rating_profiles SET current_mmr = $1, peak_mmr = GREATEST(peak_mmr, $1), \
        rank_label = $2, rank_value = $3, updated_at = now() WHERE player_id = $4 AND game = $5";
        let values: &[&(dyn ToSql + Sync)] = &[
            &update.mmr,
            &update.rank_label,
            &update.rank_value,
            &update.player_id,
            &(update.game as i32)
        ];

        let updated = self.client.execute(query, values).await?;
        debug!(
            "update_rank player {} ({}) -> {} @ {} MMR: {} row(s)",
            update.player_id, update.game, update.rank_label, update.mmr, updated
        );

        Ok(updated > 0)
    }

    async fn top_profiles(&self, game: Game, limit: usize) -> Result<Vec<RatingProfile>, StoreError> {
        let rows = self
            .client
            .query(
                "SELECT player_id, game, current_mmr, peak_mmr, rank_label, rank_value \
                FROM rating_profiles WHERE game = $1 \
                ORDER BY current_mmr DESC, player_id ASC LIMIT $2",
                &[&(game as i32), &(limit as i64)]
            )
            .await?;

        rows.iter().map(Self::profile_from_row).collect()
    }

    async fn profiles_with_ranks(&self, game: Game, labels: &[String]) -> Result<Vec<RatingProfile>, StoreError> {
        let rows = self
            .client
            .query(
                "SELECT player_id, game, current_mmr, peak_mmr, rank_label, rank_value \
                FROM rating_profiles WHERE game = $1 AND rank_label = ANY($2) \
                ORDER BY current_mmr DESC, player_id ASC",
                &[&(game as i32), &labels]
            )
            .await?;

        rows.iter().map(Self::profile_from_row).collect()
    }
}

impl MatchFeed for DbClient {
    async fn match_stats(&self, match_id: i64) -> Result<Vec<MatchStatLine>, StoreError> {
        let rows = self
            .client
            .query(
                "SELECT s.match_id, s.player_id, m.game, s.won, s.kills, s.deaths, s.assists, \
                s.is_mvp, s.is_team_mvp, s.expected_score \
                FROM match_player_stats s JOIN matches m ON m.id = s.match_id \
                WHERE s.match_id = $1 ORDER BY s.player_id",
                &[&match_id]
            )
            .await?;

        rows.iter().map(Self::stat_line_from_row).collect()
    }

    async fn pending_matches(&self, game: Option<Game>) -> Result<Vec<CompletedMatch>, StoreError> {
        info!("Fetching pending matches...");
        let game_id: Option<i32> = game.map(|g| g as i32);
        let rows = self
            .client
            .query(
                "SELECT id, game, completed_at FROM matches \
                WHERE status = 'completed' AND settled_at IS NULL AND completed_at IS NOT NULL \
                AND ($1::INTEGER IS NULL OR game = $1) \
                ORDER BY completed_at, id",
                &[&game_id]
            )
            .await?;

        let matches = rows
            .iter()
            .map(|row| -> Result<CompletedMatch, StoreError> {
                Ok(CompletedMatch {
                    id: row.try_get("id")?,
                    game: Self::game_from_row(row)?,
                    completed_at: row.try_get("completed_at")?
                })
            })
            .collect::<Result<Vec<_>, StoreError>>()?;

        info!("Found {} pending matches", matches.len());
        Ok(matches)
    }

    async fn is_match_settled(&self, match_id: i64) -> Result<bool, StoreError> {
        let row = self
            .client
            .query_opt("SELECT settled_at IS NOT NULL AS settled FROM matches WHERE id = $1", &[&match_id])
            .await?;

        match row {
            Some(row) => Ok(row.try_get("settled")?),
            None => Ok(false)
        }
    }

    async fn mark_settled(&self, match_id: i64) -> Result<(), StoreError> {
        self.client
            .execute("UPDATE matches SET settled_at = now() WHERE id = $1", &[&match_id])
            .await?;

        Ok(())
    }
}

impl HistoryLog for DbClient {
    async fn append(&self, entry: &RankHistoryEntry) -> Result<(), StoreError> {
        let query = "INSERT INTO rank_history (player_id, game, old_rank, new_rank, old_mmr, new_mmr, \
        reason, match_id, created_at) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)";
        let values: &[&(dyn ToSql + Sync)] = &[
            &entry.player_id,
            &(entry.game as i32),
            &entry.old_rank,
            &entry.new_rank,
            &entry.old_mmr,
            &entry.new_mmr,
            &(entry.reason as i32),
            &entry.match_id,
            &entry.timestamp
        ];

        self.client.execute(query, values).await?;
        Ok(())
    }
}
