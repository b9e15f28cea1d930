use lazy_static::lazy_static;
use std::sync::Arc;
use testcontainers::{clients::Cli, Container};
use testcontainers_modules::postgres::Postgres;
use tokio_postgres::{Client, NoTls};

pub struct TestDatabase {
    pub connection_string: String,
    _container: Container<'static, Postgres>
}

impl TestDatabase {
    pub async fn new() -> Result<Self, Box<dyn std::error::Error>> {
        lazy_static! {
            static ref DOCKER: Arc<Cli> = Arc::new(Cli::default());
        }

        let container = DOCKER.run(Postgres::default());
        let port = container.get_host_port_ipv4(5432);

        let connection_string = format!(
            "host=localhost port={} user=postgres password=postgres dbname=postgres",
            port
        );

        let client = connect(&connection_string).await?;
        client.batch_execute(include_str!("../../schema.sql")).await?;

        Ok(TestDatabase {
            connection_string,
            _container: container
        })
    }

    pub async fn get_client(&self) -> Result<Client, Box<dyn std::error::Error>> {
        connect(&self.connection_string).await
    }

    /// Four Valorant players from Gold to Apex, one Marvel Rivals player,
    /// and two completed matches. Match 2 has a player with missing stats.
    pub async fn seed_test_data(&self) -> Result<(), Box<dyn std::error::Error>> {
        let client = self.get_client().await?;

        client
            .batch_execute(
                "INSERT INTO rating_profiles (player_id, game, current_mmr, peak_mmr, rank_label, rank_value) VALUES
                 (1, 0, 1190, 1190, 'Gold', 4),
                 (2, 0, 1450, 1500, 'Platinum', 5),
                 (3, 0, 2950, 2950, 'Master', 9),
                 (4, 0, 3300, 3300, 'Apex', 11),
                 (5, 1, 200, 200, 'Iron', 1);

                 INSERT INTO matches (id, game, status, completed_at) VALUES
                 (1, 0, 'completed', '2025-01-01 12:00:00+00'),
                 (2, 0, 'completed', '2025-01-01 13:00:00+00'),
                 (3, 1, 'open', NULL);

                 INSERT INTO match_player_stats
                 (match_id, player_id, won, kills, deaths, assists, is_mvp, is_team_mvp, expected_score) VALUES
                 (1, 1, true, 10, 5, 3, false, false, NULL),
                 (1, 2, false, 4, 8, 1, false, false, NULL),
                 (2, 3, true, 25, 10, 4, true, false, 0.5),
                 (2, 4, false, NULL, NULL, NULL, NULL, NULL, NULL);"
            )
            .await?;

        Ok(())
    }
}

async fn connect(connection_string: &str) -> Result<Client, Box<dyn std::error::Error>> {
    let (client, connection) = tokio_postgres::connect(connection_string, NoTls).await?;

    tokio::spawn(async move {
        if let Err(e) = connection.await {
            eprintln!("Database connection error: {}", e);
        }
    });

    Ok(client)
}
