use std::{process::ExitCode, time::Duration};

use chrono::Utc;
use clap::Parser;
use rank_processor::{
    args::{Args, Command},
    database::{db::DbClient, store::StoreError},
    messaging::{RabbitMqConfig, RabbitMqPublisher, RankChangedMessage},
    model::{
        placement::{LifetimeStats, PlacementRequest},
        rank_manager::{RankManager, SettlementError},
        rank_table::{RankTable, RankTableError},
        structures::game::Game
    },
    utils::schedule::run_until
};
use strum::IntoEnumIterator;
use thiserror::Error;
use tracing::{error, info, warn};
use tracing_indicatif::IndicatifLayer;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

#[derive(Debug, Error)]
enum AppError {
    #[error("no connection string given (--connection-string or CONNECTION_STRING)")]
    MissingConnectionString,
    #[error(transparent)]
    RankTable(#[from] RankTableError),
    #[error(transparent)]
    Store(#[from] StoreError),
    #[error(transparent)]
    Settlement(#[from] SettlementError),
    #[error("failed to encode output: {0}")]
    Output(#[from] serde_json::Error)
}

#[tokio::main]
async fn main() -> ExitCode {
    dotenv::dotenv().ok();
    let args = Args::parse();
    init_logging(&args.log_level);

    match run(args).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("{}", e);
            ExitCode::FAILURE
        }
    }
}

fn init_logging(level: &str) {
    let indicatif_layer = IndicatifLayer::new();
    let filter = EnvFilter::try_new(level).unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().with_writer(indicatif_layer.get_stderr_writer()))
        .with(indicatif_layer)
        .init();
}

async fn run(args: Args) -> Result<(), AppError> {
    let table = match &args.rank_table {
        Some(path) => {
            info!("Loading rank table from {}", path.display());
            RankTable::from_json_file(path)?
        }
        None => RankTable::default()
    };

    let connection_string = args.connection_string.ok_or(AppError::MissingConnectionString)?;
    let client = DbClient::connect(&connection_string).await?;
    let manager = RankManager::new(client, table);
    let mut publisher = publisher().await;

    let result = dispatch(&manager, publisher.as_ref(), args.command).await;

    if let Some(p) = publisher.as_mut() {
        if let Err(e) = p.close().await {
            warn!("Failed to close RabbitMQ publisher: {}", e);
        }
    }

    result
}

async fn dispatch(
    manager: &RankManager<DbClient>,
    publisher: Option<&RabbitMqPublisher>,
    command: Command
) -> Result<(), AppError> {
    match command {
        Command::Settle { match_id } => {
            let changes = manager.settle_match(match_id).await?;
            let now = Utc::now();
            let messages: Vec<_> = changes
                .iter()
                .filter_map(|c| RankChangedMessage::from_match(c, now))
                .collect();
            publish(publisher, &messages).await;

            println!("{}", serde_json::to_string_pretty(&changes)?);
        }
        Command::SettlePending { game } => {
            let report = manager.settle_pending(game).await?;
            let now = Utc::now();
            let messages: Vec<_> = report
                .changes
                .iter()
                .filter_map(|c| RankChangedMessage::from_match(c, now))
                .collect();
            publish(publisher, &messages).await;

            if !report.failed.is_empty() {
                warn!("Matches left pending: {:?}", report.failed);
            }
        }
        Command::Sweep { game } => sweep(manager, publisher, game).await?,
        Command::Progression { player_id, game } => match manager.progression_for(player_id, game).await? {
            Some(progression) => println!("{}", serde_json::to_string_pretty(&progression)?),
            None => info!("Player {} has no {} profile", player_id, game)
        },
        Command::Place {
            player_id,
            game,
            source_rank,
            source_elo,
            wins,
            games_played,
            peak_rank
        } => {
            let lifetime = match (wins, games_played) {
                (Some(wins), Some(games_played)) => Some(LifetimeStats {
                    wins,
                    games_played,
                    peak_rank: peak_rank.clone()
                }),
                _ => peak_rank.clone().map(|peak| LifetimeStats {
                    wins: 0,
                    games_played: 0,
                    peak_rank: Some(peak)
                })
            };
            let request = PlacementRequest {
                source_rank,
                source_elo,
                lifetime
            };

            let placement = manager.place_player(player_id, game, &request).await?;
            println!("{}", serde_json::to_string_pretty(&placement)?);
        }
        Command::Serve { interval_secs } => serve(manager, publisher, interval_secs).await
    }

    Ok(())
}

async fn sweep(
    manager: &RankManager<DbClient>,
    publisher: Option<&RabbitMqPublisher>,
    game: Game
) -> Result<(), AppError> {
    let summary = manager.sweep_elite_ranks(game).await?;
    let now = Utc::now();
    let messages: Vec<_> = summary
        .applied
        .iter()
        .map(|a| RankChangedMessage::from_sweep(a, now))
        .collect();
    publish(publisher, &messages).await;

    Ok(())
}

async fn serve(manager: &RankManager<DbClient>, publisher: Option<&RabbitMqPublisher>, interval_secs: u64) {
    let period = Duration::from_secs(interval_secs.max(1));
    info!("Serving, settling every {}s", period.as_secs());

    let passes = run_until(period, tokio::signal::ctrl_c(), || async move {
        match manager.settle_pending(None).await {
            Ok(report) => {
                let now = Utc::now();
                let messages: Vec<_> = report
                    .changes
                    .iter()
                    .filter_map(|c| RankChangedMessage::from_match(c, now))
                    .collect();
                publish(publisher, &messages).await;
            }
            Err(e) => error!("Failed to fetch pending matches: {}", e)
        }

        for game in Game::iter() {
            if let Err(e) = sweep(manager, publisher, game).await {
                error!("Elite sweep for {} failed: {}", game, e);
            }
        }
    })
    .await;

    info!("Received Ctrl-C after {} pass(es), shutting down", passes);
}

async fn publish(publisher: Option<&RabbitMqPublisher>, messages: &[RankChangedMessage]) {
    let Some(publisher) = publisher else {
        return;
    };

    if messages.is_empty() {
        return;
    }

    let sent = publisher.publish_all(messages).await;
    info!("Published {}/{} rank change event(s)", sent, messages.len());
}

/// `None` when publishing is disabled or RabbitMQ cannot be reached.
async fn publisher() -> Option<RabbitMqPublisher> {
    let config = match RabbitMqConfig::from_env() {
        Ok(config) => config,
        Err(e) => {
            warn!("RabbitMQ configuration incomplete, rank events disabled: {}", e);
            return None;
        }
    };

    if !config.enabled {
        return None;
    }

    match RabbitMqPublisher::connect_from_config(&config).await {
        Ok(publisher) => Some(publisher),
        Err(e) => {
            warn!("Could not connect to RabbitMQ, rank events disabled: {}", e);
            None
        }
    }
}
