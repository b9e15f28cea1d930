use crate::{
    messaging::config::RabbitMqConfig,
    model::{
        elite::RankAssignment,
        rank_manager::RankChange,
        structures::{game::Game, rank_change_reason::RankChangeReason}
    }
};
use chrono::{DateTime, Utc};
use lapin::{
    options::{BasicPublishOptions, ExchangeDeclareOptions},
    types::FieldTable,
    BasicProperties, Channel, Connection, ConnectionProperties, ExchangeKind
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use thiserror::Error;
use tracing::{debug, info, warn};
use uuid::Uuid;

const MESSAGE_TYPE: &str = "rank.changed";

#[derive(Debug, Error)]
pub enum PublisherError {
    #[error("Failed to connect to RabbitMQ: {0}")]
    ConnectionError(#[from] lapin::Error),

    #[error("Failed to serialize message: {0}")]
    SerializationError(#[from] serde_json::Error),

    #[error("Publisher not initialized")]
    NotInitialized
}

/// Sent whenever a player's rank label changes
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RankChangedMessage {
    pub player_id: i64,
    pub game: Game,
    pub old_rank: String,
    pub new_rank: String,
    pub old_mmr: i32,
    pub new_mmr: i32,
    pub reason: RankChangeReason,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub match_id: Option<i64>,
    pub changed_at: DateTime<Utc>
}

impl RankChangedMessage {
    /// `None` when the match left the label as it was.
    pub fn from_match(change: &RankChange, changed_at: DateTime<Utc>) -> Option<Self> {
        if !change.rank_changed {
            return None;
        }

        Some(Self {
            player_id: change.player_id,
            game: change.game,
            old_rank: change.old_rank.clone(),
            new_rank: change.new_rank.clone(),
            old_mmr: change.old_mmr,
            new_mmr: change.new_mmr,
            reason: RankChangeReason::Match,
            match_id: Some(change.match_id),
            changed_at
        })
    }

    pub fn from_sweep(assignment: &RankAssignment, changed_at: DateTime<Utc>) -> Self {
        Self {
            player_id: assignment.player_id,
            game: assignment.game,
            old_rank: assignment.old_rank.clone(),
            new_rank: assignment.new_rank.clone(),
            old_mmr: assignment.mmr,
            new_mmr: assignment.mmr,
            reason: RankChangeReason::EliteSweep,
            match_id: None,
            changed_at
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Envelope<T> {
    message_id: String,
    message_type: String,
    sent_time: DateTime<Utc>,
    message: T
}

/// Publishes rank-change events to a fanout exchange
pub struct RabbitMqPublisher {
    connection: Option<Arc<Connection>>,
    channel: Option<Channel>,
    exchange: String,
    routing_key: String
}

impl RabbitMqPublisher {
    pub fn new(exchange: String, routing_key: String) -> Self {
        Self {
            connection: None,
            channel: None,
            exchange,
            routing_key
        }
    }

    pub fn from_config(config: &RabbitMqConfig) -> Self {
        Self::new(config.exchange.clone(), config.routing_key.clone())
    }

    /// Creates and connects a publisher from configuration
    pub async fn connect_from_config(config: &RabbitMqConfig) -> Result<Self, PublisherError> {
        let mut publisher = Self::from_config(config);
        publisher.connect(&config.connection_url()).await?;
        Ok(publisher)
    }

    pub async fn connect(&mut self, rabbitmq_url: &str) -> Result<(), PublisherError> {
        let connection = Connection::connect(rabbitmq_url, ConnectionProperties::default()).await?;
        let connection = Arc::new(connection);

        let channel = connection.create_channel().await?;

        channel
            .exchange_declare(
                &self.exchange,
                ExchangeKind::Fanout,
                ExchangeDeclareOptions {
                    durable: true,
                    ..Default::default()
                },
                FieldTable::default()
            )
            .await?;

        self.connection = Some(connection);
        self.channel = Some(channel);

        info!("Connected to RabbitMQ, exchange '{}' declared", self.exchange);

        Ok(())
    }

    pub async fn publish_rank_changed(&self, message: &RankChangedMessage) -> Result<(), PublisherError> {
        let channel = self.channel.as_ref().ok_or(PublisherError::NotInitialized)?;

        let message_id = Uuid::new_v4().to_string();
        let payload = encode(message_id.clone(), message)?;

        channel
            .basic_publish(
                &self.exchange,
                &self.routing_key,
                BasicPublishOptions::default(),
                &payload,
                BasicProperties::default()
                    .with_content_type("application/json".into())
                    .with_message_id(message_id.into())
                    .with_timestamp(Utc::now().timestamp() as u64)
            )
            .await?;

        debug!(
            "Published rank change for player {} ({} -> {}) to '{}'",
            message.player_id, message.old_rank, message.new_rank, self.exchange
        );

        Ok(())
    }

    /// Publishes each message, logging failures instead of stopping.
    /// Returns how many were sent.
    pub async fn publish_all(&self, messages: &[RankChangedMessage]) -> usize {
        let mut sent = 0;
        for message in messages {
            match self.publish_rank_changed(message).await {
                Ok(()) => sent += 1,
                Err(e) => warn!("Failed to publish rank change for player {}: {}", message.player_id, e)
            }
        }

        sent
    }

    pub fn is_connected(&self) -> bool {
        self.connection.is_some() && self.channel.is_some()
    }

    pub async fn close(&mut self) -> Result<(), PublisherError> {
        if let Some(channel) = self.channel.take() {
            channel.close(200, "Normal shutdown").await?;
        }

        if let Some(connection) = self.connection.take() {
            if let Ok(conn) = Arc::try_unwrap(connection) {
                conn.close(200, "Normal shutdown").await?;
            }
        }

        info!("RabbitMQ connection closed");
        Ok(())
    }
}

fn encode(message_id: String, message: &RankChangedMessage) -> Result<Vec<u8>, PublisherError> {
    let envelope = Envelope {
        message_id,
        message_type: MESSAGE_TYPE.to_string(),
        sent_time: Utc::now(),
        message
    };

    Ok(serde_json::to_vec(&envelope)?)
}

impl Drop for RabbitMqPublisher {
    fn drop(&mut self) {
        if self.is_connected() {
            warn!("RabbitMQ publisher dropped without proper closure");
        }
    }
}
