use serde::{Deserialize, Serialize};
use std::env;

const DEFAULT_EXCHANGE: &str = "ranks.changed";

/// Configuration for RabbitMQ connection and messaging
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RabbitMqConfig {
    /// Publishing is skipped entirely when false
    pub enabled: bool,
    pub host: String,
    pub username: String,
    pub password: String,
    /// Virtual host to use (default: "/")
    pub vhost: String,
    /// Port number (default: 5672)
    pub port: u16,
    /// Fanout exchange rank-change events are published to
    pub exchange: String,
    pub routing_key: String
}

impl RabbitMqConfig {
    /// Reads `RABBITMQ_*` variables. Credentials are only required when
    /// `RABBITMQ_ENABLED` is true.
    pub fn from_env() -> Result<Self, env::VarError> {
        let enabled = env::var("RABBITMQ_ENABLED")
            .map(|v| matches!(v.to_ascii_lowercase().as_str(), "1" | "true" | "yes"))
            .unwrap_or(false);

        if !enabled {
            return Ok(Self::default());
        }

        let exchange = env::var("RABBITMQ_EXCHANGE").unwrap_or_else(|_| DEFAULT_EXCHANGE.to_string());

        Ok(Self {
            enabled,
            host: env::var("RABBITMQ_HOST").unwrap_or_else(|_| "localhost".to_string()),
            username: env::var("RABBITMQ_USERNAME")?,
            password: env::var("RABBITMQ_PASSWORD")?,
            vhost: env::var("RABBITMQ_VHOST").unwrap_or_else(|_| "/".to_string()),
            port: env::var("RABBITMQ_PORT")
                .ok()
                .and_then(|p| p.parse().ok())
                .unwrap_or(5672),
            routing_key: env::var("RABBITMQ_ROUTING_KEY").unwrap_or_else(|_| exchange.clone()),
            exchange
        })
    }

    /// Builds the AMQP connection URL from the configuration
    pub fn connection_url(&self) -> String {
        format!(
            "amqp://{}:{}@{}:{}/{}",
            self.username,
            self.password,
            self.host,
            self.port,
            self.vhost.replace('/', "%2F")
        )
    }
}

impl Default for RabbitMqConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            host: "localhost".to_string(),
            username: "guest".to_string(),
            password: "guest".to_string(),
            vhost: "/".to_string(),
            port: 5672,
            exchange: DEFAULT_EXCHANGE.to_string(),
            routing_key: DEFAULT_EXCHANGE.to_string()
        }
    }
}
