use player_stats_amqp_lapin::AmqpSettings;
use player_stats_app::processes::registration::RegistrationTarget;
use thiserror::Error;

pub const SERVICE_NAME: &str = "player-statistics";
pub const SERVICE_VERSION: &str = env!("CARGO_PKG_VERSION");

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    #[error("{name} must be a valid port number, got '{value}'")]
    InvalidPort { name: &'static str, value: String },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppConfig {
    pub app_host: String,
    pub app_port: u16,
    pub database_url: String,
    pub amqp: AmqpSettings,
    pub register: RegistrationTarget,
}

impl AppConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let var = |name: &str, default: &str| lookup(name).unwrap_or_else(|| default.to_string());
        let port = |name: &'static str, default: u16| match lookup(name) {
            Some(value) => to_port(&value).ok_or(ConfigError::InvalidPort { name, value }),
            None => Ok(default),
        };

        Ok(Self {
            app_host: var("APP_HOST", "127.0.0.1"),
            app_port: port("APP_PORT", 80)?,
            database_url: var("DATABASE_URL", "sqlite://player-statistics.db?mode=rwc"),
            amqp: AmqpSettings {
                username: var("AMQP_USERNAME", "user"),
                password: var("AMQP_PASSWORD", "password"),
                host: var("AMQP_HOST", "rabbitmq"),
                port: port("AMQP_PORT", 5672)?,
                virtual_host: var("AMQP_VIRTUAL_HOST", "vhost"),
                using_ssl: to_bool(&var("AMQP_USING_SSL", "false")),
            },
            register: RegistrationTarget {
                exchange: var(
                    "REGISTER_EXCHANGE",
                    "open-matchmaking.microservice.register.direct",
                ),
                routing_key: var("REGISTER_ROUTING_KEY", "microservice.register"),
            },
        })
    }

    pub fn http_address(&self) -> String {
        format!("{}:{}", self.app_host, self.app_port)
    }
}

fn to_bool(value: &str) -> bool {
    matches!(
        value.trim().to_lowercase().as_str(),
        "1" | "true" | "yes"
    )
}

fn to_port(value: &str) -> Option<u16> {
    value.trim().parse().ok()
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn config_from(vars: &[(&str, &str)]) -> Result<AppConfig, ConfigError> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        AppConfig::from_lookup(|name| vars.get(name).cloned())
    }

    #[test]
    fn test_defaults() {
        let config = config_from(&[]).unwrap();
        assert_eq!(config.http_address(), "127.0.0.1:80");
        assert_eq!(config.amqp.host, "rabbitmq");
        assert_eq!(config.amqp.port, 5672);
        assert_eq!(config.amqp.virtual_host, "vhost");
        assert!(!config.amqp.using_ssl);
        assert_eq!(config.register.routing_key, "microservice.register");
    }

    #[test]
    fn test_overrides() {
        let config = config_from(&[
            ("APP_HOST", "0.0.0.0"),
            ("APP_PORT", "8000"),
            ("DATABASE_URL", "mysql://stats:secret@db/stats"),
            ("AMQP_USERNAME", "guest"),
            ("AMQP_PORT", " 5671 "),
            ("AMQP_USING_SSL", "Yes"),
            ("REGISTER_EXCHANGE", "services"),
        ])
        .unwrap();
        assert_eq!(config.http_address(), "0.0.0.0:8000");
        assert_eq!(config.database_url, "mysql://stats:secret@db/stats");
        assert_eq!(config.amqp.username, "guest");
        assert_eq!(config.amqp.port, 5671);
        assert!(config.amqp.using_ssl);
        assert_eq!(config.register.exchange, "services");
    }

    #[test]
    fn test_invalid_port() {
        assert_eq!(
            config_from(&[("AMQP_PORT", "amqp")]),
            Err(ConfigError::InvalidPort {
                name: "AMQP_PORT",
                value: "amqp".to_string(),
            })
        );
        assert!(config_from(&[("APP_PORT", "70000")]).is_err());
    }

    #[test]
    fn test_to_bool() {
        for value in ["1", "true", "TRUE", " yes "] {
            assert!(to_bool(value), "{value}");
        }
        for value in ["0", "false", "no", "", "on"] {
            assert!(!to_bool(value), "{value}");
        }
    }
}
