use std::sync::Arc;

use serde::Serialize;

use crate::{
    ports::broker::{BrokerChannelPort, BrokerError, BrokerPort, MessageProperties, OutgoingMessage},
    rpc::topology::{CONTENT_TYPE, QueueTopology, RESPONSE_EXCHANGE_NAME},
};

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct Permission {
    pub codename: String,
    pub description: String,
}

/// What this service announces about itself to the rest of the platform.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct ServiceDescriptor {
    pub name: String,
    pub version: String,
    pub permissions: Vec<Permission>,
}

impl ServiceDescriptor {
    pub fn player_statistics(name: &str, version: &str) -> Self {
        let permission = |topology: &QueueTopology, description: &str| Permission {
            codename: topology.queue_name.to_string(),
            description: description.to_string(),
        };

        Self {
            name: name.to_string(),
            version: version.to_string(),
            permissions: vec![
                permission(
                    &QueueTopology::INIT,
                    "Initializes statistics from an empty state for the new player",
                ),
                permission(&QueueTopology::RETRIEVE, "Get a player statistics"),
                permission(&QueueTopology::UPDATE, "Update a player statistics"),
            ],
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RegistrationTarget {
    pub exchange: String,
    pub routing_key: String,
}

pub struct ServiceRegistration<B: BrokerPort> {
    broker: Arc<B>,
    target: RegistrationTarget,
    descriptor: ServiceDescriptor,
}

impl<B: BrokerPort> ServiceRegistration<B> {
    pub fn new(broker: Arc<B>, target: RegistrationTarget, descriptor: ServiceDescriptor) -> Self {
        Self {
            broker,
            target,
            descriptor,
        }
    }

    pub async fn register(&self) -> Result<(), BrokerError> {
        let channel = self.broker.open_channel().await?;
        let payload = serde_json::to_vec(&self.descriptor)
            .map_err(|e| BrokerError::Publish(e.to_string()))?;

        channel
            .publish(OutgoingMessage {
                exchange: self.target.exchange.clone(),
                routing_key: self.target.routing_key.clone(),
                payload,
                properties: MessageProperties {
                    correlation_id: Some(uuid::Uuid::new_v4().to_string()),
                    reply_to: Some(RESPONSE_EXCHANGE_NAME.to_string()),
                    content_type: Some(CONTENT_TYPE.to_string()),
                    persistent: true,
                },
                mandatory: true,
            })
            .await
    }

    /// Registers once. The service keeps running whether or not the announcement got through.
    pub async fn run(&self) {
        match self.register().await {
            Ok(()) => log::info!(
                "Registered {} {} via {}",
                self.descriptor.name,
                self.descriptor.version,
                self.target.exchange
            ),
            Err(e) => log::error!("Service registration failed: {}", e),
        }
    }
}

#[cfg(test)]
mod tests {
    use serde_json::{Value, json};

    use super::*;
    use crate::ports::broker::MockBroker;

    fn target() -> RegistrationTarget {
        RegistrationTarget {
            exchange: "open-matchmaking.microservice.register.direct".to_string(),
            routing_key: "microservice.register".to_string(),
        }
    }

    #[tokio::test]
    async fn test_register_publishes_descriptor() {
        let broker = Arc::new(MockBroker::new());
        let registration = ServiceRegistration::new(
            broker.clone(),
            target(),
            ServiceDescriptor::player_statistics("player-statistics", "0.1.0"),
        );

        registration.register().await.unwrap();

        let published = broker.channel.published();
        assert_eq!(published.len(), 1);
        let message = &published[0];
        assert_eq!(message.exchange, "open-matchmaking.microservice.register.direct");
        assert_eq!(message.routing_key, "microservice.register");
        assert_eq!(
            message.properties.reply_to.as_deref(),
            Some(RESPONSE_EXCHANGE_NAME)
        );
        assert!(message.properties.correlation_id.is_some());

        let body: Value = serde_json::from_slice(&message.payload).unwrap();
        assert_eq!(body["name"], json!("player-statistics"));
        assert_eq!(body["version"], json!("0.1.0"));
        let codenames: Vec<&str> = body["permissions"]
            .as_array()
            .unwrap()
            .iter()
            .map(|p| p["codename"].as_str().unwrap())
            .collect();
        assert_eq!(
            codenames,
            vec![
                "player-stats.statistic.init",
                "player-stats.statistic.retrieve",
                "player-stats.statistic.update",
            ]
        );
    }

    #[tokio::test]
    async fn test_each_registration_gets_its_own_correlation_id() {
        let broker = Arc::new(MockBroker::new());
        let registration = ServiceRegistration::new(
            broker.clone(),
            target(),
            ServiceDescriptor::player_statistics("player-statistics", "0.1.0"),
        );

        registration.register().await.unwrap();
        registration.register().await.unwrap();

        let published = broker.channel.published();
        assert_ne!(
            published[0].properties.correlation_id,
            published[1].properties.correlation_id
        );
    }

    #[tokio::test]
    async fn test_register_failure_is_not_fatal() {
        let broker = Arc::new(MockBroker::unreachable("connection refused"));
        let registration = ServiceRegistration::new(
            broker.clone(),
            target(),
            ServiceDescriptor::player_statistics("player-statistics", "0.1.0"),
        );

        assert_eq!(
            registration.register().await,
            Err(BrokerError::Connection("connection refused".to_string()))
        );
        registration.run().await;
        assert!(broker.channel.calls().is_empty());
    }
}
