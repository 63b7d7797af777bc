//! Consume, validate, act, reply, ack.
//!
//! A worker owns one broker channel and one consumer. The consume loop never runs a handler
//! itself: it forwards each delivery into a bounded queue drained by a single processing task.
//! The queue holds at most [`PREFETCH_COUNT`] deliveries and the broker withholds the next one
//! until the current one is acked, so at most one request is in flight per worker and requests
//! complete in delivery order.

use std::{panic::AssertUnwindSafe, sync::Arc};

use futures::{FutureExt, StreamExt};
use log::{debug, error, info, warn};
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

use crate::{
    ports::broker::{
        BrokerChannelPort, BrokerError, BrokerPort, DeclareOptions, Delivery, DeliveryStream,
        MessageProperties, OutgoingMessage,
    },
    rpc::{
        envelope::ResponseEnvelope,
        handlers::RpcHandler,
        topology::{CONTENT_TYPE, PREFETCH_COUNT, QueueTopology},
    },
    schema::parse_payload,
    workflow::statistic::StatisticError,
};

pub type ArcRpcHandler = Arc<dyn RpcHandler + Send + Sync + 'static>;

pub struct RpcWorker<B: BrokerPort> {
    broker: Arc<B>,
    handler: ArcRpcHandler,
    topology: QueueTopology,
}

impl<B: BrokerPort + Send + Sync + 'static> RpcWorker<B> {
    pub fn new(broker: Arc<B>, handler: ArcRpcHandler, topology: QueueTopology) -> Self {
        Self {
            broker,
            handler,
            topology,
        }
    }

    pub fn queue_name(&self) -> &'static str {
        self.topology.queue_name
    }

    /// Runs until `cancel` fires or the broker closes the consumer. A worker that cannot reach
    /// the broker or declare its topology logs the failure and returns without consuming.
    pub async fn run(&self, cancel: CancellationToken) {
        let queue = self.queue_name();

        let channel = match self.broker.open_channel().await {
            Ok(channel) => Arc::new(channel),
            Err(e) => {
                error!("[{}] Failed to connect to broker: {}", queue, e);
                return;
            }
        };

        let deliveries = match self.setup(channel.as_ref()).await {
            Ok(deliveries) => deliveries,
            Err(e) => {
                error!("[{}] Failed to set up consumer: {}", queue, e);
                return;
            }
        };

        info!("[{}] Worker started", queue);
        self.consume(channel, deliveries, cancel).await;
        info!("[{}] Worker stopped", queue);
    }

    async fn setup(&self, channel: &B::Channel) -> Result<DeliveryStream, BrokerError> {
        let topology = &self.topology;

        if let Some(kind) = topology.declare_exchange {
            channel
                .declare_exchange(topology.request_exchange_name, kind, DeclareOptions::DURABLE)
                .await?;
        }
        channel
            .declare_queue(topology.queue_name, DeclareOptions::DURABLE)
            .await?;
        channel
            .bind_queue(
                topology.queue_name,
                topology.request_exchange_name,
                topology.routing_key(),
            )
            .await?;
        channel.set_prefetch(PREFETCH_COUNT, false).await?;
        channel.consume(topology.queue_name).await
    }

    async fn consume(
        &self,
        channel: Arc<B::Channel>,
        mut deliveries: DeliveryStream,
        cancel: CancellationToken,
    ) {
        let queue = self.queue_name();
        let (sender, mut receiver) = mpsc::channel::<Delivery>(PREFETCH_COUNT as usize);

        let processor = {
            let channel = channel.clone();
            let handler = self.handler.clone();
            let topology = self.topology.clone();
            tokio::spawn(async move {
                while let Some(delivery) = receiver.recv().await {
                    process_delivery(channel.as_ref(), &handler, &topology, delivery).await;
                }
            })
        };

        loop {
            tokio::select! {
                _ = cancel.cancelled() => {
                    debug!("[{}] Cancellation requested", queue);
                    break;
                }
                next = deliveries.next() => match next {
                    Some(Ok(delivery)) => {
                        if sender.send(delivery).await.is_err() {
                            error!("[{}] Processing task is gone, stopping consumer", queue);
                            break;
                        }
                    }
                    Some(Err(e)) => {
                        error!("[{}] Failed to receive delivery: {}", queue, e);
                    }
                    None => {
                        warn!("[{}] Broker closed the consumer", queue);
                        break;
                    }
                }
            }
        }

        // Lets the in-flight delivery finish before returning.
        drop(sender);
        if let Err(e) = processor.await {
            error!("[{}] Processing task failed: {}", queue, e);
        }
    }
}

async fn process_delivery<C: BrokerChannelPort + ?Sized>(
    channel: &C,
    handler: &ArcRpcHandler,
    topology: &QueueTopology,
    delivery: Delivery,
) {
    let queue = topology.queue_name;
    let properties = delivery.properties;
    debug!(
        "[{}] Handling delivery {} (correlation id {:?})",
        queue, delivery.delivery_tag, properties.correlation_id
    );

    let payload = parse_payload(&delivery.body);
    let mut envelope = match AssertUnwindSafe(handler.handle(payload))
        .catch_unwind()
        .await
    {
        Ok(envelope) => envelope,
        Err(_) => {
            error!(
                "[{}] Handler panicked on delivery {}",
                queue, delivery.delivery_tag
            );
            StatisticError::Internal("handler panicked".to_string()).into()
        }
    };
    envelope.event = properties.correlation_id.clone();

    let reply_to = properties.reply_to.filter(|reply_to| !reply_to.is_empty());
    if let Some(reply_to) = reply_to {
        let message = OutgoingMessage {
            exchange: topology.response_exchange_name.to_string(),
            routing_key: reply_to,
            payload: envelope.to_bytes(),
            properties: MessageProperties {
                correlation_id: properties.correlation_id,
                reply_to: None,
                content_type: Some(CONTENT_TYPE.to_string()),
                persistent: true,
            },
            mandatory: true,
        };
        if let Err(e) = channel.publish(message).await {
            error!(
                "[{}] Failed to publish reply for delivery {}: {}",
                queue, delivery.delivery_tag, e
            );
        }
    }

    if let Err(e) = channel.ack(delivery.delivery_tag).await {
        error!(
            "[{}] Failed to ack delivery {}: {}",
            queue, delivery.delivery_tag, e
        );
    }
}
