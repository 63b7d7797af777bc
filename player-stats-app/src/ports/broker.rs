use std::sync::{
    Arc, Mutex,
    atomic::{AtomicBool, Ordering},
};

use futures::{StreamExt, stream::BoxStream};
use thiserror::Error;
use tokio::sync::{Semaphore, mpsc};

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BrokerError {
    #[error("connection error: {0}")]
    Connection(String),

    #[error("channel error: {0}")]
    Channel(String),

    #[error("publish error: {0}")]
    Publish(String),
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ExchangeKind {
    Direct,
    Fanout,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct DeclareOptions {
    pub durable: bool,
    pub auto_delete: bool,
    pub passive: bool,
}

impl DeclareOptions {
    pub const DURABLE: DeclareOptions = DeclareOptions {
        durable: true,
        auto_delete: false,
        passive: false,
    };
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct MessageProperties {
    pub correlation_id: Option<String>,
    pub reply_to: Option<String>,
    pub content_type: Option<String>,
    pub persistent: bool,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Delivery {
    pub delivery_tag: u64,
    pub body: Vec<u8>,
    pub properties: MessageProperties,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct OutgoingMessage {
    pub exchange: String,
    pub routing_key: String,
    pub payload: Vec<u8>,
    pub properties: MessageProperties,
    pub mandatory: bool,
}

pub type DeliveryStream = BoxStream<'static, Result<Delivery, BrokerError>>;

#[async_trait::async_trait]
pub trait BrokerPort {
    type Channel: BrokerChannelPort + Send + Sync + 'static;

    async fn open_channel(&self) -> Result<Self::Channel, BrokerError>;
}

#[async_trait::async_trait]
pub trait BrokerChannelPort {
    async fn declare_exchange(
        &self,
        exchange: &str,
        kind: ExchangeKind,
        options: DeclareOptions,
    ) -> Result<(), BrokerError>;
    async fn declare_queue(&self, queue: &str, options: DeclareOptions) -> Result<(), BrokerError>;
    async fn bind_queue(
        &self,
        queue: &str,
        exchange: &str,
        routing_key: &str,
    ) -> Result<(), BrokerError>;
    /// Caps unacknowledged deliveries; `global = false` scopes the limit to this channel's consumers.
    async fn set_prefetch(&self, prefetch_count: u16, global: bool) -> Result<(), BrokerError>;
    async fn consume(&self, queue: &str) -> Result<DeliveryStream, BrokerError>;
    async fn publish(&self, message: OutgoingMessage) -> Result<(), BrokerError>;
    async fn ack(&self, delivery_tag: u64) -> Result<(), BrokerError>;
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum BrokerCall {
    DeclareExchange {
        exchange: String,
        kind: ExchangeKind,
        options: DeclareOptions,
    },
    DeclareQueue {
        queue: String,
        options: DeclareOptions,
    },
    BindQueue {
        queue: String,
        exchange: String,
        routing_key: String,
    },
    SetPrefetch {
        prefetch_count: u16,
        global: bool,
    },
    Consume {
        queue: String,
    },
    Publish(OutgoingMessage),
    Ack(u64),
}

/// In-process broker double. Deliveries are withheld while the prefetch window is full, the
/// way a real broker does, so a consumer that never acks stalls here too.
#[derive(Clone)]
pub struct MockBrokerChannel {
    calls: Arc<Mutex<Vec<BrokerCall>>>,
    sender: mpsc::UnboundedSender<Delivery>,
    receiver: Arc<Mutex<Option<mpsc::UnboundedReceiver<Delivery>>>>,
    window: Arc<Semaphore>,
    fail_publish: Arc<AtomicBool>,
}

#[allow(unused)]
impl MockBrokerChannel {
    pub fn new() -> Self {
        let (sender, receiver) = mpsc::unbounded_channel();
        Self {
            calls: Arc::new(Mutex::new(Vec::new())),
            sender,
            receiver: Arc::new(Mutex::new(Some(receiver))),
            window: Arc::new(Semaphore::new(0)),
            fail_publish: Arc::new(AtomicBool::new(false)),
        }
    }

    pub fn deliver(&self, delivery: Delivery) {
        let _ = self.sender.send(delivery);
    }

    pub fn calls(&self) -> Vec<BrokerCall> {
        self.calls.lock().unwrap().clone()
    }

    pub fn published(&self) -> Vec<OutgoingMessage> {
        self.calls()
            .into_iter()
            .filter_map(|call| match call {
                BrokerCall::Publish(message) => Some(message),
                _ => None,
            })
            .collect()
    }

    pub fn acked(&self) -> Vec<u64> {
        self.calls()
            .into_iter()
            .filter_map(|call| match call {
                BrokerCall::Ack(tag) => Some(tag),
                _ => None,
            })
            .collect()
    }

    pub fn set_fail_publish(&self, fail: bool) {
        self.fail_publish.store(fail, Ordering::SeqCst);
    }

    fn record(&self, call: BrokerCall) {
        self.calls.lock().unwrap().push(call);
    }
}

impl Default for MockBrokerChannel {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait::async_trait]
impl BrokerChannelPort for MockBrokerChannel {
    async fn declare_exchange(
        &self,
        exchange: &str,
        kind: ExchangeKind,
        options: DeclareOptions,
    ) -> Result<(), BrokerError> {
        self.record(BrokerCall::DeclareExchange {
            exchange: exchange.to_string(),
            kind,
            options,
        });
        Ok(())
    }

    async fn declare_queue(&self, queue: &str, options: DeclareOptions) -> Result<(), BrokerError> {
        self.record(BrokerCall::DeclareQueue {
            queue: queue.to_string(),
            options,
        });
        Ok(())
    }

    async fn bind_queue(
        &self,
        queue: &str,
        exchange: &str,
        routing_key: &str,
    ) -> Result<(), BrokerError> {
        self.record(BrokerCall::BindQueue {
            queue: queue.to_string(),
            exchange: exchange.to_string(),
            routing_key: routing_key.to_string(),
        });
        Ok(())
    }

    async fn set_prefetch(&self, prefetch_count: u16, global: bool) -> Result<(), BrokerError> {
        self.record(BrokerCall::SetPrefetch {
            prefetch_count,
            global,
        });
        self.window.add_permits(prefetch_count as usize);
        Ok(())
    }

    async fn consume(&self, queue: &str) -> Result<DeliveryStream, BrokerError> {
        self.record(BrokerCall::Consume {
            queue: queue.to_string(),
        });
        let receiver = self
            .receiver
            .lock()
            .unwrap()
            .take()
            .ok_or_else(|| BrokerError::Channel("already consuming".to_string()))?;

        let window = self.window.clone();
        let stream = futures::stream::unfold((receiver, window), |(mut receiver, window)| async move {
            window.acquire().await.ok()?.forget();
            let delivery = receiver.recv().await?;
            Some((Ok(delivery), (receiver, window)))
        });
        Ok(stream.boxed())
    }

    async fn publish(&self, message: OutgoingMessage) -> Result<(), BrokerError> {
        if self.fail_publish.load(Ordering::SeqCst) {
            return Err(BrokerError::Publish("mock publish failure".to_string()));
        }
        self.record(BrokerCall::Publish(message));
        Ok(())
    }

    async fn ack(&self, delivery_tag: u64) -> Result<(), BrokerError> {
        self.record(BrokerCall::Ack(delivery_tag));
        self.window.add_permits(1);
        Ok(())
    }
}

#[derive(Clone, Default)]
pub struct MockBroker {
    pub channel: MockBrokerChannel,
    connect_error: Option<BrokerError>,
}

#[allow(unused)]
impl MockBroker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn unreachable(reason: &str) -> Self {
        Self {
            channel: MockBrokerChannel::new(),
            connect_error: Some(BrokerError::Connection(reason.to_string())),
        }
    }
}

#[async_trait::async_trait]
impl BrokerPort for MockBroker {
    type Channel = MockBrokerChannel;

    async fn open_channel(&self) -> Result<Self::Channel, BrokerError> {
        match &self.connect_error {
            Some(e) => Err(e.clone()),
            None => Ok(self.channel.clone()),
        }
    }
}
