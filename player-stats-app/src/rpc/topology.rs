use crate::ports::broker::ExchangeKind;

pub const RESPONSE_EXCHANGE_NAME: &str = "open-matchmaking.responses.direct";

pub const CONTENT_TYPE: &str = "application/json";

/// Deliveries a worker may hold unacknowledged.
pub const PREFETCH_COUNT: u16 = 1;

/// Where one operation's requests arrive and where its replies go.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct QueueTopology {
    pub queue_name: &'static str,
    pub request_exchange_name: &'static str,
    /// Set when the worker declares the request exchange itself.
    pub declare_exchange: Option<ExchangeKind>,
    pub response_exchange_name: &'static str,
}

impl QueueTopology {
    pub const INIT: QueueTopology = QueueTopology {
        queue_name: "player-stats.statistic.init",
        request_exchange_name: "open-matchmaking.player-stats.statistic.init.direct",
        declare_exchange: None,
        response_exchange_name: RESPONSE_EXCHANGE_NAME,
    };

    pub const RETRIEVE: QueueTopology = QueueTopology {
        queue_name: "player-stats.statistic.retrieve",
        request_exchange_name: "open-matchmaking.player-stats.statistic.retrieve",
        declare_exchange: Some(ExchangeKind::Fanout),
        response_exchange_name: RESPONSE_EXCHANGE_NAME,
    };

    pub const UPDATE: QueueTopology = QueueTopology {
        queue_name: "player-stats.statistic.update",
        request_exchange_name: "open-matchmaking.player-stats.statistic.update.direct",
        declare_exchange: None,
        response_exchange_name: RESPONSE_EXCHANGE_NAME,
    };

    /// Requests are bound with the queue name as routing key.
    pub fn routing_key(&self) -> &'static str {
        self.queue_name
    }
}
