use std::sync::Arc;

use crate::{
    rpc::envelope::ResponseEnvelope,
    schema::{Payload, init::InitStatisticSchema, retrieve::RetrieveStatisticSchema},
    workflow::statistic::{
        init::InitStatisticUseCase, retrieve::RetrieveStatisticUseCase,
        update::UpdateStatisticUseCase,
    },
};

/// Turns one parsed request into exactly one envelope. Failures never escape as errors.
#[async_trait::async_trait]
pub trait RpcHandler {
    async fn handle(&self, payload: Payload) -> ResponseEnvelope;
}

pub struct InitStatisticHandler {
    use_case: Arc<dyn InitStatisticUseCase + Send + Sync + 'static>,
}

impl InitStatisticHandler {
    pub fn new(use_case: Arc<dyn InitStatisticUseCase + Send + Sync + 'static>) -> Self {
        Self { use_case }
    }
}

#[async_trait::async_trait]
impl RpcHandler for InitStatisticHandler {
    async fn handle(&self, payload: Payload) -> ResponseEnvelope {
        match InitStatisticSchema::load(&payload) {
            Ok(request) => ResponseEnvelope::from_result(self.use_case.init(request).await),
            Err(errors) => errors.into(),
        }
    }
}

pub struct RetrieveStatisticHandler {
    use_case: Arc<dyn RetrieveStatisticUseCase + Send + Sync + 'static>,
}

impl RetrieveStatisticHandler {
    pub fn new(use_case: Arc<dyn RetrieveStatisticUseCase + Send + Sync + 'static>) -> Self {
        Self { use_case }
    }
}

#[async_trait::async_trait]
impl RpcHandler for RetrieveStatisticHandler {
    async fn handle(&self, payload: Payload) -> ResponseEnvelope {
        match RetrieveStatisticSchema::load(&payload) {
            Ok(request) => ResponseEnvelope::from_result(self.use_case.retrieve(request).await),
            Err(errors) => errors.into(),
        }
    }
}

pub struct UpdateStatisticHandler {
    use_case: Arc<dyn UpdateStatisticUseCase + Send + Sync + 'static>,
}

impl UpdateStatisticHandler {
    pub fn new(use_case: Arc<dyn UpdateStatisticUseCase + Send + Sync + 'static>) -> Self {
        Self { use_case }
    }
}

#[async_trait::async_trait]
impl RpcHandler for UpdateStatisticHandler {
    async fn handle(&self, payload: Payload) -> ResponseEnvelope {
        ResponseEnvelope::from_result(self.use_case.update(payload).await)
    }
}
