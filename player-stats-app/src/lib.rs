use std::sync::Arc;

use crate::{
    domain::statistic::StatisticRepository,
    ports::broker::BrokerPort,
    processes::rpc_worker::RpcWorker,
    rpc::{
        handlers::{InitStatisticHandler, RetrieveStatisticHandler, UpdateStatisticHandler},
        topology::QueueTopology,
    },
    workflow::statistic::{
        init::{InitStatisticUseCase, InitStatisticUseCaseImpl},
        retrieve::{RetrieveStatisticUseCase, RetrieveStatisticUseCaseImpl},
        update::{UpdateStatisticUseCase, UpdateStatisticUseCaseImpl},
    },
};

pub mod domain;
pub mod ports;
pub mod processes;
pub mod rpc;
pub mod schema;
pub mod workflow;

pub struct Application {
    pub statistic_init_use_case: Arc<dyn InitStatisticUseCase + Send + Sync + 'static>,
    pub statistic_retrieve_use_case: Arc<dyn RetrieveStatisticUseCase + Send + Sync + 'static>,
    pub statistic_update_use_case: Arc<dyn UpdateStatisticUseCase + Send + Sync + 'static>,
}

pub fn build_application<S: StatisticRepository + Send + Sync + 'static>(
    statistic_repository: Arc<S>,
) -> Application {
    Application {
        statistic_init_use_case: Arc::new(InitStatisticUseCaseImpl::new(
            statistic_repository.clone(),
        )),
        statistic_retrieve_use_case: Arc::new(RetrieveStatisticUseCaseImpl::new(
            statistic_repository.clone(),
        )),
        statistic_update_use_case: Arc::new(UpdateStatisticUseCaseImpl::new(
            statistic_repository,
        )),
    }
}

impl Application {
    /// One worker per operation, each to be run on its own channel.
    pub fn rpc_workers<B: BrokerPort + Send + Sync + 'static>(
        &self,
        broker: Arc<B>,
    ) -> Vec<RpcWorker<B>> {
        vec![
            RpcWorker::new(
                broker.clone(),
                Arc::new(InitStatisticHandler::new(
                    self.statistic_init_use_case.clone(),
                )),
                QueueTopology::INIT,
            ),
            RpcWorker::new(
                broker.clone(),
                Arc::new(RetrieveStatisticHandler::new(
                    self.statistic_retrieve_use_case.clone(),
                )),
                QueueTopology::RETRIEVE,
            ),
            RpcWorker::new(
                broker,
                Arc::new(UpdateStatisticHandler::new(
                    self.statistic_update_use_case.clone(),
                )),
                QueueTopology::UPDATE,
            ),
        ]
    }
}
