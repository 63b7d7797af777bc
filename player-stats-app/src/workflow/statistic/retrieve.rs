use std::sync::Arc;

use crate::{
    domain::{
        RepoRetrieveError,
        statistic::{PlayerStatistic, StatisticRepository},
    },
    schema::retrieve::RetrieveStatisticRequest,
    workflow::statistic::StatisticError,
};

#[async_trait::async_trait]
pub trait RetrieveStatisticUseCase {
    async fn retrieve(
        &self,
        request: RetrieveStatisticRequest,
    ) -> Result<PlayerStatistic, StatisticError>;
}

pub struct RetrieveStatisticUseCaseImpl<S: StatisticRepository> {
    statistic_repository: Arc<S>,
}

impl<S: StatisticRepository> RetrieveStatisticUseCaseImpl<S> {
    pub fn new(statistic_repository: Arc<S>) -> Self {
        Self {
            statistic_repository,
        }
    }
}

#[async_trait::async_trait]
impl<S: StatisticRepository + Send + Sync + 'static> RetrieveStatisticUseCase
    for RetrieveStatisticUseCaseImpl<S>
{
    async fn retrieve(
        &self,
        request: RetrieveStatisticRequest,
    ) -> Result<PlayerStatistic, StatisticError> {
        match self
            .statistic_repository
            .find_by_player(request.player_id)
            .await
        {
            Ok(statistic) => Ok(statistic),
            Err(RepoRetrieveError::NotFound) => Err(StatisticError::NotFound),
            Err(RepoRetrieveError::StorageError(e)) => {
                log::error!(
                    "Failed to retrieve statistic of player {}: {}",
                    request.player_id,
                    e
                );
                Err(StatisticError::Internal(e))
            }
        }
    }
}
