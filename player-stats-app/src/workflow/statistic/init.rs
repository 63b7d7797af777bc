use std::sync::Arc;

use crate::{
    domain::{
        ObjectId, RepoError, RepoRetrieveError,
        statistic::{PlayerStatistic, StatisticRepository},
    },
    schema::init::InitStatisticRequest,
    workflow::statistic::StatisticError,
};

#[async_trait::async_trait]
pub trait InitStatisticUseCase {
    async fn init(&self, request: InitStatisticRequest) -> Result<PlayerStatistic, StatisticError>;
}

pub struct InitStatisticUseCaseImpl<S: StatisticRepository> {
    statistic_repository: Arc<S>,
}

impl<S: StatisticRepository> InitStatisticUseCaseImpl<S> {
    pub fn new(statistic_repository: Arc<S>) -> Self {
        Self {
            statistic_repository,
        }
    }
}

#[async_trait::async_trait]
impl<S: StatisticRepository + Send + Sync + 'static> InitStatisticUseCase
    for InitStatisticUseCaseImpl<S>
{
    async fn init(&self, request: InitStatisticRequest) -> Result<PlayerStatistic, StatisticError> {
        let player_id = request.player_id;
        let fresh = PlayerStatistic::new(request.id.unwrap_or_else(ObjectId::new), player_id);

        if let Err(RepoError::StorageError(e)) =
            self.statistic_repository.upsert_by_player(fresh).await
        {
            log::error!("Failed to initialize statistic of player {}: {}", player_id, e);
            return Err(StatisticError::Internal(e));
        }

        match self.statistic_repository.find_by_player(player_id).await {
            Ok(statistic) => Ok(statistic),
            Err(RepoRetrieveError::NotFound) => {
                log::error!("Statistic of player {} vanished after initialization", player_id);
                Err(StatisticError::NotFound)
            }
            Err(RepoRetrieveError::StorageError(e)) => {
                log::error!("Failed to read back statistic of player {}: {}", player_id, e);
                Err(StatisticError::Internal(e))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::statistic::MockStatisticRepository;

    #[tokio::test]
    async fn test_init_creates_default_record() {
        let repo = Arc::new(MockStatisticRepository::new());
        let use_case = InitStatisticUseCaseImpl::new(repo.clone());
        let player_id = ObjectId::new();

        let statistic = use_case
            .init(InitStatisticRequest {
                player_id,
                id: None,
            })
            .await
            .unwrap();

        assert_eq!(statistic.player_id, player_id);
        assert_eq!(statistic.total_games, 0);
        assert_eq!(statistic.wins, 0);
        assert_eq!(statistic.loses, 0);
        assert_eq!(statistic.rating, 0);
        assert_eq!(repo.len(), 1);
    }

    #[tokio::test]
    async fn test_init_resets_existing_record() {
        let repo = Arc::new(MockStatisticRepository::new());
        let existing = PlayerStatistic {
            id: ObjectId::new(),
            player_id: ObjectId::new(),
            total_games: 10,
            wins: 6,
            loses: 4,
            rating: 2676,
        };
        repo.insert(existing.clone());
        let use_case = InitStatisticUseCaseImpl::new(repo.clone());

        for _ in 0..2 {
            let statistic = use_case
                .init(InitStatisticRequest {
                    player_id: existing.player_id,
                    id: None,
                })
                .await
                .unwrap();
            assert_eq!(
                statistic,
                PlayerStatistic::new(existing.id, existing.player_id)
            );
        }
        assert_eq!(repo.len(), 1);
    }

    #[tokio::test]
    async fn test_init_uses_requested_record_id() {
        let repo = Arc::new(MockStatisticRepository::new());
        let use_case = InitStatisticUseCaseImpl::new(repo);
        let id = ObjectId::new();

        let statistic = use_case
            .init(InitStatisticRequest {
                player_id: ObjectId::new(),
                id: Some(id),
            })
            .await
            .unwrap();
        assert_eq!(statistic.id, id);
    }

    #[tokio::test]
    async fn test_init_storage_failure() {
        let repo = Arc::new(MockStatisticRepository::new());
        repo.set_failing(true);
        let use_case = InitStatisticUseCaseImpl::new(repo.clone());

        let result = use_case
            .init(InitStatisticRequest {
                player_id: ObjectId::new(),
                id: None,
            })
            .await;
        assert!(matches!(result, Err(StatisticError::Internal(_))));
        assert_eq!(repo.len(), 0);
    }
}
