use std::sync::Arc;

use validator::Validate;

use crate::{
    domain::{
        RepoRetrieveError, RepoUpdateError,
        statistic::{PlayerStatistic, StatisticRepository},
    },
    schema::{FieldErrors, Payload, update::UpdateStatisticSchema},
    workflow::statistic::StatisticError,
};

/// Update takes the raw payload: its counters can only be validated against the stored record.
#[async_trait::async_trait]
pub trait UpdateStatisticUseCase {
    async fn update(&self, payload: Payload) -> Result<PlayerStatistic, StatisticError>;
}

pub struct UpdateStatisticUseCaseImpl<S: StatisticRepository> {
    statistic_repository: Arc<S>,
}

impl<S: StatisticRepository> UpdateStatisticUseCaseImpl<S> {
    pub fn new(statistic_repository: Arc<S>) -> Self {
        Self {
            statistic_repository,
        }
    }
}

#[async_trait::async_trait]
impl<S: StatisticRepository + Send + Sync + 'static> UpdateStatisticUseCase
    for UpdateStatisticUseCaseImpl<S>
{
    async fn update(&self, payload: Payload) -> Result<PlayerStatistic, StatisticError> {
        let Some(player_id) = UpdateStatisticSchema::player_id(&payload)? else {
            return Err(StatisticError::NotFound);
        };

        let current = match self.statistic_repository.find_by_player(player_id).await {
            Ok(statistic) => statistic,
            Err(RepoRetrieveError::NotFound) => return Err(StatisticError::NotFound),
            Err(RepoRetrieveError::StorageError(e)) => {
                log::error!("Failed to load statistic of player {}: {}", player_id, e);
                return Err(StatisticError::Internal(e));
            }
        };

        let changes = UpdateStatisticSchema::new(&current).load(&payload)?;
        let updated = current.merged(&changes);
        updated.validate().map_err(FieldErrors::from)?;

        match self.statistic_repository.update(&updated).await {
            Ok(()) => Ok(updated),
            Err(RepoUpdateError::NotFound) => Err(StatisticError::NotFound),
            Err(RepoUpdateError::StorageError(e)) => {
                log::error!("Failed to update statistic of player {}: {}", player_id, e);
                Err(StatisticError::Internal(e))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use serde_json::{Value, json};

    use super::*;
    use crate::domain::{ObjectId, statistic::MockStatisticRepository};

    fn stored() -> PlayerStatistic {
        PlayerStatistic {
            id: ObjectId::new(),
            player_id: ObjectId::new(),
            total_games: 10,
            wins: 5,
            loses: 5,
            rating: 2500,
        }
    }

    fn payload(value: Value) -> Payload {
        value.as_object().cloned().unwrap_or_default()
    }

    fn setup() -> (Arc<MockStatisticRepository>, PlayerStatistic) {
        let repo = Arc::new(MockStatisticRepository::new());
        let record = stored();
        repo.insert(record.clone());
        (repo, record)
    }

    #[tokio::test]
    async fn test_update_merges_supplied_counters() {
        let (repo, record) = setup();
        let use_case = UpdateStatisticUseCaseImpl::new(repo.clone());

        let updated = use_case
            .update(payload(json!({
                "player_id": record.player_id.to_hex(),
                "total_games": 12,
                "wins": 6,
            })))
            .await
            .unwrap();

        assert_eq!(updated.total_games, 12);
        assert_eq!(updated.wins, 6);
        assert_eq!(updated.loses, 5);
        assert_eq!(updated.rating, 2500);
        assert_eq!(repo.get(&record.player_id), Some(updated));
    }

    #[tokio::test]
    async fn test_update_with_current_values_is_a_no_op() {
        let (repo, record) = setup();
        let use_case = UpdateStatisticUseCaseImpl::new(repo.clone());

        let updated = use_case
            .update(payload(json!({
                "player_id": record.player_id.to_hex(),
                "total_games": record.total_games,
                "wins": record.wins,
                "loses": record.loses,
                "rating": record.rating,
            })))
            .await
            .unwrap();

        assert_eq!(updated, record);
        assert_eq!(repo.get(&record.player_id), Some(record));
    }

    #[tokio::test]
    async fn test_update_rejects_decrease_and_keeps_record() {
        let (repo, record) = setup();
        let use_case = UpdateStatisticUseCaseImpl::new(repo.clone());

        let result = use_case
            .update(payload(json!({
                "player_id": record.player_id.to_hex(),
                "total_games": record.total_games - 1,
            })))
            .await;

        let errors = match result {
            Err(StatisticError::Validation(errors)) => errors,
            other => panic!("expected a validation error, got {:?}", other),
        };
        assert_eq!(errors.fields().collect::<Vec<_>>(), vec!["total_games"]);
        assert_eq!(repo.get(&record.player_id), Some(record));
    }

    #[tokio::test]
    async fn test_update_with_unknown_field_applies_nothing() {
        let (repo, record) = setup();
        let use_case = UpdateStatisticUseCaseImpl::new(repo.clone());

        let result = use_case
            .update(payload(json!({
                "player_id": record.player_id.to_hex(),
                "total_games": 12,
                "wins": 6,
                "nickname": "user",
            })))
            .await;

        assert!(matches!(result, Err(StatisticError::Validation(_))));
        assert_eq!(repo.get(&record.player_id), Some(record));
    }

    #[tokio::test]
    async fn test_update_unknown_player_is_not_created() {
        let (repo, _) = setup();
        let use_case = UpdateStatisticUseCaseImpl::new(repo.clone());
        let player_id = ObjectId::new();

        let result = use_case
            .update(payload(json!({
                "player_id": player_id.to_hex(),
                "total_games": 1,
            })))
            .await;
        assert_eq!(result, Err(StatisticError::NotFound));

        let result = use_case.update(payload(json!({"total_games": 1}))).await;
        assert_eq!(result, Err(StatisticError::NotFound));

        assert_eq!(repo.len(), 1);
        assert_eq!(repo.get(&player_id), None);
    }

    #[tokio::test]
    async fn test_update_not_found_wins_over_field_errors() {
        let (repo, _) = setup();
        let use_case = UpdateStatisticUseCaseImpl::new(repo);

        let result = use_case
            .update(payload(json!({
                "player_id": ObjectId::new().to_hex(),
                "nickname": "user",
            })))
            .await;
        assert_eq!(result, Err(StatisticError::NotFound));
    }

    #[tokio::test]
    async fn test_update_with_malformed_player_id() {
        let (repo, _) = setup();
        let use_case = UpdateStatisticUseCaseImpl::new(repo);

        let result = use_case
            .update(payload(json!({"player_id": "INVALID_OBJECT_ID"})))
            .await;
        let errors = match result {
            Err(StatisticError::Validation(errors)) => errors,
            other => panic!("expected a validation error, got {:?}", other),
        };
        assert!(errors.get("player_id").is_some());
    }

    #[tokio::test]
    async fn test_update_storage_failure() {
        let (repo, record) = setup();
        repo.set_failing(true);
        let use_case = UpdateStatisticUseCaseImpl::new(repo);

        let result = use_case
            .update(payload(json!({"player_id": record.player_id.to_hex()})))
            .await;
        assert!(matches!(result, Err(StatisticError::Internal(_))));
    }
}
