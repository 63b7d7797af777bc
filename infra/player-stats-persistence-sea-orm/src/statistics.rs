use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, DbErr, EntityTrait, PaginatorTrait,
    QueryFilter, TransactionError, TransactionTrait,
};

use crate::entity::player_statistic;
use player_stats_app::domain::{
    ObjectId, RepoError, RepoRetrieveError, RepoUpdateError,
    statistic::{PlayerStatistic, StatisticRepository},
};

pub struct StatisticRepositoryImpl {
    db: DatabaseConnection,
}

impl StatisticRepositoryImpl {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    fn model_to_statistic(model: player_statistic::Model) -> Result<PlayerStatistic, String> {
        let id = model
            .id
            .parse::<ObjectId>()
            .map_err(|e| format!("corrupt record id: {}", e))?;
        let player_id = model
            .player_id
            .parse::<ObjectId>()
            .map_err(|e| format!("corrupt player id on record {}: {}", model.id, e))?;

        Ok(PlayerStatistic {
            id,
            player_id,
            total_games: model.total_games,
            wins: model.wins,
            loses: model.loses,
            rating: model.rating,
        })
    }

    fn statistic_to_model(statistic: &PlayerStatistic) -> player_statistic::ActiveModel {
        player_statistic::ActiveModel {
            id: sea_orm::Set(statistic.id.to_hex()),
            player_id: sea_orm::Set(statistic.player_id.to_hex()),
            total_games: sea_orm::Set(statistic.total_games),
            wins: sea_orm::Set(statistic.wins),
            loses: sea_orm::Set(statistic.loses),
            rating: sea_orm::Set(statistic.rating),
        }
    }
}

#[async_trait::async_trait]
impl StatisticRepository for StatisticRepositoryImpl {
    async fn find_by_player(
        &self,
        player_id: ObjectId,
    ) -> Result<PlayerStatistic, RepoRetrieveError> {
        let model = player_statistic::Entity::find()
            .filter(player_statistic::Column::PlayerId.eq(player_id.to_hex()))
            .one(&self.db)
            .await
            .map_err(|e| RepoRetrieveError::StorageError(e.to_string()))?
            .ok_or(RepoRetrieveError::NotFound)?;

        Self::model_to_statistic(model).map_err(RepoRetrieveError::StorageError)
    }

    async fn upsert_by_player(&self, statistic: PlayerStatistic) -> Result<(), RepoError> {
        let res = self
            .db
            .transaction::<_, (), RepoError>(|c| {
                Box::pin(async move {
                    let existing = player_statistic::Entity::find()
                        .filter(player_statistic::Column::PlayerId.eq(statistic.player_id.to_hex()))
                        .one(c)
                        .await
                        .map_err(|e| RepoError::StorageError(e.to_string()))?;

                    let mut model = Self::statistic_to_model(&statistic);
                    match existing {
                        Some(existing) => {
                            model.id = sea_orm::Set(existing.id);
                            model
                                .update(c)
                                .await
                                .map_err(|e| RepoError::StorageError(e.to_string()))?;
                        }
                        None => {
                            model
                                .insert(c)
                                .await
                                .map_err(|e| RepoError::StorageError(e.to_string()))?;
                        }
                    }
                    Ok(())
                })
            })
            .await;

        match res {
            Ok(()) => Ok(()),
            Err(TransactionError::Transaction(e)) => Err(e),
            Err(TransactionError::Connection(e)) => Err(RepoError::StorageError(e.to_string())),
        }
    }

    async fn update(&self, statistic: &PlayerStatistic) -> Result<(), RepoUpdateError> {
        match Self::statistic_to_model(statistic).update(&self.db).await {
            Ok(_) => Ok(()),
            Err(DbErr::RecordNotUpdated) => Err(RepoUpdateError::NotFound),
            Err(e) => Err(RepoUpdateError::StorageError(e.to_string())),
        }
    }

    async fn count(&self) -> Result<u64, RepoError> {
        player_statistic::Entity::find()
            .count(&self.db)
            .await
            .map_err(|e| RepoError::StorageError(e.to_string()))
    }
}
