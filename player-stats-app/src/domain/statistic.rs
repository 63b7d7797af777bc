use std::sync::{
    Arc,
    atomic::{AtomicBool, Ordering},
};

use dashmap::DashMap;
use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::domain::{ObjectId, RepoError, RepoRetrieveError, RepoUpdateError};

pub const NEGATIVE_VALUE_ERROR: &str =
    "Field value cannot be represented by a negative integer value.";

#[async_trait::async_trait]
pub trait StatisticRepository {
    async fn find_by_player(
        &self,
        player_id: ObjectId,
    ) -> Result<PlayerStatistic, RepoRetrieveError>;

    /// Replaces the counters of the record owned by `statistic.player_id`, keeping its stored
    /// `id`, or inserts `statistic` as a new record.
    async fn upsert_by_player(&self, statistic: PlayerStatistic) -> Result<(), RepoError>;

    async fn update(&self, statistic: &PlayerStatistic) -> Result<(), RepoUpdateError>;

    async fn count(&self) -> Result<u64, RepoError>;
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, Validate)]
pub struct PlayerStatistic {
    pub id: ObjectId,
    pub player_id: ObjectId,
    #[validate(range(min = 0, message = "Field value cannot be represented by a negative integer value."))]
    pub total_games: i64,
    #[validate(range(min = 0, message = "Field value cannot be represented by a negative integer value."))]
    pub wins: i64,
    #[validate(range(min = 0, message = "Field value cannot be represented by a negative integer value."))]
    pub loses: i64,
    #[validate(range(min = 0, message = "Field value cannot be represented by a negative integer value."))]
    pub rating: i64,
}

impl PlayerStatistic {
    pub fn new(id: ObjectId, player_id: ObjectId) -> Self {
        Self {
            id,
            player_id,
            total_games: 0,
            wins: 0,
            loses: 0,
            rating: 0,
        }
    }

    pub fn get(&self, field: CounterField) -> i64 {
        match field {
            CounterField::TotalGames => self.total_games,
            CounterField::Wins => self.wins,
            CounterField::Loses => self.loses,
            CounterField::Rating => self.rating,
        }
    }

    fn set(&mut self, field: CounterField, value: i64) {
        match field {
            CounterField::TotalGames => self.total_games = value,
            CounterField::Wins => self.wins = value,
            CounterField::Loses => self.loses = value,
            CounterField::Rating => self.rating = value,
        }
    }

    /// Merges the supplied counters into a copy of this record.
    pub fn merged(&self, changes: &StatisticChanges) -> Self {
        let mut merged = self.clone();
        for (field, value) in changes.iter() {
            merged.set(field, value);
        }
        merged
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum CounterField {
    TotalGames,
    Wins,
    Loses,
    Rating,
}

impl CounterField {
    pub const ALL: [CounterField; 4] = [
        CounterField::TotalGames,
        CounterField::Wins,
        CounterField::Loses,
        CounterField::Rating,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            CounterField::TotalGames => "total_games",
            CounterField::Wins => "wins",
            CounterField::Loses => "loses",
            CounterField::Rating => "rating",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|field| field.name() == name)
    }

    /// Rating may go down, the game counters may not.
    pub fn is_monotonic(&self) -> bool {
        !matches!(self, CounterField::Rating)
    }
}

/// Counters supplied by an update; absent fields keep their stored value.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct StatisticChanges {
    values: Vec<(CounterField, i64)>,
}

impl StatisticChanges {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set(&mut self, field: CounterField, value: i64) {
        self.values.retain(|(f, _)| *f != field);
        self.values.push((field, value));
    }

    pub fn get(&self, field: CounterField) -> Option<i64> {
        self.values
            .iter()
            .find(|(f, _)| *f == field)
            .map(|(_, value)| *value)
    }

    pub fn iter(&self) -> impl Iterator<Item = (CounterField, i64)> + '_ {
        self.values.iter().copied()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

#[derive(Clone, Default)]
pub struct MockStatisticRepository {
    records: Arc<DashMap<ObjectId, PlayerStatistic>>,
    failing: Arc<AtomicBool>,
}

#[allow(unused)]
impl MockStatisticRepository {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&self, statistic: PlayerStatistic) {
        self.records.insert(statistic.player_id, statistic);
    }

    pub fn get(&self, player_id: &ObjectId) -> Option<PlayerStatistic> {
        self.records.get(player_id).map(|r| r.clone())
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    fn is_failing(&self) -> bool {
        self.failing.load(Ordering::SeqCst)
    }
}

#[async_trait::async_trait]
impl StatisticRepository for MockStatisticRepository {
    async fn find_by_player(
        &self,
        player_id: ObjectId,
    ) -> Result<PlayerStatistic, RepoRetrieveError> {
        if self.is_failing() {
            return Err(RepoRetrieveError::StorageError("mock failure".to_string()));
        }
        self.get(&player_id).ok_or(RepoRetrieveError::NotFound)
    }

    async fn upsert_by_player(&self, statistic: PlayerStatistic) -> Result<(), RepoError> {
        if self.is_failing() {
            return Err(RepoError::StorageError("mock failure".to_string()));
        }
        self.records
            .entry(statistic.player_id)
            .and_modify(|existing| {
                *existing = PlayerStatistic {
                    id: existing.id,
                    ..statistic.clone()
                }
            })
            .or_insert(statistic);
        Ok(())
    }

    async fn update(&self, statistic: &PlayerStatistic) -> Result<(), RepoUpdateError> {
        if self.is_failing() {
            return Err(RepoUpdateError::StorageError("mock failure".to_string()));
        }
        match self.records.get_mut(&statistic.player_id) {
            Some(mut existing) => {
                *existing = statistic.clone();
                Ok(())
            }
            None => Err(RepoUpdateError::NotFound),
        }
    }

    async fn count(&self) -> Result<u64, RepoError> {
        Ok(self.records.len() as u64)
    }
}
