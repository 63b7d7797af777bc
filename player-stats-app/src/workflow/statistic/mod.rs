use thiserror::Error;

use crate::schema::FieldErrors;

pub mod init;
pub mod retrieve;
pub mod update;

pub const PLAYER_NOT_FOUND_ERROR: &str = "Player was not found or doesn't exist.";

pub const INTERNAL_ERROR_DETAILS: &str = "The request could not be processed.";

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StatisticError {
    #[error("validation failed: {0:?}")]
    Validation(FieldErrors),

    #[error("{}", PLAYER_NOT_FOUND_ERROR)]
    NotFound,

    #[error("internal error: {0}")]
    Internal(String),
}

impl From<FieldErrors> for StatisticError {
    fn from(errors: FieldErrors) -> Self {
        StatisticError::Validation(errors)
    }
}
