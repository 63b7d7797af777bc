use serde::{Deserialize, Serialize};

use crate::{
    domain::statistic::PlayerStatistic,
    schema::FieldErrors,
    workflow::statistic::{INTERNAL_ERROR_DETAILS, PLAYER_NOT_FOUND_ERROR, StatisticError},
};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorKind {
    ValidationError,
    NotFoundError,
    InternalError,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ErrorDetails {
    Message(String),
    Fields(FieldErrors),
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResponseError {
    #[serde(rename = "type")]
    pub kind: ErrorKind,
    pub details: ErrorDetails,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ResponseBody {
    Content(PlayerStatistic),
    Error(ResponseError),
}

/// Reply sent back to the caller. `event` echoes the request's correlation id.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResponseEnvelope {
    pub event: Option<String>,
    #[serde(flatten)]
    pub body: ResponseBody,
}

impl ResponseEnvelope {
    pub fn with_content(content: PlayerStatistic) -> Self {
        Self {
            event: None,
            body: ResponseBody::Content(content),
        }
    }

    pub fn from_error(kind: ErrorKind, details: ErrorDetails) -> Self {
        Self {
            event: None,
            body: ResponseBody::Error(ResponseError { kind, details }),
        }
    }

    pub fn from_result(result: Result<PlayerStatistic, StatisticError>) -> Self {
        match result {
            Ok(content) => Self::with_content(content),
            Err(e) => e.into(),
        }
    }

    pub fn to_bytes(&self) -> Vec<u8> {
        // Every field is a string, integer or string map, so serialization cannot fail.
        serde_json::to_vec(self).unwrap_or_default()
    }
}

impl From<FieldErrors> for ResponseEnvelope {
    fn from(errors: FieldErrors) -> Self {
        Self::from_error(ErrorKind::ValidationError, ErrorDetails::Fields(errors))
    }
}

impl From<StatisticError> for ResponseEnvelope {
    fn from(error: StatisticError) -> Self {
        match error {
            StatisticError::Validation(errors) => errors.into(),
            StatisticError::NotFound => Self::from_error(
                ErrorKind::NotFoundError,
                ErrorDetails::Message(PLAYER_NOT_FOUND_ERROR.to_string()),
            ),
            StatisticError::Internal(_) => Self::from_error(
                ErrorKind::InternalError,
                ErrorDetails::Message(INTERNAL_ERROR_DETAILS.to_string()),
            ),
        }
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;
    use crate::domain::ObjectId;

    #[test]
    fn test_content_envelope_shape() {
        let id: ObjectId = "5b0f1c0b9a3e4b2d8c7f6e5d".parse().unwrap();
        let player_id: ObjectId = "5b0f1c0b9a3e4b2d8c7f6e5e".parse().unwrap();
        let mut envelope = ResponseEnvelope::with_content(PlayerStatistic::new(id, player_id));
        envelope.event = Some("corr-1".to_string());

        assert_eq!(
            serde_json::to_value(&envelope).unwrap(),
            json!({
                "event": "corr-1",
                "content": {
                    "id": "5b0f1c0b9a3e4b2d8c7f6e5d",
                    "player_id": "5b0f1c0b9a3e4b2d8c7f6e5e",
                    "total_games": 0,
                    "wins": 0,
                    "loses": 0,
                    "rating": 0,
                }
            })
        );
    }

    #[test]
    fn test_error_envelope_shapes() {
        let envelope: ResponseEnvelope = StatisticError::NotFound.into();
        assert_eq!(
            serde_json::to_value(&envelope).unwrap(),
            json!({
                "event": null,
                "error": {
                    "type": "NOT_FOUND_ERROR",
                    "details": "Player was not found or doesn't exist.",
                }
            })
        );

        let envelope: ResponseEnvelope =
            StatisticError::Validation(FieldErrors::single("player_id", "Invalid ObjectId.")).into();
        assert_eq!(
            serde_json::to_value(&envelope).unwrap(),
            json!({
                "event": null,
                "error": {
                    "type": "VALIDATION_ERROR",
                    "details": {"player_id": ["Invalid ObjectId."]},
                }
            })
        );

        let envelope: ResponseEnvelope =
            StatisticError::Internal("disk on fire".to_string()).into();
        let value = serde_json::to_value(&envelope).unwrap();
        assert_eq!(value["error"]["type"], json!("INTERNAL_ERROR"));
        assert!(!value.to_string().contains("disk on fire"));
    }

    #[test]
    fn test_envelope_reads_back() {
        let bytes = br#"{"event":"abc","error":{"type":"VALIDATION_ERROR","details":{"wins":["Unknown field."]}}}"#;
        let envelope: ResponseEnvelope = serde_json::from_slice(bytes).unwrap();
        assert_eq!(envelope.event.as_deref(), Some("abc"));
        assert_eq!(
            envelope.body,
            ResponseBody::Error(ResponseError {
                kind: ErrorKind::ValidationError,
                details: ErrorDetails::Fields(FieldErrors::single("wins", "Unknown field.")),
            })
        );
    }
}
