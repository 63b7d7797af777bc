use serde_json::Value;

use crate::{
    domain::ObjectId,
    schema::{FieldErrors, Payload, collect, object_id, required},
};

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct InitStatisticRequest {
    pub player_id: ObjectId,
    /// Record id to use when the record does not exist yet.
    pub id: Option<ObjectId>,
}

pub struct InitStatisticSchema;

impl InitStatisticSchema {
    pub fn load(payload: &Payload) -> Result<InitStatisticRequest, FieldErrors> {
        let mut errors = FieldErrors::new();

        let player_id = collect(
            &mut errors,
            "player_id",
            required(payload, "player_id").and_then(object_id),
        );
        let id = collect(&mut errors, "id", Self::record_id(payload.get("id")));

        match (player_id, id) {
            (Some(player_id), Some(id)) => errors.into_result(InitStatisticRequest { player_id, id }),
            _ => Err(errors),
        }
    }

    fn record_id(value: Option<&Value>) -> Result<Option<ObjectId>, Vec<String>> {
        match value {
            None => Ok(None),
            Some(Value::String(s)) => s
                .parse::<ObjectId>()
                .map(Some)
                .map_err(|e| vec![e.to_string()]),
            Some(Value::Null) => Err(vec![super::NULL_FIELD_ERROR.to_string()]),
            Some(other) => Err(vec![format!(
                "'{}' is not a valid ObjectId, it must be a 12-byte input or a 24-character hex string.",
                other
            )]),
        }
    }
}
