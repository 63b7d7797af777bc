use crate::{
    domain::ObjectId,
    schema::{FieldErrors, Payload, collect, object_id, required},
};

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RetrieveStatisticRequest {
    pub player_id: ObjectId,
}

pub struct RetrieveStatisticSchema;

impl RetrieveStatisticSchema {
    pub fn load(payload: &Payload) -> Result<RetrieveStatisticRequest, FieldErrors> {
        let mut errors = FieldErrors::new();
        match collect(
            &mut errors,
            "player_id",
            required(payload, "player_id").and_then(object_id),
        ) {
            Some(player_id) => errors.into_result(RetrieveStatisticRequest { player_id }),
            None => Err(errors),
        }
    }
}
