use serde_json::Value;

use crate::{
    domain::{
        ObjectId,
        statistic::{CounterField, NEGATIVE_VALUE_ERROR, PlayerStatistic, StatisticChanges},
    },
    schema::{
        FieldErrors, NULL_FIELD_ERROR, Payload, UNKNOWN_FIELD_ERROR, collect, integer, object_id,
    },
};

const PLAYER_ID_FIELD: &str = "player_id";

/// Validates an update against the record it is about to change.
pub struct UpdateStatisticSchema<'a> {
    current: &'a PlayerStatistic,
}

impl<'a> UpdateStatisticSchema<'a> {
    pub fn new(current: &'a PlayerStatistic) -> Self {
        Self { current }
    }

    /// `Ok(None)` when the payload names no player at all; such a lookup can never succeed.
    pub fn player_id(payload: &Payload) -> Result<Option<ObjectId>, FieldErrors> {
        match payload.get(PLAYER_ID_FIELD) {
            None | Some(Value::Null) => Ok(None),
            Some(value) => object_id(value)
                .map(Some)
                .map_err(|messages| FieldErrors::from_messages(PLAYER_ID_FIELD, messages)),
        }
    }

    pub fn load(&self, payload: &Payload) -> Result<StatisticChanges, FieldErrors> {
        let mut errors = FieldErrors::new();
        let mut changes = StatisticChanges::new();

        for (name, value) in payload {
            if name == PLAYER_ID_FIELD {
                continue;
            }
            let Some(field) = CounterField::from_name(name) else {
                errors.add(name, UNKNOWN_FIELD_ERROR);
                continue;
            };
            if let Some(value) = collect(&mut errors, name, self.counter(field, value)) {
                changes.set(field, value);
            }
        }

        errors.into_result(changes)
    }

    fn counter(&self, field: CounterField, value: &Value) -> Result<i64, Vec<String>> {
        if value.is_null() {
            return Err(vec![NULL_FIELD_ERROR.to_string()]);
        }
        let value = integer(value)?;

        let mut messages = Vec::new();
        if value < 0 {
            messages.push(NEGATIVE_VALUE_ERROR.to_string());
        }
        if field.is_monotonic() && value < self.current.get(field) {
            messages.push(decreased_value_error(value));
        }

        if messages.is_empty() {
            Ok(value)
        } else {
            Err(messages)
        }
    }
}

pub fn decreased_value_error(value: i64) -> String {
    format!(
        "The passed value='{}' must be greater or equal to the current.",
        value
    )
}
