//! The store slice holding the current error list

use crate::record::ErrorRecord;
use editron_state::Action;
use serde_json::Value;

pub const ERRORS_SLICE: &str = "errors";
pub const SET_ERRORS: &str = "SET_ERRORS";

pub fn set_errors(errors: &[ErrorRecord]) -> Action {
    Action::with_payload(
        SET_ERRORS,
        Value::Array(errors.iter().map(ErrorRecord::to_value).collect()),
    )
}

/// Replaces the list on `SET_ERRORS`, keeps it otherwise
pub fn error_reducer(state: Option<&Value>, action: &Action) -> Value {
    if action.is(SET_ERRORS) && action.payload.is_array() {
        return action.payload.clone();
    }
    state.cloned().unwrap_or_else(|| Value::Array(Vec::new()))
}
