use crate::record::ErrorRecord;
use editron_pointer::Pointer;
use futures::stream::{self, LocalBoxStream, StreamExt};
use serde_json::Value;

/// Pluggable JSON-schema validation.
///
/// `run` reports the issues found for `data` at and below `pointer`. The
/// stream is lazy; the service stops polling it once the pass is superseded.
pub trait Validator {
    fn run(&self, schema: &Value, data: &Value, pointer: &Pointer) -> LocalBoxStream<'static, ErrorRecord>;
}

impl<F> Validator for F
where
    F: Fn(&Value, &Value, &Pointer) -> Vec<ErrorRecord>,
{
    fn run(&self, schema: &Value, data: &Value, pointer: &Pointer) -> LocalBoxStream<'static, ErrorRecord> {
        issues(self(schema, data, pointer))
    }
}

/// Stream over issues that are already known
pub fn issues(records: Vec<ErrorRecord>) -> LocalBoxStream<'static, ErrorRecord> {
    stream::iter(records).boxed_local()
}
