use crate::error::ValidationError;
use crate::record::ErrorRecord;
use std::fmt;
use std::str::FromStr;

/// Signals emitted around a validation pass
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ValidationEvent {
    BeforeValidation,
    AfterValidation,
    OnError,
}

impl ValidationEvent {
    pub fn as_str(&self) -> &'static str {
        match self {
            ValidationEvent::BeforeValidation => "beforeValidation",
            ValidationEvent::AfterValidation => "afterValidation",
            ValidationEvent::OnError => "onError",
        }
    }
}

impl fmt::Display for ValidationEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ValidationEvent {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "beforeValidation" => Ok(ValidationEvent::BeforeValidation),
            "afterValidation" => Ok(ValidationEvent::AfterValidation),
            "onError" => Ok(ValidationEvent::OnError),
            other => Err(ValidationError::UnknownEvent(other.to_string())),
        }
    }
}

/// Payload delivered with a [`ValidationEvent`]
#[derive(Debug, Clone, PartialEq)]
pub enum ValidationSignal {
    BeforeValidation,
    Error(ErrorRecord),
    AfterValidation(Vec<ErrorRecord>),
}

impl ValidationSignal {
    pub fn event(&self) -> ValidationEvent {
        match self {
            ValidationSignal::BeforeValidation => ValidationEvent::BeforeValidation,
            ValidationSignal::Error(_) => ValidationEvent::OnError,
            ValidationSignal::AfterValidation(_) => ValidationEvent::AfterValidation,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_event_names_round_trip() {
        for event in [
            ValidationEvent::BeforeValidation,
            ValidationEvent::AfterValidation,
            ValidationEvent::OnError,
        ] {
            assert_eq!(event.as_str().parse::<ValidationEvent>(), Ok(event));
        }
    }

    #[test]
    fn test_unknown_event_is_rejected() {
        assert_eq!(
            "undefined".parse::<ValidationEvent>(),
            Err(ValidationError::UnknownEvent("undefined".to_string()))
        );
    }
}
