//! # Editron Validation
//!
//! Incremental validation of the edited document.
//!
//! ## Architecture
//!
//! ```text
//! ┌───────────────────────────────────────────────┐
//! │ Validator: (schema, data, pointer) → stream   │
//! │  of ErrorRecord (pluggable, may be async)     │
//! └───────────────────────────────────────────────┘
//!                     ↓
//! ┌───────────────────────────────────────────────┐
//! │ ValidationService                             │
//! │  - one pass at a time, newer passes supersede │
//! │  - keeps errors outside the revalidated scope │
//! │  - persists into the store's "errors" slice   │
//! │  - notifies per-pointer observers (bubbling)  │
//! └───────────────────────────────────────────────┘
//! ```
//!
//! A pass is a future. Everything up to the start of the validator run happens
//! synchronously inside [`ValidationService::validate`], so the error slice
//! already reflects the new scope when the call returns. Awaiting the pass
//! drives the validator stream; every step first checks that the pass is still
//! the current generation, so a superseded pass never writes or signals again.

mod error;
mod events;
mod record;
mod reducer;
mod service;
mod validator;

pub use error::{ValidationError, ValidationResult};
pub use events::{ValidationEvent, ValidationSignal};
pub use record::{ErrorRecord, Severity};
pub use reducer::{error_reducer, set_errors, ERRORS_SLICE, SET_ERRORS};
pub use service::{PassOutcome, ValidationPass, ValidationService};
pub use validator::{issues, Validator};

pub use editron_observable::{ListenerId, ObserverId};
pub use editron_pointer::Pointer;
