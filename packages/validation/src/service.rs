use crate::events::{ValidationEvent, ValidationSignal};
use crate::record::{ErrorRecord, Severity};
use crate::reducer::{error_reducer, set_errors, ERRORS_SLICE};
use crate::validator::Validator;
use editron_observable::{BubblingObservable, Emitter, ListenerId, ObserverId};
use editron_pointer::Pointer;
use editron_state::{ReducerId, Store};
use futures::future::LocalBoxFuture;
use futures::stream::{LocalBoxStream, StreamExt};
use futures::FutureExt;
use serde_json::Value;
use std::cell::{Cell, RefCell};
use std::rc::Rc;
use tracing::{debug, error, info};

/// Outcome of one validation pass
#[derive(Debug, Clone, PartialEq)]
pub enum PassOutcome {
    /// Final merged error list, as persisted
    Completed(Vec<ErrorRecord>),
    /// Superseded by a newer pass or cancelled explicitly
    Cancelled,
}

/// A running pass; drive it by awaiting
pub type ValidationPass = LocalBoxFuture<'static, PassOutcome>;

type ErrorHandler = Rc<dyn Fn(ErrorRecord) -> Option<ErrorRecord>>;

struct Inner {
    store: Store,
    reducer: Cell<Option<ReducerId>>,
    validator: Rc<dyn Validator>,
    schema: RefCell<Value>,
    observer: BubblingObservable<ErrorRecord>,
    emitter: Emitter<ValidationEvent, ValidationSignal>,
    generation: Cell<u64>,
    running: Cell<Option<u64>>,
    error_handler: RefCell<ErrorHandler>,
}

/// Owns the store's error slice and runs validation passes over it
#[derive(Clone)]
pub struct ValidationService {
    inner: Rc<Inner>,
}

impl ValidationService {
    pub fn new(store: Store, schema: Value, validator: impl Validator + 'static) -> Self {
        Self::with_validator(store, schema, Rc::new(validator))
    }

    pub fn with_validator(store: Store, schema: Value, validator: Rc<dyn Validator>) -> Self {
        let reducer = store.register(ERRORS_SLICE, error_reducer);
        let keep_all: ErrorHandler = Rc::new(|record: ErrorRecord| Some(record));
        Self {
            inner: Rc::new(Inner {
                store,
                reducer: Cell::new(Some(reducer)),
                validator,
                schema: RefCell::new(schema),
                observer: BubblingObservable::new(),
                emitter: Emitter::new(),
                generation: Cell::new(0),
                running: Cell::new(None),
                error_handler: RefCell::new(keep_all),
            }),
        }
    }

    pub fn set_schema(&self, schema: Value) {
        *self.inner.schema.borrow_mut() = schema;
    }

    pub fn schema(&self) -> Value {
        self.inner.schema.borrow().clone()
    }

    /// Map or drop issues before they are stored. Returning `None` discards
    /// the issue.
    pub fn set_error_handler<F>(&self, handler: F)
    where
        F: Fn(ErrorRecord) -> Option<ErrorRecord> + 'static,
    {
        *self.inner.error_handler.borrow_mut() = Rc::new(handler);
    }

    /// Start validating `data` within `pointer`, superseding any running pass.
    ///
    /// Errors outside `pointer` stay in the slice untouched; errors inside it
    /// are dropped right away and refilled as the validator reports them.
    pub fn validate(&self, data: &Value, pointer: &Pointer) -> ValidationPass {
        let inner = &self.inner;
        if let Some(previous) = inner.running.get() {
            debug!(generation = previous, "Cancelling superseded validation pass");
        }
        let generation = inner.generation.get() + 1;
        inner.generation.set(generation);
        inner.running.set(Some(generation));

        inner
            .emitter
            .emit(ValidationEvent::BeforeValidation, &ValidationSignal::BeforeValidation);
        inner.observer.clear_events(pointer);

        let remaining: Vec<ErrorRecord> = if pointer.is_root() {
            Vec::new()
        } else {
            self.stored_errors()
                .into_iter()
                .filter(|record| !pointer.contains(&record.pointer))
                .collect()
        };
        inner.store.dispatch(&set_errors(&remaining));

        info!(pointer = %pointer, generation, kept = remaining.len(), "Starting validation pass");
        let stream = {
            let schema = inner.schema.borrow();
            inner.validator.run(&schema, data, pointer)
        };

        let pass = RunningPass {
            service: self.clone(),
            generation,
        };
        drive(pass, stream, remaining).boxed_local()
    }

    fn complete(&self, generation: u64, found: &[ErrorRecord], remaining: &[ErrorRecord]) -> PassOutcome {
        let errors = merge(remaining, found);
        self.inner.store.dispatch(&set_errors(&errors));
        self.inner.running.set(None);
        info!(generation, errors = errors.len(), "Validation pass complete");
        self.inner.emitter.emit(
            ValidationEvent::AfterValidation,
            &ValidationSignal::AfterValidation(errors.clone()),
        );
        PassOutcome::Completed(errors)
    }

    fn is_current(&self, generation: u64) -> bool {
        self.inner.generation.get() == generation
    }

    fn cancelled(&self, generation: u64) -> PassOutcome {
        debug!(generation, "Validation pass cancelled");
        PassOutcome::Cancelled
    }

    /// Renumber stored issues after a list changed shape.
    ///
    /// Issues within a `removed` location are dropped. Issues within the
    /// source of a `moved` pair are rebased onto its target; each issue is
    /// rewritten at most once, so pairs may swap locations.
    pub fn rebase_errors(&self, moved: &[(Pointer, Pointer)], removed: &[Pointer]) {
        let stored = self.stored_errors();
        let before = stored.len();
        let errors: Vec<ErrorRecord> = stored
            .into_iter()
            .filter(|record| !removed.iter().any(|scope| scope.contains(&record.pointer)))
            .map(|mut record| {
                if let Some(next) = moved
                    .iter()
                    .find_map(|(from, to)| record.pointer.rebase(from, to))
                {
                    record.pointer = next;
                }
                record
            })
            .collect();
        debug!(moved = moved.len(), dropped = before - errors.len(), "Rebased stored errors");
        self.inner.store.dispatch(&set_errors(&errors));
    }

    /// Cancel the running pass, if any. Its future resolves to
    /// [`PassOutcome::Cancelled`] without touching the error slice.
    pub fn cancel(&self) {
        if self.inner.running.take().is_some() {
            self.inner.generation.set(self.inner.generation.get() + 1);
        }
    }

    pub fn is_running(&self) -> bool {
        self.inner.running.get().is_some()
    }

    pub fn on<F>(&self, event: ValidationEvent, callback: F) -> ListenerId
    where
        F: Fn(&ValidationSignal) + 'static,
    {
        self.inner.emitter.on(event, callback)
    }

    pub fn off(&self, event: ValidationEvent, id: ListenerId) -> bool {
        self.inner.emitter.off(event, id)
    }

    /// Receive issues reported at `pointer` (and below it, with `bubbling`)
    pub fn observe<F>(&self, pointer: &Pointer, callback: F, bubbling: bool) -> ObserverId
    where
        F: Fn(&ErrorRecord) + 'static,
    {
        self.inner.observer.observe(pointer, callback, bubbling)
    }

    pub fn remove_observer(&self, pointer: &Pointer, id: ObserverId) -> bool {
        self.inner.observer.remove_observer(pointer, id)
    }

    pub fn notify(&self, pointer: &Pointer, record: &ErrorRecord) {
        self.inner.observer.notify(pointer, record)
    }

    pub fn observer_count(&self) -> usize {
        self.inner.observer.observer_count()
    }

    /// Stored issues, optionally limited to `pointer` (exactly, or including
    /// its descendants with `with_children`)
    pub fn get_errors_and_warnings(&self, pointer: Option<&Pointer>, with_children: bool) -> Vec<ErrorRecord> {
        let errors = self.stored_errors();
        match pointer {
            None => errors,
            Some(pointer) => errors
                .into_iter()
                .filter(|record| {
                    if with_children {
                        pointer.contains(&record.pointer)
                    } else {
                        record.pointer == *pointer
                    }
                })
                .collect(),
        }
    }

    pub fn get_errors(&self, pointer: Option<&Pointer>, with_children: bool) -> Vec<ErrorRecord> {
        self.by_severity(pointer, with_children, Severity::Error)
    }

    pub fn get_warnings(&self, pointer: Option<&Pointer>, with_children: bool) -> Vec<ErrorRecord> {
        self.by_severity(pointer, with_children, Severity::Warning)
    }

    fn by_severity(&self, pointer: Option<&Pointer>, with_children: bool, severity: Severity) -> Vec<ErrorRecord> {
        self.get_errors_and_warnings(pointer, with_children)
            .into_iter()
            .filter(|record| record.severity == severity)
            .collect()
    }

    fn stored_errors(&self) -> Vec<ErrorRecord> {
        match self.inner.store.select::<Vec<ErrorRecord>>(ERRORS_SLICE) {
            Ok(errors) => errors.unwrap_or_default(),
            Err(e) => {
                error!(error = %e, "Error slice is unreadable");
                Vec::new()
            }
        }
    }

    /// Cancel any pass, drop observers and listeners, and release the error
    /// slice
    pub fn destroy(&self) {
        self.cancel();
        self.inner.observer.clear();
        self.inner.emitter.clear();
        if let Some(reducer) = self.inner.reducer.take() {
            self.inner.store.unregister(ERRORS_SLICE, reducer);
        }
    }
}

/// Marks a pass as running for as long as its future exists
struct RunningPass {
    service: ValidationService,
    generation: u64,
}

impl Drop for RunningPass {
    fn drop(&mut self) {
        let running = &self.service.inner.running;
        if running.get() == Some(self.generation) {
            debug!(generation = self.generation, "Validation pass dropped before completion");
            running.set(None);
        }
    }
}

async fn drive(
    pass: RunningPass,
    mut stream: LocalBoxStream<'static, ErrorRecord>,
    remaining: Vec<ErrorRecord>,
) -> PassOutcome {
    let service = &pass.service;
    let generation = pass.generation;
    let mut found: Vec<ErrorRecord> = Vec::new();

    while let Some(record) = stream.next().await {
        if !service.is_current(generation) {
            return service.cancelled(generation);
        }
        let handler = service.inner.error_handler.borrow().clone();
        let Some(record) = handler(record) else {
            continue;
        };

        found.push(record.clone());
        service.inner.store.dispatch(&set_errors(&merge(&remaining, &found)));
        service.inner.observer.notify(&record.pointer, &record);

        if !service.is_current(generation) {
            return service.cancelled(generation);
        }
        service
            .inner
            .emitter
            .emit(ValidationEvent::OnError, &ValidationSignal::Error(record));
    }

    if !service.is_current(generation) {
        return service.cancelled(generation);
    }
    service.complete(generation, &found, &remaining)
}

fn merge(remaining: &[ErrorRecord], found: &[ErrorRecord]) -> Vec<ErrorRecord> {
    remaining.iter().chain(found).cloned().collect()
}
