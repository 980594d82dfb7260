use crate::WILDCARD;
use crate::builder::EmitterBuilder;
use crate::deferred::Deferred;
use crate::handler::{EntryKey, Handler, Invoke};
use crate::registry::Registry;
use parking_lot::Mutex;
use std::borrow::Cow;
use std::fmt;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use tokio::sync::oneshot;
use tracing::{debug, trace};

pub(crate) const DEFAULT_NAME: &str = "emitter";

/// A string-keyed, synchronous event emitter.
///
/// Cloning an `Emitter` is cheap and yields a handle to the same registry.
/// Handlers run on the caller's thread inside [`Emitter::emit`]; no lock is held
/// while they run, so handlers may register, remove and emit freely.
///
/// # Examples
/// ```rust
/// use std::sync::Arc;
/// use std::sync::atomic::{AtomicU32, Ordering};
/// use tether_emitter::{Emitter, Handler, WILDCARD};
///
/// let emitter = Emitter::<u32>::new();
/// let total = Arc::new(AtomicU32::new(0));
///
/// let sum = Arc::clone(&total);
/// emitter.on("add", Handler::new(move |n: &u32| {
///     sum.fetch_add(*n, Ordering::SeqCst);
/// }));
/// emitter.on(WILDCARD, Handler::wildcard(|event_type: &str, _: &u32| {
///     assert_eq!(event_type, "add");
/// }));
///
/// emitter.emit("add", 2);
/// emitter.emit("add", 3);
/// assert_eq!(total.load(Ordering::SeqCst), 5);
/// ```
pub struct Emitter<T> {
    registry: Arc<Registry<T>>,
}

impl<T> fmt::Debug for Emitter<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Emitter").field("registry", &self.registry).finish()
    }
}

impl<T> Clone for Emitter<T> {
    fn clone(&self) -> Self {
        Self { registry: Arc::clone(&self.registry) }
    }
}

impl<T: 'static> Default for Emitter<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: 'static> Emitter<T> {
    /// Creates an empty emitter.
    #[must_use]
    pub fn new() -> Self {
        Self::builder().build()
    }

    /// Returns a builder for a named emitter and/or an initial handler mapping.
    #[must_use]
    pub fn builder() -> EmitterBuilder<T> {
        EmitterBuilder::new()
    }

    pub(crate) fn with_name(name: Cow<'static, str>) -> Self {
        Self { registry: Arc::new(Registry::new(name)) }
    }

    /// The configured emitter name, used as the `emitter` field in logs.
    #[must_use]
    pub fn name(&self) -> &str {
        self.registry.name()
    }

    /// Registers `handler` for every future `event_type` emit.
    ///
    /// Under [`WILDCARD`] the handler runs for every emitted event type, after the
    /// type's own handlers. Registering the same handler (or a clone of it) twice
    /// for one type keeps a single registration at its original position.
    pub fn on(&self, event_type: &str, handler: Handler<T>) {
        self.registry.add(event_type, handler.key(), handler.invoke());
    }

    /// Registers `handler` for the next `event_type` emit only.
    ///
    /// The registration is removed before `handler` runs, so a reentrant emit from
    /// inside `handler` cannot fire it again. Until then it can be removed with
    /// [`Emitter::off`] using `handler` itself.
    ///
    /// Because removal comes first, a handler that registers itself again for the
    /// same type while running (with `on` or `once`) keeps that new registration,
    /// at the end of the collection. It is reached later in the same pass.
    pub fn once(&self, event_type: &str, handler: Handler<T>) {
        let key = handler.key();
        let fired = AtomicBool::new(false);
        let invoke = self.self_removing(event_type, key, move |emitted, payload| {
            if !fired.swap(true, Ordering::SeqCst) {
                handler.call(emitted, payload);
            }
        });
        self.registry.add(event_type, key, invoke);
    }

    /// Removes the registration identified by `key` from `event_type`.
    ///
    /// `key` is the [`Handler`] passed to [`Emitter::on`]/[`Emitter::once`], or the
    /// [`Deferred`] returned by [`Emitter::when`]. Unknown keys are ignored, and
    /// registrations of the same handler under other types are untouched.
    pub fn off(&self, event_type: &str, key: impl Into<EntryKey>) {
        self.registry.remove(event_type, key.into());
    }

    /// Invokes the handlers of `event_type` with `payload`, then the
    /// [`WILDCARD`] handlers with `(event_type, payload)`.
    ///
    /// Each pass follows insertion order over the live collection: handlers
    /// removed before their turn are skipped, handlers added during the pass are
    /// reached at the end of it. A panicking handler unwinds out of `emit` and the
    /// remaining handlers of both passes are skipped.
    pub fn emit(&self, event_type: &str, payload: T) {
        let typed = self.registry.dispatch(event_type, event_type, &payload);
        let wildcard = self.registry.dispatch(WILDCARD, event_type, &payload);
        trace!(emitter = %self.registry.name(), event_type, typed, wildcard, "Event dispatched");
    }

    /// Number of registrations currently held for `event_type`.
    #[must_use]
    pub fn listener_count(&self, event_type: &str) -> usize {
        self.registry.len(event_type)
    }

    /// Whether `key` is currently registered for `event_type`.
    #[must_use]
    pub fn contains(&self, event_type: &str, key: impl Into<EntryKey>) -> bool {
        self.registry.contains(event_type, key.into())
    }

    /// Event types that currently hold at least one registration, sorted.
    #[must_use]
    pub fn event_types(&self) -> Vec<String> {
        self.registry.event_types()
    }

    /// Removes every registration of `event_type`.
    ///
    /// Pending [`Deferred`] values of that type resolve with
    /// [`EmitterError::Cancelled`](crate::EmitterError::Cancelled).
    pub fn clear(&self, event_type: &str) {
        let removed = self.registry.clear(event_type);
        debug!(emitter = %self.registry.name(), event_type, removed, "Handlers cleared");
    }

    /// Removes every registration of every event type.
    pub fn clear_all(&self) {
        let removed = self.registry.clear_all();
        debug!(emitter = %self.registry.name(), removed, "All handlers cleared");
    }

    fn self_removing<F>(&self, event_type: &str, key: EntryKey, f: F) -> Invoke<T>
    where
        F: Fn(&str, &T) + Send + Sync + 'static,
    {
        let registry = Arc::downgrade(&self.registry);
        let event_type = event_type.to_owned();
        Arc::new(move |emitted: &str, payload: &T| {
            if let Some(registry) = registry.upgrade() {
                registry.remove(&event_type, key);
            }
            f(emitted, payload);
        })
    }

    fn deferred<O, F>(&self, event_type: &str, settle: F) -> Deferred<O>
    where
        O: Send + 'static,
        F: Fn(&str, &T) -> O + Send + Sync + 'static,
    {
        let key = EntryKey::next_deferred();
        let (sender, receiver) = oneshot::channel();
        let sender = Mutex::new(Some(sender));
        let invoke = self.self_removing(event_type, key, move |emitted, payload| {
            let Some(sender) = sender.lock().take() else {
                return;
            };
            if sender.send(settle(emitted, payload)).is_err() {
                trace!(event_type = emitted, "Deferred dropped before the event arrived");
            }
        });
        self.registry.add(event_type, key, invoke);
        Deferred::new(key, event_type.to_owned(), receiver)
    }
}

impl<T: Clone + Send + 'static> Emitter<T> {
    /// Returns a [`Deferred`] that resolves with the next payload emitted for
    /// `event_type`.
    ///
    /// Pass the returned value to [`Emitter::off`] to cancel it.
    ///
    /// `when(WILDCARD)` resolves with the payload of the next event of any type
    /// and drops the event type. Use [`Emitter::when_any`] when the type matters.
    ///
    /// # Examples
    /// ```rust
    /// use tether_emitter::Emitter;
    ///
    /// # #[tokio::main(flavor = "current_thread")]
    /// # async fn main() -> Result<(), tether_emitter::EmitterError> {
    /// let emitter = Emitter::<String>::new();
    /// let ready = emitter.when("ready");
    /// emitter.emit("ready", "booted".to_owned());
    /// assert_eq!(ready.await?, "booted");
    /// # Ok(())
    /// # }
    /// ```
    pub fn when(&self, event_type: &str) -> Deferred<T> {
        if event_type == WILDCARD {
            debug!(
                emitter = %self.registry.name(),
                "Wildcard deferred resolves without the event type, see `when_any`"
            );
        }
        self.deferred(event_type, |_, payload: &T| payload.clone())
    }

    /// Returns a [`Deferred`] that resolves with `(event_type, payload)` of the
    /// next event of any type.
    ///
    /// The subscription lives under [`WILDCARD`]; cancel it with
    /// `emitter.off(WILDCARD, &deferred)`.
    pub fn when_any(&self) -> Deferred<(String, T)> {
        self.deferred(WILDCARD, |emitted: &str, payload: &T| (emitted.to_owned(), payload.clone()))
    }
}
