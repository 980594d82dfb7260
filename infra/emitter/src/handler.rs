use std::fmt;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

/// Deferred ids are unique across every emitter in the process.
static NEXT_DEFERRED: AtomicU64 = AtomicU64::new(0);

/// The callable stored in the registry: `(emitted event type, payload)`.
pub(crate) type Invoke<T> = Arc<dyn Fn(&str, &T) + Send + Sync>;

/// Identity used to remove a registration.
///
/// Handlers are compared by reference identity (two clones of the same
/// [`Handler`] share a key, two separately constructed handlers never do).
/// Keys of [`Deferred`](crate::Deferred) values are compared by value and are
/// never reused, not even by another emitter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct EntryKey(KeyKind);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
enum KeyKind {
    Handler(usize),
    Deferred(u64),
}

impl EntryKey {
    pub(crate) fn next_deferred() -> Self {
        Self(KeyKind::Deferred(NEXT_DEFERRED.fetch_add(1, Ordering::Relaxed)))
    }
}

/// A shareable event handler with reference identity.
///
/// Keep a clone of the handler you register: the same value (or any clone of
/// it) is what [`Emitter::off`](crate::Emitter::off) expects.
///
/// # Examples
/// ```rust
/// use tether_emitter::{Emitter, Handler};
///
/// let emitter = Emitter::<u32>::new();
/// let log = Handler::new(|n: &u32| assert_eq!(*n, 7));
/// emitter.on("tick", log.clone());
/// emitter.emit("tick", 7);
/// emitter.off("tick", &log);
/// ```
pub struct Handler<T> {
    inner: Invoke<T>,
}

impl<T: 'static> Handler<T> {
    /// Wraps a closure that only cares about the payload.
    ///
    /// Registered under [`WILDCARD`](crate::WILDCARD), it still receives just
    /// the payload.
    pub fn new<F>(f: F) -> Self
    where
        F: Fn(&T) + Send + Sync + 'static,
    {
        Self { inner: Arc::new(move |_: &str, payload: &T| f(payload)) }
    }

    /// Wraps a closure that receives the emitted event type alongside the payload.
    ///
    /// This is the usual shape for catch-all handlers registered under
    /// [`WILDCARD`](crate::WILDCARD).
    pub fn wildcard<F>(f: F) -> Self
    where
        F: Fn(&str, &T) + Send + Sync + 'static,
    {
        Self { inner: Arc::new(f) }
    }
}

impl<T> Handler<T> {
    /// The removal identity of this handler and all of its clones.
    #[must_use]
    pub fn key(&self) -> EntryKey {
        EntryKey(KeyKind::Handler(Arc::as_ptr(&self.inner).cast::<()>().addr()))
    }

    /// Invokes the handler directly, bypassing any emitter.
    pub fn call(&self, event_type: &str, payload: &T) {
        (self.inner)(event_type, payload);
    }

    pub(crate) fn invoke(&self) -> Invoke<T> {
        Arc::clone(&self.inner)
    }
}

impl<T> Clone for Handler<T> {
    fn clone(&self) -> Self {
        Self { inner: Arc::clone(&self.inner) }
    }
}

impl<T> PartialEq for Handler<T> {
    fn eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }
}

impl<T> Eq for Handler<T> {}

impl<T> fmt::Debug for Handler<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Handler").field("key", &self.key()).finish()
    }
}

impl<T> From<&Handler<T>> for EntryKey {
    fn from(handler: &Handler<T>) -> Self {
        handler.key()
    }
}
