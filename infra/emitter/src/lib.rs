//! # Emitter
//!
//! A small, synchronous publish/subscribe primitive keyed by event-type strings.
//!
//! ## Overview
//!
//! Handlers are registered against an event type and run, in registration
//! order, every time that type is emitted. Handlers registered under the
//! reserved [`WILDCARD`] type (`"*"`) run after them for every emitted type.
//!
//! ## Features
//!
//! * **Identity keyed**: a [`Handler`] is removed with the same value it was
//!   registered with, even when [`Emitter::once`] wrapped it internally.
//! * **No duplicates**: registering a handler twice for one type keeps a single
//!   registration.
//! * **Reentrant**: handlers may register, remove and emit while an emit is in
//!   progress; removed handlers that were not reached yet never run.
//! * **Awaitable**: [`Emitter::when`] returns a [`Deferred`] future for the next
//!   event, cancellable through [`Emitter::off`].
//! * **Thread safe**: `parking_lot` locks around an `FxHashMap`; locks are never
//!   held while handlers run.
//!
//! Handler panics are not isolated: a panic unwinds out of [`Emitter::emit`] and
//! the handlers that were not reached yet are skipped.
//!
//! # Example
//!
//! ```rust
//! use tether_emitter::{Emitter, EmitterError, Handler, WILDCARD};
//!
//! #[derive(Clone, Debug, PartialEq)]
//! struct Login { user: u64 }
//!
//! # #[tokio::main(flavor = "current_thread")]
//! # async fn main() -> Result<(), EmitterError> {
//! let emitter = Emitter::<Login>::new();
//!
//! let audit = Handler::wildcard(|event_type: &str, login: &Login| {
//!     assert_eq!((event_type, login.user), ("login", 42));
//! });
//! emitter.on(WILDCARD, audit.clone());
//!
//! let next = emitter.when("login");
//! emitter.emit("login", Login { user: 42 });
//! assert_eq!(next.await?, Login { user: 42 });
//!
//! emitter.off(WILDCARD, &audit);
//! # Ok(())
//! # }
//! ```

mod builder;
mod deferred;
mod emitter;
mod error;
mod handler;
mod registry;

pub use builder::EmitterBuilder;
pub use deferred::Deferred;
pub use emitter::Emitter;
pub use error::{EmitterError, EmitterErrorExt, Result};
pub use handler::{EntryKey, Handler};

/// The catch-all event type. Handlers registered under it run for every emit.
pub const WILDCARD: &str = "*";
