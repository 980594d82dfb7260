use crate::error::EmitterError;
use crate::handler::EntryKey;
use std::future::Future;
use std::pin::Pin;
use std::task::{Context, Poll};
use tokio::sync::oneshot;

/// A pending value produced by [`Emitter::when`](crate::Emitter::when) or
/// [`Emitter::when_any`](crate::Emitter::when_any).
///
/// Resolves with the next matching event. There is no timeout; pass the
/// `Deferred` to [`Emitter::off`](crate::Emitter::off) to cancel it, after
/// which awaiting yields [`EmitterError::Cancelled`].
#[derive(Debug)]
#[must_use = "futures do nothing unless awaited"]
pub struct Deferred<O> {
    key: EntryKey,
    event_type: String,
    receiver: oneshot::Receiver<O>,
}

impl<O> Deferred<O> {
    pub(crate) const fn new(
        key: EntryKey,
        event_type: String,
        receiver: oneshot::Receiver<O>,
    ) -> Self {
        Self { key, event_type, receiver }
    }

    /// The removal identity of this subscription.
    #[must_use]
    pub const fn key(&self) -> EntryKey {
        self.key
    }

    /// The event type this subscription listens to.
    #[must_use]
    pub fn event_type(&self) -> &str {
        &self.event_type
    }
}

impl<O> From<&Deferred<O>> for EntryKey {
    fn from(deferred: &Deferred<O>) -> Self {
        deferred.key
    }
}

impl<O> Future for Deferred<O> {
    type Output = Result<O, EmitterError>;

    fn poll(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        let this = self.get_mut();
        Pin::new(&mut this.receiver).poll(cx).map(|result| {
            result.map_err(|_| EmitterError::Cancelled {
                message: format!("no '{}' event before the subscription ended", this.event_type)
                    .into(),
                context: None,
            })
        })
    }
}
