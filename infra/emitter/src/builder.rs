use crate::emitter::{DEFAULT_NAME, Emitter};
use crate::handler::Handler;
use std::borrow::Cow;
use std::fmt;

/// Configures an [`Emitter`] before creation.
///
/// The initial mapping is registered exactly as a series of
/// [`Emitter::on`] calls would be, so a handler listed twice for the same type
/// ends up registered once.
///
/// # Examples
/// ```rust
/// use tether_emitter::{Emitter, Handler};
///
/// let audit = Handler::new(|_: &u8| {});
/// let emitter = Emitter::builder()
///     .name("audit")
///     .handler("login", audit.clone())
///     .handlers("logout", [audit.clone(), audit])
///     .build();
///
/// assert_eq!(emitter.name(), "audit");
/// assert_eq!(emitter.listener_count("logout"), 1);
/// ```
pub struct EmitterBuilder<T> {
    name: Cow<'static, str>,
    initial: Vec<(String, Handler<T>)>,
}

impl<T: 'static> EmitterBuilder<T> {
    #[must_use = "Creates a new emitter builder with default configuration"]
    pub(crate) const fn new() -> Self {
        Self { name: Cow::Borrowed(DEFAULT_NAME), initial: Vec::new() }
    }

    /// Sets the name reported as the `emitter` field of every log record.
    #[must_use = "The builder must be built to create the emitter"]
    pub fn name(mut self, name: impl Into<Cow<'static, str>>) -> Self {
        self.name = name.into();
        self
    }

    /// Adds one initial registration.
    #[must_use = "The builder must be built to create the emitter"]
    pub fn handler(mut self, event_type: impl Into<String>, handler: Handler<T>) -> Self {
        self.initial.push((event_type.into(), handler));
        self
    }

    /// Adds initial registrations for `event_type`, in iteration order.
    #[must_use = "The builder must be built to create the emitter"]
    pub fn handlers(
        mut self,
        event_type: impl Into<String>,
        handlers: impl IntoIterator<Item = Handler<T>>,
    ) -> Self {
        let event_type = event_type.into();
        self.initial.extend(handlers.into_iter().map(|h| (event_type.clone(), h)));
        self
    }

    /// Creates the emitter and registers the initial mapping.
    #[must_use]
    pub fn build(self) -> Emitter<T> {
        let emitter = Emitter::with_name(self.name);
        for (event_type, handler) in self.initial {
            emitter.on(&event_type, handler);
        }
        emitter
    }
}

impl<T> fmt::Debug for EmitterBuilder<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EmitterBuilder")
            .field("name", &self.name)
            .field("initial", &self.initial.len())
            .finish()
    }
}

/// Builds an emitter from a mapping of event type to ordered handler list.
///
/// Works with any map or list of pairs, e.g. a `HashMap<String, Vec<Handler<T>>>`.
impl<T, K, I> FromIterator<(K, I)> for Emitter<T>
where
    T: 'static,
    K: Into<String>,
    I: IntoIterator<Item = Handler<T>>,
{
    fn from_iter<M: IntoIterator<Item = (K, I)>>(mapping: M) -> Self {
        mapping
            .into_iter()
            .fold(Self::builder(), |builder, (event_type, handlers)| {
                builder.handlers(event_type, handlers)
            })
            .build()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_to_the_standard_name() {
        let emitter = Emitter::<u8>::builder().build();
        assert_eq!(emitter.name(), DEFAULT_NAME);
        assert!(emitter.event_types().is_empty());
    }

    #[test]
    fn from_iter_keeps_per_type_order_and_dedupes() {
        let a = Handler::new(|_: &u8| {});
        let b = Handler::new(|_: &u8| {});
        let emitter: Emitter<u8> =
            [("foo", vec![a.clone(), b.clone(), a.clone()]), ("bar", vec![b.clone()])]
                .into_iter()
                .collect();

        assert_eq!(emitter.listener_count("foo"), 2);
        assert!(emitter.contains("foo", &a));
        assert!(emitter.contains("bar", &b));
        assert!(!emitter.contains("bar", &a));
        assert_eq!(emitter.event_types(), vec!["bar".to_owned(), "foo".to_owned()]);
    }
}
