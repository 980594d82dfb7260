use std::borrow::Cow;

/// Errors that can occur while waiting on an emitter subscription.
///
/// Registration, removal and emission never fail; only a [`Deferred`](crate::Deferred)
/// can end without a value.
#[derive(Debug, thiserror::Error)]
pub enum EmitterError {
    /// The subscription was removed (via `off`, `clear` or by dropping the
    /// last emitter handle) before a matching event was emitted.
    #[error("Subscription cancelled{}: {message}", format_context(.context))]
    Cancelled { message: Cow<'static, str>, context: Option<Cow<'static, str>> },
}

pub type Result<T, E = EmitterError> = std::result::Result<T, E>;

/// Attaches caller context to an [`EmitterError`].
pub trait EmitterErrorExt<T> {
    /// Records `context` on the error, replacing any previous context.
    ///
    /// # Errors
    /// Returns the original error with the context attached.
    fn context(self, context: impl Into<Cow<'static, str>>) -> Result<T>;
}

impl<T> EmitterErrorExt<T> for Result<T> {
    #[inline]
    fn context(self, context: impl Into<Cow<'static, str>>) -> Self {
        self.map_err(|mut e| {
            match &mut e {
                EmitterError::Cancelled { context: c, .. } => *c = Some(context.into()),
            }
            e
        })
    }
}

#[allow(clippy::ref_option)]
fn format_context(context: &Option<Cow<'static, str>>) -> Cow<'static, str> {
    context.as_ref().map_or(Cow::Borrowed(""), |c| Cow::Owned(format!(" ({c})")))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_without_context() {
        let err = EmitterError::Cancelled { message: "no event for 'ready'".into(), context: None };
        assert_eq!(err.to_string(), "Subscription cancelled: no event for 'ready'");
    }

    #[test]
    fn context_is_rendered_in_parentheses() {
        let result: Result<()> =
            Err(EmitterError::Cancelled { message: "no event".into(), context: None });
        let err = result.context("waiting for boot").unwrap_err();
        assert_eq!(err.to_string(), "Subscription cancelled (waiting for boot): no event");
    }
}
