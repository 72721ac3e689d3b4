//! Caller-supplied log sink for handlers.
//!
//! Handlers never install a global subscriber. Each one is constructed with a
//! [`LogSink`] and runs its operations inside that sink's dispatcher, so the
//! caller decides where (and whether) handler events go.

use tracing::Dispatch;

/// A `tracing` dispatcher handed to a handler at construction.
#[derive(Clone)]
pub struct LogSink {
    dispatch: Dispatch,
}

impl LogSink {
    pub fn new(dispatch: Dispatch) -> Self {
        Self { dispatch }
    }

    /// Sink that discards every event.
    pub fn none() -> Self {
        Self {
            dispatch: Dispatch::none(),
        }
    }

    /// Run `f` with this sink as the thread's default dispatcher.
    pub fn scope<T>(&self, f: impl FnOnce() -> T) -> T {
        tracing::dispatcher::with_default(&self.dispatch, f)
    }
}

impl Default for LogSink {
    fn default() -> Self {
        Self::none()
    }
}

impl std::fmt::Debug for LogSink {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LogSink").finish_non_exhaustive()
    }
}

impl From<Dispatch> for LogSink {
    fn from(dispatch: Dispatch) -> Self {
        Self::new(dispatch)
    }
}
