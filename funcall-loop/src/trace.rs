//! Trace sinks: best-effort, fire-and-forget observability.

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

/// One-way trace channel invoked around model calls and function
/// dispatches.
///
/// Emission is infallible by contract — a sink that hits trouble
/// internally must swallow it. Nothing a sink does can affect the
/// resolution outcome.
pub trait TraceSink: Send + Sync {
    /// Deliver one trace message.
    fn emit(&self, message: &str) -> impl Future<Output = ()> + Send;
}

// --- Type erasure (RPITIT is not dyn-compatible) ---

type TraceFuture<'a> = Pin<Box<dyn Future<Output = ()> + Send + 'a>>;

trait ErasedTraceSink: Send + Sync {
    fn erased_emit<'a>(&'a self, message: &'a str) -> TraceFuture<'a>;
}

impl<S: TraceSink> ErasedTraceSink for S {
    fn erased_emit<'a>(&'a self, message: &'a str) -> TraceFuture<'a> {
        Box::pin(self.emit(message))
    }
}

/// A type-erased trace sink held by the resolver.
#[derive(Clone)]
pub struct BoxedTraceSink(Arc<dyn ErasedTraceSink>);

impl BoxedTraceSink {
    /// Wrap any [`TraceSink`] into a type-erased `BoxedTraceSink`.
    #[must_use]
    pub fn new<S: TraceSink + 'static>(sink: S) -> Self {
        BoxedTraceSink(Arc::new(sink))
    }

    /// Deliver one trace message through the erased sink.
    pub async fn emit(&self, message: &str) {
        self.0.erased_emit(message).await;
    }
}

/// A sink that discards every message.
pub struct NullTraceSink;

impl TraceSink for NullTraceSink {
    fn emit(&self, _message: &str) -> impl Future<Output = ()> + Send {
        std::future::ready(())
    }
}

/// A sink that forwards messages to [`tracing`] at INFO level under the
/// `funcall::trace` target.
pub struct TracingSink;

impl TraceSink for TracingSink {
    fn emit(&self, message: &str) -> impl Future<Output = ()> + Send {
        tracing::info!(target: "funcall::trace", "{message}");
        std::future::ready(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    struct Recording(Arc<Mutex<Vec<String>>>);

    impl TraceSink for Recording {
        fn emit(&self, message: &str) -> impl Future<Output = ()> + Send {
            self.0.lock().expect("lock").push(message.to_string());
            std::future::ready(())
        }
    }

    #[tokio::test]
    async fn boxed_sink_forwards_messages() {
        let log = Arc::new(Mutex::new(Vec::new()));
        let sink = BoxedTraceSink::new(Recording(log.clone()));

        sink.emit("first").await;
        sink.emit("second").await;

        assert_eq!(*log.lock().expect("lock"), vec!["first", "second"]);
    }

    #[tokio::test]
    async fn null_sink_accepts_anything() {
        BoxedTraceSink::new(NullTraceSink).emit("dropped").await;
    }
}
