//! The FunctionResolver state machine.

use std::sync::Arc;

use funcall_catalog::FunctionCatalog;
use funcall_types::{
    Completion, CompletionError, CompletionPort, CompletionReason, Conversation, FunctionCall,
    ResolveError, Turn,
};
use tokio_util::sync::CancellationToken;

use crate::config::{FunctionFailurePolicy, ResolverConfig, UnknownFunctionPolicy};
use crate::trace::{BoxedTraceSink, NullTraceSink, TraceSink};

/// Sentinel answer returned when the iteration budget is exhausted.
pub const UNABLE_TO_ANSWER: &str = "unable to answer the question";

/// The terminal state of a resolution run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Resolution {
    /// The final answer text. The sentinel [`UNABLE_TO_ANSWER`] when
    /// `exhausted` is set.
    pub answer: String,
    /// Completion-port calls made during the run.
    pub iterations: usize,
    /// Whether the run spent its iteration budget without an answer.
    pub exhausted: bool,
}

/// Drives a conversation to a final answer by alternating completion
/// calls and function dispatches.
///
/// Generic over `P: CompletionPort` (the chat endpoint boundary). The
/// catalog is shared read-only; a resolver may serve many sequential
/// runs, and independent resolvers may share one catalog and port across
/// concurrent conversations.
pub struct FunctionResolver<P: CompletionPort> {
    port: P,
    catalog: Arc<FunctionCatalog>,
    config: ResolverConfig,
    trace: BoxedTraceSink,
}

impl<P: CompletionPort> FunctionResolver<P> {
    /// Create a resolver over the given port and catalog.
    #[must_use]
    pub fn new(port: P, catalog: Arc<FunctionCatalog>, config: ResolverConfig) -> Self {
        Self {
            port,
            catalog,
            config,
            trace: BoxedTraceSink::new(NullTraceSink),
        }
    }

    /// Install a trace sink. Replaces the default discarding sink.
    pub fn set_trace_sink<S: TraceSink + 'static>(&mut self, sink: S) -> &mut Self {
        self.trace = BoxedTraceSink::new(sink);
        self
    }

    /// The resolver's configuration.
    #[must_use]
    pub fn config(&self) -> &ResolverConfig {
        &self.config
    }

    /// Seed a fresh conversation with one user turn and run it to a
    /// terminal state.
    ///
    /// # Errors
    ///
    /// See [`Self::resolve`].
    pub async fn run(&self, utterance: impl Into<String>) -> Result<Resolution, ResolveError> {
        let mut conversation = Conversation::seeded(utterance);
        self.resolve(&mut conversation, CancellationToken::new())
            .await
    }

    /// Drive an existing conversation to a terminal state.
    ///
    /// The conversation must be non-empty. The resolver only appends
    /// turns; on a fatal error the transcript up to that point is left
    /// intact for the caller to inspect.
    ///
    /// One iteration is one completion call plus, when the model asked
    /// for one, one function dispatch. At the ceiling
    /// ([`ResolverConfig::max_iterations`]) the run resolves to the
    /// sentinel answer instead of erroring.
    ///
    /// # Errors
    ///
    /// [`ResolveError::EmptyConversation`] before the first iteration;
    /// [`ResolveError::Completion`] when the port fails;
    /// [`ResolveError::Truncated`] on a length-limited response;
    /// [`ResolveError::UnknownFunction`] and [`ResolveError::Function`]
    /// per the configured policies; [`ResolveError::Cancelled`] when the
    /// token fires.
    pub async fn resolve(
        &self,
        conversation: &mut Conversation,
        cancel: CancellationToken,
    ) -> Result<Resolution, ResolveError> {
        if conversation.is_empty() {
            return Err(ResolveError::EmptyConversation);
        }

        let signatures = self.catalog.signatures();
        let max = self.config.max_iterations;

        for iteration in 1..=max {
            if cancel.is_cancelled() {
                return Err(ResolveError::Cancelled);
            }

            tracing::debug!(iteration, max, "requesting completion");
            self.trace
                .emit(&format!("model call ({iteration}/{max})"))
                .await;

            let completion = self
                .port
                .complete(conversation, &self.config.system_instruction, signatures)
                .await?;

            match completion.reason {
                CompletionReason::LengthLimit => {
                    tracing::warn!(iteration, "completion truncated by length limit");
                    return Err(ResolveError::Truncated);
                }
                CompletionReason::FunctionCall => {
                    self.handle_function_call(conversation, completion, &cancel)
                        .await?;
                }
                CompletionReason::Stop | CompletionReason::Other => {
                    let answer = completion.content.unwrap_or_default();
                    if completion.reason == CompletionReason::Other {
                        tracing::warn!(iteration, "completion stopped for an unrecognized reason");
                    }
                    conversation.push(Turn::assistant(answer.clone()));
                    return Ok(Resolution {
                        answer,
                        iterations: iteration,
                        exhausted: false,
                    });
                }
            }
        }

        tracing::warn!(max, "iteration ceiling reached without a final answer");
        self.trace.emit("reached max iterations").await;
        Ok(Resolution {
            answer: UNABLE_TO_ANSWER.to_string(),
            iterations: max,
            exhausted: true,
        })
    }

    /// Handle one function-call completion: parse arguments, look up the
    /// implementation, dispatch, and fold the result into the
    /// conversation.
    ///
    /// Appends either both the call turn and its result turn, or nothing
    /// at all (malformed arguments, unknown name under the retry policy,
    /// cancellation before dispatch).
    async fn handle_function_call(
        &self,
        conversation: &mut Conversation,
        completion: Completion,
        cancel: &CancellationToken,
    ) -> Result<(), ResolveError> {
        let Some(raw) = completion.function_call else {
            return Err(ResolveError::Completion(CompletionError::InvalidRequest(
                "function-call completion without a call payload".into(),
            )));
        };

        // The arguments come off the wire as JSON text embedded in a
        // string. Malformed text is a transient model error: append
        // nothing and ask again.
        let arguments: serde_json::Value = match serde_json::from_str(&raw.arguments) {
            Ok(value) => value,
            Err(err) => {
                tracing::warn!(function = %raw.name, %err, "malformed function-call arguments");
                self.trace
                    .emit(&format!("malformed arguments for '{}', retrying", raw.name))
                    .await;
                return Ok(());
            }
        };

        let Some(function) = self.catalog.get(&raw.name) else {
            // Either our metadata is wrong or the model hallucinated a
            // name. Never fabricate a result.
            match self.config.unknown_function {
                UnknownFunctionPolicy::Fail => {
                    return Err(ResolveError::UnknownFunction(raw.name));
                }
                UnknownFunctionPolicy::Retry => {
                    tracing::warn!(function = %raw.name, "model referenced unknown function");
                    self.trace
                        .emit(&format!("unknown function '{}', retrying", raw.name))
                        .await;
                    return Ok(());
                }
            }
        };

        if cancel.is_cancelled() {
            return Err(ResolveError::Cancelled);
        }

        conversation.push(Turn::function_call(FunctionCall {
            name: raw.name.clone(),
            arguments: arguments.clone(),
        }));

        self.trace
            .emit(&format!("function call:\n{}('{arguments}')", raw.name))
            .await;

        match function.invoke_dyn(arguments).await {
            Ok(value) => {
                self.trace.emit(&format!("response:\n'{value}'")).await;
                conversation.push(Turn::function_result(raw.name, value));
            }
            Err(err) => match self.config.function_failure {
                FunctionFailurePolicy::Fatal => return Err(ResolveError::Function(err)),
                FunctionFailurePolicy::ReportToModel => {
                    tracing::warn!(function = %raw.name, %err, "function failed, reporting to model");
                    self.trace
                        .emit(&format!("function '{}' failed: {err}", raw.name))
                        .await;
                    let report = serde_json::json!({ "error": err.to_string() });
                    conversation.push(Turn::function_result(raw.name, report));
                }
            },
        }

        Ok(())
    }
}
