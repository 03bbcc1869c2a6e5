//! Integration tests for the resolution loop.

use std::future::Future;
use std::sync::{Arc, Mutex};

use funcall_catalog::FunctionCatalog;
use funcall_loop::{
    FunctionFailurePolicy, FunctionResolver, Resolution, ResolverConfig, TraceSink,
    UNABLE_TO_ANSWER, UnknownFunctionPolicy,
};
use funcall_types::{
    Completion, CompletionError, CompletionPort, CompletionReason, Conversation, FunctionError,
    FunctionSignature, ResolveError, Role, Turn, TurnPayload,
};
use tokio_util::sync::CancellationToken;

/// A port that replays pre-configured completions in sequence and
/// records the signature list it was shown on each call.
struct ScriptedPort {
    script: Mutex<Vec<Completion>>,
    seen_signatures: Arc<Mutex<Vec<Vec<FunctionSignature>>>>,
}

impl ScriptedPort {
    fn new(script: Vec<Completion>) -> Self {
        Self {
            script: Mutex::new(script),
            seen_signatures: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// Handle to the per-call signature log, for inspection after the
    /// port has moved into a resolver.
    fn signature_log(&self) -> Arc<Mutex<Vec<Vec<FunctionSignature>>>> {
        self.seen_signatures.clone()
    }
}

impl CompletionPort for ScriptedPort {
    fn complete(
        &self,
        _conversation: &Conversation,
        _system: &str,
        signatures: &[FunctionSignature],
    ) -> impl Future<Output = Result<Completion, CompletionError>> + Send {
        self.seen_signatures
            .lock()
            .expect("lock")
            .push(signatures.to_vec());
        let completion = {
            let mut script = self.script.lock().expect("lock");
            if script.is_empty() {
                panic!("ScriptedPort: no more completions configured");
            }
            script.remove(0)
        };
        std::future::ready(Ok(completion))
    }
}

/// A port that proposes the same function call forever.
struct RelentlessPort {
    calls: Arc<Mutex<usize>>,
}

impl CompletionPort for RelentlessPort {
    fn complete(
        &self,
        _conversation: &Conversation,
        _system: &str,
        _signatures: &[FunctionSignature],
    ) -> impl Future<Output = Result<Completion, CompletionError>> + Send {
        *self.calls.lock().expect("lock") += 1;
        std::future::ready(Ok(Completion::function_call("echo", r#"{"text":"again"}"#)))
    }
}

/// A port whose underlying call always fails.
struct BrokenPort;

impl CompletionPort for BrokenPort {
    fn complete(
        &self,
        _conversation: &Conversation,
        _system: &str,
        _signatures: &[FunctionSignature],
    ) -> impl Future<Output = Result<Completion, CompletionError>> + Send {
        std::future::ready(Err(CompletionError::ServiceUnavailable(
            "upstream is down".into(),
        )))
    }
}

fn signature_named(name: &str) -> FunctionSignature {
    FunctionSignature {
        name: name.into(),
        description: String::new(),
        parameters: serde_json::json!({ "type": "object", "properties": {} }),
    }
}

/// Catalog with an `echo` closure function.
fn echo_catalog() -> Arc<FunctionCatalog> {
    let mut catalog = FunctionCatalog::new();
    catalog.register_fn(signature_named("echo"), |arguments| async move {
        Ok(serde_json::json!({ "echoed": arguments["text"] }))
    });
    Arc::new(catalog)
}

/// Catalog with a function that always fails.
fn failing_catalog() -> Arc<FunctionCatalog> {
    let mut catalog = FunctionCatalog::new();
    catalog.register_fn(signature_named("broken"), |_| async {
        Err(FunctionError::Failed("backend exploded".into()))
    });
    Arc::new(catalog)
}

fn roles(conversation: &Conversation) -> Vec<Role> {
    conversation.turns().iter().map(Turn::role).collect()
}

#[tokio::test]
async fn terminates_with_the_models_final_text() {
    let port = ScriptedPort::new(vec![Completion::stop("The answer is 42.")]);
    let resolver = FunctionResolver::new(port, echo_catalog(), ResolverConfig::default());

    let resolution = resolver.run("what is the answer?").await.expect("run");

    assert_eq!(
        resolution,
        Resolution {
            answer: "The answer is 42.".into(),
            iterations: 1,
            exhausted: false,
        }
    );
}

#[tokio::test]
async fn exhausts_after_exactly_the_configured_ceiling() {
    let calls = Arc::new(Mutex::new(0));
    let port = RelentlessPort {
        calls: calls.clone(),
    };
    let resolver = FunctionResolver::new(port, echo_catalog(), ResolverConfig::default());

    let resolution = resolver.run("loop forever").await.expect("run");

    assert!(resolution.exhausted);
    assert_eq!(resolution.answer, UNABLE_TO_ANSWER);
    assert_eq!(resolution.iterations, 10);
    // Exactly the ceiling: the port was consulted ten times, never an
    // eleventh.
    assert_eq!(*calls.lock().expect("lock"), 10);
}

#[tokio::test]
async fn malformed_arguments_are_retried_and_never_appended() {
    let port = ScriptedPort::new(vec![
        Completion::function_call("echo", "{not json"),
        Completion::stop("Recovered."),
    ]);
    let resolver = FunctionResolver::new(port, echo_catalog(), ResolverConfig::default());

    let mut conversation = Conversation::seeded("go");
    let resolution = resolver
        .resolve(&mut conversation, CancellationToken::new())
        .await
        .expect("resolve");

    assert_eq!(resolution.answer, "Recovered.");
    assert_eq!(resolution.iterations, 2);
    // Only the seed and the final answer: the malformed call left no trace.
    assert_eq!(roles(&conversation), vec![Role::User, Role::Assistant]);
}

#[tokio::test]
async fn dispatch_result_is_folded_into_the_conversation_verbatim() {
    let work_orders = serde_json::json!([
        { "work_order_id": "00052" },
        { "work_order_id": "00042" },
        { "work_order_id": "52341" }
    ]);

    let mut catalog = FunctionCatalog::new();
    let fixture = work_orders.clone();
    catalog.register_fn(
        signature_named("get_work_orders_by_account"),
        move |_| {
            let fixture = fixture.clone();
            async move { Ok(fixture) }
        },
    );

    let port = ScriptedPort::new(vec![
        Completion::function_call("get_work_orders_by_account", r#"{"account_id":"01234"}"#),
        Completion::stop("Found three work orders."),
    ]);
    let resolver = FunctionResolver::new(port, Arc::new(catalog), ResolverConfig::default());

    let mut conversation = Conversation::seeded("list work orders for 01234");
    resolver
        .resolve(&mut conversation, CancellationToken::new())
        .await
        .expect("resolve");

    assert_eq!(
        roles(&conversation),
        vec![Role::User, Role::Assistant, Role::Function, Role::Assistant]
    );
    match conversation.turns()[2].payload() {
        TurnPayload::Result { name, value } => {
            assert_eq!(name, "get_work_orders_by_account");
            assert_eq!(*value, work_orders);
        }
        other => panic!("expected a function result turn, got: {other:?}"),
    }
    assert_eq!(
        conversation.last().expect("last").text(),
        Some("Found three work orders.")
    );
}

#[tokio::test]
async fn unknown_function_fails_by_default_without_fabricating_a_result() {
    let port = ScriptedPort::new(vec![Completion::function_call("no_such_fn", "{}")]);
    let resolver = FunctionResolver::new(port, echo_catalog(), ResolverConfig::default());

    let mut conversation = Conversation::seeded("go");
    let err = resolver
        .resolve(&mut conversation, CancellationToken::new())
        .await
        .unwrap_err();

    assert!(matches!(err, ResolveError::UnknownFunction(name) if name == "no_such_fn"));
    // The transcript only holds the seed: no call turn, no invented result.
    assert_eq!(roles(&conversation), vec![Role::User]);
}

#[tokio::test]
async fn unknown_function_retry_policy_loops_without_fabricating_a_result() {
    let port = ScriptedPort::new(vec![
        Completion::function_call("no_such_fn", "{}"),
        Completion::stop("Asking differently."),
    ]);
    let config = ResolverConfig::default().with_unknown_function(UnknownFunctionPolicy::Retry);
    let resolver = FunctionResolver::new(port, echo_catalog(), config);

    let mut conversation = Conversation::seeded("go");
    let resolution = resolver
        .resolve(&mut conversation, CancellationToken::new())
        .await
        .expect("resolve");

    assert_eq!(resolution.answer, "Asking differently.");
    assert_eq!(roles(&conversation), vec![Role::User, Role::Assistant]);
}

#[tokio::test]
async fn signatures_are_identical_across_all_iterations() {
    let port = ScriptedPort::new(vec![
        Completion::function_call("echo", r#"{"text":"one"}"#),
        Completion::function_call("echo", r#"{"text":"two"}"#),
        Completion::stop("Done."),
    ]);
    let log = port.signature_log();
    let catalog = echo_catalog();
    let expected = catalog.signatures().to_vec();
    let resolver = FunctionResolver::new(port, catalog, ResolverConfig::default());

    resolver.run("echo twice").await.expect("run");

    let seen = log.lock().expect("lock");
    assert_eq!(seen.len(), 3);
    for advertised in seen.iter() {
        assert_eq!(*advertised, expected);
    }
}

#[tokio::test]
async fn function_failure_is_reported_to_the_model_by_default() {
    let port = ScriptedPort::new(vec![
        Completion::function_call("broken", "{}"),
        Completion::stop("The backend seems to be down."),
    ]);
    let resolver = FunctionResolver::new(port, failing_catalog(), ResolverConfig::default());

    let mut conversation = Conversation::seeded("go");
    let resolution = resolver
        .resolve(&mut conversation, CancellationToken::new())
        .await
        .expect("resolve");

    assert_eq!(resolution.answer, "The backend seems to be down.");
    let result_turn = conversation
        .turns()
        .iter()
        .find_map(|t| match t.payload() {
            TurnPayload::Result { value, .. } => Some(value),
            _ => None,
        })
        .expect("failure should be encoded as a result turn");
    assert!(result_turn["error"].as_str().expect("error text").contains("backend exploded"));
}

#[tokio::test]
async fn function_failure_is_fatal_under_the_fatal_policy() {
    let port = ScriptedPort::new(vec![Completion::function_call("broken", "{}")]);
    let config = ResolverConfig::default().with_function_failure(FunctionFailurePolicy::Fatal);
    let resolver = FunctionResolver::new(port, failing_catalog(), config);

    let err = resolver.run("go").await.unwrap_err();
    assert!(matches!(err, ResolveError::Function(FunctionError::Failed(_))));
}

#[tokio::test]
async fn truncated_completion_is_fatal() {
    let port = ScriptedPort::new(vec![Completion::truncated()]);
    let resolver = FunctionResolver::new(port, echo_catalog(), ResolverConfig::default());

    let err = resolver.run("go").await.unwrap_err();
    assert!(matches!(err, ResolveError::Truncated));
}

#[tokio::test]
async fn upstream_failure_is_fatal_and_leaves_the_transcript_intact() {
    let resolver = FunctionResolver::new(BrokenPort, echo_catalog(), ResolverConfig::default());

    let mut conversation = Conversation::seeded("go");
    let err = resolver
        .resolve(&mut conversation, CancellationToken::new())
        .await
        .unwrap_err();

    assert!(matches!(
        err,
        ResolveError::Completion(CompletionError::ServiceUnavailable(_))
    ));
    assert_eq!(roles(&conversation), vec![Role::User]);
}

#[tokio::test]
async fn cancellation_aborts_before_the_model_call() {
    let port = ScriptedPort::new(vec![Completion::stop("never seen")]);
    let resolver = FunctionResolver::new(port, echo_catalog(), ResolverConfig::default());

    let cancel = CancellationToken::new();
    cancel.cancel();

    let mut conversation = Conversation::seeded("go");
    let err = resolver.resolve(&mut conversation, cancel).await.unwrap_err();

    assert!(matches!(err, ResolveError::Cancelled));
    assert_eq!(conversation.len(), 1);
}

#[tokio::test]
async fn empty_conversation_is_rejected() {
    let port = ScriptedPort::new(vec![]);
    let resolver = FunctionResolver::new(port, echo_catalog(), ResolverConfig::default());

    let mut conversation = Conversation::new();
    let err = resolver
        .resolve(&mut conversation, CancellationToken::new())
        .await
        .unwrap_err();
    assert!(matches!(err, ResolveError::EmptyConversation));
}

#[tokio::test]
async fn other_stop_reason_still_yields_the_text_as_final() {
    let port = ScriptedPort::new(vec![Completion {
        reason: CompletionReason::Other,
        content: Some("best effort answer".into()),
        function_call: None,
    }]);
    let resolver = FunctionResolver::new(port, echo_catalog(), ResolverConfig::default());

    let resolution = resolver.run("go").await.expect("run");
    assert_eq!(resolution.answer, "best effort answer");
    assert!(!resolution.exhausted);
}

/// A sink that records every trace message.
struct RecordingSink(Arc<Mutex<Vec<String>>>);

impl TraceSink for RecordingSink {
    fn emit(&self, message: &str) -> impl Future<Output = ()> + Send {
        self.0.lock().expect("lock").push(message.to_string());
        std::future::ready(())
    }
}

#[tokio::test]
async fn trace_sink_sees_model_calls_and_dispatches() {
    let port = ScriptedPort::new(vec![
        Completion::function_call("echo", r#"{"text":"hi"}"#),
        Completion::stop("Done."),
    ]);
    let log = Arc::new(Mutex::new(Vec::new()));
    let mut resolver = FunctionResolver::new(port, echo_catalog(), ResolverConfig::default());
    resolver.set_trace_sink(RecordingSink(log.clone()));

    resolver.run("trace me").await.expect("run");

    let messages = log.lock().expect("lock");
    assert!(messages.iter().any(|m| m.starts_with("model call (1/")));
    assert!(messages.iter().any(|m| m.starts_with("function call:\necho")));
    assert!(messages.iter().any(|m| m.starts_with("response:")));
}
