//! Core traits: CompletionPort, Function, FunctionDyn.

use std::future::Future;
use std::pin::Pin;

use serde::Serialize;
use serde::de::DeserializeOwned;

use crate::error::{CompletionError, FunctionError};
use crate::types::{Completion, Conversation, FunctionSignature};

/// Boundary over the hosted language-model chat endpoint.
///
/// Given the transcript, the standing system instruction, and the current
/// function signatures, returns exactly one proposed next turn plus a
/// completion reason. Must not mutate its inputs and must not retry —
/// failures are reported to the caller as-is.
///
/// Uses RPITIT (return position impl trait in trait) — native async,
/// not object-safe by design; compose via generics `<P: CompletionPort>`.
pub trait CompletionPort: Send + Sync {
    /// Request one completion for the conversation.
    fn complete(
        &self,
        conversation: &Conversation,
        system: &str,
        signatures: &[FunctionSignature],
    ) -> impl Future<Output = Result<Completion, CompletionError>> + Send;
}

/// A boxed future returning a function's serialized result.
pub type FunctionFuture<'a> =
    Pin<Box<dyn Future<Output = Result<serde_json::Value, FunctionError>> + Send + 'a>>;

/// Strongly-typed function trait. Implement this for your functions.
///
/// The blanket impl of [`FunctionDyn`] handles JSON
/// deserialization/serialization so implementations work with concrete
/// Rust types.
///
/// # Example
///
/// ```
/// use funcall_types::{Function, FunctionSignature};
/// use serde::Deserialize;
///
/// #[derive(Deserialize)]
/// struct LookupArgs { id: String }
///
/// struct Lookup;
///
/// impl Function for Lookup {
///     const NAME: &'static str = "lookup";
///     type Args = LookupArgs;
///     type Output = String;
///     type Error = std::convert::Infallible;
///
///     fn signature(&self) -> FunctionSignature {
///         FunctionSignature {
///             name: "lookup".into(),
///             description: "Look up a record by id".into(),
///             parameters: serde_json::json!({
///                 "type": "object",
///                 "properties": { "id": { "type": "string" } },
///                 "required": ["id"]
///             }),
///         }
///     }
///
///     async fn invoke(&self, args: LookupArgs) -> Result<String, Self::Error> {
///         Ok(format!("record {}", args.id))
///     }
/// }
/// ```
pub trait Function: Send + Sync {
    /// The unique name of this function.
    const NAME: &'static str;
    /// The deserialized argument type.
    type Args: DeserializeOwned + Send;
    /// The serializable result type.
    type Output: Serialize;
    /// The implementation-specific error type.
    type Error: std::error::Error + Send + Sync + 'static;

    /// The declared signature advertised to the model.
    fn signature(&self) -> FunctionSignature;

    /// Invoke the function with typed arguments.
    fn invoke(
        &self,
        args: Self::Args,
    ) -> impl Future<Output = Result<Self::Output, Self::Error>> + Send;
}

/// Type-erased function for dynamic dispatch. Blanket-implemented for
/// all [`Function`] impls.
///
/// Enables heterogeneous catalogs while keeping type safety at the
/// implementation level.
pub trait FunctionDyn: Send + Sync {
    /// The function's unique name.
    fn name(&self) -> &str;
    /// The declared signature.
    fn signature(&self) -> FunctionSignature;
    /// Invoke with a JSON argument value, returning a JSON result.
    fn invoke_dyn(&self, arguments: serde_json::Value) -> FunctionFuture<'_>;
}

/// Blanket implementation: any `Function` automatically becomes a
/// `FunctionDyn`.
///
/// Deserializes the JSON arguments into `F::Args`, invokes, and
/// serializes `F::Output` back into a JSON value. Argument mismatches
/// surface as [`FunctionError::InvalidArguments`]; implementation
/// failures as [`FunctionError::Failed`].
impl<F: Function> FunctionDyn for F {
    fn name(&self) -> &str {
        F::NAME
    }

    fn signature(&self) -> FunctionSignature {
        Function::signature(self)
    }

    fn invoke_dyn(&self, arguments: serde_json::Value) -> FunctionFuture<'_> {
        Box::pin(async move {
            let args: F::Args = serde_json::from_value(arguments)
                .map_err(|e| FunctionError::InvalidArguments(e.to_string()))?;
            let output = self
                .invoke(args)
                .await
                .map_err(|e| FunctionError::Failed(Box::new(e)))?;
            serde_json::to_value(output).map_err(|e| FunctionError::Failed(Box::new(e)))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;

    #[derive(Deserialize)]
    struct EchoArgs {
        text: String,
    }

    struct Echo;

    impl Function for Echo {
        const NAME: &'static str = "echo";
        type Args = EchoArgs;
        type Output = String;
        type Error = std::convert::Infallible;

        fn signature(&self) -> FunctionSignature {
            FunctionSignature {
                name: "echo".into(),
                description: "Echoes input text".into(),
                parameters: serde_json::json!({
                    "type": "object",
                    "properties": { "text": { "type": "string" } },
                    "required": ["text"]
                }),
            }
        }

        async fn invoke(&self, args: EchoArgs) -> Result<String, Self::Error> {
            Ok(format!("echo: {}", args.text))
        }
    }

    #[tokio::test]
    async fn blanket_impl_round_trips_json() {
        let result = Echo
            .invoke_dyn(serde_json::json!({"text": "hello"}))
            .await
            .expect("invoke");
        assert_eq!(result, serde_json::json!("echo: hello"));
    }

    #[tokio::test]
    async fn blanket_impl_rejects_bad_arguments() {
        let err = Echo
            .invoke_dyn(serde_json::json!({"text": 7}))
            .await
            .unwrap_err();
        assert!(matches!(err, FunctionError::InvalidArguments(_)));
    }

    #[test]
    fn name_comes_from_the_const() {
        assert_eq!(FunctionDyn::name(&Echo), "echo");
    }
}
