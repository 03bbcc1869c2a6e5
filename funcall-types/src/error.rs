//! Error types shared across the funcall crates.

use std::time::Duration;

/// Errors from the completion port (the LLM chat endpoint boundary).
///
/// All of these are fatal to a resolution run: the port itself never
/// retries, and neither does the resolver.
#[derive(Debug, thiserror::Error)]
pub enum CompletionError {
    /// Network-level error (connection reset, DNS failure, etc.).
    #[error("network error: {0}")]
    Network(#[source] Box<dyn std::error::Error + Send + Sync>),
    /// Request timed out.
    #[error("timeout after {0:?}")]
    Timeout(Duration),
    /// Authentication/authorization failure.
    #[error("authentication failed: {0}")]
    Authentication(String),
    /// Rate limited by the endpoint.
    #[error("rate limited, retry after {retry_after:?}")]
    RateLimit {
        /// Suggested retry delay, if the API provided one.
        retry_after: Option<Duration>,
    },
    /// Malformed or invalid request, or an unparseable response.
    #[error("invalid request: {0}")]
    InvalidRequest(String),
    /// Endpoint is temporarily unavailable.
    #[error("service unavailable: {0}")]
    ServiceUnavailable(String),
    /// Any other completion error.
    #[error(transparent)]
    Other(Box<dyn std::error::Error + Send + Sync>),
}

/// Errors from function catalog operations.
#[derive(Debug, thiserror::Error)]
pub enum FunctionError {
    /// No function with this name is registered.
    #[error("function not found: {0}")]
    NotFound(String),
    /// Arguments did not deserialize into the function's input type.
    #[error("invalid arguments: {0}")]
    InvalidArguments(String),
    /// The implementation itself failed.
    #[error("function failed: {0}")]
    Failed(#[source] Box<dyn std::error::Error + Send + Sync>),
    /// Invocation was cancelled.
    #[error("cancelled")]
    Cancelled,
}

/// Errors loading the function descriptor source.
///
/// These are startup-fatal: a catalog is built once, before any
/// resolution runs.
#[derive(Debug, thiserror::Error)]
pub enum DescriptorError {
    /// The descriptor file could not be read.
    #[error("unable to read descriptors: {0}")]
    Io(#[from] std::io::Error),
    /// The descriptor file is not a JSON array of descriptor records.
    #[error("malformed descriptor file: {0}")]
    Parse(#[from] serde_json::Error),
    /// A record is structurally valid JSON but not a usable descriptor.
    #[error("invalid descriptor record: {0}")]
    InvalidRecord(String),
    /// A loaded signature has no paired implementation.
    #[error("no implementation bound for function '{0}'")]
    MissingImplementation(String),
}

/// Errors terminating a resolution run.
///
/// Iteration exhaustion is deliberately absent: spending the budget is a
/// soft failure that resolves to the sentinel answer, not an error.
#[derive(Debug, thiserror::Error)]
pub enum ResolveError {
    /// The completion port reported a failure.
    #[error("completion failed: {0}")]
    Completion(#[from] CompletionError),
    /// A function dispatch failed (under the fatal failure policy).
    #[error("function dispatch failed: {0}")]
    Function(#[from] FunctionError),
    /// The model's response was cut off by a length limit.
    #[error("response truncated by length limit")]
    Truncated,
    /// The model named a function absent from the catalog
    /// (under the fail policy).
    #[error("unable to answer: function '{0}' does not exist")]
    UnknownFunction(String),
    /// The run was cancelled.
    #[error("cancelled")]
    Cancelled,
    /// The conversation had no turns at loop entry.
    #[error("conversation is empty")]
    EmptyConversation,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unknown_function_names_the_function() {
        let err = ResolveError::UnknownFunction("get_weather".into());
        assert_eq!(
            err.to_string(),
            "unable to answer: function 'get_weather' does not exist"
        );
    }

    #[test]
    fn completion_error_converts_into_resolve_error() {
        let err: ResolveError = CompletionError::Authentication("bad key".into()).into();
        assert!(matches!(err, ResolveError::Completion(_)));
    }

    #[test]
    fn descriptor_io_error_converts() {
        let io = std::io::Error::new(std::io::ErrorKind::NotFound, "missing");
        let err: DescriptorError = io.into();
        assert!(matches!(err, DescriptorError::Io(_)));
    }
}
