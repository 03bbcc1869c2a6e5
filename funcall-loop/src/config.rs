//! Configuration for the resolution loop.

/// Default iteration ceiling.
const DEFAULT_MAX_ITERATIONS: usize = 10;

/// Default standing instruction sent with every completion request.
const DEFAULT_SYSTEM_INSTRUCTION: &str = "Don't make assumptions about what values to plug \
     into functions. Ask for clarification if a user request is ambiguous.";

/// What to do when the model names a function absent from the catalog.
///
/// Either the catalog's metadata is out of sync or the model hallucinated
/// a name. Neither policy ever fabricates a result turn.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum UnknownFunctionPolicy {
    /// Abort the run with `ResolveError::UnknownFunction`.
    #[default]
    Fail,
    /// Append nothing and ask the model again, accepting that it may
    /// repeat or change its request. Bounded by the iteration ceiling.
    Retry,
}

/// What to do when a dispatched implementation fails.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FunctionFailurePolicy {
    /// Encode the failure as a function-result turn (`{"error": ...}`)
    /// so the model can react to it.
    #[default]
    ReportToModel,
    /// Abort the run with `ResolveError::Function`.
    Fatal,
}

/// Configuration for [`FunctionResolver`](crate::FunctionResolver).
#[derive(Debug, Clone)]
pub struct ResolverConfig {
    /// Maximum loop passes before giving up with the sentinel answer.
    pub max_iterations: usize,
    /// Standing instruction sent with every completion request. Not
    /// stored in the transcript.
    pub system_instruction: String,
    /// Policy for function names absent from the catalog.
    pub unknown_function: UnknownFunctionPolicy,
    /// Policy for implementation failures.
    pub function_failure: FunctionFailurePolicy,
}

impl Default for ResolverConfig {
    fn default() -> Self {
        Self {
            max_iterations: DEFAULT_MAX_ITERATIONS,
            system_instruction: DEFAULT_SYSTEM_INSTRUCTION.to_string(),
            unknown_function: UnknownFunctionPolicy::default(),
            function_failure: FunctionFailurePolicy::default(),
        }
    }
}

impl ResolverConfig {
    /// Set the iteration ceiling.
    #[must_use]
    pub fn with_max_iterations(mut self, max_iterations: usize) -> Self {
        self.max_iterations = max_iterations;
        self
    }

    /// Set the standing system instruction.
    #[must_use]
    pub fn with_system_instruction(mut self, instruction: impl Into<String>) -> Self {
        self.system_instruction = instruction.into();
        self
    }

    /// Set the unknown-function policy.
    #[must_use]
    pub fn with_unknown_function(mut self, policy: UnknownFunctionPolicy) -> Self {
        self.unknown_function = policy;
        self
    }

    /// Set the function-failure policy.
    #[must_use]
    pub fn with_function_failure(mut self, policy: FunctionFailurePolicy) -> Self {
        self.function_failure = policy;
        self
    }
}
