//! Conversation, signature, and completion types.

use serde::{Deserialize, Serialize};

/// The role of a turn's author.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Role {
    /// A standing instruction.
    System,
    /// The human user.
    User,
    /// The model.
    Assistant,
    /// A registered function reporting its result.
    Function,
}

/// A parsed function-call request carried on an assistant turn.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FunctionCall {
    /// Name of the function the model wants invoked.
    pub name: String,
    /// Arguments the model supplied, already parsed as JSON.
    pub arguments: serde_json::Value,
}

/// The single semantic payload of a turn.
///
/// A turn is exactly one of: free text, a function-call request, or a
/// function result. The enum makes any other combination unrepresentable.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum TurnPayload {
    /// Free-text content.
    Text(String),
    /// A function-call request (assistant turns only).
    Call(FunctionCall),
    /// A function result (function turns only).
    Result {
        /// Which function produced this result.
        name: String,
        /// The serialized result value.
        value: serde_json::Value,
    },
}

/// One message in a conversation. Immutable once constructed.
///
/// Role and payload are paired by the constructors; there is no way to
/// build, say, a user turn carrying a function result.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Turn {
    role: Role,
    payload: TurnPayload,
}

impl Turn {
    /// A system turn with text content.
    #[must_use]
    pub fn system(text: impl Into<String>) -> Self {
        Self {
            role: Role::System,
            payload: TurnPayload::Text(text.into()),
        }
    }

    /// A user turn with text content.
    #[must_use]
    pub fn user(text: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            payload: TurnPayload::Text(text.into()),
        }
    }

    /// An assistant turn with text content (a final answer).
    #[must_use]
    pub fn assistant(text: impl Into<String>) -> Self {
        Self {
            role: Role::Assistant,
            payload: TurnPayload::Text(text.into()),
        }
    }

    /// An assistant turn requesting a function invocation.
    #[must_use]
    pub fn function_call(call: FunctionCall) -> Self {
        Self {
            role: Role::Assistant,
            payload: TurnPayload::Call(call),
        }
    }

    /// A function turn carrying the named function's result.
    #[must_use]
    pub fn function_result(name: impl Into<String>, value: serde_json::Value) -> Self {
        Self {
            role: Role::Function,
            payload: TurnPayload::Result {
                name: name.into(),
                value,
            },
        }
    }

    /// The turn's role.
    #[must_use]
    pub fn role(&self) -> Role {
        self.role
    }

    /// The turn's payload.
    #[must_use]
    pub fn payload(&self) -> &TurnPayload {
        &self.payload
    }

    /// The text content, if this is a text turn.
    #[must_use]
    pub fn text(&self) -> Option<&str> {
        match &self.payload {
            TurnPayload::Text(text) => Some(text),
            _ => None,
        }
    }

    /// The function-call request, if this is a call turn.
    #[must_use]
    pub fn call(&self) -> Option<&FunctionCall> {
        match &self.payload {
            TurnPayload::Call(call) => Some(call),
            _ => None,
        }
    }
}

/// An ordered, append-only sequence of turns.
///
/// A conversation is exclusively owned by the caller that starts a
/// resolution run; the resolver appends turns, never rewrites or removes
/// them. The standing system instruction is not stored here — the
/// completion port receives it alongside the transcript on every call.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Conversation {
    turns: Vec<Turn>,
}

impl Conversation {
    /// An empty conversation.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// A conversation seeded with a single user turn.
    #[must_use]
    pub fn seeded(utterance: impl Into<String>) -> Self {
        Self {
            turns: vec![Turn::user(utterance)],
        }
    }

    /// Append a turn.
    pub fn push(&mut self, turn: Turn) {
        self.turns.push(turn);
    }

    /// All turns, in order.
    #[must_use]
    pub fn turns(&self) -> &[Turn] {
        &self.turns
    }

    /// The most recently appended turn.
    #[must_use]
    pub fn last(&self) -> Option<&Turn> {
        self.turns.last()
    }

    /// Number of turns.
    #[must_use]
    pub fn len(&self) -> usize {
        self.turns.len()
    }

    /// Whether the conversation has no turns.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.turns.is_empty()
    }
}

/// Declared metadata for one callable function, advertised to the model.
///
/// `parameters` is a JSON Schema value describing the argument shape;
/// authoring and validating that schema is out of scope here — it is
/// carried verbatim from the descriptor source to the model.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FunctionSignature {
    /// Unique function name.
    pub name: String,
    /// Natural-language description; informs the model's decision to call.
    pub description: String,
    /// JSON Schema for the arguments the model must supply.
    pub parameters: serde_json::Value,
}

/// Why the model stopped generating.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CompletionReason {
    /// Natural end — the proposed turn is a final answer.
    Stop,
    /// The model wants a function invoked.
    FunctionCall,
    /// Output was cut off by a length/token limit.
    LengthLimit,
    /// Any other reason (content filter, unrecognized tag, ...).
    Other,
}

/// A function-call request as it comes off the wire.
///
/// `arguments` is the raw JSON text the model produced. It stays
/// unparsed here: whether malformed arguments are retried or fatal is
/// the resolver's policy, not the port's.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawFunctionCall {
    /// Name of the requested function.
    pub name: String,
    /// Raw JSON argument text.
    pub arguments: String,
}

/// One proposed next turn from the completion port.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Completion {
    /// Why generation stopped.
    pub reason: CompletionReason,
    /// Text content, when the model produced any.
    pub content: Option<String>,
    /// The requested function call, when `reason` is `FunctionCall`.
    pub function_call: Option<RawFunctionCall>,
}

impl Completion {
    /// A normal final-answer completion.
    #[must_use]
    pub fn stop(text: impl Into<String>) -> Self {
        Self {
            reason: CompletionReason::Stop,
            content: Some(text.into()),
            function_call: None,
        }
    }

    /// A completion requesting a function invocation.
    #[must_use]
    pub fn function_call(name: impl Into<String>, arguments: impl Into<String>) -> Self {
        Self {
            reason: CompletionReason::FunctionCall,
            content: None,
            function_call: Some(RawFunctionCall {
                name: name.into(),
                arguments: arguments.into(),
            }),
        }
    }

    /// A completion truncated by a length limit.
    #[must_use]
    pub fn truncated() -> Self {
        Self {
            reason: CompletionReason::LengthLimit,
            content: None,
            function_call: None,
        }
    }
}
