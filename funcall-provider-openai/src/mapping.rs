//! Request/response mapping between funcall types and the chat
//! completions API format (`functions` / `function_call` wire shape).
//!
//! Reference: <https://platform.openai.com/docs/api-reference/chat>

use funcall_types::{
    Completion, CompletionError, CompletionReason, Conversation, FunctionSignature,
    RawFunctionCall, Role, Turn, TurnPayload,
};

// ─── Request mapping ─────────────────────────────────────────────────────────

/// Build the chat completions API JSON body for one completion request.
///
/// The standing system instruction always goes first, followed by the
/// transcript, with the signatures as the `functions` array.
#[must_use]
pub(crate) fn to_api_request(
    conversation: &Conversation,
    system: &str,
    signatures: &[FunctionSignature],
    model: &str,
) -> serde_json::Value {
    let mut messages = Vec::with_capacity(conversation.len() + 1);
    messages.push(serde_json::json!({
        "role": "system",
        "content": system,
    }));
    messages.extend(conversation.turns().iter().map(map_turn));

    let mut body = serde_json::json!({
        "model": model,
        "messages": messages,
    });

    if !signatures.is_empty() {
        body["functions"] =
            serde_json::Value::Array(signatures.iter().map(map_signature).collect());
    }

    body
}

/// Map one [`Turn`] to its wire message.
fn map_turn(turn: &Turn) -> serde_json::Value {
    match turn.payload() {
        TurnPayload::Text(text) => serde_json::json!({
            "role": role_str(turn.role()),
            "content": text,
        }),
        // The API wants arguments re-embedded as JSON text inside the
        // string-typed `arguments` property.
        TurnPayload::Call(call) => serde_json::json!({
            "role": "assistant",
            "content": serde_json::Value::Null,
            "function_call": {
                "name": call.name,
                "arguments": call.arguments.to_string(),
            },
        }),
        TurnPayload::Result { name, value } => serde_json::json!({
            "role": "function",
            "name": name,
            "content": value.to_string(),
        }),
    }
}

fn role_str(role: Role) -> &'static str {
    match role {
        Role::System => "system",
        Role::User => "user",
        Role::Assistant => "assistant",
        Role::Function => "function",
    }
}

/// Map a [`FunctionSignature`] to a `functions` array entry.
fn map_signature(signature: &FunctionSignature) -> serde_json::Value {
    serde_json::json!({
        "name": signature.name,
        "description": signature.description,
        "parameters": signature.parameters,
    })
}

// ─── Response mapping ────────────────────────────────────────────────────────

/// Parse a chat completions API response body into a [`Completion`].
pub(crate) fn from_api_response(body: &serde_json::Value) -> Result<Completion, CompletionError> {
    let choice = body["choices"]
        .as_array()
        .and_then(|arr| arr.first())
        .ok_or_else(|| {
            CompletionError::InvalidRequest("missing 'choices' array in response".into())
        })?;

    let message = &choice["message"];
    let content = message["content"].as_str().map(str::to_string);

    // Arguments stay as raw JSON text: whether malformed text is
    // retried or fatal is the resolver's call, not ours.
    let function_call = message["function_call"].as_object().map(|fc| RawFunctionCall {
        name: fc
            .get("name")
            .and_then(serde_json::Value::as_str)
            .unwrap_or_default()
            .to_string(),
        arguments: fc
            .get("arguments")
            .and_then(serde_json::Value::as_str)
            .unwrap_or("{}")
            .to_string(),
    });

    let reason = choice["finish_reason"]
        .as_str()
        .map(parse_finish_reason)
        .unwrap_or(CompletionReason::Other);

    Ok(Completion {
        reason,
        content,
        function_call,
    })
}

/// Map a `finish_reason` string to a [`CompletionReason`].
fn parse_finish_reason(reason: &str) -> CompletionReason {
    match reason {
        "stop" => CompletionReason::Stop,
        "function_call" => CompletionReason::FunctionCall,
        "length" => CompletionReason::LengthLimit,
        _ => CompletionReason::Other,
    }
}

// ─── Tests ───────────────────────────────────────────────────────────────────
