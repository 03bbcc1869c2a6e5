//! Console front-end for the work-orders demo.
//!
//! Reads `OPENAI_API_KEY` (and optionally `FUNCALL_MODEL` /
//! `FUNCALL_BASE_URL`), resolves one question against the mock
//! work-order catalog, and prints the final answer.

use std::sync::Arc;

use funcall_loop::{FunctionResolver, ResolverConfig, TracingSink};
use funcall_provider_openai::OpenAi;

const DEFAULT_QUESTION: &str = "what are the 'in progress' work orders for account 01234?";

const SYSTEM_INSTRUCTION: &str = "Don't make assumptions about what values to plug into \
     functions. Ask for clarification if a user request is ambiguous.";

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt::init();

    let api_key = std::env::var("OPENAI_API_KEY")
        .map_err(|_| "OPENAI_API_KEY is not set")?;

    let mut port = OpenAi::new(api_key);
    if let Ok(model) = std::env::var("FUNCALL_MODEL") {
        port = port.model(model);
    }
    if let Ok(base_url) = std::env::var("FUNCALL_BASE_URL") {
        port = port.base_url(base_url);
    }

    let config = ResolverConfig::default().with_system_instruction(SYSTEM_INSTRUCTION);
    let mut resolver =
        FunctionResolver::new(port, Arc::new(funcall_workorders::catalog()), config);
    resolver.set_trace_sink(TracingSink);

    let question = std::env::args()
        .nth(1)
        .unwrap_or_else(|| DEFAULT_QUESTION.to_string());

    let resolution = resolver.run(&question).await?;
    println!("{}", resolution.answer);
    Ok(())
}
