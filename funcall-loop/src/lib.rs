#![doc = include_str!("../README.md")]

mod config;
mod resolver;
mod trace;

pub use config::{FunctionFailurePolicy, ResolverConfig, UnknownFunctionPolicy};
pub use resolver::{FunctionResolver, Resolution, UNABLE_TO_ANSWER};
pub use trace::{BoxedTraceSink, NullTraceSink, TraceSink, TracingSink};
