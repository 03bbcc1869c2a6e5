#![doc = include_str!("../README.md")]

pub mod client;
pub(crate) mod error;
pub(crate) mod mapping;

pub use client::OpenAi;

// Re-export the boundary types for convenience
pub use funcall_types::{Completion, CompletionError, CompletionPort, CompletionReason};
