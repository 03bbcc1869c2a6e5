#![doc = include_str!("../README.md")]

mod catalog;
mod descriptor;

pub use catalog::{BoxedFunctionImpl, FunctionCatalog};
pub use descriptor::{load_signatures, parse_signatures};
