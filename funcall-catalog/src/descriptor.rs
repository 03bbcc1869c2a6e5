//! Loading function signatures from a JSON descriptor file.
//!
//! The descriptor source is a JSON array of records:
//!
//! ```json
//! [
//!   {
//!     "name": "get_weather",
//!     "description": "Current weather for a city",
//!     "parameters": { "type": "object", "properties": { ... } }
//!   }
//! ]
//! ```
//!
//! Records convert 1:1 into [`FunctionSignature`] entries. Loading
//! happens once at startup; any failure here is startup-fatal.

use std::collections::HashSet;
use std::path::Path;

use funcall_types::{DescriptorError, FunctionSignature};

/// Load function signatures from a descriptor file.
///
/// # Errors
///
/// [`DescriptorError::Io`] if the file cannot be read, otherwise the
/// errors of [`parse_signatures`].
pub fn load_signatures(path: impl AsRef<Path>) -> Result<Vec<FunctionSignature>, DescriptorError> {
    let text = std::fs::read_to_string(path)?;
    parse_signatures(&text)
}

/// Parse function signatures from descriptor JSON text.
///
/// # Errors
///
/// [`DescriptorError::Parse`] if the text is not a JSON array of
/// descriptor records, [`DescriptorError::InvalidRecord`] for an empty
/// name, a non-object parameters schema, or a duplicate name.
pub fn parse_signatures(text: &str) -> Result<Vec<FunctionSignature>, DescriptorError> {
    let records: Vec<FunctionSignature> = serde_json::from_str(text)?;

    let mut seen = HashSet::new();
    for record in &records {
        if record.name.is_empty() {
            return Err(DescriptorError::InvalidRecord(
                "descriptor record has an empty name".into(),
            ));
        }
        if !record.parameters.is_object() {
            return Err(DescriptorError::InvalidRecord(format!(
                "parameters for '{}' must be a JSON Schema object",
                record.name
            )));
        }
        if !seen.insert(record.name.as_str()) {
            return Err(DescriptorError::InvalidRecord(format!(
                "duplicate function name '{}'",
                record.name
            )));
        }
    }

    tracing::debug!(count = records.len(), "loaded function descriptors");
    Ok(records)
}
