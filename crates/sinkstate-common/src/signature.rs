//! Record signature helpers
//!
//! A record identifier must be stable across reruns of the same ETL so that
//! the state store recognises a record it has already seen. Sinks usually
//! derive it from a handful of business fields, e.g. the click id, the
//! conversion name and the conversion time of an offline conversion.

use crate::error::{CommonError, Result};

/// Separator placed between the parts of a record signature.
pub const SIGNATURE_SEPARATOR: &str = "||";

/// Join business fields into a record identifier.
///
/// Fails when no parts are given, when a part is empty, when a part contains
/// [`SIGNATURE_SEPARATOR`], or when it starts or ends with `|`. With those
/// rules every `||` in the result is a boundary, so distinct field lists never
/// produce the same identifier.
pub fn record_signature(parts: &[&str]) -> Result<String> {
    if parts.is_empty() {
        return Err(CommonError::InvalidSignature(
            "at least one field is required".to_string(),
        ));
    }

    for (index, part) in parts.iter().enumerate() {
        if part.trim().is_empty() {
            return Err(CommonError::InvalidSignature(format!(
                "field {} is empty",
                index
            )));
        }
        if part.contains(SIGNATURE_SEPARATOR) {
            return Err(CommonError::InvalidSignature(format!(
                "field {} contains the separator '{}'",
                index, SIGNATURE_SEPARATOR
            )));
        }
        if part.starts_with('|') || part.ends_with('|') {
            return Err(CommonError::InvalidSignature(format!(
                "field {} starts or ends with '|'",
                index
            )));
        }
    }

    Ok(parts.join(SIGNATURE_SEPARATOR))
}
