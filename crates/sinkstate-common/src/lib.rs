//! SinkState Common Library
#![deny(clippy::unwrap_used, clippy::expect_used)]
//!
//! Shared utilities used by every SinkState workspace member.
//!
//! # Overview
//!
//! - **Error Handling**: [`CommonError`] and the crate [`Result`] alias
//! - **Logging**: centralized `tracing` setup driven by environment variables
//! - **Signatures**: helpers for building record identifiers from business fields
//!
//! # Example
//!
//! ```no_run
//! use sinkstate_common::signature::record_signature;
//!
//! let id = record_signature(&["gclid-123", "purchase", "2024-01-18 10:00:00"]).unwrap();
//! assert_eq!(id, "gclid-123||purchase||2024-01-18 10:00:00");
//! ```

pub mod error;
pub mod logging;
pub mod signature;

// Re-export commonly used types
pub use error::{CommonError, Result};
pub use signature::{record_signature, SIGNATURE_SEPARATOR};
