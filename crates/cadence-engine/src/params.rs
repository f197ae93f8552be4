//! Immutable tunable-parameter records.
//!
//! A params record is plain configuration data (speeds, heights, cooldowns)
//! loaded once from JSON, validated, and shared read-only between modules as
//! an `Arc<P>`. Records go into a [`Dependencies`] registry so module
//! factories can take them with [`Resolver::require_valid`].
//!
//! ```
//! use cadence_engine::params::{load_params_str, ParamsRecord};
//! use cadence_engine::prelude::Validate;
//!
//! #[derive(Debug, serde::Serialize, serde::Deserialize)]
//! struct JumpParams { height: f64 }
//!
//! impl Validate for JumpParams {
//!     fn validate(&self) -> Result<(), String> {
//!         if self.height > 0.0 { Ok(()) } else { Err("height must be positive".into()) }
//!     }
//! }
//!
//! impl ParamsRecord for JumpParams {
//!     const KIND: &'static str = "jump";
//! }
//!
//! let params = load_params_str::<JumpParams>(r#"{ "height": 2.0 }"#).unwrap();
//! assert_eq!(params.height, 2.0);
//! ```
//!
//! [`Dependencies`]: cadence_core::dependencies::Dependencies
//! [`Resolver::require_valid`]: cadence_core::dependencies::Resolver::require_valid

use std::path::{Path, PathBuf};
use std::sync::Arc;

use cadence_core::dependencies::Validate;
use serde::de::DeserializeOwned;
use serde::Serialize;

// ---------------------------------------------------------------------------
// ParamsRecord
// ---------------------------------------------------------------------------

/// A validated, serializable configuration record.
pub trait ParamsRecord: DeserializeOwned + Serialize + Validate {
    /// Short label used in errors and logs (e.g. `"movement"`).
    const KIND: &'static str;
}

// ---------------------------------------------------------------------------
// ParamsError
// ---------------------------------------------------------------------------

/// Errors produced while loading a params record.
#[derive(Debug, thiserror::Error)]
pub enum ParamsError {
    /// The file could not be read.
    #[error("failed to read {kind} params from {path:?}: {source}")]
    Io {
        kind: &'static str,
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The JSON did not match the record's shape.
    #[error("failed to parse {kind} params: {source}")]
    Parse {
        kind: &'static str,
        #[source]
        source: serde_json::Error,
    },

    /// The record could not be written back out.
    #[error("failed to serialize {kind} params: {source}")]
    Serialize {
        kind: &'static str,
        #[source]
        source: serde_json::Error,
    },

    /// The record parsed but failed validation.
    #[error("invalid {kind} params: {reason}")]
    Invalid { kind: &'static str, reason: String },
}

// ---------------------------------------------------------------------------
// Loading
// ---------------------------------------------------------------------------

/// Parse and validate a record from a JSON string.
pub fn load_params_str<P: ParamsRecord>(json: &str) -> Result<Arc<P>, ParamsError> {
    let record: P = serde_json::from_str(json).map_err(|source| ParamsError::Parse {
        kind: P::KIND,
        source,
    })?;
    record.validate().map_err(|reason| ParamsError::Invalid {
        kind: P::KIND,
        reason,
    })?;
    tracing::debug!(kind = P::KIND, "params record loaded");
    Ok(Arc::new(record))
}

/// Read, parse and validate a record from a JSON file.
pub fn load_params_file<P: ParamsRecord>(path: impl AsRef<Path>) -> Result<Arc<P>, ParamsError> {
    let path = path.as_ref();
    let json = std::fs::read_to_string(path).map_err(|source| ParamsError::Io {
        kind: P::KIND,
        path: path.to_path_buf(),
        source,
    })?;
    load_params_str(&json)
}

/// Serialize a record to pretty-printed JSON.
pub fn params_to_json<P: ParamsRecord>(record: &P) -> Result<String, ParamsError> {
    serde_json::to_string_pretty(record).map_err(|source| ParamsError::Serialize {
        kind: P::KIND,
        source,
    })
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
