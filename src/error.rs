//! Typed error kinds for the loaders and the circuit builder.
//!
//! These are the only errors allowed to stop circuit construction before any
//! party communication happens. Everything else (CLI errors, transport
//! errors) is carried as [`anyhow::Error`] with context, following the rest
//! of the crate.

use thiserror::Error;

/// Fatal, typed errors raised by the loaders and the circuit builder.
///
/// None of these are ever raised for a semantic "no match" — that case
/// returns the public constant 0 wire, not an error.
#[derive(Debug, Error)]
pub enum EngineError {
    /// A wire bundle did not have the bit width an operation required.
    #[error("shape mismatch: expected {expected} bits, found {found} bits ({context})")]
    ShapeMismatch {
        /// Expected bit width.
        expected: usize,
        /// Bit width actually observed.
        found: usize,
        /// Where this was noticed, for diagnosis.
        context: String,
    },

    /// A keyword's `bucket_size` did not appear in the public bucket scheme.
    #[error("bucket size {bucket_size} is not in the bucket scheme {scheme:?}")]
    InvalidBucketScheme {
        /// The offending bucket size.
        bucket_size: usize,
        /// The public bucket scheme it was checked against.
        scheme: Vec<usize>,
    },

    /// An unrecognised `--search-mode` string, or a mode mismatched with its inputs.
    #[error("invalid search mode: {0}")]
    InvalidSearchMode(String),

    /// A structured share file (query/mail/index) was malformed.
    #[error("malformed share file {path}: {reason}")]
    MalformedShareFile {
        /// Path to the offending file.
        path: String,
        /// Human-readable reason.
        reason: String,
    },

    /// A share blob was not valid Base64. Tolerating this would make the
    /// decoding party build a different number of `Input` gates than its
    /// peers for the same logical value, desynchronising circuit shape
    /// across the whole party mesh — so it is always fatal.
    #[error("invalid base64 share encoding: {reason}")]
    InvalidShareEncoding {
        /// The underlying decode error, as text.
        reason: String,
    },
}
