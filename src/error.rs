use thiserror::Error;

/// Errors surfaced by the decoding engine. All of them are synchronous:
/// a decode either completes or fails with one of these, never retries.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DecodeError {
    /// Lookup of a constant that was never defined.
    #[error("unknown constant `{name}`")]
    UnknownConstant { name: String },

    /// A width formula referenced a constant missing from the store.
    #[error("constant `{name}` required by a width formula is missing")]
    MissingConstant { name: String },

    /// Derived-constant recomputation did not reach a fixed point.
    #[error("constant dependencies did not converge after {passes} passes")]
    DependencyCycle { passes: usize },

    /// Slice bounds fell outside the input bit-string.
    #[error("bit range {}..{} out of bounds for {len}-bit value", .offset, .offset + .width)]
    OutOfRange {
        offset: usize,
        width: usize,
        len: usize,
    },

    /// A character other than '0'/'1' where a bit was required.
    #[error("invalid bit character {found:?} at offset {offset}")]
    InvalidBit { found: char, offset: usize },

    /// Input length differs from the schema width.
    #[error("{what}: expected {expected} bits, got {got}")]
    WidthMismatch {
        what: &'static str,
        expected: usize,
        got: usize,
    },

    /// Array input length is not a whole number of entries.
    #[error("{what}: {got} bits is not a multiple of the {entry}-bit entry width")]
    RaggedArray {
        what: &'static str,
        entry: usize,
        got: usize,
    },

    /// Signal-tree path lookup failed.
    #[error("signal `{path}` not found")]
    SignalNotFound { path: String },

    /// Path resolved to a scope where a value signal was expected.
    #[error("signal `{path}` is a scope, expected a value")]
    ExpectedLeaf { path: String },

    /// Path resolved to a value signal where a scope was expected.
    #[error("signal `{path}` is a value, expected a scope")]
    ExpectedScope { path: String },
}

impl DecodeError {
    pub fn unknown_constant(name: &str) -> Self {
        DecodeError::UnknownConstant {
            name: name.to_string(),
        }
    }

    pub fn missing_constant(name: &str) -> Self {
        DecodeError::MissingConstant {
            name: name.to_string(),
        }
    }

    pub fn signal_not_found(path: &str) -> Self {
        DecodeError::SignalNotFound {
            path: path.to_string(),
        }
    }
}

pub type Result<T> = std::result::Result<T, DecodeError>;
