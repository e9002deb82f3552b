//! Codec error types.

use std::num::ParseIntError;

use thiserror::Error;

/// Why a new-range line could not be turned into bounds.
///
/// Never escapes [`crate::decode`]: a malformed range is reported as
/// [`crate::ProtocolEvent::Unrecognized`] instead.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RangeParseError {
    /// Line does not contain the new-range marker at all.
    #[error("missing new-range marker")]
    MissingMarker,

    /// Text after the marker did not split into exactly two bounds.
    #[error("expected two bounds separated by '-', found {found} part(s)")]
    BoundCount {
        /// Number of `-`-separated parts found.
        found: usize,
    },

    /// A bound was not an integer.
    #[error("invalid bound {text:?}: {source}")]
    InvalidBound {
        /// Offending text after trimming.
        text: String,
        /// Underlying integer parse failure.
        #[source]
        source: ParseIntError,
    },
}
