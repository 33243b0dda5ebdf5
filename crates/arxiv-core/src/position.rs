// # Position Codec
//
// A position is the externally persisted form of the pagination offset. The
// token is the decimal string of the offset; anything that does not parse as
// a non-negative integer (including the empty token) means "start of stream".

use serde::{Deserialize, Serialize};
use std::fmt;

/// Opaque, resumable position token
///
/// Callers should treat the contents as opaque: persist it after processing a
/// record and hand it back to [`PollingEngine::open()`](crate::PollingEngine::open)
/// to resume.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Position(String);

impl Position {
    /// Wrap a raw token as received from a caller
    pub fn new(token: impl Into<String>) -> Self {
        Self(token.into())
    }

    /// Position for the given offset
    pub fn from_offset(offset: u64) -> Self {
        encode(offset)
    }

    /// The offset this position resumes from
    pub fn offset(&self) -> u64 {
        decode(self)
    }

    /// Raw token
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Whether this is the empty token
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for Position {
    fn from(token: &str) -> Self {
        Self::new(token)
    }
}

impl From<String> for Position {
    fn from(token: String) -> Self {
        Self(token)
    }
}

/// Encode an offset as a position token
pub fn encode(offset: u64) -> Position {
    Position(offset.to_string())
}

/// Decode a position token into an offset
///
/// Never fails: empty or non-numeric tokens decode to 0.
pub fn decode(position: &Position) -> u64 {
    position.0.parse().unwrap_or(0)
}
