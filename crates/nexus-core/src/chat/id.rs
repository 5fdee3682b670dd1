//! Session identifiers.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::clock;

/// Opaque, time-ordered session identifier.
///
/// Derived from a monotonic millisecond clock reading, so identifiers sort by
/// creation recency and two calls never collide even within one millisecond.
/// Serialized as a decimal string for storage compatibility.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(into = "String", try_from = "String")]
pub struct SessionId(u64);

impl SessionId {
    /// Allocates a new identifier strictly greater than any previous one.
    pub fn generate() -> Self {
        Self(clock::monotonic_millis())
    }

    /// The raw millisecond reading this identifier was minted from.
    pub fn as_millis(&self) -> u64 {
        self.0
    }
}

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for SessionId {
    type Err = std::num::ParseIntError;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        Ok(Self(s.parse()?))
    }
}

impl From<SessionId> for String {
    fn from(id: SessionId) -> Self {
        id.to_string()
    }
}

impl TryFrom<String> for SessionId {
    type Error = String;

    fn try_from(value: String) -> std::result::Result<Self, Self::Error> {
        value
            .parse()
            .map_err(|e| format!("invalid session id '{}': {}", value, e))
    }
}
