use serde::{Serialize, Serializer};
use std::fmt;

/// Identifier handed back on a 500.
///
/// It is the only detail a client gets; the matching `warn` log line carries
/// the same id and the full error chain.
#[derive(Clone, Copy, Eq, PartialEq, Hash, Debug)]
pub struct CorrelationId(ulid::Ulid);

impl CorrelationId {
    /// A fresh, time-ordered id.
    #[must_use]
    pub fn generate() -> Self {
        Self(ulid::Ulid::new())
    }
}

impl fmt::Display for CorrelationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.0, f)
    }
}

impl Serialize for CorrelationId {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}
