//! Incident identifiers
//!
//! An [`IncidentId`] is the opaque key the portal assigns to one crash report.
//! It links the crash, vehicle and injury records of that report together.

use std::fmt;

/// Stable identifier of one crash report at the source
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct IncidentId(String);

impl IncidentId {
    /// Creates an identifier from raw text, trimming surrounding whitespace
    ///
    /// Returns `None` when nothing is left after trimming.
    pub fn new(raw: impl AsRef<str>) -> Option<Self> {
        let trimmed = raw.as_ref().trim();
        if trimmed.is_empty() {
            None
        } else {
            Some(Self(trimmed.to_string()))
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for IncidentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for IncidentId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}
