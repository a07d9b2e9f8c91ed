//! Resident identity types.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Resident identifier as issued by the scheduling store.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ResidentId(pub String);

impl ResidentId {
    pub fn new(id: impl Into<String>) -> Self {
        ResidentId(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ResidentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for ResidentId {
    fn from(id: &str) -> Self {
        ResidentId(id.to_string())
    }
}

impl From<String> for ResidentId {
    fn from(id: String) -> Self {
        ResidentId(id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn resident_id_serializes_transparently() {
        let id = ResidentId::from("r-17");
        assert_eq!(serde_json::to_string(&id).unwrap(), "\"r-17\"");
        let back: ResidentId = serde_json::from_str("\"r-17\"").unwrap();
        assert_eq!(back, id);
        assert_eq!(id.to_string(), "r-17");
    }
}
