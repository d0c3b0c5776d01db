//! Artifact identifiers
//!
//! An artifact is identified by its directory name under the images root
//! (e.g. `base`, `python-3.12`). Identifiers are opaque, case-sensitive
//! strings; equality is the only thing the graph needs, but they are also
//! totally ordered so every rendered collection can be sorted.

use serde::{Deserialize, Serialize};
use std::borrow::Borrow;
use std::fmt;

/// Identifier of a buildable artifact (an image directory name)
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ArtifactId(String);

impl ArtifactId {
    /// Creates an identifier from any string-like value
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Returns the identifier as a string slice
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ArtifactId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for ArtifactId {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}

impl From<String> for ArtifactId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl Borrow<str> for ArtifactId {
    fn borrow(&self) -> &str {
        &self.0
    }
}

impl AsRef<str> for ArtifactId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// Joins identifiers into a `, `-separated list for diagnostics
pub fn join_ids<'a>(ids: impl IntoIterator<Item = &'a ArtifactId>) -> String {
    ids.into_iter()
        .map(ArtifactId::as_str)
        .collect::<Vec<_>>()
        .join(", ")
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeSet;

    #[test]
    fn display_is_raw_name() {
        let id = ArtifactId::new("python-3.12");
        assert_eq!(id.to_string(), "python-3.12");
        assert_eq!(id.as_str(), "python-3.12");
    }

    #[test]
    fn identifiers_are_case_sensitive() {
        assert_ne!(ArtifactId::from("Base"), ArtifactId::from("base"));
    }

    #[test]
    fn ordering_is_lexicographic() {
        let ids: BTreeSet<ArtifactId> = ["node", "base", "Alpine", "base-dev"]
            .into_iter()
            .map(ArtifactId::from)
            .collect();
        let ordered: Vec<_> = ids.iter().map(|id| id.as_str()).collect();
        assert_eq!(ordered, vec!["Alpine", "base", "base-dev", "node"]);
    }

    #[test]
    fn borrow_allows_str_lookup() {
        let ids: BTreeSet<ArtifactId> = [ArtifactId::from("base")].into_iter().collect();
        assert!(ids.contains("base"));
        assert!(!ids.contains("node"));
    }

    #[test]
    fn serializes_as_plain_string() {
        let id = ArtifactId::from("base");
        assert_eq!(serde_json::to_string(&id).unwrap(), "\"base\"");

        let parsed: ArtifactId = serde_json::from_str("\"node\"").unwrap();
        assert_eq!(parsed, ArtifactId::from("node"));
    }

    #[test]
    fn join_ids_formats_list() {
        let ids = [ArtifactId::from("a"), ArtifactId::from("b")];
        assert_eq!(join_ids(&ids), "a, b");
        assert_eq!(join_ids(&[] as &[ArtifactId]), "");
    }
}
