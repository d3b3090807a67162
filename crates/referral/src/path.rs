//! Materialized hierarchy paths
//!
//! Each member stores the full chain of member IDs from the root of their
//! referral tree down to themselves, materialized at registration time and
//! immutable afterwards. The delimited-string form exists only at the
//! storage boundary; everything else works with the parsed list.

use crate::error::ReferralError;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Separator used in the stored string form.
const SEPARATOR: char = '/';

/// An ordered chain of member IDs, root first, ending with the member the
/// path belongs to.
///
/// # Invariant
/// The chain contains no duplicate IDs (and therefore no cycles).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HierarchyPath(Vec<String>);

impl HierarchyPath {
    /// Path of a root member (registered without a sponsor).
    pub fn root(member_id: &str) -> Self {
        Self(vec![member_id.to_string()])
    }

    /// Build a new member's path by appending them to their sponsor's path.
    ///
    /// Fails if the new member already appears in the sponsor's chain,
    /// which would introduce a cycle.
    pub fn child_of(sponsor_path: &HierarchyPath, member_id: &str) -> Result<Self, ReferralError> {
        if sponsor_path.0.iter().any(|id| id == member_id) {
            return Err(ReferralError::InvalidHierarchy {
                member_id: member_id.to_string(),
                reason: "member already present in sponsor chain",
            });
        }
        let mut ids = sponsor_path.0.clone();
        ids.push(member_id.to_string());
        Ok(Self(ids))
    }

    /// Parse the stored string form, validating the no-duplicates invariant.
    pub fn parse(raw: &str) -> Result<Self, ReferralError> {
        let ids: Vec<String> = raw
            .split(SEPARATOR)
            .filter(|s| !s.is_empty())
            .map(str::to_string)
            .collect();

        if ids.is_empty() {
            return Err(ReferralError::InvalidHierarchy {
                member_id: String::new(),
                reason: "empty hierarchy path",
            });
        }
        for (i, id) in ids.iter().enumerate() {
            if ids[..i].contains(id) {
                return Err(ReferralError::InvalidHierarchy {
                    member_id: id.clone(),
                    reason: "duplicate member in hierarchy path",
                });
            }
        }
        Ok(Self(ids))
    }

    /// Serialize back to the stored string form.
    pub fn to_storage(&self) -> String {
        self.0.join(&SEPARATOR.to_string())
    }

    /// The member this path belongs to (last element).
    pub fn member_id(&self) -> &str {
        self.0.last().map(String::as_str).unwrap_or("")
    }

    /// Position of a member within the chain, root first.
    pub fn position_of(&self, member_id: &str) -> Option<usize> {
        self.0.iter().position(|id| id == member_id)
    }

    /// IDs in the chain, root first.
    pub fn ids(&self) -> &[String] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl fmt::Display for HierarchyPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_storage())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_root_path() {
        let path = HierarchyPath::root("MBR-A");
        assert_eq!(path.member_id(), "MBR-A");
        assert_eq!(path.to_storage(), "MBR-A");
    }

    #[test]
    fn test_child_of_appends() {
        let root = HierarchyPath::root("MBR-A");
        let child = HierarchyPath::child_of(&root, "MBR-B").unwrap();
        let grandchild = HierarchyPath::child_of(&child, "MBR-C").unwrap();

        assert_eq!(grandchild.to_storage(), "MBR-A/MBR-B/MBR-C");
        assert_eq!(grandchild.member_id(), "MBR-C");
    }

    #[test]
    fn test_child_of_rejects_cycle() {
        let root = HierarchyPath::root("MBR-A");
        let child = HierarchyPath::child_of(&root, "MBR-B").unwrap();

        let result = HierarchyPath::child_of(&child, "MBR-A");
        assert!(matches!(result, Err(ReferralError::InvalidHierarchy { .. })));
    }

    #[test]
    fn test_parse_roundtrip() {
        let path = HierarchyPath::parse("MBR-A/MBR-B/MBR-C").unwrap();
        assert_eq!(path.len(), 3);
        assert_eq!(path.to_storage(), "MBR-A/MBR-B/MBR-C");
    }

    #[test]
    fn test_parse_rejects_duplicates() {
        let result = HierarchyPath::parse("MBR-A/MBR-B/MBR-A");
        assert!(matches!(result, Err(ReferralError::InvalidHierarchy { .. })));
    }

    #[test]
    fn test_parse_rejects_empty() {
        assert!(HierarchyPath::parse("").is_err());
    }
}
