//! Bounded-depth ancestor chains
//!
//! Given a member's materialized path, produce the ancestors nearest-first
//! with the bonus percentage each one earns on a descendant's purchase.

use crate::error::ReferralError;
use crate::path::HierarchyPath;
use crate::policy::BonusPolicy;
use rust_decimal::Decimal;

/// One ancestor entitled to a bounty.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AncestorShare {
    pub referrer_id: String,
    /// 1 = direct sponsor, 2 = sponsor's sponsor, ...
    pub level: usize,
    pub bonus_percent: Decimal,
}

/// Resolve the bounty-earning ancestors of `self_id`, nearest first,
/// truncated to the policy's depth.
///
/// Fails with `InvalidHierarchy` if `self_id` does not appear in the path,
/// which only happens when the stored path is corrupt.
pub fn build_chain(
    path: &HierarchyPath,
    self_id: &str,
    policy: &BonusPolicy,
) -> Result<Vec<AncestorShare>, ReferralError> {
    let position = path
        .position_of(self_id)
        .ok_or_else(|| ReferralError::InvalidHierarchy {
            member_id: self_id.to_string(),
            reason: "member not present in own hierarchy path",
        })?;

    let shares = path.ids()[..position]
        .iter()
        .rev()
        .enumerate()
        .map_while(|(i, id)| {
            let level = i + 1;
            policy.bonus_percent(level).map(|bonus_percent| AncestorShare {
                referrer_id: id.clone(),
                level,
                bonus_percent,
            })
        })
        .collect();

    Ok(shares)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn chain_of(len: usize) -> HierarchyPath {
        let raw: Vec<String> = (0..len).map(|i| format!("MBR-{i}")).collect();
        HierarchyPath::parse(&raw.join("/")).unwrap()
    }

    #[test]
    fn test_nearest_ancestor_is_level_one() {
        let path = HierarchyPath::parse("MBR-A/MBR-B/MBR-C").unwrap();
        let shares = build_chain(&path, "MBR-C", &BonusPolicy::standard()).unwrap();

        assert_eq!(shares.len(), 2);
        assert_eq!(shares[0].referrer_id, "MBR-B");
        assert_eq!(shares[0].level, 1);
        assert_eq!(shares[0].bonus_percent, dec!(10));
        assert_eq!(shares[1].referrer_id, "MBR-A");
        assert_eq!(shares[1].level, 2);
        assert_eq!(shares[1].bonus_percent, dec!(2));
    }

    #[test]
    fn test_fifteen_ancestors_truncate_to_ten() {
        // 16 members: MBR-15 has 15 ancestors, only 10 receive a bounty.
        let path = chain_of(16);
        let shares = build_chain(&path, "MBR-15", &BonusPolicy::standard()).unwrap();

        assert_eq!(shares.len(), 10);
        assert_eq!(shares[0].referrer_id, "MBR-14");
        assert_eq!(shares[9].referrer_id, "MBR-5");
        assert_eq!(shares[9].level, 10);
        // MBR-0 through MBR-4 are beyond the bounty depth.
        assert!(shares.iter().all(|s| s.referrer_id != "MBR-4"));
    }

    #[test]
    fn test_root_member_has_no_ancestors() {
        let path = HierarchyPath::root("MBR-A");
        let shares = build_chain(&path, "MBR-A", &BonusPolicy::standard()).unwrap();
        assert!(shares.is_empty());
    }

    #[test]
    fn test_missing_self_is_corrupt() {
        let path = HierarchyPath::parse("MBR-A/MBR-B").unwrap();
        let result = build_chain(&path, "MBR-Z", &BonusPolicy::standard());
        assert!(matches!(result, Err(ReferralError::InvalidHierarchy { .. })));
    }
}
