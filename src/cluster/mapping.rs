//! Cluster-wide view of live and desired replica groups, and the quorum
//! rule that gates every scale-down.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use tracing::warn;

use super::group::ReplicaGroup;

/// Fewest voters the search cluster may be left with.
pub const MIN_QUORUM: i32 = 3;

/// The expected voter total must exceed the live total divided by this.
pub const MAJORITY_DENOMINATOR: i32 = 2;

/// QuorumPolicy holds the operational limits of the managed search engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct QuorumPolicy {
    pub min_quorum: i32,
    pub majority_denominator: i32,
}

impl Default for QuorumPolicy {
    fn default() -> Self {
        QuorumPolicy {
            min_quorum: MIN_QUORUM,
            majority_denominator: MAJORITY_DENOMINATOR,
        }
    }
}

impl QuorumPolicy {
    /// Reports whether `expected` voters are more than the allowed share of
    /// `existing` voters.
    pub fn retains_majority(&self, expected: i64, existing: i64) -> bool {
        expected.saturating_mul(i64::from(self.majority_denominator)) > existing
    }
}

/// ClusterMapping indexes live and desired groups by name and totals their
/// replicas: ready replicas on the live side, desired replicas on the other.
/// Totals are kept in i64 since per-group counts are i32.
///
/// A name listed twice on one side counts once; the first entry wins.
#[derive(Debug)]
pub struct ClusterMapping<'a, G: ReplicaGroup> {
    existing: GroupIndex<'a, G>,
    expected: GroupIndex<'a, G>,
    existing_size: i64,
    expected_size: i64,
}

/// Groups of one side, unique by name, in input order.
#[derive(Debug)]
struct GroupIndex<'a, G> {
    by_name: HashMap<&'a str, &'a G>,
    ordered: Vec<&'a G>,
}

impl<'a, G: ReplicaGroup> GroupIndex<'a, G> {
    fn new(side: &'static str, groups: &'a [G]) -> Self {
        let mut index = GroupIndex {
            by_name: HashMap::with_capacity(groups.len()),
            ordered: Vec::with_capacity(groups.len()),
        };
        for group in groups {
            let name = group.group_name();
            if index.by_name.contains_key(name) {
                warn!(side, group = name, "duplicate replica group name, keeping the first");
                continue;
            }
            index.by_name.insert(name, group);
            index.ordered.push(group);
        }
        index
    }

    fn get(&self, name: &str) -> Option<&'a G> {
        self.by_name.get(name).copied()
    }

    fn len(&self) -> usize {
        self.ordered.len()
    }

    fn total(&self, replicas: impl Fn(&G) -> i32) -> i64 {
        self.ordered.iter().map(|&g| i64::from(replicas(g))).sum()
    }
}

impl<'a, G: ReplicaGroup> ClusterMapping<'a, G> {
    pub fn new(existing: &'a [G], expected: &'a [G]) -> Self {
        let existing = GroupIndex::new("existing", existing);
        let expected = GroupIndex::new("expected", expected);
        ClusterMapping {
            existing_size: existing.total(G::ready_replicas),
            expected_size: expected.total(G::desired_replicas),
            existing,
            expected,
        }
    }

    /// Live groups, one per name, in input order.
    pub fn existing_groups(&self) -> impl Iterator<Item = &'a G> + '_ {
        self.existing.ordered.iter().copied()
    }

    /// Desired groups, one per name, in input order.
    pub fn expected_groups(&self) -> impl Iterator<Item = &'a G> + '_ {
        self.expected.ordered.iter().copied()
    }

    pub fn existing(&self, name: &str) -> Option<&'a G> {
        self.existing.get(name)
    }

    pub fn expected(&self, name: &str) -> Option<&'a G> {
        self.expected.get(name)
    }

    pub fn existing_size(&self) -> i64 {
        self.existing_size
    }

    pub fn expected_size(&self) -> i64 {
        self.expected_size
    }

    /// A cluster exists once at least one replica is ready.
    pub fn has_existing_cluster(&self) -> bool {
        self.existing_size > 0
    }

    /// A lone voter cannot roll; it is bounced in place.
    pub fn bounce_nodes(&self) -> bool {
        self.existing_size == 1
    }

    /// One live group with one ready voter, still named by the desired set.
    pub fn is_single_voter(&self) -> bool {
        if self.existing.len() != 1 || self.existing_size != 1 {
            return false;
        }
        self.existing_groups()
            .all(|g| self.expected.get(g.group_name()).is_some())
    }

    /// Reports whether groups may be updated or removed this pass.
    ///
    /// Full teardown is always allowed, and so is any change to a single
    /// voter. Otherwise the expected total must stay at or above the quorum
    /// floor and keep more than the allowed share of the live voters.
    pub fn is_scale_down_allowed(&self, policy: &QuorumPolicy) -> bool {
        if self.expected_size == 0 || self.is_single_voter() {
            return true;
        }
        self.expected_size >= i64::from(policy.min_quorum)
            && policy.retains_majority(self.expected_size, self.existing_size)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Group {
        name: &'static str,
        desired: i32,
        ready: i32,
    }

    impl ReplicaGroup for Group {
        fn group_name(&self) -> &str {
            self.name
        }

        fn desired_replicas(&self) -> i32 {
            self.desired
        }

        fn ready_replicas(&self) -> i32 {
            self.ready
        }
    }

    fn g(name: &'static str, desired: i32, ready: i32) -> Group {
        Group { name, desired, ready }
    }

    fn allowed(existing: &[Group], expected: &[Group]) -> bool {
        ClusterMapping::new(existing, expected).is_scale_down_allowed(&QuorumPolicy::default())
    }

    #[test]
    fn test_sizes() {
        let existing = [g("a", 3, 2), g("b", 2, 2)];
        let expected = [g("a", 3, 0), g("c", 5, 0)];
        let mapping = ClusterMapping::new(&existing, &expected);
        assert_eq!(mapping.existing_size(), 4);
        assert_eq!(mapping.expected_size(), 8);
        assert!(mapping.existing("b").is_some());
        assert!(mapping.expected("b").is_none());
        assert!(mapping.has_existing_cluster());
        assert!(!mapping.bounce_nodes());
    }

    #[test]
    fn test_duplicate_names_count_once() {
        let existing = [g("a", 3, 3)];
        let expected = [g("a", 3, 0), g("b", 1, 0), g("a", 9, 0)];
        let mapping = ClusterMapping::new(&existing, &expected);
        assert_eq!(mapping.expected_size(), 4);
        assert_eq!(mapping.expected("a").map(|g| g.desired), Some(3));
        let order: Vec<&str> = mapping.expected_groups().map(|g| g.name).collect();
        assert_eq!(order, vec!["a", "b"]);
    }

    #[test]
    fn test_teardown_always_allowed() {
        assert!(allowed(&[g("a", 5, 5)], &[]));
        assert!(allowed(&[g("a", 5, 5)], &[g("a", 0, 0)]));
    }

    #[test]
    fn test_single_voter_always_mutable() {
        assert!(allowed(&[g("a", 1, 1)], &[g("a", 1, 0)]));
        assert!(allowed(&[g("a", 1, 1)], &[g("a", 2, 0)]));
        assert!(!allowed(&[g("a", 1, 1)], &[g("b", 1, 0)]));
        assert!(!allowed(&[g("a", 1, 1), g("b", 0, 0)], &[g("a", 1, 0)]));
    }

    #[test]
    fn test_quorum_floor() {
        assert!(!allowed(&[g("a", 3, 3)], &[g("a", 2, 0)]));
        assert!(allowed(&[g("a", 3, 3)], &[g("a", 3, 0)]));
        assert!(allowed(&[g("a", 3, 3)], &[g("a", 4, 0)]));
    }

    #[test]
    fn test_majority_must_remain() {
        // 3 of 6 is exactly half, not more.
        assert!(!allowed(&[g("a", 6, 6)], &[g("a", 3, 0)]));
        assert!(allowed(&[g("a", 6, 6)], &[g("a", 4, 0)]));
        assert!(allowed(&[g("a", 5, 5)], &[g("a", 3, 0)]));
    }

    #[test]
    fn test_custom_policy() {
        let existing = [g("a", 3, 3)];
        let expected = [g("a", 2, 0)];
        let mapping = ClusterMapping::new(&existing, &expected);
        let relaxed = QuorumPolicy {
            min_quorum: 1,
            majority_denominator: 2,
        };
        assert!(mapping.is_scale_down_allowed(&relaxed));
        assert!(!mapping.is_scale_down_allowed(&QuorumPolicy::default()));
    }

    #[test]
    fn test_totals_beyond_i32() {
        let existing = [g("a", i32::MAX, i32::MAX), g("b", 2, 2)];
        let expected = [g("a", i32::MAX, 0), g("b", 2, 0)];
        let mapping = ClusterMapping::new(&existing, &expected);
        assert_eq!(mapping.existing_size(), i64::from(i32::MAX) + 2);
        assert_eq!(mapping.expected_size(), i64::from(i32::MAX) + 2);
        assert!(mapping.has_existing_cluster());
        assert!(mapping.is_scale_down_allowed(&QuorumPolicy::default()));

        let shrunk = [g("a", i32::MAX / 4, 0)];
        assert!(!allowed(&existing, &shrunk));
    }

    #[test]
    fn test_majority_check_saturates() {
        let policy = QuorumPolicy {
            min_quorum: 1,
            majority_denominator: i32::MAX,
        };
        assert!(policy.retains_majority(i64::MAX / 2, i64::MAX - 1));
        assert!(!policy.retains_majority(0, 0));
    }
}
