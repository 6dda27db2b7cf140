//! Cycle detection over formula dependencies.

use std::collections::{BTreeSet, HashMap, HashSet};

use crate::keygen::CurveKey;

/// Read access to the formula edges of a curve graph.
///
/// Direct curves and unknown keys return `None` and act as leaves.
pub trait DependencyLookup {
    fn dependencies(&self, key: &CurveKey) -> Option<&BTreeSet<CurveKey>>;
}

impl DependencyLookup for HashMap<CurveKey, BTreeSet<CurveKey>> {
    fn dependencies(&self, key: &CurveKey) -> Option<&BTreeSet<CurveKey>> {
        self.get(key)
    }
}

/// Whether admitting a formula named `target` that references `referenced`
/// would close a loop.
///
/// `target` is the candidate's own identifier as it would appear in a
/// placeholder, which need not be a valid key. The walk follows formula edges
/// depth first from every referenced key and reports a cycle as soon as it
/// reaches `target`. Each key is expanded at most once, so the walk ends even
/// if the graph already contains a loop.
pub fn would_cycle<G>(target: &str, referenced: &BTreeSet<CurveKey>, graph: &G) -> bool
where
    G: DependencyLookup + ?Sized,
{
    let mut visited = HashSet::new();
    let mut stack: Vec<CurveKey> = referenced.iter().rev().copied().collect();

    while let Some(key) = stack.pop() {
        if key.to_string() == target {
            return true;
        }
        if !visited.insert(key) {
            continue;
        }
        if let Some(next) = graph.dependencies(&key) {
            stack.extend(next.iter().rev().filter(|k| !visited.contains(*k)).copied());
        }
    }
    false
}

/// Every key that reaches one of `roots` through formula edges, roots
/// excluded. Used to find what a deletion leaves dangling.
pub fn dependents_of<'a, I>(roots: &BTreeSet<CurveKey>, edges: I) -> BTreeSet<CurveKey>
where
    I: IntoIterator<Item = (CurveKey, &'a BTreeSet<CurveKey>)> + Clone,
{
    let mut found: BTreeSet<CurveKey> = BTreeSet::new();
    let mut frontier: BTreeSet<CurveKey> = roots.clone();

    while !frontier.is_empty() {
        let mut next = BTreeSet::new();
        for (key, deps) in edges.clone() {
            if roots.contains(&key) || found.contains(&key) {
                continue;
            }
            if deps.iter().any(|d| frontier.contains(d)) {
                next.insert(key);
            }
        }
        found.extend(next.iter().copied());
        frontier = next;
    }
    found
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn k(n: u64) -> CurveKey {
        CurveKey::new(n)
    }

    fn graph(edges: &[(u64, &[u64])]) -> HashMap<CurveKey, BTreeSet<CurveKey>> {
        edges
            .iter()
            .map(|(from, to)| (k(*from), to.iter().map(|n| k(*n)).collect()))
            .collect()
    }

    #[test]
    fn direct_reference_to_target() {
        let g = graph(&[]);
        assert!(would_cycle("PV1", &BTreeSet::from([k(1)]), &g));
        assert!(!would_cycle("PV2", &BTreeSet::from([k(1)]), &g));
    }

    #[test]
    fn transitive_chain() {
        // PV2 = {PV1}+1, PV3 = {PV2}*2; making PV1 depend on PV3 closes a loop.
        let g = graph(&[(2, &[1]), (3, &[2])]);
        assert!(would_cycle("PV1", &BTreeSet::from([k(3)]), &g));
        assert!(!would_cycle("PV4", &BTreeSet::from([k(3)]), &g));
    }

    #[test]
    fn terminates_on_existing_loop() {
        let g = graph(&[(1, &[2]), (2, &[1])]);
        assert!(!would_cycle("PV9", &BTreeSet::from([k(1)]), &g));
    }

    #[test]
    fn non_key_target_only_matches_spelling() {
        let g = graph(&[(2, &[1])]);
        assert!(!would_cycle("X", &BTreeSet::from([k(2)]), &g));
    }

    #[test]
    fn dependents_are_transitive() {
        let g = graph(&[(2, &[1]), (3, &[2]), (4, &[5])]);
        let found = dependents_of(&BTreeSet::from([k(1)]), g.iter().map(|(k, d)| (*k, d)));
        assert_eq!(found, BTreeSet::from([k(2), k(3)]));
    }
}
