//! Architecture-family support sets.

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// The set of FPGA architecture families an entity can be placed on.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum ArchSupport {
    /// No restriction: any architecture is acceptable.
    Any,
    /// Only the listed architecture families.
    Only(BTreeSet<String>),
    /// No architecture at all. A group with this support can never be placed.
    Nothing,
}

impl ArchSupport {
    /// Builds a support set from a component's architecture list.
    ///
    /// An empty list means the component supports any architecture.
    pub fn from_tags<I, S>(tags: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let set: BTreeSet<String> = tags.into_iter().map(Into::into).collect();
        if set.is_empty() {
            ArchSupport::Any
        } else {
            ArchSupport::Only(set)
        }
    }

    /// Intersects two support sets.
    pub fn intersect(&self, other: &ArchSupport) -> ArchSupport {
        match (self, other) {
            (ArchSupport::Nothing, _) | (_, ArchSupport::Nothing) => ArchSupport::Nothing,
            (ArchSupport::Any, x) | (x, ArchSupport::Any) => x.clone(),
            (ArchSupport::Only(a), ArchSupport::Only(b)) => {
                let common: BTreeSet<String> = a.intersection(b).cloned().collect();
                if common.is_empty() {
                    ArchSupport::Nothing
                } else {
                    ArchSupport::Only(common)
                }
            }
        }
    }

    /// Returns whether an FPGA of architecture `arch` is acceptable.
    pub fn allows(&self, arch: &str) -> bool {
        match self {
            ArchSupport::Any => true,
            ArchSupport::Only(set) => set.contains(arch),
            ArchSupport::Nothing => false,
        }
    }

    /// Returns whether no architecture is acceptable.
    pub fn is_nothing(&self) -> bool {
        matches!(self, ArchSupport::Nothing)
    }
}

impl Default for ArchSupport {
    fn default() -> Self {
        ArchSupport::Any
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_tags_mean_any() {
        assert_eq!(ArchSupport::from_tags(Vec::<String>::new()), ArchSupport::Any);
    }

    #[test]
    fn any_is_identity() {
        let v5 = ArchSupport::from_tags(["virtex5"]);
        assert_eq!(ArchSupport::Any.intersect(&v5), v5);
        assert_eq!(v5.intersect(&ArchSupport::Any), v5);
    }

    #[test]
    fn disjoint_sets_give_nothing() {
        let a = ArchSupport::from_tags(["virtex5"]);
        let b = ArchSupport::from_tags(["virtex6"]);
        assert!(a.intersect(&b).is_nothing());
    }

    #[test]
    fn overlapping_sets_keep_common() {
        let a = ArchSupport::from_tags(["virtex5", "virtex6"]);
        let b = ArchSupport::from_tags(["virtex6", "virtex7"]);
        let c = a.intersect(&b);
        assert!(c.allows("virtex6"));
        assert!(!c.allows("virtex5"));
    }

    #[test]
    fn nothing_absorbs() {
        assert!(ArchSupport::Nothing.intersect(&ArchSupport::Any).is_nothing());
        assert!(!ArchSupport::Nothing.allows("virtex5"));
    }
}
