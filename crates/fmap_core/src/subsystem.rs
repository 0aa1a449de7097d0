//! Connectivity islands of FPGAs and of components.
//!
//! Two FPGAs share an island when some chain of links joins them, ignoring
//! direction; components likewise through connections. Placement consults
//! the islands so that a group never lands on an FPGA island that cannot
//! reach the rest of its communication subsystem.

use crate::error::{EntityKind, MappingError, MappingResult};
use crate::registry::Registry;
use fmap_common::{score_resource_set, ComponentId, FpgaId, GroupId, ResourceSet};
use petgraph::unionfind::UnionFind;
use std::collections::{BTreeMap, BTreeSet, HashMap};

/// Index of an FPGA island.
pub type FpgaIsland = usize;

/// Index of a component island.
pub type ComponentIsland = usize;

/// FPGA and component islands plus the record of which component islands
/// each FPGA island already hosts.
#[derive(Debug, Clone)]
pub struct Subsystems {
    fpga_island: BTreeMap<FpgaId, FpgaIsland>,
    component_island: BTreeMap<ComponentId, ComponentIsland>,
    capacity: Vec<ResourceSet>,
    demand: Vec<ResourceSet>,
    hosting: Vec<BTreeSet<ComponentIsland>>,
}

/// Groups `keys` into islands by union-find over `edges`, numbering islands
/// in order of their first key.
fn partition<K: Ord + Clone>(keys: Vec<K>, edges: &[(&K, &K)]) -> BTreeMap<K, usize> {
    let position: BTreeMap<&K, usize> = keys.iter().enumerate().map(|(i, k)| (k, i)).collect();
    let mut sets = UnionFind::<usize>::new(keys.len());
    for (a, b) in edges {
        if let (Some(&a), Some(&b)) = (position.get(a), position.get(b)) {
            sets.union(a, b);
        }
    }
    let mut numbering: HashMap<usize, usize> = HashMap::new();
    let mut out = BTreeMap::new();
    for (i, key) in keys.iter().enumerate() {
        let next = numbering.len();
        let island = *numbering.entry(sets.find(i)).or_insert(next);
        out.insert(key.clone(), island);
    }
    out
}

impl Subsystems {
    /// Partitions the registry's FPGAs and components and records the
    /// groups that are already mapped.
    pub fn build(registry: &Registry) -> MappingResult<Self> {
        let links: Vec<(&FpgaId, &FpgaId)> = registry
            .links()
            .values()
            .map(|l| (&l.source, &l.sink))
            .collect();
        let fpga_island = partition(registry.fpgas().keys().cloned().collect(), &links);

        let connections: Vec<(&ComponentId, &ComponentId)> = registry
            .connections()
            .values()
            .map(|c| (&c.source, &c.sink))
            .collect();
        let component_island =
            partition(registry.components().keys().cloned().collect(), &connections);

        let fpga_count = fpga_island.values().max().map_or(0, |m| m + 1);
        let component_count = component_island.values().max().map_or(0, |m| m + 1);

        let mut capacity = vec![ResourceSet::new(); fpga_count];
        for (id, &island) in &fpga_island {
            capacity[island].add(&registry.fpga(id)?.total);
        }
        let mut demand = vec![ResourceSet::new(); component_count];
        for (id, &island) in &component_island {
            demand[island].add(&registry.component(id)?.resources);
        }

        let mut subsystems = Subsystems {
            fpga_island,
            component_island,
            capacity,
            demand,
            hosting: vec![BTreeSet::new(); fpga_count],
        };
        for group in registry.groups().values() {
            if let Some(fpga) = group.target() {
                let island = subsystems.fpga_island(fpga)?;
                subsystems.record(registry, island, &group.id)?;
            }
        }
        Ok(subsystems)
    }

    /// The island of `fpga`.
    pub fn fpga_island(&self, fpga: &FpgaId) -> MappingResult<FpgaIsland> {
        self.fpga_island
            .get(fpga)
            .copied()
            .ok_or_else(|| MappingError::missing(EntityKind::Fpga, fpga))
    }

    /// The island of `component`.
    pub fn component_island(&self, component: &ComponentId) -> MappingResult<ComponentIsland> {
        self.component_island
            .get(component)
            .copied()
            .ok_or_else(|| MappingError::missing(EntityKind::Component, component))
    }

    /// The component islands spanned by the members of `group`.
    pub fn group_islands(
        &self,
        registry: &Registry,
        group: &GroupId,
    ) -> MappingResult<BTreeSet<ComponentIsland>> {
        registry
            .group(group)?
            .members()
            .iter()
            .map(|m| self.component_island(m))
            .collect()
    }

    /// Number of FPGA islands.
    pub fn fpga_island_count(&self) -> usize {
        self.capacity.len()
    }

    /// Number of component islands.
    pub fn component_island_count(&self) -> usize {
        self.demand.len()
    }

    /// Whether part of `component` island already sits on `fpga` island.
    pub fn is_hosting(&self, fpga: FpgaIsland, component: ComponentIsland) -> bool {
        self.hosting
            .get(fpga)
            .is_some_and(|hosted| hosted.contains(&component))
    }

    /// Whether part of `component` island sits on an island other than
    /// `fpga`.
    pub fn hosted_elsewhere(&self, fpga: FpgaIsland, component: ComponentIsland) -> bool {
        self.hosting
            .iter()
            .enumerate()
            .any(|(i, hosted)| i != fpga && hosted.contains(&component))
    }

    /// Whether the summed resources of `fpga` island could hold the whole of
    /// `component` island.
    pub fn can_support(&self, fpga: FpgaIsland, component: ComponentIsland) -> bool {
        let (Some(capacity), Some(demand)) = (self.capacity.get(fpga), self.demand.get(component))
        else {
            return false;
        };
        score_resource_set(capacity, demand) >= 0.0 && capacity.covers(demand)
    }

    /// Whether a group spanning `islands` may be placed on `fpga` island.
    ///
    /// Rejected if any of its component islands is already hosted by a
    /// different FPGA island, or is not yet hosted here and the island could
    /// not hold it. Hosting elsewhere rejects even when capacity suffices, so
    /// a group bridging parts already on two unlinked FPGAs stays unplaced
    /// instead of being split across them.
    pub fn accepts(&self, fpga: FpgaIsland, islands: &BTreeSet<ComponentIsland>) -> bool {
        islands.iter().all(|&ci| {
            !self.hosted_elsewhere(fpga, ci)
                && (self.is_hosting(fpga, ci) || self.can_support(fpga, ci))
        })
    }

    /// Records that `group` now sits on `fpga` island.
    pub fn record(
        &mut self,
        registry: &Registry,
        fpga: FpgaIsland,
        group: &GroupId,
    ) -> MappingResult<()> {
        let islands = self.group_islands(registry, group)?;
        if let Some(hosted) = self.hosting.get_mut(fpga) {
            hosted.extend(islands);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::{Component, Connection, Fpga, Group, Link};

    fn lut(n: u64) -> ResourceSet {
        ResourceSet::new().with("LUT", n)
    }

    /// f0 - f1 linked, f2 alone; a - b connected, c alone.
    fn registry() -> Registry {
        let mut reg = Registry::new();
        for id in ["f0", "f1", "f2"] {
            reg.insert_fpga(Fpga::new(id, "v5", lut(100))).unwrap();
        }
        reg.insert_link(Link::new("l0", "f0", "f1", 1.0, false)).unwrap();
        for (id, n) in [("a", 120), ("b", 50), ("c", 10)] {
            reg.insert_component(Component::new(id, lut(n))).unwrap();
            let g = format!("g_{id}");
            reg.insert_group(Group::new(g.as_str())).unwrap();
            reg.attach_component(&GroupId::from(g), &ComponentId::from(id))
                .unwrap();
        }
        reg.insert_connection(Connection::new("c0", "a", "b", 1.0))
            .unwrap();
        reg
    }

    #[test]
    fn islands_follow_links_and_connections() {
        let subs = Subsystems::build(&registry()).unwrap();
        assert_eq!(subs.fpga_island_count(), 2);
        assert_eq!(subs.component_island_count(), 2);
        let f0 = subs.fpga_island(&FpgaId::from("f0")).unwrap();
        assert_eq!(subs.fpga_island(&FpgaId::from("f1")).unwrap(), f0);
        assert_ne!(subs.fpga_island(&FpgaId::from("f2")).unwrap(), f0);
        let a = subs.component_island(&ComponentId::from("a")).unwrap();
        assert_eq!(subs.component_island(&ComponentId::from("b")).unwrap(), a);
    }

    #[test]
    fn capacity_is_island_wide() {
        let subs = Subsystems::build(&registry()).unwrap();
        let pair = subs.fpga_island(&FpgaId::from("f0")).unwrap();
        let lone = subs.fpga_island(&FpgaId::from("f2")).unwrap();
        let ab = subs.component_island(&ComponentId::from("a")).unwrap();
        assert!(subs.can_support(pair, ab));
        assert!(!subs.can_support(lone, ab));
    }

    #[test]
    fn hosted_island_is_not_split() {
        let mut reg = registry();
        reg.map_group(&GroupId::from("g_b"), &FpgaId::from("f2"))
            .unwrap();
        let subs = Subsystems::build(&reg).unwrap();
        let pair = subs.fpga_island(&FpgaId::from("f0")).unwrap();
        let lone = subs.fpga_island(&FpgaId::from("f2")).unwrap();
        let islands = subs.group_islands(&reg, &GroupId::from("g_a")).unwrap();
        assert!(!subs.accepts(pair, &islands));
        assert!(subs.is_hosting(lone, *islands.iter().next().unwrap()));
    }

    #[test]
    fn unknown_ids_are_errors() {
        let subs = Subsystems::build(&registry()).unwrap();
        assert!(subs.fpga_island(&FpgaId::from("zz")).is_err());
        assert!(subs.component_island(&ComponentId::from("zz")).is_err());
    }
}
