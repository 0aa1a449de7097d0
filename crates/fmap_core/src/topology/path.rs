//! Shortest link paths and per-link traffic bookkeeping.

use crate::error::{EntityKind, MappingError, MappingResult};
use crate::registry::Registry;
use fmap_common::{ConnectionId, FpgaId, LinkId};
use std::collections::{BTreeMap, HashMap, VecDeque};

/// Finds a minimum-hop sequence of links leading from `source` to `sink`.
///
/// Links are explored in ID order, so among several minimum-hop paths the
/// one whose links sort first at each step wins. Returns an empty path when
/// `source == sink`, and `None` when `sink` cannot be reached.
pub fn shortest_link_path(
    registry: &Registry,
    source: &FpgaId,
    sink: &FpgaId,
) -> MappingResult<Option<Vec<LinkId>>> {
    registry.fpga(source)?;
    registry.fpga(sink)?;
    if source == sink {
        return Ok(Some(Vec::new()));
    }

    let mut outgoing: BTreeMap<&FpgaId, Vec<(&LinkId, &FpgaId)>> = BTreeMap::new();
    for link in registry.links().values() {
        for from in [&link.source, &link.sink] {
            if let Some(next) = link.traverse_from(from) {
                outgoing.entry(from).or_default().push((&link.id, next));
            }
            if link.source == link.sink {
                break;
            }
        }
    }

    let mut came_from: HashMap<&FpgaId, (&LinkId, &FpgaId)> = HashMap::new();
    let mut queue = VecDeque::from([source]);
    while let Some(here) = queue.pop_front() {
        for &(link, next) in outgoing.get(here).into_iter().flatten() {
            if next == source || came_from.contains_key(next) {
                continue;
            }
            came_from.insert(next, (link, here));
            if next == sink {
                let mut path = Vec::new();
                let mut at = sink;
                while let Some(&(link, prev)) = came_from.get(at) {
                    path.push(link.clone());
                    at = prev;
                }
                path.reverse();
                return Ok(Some(path));
            }
            queue.push_back(next);
        }
    }
    Ok(None)
}

/// Records `connection` as traversing every link of `path`.
///
/// All links are checked before any is touched.
pub fn apply_connection_to_path(
    registry: &mut Registry,
    connection: &ConnectionId,
    path: &[LinkId],
) -> MappingResult<()> {
    registry.connection(connection)?;
    for link in path {
        registry.link(link)?;
    }
    for link in path {
        registry.link_mut(link)?.usage.push(connection.clone());
    }
    Ok(())
}

/// Reverses [`apply_connection_to_path`].
///
/// Fails with [`MappingError::LinkUsageInconsistency`], leaving every link
/// untouched, if some link of `path` does not carry `connection`.
pub fn remove_connection_from_path(
    registry: &mut Registry,
    connection: &ConnectionId,
    path: &[LinkId],
) -> MappingResult<()> {
    for link in path {
        if !registry.link(link)?.usage.contains(connection) {
            return Err(MappingError::LinkUsageInconsistency {
                link: link.clone(),
                connection: connection.clone(),
            });
        }
    }
    for link in path {
        let usage = &mut registry.link_mut(link)?.usage;
        if let Some(pos) = usage.iter().position(|c| c == connection) {
            usage.remove(pos);
        }
    }
    Ok(())
}

/// Traffic on `link`: the normalized densities of the connections routed
/// across it, divided by its normalized speed.
pub fn link_load(registry: &Registry, link: &LinkId) -> MappingResult<f64> {
    let l = registry.link(link)?;
    let mut density = 0.0;
    for c in l.usage() {
        density += registry
            .connections()
            .get(c)
            .ok_or_else(|| MappingError::missing(EntityKind::Connection, c))?
            .normalized_density();
    }
    Ok(density / l.normalized_speed())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::{Component, Connection, Fpga, Link};
    use fmap_common::ResourceSet;

    fn f(id: &str) -> FpgaId {
        FpgaId::from(id)
    }

    fn l(id: &str) -> LinkId {
        LinkId::from(id)
    }

    /// a - b - d and a - c - d, plus a direct one-way d -> a.
    fn diamond() -> Registry {
        let mut reg = Registry::new();
        for id in ["a", "b", "c", "d"] {
            reg.insert_fpga(Fpga::new(id, "v5", ResourceSet::new()))
                .unwrap();
        }
        reg.insert_link(Link::new("l_ab", "a", "b", 10.0, true)).unwrap();
        reg.insert_link(Link::new("l_ac", "a", "c", 10.0, true)).unwrap();
        reg.insert_link(Link::new("l_bd", "b", "d", 5.0, true)).unwrap();
        reg.insert_link(Link::new("l_cd", "c", "d", 10.0, true)).unwrap();
        reg.insert_link(Link::new("l_da", "d", "a", 10.0, false)).unwrap();
        reg.insert_component(Component::new("x", ResourceSet::new()))
            .unwrap();
        reg.insert_component(Component::new("y", ResourceSet::new()))
            .unwrap();
        reg.insert_connection(Connection::new("c0", "x", "y", 2.0))
            .unwrap();
        reg.insert_connection(Connection::new("c1", "y", "x", 4.0))
            .unwrap();
        reg
    }

    #[test]
    fn same_fpga_is_empty_path() {
        let reg = diamond();
        assert_eq!(shortest_link_path(&reg, &f("a"), &f("a")).unwrap(), Some(vec![]));
    }

    #[test]
    fn minimum_hops_with_lexicographic_ties() {
        let reg = diamond();
        let path = shortest_link_path(&reg, &f("b"), &f("c")).unwrap().unwrap();
        assert_eq!(path, vec![l("l_ab"), l("l_ac")]);
        let path = shortest_link_path(&reg, &f("d"), &f("a")).unwrap().unwrap();
        assert_eq!(path, vec![l("l_da")]);
    }

    #[test]
    fn one_way_link_is_not_walked_backwards() {
        let mut reg = Registry::new();
        reg.insert_fpga(Fpga::new("a", "v5", ResourceSet::new())).unwrap();
        reg.insert_fpga(Fpga::new("b", "v5", ResourceSet::new())).unwrap();
        reg.insert_link(Link::new("l0", "a", "b", 1.0, false)).unwrap();
        assert!(shortest_link_path(&reg, &f("a"), &f("b")).unwrap().is_some());
        assert_eq!(shortest_link_path(&reg, &f("b"), &f("a")).unwrap(), None);
    }

    #[test]
    fn unknown_fpga_is_an_error() {
        let reg = diamond();
        assert!(shortest_link_path(&reg, &f("a"), &f("zz")).is_err());
    }

    #[test]
    fn apply_and_remove_are_paired() {
        let mut reg = diamond();
        let c0 = ConnectionId::from("c0");
        let path = vec![l("l_ab"), l("l_bd")];
        apply_connection_to_path(&mut reg, &c0, &path).unwrap();
        assert_eq!(reg.link(&l("l_ab")).unwrap().usage(), &[c0.clone()]);
        remove_connection_from_path(&mut reg, &c0, &path).unwrap();
        assert!(reg.links().values().all(|l| l.usage().is_empty()));
    }

    #[test]
    fn removing_unapplied_connection_is_inconsistent() {
        let mut reg = diamond();
        let c0 = ConnectionId::from("c0");
        apply_connection_to_path(&mut reg, &c0, &[l("l_ab")]).unwrap();
        let err =
            remove_connection_from_path(&mut reg, &c0, &[l("l_ab"), l("l_bd")]).unwrap_err();
        assert!(matches!(err, MappingError::LinkUsageInconsistency { .. }));
        assert_eq!(reg.link(&l("l_ab")).unwrap().usage().len(), 1);
    }

    #[test]
    fn apply_checks_links_first() {
        let mut reg = diamond();
        let c0 = ConnectionId::from("c0");
        assert!(apply_connection_to_path(&mut reg, &c0, &[l("l_ab"), l("nope")]).is_err());
        assert!(reg.link(&l("l_ab")).unwrap().usage().is_empty());
    }

    #[test]
    fn load_scales_with_density_and_speed() {
        let mut reg = diamond();
        apply_connection_to_path(&mut reg, &ConnectionId::from("c0"), &[l("l_bd")]).unwrap();
        apply_connection_to_path(&mut reg, &ConnectionId::from("c1"), &[l("l_bd")]).unwrap();
        // densities normalize to 1 and 2; l_bd runs at half the top speed
        assert!((link_load(&reg, &l("l_bd")).unwrap() - 6.0).abs() < 1e-12);
        assert_eq!(link_load(&reg, &l("l_ab")).unwrap(), 0.0);
    }
}
