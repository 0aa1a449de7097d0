//! I/O distances: hops from the nearest structural input.
//!
//! The same layering runs over two graphs: components joined by connections,
//! and FPGAs joined by links. Structural sources sit at distance 0, as does
//! every node with no incident edge. Remaining nodes take the breadth-first
//! layer at which they are first reached; nodes that are never reached keep
//! [`UNKNOWN_DISTANCE`].
//!
//! If neither graph has a structural source, every node in it is placed at
//! distance 0.

use crate::data::UNKNOWN_DISTANCE;
use crate::error::{EntityKind, MappingError, MappingResult};
use crate::registry::Registry;
use fmap_common::{ComponentId, FpgaId};
use petgraph::graph::{DiGraph, NodeIndex};
use petgraph::Direction;
use std::collections::{BTreeMap, BTreeSet, VecDeque};
use std::fmt::Display;

/// Computes the I/O distance of every component.
///
/// A component is a source when it has an externally-facing input core that
/// no connection feeds.
pub fn component_io_distances(registry: &Registry) -> MappingResult<BTreeMap<ComponentId, i32>> {
    let nodes: Vec<ComponentId> = registry.components().keys().cloned().collect();
    let edges: Vec<(ComponentId, ComponentId)> = registry
        .connections()
        .values()
        .map(|c| (c.source.clone(), c.sink.clone()))
        .collect();

    let mut sources = BTreeSet::new();
    for component in registry.components().values() {
        let fed = |core: &str| {
            registry
                .connections()
                .values()
                .any(|c| c.sink == component.id && c.sink_core.as_deref() == Some(core))
        };
        if component
            .cores
            .iter()
            .any(|core| core.interface.is_external_input() && !fed(&core.name))
        {
            sources.insert(component.id.clone());
        }
    }

    layered_distances(EntityKind::Component, &nodes, &edges, &sources)
}

/// Computes the I/O distance of every FPGA.
///
/// An FPGA is a source when no link leads into it. A bidirectional link
/// leads into both of its ends.
pub fn fpga_io_distances(registry: &Registry) -> MappingResult<BTreeMap<FpgaId, i32>> {
    let nodes: Vec<FpgaId> = registry.fpgas().keys().cloned().collect();
    let mut edges = Vec::new();
    let mut inbound = BTreeSet::new();
    for link in registry.links().values() {
        edges.push((link.source.clone(), link.sink.clone()));
        inbound.insert(&link.sink);
        if link.bidirectional {
            edges.push((link.sink.clone(), link.source.clone()));
            inbound.insert(&link.source);
        }
    }
    let sources: BTreeSet<FpgaId> = nodes
        .iter()
        .filter(|f| !inbound.contains(f))
        .cloned()
        .collect();

    layered_distances(EntityKind::Fpga, &nodes, &edges, &sources)
}

/// Recomputes and stores the I/O distance of every component and FPGA.
pub fn apply_io_distances(registry: &mut Registry) -> MappingResult<()> {
    let components = component_io_distances(registry)?;
    let fpgas = fpga_io_distances(registry)?;
    for (id, d) in components {
        registry.component_mut(&id)?.io_distance = d;
    }
    for (id, d) in fpgas {
        registry.fpga_mut(&id)?.io_distance = d;
    }
    Ok(())
}

fn layered_distances<K>(
    entity: EntityKind,
    nodes: &[K],
    edges: &[(K, K)],
    sources: &BTreeSet<K>,
) -> MappingResult<BTreeMap<K, i32>>
where
    K: Ord + Clone + Display,
{
    let mut graph: DiGraph<(), ()> = DiGraph::with_capacity(nodes.len(), edges.len());
    let index: BTreeMap<&K, NodeIndex> = nodes.iter().map(|n| (n, graph.add_node(()))).collect();
    let lookup = |id: &K| {
        index
            .get(id)
            .copied()
            .ok_or_else(|| MappingError::missing(entity, id))
    };
    for (from, to) in edges {
        graph.add_edge(lookup(from)?, lookup(to)?, ());
    }

    let mut dist = vec![UNKNOWN_DISTANCE; nodes.len()];
    if sources.is_empty() {
        dist.fill(0);
    } else {
        for source in sources {
            dist[lookup(source)?.index()] = 0;
        }
        for node in graph.node_indices() {
            if graph.neighbors_undirected(node).next().is_none() {
                dist[node.index()] = 0;
            }
        }

        let mut queue: VecDeque<NodeIndex> = graph
            .node_indices()
            .filter(|n| dist[n.index()] == 0)
            .collect();
        while let Some(here) = queue.pop_front() {
            let next_layer = dist[here.index()] + 1;
            for next in graph.neighbors_directed(here, Direction::Outgoing) {
                if dist[next.index()] == UNKNOWN_DISTANCE {
                    dist[next.index()] = next_layer;
                    queue.push_back(next);
                }
            }
        }
    }

    Ok(nodes.iter().cloned().zip(dist).collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::{Component, Connection, Fpga, Link};
    use fmap_common::{InterfaceKind, ResourceSet};

    fn cid(id: &str) -> ComponentId {
        ComponentId::from(id)
    }

    fn comp(id: &str) -> Component {
        Component::new(id, ResourceSet::new())
    }

    #[test]
    fn pipeline_layers_from_input() {
        let mut reg = Registry::new();
        reg.insert_component(comp("cam").with_core("in", InterfaceKind::ExternalInput))
            .unwrap();
        reg.insert_component(comp("filt")).unwrap();
        reg.insert_component(comp("out")).unwrap();
        reg.insert_component(comp("lonely")).unwrap();
        reg.insert_connection(Connection::new("c0", "cam", "filt", 1.0))
            .unwrap();
        reg.insert_connection(Connection::new("c1", "filt", "out", 1.0))
            .unwrap();

        let d = component_io_distances(&reg).unwrap();
        assert_eq!(d[&cid("cam")], 0);
        assert_eq!(d[&cid("filt")], 1);
        assert_eq!(d[&cid("out")], 2);
        assert_eq!(d[&cid("lonely")], 0);
    }

    #[test]
    fn fed_input_core_is_not_a_source() {
        let mut reg = Registry::new();
        reg.insert_component(comp("a").with_core("in", InterfaceKind::ExternalInput))
            .unwrap();
        reg.insert_component(comp("b").with_core("in", InterfaceKind::ExternalInput))
            .unwrap();
        reg.insert_connection(
            Connection::new("c0", "a", "b", 1.0).with_cores(None, Some("in".to_string())),
        )
        .unwrap();
        let d = component_io_distances(&reg).unwrap();
        assert_eq!(d[&cid("a")], 0);
        assert_eq!(d[&cid("b")], 1);
    }

    #[test]
    fn no_sources_means_everything_at_zero() {
        let mut reg = Registry::new();
        reg.insert_component(comp("a")).unwrap();
        reg.insert_component(comp("b")).unwrap();
        reg.insert_connection(Connection::new("c0", "a", "b", 1.0))
            .unwrap();
        reg.insert_connection(Connection::new("c1", "b", "a", 1.0))
            .unwrap();
        let d = component_io_distances(&reg).unwrap();
        assert!(d.values().all(|&v| v == 0));
    }

    #[test]
    fn unreachable_stays_unknown() {
        let mut reg = Registry::new();
        reg.insert_component(comp("src").with_core("in", InterfaceKind::ExternalInput))
            .unwrap();
        reg.insert_component(comp("x")).unwrap();
        reg.insert_component(comp("y")).unwrap();
        // x and y feed each other but nothing reaches them
        reg.insert_connection(Connection::new("c0", "x", "y", 1.0))
            .unwrap();
        reg.insert_connection(Connection::new("c1", "y", "x", 1.0))
            .unwrap();
        let d = component_io_distances(&reg).unwrap();
        assert_eq!(d[&cid("src")], 0);
        assert_eq!(d[&cid("x")], UNKNOWN_DISTANCE);
    }

    #[test]
    fn dangling_edge_is_an_error() {
        let nodes = vec![cid("a")];
        let edges = vec![(cid("a"), cid("ghost"))];
        let sources = BTreeSet::from([cid("a")]);
        let err = layered_distances(EntityKind::Component, &nodes, &edges, &sources).unwrap_err();
        assert_eq!(err, MappingError::missing(EntityKind::Component, "ghost"));
    }

    #[test]
    fn fpga_chain_of_one_way_links() {
        let mut reg = Registry::new();
        for id in ["f0", "f1", "f2"] {
            reg.insert_fpga(Fpga::new(id, "v5", ResourceSet::new()))
                .unwrap();
        }
        reg.insert_link(Link::new("l0", "f0", "f1", 1.0, false)).unwrap();
        reg.insert_link(Link::new("l1", "f1", "f2", 1.0, false)).unwrap();
        apply_io_distances(&mut reg).unwrap();
        let dist: Vec<i32> = reg.fpgas().values().map(|f| f.io_distance).collect();
        assert_eq!(dist, vec![0, 1, 2]);
    }

    #[test]
    fn bidirectional_ring_falls_back_to_zero() {
        let mut reg = Registry::new();
        for id in ["f0", "f1"] {
            reg.insert_fpga(Fpga::new(id, "v5", ResourceSet::new()))
                .unwrap();
        }
        reg.insert_link(Link::new("l0", "f0", "f1", 1.0, true)).unwrap();
        let d = fpga_io_distances(&reg).unwrap();
        assert!(d.values().all(|&v| v == 0));
    }
}
