//! Committed connection routes.
//!
//! Once a group is placed, each connection between it and an already-placed
//! partner on another FPGA is routed along the shortest link path and the
//! path is remembered here, so unmapping can release exactly what was
//! applied.

use super::path::{apply_connection_to_path, remove_connection_from_path, shortest_link_path};
use crate::registry::Registry;
use crate::error::MappingResult;
use fmap_common::{ConnectionId, GroupId, LinkId};
use fmap_diagnostics::{Category, Diagnostic, DiagnosticCode, DiagnosticSink};
use log::{debug, warn};
use std::collections::BTreeMap;

/// Warning code for a connection whose endpoints have no link path.
pub const UNROUTABLE_CONNECTION: DiagnosticCode = DiagnosticCode::new(Category::Routing, 301);

/// Link paths of every routed connection.
#[derive(Debug, Clone, Default)]
pub struct RouteTable {
    paths: BTreeMap<ConnectionId, Vec<LinkId>>,
}

impl RouteTable {
    /// Creates an empty table.
    pub fn new() -> Self {
        Self::default()
    }

    /// The committed path of `connection`, if it is routed.
    pub fn path(&self, connection: &ConnectionId) -> Option<&[LinkId]> {
        self.paths.get(connection).map(Vec::as_slice)
    }

    /// Whether `connection` is routed.
    pub fn is_routed(&self, connection: &ConnectionId) -> bool {
        self.paths.contains_key(connection)
    }

    /// Every routed connection with its path, in connection ID order.
    pub fn iter(&self) -> impl Iterator<Item = (&ConnectionId, &[LinkId])> {
        self.paths.iter().map(|(c, p)| (c, p.as_slice()))
    }

    /// Number of routed connections.
    pub fn len(&self) -> usize {
        self.paths.len()
    }

    /// Whether nothing is routed.
    pub fn is_empty(&self) -> bool {
        self.paths.is_empty()
    }

    /// Applies `path` to the links and records it for `connection`,
    /// replacing any earlier route.
    pub fn commit(
        &mut self,
        registry: &mut Registry,
        connection: &ConnectionId,
        path: Vec<LinkId>,
    ) -> MappingResult<()> {
        self.release(registry, connection)?;
        apply_connection_to_path(registry, connection, &path)?;
        self.paths.insert(connection.clone(), path);
        Ok(())
    }

    /// Removes the route of `connection` from its links, if it has one.
    pub fn release(
        &mut self,
        registry: &mut Registry,
        connection: &ConnectionId,
    ) -> MappingResult<()> {
        if let Some(path) = self.paths.get(connection) {
            remove_connection_from_path(registry, connection, path)?;
            self.paths.remove(connection);
        }
        Ok(())
    }

    /// Forgets every route without touching link usage.
    pub(crate) fn clear(&mut self) {
        self.paths.clear();
    }
}

/// Routes every connection between a member of the mapped `group` and a
/// member of another mapped group placed on a different FPGA.
///
/// A connection with no link path between the two FPGAs stays unrouted and
/// is reported as a warning.
pub fn commit_group_routes(
    registry: &mut Registry,
    routes: &mut RouteTable,
    group: &GroupId,
    sink: &DiagnosticSink,
) -> MappingResult<()> {
    let Some(here) = registry.group(group)?.target().cloned() else {
        return Ok(());
    };
    let mut pending = Vec::new();
    for member in registry.group(group)?.members() {
        for conn in registry.connections_touching(member) {
            if routes.is_routed(&conn.id) || pending.contains(&conn.id) {
                continue;
            }
            let Some(partner) = conn.other_end(member) else {
                continue;
            };
            let Some(partner_fpga) = registry.component_fpga(partner)? else {
                continue;
            };
            if *partner_fpga != here {
                pending.push(conn.id.clone());
            }
        }
    }

    for conn_id in pending {
        let conn = registry.connection(&conn_id)?;
        let (Some(from), Some(to)) = (
            registry.component_fpga(&conn.source)?.cloned(),
            registry.component_fpga(&conn.sink)?.cloned(),
        ) else {
            continue;
        };
        match shortest_link_path(registry, &from, &to)? {
            Some(path) => {
                debug!("routing connection '{conn_id}' over {} link(s)", path.len());
                routes.commit(registry, &conn_id, path)?;
            }
            None => {
                warn!("no link path from FPGA '{from}' to FPGA '{to}' for connection '{conn_id}'");
                sink.emit(
                    Diagnostic::warning(
                        UNROUTABLE_CONNECTION,
                        format!("connection '{conn_id}' has no link path from FPGA '{from}' to FPGA '{to}'"),
                    )
                    .with_subject(conn_id.to_string()),
                );
            }
        }
    }
    Ok(())
}

/// Releases the routes of every connection touching a member of `group`.
pub fn release_group_routes(
    registry: &mut Registry,
    routes: &mut RouteTable,
    group: &GroupId,
) -> MappingResult<()> {
    let mut touching = Vec::new();
    for member in registry.group(group)?.members() {
        touching.extend(registry.connections_touching(member).map(|c| c.id.clone()));
    }
    for conn in touching {
        routes.release(registry, &conn)?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::{Component, Connection, Fpga, Group, Link};
    use fmap_common::{ComponentId, FpgaId, ResourceSet};

    fn gid(id: &str) -> GroupId {
        GroupId::from(id)
    }

    /// Two FPGAs joined by one link, one component per group.
    fn pair(linked: bool) -> Registry {
        let mut reg = Registry::new();
        for id in ["f0", "f1"] {
            reg.insert_fpga(Fpga::new(id, "v5", ResourceSet::new()))
                .unwrap();
        }
        if linked {
            reg.insert_link(Link::new("l0", "f0", "f1", 10.0, true))
                .unwrap();
        }
        for (c, g) in [("a", "ga"), ("b", "gb")] {
            reg.insert_group(Group::new(g)).unwrap();
            reg.insert_component(Component::new(c, ResourceSet::new()))
                .unwrap();
            reg.attach_component(&gid(g), &ComponentId::from(c)).unwrap();
        }
        reg.insert_connection(Connection::new("c0", "a", "b", 4.0))
            .unwrap();
        reg
    }

    #[test]
    fn routes_once_both_ends_are_placed() {
        let mut reg = pair(true);
        let mut routes = RouteTable::new();
        let sink = DiagnosticSink::new();
        reg.map_group(&gid("ga"), &FpgaId::from("f0")).unwrap();
        commit_group_routes(&mut reg, &mut routes, &gid("ga"), &sink).unwrap();
        assert!(routes.is_empty());

        reg.map_group(&gid("gb"), &FpgaId::from("f1")).unwrap();
        commit_group_routes(&mut reg, &mut routes, &gid("gb"), &sink).unwrap();
        let c0 = ConnectionId::from("c0");
        assert_eq!(routes.path(&c0), Some(&[LinkId::from("l0")][..]));
        assert_eq!(reg.link(&LinkId::from("l0")).unwrap().usage(), &[c0.clone()]);

        release_group_routes(&mut reg, &mut routes, &gid("ga")).unwrap();
        assert!(!routes.is_routed(&c0));
        assert!(reg.link(&LinkId::from("l0")).unwrap().usage().is_empty());
    }

    #[test]
    fn co_located_groups_need_no_route() {
        let mut reg = pair(true);
        let mut routes = RouteTable::new();
        let sink = DiagnosticSink::new();
        reg.map_group(&gid("ga"), &FpgaId::from("f0")).unwrap();
        reg.map_group(&gid("gb"), &FpgaId::from("f0")).unwrap();
        commit_group_routes(&mut reg, &mut routes, &gid("gb"), &sink).unwrap();
        assert!(routes.is_empty());
    }

    #[test]
    fn missing_path_is_a_warning() {
        let mut reg = pair(false);
        let mut routes = RouteTable::new();
        let sink = DiagnosticSink::new();
        reg.map_group(&gid("ga"), &FpgaId::from("f0")).unwrap();
        reg.map_group(&gid("gb"), &FpgaId::from("f1")).unwrap();
        commit_group_routes(&mut reg, &mut routes, &gid("gb"), &sink).unwrap();
        assert!(routes.is_empty());
        let diags = sink.diagnostics();
        assert_eq!(diags.len(), 1);
        assert_eq!(diags[0].code, UNROUTABLE_CONNECTION);
        assert!(!sink.has_errors());
    }
}
