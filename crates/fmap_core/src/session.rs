//! The mapping session: the engine's public boundary.
//!
//! A [`MappingSession`] owns every registry, the committed routes, the
//! scoring weights, and a [`DiagnosticSink`]. All operations return
//! [`MappingResult`]; [`MappingSession::handle`] is the single place where an
//! error is logged, recorded as a diagnostic, and passed to the caller's
//! handler. [`MappingSession::do_mapping`] uses it to report success as a
//! plain `bool`.

use crate::data::{Cluster, Component, Connection, Fpga, Group, Link};
use crate::error::{MappingError, MappingResult};
use crate::placement::{self, MappingWeights};
use crate::registry::Registry;
use crate::report::MappingReport;
use crate::topology::{self, AdjacencyMatrix, RouteTable};
use fmap_common::{ClusterId, ComponentId, ConnectionId, FpgaId, GroupId, LinkId};
use fmap_diagnostics::{Diagnostic, DiagnosticSink};
use log::{error, info};
use std::fmt;

/// Callback invoked with every error that reaches the session boundary.
pub type ErrorHandler = Box<dyn FnMut(&MappingError)>;

/// A single mapping problem and its current placement.
#[derive(Default)]
pub struct MappingSession {
    registry: Registry,
    routes: RouteTable,
    weights: MappingWeights,
    sink: DiagnosticSink,
    handler: Option<ErrorHandler>,
}

impl fmt::Debug for MappingSession {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MappingSession")
            .field("registry", &self.registry)
            .field("routes", &self.routes)
            .field("weights", &self.weights)
            .field("handler", &self.handler.is_some())
            .finish()
    }
}

impl MappingSession {
    /// Creates an empty session with default weights.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates an empty session with the given weights.
    pub fn with_weights(weights: MappingWeights) -> Self {
        Self {
            weights,
            ..Self::default()
        }
    }

    /// Installs a callback that sees every error passed to
    /// [`handle`](Self::handle).
    pub fn set_error_handler(&mut self, handler: impl FnMut(&MappingError) + 'static) {
        self.handler = Some(Box::new(handler));
    }

    /// Logs and records `result`'s error, if any, and notifies the handler.
    ///
    /// Returns the success value, or `None` on error.
    pub fn handle<T>(&mut self, result: MappingResult<T>) -> Option<T> {
        match result {
            Ok(value) => Some(value),
            Err(e) => {
                error!("{e}");
                let mut diag = Diagnostic::error(e.kind().code(), e.to_string());
                if let Some(subject) = e.subject() {
                    diag = diag.with_subject(subject);
                }
                self.sink.emit(diag);
                if let Some(handler) = self.handler.as_mut() {
                    handler(&e);
                }
                None
            }
        }
    }

    /// The scoring weights.
    pub fn weights(&self) -> &MappingWeights {
        &self.weights
    }

    /// Replaces the scoring weights.
    pub fn set_weights(&mut self, weights: MappingWeights) {
        self.weights = weights;
    }

    /// Read-only view of every entity.
    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    /// Committed routes.
    pub fn routes(&self) -> &RouteTable {
        &self.routes
    }

    /// Diagnostics emitted so far.
    pub fn diagnostics(&self) -> &DiagnosticSink {
        &self.sink
    }

    // Load path

    /// Registers a component, joining the group it names if any.
    pub fn add_component(&mut self, component: Component) -> MappingResult<()> {
        let id = component.id.clone();
        let group = component.group.clone();
        self.registry.insert_component(component)?;
        if let Some(group) = group {
            if let Err(e) = self.add_component_to_group(&group, &id) {
                self.registry.take_component(&id)?;
                return Err(e);
            }
        }
        Ok(())
    }

    /// Registers an FPGA, joining the cluster it names if any.
    pub fn add_fpga(&mut self, fpga: Fpga) -> MappingResult<()> {
        let id = fpga.id.clone();
        let cluster = fpga.cluster.clone();
        self.registry.insert_fpga(fpga)?;
        if let Some(cluster) = cluster {
            if let Err(e) = self.registry.attach_fpga(&cluster, &id) {
                self.registry.take_fpga(&id)?;
                return Err(e);
            }
        }
        Ok(())
    }

    /// Registers an empty group.
    pub fn add_group(&mut self, group: Group) -> MappingResult<()> {
        self.registry.insert_group(group)
    }

    /// Registers an empty cluster.
    pub fn add_cluster(&mut self, cluster: Cluster) -> MappingResult<()> {
        self.registry.insert_cluster(cluster)
    }

    /// Registers a connection between two existing components.
    pub fn add_connection(&mut self, connection: Connection) -> MappingResult<()> {
        self.registry.insert_connection(connection)
    }

    /// Registers a link between two existing FPGAs.
    pub fn add_link(&mut self, link: Link) -> MappingResult<()> {
        self.registry.insert_link(link)
    }

    // Maintenance

    /// Removes a component along with every connection touching it.
    pub fn remove_component(&mut self, component: &ComponentId) -> MappingResult<()> {
        let group = self.registry.component(component)?.group.clone();
        let touching: Vec<ConnectionId> = self
            .registry
            .connections_touching(component)
            .map(|c| c.id.clone())
            .collect();
        for conn in &touching {
            self.routes.release(&mut self.registry, conn)?;
            self.registry.take_connection(conn)?;
        }
        if let Some(group) = group {
            self.remove_component_from_group(&group, component)?;
        }
        self.registry.take_component(component)?;
        Ok(())
    }

    /// Removes an FPGA that hosts no groups, together with its links.
    pub fn remove_fpga(&mut self, fpga: &FpgaId) -> MappingResult<()> {
        let f = self.registry.fpga(fpga)?;
        if !f.mapped_groups().is_empty() {
            return Err(MappingError::FpgaInUse { fpga: fpga.clone() });
        }
        if let Some(cluster) = f.cluster.clone() {
            self.registry.detach_fpga(&cluster, fpga)?;
        }
        let links: Vec<LinkId> = self
            .registry
            .links()
            .values()
            .filter(|l| l.touches(fpga))
            .map(|l| l.id.clone())
            .collect();
        for link in &links {
            self.remove_link(link)?;
        }
        self.registry.take_fpga(fpga)?;
        Ok(())
    }

    /// Removes a group that is unmapped and empty.
    pub fn remove_group(&mut self, group: &GroupId) -> MappingResult<()> {
        let g = self.registry.group(group)?;
        if let Some(fpga) = g.target() {
            return Err(MappingError::GroupAlreadyMapped {
                group: group.clone(),
                fpga: fpga.clone(),
            });
        }
        if !g.members().is_empty() {
            return Err(MappingError::GroupNotEmpty {
                group: group.clone(),
            });
        }
        self.registry.take_group(group)?;
        Ok(())
    }

    /// Removes a cluster, leaving its FPGAs unclustered.
    pub fn remove_cluster(&mut self, cluster: &ClusterId) -> MappingResult<()> {
        self.registry.take_cluster(cluster)?;
        Ok(())
    }

    /// Unroutes and removes a connection.
    pub fn remove_connection(&mut self, connection: &ConnectionId) -> MappingResult<()> {
        self.registry.connection(connection)?;
        self.routes.release(&mut self.registry, connection)?;
        self.registry.take_connection(connection)?;
        Ok(())
    }

    /// Removes a link after unrouting every connection that crosses it.
    pub fn remove_link(&mut self, link: &LinkId) -> MappingResult<()> {
        let crossing = self.registry.link(link)?.usage().to_vec();
        for conn in &crossing {
            self.routes.release(&mut self.registry, conn)?;
        }
        self.registry.take_link(link)?;
        Ok(())
    }

    /// Changes a connection's density.
    pub fn set_connection_density(
        &mut self,
        connection: &ConnectionId,
        density: f64,
    ) -> MappingResult<()> {
        self.registry.set_connection_density(connection, density)
    }

    /// Changes a link's speed.
    pub fn set_link_speed(&mut self, link: &LinkId, speed: f64) -> MappingResult<()> {
        self.registry.set_link_speed(link, speed)
    }

    /// Adds a component to a group, keeping the group's mapping.
    pub fn add_component_to_group(
        &mut self,
        group: &GroupId,
        component: &ComponentId,
    ) -> MappingResult<()> {
        placement::add_component_to_group(
            &mut self.registry,
            &mut self.routes,
            &self.sink,
            group,
            component,
        )
    }

    /// Removes a component from a group, keeping the group's mapping.
    pub fn remove_component_from_group(
        &mut self,
        group: &GroupId,
        component: &ComponentId,
    ) -> MappingResult<()> {
        placement::remove_component_from_group(
            &mut self.registry,
            &mut self.routes,
            &self.sink,
            group,
            component,
        )
    }

    /// Adds an FPGA to a cluster.
    pub fn add_fpga_to_cluster(&mut self, cluster: &ClusterId, fpga: &FpgaId) -> MappingResult<()> {
        self.registry.attach_fpga(cluster, fpga)
    }

    /// Removes an FPGA from a cluster.
    pub fn remove_fpga_from_cluster(
        &mut self,
        cluster: &ClusterId,
        fpga: &FpgaId,
    ) -> MappingResult<()> {
        self.registry.detach_fpga(cluster, fpga)
    }

    // Run path

    /// Maps a group onto an FPGA by hand and routes its connections.
    pub fn map_group_to_fpga(&mut self, group: &GroupId, fpga: &FpgaId) -> MappingResult<()> {
        placement::map_and_route(&mut self.registry, &mut self.routes, &self.sink, group, fpga)
    }

    /// Unmaps a group and releases its routes.
    pub fn unmap_group(&mut self, group: &GroupId) -> MappingResult<FpgaId> {
        placement::unmap_and_release(&mut self.registry, &mut self.routes, group)
    }

    /// Runs the placement heuristic, returning the groups left unmapped.
    pub fn run_mapping(&mut self) -> MappingResult<Vec<GroupId>> {
        placement::do_mapping(&mut self.registry, &mut self.routes, &self.weights, &self.sink)
    }

    /// Runs the placement heuristic and reports whether it completed.
    ///
    /// Groups left unmapped do not count as failure; callers that need full
    /// coverage check [`all_components_mapped`](Self::all_components_mapped)
    /// or [`verify_full_mapping`](Self::verify_full_mapping).
    pub fn do_mapping(&mut self) -> bool {
        let result = self.run_mapping();
        self.handle(result).is_some()
    }

    /// Drops every entity, route, and diagnostic. Weights and the error
    /// handler are kept.
    pub fn reset(&mut self) {
        self.registry.clear();
        self.routes.clear();
        self.sink.clear();
        info!("mapping session reset");
    }

    /// Unmaps every group.
    pub fn unmap_all(&mut self) -> MappingResult<()> {
        let mapped: Vec<GroupId> = self
            .registry
            .groups()
            .values()
            .filter(|g| g.is_mapped())
            .map(|g| g.id.clone())
            .collect();
        for group in &mapped {
            self.unmap_group(group)?;
        }
        Ok(())
    }

    /// Unmaps every group and empties it. The groups themselves remain.
    pub fn un_group_all(&mut self) -> MappingResult<()> {
        self.unmap_all()?;
        let memberships: Vec<(GroupId, ComponentId)> = self
            .registry
            .groups()
            .values()
            .flat_map(|g| g.members().iter().map(move |m| (g.id.clone(), m.clone())))
            .collect();
        for (group, component) in &memberships {
            self.registry.detach_component(group, component)?;
        }
        Ok(())
    }

    /// Empties every cluster.
    pub fn un_cluster_all(&mut self) {
        self.registry.clear_clusters();
    }

    // Query path

    /// Whether the component's group is mapped.
    pub fn is_component_mapped(&self, component: &ComponentId) -> MappingResult<bool> {
        Ok(self.registry.component_fpga(component)?.is_some())
    }

    /// The FPGA hosting the component, if any.
    pub fn component_fpga_id(&self, component: &ComponentId) -> MappingResult<Option<FpgaId>> {
        Ok(self.registry.component_fpga(component)?.cloned())
    }

    /// Whether every component sits in a mapped group.
    pub fn all_components_mapped(&self) -> bool {
        self.registry.components().values().all(|c| {
            c.group
                .as_ref()
                .and_then(|g| self.registry.groups().get(g))
                .is_some_and(|g| g.is_mapped())
        })
    }

    /// Groups that are not mapped, in ID order.
    pub fn unmapped_groups(&self) -> Vec<GroupId> {
        self.registry
            .groups()
            .values()
            .filter(|g| !g.is_mapped())
            .map(|g| g.id.clone())
            .collect()
    }

    /// Fails with [`MappingError::IncompleteMapping`] unless every component
    /// is mapped.
    pub fn verify_full_mapping(&self) -> MappingResult<()> {
        if self.all_components_mapped() {
            Ok(())
        } else {
            Err(MappingError::IncompleteMapping {
                unmapped: self.unmapped_groups(),
            })
        }
    }

    /// Mean utilization over all FPGAs, or 0 when there are none.
    pub fn average_fpga_resource_utilization(&self) -> f64 {
        let fpgas = self.registry.fpgas();
        if fpgas.is_empty() {
            return 0.0;
        }
        fpgas.values().map(Fpga::utilization).sum::<f64>() / fpgas.len() as f64
    }

    /// Hop counts between every pair of FPGAs.
    pub fn adjacency_matrix(&self) -> AdjacencyMatrix {
        AdjacencyMatrix::build(&self.registry)
    }

    /// Minimum-hop link path between two FPGAs.
    pub fn shortest_link_path(
        &self,
        source: &FpgaId,
        sink: &FpgaId,
    ) -> MappingResult<Option<Vec<LinkId>>> {
        topology::shortest_link_path(&self.registry, source, sink)
    }

    /// The committed path of a connection, if it is routed.
    pub fn routed_path(&self, connection: &ConnectionId) -> MappingResult<Option<&[LinkId]>> {
        self.registry.connection(connection)?;
        Ok(self.routes.path(connection))
    }

    /// Number of connections routed across a link.
    pub fn link_usage(&self, link: &LinkId) -> MappingResult<usize> {
        Ok(self.registry.link(link)?.usage().len())
    }

    /// Density-weighted traffic on a link relative to its speed.
    pub fn link_load(&self, link: &LinkId) -> MappingResult<f64> {
        topology::link_load(&self.registry, link)
    }

    /// Summary of the current placement.
    pub fn report(&self) -> MappingResult<MappingReport> {
        MappingReport::build(&self.registry, &self.routes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;
    use fmap_common::ResourceSet;
    use std::cell::RefCell;
    use std::rc::Rc;

    fn lut(n: u64) -> ResourceSet {
        ResourceSet::new().with("LUT", n)
    }

    fn linked_pair() -> MappingSession {
        let mut s = MappingSession::new();
        s.add_cluster(Cluster::new("board")).unwrap();
        s.add_fpga(Fpga::new("f0", "v5", lut(100)).in_cluster("board"))
            .unwrap();
        s.add_fpga(Fpga::new("f1", "v5", lut(100)).in_cluster("board"))
            .unwrap();
        s.add_link(Link::new("l0", "f0", "f1", 10.0, true)).unwrap();
        s.add_component(Component::new("a", lut(60))).unwrap();
        s.add_component(Component::new("b", lut(60))).unwrap();
        s.add_connection(Connection::new("c0", "a", "b", 4.0)).unwrap();
        s
    }

    #[test]
    fn component_joins_named_group_on_add() {
        let mut s = MappingSession::new();
        s.add_group(Group::new("g")).unwrap();
        s.add_component(Component::new("a", lut(1)).in_group("g"))
            .unwrap();
        assert_eq!(
            s.registry().group(&GroupId::from("g")).unwrap().members(),
            &[ComponentId::from("a")]
        );
    }

    #[test]
    fn bad_group_reference_rolls_back_add() {
        let mut s = MappingSession::new();
        let err = s
            .add_component(Component::new("a", lut(1)).in_group("nope"))
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::IdentifierMissing);
        assert!(s.registry().components().is_empty());
    }

    #[test]
    fn do_mapping_places_and_routes() {
        let mut s = linked_pair();
        assert!(s.do_mapping());
        assert!(s.all_components_mapped());
        assert_eq!(s.link_usage(&LinkId::from("l0")).unwrap(), 1);
        assert!(s.average_fpga_resource_utilization() > 0.0);
        s.verify_full_mapping().unwrap();
    }

    #[test]
    fn handler_sees_fatal_errors() {
        let mut s = MappingSession::new();
        let seen = Rc::new(RefCell::new(Vec::new()));
        let log = Rc::clone(&seen);
        s.set_error_handler(move |e| log.borrow_mut().push(e.kind()));
        s.add_group(Group::new("g")).unwrap();
        s.add_component(Component::new("x", lut(1)).with_architectures(["v5"]).in_group("g"))
            .unwrap();
        s.add_component(Component::new("y", lut(1)).with_architectures(["v6"]).in_group("g"))
            .unwrap();
        assert!(!s.do_mapping());
        assert_eq!(*seen.borrow(), vec![ErrorKind::MappingInfeasible]);
        assert!(s.diagnostics().has_errors());
    }

    #[test]
    fn unmap_all_releases_everything() {
        let mut s = linked_pair();
        assert!(s.do_mapping());
        s.unmap_all().unwrap();
        assert!(!s.all_components_mapped());
        assert_eq!(s.link_usage(&LinkId::from("l0")).unwrap(), 0);
        assert!(s.routes().is_empty());
        for f in s.registry().fpgas().values() {
            assert_eq!(f.used().get("LUT"), 0);
        }
    }

    #[test]
    fn un_group_all_keeps_groups() {
        let mut s = linked_pair();
        assert!(s.do_mapping());
        let groups = s.registry().groups().len();
        s.un_group_all().unwrap();
        assert_eq!(s.registry().groups().len(), groups);
        assert!(s.registry().components().values().all(|c| c.group.is_none()));
    }

    #[test]
    fn un_cluster_all_clears_membership() {
        let mut s = linked_pair();
        s.un_cluster_all();
        assert!(s.registry().fpgas().values().all(|f| f.cluster.is_none()));
    }

    #[test]
    fn remove_component_cascades() {
        let mut s = linked_pair();
        assert!(s.do_mapping());
        s.remove_component(&ComponentId::from("b")).unwrap();
        assert!(s.registry().connections().is_empty());
        assert_eq!(s.link_usage(&LinkId::from("l0")).unwrap(), 0);
        let used: u64 = s.registry().fpgas().values().map(|f| f.used().get("LUT")).sum();
        assert_eq!(used, 60);
    }

    #[test]
    fn fpga_in_use_cannot_be_removed() {
        let mut s = linked_pair();
        assert!(s.do_mapping());
        let host = s.component_fpga_id(&ComponentId::from("a")).unwrap().unwrap();
        let err = s.remove_fpga(&host).unwrap_err();
        assert!(matches!(err, MappingError::FpgaInUse { .. }));
    }

    #[test]
    fn removing_a_link_unroutes_its_traffic() {
        let mut s = linked_pair();
        assert!(s.do_mapping());
        s.remove_link(&LinkId::from("l0")).unwrap();
        assert_eq!(s.routed_path(&ConnectionId::from("c0")).unwrap(), None);
    }

    #[test]
    fn remove_group_requires_unmapped_and_empty() {
        let mut s = MappingSession::new();
        s.add_fpga(Fpga::new("f0", "v5", lut(10))).unwrap();
        s.add_group(Group::new("g")).unwrap();
        s.add_component(Component::new("a", lut(1)).in_group("g"))
            .unwrap();
        let g = GroupId::from("g");
        assert!(matches!(
            s.remove_group(&g),
            Err(MappingError::GroupNotEmpty { .. })
        ));
        s.map_group_to_fpga(&g, &FpgaId::from("f0")).unwrap();
        assert!(matches!(
            s.remove_group(&g),
            Err(MappingError::GroupAlreadyMapped { .. })
        ));
        s.unmap_group(&g).unwrap();
        s.remove_component_from_group(&g, &ComponentId::from("a"))
            .unwrap();
        s.remove_group(&g).unwrap();
    }

    #[test]
    fn reset_empties_the_session() {
        let mut s = linked_pair();
        assert!(s.do_mapping());
        s.reset();
        assert!(s.registry().components().is_empty());
        assert!(s.registry().fpgas().is_empty());
        assert!(s.routes().is_empty());
        assert_eq!(s.average_fpga_resource_utilization(), 0.0);
    }
}
