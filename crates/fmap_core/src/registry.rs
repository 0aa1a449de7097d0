//! ID-keyed arenas for every entity kind.
//!
//! The [`Registry`] owns all components, FPGAs, groups, clusters,
//! connections, and links. Lookups go through one accessor per kind that
//! reports a missing ID as [`MappingError::IdMissing`] uniformly. Collections
//! are `BTreeMap`s so every iteration is in ID order.

use crate::data::{Cluster, Component, Connection, Fpga, Group, Link};
use crate::error::{EntityKind, MappingError, MappingResult};
use fmap_common::{ClusterId, ComponentId, ConnectionId, FpgaId, GroupId, LinkId};
use std::collections::BTreeMap;
use std::fmt::Display;

/// Owner of every entity in a mapping session.
#[derive(Debug, Clone, Default)]
pub struct Registry {
    pub(crate) components: BTreeMap<ComponentId, Component>,
    pub(crate) fpgas: BTreeMap<FpgaId, Fpga>,
    pub(crate) groups: BTreeMap<GroupId, Group>,
    pub(crate) clusters: BTreeMap<ClusterId, Cluster>,
    pub(crate) connections: BTreeMap<ConnectionId, Connection>,
    pub(crate) links: BTreeMap<LinkId, Link>,
}

fn lookup<'a, K: Ord + Display, V>(
    map: &'a BTreeMap<K, V>,
    id: &K,
    entity: EntityKind,
) -> MappingResult<&'a V> {
    map.get(id).ok_or_else(|| MappingError::missing(entity, id))
}

fn lookup_mut<'a, K: Ord + Display, V>(
    map: &'a mut BTreeMap<K, V>,
    id: &K,
    entity: EntityKind,
) -> MappingResult<&'a mut V> {
    map.get_mut(id).ok_or_else(|| MappingError::missing(entity, id))
}

fn ensure_vacant<K: Ord + Display, V>(
    map: &BTreeMap<K, V>,
    id: &K,
    entity: EntityKind,
) -> MappingResult<()> {
    if map.contains_key(id) {
        return Err(MappingError::IdAlreadyExists {
            entity,
            id: id.to_string(),
        });
    }
    Ok(())
}

fn ensure_positive(what: &'static str, value: f64) -> MappingResult<()> {
    if value > 0.0 && value.is_finite() {
        Ok(())
    } else {
        Err(MappingError::InvalidValue { what, value })
    }
}

impl Registry {
    /// Creates an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// All components, keyed by ID.
    pub fn components(&self) -> &BTreeMap<ComponentId, Component> {
        &self.components
    }

    /// All FPGAs, keyed by ID.
    pub fn fpgas(&self) -> &BTreeMap<FpgaId, Fpga> {
        &self.fpgas
    }

    /// All groups, keyed by ID.
    pub fn groups(&self) -> &BTreeMap<GroupId, Group> {
        &self.groups
    }

    /// All clusters, keyed by ID.
    pub fn clusters(&self) -> &BTreeMap<ClusterId, Cluster> {
        &self.clusters
    }

    /// All connections, keyed by ID.
    pub fn connections(&self) -> &BTreeMap<ConnectionId, Connection> {
        &self.connections
    }

    /// All links, keyed by ID.
    pub fn links(&self) -> &BTreeMap<LinkId, Link> {
        &self.links
    }

    /// Looks up a component.
    pub fn component(&self, id: &ComponentId) -> MappingResult<&Component> {
        lookup(&self.components, id, EntityKind::Component)
    }

    /// Looks up an FPGA.
    pub fn fpga(&self, id: &FpgaId) -> MappingResult<&Fpga> {
        lookup(&self.fpgas, id, EntityKind::Fpga)
    }

    /// Looks up a group.
    pub fn group(&self, id: &GroupId) -> MappingResult<&Group> {
        lookup(&self.groups, id, EntityKind::Group)
    }

    /// Looks up a cluster.
    pub fn cluster(&self, id: &ClusterId) -> MappingResult<&Cluster> {
        lookup(&self.clusters, id, EntityKind::Cluster)
    }

    /// Looks up a connection.
    pub fn connection(&self, id: &ConnectionId) -> MappingResult<&Connection> {
        lookup(&self.connections, id, EntityKind::Connection)
    }

    /// Looks up a link.
    pub fn link(&self, id: &LinkId) -> MappingResult<&Link> {
        lookup(&self.links, id, EntityKind::Link)
    }

    pub(crate) fn component_mut(&mut self, id: &ComponentId) -> MappingResult<&mut Component> {
        lookup_mut(&mut self.components, id, EntityKind::Component)
    }

    pub(crate) fn fpga_mut(&mut self, id: &FpgaId) -> MappingResult<&mut Fpga> {
        lookup_mut(&mut self.fpgas, id, EntityKind::Fpga)
    }

    pub(crate) fn group_mut(&mut self, id: &GroupId) -> MappingResult<&mut Group> {
        lookup_mut(&mut self.groups, id, EntityKind::Group)
    }

    pub(crate) fn cluster_mut(&mut self, id: &ClusterId) -> MappingResult<&mut Cluster> {
        lookup_mut(&mut self.clusters, id, EntityKind::Cluster)
    }

    pub(crate) fn connection_mut(&mut self, id: &ConnectionId) -> MappingResult<&mut Connection> {
        lookup_mut(&mut self.connections, id, EntityKind::Connection)
    }

    pub(crate) fn link_mut(&mut self, id: &LinkId) -> MappingResult<&mut Link> {
        lookup_mut(&mut self.links, id, EntityKind::Link)
    }

    /// The FPGA hosting `component`, if its group is mapped.
    pub fn component_fpga(&self, component: &ComponentId) -> MappingResult<Option<&FpgaId>> {
        let c = self.component(component)?;
        match &c.group {
            Some(g) => Ok(self.group(g)?.target()),
            None => Ok(None),
        }
    }

    /// Registers a component with no group membership.
    ///
    /// Group membership is established separately so that architecture
    /// intersections and mapped-group discipline stay in one place.
    pub(crate) fn insert_component(&mut self, mut component: Component) -> MappingResult<()> {
        ensure_vacant(&self.components, &component.id, EntityKind::Component)?;
        component.group = None;
        self.components.insert(component.id.clone(), component);
        Ok(())
    }

    /// Registers an FPGA with nothing mapped and no cluster.
    pub(crate) fn insert_fpga(&mut self, mut fpga: Fpga) -> MappingResult<()> {
        ensure_vacant(&self.fpgas, &fpga.id, EntityKind::Fpga)?;
        fpga.cluster = None;
        fpga.mapped_groups.clear();
        fpga.used = fpga.total.iter().map(|(n, _)| (n.to_string(), 0)).collect();
        self.fpgas.insert(fpga.id.clone(), fpga);
        Ok(())
    }

    /// Registers an empty, unmapped group.
    pub(crate) fn insert_group(&mut self, mut group: Group) -> MappingResult<()> {
        ensure_vacant(&self.groups, &group.id, EntityKind::Group)?;
        group.members.clear();
        group.target = None;
        group.architectures = fmap_common::ArchSupport::Any;
        self.groups.insert(group.id.clone(), group);
        Ok(())
    }

    /// Registers an empty cluster.
    pub(crate) fn insert_cluster(&mut self, mut cluster: Cluster) -> MappingResult<()> {
        ensure_vacant(&self.clusters, &cluster.id, EntityKind::Cluster)?;
        cluster.fpgas.clear();
        self.clusters.insert(cluster.id.clone(), cluster);
        Ok(())
    }

    /// Registers a connection after checking both endpoints and the density,
    /// then renormalizes all densities.
    pub(crate) fn insert_connection(&mut self, connection: Connection) -> MappingResult<()> {
        ensure_vacant(&self.connections, &connection.id, EntityKind::Connection)?;
        if !self.components.contains_key(&connection.source) {
            return Err(MappingError::SourceDoesNotExist {
                entity: EntityKind::Connection,
                id: connection.id.to_string(),
                endpoint: connection.source.to_string(),
            });
        }
        if !self.components.contains_key(&connection.sink) {
            return Err(MappingError::SinkDoesNotExist {
                entity: EntityKind::Connection,
                id: connection.id.to_string(),
                endpoint: connection.sink.to_string(),
            });
        }
        ensure_positive("connection density", connection.density)?;
        self.connections.insert(connection.id.clone(), connection);
        self.normalize_connection_densities();
        Ok(())
    }

    /// Registers a link after checking both endpoints and the speed, then
    /// renormalizes all speeds.
    pub(crate) fn insert_link(&mut self, mut link: Link) -> MappingResult<()> {
        ensure_vacant(&self.links, &link.id, EntityKind::Link)?;
        if !self.fpgas.contains_key(&link.source) {
            return Err(MappingError::SourceDoesNotExist {
                entity: EntityKind::Link,
                id: link.id.to_string(),
                endpoint: link.source.to_string(),
            });
        }
        if !self.fpgas.contains_key(&link.sink) {
            return Err(MappingError::SinkDoesNotExist {
                entity: EntityKind::Link,
                id: link.id.to_string(),
                endpoint: link.sink.to_string(),
            });
        }
        ensure_positive("link speed", link.speed)?;
        link.usage.clear();
        self.links.insert(link.id.clone(), link);
        self.normalize_link_speeds();
        Ok(())
    }

    /// Removes a component entry. Callers detach it and drop its connections
    /// first.
    pub(crate) fn take_component(&mut self, id: &ComponentId) -> MappingResult<Component> {
        self.components
            .remove(id)
            .ok_or_else(|| MappingError::missing(EntityKind::Component, id))
    }

    /// Removes an FPGA entry. Callers unmap and unlink it first.
    pub(crate) fn take_fpga(&mut self, id: &FpgaId) -> MappingResult<Fpga> {
        self.fpgas
            .remove(id)
            .ok_or_else(|| MappingError::missing(EntityKind::Fpga, id))
    }

    /// Removes a group entry. Callers unmap and empty it first.
    pub(crate) fn take_group(&mut self, id: &GroupId) -> MappingResult<Group> {
        self.groups
            .remove(id)
            .ok_or_else(|| MappingError::missing(EntityKind::Group, id))
    }

    /// Removes a cluster entry and clears the membership of its FPGAs.
    pub(crate) fn take_cluster(&mut self, id: &ClusterId) -> MappingResult<Cluster> {
        let cluster = self
            .clusters
            .remove(id)
            .ok_or_else(|| MappingError::missing(EntityKind::Cluster, id))?;
        for fpga in &cluster.fpgas {
            if let Some(f) = self.fpgas.get_mut(fpga) {
                f.cluster = None;
            }
        }
        Ok(cluster)
    }

    /// Removes a connection entry and renormalizes. Callers release its route
    /// first.
    pub(crate) fn take_connection(&mut self, id: &ConnectionId) -> MappingResult<Connection> {
        let conn = self
            .connections
            .remove(id)
            .ok_or_else(|| MappingError::missing(EntityKind::Connection, id))?;
        self.normalize_connection_densities();
        Ok(conn)
    }

    /// Removes a link entry and renormalizes. Callers release the routes
    /// crossing it first.
    pub(crate) fn take_link(&mut self, id: &LinkId) -> MappingResult<Link> {
        let link = self
            .links
            .remove(id)
            .ok_or_else(|| MappingError::missing(EntityKind::Link, id))?;
        self.normalize_link_speeds();
        Ok(link)
    }

    /// Changes a connection's density and renormalizes.
    pub(crate) fn set_connection_density(
        &mut self,
        id: &ConnectionId,
        density: f64,
    ) -> MappingResult<()> {
        ensure_positive("connection density", density)?;
        self.connection_mut(id)?.density = density;
        self.normalize_connection_densities();
        Ok(())
    }

    /// Changes a link's speed and renormalizes.
    pub(crate) fn set_link_speed(&mut self, id: &LinkId, speed: f64) -> MappingResult<()> {
        ensure_positive("link speed", speed)?;
        self.link_mut(id)?.speed = speed;
        self.normalize_link_speeds();
        Ok(())
    }

    /// Recomputes every connection's density relative to the minimum.
    pub fn normalize_connection_densities(&mut self) {
        let min = self
            .connections
            .values()
            .map(|c| c.density)
            .fold(f64::INFINITY, f64::min);
        for c in self.connections.values_mut() {
            c.normalized_density = c.density / min;
        }
    }

    /// Recomputes every link's speed relative to the maximum.
    pub fn normalize_link_speeds(&mut self) {
        let max = self
            .links
            .values()
            .map(|l| l.speed)
            .fold(0.0, f64::max);
        for l in self.links.values_mut() {
            l.normalized_speed = l.speed / max;
        }
    }

    /// Connections with `component` at either end, in ID order.
    pub fn connections_touching<'a>(
        &'a self,
        component: &'a ComponentId,
    ) -> impl Iterator<Item = &'a Connection> + 'a {
        self.connections.values().filter(move |c| c.touches(component))
    }

    /// Drops every entity.
    pub fn clear(&mut self) {
        *self = Registry::default();
    }
}
