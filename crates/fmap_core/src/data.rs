//! Entity types owned by the mapping registry.
//!
//! Relationships between entities (component to group, group to FPGA, FPGA
//! to cluster) are stored as ID fields and resolved through the
//! [`Registry`](crate::registry::Registry), never as references.

use fmap_common::{
    ArchSupport, ClusterId, ComponentId, ConnectionId, FpgaId, GroupId, InterfaceKind, LinkId,
    ResourceSet,
};
use serde::{Deserialize, Serialize};

/// I/O distance of a node that has not been computed or cannot be reached.
pub const UNKNOWN_DISTANCE: i32 = -1;

/// A named sub-interface of a component.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Core {
    /// Instance name, unique within the owning component.
    pub name: String,
    /// How the interface faces the rest of the system.
    pub interface: InterfaceKind,
}

/// A placement-indivisible logical processing element.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Component {
    /// Unique ID.
    pub id: ComponentId,
    /// Display name.
    pub name: String,
    /// Resources the component consumes on its FPGA.
    pub resources: ResourceSet,
    /// Architectures the component can be placed on.
    pub architectures: ArchSupport,
    /// The group this component belongs to.
    pub group: Option<GroupId>,
    /// Hops from the nearest structural input, or [`UNKNOWN_DISTANCE`].
    pub io_distance: i32,
    /// Named sub-interfaces.
    pub cores: Vec<Core>,
}

impl Component {
    /// Creates an ungrouped component that supports any architecture.
    pub fn new(id: impl Into<ComponentId>, resources: ResourceSet) -> Self {
        let id = id.into();
        Self {
            name: id.to_string(),
            id,
            resources,
            architectures: ArchSupport::Any,
            group: None,
            io_distance: UNKNOWN_DISTANCE,
            cores: Vec::new(),
        }
    }

    /// Sets the display name.
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    /// Restricts the component to the given architecture families.
    ///
    /// An empty list keeps the "any architecture" default.
    pub fn with_architectures<I, S>(mut self, tags: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.architectures = ArchSupport::from_tags(tags);
        self
    }

    /// Adds a named sub-interface.
    pub fn with_core(mut self, name: impl Into<String>, interface: InterfaceKind) -> Self {
        self.cores.push(Core {
            name: name.into(),
            interface,
        });
        self
    }

    /// Requests membership of `group` once the component is registered.
    pub fn in_group(mut self, group: impl Into<GroupId>) -> Self {
        self.group = Some(group.into());
        self
    }
}

/// A physical placement target.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Fpga {
    /// Unique ID.
    pub id: FpgaId,
    /// Display name.
    pub name: String,
    /// Architecture family tag.
    pub architecture: String,
    /// Total resources of the device.
    pub total: ResourceSet,
    /// Resources consumed by mapped groups. Mutated only by the ledger.
    pub(crate) used: ResourceSet,
    /// Infrastructure cost charged once per admitted component.
    pub overhead: ResourceSet,
    /// The cluster this FPGA belongs to.
    pub cluster: Option<ClusterId>,
    /// Hops from the nearest structural input, or [`UNKNOWN_DISTANCE`].
    pub io_distance: i32,
    /// Groups currently mapped onto this FPGA.
    pub(crate) mapped_groups: Vec<GroupId>,
    /// Components the platform forces onto this FPGA.
    pub required: Vec<Component>,
}

impl Fpga {
    /// Creates an unclustered FPGA with nothing mapped.
    pub fn new(id: impl Into<FpgaId>, architecture: impl Into<String>, total: ResourceSet) -> Self {
        let id = id.into();
        let used = total.iter().map(|(name, _)| (name.to_string(), 0)).collect();
        Self {
            name: id.to_string(),
            id,
            architecture: architecture.into(),
            total,
            used,
            overhead: ResourceSet::new(),
            cluster: None,
            io_distance: UNKNOWN_DISTANCE,
            mapped_groups: Vec::new(),
            required: Vec::new(),
        }
    }

    /// Sets the display name.
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    /// Sets the per-component infrastructure overhead.
    pub fn with_overhead(mut self, overhead: ResourceSet) -> Self {
        self.overhead = overhead;
        self
    }

    /// Forces `component` onto this FPGA.
    pub fn with_required(mut self, component: Component) -> Self {
        self.required.push(component);
        self
    }

    /// Requests membership of `cluster` once the FPGA is registered.
    pub fn in_cluster(mut self, cluster: impl Into<ClusterId>) -> Self {
        self.cluster = Some(cluster.into());
        self
    }

    /// Resources consumed by mapped groups.
    pub fn used(&self) -> &ResourceSet {
        &self.used
    }

    /// Resources still free: `total - used` for every listed resource.
    pub fn available(&self) -> ResourceSet {
        self.total.saturating_sub(&self.used)
    }

    /// Groups currently mapped onto this FPGA.
    pub fn mapped_groups(&self) -> &[GroupId] {
        &self.mapped_groups
    }

    /// Mean of `used / total` over the resources with a positive total.
    pub fn utilization(&self) -> f64 {
        let mut sum = 0.0;
        let mut count = 0usize;
        for (name, total) in self.total.iter() {
            if total > 0 {
                sum += self.used.get(name) as f64 / total as f64;
                count += 1;
            }
        }
        if count == 0 {
            0.0
        } else {
            sum / count as f64
        }
    }
}

/// The atomic unit of placement: components that must be co-located.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Group {
    /// Unique ID.
    pub id: GroupId,
    /// Display name.
    pub name: String,
    /// Member components.
    pub(crate) members: Vec<ComponentId>,
    /// Target FPGA; `Some` exactly when the group is mapped.
    pub(crate) target: Option<FpgaId>,
    /// Intersection of the members' architecture support.
    pub(crate) architectures: ArchSupport,
}

impl Group {
    /// Creates an empty, unmapped group.
    pub fn new(id: impl Into<GroupId>) -> Self {
        let id = id.into();
        Self {
            name: id.to_string(),
            id,
            members: Vec::new(),
            target: None,
            architectures: ArchSupport::Any,
        }
    }

    /// Sets the display name.
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    /// Member components.
    pub fn members(&self) -> &[ComponentId] {
        &self.members
    }

    /// Whether the group is mapped onto an FPGA.
    pub fn is_mapped(&self) -> bool {
        self.target.is_some()
    }

    /// The FPGA this group is mapped onto.
    pub fn target(&self) -> Option<&FpgaId> {
        self.target.as_ref()
    }

    /// Architectures every member supports.
    pub fn architectures(&self) -> &ArchSupport {
        &self.architectures
    }
}

/// A named set of FPGAs (a board).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Cluster {
    /// Unique ID.
    pub id: ClusterId,
    /// Display name.
    pub name: String,
    /// Member FPGAs.
    pub(crate) fpgas: Vec<FpgaId>,
}

impl Cluster {
    /// Creates an empty cluster.
    pub fn new(id: impl Into<ClusterId>) -> Self {
        let id = id.into();
        Self {
            name: id.to_string(),
            id,
            fpgas: Vec::new(),
        }
    }

    /// Sets the display name.
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    /// Member FPGAs.
    pub fn fpgas(&self) -> &[FpgaId] {
        &self.fpgas
    }
}

/// A directed logical data-flow edge between two components.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Connection {
    /// Unique ID.
    pub id: ConnectionId,
    /// Source component.
    pub source: ComponentId,
    /// Core instance on the source component.
    pub source_core: Option<String>,
    /// Sink component.
    pub sink: ComponentId,
    /// Core instance on the sink component.
    pub sink_core: Option<String>,
    /// Raw data density; always positive.
    pub(crate) density: f64,
    /// `density / min(density)` across all connections.
    pub(crate) normalized_density: f64,
}

impl Connection {
    /// Creates a connection with no core instance named on either end.
    pub fn new(
        id: impl Into<ConnectionId>,
        source: impl Into<ComponentId>,
        sink: impl Into<ComponentId>,
        density: f64,
    ) -> Self {
        Self {
            id: id.into(),
            source: source.into(),
            source_core: None,
            sink: sink.into(),
            sink_core: None,
            density,
            normalized_density: 1.0,
        }
    }

    /// Attaches the connection to named cores on each end.
    pub fn with_cores(mut self, source_core: Option<String>, sink_core: Option<String>) -> Self {
        self.source_core = source_core;
        self.sink_core = sink_core;
        self
    }

    /// Raw data density.
    pub fn density(&self) -> f64 {
        self.density
    }

    /// Density relative to the least dense connection (always >= 1).
    pub fn normalized_density(&self) -> f64 {
        self.normalized_density
    }

    /// Whether `component` is either endpoint.
    pub fn touches(&self, component: &ComponentId) -> bool {
        &self.source == component || &self.sink == component
    }

    /// The endpoint opposite `component`, if `component` is an endpoint.
    pub fn other_end(&self, component: &ComponentId) -> Option<&ComponentId> {
        if &self.source == component {
            Some(&self.sink)
        } else if &self.sink == component {
            Some(&self.source)
        } else {
            None
        }
    }
}

/// A physical edge between two FPGAs.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Link {
    /// Unique ID.
    pub id: LinkId,
    /// Source FPGA.
    pub source: FpgaId,
    /// Sink FPGA.
    pub sink: FpgaId,
    /// Whether traffic may flow sink to source as well.
    pub bidirectional: bool,
    /// Raw speed; always positive.
    pub(crate) speed: f64,
    /// `speed / max(speed)` across all links.
    pub(crate) normalized_speed: f64,
    /// Connections currently routed across this link.
    pub(crate) usage: Vec<ConnectionId>,
}

impl Link {
    /// Creates a link with no traffic.
    pub fn new(
        id: impl Into<LinkId>,
        source: impl Into<FpgaId>,
        sink: impl Into<FpgaId>,
        speed: f64,
        bidirectional: bool,
    ) -> Self {
        Self {
            id: id.into(),
            source: source.into(),
            sink: sink.into(),
            bidirectional,
            speed,
            normalized_speed: 1.0,
            usage: Vec::new(),
        }
    }

    /// Raw speed.
    pub fn speed(&self) -> f64 {
        self.speed
    }

    /// Speed relative to the fastest link (in `(0, 1]`).
    pub fn normalized_speed(&self) -> f64 {
        self.normalized_speed
    }

    /// Connections currently routed across this link.
    pub fn usage(&self) -> &[ConnectionId] {
        &self.usage
    }

    /// Whether `fpga` is either endpoint.
    pub fn touches(&self, fpga: &FpgaId) -> bool {
        &self.source == fpga || &self.sink == fpga
    }

    /// The FPGA reached by traversing this link from `from`, honoring
    /// direction.
    pub fn traverse_from(&self, from: &FpgaId) -> Option<&FpgaId> {
        if &self.source == from {
            Some(&self.sink)
        } else if self.bidirectional && &self.sink == from {
            Some(&self.source)
        } else {
            None
        }
    }
}
