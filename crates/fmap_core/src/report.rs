//! Serializable summary of a placement.

use crate::error::MappingResult;
use crate::registry::Registry;
use crate::topology::{link_load, RouteTable};
use fmap_common::{ComponentId, ConnectionId, FpgaId, GroupId, LinkId, ResourceSet};
use serde::Serialize;

/// Where one group ended up.
#[derive(Debug, Clone, Serialize)]
pub struct GroupPlacement {
    /// The group.
    pub group: GroupId,
    /// Its FPGA, or `None` if unmapped.
    pub fpga: Option<FpgaId>,
    /// Its members.
    pub members: Vec<ComponentId>,
}

/// Resource usage of one FPGA.
#[derive(Debug, Clone, Serialize)]
pub struct FpgaUsage {
    /// The FPGA.
    pub fpga: FpgaId,
    /// Its architecture family.
    pub architecture: String,
    /// Mean used/total ratio.
    pub utilization: f64,
    /// Consumed resources.
    pub used: ResourceSet,
    /// Total resources.
    pub total: ResourceSet,
    /// Groups mapped onto it.
    pub groups: Vec<GroupId>,
}

/// Traffic on one link.
#[derive(Debug, Clone, Serialize)]
pub struct LinkTraffic {
    /// The link.
    pub link: LinkId,
    /// Source FPGA.
    pub source: FpgaId,
    /// Sink FPGA.
    pub sink: FpgaId,
    /// Connections routed across it.
    pub connections: Vec<ConnectionId>,
    /// Normalized density over normalized speed.
    pub load: f64,
}

/// A snapshot of the placement, suitable for printing or JSON output.
#[derive(Debug, Clone, Serialize)]
pub struct MappingReport {
    /// Every group with its target.
    pub groups: Vec<GroupPlacement>,
    /// Every FPGA with its usage.
    pub fpgas: Vec<FpgaUsage>,
    /// Every link with its traffic.
    pub links: Vec<LinkTraffic>,
    /// Groups left unmapped.
    pub unmapped_groups: Vec<GroupId>,
    /// Connections whose ends sit on different FPGAs but have no route.
    pub unrouted_connections: Vec<ConnectionId>,
    /// Mean utilization across all FPGAs.
    pub average_utilization: f64,
}

impl MappingReport {
    /// Captures the current state of `registry` and `routes`.
    pub fn build(registry: &Registry, routes: &RouteTable) -> MappingResult<Self> {
        let groups = registry
            .groups()
            .values()
            .map(|g| GroupPlacement {
                group: g.id.clone(),
                fpga: g.target().cloned(),
                members: g.members().to_vec(),
            })
            .collect();

        let fpgas: Vec<FpgaUsage> = registry
            .fpgas()
            .values()
            .map(|f| FpgaUsage {
                fpga: f.id.clone(),
                architecture: f.architecture.clone(),
                utilization: f.utilization(),
                used: f.used().clone(),
                total: f.total.clone(),
                groups: f.mapped_groups().to_vec(),
            })
            .collect();

        let mut links = Vec::new();
        for l in registry.links().values() {
            links.push(LinkTraffic {
                link: l.id.clone(),
                source: l.source.clone(),
                sink: l.sink.clone(),
                connections: l.usage().to_vec(),
                load: link_load(registry, &l.id)?,
            });
        }

        let unmapped_groups = registry
            .groups()
            .values()
            .filter(|g| !g.is_mapped())
            .map(|g| g.id.clone())
            .collect();

        let mut unrouted_connections = Vec::new();
        for c in registry.connections().values() {
            let from = registry.component_fpga(&c.source)?;
            let to = registry.component_fpga(&c.sink)?;
            if let (Some(from), Some(to)) = (from, to) {
                if from != to && !routes.is_routed(&c.id) {
                    unrouted_connections.push(c.id.clone());
                }
            }
        }

        let average_utilization = if fpgas.is_empty() {
            0.0
        } else {
            fpgas.iter().map(|f| f.utilization).sum::<f64>() / fpgas.len() as f64
        };

        Ok(Self {
            groups,
            fpgas,
            links,
            unmapped_groups,
            unrouted_connections,
            average_utilization,
        })
    }

    /// Whether every group is mapped.
    pub fn is_complete(&self) -> bool {
        self.unmapped_groups.is_empty()
    }
}
