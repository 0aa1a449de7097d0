//! Configuration types deserialized from `fmap.toml`.

use fmap_common::{InterfaceKind, ResourceSet};
use serde::Deserialize;

/// The top-level project description parsed from `fmap.toml`.
#[derive(Debug, Deserialize)]
pub struct ProjectConfig {
    /// Project metadata.
    pub project: ProjectMeta,
    /// Placement heuristic settings.
    #[serde(default)]
    pub mapping: MappingConfig,
    /// FPGA clusters (boards).
    #[serde(default, rename = "cluster")]
    pub clusters: Vec<ClusterDef>,
    /// Physical FPGAs.
    #[serde(default, rename = "fpga")]
    pub fpgas: Vec<FpgaDef>,
    /// Physical links between FPGAs.
    #[serde(default, rename = "link")]
    pub links: Vec<LinkDef>,
    /// Explicit component groups.
    #[serde(default, rename = "group")]
    pub groups: Vec<GroupDef>,
    /// Logical components of the design.
    #[serde(default, rename = "component")]
    pub components: Vec<ComponentDef>,
    /// Logical connections between components.
    #[serde(default, rename = "connection")]
    pub connections: Vec<ConnectionDef>,
}

/// Core project metadata.
#[derive(Debug, Deserialize)]
pub struct ProjectMeta {
    /// The project name.
    pub name: String,
    /// A brief description of the project.
    #[serde(default)]
    pub description: String,
}

/// Settings for the placement heuristic.
#[derive(Debug, Clone, Deserialize)]
pub struct MappingConfig {
    /// Weight of the I/O-distance term in the range `[0, 1]`. The resource
    /// term is weighted by `1 - io_weight`.
    #[serde(default = "default_io_weight")]
    pub io_weight: f64,
    /// Whether a mapping run that leaves groups unmapped counts as a failure.
    #[serde(default = "default_true")]
    pub require_full_mapping: bool,
}

impl Default for MappingConfig {
    fn default() -> Self {
        Self {
            io_weight: default_io_weight(),
            require_full_mapping: true,
        }
    }
}

fn default_io_weight() -> f64 {
    0.5
}

fn default_true() -> bool {
    true
}

/// A cluster (board) of FPGAs.
#[derive(Debug, Clone, Deserialize)]
pub struct ClusterDef {
    /// Unique cluster ID.
    pub id: String,
    /// Display name; defaults to the ID.
    #[serde(default)]
    pub name: Option<String>,
}

/// A physical FPGA.
#[derive(Debug, Clone, Deserialize)]
pub struct FpgaDef {
    /// Unique FPGA ID.
    pub id: String,
    /// Display name; defaults to the ID.
    #[serde(default)]
    pub name: Option<String>,
    /// Architecture family tag (e.g. `"virtex5"`).
    pub architecture: String,
    /// Total resources of the device.
    #[serde(default)]
    pub resources: ResourceSet,
    /// Infrastructure cost charged once per admitted component.
    #[serde(default)]
    pub overhead: ResourceSet,
    /// Cluster this FPGA belongs to.
    #[serde(default)]
    pub cluster: Option<String>,
    /// Components the platform forces onto this FPGA.
    #[serde(default)]
    pub required: Vec<ComponentDef>,
}

/// A physical link between two FPGAs.
#[derive(Debug, Clone, Deserialize)]
pub struct LinkDef {
    /// Unique link ID.
    pub id: String,
    /// Source FPGA ID.
    pub source: String,
    /// Sink FPGA ID.
    pub sink: String,
    /// Link speed; must be positive.
    pub speed: f64,
    /// Whether traffic may flow in both directions.
    #[serde(default = "default_true")]
    pub bidirectional: bool,
}

/// An explicit group of co-located components.
#[derive(Debug, Clone, Deserialize)]
pub struct GroupDef {
    /// Unique group ID.
    pub id: String,
    /// Display name; defaults to the ID.
    #[serde(default)]
    pub name: Option<String>,
}

/// A logical component.
#[derive(Debug, Clone, Deserialize)]
pub struct ComponentDef {
    /// Unique component ID.
    pub id: String,
    /// Display name; defaults to the ID.
    #[serde(default)]
    pub name: Option<String>,
    /// Resources the component needs.
    #[serde(default)]
    pub resources: ResourceSet,
    /// Architecture families the component supports; empty means any.
    #[serde(default)]
    pub architectures: Vec<String>,
    /// Group to place the component in.
    #[serde(default)]
    pub group: Option<String>,
    /// Named sub-interfaces of the component.
    #[serde(default, rename = "core")]
    pub cores: Vec<CoreDef>,
}

/// A named sub-interface of a component.
#[derive(Debug, Clone, Deserialize)]
pub struct CoreDef {
    /// Instance name, unique within the component.
    pub name: String,
    /// How the interface faces the rest of the system.
    #[serde(default)]
    pub interface: InterfaceKind,
}

/// A logical connection between two components.
#[derive(Debug, Clone, Deserialize)]
pub struct ConnectionDef {
    /// Unique connection ID.
    pub id: String,
    /// Source component ID.
    pub source: String,
    /// Core instance on the source component.
    #[serde(default)]
    pub source_core: Option<String>,
    /// Sink component ID.
    pub sink: String,
    /// Core instance on the sink component.
    #[serde(default)]
    pub sink_core: Option<String>,
    /// Data density; must be positive.
    pub density: f64,
}
