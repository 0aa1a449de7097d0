//! Multi-FPGA mapping engine.
//!
//! Assigns the components of a logical design to the FPGAs of a fixed
//! platform, respecting per-FPGA resource budgets and architecture
//! compatibility while keeping communicating components close together and
//! spreading traffic across the physical links.
//!
//! # Pipeline
//!
//! 1. **Load**: register components, FPGAs, groups, clusters, connections,
//!    and links through a [`MappingSession`]
//! 2. **Group**: required components join their FPGA's group, the rest get
//!    singleton groups
//! 3. **Analyse**: connectivity islands, I/O distances, and all-pairs FPGA
//!    hop counts
//! 4. **Place**: greedy group-by-group placement onto the best-scoring FPGA
//! 5. **Route**: connections between placed groups follow shortest link
//!    paths
//!
//! # Usage
//!
//! ```ignore
//! use fmap_core::{Component, Fpga, MappingSession};
//!
//! let mut session = MappingSession::new();
//! session.add_fpga(Fpga::new("f0", "virtex5", resources))?;
//! session.add_component(Component::new("filter", demand))?;
//! assert!(session.do_mapping());
//! assert!(session.all_components_mapped());
//! ```

#![warn(missing_docs)]

mod cluster;
pub mod data;
pub mod distance;
pub mod error;
mod group;
mod ledger;
pub mod placement;
pub mod registry;
pub mod report;
pub mod session;
pub mod subsystem;
pub mod topology;

pub use data::{Cluster, Component, Connection, Core, Fpga, Group, Link, UNKNOWN_DISTANCE};
pub use error::{EntityKind, ErrorKind, MappingError, MappingResult};
pub use placement::MappingWeights;
pub use registry::Registry;
pub use report::MappingReport;
pub use session::{ErrorHandler, MappingSession};
pub use subsystem::Subsystems;
pub use topology::{AdjacencyMatrix, RouteTable, NO_PATH};
