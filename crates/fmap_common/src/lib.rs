//! Shared foundational types used across the fmap multi-FPGA mapper.
//!
//! This crate provides string-keyed entity identifiers, the named resource
//! vector model with its scoring function, architecture-support sets, and
//! interface-type tags.

#![warn(missing_docs)]

pub mod arch;
pub mod ids;
pub mod interface;
pub mod resource;

pub use arch::ArchSupport;
pub use ids::{ClusterId, ComponentId, ConnectionId, FpgaId, GroupId, LinkId};
pub use interface::InterfaceKind;
pub use resource::{score_against_average, score_resource_set, ResourceSet, UNSATISFIABLE};
