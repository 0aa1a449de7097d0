//! Error taxonomy for the mapping engine.
//!
//! Every fallible engine operation returns [`MappingResult`]. Each
//! [`MappingError`] variant belongs to one [`ErrorKind`], which is what callers
//! and the session's error hook dispatch on.

use fmap_common::{ClusterId, ComponentId, ConnectionId, FpgaId, GroupId, LinkId};
use fmap_diagnostics::{Category, DiagnosticCode};
use std::fmt;

/// The standard result type for engine operations.
pub type MappingResult<T> = Result<T, MappingError>;

/// The kind of entity an error refers to.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
pub enum EntityKind {
    /// A logical component.
    Component,
    /// A physical FPGA.
    Fpga,
    /// A component group.
    Group,
    /// An FPGA cluster.
    Cluster,
    /// A logical connection.
    Connection,
    /// A physical link.
    Link,
}

impl fmt::Display for EntityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            EntityKind::Component => "component",
            EntityKind::Fpga => "FPGA",
            EntityKind::Group => "group",
            EntityKind::Cluster => "cluster",
            EntityKind::Connection => "connection",
            EntityKind::Link => "link",
        };
        f.write_str(name)
    }
}

/// Coarse classification of a [`MappingError`].
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
pub enum ErrorKind {
    /// Duplicate ID on insert.
    IdentifierConflict,
    /// Reference to an entity that does not exist.
    IdentifierMissing,
    /// Component already in another group, or group still has members.
    AlreadyGrouped,
    /// Component is not a member of the named group.
    NotGrouped,
    /// Group already mapped, or FPGA still hosts groups.
    AlreadyMapped,
    /// Group is not mapped.
    NotMapped,
    /// FPGA already in another cluster.
    AlreadyClustered,
    /// FPGA is not in the named cluster.
    NotClustered,
    /// Capacity check failed.
    InsufficientResources,
    /// Non-positive density or speed, or another out-of-range value.
    InvalidValue,
    /// No common architecture, or groups left unmapped where full coverage
    /// was required.
    MappingInfeasible,
    /// A link's usage tally disagrees with the routes applied to it.
    LinkUsageInconsistency,
    /// A resource ledger disagrees with the groups mapped onto it.
    InvariantViolation,
}

impl ErrorKind {
    /// Returns the diagnostic code used when reporting this kind.
    pub fn code(self) -> DiagnosticCode {
        let number = match self {
            ErrorKind::IdentifierConflict => 101,
            ErrorKind::IdentifierMissing => 102,
            ErrorKind::AlreadyGrouped => 103,
            ErrorKind::NotGrouped => 104,
            ErrorKind::AlreadyMapped => 105,
            ErrorKind::NotMapped => 106,
            ErrorKind::AlreadyClustered => 107,
            ErrorKind::NotClustered => 108,
            ErrorKind::InsufficientResources => 109,
            ErrorKind::InvalidValue => 110,
            ErrorKind::MappingInfeasible => 111,
            ErrorKind::LinkUsageInconsistency => 112,
            ErrorKind::InvariantViolation => 113,
        };
        DiagnosticCode::new(Category::Error, number)
    }
}

/// An error raised by a mapping engine operation.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum MappingError {
    /// An entity with the same ID is already registered.
    #[error("{entity} '{id}' already exists")]
    IdAlreadyExists {
        /// Kind of the entity being inserted.
        entity: EntityKind,
        /// The conflicting ID.
        id: String,
    },

    /// A referenced entity is not registered.
    #[error("{entity} '{id}' does not exist")]
    IdMissing {
        /// Kind of the missing entity.
        entity: EntityKind,
        /// The missing ID.
        id: String,
    },

    /// A connection or link names a source endpoint that does not exist.
    #[error("{entity} '{id}' names source '{endpoint}' which does not exist")]
    SourceDoesNotExist {
        /// Connection or link.
        entity: EntityKind,
        /// ID of the connection or link.
        id: String,
        /// The dangling endpoint ID.
        endpoint: String,
    },

    /// A connection or link names a sink endpoint that does not exist.
    #[error("{entity} '{id}' names sink '{endpoint}' which does not exist")]
    SinkDoesNotExist {
        /// Connection or link.
        entity: EntityKind,
        /// ID of the connection or link.
        id: String,
        /// The dangling endpoint ID.
        endpoint: String,
    },

    /// The component already belongs to a different group.
    #[error("component '{component}' already belongs to group '{group}'")]
    ComponentAlreadyGrouped {
        /// The component being added.
        component: ComponentId,
        /// The group it currently belongs to.
        group: GroupId,
    },

    /// The component is not a member of the group.
    #[error("component '{component}' is not a member of group '{group}'")]
    ComponentNotGrouped {
        /// The component being removed.
        component: ComponentId,
        /// The group it was expected in.
        group: GroupId,
    },

    /// The group still has members and cannot be removed.
    #[error("group '{group}' still has members")]
    GroupNotEmpty {
        /// The group being removed.
        group: GroupId,
    },

    /// The group is already mapped.
    #[error("group '{group}' is already mapped to FPGA '{fpga}'")]
    GroupAlreadyMapped {
        /// The group.
        group: GroupId,
        /// Its current target.
        fpga: FpgaId,
    },

    /// The group is not mapped.
    #[error("group '{group}' is not mapped")]
    GroupNotMapped {
        /// The group.
        group: GroupId,
    },

    /// The FPGA still hosts groups and cannot be removed.
    #[error("FPGA '{fpga}' still hosts mapped groups")]
    FpgaInUse {
        /// The FPGA being removed.
        fpga: FpgaId,
    },

    /// The FPGA already belongs to a different cluster.
    #[error("FPGA '{fpga}' already belongs to cluster '{cluster}'")]
    FpgaAlreadyClustered {
        /// The FPGA being added.
        fpga: FpgaId,
        /// The cluster it currently belongs to.
        cluster: ClusterId,
    },

    /// The FPGA is not a member of the cluster.
    #[error("FPGA '{fpga}' is not a member of cluster '{cluster}'")]
    FpgaNotClustered {
        /// The FPGA being removed.
        fpga: FpgaId,
        /// The cluster it was expected in.
        cluster: ClusterId,
    },

    /// The FPGA cannot admit the group.
    #[error("FPGA '{fpga}' has insufficient resources for group '{group}'")]
    InsufficientResources {
        /// The group being mapped.
        group: GroupId,
        /// The target FPGA.
        fpga: FpgaId,
    },

    /// A numeric value is out of range.
    #[error("invalid {what}: {value}")]
    InvalidValue {
        /// What the value describes.
        what: &'static str,
        /// The rejected value.
        value: f64,
    },

    /// The group's members share no architecture family.
    #[error("group '{group}' has no architecture common to all of its members")]
    NoCommonArchitecture {
        /// The unplaceable group.
        group: GroupId,
    },

    /// Groups remain unmapped where full coverage was required.
    #[error("{} group(s) could not be mapped", unmapped.len())]
    IncompleteMapping {
        /// The groups left unmapped.
        unmapped: Vec<GroupId>,
    },

    /// A link does not carry a connection that a route says it should.
    #[error("link '{link}' does not carry connection '{connection}'")]
    LinkUsageInconsistency {
        /// The link.
        link: LinkId,
        /// The connection expected on it.
        connection: ConnectionId,
    },

    /// An FPGA's used-resource ledger disagrees with its mapped groups.
    #[error("resource ledger of FPGA '{fpga}' is inconsistent: {detail}")]
    LedgerInconsistency {
        /// The FPGA.
        fpga: FpgaId,
        /// What went wrong.
        detail: String,
    },
}

impl MappingError {
    /// Returns the taxonomy kind of this error.
    pub fn kind(&self) -> ErrorKind {
        match self {
            MappingError::IdAlreadyExists { .. } => ErrorKind::IdentifierConflict,
            MappingError::IdMissing { .. }
            | MappingError::SourceDoesNotExist { .. }
            | MappingError::SinkDoesNotExist { .. } => ErrorKind::IdentifierMissing,
            MappingError::ComponentAlreadyGrouped { .. } | MappingError::GroupNotEmpty { .. } => {
                ErrorKind::AlreadyGrouped
            }
            MappingError::ComponentNotGrouped { .. } => ErrorKind::NotGrouped,
            MappingError::GroupAlreadyMapped { .. } | MappingError::FpgaInUse { .. } => {
                ErrorKind::AlreadyMapped
            }
            MappingError::GroupNotMapped { .. } => ErrorKind::NotMapped,
            MappingError::FpgaAlreadyClustered { .. } => ErrorKind::AlreadyClustered,
            MappingError::FpgaNotClustered { .. } => ErrorKind::NotClustered,
            MappingError::InsufficientResources { .. } => ErrorKind::InsufficientResources,
            MappingError::InvalidValue { .. } => ErrorKind::InvalidValue,
            MappingError::NoCommonArchitecture { .. } | MappingError::IncompleteMapping { .. } => {
                ErrorKind::MappingInfeasible
            }
            MappingError::LinkUsageInconsistency { .. } => ErrorKind::LinkUsageInconsistency,
            MappingError::LedgerInconsistency { .. } => ErrorKind::InvariantViolation,
        }
    }

    /// Returns the ID of the entity this error is mainly about.
    pub fn subject(&self) -> Option<String> {
        match self {
            MappingError::IdAlreadyExists { id, .. }
            | MappingError::IdMissing { id, .. }
            | MappingError::SourceDoesNotExist { id, .. }
            | MappingError::SinkDoesNotExist { id, .. } => Some(id.clone()),
            MappingError::ComponentAlreadyGrouped { component, .. }
            | MappingError::ComponentNotGrouped { component, .. } => Some(component.to_string()),
            MappingError::GroupNotEmpty { group }
            | MappingError::GroupAlreadyMapped { group, .. }
            | MappingError::GroupNotMapped { group }
            | MappingError::InsufficientResources { group, .. }
            | MappingError::NoCommonArchitecture { group } => Some(group.to_string()),
            MappingError::FpgaInUse { fpga }
            | MappingError::FpgaAlreadyClustered { fpga, .. }
            | MappingError::FpgaNotClustered { fpga, .. }
            | MappingError::LedgerInconsistency { fpga, .. } => Some(fpga.to_string()),
            MappingError::LinkUsageInconsistency { link, .. } => Some(link.to_string()),
            MappingError::InvalidValue { .. } | MappingError::IncompleteMapping { .. } => None,
        }
    }

    pub(crate) fn missing(entity: EntityKind, id: impl fmt::Display) -> Self {
        MappingError::IdMissing {
            entity,
            id: id.to_string(),
        }
    }
}
