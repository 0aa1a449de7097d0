//! Greedy group-to-FPGA placement.
//!
//! [`do_mapping`] runs the whole heuristic over a registry:
//!
//! 1. Force platform-required components onto their FPGAs.
//! 2. Give every ungrouped component its own group and drop empty groups.
//! 3. Partition FPGAs and components into connectivity islands.
//! 4. Compute I/O distances and the average-FPGA baseline.
//! 5. Order groups and FPGAs by weighted score.
//! 6. Build the FPGA hop-count matrix.
//! 7. Place each unmapped group on its best-scoring compatible FPGA.
//! 8. Route the placed group's connections to already-placed partners.
//!
//! Resource shortfalls and architecture mismatches only disqualify a
//! candidate. A group with no common architecture aborts the run.

mod membership;
mod score;

pub use membership::{
    add_component_to_group, map_and_route, remove_component_from_group, unmap_and_release,
    with_group_unmapped,
};
pub use score::{
    average_fpga_resources, candidate_score, fpga_score, group_score, io_term, order_fpgas,
    order_groups, MappingWeights,
};

use crate::data::Group;
use crate::distance::apply_io_distances;
use crate::error::{MappingError, MappingResult};
use crate::registry::Registry;
use crate::subsystem::Subsystems;
use crate::topology::{AdjacencyMatrix, RouteTable};
use fmap_common::{ArchSupport, FpgaId, GroupId};
use fmap_diagnostics::{Category, Diagnostic, DiagnosticCode, DiagnosticSink};
use log::{debug, info, warn};

/// Warning code for a group that no FPGA could take.
pub const GROUP_UNPLACED: DiagnosticCode = DiagnosticCode::new(Category::Placement, 201);

/// Note code for a group with no FPGA of a supported architecture.
pub const NO_COMPATIBLE_FPGA: DiagnosticCode = DiagnosticCode::new(Category::Placement, 202);

/// Prefix of the group that collects an FPGA's required components.
pub const REQUIRED_GROUP_PREFIX: &str = "required_";

/// Prefix of the singleton groups created for ungrouped components.
pub const AUTO_GROUP_PREFIX: &str = "auto_";

/// Runs the placement heuristic and returns the groups left unmapped.
pub fn do_mapping(
    registry: &mut Registry,
    routes: &mut RouteTable,
    weights: &MappingWeights,
    sink: &DiagnosticSink,
) -> MappingResult<Vec<GroupId>> {
    ensure_common_architectures(registry)?;

    enforce_required_placements(registry, routes, sink)?;
    auto_group(registry)?;
    drop_empty_groups(registry, routes)?;
    ensure_common_architectures(registry)?;

    let mut subsystems = Subsystems::build(registry)?;
    debug!(
        "{} FPGA island(s), {} component island(s)",
        subsystems.fpga_island_count(),
        subsystems.component_island_count()
    );

    apply_io_distances(registry)?;
    let baseline = average_fpga_resources(registry);

    let group_order = order_groups(registry, &baseline, weights)?;
    let fpga_order = order_fpgas(registry, &baseline, weights)?;

    let adjacency = AdjacencyMatrix::build(registry);

    let mut unmapped = Vec::new();
    for group in &group_order {
        if registry.group(group)?.is_mapped() {
            continue;
        }
        match best_fpga(registry, &subsystems, &adjacency, &fpga_order, group, weights, sink)? {
            Some(fpga) => {
                debug!("placing group '{group}' on FPGA '{fpga}'");
                map_and_route(registry, routes, sink, group, &fpga)?;
                let island = subsystems.fpga_island(&fpga)?;
                subsystems.record(registry, island, group)?;
            }
            None => {
                warn!("group '{group}' could not be placed");
                sink.emit(
                    Diagnostic::warning(
                        GROUP_UNPLACED,
                        format!("group '{group}' could not be placed on any FPGA"),
                    )
                    .with_subject(group.to_string()),
                );
                unmapped.push(group.clone());
            }
        }
    }

    info!(
        "placed {} of {} group(s)",
        group_order.len() - unmapped.len(),
        group_order.len()
    );
    Ok(unmapped)
}

/// Picks the highest-scoring FPGA for `group` among those its architecture,
/// islands and resources allow.
fn best_fpga(
    registry: &mut Registry,
    subsystems: &Subsystems,
    adjacency: &AdjacencyMatrix,
    fpga_order: &[FpgaId],
    group: &GroupId,
    weights: &MappingWeights,
    sink: &DiagnosticSink,
) -> MappingResult<Option<FpgaId>> {
    let arch = registry.group(group)?.architectures().clone();
    if arch.is_nothing() {
        return Err(MappingError::NoCommonArchitecture {
            group: group.clone(),
        });
    }
    let islands = subsystems.group_islands(registry, group)?;

    let mut best = None;
    let mut best_score = -1.0;
    let mut any_compatible = false;
    for fpga in fpga_order {
        if !arch.allows(&registry.fpga(fpga)?.architecture) {
            continue;
        }
        any_compatible = true;
        if !subsystems.accepts(subsystems.fpga_island(fpga)?, &islands) {
            debug!("FPGA '{fpga}' is outside the reach of group '{group}'");
            continue;
        }
        let Some(score) = candidate_score(registry, adjacency, group, fpga, weights)? else {
            continue;
        };
        if score > best_score {
            best_score = score;
            best = Some(fpga.clone());
        }
    }

    if !any_compatible && !fpga_order.is_empty() {
        sink.emit(
            Diagnostic::note(
                NO_COMPATIBLE_FPGA,
                format!("no FPGA has an architecture that group '{group}' supports"),
            )
            .with_subject(group.to_string()),
        );
    }
    Ok(best)
}

fn ensure_common_architectures(registry: &Registry) -> MappingResult<()> {
    match registry
        .groups()
        .values()
        .find(|g| g.architectures().is_nothing())
    {
        Some(g) => Err(MappingError::NoCommonArchitecture { group: g.id.clone() }),
        None => Ok(()),
    }
}

/// Fails if any FPGA's `required_<fpga>` group would end up with no common
/// architecture. Reads only, so nothing is placed when it fails.
fn check_required_architectures(registry: &Registry) -> MappingResult<()> {
    for fpga in registry.fpgas().values().filter(|f| !f.required.is_empty()) {
        let group = GroupId::new(format!("{REQUIRED_GROUP_PREFIX}{}", fpga.id));
        let mut arch = match registry.groups().get(&group) {
            Some(g) => g.architectures().clone(),
            None => ArchSupport::Any,
        };
        for component in &fpga.required {
            let current = registry
                .components()
                .get(&component.id)
                .unwrap_or(component);
            arch = arch.intersect(&current.architectures);
        }
        if arch.is_nothing() {
            return Err(MappingError::NoCommonArchitecture { group });
        }
    }
    Ok(())
}

/// Puts every FPGA's required components into its `required_<fpga>` group
/// and maps that group onto the FPGA.
pub fn enforce_required_placements(
    registry: &mut Registry,
    routes: &mut RouteTable,
    sink: &DiagnosticSink,
) -> MappingResult<()> {
    check_required_architectures(registry)?;

    let forced: Vec<(FpgaId, Vec<_>)> = registry
        .fpgas()
        .values()
        .filter(|f| !f.required.is_empty())
        .map(|f| (f.id.clone(), f.required.clone()))
        .collect();

    for (fpga, required) in forced {
        let group = GroupId::new(format!("{REQUIRED_GROUP_PREFIX}{fpga}"));
        if !registry.groups().contains_key(&group) {
            registry.insert_group(Group::new(group.clone()))?;
        }
        for component in required {
            let id = component.id.clone();
            if !registry.components().contains_key(&id) {
                registry.insert_component(component)?;
            }
            match registry.component(&id)?.group.clone() {
                Some(current) if current == group => continue,
                Some(current) => {
                    remove_component_from_group(registry, routes, sink, &current, &id)?
                }
                None => {}
            }
            add_component_to_group(registry, routes, sink, &group, &id)?;
        }
        if registry.group(&group)?.architectures().is_nothing() {
            return Err(MappingError::NoCommonArchitecture { group });
        }

        match registry.group(&group)?.target().cloned() {
            Some(current) if current == fpga => {}
            Some(_) => {
                unmap_and_release(registry, routes, &group)?;
                map_and_route(registry, routes, sink, &group, &fpga)?;
            }
            None => map_and_route(registry, routes, sink, &group, &fpga)?,
        }
        debug!("required group '{group}' is on FPGA '{fpga}'");
    }
    Ok(())
}

/// Creates an `auto_<component>` singleton group for every ungrouped
/// component.
pub fn auto_group(registry: &mut Registry) -> MappingResult<()> {
    let ungrouped: Vec<_> = registry
        .components()
        .values()
        .filter(|c| c.group.is_none())
        .map(|c| c.id.clone())
        .collect();
    for component in ungrouped {
        let base = format!("{AUTO_GROUP_PREFIX}{component}");
        let mut id = GroupId::new(base.clone());
        let mut suffix = 1;
        while registry.groups().contains_key(&id) {
            id = GroupId::new(format!("{base}_{suffix}"));
            suffix += 1;
        }
        registry.insert_group(Group::new(id.clone()))?;
        registry.attach_component(&id, &component)?;
    }
    Ok(())
}

/// Removes every group without members.
pub fn drop_empty_groups(registry: &mut Registry, routes: &mut RouteTable) -> MappingResult<()> {
    let empty: Vec<_> = registry
        .groups()
        .values()
        .filter(|g| g.members().is_empty())
        .map(|g| g.id.clone())
        .collect();
    for group in empty {
        if registry.group(&group)?.is_mapped() {
            unmap_and_release(registry, routes, &group)?;
        }
        registry.take_group(&group)?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::{Component, Connection, Fpga, Link};
    use fmap_common::{ComponentId, ResourceSet};

    fn lut(n: u64) -> ResourceSet {
        ResourceSet::new().with("LUT", n)
    }

    fn run(reg: &mut Registry) -> (MappingResult<Vec<GroupId>>, RouteTable, DiagnosticSink) {
        let mut routes = RouteTable::new();
        let sink = DiagnosticSink::new();
        let out = do_mapping(reg, &mut routes, &MappingWeights::default(), &sink);
        (out, routes, sink)
    }

    #[test]
    fn auto_groups_avoid_collisions() {
        let mut reg = Registry::new();
        reg.insert_group(Group::new("auto_a")).unwrap();
        reg.insert_component(Component::new("a", ResourceSet::new()))
            .unwrap();
        auto_group(&mut reg).unwrap();
        let c = reg.component(&ComponentId::from("a")).unwrap();
        assert_eq!(c.group, Some(GroupId::from("auto_a_1")));
        drop_empty_groups(&mut reg, &mut RouteTable::new()).unwrap();
        assert!(!reg.groups().contains_key(&GroupId::from("auto_a")));
    }

    #[test]
    fn required_components_land_on_their_fpga() {
        let mut reg = Registry::new();
        reg.insert_fpga(
            Fpga::new("f0", "v5", lut(100)).with_required(Component::new("pcie", lut(20))),
        )
        .unwrap();
        reg.insert_fpga(Fpga::new("f1", "v5", lut(1000))).unwrap();
        let (out, _, _) = run(&mut reg);
        assert!(out.unwrap().is_empty());
        let pcie = ComponentId::from("pcie");
        assert_eq!(reg.component_fpga(&pcie).unwrap(), Some(&FpgaId::from("f0")));
        assert_eq!(
            reg.component(&pcie).unwrap().group,
            Some(GroupId::from("required_f0"))
        );
    }

    #[test]
    fn required_component_moves_out_of_its_group() {
        let mut reg = Registry::new();
        reg.insert_fpga(
            Fpga::new("f0", "v5", lut(100)).with_required(Component::new("pcie", lut(20))),
        )
        .unwrap();
        reg.insert_group(Group::new("mine")).unwrap();
        reg.insert_component(Component::new("pcie", lut(20))).unwrap();
        reg.attach_component(&GroupId::from("mine"), &ComponentId::from("pcie"))
            .unwrap();
        let (out, _, _) = run(&mut reg);
        assert!(out.unwrap().is_empty());
        assert!(!reg.groups().contains_key(&GroupId::from("mine")));
        assert_eq!(reg.fpga(&FpgaId::from("f0")).unwrap().used().get("LUT"), 20);
    }

    #[test]
    fn no_common_architecture_aborts_before_placing() {
        let mut reg = Registry::new();
        reg.insert_fpga(Fpga::new("f0", "v5", lut(100))).unwrap();
        reg.insert_group(Group::new("g")).unwrap();
        reg.insert_component(Component::new("x", lut(1)).with_architectures(["v5"]))
            .unwrap();
        reg.insert_component(Component::new("y", lut(1)).with_architectures(["v6"]))
            .unwrap();
        reg.insert_component(Component::new("z", lut(1))).unwrap();
        reg.attach_component(&GroupId::from("g"), &ComponentId::from("x"))
            .unwrap();
        reg.attach_component(&GroupId::from("g"), &ComponentId::from("y"))
            .unwrap();
        let (out, _, _) = run(&mut reg);
        assert!(matches!(out, Err(MappingError::NoCommonArchitecture { .. })));
        assert!(reg.groups().values().all(|g| !g.is_mapped()));
    }

    #[test]
    fn conflicting_required_set_places_nothing() {
        let mut reg = Registry::new();
        reg.insert_fpga(
            Fpga::new("f0", "v5", lut(100)).with_required(Component::new("r0", lut(10))),
        )
        .unwrap();
        reg.insert_fpga(
            Fpga::new("f1", "v5", lut(100))
                .with_required(Component::new("x", lut(1)).with_architectures(["v5"]))
                .with_required(Component::new("y", lut(1)).with_architectures(["v6"])),
        )
        .unwrap();
        let (out, routes, _) = run(&mut reg);
        match out {
            Err(MappingError::NoCommonArchitecture { group }) => {
                assert_eq!(group, GroupId::from("required_f1"))
            }
            other => panic!("expected NoCommonArchitecture, got {other:?}"),
        }
        assert!(reg.groups().values().all(|g| !g.is_mapped()));
        assert!(routes.is_empty());
        for f in ["f0", "f1"] {
            assert_eq!(reg.fpga(&FpgaId::from(f)).unwrap().used().get("LUT"), 0);
        }
    }

    #[test]
    fn required_group_mapped_elsewhere_moves_back() {
        let mut reg = Registry::new();
        reg.insert_fpga(
            Fpga::new("f0", "v5", lut(100)).with_required(Component::new("r0", lut(10))),
        )
        .unwrap();
        reg.insert_fpga(Fpga::new("f1", "v5", lut(100))).unwrap();
        let group = GroupId::from("required_f0");
        reg.insert_group(Group::new(group.clone())).unwrap();
        reg.insert_component(Component::new("r0", lut(10))).unwrap();
        reg.attach_component(&group, &ComponentId::from("r0"))
            .unwrap();
        let mut routes = RouteTable::new();
        let sink = DiagnosticSink::new();
        map_and_route(&mut reg, &mut routes, &sink, &group, &FpgaId::from("f1")).unwrap();
        assert_eq!(reg.fpga(&FpgaId::from("f1")).unwrap().used().get("LUT"), 10);

        let out = do_mapping(&mut reg, &mut routes, &MappingWeights::default(), &sink);
        assert!(out.unwrap().is_empty());
        assert_eq!(
            reg.component_fpga(&ComponentId::from("r0")).unwrap(),
            Some(&FpgaId::from("f0"))
        );
        assert_eq!(reg.fpga(&FpgaId::from("f0")).unwrap().used().get("LUT"), 10);
        assert_eq!(reg.fpga(&FpgaId::from("f1")).unwrap().used().get("LUT"), 0);
    }

    #[test]
    fn architecture_restricts_candidates() {
        let mut reg = Registry::new();
        reg.insert_fpga(Fpga::new("f0", "v5", lut(1000))).unwrap();
        reg.insert_fpga(Fpga::new("f1", "v6", lut(100))).unwrap();
        reg.insert_component(Component::new("x", lut(10)).with_architectures(["v6"]))
            .unwrap();
        let (out, _, _) = run(&mut reg);
        assert!(out.unwrap().is_empty());
        assert_eq!(
            reg.component_fpga(&ComponentId::from("x")).unwrap(),
            Some(&FpgaId::from("f1"))
        );
    }

    #[test]
    fn oversized_group_stays_unmapped_with_warning() {
        let mut reg = Registry::new();
        reg.insert_fpga(Fpga::new("f0", "v5", lut(10))).unwrap();
        reg.insert_component(Component::new("x", lut(11))).unwrap();
        let (out, _, sink) = run(&mut reg);
        assert_eq!(out.unwrap(), vec![GroupId::from("auto_x")]);
        let diags = sink.diagnostics();
        assert!(diags.iter().any(|d| d.code == GROUP_UNPLACED));
        assert_eq!(reg.fpga(&FpgaId::from("f0")).unwrap().used().get("LUT"), 0);
    }

    #[test]
    fn connected_pair_is_routed() {
        let mut reg = Registry::new();
        reg.insert_fpga(Fpga::new("f0", "v5", lut(100))).unwrap();
        reg.insert_fpga(Fpga::new("f1", "v5", lut(100))).unwrap();
        reg.insert_link(Link::new("l0", "f0", "f1", 10.0, true)).unwrap();
        reg.insert_component(Component::new("a", lut(80))).unwrap();
        reg.insert_component(Component::new("b", lut(80))).unwrap();
        reg.insert_connection(Connection::new("c0", "a", "b", 1.0))
            .unwrap();
        let (out, routes, _) = run(&mut reg);
        assert!(out.unwrap().is_empty());
        let fa = reg.component_fpga(&ComponentId::from("a")).unwrap().cloned();
        let fb = reg.component_fpga(&ComponentId::from("b")).unwrap().cloned();
        assert_ne!(fa, fb);
        assert_eq!(routes.len(), 1);
    }
}
