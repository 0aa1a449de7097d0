//! Membership changes on groups that may already be mapped.
//!
//! A mapped group's ledger charge depends on its members, so the group is
//! unmapped around the change and mapped back onto the same FPGA afterwards.
//! If it no longer fits, the change is reverted, the original mapping is
//! restored, and the remap error is returned.

use crate::error::MappingResult;
use crate::registry::Registry;
use crate::topology::{commit_group_routes, release_group_routes, RouteTable};
use fmap_common::{ComponentId, FpgaId, GroupId};
use fmap_diagnostics::DiagnosticSink;
use log::debug;

/// Maps `group` onto `fpga` and routes its connections to placed partners.
pub fn map_and_route(
    registry: &mut Registry,
    routes: &mut RouteTable,
    sink: &DiagnosticSink,
    group: &GroupId,
    fpga: &FpgaId,
) -> MappingResult<()> {
    registry.map_group(group, fpga)?;
    commit_group_routes(registry, routes, group, sink)
}

/// Releases the routes of `group` and unmaps it, returning its former FPGA.
pub fn unmap_and_release(
    registry: &mut Registry,
    routes: &mut RouteTable,
    group: &GroupId,
) -> MappingResult<FpgaId> {
    registry.group(group)?;
    release_group_routes(registry, routes, group)?;
    registry.unmap_group(group)
}

/// Runs `mutate` on `group` with the group temporarily unmapped.
///
/// `revert` must undo `mutate`; it runs only if the group cannot be mapped
/// back afterwards.
pub fn with_group_unmapped<M, R>(
    registry: &mut Registry,
    routes: &mut RouteTable,
    sink: &DiagnosticSink,
    group: &GroupId,
    mutate: M,
    revert: R,
) -> MappingResult<()>
where
    M: FnOnce(&mut Registry) -> MappingResult<()>,
    R: FnOnce(&mut Registry) -> MappingResult<()>,
{
    let target = registry.group(group)?.target().cloned();
    let Some(fpga) = target else {
        return mutate(registry);
    };

    unmap_and_release(registry, routes, group)?;
    if let Err(e) = mutate(registry) {
        map_and_route(registry, routes, sink, group, &fpga)?;
        return Err(e);
    }
    if let Err(e) = map_and_route(registry, routes, sink, group, &fpga) {
        debug!("group '{group}' no longer fits on FPGA '{fpga}', reverting");
        revert(registry)?;
        map_and_route(registry, routes, sink, group, &fpga)?;
        return Err(e);
    }
    Ok(())
}

/// Adds `component` to `group`, keeping the group's mapping if it has one.
pub fn add_component_to_group(
    registry: &mut Registry,
    routes: &mut RouteTable,
    sink: &DiagnosticSink,
    group: &GroupId,
    component: &ComponentId,
) -> MappingResult<()> {
    registry.component(component)?;
    with_group_unmapped(
        registry,
        routes,
        sink,
        group,
        |reg| reg.attach_component(group, component),
        |reg| reg.detach_component(group, component),
    )
}

/// Removes `component` from `group`, keeping the group's mapping if it has
/// one.
pub fn remove_component_from_group(
    registry: &mut Registry,
    routes: &mut RouteTable,
    sink: &DiagnosticSink,
    group: &GroupId,
    component: &ComponentId,
) -> MappingResult<()> {
    registry.component(component)?;
    with_group_unmapped(
        registry,
        routes,
        sink,
        group,
        |reg| reg.detach_component(group, component),
        |reg| reg.attach_component(group, component),
    )
}
