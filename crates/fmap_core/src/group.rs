//! Group aggregation: membership, architecture intersection, and aggregate
//! demand.
//!
//! The functions here change membership without touching the resource
//! ledger. Callers that may act on a mapped group go through
//! [`with_group_unmapped`](crate::placement::with_group_unmapped) instead.

use crate::data::UNKNOWN_DISTANCE;
use crate::error::{MappingError, MappingResult};
use crate::registry::Registry;
use fmap_common::{ArchSupport, ComponentId, GroupId, ResourceSet};

impl Registry {
    /// Adds `component` to `group`.
    ///
    /// Does nothing if the component is already a member of `group`; fails
    /// with [`MappingError::ComponentAlreadyGrouped`] if it belongs to
    /// another group.
    pub(crate) fn attach_component(
        &mut self,
        group: &GroupId,
        component: &ComponentId,
    ) -> MappingResult<()> {
        self.group(group)?;
        match &self.component(component)?.group {
            Some(current) if current == group => return Ok(()),
            Some(current) => {
                return Err(MappingError::ComponentAlreadyGrouped {
                    component: component.clone(),
                    group: current.clone(),
                })
            }
            None => {}
        }
        self.component_mut(component)?.group = Some(group.clone());
        self.group_mut(group)?.members.push(component.clone());
        self.recompute_architectures(group)
    }

    /// Removes `component` from `group`.
    pub(crate) fn detach_component(
        &mut self,
        group: &GroupId,
        component: &ComponentId,
    ) -> MappingResult<()> {
        self.group(group)?;
        if self.component(component)?.group.as_ref() != Some(group) {
            return Err(MappingError::ComponentNotGrouped {
                component: component.clone(),
                group: group.clone(),
            });
        }
        self.component_mut(component)?.group = None;
        self.group_mut(group)?.members.retain(|m| m != component);
        self.recompute_architectures(group)
    }

    /// Recomputes the intersection of the members' architecture support.
    pub(crate) fn recompute_architectures(&mut self, group: &GroupId) -> MappingResult<()> {
        let mut support = ArchSupport::Any;
        for member in self.group(group)?.members() {
            support = support.intersect(&self.component(member)?.architectures);
        }
        self.group_mut(group)?.architectures = support;
        Ok(())
    }

    /// Elementwise sum of the members' resource demand.
    pub fn required_resources(&self, group: &GroupId) -> MappingResult<ResourceSet> {
        let mut total = ResourceSet::new();
        for member in self.group(group)?.members() {
            total.add(&self.component(member)?.resources);
        }
        Ok(total)
    }

    /// Mean I/O distance of the members.
    ///
    /// Returns `-1.0` if the group is empty or any member's distance is
    /// unknown. `0.0` means every member sits on the input boundary.
    pub fn average_distance_from_input(&self, group: &GroupId) -> MappingResult<f64> {
        let members = self.group(group)?.members();
        if members.is_empty() {
            return Ok(UNKNOWN_DISTANCE as f64);
        }
        let mut sum = 0i64;
        for member in members {
            let d = self.component(member)?.io_distance;
            if d < 0 {
                return Ok(UNKNOWN_DISTANCE as f64);
            }
            sum += i64::from(d);
        }
        Ok(sum as f64 / members.len() as f64)
    }
}
