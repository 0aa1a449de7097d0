//! FPGA resource ledger.
//!
//! [`Registry::map_group`] and [`Registry::unmap_group`] are the only code
//! paths that change an FPGA's used-resource vector. Both charge the same
//! [admission cost](Registry::admission_cost), so a map followed by an unmap
//! restores the ledger exactly.

use crate::error::{MappingError, MappingResult};
use crate::registry::Registry;
use fmap_common::{ComponentId, FpgaId, GroupId, ResourceSet};
use log::debug;

impl Registry {
    /// Resources charged to `fpga` for hosting `group`: the members' demand
    /// plus the FPGA's overhead once per member.
    pub fn admission_cost(&self, group: &GroupId, fpga: &FpgaId) -> MappingResult<ResourceSet> {
        let overhead = &self.fpga(fpga)?.overhead;
        let members = self.group(group)?.members().len() as u64;
        let mut cost = self.required_resources(group)?;
        cost.add_scaled(overhead, members);
        Ok(cost.without_zeros())
    }

    /// Whether `fpga` has room for `group` on top of what it already hosts.
    pub fn has_sufficient_resources(&self, fpga: &FpgaId, group: &GroupId) -> MappingResult<bool> {
        let cost = self.admission_cost(group, fpga)?;
        Ok(self.fpga(fpga)?.available().covers(&cost))
    }

    /// Whether `fpga` has room for a single additional component.
    pub fn has_sufficient_resources_for_component(
        &self,
        fpga: &FpgaId,
        component: &ComponentId,
    ) -> MappingResult<bool> {
        let f = self.fpga(fpga)?;
        let mut cost = self.component(component)?.resources.clone();
        cost.add(&f.overhead);
        Ok(f.available().covers(&cost.without_zeros()))
    }

    /// Maps `group` onto `fpga`, charging its admission cost.
    pub fn map_group(&mut self, group: &GroupId, fpga: &FpgaId) -> MappingResult<()> {
        if let Some(current) = self.group(group)?.target() {
            return Err(MappingError::GroupAlreadyMapped {
                group: group.clone(),
                fpga: current.clone(),
            });
        }
        let cost = self.admission_cost(group, fpga)?;
        let f = self.fpga_mut(fpga)?;
        if !f.available().covers(&cost) {
            return Err(MappingError::InsufficientResources {
                group: group.clone(),
                fpga: fpga.clone(),
            });
        }
        f.used.add(&cost);
        f.mapped_groups.push(group.clone());
        self.group_mut(group)?.target = Some(fpga.clone());
        debug!("mapped group '{group}' onto FPGA '{fpga}'");
        Ok(())
    }

    /// Unmaps `group` from its FPGA, releasing its admission cost.
    pub fn unmap_group(&mut self, group: &GroupId) -> MappingResult<FpgaId> {
        let fpga = self
            .group(group)?
            .target()
            .cloned()
            .ok_or_else(|| MappingError::GroupNotMapped {
                group: group.clone(),
            })?;
        let cost = self.admission_cost(group, &fpga)?;
        let f = self.fpga_mut(&fpga)?;
        let released = f
            .used
            .checked_sub(&cost)
            .ok_or_else(|| MappingError::LedgerInconsistency {
                fpga: fpga.clone(),
                detail: format!("releasing group '{group}' would drive usage negative"),
            })?;
        f.used = released;
        f.mapped_groups.retain(|g| g != group);
        self.group_mut(group)?.target = None;
        debug!("unmapped group '{group}' from FPGA '{fpga}'");
        Ok(fpga)
    }
}
