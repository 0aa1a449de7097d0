//! Cluster membership of FPGAs.

use crate::error::{MappingError, MappingResult};
use crate::registry::Registry;
use fmap_common::{ClusterId, FpgaId};

impl Registry {
    /// Adds `fpga` to `cluster`.
    ///
    /// Does nothing if it is already a member; fails with
    /// [`MappingError::FpgaAlreadyClustered`] if it belongs to another cluster.
    pub(crate) fn attach_fpga(&mut self, cluster: &ClusterId, fpga: &FpgaId) -> MappingResult<()> {
        self.cluster(cluster)?;
        match &self.fpga(fpga)?.cluster {
            Some(current) if current == cluster => return Ok(()),
            Some(current) => {
                return Err(MappingError::FpgaAlreadyClustered {
                    fpga: fpga.clone(),
                    cluster: current.clone(),
                })
            }
            None => {}
        }
        self.fpga_mut(fpga)?.cluster = Some(cluster.clone());
        self.cluster_mut(cluster)?.fpgas.push(fpga.clone());
        Ok(())
    }

    /// Removes `fpga` from `cluster`.
    pub(crate) fn detach_fpga(&mut self, cluster: &ClusterId, fpga: &FpgaId) -> MappingResult<()> {
        self.cluster(cluster)?;
        if self.fpga(fpga)?.cluster.as_ref() != Some(cluster) {
            return Err(MappingError::FpgaNotClustered {
                fpga: fpga.clone(),
                cluster: cluster.clone(),
            });
        }
        self.fpga_mut(fpga)?.cluster = None;
        self.cluster_mut(cluster)?.fpgas.retain(|f| f != fpga);
        Ok(())
    }

    /// Empties every cluster.
    pub(crate) fn clear_clusters(&mut self) {
        for cluster in self.clusters.values_mut() {
            cluster.fpgas.clear();
        }
        for fpga in self.fpgas.values_mut() {
            fpga.cluster = None;
        }
    }
}
