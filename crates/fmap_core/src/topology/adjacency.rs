//! All-pairs FPGA hop counts.

use crate::registry::Registry;
use fmap_common::FpgaId;
use std::collections::HashMap;

/// Hop count between two FPGAs with no connecting path.
pub const NO_PATH: i32 = -1;

/// Working value for "not reachable yet" while relaxing; larger than any
/// real hop count and small enough that adding two never overflows.
const INFINITY: i32 = i32::MAX / 2;

/// Minimum hop counts between every pair of FPGAs.
///
/// Rows and columns follow the FPGA ID order of the registry at build time.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AdjacencyMatrix {
    fpgas: Vec<FpgaId>,
    index: HashMap<FpgaId, usize>,
    hops: Vec<Vec<i32>>,
}

impl AdjacencyMatrix {
    /// Builds the matrix from the registry's FPGAs and links, then runs
    /// Floyd–Warshall over it.
    pub fn build(registry: &Registry) -> Self {
        let fpgas: Vec<FpgaId> = registry.fpgas().keys().cloned().collect();
        let index: HashMap<FpgaId, usize> = fpgas
            .iter()
            .enumerate()
            .map(|(i, id)| (id.clone(), i))
            .collect();
        let n = fpgas.len();

        let mut hops = vec![vec![INFINITY; n]; n];
        for (i, row) in hops.iter_mut().enumerate() {
            row[i] = 0;
        }
        for link in registry.links().values() {
            let (Some(&s), Some(&t)) = (index.get(&link.source), index.get(&link.sink)) else {
                continue;
            };
            if s != t {
                hops[s][t] = hops[s][t].min(1);
                if link.bidirectional {
                    hops[t][s] = hops[t][s].min(1);
                }
            }
        }

        for k in 0..n {
            for i in 0..n {
                if hops[i][k] >= INFINITY {
                    continue;
                }
                for j in 0..n {
                    let through = hops[i][k] + hops[k][j];
                    if through < hops[i][j] {
                        hops[i][j] = through;
                    }
                }
            }
        }

        for cell in hops.iter_mut().flatten() {
            if *cell >= INFINITY {
                *cell = NO_PATH;
            }
        }

        Self { fpgas, index, hops }
    }

    /// FPGA IDs in row/column order.
    pub fn fpgas(&self) -> &[FpgaId] {
        &self.fpgas
    }

    /// Minimum number of links from `source` to `sink`.
    ///
    /// Returns [`NO_PATH`] if no path exists, and `None` if either FPGA was
    /// not part of the matrix.
    pub fn hop_count(&self, source: &FpgaId, sink: &FpgaId) -> Option<i32> {
        let s = *self.index.get(source)?;
        let t = *self.index.get(sink)?;
        Some(self.hops[s][t])
    }

    /// Whether `sink` is reachable from `source`.
    pub fn path_exists(&self, source: &FpgaId, sink: &FpgaId) -> bool {
        matches!(self.hop_count(source, sink), Some(h) if h >= 0 && h < INFINITY)
    }
}
