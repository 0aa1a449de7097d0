//! Scoring functions for ordering groups and FPGAs and for choosing a
//! group's FPGA.
//!
//! Ordering scores are "lower first": groups and FPGAs with the smallest
//! weighted score are visited first. The candidate score used to pick an FPGA
//! for a group is "higher wins".

use crate::error::{MappingError, MappingResult};
use crate::registry::Registry;
use crate::topology::{
    apply_connection_to_path, link_load, remove_connection_from_path, shortest_link_path,
    AdjacencyMatrix,
};
use fmap_common::{
    score_against_average, score_resource_set, ConnectionId, FpgaId, GroupId, LinkId,
};
use std::collections::BTreeMap;

/// Relative weights of the resource and I/O-distance terms.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MappingWeights {
    io_weight: f64,
}

impl MappingWeights {
    /// Creates weights with the given I/O weight, which must lie in `[0, 1]`.
    pub fn new(io_weight: f64) -> MappingResult<Self> {
        if !(0.0..=1.0).contains(&io_weight) {
            return Err(MappingError::InvalidValue {
                what: "I/O weight",
                value: io_weight,
            });
        }
        Ok(Self { io_weight })
    }

    /// Weight of the I/O-distance term.
    pub fn io_weight(&self) -> f64 {
        self.io_weight
    }

    /// Weight of the resource term: `1 - io_weight`.
    pub fn resource_weight(&self) -> f64 {
        1.0 - self.io_weight
    }
}

impl Default for MappingWeights {
    fn default() -> Self {
        Self { io_weight: 0.5 }
    }
}

/// I/O term of an ordering score. Unknown distances contribute nothing.
pub fn io_term(distance: f64) -> f64 {
    if distance < 0.0 {
        0.0
    } else {
        0.1 / (distance + 1.0)
    }
}

/// Mean total resources per FPGA. A resource an FPGA does not list counts as
/// 0 for that FPGA.
pub fn average_fpga_resources(registry: &Registry) -> BTreeMap<String, f64> {
    let mut sum: BTreeMap<String, f64> = BTreeMap::new();
    for fpga in registry.fpgas().values() {
        for (name, qty) in fpga.total.iter() {
            *sum.entry(name.to_string()).or_insert(0.0) += qty as f64;
        }
    }
    let n = registry.fpgas().len().max(1) as f64;
    for v in sum.values_mut() {
        *v /= n;
    }
    sum
}

/// Ordering score of a group against the average FPGA.
pub fn group_score(
    registry: &Registry,
    group: &GroupId,
    baseline: &BTreeMap<String, f64>,
    weights: &MappingWeights,
) -> MappingResult<f64> {
    let resources = score_against_average(baseline, &registry.required_resources(group)?);
    let distance = registry.average_distance_from_input(group)?;
    Ok(weights.resource_weight() * resources + weights.io_weight() * io_term(distance))
}

/// Ordering score of an FPGA's free resources against the average FPGA.
pub fn fpga_score(
    registry: &Registry,
    fpga: &FpgaId,
    baseline: &BTreeMap<String, f64>,
    weights: &MappingWeights,
) -> MappingResult<f64> {
    let f = registry.fpga(fpga)?;
    let resources = score_against_average(baseline, &f.available());
    Ok(weights.resource_weight() * resources + weights.io_weight() * io_term(f.io_distance as f64))
}

fn sort_by_score<K: Ord>(mut scored: Vec<(K, f64)>) -> Vec<K> {
    scored.sort_by(|(a, sa), (b, sb)| sa.total_cmp(sb).then_with(|| a.cmp(b)));
    scored.into_iter().map(|(k, _)| k).collect()
}

/// Every group in ascending score order, ties broken by ID.
pub fn order_groups(
    registry: &Registry,
    baseline: &BTreeMap<String, f64>,
    weights: &MappingWeights,
) -> MappingResult<Vec<GroupId>> {
    let scored = registry
        .groups()
        .keys()
        .map(|g| Ok((g.clone(), group_score(registry, g, baseline, weights)?)))
        .collect::<MappingResult<Vec<_>>>()?;
    Ok(sort_by_score(scored))
}

/// Every FPGA in ascending score order, ties broken by ID.
pub fn order_fpgas(
    registry: &Registry,
    baseline: &BTreeMap<String, f64>,
    weights: &MappingWeights,
) -> MappingResult<Vec<FpgaId>> {
    let scored = registry
        .fpgas()
        .keys()
        .map(|f| Ok((f.clone(), fpga_score(registry, f, baseline, weights)?)))
        .collect::<MappingResult<Vec<_>>>()?;
    Ok(sort_by_score(scored))
}

/// Scores placing the unmapped `group` on `fpga`; higher is better.
///
/// Returns `None` when the FPGA cannot admit the group. Otherwise combines
/// the resource headroom left after admission with a traffic term built from
/// the hop counts to already-placed partners and the heaviest link load once
/// those connections are projected onto their shortest paths. The projection
/// is removed again before returning.
pub fn candidate_score(
    registry: &mut Registry,
    adjacency: &AdjacencyMatrix,
    group: &GroupId,
    fpga: &FpgaId,
    weights: &MappingWeights,
) -> MappingResult<Option<f64>> {
    let cost = registry.admission_cost(group, fpga)?;
    let available = registry.fpga(fpga)?.available();
    let fit = score_resource_set(&available, &cost);
    if fit < 0.0 || !available.covers(&cost) {
        return Ok(None);
    }

    let unreachable = registry.fpgas().len() as f64;
    let mut hop_cost = 0.0;
    let mut projected: Vec<(ConnectionId, Vec<LinkId>)> = Vec::new();
    let members = registry.group(group)?.members().to_vec();
    for member in &members {
        for conn in registry.connections_touching(member) {
            let Some(partner) = conn.other_end(member) else {
                continue;
            };
            if members.contains(partner) {
                continue;
            }
            let Some(partner_fpga) = registry.component_fpga(partner)? else {
                continue;
            };
            let (from, to) = if &conn.source == member {
                (fpga, partner_fpga)
            } else {
                (partner_fpga, fpga)
            };
            let hops = match adjacency.hop_count(from, to) {
                Some(h) if h >= 0 => h as f64,
                _ => unreachable,
            };
            hop_cost += conn.normalized_density() * hops;
            if from != to {
                if let Some(path) = shortest_link_path(registry, from, to)? {
                    projected.push((conn.id.clone(), path));
                }
            }
        }
    }

    let peak = projected_peak_load(registry, &projected)?;
    let traffic = hop_cost + peak;
    Ok(Some(
        weights.resource_weight() * (1.0 - fit) + weights.io_weight() / (1.0 + traffic),
    ))
}

/// Applies `projected` routes, measures the heaviest link load, and removes
/// the routes again.
fn projected_peak_load(
    registry: &mut Registry,
    projected: &[(ConnectionId, Vec<LinkId>)],
) -> MappingResult<f64> {
    if projected.is_empty() {
        return Ok(0.0);
    }
    let mut applied = 0;
    let mut measured = Ok(0.0);
    for (conn, path) in projected {
        if let Err(e) = apply_connection_to_path(registry, conn, path) {
            measured = Err(e);
            break;
        }
        applied += 1;
    }
    if measured.is_ok() {
        measured = peak_link_load(registry);
    }
    for (conn, path) in projected[..applied].iter().rev() {
        remove_connection_from_path(registry, conn, path)?;
    }
    measured
}

fn peak_link_load(registry: &Registry) -> MappingResult<f64> {
    let mut peak = 0.0f64;
    for link in registry.links().keys() {
        peak = peak.max(link_load(registry, link)?);
    }
    Ok(peak)
}
