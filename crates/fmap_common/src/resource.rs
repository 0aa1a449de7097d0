//! Named, non-negative resource quantities and resource-set scoring.
//!
//! A [`ResourceSet`] maps resource names (e.g. `"LUT"`, `"BRAM"`) to integer
//! quantities. A name that is present with quantity 0 is distinct from a name
//! that is absent: an FPGA that lists `DSP = 0` has the resource type but no
//! free units, while an FPGA that omits `DSP` cannot host it at all.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Sentinel score returned by [`score_resource_set`] when the baseline lacks a
/// resource the requirement needs.
pub const UNSATISFIABLE: f64 = -1.0;

/// A vector of named resource quantities.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ResourceSet {
    quantities: BTreeMap<String, u64>,
}

impl ResourceSet {
    /// Creates an empty resource set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the quantity of `name`, or 0 if the resource is absent.
    pub fn get(&self, name: &str) -> u64 {
        self.quantities.get(name).copied().unwrap_or(0)
    }

    /// Sets the quantity of `name`, inserting the resource if absent.
    pub fn set(&mut self, name: impl Into<String>, qty: u64) {
        self.quantities.insert(name.into(), qty);
    }

    /// Builder form of [`set`](Self::set).
    pub fn with(mut self, name: impl Into<String>, qty: u64) -> Self {
        self.set(name, qty);
        self
    }

    /// Returns whether the resource type is listed, regardless of quantity.
    pub fn contains(&self, name: &str) -> bool {
        self.quantities.contains_key(name)
    }

    /// Returns whether no resource is listed.
    pub fn is_empty(&self) -> bool {
        self.quantities.is_empty()
    }

    /// Returns the number of listed resource types.
    pub fn len(&self) -> usize {
        self.quantities.len()
    }

    /// Iterates over `(name, quantity)` pairs in name order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, u64)> {
        self.quantities.iter().map(|(k, &v)| (k.as_str(), v))
    }

    /// Adds `other` into `self` elementwise.
    pub fn add(&mut self, other: &ResourceSet) {
        for (name, qty) in other.iter() {
            *self.quantities.entry(name.to_string()).or_insert(0) += qty;
        }
    }

    /// Adds `other` into `self` `times` times.
    pub fn add_scaled(&mut self, other: &ResourceSet, times: u64) {
        for (name, qty) in other.iter() {
            *self.quantities.entry(name.to_string()).or_insert(0) += qty * times;
        }
    }

    /// Subtracts `other` from `self` elementwise.
    ///
    /// Returns `None` (leaving `self` untouched) if any quantity would go
    /// negative.
    pub fn checked_sub(&self, other: &ResourceSet) -> Option<ResourceSet> {
        let mut out = self.clone();
        for (name, qty) in other.iter() {
            let slot = out.quantities.entry(name.to_string()).or_insert(0);
            *slot = slot.checked_sub(qty)?;
        }
        Some(out)
    }

    /// Returns `self - other` with every listed resource of `self` kept and
    /// each quantity floored at zero.
    pub fn saturating_sub(&self, other: &ResourceSet) -> ResourceSet {
        let quantities = self
            .quantities
            .iter()
            .map(|(k, &v)| (k.clone(), v.saturating_sub(other.get(k))))
            .collect();
        ResourceSet { quantities }
    }

    /// Returns a copy with every zero-quantity entry dropped.
    pub fn without_zeros(&self) -> ResourceSet {
        let quantities = self
            .quantities
            .iter()
            .filter(|(_, &v)| v > 0)
            .map(|(k, &v)| (k.clone(), v))
            .collect();
        ResourceSet { quantities }
    }

    /// Returns the resource with the largest quantity.
    ///
    /// Ties resolve to the lexicographically first name.
    pub fn highest(&self) -> Option<(&str, u64)> {
        self.iter()
            .fold(None, |best: Option<(&str, u64)>, (name, qty)| match best {
                Some((_, b)) if b >= qty => best,
                _ => Some((name, qty)),
            })
    }

    /// Returns the resource with the smallest quantity.
    ///
    /// Ties resolve to the lexicographically first name.
    pub fn lowest(&self) -> Option<(&str, u64)> {
        self.iter()
            .fold(None, |best: Option<(&str, u64)>, (name, qty)| match best {
                Some((_, b)) if b <= qty => best,
                _ => Some((name, qty)),
            })
    }

    /// Returns whether every resource in `required` fits within `self`.
    ///
    /// A positive requirement for a resource absent from `self` never fits.
    pub fn covers(&self, required: &ResourceSet) -> bool {
        required.iter().all(|(name, qty)| {
            if qty == 0 {
                return true;
            }
            self.contains(name) && self.get(name) >= qty
        })
    }
}

impl FromIterator<(String, u64)> for ResourceSet {
    fn from_iter<I: IntoIterator<Item = (String, u64)>>(iter: I) -> Self {
        ResourceSet {
            quantities: iter.into_iter().collect(),
        }
    }
}

impl From<BTreeMap<String, u64>> for ResourceSet {
    fn from(quantities: BTreeMap<String, u64>) -> Self {
        ResourceSet { quantities }
    }
}

/// Scores a requirement against a baseline availability.
///
/// Returns [`UNSATISFIABLE`] if `required` names a resource with a positive
/// quantity that `baseline` does not list at all. Otherwise returns the mean
/// of `required / baseline` over the resources `required` lists, where a zero
/// baseline contributes 0. An empty requirement scores 0.
///
/// Lower scores mean more headroom.
pub fn score_resource_set(baseline: &ResourceSet, required: &ResourceSet) -> f64 {
    if required.is_empty() {
        return 0.0;
    }
    let mut total = 0.0;
    for (name, qty) in required.iter() {
        if !baseline.contains(name) {
            if qty > 0 {
                return UNSATISFIABLE;
            }
            continue;
        }
        let base = baseline.get(name);
        if base > 0 {
            total += qty as f64 / base as f64;
        }
    }
    total / required.len() as f64
}

/// Scores a requirement against a baseline of fractional averages.
///
/// Same rules as [`score_resource_set`], used where the baseline is a mean
/// over several resource sets and is not integral.
pub fn score_against_average(baseline: &BTreeMap<String, f64>, required: &ResourceSet) -> f64 {
    if required.is_empty() {
        return 0.0;
    }
    let mut total = 0.0;
    for (name, qty) in required.iter() {
        match baseline.get(name) {
            None if qty > 0 => return UNSATISFIABLE,
            None => {}
            Some(&base) if base > 0.0 => total += qty as f64 / base,
            Some(_) => {}
        }
    }
    total / required.len() as f64
}

#[cfg(test)]
mod tests {
    use super::*;

    fn lut_ff(lut: u64, ff: u64) -> ResourceSet {
        ResourceSet::new().with("LUT", lut).with("FF", ff)
    }

    #[test]
    fn get_absent_is_zero() {
        let rs = ResourceSet::new();
        assert_eq!(rs.get("LUT"), 0);
        assert!(!rs.contains("LUT"));
    }

    #[test]
    fn zero_quantity_is_still_listed() {
        let rs = ResourceSet::new().with("DSP", 0);
        assert!(rs.contains("DSP"));
        assert_eq!(rs.get("DSP"), 0);
    }

    #[test]
    fn add_is_elementwise() {
        let mut a = lut_ff(10, 5);
        a.add(&ResourceSet::new().with("LUT", 3).with("BRAM", 2));
        assert_eq!(a.get("LUT"), 13);
        assert_eq!(a.get("FF"), 5);
        assert_eq!(a.get("BRAM"), 2);
    }

    #[test]
    fn add_scaled_multiplies() {
        let mut a = ResourceSet::new();
        a.add_scaled(&lut_ff(2, 1), 3);
        assert_eq!(a.get("LUT"), 6);
        assert_eq!(a.get("FF"), 3);
    }

    #[test]
    fn checked_sub_rejects_underflow() {
        let a = lut_ff(10, 5);
        assert!(a.checked_sub(&lut_ff(11, 0)).is_none());
        let b = a.checked_sub(&lut_ff(4, 5)).unwrap();
        assert_eq!(b.get("LUT"), 6);
        assert_eq!(b.get("FF"), 0);
    }

    #[test]
    fn saturating_sub_keeps_listed_names() {
        let total = lut_ff(10, 5);
        let avail = total.saturating_sub(&lut_ff(10, 2));
        assert!(avail.contains("LUT"));
        assert_eq!(avail.get("LUT"), 0);
        assert_eq!(avail.get("FF"), 3);
    }

    #[test]
    fn without_zeros_drops_empty_entries() {
        let rs = ResourceSet::new().with("LUT", 0).with("FF", 3);
        let stripped = rs.without_zeros();
        assert!(!stripped.contains("LUT"));
        assert_eq!(stripped.get("FF"), 3);
    }

    #[test]
    fn highest_and_lowest() {
        let rs = ResourceSet::new().with("A", 3).with("B", 9).with("C", 1);
        assert_eq!(rs.highest(), Some(("B", 9)));
        assert_eq!(rs.lowest(), Some(("C", 1)));
        assert_eq!(ResourceSet::new().highest(), None);
    }

    #[test]
    fn covers_checks_capacity_and_presence() {
        let avail = lut_ff(100, 50);
        assert!(avail.covers(&lut_ff(100, 50)));
        assert!(!avail.covers(&lut_ff(101, 0)));
        assert!(!avail.covers(&ResourceSet::new().with("DSP", 1)));
        assert!(avail.covers(&ResourceSet::new().with("DSP", 0)));
    }

    #[test]
    fn score_empty_requirement_is_zero() {
        assert_eq!(score_resource_set(&lut_ff(10, 10), &ResourceSet::new()), 0.0);
    }

    #[test]
    fn score_missing_resource_is_unsatisfiable() {
        let req = ResourceSet::new().with("DSP", 1);
        assert_eq!(score_resource_set(&lut_ff(10, 10), &req), UNSATISFIABLE);
    }

    #[test]
    fn score_missing_resource_with_zero_requirement_is_fine() {
        let req = ResourceSet::new().with("DSP", 0).with("LUT", 5);
        let score = score_resource_set(&lut_ff(10, 10), &req);
        assert!((score - 0.25).abs() < 1e-12);
    }

    #[test]
    fn score_averages_ratios() {
        let score = score_resource_set(&lut_ff(100, 10), &lut_ff(50, 10));
        assert!((score - 0.75).abs() < 1e-12);
    }

    #[test]
    fn score_zero_baseline_contributes_zero() {
        let base = ResourceSet::new().with("LUT", 0);
        let score = score_resource_set(&base, &ResourceSet::new().with("LUT", 4));
        assert_eq!(score, 0.0);
    }

    #[test]
    fn score_against_average_matches_integral_version() {
        let mut avg = BTreeMap::new();
        avg.insert("LUT".to_string(), 100.0);
        avg.insert("FF".to_string(), 10.0);
        let req = lut_ff(50, 10);
        assert_eq!(
            score_against_average(&avg, &req),
            score_resource_set(&lut_ff(100, 10), &req)
        );
        assert_eq!(
            score_against_average(&avg, &ResourceSet::new().with("DSP", 2)),
            UNSATISFIABLE
        );
    }

    #[test]
    fn serde_as_plain_map() {
        let rs = lut_ff(1, 2);
        let json = serde_json::to_string(&rs).unwrap();
        assert_eq!(json, r#"{"FF":2,"LUT":1}"#);
        let back: ResourceSet = serde_json::from_str(&json).unwrap();
        assert_eq!(back, rs);
    }
}
