// src/width_estimator.rs

use crate::types::{BoundingBox, VehicleType};
use std::collections::BTreeMap;
use tracing::debug;

/// Expected width of each vehicle type relative to a sedan.
///
/// Types missing from the table contribute a lenient ratio of 1.0 rather
/// than failing the estimate.
#[derive(Debug, Clone)]
pub struct SizeRatios {
    ratios: BTreeMap<VehicleType, f64>,
}

impl SizeRatios {
    pub fn new(ratios: BTreeMap<VehicleType, f64>) -> Self {
        Self { ratios }
    }

    pub fn get(&self, vehicle_type: VehicleType) -> f64 {
        self.ratios.get(&vehicle_type).copied().unwrap_or(1.0)
    }
}

/// Observed pixel widths per vehicle type, built once per run.
#[derive(Debug, Default)]
pub struct TypeWidthSamples {
    widths: BTreeMap<VehicleType, Vec<f64>>,
}

impl TypeWidthSamples {
    /// Record one width sample per box under its assigned type.
    /// `types` must be the positional assignment for `boxes`, same length.
    pub fn from_assignments(boxes: &[BoundingBox], types: &[VehicleType]) -> Self {
        debug_assert_eq!(boxes.len(), types.len());
        let mut samples = Self::default();
        for (bbox, &vehicle_type) in boxes.iter().zip(types) {
            samples.record(vehicle_type, bbox.width() as f64);
        }
        samples
    }

    pub fn record(&mut self, vehicle_type: VehicleType, width: f64) {
        self.widths.entry(vehicle_type).or_default().push(width);
    }

    /// First type in declaration order with at least one sample.
    pub fn base_type(&self) -> Option<VehicleType> {
        VehicleType::ALL
            .into_iter()
            .find(|t| self.widths.get(t).is_some_and(|w| !w.is_empty()))
    }

    fn mean(&self, vehicle_type: VehicleType) -> Option<f64> {
        let widths = self.widths.get(&vehicle_type)?;
        if widths.is_empty() {
            return None;
        }
        Some(widths.iter().sum::<f64>() / widths.len() as f64)
    }
}

/// Estimate the pixel width of an incoming vehicle from observed samples.
///
/// The average width of the base type is scaled by the ratio of the
/// incoming type to the base type. None means no type has any sample,
/// i.e. nothing was detected.
pub fn estimate_width(
    samples: &TypeWidthSamples,
    ratios: &SizeRatios,
    incoming: VehicleType,
) -> Option<f64> {
    let base = samples.base_type()?;
    let base_avg = samples.mean(base)?;
    let factor = ratios.get(incoming) / ratios.get(base);
    debug!("Base type {base}: avg width {base_avg:.1}px, factor {factor:.3} for {incoming}");
    Some(base_avg * factor)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn default_ratios() -> SizeRatios {
        SizeRatios::new(BTreeMap::from([
            (VehicleType::Hatchback, 0.85),
            (VehicleType::Sedan, 1.0),
            (VehicleType::Suv, 1.06),
            (VehicleType::Truck, 2.0),
        ]))
    }

    #[test]
    fn test_sedan_sample_scaled_to_suv() {
        let mut samples = TypeWidthSamples::default();
        samples.record(VehicleType::Sedan, 200.0);
        let width = estimate_width(&samples, &default_ratios(), VehicleType::Suv);
        assert_eq!(width, Some(212.0));
    }

    #[test]
    fn test_no_samples_yields_none() {
        let samples = TypeWidthSamples::default();
        assert_eq!(
            estimate_width(&samples, &default_ratios(), VehicleType::Sedan),
            None
        );
    }

    #[test]
    fn test_base_type_follows_declaration_order() {
        let mut samples = TypeWidthSamples::default();
        samples.record(VehicleType::Truck, 400.0);
        samples.record(VehicleType::Hatchback, 170.0);
        assert_eq!(samples.base_type(), Some(VehicleType::Hatchback));
    }

    #[test]
    fn test_mean_over_multiple_samples() {
        let mut samples = TypeWidthSamples::default();
        samples.record(VehicleType::Suv, 210.0);
        samples.record(VehicleType::Suv, 230.0);
        let width = estimate_width(&samples, &default_ratios(), VehicleType::Suv);
        assert_eq!(width, Some(220.0));
    }

    #[test]
    fn test_missing_ratio_defaults_to_one() {
        let ratios = SizeRatios::new(BTreeMap::from([(VehicleType::Sedan, 1.0)]));
        let mut samples = TypeWidthSamples::default();
        samples.record(VehicleType::Sedan, 200.0);
        // Truck has no ratio entry, treated as 1.0.
        let width = estimate_width(&samples, &ratios, VehicleType::Truck);
        assert_eq!(width, Some(200.0));
    }

    #[test]
    fn test_from_assignments_groups_by_type() {
        let boxes = [
            BoundingBox::new(0, 0, 150, 50),
            BoundingBox::new(200, 0, 410, 50),
        ];
        let types = [VehicleType::Hatchback, VehicleType::Suv];
        let samples = TypeWidthSamples::from_assignments(&boxes, &types);
        assert_eq!(samples.base_type(), Some(VehicleType::Hatchback));
        assert_eq!(samples.mean(VehicleType::Suv), Some(210.0));
    }
}
