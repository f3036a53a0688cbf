// src/parking_analyzer.rs
//
// Per-invocation orchestration: detect parked vehicles, assign types from
// the scene case, estimate the incoming vehicle's pixel width, and allocate
// the free slots. Holds no state across invocations beyond configuration.

use anyhow::Result;
use image::RgbImage;
use tracing::{debug, info, warn};

use crate::case_resolver::{extract_case_id, CaseResolver};
use crate::slot_allocator::allocate;
use crate::types::{BoundingBox, Config, ParkingSlot, VehicleType};
use crate::vehicle_detection::{is_vehicle_class, VehicleDetector};
use crate::width_estimator::{estimate_width, SizeRatios, TypeWidthSamples};

/// Vertical band (top, bottom) spanned by the detected vehicles.
pub type StripBand = (u32, u32);

/// Everything one analysis run produced. Returned in memory; the caller
/// decides where (and whether) to persist the rendered artifact.
#[derive(Debug)]
pub struct ParkingReport {
    pub case_id: Option<u32>,
    /// Detected vehicles, sorted by ascending x1.
    pub boxes: Vec<BoundingBox>,
    /// Positional type assignment, same length as `boxes`.
    pub assignments: Vec<VehicleType>,
    /// None when no width sample was available for any type.
    pub target_width: Option<f64>,
    pub slots: Vec<ParkingSlot>,
    pub strip: StripBand,
}

pub struct ParkingAnalyzer<D> {
    detector: D,
    resolver: CaseResolver,
    ratios: SizeRatios,
    confidence_threshold: f32,
    nominal_width_px: f64,
}

impl<D: VehicleDetector> ParkingAnalyzer<D> {
    pub fn new(detector: D, config: &Config) -> Self {
        Self {
            detector,
            resolver: CaseResolver::new(config.cases.clone(), config.fallback_type),
            ratios: SizeRatios::new(config.ratios.clone()),
            confidence_threshold: config.detection.confidence_threshold,
            nominal_width_px: config.allocation.nominal_width_px,
        }
    }

    /// Analyze one image for one incoming vehicle type. The scene case id
    /// is read from the leading digits of `source_name`.
    pub fn analyze(
        &mut self,
        image: &RgbImage,
        source_name: &str,
        incoming: VehicleType,
    ) -> Result<ParkingReport> {
        let (width, height) = image.dimensions();
        let detections = self.detector.detect(image.as_raw(), width, height)?;

        let mut boxes: Vec<BoundingBox> = detections
            .iter()
            .filter(|d| d.confidence > self.confidence_threshold && is_vehicle_class(d.class_id))
            .map(|d| {
                BoundingBox::new(
                    d.bbox[0].max(0.0) as i32,
                    d.bbox[1].max(0.0) as i32,
                    d.bbox[2].min(width as f32) as i32,
                    d.bbox[3].min(height as f32) as i32,
                )
            })
            .filter(|b| b.x2 > b.x1 && b.y2 > b.y1)
            .collect();
        boxes.sort_by_key(|b| b.x1);
        debug!(
            "{} of {} detection(s) kept as parked vehicles",
            boxes.len(),
            detections.len()
        );

        let case_id = extract_case_id(source_name);

        if boxes.is_empty() {
            info!("No vehicles detected, the entire strip is available");
            // Nothing to measure against; fall back to the configured
            // sedan-equivalent width scaled to the incoming type.
            let target = self.nominal_width_px * self.ratios.get(incoming);
            let slots = allocate(&[], target, width)?;
            return Ok(ParkingReport {
                case_id,
                boxes,
                assignments: Vec::new(),
                target_width: Some(target),
                slots,
                strip: (0, height),
            });
        }

        let assignments = self.resolver.resolve(case_id, boxes.len());
        debug!("Case {case_id:?}: assigned types {assignments:?}");

        let samples = TypeWidthSamples::from_assignments(&boxes, &assignments);
        let strip = strip_band(&boxes, height);

        let Some(target) = estimate_width(&samples, &self.ratios, incoming) else {
            warn!("Could not determine a width estimate for {incoming}");
            return Ok(ParkingReport {
                case_id,
                boxes,
                assignments,
                target_width: None,
                slots: Vec::new(),
                strip,
            });
        };

        let slots = allocate(&boxes, target, width)?;
        info!(
            "{} slot(s) of ~{:.0}px fit alongside {} parked vehicle(s)",
            slots.len(),
            target,
            boxes.len()
        );

        Ok(ParkingReport {
            case_id,
            boxes,
            assignments,
            target_width: Some(target),
            slots,
            strip,
        })
    }
}

/// Vertical extent covered by the parked vehicles, clamped to the image.
fn strip_band(boxes: &[BoundingBox], image_height: u32) -> StripBand {
    let top = boxes.iter().map(|b| b.y1).min().unwrap_or(0).max(0) as u32;
    let bottom = boxes
        .iter()
        .map(|b| b.y2)
        .max()
        .unwrap_or(image_height as i32)
        .clamp(top as i32, image_height as i32) as u32;
    (top, bottom)
}
