// src/types.rs

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub model: ModelConfig,
    pub detection: DetectionConfig,
    pub allocation: AllocationConfig,
    /// Scene case number -> expected vehicle types, left to right.
    pub cases: BTreeMap<u32, Vec<VehicleType>>,
    /// Expected width of each type relative to a sedan (1.0).
    pub ratios: BTreeMap<VehicleType, f64>,
    /// Type assigned to detections the case table cannot account for.
    pub fallback_type: VehicleType,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            model: ModelConfig::default(),
            detection: DetectionConfig::default(),
            allocation: AllocationConfig::default(),
            cases: default_case_table(),
            ratios: default_ratios(),
            fallback_type: VehicleType::Suv,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ModelConfig {
    pub path: String,
    pub input_size: usize,
    pub use_cuda: bool,
    pub num_threads: usize,
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self {
            path: "yolov8n.onnx".to_string(),
            input_size: 640,
            use_cuda: false,
            num_threads: 4,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DetectionConfig {
    pub confidence_threshold: f32,
    pub nms_iou_threshold: f32,
}

impl Default for DetectionConfig {
    fn default() -> Self {
        Self {
            confidence_threshold: 0.5,
            nms_iou_threshold: 0.45,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AllocationConfig {
    /// Sedan-equivalent pixel width used when no vehicle is parked and no
    /// width sample exists; scaled by the incoming type's ratio.
    pub nominal_width_px: f64,
}

impl Default for AllocationConfig {
    fn default() -> Self {
        Self {
            nominal_width_px: 180.0,
        }
    }
}

fn default_case_table() -> BTreeMap<u32, Vec<VehicleType>> {
    use VehicleType::*;
    BTreeMap::from([
        (1, vec![Hatchback, Suv]),
        (2, vec![Sedan, Suv]),
        (3, vec![Suv]),
        (4, vec![Suv, Hatchback]),
        (5, vec![Truck]),
        (6, vec![Suv, Suv]),
        (7, vec![Sedan, Suv]),
    ])
}

fn default_ratios() -> BTreeMap<VehicleType, f64> {
    BTreeMap::from([
        (VehicleType::Hatchback, 0.85),
        (VehicleType::Sedan, 1.0),
        (VehicleType::Suv, 1.06),
        (VehicleType::Truck, 2.0),
    ])
}

/// Vehicle size class. Declaration order doubles as the deterministic
/// priority when picking a base type for width estimation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum VehicleType {
    #[serde(rename = "h")]
    Hatchback,
    #[serde(rename = "se")]
    Sedan,
    #[serde(rename = "s")]
    Suv,
    #[serde(rename = "t")]
    Truck,
}

impl VehicleType {
    pub const ALL: [VehicleType; 4] = [
        VehicleType::Hatchback,
        VehicleType::Sedan,
        VehicleType::Suv,
        VehicleType::Truck,
    ];

    pub fn code(&self) -> &'static str {
        match self {
            VehicleType::Hatchback => "h",
            VehicleType::Sedan => "se",
            VehicleType::Suv => "s",
            VehicleType::Truck => "t",
        }
    }

    /// Parse a short code or full name, case-insensitive.
    pub fn parse(s: &str) -> Result<Self, String> {
        match s.to_ascii_lowercase().as_str() {
            "h" | "hatchback" => Ok(VehicleType::Hatchback),
            "se" | "sedan" => Ok(VehicleType::Sedan),
            "s" | "suv" => Ok(VehicleType::Suv),
            "t" | "truck" => Ok(VehicleType::Truck),
            other => Err(format!(
                "unknown vehicle type '{other}' (expected h, se, s or t)"
            )),
        }
    }
}

impl fmt::Display for VehicleType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            VehicleType::Hatchback => "Hatchback",
            VehicleType::Sedan => "Sedan",
            VehicleType::Suv => "SUV",
            VehicleType::Truck => "Truck",
        };
        write!(f, "{name}")
    }
}

impl FromStr for VehicleType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        VehicleType::parse(s)
    }
}

/// Axis-aligned box in pixel coordinates, `x1 < x2`, `y1 < y2`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BoundingBox {
    pub x1: i32,
    pub y1: i32,
    pub x2: i32,
    pub y2: i32,
}

impl BoundingBox {
    pub fn new(x1: i32, y1: i32, x2: i32, y2: i32) -> Self {
        Self { x1, y1, x2, y2 }
    }

    pub fn width(&self) -> i32 {
        self.x2 - self.x1
    }
}

/// One fit-able parking spot along the horizontal axis, in pixels.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ParkingSlot {
    pub start: i32,
    pub end: i32,
}

impl ParkingSlot {
    pub fn width(&self) -> i32 {
        self.end - self.start
    }
}
