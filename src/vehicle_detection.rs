// src/vehicle_detection.rs

use anyhow::{Context, Result};
use image::{imageops, imageops::FilterType, ImageBuffer, Rgb, RgbImage};
use ort::{
    execution_providers::CUDAExecutionProvider,
    session::{builder::GraphOptimizationLevel, Session},
};
use tracing::{debug, info};

use crate::types::{DetectionConfig, ModelConfig};

/// COCO class ids treated as parkable vehicles (car, bus, truck).
pub const VEHICLE_CLASSES: [usize; 3] = [2, 5, 7];

const COCO_CLASSES: usize = 80;

pub fn is_vehicle_class(class_id: usize) -> bool {
    VEHICLE_CLASSES.contains(&class_id)
}

#[derive(Debug, Clone)]
pub struct Detection {
    /// [x1, y1, x2, y2] in source image coordinates.
    pub bbox: [f32; 4],
    pub confidence: f32,
    pub class_id: usize,
}

/// Narrow seam over the object detector, so the pipeline can run against
/// a scripted detector in tests.
pub trait VehicleDetector {
    /// `rgb` is tightly packed RGB8, `width * height * 3` bytes.
    fn detect(&mut self, rgb: &[u8], width: u32, height: u32) -> Result<Vec<Detection>>;
}

/// YOLOv8 detector backed by ONNX Runtime.
pub struct YoloDetector {
    session: Session,
    input_size: usize,
    confidence_threshold: f32,
    nms_iou_threshold: f32,
}

impl YoloDetector {
    pub fn new(model: &ModelConfig, detection: &DetectionConfig) -> Result<Self> {
        info!("Loading detection model: {}", model.path);

        let mut builder = Session::builder()?
            .with_optimization_level(GraphOptimizationLevel::Level3)?
            .with_intra_threads(model.num_threads)?;
        if model.use_cuda {
            builder =
                builder.with_execution_providers([CUDAExecutionProvider::default().build()])?;
        }
        let session = builder
            .commit_from_file(&model.path)
            .with_context(|| format!("Failed to load detection model from {}", model.path))?;

        info!("✓ Vehicle detector initialized");
        Ok(Self {
            session,
            input_size: model.input_size,
            confidence_threshold: detection.confidence_threshold,
            nms_iou_threshold: detection.nms_iou_threshold,
        })
    }

    fn infer(&mut self, input: Vec<f32>) -> Result<Vec<f32>> {
        let shape = [1, 3, self.input_size, self.input_size];
        let input_value =
            ort::value::Value::from_array((shape.as_slice(), input.into_boxed_slice()))?;

        let outputs = self.session.run(ort::inputs!["images" => input_value])?;
        let (_, data) = outputs[0].try_extract_tensor::<f32>()?;

        Ok(data.to_vec())
    }

    /// Parse the raw [1, 4 + classes, N] output back into source-image
    /// coordinates and suppress duplicates.
    fn postprocess(&self, output: &[f32], scale: f32, pad_x: f32, pad_y: f32) -> Vec<Detection> {
        let num_preds = output.len() / (4 + COCO_CLASSES);
        let mut detections = Vec::new();

        for i in 0..num_preds {
            // Centre-format box.
            let cx = output[i];
            let cy = output[num_preds + i];
            let w = output[num_preds * 2 + i];
            let h = output[num_preds * 3 + i];

            let mut best_conf = 0.0f32;
            let mut best_class = 0usize;
            for c in 0..COCO_CLASSES {
                let conf = output[num_preds * (4 + c) + i];
                if conf > best_conf {
                    best_conf = conf;
                    best_class = c;
                }
            }

            if best_conf < self.confidence_threshold {
                continue;
            }

            // Corners, then undo the letterbox transform.
            let x1 = (cx - w / 2.0 - pad_x) / scale;
            let y1 = (cy - h / 2.0 - pad_y) / scale;
            let x2 = (cx + w / 2.0 - pad_x) / scale;
            let y2 = (cy + h / 2.0 - pad_y) / scale;

            detections.push(Detection {
                bbox: [x1, y1, x2, y2],
                confidence: best_conf,
                class_id: best_class,
            });
        }

        nms(detections, self.nms_iou_threshold)
    }
}

impl VehicleDetector for YoloDetector {
    fn detect(&mut self, rgb: &[u8], width: u32, height: u32) -> Result<Vec<Detection>> {
        let (input, scale, pad_x, pad_y) = letterbox(rgb, width, height, self.input_size)?;
        let output = self.infer(input)?;
        let detections = self.postprocess(&output, scale, pad_x, pad_y);
        debug!("Detector returned {} candidate box(es)", detections.len());
        Ok(detections)
    }
}

/// Scale the image to fit a square model input while keeping aspect ratio,
/// centred on a gray canvas, normalized to [0, 1] in CHW order.
///
/// Returns the tensor plus the (scale, pad_x, pad_y) needed to map model
/// coordinates back to the source image.
fn letterbox(
    rgb: &[u8],
    width: u32,
    height: u32,
    target: usize,
) -> Result<(Vec<f32>, f32, f32, f32)> {
    let src: RgbImage = ImageBuffer::from_raw(width, height, rgb.to_vec())
        .context("RGB buffer does not match image dimensions")?;

    let target = target as u32;
    let scale = (target as f32 / width as f32).min(target as f32 / height as f32);
    let scaled_w = ((width as f32 * scale) as u32).max(1);
    let scaled_h = ((height as f32 * scale) as u32).max(1);
    let pad_x = (target - scaled_w) as f32 / 2.0;
    let pad_y = (target - scaled_h) as f32 / 2.0;

    let resized = imageops::resize(&src, scaled_w, scaled_h, FilterType::Triangle);
    let mut canvas = RgbImage::from_pixel(target, target, Rgb([114, 114, 114]));
    imageops::replace(&mut canvas, &resized, pad_x as i64, pad_y as i64);

    let area = (target * target) as usize;
    let mut input = vec![0.0f32; 3 * area];
    for (x, y, pixel) in canvas.enumerate_pixels() {
        let offset = (y * target + x) as usize;
        for c in 0..3 {
            input[c * area + offset] = pixel[c] as f32 / 255.0;
        }
    }

    Ok((input, scale, pad_x, pad_y))
}

/// Non-maximum suppression: keep the highest-confidence box of every
/// overlapping cluster.
fn nms(mut detections: Vec<Detection>, iou_threshold: f32) -> Vec<Detection> {
    detections.sort_by(|a, b| b.confidence.total_cmp(&a.confidence));

    let mut keep: Vec<Detection> = Vec::with_capacity(detections.len());
    for det in detections {
        if keep.iter().all(|k| iou(&k.bbox, &det.bbox) < iou_threshold) {
            keep.push(det);
        }
    }
    keep
}

fn iou(box1: &[f32; 4], box2: &[f32; 4]) -> f32 {
    let x1 = box1[0].max(box2[0]);
    let y1 = box1[1].max(box2[1]);
    let x2 = box1[2].min(box2[2]);
    let y2 = box1[3].min(box2[3]);

    let intersection = (x2 - x1).max(0.0) * (y2 - y1).max(0.0);
    let area1 = (box1[2] - box1[0]) * (box1[3] - box1[1]);
    let area2 = (box2[2] - box2[0]) * (box2[3] - box2[1]);
    let union = area1 + area2 - intersection;

    if union > 0.0 {
        intersection / union
    } else {
        0.0
    }
}
