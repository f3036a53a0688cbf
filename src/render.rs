// src/render.rs

use image::{Rgb, RgbImage};
use imageproc::drawing::draw_hollow_rect_mut;
use imageproc::rect::Rect;

use crate::parking_analyzer::ParkingReport;

const OCCUPIED_COLOR: Rgb<u8> = Rgb([220, 40, 40]);
const AVAILABLE_COLOR: Rgb<u8> = Rgb([40, 200, 60]);
const LINE_THICKNESS: i32 = 2;

/// Draw the parked vehicles (red) and the allocated slots (green, spanning
/// the strip band) onto a copy of the input image.
pub fn render_report(image: &RgbImage, report: &ParkingReport) -> RgbImage {
    let mut annotated = image.clone();

    for b in &report.boxes {
        draw_rect(&mut annotated, b.x1, b.y1, b.x2, b.y2, OCCUPIED_COLOR);
    }

    let (top, bottom) = report.strip;
    for slot in &report.slots {
        draw_rect(
            &mut annotated,
            slot.start,
            top as i32,
            slot.end,
            bottom as i32,
            AVAILABLE_COLOR,
        );
    }

    annotated
}

/// Hollow rectangle with a fixed line thickness, clamped to the image.
fn draw_rect(image: &mut RgbImage, x1: i32, y1: i32, x2: i32, y2: i32, color: Rgb<u8>) {
    let (width, height) = image.dimensions();
    let x1 = x1.clamp(0, width as i32 - 1);
    let y1 = y1.clamp(0, height as i32 - 1);
    let x2 = x2.clamp(0, width as i32 - 1);
    let y2 = y2.clamp(0, height as i32 - 1);

    for t in 0..LINE_THICKNESS {
        let w = x2 - x1 - 2 * t;
        let h = y2 - y1 - 2 * t;
        if w <= 0 || h <= 0 {
            break;
        }
        let rect = Rect::at(x1 + t, y1 + t).of_size(w as u32, h as u32);
        draw_hollow_rect_mut(image, rect, color);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{BoundingBox, ParkingSlot};

    fn report() -> ParkingReport {
        ParkingReport {
            case_id: Some(3),
            boxes: vec![BoundingBox::new(100, 50, 300, 250)],
            assignments: vec![crate::types::VehicleType::Suv],
            target_width: Some(212.0),
            slots: vec![ParkingSlot {
                start: 400,
                end: 612,
            }],
            strip: (50, 250),
        }
    }

    #[test]
    fn test_render_preserves_dimensions_and_input() {
        let image = RgbImage::new(800, 400);
        let annotated = render_report(&image, &report());
        assert_eq!(annotated.dimensions(), (800, 400));
        // The input image itself is untouched.
        assert_eq!(*image.get_pixel(100, 50), Rgb([0, 0, 0]));
    }

    #[test]
    fn test_render_draws_occupied_and_available_edges() {
        let image = RgbImage::new(800, 400);
        let annotated = render_report(&image, &report());
        assert_eq!(*annotated.get_pixel(100, 50), OCCUPIED_COLOR);
        assert_eq!(*annotated.get_pixel(400, 50), AVAILABLE_COLOR);
    }

    #[test]
    fn test_out_of_bounds_rect_is_clamped() {
        let mut image = RgbImage::new(100, 100);
        draw_rect(&mut image, -10, -10, 150, 150, OCCUPIED_COLOR);
        assert_eq!(*image.get_pixel(0, 0), OCCUPIED_COLOR);
    }
}
