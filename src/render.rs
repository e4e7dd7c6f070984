//! # Bounding Box Renderer Module
//!
//! Converts normalized detection geometry into pixel space and composites
//! stroked boxes with centered labels over the source image. Output is a
//! PNG with the same dimensions as the input.

use ab_glyph::{FontVec, PxScale};
use image::{DynamicImage, Rgba, RgbaImage};
use imageproc::drawing::{draw_hollow_rect_mut, draw_text_mut, text_size};
use imageproc::rect::Rect;
use std::io::Cursor;
use thiserror::Error;
use tracing::{debug, warn};

// Drawing constants
pub const BOX_COLOR: Rgba<u8> = Rgba([0xA6, 0xFF, 0x96, 0xFF]);
pub const LINE_WIDTH: u32 = 3;
pub const FONT_SCALE: f32 = 20.0;
/// Labels sit this many pixels above the box top
pub const LABEL_RAISE: f32 = 10.0;
/// Extra downward shift per earlier box sharing the same left edge
pub const LABEL_STACK_OFFSET: f32 = 15.0;
/// Label font, looked up in the working directory at startup
pub const FONT_PATH: &str = "Montserrat-SemiBold.ttf";

/// Bounding box with all coordinates as fractions of the image dimensions
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct NormalizedBox {
    pub left: f32,
    pub top: f32,
    pub width: f32,
    pub height: f32,
}

impl NormalizedBox {
    /// Scale to pixel coordinates against the image dimensions
    pub fn to_pixels(&self, image_width: u32, image_height: u32) -> PixelRect {
        PixelRect {
            left: self.left * image_width as f32,
            top: self.top * image_height as f32,
            width: self.width * image_width as f32,
            height: self.height * image_height as f32,
        }
    }
}

/// Box scaled to pixel space
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PixelRect {
    pub left: f32,
    pub top: f32,
    pub width: f32,
    pub height: f32,
}

/// One drawable detection: a box, optionally labeled
#[derive(Debug, Clone, PartialEq)]
pub struct Annotation {
    pub label: Option<String>,
    pub rect: NormalizedBox,
}

/// Anchor point for a label centered above a box. Every earlier box with
/// the exact same left pixel coordinate pushes the label further down so
/// stacked detections do not overprint each other.
pub fn label_anchor(rect: &PixelRect, drawn_lefts: &[f32]) -> (f32, f32) {
    let mut top = rect.top;
    for left in drawn_lefts {
        if *left == rect.left {
            top += LABEL_STACK_OFFSET;
        }
    }
    (rect.left + rect.width / 2.0, top - LABEL_RAISE)
}

/// Errors produced while decoding, drawing, or encoding
#[derive(Error, Debug)]
pub enum RenderError {
    #[error("image error: {0}")]
    Image(#[from] image::ImageError),
}

/// Draws annotations over source images. Holds the label font, loaded once
/// at startup; without a font only the boxes are drawn.
#[derive(Default)]
pub struct Renderer {
    font: Option<FontVec>,
}

impl Renderer {
    /// Load the label font from disk. A missing or invalid font file is
    /// logged and leaves the renderer in box-only mode.
    pub fn from_font_file(path: &str) -> Self {
        match std::fs::read(path) {
            Ok(data) => match FontVec::try_from_vec(data) {
                Ok(font) => {
                    debug!(font_path = %path, "Label font loaded");
                    Self { font: Some(font) }
                }
                Err(e) => {
                    warn!(font_path = %path, error = %e, "Font file is not a valid font, labels disabled");
                    Self { font: None }
                }
            },
            Err(e) => {
                warn!(font_path = %path, error = %e, "Failed to read font file, labels disabled");
                Self { font: None }
            }
        }
    }

    /// Decode the source image, draw every annotation, and re-encode as PNG
    pub fn annotate(
        &self,
        image_bytes: &[u8],
        annotations: &[Annotation],
    ) -> Result<Vec<u8>, RenderError> {
        let source = image::load_from_memory(image_bytes)?;
        let mut canvas = source.to_rgba8();
        let (width, height) = canvas.dimensions();

        let mut drawn_lefts: Vec<f32> = Vec::new();

        for annotation in annotations {
            let rect = annotation.rect.to_pixels(width, height);
            stroke_rect(&mut canvas, &rect);

            if let Some(label) = &annotation.label {
                if let Some(font) = &self.font {
                    let (x, y) = label_anchor(&rect, &drawn_lefts);
                    draw_centered_label(&mut canvas, font, label, x, y);
                }
            }

            drawn_lefts.push(rect.left);
        }

        let mut encoded = Vec::new();
        DynamicImage::ImageRgba8(canvas)
            .write_to(&mut Cursor::new(&mut encoded), image::ImageFormat::Png)?;

        Ok(encoded)
    }
}

/// Stroke a rectangle outline as LINE_WIDTH nested one pixel rectangles
fn stroke_rect(canvas: &mut RgbaImage, rect: &PixelRect) {
    let left = rect.left.round() as i32;
    let top = rect.top.round() as i32;
    let width = rect.width.round() as i32;
    let height = rect.height.round() as i32;

    for inset in 0..LINE_WIDTH as i32 {
        let w = width - 2 * inset;
        let h = height - 2 * inset;
        // Rect::of_size rejects empty rectangles
        if w <= 0 || h <= 0 {
            break;
        }
        draw_hollow_rect_mut(
            canvas,
            Rect::at(left + inset, top + inset).of_size(w as u32, h as u32),
            BOX_COLOR,
        );
    }
}

/// Draw text centered on the anchor point
fn draw_centered_label(canvas: &mut RgbaImage, font: &FontVec, text: &str, x: f32, y: f32) {
    let scale = PxScale::from(FONT_SCALE);
    let (text_width, text_height) = text_size(scale, font, text);
    let draw_x = (x - text_width as f32 / 2.0).round() as i32;
    let draw_y = (y - text_height as f32 / 2.0).round() as i32;
    draw_text_mut(canvas, BOX_COLOR, draw_x, draw_y, scale, font, text);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_to_pixels_scales_by_dimensions() {
        let rect = NormalizedBox {
            left: 0.25,
            top: 0.5,
            width: 0.5,
            height: 0.25,
        };

        let pixels = rect.to_pixels(400, 200);
        assert_eq!(pixels.left, 100.0);
        assert_eq!(pixels.top, 100.0);
        assert_eq!(pixels.width, 200.0);
        assert_eq!(pixels.height, 50.0);
    }

    #[test]
    fn test_label_anchor_stacks_on_shared_left_edge() {
        let rect = PixelRect {
            left: 40.0,
            top: 60.0,
            width: 20.0,
            height: 20.0,
        };

        // No earlier boxes: label sits LABEL_RAISE above the top
        let (x, y) = label_anchor(&rect, &[]);
        assert_eq!(x, 50.0);
        assert_eq!(y, 50.0);

        // One earlier box with the same left edge pushes it down once
        let (_, y) = label_anchor(&rect, &[40.0]);
        assert_eq!(y, 65.0);

        // Different left edges do not count
        let (_, y) = label_anchor(&rect, &[39.0, 41.0]);
        assert_eq!(y, 50.0);
    }
}
