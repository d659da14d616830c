//! Canvas compositing for the drawing board
//!
//! Renders strokes and the cursor indicator using tiny-skia. Stroke geometry
//! is extracted into a [`StrokeLayout`] first, so the ledger lock is held only
//! while copying segments and never while rasterizing.

use tiny_skia::{
    Color, FillRule, IntSize, LineCap, LineJoin, Paint, PathBuilder, Pixmap, Stroke, Transform,
};

use crate::config::{ChannelOrder, Theme};
use crate::domain::core::{Point, Rgb};
use crate::domain::ledger::StrokeLedger;
use crate::platform::capture::Frame;

/// Rendering errors
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RendererError {
    #[error("Failed to create pixmap for rendering")]
    PixmapCreationFailed,

    #[error("Invalid canvas dimensions: {width}x{height}")]
    InvalidDimensions { width: u32, height: u32 },

    #[error("Camera frame buffer does not match {width}x{height}")]
    MalformedFrame { width: u32, height: u32 },
}

/// Represents a single line segment to rasterize
#[derive(Debug, Clone, PartialEq)]
pub struct Line {
    pub x1: f32,
    pub y1: f32,
    pub x2: f32,
    pub y2: f32,
    pub width: f32,
    pub color: Color,
}

/// Pre-calculated stroke geometry
#[derive(Debug, Clone, Default, PartialEq)]
pub struct StrokeLayout {
    pub lines: Vec<Line>,
}

impl StrokeLayout {
    /// Collects one line per consecutive point pair, styled by the earlier point
    pub fn from_ledger(ledger: &StrokeLedger) -> Self {
        let lines = ledger
            .strokes()
            .iter()
            .flat_map(|stroke| stroke.segments())
            .map(|segment| {
                let (x1, y1) = pixel_center(segment.from);
                let (x2, y2) = pixel_center(segment.to);
                Line {
                    x1,
                    y1,
                    x2,
                    y2,
                    width: segment.style.thickness as f32,
                    color: to_color(segment.style.color),
                }
            })
            .collect();
        Self { lines }
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }
}

/// Finished frame: mirrored, 3 bytes per pixel in `order`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderedFrame {
    pub width: u32,
    pub height: u32,
    pub order: ChannelOrder,
    pub pixels: Vec<u8>,
}

impl RenderedFrame {
    /// Channels of the pixel at (`x`, `y`) in this frame's channel order
    pub fn pixel(&self, x: u32, y: u32) -> Option<[u8; 3]> {
        if x >= self.width || y >= self.height {
            return None;
        }
        let offset = (y as usize * self.width as usize + x as usize) * 3;
        self.pixels
            .get(offset..offset + 3)
            .map(|px| [px[0], px[1], px[2]])
    }

    /// Pixel at (`x`, `y`) as a color, regardless of channel order
    pub fn rgb(&self, x: u32, y: u32) -> Option<Rgb> {
        self.pixel(x, y).map(|[a, b, c]| match self.order {
            ChannelOrder::Rgb => Rgb::new(a, b, c),
            ChannelOrder::Bgr => Rgb::new(c, b, a),
        })
    }
}

/// Composites the board, strokes, and indicator
#[derive(Debug, Default, Clone, Copy)]
pub struct CanvasRenderer;

impl CanvasRenderer {
    /// Fill shade of the board in the dark theme
    pub const DARK_SHADE: u8 = 31;
    /// Fill shade of the board in the light theme
    pub const LIGHT_SHADE: u8 = 255;

    pub fn new() -> Self {
        Self
    }

    /// Solid board of the given size, shaded by theme
    pub fn generate_background(
        &self,
        width: u32,
        height: u32,
        theme: Theme,
    ) -> Result<Pixmap, RendererError> {
        if width == 0 || height == 0 {
            return Err(RendererError::InvalidDimensions { width, height });
        }
        let mut pixmap = Pixmap::new(width, height).ok_or(RendererError::PixmapCreationFailed)?;

        let shade = if theme.is_dark() {
            Self::DARK_SHADE
        } else {
            Self::LIGHT_SHADE
        };
        pixmap.fill(Color::from_rgba8(shade, shade, shade, 255));

        Ok(pixmap)
    }

    /// Copies an RGB camera frame into an opaque pixmap
    pub fn camera_backdrop(&self, frame: &Frame) -> Result<Pixmap, RendererError> {
        if !frame.is_well_formed() {
            return Err(RendererError::MalformedFrame {
                width: frame.width,
                height: frame.height,
            });
        }
        let size = IntSize::from_wh(frame.width, frame.height).ok_or(
            RendererError::InvalidDimensions {
                width: frame.width,
                height: frame.height,
            },
        )?;

        let mut rgba = Vec::with_capacity(frame.pixels.len() / 3 * 4);
        for px in frame.pixels.chunks_exact(3) {
            rgba.extend_from_slice(&[px[0], px[1], px[2], 255]);
        }

        Pixmap::from_vec(rgba, size).ok_or(RendererError::PixmapCreationFailed)
    }

    /// Rasterizes stroke lines onto the pixmap
    pub fn render_strokes(&self, pixmap: &mut Pixmap, layout: &StrokeLayout) {
        for line in &layout.lines {
            let mut path_builder = PathBuilder::new();
            path_builder.move_to(line.x1, line.y1);
            path_builder.line_to(line.x2, line.y2);

            if let Some(path) = path_builder.finish() {
                let mut paint = Paint::default();
                paint.set_color(line.color);

                let stroke = Stroke {
                    width: line.width,
                    line_cap: LineCap::Round,
                    line_join: LineJoin::Round,
                    ..Stroke::default()
                };

                pixmap.stroke_path(&path, &paint, &stroke, Transform::identity(), None);
            }
        }
    }

    /// Draws a filled circular marker; a zero radius draws nothing
    pub fn render_indicator(&self, pixmap: &mut Pixmap, point: Point, color: Rgb, radius: u32) {
        if radius == 0 {
            return;
        }
        let (cx, cy) = pixel_center(point);
        if let Some(path) = PathBuilder::from_circle(cx, cy, radius as f32) {
            let mut paint = Paint::default();
            paint.set_color(to_color(color));
            pixmap.fill_path(&path, &paint, FillRule::Winding, Transform::identity(), None);
        }
    }

    /// Mirrors the pixmap horizontally and packs it into `order`
    ///
    /// This is the only place channel order is applied.
    pub fn finish(&self, pixmap: &Pixmap, order: ChannelOrder) -> RenderedFrame {
        let width = pixmap.width() as usize;
        let height = pixmap.height() as usize;
        let source = pixmap.pixels();

        let mut pixels = Vec::with_capacity(width * height * 3);
        for y in 0..height {
            let row = &source[y * width..(y + 1) * width];
            for px in row.iter().rev() {
                let color = px.demultiply();
                match order {
                    ChannelOrder::Rgb => {
                        pixels.extend_from_slice(&[color.red(), color.green(), color.blue()])
                    }
                    ChannelOrder::Bgr => {
                        pixels.extend_from_slice(&[color.blue(), color.green(), color.red()])
                    }
                }
            }
        }

        RenderedFrame {
            width: pixmap.width(),
            height: pixmap.height(),
            order,
            pixels,
        }
    }
}

fn pixel_center(point: Point) -> (f32, f32) {
    (point.x as f32 + 0.5, point.y as f32 + 0.5)
}

fn to_color(color: Rgb) -> Color {
    Color::from_rgba8(color.r, color.g, color.b, 255)
}
