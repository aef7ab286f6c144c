// Core types shared by the surface, the rasterizer and the window adapter.

use std::sync::Arc;

use tiny_skia::Pixmap;

/// A position in surface-local logical units.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Point {
    pub x: f32,
    pub y: f32,
}

impl Point {
    pub fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }
}

/// Straight (non-premultiplied) 8-bit colour.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Rgba {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: u8,
}

impl Rgba {
    pub const BLACK: Rgba = Rgba { r: 0, g: 0, b: 0, a: 255 };
}

/// Colour and width applied to every stroke the surface creates.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StrokeStyle {
    pub color: Rgba,
    pub width: f32,
}

impl Default for StrokeStyle {
    fn default() -> Self {
        Self { color: Rgba::BLACK, width: 2.0 }
    }
}

/// How a stroke combines with the pixels already in the buffer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompositeMode {
    /// Opaque overwrite.
    Paint,
    /// Cut to transparency wherever the stroke passes.
    Erase,
}

/// What the next pointer-down does.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum InteractionMode {
    #[default]
    Idle,
    DrawArmed,
    EraseArmed,
}

impl InteractionMode {
    /// Compositing mode for a stroke started in this mode; `None` while idle.
    pub fn composite_mode(self) -> Option<CompositeMode> {
        match self {
            InteractionMode::Idle => None,
            InteractionMode::DrawArmed => Some(CompositeMode::Paint),
            InteractionMode::EraseArmed => Some(CompositeMode::Erase),
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            InteractionMode::Idle => "IDLE",
            InteractionMode::DrawArmed => "DRAW",
            InteractionMode::EraseArmed => "ERASE",
        }
    }
}

/// A freehand path. Points only ever grow while the stroke is active.
#[derive(Debug, Clone, PartialEq)]
pub struct StrokeElement {
    points: Vec<Point>,
    pub style: StrokeStyle,
    pub mode: CompositeMode,
}

impl StrokeElement {
    pub fn new(start: Point, style: StrokeStyle, mode: CompositeMode) -> Self {
        Self { points: vec![start], style, mode }
    }

    pub fn points(&self) -> &[Point] {
        &self.points
    }

    pub(crate) fn push(&mut self, p: Point) {
        self.points.push(p);
    }
}

/// A decoded raster placed at the origin and stretched to `width` x `height`.
#[derive(Debug, Clone)]
pub struct ImageElement {
    /// Premultiplied pixels at the source's native resolution.
    pub source: Arc<Pixmap>,
    pub origin: Point,
    pub width: f32,
    pub height: f32,
}

/// Anything that can sit in the scene.
#[derive(Debug, Clone)]
pub enum DrawableElement {
    Stroke(StrokeElement),
    Image(ImageElement),
}

impl DrawableElement {
    pub fn as_stroke(&self) -> Option<&StrokeElement> {
        match self {
            DrawableElement::Stroke(s) => Some(s),
            DrawableElement::Image(_) => None,
        }
    }
}

/// Window-ready pixels.
#[derive(Clone)]
pub struct FrameBuffer {
    pub width: usize,      // how wide the frame is on screen (pixels)
    pub height: usize,     // how tall the frame is on screen (pixels)
    pub pixels: Vec<u32>,  // each entry is 0x00RRGGBB for minifb
}

impl FrameBuffer {
    pub fn filled(width: usize, height: usize, color: u32) -> Self {
        Self { width, height, pixels: vec![color; width * height] }
    }
}
