//! Scene Surface.
//!
//! Owns the ordered element list, the interaction mode and the presentation
//! flags. Pointer, file and resize input arrive as explicit method calls from
//! the window adapter; `rasterize` flattens the scene on demand.

use std::sync::Arc;

use crate::error::{Result, SketchError};
use crate::media::{self, ImageSource, MAX_IMAGE_SIDE};
use crate::raster::{self, Raster};
use crate::types::{
    DrawableElement, ImageElement, InteractionMode, Point, StrokeElement, StrokeStyle,
};

/// Initial geometry and stroke look.
#[derive(Debug, Clone, Copy)]
pub struct SurfaceConfig {
    pub width: u32,
    pub height: u32,
    pub stroke: StrokeStyle,
}

impl Default for SurfaceConfig {
    fn default() -> Self {
        Self { width: 800, height: 400, stroke: StrokeStyle::default() }
    }
}

/// Presentation flags. Only the surface mutates them.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SurfaceStatus {
    submitted: bool,
    success: bool,
    error_message: Option<String>,
}

impl SurfaceStatus {
    pub fn submitted(&self) -> bool {
        self.submitted
    }

    pub fn success(&self) -> bool {
        self.success
    }

    pub fn error_message(&self) -> Option<&str> {
        self.error_message.as_deref()
    }

    fn clear_submission(&mut self) {
        self.submitted = false;
        self.success = false;
    }
}

pub struct SceneSurface {
    width: u32,
    height: u32,
    stroke: StrokeStyle,
    elements: Vec<DrawableElement>,
    /// Index into `elements` of the stroke still receiving points.
    active: Option<usize>,
    mode: InteractionMode,
    status: SurfaceStatus,
    needs_redraw: bool,
}

impl SceneSurface {
    pub fn new(config: SurfaceConfig) -> Self {
        Self {
            width: config.width.max(1),
            height: config.height.max(1),
            stroke: config.stroke,
            elements: Vec::new(),
            active: None,
            mode: InteractionMode::Idle,
            status: SurfaceStatus::default(),
            needs_redraw: true,
        }
    }

    pub fn dimensions(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    pub fn elements(&self) -> &[DrawableElement] {
        &self.elements
    }

    pub fn is_empty(&self) -> bool {
        self.elements.is_empty()
    }

    pub fn mode(&self) -> InteractionMode {
        self.mode
    }

    pub fn status(&self) -> &SurfaceStatus {
        &self.status
    }

    pub fn is_drawing(&self) -> bool {
        self.active.is_some()
    }

    /// Returns true once after any change that affects the rendered output.
    pub fn take_redraw(&mut self) -> bool {
        std::mem::replace(&mut self.needs_redraw, false)
    }

    pub fn set_draw_mode(&mut self) {
        self.mode = InteractionMode::DrawArmed;
    }

    pub fn set_erase_mode(&mut self) {
        self.mode = InteractionMode::EraseArmed;
    }

    /// Viewport changed. Existing content is never reflowed, so this only
    /// applies while the scene is empty.
    pub fn resize(&mut self, width: u32, height: u32) {
        if !self.elements.is_empty() {
            log::debug!("resize to {width}x{height} ignored: scene has content");
            return;
        }
        self.width = width.max(1);
        self.height = height.max(1);
        self.needs_redraw = true;
    }

    pub fn on_pointer_down(&mut self, pos: Point) {
        let Some(mode) = self.mode.composite_mode() else {
            return;
        };
        self.status.clear_submission();
        self.elements
            .push(DrawableElement::Stroke(StrokeElement::new(pos, self.stroke, mode)));
        self.active = Some(self.elements.len() - 1);
        self.needs_redraw = true;
        log::debug!("stroke #{} started ({mode:?})", self.elements.len() - 1);
    }

    pub fn on_pointer_move(&mut self, pos: Point) {
        let Some(idx) = self.active else {
            return;
        };
        if let Some(DrawableElement::Stroke(stroke)) = self.elements.get_mut(idx) {
            stroke.push(pos);
            self.status.clear_submission();
            self.needs_redraw = true;
        }
    }

    pub fn on_pointer_up(&mut self) {
        if let Some(idx) = self.active.take() {
            let n = self.elements[idx].as_stroke().map_or(0, |s| s.points().len());
            log::debug!("stroke #{idx} finished with {n} points");
        }
    }

    /// Append a decoded image at the origin and fit the surface to it.
    /// A rejected source leaves the scene untouched and sets the inline message.
    pub fn insert_image(&mut self, source: ImageSource) -> Result<()> {
        let media_type = source.media_type().to_string();
        let pixmap = match source.into_pixmap() {
            Ok(p) => p,
            Err(e) => {
                log::warn!("rejected {media_type}: {e}");
                self.status.error_message = Some(e.user_message().to_string());
                return Err(e);
            }
        };

        let (w, h) = media::fit_to_max_side(
            pixmap.width() as f32,
            pixmap.height() as f32,
            MAX_IMAGE_SIDE,
        );
        self.width = (w.round() as u32).max(1);
        self.height = (h.round() as u32).max(1);

        self.elements.push(DrawableElement::Image(ImageElement {
            source: Arc::new(pixmap),
            origin: Point::new(0.0, 0.0),
            width: w,
            height: h,
        }));
        self.status.clear_submission();
        self.status.error_message = None;
        self.needs_redraw = true;
        log::debug!("image inserted, surface now {}x{}", self.width, self.height);
        Ok(())
    }

    /// Drop every element. The mode is kept.
    pub fn clear(&mut self) {
        self.elements.clear();
        self.active = None;
        self.status.clear_submission();
        self.needs_redraw = true;
    }

    /// Flatten the scene at `scale` x surface dimensions and encode it as PNG.
    pub fn rasterize(&self, scale: f32) -> Result<Raster> {
        let pixmap = self.render(scale)?;
        Raster::from_pixmap(&pixmap)
    }

    /// Flatten without encoding.
    pub fn render(&self, scale: f32) -> Result<tiny_skia::Pixmap> {
        raster::compose(&self.elements, self.width, self.height, scale)
    }

    /// Called by the adapter once the gateway reports back.
    pub fn record_upload(&mut self, outcome: &std::result::Result<(), SketchError>) {
        match outcome {
            Ok(()) => {
                self.status.submitted = true;
                self.status.success = true;
            }
            Err(e) => log::info!("upload not confirmed: {e}"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::CompositeMode;
    use image::{Rgba, RgbaImage};

    fn surface() -> SceneSurface {
        SceneSurface::new(SurfaceConfig { width: 100, height: 80, ..Default::default() })
    }

    fn image(w: u32, h: u32) -> ImageSource {
        ImageSource::from_rgba(&RgbaImage::from_pixel(w, h, Rgba([0, 0, 255, 255])))
    }

    fn stroke_points(s: &SceneSurface, idx: usize) -> Vec<Point> {
        s.elements()[idx].as_stroke().unwrap().points().to_vec()
    }

    #[test]
    fn idle_pointer_is_pass_through() {
        let mut s = surface();
        s.on_pointer_down(Point::new(1.0, 1.0));
        s.on_pointer_move(Point::new(2.0, 2.0));
        s.on_pointer_up();
        assert!(s.is_empty());
        assert_eq!(s.mode(), InteractionMode::Idle);
    }

    #[test]
    fn stroke_records_every_point_in_order() {
        let mut s = surface();
        s.set_draw_mode();
        let pts: Vec<Point> = (0..500).map(|i| Point::new(i as f32 * 0.1, (i % 7) as f32)).collect();
        s.on_pointer_down(pts[0]);
        for p in &pts[1..] {
            s.on_pointer_move(*p);
        }
        s.on_pointer_up();
        assert_eq!(stroke_points(&s, 0), pts);
    }

    #[test]
    fn moves_after_release_are_ignored() {
        let mut s = surface();
        s.set_draw_mode();
        s.on_pointer_down(Point::new(1.0, 1.0));
        s.on_pointer_up();
        s.on_pointer_move(Point::new(9.0, 9.0));
        assert_eq!(stroke_points(&s, 0), vec![Point::new(1.0, 1.0)]);
        assert!(!s.is_drawing());
    }

    #[test]
    fn mode_decides_composite_mode() {
        let mut s = surface();
        s.set_erase_mode();
        s.set_erase_mode();
        s.on_pointer_down(Point::new(1.0, 1.0));
        s.on_pointer_up();
        s.set_draw_mode();
        s.on_pointer_down(Point::new(2.0, 2.0));
        s.on_pointer_up();
        let modes: Vec<_> = s.elements().iter().map(|e| e.as_stroke().unwrap().mode).collect();
        assert_eq!(modes, vec![CompositeMode::Erase, CompositeMode::Paint]);
    }

    #[test]
    fn resize_only_while_empty() {
        let mut s = surface();
        s.resize(300, 200);
        assert_eq!(s.dimensions(), (300, 200));

        s.set_draw_mode();
        s.on_pointer_down(Point::new(5.0, 5.0));
        s.on_pointer_up();
        s.resize(640, 480);
        assert_eq!(s.dimensions(), (300, 200));
    }

    #[test]
    fn insert_image_fits_long_side_to_300() {
        let mut s = surface();
        s.insert_image(image(600, 300)).unwrap();
        assert_eq!(s.dimensions(), (300, 150));

        let mut s = surface();
        s.insert_image(image(300, 600)).unwrap();
        assert_eq!(s.dimensions(), (150, 300));
    }

    #[test]
    fn non_image_is_rejected_without_mutation() {
        let mut s = surface();
        let err = s
            .insert_image(ImageSource::from_bytes(b"plain text", Some("text/plain")))
            .unwrap_err();
        assert!(matches!(err, SketchError::UnsupportedMedia(_)));
        assert!(s.is_empty());
        assert_eq!(s.dimensions(), (100, 80));
        assert_eq!(s.status().error_message(), Some(crate::error::UNSUPPORTED_MEDIA_MESSAGE));

        s.insert_image(image(10, 10)).unwrap();
        assert_eq!(s.status().error_message(), None);
    }

    #[test]
    fn late_image_lands_after_strokes_drawn_meanwhile() {
        let mut s = surface();
        s.set_draw_mode();
        s.on_pointer_down(Point::new(1.0, 1.0));
        s.on_pointer_move(Point::new(4.0, 4.0));
        s.insert_image(image(600, 300)).unwrap();
        s.on_pointer_move(Point::new(8.0, 8.0));
        s.on_pointer_up();

        assert_eq!(s.elements().len(), 2);
        assert!(matches!(s.elements()[1], DrawableElement::Image(_)));
        assert_eq!(stroke_points(&s, 0).len(), 3);
    }

    #[test]
    fn upload_flags_follow_gateway_and_reset_on_edit() {
        let mut s = surface();
        s.record_upload(&Err(SketchError::Transport("boom".into())));
        assert!(!s.status().submitted());

        s.record_upload(&Ok(()));
        assert!(s.status().submitted() && s.status().success());

        s.on_pointer_down(Point::new(1.0, 1.0));
        assert!(s.status().success(), "idle pointer does not touch flags");

        s.set_draw_mode();
        s.on_pointer_down(Point::new(1.0, 1.0));
        assert!(!s.status().submitted() && !s.status().success());

        s.record_upload(&Ok(()));
        s.clear();
        assert!(!s.status().success());
    }

    #[test]
    fn clear_empties_scene_and_keeps_mode() {
        let mut s = surface();
        s.set_erase_mode();
        s.on_pointer_down(Point::new(1.0, 1.0));
        s.insert_image(image(20, 20)).unwrap();
        s.clear();
        assert!(s.is_empty());
        assert!(!s.is_drawing());
        assert_eq!(s.mode(), InteractionMode::EraseArmed);
        s.on_pointer_move(Point::new(3.0, 3.0));
        assert!(s.is_empty());
    }

    #[test]
    fn redraw_requested_once_per_change() {
        let mut s = surface();
        assert!(s.take_redraw());
        assert!(!s.take_redraw());
        s.set_draw_mode();
        s.on_pointer_down(Point::new(1.0, 1.0));
        assert!(s.take_redraw());
        s.on_pointer_up();
        assert!(!s.take_redraw());
    }
}
