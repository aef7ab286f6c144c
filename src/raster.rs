// Flattening the scene.
// Elements are drawn strictly in list order into one accumulating pixmap:
// paint strokes go over what is there, erase strokes punch it out to
// transparency no matter which element put the pixels there.

use std::io::Cursor;

use base64::Engine as _;
use base64::engine::general_purpose::STANDARD;
use image::{ImageFormat, RgbaImage};
use tiny_skia::{
    BlendMode, FilterQuality, LineCap, LineJoin, Paint, Path, PathBuilder, Pixmap, PixmapPaint,
    Stroke, Transform,
};

use crate::error::{Result, SketchError};
use crate::types::{CompositeMode, DrawableElement, FrameBuffer, ImageElement, Point, StrokeElement};

/// Render `elements` onto a transparent `width*scale` x `height*scale` pixmap.
pub fn compose(elements: &[DrawableElement], width: u32, height: u32, scale: f32) -> Result<Pixmap> {
    let scale = if scale.is_finite() && scale > 0.0 { scale } else { 1.0 };
    let w = ((width as f32 * scale).round() as u32).max(1);
    let h = ((height as f32 * scale).round() as u32).max(1);
    let mut pixmap = Pixmap::new(w, h)
        .ok_or_else(|| SketchError::Render(format!("cannot allocate {w}x{h} pixmap")))?;

    let transform = Transform::from_scale(scale, scale);
    for element in elements {
        match element {
            DrawableElement::Stroke(s) => draw_stroke(&mut pixmap, s, transform),
            DrawableElement::Image(img) => draw_image(&mut pixmap, img, transform),
        }
    }
    Ok(pixmap)
}

fn stroke_path(points: &[Point]) -> Option<Path> {
    let (first, rest) = points.split_first()?;
    let mut pb = PathBuilder::new();
    pb.move_to(first.x, first.y);
    if rest.is_empty() {
        // a single tap still leaves a round dot
        pb.line_to(first.x, first.y);
    }
    for p in rest {
        pb.line_to(p.x, p.y);
    }
    pb.finish()
}

fn draw_stroke(pixmap: &mut Pixmap, stroke: &StrokeElement, transform: Transform) {
    let Some(path) = stroke_path(stroke.points()) else {
        return;
    };

    let c = stroke.style.color;
    let mut paint = Paint::default();
    paint.set_color_rgba8(c.r, c.g, c.b, c.a);
    paint.anti_alias = true;
    paint.blend_mode = match stroke.mode {
        CompositeMode::Paint => BlendMode::SourceOver,
        CompositeMode::Erase => BlendMode::DestinationOut,
    };

    let line = Stroke {
        width: stroke.style.width,
        line_cap: LineCap::Round,
        line_join: LineJoin::Round,
        ..Stroke::default()
    };
    pixmap.stroke_path(&path, &paint, &line, transform, None);
}

fn draw_image(pixmap: &mut Pixmap, img: &ImageElement, transform: Transform) {
    let src: &Pixmap = &img.source;
    let sx = img.width / src.width() as f32;
    let sy = img.height / src.height() as f32;
    let t = transform
        .pre_translate(img.origin.x, img.origin.y)
        .pre_scale(sx, sy);
    let paint = PixmapPaint { quality: FilterQuality::Bilinear, ..PixmapPaint::default() };
    pixmap.draw_pixmap(0, 0, src.as_ref(), &paint, t, None);
}

/// Straight-alpha copy of a premultiplied pixmap.
pub fn to_rgba_image(pixmap: &Pixmap) -> RgbaImage {
    let mut img = RgbaImage::new(pixmap.width(), pixmap.height());
    for (dst, src) in img.pixels_mut().zip(pixmap.pixels()) {
        let c = src.demultiply();
        *dst = image::Rgba([c.red(), c.green(), c.blue(), c.alpha()]);
    }
    img
}

/// An encoded, flattened scene.
#[derive(Debug, Clone)]
pub struct Raster {
    pub width: u32,
    pub height: u32,
    png: Vec<u8>,
}

impl Raster {
    pub fn from_pixmap(pixmap: &Pixmap) -> Result<Self> {
        let mut png = Vec::new();
        to_rgba_image(pixmap).write_to(&mut Cursor::new(&mut png), ImageFormat::Png)?;
        Ok(Self { width: pixmap.width(), height: pixmap.height(), png })
    }

    pub fn png(&self) -> &[u8] {
        &self.png
    }

    pub fn into_png(self) -> Vec<u8> {
        self.png
    }

    /// `data:image/png;base64,...`
    pub fn to_data_uri(&self) -> String {
        format!("data:image/png;base64,{}", STANDARD.encode(&self.png))
    }
}

/// Copy a render into the top-left of `frame`, flattened over white.
/// Pixels outside the frame are clipped.
pub fn present(pixmap: &Pixmap, frame: &mut FrameBuffer) {
    let pw = pixmap.width() as usize;
    let w = pw.min(frame.width);
    let h = (pixmap.height() as usize).min(frame.height);
    let src = pixmap.pixels();

    for y in 0..h {
        for x in 0..w {
            let p = src[y * pw + x];
            // premultiplied: channel + (1 - alpha) * white
            let white = 255 - p.alpha() as u32;
            let r = p.red() as u32 + white;
            let g = p.green() as u32 + white;
            let b = p.blue() as u32 + white;
            frame.pixels[y * frame.width + x] = (r << 16) | (g << 8) | b;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::StrokeStyle;
    use std::sync::Arc;

    fn line(from: Point, to: Point, mode: CompositeMode) -> DrawableElement {
        let style = StrokeStyle { width: 10.0, ..StrokeStyle::default() };
        let mut s = StrokeElement::new(from, style, mode);
        s.push(to);
        DrawableElement::Stroke(s)
    }

    fn horizontal(mode: CompositeMode) -> DrawableElement {
        line(Point::new(10.0, 50.0), Point::new(90.0, 50.0), mode)
    }

    fn vertical(mode: CompositeMode) -> DrawableElement {
        line(Point::new(50.0, 10.0), Point::new(50.0, 90.0), mode)
    }

    #[test]
    fn empty_scene_is_blank_at_surface_size() {
        let p = compose(&[], 120, 40, 1.0).unwrap();
        assert_eq!((p.width(), p.height()), (120, 40));
        assert!(p.pixels().iter().all(|px| px.alpha() == 0));
    }

    #[test]
    fn scale_multiplies_dimensions() {
        let p = compose(&[], 120, 40, 3.0).unwrap();
        assert_eq!((p.width(), p.height()), (360, 120));
    }

    #[test]
    fn paint_then_erase_leaves_a_hole() {
        let scene = [horizontal(CompositeMode::Paint), vertical(CompositeMode::Erase)];
        let p = compose(&scene, 100, 100, 1.0).unwrap();
        assert_eq!(p.pixel(50, 50).unwrap().alpha(), 0);
        // the rest of the paint stroke survives
        assert_eq!(p.pixel(20, 50).unwrap().alpha(), 255);
    }

    #[test]
    fn erase_then_paint_shows_paint() {
        let scene = [vertical(CompositeMode::Erase), horizontal(CompositeMode::Paint)];
        let p = compose(&scene, 100, 100, 1.0).unwrap();
        let px = p.pixel(50, 50).unwrap();
        assert_eq!(px.alpha(), 255);
        assert_eq!(px.red(), 0);
    }

    #[test]
    fn erase_cuts_through_images_too() {
        let mut src = Pixmap::new(4, 4).unwrap();
        src.fill(tiny_skia::Color::from_rgba8(0, 200, 0, 255));
        let img = DrawableElement::Image(ImageElement {
            source: Arc::new(src),
            origin: Point::new(0.0, 0.0),
            width: 100.0,
            height: 100.0,
        });
        let scene = [img, vertical(CompositeMode::Erase)];
        let p = compose(&scene, 100, 100, 1.0).unwrap();
        assert_eq!(p.pixel(50, 50).unwrap().alpha(), 0);
        let kept = p.pixel(10, 10).unwrap();
        assert!(kept.alpha() >= 254);
        assert!((198..=202).contains(&kept.green()));
    }

    #[test]
    fn strokes_scale_with_the_export() {
        let scene = [horizontal(CompositeMode::Paint)];
        let p = compose(&scene, 100, 100, 3.0).unwrap();
        assert_eq!(p.pixel(150, 150).unwrap().alpha(), 255);
        assert_eq!(p.pixel(150, 100).unwrap().alpha(), 0);
    }

    #[test]
    fn raster_encodes_png_data_uri() {
        let p = compose(&[horizontal(CompositeMode::Paint)], 100, 100, 1.0).unwrap();
        let r = Raster::from_pixmap(&p).unwrap();
        assert!(r.to_data_uri().starts_with("data:image/png;base64,"));
        let decoded = image::load_from_memory(r.png()).unwrap().to_rgba8();
        assert_eq!(decoded.dimensions(), (100, 100));
        assert_eq!(decoded.get_pixel(20, 50).0, [0, 0, 0, 255]);
        assert_eq!(decoded.get_pixel(20, 10).0[3], 0);
    }

    #[test]
    fn present_flattens_over_white_and_clips() {
        let p = compose(&[horizontal(CompositeMode::Paint)], 100, 100, 1.0).unwrap();
        let mut frame = FrameBuffer::filled(60, 120, 0x0030_3030);
        present(&p, &mut frame);
        assert_eq!(frame.pixels[10 * 60 + 10], 0x00FF_FFFF);
        assert_eq!(frame.pixels[50 * 60 + 20], 0x0000_0000);
        // below the surface the backdrop stays
        assert_eq!(frame.pixels[110 * 60 + 10], 0x0030_3030);
    }
}
