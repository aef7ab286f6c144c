// File input boundary: a selected file becomes an `ImageSource` carrying its
// declared media type and, when it really is an image, the decoded pixels.
// The surface decides whether to accept it; nothing here touches the scene.

use std::fs;
use std::path::Path;

use image::{ImageFormat, RgbaImage};
use tiny_skia::{ColorU8, Pixmap};

use crate::error::{Result, SketchError};

/// Longer side of an inserted image, in logical units.
pub const MAX_IMAGE_SIDE: f32 = 300.0;

const FALLBACK_MEDIA_TYPE: &str = "application/octet-stream";

#[derive(Debug, Clone)]
pub struct ImageSource {
    media_type: String,
    pixels: Option<Pixmap>,
}

impl ImageSource {
    /// Build from raw file bytes. `declared` is the type the picker reported;
    /// without one we sniff the magic bytes.
    pub fn from_bytes(bytes: &[u8], declared: Option<&str>) -> Self {
        let media_type = match declared {
            Some(t) => t.to_string(),
            None => image::guess_format(bytes)
                .map(|f| f.to_mime_type().to_string())
                .unwrap_or_else(|_| FALLBACK_MEDIA_TYPE.to_string()),
        };

        let pixels = if is_image_type(&media_type) {
            match image::load_from_memory(bytes) {
                Ok(img) => pixmap_from_rgba(&img.to_rgba8()),
                Err(e) => {
                    log::warn!("decode failed for {media_type}: {e}");
                    None
                }
            }
        } else {
            None
        };

        Self { media_type, pixels }
    }

    /// Read a file and declare its type from the extension (sniffing if unknown).
    pub fn from_path(path: &Path) -> Result<Self> {
        let bytes = fs::read(path)?;
        let declared = ImageFormat::from_path(path).ok().map(|f| f.to_mime_type());
        Ok(Self::from_bytes(&bytes, declared))
    }

    /// Already-decoded straight RGBA pixels, e.g. from a clipboard adapter.
    pub fn from_rgba(image: &RgbaImage) -> Self {
        Self {
            media_type: "image/png".to_string(),
            pixels: pixmap_from_rgba(image),
        }
    }

    pub fn media_type(&self) -> &str {
        &self.media_type
    }

    /// Native pixel size, if decoding succeeded.
    pub fn dimensions(&self) -> Option<(u32, u32)> {
        self.pixels.as_ref().map(|p| (p.width(), p.height()))
    }

    /// Hand over the pixels, rejecting anything that is not a decoded image.
    pub(crate) fn into_pixmap(self) -> Result<Pixmap> {
        if !is_image_type(&self.media_type) {
            return Err(SketchError::UnsupportedMedia(self.media_type));
        }
        self.pixels
            .ok_or_else(|| SketchError::UnsupportedMedia(format!("{} (undecodable)", self.media_type)))
    }
}

pub fn is_image_type(media_type: &str) -> bool {
    media_type.starts_with("image/")
}

/// Scale `(width, height)` so the longer side equals `max_side`, keeping the aspect ratio.
/// Small images are scaled up as well.
pub fn fit_to_max_side(width: f32, height: f32, max_side: f32) -> (f32, f32) {
    let ratio = if width > height { width / max_side } else { height / max_side };
    (width / ratio, height / ratio)
}

fn pixmap_from_rgba(image: &RgbaImage) -> Option<Pixmap> {
    let (w, h) = image.dimensions();
    let mut pixmap = Pixmap::new(w, h)?;
    for (dst, px) in pixmap.pixels_mut().iter_mut().zip(image.pixels()) {
        *dst = ColorU8::from_rgba(px[0], px[1], px[2], px[3]).premultiply();
    }
    Some(pixmap)
}
