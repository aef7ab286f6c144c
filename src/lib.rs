//! Freehand sketch pad.
//!
//! A [`surface::SceneSurface`] turns pointer and file input into an ordered
//! list of strokes and images, and flattens it to PNG on demand. The PNG can
//! be saved locally or posted to a remote endpoint through
//! [`transport::Gateway`].

pub mod app;
pub mod config;
pub mod draw;
pub mod error;
pub mod export;
pub mod input;
pub mod media;
pub mod raster;
pub mod surface;
pub mod transport;
pub mod types;

pub use error::{Result, SketchError};
pub use media::ImageSource;
pub use raster::Raster;
pub use surface::{SceneSurface, SurfaceConfig, SurfaceStatus};
pub use types::{CompositeMode, DrawableElement, InteractionMode, Point};
