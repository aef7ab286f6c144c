// Error taxonomy for the sketch pad.
// Every variant states *where* things went wrong; none of them leave the scene half-mutated.
use thiserror::Error;

/// Message shown inline when the selected file is not an image.
pub const UNSUPPORTED_MEDIA_MESSAGE: &str = "You can upload only image.";

/// Message reported to the caller when an upload fails for any reason.
pub const TRANSPORT_FAILURE_MESSAGE: &str = "Something went wrong; please try it again.";

pub type Result<T> = std::result::Result<T, SketchError>;

#[derive(Error, Debug)]
pub enum SketchError {
    /// The selected file is not an image (or could not be decoded as one).
    #[error("Unsupported media: {0}")]
    UnsupportedMedia(String),

    /// Remote upload failed; details were already logged by the gateway.
    #[error("Upload failed: {0}")]
    Transport(String),

    /// The surface could not allocate a pixel buffer.
    #[error("Render error: {0}")]
    Render(String),

    /// PNG encode/decode failed.
    #[error("Image codec error: {0}")]
    Encode(#[from] image::ImageError),

    /// Reading a selected file or writing an export failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Creating or updating the window failed.
    #[error("Window error: {0}")]
    Window(String),
}

impl SketchError {
    /// Short, user-facing text for the HUD.
    pub fn user_message(&self) -> &str {
        match self {
            SketchError::UnsupportedMedia(_) => UNSUPPORTED_MEDIA_MESSAGE,
            SketchError::Transport(_) => TRANSPORT_FAILURE_MESSAGE,
            _ => "Something went wrong.",
        }
    }
}
