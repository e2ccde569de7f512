use std::path::PathBuf;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Upload rejected before it reached the editor.
    #[error("Invalid file type '{mime}': please upload an image file")]
    InvalidFileType { mime: String },

    #[error("Failed to load image: {0}")]
    Decode(#[source] image::ImageError),

    #[error("Image has no pixels ({width}x{height})")]
    EmptyImage { width: u32, height: u32 },

    #[error("Failed to encode image: {0}")]
    Encode(#[source] image::ImageError),

    #[error("Invalid data URI: {0}")]
    InvalidDataUri(String),

    #[error("{0}")]
    Validation(String),

    #[error("Please upload an image and make a selection.")]
    MissingSelection,

    #[error("A fill request is already in progress")]
    Busy,

    /// Message of the remote capability, shown to the user as is.
    #[error("{0}")]
    Upstream(String),

    #[error("There is no inpainted image to download")]
    NoResult,

    #[error("Failed to read config {path}: {reason}")]
    Config { path: PathBuf, reason: String },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}
