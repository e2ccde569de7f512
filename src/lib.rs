mod app;
mod async_task;
mod config;
mod data_uri;
mod error;
mod fill;
mod image_utils;
mod mask;
mod scaler;
mod session;
mod upload;

pub use app::run_native;
pub use async_task::{AsyncTask, Settled};
pub use config::{BrushSettings, CanvasSize, Config, FillSettings};
pub use data_uri::DataUri;
pub use error::Error;
pub use fill::{gemini::GeminiBackend, FillBackend, FillMode, FillRequest};
pub use image_utils::{decode_source, encode_png, SourceImage};
pub use mask::{Brush, Cleared, MaskEditor, Publication, StrokeState};
pub use scaler::{letterbox, ScaledPhoto, ScaledRect};
pub use session::{Session, SessionEvent};
pub use upload::Upload;

pub type BoxFuture<'a, T> = futures::future::BoxFuture<'a, T>;
