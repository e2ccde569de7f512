use std::path::{Path, PathBuf};

use emath::Pos2;
use log::{error, info, warn};

use crate::{
    decode_source, AsyncTask, Brush, Config, DataUri, Error, FillBackend, FillMode, FillRequest,
    MaskEditor, Settled, SourceImage, Upload,
};

/// Something that finished in the background since the last [`Session::poll`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionEvent {
    ImageLoaded { width: u32, height: u32 },
    ImageLoadFailed(String),
    FillCompleted,
    FillFailed(String),
    /// A fill finished after the image it was made for was replaced.
    StaleFillDiscarded,
}

/// An accepted upload waiting for its decode. It only becomes the original
/// once the editor adopts it.
struct PendingDecode {
    upload: DataUri,
    task: AsyncTask<Result<SourceImage, Error>>,
}

/// Application state of one inpainting session: the upload, the selection
/// editor, the prompt and the last fill result.
pub struct Session {
    editor: MaskEditor,
    backend: Box<dyn FillBackend>,
    download_file_name: String,
    original: Option<DataUri>,
    scaled_photo: Option<DataUri>,
    mask: Option<DataUri>,
    filled: Option<DataUri>,
    pub prompt: String,
    error: Option<String>,
    decode: Option<PendingDecode>,
    fill: Option<AsyncTask<Result<DataUri, Error>>>,
    // Bumped when the editor adopts a source and on reset. Fills started
    // for an older generation are dropped.
    generation: u64,
    revision: u64,
}

impl Session {
    pub fn new(config: &Config, backend: Box<dyn FillBackend>) -> Self {
        Self {
            editor: MaskEditor::new(config.canvas, Brush::from(&config.brush)),
            backend,
            download_file_name: config.download_file_name.clone(),
            original: None,
            scaled_photo: None,
            mask: None,
            filled: None,
            prompt: String::new(),
            error: None,
            decode: None,
            fill: None,
            generation: 0,
            revision: 0,
        }
    }

    pub fn editor(&self) -> &MaskEditor {
        &self.editor
    }

    pub fn original(&self) -> Option<&DataUri> {
        self.original.as_ref()
    }

    pub fn scaled_photo(&self) -> Option<&DataUri> {
        self.scaled_photo.as_ref()
    }

    pub fn mask(&self) -> Option<&DataUri> {
        self.mask.as_ref()
    }

    pub fn filled_image(&self) -> Option<&DataUri> {
        self.filled.as_ref()
    }

    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    pub fn is_loading_image(&self) -> bool {
        self.decode.is_some()
    }

    /// A fill request is in flight.
    pub fn is_busy(&self) -> bool {
        self.fill.is_some()
    }

    /// Bumped whenever the scaled photo or the fill result changes.
    pub fn revision(&self) -> u64 {
        self.revision
    }

    pub fn upload(&mut self, upload: Upload) -> Result<(), Error> {
        let name = upload.name.clone();
        let uri = upload.into_data_uri()?;
        info!("Decoding upload {name} ({})", uri.mime());

        let task = AsyncTask::new(self.generation, decode_source(&uri));
        self.decode = Some(PendingDecode { upload: uri, task });
        self.error = None;
        Ok(())
    }

    /// Drives background work. Call once per frame until it returns `None`.
    pub fn poll(&mut self) -> Option<SessionEvent> {
        if let Some(event) = self.poll_decode() {
            return Some(event);
        }
        self.poll_fill()
    }

    fn poll_decode(&mut self) -> Option<SessionEvent> {
        let settled = self.decode.as_mut()?.task.poll_settled(self.generation)?;
        let PendingDecode { upload, .. } = self.decode.take()?;

        let source = match settled {
            Settled::Stale { .. } => return None,
            Settled::Current(Ok(source)) => source,
            Settled::Current(Err(e)) => {
                warn!("Failed to load image: {e}");
                let message = e.to_string();
                self.error = Some(message.clone());
                return Some(SessionEvent::ImageLoadFailed(message));
            }
        };
        let (width, height) = (source.width().get(), source.height().get());
        match self.editor.set_source(Some(source)) {
            Ok(published) => {
                self.generation += 1;
                self.original = Some(upload);
                self.filled = None;
                self.scaled_photo = published.scaled_photo;
                self.mask = Some(published.mask);
                self.revision += 1;
                Some(SessionEvent::ImageLoaded { width, height })
            }
            Err(e) => {
                warn!("Failed to prepare image: {e}");
                self.error = Some(e.to_string());
                Some(SessionEvent::ImageLoadFailed(e.to_string()))
            }
        }
    }

    fn poll_fill(&mut self) -> Option<SessionEvent> {
        let settled = self.fill.as_mut()?.poll_settled(self.generation)?;
        self.fill = None;
        let result = match settled {
            Settled::Current(result) => result,
            Settled::Stale { generation } => {
                info!("Discarding fill result of replaced image generation {generation}");
                return Some(SessionEvent::StaleFillDiscarded);
            }
        };

        self.revision += 1;
        match result {
            Ok(image) => {
                info!("Inpainting complete ({:?})", image);
                self.filled = Some(image);
                Some(SessionEvent::FillCompleted)
            }
            Err(e) => {
                error!("Inpainting error: {e}");
                let message = e.to_string();
                self.error = Some(message.clone());
                Some(SessionEvent::FillFailed(message))
            }
        }
    }

    pub fn begin_stroke(&mut self, pos: Pos2) {
        self.editor.begin_stroke(pos);
    }

    pub fn continue_stroke(&mut self, pos: Pos2) {
        self.editor.continue_stroke(pos);
    }

    pub fn end_stroke(&mut self) -> Result<(), Error> {
        if let Some(mask) = self.editor.end_stroke()? {
            self.mask = Some(mask);
        }
        Ok(())
    }

    pub fn leave_canvas(&mut self) -> Result<(), Error> {
        if let Some(mask) = self.editor.abort_stroke_on_exit()? {
            self.mask = Some(mask);
        }
        Ok(())
    }

    pub fn clear_selection(&mut self) -> Result<(), Error> {
        let cleared = self.editor.clear()?;
        self.mask = Some(cleared.mask);
        Ok(())
    }

    /// Validates and dispatches a fill. The result arrives through [`Session::poll`].
    pub fn start_fill(&mut self, mode: FillMode) -> Result<(), Error> {
        if self.is_busy() {
            return Err(Error::Busy);
        }
        let (Some(photo), Some(mask)) = (self.scaled_photo.clone(), self.mask.clone()) else {
            return Err(Error::MissingSelection);
        };
        let request = match mode {
            FillMode::Prompt => FillRequest::with_prompt(photo, mask, &self.prompt)?,
            FillMode::Context => FillRequest::with_context(photo, mask),
        };

        info!("Starting {mode:?} fill");
        self.error = None;
        self.filled = None;
        self.revision += 1;
        self.fill = Some(AsyncTask::new(self.generation, self.backend.fill(request)));
        Ok(())
    }

    /// Writes the exact bytes of the fill result into `dir`.
    pub fn download(&self, dir: impl AsRef<Path>) -> Result<PathBuf, Error> {
        let filled = self.filled.as_ref().ok_or(Error::NoResult)?;
        let path = dir.as_ref().join(&self.download_file_name);
        std::fs::write(&path, filled.bytes())?;
        info!("Saved inpainted image to {}", path.display());
        Ok(path)
    }

    /// Back to a fresh session. A fill still in flight is discarded when it lands.
    pub fn reset(&mut self) -> Result<(), Error> {
        // The placeholder published here is not kept, a reset session has no mask.
        let _ = self.editor.set_source(None)?;
        self.generation += 1;
        self.decode = None;
        self.original = None;
        self.scaled_photo = None;
        self.mask = None;
        self.filled = None;
        self.prompt.clear();
        self.error = None;
        self.revision += 1;
        Ok(())
    }
}
