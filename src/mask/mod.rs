use emath::Pos2;
use image::{Rgba, RgbaImage};
use log::{debug, info};

use crate::{
    encode_png, BrushSettings, CanvasSize, DataUri, Error, ScaledPhoto, ScaledRect, SourceImage,
};

use brush::{Dab, PaintTarget, MASK_KEEP, TRANSPARENT};

mod brush;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Brush {
    pub size: f32,
    pub color: Rgba<u8>,
}

impl From<&BrushSettings> for Brush {
    fn from(settings: &BrushSettings) -> Self {
        Self {
            size: settings.size,
            color: Rgba(settings.color),
        }
    }
}

impl Default for Brush {
    fn default() -> Self {
        Self::from(&BrushSettings::default())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub enum StrokeState {
    #[default]
    Idle,
    Drawing {
        last: Pos2,
    },
}

/// Everything emitted after the source image changed.
#[derive(Debug)]
pub struct Publication {
    /// `None` while no image is loaded.
    pub scaled_photo: Option<DataUri>,
    pub mask: DataUri,
}

/// Completion of [`MaskEditor::clear`].
#[derive(Debug)]
#[must_use]
pub struct Cleared {
    pub mask: DataUri,
}

/// Selection editor with a translucent overlay for the user and a strict
/// black/white mask for the model. Both buffers always change together.
pub struct MaskEditor {
    canvas: CanvasSize,
    brush: Brush,
    source: Option<(SourceImage, ScaledPhoto)>,
    visual: RgbaImage,
    export: RgbaImage,
    stroke: StrokeState,
    revision: u64,
}

impl MaskEditor {
    pub fn new(canvas: CanvasSize, brush: Brush) -> Self {
        Self {
            canvas,
            brush,
            source: None,
            visual: RgbaImage::from_pixel(canvas.width, canvas.height, TRANSPARENT),
            export: RgbaImage::from_pixel(canvas.width, canvas.height, MASK_KEEP),
            stroke: StrokeState::Idle,
            revision: 0,
        }
    }

    pub fn canvas(&self) -> CanvasSize {
        self.canvas
    }

    pub fn has_image(&self) -> bool {
        self.source.is_some()
    }

    pub fn scaled_rect(&self) -> Option<ScaledRect> {
        self.source.as_ref().map(|(_, photo)| photo.rect)
    }

    /// Scaled image as drawn below the overlay.
    pub fn display(&self) -> Option<&RgbaImage> {
        self.source.as_ref().map(|(_, photo)| &photo.display)
    }

    pub fn visual(&self) -> &RgbaImage {
        &self.visual
    }

    pub fn export_mask(&self) -> &RgbaImage {
        &self.export
    }

    pub fn stroke(&self) -> StrokeState {
        self.stroke
    }

    pub fn is_drawing(&self) -> bool {
        matches!(self.stroke, StrokeState::Drawing { .. })
    }

    /// Bumped on every change of the pixel buffers.
    pub fn revision(&self) -> u64 {
        self.revision
    }

    /// Replaces the source image (or drops it) and resets both buffers.
    pub fn set_source(&mut self, source: Option<SourceImage>) -> Result<Publication, Error> {
        let scaled = source
            .map(|s| ScaledPhoto::render(&s, self.canvas).map(|photo| (s, photo)))
            .transpose()?;
        let scaled_photo = scaled.as_ref().map(|(_, photo)| photo.encoded.clone());
        if let Some((source, photo)) = &scaled {
            info!("Loaded {source:?} into {:?}", photo.rect);
        }
        self.source = scaled;
        self.reset_buffers();

        Ok(Publication {
            scaled_photo,
            mask: self.publish_mask()?,
        })
    }

    pub fn begin_stroke(&mut self, pos: Pos2) {
        if self.source.is_none() {
            return;
        }
        debug!("Stroke started at {pos:?}");
        self.stroke = StrokeState::Drawing { last: pos };
        self.apply(Dab::Dot {
            center: pos,
            radius: self.brush.size / 2.0,
        });
    }

    pub fn continue_stroke(&mut self, pos: Pos2) {
        let (StrokeState::Drawing { last }, true) = (self.stroke, self.source.is_some()) else {
            return;
        };
        self.apply(Dab::Segment {
            from: last,
            to: pos,
            radius: self.brush.size / 2.0,
        });
        self.stroke = StrokeState::Drawing { last: pos };
    }

    /// Returns the mask if a stroke was in progress.
    pub fn end_stroke(&mut self) -> Result<Option<DataUri>, Error> {
        if !self.is_drawing() {
            return Ok(None);
        }
        self.stroke = StrokeState::Idle;
        self.publish_mask().map(Some)
    }

    /// Pointer left the canvas; the stroke is finished as if released.
    pub fn abort_stroke_on_exit(&mut self) -> Result<Option<DataUri>, Error> {
        if self.is_drawing() {
            debug!("Pointer left the canvas while drawing");
        }
        self.end_stroke()
    }

    pub fn clear(&mut self) -> Result<Cleared, Error> {
        self.reset_buffers();
        Ok(Cleared {
            mask: self.publish_mask()?,
        })
    }

    fn apply(&mut self, dab: Dab) {
        dab.apply(&mut self.visual, &PaintTarget::brush(self.brush.color));
        dab.apply(&mut self.export, &PaintTarget::mask());
        self.revision += 1;
    }

    fn reset_buffers(&mut self) {
        self.visual.pixels_mut().for_each(|p| *p = TRANSPARENT);
        self.export.pixels_mut().for_each(|p| *p = MASK_KEEP);
        self.stroke = StrokeState::Idle;
        self.revision += 1;
    }

    fn publish_mask(&self) -> Result<DataUri, Error> {
        encode_png(&self.export)
    }
}
