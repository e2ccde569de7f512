use std::{io::Cursor, num::NonZeroU32, sync::Arc};

use futures::FutureExt;
use image::{DynamicImage, GenericImageView, ImageFormat, RgbaImage};

use crate::{BoxFuture, DataUri, Error};

/// Decoded upload with its intrinsic size.
#[derive(Clone)]
pub struct SourceImage {
    image: Arc<DynamicImage>,
    width: NonZeroU32,
    height: NonZeroU32,
}

impl SourceImage {
    pub fn new(image: DynamicImage) -> Result<Self, Error> {
        let (width, height) = image.dimensions();
        match (NonZeroU32::new(width), NonZeroU32::new(height)) {
            (Some(w), Some(h)) => Ok(Self {
                image: Arc::new(image),
                width: w,
                height: h,
            }),
            _ => Err(Error::EmptyImage { width, height }),
        }
    }

    pub fn from_bytes(bytes: &[u8]) -> Result<Self, Error> {
        Self::new(image::load_from_memory(bytes).map_err(Error::Decode)?)
    }

    pub fn image(&self) -> &DynamicImage {
        &self.image
    }

    pub fn width(&self) -> NonZeroU32 {
        self.width
    }

    pub fn height(&self) -> NonZeroU32 {
        self.height
    }

    pub fn aspect_ratio(&self) -> f32 {
        self.width.get() as f32 / self.height.get() as f32
    }
}

impl std::fmt::Debug for SourceImage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "SourceImage({}x{})", self.width, self.height)
    }
}

/// Decodes the upload on a worker thread.
pub fn decode_source(uri: &DataUri) -> BoxFuture<'static, Result<SourceImage, Error>> {
    let (tx, rx) = futures::channel::oneshot::channel();
    let bytes = uri.bytes().to_vec();
    std::thread::spawn(move || {
        let r = SourceImage::from_bytes(&bytes);
        tx.send(r)
    });
    async move {
        rx.await.unwrap_or_else(|_| {
            Err(Error::Io(std::io::Error::other(
                "image decoder stopped before finishing",
            )))
        })
    }
    .boxed()
}

pub fn encode_png(image: &RgbaImage) -> Result<DataUri, Error> {
    let mut bytes = Vec::new();
    image
        .write_to(&mut Cursor::new(&mut bytes), ImageFormat::Png)
        .map_err(Error::Encode)?;
    Ok(DataUri::png(bytes))
}
