use std::path::Path;

use image::ImageFormat;

use crate::{DataUri, Error};

/// A file handed over by the user, before any decoding.
#[derive(Debug, Clone)]
pub struct Upload {
    pub name: String,
    pub mime: String,
    pub bytes: Vec<u8>,
}

impl Upload {
    pub fn new(name: impl Into<String>, mime: impl Into<String>, bytes: Vec<u8>) -> Self {
        Self {
            name: name.into(),
            mime: mime.into(),
            bytes,
        }
    }

    /// Reads a file, the mime type is guessed from its extension.
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, Error> {
        let path = path.as_ref();
        let bytes = std::fs::read(path)?;
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_default();
        Ok(Self::new(name, mime_from_path(path), bytes))
    }

    /// Only declared image types are accepted.
    pub fn into_data_uri(self) -> Result<DataUri, Error> {
        let uri = DataUri::new(self.mime, self.bytes);
        if uri.is_image() {
            Ok(uri)
        } else {
            Err(Error::InvalidFileType {
                mime: uri.mime().to_string(),
            })
        }
    }
}

pub(crate) fn mime_from_path(path: &Path) -> &'static str {
    ImageFormat::from_path(path)
        .map(|f| f.to_mime_type())
        .unwrap_or("application/octet-stream")
}
