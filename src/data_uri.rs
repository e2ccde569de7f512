use std::{fmt, str::FromStr};

use base64::{engine::general_purpose::STANDARD as BASE64, Engine as _};

use crate::Error;

/// Binary content carried as `data:<mimetype>;base64,<payload>`.
#[derive(Clone, PartialEq, Eq)]
pub struct DataUri {
    mime: String,
    bytes: Vec<u8>,
}

impl DataUri {
    pub fn new(mime: impl Into<String>, bytes: Vec<u8>) -> Self {
        Self {
            mime: mime.into(),
            bytes,
        }
    }

    pub fn png(bytes: Vec<u8>) -> Self {
        Self::new("image/png", bytes)
    }

    pub fn from_base64(mime: impl Into<String>, payload: &str) -> Result<Self, Error> {
        let bytes = BASE64
            .decode(payload.trim())
            .map_err(|e| Error::InvalidDataUri(format!("payload is not base64: {e}")))?;
        Ok(Self::new(mime, bytes))
    }

    pub fn mime(&self) -> &str {
        &self.mime
    }

    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }

    pub fn into_bytes(self) -> Vec<u8> {
        self.bytes
    }

    pub fn base64_payload(&self) -> String {
        BASE64.encode(&self.bytes)
    }

    pub fn is_image(&self) -> bool {
        self.mime.starts_with("image/")
    }
}

impl fmt::Display for DataUri {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "data:{};base64,{}", self.mime, self.base64_payload())
    }
}

// Payloads are large, keep them out of logs.
impl fmt::Debug for DataUri {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DataUri")
            .field("mime", &self.mime)
            .field("len", &self.bytes.len())
            .finish()
    }
}

impl FromStr for DataUri {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let rest = s
            .strip_prefix("data:")
            .ok_or_else(|| Error::InvalidDataUri("missing 'data:' prefix".into()))?;
        let (header, payload) = rest
            .split_once(',')
            .ok_or_else(|| Error::InvalidDataUri("missing ',' separator".into()))?;
        let mime = header
            .strip_suffix(";base64")
            .ok_or_else(|| Error::InvalidDataUri("only base64 payloads are supported".into()))?;
        if mime.is_empty() {
            return Err(Error::InvalidDataUri("missing mime type".into()));
        }
        Self::from_base64(mime, payload)
    }
}
