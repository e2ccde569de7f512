use crate::{BoxFuture, DataUri, Error};

pub mod gemini;

pub const NO_IMAGE_RETURNED: &str = "AI generation failed to return an image.";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FillMode {
    /// Fill guided by a text prompt.
    Prompt,
    /// Fill from the surrounding image only.
    Context,
}

/// One inpainting request. White mask pixels are regenerated, black ones kept.
#[derive(Debug, Clone, PartialEq)]
pub struct FillRequest {
    pub photo: DataUri,
    pub mask: DataUri,
    pub prompt: Option<String>,
}

impl FillRequest {
    pub fn with_prompt(photo: DataUri, mask: DataUri, prompt: &str) -> Result<Self, Error> {
        if prompt.trim().is_empty() {
            return Err(Error::Validation(
                "Please enter a prompt for the fill.".into(),
            ));
        }
        Ok(Self {
            photo,
            mask,
            prompt: Some(prompt.to_string()),
        })
    }

    pub fn with_context(photo: DataUri, mask: DataUri) -> Self {
        Self {
            photo,
            mask,
            prompt: None,
        }
    }

    pub fn mode(&self) -> FillMode {
        match self.prompt {
            Some(_) => FillMode::Prompt,
            None => FillMode::Context,
        }
    }
}

/// Remote generation capability. One request, one answer, no retries.
pub trait FillBackend {
    fn fill(&self, request: FillRequest) -> BoxFuture<'static, Result<DataUri, Error>>;
}
