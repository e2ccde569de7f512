use futures::FutureExt;
use log::{debug, error};
use serde::{Deserialize, Serialize};

use super::{FillBackend, FillRequest, NO_IMAGE_RETURNED};
use crate::{BoxFuture, DataUri, Error, FillSettings};

const CONTEXT_INSTRUCTION: &str =
    "Fill the white area indicated in the second image, using the context of the first image.";

/// Gemini `generateContent` with image output.
pub struct GeminiBackend {
    client: reqwest::blocking::Client,
    settings: FillSettings,
}

impl GeminiBackend {
    pub fn new(settings: FillSettings) -> Result<Self, Error> {
        let client = reqwest::blocking::Client::builder()
            .timeout(settings.timeout())
            .build()
            .map_err(|e| Error::Upstream(e.to_string()))?;
        Ok(Self { client, settings })
    }

    fn url(&self) -> String {
        format!(
            "{}/models/{}:generateContent",
            self.settings.endpoint.trim_end_matches('/'),
            self.settings.model
        )
    }

    fn generate_blocking(
        client: reqwest::blocking::Client,
        url: String,
        api_key: String,
        body: GenerateContentRequest,
    ) -> Result<DataUri, Error> {
        let upstream = |e: reqwest::Error| Error::Upstream(e.to_string());
        let response = client
            .post(&url)
            .header("x-goog-api-key", api_key)
            .json(&body)
            .send()
            .map_err(upstream)?;
        let status = response.status();
        let text = response.text().map_err(upstream)?;

        if !status.is_success() {
            let message = serde_json::from_str::<ApiErrorBody>(&text)
                .map(|b| b.error.message)
                .unwrap_or_else(|_| format!("Request failed with status {status}"));
            return Err(Error::Upstream(message));
        }

        let parsed: GenerateContentResponse = serde_json::from_str(&text)
            .map_err(|e| Error::Upstream(format!("Unexpected response: {e}")))?;
        extract_image(parsed)
    }
}

impl FillBackend for GeminiBackend {
    fn fill(&self, request: FillRequest) -> BoxFuture<'static, Result<DataUri, Error>> {
        let api_key = match std::env::var(&self.settings.api_key_env) {
            Ok(key) if !key.trim().is_empty() => key,
            _ => {
                let message = format!(
                    "Environment variable {} with the API key is not set",
                    self.settings.api_key_env
                );
                return async move { Err::<DataUri, _>(Error::Upstream(message)) }.boxed();
            }
        };

        let url = self.url();
        debug!("Sending {:?} fill to {url}", request.mode());
        let body = request_body(&request);
        let client = self.client.clone();

        let (tx, rx) = futures::channel::oneshot::channel();
        std::thread::spawn(move || {
            let r = Self::generate_blocking(client, url, api_key, body);
            if let Err(e) = &r {
                error!("Gemini request failed: {e}");
            }
            tx.send(r)
        });
        async move {
            rx.await.unwrap_or_else(|_| {
                Err(Error::Upstream("Fill request was dropped".into()))
            })
        }
        .boxed()
    }
}

fn request_body(request: &FillRequest) -> GenerateContentRequest {
    let text = request
        .prompt
        .clone()
        .unwrap_or_else(|| CONTEXT_INSTRUCTION.to_string());
    GenerateContentRequest {
        contents: vec![Content {
            role: Some("user".into()),
            parts: vec![
                Part::inline(&request.photo),
                Part::inline(&request.mask),
                Part {
                    text: Some(text),
                    inline_data: None,
                },
            ],
        }],
        generation_config: GenerationConfig {
            response_modalities: vec!["TEXT", "IMAGE"],
        },
    }
}

fn extract_image(response: GenerateContentResponse) -> Result<DataUri, Error> {
    let blob = response
        .candidates
        .into_iter()
        .next()
        .and_then(|c| c.content)
        .and_then(|c| c.parts.into_iter().find_map(|p| p.inline_data))
        .ok_or_else(|| Error::Upstream(NO_IMAGE_RETURNED.into()))?;
    DataUri::from_base64(blob.mime_type, &blob.data)
        .map_err(|e| Error::Upstream(e.to_string()))
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerateContentRequest {
    contents: Vec<Content>,
    generation_config: GenerationConfig,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerationConfig {
    response_modalities: Vec<&'static str>,
}

#[derive(Serialize, Deserialize)]
struct Content {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    role: Option<String>,
    #[serde(default)]
    parts: Vec<Part>,
}

#[derive(Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Part {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    text: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    inline_data: Option<Blob>,
}

impl Part {
    fn inline(uri: &DataUri) -> Self {
        Self {
            text: None,
            inline_data: Some(Blob {
                mime_type: uri.mime().to_string(),
                data: uri.base64_payload(),
            }),
        }
    }
}

#[derive(Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Blob {
    mime_type: String,
    data: String,
}

#[derive(Deserialize)]
struct GenerateContentResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Deserialize)]
struct Candidate {
    content: Option<Content>,
}

#[derive(Deserialize)]
struct ApiErrorBody {
    error: ApiError,
}

#[derive(Deserialize)]
struct ApiError {
    message: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request(prompt: Option<&str>) -> FillRequest {
        FillRequest {
            photo: DataUri::png(b"photo".to_vec()),
            mask: DataUri::png(b"mask".to_vec()),
            prompt: prompt.map(str::to_string),
        }
    }

    #[test]
    fn prompt_request_sends_photo_mask_then_prompt() {
        let body = serde_json::to_value(request_body(&request(Some("sunset sky")))).unwrap();
        let parts = &body["contents"][0]["parts"];
        assert_eq!(parts[0]["inlineData"]["mimeType"], "image/png");
        assert_eq!(parts[0]["inlineData"]["data"], "cGhvdG8=");
        assert_eq!(parts[1]["inlineData"]["data"], "bWFzaw==");
        assert_eq!(parts[2]["text"], "sunset sky");
        assert!(parts[2].get("inlineData").is_none());
        assert_eq!(
            body["generationConfig"]["responseModalities"],
            serde_json::json!(["TEXT", "IMAGE"])
        );
    }

    #[test]
    fn context_request_uses_fixed_instruction() {
        let body = serde_json::to_value(request_body(&request(None))).unwrap();
        assert_eq!(body["contents"][0]["parts"][2]["text"], CONTEXT_INSTRUCTION);
    }

    #[test]
    fn first_inline_image_is_the_result() {
        let response: GenerateContentResponse = serde_json::from_str(
            r#"{"candidates": [{"content": {"role": "model", "parts": [
                {"text": "Here you go"},
                {"inlineData": {"mimeType": "image/png", "data": "YWJj"}}
            ]}}]}"#,
        )
        .unwrap();
        let image = extract_image(response).unwrap();
        assert_eq!(image, DataUri::png(b"abc".to_vec()));
    }

    #[test]
    fn text_only_response_is_an_upstream_error() {
        let response: GenerateContentResponse = serde_json::from_str(
            r#"{"candidates": [{"content": {"parts": [{"text": "I cannot do that"}]}}]}"#,
        )
        .unwrap();
        match extract_image(response) {
            Err(Error::Upstream(message)) => assert_eq!(message, NO_IMAGE_RETURNED),
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn url_joins_endpoint_and_model() {
        let backend = GeminiBackend::new(FillSettings {
            endpoint: "https://example.test/v1beta/".into(),
            ..FillSettings::default()
        })
        .unwrap();
        assert_eq!(
            backend.url(),
            "https://example.test/v1beta/models/gemini-2.0-flash-exp:generateContent"
        );
    }
}
