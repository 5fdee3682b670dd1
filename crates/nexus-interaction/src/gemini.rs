//! GeminiClient - direct REST implementation of the generative service.
//!
//! Calls the Gemini REST API without an SDK dependency. Chat and story
//! responses use the `streamGenerateContent` SSE endpoint, image generation
//! the Imagen predict endpoint, image editing `generateContent` with image
//! and text response modalities, and video the long-running operation
//! endpoints polled by the caller.

use async_trait::async_trait;
use futures::StreamExt;
use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;

use nexus_core::chat::MessagePart;
use nexus_core::media::InlineImage;

use crate::client::{
    ChatContext, ChatTurn, ClientError, ClientResult, EditOutcome, FRAGMENT_CHANNEL_CAPACITY,
    FragmentStream, GenerativeClient, ImageAspectRatio, StoryOptions, TurnRole, VideoOperation,
    VideoRequest, VideoState,
};
use crate::config;

const API_ROOT: &str = "https://generativelanguage.googleapis.com/v1beta";
const BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta/models";

const DEFAULT_CHAT_MODEL: &str = "gemini-2.5-flash";
const IMAGE_MODEL: &str = "imagen-4.0-generate-001";
const EDIT_MODEL: &str = "gemini-2.5-flash-image-preview";
const VIDEO_MODEL: &str = "veo-2.0-generate-001";

/// Client for the Gemini HTTP API.
#[derive(Clone)]
pub struct GeminiClient {
    client: Client,
    api_key: String,
    chat_model: String,
}

impl GeminiClient {
    /// Creates a new client with the provided API key.
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            client: Client::new(),
            api_key: api_key.into(),
            chat_model: DEFAULT_CHAT_MODEL.to_string(),
        }
    }

    /// Loads configuration from secret.json or the environment.
    pub fn try_from_config() -> ClientResult<Self> {
        let gemini = config::resolve_gemini_config()?;
        let mut client = Self::new(gemini.api_key);
        if let Some(model) = gemini.model_name {
            client.chat_model = model;
        }
        Ok(client)
    }

    /// Overrides the chat model after construction.
    pub fn with_chat_model(mut self, model: impl Into<String>) -> Self {
        self.chat_model = model.into();
        self
    }

    fn model_url(&self, model: &str, verb: &str) -> String {
        format!(
            "{BASE_URL}/{model}:{verb}?key={api_key}",
            api_key = self.api_key
        )
    }

    fn operation_url(&self, name: &str) -> String {
        format!("{API_ROOT}/{name}?key={api_key}", api_key = self.api_key)
    }

    async fn post_json<B: Serialize, R: for<'de> Deserialize<'de>>(
        &self,
        url: String,
        body: &B,
    ) -> ClientResult<R> {
        let response = self
            .client
            .post(url)
            .json(body)
            .send()
            .await
            .map_err(request_error)?;

        if !response.status().is_success() {
            let status = response.status();
            let body_text = response
                .text()
                .await
                .unwrap_or_else(|_| "failed to read error body".to_string());
            return Err(map_http_error(status, body_text));
        }

        response
            .json()
            .await
            .map_err(|err| ClientError::Decode(format!("failed to parse response: {err}")))
    }

    /// Opens an SSE stream and forwards each decoded text fragment, in
    /// arrival order, into a fragment channel. The returned receiver is
    /// closed when the producer finishes; a mid-stream failure is delivered
    /// in-band as the final item.
    async fn open_fragment_stream(
        &self,
        request: GenerateContentRequest,
        on_complete: Option<StreamCompletion>,
    ) -> ClientResult<FragmentStream> {
        let url = format!(
            "{BASE_URL}/{model}:streamGenerateContent?alt=sse&key={api_key}",
            model = self.chat_model,
            api_key = self.api_key
        );

        let response = self
            .client
            .post(url)
            .json(&request)
            .send()
            .await
            .map_err(request_error)?;

        if !response.status().is_success() {
            let status = response.status();
            let body_text = response
                .text()
                .await
                .unwrap_or_else(|_| "failed to read error body".to_string());
            return Err(map_http_error(status, body_text));
        }

        tracing::debug!(model = %self.chat_model, "opened streaming generate request");
        let (tx, rx) = mpsc::channel(FRAGMENT_CHANNEL_CAPACITY);
        tokio::spawn(async move {
            let mut bytes = response.bytes_stream();
            let mut buffer: Vec<u8> = Vec::new();
            let mut assembled = String::new();

            while let Some(chunk) = bytes.next().await {
                let chunk = match chunk {
                    Ok(chunk) => chunk,
                    Err(err) => {
                        let _ = tx
                            .send(Err(ClientError::Stream(format!(
                                "response stream failed: {err}"
                            ))))
                            .await;
                        return;
                    }
                };
                buffer.extend_from_slice(&chunk);

                while let Some(newline) = buffer.iter().position(|b| *b == b'\n') {
                    let line: Vec<u8> = buffer.drain(..=newline).collect();
                    let line = String::from_utf8_lossy(&line);
                    let line = line.trim_end();
                    let Some(data) = line.strip_prefix("data: ") else {
                        continue;
                    };

                    match serde_json::from_str::<GenerateContentResponse>(data) {
                        Ok(parsed) => {
                            if let Some(text) = first_candidate_text(parsed) {
                                assembled.push_str(&text);
                                if tx.send(Ok(text)).await.is_err() {
                                    return;
                                }
                            }
                        }
                        Err(err) => {
                            let _ = tx
                                .send(Err(ClientError::Decode(format!(
                                    "malformed stream chunk: {err}"
                                ))))
                                .await;
                            return;
                        }
                    }
                }
            }

            if let Some(completion) = on_complete {
                completion.record(assembled).await;
            }
        });

        Ok(rx)
    }
}

/// Records a finished exchange into its chat context once the stream ends.
struct StreamCompletion {
    history: std::sync::Arc<tokio::sync::Mutex<Vec<ChatTurn>>>,
    user_parts: Vec<MessagePart>,
}

impl StreamCompletion {
    async fn record(self, model_text: String) {
        let mut history = self.history.lock().await;
        history.push(ChatTurn {
            role: TurnRole::User,
            parts: self.user_parts,
        });
        history.push(ChatTurn {
            role: TurnRole::Model,
            parts: vec![MessagePart::text(model_text)],
        });
    }
}

#[async_trait]
impl GenerativeClient for GeminiClient {
    async fn start_chat(&self, system_instruction: &str) -> ClientResult<ChatContext> {
        Ok(ChatContext::new(system_instruction))
    }

    async fn send_streamed(
        &self,
        context: &ChatContext,
        parts: Vec<MessagePart>,
    ) -> ClientResult<FragmentStream> {
        let mut contents: Vec<Content> = context
            .history()
            .await
            .iter()
            .map(Content::from_turn)
            .collect();
        contents.push(Content::user(wire_parts(&parts)));

        let request = GenerateContentRequest {
            contents,
            system_instruction: Some(Content::system(context.system_instruction())),
            generation_config: None,
        };

        let completion = StreamCompletion {
            history: context.history_handle(),
            user_parts: parts,
        };
        self.open_fragment_stream(request, Some(completion)).await
    }

    async fn generate_image(
        &self,
        prompt: &str,
        aspect_ratio: ImageAspectRatio,
    ) -> ClientResult<InlineImage> {
        let request = PredictRequest {
            instances: vec![ImageInstance {
                prompt: prompt.to_string(),
            }],
            parameters: ImageParameters {
                sample_count: 1,
                aspect_ratio: aspect_ratio.as_str().to_string(),
                output_mime_type: "image/png".to_string(),
            },
        };

        let response: PredictResponse = self
            .post_json(self.model_url(IMAGE_MODEL, "predict"), &request)
            .await?;

        response
            .predictions
            .into_iter()
            .find_map(|prediction| {
                prediction.bytes_base64_encoded.map(|data| InlineImage {
                    mime_type: prediction
                        .mime_type
                        .unwrap_or_else(|| "image/png".to_string()),
                    data,
                })
            })
            .ok_or_else(|| {
                ClientError::Decode("image generation returned no image data".to_string())
            })
    }

    async fn edit_image(&self, prompt: &str, base: &InlineImage) -> ClientResult<EditOutcome> {
        let request = GenerateContentRequest {
            contents: vec![Content::user(vec![
                Part::InlineData {
                    inline_data: InlineDataPayload {
                        mime_type: base.mime_type.clone(),
                        data: base.data.clone(),
                    },
                },
                Part::Text {
                    text: prompt.to_string(),
                },
            ])],
            system_instruction: None,
            generation_config: Some(GenerationConfig {
                response_modalities: vec!["IMAGE".to_string(), "TEXT".to_string()],
            }),
        };

        let response: GenerateContentResponse = self
            .post_json(self.model_url(EDIT_MODEL, "generateContent"), &request)
            .await?;

        let parts = response
            .candidates
            .and_then(|mut candidates| candidates.pop())
            .and_then(|candidate| candidate.content)
            .map(|content| content.parts)
            .ok_or_else(|| ClientError::Decode("image edit returned no candidates".to_string()))?;

        let mut image = None;
        let mut caption = None;
        for part in parts {
            if let Some(text) = part.text {
                caption = Some(text);
            } else if let Some(inline) = part.inline_data {
                image = Some(InlineImage {
                    mime_type: inline.mime_type,
                    data: inline.data,
                });
            }
        }

        match image {
            Some(image) => Ok(EditOutcome { image, caption }),
            // The model can answer with text only; the caller surfaces this
            // as a transport-level failure.
            None => Err(ClientError::Decode(
                "image edit returned no image data".to_string(),
            )),
        }
    }

    async fn start_video(&self, request: VideoRequest) -> ClientResult<VideoOperation> {
        let body = VideoPredictRequest {
            instances: vec![VideoInstance {
                prompt: request.prompt,
                image: request.image.map(|image| InlineDataPayload {
                    mime_type: image.mime_type,
                    data: image.data,
                }),
            }],
            parameters: VideoParameters {
                aspect_ratio: request.aspect_ratio.as_str().to_string(),
                number_of_videos: 1,
            },
        };

        let response: OperationHandle = self
            .post_json(self.model_url(VIDEO_MODEL, "predictLongRunning"), &body)
            .await?;

        Ok(VideoOperation {
            name: response.name,
            state: VideoState::Pending,
        })
    }

    async fn poll_video(&self, operation: &VideoOperation) -> ClientResult<VideoOperation> {
        let response = self
            .client
            .get(self.operation_url(&operation.name))
            .send()
            .await
            .map_err(request_error)?;

        if !response.status().is_success() {
            let status = response.status();
            let body_text = response
                .text()
                .await
                .unwrap_or_else(|_| "failed to read error body".to_string());
            return Err(map_http_error(status, body_text));
        }

        let status: OperationStatus = response
            .json()
            .await
            .map_err(|err| ClientError::Decode(format!("failed to parse operation: {err}")))?;

        if !status.done {
            return Ok(VideoOperation {
                name: operation.name.clone(),
                state: VideoState::Pending,
            });
        }

        if let Some(error) = status.error {
            return Err(ClientError::Http {
                status: error.code.unwrap_or(500) as u16,
                message: error
                    .message
                    .unwrap_or_else(|| "video generation failed".to_string()),
                retryable: false,
            });
        }

        let uri = status
            .response
            .and_then(|r| r.generated_videos.into_iter().next())
            .and_then(|v| v.video)
            .map(|v| v.uri)
            .ok_or_else(|| {
                ClientError::Decode("video generation finished without a URI".to_string())
            })?;

        Ok(VideoOperation {
            name: operation.name.clone(),
            state: VideoState::Done { uri },
        })
    }

    async fn generate_story_stream(
        &self,
        prompt: &str,
        options: &StoryOptions,
    ) -> ClientResult<FragmentStream> {
        let request = GenerateContentRequest {
            contents: vec![Content::user(vec![Part::Text {
                text: prompt.to_string(),
            }])],
            system_instruction: Some(Content::system(&options.system_instruction())),
            generation_config: None,
        };
        self.open_fragment_stream(request, None).await
    }
}

fn wire_parts(parts: &[MessagePart]) -> Vec<Part> {
    parts
        .iter()
        .map(|part| match part {
            MessagePart::Text { text } => Part::Text { text: text.clone() },
            MessagePart::InlineData { mime_type, data } => Part::InlineData {
                inline_data: InlineDataPayload {
                    mime_type: mime_type.clone(),
                    data: data.clone(),
                },
            },
        })
        .collect()
}

fn first_candidate_text(response: GenerateContentResponse) -> Option<String> {
    response
        .candidates
        .and_then(|mut candidates| candidates.pop())
        .and_then(|candidate| candidate.content)
        .and_then(|content| content.parts.into_iter().find_map(|part| part.text))
}

fn request_error(err: reqwest::Error) -> ClientError {
    if err.is_connect() || err.is_timeout() {
        ClientError::Http {
            status: 0,
            message: format!("request failed: {err}"),
            retryable: true,
        }
    } else {
        ClientError::Http {
            status: 0,
            message: format!("request failed: {err}"),
            retryable: false,
        }
    }
}

fn map_http_error(status: StatusCode, body: String) -> ClientError {
    let message = serde_json::from_str::<ErrorWrapper>(&body)
        .map(|wrapper| {
            let status_text = wrapper.error.status.unwrap_or_default();
            let msg = wrapper.error.message.unwrap_or_else(|| body.clone());
            if status_text.is_empty() {
                msg
            } else {
                format!("{status_text}: {msg}")
            }
        })
        .unwrap_or_else(|_| body.clone());

    let retryable = matches!(
        status,
        StatusCode::TOO_MANY_REQUESTS
            | StatusCode::INTERNAL_SERVER_ERROR
            | StatusCode::BAD_GATEWAY
            | StatusCode::SERVICE_UNAVAILABLE
            | StatusCode::GATEWAY_TIMEOUT
    );

    ClientError::Http {
        status: status.as_u16(),
        message,
        retryable,
    }
}

// --- Wire DTOs ---

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerateContentRequest {
    contents: Vec<Content>,
    #[serde(skip_serializing_if = "Option::is_none")]
    system_instruction: Option<Content>,
    #[serde(skip_serializing_if = "Option::is_none")]
    generation_config: Option<GenerationConfig>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerationConfig {
    response_modalities: Vec<String>,
}

#[derive(Serialize)]
struct Content {
    role: String,
    parts: Vec<Part>,
}

impl Content {
    fn user(parts: Vec<Part>) -> Self {
        Self {
            role: "user".to_string(),
            parts,
        }
    }

    fn system(text: &str) -> Self {
        Self {
            role: "system".to_string(),
            parts: vec![Part::Text {
                text: text.to_string(),
            }],
        }
    }

    fn from_turn(turn: &ChatTurn) -> Self {
        Self {
            role: match turn.role {
                TurnRole::User => "user".to_string(),
                TurnRole::Model => "model".to_string(),
            },
            parts: wire_parts(&turn.parts),
        }
    }
}

#[derive(Serialize)]
#[serde(untagged)]
enum Part {
    Text {
        text: String,
    },
    InlineData {
        #[serde(rename = "inlineData")]
        inline_data: InlineDataPayload,
    },
}

#[derive(Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct InlineDataPayload {
    mime_type: String,
    data: String,
}

#[derive(Deserialize)]
struct GenerateContentResponse {
    candidates: Option<Vec<Candidate>>,
}

#[derive(Deserialize)]
struct Candidate {
    content: Option<ContentResponse>,
}

#[derive(Deserialize)]
struct ContentResponse {
    parts: Vec<PartResponse>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct PartResponse {
    text: Option<String>,
    inline_data: Option<InlineDataPayload>,
}

#[derive(Serialize)]
struct PredictRequest {
    instances: Vec<ImageInstance>,
    parameters: ImageParameters,
}

#[derive(Serialize)]
struct ImageInstance {
    prompt: String,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct ImageParameters {
    sample_count: u32,
    aspect_ratio: String,
    output_mime_type: String,
}

#[derive(Deserialize)]
struct PredictResponse {
    #[serde(default)]
    predictions: Vec<ImagePrediction>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct ImagePrediction {
    bytes_base64_encoded: Option<String>,
    mime_type: Option<String>,
}

#[derive(Serialize)]
struct VideoPredictRequest {
    instances: Vec<VideoInstance>,
    parameters: VideoParameters,
}

#[derive(Serialize)]
struct VideoInstance {
    prompt: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    image: Option<InlineDataPayload>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct VideoParameters {
    aspect_ratio: String,
    number_of_videos: u32,
}

#[derive(Deserialize)]
struct OperationHandle {
    name: String,
}

#[derive(Deserialize)]
struct OperationStatus {
    #[serde(default)]
    done: bool,
    response: Option<VideoOperationResponse>,
    error: Option<OperationError>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct VideoOperationResponse {
    #[serde(default)]
    generated_videos: Vec<GeneratedVideo>,
}

#[derive(Deserialize)]
struct GeneratedVideo {
    video: Option<VideoRef>,
}

#[derive(Deserialize)]
struct VideoRef {
    uri: String,
}

#[derive(Deserialize)]
struct ErrorWrapper {
    error: ErrorBody,
}

#[derive(Deserialize)]
struct ErrorBody {
    #[allow(dead_code)]
    code: Option<i32>,
    message: Option<String>,
    status: Option<String>,
}

#[derive(Deserialize)]
struct OperationError {
    code: Option<i32>,
    message: Option<String>,
}
