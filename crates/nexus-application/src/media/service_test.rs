use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;

use nexus_core::chat::MessagePart;
use nexus_core::media::InlineImage;
use nexus_infrastructure::MemoryStore;
use nexus_interaction::{
    ChatContext, ClientError, ClientResult, EditOutcome, FragmentStream, GenerativeClient,
    ImageAspectRatio, StoryOptions, VideoAspectRatio, VideoOperation, VideoRequest, VideoState,
};

use super::MediaService;

/// Client whose video operation stays pending for a fixed number of polls.
struct MockMediaClient {
    pending_polls: usize,
    polls_seen: AtomicUsize,
    started_prompts: std::sync::Mutex<Vec<String>>,
}

impl MockMediaClient {
    fn new(pending_polls: usize) -> Self {
        Self {
            pending_polls,
            polls_seen: AtomicUsize::new(0),
            started_prompts: std::sync::Mutex::new(Vec::new()),
        }
    }
}

#[async_trait]
impl GenerativeClient for MockMediaClient {
    async fn start_chat(&self, system_instruction: &str) -> ClientResult<ChatContext> {
        Ok(ChatContext::new(system_instruction))
    }

    async fn send_streamed(
        &self,
        _context: &ChatContext,
        _parts: Vec<MessagePart>,
    ) -> ClientResult<FragmentStream> {
        Err(ClientError::Config("not scripted".to_string()))
    }

    async fn generate_image(
        &self,
        prompt: &str,
        aspect_ratio: ImageAspectRatio,
    ) -> ClientResult<InlineImage> {
        Ok(InlineImage::new(
            "image/png",
            format!("{}@{}", prompt, aspect_ratio.as_str()),
        ))
    }

    async fn edit_image(&self, _prompt: &str, _base: &InlineImage) -> ClientResult<EditOutcome> {
        Err(ClientError::Config("not scripted".to_string()))
    }

    async fn start_video(&self, request: VideoRequest) -> ClientResult<VideoOperation> {
        self.started_prompts.lock().unwrap().push(request.prompt);
        Ok(VideoOperation {
            name: "operations/video-1".to_string(),
            state: VideoState::Pending,
        })
    }

    async fn poll_video(&self, operation: &VideoOperation) -> ClientResult<VideoOperation> {
        let seen = self.polls_seen.fetch_add(1, Ordering::Relaxed) + 1;
        let state = if seen >= self.pending_polls {
            VideoState::Done {
                uri: "https://example.com/video.mp4".to_string(),
            }
        } else {
            VideoState::Pending
        };
        Ok(VideoOperation {
            name: operation.name.clone(),
            state,
        })
    }

    async fn generate_story_stream(
        &self,
        _prompt: &str,
        _options: &StoryOptions,
    ) -> ClientResult<FragmentStream> {
        Err(ClientError::Config("not scripted".to_string()))
    }
}

#[tokio::test]
async fn generate_image_rejects_empty_prompt() {
    let service = MediaService::new(
        Arc::new(MockMediaClient::new(1)),
        Arc::new(MemoryStore::new()),
    );
    let err = service
        .generate_image("  ", ImageAspectRatio::Square)
        .await
        .unwrap_err();
    assert!(err.is_validation());
}

#[tokio::test]
async fn generate_image_delegates_to_client() {
    let service = MediaService::new(
        Arc::new(MockMediaClient::new(1)),
        Arc::new(MemoryStore::new()),
    );
    let image = service
        .generate_image("a lighthouse", ImageAspectRatio::Widescreen)
        .await
        .unwrap();
    assert_eq!(image.data, "a lighthouse@16:9");
}

#[tokio::test(start_paused = true)]
async fn video_polls_with_progress_until_done() {
    let client = Arc::new(MockMediaClient::new(3));
    let service = MediaService::new(client.clone(), Arc::new(MemoryStore::new()));

    let progress_calls = Arc::new(AtomicUsize::new(0));
    let progress = {
        let calls = progress_calls.clone();
        move || {
            calls.fetch_add(1, Ordering::Relaxed);
        }
    };

    let entry = service
        .generate_video(
            "a storm over the sea",
            "anime style, cel-shaded, vibrant colors, japanese animation style,",
            VideoAspectRatio::Widescreen,
            None,
            progress,
        )
        .await
        .unwrap();

    assert_eq!(entry.url, "https://example.com/video.mp4");
    assert_eq!(entry.aspect_ratio, "16:9");
    // One progress notification per poll.
    assert_eq!(progress_calls.load(Ordering::Relaxed), 3);

    // The style preset prefixes the dispatched prompt but the gallery keeps
    // the bare prompt.
    let dispatched = client.started_prompts.lock().unwrap().clone();
    assert!(dispatched[0].starts_with("anime style"));
    assert!(dispatched[0].ends_with("a storm over the sea"));
    assert_eq!(entry.prompt, "a storm over the sea");
}

#[tokio::test(start_paused = true)]
async fn video_gallery_is_bounded_to_ten() {
    let service = MediaService::new(
        Arc::new(MockMediaClient::new(0)),
        Arc::new(MemoryStore::new()),
    );

    for i in 0..12 {
        service
            .generate_video(
                &format!("video {i}"),
                "",
                VideoAspectRatio::Square,
                None,
                || {},
            )
            .await
            .unwrap();
    }

    let videos = service.videos().await;
    assert_eq!(videos.len(), 10);
    assert_eq!(videos[0].prompt, "video 11");
}

#[tokio::test(start_paused = true)]
async fn video_gallery_survives_reload() {
    let store = Arc::new(MemoryStore::new());
    let service = MediaService::new(Arc::new(MockMediaClient::new(0)), store.clone());
    service
        .generate_video("keep me", "", VideoAspectRatio::Vertical, None, || {})
        .await
        .unwrap();

    let reloaded = MediaService::new(Arc::new(MockMediaClient::new(0)), store);
    reloaded.load_gallery().await.unwrap();
    assert_eq!(reloaded.videos().await.len(), 1);
    assert_eq!(reloaded.videos().await[0].prompt, "keep me");
}
