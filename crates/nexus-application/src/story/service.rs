//! Story generation service.
//!
//! Stories stream the same way chat replies do: an ordered, finite fragment
//! sequence assembled by concatenation. Fragments are handed to the caller as
//! they arrive so rendering is incremental; partial text survives a
//! mid-stream failure.

use std::sync::Arc;

use nexus_core::error::{NexusError, Result};
use nexus_interaction::{GenerativeClient, StoryOptions};

/// Streams generated stories.
#[derive(Clone)]
pub struct StoryService {
    client: Arc<dyn GenerativeClient>,
}

impl StoryService {
    pub fn new(client: Arc<dyn GenerativeClient>) -> Self {
        Self { client }
    }

    /// Generates a story, invoking `on_fragment` for each chunk in arrival
    /// order, and returns the assembled text.
    ///
    /// On mid-stream failure the fragments already delivered through
    /// `on_fragment` stand; the failure surfaces as a transport error.
    pub async fn generate_story<F>(
        &self,
        prompt: &str,
        options: &StoryOptions,
        mut on_fragment: F,
    ) -> Result<String>
    where
        F: FnMut(&str),
    {
        if prompt.trim().is_empty() {
            return Err(NexusError::validation("enter a prompt for your story"));
        }

        let mut fragments = self
            .client
            .generate_story_stream(prompt, options)
            .await
            .map_err(|err| NexusError::transport(err.to_string()))?;

        let mut story = String::new();
        while let Some(item) = fragments.recv().await {
            match item {
                Ok(fragment) => {
                    story.push_str(&fragment);
                    on_fragment(&fragment);
                }
                Err(err) => return Err(NexusError::transport(err.to_string())),
            }
        }
        Ok(story)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use std::collections::VecDeque;
    use std::sync::Mutex;
    use tokio::sync::mpsc;

    use nexus_core::chat::MessagePart;
    use nexus_core::media::InlineImage;
    use nexus_interaction::{
        ChatContext, ClientError, ClientResult, EditOutcome, FragmentStream, ImageAspectRatio,
        VideoOperation, VideoRequest,
    };

    struct ScriptedStoryClient {
        scripts: Mutex<VecDeque<Vec<ClientResult<String>>>>,
    }

    impl ScriptedStoryClient {
        fn new(scripts: Vec<Vec<ClientResult<String>>>) -> Self {
            Self {
                scripts: Mutex::new(scripts.into()),
            }
        }
    }

    #[async_trait]
    impl GenerativeClient for ScriptedStoryClient {
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
            _prompt: &str,
            _aspect_ratio: ImageAspectRatio,
        ) -> ClientResult<InlineImage> {
            Err(ClientError::Config("not scripted".to_string()))
        }

        async fn edit_image(
            &self,
            _prompt: &str,
            _base: &InlineImage,
        ) -> ClientResult<EditOutcome> {
            Err(ClientError::Config("not scripted".to_string()))
        }

        async fn start_video(&self, _request: VideoRequest) -> ClientResult<VideoOperation> {
            Err(ClientError::Config("not scripted".to_string()))
        }

        async fn poll_video(&self, _operation: &VideoOperation) -> ClientResult<VideoOperation> {
            Err(ClientError::Config("not scripted".to_string()))
        }

        async fn generate_story_stream(
            &self,
            _prompt: &str,
            _options: &StoryOptions,
        ) -> ClientResult<FragmentStream> {
            let script = self
                .scripts
                .lock()
                .unwrap()
                .pop_front()
                .ok_or_else(|| ClientError::Config("no scripted story left".to_string()))?;
            let (tx, rx) = mpsc::channel(8);
            tokio::spawn(async move {
                for item in script {
                    if tx.send(item).await.is_err() {
                        return;
                    }
                }
            });
            Ok(rx)
        }
    }

    #[tokio::test]
    async fn story_assembles_fragments_in_order() {
        let client = Arc::new(ScriptedStoryClient::new(vec![vec![
            Ok("Once ".to_string()),
            Ok("upon ".to_string()),
            Ok("a time.".to_string()),
        ]]));
        let service = StoryService::new(client);

        let mut seen = Vec::new();
        let story = service
            .generate_story("a lonely dragon", &StoryOptions::default(), |fragment| {
                seen.push(fragment.to_string());
            })
            .await
            .unwrap();

        assert_eq!(story, "Once upon a time.");
        assert_eq!(seen, vec!["Once ", "upon ", "a time."]);
    }

    #[tokio::test]
    async fn empty_prompt_is_rejected() {
        let client = Arc::new(ScriptedStoryClient::new(vec![]));
        let service = StoryService::new(client);
        let err = service
            .generate_story("  ", &StoryOptions::default(), |_| {})
            .await
            .unwrap_err();
        assert!(err.is_validation());
    }

    #[tokio::test]
    async fn mid_stream_failure_keeps_delivered_fragments() {
        let client = Arc::new(ScriptedStoryClient::new(vec![vec![
            Ok("It began".to_string()),
            Err(ClientError::Stream("connection reset".to_string())),
        ]]));
        let service = StoryService::new(client);

        let mut seen = String::new();
        let err = service
            .generate_story("a storm", &StoryOptions::default(), |fragment| {
                seen.push_str(fragment);
            })
            .await
            .unwrap_err();

        assert!(err.is_transport());
        assert_eq!(seen, "It began");
    }
}
