//! Generation modes: single image, storyboard, and the video stub.
//!
//! All three reuse the providers and the save path of the controller.
//! Per-mode failures degrade into descriptive assistant messages; only the
//! successful flows persist the session.

use chorus_core::messages::Message;
use chorus_llm::GenerateRequest;
use serde::Deserialize;
use serde_json::{Value, json};
use tracing::warn;

use crate::errors::RuntimeResult;
use crate::prompts;
use crate::session::SessionController;

/// Transient status while the image prompt is being enhanced.
const IMAGE_THINKING: &str =
    "Analyzing your request and crafting the perfect visual representation...";

/// Caption for a delivered image.
const IMAGE_DONE: &str = "Visual generation complete. Here's your image:";

/// Transient status while the storyboard is being broken down.
const STORYBOARD_THINKING: &str =
    "Activating Director Mode. Breaking down your concept into a visual narrative...";

/// Fallback when the scene breakdown is unusable.
const STORYBOARD_FALLBACK: &str =
    "I'll create a detailed written storyboard instead and work on the visual elements.";

/// One storyboard scene as the model returns it; both fields are required
/// for the scene to be generated.
#[derive(Debug, Deserialize)]
struct SceneWire {
    #[serde(default)]
    description: Option<String>,
    #[serde(default)]
    image_prompt: Option<String>,
}

#[derive(Debug, Deserialize)]
struct SceneListWire {
    scenes: Vec<SceneWire>,
}

/// JSON schema constraining the storyboard call.
fn storyboard_schema() -> Value {
    json!({
        "type": "object",
        "properties": {
            "scenes": {
                "type": "array",
                "items": {
                    "type": "object",
                    "properties": {
                        "description": { "type": "string" },
                        "image_prompt": { "type": "string" }
                    },
                    "required": ["description", "image_prompt"]
                }
            }
        },
        "required": ["scenes"]
    })
}

impl SessionController {
    /// Single-image mode: enhance the prompt, generate, deliver.
    pub(super) async fn single_image(&self, prompt_text: &str) -> RuntimeResult<()> {
        self.messages.push(Message::assistant(IMAGE_THINKING));

        let generated: RuntimeResult<String> = async {
            let enhanced = self
                .text
                .generate(GenerateRequest::new(prompts::image_enhance(prompt_text)))
                .await?;
            Ok(self.image.generate_image(&enhanced).await?)
        }
        .await;

        match generated {
            Ok(url) => {
                self.messages
                    .replace_last(Message::assistant_image(IMAGE_DONE, url));
                self.save_session(prompt_text).await;
            }
            Err(e) => {
                warn!(error = %e, category = e.category(), "image generation failed, degrading");
                self.messages.replace_last(Message::assistant(format!(
                    "I understand you want an image of: {prompt_text}. Let me describe in vivid detail what this image would look like instead, and I'll continue working on generating it for you."
                )));
            }
        }
        Ok(())
    }

    /// Storyboard mode: scene breakdown, one image per valid scene.
    pub(super) async fn storyboard(&self, prompt_text: &str) -> RuntimeResult<()> {
        self.messages.push(Message::assistant(STORYBOARD_THINKING));

        let request = GenerateRequest::new(prompts::storyboard(prompt_text));
        let reply = match self.text.generate_structured(request, storyboard_schema()).await {
            Ok(reply) => reply,
            Err(e) => {
                warn!(error = %e, category = e.category(), "storyboard breakdown failed, degrading");
                self.messages
                    .replace_last(Message::assistant(STORYBOARD_FALLBACK));
                return Ok(());
            }
        };

        let Ok(list) = serde_json::from_value::<SceneListWire>(reply) else {
            warn!("storyboard reply missing scene shape, degrading");
            self.messages
                .replace_last(Message::assistant(STORYBOARD_FALLBACK));
            return Ok(());
        };

        // The transient status message gives way to the scene sequence.
        self.messages.retain(|m| m.text.as_deref() != Some(STORYBOARD_THINKING));

        let mut scene_number = 0usize;
        for scene in list.scenes {
            let (Some(description), Some(image_prompt)) = (scene.description, scene.image_prompt)
            else {
                continue;
            };
            scene_number += 1;
            let caption = format!("Scene {scene_number}: {description}");

            match self.image.generate_image(&image_prompt).await {
                Ok(url) => self.messages.push(Message::assistant_image(caption, url)),
                Err(e) => {
                    warn!(scene = scene_number, error = %e, "scene generation failed, keeping text-only scene");
                    self.messages.push(Message::assistant(format!(
                        "{caption} [Visual being processed...]"
                    )));
                }
            }
        }

        self.save_session(prompt_text).await;
        Ok(())
    }

    /// Video mode: direct generation is not available; offer the storyboard
    /// treatment instead.
    pub(super) async fn video_stub(&self, prompt_text: &str) -> RuntimeResult<()> {
        self.messages.push(Message::assistant(format!(
            "I understand you want to create a video for: \"{prompt_text}\". While direct video generation isn't available yet, I can create a cinematic storyboard sequence that serves as a visual script. This will give you a frame-by-frame breakdown that could be used for video production. Would you like me to proceed with this approach?"
        )));
        self.save_session(prompt_text).await;
        Ok(())
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testutil::{ScriptedImage, ScriptedText};
    use chorus_core::session::SessionMode;
    use chorus_llm::ProviderError;
    use chorus_settings::ChorusSettings;
    use chorus_store::InMemoryStore;
    use std::sync::Arc;

    struct Fixture {
        text: Arc<ScriptedText>,
        image: Arc<ScriptedImage>,
        store: Arc<InMemoryStore>,
        controller: SessionController,
    }

    fn fixture() -> Fixture {
        let text = Arc::new(ScriptedText::new());
        let image = Arc::new(ScriptedImage::new());
        let store = Arc::new(InMemoryStore::new());
        let controller = SessionController::new(
            Arc::new(ChorusSettings::default()),
            Arc::clone(&text) as Arc<dyn chorus_llm::TextProvider>,
            Arc::clone(&image) as Arc<dyn chorus_llm::ImageProvider>,
            Arc::clone(&store).into_stores(),
        );
        Fixture {
            text,
            image,
            store,
            controller,
        }
    }

    #[tokio::test]
    async fn single_image_replaces_thinking_with_image() {
        let f = fixture();
        f.controller.set_mode(SessionMode::Image);
        f.text.queue_text(Ok("an enhanced cinematic prompt".into()));
        f.image.queue(Ok("https://img.example/1.png".into()));

        f.controller.submit("a lighthouse at dusk").await;

        let messages = f.controller.messages_snapshot();
        assert_eq!(messages.len(), 2);
        assert_eq!(messages[0].text.as_deref(), Some("[IMAGE] a lighthouse at dusk"));
        assert_eq!(messages[1].image_url.as_deref(), Some("https://img.example/1.png"));
        assert_eq!(f.image.prompts()[0], "an enhanced cinematic prompt");

        // Success saves the session.
        assert_eq!(f.store.sessions_snapshot().len(), 1);
    }

    #[tokio::test]
    async fn single_image_failure_degrades_without_saving() {
        let f = fixture();
        f.controller.set_mode(SessionMode::Image);
        f.text.queue_text(Ok("enhanced".into()));
        f.image.queue(Err(ProviderError::Api {
            status: 500,
            message: "no capacity".into(),
        }));

        f.controller.submit("a lighthouse").await;

        let messages = f.controller.messages_snapshot();
        assert_eq!(messages.len(), 2);
        let fallback = messages[1].text.as_deref().unwrap();
        assert!(fallback.contains("I understand you want an image of: a lighthouse"));
        assert!(messages[1].image_url.is_none());
        assert!(f.store.sessions_snapshot().is_empty(), "failed image is not saved");
    }

    #[tokio::test]
    async fn storyboard_generates_scene_messages() {
        let f = fixture();
        f.controller.set_mode(SessionMode::Storyboard);
        f.text.queue_structured(Ok(serde_json::json!({
            "scenes": [
                {"description": "Opening shot", "image_prompt": "wide shot"},
                {"description": "The chase", "image_prompt": "tracking shot"},
                {"description": "incomplete scene"}
            ]
        })));
        f.image.queue(Ok("https://img.example/s1.png".into()));
        f.image.queue(Err(ProviderError::Api {
            status: 500,
            message: "slow".into(),
        }));

        f.controller.submit("a heist story").await;

        let messages = f.controller.messages_snapshot();
        // user + 2 valid scenes (the incomplete one is skipped)
        assert_eq!(messages.len(), 3);
        assert_eq!(messages[1].text.as_deref(), Some("Scene 1: Opening shot"));
        assert!(messages[1].image_url.is_some());
        assert_eq!(
            messages[2].text.as_deref(),
            Some("Scene 2: The chase [Visual being processed...]")
        );
        assert!(messages[2].image_url.is_none());

        let saved = &f.store.sessions_snapshot()[0];
        assert_eq!(saved.messages.len(), 3);
    }

    #[tokio::test]
    async fn storyboard_malformed_scene_list_degrades() {
        let f = fixture();
        f.controller.set_mode(SessionMode::Storyboard);
        f.text
            .queue_structured(Ok(serde_json::json!({"text": "no scenes here"})));

        f.controller.submit("a heist story").await;

        let messages = f.controller.messages_snapshot();
        assert_eq!(messages.len(), 2);
        assert_eq!(messages[1].text.as_deref(), Some(STORYBOARD_FALLBACK));
        assert_eq!(f.image.call_count(), 0);
        assert!(f.store.sessions_snapshot().is_empty());
    }

    #[tokio::test]
    async fn video_mode_offers_storyboard_and_saves() {
        let f = fixture();
        f.controller.set_mode(SessionMode::Video);

        f.controller.submit("product launch teaser").await;

        let messages = f.controller.messages_snapshot();
        assert_eq!(messages.len(), 2);
        assert!(
            messages[1]
                .text
                .as_deref()
                .unwrap()
                .contains("direct video generation isn't available yet")
        );
        let saved = &f.store.sessions_snapshot()[0];
        assert_eq!(saved.mode, Some(SessionMode::Video));
        assert_eq!(f.text.call_count(), 0);
    }
}
