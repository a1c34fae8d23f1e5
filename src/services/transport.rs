use anyhow::Result;
use async_trait::async_trait;
use reqwest::multipart;
use serde::{Deserialize, Serialize};

use crate::config::AppConfig;
use crate::services::staging::StagedImage;

#[derive(Debug, Serialize)]
struct ChatMessage {
    role: String,
    content: Vec<ContentPart>,
}

#[derive(Debug, Serialize)]
#[serde(untagged)]
enum ContentPart {
    Text {
        #[serde(rename = "type")]
        content_type: String,
        text: String,
    },
    ImageUrl {
        #[serde(rename = "type")]
        content_type: String,
        image_url: ImageData,
    },
}

#[derive(Debug, Serialize)]
struct ImageData {
    url: String,
}

#[derive(Debug, Serialize)]
struct ChatRequest {
    model: String,
    messages: Vec<ChatMessage>,
    max_tokens: u32,
}

// Older request shape: plain-string content instead of content parts.
#[derive(Debug, Serialize)]
struct LegacyMessage {
    role: String,
    content: String,
}

#[derive(Debug, Serialize)]
struct LegacyRequest {
    model: String,
    messages: Vec<LegacyMessage>,
    max_tokens: u32,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    choices: Vec<Choice>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: MessageContent,
}

#[derive(Debug, Deserialize)]
struct MessageContent {
    content: String,
}

#[derive(Debug, Deserialize)]
struct UploadResponse {
    text: String,
}

/// One tier attempt, already shaped for the wire.
pub enum TierRequest<'a> {
    Vision {
        model: &'a str,
        prompt: &'a str,
        image: &'a StagedImage,
    },
    RawUpload {
        endpoint: &'a str,
        prompt: &'a str,
        image: &'a StagedImage,
    },
    TextOnly {
        model: &'a str,
        prompt: &'a str,
    },
    Legacy {
        model: &'a str,
        prompt: &'a str,
    },
}

/// The single capability the strategy needs: issue one remote attempt and
/// hand back the model's free text. The three wire shapes stay behind this
/// seam so the fallback logic never special-cases transport.
#[async_trait]
pub trait ModelTransport: Send + Sync {
    async fn attempt(&self, request: TierRequest<'_>) -> Result<String>;
}

pub struct OpenRouterTransport {
    api_key: String,
    base_url: String,
    max_tokens: u32,
    client: reqwest::Client,
}

impl OpenRouterTransport {
    pub fn new(client: reqwest::Client, config: &AppConfig) -> Self {
        Self {
            api_key: config.api_key.clone().unwrap_or_default(),
            base_url: config.base_url.clone(),
            max_tokens: config.max_tokens,
            client,
        }
    }

    async fn chat(&self, model: &str, prompt: &str, image: Option<&StagedImage>) -> Result<String> {
        let mut content = vec![ContentPart::Text {
            content_type: "text".to_string(),
            text: prompt.to_string(),
        }];

        if let Some(image) = image {
            log::debug!("🖼️ Attaching picture ({} JPEG bytes)", image.bytes().len());
            content.push(ContentPart::ImageUrl {
                content_type: "image_url".to_string(),
                image_url: ImageData {
                    url: image.data_url(),
                },
            });
        }

        let request = ChatRequest {
            model: model.to_string(),
            messages: vec![ChatMessage {
                role: "user".to_string(),
                content,
            }],
            max_tokens: self.max_tokens,
        };

        log::info!("🤖 Sending chat request to model: {}", model);
        let response = self
            .client
            .post(&self.base_url)
            .header("Authorization", format!("Bearer {}", self.api_key))
            .header("Content-Type", "application/json")
            .header("HTTP-Referer", "https://github.com/ulamlens")
            .header("X-Title", "UlamLens")
            .json(&request)
            .send()
            .await?;

        let status = response.status();
        log::debug!("📥 Response status from {}: {}", model, status);

        if !status.is_success() {
            let error_text = response.text().await?;
            anyhow::bail!("API error ({}): {}", status, error_text);
        }

        let chat_response: ChatResponse = response.json().await?;
        chat_response
            .choices
            .first()
            .map(|c| c.message.content.clone())
            .ok_or_else(|| anyhow::anyhow!("response from {} contained no choices", model))
    }

    async fn upload(&self, endpoint: &str, prompt: &str, image: &StagedImage) -> Result<String> {
        log::info!("📤 Uploading picture to fallback endpoint: {}", endpoint);

        let form = multipart::Form::new()
            .text("prompt", prompt.to_string())
            .part(
                "file",
                multipart::Part::bytes(image.bytes().to_vec())
                    .file_name(image.file_name())
                    .mime_str("image/jpeg")?,
            );

        let response = self
            .client
            .post(endpoint)
            .header("Authorization", format!("Bearer {}", self.api_key))
            .multipart(form)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response.text().await?;
            anyhow::bail!("upload endpoint error ({}): {}", status, error_text);
        }

        let body: UploadResponse = response.json().await?;
        Ok(body.text)
    }

    async fn legacy_chat(&self, model: &str, prompt: &str) -> Result<String> {
        let request = LegacyRequest {
            model: model.to_string(),
            messages: vec![LegacyMessage {
                role: "user".to_string(),
                content: prompt.to_string(),
            }],
            max_tokens: self.max_tokens,
        };

        log::info!("🤖 Sending legacy-shape request to model: {}", model);
        let response = self
            .client
            .post(&self.base_url)
            .header("Authorization", format!("Bearer {}", self.api_key))
            .header("Content-Type", "application/json")
            .json(&request)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response.text().await?;
            anyhow::bail!("API error ({}): {}", status, error_text);
        }

        let chat_response: ChatResponse = response.json().await?;
        chat_response
            .choices
            .first()
            .map(|c| c.message.content.clone())
            .ok_or_else(|| anyhow::anyhow!("legacy response from {} contained no choices", model))
    }
}

#[async_trait]
impl ModelTransport for OpenRouterTransport {
    async fn attempt(&self, request: TierRequest<'_>) -> Result<String> {
        match request {
            TierRequest::Vision {
                model,
                prompt,
                image,
            } => self.chat(model, prompt, Some(image)).await,
            TierRequest::RawUpload {
                endpoint,
                prompt,
                image,
            } => self.upload(endpoint, prompt, image).await,
            TierRequest::TextOnly { model, prompt } => self.chat(model, prompt, None).await,
            TierRequest::Legacy { model, prompt } => self.legacy_chat(model, prompt).await,
        }
    }
}

#[cfg(test)]
pub(crate) mod testing {
    use super::*;
    use crate::models::TierKind;
    use std::collections::HashMap;
    use std::sync::atomic::{AtomicBool, Ordering};
    use std::sync::{Arc, Mutex};
    use std::time::Duration;

    pub(crate) enum Script {
        Reply(String),
        Fail(String),
    }

    /// Scripted transport for strategy/job tests. Records every attempt in
    /// order and can trip a cancellation flag when a given target is hit.
    pub(crate) struct ScriptedTransport {
        scripts: Mutex<HashMap<String, Script>>,
        calls: Mutex<Vec<(TierKind, String)>>,
        cancel_on: Mutex<Option<(String, Arc<AtomicBool>)>>,
        delay: Mutex<Option<Duration>>,
    }

    impl ScriptedTransport {
        pub fn new() -> Self {
            Self {
                scripts: Mutex::new(HashMap::new()),
                calls: Mutex::new(Vec::new()),
                cancel_on: Mutex::new(None),
                delay: Mutex::new(None),
            }
        }

        pub fn reply(&self, target: &str, text: &str) {
            self.scripts
                .lock()
                .unwrap()
                .insert(target.to_string(), Script::Reply(text.to_string()));
        }

        pub fn fail(&self, target: &str, error: &str) {
            self.scripts
                .lock()
                .unwrap()
                .insert(target.to_string(), Script::Fail(error.to_string()));
        }

        pub fn cancel_when(&self, target: &str, flag: Arc<AtomicBool>) {
            *self.cancel_on.lock().unwrap() = Some((target.to_string(), flag));
        }

        pub fn delay_each_call(&self, delay: Duration) {
            *self.delay.lock().unwrap() = Some(delay);
        }

        pub fn calls(&self) -> Vec<(TierKind, String)> {
            self.calls.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl ModelTransport for ScriptedTransport {
        async fn attempt(&self, request: TierRequest<'_>) -> Result<String> {
            let (kind, target) = match &request {
                TierRequest::Vision { model, .. } => (TierKind::Vision, model.to_string()),
                TierRequest::RawUpload { endpoint, .. } => {
                    (TierKind::HttpRaw, endpoint.to_string())
                }
                TierRequest::TextOnly { model, .. } => (TierKind::TextOnly, model.to_string()),
                TierRequest::Legacy { model, .. } => (TierKind::Legacy, model.to_string()),
            };
            self.calls.lock().unwrap().push((kind, target.clone()));

            let delay = *self.delay.lock().unwrap();
            if let Some(delay) = delay {
                tokio::time::sleep(delay).await;
            }

            if let Some((cancel_target, flag)) = self.cancel_on.lock().unwrap().as_ref() {
                if *cancel_target == target {
                    flag.store(true, Ordering::SeqCst);
                }
            }

            match self.scripts.lock().unwrap().get(&target) {
                Some(Script::Reply(text)) => Ok(text.clone()),
                Some(Script::Fail(error)) => Err(anyhow::anyhow!("{}", error)),
                None => Err(anyhow::anyhow!("no script for target: {}", target)),
            }
        }
    }
}
