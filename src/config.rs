use std::env;
use std::time::Duration;

use crate::models::{ModelTier, TierKind};

const DEFAULT_BASE_URL: &str = "https://openrouter.ai/api/v1/chat/completions";
const DEFAULT_VISION_MODELS: &str = "meta-llama/llama-4-scout:free,qwen/qwen2.5-vl-72b-instruct:free";
const DEFAULT_TEXT_MODELS: &str = "meta-llama/llama-3.3-70b-instruct:free";

/// Runtime configuration, loaded once at startup. The model lists and the
/// upload endpoint are configuration on purpose: which remote models exist
/// is provider-dependent and changes often.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub api_key: Option<String>,
    pub base_url: String,
    pub vision_models: Vec<String>,
    pub text_models: Vec<String>,
    pub legacy_model: String,
    pub raw_upload_url: Option<String>,
    pub request_timeout: Duration,
    pub max_tokens: u32,
}

impl AppConfig {
    pub fn from_env() -> Self {
        // Missing key is a recoverable condition, not a startup fault:
        // the job reports it as a Failure result instead.
        let api_key = env::var("OPENROUTER_API_KEY")
            .ok()
            .filter(|k| !k.trim().is_empty());

        let base_url =
            env::var("OPENROUTER_BASE_URL").unwrap_or_else(|_| DEFAULT_BASE_URL.to_string());

        let vision_models = parse_model_list(
            &env::var("ULAMLENS_VISION_MODELS")
                .unwrap_or_else(|_| DEFAULT_VISION_MODELS.to_string()),
        );
        let text_models = parse_model_list(
            &env::var("ULAMLENS_TEXT_MODELS").unwrap_or_else(|_| DEFAULT_TEXT_MODELS.to_string()),
        );
        let legacy_model = env::var("ULAMLENS_LEGACY_MODEL")
            .ok()
            .filter(|m| !m.trim().is_empty())
            .unwrap_or_else(|| {
                text_models
                    .first()
                    .cloned()
                    .unwrap_or_else(|| DEFAULT_TEXT_MODELS.to_string())
            });

        let raw_upload_url = env::var("ULAMLENS_UPLOAD_URL")
            .ok()
            .filter(|u| !u.trim().is_empty());

        let timeout_secs = env::var("ULAMLENS_TIMEOUT_SECS")
            .ok()
            .and_then(|v| v.parse::<u64>().ok())
            .unwrap_or(60);

        Self {
            api_key,
            base_url,
            vision_models,
            text_models,
            legacy_model,
            raw_upload_url,
            request_timeout: Duration::from_secs(timeout_secs),
            max_tokens: 500,
        }
    }

    /// The ordered fallback chain for one invocation. Vision models are
    /// tried first, then the raw upload endpoint (when configured), then
    /// the text-only estimate, then the legacy request shape.
    pub fn tiers(&self) -> Vec<ModelTier> {
        let mut tiers: Vec<ModelTier> = self
            .vision_models
            .iter()
            .map(|m| ModelTier::new(m.clone(), TierKind::Vision))
            .collect();

        if let Some(url) = &self.raw_upload_url {
            tiers.push(ModelTier::new(url.clone(), TierKind::HttpRaw));
        }

        tiers.extend(
            self.text_models
                .iter()
                .map(|m| ModelTier::new(m.clone(), TierKind::TextOnly)),
        );

        tiers.push(ModelTier::new(self.legacy_model.clone(), TierKind::Legacy));
        tiers
    }
}

fn parse_model_list(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(|m| m.trim().to_string())
        .filter(|m| !m.is_empty())
        .collect()
}
