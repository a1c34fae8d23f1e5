use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use crate::config::AppConfig;
use crate::models::TierKind;
use crate::services::prompt;
use crate::services::staging::StagedImage;
use crate::services::transport::{ModelTransport, TierRequest};

/// What one tier attempt did. Kept per invocation so callers and tests can
/// see exactly what was tried, in order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AttemptRecord {
    pub tier: TierKind,
    pub target: String,
    pub ok: bool,
}

#[derive(Debug, PartialEq, Eq)]
pub enum StrategyOutcome {
    /// Raw model text. Empty string means every tier came back empty-handed,
    /// which is a recoverable "no content" condition, not an error.
    Text(String),
    Cancelled,
    MissingCredentials,
}

#[derive(Debug)]
pub struct StrategyReport {
    pub outcome: StrategyOutcome,
    pub attempts: Vec<AttemptRecord>,
}

/// Walks the configured fallback chain until one tier produces usable text.
/// A failing attempt is logged and recovered by moving on; only the chain
/// as a whole can come back empty.
pub struct ModelRequestStrategy {
    transport: Arc<dyn ModelTransport>,
    config: Arc<AppConfig>,
}

impl ModelRequestStrategy {
    pub fn new(transport: Arc<dyn ModelTransport>, config: Arc<AppConfig>) -> Self {
        Self { transport, config }
    }

    pub async fn run(
        &self,
        prompt_text: &str,
        image: &StagedImage,
        cancelled: &AtomicBool,
    ) -> StrategyReport {
        let mut attempts: Vec<AttemptRecord> = Vec::new();

        if self.config.api_key.is_none() {
            log::warn!("🔑 No API key configured, skipping all tiers");
            return StrategyReport {
                outcome: StrategyOutcome::MissingCredentials,
                attempts,
            };
        }

        // Image-less tiers get the same schema plus the missing-picture note.
        let degraded_prompt = prompt::degraded(prompt_text);

        for tier in self.config.tiers() {
            if cancelled.load(Ordering::SeqCst) {
                log::info!("🛑 Cancellation observed before {} attempt, stopping", tier.kind);
                return StrategyReport {
                    outcome: StrategyOutcome::Cancelled,
                    attempts,
                };
            }

            let request = match tier.kind {
                TierKind::Vision => TierRequest::Vision {
                    model: &tier.name,
                    prompt: prompt_text,
                    image,
                },
                TierKind::HttpRaw => TierRequest::RawUpload {
                    endpoint: &tier.name,
                    prompt: prompt_text,
                    image,
                },
                TierKind::TextOnly => TierRequest::TextOnly {
                    model: &tier.name,
                    prompt: &degraded_prompt,
                },
                TierKind::Legacy => TierRequest::Legacy {
                    model: &tier.name,
                    prompt: &degraded_prompt,
                },
            };

            let outcome = self.transport.attempt(request).await;
            match outcome {
                Ok(text) if !text.trim().is_empty() => {
                    log::info!(
                        "✅ {} tier answered via {} ({} bytes)",
                        tier.kind,
                        tier.name,
                        text.len()
                    );
                    attempts.push(AttemptRecord {
                        tier: tier.kind,
                        target: tier.name,
                        ok: true,
                    });
                    return StrategyReport {
                        outcome: StrategyOutcome::Text(text),
                        attempts,
                    };
                }
                Ok(_) => {
                    log::warn!("⚠️ {} attempt via {} returned empty text", tier.kind, tier.name);
                    attempts.push(AttemptRecord {
                        tier: tier.kind,
                        target: tier.name,
                        ok: false,
                    });
                }
                Err(e) => {
                    log::warn!("⚠️ {} attempt via {} failed: {}", tier.kind, tier.name, e);
                    attempts.push(AttemptRecord {
                        tier: tier.kind,
                        target: tier.name,
                        ok: false,
                    });
                }
            }
        }

        log::warn!("😞 Every tier exhausted without usable text");
        StrategyReport {
            outcome: StrategyOutcome::Text(String::new()),
            attempts,
        }
    }
}
