//! Two-tier root-cause resolution.
//!
//! Tier 1 matches the rule catalog. Tier 2 races a reasoning call
//! against a deadline and parses the structured diagnosis out of the
//! response text. Every failure mode (timeout, transport, malformed
//! response) degrades to a fixed default result; `analyze` never
//! returns an error.

use std::time::Duration;

use async_trait::async_trait;
use tokio::time::timeout;
use tracing::{debug, info, warn};

use regmon_core::config::{LlmConfig, OllamaConfig};
use regmon_core::{AnalysisMethod, Anomaly, RootCauseResult};
use regmon_llm::{create_provider, LlmError, LlmProvider, Prompt};

use crate::rules::RuleCatalog;

const SYSTEM_PROMPT: &str = "You are a gas pressure-regulator fault-diagnosis expert.";

/// Attributes a root cause to a non-empty anomaly set.
#[async_trait]
pub trait CauseAnalyzer: Send + Sync {
    async fn analyze(&self, anomalies: &[Anomaly]) -> RootCauseResult;
}

pub struct RootCauseResolver {
    catalog: RuleCatalog,
    provider: Box<dyn LlmProvider>,
    temperature: f32,
    max_tokens: u32,
    reasoning_timeout: Duration,
}

impl RootCauseResolver {
    pub fn new(
        catalog: RuleCatalog,
        provider: Box<dyn LlmProvider>,
        temperature: f32,
        max_tokens: u32,
        reasoning_timeout: Duration,
    ) -> Self {
        Self {
            catalog,
            provider,
            temperature,
            max_tokens,
            reasoning_timeout,
        }
    }

    /// Build from config with the built-in catalog, creating the
    /// configured provider.
    pub fn from_config(
        llm_config: &LlmConfig,
        ollama_config: &OllamaConfig,
    ) -> Result<Self, LlmError> {
        let provider = create_provider(llm_config, ollama_config)?;
        Ok(Self::new(
            RuleCatalog::builtin(),
            provider,
            llm_config.temperature,
            llm_config.max_tokens,
            Duration::from_secs(llm_config.timeout_secs),
        ))
    }

    async fn fallback_reasoning(&self, anomalies: &[Anomaly]) -> RootCauseResult {
        let prompt = build_prompt(anomalies);
        debug!(prompt = %prompt.user, "reasoning request");

        let start = std::time::Instant::now();
        let response = match timeout(
            self.reasoning_timeout,
            self.provider
                .complete(&prompt, self.temperature, self.max_tokens),
        )
        .await
        {
            Ok(Ok(text)) => text,
            Ok(Err(e)) => {
                warn!(error = %e, "reasoning call failed, using default result");
                return default_result();
            }
            Err(_) => {
                warn!(
                    timeout_secs = self.reasoning_timeout.as_secs(),
                    "reasoning call timed out, using default result"
                );
                return default_result();
            }
        };

        let duration_ms = start.elapsed().as_millis() as u64;
        debug!(duration_ms, "reasoning response received");

        match parse_diagnosis(&response) {
            Ok(diagnosis) => {
                info!(
                    cause = %diagnosis.cause,
                    risk_level = %diagnosis.risk_level,
                    duration_ms,
                    "fallback reasoning succeeded"
                );
                RootCauseResult {
                    cause: diagnosis.cause,
                    recommendation: diagnosis.recommendation,
                    confidence: 0.6,
                    method: AnalysisMethod::FallbackReasoning,
                    rule_id: None,
                }
            }
            Err(e) => {
                warn!(error = %e, "unparseable reasoning response, using default result");
                default_result()
            }
        }
    }
}

#[async_trait]
impl CauseAnalyzer for RootCauseResolver {
    async fn analyze(&self, anomalies: &[Anomaly]) -> RootCauseResult {
        if let Some(rule) = self.catalog.first_match(anomalies) {
            info!(rule_id = rule.id, "rule matched");
            return RootCauseResult {
                cause: rule.cause.to_string(),
                recommendation: rule.recommendation.to_string(),
                confidence: 0.8,
                method: AnalysisMethod::RuleBased,
                rule_id: Some(rule.id.to_string()),
            };
        }

        info!(
            count = anomalies.len(),
            "no rule matched, using fallback reasoning"
        );
        self.fallback_reasoning(anomalies).await
    }
}

// ── Prompt & parsing ────────────────────────────────────────────────

fn build_prompt(anomalies: &[Anomaly]) -> Prompt {
    let anomaly_lines: Vec<String> = anomalies
        .iter()
        .map(|a| {
            format!(
                "- {}: value={}, baseline={}, z-score={:.2}, deviation={:.1}%",
                a.metric, a.value, a.baseline, a.z_score, a.deviation
            )
        })
        .collect();

    let user = format!(
        "The following anomalies were detected on a gas pressure regulator:\n\
         {}\n\n\
         Analyze:\n\
         1. The most probable fault cause\n\
         2. Concrete handling recommendations\n\
         3. A risk assessment\n\n\
         Respond ONLY with JSON in this shape:\n\
         {{\"cause\": \"...\", \"recommendation\": \"...\", \"riskLevel\": \"high/medium/low\"}}",
        anomaly_lines.join("\n")
    );

    Prompt::with_system(SYSTEM_PROMPT, user)
}

struct Diagnosis {
    cause: String,
    recommendation: String,
    /// Parsed and logged; not carried into the result.
    risk_level: String,
}

/// Pull the structured diagnosis out of the raw response text.
///
/// Models often wrap the JSON in prose, so the first `{ … }` span is
/// tried before the whole body. Missing fields get neutral defaults;
/// a body with no parseable JSON at all is an error.
fn parse_diagnosis(content: &str) -> Result<Diagnosis, String> {
    let candidate = match (content.find('{'), content.rfind('}')) {
        (Some(start), Some(end)) if start < end => &content[start..=end],
        _ => content,
    };

    let parsed: serde_json::Value =
        serde_json::from_str(candidate).map_err(|e| e.to_string())?;

    let field = |key: &str, default: &str| {
        parsed
            .get(key)
            .and_then(|v| v.as_str())
            .unwrap_or(default)
            .to_string()
    };

    Ok(Diagnosis {
        cause: field("cause", "Unknown fault"),
        recommendation: field("recommendation", "Manual inspection recommended"),
        risk_level: field("riskLevel", "medium"),
    })
}

/// Degraded default (confidence 0.3) used whenever fallback reasoning
/// cannot produce a diagnosis.
fn default_result() -> RootCauseResult {
    RootCauseResult {
        cause: "Automated analysis unavailable; detailed diagnosis pending".to_string(),
        recommendation: "Have an operator inspect the device".to_string(),
        confidence: 0.3,
        method: AnalysisMethod::FallbackReasoning,
        rule_id: None,
    }
}
