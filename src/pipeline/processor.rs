//! Triage processor — classifies one message and drafts a reply.
//!
//! **Core invariant: `classify` always returns a well-formed result.**
//! Model failures, unparseable output and missing configuration all end in
//! a fixed degraded result instead of an error.
//!
//! Flow:
//! 1. Rules engine (fast, no LLM) → may short-circuit
//! 2. LLM classification → lenient JSON parse (strict, then repaired)
//! 3. If unparseable: one JSON-fix LLM call → lenient parse again
//! 4. Sanitize → guard rail re-check of Produtivo verdicts

use std::sync::Arc;
use std::time::Instant;

use tracing::{debug, error, info, warn};
use uuid::Uuid;

use crate::config::TriageConfig;
use crate::error::{LlmError, PipelineError};
use crate::llm::provider::{ChatMessage, CompletionRequest, LlmProvider};
use crate::pipeline::guard;
use crate::pipeline::lenient_json::{ParseStage, parse_lenient};
use crate::pipeline::prompt::{build_fix_prompt, build_prompt, truncate_for_model};
use crate::pipeline::rules::{MessageText, RuleKind, RulesEngine};
use crate::pipeline::sanitize::{DEFAULT_PRODUCTIVE_REPLY, sanitize};
use crate::pipeline::types::{Category, ClassificationResult};

/// Characters of model input logged at debug level.
const INPUT_LOG_PREVIEW: usize = 1200;

/// Characters of raw / fixed model output logged at debug level.
const OUTPUT_LOG_PREVIEW: usize = 2000;

/// Characters of an error message kept in logs.
const ERROR_LOG_PREVIEW: usize = 200;

/// How a request reached its result.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TriagePath {
    /// A deterministic rule answered; no model call.
    Rule(RuleKind),
    /// No credential configured; no model call.
    NotConfigured,
    /// The classification output parsed (strictly or after repair).
    Parsed(ParseStage),
    /// The classification output needed the JSON-fix call.
    FixParsed(ParseStage),
    /// Neither the original nor the fixed output could be parsed.
    ParseFailed,
    /// The provider reported quota or rate-limit exhaustion.
    QuotaExceeded,
    /// Any other provider failure.
    ModelError,
}

/// Result plus the path that produced it.
#[derive(Debug, Clone)]
pub struct TriageOutcome {
    pub result: ClassificationResult,
    pub path: TriagePath,
    /// Guard rule that replaced the model's Produtivo verdict, if any.
    pub guard_override: Option<RuleKind>,
}

impl TriageOutcome {
    fn new(result: ClassificationResult, path: TriagePath) -> Self {
        Self {
            result,
            path,
            guard_override: None,
        }
    }
}

fn not_configured_result() -> ClassificationResult {
    ClassificationResult::new(
        Category::Productive,
        DEFAULT_PRODUCTIVE_REPLY,
        "Sistema de IA não configurado.",
    )
}

fn parse_failed_result() -> ClassificationResult {
    ClassificationResult::new(
        Category::Productive,
        DEFAULT_PRODUCTIVE_REPLY,
        "Erro ao processar resposta da IA.",
    )
}

fn quota_result() -> ClassificationResult {
    ClassificationResult::new(
        Category::Productive,
        "No momento, o sistema está com alto volume de processamento. \
         Pode me dar mais detalhes sobre o que você precisa? \
         (ex: status de um caso, envio de documento, dúvida específica)",
        "Sistema temporariamente indisponível (alto volume).",
    )
}

fn model_error_result(err: &LlmError) -> ClassificationResult {
    ClassificationResult::new(
        Category::Productive,
        DEFAULT_PRODUCTIVE_REPLY,
        format!("Erro ao processar ({}).", err.kind()),
    )
}

fn preview(text: &str, max_chars: usize) -> String {
    text.chars().take(max_chars).collect()
}

/// Triage processor — rules first, model for everything else.
///
/// Holds no per-request state; one instance can serve concurrent requests.
pub struct TriageProcessor {
    llm: Option<Arc<dyn LlmProvider>>,
    rules: RulesEngine,
    config: TriageConfig,
}

impl TriageProcessor {
    /// Create a processor with the standard rule cascade.
    ///
    /// `llm` is `None` when no credential is configured.
    pub fn new(llm: Option<Arc<dyn LlmProvider>>, config: TriageConfig) -> Self {
        Self::with_rules(llm, RulesEngine::default_rules(), config)
    }

    /// Create a processor with a custom rules engine.
    ///
    /// The guard rail always uses the standard social/trivial/spam checks.
    pub fn with_rules(
        llm: Option<Arc<dyn LlmProvider>>,
        rules: RulesEngine,
        config: TriageConfig,
    ) -> Self {
        Self { llm, rules, config }
    }

    pub fn is_model_configured(&self) -> bool {
        self.llm.is_some()
    }

    /// Classify a message and draft a reply. Never fails.
    pub async fn classify(&self, text: &str) -> ClassificationResult {
        self.classify_detailed(text).await.result
    }

    /// Like [`classify`](Self::classify), also reporting the path taken.
    pub async fn classify_detailed(&self, text: &str) -> TriageOutcome {
        let request_id = Uuid::new_v4();
        let message = MessageText::new(text);

        // Step 1: Rules engine (fast, no LLM)
        if let Some(matched) = self.rules.evaluate(&message) {
            debug!(
                %request_id,
                rule = matched.kind.label(),
                "Rules engine matched — skipping LLM"
            );
            return TriageOutcome::new(matched.result, TriagePath::Rule(matched.kind));
        }

        let Some(llm) = self.llm.as_ref() else {
            debug!(%request_id, "No LLM configured, returning fallback");
            return TriageOutcome::new(not_configured_result(), TriagePath::NotConfigured);
        };

        // Steps 2-3: model call + JSON recovery
        match self.classify_with_model(llm.as_ref(), &message, request_id).await {
            Ok((result, path)) => {
                let guard_override = match result.category {
                    Category::Productive => guard::guard_rail_hit(&message),
                    Category::Unproductive => None,
                };
                if let Some(kind) = guard_override {
                    warn!(
                        %request_id,
                        rule = kind.label(),
                        "Guard rail overrode a Produtivo verdict from the model"
                    );
                }
                // Step 4: guard rail
                let result = guard::apply(result, &message);
                TriageOutcome {
                    result,
                    path,
                    guard_override,
                }
            }
            Err(PipelineError::Unrecoverable(e)) => {
                error!(
                    %request_id,
                    error = %e,
                    "Failed to parse/recover model JSON after fix attempt"
                );
                TriageOutcome::new(parse_failed_result(), TriagePath::ParseFailed)
            }
            Err(PipelineError::Llm(e)) if e.is_quota() => {
                warn!(
                    %request_id,
                    model = llm.model_name(),
                    error = %preview(&e.to_string(), ERROR_LOG_PREVIEW),
                    "Model quota exceeded"
                );
                TriageOutcome::new(quota_result(), TriagePath::QuotaExceeded)
            }
            Err(PipelineError::Llm(e)) => {
                error!(
                    %request_id,
                    model = llm.model_name(),
                    text_len = message.raw().chars().count(),
                    error_kind = e.kind(),
                    error = %preview(&e.to_string(), ERROR_LOG_PREVIEW),
                    "Model call failed"
                );
                TriageOutcome::new(model_error_result(&e), TriagePath::ModelError)
            }
        }
    }

    /// Classification call, plus one JSON-fix call if the output is unusable.
    async fn classify_with_model(
        &self,
        llm: &dyn LlmProvider,
        message: &MessageText,
        request_id: Uuid,
    ) -> Result<(ClassificationResult, TriagePath), PipelineError> {
        let model_input = truncate_for_model(
            message.raw(),
            self.config.max_input_chars,
            self.config.head_ratio,
        );
        debug!(
            %request_id,
            input_preview = %preview(&model_input, INPUT_LOG_PREVIEW),
            "Sending message to model"
        );

        let started = Instant::now();
        let raw = self
            .invoke(llm, build_prompt(&model_input), self.config.primary_temperature)
            .await?;
        info!(
            %request_id,
            model = llm.model_name(),
            text_len = message.raw().chars().count(),
            elapsed_ms = started.elapsed().as_millis() as u64,
            "Model call succeeded"
        );

        let parse_error = match parse_lenient(&raw) {
            Ok((parsed, stage)) => {
                return Ok((sanitize(&parsed), TriagePath::Parsed(stage)));
            }
            Err(e) => e,
        };

        warn!(
            %request_id,
            error = %preview(&parse_error.to_string(), 120),
            "Model returned invalid JSON, requesting a fix"
        );
        debug!(
            %request_id,
            raw_response = %preview(&raw, OUTPUT_LOG_PREVIEW),
            "Unparseable model output"
        );

        let fixed = self
            .invoke(llm, build_fix_prompt(&raw), self.config.fix_temperature)
            .await?;
        debug!(
            %request_id,
            fixed_response = %preview(&fixed, OUTPUT_LOG_PREVIEW),
            "JSON-fix model output"
        );

        let (parsed, stage) = parse_lenient(&fixed).map_err(PipelineError::Unrecoverable)?;
        Ok((sanitize(&parsed), TriagePath::FixParsed(stage)))
    }

    async fn invoke(
        &self,
        llm: &dyn LlmProvider,
        prompt: String,
        temperature: f32,
    ) -> Result<String, LlmError> {
        let request = CompletionRequest::new(vec![ChatMessage::user(prompt)])
            .with_temperature(temperature)
            .with_max_tokens(self.config.max_output_tokens);

        let response = llm.complete(request).await?;
        Ok(response.content.trim().to_string())
    }
}
