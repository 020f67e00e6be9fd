//! Shared types for the triage pipeline.

use serde::{Deserialize, Serialize};

// ── Category ────────────────────────────────────────────────────────

/// Triage verdict for an inbound message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Category {
    /// Work-related, needs an action or an objective answer.
    #[serde(rename = "Produtivo")]
    Productive,
    /// Spam, courtesy, automated mail, or content-free greetings.
    #[serde(rename = "Improdutivo")]
    Unproductive,
}

impl Category {
    /// Wire label, as the model is asked to emit it.
    pub fn label(&self) -> &'static str {
        match self {
            Self::Productive => "Produtivo",
            Self::Unproductive => "Improdutivo",
        }
    }

    /// Parse an exact wire label. Anything else is `None`.
    pub fn from_label(label: &str) -> Option<Self> {
        match label {
            "Produtivo" => Some(Self::Productive),
            "Improdutivo" => Some(Self::Unproductive),
            _ => None,
        }
    }
}

impl std::fmt::Display for Category {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

// ── Classification result ───────────────────────────────────────────

/// Final output of the pipeline.
///
/// Built once by whichever stage terminates the request and never mutated
/// afterwards. `reply` and `short_justification` are always non-empty.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClassificationResult {
    #[serde(rename = "categoria")]
    pub category: Category,
    #[serde(rename = "resposta")]
    pub reply: String,
    #[serde(rename = "justificativa_curta")]
    pub short_justification: String,
}

impl ClassificationResult {
    pub fn new(
        category: Category,
        reply: impl Into<String>,
        short_justification: impl Into<String>,
    ) -> Self {
        Self {
            category,
            reply: reply.into(),
            short_justification: short_justification.into(),
        }
    }
}

// ── Wire response ───────────────────────────────────────────────────

/// Number of input characters echoed back as `preview`.
pub const PREVIEW_CHARS: usize = 400;

/// JSON body returned by `POST /api/process`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProcessResponse {
    pub categoria: Category,
    pub justificativa_curta: String,
    pub resposta: String,
    pub preview: String,
}

impl ProcessResponse {
    pub fn new(result: ClassificationResult, input: &str) -> Self {
        Self {
            categoria: result.category,
            justificativa_curta: result.short_justification,
            resposta: result.reply,
            preview: input.chars().take(PREVIEW_CHARS).collect(),
        }
    }
}
