//! Pre-LLM rules engine for fast pattern matching.
//!
//! Runs before the model call to short-circuit obvious cases, in this order:
//! - empty input → Unproductive
//! - short social messages (holiday greetings, congratulations) → Unproductive
//! - trivial greetings / acknowledgements without work context → Unproductive
//! - strong spam signals (marketing vocabulary, links, unsubscribe) → Unproductive
//! - automated no-reply mail → Unproductive
//!
//! The first matching rule wins and the model is never called. Thresholds
//! and vocabularies here are fixed behavior, not tunables.

use std::sync::LazyLock;

use regex::Regex;
use tracing::debug;

use crate::pipeline::normalize::normalize;
use crate::pipeline::types::{Category, ClassificationResult};

/// Maximum normalized length for a message to count as purely social.
pub const SOCIAL_MAX_CHARS: usize = 120;

/// Maximum normalized token count for a message to count as trivial.
pub const TRIVIAL_MAX_TOKENS: usize = 2;

const SOCIAL_PHRASES: &[&str] = &[
    "feliz natal",
    "boas festas",
    "feliz ano novo",
    "parabéns",
    "parabens",
];

/// Tokens whose presence vetoes the "too short to matter" heuristic.
const WORK_CONTEXT_HINTS: &[&str] = &[
    "caso",
    "chamado",
    "status",
    "suporte",
    "erro",
    "problema",
    "documento",
    "contrato",
    "pagamento",
];

const SPAM_VOCABULARY: &[&str] = &[
    "promoção",
    "promocao",
    "oferta",
    "desconto",
    "imperdível",
    "imperdivel",
    "compre",
    "comprar",
    "cupom",
    "frete grátis",
    "frete gratis",
    "clique aqui",
    "ganhe",
    "aproveite",
    "newsletter",
    "assinatura",
    "unsubscribe",
    "descadastrar",
    "descadastre",
    "remover inscrição",
    "remover inscricao",
    "marketing",
    "publicidade",
    "propaganda",
    "anúncio",
    "anuncio",
    "black friday",
    "liquidação",
    "liquidacao",
];

/// Any one of these alone marks the message as bulk mail.
const OPT_OUT_PHRASES: &[&str] = &["unsubscribe", "descadastrar", "remover inscr"];

/// Full-string greetings and acknowledgements, matched on lowercased text.
static TRIVIAL_PATTERNS: LazyLock<Vec<Regex>> = LazyLock::new(|| {
    [
        r"^\s*oi\s*!?\s*$",
        r"^\s*ol[áa]\s*!?\s*$",
        r"^\s*bom\s+dia\s*!?\s*$",
        r"^\s*boa\s+tarde\s*!?\s*$",
        r"^\s*boa\s+noite\s*!?\s*$",
        r"^\s*ok\s*!?\s*$",
        r"^\s*blz\s*!?\s*$",
        r"^\s*t[áa]\s*!?\s*$",
        r"^\s*valeu\s*!?\s*$",
    ]
    .iter()
    .map(|p| Regex::new(p).unwrap())
    .collect()
});

static URL: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)(https?://\S+|www\.\S+)").unwrap());

static NO_REPLY: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\b(no[\-_.]?reply|donotreply|do[\-_.]?not[\-_.]?reply|noreply)\b").unwrap()
});

// ── Input ───────────────────────────────────────────────────────────

/// A message prepared for rule evaluation: trimmed raw text plus its
/// normalized form, computed once.
#[derive(Debug, Clone)]
pub struct MessageText {
    raw: String,
    normalized: String,
}

impl MessageText {
    pub fn new(text: &str) -> Self {
        let raw = text.trim().to_string();
        let normalized = normalize(&raw);
        Self { raw, normalized }
    }

    pub fn raw(&self) -> &str {
        &self.raw
    }

    pub fn normalized(&self) -> &str {
        &self.normalized
    }
}

// ── Predicates ──────────────────────────────────────────────────────

pub fn is_empty(message: &MessageText) -> bool {
    message.raw.is_empty()
}

/// Holiday greeting or congratulation with little else in it.
pub fn is_social(message: &MessageText) -> bool {
    let has_phrase = SOCIAL_PHRASES
        .iter()
        .any(|phrase| message.normalized.contains(phrase));
    has_phrase && message.normalized.chars().count() <= SOCIAL_MAX_CHARS
}

/// Bare greeting / acknowledgement, or at most two meaningful tokens with
/// no work-context hint among them.
pub fn is_trivial(message: &MessageText) -> bool {
    let lowered = message.raw.to_lowercase();
    if lowered.is_empty() {
        return true;
    }

    if TRIVIAL_PATTERNS.iter().any(|p| p.is_match(&lowered)) {
        return true;
    }

    let token_count = message.normalized.split_whitespace().count();
    if token_count <= TRIVIAL_MAX_TOKENS {
        let has_work_context = WORK_CONTEXT_HINTS
            .iter()
            .any(|hint| message.normalized.contains(hint));
        return !has_work_context;
    }

    false
}

/// Number of distinct spam vocabulary entries found in `text`.
pub fn spam_vocabulary_hits(text: &str) -> usize {
    let lowered = text.to_lowercase();
    SPAM_VOCABULARY
        .iter()
        .filter(|term| lowered.contains(*term))
        .count()
}

pub fn has_url(text: &str) -> bool {
    URL.is_match(text)
}

/// Link plus marketing vocabulary, two or more vocabulary hits, or an
/// opt-out phrase.
pub fn is_strong_spam(message: &MessageText) -> bool {
    let hits = spam_vocabulary_hits(&message.raw);

    if has_url(&message.raw) && hits >= 1 {
        return true;
    }
    if hits >= 2 {
        return true;
    }

    let lowered = message.raw.to_lowercase();
    OPT_OUT_PHRASES.iter().any(|phrase| lowered.contains(phrase))
}

pub fn is_noreply(message: &MessageText) -> bool {
    NO_REPLY.is_match(&message.raw)
}

// ── Responses ───────────────────────────────────────────────────────

fn empty_reply(_message: &MessageText) -> ClassificationResult {
    ClassificationResult::new(
        Category::Unproductive,
        "Mensagem recebida.",
        "Conteúdo vazio.",
    )
}

fn social_reply(message: &MessageText) -> ClassificationResult {
    let text = message.normalized();
    let reply = if text.contains("feliz natal") || text.contains("boas festas") {
        "Obrigado pela mensagem! Feliz Natal pra você também! 🎄✨"
    } else if text.contains("feliz ano novo") {
        "Obrigado pela mensagem! Feliz Ano Novo pra você também! 🎆✨"
    } else if text.contains("parabéns") || text.contains("parabens") {
        "Muito obrigado! 😊"
    } else {
        "Obrigado pela mensagem! 😊"
    };

    ClassificationResult::new(
        Category::Unproductive,
        reply,
        "Mensagem social sem necessidade de ação.",
    )
}

fn trivial_reply(_message: &MessageText) -> ClassificationResult {
    ClassificationResult::new(
        Category::Unproductive,
        "Olá! Se precisar de algo relacionado ao trabalho, fico à disposição.",
        "Mensagem muito curta e sem contexto de trabalho.",
    )
}

fn spam_reply(_message: &MessageText) -> ClassificationResult {
    ClassificationResult::new(
        Category::Unproductive,
        "Obrigado pela mensagem.",
        "Conteúdo com características de spam/propaganda, sem necessidade de ação.",
    )
}

fn noreply_reply(_message: &MessageText) -> ClassificationResult {
    ClassificationResult::new(
        Category::Unproductive,
        "Mensagem recebida. Este é um e-mail automático que não requer resposta.",
        "E-mail automático identificado como 'no-reply', sem necessidade de resposta.",
    )
}

// ── Engine ──────────────────────────────────────────────────────────

/// Identifies which rule fired.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RuleKind {
    Empty,
    Social,
    Trivial,
    StrongSpam,
    NoReply,
}

impl RuleKind {
    /// Short label for logging.
    pub fn label(&self) -> &'static str {
        match self {
            Self::Empty => "empty",
            Self::Social => "social",
            Self::Trivial => "trivial",
            Self::StrongSpam => "strong_spam",
            Self::NoReply => "no_reply",
        }
    }
}

/// A predicate paired with the result it produces.
#[derive(Clone, Copy)]
pub struct Rule {
    pub kind: RuleKind,
    matches: fn(&MessageText) -> bool,
    respond: fn(&MessageText) -> ClassificationResult,
}

impl Rule {
    pub fn matches(&self, message: &MessageText) -> bool {
        (self.matches)(message)
    }

    pub fn respond(&self, message: &MessageText) -> ClassificationResult {
        (self.respond)(message)
    }
}

impl std::fmt::Debug for Rule {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Rule").field("kind", &self.kind).finish()
    }
}

pub const EMPTY_RULE: Rule = Rule {
    kind: RuleKind::Empty,
    matches: is_empty,
    respond: empty_reply,
};

pub const SOCIAL_RULE: Rule = Rule {
    kind: RuleKind::Social,
    matches: is_social,
    respond: social_reply,
};

pub const TRIVIAL_RULE: Rule = Rule {
    kind: RuleKind::Trivial,
    matches: is_trivial,
    respond: trivial_reply,
};

pub const STRONG_SPAM_RULE: Rule = Rule {
    kind: RuleKind::StrongSpam,
    matches: is_strong_spam,
    respond: spam_reply,
};

pub const NO_REPLY_RULE: Rule = Rule {
    kind: RuleKind::NoReply,
    matches: is_noreply,
    respond: noreply_reply,
};

/// A rule that fired, with its result.
#[derive(Debug, Clone)]
pub struct RuleMatch {
    pub kind: RuleKind,
    pub result: ClassificationResult,
}

/// Ordered rule cascade.
#[derive(Debug, Clone)]
pub struct RulesEngine {
    rules: Vec<Rule>,
}

impl RulesEngine {
    /// Create a rules engine with the standard cascade.
    pub fn default_rules() -> Self {
        Self {
            rules: vec![
                EMPTY_RULE,
                SOCIAL_RULE,
                TRIVIAL_RULE,
                STRONG_SPAM_RULE,
                NO_REPLY_RULE,
            ],
        }
    }

    /// Create an empty rules engine (for testing).
    pub fn empty() -> Self {
        Self { rules: Vec::new() }
    }

    /// Append a rule at the end of the cascade.
    pub fn push(&mut self, rule: Rule) {
        self.rules.push(rule);
    }

    pub fn rules(&self) -> &[Rule] {
        &self.rules
    }

    /// Evaluate a message against all rules.
    ///
    /// Returns `Some(RuleMatch)` for the first rule that fires (short-circuits
    /// the model call). Returns `None` if no rule matches.
    pub fn evaluate(&self, message: &MessageText) -> Option<RuleMatch> {
        let rule = self.rules.iter().find(|rule| rule.matches(message))?;
        debug!(rule = rule.kind.label(), "Message matched rule");
        Some(RuleMatch {
            kind: rule.kind,
            result: rule.respond(message),
        })
    }
}

impl Default for RulesEngine {
    fn default() -> Self {
        Self::default_rules()
    }
}
