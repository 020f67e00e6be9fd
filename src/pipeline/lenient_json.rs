//! Best-effort JSON object extraction from model output.
//!
//! Models wrap JSON in code fences, surround it with prose, or emit
//! near-JSON (smart quotes, single quotes, trailing commas). Two stages,
//! tried in order by [`parse_lenient`]:
//!
//! 1. **Strict**: strip fences, take the narrowest `{...}` span, falling
//!    back to the widest first-`{` to last-`}` span, and parse as-is.
//! 2. **Loose**: strip fences, take the widest span, normalize smart quotes,
//!    drop trailing commas; if that still fails, rewrite single-quoted keys
//!    and values to double quotes and retry.

use std::sync::LazyLock;

use regex::Regex;
use serde_json::{Map, Value};

use crate::error::RecoveryError;

static FENCE_OPEN_JSON: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^```json\s*").unwrap());
static FENCE_OPEN: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^```\s*").unwrap());
static FENCE_CLOSE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\s*```$").unwrap());

static NARROW_OBJECT: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(?s)\{.*?\}").unwrap());

static TRAILING_COMMA: LazyLock<Regex> = LazyLock::new(|| Regex::new(r",\s*([}\]])").unwrap());

static SINGLE_QUOTED_KEY: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"([{,])\s*'([^']+)'\s*:").unwrap());

static SINGLE_QUOTED_VALUE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r":\s*'([^']*)'\s*([,}])").unwrap());

/// Which stage produced the parsed object.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParseStage {
    Strict,
    Repaired,
}

/// Remove a leading ```` ```json ```` / ```` ``` ```` fence and a trailing one.
pub fn strip_code_fences(text: &str) -> String {
    let trimmed = text.trim();
    let without_json = FENCE_OPEN_JSON.replace(trimmed, "");
    let without_open = FENCE_OPEN.replace(&without_json, "");
    FENCE_CLOSE.replace(&without_open, "").into_owned()
}

/// The span from the first `{` to the last `}`, if it exists.
fn widest_object_span(text: &str) -> Option<&str> {
    let start = text.find('{')?;
    let end = text.rfind('}')?;
    (end > start).then(|| &text[start..=end])
}

fn into_object(value: Value) -> Result<Map<String, Value>, RecoveryError> {
    match value {
        Value::Object(map) => Ok(map),
        _ => Err(RecoveryError::NotAnObject),
    }
}

/// Stage 1: locate a JSON object and parse it without modification.
pub fn parse_strict(text: &str) -> Result<Map<String, Value>, RecoveryError> {
    let cleaned = strip_code_fences(text);

    let narrow = NARROW_OBJECT.find(&cleaned).map(|m| m.as_str());
    let widest = widest_object_span(&cleaned);

    let mut last_error = RecoveryError::NoObject;
    for candidate in [narrow, widest].into_iter().flatten() {
        match serde_json::from_str::<Value>(candidate) {
            Ok(value) => return into_object(value),
            Err(e) => last_error = RecoveryError::Parse(e),
        }
    }
    Err(last_error)
}

/// Stage 2: repair common near-JSON defects, then parse.
pub fn parse_loose(text: &str) -> Result<Map<String, Value>, RecoveryError> {
    let cleaned = strip_code_fences(text);
    let span = widest_object_span(&cleaned).unwrap_or(&cleaned);

    let normalized = span
        .replace(['\u{201C}', '\u{201D}'], "\"")
        .replace(['\u{2018}', '\u{2019}'], "'");
    let without_trailing = TRAILING_COMMA.replace_all(&normalized, "$1").into_owned();

    if let Ok(value) = serde_json::from_str::<Value>(&without_trailing) {
        return into_object(value);
    }

    let keys_fixed = SINGLE_QUOTED_KEY.replace_all(&without_trailing, "$1\"$2\":");
    let values_fixed = SINGLE_QUOTED_VALUE.replace_all(&keys_fixed, ": \"$1\"$2");
    let repaired = TRAILING_COMMA.replace_all(&values_fixed, "$1");

    into_object(serde_json::from_str::<Value>(&repaired)?)
}

/// Run the strict stage, then the loose stage.
///
/// On failure the error from the loose stage is returned.
pub fn parse_lenient(text: &str) -> Result<(Map<String, Value>, ParseStage), RecoveryError> {
    if let Ok(map) = parse_strict(text) {
        return Ok((map, ParseStage::Strict));
    }
    parse_loose(text).map(|map| (map, ParseStage::Repaired))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn canonical() -> Map<String, Value> {
        into_object(json!({"categoria": "Produtivo", "resposta": "ok"})).unwrap()
    }

    #[test]
    fn strict_plain_object() {
        let map = parse_strict(r#"{"categoria": "Produtivo", "resposta": "ok"}"#).unwrap();
        assert_eq!(map, canonical());
    }

    #[test]
    fn strict_strips_json_fence() {
        let raw = "```json\n{\"categoria\": \"Produtivo\", \"resposta\": \"ok\"}\n```";
        assert_eq!(parse_strict(raw).unwrap(), canonical());
    }

    #[test]
    fn strict_strips_bare_fence() {
        let raw = "```\n{\"categoria\": \"Produtivo\", \"resposta\": \"ok\"}\n```";
        assert_eq!(parse_strict(raw).unwrap(), canonical());
    }

    #[test]
    fn strict_ignores_surrounding_prose() {
        let raw = "Segue a classificação: {\"categoria\": \"Produtivo\", \"resposta\": \"ok\"} espero ter ajudado.";
        assert_eq!(parse_strict(raw).unwrap(), canonical());
    }

    #[test]
    fn strict_falls_back_to_widest_span_for_nested_objects() {
        let raw = r#"{"categoria": "Produtivo", "meta": {"x": 1}, "resposta": "ok"}"#;
        let map = parse_strict(raw).unwrap();
        assert_eq!(map["meta"]["x"], 1);
        assert_eq!(map["resposta"], "ok");
    }

    #[test]
    fn strict_without_braces_is_no_object() {
        assert!(matches!(
            parse_strict("Produtivo, responder ok"),
            Err(RecoveryError::NoObject)
        ));
    }

    #[test]
    fn strict_rejects_trailing_comma() {
        assert!(parse_strict(r#"{"categoria": "Produtivo",}"#).is_err());
    }

    #[test]
    fn loose_single_quotes_and_trailing_comma_match_canonical() {
        let repaired = parse_loose("{'categoria': 'Produtivo', 'resposta': 'ok',}").unwrap();
        let strict = parse_strict(r#"{"categoria": "Produtivo", "resposta": "ok"}"#).unwrap();
        assert_eq!(repaired, strict);
    }

    #[test]
    fn loose_normalizes_smart_quotes() {
        let raw = "{\u{201C}categoria\u{201D}: \u{201C}Produtivo\u{201D}, \u{201C}resposta\u{201D}: \u{201C}ok\u{201D}}";
        assert_eq!(parse_loose(raw).unwrap(), canonical());
    }

    #[test]
    fn loose_removes_trailing_comma_in_arrays() {
        let map = parse_loose(r#"{"tags": ["a", "b",], "resposta": "ok",}"#).unwrap();
        assert_eq!(map["tags"], json!(["a", "b"]));
    }

    #[test]
    fn loose_handles_fenced_single_quotes() {
        let raw = "```json\n{'categoria': 'Improdutivo', 'resposta': 'Obrigado pela mensagem.'}\n```";
        let map = parse_loose(raw).unwrap();
        assert_eq!(map["categoria"], "Improdutivo");
        assert_eq!(map["resposta"], "Obrigado pela mensagem.");
    }

    #[test]
    fn loose_gives_up_on_garbage() {
        assert!(parse_loose("não sei classificar").is_err());
    }

    #[test]
    fn non_object_json_is_rejected() {
        assert!(matches!(
            parse_loose("[1, 2, 3]"),
            Err(RecoveryError::NotAnObject)
        ));
    }

    #[test]
    fn lenient_reports_stage() {
        let (_, stage) = parse_lenient(r#"{"categoria": "Produtivo"}"#).unwrap();
        assert_eq!(stage, ParseStage::Strict);

        let (map, stage) = parse_lenient("{'categoria': 'Produtivo',}").unwrap();
        assert_eq!(stage, ParseStage::Repaired);
        assert_eq!(map["categoria"], "Produtivo");
    }

    #[test]
    fn fence_stripping_only_touches_edges() {
        assert_eq!(strip_code_fences("```json\n{}\n```"), "{}");
        assert_eq!(strip_code_fences("  {\"a\": \"```\"}  "), "{\"a\": \"```\"}");
    }
}
