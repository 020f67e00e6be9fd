//! Coerces a parsed model object into a well-formed `ClassificationResult`.

use serde_json::{Map, Value};

use crate::pipeline::types::{Category, ClassificationResult};

pub const DEFAULT_PRODUCTIVE_REPLY: &str = "Como posso ajudar você?";
pub const DEFAULT_UNPRODUCTIVE_REPLY: &str = "Obrigado pela mensagem.";
pub const DEFAULT_JUSTIFICATION: &str = "Classificação realizada com base no conteúdo do e-mail.";

/// Default reply for a category when the model gave none.
pub fn default_reply(category: Category) -> &'static str {
    match category {
        Category::Productive => DEFAULT_PRODUCTIVE_REPLY,
        Category::Unproductive => DEFAULT_UNPRODUCTIVE_REPLY,
    }
}

/// Render a field as text. Strings pass through, `null` and missing keys
/// are empty, anything else uses its JSON form.
fn field_text(value: Option<&Value>) -> String {
    match value {
        None | Some(Value::Null) => String::new(),
        Some(Value::String(s)) => s.trim().to_string(),
        Some(other) => other.to_string().trim().to_string(),
    }
}

/// Build a result from the model's object.
///
/// The category must be exactly one of the two wire labels, otherwise it
/// becomes Productive. Empty reply / justification get defaults.
pub fn sanitize(parsed: &Map<String, Value>) -> ClassificationResult {
    let category = parsed
        .get("categoria")
        .and_then(Value::as_str)
        .and_then(Category::from_label)
        .unwrap_or(Category::Productive);

    let mut reply = field_text(parsed.get("resposta"));
    if reply.is_empty() {
        reply = default_reply(category).to_string();
    }

    let mut justification = field_text(parsed.get("justificativa_curta"));
    if justification.is_empty() {
        justification = DEFAULT_JUSTIFICATION.to_string();
    }

    ClassificationResult::new(category, reply, justification)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn object(value: Value) -> Map<String, Value> {
        value.as_object().cloned().unwrap()
    }

    #[test]
    fn well_formed_object_passes_through_trimmed() {
        let result = sanitize(&object(json!({
            "categoria": "Improdutivo",
            "resposta": "  Obrigado!  ",
            "justificativa_curta": "Agradecimento.\n"
        })));
        assert_eq!(result.category, Category::Unproductive);
        assert_eq!(result.reply, "Obrigado!");
        assert_eq!(result.short_justification, "Agradecimento.");
    }

    #[test]
    fn unknown_category_becomes_productive() {
        for label in ["Spam", "improdutivo", "Unproductive", ""] {
            let result = sanitize(&object(json!({"categoria": label, "resposta": "x"})));
            assert_eq!(result.category, Category::Productive, "{label}");
        }
    }

    #[test]
    fn non_string_category_becomes_productive() {
        let result = sanitize(&object(json!({"categoria": 1})));
        assert_eq!(result.category, Category::Productive);
    }

    #[test]
    fn missing_keys_get_productive_defaults() {
        let result = sanitize(&Map::new());
        assert_eq!(result.category, Category::Productive);
        assert_eq!(result.reply, DEFAULT_PRODUCTIVE_REPLY);
        assert_eq!(result.short_justification, DEFAULT_JUSTIFICATION);
    }

    #[test]
    fn empty_reply_default_depends_on_category() {
        let result = sanitize(&object(json!({"categoria": "Improdutivo", "resposta": "   "})));
        assert_eq!(result.reply, DEFAULT_UNPRODUCTIVE_REPLY);

        let result = sanitize(&object(json!({"categoria": "Produtivo", "resposta": ""})));
        assert_eq!(result.reply, DEFAULT_PRODUCTIVE_REPLY);
    }

    #[test]
    fn non_string_fields_are_stringified() {
        let result = sanitize(&object(json!({
            "categoria": "Produtivo",
            "resposta": 42,
            "justificativa_curta": true
        })));
        assert_eq!(result.reply, "42");
        assert_eq!(result.short_justification, "true");
    }

    #[test]
    fn null_fields_get_defaults() {
        let result = sanitize(&object(json!({
            "categoria": "Improdutivo",
            "resposta": null,
            "justificativa_curta": null
        })));
        assert_eq!(result.reply, DEFAULT_UNPRODUCTIVE_REPLY);
        assert_eq!(result.short_justification, DEFAULT_JUSTIFICATION);
    }
}
