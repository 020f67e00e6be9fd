//! Post-model guard rail.
//!
//! The model is trusted when it says a message needs no action, but a
//! "Produtivo" verdict is re-checked against the deterministic social,
//! trivial and spam rules on the original text. Any hit overrides it.

use crate::pipeline::rules::{MessageText, Rule, RuleKind, SOCIAL_RULE, STRONG_SPAM_RULE, TRIVIAL_RULE};
use crate::pipeline::types::{Category, ClassificationResult};

const GUARD_RULES: [Rule; 3] = [STRONG_SPAM_RULE, TRIVIAL_RULE, SOCIAL_RULE];

/// First guard rule that fires on `message`, if any.
pub fn guard_rail_hit(message: &MessageText) -> Option<RuleKind> {
    GUARD_RULES
        .iter()
        .find(|rule| rule.matches(message))
        .map(|rule| rule.kind)
}

fn override_result() -> ClassificationResult {
    ClassificationResult::new(
        Category::Unproductive,
        "Obrigado pela mensagem.",
        "Conteúdo sem necessidade de ação (social/trivial/spam).",
    )
}

/// Apply the guard rail to a sanitized model result.
///
/// Unproductive results pass through untouched.
pub fn apply(result: ClassificationResult, message: &MessageText) -> ClassificationResult {
    if result.category != Category::Productive {
        return result;
    }

    match guard_rail_hit(message) {
        Some(_) => override_result(),
        None => result,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn productive() -> ClassificationResult {
        ClassificationResult::new(Category::Productive, "Vou verificar.", "Pedido de ação.")
    }

    #[test]
    fn spam_overrides_productive() {
        let message = MessageText::new("Black Friday: compre agora com cupom exclusivo!");
        let result = apply(productive(), &message);
        assert_eq!(result.category, Category::Unproductive);
        assert_eq!(
            result.short_justification,
            "Conteúdo sem necessidade de ação (social/trivial/spam)."
        );
    }

    #[test]
    fn trivial_overrides_productive() {
        let result = apply(productive(), &MessageText::new("valeu"));
        assert_eq!(result.category, Category::Unproductive);
    }

    #[test]
    fn social_overrides_productive() {
        let result = apply(productive(), &MessageText::new("Parabéns pelo aniversário!"));
        assert_eq!(result.category, Category::Unproductive);
    }

    #[test]
    fn work_message_keeps_model_result() {
        let message = MessageText::new("Preciso do status do meu chamado 12345");
        assert_eq!(apply(productive(), &message), productive());
    }

    #[test]
    fn unproductive_is_never_touched() {
        let model = ClassificationResult::new(Category::Unproductive, "Obrigado!", "Cortesia.");
        let message = MessageText::new("Promoção imperdível, clique aqui");
        assert_eq!(apply(model.clone(), &message), model);
    }

    #[test]
    fn noreply_is_not_a_guard_rule() {
        let message = MessageText::new("Relatório de fechamento enviado por noreply@erp.example.com");
        assert_eq!(guard_rail_hit(&message), None);
    }

    #[test]
    fn override_is_idempotent() {
        let message = MessageText::new("Oferta imperdível em https://loja.example.com");
        let once = apply(productive(), &message);
        let twice = apply(once.clone(), &message);
        assert_eq!(once, twice);
    }
}
