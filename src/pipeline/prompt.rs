//! Prompt construction for the classification and JSON-repair calls.

/// Inserted between head and tail when the input is cut for the model.
pub const ELISION_MARKER: &str = "\n\n[...trecho do e-mail truncado para análise...]\n\n";

/// Cap `text` at `max_chars`, keeping the first `head_ratio` share and the
/// remaining tail, joined by `ELISION_MARKER`.
///
/// Counts characters, not bytes. Text within the cap is returned trimmed
/// and otherwise untouched.
pub fn truncate_for_model(text: &str, max_chars: usize, head_ratio: f32) -> String {
    let trimmed = text.trim();
    let total = trimmed.chars().count();
    if total <= max_chars {
        return trimmed.to_string();
    }

    let head_len = (max_chars as f64 * f64::from(head_ratio.clamp(0.0, 1.0))).round() as usize;
    let tail_len = max_chars - head_len;

    let head: String = trimmed.chars().take(head_len).collect();
    let tail: String = trimmed.chars().skip(total - tail_len).collect();

    format!("{head}{ELISION_MARKER}{tail}")
}

/// Build the classification prompt around the (already truncated) email.
pub fn build_prompt(email_text: &str) -> String {
    format!(
        r#"Você é um assistente de classificação de e-mails para uma empresa do setor financeiro.

Tarefa:
1) Classificar o e-mail como "Produtivo" ou "Improdutivo"
2) Sugerir uma resposta curta, profissional e adequada

DEFINIÇÕES IMPORTANTES:
- Produtivo:
  - E-mails de TRABALHO que exigem ação ou resposta objetiva
  - Solicitações, dúvidas, pedidos de status, suporte, envio/validação de documentos, processos internos, assuntos da empresa

- Improdutivo:
  - Spam, propaganda, marketing, anúncios, newsletter
  - Mensagens sociais/cortesia sem ação imediata (felicitações, agradecimentos)
  - Cumprimentos genéricos ou vazios como: "oi", "olá", "bom dia", "ok"

EXEMPLOS:
E-mail: "Oi"
Categoria: Improdutivo
Resposta: "Olá! Se precisar de algo relacionado ao trabalho, fico à disposição."

E-mail: "Promoção imperdível! Clique aqui: http://..."
Categoria: Improdutivo
Resposta: "Obrigado pela mensagem."

E-mail: "Obrigado pela ajuda!"
Categoria: Improdutivo
Resposta: "Por nada! Se precisar de algo mais, fico à disposição."

E-mail: "Preciso do status do meu chamado 12345"
Categoria: Produtivo
Resposta: "Vou verificar o status do chamado 12345 e retorno em breve."

E-mail: "Pode me enviar o relatório de vendas?"
Categoria: Produtivo
Resposta: "Claro! Vou providenciar o relatório e envio assim que possível."

REGRAS DA RESPOSTA:
- 1 a 2 frases
- Tom profissional e amigável
- Não invente dados (se faltar informação, peça de forma objetiva)
- Retorne APENAS um JSON válido (sem texto antes ou depois, sem markdown)
- Não use blocos de código (não use ```)

FORMATO DE SAÍDA:
{{"categoria":"Produtivo|Improdutivo","resposta":"...","justificativa_curta":"..."}}

E-mail para classificar:
"""{email_text}"""

Retorne APENAS o JSON."#
    )
}

/// Build the prompt asking the model to rewrite `bad_output` as one JSON object.
pub fn build_fix_prompt(bad_output: &str) -> String {
    format!(
        r#"Reescreva o conteúdo abaixo como APENAS um JSON válido (sem texto antes ou depois).
Não use markdown, não use ```.

O JSON deve conter exatamente:
{{"categoria":"Produtivo|Improdutivo","resposta":"...","justificativa_curta":"..."}}

Conteúdo:
"""{bad_output}"""

Retorne SOMENTE o JSON."#
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn prompt_embeds_email_and_format() {
        let prompt = build_prompt("Pode me enviar o boleto?");
        assert!(prompt.contains(r#""""Pode me enviar o boleto?""""#));
        assert!(prompt.contains(r#"{"categoria":"Produtivo|Improdutivo","resposta":"...","justificativa_curta":"..."}"#));
        assert!(prompt.contains("Produtivo"));
        assert!(prompt.contains("Improdutivo"));
        assert!(prompt.ends_with("Retorne APENAS o JSON."));
    }

    #[test]
    fn prompt_has_worked_examples() {
        let prompt = build_prompt("x");
        assert!(prompt.matches("E-mail: \"").count() >= 5);
    }

    #[test]
    fn fix_prompt_embeds_bad_output() {
        let prompt = build_fix_prompt("categoria: Produtivo, resposta: ok");
        assert!(prompt.contains("categoria: Produtivo, resposta: ok"));
        assert!(prompt.contains("justificativa_curta"));
        assert!(prompt.ends_with("Retorne SOMENTE o JSON."));
    }

    #[test]
    fn short_text_is_only_trimmed() {
        assert_eq!(truncate_for_model("  olá  ", 6000, 0.7), "olá");
    }

    #[test]
    fn text_at_cap_is_untouched() {
        let text = "a".repeat(6000);
        assert_eq!(truncate_for_model(&text, 6000, 0.7), text);
    }

    #[test]
    fn long_text_keeps_head_and_tail() {
        let text = format!("{}{}", "h".repeat(8000), "t".repeat(2000));
        let out = truncate_for_model(&text, 6000, 0.7);

        let (head, tail) = out.split_once(ELISION_MARKER).unwrap();
        assert_eq!(head.chars().count(), 4200);
        assert!(head.chars().all(|c| c == 'h'));
        assert_eq!(tail.chars().count(), 1800);
        assert!(tail.chars().all(|c| c == 't'));
    }

    #[test]
    fn truncation_counts_chars_not_bytes() {
        let text = "ç".repeat(20);
        let out = truncate_for_model(&text, 10, 0.7);
        let (head, tail) = out.split_once(ELISION_MARKER).unwrap();
        assert_eq!(head.chars().count(), 7);
        assert_eq!(tail.chars().count(), 3);
    }
}
