//! Text extraction for typed input and uploaded files.
//!
//! Turns whatever the caller sent (typed text, `.txt` bytes in an unknown
//! encoding, a `.pdf`) into a single plain string for the triage pipeline.

use std::sync::LazyLock;

use encoding_rs::{UTF_8, WINDOWS_1252};
use regex::Regex;
use tracing::{debug, warn};

use crate::error::ExtractError;

pub const ALLOWED_EXTENSIONS: &[&str] = &["txt", "pdf"];

/// Extracted PDF text shorter than this is treated as an image-only scan.
pub const SCANNED_PDF_MIN_CHARS: usize = 80;

pub const SCANNED_PDF_MESSAGE: &str = "Não consegui extrair texto suficiente do PDF. \
Ele parece ser um PDF escaneado (imagem). \
Se você puder, envie o conteúdo em .txt, copie/cole o texto do e-mail, \
ou gere um PDF 'pesquisável' (exportado com texto).";

static HORIZONTAL_SPACE_RUN: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"[ \t]+").unwrap());

/// Bytes left undefined by the Windows-1252 code page.
const CP1252_UNDEFINED: [u8; 5] = [0x81, 0x8D, 0x8F, 0x90, 0x9D];

/// Normalize typed text: trim, CRLF to LF, collapse runs of spaces / tabs.
pub fn normalize_input(text: &str) -> String {
    let unix = text.trim().replace("\r\n", "\n");
    HORIZONTAL_SPACE_RUN.replace_all(&unix, " ").into_owned()
}

/// Lowercased extension of `filename`, if it has one.
fn extension(filename: &str) -> Option<String> {
    let (_, ext) = filename.rsplit_once('.')?;
    Some(ext.trim().to_lowercase())
}

/// Whether the upload has a `.txt` or `.pdf` extension (case-insensitive).
pub fn allowed_file(filename: &str) -> bool {
    extension(filename).is_some_and(|ext| ALLOWED_EXTENSIONS.contains(&ext.as_str()))
}

/// Clean extracted text line by line.
///
/// Unifies line endings, drops BOMs, trims every line and keeps at most one
/// blank line between paragraphs.
pub fn clean_text(text: &str) -> String {
    let unified = text
        .replace("\r\n", "\n")
        .replace('\r', "\n")
        .replace('\u{feff}', "");

    let mut lines: Vec<&str> = Vec::new();
    let mut blank_run = 0;
    for line in unified.split('\n').map(str::trim) {
        if line.is_empty() {
            blank_run += 1;
            if blank_run > 1 {
                continue;
            }
        } else {
            blank_run = 0;
        }
        lines.push(line);
    }

    lines.join("\n").trim().to_string()
}

/// Decode uploaded text bytes.
///
/// Tries UTF-8 (with or without BOM), then Windows-1252, then Latin-1,
/// which accepts any byte sequence.
pub fn decode_text(bytes: &[u8]) -> String {
    if bytes.is_empty() {
        return String::new();
    }

    let body = bytes.strip_prefix(b"\xEF\xBB\xBF").unwrap_or(bytes);
    if let Some(text) = UTF_8.decode_without_bom_handling_and_without_replacement(body) {
        return text.into_owned();
    }

    if !bytes.iter().any(|b| CP1252_UNDEFINED.contains(b)) {
        let (text, had_errors) = WINDOWS_1252.decode_without_bom_handling(bytes);
        if !had_errors {
            debug!("Upload decoded as Windows-1252");
            return text.into_owned();
        }
    }

    debug!("Upload decoded as Latin-1");
    bytes.iter().map(|&b| char::from(b)).collect()
}

/// Whether extracted PDF text is too short to be a text-layer document.
pub fn looks_scanned(text: &str) -> bool {
    text.trim().chars().count() < SCANNED_PDF_MIN_CHARS
}

pub fn read_txt(bytes: &[u8]) -> String {
    clean_text(&decode_text(bytes))
}

/// Join per-page text, each page headed by a `[Página N]` marker.
///
/// Pages without text keep their marker so page numbers stay aligned.
pub fn join_pages<S: AsRef<str>>(pages: &[S]) -> String {
    let sections: Vec<String> = pages
        .iter()
        .enumerate()
        .map(|(i, page)| {
            let text = page.as_ref();
            if text.trim().is_empty() {
                format!("[Página {}]\n", i + 1)
            } else {
                format!("[Página {}]\n{text}", i + 1)
            }
        })
        .collect();
    clean_text(&sections.join("\n\n"))
}

/// Extract the text layer of a PDF, page by page.
///
/// Returns [`SCANNED_PDF_MESSAGE`] when there is (almost) no text layer.
/// Page markers do not count towards that threshold.
pub fn read_pdf(bytes: &[u8]) -> Result<String, ExtractError> {
    if bytes.is_empty() {
        return Ok(String::new());
    }

    let pages = pdf_extract::extract_text_from_mem_by_pages(bytes)
        .map_err(|e| ExtractError::Pdf(e.to_string()))?;

    let body = clean_text(&pages.join("\n"));
    if looks_scanned(&body) {
        warn!(
            pages = pages.len(),
            extracted_chars = body.chars().count(),
            "PDF has no usable text layer, probably scanned"
        );
        return Ok(clean_text(SCANNED_PDF_MESSAGE));
    }

    Ok(join_pages(&pages))
}

/// Extract plain text from an uploaded `.txt` or `.pdf` file.
pub fn extract_text_from_upload(filename: &str, bytes: &[u8]) -> Result<String, ExtractError> {
    match extension(filename).as_deref() {
        Some("txt") => Ok(read_txt(bytes)),
        Some("pdf") => read_pdf(bytes),
        Some(other) => Err(ExtractError::UnsupportedFormat(other.to_string())),
        None => Err(ExtractError::UnsupportedFormat(filename.to_string())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn normalize_input_collapses_horizontal_space() {
        assert_eq!(
            normalize_input("  Olá,\t\tpreciso   do  boleto\r\nobrigado  "),
            "Olá, preciso do boleto\nobrigado"
        );
    }

    #[test]
    fn normalize_input_keeps_blank_lines() {
        assert_eq!(normalize_input("a\r\n\r\nb"), "a\n\nb");
    }

    #[test]
    fn allowed_extensions_are_case_insensitive() {
        assert!(allowed_file("email.txt"));
        assert!(allowed_file("EMAIL.PDF"));
        assert!(allowed_file("arquivo.final.Pdf"));
        assert!(!allowed_file("email.docx"));
        assert!(!allowed_file("email"));
        assert!(!allowed_file(""));
    }

    #[test]
    fn clean_text_collapses_blank_runs() {
        let raw = "\u{feff}  Linha 1  \r\n\r\n\r\n\r\n  Linha 2\rLinha 3\n\n";
        assert_eq!(clean_text(raw), "Linha 1\n\nLinha 2\nLinha 3");
    }

    #[test]
    fn clean_text_of_whitespace_is_empty() {
        assert_eq!(clean_text(" \n \r\n\t"), "");
    }

    #[test]
    fn decodes_utf8_with_bom() {
        let bytes = b"\xEF\xBB\xBFol\xC3\xA1";
        assert_eq!(decode_text(bytes), "olá");
    }

    #[test]
    fn decodes_plain_utf8() {
        assert_eq!(decode_text("ação".as_bytes()), "ação");
    }

    #[test]
    fn falls_back_to_windows_1252() {
        // "ação" plus a euro sign, in cp1252
        let bytes = b"a\xE7\xE3o \x80";
        assert_eq!(decode_text(bytes), "ação €");
    }

    #[test]
    fn falls_back_to_latin1_on_undefined_cp1252_bytes() {
        let bytes = b"caf\xE9 \x81";
        assert_eq!(decode_text(bytes), "café \u{81}");
    }

    #[test]
    fn empty_bytes_decode_to_empty() {
        assert_eq!(decode_text(b""), "");
    }

    #[test]
    fn scanned_heuristic_uses_trimmed_char_count() {
        assert!(looks_scanned(&format!("  {}  ", "é".repeat(79))));
        assert!(!looks_scanned(&"é".repeat(80)));
    }

    #[test]
    fn txt_upload_is_decoded_and_cleaned() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(b"Prezados,\r\n\r\n\r\nPreciso da segunda via do boleto.\r\n")
            .unwrap();
        let bytes = std::fs::read(file.path()).unwrap();

        let text = extract_text_from_upload("pedido.TXT", &bytes).unwrap();
        assert_eq!(text, "Prezados,\n\nPreciso da segunda via do boleto.");
    }

    #[test]
    fn unsupported_upload_is_rejected() {
        let err = extract_text_from_upload("planilha.xlsx", b"data").unwrap_err();
        assert!(matches!(err, ExtractError::UnsupportedFormat(ext) if ext == "xlsx"));
    }

    #[test]
    fn pages_are_marked_and_blank_pages_kept() {
        let pages = ["  Prezados,\r\nsegue o contrato.  ", "   ", "Atenciosamente"];
        assert_eq!(
            join_pages(&pages),
            "[Página 1]\nPrezados,\nsegue o contrato.\n\n[Página 2]\n\n[Página 3]\nAtenciosamente"
        );
    }

    #[test]
    fn no_pages_join_to_empty() {
        assert_eq!(join_pages::<&str>(&[]), "");
    }

    #[test]
    fn empty_pdf_is_empty_text() {
        assert_eq!(read_pdf(b"").unwrap(), "");
    }

    #[test]
    fn garbage_pdf_is_an_error() {
        assert!(matches!(
            read_pdf(b"not a pdf at all"),
            Err(ExtractError::Pdf(_))
        ));
    }
}
