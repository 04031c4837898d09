use super::ExtractError;
use once_cell::sync::Lazy;
use regex::{Captures, Regex};
use std::io::{Cursor, Read};
use tracing::debug;

const DOCUMENT_PART: &str = "word/document.xml";

/// Text runs, tabs, breaks and paragraph ends of a WordprocessingML body.
static TOKEN_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?s)<w:t(?:\s[^>]*)?>(.*?)</w:t>|<w:tab\s*/>|<w:(?:br|cr)\b[^>]*/>|</w:p>")
        .expect("valid token regex")
});

static ENTITY_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"&(#x[0-9a-fA-F]+|#[0-9]+|[a-zA-Z]+);").expect("valid entity regex"));

/// Extract the raw text of an Office Open XML word-processing document.
///
/// Paragraphs are separated by a blank line. Formatting, tables and
/// images are dropped.
pub(super) fn extract_text(bytes: &[u8]) -> Result<String, ExtractError> {
    debug!("Processing Word document ({} bytes)", bytes.len());

    let mut archive = zip::ZipArchive::new(Cursor::new(bytes)).map_err(|e| {
        ExtractError::Failed(format!("not an Office Open XML document: {}", e))
    })?;

    let mut xml = String::new();
    archive
        .by_name(DOCUMENT_PART)
        .map_err(|e| ExtractError::Failed(format!("missing {}: {}", DOCUMENT_PART, e)))?
        .read_to_string(&mut xml)
        .map_err(|e| ExtractError::Failed(format!("unreadable {}: {}", DOCUMENT_PART, e)))?;

    Ok(document_xml_to_text(&xml))
}

fn document_xml_to_text(xml: &str) -> String {
    let mut text = String::with_capacity(xml.len() / 4);

    for token in TOKEN_RE.captures_iter(xml) {
        if let Some(run) = token.get(1) {
            text.push_str(&decode_entities(run.as_str()));
            continue;
        }

        match &token[0] {
            "</w:p>" => text.push_str("\n\n"),
            t if t.starts_with("<w:tab") => text.push('\t'),
            _ => text.push('\n'),
        }
    }

    text
}

fn decode_entities(raw: &str) -> String {
    ENTITY_RE
        .replace_all(raw, |caps: &Captures| {
            let name = &caps[1];
            let decoded = match name {
                "amp" => Some('&'),
                "lt" => Some('<'),
                "gt" => Some('>'),
                "quot" => Some('"'),
                "apos" => Some('\''),
                _ if name.starts_with("#x") => u32::from_str_radix(&name[2..], 16)
                    .ok()
                    .and_then(char::from_u32),
                _ if name.starts_with('#') => name[1..].parse().ok().and_then(char::from_u32),
                _ => None,
            };
            decoded.map_or_else(|| caps[0].to_string(), String::from)
        })
        .into_owned()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use zip::write::FileOptions;

    fn build_docx(document_xml: &str) -> Vec<u8> {
        let mut buffer = Cursor::new(Vec::new());
        {
            let mut writer = zip::ZipWriter::new(&mut buffer);
            writer
                .start_file("[Content_Types].xml", FileOptions::default())
                .unwrap();
            writer.write_all(b"<Types/>").unwrap();
            writer
                .start_file(DOCUMENT_PART, FileOptions::default())
                .unwrap();
            writer.write_all(document_xml.as_bytes()).unwrap();
            writer.finish().unwrap();
        }
        buffer.into_inner()
    }

    fn body(paragraphs: &str) -> String {
        format!(
            r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?><w:document xmlns:w="http://schemas.openxmlformats.org/wordprocessingml/2006/main"><w:body>{}</w:body></w:document>"#,
            paragraphs
        )
    }

    #[test]
    fn test_extracts_paragraph_text() {
        let xml = body(
            r#"<w:p><w:r><w:t>Q3 budget review</w:t></w:r></w:p><w:p><w:r><w:rPr><w:b/></w:rPr><w:t xml:space="preserve">Action: </w:t></w:r><w:r><w:t>Dana sends the deck</w:t></w:r></w:p>"#,
        );
        let text = extract_text(&build_docx(&xml)).unwrap();

        assert_eq!(text, "Q3 budget review\n\nAction: Dana sends the deck\n\n");
    }

    #[test]
    fn test_tabs_breaks_and_entities() {
        let xml = body(
            r#"<w:p><w:r><w:t>Owner</w:t><w:tab/><w:t>R&amp;D &lt;core&gt;</w:t><w:br/><w:t>caf&#233;</w:t></w:r></w:p>"#,
        );
        let text = extract_text(&build_docx(&xml)).unwrap();

        assert_eq!(text, "Owner\tR&D <core>\ncafé\n\n");
    }

    #[test]
    fn test_missing_document_part_fails() {
        let mut buffer = Cursor::new(Vec::new());
        {
            let mut writer = zip::ZipWriter::new(&mut buffer);
            writer
                .start_file("word/other.xml", FileOptions::default())
                .unwrap();
            writer.write_all(b"<x/>").unwrap();
            writer.finish().unwrap();
        }

        let result = extract_text(&buffer.into_inner());
        assert!(matches!(result, Err(ExtractError::Failed(ref m)) if m.contains(DOCUMENT_PART)));
    }

    #[test]
    fn test_not_a_zip_fails() {
        let result = extract_text(b"plain bytes");
        assert!(matches!(result, Err(ExtractError::Failed(_))));
    }

    #[test]
    fn test_unknown_entities_are_left_alone() {
        assert_eq!(decode_entities("a &nbsp; b &amp; c"), "a &nbsp; b & c");
    }
}
