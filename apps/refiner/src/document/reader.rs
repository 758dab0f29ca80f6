//! Input stage: `.docx` bytes to `Document`.
//!
//! Walks `word/document.xml` collecting, per body paragraph:
//!   w:p
//!     ├── w:pPr  → w:pStyle / w:jc
//!     └── w:r    → w:rPr/w:b, w:t text, w:tab, w:br, w:cr
//! Paragraphs inside tables are skipped, as are paragraphs with no text.

use std::io::{Cursor, Read};

use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;
use tracing::debug;
use zip::ZipArchive;

use crate::document::text::normalize_paragraph;
use crate::document::{Document, Paragraph, ParagraphStyle};
use crate::errors::AppError;

const DOCUMENT_PART: &str = "word/document.xml";

/// Parses a `.docx` package. Pure: no filesystem or network access.
pub fn read_docx(bytes: &[u8]) -> Result<Document, AppError> {
    let mut archive = ZipArchive::new(Cursor::new(bytes)).map_err(|e| {
        AppError::UnreadableDocument(format!("not a valid .docx container: {e}"))
    })?;

    let mut xml = String::new();
    {
        let mut part = archive.by_name(DOCUMENT_PART).map_err(|_| {
            AppError::UnreadableDocument(format!("package has no {DOCUMENT_PART}"))
        })?;
        part.read_to_string(&mut xml).map_err(|e| {
            AppError::UnreadableDocument(format!("cannot read {DOCUMENT_PART}: {e}"))
        })?;
    }

    let document = parse_document_xml(&xml)?;
    if document.is_empty() {
        return Err(AppError::UnreadableDocument(
            "document contains no extractable text".to_string(),
        ));
    }

    debug!("Parsed .docx with {} paragraphs", document.len());
    Ok(document)
}

#[derive(Default)]
struct ParagraphBuilder {
    text: String,
    style: ParagraphStyle,
    text_runs: usize,
    bold_runs: usize,
}

#[derive(Default)]
struct RunState {
    bold: bool,
    has_text: bool,
}

/// Extracts body paragraphs from WordprocessingML.
pub(crate) fn parse_document_xml(xml: &str) -> Result<Document, AppError> {
    let mut reader = Reader::from_str(xml);

    let mut paragraphs = Vec::new();
    let mut table_depth = 0usize;
    let mut paragraph: Option<ParagraphBuilder> = None;
    // Depth of nested w:p (text boxes); only the outermost is collected.
    let mut paragraph_depth = 0usize;
    let mut run: Option<RunState> = None;
    let mut in_text = false;

    loop {
        let event = reader
            .read_event()
            .map_err(|e| AppError::UnreadableDocument(format!("malformed document XML: {e}")))?;

        match event {
            Event::Start(e) => match e.name().as_ref() {
                b"w:tbl" => table_depth += 1,
                b"w:p" => {
                    paragraph_depth += 1;
                    if paragraph_depth == 1 && table_depth == 0 {
                        paragraph = Some(ParagraphBuilder::default());
                    }
                }
                b"w:r" if paragraph_depth == 1 => run = Some(RunState::default()),
                b"w:t" if run.is_some() && paragraph_depth == 1 => in_text = true,
                _ => {}
            },
            Event::Empty(e) => {
                let (Some(p), true) = (paragraph.as_mut(), paragraph_depth == 1) else {
                    continue;
                };
                match e.name().as_ref() {
                    b"w:pStyle" if run.is_none() => p.style.style_id = attr_val(&e)?,
                    b"w:jc" if run.is_none() => p.style.alignment = attr_val(&e)?,
                    b"w:b" => {
                        if let Some(r) = run.as_mut() {
                            r.bold = is_on(attr_val(&e)?.as_deref());
                        }
                    }
                    b"w:tab" if run.is_some() => push_text(p, run.as_mut(), "\t"),
                    b"w:br" | b"w:cr" if run.is_some() => push_text(p, run.as_mut(), "\n"),
                    _ => {}
                }
            }
            Event::Text(t) if in_text && paragraph_depth == 1 => {
                if let Some(p) = paragraph.as_mut() {
                    let text = t.unescape().map_err(|e| {
                        AppError::UnreadableDocument(format!("bad text in document XML: {e}"))
                    })?;
                    push_text(p, run.as_mut(), &text);
                }
            }
            Event::End(e) => match e.name().as_ref() {
                b"w:tbl" => table_depth = table_depth.saturating_sub(1),
                b"w:t" => in_text = false,
                b"w:r" if paragraph_depth == 1 => {
                    if let (Some(p), Some(r)) = (paragraph.as_mut(), run.take()) {
                        if r.has_text {
                            p.text_runs += 1;
                            if r.bold {
                                p.bold_runs += 1;
                            }
                        }
                    }
                }
                b"w:p" => {
                    paragraph_depth = paragraph_depth.saturating_sub(1);
                    if paragraph_depth == 0 {
                        if let Some(p) = paragraph.take() {
                            if let Some(built) = finish_paragraph(p) {
                                paragraphs.push(built);
                            }
                        }
                    }
                }
                _ => {}
            },
            Event::Eof => break,
            _ => {}
        }
    }

    Ok(Document::new(paragraphs))
}

fn push_text(paragraph: &mut ParagraphBuilder, run: Option<&mut RunState>, text: &str) {
    if let Some(r) = run {
        if !text.trim().is_empty() {
            r.has_text = true;
        }
    }
    paragraph.text.push_str(text);
}

fn finish_paragraph(builder: ParagraphBuilder) -> Option<Paragraph> {
    let text = normalize_paragraph(&builder.text);
    if text.trim().is_empty() {
        return None;
    }
    let mut style = builder.style;
    style.bold = builder.text_runs > 0 && builder.bold_runs == builder.text_runs;
    Some(Paragraph { text, style })
}

fn attr_val(e: &BytesStart<'_>) -> Result<Option<String>, AppError> {
    let attr = e
        .try_get_attribute("w:val")
        .map_err(|err| AppError::UnreadableDocument(format!("bad attribute: {err}")))?;
    match attr {
        Some(a) => {
            let value = a
                .unescape_value()
                .map_err(|err| AppError::UnreadableDocument(format!("bad attribute: {err}")))?;
            Ok(Some(value.into_owned()))
        }
        None => Ok(None),
    }
}

/// `<w:b/>` and `<w:b w:val="true"/>` are on; `0`, `false` and `off` are off.
fn is_on(val: Option<&str>) -> bool {
    !matches!(val, Some("0") | Some("false") | Some("off"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use zip::write::SimpleFileOptions;

    fn body(inner: &str) -> String {
        format!(
            r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<w:document xmlns:w="http://schemas.openxmlformats.org/wordprocessingml/2006/main"><w:body>{inner}<w:sectPr/></w:body></w:document>"#
        )
    }

    fn package(document_xml: &str) -> Vec<u8> {
        let mut zip = zip::ZipWriter::new(Cursor::new(Vec::new()));
        zip.start_file(DOCUMENT_PART, SimpleFileOptions::default())
            .unwrap();
        zip.write_all(document_xml.as_bytes()).unwrap();
        zip.finish().unwrap().into_inner()
    }

    #[test]
    fn test_runs_are_concatenated_per_paragraph() {
        let xml = body(
            r#"<w:p><w:r><w:t>Dear </w:t></w:r><w:r><w:t>Sir,</w:t></w:r></w:p>
               <w:p><w:r><w:t xml:space="preserve">I are writing &amp; waiting.</w:t></w:r></w:p>"#,
        );
        let doc = parse_document_xml(&xml).unwrap();
        assert_eq!(doc.texts(), vec!["Dear Sir,", "I are writing & waiting."]);
    }

    #[test]
    fn test_empty_paragraphs_are_skipped() {
        let xml = body(
            r#"<w:p/><w:p><w:r><w:t>One</w:t></w:r></w:p><w:p><w:r><w:t>   </w:t></w:r></w:p><w:p><w:r><w:t>Two</w:t></w:r></w:p>"#,
        );
        assert_eq!(parse_document_xml(&xml).unwrap().texts(), vec!["One", "Two"]);
    }

    #[test]
    fn test_style_bold_and_alignment_are_read() {
        let xml = body(
            r#"<w:p><w:pPr><w:pStyle w:val="Heading1"/><w:jc w:val="center"/><w:rPr><w:b/></w:rPr></w:pPr>
                 <w:r><w:rPr><w:b/></w:rPr><w:t>Notice</w:t></w:r></w:p>
               <w:p><w:r><w:rPr><w:b w:val="0"/></w:rPr><w:t>Body</w:t></w:r></w:p>"#,
        );
        let doc = parse_document_xml(&xml).unwrap();
        let heading = &doc.paragraphs[0].style;
        assert_eq!(heading.style_id.as_deref(), Some("Heading1"));
        assert_eq!(heading.alignment.as_deref(), Some("center"));
        assert!(heading.bold);
        assert!(!doc.paragraphs[1].style.bold);
    }

    #[test]
    fn test_partially_bold_paragraph_is_not_bold() {
        let xml = body(
            r#"<w:p><w:r><w:rPr><w:b/></w:rPr><w:t>Re:</w:t></w:r><w:r><w:t> your order</w:t></w:r></w:p>"#,
        );
        assert!(!parse_document_xml(&xml).unwrap().paragraphs[0].style.bold);
    }

    #[test]
    fn test_tabs_and_breaks_become_whitespace() {
        let xml = body(
            r#"<w:p><w:pPr><w:tabs><w:tab w:val="left" w:pos="720"/></w:tabs></w:pPr>
                 <w:r><w:tab/><w:t>Sincerely,</w:t><w:br/><w:t>Jane Doe</w:t></w:r></w:p>"#,
        );
        assert_eq!(
            parse_document_xml(&xml).unwrap().texts(),
            vec!["\tSincerely,\nJane Doe"]
        );
    }

    #[test]
    fn test_table_paragraphs_are_skipped() {
        let xml = body(
            r#"<w:p><w:r><w:t>Before</w:t></w:r></w:p>
               <w:tbl><w:tr><w:tc><w:p><w:r><w:t>Cell</w:t></w:r></w:p></w:tc></w:tr></w:tbl>
               <w:p><w:r><w:t>After</w:t></w:r></w:p>"#,
        );
        assert_eq!(parse_document_xml(&xml).unwrap().texts(), vec!["Before", "After"]);
    }

    #[test]
    fn test_text_box_text_stays_out_of_body_paragraph() {
        let xml = body(
            r#"<w:p><w:r><w:t>Dear Sir,</w:t><w:drawing><wps:txbx><w:txbxContent>
                 <w:p><w:r><w:t>LOGO</w:t><w:tab/></w:r></w:p>
               </w:txbxContent></wps:txbx></w:drawing></w:r></w:p>"#,
        );
        assert_eq!(parse_document_xml(&xml).unwrap().texts(), vec!["Dear Sir,"]);
    }

    #[test]
    fn test_alternate_content_text_box_is_not_duplicated() {
        let xml = body(
            r#"<w:p><w:r><w:t xml:space="preserve">Our address </w:t></w:r>
                 <w:r><mc:AlternateContent>
                   <mc:Choice Requires="wps"><w:drawing><wps:txbx><w:txbxContent>
                     <w:p><w:r><w:rPr><w:b/></w:rPr><w:t>ACME Ltd</w:t></w:r></w:p>
                   </w:txbxContent></wps:txbx></w:drawing></mc:Choice>
                   <mc:Fallback><w:pict><v:textbox><w:txbxContent>
                     <w:p><w:r><w:t>ACME Ltd</w:t><w:br/></w:r></w:p>
                   </w:txbxContent></v:textbox></w:pict></mc:Fallback>
                 </mc:AlternateContent></w:r>
                 <w:r><w:t>is unchanged.</w:t></w:r></w:p>"#,
        );
        let doc = parse_document_xml(&xml).unwrap();
        assert_eq!(doc.texts(), vec!["Our address is unchanged."]);
        assert!(!doc.paragraphs[0].style.bold);
    }

    #[test]
    fn test_not_a_zip_is_unreadable() {
        let err = read_docx(b"plain text, not a package").unwrap_err();
        assert!(matches!(err, AppError::UnreadableDocument(_)));
    }

    #[test]
    fn test_missing_document_part_is_unreadable() {
        let mut zip = zip::ZipWriter::new(Cursor::new(Vec::new()));
        zip.start_file("word/styles.xml", SimpleFileOptions::default())
            .unwrap();
        zip.write_all(b"<w:styles/>").unwrap();
        let bytes = zip.finish().unwrap().into_inner();

        let err = read_docx(&bytes).unwrap_err();
        assert!(err.to_string().contains("word/document.xml"));
    }

    #[test]
    fn test_malformed_xml_is_unreadable() {
        let bytes = package("<w:document><w:body><w:p></w:body>");
        assert!(matches!(
            read_docx(&bytes),
            Err(AppError::UnreadableDocument(_))
        ));
    }

    #[test]
    fn test_document_without_text_is_unreadable() {
        let bytes = package(&body("<w:p/><w:p><w:r><w:t> </w:t></w:r></w:p>"));
        let err = read_docx(&bytes).unwrap_err();
        assert!(err.to_string().contains("no extractable text"));
    }

    #[test]
    fn test_read_docx_from_package() {
        let bytes = package(&body(
            r#"<w:p><w:r><w:t>Dear Sir, I are writing to you.</w:t></w:r></w:p>"#,
        ));
        let doc = read_docx(&bytes).unwrap();
        assert_eq!(doc.texts(), vec!["Dear Sir, I are writing to you."]);
    }
}
