//! Output stage: `Document` to `.docx` bytes.
//!
//! Emits a minimal WordprocessingML package with one `w:p` per paragraph and
//! 1" page margins. Heading styles, bold and alignment are carried over.

use std::io::{Cursor, Write};

use quick_xml::events::{BytesDecl, BytesEnd, BytesStart, BytesText, Event};
use quick_xml::Writer;
use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipWriter};

use crate::document::{Document, Paragraph, ParagraphStyle};
use crate::errors::AppError;

const W_NS: &str = "http://schemas.openxmlformats.org/wordprocessingml/2006/main";
/// 1 inch in twentieths of a point.
const MARGIN_TWIPS: &str = "1440";

/// Paragraph styles declared in `STYLES_XML`.
const DEFINED_STYLES: [&str; 5] = ["Normal", "Title", "Heading1", "Heading2", "Heading3"];

const CONTENT_TYPES_XML: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Types xmlns="http://schemas.openxmlformats.org/package/2006/content-types"><Default Extension="rels" ContentType="application/vnd.openxmlformats-package.relationships+xml"/><Default Extension="xml" ContentType="application/xml"/><Override PartName="/word/document.xml" ContentType="application/vnd.openxmlformats-officedocument.wordprocessingml.document.main+xml"/><Override PartName="/word/styles.xml" ContentType="application/vnd.openxmlformats-officedocument.wordprocessingml.styles+xml"/></Types>"#;

const ROOT_RELS_XML: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships"><Relationship Id="rId1" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/officeDocument" Target="word/document.xml"/></Relationships>"#;

const DOCUMENT_RELS_XML: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships"><Relationship Id="rId1" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/styles" Target="styles.xml"/></Relationships>"#;

const STYLES_XML: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<w:styles xmlns:w="http://schemas.openxmlformats.org/wordprocessingml/2006/main"><w:style w:type="paragraph" w:default="1" w:styleId="Normal"><w:name w:val="Normal"/><w:pPr><w:spacing w:after="160"/></w:pPr><w:rPr><w:sz w:val="22"/></w:rPr></w:style><w:style w:type="paragraph" w:styleId="Title"><w:name w:val="Title"/><w:basedOn w:val="Normal"/><w:next w:val="Normal"/><w:rPr><w:b/><w:sz w:val="36"/></w:rPr></w:style><w:style w:type="paragraph" w:styleId="Heading1"><w:name w:val="heading 1"/><w:basedOn w:val="Normal"/><w:next w:val="Normal"/><w:rPr><w:b/><w:sz w:val="32"/></w:rPr></w:style><w:style w:type="paragraph" w:styleId="Heading2"><w:name w:val="heading 2"/><w:basedOn w:val="Normal"/><w:next w:val="Normal"/><w:rPr><w:b/><w:sz w:val="28"/></w:rPr></w:style><w:style w:type="paragraph" w:styleId="Heading3"><w:name w:val="heading 3"/><w:basedOn w:val="Normal"/><w:next w:val="Normal"/><w:rPr><w:b/><w:sz w:val="24"/></w:rPr></w:style></w:styles>"#;

/// Renders a document as `.docx` bytes.
///
/// Fails with `Render` when a paragraph holds characters XML 1.0 cannot carry.
pub fn write_docx(document: &Document) -> Result<Vec<u8>, AppError> {
    for (index, paragraph) in document.paragraphs.iter().enumerate() {
        if let Some(c) = paragraph.text.chars().find(|&c| !is_xml_char(c)) {
            return Err(AppError::Render(format!(
                "paragraph {} contains character U+{:04X} which cannot be stored in a .docx",
                index + 1,
                c as u32
            )));
        }
    }

    let document_xml = document_xml(document)
        .map_err(|e| AppError::Render(format!("cannot serialize document XML: {e}")))?;

    package(&[
        ("[Content_Types].xml", CONTENT_TYPES_XML.as_bytes()),
        ("_rels/.rels", ROOT_RELS_XML.as_bytes()),
        ("word/_rels/document.xml.rels", DOCUMENT_RELS_XML.as_bytes()),
        ("word/styles.xml", STYLES_XML.as_bytes()),
        ("word/document.xml", document_xml.as_slice()),
    ])
}

fn package(parts: &[(&str, &[u8])]) -> Result<Vec<u8>, AppError> {
    let mut zip = ZipWriter::new(Cursor::new(Vec::new()));
    let options = SimpleFileOptions::default().compression_method(CompressionMethod::Deflated);

    for (name, content) in parts {
        zip.start_file(*name, options)
            .map_err(|e| AppError::Render(format!("cannot add {name} to package: {e}")))?;
        zip.write_all(content)
            .map_err(|e| AppError::Render(format!("cannot write {name}: {e}")))?;
    }

    let cursor = zip
        .finish()
        .map_err(|e| AppError::Render(format!("cannot finish package: {e}")))?;
    Ok(cursor.into_inner())
}

fn document_xml(document: &Document) -> Result<Vec<u8>, quick_xml::Error> {
    let mut writer = Writer::new(Cursor::new(Vec::new()));

    writer.write_event(Event::Decl(BytesDecl::new("1.0", Some("UTF-8"), Some("yes"))))?;

    let mut root = BytesStart::new("w:document");
    root.push_attribute(("xmlns:w", W_NS));
    writer.write_event(Event::Start(root))?;
    writer.write_event(Event::Start(BytesStart::new("w:body")))?;

    for paragraph in &document.paragraphs {
        write_paragraph(&mut writer, paragraph)?;
    }

    write_section_properties(&mut writer)?;

    writer.write_event(Event::End(BytesEnd::new("w:body")))?;
    writer.write_event(Event::End(BytesEnd::new("w:document")))?;

    Ok(writer.into_inner().into_inner())
}

fn write_paragraph<W: Write>(
    writer: &mut Writer<W>,
    paragraph: &Paragraph,
) -> Result<(), quick_xml::Error> {
    let style = &paragraph.style;
    writer.write_event(Event::Start(BytesStart::new("w:p")))?;

    if style.style_id.is_some() || style.alignment.is_some() {
        writer.write_event(Event::Start(BytesStart::new("w:pPr")))?;
        if let Some(ref id) = style.style_id {
            write_val(writer, "w:pStyle", id)?;
        }
        if let Some(ref jc) = style.alignment {
            write_val(writer, "w:jc", jc)?;
        }
        writer.write_event(Event::End(BytesEnd::new("w:pPr")))?;
    }

    writer.write_event(Event::Start(BytesStart::new("w:r")))?;
    if style.bold || is_undefined_heading(style) {
        writer.write_event(Event::Start(BytesStart::new("w:rPr")))?;
        writer.write_event(Event::Empty(BytesStart::new("w:b")))?;
        writer.write_event(Event::End(BytesEnd::new("w:rPr")))?;
    }

    for (line_index, line) in paragraph.text.split('\n').enumerate() {
        if line_index > 0 {
            writer.write_event(Event::Empty(BytesStart::new("w:br")))?;
        }
        for (segment_index, segment) in line.split('\t').enumerate() {
            if segment_index > 0 {
                writer.write_event(Event::Empty(BytesStart::new("w:tab")))?;
            }
            if segment.is_empty() {
                continue;
            }
            let mut t = BytesStart::new("w:t");
            t.push_attribute(("xml:space", "preserve"));
            writer.write_event(Event::Start(t))?;
            writer.write_event(Event::Text(BytesText::new(segment)))?;
            writer.write_event(Event::End(BytesEnd::new("w:t")))?;
        }
    }

    writer.write_event(Event::End(BytesEnd::new("w:r")))?;
    writer.write_event(Event::End(BytesEnd::new("w:p")))?;
    Ok(())
}

fn write_val<W: Write>(writer: &mut Writer<W>, name: &str, val: &str) -> Result<(), quick_xml::Error> {
    let mut elem = BytesStart::new(name);
    elem.push_attribute(("w:val", val));
    writer.write_event(Event::Empty(elem))
}

fn write_section_properties<W: Write>(writer: &mut Writer<W>) -> Result<(), quick_xml::Error> {
    writer.write_event(Event::Start(BytesStart::new("w:sectPr")))?;

    let mut size = BytesStart::new("w:pgSz");
    size.push_attribute(("w:w", "12240"));
    size.push_attribute(("w:h", "15840"));
    writer.write_event(Event::Empty(size))?;

    let mut margins = BytesStart::new("w:pgMar");
    for side in ["w:top", "w:right", "w:bottom", "w:left"] {
        margins.push_attribute((side, MARGIN_TWIPS));
    }
    margins.push_attribute(("w:header", "720"));
    margins.push_attribute(("w:footer", "720"));
    margins.push_attribute(("w:gutter", "0"));
    writer.write_event(Event::Empty(margins))?;

    writer.write_event(Event::End(BytesEnd::new("w:sectPr")))?;
    Ok(())
}

/// Headings whose style this package does not define would render as Normal text.
fn is_undefined_heading(style: &ParagraphStyle) -> bool {
    style.is_heading()
        && !style
            .style_id
            .as_deref()
            .map(|id| DEFINED_STYLES.contains(&id))
            .unwrap_or(false)
}

/// XML 1.0 `Char` production, restricted to what a Rust `char` can hold.
fn is_xml_char(c: char) -> bool {
    matches!(c, '\t' | '\n' | '\r')
        || ('\u{20}'..='\u{D7FF}').contains(&c)
        || ('\u{E000}'..='\u{FFFD}').contains(&c)
        || c >= '\u{10000}'
}
