//! Letter documents: the ordered-paragraph model plus the `.docx` reader and writer.
//!
//! A `.docx` file is a ZIP package; the body lives in `word/document.xml` as a
//! sequence of `w:p` paragraphs. Only body paragraphs are modelled; tables,
//! headers and footers are not part of a letter's refinable text.

pub mod reader;
pub mod text;
pub mod writer;

use serde::{Deserialize, Serialize};

pub use reader::read_docx;
pub use writer::write_docx;

/// MIME type for WordprocessingML packages.
pub const DOCX_MIME: &str =
    "application/vnd.openxmlformats-officedocument.wordprocessingml.document";

/// Basic formatting carried from the source paragraph to the rendered one.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParagraphStyle {
    /// `w:pStyle` id, e.g. `Heading1` or `Title`.
    pub style_id: Option<String>,
    /// Every text-bearing run in the paragraph was bold.
    pub bold: bool,
    /// `w:jc` value, e.g. `center` or `both`.
    pub alignment: Option<String>,
}

impl ParagraphStyle {
    pub fn is_heading(&self) -> bool {
        self.style_id
            .as_deref()
            .map(|id| id == "Title" || id.starts_with("Heading"))
            .unwrap_or(false)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Paragraph {
    pub text: String,
    #[serde(default)]
    pub style: ParagraphStyle,
}

impl Paragraph {
    pub fn plain(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            style: ParagraphStyle::default(),
        }
    }
}

/// A letter as an ordered list of non-empty paragraphs.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Document {
    pub paragraphs: Vec<Paragraph>,
}

impl Document {
    pub fn new(paragraphs: Vec<Paragraph>) -> Self {
        Self { paragraphs }
    }

    #[allow(dead_code)]
    pub fn from_texts<I, S>(texts: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::new(texts.into_iter().map(Paragraph::plain).collect())
    }

    pub fn len(&self) -> usize {
        self.paragraphs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.paragraphs.is_empty()
    }

    pub fn texts(&self) -> Vec<String> {
        self.paragraphs.iter().map(|p| p.text.clone()).collect()
    }

    /// Plain-text form handed to the stages: paragraphs separated by one blank line.
    pub fn to_text(&self) -> String {
        text::join_paragraphs(self.paragraphs.iter().map(|p| p.text.as_str()))
    }

    /// Maps refined text back onto this document's paragraph styles.
    ///
    /// Paragraph `i` of the result takes the style of paragraph `i` here. The
    /// count is forced to match this document (see `text::reconcile_paragraphs`).
    pub fn with_refined_text(&self, refined_text: &str) -> Document {
        let reference = self.texts();
        let refined = text::reconcile_paragraphs(&reference, text::split_paragraphs(refined_text));

        Document::new(
            self.paragraphs
                .iter()
                .zip(refined)
                .map(|(original, text)| Paragraph {
                    text,
                    style: original.style.clone(),
                })
                .collect(),
        )
    }
}
