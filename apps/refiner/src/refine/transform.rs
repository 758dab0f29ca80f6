//! LLM-backed `TextTransform` plus deterministic clean-up of model output.
//!
//! Models sometimes ignore "plain text only" and wrap the letter in fences,
//! add markdown emphasis, or announce the answer ("Here is the revised
//! letter:"). The clean-up rules undo those quirks without touching wording.

use async_trait::async_trait;
use once_cell::sync::Lazy;
use regex::Regex;
use tracing::{debug, info};

use crate::document::text::{join_paragraphs, split_paragraphs};
use crate::errors::AppError;
use crate::llm_client::prompts::{PLAIN_TEXT_SYSTEM, STRUCTURE_INSTRUCTION};
use crate::llm_client::LlmClient;
use crate::refine::{Stage, TextTransform};

/// Calls the LLM provider once per stage.
#[derive(Clone)]
pub struct LlmTransform {
    llm: LlmClient,
}

impl LlmTransform {
    pub fn new(llm: LlmClient) -> Self {
        Self { llm }
    }
}

#[async_trait]
impl TextTransform for LlmTransform {
    async fn transform(&self, text: &str, stage: Stage) -> Result<String, AppError> {
        let prompt = build_prompt(stage, text);
        let system = build_system(stage);

        let raw = self
            .llm
            .complete(&prompt, &system)
            .await
            .map_err(|e| AppError::TransformUnavailable {
                stage,
                message: e.to_string(),
            })?;
        debug!(stage = %stage, "Raw LLM output: {} chars", raw.len());

        let cleaned = clean_output(&raw);
        if cleaned.is_empty() {
            return Err(AppError::TransformUnavailable {
                stage,
                message: "LLM returned an empty letter".to_string(),
            });
        }

        info!(stage = %stage, "Stage output cleaned: {} -> {} chars", raw.len(), cleaned.len());
        Ok(cleaned)
    }
}

pub fn build_prompt(stage: Stage, text: &str) -> String {
    format!(
        "{}\n\n{}",
        stage.prompt_template().replace("{text}", text),
        STRUCTURE_INSTRUCTION
    )
}

fn build_system(stage: Stage) -> String {
    format!("{} {}", stage.system_prompt(), PLAIN_TEXT_SYSTEM)
}

/// Applies the clean-up rules in order. Returns an empty string when nothing
/// but formatting was left.
pub fn clean_output(raw: &str) -> String {
    let s = normalise_line_endings(raw);
    let s = strip_fences(&s);
    let s = strip_emphasis(&s);
    let s = strip_heading_markers(&s);
    let s = remove_invisible_chars(&s);
    let paragraphs = drop_preamble(split_paragraphs(&s));

    join_paragraphs(
        paragraphs
            .iter()
            .map(|p| p.trim())
            .filter(|p| !p.is_empty()),
    )
}

fn normalise_line_endings(input: &str) -> String {
    input.replace("\r\n", "\n").replace('\r', "\n")
}

static RE_OPENING_FENCE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?m)^```[ \t]*(?:text|markdown|md|docx|doc|plaintext)?[ \t]*$").unwrap());

/// Removes fence lines (with an optional language tag) and any stray backticks triples.
fn strip_fences(input: &str) -> String {
    RE_OPENING_FENCE.replace_all(input, "").replace("```", "")
}

static RE_BOLD_STARS: Lazy<Regex> = Lazy::new(|| Regex::new(r"\*\*([^*\n]+?)\*\*").unwrap());
static RE_BOLD_UNDERSCORES: Lazy<Regex> = Lazy::new(|| Regex::new(r"__([^_\n]+?)__").unwrap());
static RE_ITALIC_STAR: Lazy<Regex> = Lazy::new(|| Regex::new(r"\*([^*\s][^*\n]*?)\*").unwrap());

/// Single underscores are left alone; they appear in addresses and references.
fn strip_emphasis(input: &str) -> String {
    let s = RE_BOLD_STARS.replace_all(input, "$1");
    let s = RE_BOLD_UNDERSCORES.replace_all(&s, "$1");
    RE_ITALIC_STAR.replace_all(&s, "$1").into_owned()
}

static RE_HEADING_MARKER: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?m)^[ \t]*#{1,6}[ \t]+").unwrap());

fn strip_heading_markers(input: &str) -> String {
    RE_HEADING_MARKER.replace_all(input, "").into_owned()
}

/// Zero-width space/joiners, BOM and soft hyphen.
fn remove_invisible_chars(input: &str) -> String {
    input
        .chars()
        .filter(|c| !matches!(c, '\u{200B}' | '\u{200C}' | '\u{200D}' | '\u{FEFF}' | '\u{00AD}'))
        .collect()
}

static RE_PREAMBLE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)^(here is|here's|below is|sure[,!]?)[^\n]*(letter|version|text)[^\n]*:$").unwrap()
});

/// Drops a leading "Here is the revised letter:" line when a letter follows it.
fn drop_preamble(mut paragraphs: Vec<String>) -> Vec<String> {
    if paragraphs.len() > 1 && RE_PREAMBLE.is_match(paragraphs[0].trim()) {
        paragraphs.remove(0);
    }
    paragraphs
}
