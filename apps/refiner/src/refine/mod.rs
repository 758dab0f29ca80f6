// Letter refinement: four fixed LLM-backed stages composed in order.
// All provider calls go through llm_client — stages only build prompts.

pub mod compare;
pub mod pipeline;
pub mod prompts;
pub mod transform;

use std::fmt;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::errors::AppError;

pub use compare::ParagraphChange;
pub use pipeline::Pipeline;
pub use transform::LlmTransform;

/// One refinement step. The set is closed and the order is fixed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Stage {
    Grammar,
    Tone,
    Coherence,
    Review,
}

impl Stage {
    /// Pipeline order.
    pub const ALL: [Stage; 4] = [Stage::Grammar, Stage::Tone, Stage::Coherence, Stage::Review];

    pub fn system_prompt(self) -> &'static str {
        match self {
            Stage::Grammar => prompts::GRAMMAR_SYSTEM,
            Stage::Tone => prompts::TONE_SYSTEM,
            Stage::Coherence => prompts::COHERENCE_SYSTEM,
            Stage::Review => prompts::REVIEW_SYSTEM,
        }
    }

    pub fn prompt_template(self) -> &'static str {
        match self {
            Stage::Grammar => prompts::GRAMMAR_PROMPT,
            Stage::Tone => prompts::TONE_PROMPT,
            Stage::Coherence => prompts::COHERENCE_PROMPT,
            Stage::Review => prompts::REVIEW_PROMPT,
        }
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Stage::Grammar => "Grammar",
            Stage::Tone => "Tone",
            Stage::Coherence => "Coherence",
            Stage::Review => "Review",
        };
        f.write_str(name)
    }
}

/// A text rewrite for one stage. Implement this to swap the provider
/// (or a test double) without touching the pipeline or handlers.
///
/// Contract: returns non-empty text, or `TransformUnavailable` tagged with `stage`.
#[async_trait]
pub trait TextTransform: Send + Sync {
    async fn transform(&self, text: &str, stage: Stage) -> Result<String, AppError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stage_order_is_fixed() {
        assert_eq!(
            Stage::ALL,
            [Stage::Grammar, Stage::Tone, Stage::Coherence, Stage::Review]
        );
    }

    #[test]
    fn test_every_stage_prompt_has_text_slot() {
        for stage in Stage::ALL {
            assert!(
                stage.prompt_template().contains("{text}"),
                "{stage} prompt must embed the letter"
            );
            assert!(!stage.system_prompt().is_empty());
        }
    }

    #[test]
    fn test_stage_serializes_lowercase() {
        assert_eq!(serde_json::to_string(&Stage::Coherence).unwrap(), "\"coherence\"");
        assert_eq!(Stage::Coherence.to_string(), "Coherence");
    }
}
