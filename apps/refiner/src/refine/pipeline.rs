//! Refinement pipeline — threads one text value through the fixed stage order.
//!
//! Flow: Document → text → Grammar → Tone → Coherence → Review → Document → render.
//!
//! Strictly sequential: each stage awaits the previous one and consumes its
//! full output. The first error aborts the run; later stages and the output
//! render are never invoked.

use std::sync::Arc;
use std::time::Instant;

use serde::Serialize;
use tracing::{info, warn};

use crate::document::text::{join_paragraphs, reconcile_paragraphs, split_paragraphs};
use crate::document::Document;
use crate::errors::AppError;
use crate::refine::compare::{compare_versions, ChangeReport};
use crate::refine::{Stage, TextTransform};

/// The text as it moves between stages. Replaced wholesale after every stage.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PipelineState {
    /// Last stage that produced `text`; `None` before the first stage.
    pub stage: Option<Stage>,
    pub text: String,
}

impl PipelineState {
    pub fn new(text: String) -> Self {
        Self { stage: None, text }
    }

    fn advance(self, stage: Stage, text: String) -> Self {
        Self {
            stage: Some(stage),
            text,
        }
    }
}

/// Original and final letter. Immutable once produced.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RefinementResult {
    pub original: Document,
    pub refined: Document,
}

impl RefinementResult {
    pub fn refined_text(&self) -> String {
        self.refined.to_text()
    }

    pub fn changes(&self) -> ChangeReport {
        compare_versions(&self.original, &self.refined)
    }
}

/// A refined letter together with its rendered `.docx`.
#[derive(Debug, Clone)]
pub struct RenderedLetter {
    pub result: RefinementResult,
    pub docx: Vec<u8>,
}

#[derive(Clone)]
pub struct Pipeline {
    transform: Arc<dyn TextTransform>,
}

impl Pipeline {
    pub fn new(transform: Arc<dyn TextTransform>) -> Self {
        Self { transform }
    }

    /// Runs every stage over `document`.
    ///
    /// The result always has as many paragraphs as `document`: a stage that
    /// merges or splits paragraphs is realigned against its own input.
    pub async fn run(&self, document: &Document) -> Result<RefinementResult, AppError> {
        let started = Instant::now();
        let mut state = PipelineState::new(document.to_text());

        for stage in Stage::ALL {
            let stage_started = Instant::now();
            info!(stage = %stage, "Stage started ({} chars in)", state.text.len());

            let output = self.transform.transform(&state.text, stage).await?;
            if output.trim().is_empty() {
                return Err(AppError::TransformUnavailable {
                    stage,
                    message: "stage returned empty text".to_string(),
                });
            }

            let text = keep_structure(stage, &state.text, output);
            info!(
                stage = %stage,
                "Stage finished in {}ms ({} chars out)",
                stage_started.elapsed().as_millis(),
                text.len()
            );
            state = state.advance(stage, text);
        }

        if let Some(last) = state.stage {
            info!(
                last_stage = %last,
                "Pipeline finished in {}ms",
                started.elapsed().as_millis()
            );
        }

        Ok(RefinementResult {
            original: document.clone(),
            refined: document.with_refined_text(&state.text),
        })
    }

    /// Runs the stages, then hands the refined document to `render`.
    /// `render` is not called when any stage fails.
    pub async fn refine_letter<R>(
        &self,
        document: &Document,
        render: R,
    ) -> Result<RenderedLetter, AppError>
    where
        R: FnOnce(&Document) -> Result<Vec<u8>, AppError>,
    {
        let result = self.run(document).await?;
        let docx = render(&result.refined)?;
        Ok(RenderedLetter { result, docx })
    }
}

/// Returns `output` unchanged when its paragraph count matches `input`,
/// otherwise the realigned paragraphs.
fn keep_structure(stage: Stage, input: &str, output: String) -> String {
    let expected = split_paragraphs(input);
    let produced = split_paragraphs(&output);
    if produced.len() == expected.len() {
        return output;
    }

    warn!(
        stage = %stage,
        "Stage changed paragraph count {} -> {}; restoring structure",
        expected.len(),
        produced.len()
    );
    let restored = reconcile_paragraphs(&expected, produced);
    join_paragraphs(restored.iter().map(String::as_str))
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;

    use crate::document::{read_docx, write_docx, Paragraph, ParagraphStyle};

    struct Echo;

    #[async_trait]
    impl TextTransform for Echo {
        async fn transform(&self, text: &str, _stage: Stage) -> Result<String, AppError> {
            Ok(text.to_string())
        }
    }

    /// Records every call and applies a per-stage rewrite.
    struct Scripted {
        calls: Mutex<Vec<(Stage, String)>>,
        rewrite: fn(Stage, &str) -> Result<String, AppError>,
    }

    impl Scripted {
        fn new(rewrite: fn(Stage, &str) -> Result<String, AppError>) -> Self {
            Self {
                calls: Mutex::new(Vec::new()),
                rewrite,
            }
        }

        fn stages(&self) -> Vec<Stage> {
            self.calls.lock().unwrap().iter().map(|(s, _)| *s).collect()
        }
    }

    #[async_trait]
    impl TextTransform for Scripted {
        async fn transform(&self, text: &str, stage: Stage) -> Result<String, AppError> {
            self.calls.lock().unwrap().push((stage, text.to_string()));
            (self.rewrite)(stage, text)
        }
    }

    fn letter() -> Document {
        Document::new(vec![
            Paragraph {
                text: "Re: Office Move".to_string(),
                style: ParagraphStyle {
                    style_id: Some("Heading1".to_string()),
                    ..ParagraphStyle::default()
                },
            },
            Paragraph::plain("Dear team,"),
            Paragraph::plain("\tWe is moving to the new office on Monday."),
            Paragraph::plain("Regards,\nJane"),
        ])
    }

    #[tokio::test]
    async fn test_identity_stages_compose_to_identity() {
        let doc = letter();
        let result = Pipeline::new(Arc::new(Echo)).run(&doc).await.unwrap();
        assert_eq!(result.refined_text(), doc.to_text());
        assert_eq!(result.refined, doc);
    }

    #[tokio::test]
    async fn test_stages_run_in_order_on_previous_output() {
        let transform = Arc::new(Scripted::new(|stage, text| {
            Ok(format!("{text} [{stage}]"))
        }));
        let doc = Document::from_texts(["Hello"]);

        let result = Pipeline::new(transform.clone()).run(&doc).await.unwrap();

        assert_eq!(transform.stages(), Stage::ALL.to_vec());
        let calls = transform.calls.lock().unwrap();
        assert_eq!(calls[1].1, "Hello [Grammar]");
        assert_eq!(calls[3].1, "Hello [Grammar] [Tone] [Coherence]");
        assert_eq!(
            result.refined_text(),
            "Hello [Grammar] [Tone] [Coherence] [Review]"
        );
    }

    #[tokio::test]
    async fn test_paragraph_count_is_preserved_when_a_stage_merges() {
        let transform = Arc::new(Scripted::new(|stage, text| match stage {
            Stage::Tone => Ok(text.replace("\n\n", " ")),
            _ => Ok(text.to_string()),
        }));
        let doc = letter();

        let result = Pipeline::new(transform).run(&doc).await.unwrap();

        assert_eq!(result.refined.len(), doc.len());
        assert_eq!(result.refined.paragraphs[0].style, doc.paragraphs[0].style);
    }

    #[tokio::test]
    async fn test_paragraph_count_is_preserved_when_a_stage_splits() {
        let transform = Arc::new(Scripted::new(|stage, text| match stage {
            Stage::Coherence => Ok(format!("{text}\n\nP.S. See you there.")),
            _ => Ok(text.to_string()),
        }));
        let doc = letter();

        let result = Pipeline::new(transform).run(&doc).await.unwrap();

        assert_eq!(result.refined.len(), doc.len());
        assert_eq!(
            result.refined.paragraphs[3].text,
            "Regards,\nJane\nP.S. See you there."
        );
    }

    #[tokio::test]
    async fn test_failing_stage_halts_pipeline_without_render() {
        let transform = Arc::new(Scripted::new(|stage, text| match stage {
            Stage::Tone => Err(AppError::TransformUnavailable {
                stage,
                message: "API error (status 401): invalid x-api-key".to_string(),
            }),
            _ => Ok(text.to_string()),
        }));
        let renders = AtomicUsize::new(0);

        let err = Pipeline::new(transform.clone())
            .refine_letter(&letter(), |doc| {
                renders.fetch_add(1, Ordering::SeqCst);
                write_docx(doc)
            })
            .await
            .unwrap_err();

        assert_eq!(renders.load(Ordering::SeqCst), 0);
        assert_eq!(transform.stages(), vec![Stage::Grammar, Stage::Tone]);
        assert_eq!(
            err.to_string(),
            "Tone stage unavailable: API error (status 401): invalid x-api-key"
        );
    }

    #[tokio::test]
    async fn test_empty_stage_output_is_transform_unavailable() {
        let transform = Arc::new(Scripted::new(|stage, text| match stage {
            Stage::Review => Ok("   ".to_string()),
            _ => Ok(text.to_string()),
        }));

        let err = Pipeline::new(transform).run(&letter()).await.unwrap_err();

        assert!(matches!(
            err,
            AppError::TransformUnavailable {
                stage: Stage::Review,
                ..
            }
        ));
    }

    #[tokio::test]
    async fn test_grammar_fix_flows_to_single_paragraph_docx() {
        let transform = Arc::new(Scripted::new(|stage, text| match stage {
            Stage::Grammar => Ok("Dear Sir, I am writing to you.".to_string()),
            _ => Ok(text.to_string()),
        }));
        let doc = Document::from_texts(["Dear Sir, I are writing to you."]);

        let letter = Pipeline::new(transform)
            .refine_letter(&doc, write_docx)
            .await
            .unwrap();

        assert_eq!(letter.result.refined_text(), "Dear Sir, I am writing to you.");
        let downloaded = read_docx(&letter.docx).unwrap();
        assert_eq!(downloaded.texts(), vec!["Dear Sir, I am writing to you."]);
    }

    #[tokio::test]
    async fn test_output_paragraph_count_matches_input_through_docx() {
        let doc = letter();
        let bytes = write_docx(&doc).unwrap();
        let input = read_docx(&bytes).unwrap();

        let letter = Pipeline::new(Arc::new(Echo))
            .refine_letter(&input, write_docx)
            .await
            .unwrap();

        assert_eq!(read_docx(&letter.docx).unwrap().len(), input.len());
    }

    #[test]
    fn test_state_is_replaced_per_stage() {
        let state = PipelineState::new("a".to_string());
        assert_eq!(state.stage, None);
        let next = state.advance(Stage::Grammar, "b".to_string());
        assert_eq!(next.stage, Some(Stage::Grammar));
        assert_eq!(next.text, "b");
    }
}
