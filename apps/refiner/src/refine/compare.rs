//! Before/after change report shown next to the two versions of the letter.

use std::cmp::Ordering;

use serde::Serialize;

use crate::document::Document;

pub const NO_CHANGES_SUMMARY: &str = "No significant changes were required. \
    The document already meets professional standards.";

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ParagraphChange {
    /// 1-based paragraph number.
    pub paragraph: usize,
    pub original: String,
    pub refined: String,
    pub note: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ChangeReport {
    pub summary: String,
    pub changes: Vec<ParagraphChange>,
}

/// Pairs paragraphs by position and reports those whose trimmed text differs.
pub fn compare_versions(original: &Document, refined: &Document) -> ChangeReport {
    let changes: Vec<ParagraphChange> = original
        .paragraphs
        .iter()
        .zip(&refined.paragraphs)
        .enumerate()
        .filter_map(|(index, (before, after))| {
            let before = before.text.trim();
            let after = after.text.trim();
            if before == after {
                return None;
            }
            Some(ParagraphChange {
                paragraph: index + 1,
                original: before.to_string(),
                refined: after.to_string(),
                note: change_note(before, after).to_string(),
            })
        })
        .collect();

    let summary = if changes.is_empty() {
        NO_CHANGES_SUMMARY.to_string()
    } else {
        let points: Vec<String> = changes
            .iter()
            .map(|c| format!("- Paragraph {}: {}", c.paragraph, c.note))
            .collect();
        format!("The following improvements were made:\n{}", points.join("\n"))
    };

    ChangeReport { summary, changes }
}

fn change_note(before: &str, after: &str) -> &'static str {
    match after.chars().count().cmp(&before.chars().count()) {
        Ordering::Greater => "Expanded for clarity and detail",
        Ordering::Less => "Condensed for conciseness",
        Ordering::Equal => "Refined for improved clarity and professionalism",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_no_changes() {
        let doc = Document::from_texts(["Dear Sir,", "Thank you."]);
        let report = compare_versions(&doc, &doc.clone());
        assert!(report.changes.is_empty());
        assert_eq!(report.summary, NO_CHANGES_SUMMARY);
    }

    #[test]
    fn test_whitespace_only_difference_is_not_a_change() {
        let before = Document::from_texts(["Dear Sir, "]);
        let after = Document::from_texts(["Dear Sir,"]);
        assert!(compare_versions(&before, &after).changes.is_empty());
    }

    #[test]
    fn test_notes_by_length() {
        let before = Document::from_texts(["I are here.", "Very very long text.", "abc"]);
        let after = Document::from_texts(["I am here, as promised.", "Short text.", "xyz"]);

        let report = compare_versions(&before, &after);

        assert_eq!(report.changes.len(), 3);
        assert_eq!(report.changes[0].note, "Expanded for clarity and detail");
        assert_eq!(report.changes[1].note, "Condensed for conciseness");
        assert_eq!(
            report.changes[2].note,
            "Refined for improved clarity and professionalism"
        );
        assert_eq!(
            report.summary,
            "The following improvements were made:\n\
             - Paragraph 1: Expanded for clarity and detail\n\
             - Paragraph 2: Condensed for conciseness\n\
             - Paragraph 3: Refined for improved clarity and professionalism"
        );
    }

    #[test]
    fn test_only_changed_paragraphs_are_listed() {
        let before = Document::from_texts(["Same.", "I are writing."]);
        let after = Document::from_texts(["Same.", "I am writing."]);
        let report = compare_versions(&before, &after);
        assert_eq!(report.changes.len(), 1);
        assert_eq!(report.changes[0].paragraph, 2);
        assert_eq!(report.changes[0].original, "I are writing.");
        assert_eq!(report.changes[0].refined, "I am writing.");
    }
}
