//! Plain-text representation of a letter and the paragraph-structure guard.
//!
//! Paragraphs are separated by one blank line. A paragraph may contain single
//! line breaks (from `w:br`) but never a whitespace-only line.

/// Joins paragraphs with a single blank line.
pub fn join_paragraphs<'a, I>(paragraphs: I) -> String
where
    I: IntoIterator<Item = &'a str>,
{
    paragraphs.into_iter().collect::<Vec<_>>().join("\n\n")
}

/// Splits text on whitespace-only lines. Empty blocks are dropped.
pub fn split_paragraphs(text: &str) -> Vec<String> {
    let mut paragraphs = Vec::new();
    let mut current: Vec<&str> = Vec::new();

    for line in text.lines() {
        if line.trim().is_empty() {
            if !current.is_empty() {
                paragraphs.push(current.join("\n"));
                current.clear();
            }
        } else {
            current.push(line);
        }
    }
    if !current.is_empty() {
        paragraphs.push(current.join("\n"));
    }

    paragraphs
}

/// Drops whitespace-only lines so the paragraph survives a join/split round trip.
pub fn normalize_paragraph(text: &str) -> String {
    text.lines()
        .filter(|line| !line.trim().is_empty())
        .collect::<Vec<_>>()
        .join("\n")
}

/// Forces `candidate` to have exactly `reference.len()` paragraphs without reordering.
///
/// Missing trailing paragraphs are taken from `reference`; extra trailing
/// paragraphs are folded into the last one as line breaks.
pub fn reconcile_paragraphs(reference: &[String], mut candidate: Vec<String>) -> Vec<String> {
    let expected = reference.len();

    if candidate.len() < expected {
        let have = candidate.len();
        candidate.extend(reference[have..].iter().cloned());
    } else if candidate.len() > expected {
        if expected == 0 {
            return Vec::new();
        }
        let overflow = candidate.split_off(expected - 1).join("\n");
        candidate.push(overflow);
    }

    candidate
}
