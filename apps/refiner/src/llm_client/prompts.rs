// Shared prompt fragments used by every refinement stage.
// Stage-specific instructions live in refine/prompts.rs.

/// System prompt fragment that enforces plain-text letter output.
pub const PLAIN_TEXT_SYSTEM: &str = "\
    You MUST respond with the complete revised letter only. \
    Do NOT include any commentary, headings, or explanations before or after the letter. \
    Do NOT use markdown formatting or code fences. \
    Do NOT add placeholders such as [Your Name] that are not in the original.";

/// Appended to every stage prompt so paragraph boundaries survive the round trip.
pub const STRUCTURE_INSTRUCTION: &str = "\
    CRITICAL: The letter below has its paragraphs separated by a single blank line. \
    Return EXACTLY the same number of paragraphs, in the same order, separated by a single blank line. \
    Never merge, split, reorder, add, or remove paragraphs. Rewrite only the text inside each paragraph.";
