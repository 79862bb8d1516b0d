// Shared prompt fragments. Each pipeline stage keeps its own prompt
// templates next to the code that fills them in.

/// System prompt for every completion the pipeline issues: plain text only.
pub const PLAIN_TEXT_SYSTEM: &str = "You are a precise resume-writing assistant. \
    Respond with plain text only. \
    Do NOT use JSON or markdown code fences. \
    Do NOT include introductions, explanations, or apologies.";

/// Appended to rewriting prompts so generated bullets stay factual.
pub const GROUNDING_INSTRUCTION: &str = "\
    CRITICAL: Only use facts present in the work experience text. \
    Do NOT invent employers, titles, dates, or numbers. \
    If a metric is not in the source, describe the outcome without one.";
