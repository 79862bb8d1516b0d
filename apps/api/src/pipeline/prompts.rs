// Prompt templates for the analysis and rewriting stages.
// Shared system prompt and grounding fragment live in llm_client::prompts.

/// Key-sentence extraction. Replace `{title}` and `{description}`.
pub const KEY_SENTENCES_PROMPT_TEMPLATE: &str = r#"Analyze the following job description and extract the 10 most important sentences that define the core responsibilities, requirements, and expectations for this role.

Focus on:
- Key technical skills and qualifications
- Primary job responsibilities
- Important experience requirements
- Critical performance expectations
- Essential competencies

Job Title: {title}

Job Description:
{description}

Provide exactly 10 sentences taken from the original job description text, ranked by importance (1 being most important). Format as a simple numbered list:

1. [First sentence]
2. [Second sentence]
3. [Third sentence]
..."#;

/// Keyword grouping. Replace `{title}` and `{key_sentences}`.
pub const KEYWORDS_PROMPT_TEMPLATE: &str = r#"Based on the following key sentences extracted from a job description and the job title, identify the 3 most important groups of keywords (3 keywords per group) that represent the core competencies and requirements for this role.

Job Title: {title}

Key Sentences:
{key_sentences}

Provide exactly 3 groups with exactly 3 related keywords each, in this format:

Group 1: [Theme Name]
1. Keyword 1
2. Keyword 2
3. Keyword 3

Group 2: [Theme Name]
1. Keyword 1
2. Keyword 2
3. Keyword 3

Group 3: [Theme Name]
1. Keyword 1
2. Keyword 2
3. Keyword 3

Focus on the most critical skills, technologies, and competencies mentioned in the key sentences."#;

/// Experience rewrite. Replace `{grounding_instruction}`, `{keywords}` and
/// `{experience}`.
pub const REWRITE_PROMPT_TEMPLATE: &str = r#"{grounding_instruction}

Here is a work experience. Decide which of the target keywords best match it (do not explain the choice). Then rewrite the experience as 3 concise, resume-ready bullet points aimed at those keywords. Each bullet must start with a strong action verb and keep any specific numbers from the source. Wrap the most important metric or technology of each bullet in **double asterisks**.

Return only the 3 bullets, one per line, each starting with "- ". No headings, no introductory text.

Work Experience:
{experience}

Target Keywords:
{keywords}"#;

pub fn key_sentences_prompt(title: &str, description: &str) -> String {
    KEY_SENTENCES_PROMPT_TEMPLATE
        .replace("{title}", title)
        .replace("{description}", description)
}

pub fn keywords_prompt(title: &str, key_sentences: &[String]) -> String {
    KEYWORDS_PROMPT_TEMPLATE
        .replace("{title}", title)
        .replace("{key_sentences}", &numbered(key_sentences))
}

pub fn rewrite_prompt(grounding: &str, keywords: &[String], experience: &str) -> String {
    let keywords = if keywords.is_empty() {
        "(none supplied; emphasise the strongest achievements)".to_string()
    } else {
        keywords.join(", ")
    };
    REWRITE_PROMPT_TEMPLATE
        .replace("{grounding_instruction}", grounding)
        .replace("{keywords}", &keywords)
        .replace("{experience}", experience)
}

fn numbered(items: &[String]) -> String {
    items
        .iter()
        .enumerate()
        .map(|(i, item)| format!("{}. {}", i + 1, item))
        .collect::<Vec<_>>()
        .join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_keywords_prompt_numbers_key_sentences() {
        let prompt = keywords_prompt(
            "Platform Engineer",
            &["Own the CI fleet.".to_string(), "Write Rust.".to_string()],
        );
        assert!(prompt.contains("Job Title: Platform Engineer"));
        assert!(prompt.contains("1. Own the CI fleet.\n2. Write Rust."));
    }

    #[test]
    fn test_rewrite_prompt_fills_every_placeholder() {
        let prompt = rewrite_prompt("GROUND", &["Rust".to_string(), "Kafka".to_string()], "Built a queue");
        assert!(prompt.starts_with("GROUND"));
        assert!(prompt.contains("Rust, Kafka"));
        assert!(prompt.contains("Built a queue"));
        assert!(!prompt.contains('{'));
    }
}
