/*!
 * Oracle instructions and response interpretation.
 *
 * Prompt text lives here so the relevance filter and the duration converger
 * only deal with requests and parsed answers.
 */

use once_cell::sync::Lazy;
use regex::Regex;

use crate::providers::OracleRequest;
use crate::timeline::{Timeline, TimedUnit};

/// Audience named in prompts when no demographic keywords are given
pub const GENERAL_AUDIENCE: &str = "general audience";

static INDEX_TAG_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"\((\d+)\)").unwrap()
});

/// Instruction template for summary requests.
#[derive(Debug, Clone)]
pub struct SummaryPrompt {
    template: String,
}

impl SummaryPrompt {
    /// The default summary instruction.
    pub const HIGHLIGHT_EDITOR: &'static str = r#"You are editing a highlight reel of a video for a {audience} audience.

The user message lists the video's subtitle lines, one per line, each prefixed with its index in parentheses.

## Task
- Pick the {count} lines that best summarize the video for this audience
- You may reorder lines when that tells the story better
- Skip lines that add nothing for this audience

## Output Requirements
- Reply with exactly {count} lines
- Each line must be in the form `(index) text`, copying the index from the input
- Do not add any commentary before or after the lines"#;

    pub fn new(template: &str) -> Self {
        Self {
            template: template.to_string(),
        }
    }

    pub fn highlight_editor() -> Self {
        Self::new(Self::HIGHLIGHT_EDITOR)
    }

    /// Render the instruction for an audience and a requested line count
    pub fn render(&self, audience: &str, count: usize) -> String {
        self.template
            .replace("{audience}", audience)
            .replace("{count}", &count.to_string())
    }

    /// Build a summary request over the index-tagged timeline text
    pub fn request(&self, keywords: &[String], timeline: &Timeline, target_size: usize) -> OracleRequest {
        OracleRequest::summary(
            target_size,
            self.render(&audience_label(keywords), target_size),
            timeline.to_text(),
        )
    }
}

impl Default for SummaryPrompt {
    fn default() -> Self {
        Self::highlight_editor()
    }
}

/// Instruction template for per-line relevance requests.
#[derive(Debug, Clone)]
pub struct RelevancePrompt {
    template: String,
}

impl RelevancePrompt {
    /// The default relevance instruction.
    pub const AUDIENCE_JUDGE: &'static str = r#"You decide whether a single subtitle line from a video would interest a {audience} audience.

Answer "yes" if the line is relevant to this audience and "no" otherwise. Reply with one word."#;

    pub fn new(template: &str) -> Self {
        Self {
            template: template.to_string(),
        }
    }

    pub fn audience_judge() -> Self {
        Self::new(Self::AUDIENCE_JUDGE)
    }

    pub fn render(&self, audience: &str) -> String {
        self.template.replace("{audience}", audience)
    }

    /// Build a relevance request for one unit
    pub fn request(&self, keywords: &[String], unit: &TimedUnit) -> OracleRequest {
        OracleRequest::relevance(self.render(&audience_label(keywords)), unit.flattened_text())
    }
}

impl Default for RelevancePrompt {
    fn default() -> Self {
        Self::audience_judge()
    }
}

/// Audience description for a keyword set
pub fn audience_label(keywords: &[String]) -> String {
    let keywords: Vec<&str> = keywords
        .iter()
        .map(|k| k.trim())
        .filter(|k| !k.is_empty())
        .collect();

    if keywords.is_empty() {
        GENERAL_AUDIENCE.to_string()
    } else {
        keywords.join(", ")
    }
}

/// Indices tagged as `(<integer>)` in a summary, one per line at most
///
/// Only the first tag on a line counts. Lines without a tag, and tags whose
/// number does not fit a `usize`, are ignored.
pub fn parse_indexed_lines(text: &str) -> Vec<usize> {
    text.lines()
        .filter_map(|line| INDEX_TAG_REGEX.captures(line))
        .filter_map(|caps| caps[1].parse::<usize>().ok())
        .collect()
}

/// Whether a relevance answer is affirmative
pub fn is_affirmative(text: &str) -> bool {
    text.to_lowercase().contains("yes")
}
