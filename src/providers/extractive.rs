/*!
 * Offline extractive oracle.
 *
 * Summaries are built without any model server: lines are picked greedily so
 * that the word distribution of the picked lines stays as close as possible
 * (in KL divergence) to the word distribution of the whole corpus. Picked
 * lines are returned in corpus order as `(index) text`.
 *
 * Relevance requests have no audience model behind them; a line is judged
 * relevant when it carries at least one content word.
 */

use async_trait::async_trait;
use log::debug;
use once_cell::sync::Lazy;
use regex::Regex;
use std::collections::{HashMap, HashSet};

use crate::errors::ProviderError;
use super::{Oracle, OracleRequest, RequestKind};

static INDEXED_LINE_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^\s*\((\d+)\)\s*(.*)$").unwrap()
});

static WORD_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"[\p{L}\p{N}]+(?:'[\p{L}]+)?").unwrap()
});

/// English function words ignored when comparing distributions
const STOP_WORDS: &[&str] = &[
    "a", "about", "after", "again", "all", "am", "an", "and", "any", "are", "as", "at", "be",
    "because", "been", "before", "being", "but", "by", "can", "could", "did", "do", "does",
    "doing", "don't", "down", "for", "from", "had", "has", "have", "having", "he", "her", "here",
    "him", "his", "how", "i", "i'm", "if", "in", "into", "is", "it", "it's", "its", "just", "me",
    "more", "my", "no", "not", "now", "of", "off", "oh", "ok", "okay", "on", "once", "only", "or",
    "other", "our", "out", "over", "own", "same", "she", "so", "some", "such", "than", "that",
    "that's", "the", "their", "them", "then", "there", "these", "they", "this", "those", "to",
    "too", "up", "very", "was", "we", "were", "what", "when", "where", "which", "while", "who",
    "why", "will", "with", "would", "yeah", "yes", "you", "your",
];

static STOP_WORD_SET: Lazy<HashSet<&'static str>> = Lazy::new(|| STOP_WORDS.iter().copied().collect());

/// One `(index) text` line of the corpus
#[derive(Debug, Clone)]
struct Sentence {
    index: usize,
    text: String,
    words: Vec<String>,
}

/// Lowercased content words of a line
pub fn content_words(text: &str) -> Vec<String> {
    WORD_REGEX
        .find_iter(text)
        .map(|m| m.as_str().to_lowercase())
        .filter(|word| !STOP_WORD_SET.contains(word.as_str()))
        .collect()
}

/// Greedy KL-sum summarizer acting as an oracle
#[derive(Debug, Clone, Default)]
pub struct ExtractiveOracle;

impl ExtractiveOracle {
    pub fn new() -> Self {
        Self
    }

    fn parse_corpus(context: &str) -> Vec<Sentence> {
        context
            .lines()
            .filter_map(|line| INDEXED_LINE_REGEX.captures(line))
            .filter_map(|caps| {
                let index = caps[1].parse::<usize>().ok()?;
                let text = caps[2].trim().to_string();
                Some(Sentence {
                    index,
                    words: content_words(&text),
                    text,
                })
            })
            .collect()
    }

    /// `KL(summary || corpus)` for the current summary extended by a candidate line
    fn divergence(
        corpus_freq: &HashMap<String, f64>,
        summary_counts: &HashMap<String, usize>,
        summary_total: usize,
        candidate: &[String],
    ) -> f64 {
        let total = (summary_total + candidate.len()) as f64;
        let mut counts: HashMap<&str, usize> = summary_counts
            .iter()
            .map(|(word, count)| (word.as_str(), *count))
            .collect();
        for word in candidate {
            *counts.entry(word.as_str()).or_insert(0) += 1;
        }

        counts
            .into_iter()
            .filter_map(|(word, count)| {
                let corpus = *corpus_freq.get(word)?;
                let summary = count as f64 / total;
                Some(summary * (summary / corpus).ln())
            })
            .sum()
    }

    /// Pick up to `count` lines and render them in corpus order
    pub fn summarize(&self, context: &str, count: usize) -> String {
        let sentences = Self::parse_corpus(context);

        let corpus_words: Vec<&String> = sentences.iter().flat_map(|s| s.words.iter()).collect();
        let corpus_total = corpus_words.len().max(1) as f64;
        let mut corpus_freq: HashMap<String, f64> = HashMap::new();
        for word in corpus_words {
            *corpus_freq.entry(word.clone()).or_insert(0.0) += 1.0 / corpus_total;
        }

        let mut remaining: Vec<usize> = (0..sentences.len()).collect();
        let mut picked: Vec<usize> = Vec::new();
        let mut summary_counts: HashMap<String, usize> = HashMap::new();
        let mut summary_total = 0;

        while picked.len() < count && !remaining.is_empty() {
            let mut best: Option<(usize, f64)> = None;
            for (slot, &candidate) in remaining.iter().enumerate() {
                let words = &sentences[candidate].words;
                // Lines without content words only fill up what is left
                let score = if words.is_empty() {
                    f64::INFINITY
                } else {
                    Self::divergence(&corpus_freq, &summary_counts, summary_total, words)
                };
                if best.is_none_or(|(_, best_score)| score < best_score) {
                    best = Some((slot, score));
                }
            }

            let Some((slot, _)) = best else { break };
            let chosen = remaining.remove(slot);
            for word in &sentences[chosen].words {
                *summary_counts.entry(word.clone()).or_insert(0) += 1;
            }
            summary_total += sentences[chosen].words.len();
            picked.push(chosen);
        }

        picked.sort_unstable();
        debug!("Extractive summary picked {} of {} lines", picked.len(), sentences.len());

        picked
            .into_iter()
            .map(|position| format!("({}) {}", sentences[position].index, sentences[position].text))
            .collect::<Vec<_>>()
            .join("\n")
    }
}

#[async_trait]
impl Oracle for ExtractiveOracle {
    async fn query(&self, request: &OracleRequest) -> Result<String, ProviderError> {
        match request.kind {
            RequestKind::Summary { target_size } => Ok(self.summarize(&request.context, target_size)),
            RequestKind::Relevance => {
                let answer = if content_words(&request.context).is_empty() { "no" } else { "yes" };
                Ok(answer.to_string())
            }
        }
    }

    fn describe(&self) -> String {
        "extractive KL-sum summarizer (offline)".to_string()
    }
}
