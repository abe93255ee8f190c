/*!
 * Tests for oracle backends and the retry decorator
 */

use std::sync::Arc;

use yashwai::errors::ProviderError;
use yashwai::providers::anthropic::{AnthropicOracle, AnthropicResponse};
use yashwai::providers::extractive::ExtractiveOracle;
use yashwai::providers::mock::MockOracle;
use yashwai::providers::ollama::{normalize_endpoint, parse_generation_body};
use yashwai::providers::retry::RetryingOracle;
use yashwai::providers::{Oracle, OracleRequest};
use yashwai::summary::DurationConverger;

use crate::common;

#[test]
fn test_normalize_endpoint_withBareHost_shouldAddSchemeAndPort() {
    assert_eq!(normalize_endpoint("localhost:11434").unwrap(), "http://localhost:11434");
    assert_eq!(normalize_endpoint("https://llm.example.com").unwrap(), "https://llm.example.com:443");
    assert!(matches!(normalize_endpoint("  "), Err(ProviderError::RequestFailed(_))));
}

#[test]
fn test_parse_generation_body_withStreamedChunks_shouldConcatenate() {
    let body = r#"{"model":"llama3.2:3b","response":"(1) Hello","done":false}
{"model":"llama3.2:3b","response":"\n(4) World","done":false}
{"model":"llama3.2:3b","response":"","done":true,"prompt_eval_count":40,"eval_count":7}
"#;

    let parsed = parse_generation_body(body).unwrap();

    assert_eq!(parsed.response, "(1) Hello\n(4) World");
    assert!(parsed.done);
    assert_eq!(parsed.eval_count, Some(7));
}

#[test]
fn test_parse_generation_body_withGarbage_shouldBeParseError() {
    assert!(matches!(parse_generation_body("<html>oops</html>"), Err(ProviderError::ParseError(_))));
}

#[test]
fn test_extract_text_from_response_shouldJoinTextBlocks() {
    let json = r#"{
        "content": [
            {"type": "text", "text": "(2) First"},
            {"type": "tool_use"},
            {"type": "text", "text": "\n(5) Second"}
        ],
        "usage": {"input_tokens": 120, "output_tokens": 9}
    }"#;
    let response: AnthropicResponse = serde_json::from_str(json).unwrap();

    assert_eq!(AnthropicOracle::extract_text_from_response(&response), "(2) First\n(5) Second");
}

#[test]
fn test_to_prompt_shouldJoinInstructionAndContext() {
    let request = OracleRequest::relevance("Is this relevant?", "We build a PC");
    assert_eq!(request.to_prompt(), "Is this relevant?\n\nWe build a PC");
}

#[tokio::test]
async fn test_retrying_oracle_withTransientFailures_shouldRetryUntilBudget() {
    let oracle = RetryingOracle::new(MockOracle::failing(), 2, 1);
    let request = OracleRequest::relevance("Relevant?", "Text");

    let result = oracle.query(&request).await;

    assert!(matches!(result, Err(ProviderError::ApiError { status_code: 500, .. })));
    assert_eq!(oracle.inner().request_count(), 3);
}

#[tokio::test]
async fn test_retrying_oracle_overSharedBackend_shouldForwardDescription() {
    let backend: Arc<dyn Oracle> = Arc::new(MockOracle::consecutive());
    let oracle = RetryingOracle::new(backend, 3, 1);

    assert!(oracle.describe().contains("up to 3 retries"));
    assert!(oracle.test_connection().await.is_ok());
}

#[test]
fn test_is_transient_shouldClassifyErrors() {
    let transient = [
        ProviderError::ConnectionError("refused".to_string()),
        ProviderError::ApiError { status_code: 429, message: "slow down".to_string() },
        ProviderError::ApiError { status_code: 503, message: "busy".to_string() },
    ];
    let permanent = [
        ProviderError::ApiError { status_code: 400, message: "bad".to_string() },
        ProviderError::ParseError("json".to_string()),
    ];

    assert!(transient.iter().all(RetryingOracle::<MockOracle>::is_transient));
    assert!(!permanent.iter().any(RetryingOracle::<MockOracle>::is_transient));
}

#[tokio::test]
async fn test_mock_oracle_withEmptyBehavior_shouldReturnEmptyText() {
    let oracle = MockOracle::empty();
    let answer = oracle.query(&OracleRequest::summary(3, "Summarize", "(0) a")).await.unwrap();
    assert!(answer.is_empty());
}

#[tokio::test]
async fn test_extractive_oracle_withSummaryRequest_shouldReturnIndexedLines() {
    let oracle = ExtractiveOracle::new();
    let request = OracleRequest::summary(
        2,
        "Pick 2 lines",
        "(0) The graphics card runs cool\n(3) Oh yeah\n(5) This graphics card is fast\n",
    );

    let answer = oracle.query(&request).await.unwrap();

    let lines: Vec<&str> = answer.lines().collect();
    assert_eq!(lines, vec!["(0) The graphics card runs cool", "(5) This graphics card is fast"]);
}

#[tokio::test]
async fn test_extractive_oracle_withRelevanceRequest_shouldRejectFiller() {
    let oracle = ExtractiveOracle::new();

    let filler = oracle.query(&OracleRequest::relevance("Relevant?", "Oh, yeah.")).await.unwrap();
    let content = oracle.query(&OracleRequest::relevance("Relevant?", "We baked bread")).await.unwrap();

    assert_eq!(filler, "no");
    assert_eq!(content, "yes");
}

#[tokio::test]
async fn test_extractive_oracle_withConverger_shouldHitTargetOffline() {
    let timeline = common::uniform_timeline(10, 5);

    let summary = DurationConverger::default()
        .converge(&ExtractiveOracle::new(), &timeline, &[], 20.0)
        .await
        .unwrap();

    assert_eq!(summary.iterations, 1);
    assert_eq!(summary.selection.len(), 4);
    assert_eq!(summary.achieved_secs, 20.0);
    // Extractive picks come back in timeline order
    let indices = summary.selection.indices().to_vec();
    let mut sorted = indices.clone();
    sorted.sort_unstable();
    assert_eq!(indices, sorted);
}
