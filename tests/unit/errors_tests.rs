/*!
 * Tests for error types
 */

use yashwai::errors::{AppError, MediaError, ProviderError, SubtitleError, SummaryError};

#[test]
fn test_provider_error_display_shouldIncludeDetails() {
    let error = ProviderError::ApiError {
        status_code: 503,
        message: "overloaded".to_string(),
    };
    assert_eq!(error.to_string(), "API responded with error: 503 - overloaded");
}

#[test]
fn test_summary_error_fromProviderError_shouldBeOracleUnavailable() {
    let error: SummaryError = ProviderError::ConnectionError("refused".to_string()).into();

    assert!(matches!(error, SummaryError::OracleUnavailable(ProviderError::ConnectionError(_))));
    assert!(error.to_string().contains("refused"));
}

#[test]
fn test_summary_error_fromSubtitleError_shouldBeDecode() {
    let error: SummaryError = SubtitleError::NoEntries("empty file".to_string()).into();

    assert!(matches!(error, SummaryError::Decode(_)));
    assert!(error.to_string().contains("empty file"));
}

#[test]
fn test_convergence_failure_display_shouldSummarizeLastAttempt() {
    let error = SummaryError::ConvergenceFailure {
        iterations: 10,
        last_requested: 10,
        last_achieved: 0.0,
        target: 20.0,
    };

    let message = error.to_string();
    assert!(message.contains("20.00s"));
    assert!(message.contains("10 iterations"));
}

#[test]
fn test_app_error_conversions_shouldWrapSources() {
    let media: AppError = MediaError::Timeout { tool: "ffmpeg".to_string(), secs: 30 }.into();
    assert_eq!(media.to_string(), "Media error: ffmpeg timed out after 30 seconds");

    let io: AppError = std::io::Error::new(std::io::ErrorKind::NotFound, "gone").into();
    assert!(matches!(io, AppError::File(_)));

    let summary: AppError = SummaryError::EmptySelection("nothing".to_string()).into();
    assert!(matches!(summary, AppError::Summary(_)));
}
