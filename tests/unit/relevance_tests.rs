/*!
 * Tests for the concurrent relevance filter
 */

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use yashwai::errors::SummaryError;
use yashwai::providers::mock::MockOracle;
use yashwai::summary::RelevanceFilter;
use yashwai::timeline::{TimedUnit, Timeline, Timestamp};

fn mixed_timeline(count: usize) -> Timeline {
    Timeline::new(
        (0..count)
            .map(|i| {
                let text = if i % 2 == 0 {
                    format!("Line {} about gaming", i)
                } else {
                    format!("Line {} about cooking", i)
                };
                TimedUnit::new(
                    i,
                    text,
                    Timestamp::from_millis(i as u64 * 2000),
                    Timestamp::from_millis(i as u64 * 2000 + 1500),
                )
            })
            .collect(),
    )
}

fn indices(timeline: &Timeline) -> Vec<usize> {
    timeline.units().iter().map(|u| u.index).collect()
}

#[tokio::test]
async fn test_filter_withJitter_shouldPreserveTimelineOrder() {
    let timeline = mixed_timeline(20);
    let expected: Vec<usize> = (0..20).step_by(2).collect();

    for _ in 0..3 {
        let oracle = MockOracle::consecutive()
            .with_relevance_keywords(["gaming"])
            .with_jitter(15);

        let filtered = RelevanceFilter::new(8)
            .filter(&oracle, &timeline, &["gamers".to_string()])
            .await
            .unwrap();

        assert_eq!(indices(&filtered), expected);
        assert_eq!(oracle.request_count(), 20);
    }
}

#[tokio::test]
async fn test_filter_shouldKeepOriginalRangesOfKeptUnits() {
    let timeline = mixed_timeline(4);
    let oracle = MockOracle::consecutive().with_relevance_keywords(["cooking"]);

    let filtered = RelevanceFilter::default().filter(&oracle, &timeline, &[]).await.unwrap();

    assert_eq!(indices(&filtered), vec![1, 3]);
    assert_eq!(filtered.units()[0].start, Timestamp::from_millis(2000));
    assert_eq!(filtered.to_text(), "(1) Line 1 about cooking\n(3) Line 3 about cooking\n");
}

#[tokio::test]
async fn test_filter_withProgress_shouldReportEveryAnswer() {
    let timeline = mixed_timeline(9);
    let oracle = MockOracle::consecutive();
    let calls = Arc::new(AtomicUsize::new(0));
    let highest = Arc::new(AtomicUsize::new(0));

    let progress_calls = calls.clone();
    let progress_highest = highest.clone();
    let filtered = RelevanceFilter::new(3)
        .filter_with_progress(&oracle, &timeline, &[], move |done, total| {
            assert_eq!(total, 9);
            progress_calls.fetch_add(1, Ordering::SeqCst);
            progress_highest.fetch_max(done, Ordering::SeqCst);
        })
        .await
        .unwrap();

    assert_eq!(filtered.unit_count(), 9);
    assert_eq!(calls.load(Ordering::SeqCst), 9);
    assert_eq!(highest.load(Ordering::SeqCst), 9);
}

#[tokio::test]
async fn test_filter_withIntermittentFailure_shouldAbortWholeStage() {
    let timeline = mixed_timeline(12);
    let oracle = MockOracle::intermittent(3);

    let result = RelevanceFilter::new(1).filter(&oracle, &timeline, &[]).await;

    assert!(matches!(result, Err(SummaryError::OracleUnavailable(_))));
    // The third query fails and nothing after it is started
    assert_eq!(oracle.request_count(), 3);
}

#[tokio::test]
async fn test_filter_withFailingOracle_shouldNotExceedConcurrency() {
    let timeline = mixed_timeline(30);
    let oracle = MockOracle::failing();

    let result = RelevanceFilter::new(4).filter(&oracle, &timeline, &[]).await;

    assert!(result.is_err());
    assert!(oracle.request_count() <= 4);
}

#[tokio::test]
async fn test_filter_withEmptyTimeline_shouldBeEmptySelection() {
    let oracle = MockOracle::consecutive();

    let result = RelevanceFilter::default().filter(&oracle, &Timeline::default(), &[]).await;

    assert!(matches!(result, Err(SummaryError::EmptySelection(_))));
    assert_eq!(oracle.request_count(), 0);
}

#[test]
fn test_new_withZeroConcurrency_shouldUseOne() {
    assert_eq!(RelevanceFilter::new(0).max_concurrent_requests(), 1);
}
