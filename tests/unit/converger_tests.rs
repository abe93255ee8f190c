/*!
 * Tests for the duration-targeted summary search
 */

use yashwai::errors::SummaryError;
use yashwai::providers::mock::MockOracle;
use yashwai::providers::{OracleRequest, RequestKind};
use yashwai::summary::{ConvergenceOptions, DurationConverger, IterationReport, Selection};
use yashwai::timeline::TimeRange;

use crate::common;

fn summary_size(request: &OracleRequest) -> usize {
    match request.kind {
        RequestKind::Summary { target_size } => target_size,
        RequestKind::Relevance => 0,
    }
}

#[tokio::test]
async fn test_converge_withCompliantOracle_shouldConvergeFirstIteration() {
    let timeline = common::uniform_timeline(10, 5);
    let oracle = MockOracle::consecutive();

    let summary = DurationConverger::default()
        .converge(&oracle, &timeline, &[], 20.0)
        .await
        .unwrap();

    assert_eq!(summary.iterations, 1);
    assert_eq!(summary.selection.indices(), &[0, 1, 2, 3]);
    assert_eq!(
        summary.ranges,
        vec![
            TimeRange::new(0.0, 5.0),
            TimeRange::new(5.0, 10.0),
            TimeRange::new(10.0, 15.0),
            TimeRange::new(15.0, 20.0),
        ]
    );
    assert_eq!(summary.achieved_secs, 20.0);
    assert_eq!(oracle.summary_sizes(), vec![4]);
}

#[tokio::test]
async fn test_converge_withMalformedOracle_shouldFailAfterUnitCountIterations() {
    let timeline = common::uniform_timeline(10, 5);
    let oracle = MockOracle::malformed();
    let mut reports: Vec<IterationReport> = Vec::new();

    let result = DurationConverger::default()
        .converge_with_observer(&oracle, &timeline, &[], 20.0, |report| reports.push(report.clone()))
        .await;

    match result {
        Err(SummaryError::ConvergenceFailure { iterations, last_achieved, target, .. }) => {
            assert_eq!(iterations, 10);
            assert_eq!(last_achieved, 0.0);
            assert_eq!(target, 20.0);
        }
        other => panic!("expected a convergence failure, got {:?}", other),
    }
    assert_eq!(oracle.request_count(), 10);
    assert_eq!(reports.len(), 10);
    assert!(reports.iter().all(|r| r.achieved_secs == 0.0 && r.selected_units == 0));
    // Zero seconds is always below the band, so the size only grows until it is capped
    assert_eq!(oracle.summary_sizes(), vec![4, 5, 6, 7, 8, 9, 10, 10, 10, 10]);
}

#[tokio::test]
async fn test_converge_withUndershootingOracle_shouldGrowRequest() {
    let timeline = common::uniform_timeline(10, 5);
    let oracle = MockOracle::consecutive()
        .with_custom_response(|req| MockOracle::format_summary(0..summary_size(req).saturating_sub(1)));
    let options = ConvergenceOptions {
        tolerance_secs: Some(0.0),
        max_iterations: None,
    };
    let mut reports: Vec<IterationReport> = Vec::new();

    let summary = DurationConverger::new(options)
        .converge_with_observer(&oracle, &timeline, &[], 20.0, |report| reports.push(report.clone()))
        .await
        .unwrap();

    assert_eq!(summary.iterations, 2);
    assert_eq!(summary.achieved_secs, 20.0);
    assert_eq!(
        reports,
        vec![
            IterationReport { iteration: 1, requested_size: 4, achieved_secs: 15.0, selected_units: 3 },
            IterationReport { iteration: 2, requested_size: 5, achieved_secs: 20.0, selected_units: 4 },
        ]
    );
}

#[tokio::test]
async fn test_converge_withOvershootingOracle_shouldShrinkRequest() {
    let timeline = common::uniform_timeline(10, 5);
    let oracle = MockOracle::consecutive().with_custom_response(|req| MockOracle::format_summary(0..summary_size(req) * 2));

    let summary = DurationConverger::default()
        .converge(&oracle, &timeline, &[], 20.0)
        .await
        .unwrap();

    // 8 lines (40s), then 6 lines (30s), then 4 lines (20s)
    assert_eq!(oracle.summary_sizes(), vec![4, 3, 2]);
    assert_eq!(summary.iterations, 3);
    assert_eq!(summary.achieved_secs, 20.0);
}

#[tokio::test]
async fn test_converge_withStubbornOracle_shouldStopAtUnitCount() {
    let timeline = common::uniform_timeline(6, 5);
    let oracle = MockOracle::consecutive().with_custom_response(|_| MockOracle::format_summary(0..6));

    let result = DurationConverger::default().converge(&oracle, &timeline, &[], 10.0).await;

    assert!(matches!(result, Err(SummaryError::ConvergenceFailure { iterations: 6, .. })));
    assert_eq!(oracle.request_count(), 6);
    assert_eq!(oracle.summary_sizes(), vec![2, 1, 1, 1, 1, 1]);
}

#[tokio::test]
async fn test_converge_withUnreachableTarget_shouldFailWithoutQueries() {
    let timeline = common::uniform_timeline(200, 5);
    let oracle = MockOracle::consecutive();

    let result = DurationConverger::default().converge(&oracle, &timeline, &[], 5000.0).await;

    match result {
        Err(SummaryError::ConvergenceFailure { iterations, last_requested, last_achieved, target }) => {
            assert_eq!(iterations, 0);
            assert_eq!(last_requested, 200);
            assert_eq!(last_achieved, 1000.0);
            assert_eq!(target, 5000.0);
        }
        other => panic!("expected a convergence failure, got {:?}", other),
    }
    assert_eq!(oracle.request_count(), 0);
}

#[tokio::test]
async fn test_converge_withTargetJustWithinTolerance_shouldStillSearch() {
    // 10 units of 5s: 50s in total, the band for 54s starts at 49s
    let timeline = common::uniform_timeline(10, 5);
    let oracle = MockOracle::consecutive();

    let summary = DurationConverger::default()
        .converge(&oracle, &timeline, &[], 54.0)
        .await
        .unwrap();

    assert_eq!(summary.achieved_secs, 50.0);
    assert_eq!(oracle.summary_sizes(), vec![10]);
}

#[tokio::test]
async fn test_converge_withMaxIterations_shouldHonorBound() {
    let timeline = common::uniform_timeline(10, 5);
    let oracle = MockOracle::malformed();
    let options = ConvergenceOptions {
        tolerance_secs: None,
        max_iterations: Some(3),
    };

    let result = DurationConverger::new(options).converge(&oracle, &timeline, &[], 20.0).await;

    assert!(matches!(result, Err(SummaryError::ConvergenceFailure { iterations: 3, .. })));
    assert_eq!(oracle.request_count(), 3);
}

#[tokio::test]
async fn test_converge_withDuplicatesAndUnknownIndices_shouldCountEachUnitOnce() {
    let timeline = common::uniform_timeline(10, 5);
    let oracle = MockOracle::scripted(["(3) a\n(3) again\n(42) ghost\n(1) b\n(7) c\n(9) d"]);

    let summary = DurationConverger::default()
        .converge(&oracle, &timeline, &[], 20.0)
        .await
        .unwrap();

    assert_eq!(summary.selection.indices(), &[3, 1, 7, 9]);
    assert_eq!(summary.ranges[0], TimeRange::new(15.0, 20.0));
    assert_eq!(summary.achieved_secs, 20.0);
}

#[tokio::test]
async fn test_converge_withFailingOracle_shouldReportUnavailable() {
    let timeline = common::uniform_timeline(4, 5);
    let oracle = MockOracle::failing();

    let result = DurationConverger::default().converge(&oracle, &timeline, &[], 10.0).await;

    assert!(matches!(result, Err(SummaryError::OracleUnavailable(_))));
    assert_eq!(oracle.request_count(), 1);
}

#[test]
fn test_selection_from_oracle_output_withOnlyUnknownIndices_shouldBeMalformed() {
    let timeline = common::uniform_timeline(3, 1);

    let result = Selection::from_oracle_output("(10) x\n(11) y", &timeline);

    assert!(matches!(result, Err(SummaryError::MalformedOracleOutput(_))));
}
