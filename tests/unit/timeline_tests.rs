/*!
 * Tests for the timeline model
 */

use yashwai::timeline::{TimeRange, TimedUnit, Timeline, Timestamp};

use crate::common;

#[test]
fn test_range_of_forEveryUnit_shouldHavePositiveLength() {
    let timeline = common::uniform_timeline(25, 3);

    for unit in timeline.units() {
        let range = Timeline::range_of(unit);
        assert!(range.end > range.start, "unit {} has an empty range", unit.index);
    }
    assert!(Timeline::total_duration(&timeline.ranges()) >= 0.0);
}

#[test]
fn test_range_of_calledTwice_shouldBeIdentical() {
    let unit = TimedUnit::new(0, "Hi", Timestamp::new(0, 59, 59, 999), Timestamp::new(1, 0, 0, 1));

    let first = Timeline::range_of(&unit);
    let second = Timeline::range_of(&unit);

    assert_eq!(first, second);
    assert_eq!(first.start, 3599.999);
    assert_eq!(first.end, 3600.001);
}

#[test]
fn test_total_duration_withUnorderedRanges_shouldSumLengths() {
    let ranges = vec![TimeRange::new(30.0, 32.5), TimeRange::new(1.0, 2.0), TimeRange::new(10.0, 10.25)];
    assert!((Timeline::total_duration(&ranges) - 3.75).abs() < 1e-9);
    assert_eq!(Timeline::total_duration(&[]), 0.0);
}

#[test]
fn test_mean_unit_duration_withUniformUnits_shouldMatchUnitLength() {
    let timeline = common::uniform_timeline(10, 5);
    assert_eq!(timeline.unit_count(), 10);
    assert!((timeline.mean_unit_duration() - 5.0).abs() < 1e-9);
    assert_eq!(Timeline::default().mean_unit_duration(), 0.0);
}

#[test]
fn test_restricted_to_shouldKeepOriginalIndices() {
    let timeline = common::uniform_timeline(6, 2);
    let restricted = timeline.restricted_to(&[5, 1, 3, 42]);

    let indices: Vec<usize> = restricted.units().iter().map(|u| u.index).collect();
    assert_eq!(indices, vec![1, 3, 5]);
    assert_eq!(restricted.to_text(), "(1) Line number 1\n(3) Line number 3\n(5) Line number 5\n");
}

#[test]
fn test_timestamp_display_shouldUseSrtFormat() {
    assert_eq!(Timestamp::from_millis(3_723_004).to_string(), "01:02:03,004");
    assert_eq!(Timestamp::new(1, 2, 3, 4).total_millis(), 3_723_004);
}
