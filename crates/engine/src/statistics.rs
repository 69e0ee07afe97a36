//! Accuracy and timing statistics over classification histories.
//!
//! Everything here is pure: the engine loads the histories (see
//! [`Engine::statistics`]) and hands them over as slices of [`Judgment`]s
//! sorted by time.
//!
//! Timing is measured as the gap between a judgment and the one before it,
//! attributed to the later judgment. Gaps of five minutes or more are
//! dropped because the member most likely stepped away.
//!
//! [`Engine::statistics`]: crate::Engine::statistics

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::Serialize;

/// Gaps at or above this many seconds are left out of every timing figure.
pub const MAX_GAP_SECONDS: f64 = 300.0;

/// Reported in place of a median when there is nothing to take it of.
pub const NO_TIMING: f64 = -1.0;

/// One verdict, reduced to what the statistics need.
#[derive(Clone, Debug, PartialEq)]
pub struct Judgment {
    pub timestamp: DateTime<Utc>,
    pub correct: bool,
    /// Version of the fake patch that was shown.
    pub version: i32,
}

/// Time spent producing a judgment.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Gap {
    pub seconds: f64,
    pub correct: bool,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize)]
pub struct ErrorStats {
    pub total: u64,
    pub correct: u64,
    pub incorrect: u64,
    /// `incorrect / total`, absent when nothing was judged.
    pub error_rate: Option<f64>,
    /// Distance of the error rate from chance, `|error_rate - 0.5|`.
    pub deviation: Option<f64>,
}

impl ErrorStats {
    pub fn from_judgments<'a>(judgments: impl IntoIterator<Item = &'a Judgment>) -> Self {
        let (total, correct) = judgments
            .into_iter()
            .fold((0u64, 0u64), |(total, correct), j| {
                (total + 1, correct + u64::from(j.correct))
            });
        let incorrect = total - correct;
        let error_rate = (total > 0).then(|| incorrect as f64 / total as f64);

        Self {
            total,
            correct,
            incorrect,
            error_rate,
            deviation: error_rate.map(|rate| (rate - 0.5).abs()),
        }
    }
}

/// Median gap overall and split by the correctness of the judgment the gap
/// led to. Each field is [`NO_TIMING`] when it has no data.
#[derive(Clone, Copy, Debug, PartialEq, Serialize)]
pub struct TimingStats {
    pub median: f64,
    pub median_correct: f64,
    pub median_incorrect: f64,
}

impl Default for TimingStats {
    fn default() -> Self {
        Self {
            median: NO_TIMING,
            median_correct: NO_TIMING,
            median_incorrect: NO_TIMING,
        }
    }
}

impl TimingStats {
    pub fn from_gaps(gaps: &[Gap]) -> Self {
        let all: Vec<f64> = gaps.iter().map(|g| g.seconds).collect();
        let correct: Vec<f64> = gaps.iter().filter(|g| g.correct).map(|g| g.seconds).collect();
        let incorrect: Vec<f64> = gaps
            .iter()
            .filter(|g| !g.correct)
            .map(|g| g.seconds)
            .collect();

        Self {
            median: median(all),
            median_correct: median(correct),
            median_incorrect: median(incorrect),
        }
    }

    pub fn as_tuple(&self) -> (f64, f64, f64) {
        (self.median, self.median_correct, self.median_incorrect)
    }
}

/// Median of `values`, averaging the two middle values for even lengths.
pub fn median(mut values: Vec<f64>) -> f64 {
    if values.is_empty() {
        return NO_TIMING;
    }
    values.sort_by(f64::total_cmp);
    let mid = values.len() / 2;
    if values.len() % 2 == 0 {
        (values[mid - 1] + values[mid]) / 2.0
    } else {
        values[mid]
    }
}

/// Gaps between consecutive judgments of one chronological history, with
/// the step-away gaps already removed.
pub fn judgment_gaps(history: &[Judgment]) -> Vec<Gap> {
    history
        .windows(2)
        .filter_map(|pair| {
            let seconds = (pair[1].timestamp - pair[0].timestamp).num_milliseconds() as f64 / 1000.0;
            (seconds < MAX_GAP_SECONDS).then_some(Gap {
                seconds,
                correct: pair[1].correct,
            })
        })
        .collect()
}

/// `(median, median_correct, median_incorrect)` for one history.
pub fn calc_time_med(history: &[Judgment]) -> (f64, f64, f64) {
    TimingStats::from_gaps(&judgment_gaps(history)).as_tuple()
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct VersionStats {
    pub version: i32,
    pub errors: ErrorStats,
    pub timing: TimingStats,
}

/// Per-version figures folded together, each version weighted by the number
/// of judgments it holds.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize)]
pub struct WeightedAggregate {
    pub judgments: u64,
    pub error_rate: Option<f64>,
    pub deviation: Option<f64>,
}

pub fn weighted_aggregate(versions: &[VersionStats]) -> WeightedAggregate {
    let mut judgments = 0u64;
    let mut error_sum = 0.0;
    let mut deviation_sum = 0.0;

    for stats in versions {
        let (Some(error_rate), Some(deviation)) = (stats.errors.error_rate, stats.errors.deviation)
        else {
            continue;
        };
        let weight = stats.errors.total;
        judgments += weight;
        error_sum += weight as f64 * error_rate;
        deviation_sum += weight as f64 * deviation;
    }

    if judgments == 0 {
        return WeightedAggregate::default();
    }
    WeightedAggregate {
        judgments,
        error_rate: Some(error_sum / judgments as f64),
        deviation: Some(deviation_sum / judgments as f64),
    }
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct StatsReport {
    pub errors: ErrorStats,
    pub timing: TimingStats,
    pub versions: Vec<VersionStats>,
    pub weighted: WeightedAggregate,
}

impl StatsReport {
    /// Report for one member's chronological history.
    pub fn for_history(history: &[Judgment]) -> Self {
        Self::for_cohort(&[history])
    }

    /// Report for several members at once. Each history must belong to a
    /// single member: gaps are never measured across two histories.
    pub fn for_cohort(histories: &[&[Judgment]]) -> Self {
        let errors = ErrorStats::from_judgments(histories.iter().flat_map(|h| h.iter()));
        let gaps: Vec<Gap> = histories.iter().flat_map(|h| judgment_gaps(h)).collect();

        let mut by_version: BTreeMap<i32, (Vec<&Judgment>, Vec<Gap>)> = BTreeMap::new();
        for history in histories {
            let mut split: BTreeMap<i32, Vec<Judgment>> = BTreeMap::new();
            for judgment in history.iter() {
                split.entry(judgment.version).or_default().push(judgment.clone());
                by_version.entry(judgment.version).or_default().0.push(judgment);
            }
            for (version, version_history) in split {
                by_version
                    .entry(version)
                    .or_default()
                    .1
                    .extend(judgment_gaps(&version_history));
            }
        }

        let versions: Vec<VersionStats> = by_version
            .into_iter()
            .map(|(version, (judgments, gaps))| VersionStats {
                version,
                errors: ErrorStats::from_judgments(judgments),
                timing: TimingStats::from_gaps(&gaps),
            })
            .collect();
        let weighted = weighted_aggregate(&versions);

        Self {
            errors,
            timing: TimingStats::from_gaps(&gaps),
            versions,
            weighted,
        }
    }
}

#[cfg(test)]
mod tests {
    use chrono::{Duration, TimeZone};

    use super::*;

    fn at(seconds: i64, correct: bool, version: i32) -> Judgment {
        let start = Utc.with_ymd_and_hms(2026, 1, 1, 12, 0, 0).unwrap();
        Judgment {
            timestamp: start + Duration::seconds(seconds),
            correct,
            version,
        }
    }

    fn close(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-9
    }

    #[test]
    fn empty_and_single_histories_have_no_timing() {
        assert_eq!(calc_time_med(&[]), (-1.0, -1.0, -1.0));
        assert_eq!(calc_time_med(&[at(0, true, 0)]), (-1.0, -1.0, -1.0));
    }

    #[test]
    fn step_away_gaps_are_dropped() {
        let history = [at(0, true, 0), at(10, true, 0), at(400, false, 0)];
        let gaps = judgment_gaps(&history);
        assert_eq!(gaps.len(), 1);
        assert!(close(gaps[0].seconds, 10.0));
        assert_eq!(calc_time_med(&history), (10.0, 10.0, -1.0));
    }

    #[test]
    fn gap_of_exactly_five_minutes_is_dropped() {
        let history = [at(0, true, 0), at(300, true, 0)];
        assert!(judgment_gaps(&history).is_empty());
    }

    #[test]
    fn gap_is_attributed_to_the_later_judgment() {
        let history = [
            at(0, false, 0),
            at(4, true, 0),
            at(10, false, 0),
            at(12, true, 0),
        ];
        let (all, correct, incorrect) = calc_time_med(&history);
        assert!(close(all, 4.0));
        assert!(close(correct, 3.0));
        assert!(close(incorrect, 6.0));
    }

    #[test]
    fn median_averages_even_lengths() {
        assert!(close(median(vec![4.0, 1.0, 3.0, 2.0]), 2.5));
        assert!(close(median(vec![5.0, 1.0, 3.0]), 3.0));
        assert!(close(median(Vec::new()), NO_TIMING));
    }

    #[test]
    fn error_stats_measure_distance_from_chance() {
        let history = [
            at(0, true, 0),
            at(1, true, 0),
            at(2, true, 0),
            at(3, false, 0),
        ];
        let stats = ErrorStats::from_judgments(&history);
        assert_eq!(stats.total, 4);
        assert_eq!(stats.correct, 3);
        assert_eq!(stats.incorrect, 1);
        assert!(close(stats.error_rate.unwrap(), 0.25));
        assert!(close(stats.deviation.unwrap(), 0.25));
    }

    #[test]
    fn error_stats_of_nothing_have_no_rate() {
        let stats = ErrorStats::from_judgments(&[] as &[Judgment]);
        assert_eq!(stats.total, 0);
        assert_eq!(stats.error_rate, None);
        assert_eq!(stats.deviation, None);
    }

    fn version_stats(version: i32, total: u64, incorrect: u64) -> VersionStats {
        let error_rate = incorrect as f64 / total as f64;
        VersionStats {
            version,
            errors: ErrorStats {
                total,
                correct: total - incorrect,
                incorrect,
                error_rate: Some(error_rate),
                deviation: Some((error_rate - 0.5).abs()),
            },
            timing: TimingStats::default(),
        }
    }

    #[test]
    fn versions_are_weighted_by_judgment_count() {
        let versions = [version_stats(1, 10, 2), version_stats(2, 5, 2)];
        let weighted = weighted_aggregate(&versions);

        assert_eq!(weighted.judgments, 15);
        assert!(close(weighted.error_rate.unwrap(), (10.0 * 0.2 + 5.0 * 0.4) / 15.0));
        assert!(close(weighted.deviation.unwrap(), (10.0 * 0.3 + 5.0 * 0.1) / 15.0));
    }

    #[test]
    fn weighted_deviation_differs_from_pooled_deviation() {
        // 10 judgments at 0.8 error, 10 at 0.2: pooled error is exactly chance.
        let versions = [version_stats(1, 10, 8), version_stats(2, 10, 2)];
        let weighted = weighted_aggregate(&versions);
        assert!(close(weighted.deviation.unwrap(), 0.3));
    }

    #[test]
    fn version_timing_ignores_judgments_of_other_versions() {
        let history = [
            at(0, true, 1),
            at(5, true, 2),
            at(20, false, 1),
            at(22, true, 2),
        ];
        let report = StatsReport::for_history(&history);

        assert_eq!(report.versions.len(), 2);
        let v1 = &report.versions[0];
        assert_eq!(v1.version, 1);
        assert_eq!(v1.errors.total, 2);
        assert!(close(v1.timing.median, 20.0));
        assert!(close(v1.timing.median_incorrect, 20.0));
        let v2 = &report.versions[1];
        assert!(close(v2.timing.median, 17.0));
        assert!(close(report.timing.median, 5.0));
    }

    #[test]
    fn cohort_never_measures_gaps_across_members() {
        let alice = [at(0, true, 0), at(10, true, 0)];
        let bob = [at(3, false, 0), at(5, false, 0)];
        let report = StatsReport::for_cohort(&[&alice, &bob]);

        assert_eq!(report.errors.total, 4);
        assert!(close(report.timing.median, 6.0));
        assert!(close(report.timing.median_correct, 10.0));
        assert!(close(report.timing.median_incorrect, 2.0));
    }

    #[test]
    fn first_judgment_in_a_version_has_no_gap() {
        let history = [at(0, true, 0), at(10, false, 3)];
        let report = StatsReport::for_history(&history);
        let v3 = report.versions.iter().find(|v| v.version == 3).unwrap();
        assert_eq!(v3.timing, TimingStats::default());
    }
}
