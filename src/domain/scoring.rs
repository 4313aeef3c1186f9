//! Pure arithmetic behind course progress and the team performance board.

use super::Progress;

/// Percentage of `part` in `total`, rounded to one decimal. Zero when `total` is zero.
#[must_use]
#[allow(clippy::cast_precision_loss)]
pub fn rate(part: u64, total: u64) -> f64 {
    if total == 0 {
        return 0.0;
    }
    round1(part as f64 / total as f64 * 100.0)
}

#[must_use]
pub fn round1(value: f64) -> f64 {
    (value * 10.0).round() / 10.0
}

/// Mean of the task completion rate and the course enrollment rate.
#[must_use]
pub fn overall_rating(completion_rate: f64, enrollment_rate: f64) -> f64 {
    round1(f64::midpoint(completion_rate, enrollment_rate))
}

/// Course progress after watching `watched_segments` distinct segments.
///
/// Never moves backwards from `previous`.
#[must_use]
#[allow(clippy::cast_possible_truncation, clippy::cast_precision_loss)]
pub fn course_progress(previous: Progress, watched_segments: usize, segment_count: i32) -> Progress {
    if segment_count <= 0 {
        return previous;
    }
    let percent = (watched_segments as f64 / f64::from(segment_count) * 100.0).round();
    let computed = Progress::saturating(percent.min(100.0) as i32);
    previous.max(computed)
}

/// Arithmetic mean of a progress column. Zero for an empty set.
#[must_use]
#[allow(clippy::cast_precision_loss)]
pub fn mean_progress(values: &[i32]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    let sum: i64 = values.iter().copied().map(i64::from).sum();
    round1(sum as f64 / values.len() as f64)
}
