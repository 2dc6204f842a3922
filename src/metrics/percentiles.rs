use hdrhistogram::Histogram;
use serde::Serialize;

/// HdrHistogram range: 1 μs → 60 s, 3 significant figures
pub const HIST_LOW: u64 = 1;
pub const HIST_HIGH: u64 = 60_000_000;
pub const HIST_SIGFIG: u8 = 3;

/// Percentile breakdown for one latency series, in microseconds.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PercentileSet {
    pub min: u64,
    pub max: u64,
    pub mean: f64,
    pub p50: u64,
    pub p95: u64,
    pub p99: u64,
    pub p999: u64,
    pub count: u64,
}

impl PercentileSet {
    /// Record millisecond readings and extract their percentiles.
    /// Values are clamped into the histogram's range.
    pub fn from_millis(values: impl IntoIterator<Item = f64>) -> Self {
        let mut hist = match Histogram::<u64>::new_with_bounds(HIST_LOW, HIST_HIGH, HIST_SIGFIG) {
            Ok(h) => h,
            Err(_) => return Self::empty(),
        };
        for ms in values {
            let us = (ms.max(0.0) * 1000.0).round() as u64;
            hist.saturating_record(us.clamp(HIST_LOW, HIST_HIGH));
        }
        Self::from_histogram(&hist)
    }

    /// Returns zeroed values if the histogram is empty.
    pub fn from_histogram(hist: &Histogram<u64>) -> Self {
        if hist.len() == 0 {
            return Self::empty();
        }

        Self {
            min: hist.min(),
            max: hist.max(),
            mean: hist.mean(),
            p50: hist.value_at_percentile(50.0),
            p95: hist.value_at_percentile(95.0),
            p99: hist.value_at_percentile(99.0),
            p999: hist.value_at_percentile(99.9),
            count: hist.len(),
        }
    }

    pub fn empty() -> Self {
        Self {
            min: 0,
            max: 0,
            mean: 0.0,
            p50: 0,
            p95: 0,
            p99: 0,
            p999: 0,
            count: 0,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_input_yields_zeroed_set() {
        assert_eq!(PercentileSet::from_millis(std::iter::empty()), PercentileSet::empty());
    }

    #[test]
    fn millis_are_recorded_as_micros() {
        let set = PercentileSet::from_millis([10.0, 20.0, 30.0, 40.0, 50.0]);
        assert_eq!(set.count, 5);
        assert_eq!(set.min, 10_000);
        // 3 significant figures
        assert!(set.max.abs_diff(50_000) <= 50);
        assert!(set.p50.abs_diff(30_000) <= 30);
    }

    #[test]
    fn sub_microsecond_values_clamp_to_one() {
        let set = PercentileSet::from_millis([0.0]);
        assert_eq!(set.min, 1);
    }
}
