//! Level samples and the per-cycle series.

use chrono::NaiveDateTime;

/// Level recorded when acquisition did not succeed.
pub const ACQUISITION_FAILED: f64 = -1.0;

/// One level reading, produced once per loop tick.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Sample {
    pub timestamp: NaiveDateTime,
    /// Mean absolute amplitude, or [`ACQUISITION_FAILED`].
    pub level: f64,
}

impl Sample {
    pub fn new(timestamp: NaiveDateTime, level: f64) -> Self {
        Self { timestamp, level }
    }

    pub fn failed(timestamp: NaiveDateTime) -> Self {
        Self::new(timestamp, ACQUISITION_FAILED)
    }

    /// Negative levels mark failed acquisitions.
    pub fn is_failure(&self) -> bool {
        self.level < 0.0
    }

    /// `true` for a valid reading in `[0, threshold)`.
    pub fn is_below(&self, threshold: f64) -> bool {
        !self.is_failure() && self.level < threshold
    }
}

/// Mean absolute value of a buffer of signed 16-bit little-endian samples.
///
/// Returns `None` for a buffer without a single complete sample. A
/// trailing odd byte is ignored.
pub fn mean_abs_level(raw: &[u8]) -> Option<f64> {
    let count = raw.len() / 2;
    if count == 0 {
        return None;
    }
    let sum: f64 = raw
        .chunks_exact(2)
        .map(|pair| f64::from(i16::from_le_bytes([pair[0], pair[1]])).abs())
        .sum();
    Some(sum / count as f64)
}

/// Ordered samples of the active cycle, kept for charting and export and
/// discarded at rollover.
#[derive(Debug, Default, Clone)]
pub struct CycleSeries {
    samples: Vec<Sample>,
}

impl CycleSeries {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, sample: Sample) {
        self.samples.push(sample);
    }

    pub fn samples(&self) -> &[Sample] {
        &self.samples
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    /// Number of failed acquisitions in this cycle.
    pub fn failure_count(&self) -> usize {
        self.samples.iter().filter(|s| s.is_failure()).count()
    }

    /// Drop every sample, keeping the allocation.
    pub fn clear(&mut self) {
        self.samples.clear();
    }
}

#[cfg(test)]
mod tests {
    use chrono::NaiveDate;

    use super::*;

    fn ts() -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2026, 5, 1)
            .unwrap()
            .and_hms_opt(0, 0, 0)
            .unwrap()
    }

    fn encode(values: &[i16]) -> Vec<u8> {
        values.iter().flat_map(|v| v.to_le_bytes()).collect()
    }

    #[test]
    fn mean_abs_of_signed_samples() {
        let raw = encode(&[100, -300, 0, 200]);
        assert_eq!(mean_abs_level(&raw), Some(150.0));
    }

    #[test]
    fn mean_abs_handles_i16_min() {
        let raw = encode(&[i16::MIN, i16::MAX]);
        assert_eq!(mean_abs_level(&raw), Some(32767.5));
    }

    #[test]
    fn mean_abs_empty_buffer_is_none() {
        assert_eq!(mean_abs_level(&[]), None);
        assert_eq!(mean_abs_level(&[7]), None);
    }

    #[test]
    fn trailing_odd_byte_is_ignored() {
        let mut raw = encode(&[-10, 10]);
        raw.push(0xff);
        assert_eq!(mean_abs_level(&raw), Some(10.0));
    }

    #[test]
    fn failure_sentinel_is_not_below_threshold() {
        let failed = Sample::failed(ts());
        assert!(failed.is_failure());
        assert!(!failed.is_below(1000.0));

        assert!(Sample::new(ts(), 0.0).is_below(1000.0));
        assert!(Sample::new(ts(), 999.9).is_below(1000.0));
        assert!(!Sample::new(ts(), 1000.0).is_below(1000.0));
    }

    #[test]
    fn series_counts_and_clears() {
        let mut series = CycleSeries::new();
        series.push(Sample::new(ts(), 5.0));
        series.push(Sample::failed(ts()));
        assert_eq!(series.len(), 2);
        assert_eq!(series.failure_count(), 1);
        series.clear();
        assert!(series.is_empty());
    }
}
