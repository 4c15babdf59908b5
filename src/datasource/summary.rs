//! Fixed-size bucket aggregation.
//!
//! Every level of detail and every pixel-density pass reduces consecutive
//! samples through the same kernel, selected by [`Aggregation`].

use serde::{Deserialize, Serialize};

/// Reduction applied to each bucket of consecutive samples.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Aggregation {
    /// Keep the bucket maximum. Preserves spikes.
    #[default]
    Max,
    /// Keep the bucket mean. Preserves average shape.
    Mean,
}

#[derive(Debug, Clone, Copy, Default)]
struct Bucket {
    count: usize,
    max: f64,
    sum: f64,
}

impl Bucket {
    fn push(&mut self, value: f64) {
        if !value.is_finite() {
            return;
        }
        if self.count == 0 || value > self.max {
            self.max = value;
        }
        self.sum += value;
        self.count += 1;
    }

    fn value(&self, aggregation: Aggregation) -> f64 {
        if self.count == 0 {
            return f64::NAN;
        }
        match aggregation {
            Aggregation::Max => self.max,
            Aggregation::Mean => self.sum / self.count as f64,
        }
    }
}

/// Number of buckets needed to cover `len` samples.
pub fn bucket_count(len: usize, bucket_size: usize) -> usize {
    if bucket_size == 0 {
        return len;
    }
    len.div_ceil(bucket_size)
}

/// Reduce `values` into buckets of `bucket_size` samples.
///
/// The final bucket may be partial. Non-finite samples are skipped; a bucket
/// without any finite sample yields `NaN` so positions stay aligned.
pub fn aggregate_buckets(values: &[f64], bucket_size: usize, aggregation: Aggregation) -> Vec<f64> {
    let bucket_size = bucket_size.max(1);
    if bucket_size == 1 {
        return values.to_vec();
    }
    let mut out = Vec::with_capacity(bucket_count(values.len(), bucket_size));
    for chunk in values.chunks(bucket_size) {
        let mut bucket = Bucket::default();
        for &value in chunk {
            bucket.push(value);
        }
        out.push(bucket.value(aggregation));
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn max_keeps_spikes() {
        let values = [1.0, 9.0, 2.0, 3.0, 4.0, 0.5, 7.0];
        let out = aggregate_buckets(&values, 3, Aggregation::Max);
        assert_eq!(out, vec![9.0, 4.0, 7.0]);
    }

    #[test]
    fn mean_averages_each_bucket() {
        let values = [1.0, 3.0, 2.0, 4.0, 10.0];
        let out = aggregate_buckets(&values, 2, Aggregation::Mean);
        assert_eq!(out, vec![2.0, 3.0, 10.0]);
    }

    #[test]
    fn max_stays_within_source_bounds() {
        let values: Vec<f64> = (0..997)
            .map(|i| ((i * 7919) % 1000) as f64 / 10.0 - 50.0)
            .collect();
        let min = values.iter().copied().fold(f64::INFINITY, f64::min);
        let max = values.iter().copied().fold(f64::NEG_INFINITY, f64::max);
        for bucket in [1, 2, 3, 7, 64, 500, 997, 5000] {
            for aggregation in [Aggregation::Max, Aggregation::Mean] {
                for value in aggregate_buckets(&values, bucket, aggregation) {
                    assert!(value >= min && value <= max, "bucket {bucket}: {value}");
                }
            }
        }
    }

    #[test]
    fn all_non_finite_bucket_is_nan() {
        let values = [f64::NAN, f64::NAN, 1.0, 2.0];
        let out = aggregate_buckets(&values, 2, Aggregation::Max);
        assert!(out[0].is_nan());
        assert_eq!(out[1], 2.0);
    }

    #[test]
    fn bucket_count_rounds_up() {
        assert_eq!(bucket_count(10, 3), 4);
        assert_eq!(bucket_count(9, 3), 3);
        assert_eq!(bucket_count(0, 3), 0);
    }
}
