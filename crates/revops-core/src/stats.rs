//! Small numeric helpers shared by the aggregators.
//!
//! Every helper is total: empty inputs and zero denominators yield `0.0`
//! instead of NaN.

/// Round to two decimal places. Exact halves go to the even cent, so
/// `0.125` becomes `0.12` and `0.375` becomes `0.38`.
pub fn round2(value: f64) -> f64 {
    let rounded = (value * 100.0).round_ties_even() / 100.0;
    // Normalise -0.0 so it serialises as 0.0.
    if rounded == 0.0 {
        0.0
    } else {
        rounded
    }
}

/// Unweighted arithmetic mean; `0.0` for an empty iterator.
pub fn mean<I>(values: I) -> f64
where
    I: IntoIterator<Item = f64>,
{
    let mut sum = 0.0;
    let mut count = 0usize;
    for v in values {
        sum += v;
        count += 1;
    }
    if count == 0 {
        0.0
    } else {
        sum / count as f64
    }
}

/// `part / whole × 100`, or `0.0` when `whole` is zero.
pub fn percentage(part: u64, whole: u64) -> f64 {
    if whole == 0 {
        return 0.0;
    }
    part as f64 / whole as f64 * 100.0
}

/// Running sum and count, for means computed while grouping.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct MeanAccumulator {
    sum: f64,
    count: u64,
}

impl MeanAccumulator {
    pub fn push(&mut self, value: f64) {
        self.sum += value;
        self.count += 1;
    }

    pub fn count(&self) -> u64 {
        self.count
    }

    pub fn sum(&self) -> f64 {
        self.sum
    }

    pub fn mean(&self) -> f64 {
        if self.count == 0 {
            0.0
        } else {
            self.sum / self.count as f64
        }
    }
}
