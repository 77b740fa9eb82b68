use std::collections::VecDeque;

/// Population standard deviation divided by the mean.
///
/// Zero for fewer than two samples or a non-positive mean.
pub fn coefficient_of_variation(samples: &[f64]) -> f64 {
    if samples.len() < 2 {
        return 0.0;
    }

    let n = samples.len() as f64;
    let mean = samples.iter().sum::<f64>() / n;
    if mean <= 0.0 || !mean.is_finite() {
        return 0.0;
    }

    let variance = samples.iter().map(|s| (s - mean).powi(2)).sum::<f64>() / n;
    variance.sqrt() / mean
}

/// Fixed-capacity ring of the most recent price samples
#[derive(Clone, Debug)]
pub struct PriceHistory {
    samples: VecDeque<f64>,
    capacity: usize,
}

impl PriceHistory {
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self { samples: VecDeque::with_capacity(capacity), capacity }
    }

    /// Appends a sample, evicting the oldest once full. Non-finite samples are ignored.
    pub fn push(&mut self, price: f64) {
        if !price.is_finite() {
            return;
        }
        if self.samples.len() == self.capacity {
            self.samples.pop_front();
        }
        self.samples.push_back(price);
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn volatility(&self) -> f64 {
        let (head, tail) = self.samples.as_slices();
        if tail.is_empty() {
            coefficient_of_variation(head)
        } else {
            let contiguous: Vec<f64> = self.samples.iter().copied().collect();
            coefficient_of_variation(&contiguous)
        }
    }

    pub fn latest(&self) -> Option<f64> {
        self.samples.back().copied()
    }
}
