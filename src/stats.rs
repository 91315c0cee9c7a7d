/// Running min/max/sum/count for one key.
///
/// Seeded from the first observed value rather than from zero, so keys whose
/// values are all positive (or all negative) still report a correct min/max.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RunningStats {
    pub min: f64,
    pub max: f64,
    pub sum: f64,
    pub count: u64,
}

impl RunningStats {
    pub fn new(value: f64) -> Self {
        Self {
            min: value,
            max: value,
            sum: value,
            count: 1,
        }
    }

    pub fn add(&mut self, value: f64) {
        if value < self.min {
            self.min = value;
        }
        if value > self.max {
            self.max = value;
        }
        self.sum += value;
        self.count += 1;
    }

    /// Pairwise merge; commutative and associative, so worker maps can be
    /// folded in any order.
    pub fn merge(&mut self, other: &Self) {
        if other.min < self.min {
            self.min = other.min;
        }
        if other.max > self.max {
            self.max = other.max;
        }
        self.sum += other.sum;
        self.count += other.count;
    }

    pub fn mean(&self) -> f64 {
        self.sum / self.count as f64
    }
}
