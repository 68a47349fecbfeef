// Scales mapping data space to chart pixels

/// Continuous scale. An inverted range (`range_min > range_max`) is how the
/// value axis grows upward while pixel y grows downward.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct LinearScale {
    domain_min: f64,
    domain_max: f64,
    range_min: f64,
    range_max: f64,
}

impl LinearScale {
    pub fn new(domain_min: f64, domain_max: f64, range_min: f64, range_max: f64) -> Self {
        Self {
            domain_min,
            domain_max,
            range_min,
            range_max,
        }
    }

    pub fn map(&self, value: f64) -> f64 {
        let d = self.domain_max - self.domain_min;
        if d.abs() < 1e-12 {
            return self.range_min;
        }
        let t = (value - self.domain_min) / d;
        self.range_min + t * (self.range_max - self.range_min)
    }

    pub fn invert(&self, px: f64) -> f64 {
        let r = self.range_max - self.range_min;
        if r.abs() < 1e-12 {
            return self.domain_min;
        }
        let t = (px - self.range_min) / r;
        self.domain_min + t * (self.domain_max - self.domain_min)
    }

    pub fn domain(&self) -> (f64, f64) {
        (self.domain_min, self.domain_max)
    }

    pub fn range(&self) -> (f64, f64) {
        (self.range_min, self.range_max)
    }

    pub fn ticks(&self, count: usize) -> Vec<f64> {
        let n = count.max(2);
        let span = self.domain_max - self.domain_min;
        (0..n)
            .map(|i| self.domain_min + span * (i as f64 / (n - 1) as f64))
            .collect()
    }
}

/// Categorical scale: `count` equal-width bands over a pixel range
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct BandScale {
    count: usize,
    start: f64,
    step: f64,
    band_width: f64,
}

impl BandScale {
    pub fn new(
        count: usize,
        range_min: f64,
        range_max: f64,
        padding_inner: f64,
        padding_outer: f64,
    ) -> Self {
        if count == 0 {
            return Self {
                count: 0,
                start: range_min,
                step: 0.0,
                band_width: 0.0,
            };
        }
        let padding_inner = padding_inner.clamp(0.0, 1.0);
        let padding_outer = padding_outer.max(0.0);
        let count_f = count as f64;
        let span = (range_max - range_min).max(0.0);
        let denom = (count_f - padding_inner + 2.0 * padding_outer).max(1.0);
        let step = span / denom;
        let band_width = step * (1.0 - padding_inner);
        // Center the bands when the denominator floor kicked in
        let used = step * (count_f - padding_inner);
        let start = range_min + (span - used) / 2.0;
        Self {
            count,
            start,
            step,
            band_width,
        }
    }

    pub fn count(&self) -> usize {
        self.count
    }

    pub fn step(&self) -> f64 {
        self.step
    }

    pub fn band_width(&self) -> f64 {
        self.band_width
    }

    pub fn band_start(&self, idx: usize) -> Option<f64> {
        if idx >= self.count {
            return None;
        }
        Some(self.start + self.step * idx as f64)
    }

    pub fn center(&self, idx: usize) -> Option<f64> {
        self.band_start(idx).map(|x| x + self.band_width * 0.5)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn inverted_value_scale_puts_max_at_top() {
        let s = LinearScale::new(0.0, 12.0, 500.0, 0.0);
        assert_eq!(s.map(12.0), 0.0);
        assert_eq!(s.map(0.0), 500.0);
        assert_eq!(s.map(6.0), 250.0);
        assert_eq!(s.invert(250.0), 6.0);
    }

    #[test]
    fn degenerate_domain_maps_to_range_start() {
        let s = LinearScale::new(3.0, 3.0, 500.0, 0.0);
        assert_eq!(s.map(3.0), 500.0);
    }

    #[test]
    fn linear_ticks_include_endpoints() {
        let s = LinearScale::new(10.0, 20.0, 0.0, 100.0);
        let t = s.ticks(4);
        assert_eq!(t[0], 10.0);
        assert_eq!(t[3], 20.0);
    }

    #[test]
    fn bands_are_equal_width_and_ordered() {
        let b = BandScale::new(6, 0.0, 500.0, 0.2, 0.1);
        let starts: Vec<f64> = (0..6).map(|i| b.band_start(i).unwrap()).collect();
        assert!(starts.windows(2).all(|w| w[1] > w[0]));
        assert!((b.band_width() - b.step() * 0.8).abs() < 1e-9);
        let last_end = starts[5] + b.band_width();
        assert!(starts[0] >= 0.0 && last_end <= 500.0 + 1e-9);
        // outer padding is symmetric
        assert!((starts[0] - (500.0 - last_end)).abs() < 1e-9);
    }

    #[test]
    fn band_scale_bounds_indices() {
        let b = BandScale::new(3, 0.0, 300.0, 0.1, 0.05);
        assert!(b.band_start(2).is_some());
        assert!(b.band_start(3).is_none());
        assert!(BandScale::new(0, 0.0, 300.0, 0.1, 0.05).band_start(0).is_none());
    }
}
