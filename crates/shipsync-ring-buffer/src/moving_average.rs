//! Windowed integer moving average
//!
//! Used to smooth per-snapshot tick offsets before they drive the
//! playback-speed bands.

use crate::RingBuffer;

/// Moving average over the last `window` integer samples
///
/// The average uses integer division, truncating toward zero.
#[derive(Debug, Clone)]
pub struct MovingAverage {
    samples: RingBuffer<i32>,
    sum: i64,
}

impl MovingAverage {
    /// Create a moving average over `window` samples
    pub fn new(window: usize) -> Self {
        Self {
            samples: RingBuffer::new(window),
            sum: 0,
        }
    }

    /// Add a sample, evicting the oldest once the window is full
    pub fn add_value(&mut self, value: i32) {
        if let Some(evicted) = self.samples.push(value) {
            self.sum -= i64::from(evicted);
        }
        self.sum += i64::from(value);
    }

    /// Overwrite every stored sample so the average equals `value` immediately
    ///
    /// The number of stored samples is unchanged. On an empty window the value
    /// is recorded as the only sample.
    pub fn force_set_average(&mut self, value: i32) {
        if self.samples.is_empty() {
            self.add_value(value);
            return;
        }
        for sample in self.samples.iter_mut() {
            *sample = value;
        }
        self.sum = i64::from(value) * self.samples.len() as i64;
    }

    /// Current average (0 when no samples have been added)
    pub fn average(&self) -> i32 {
        if self.samples.is_empty() {
            0
        } else {
            (self.sum / self.samples.len() as i64) as i32
        }
    }

    /// Number of samples currently in the window
    pub fn len(&self) -> usize {
        self.samples.len()
    }

    /// Check if no samples have been added
    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    /// Window size
    pub fn window(&self) -> usize {
        self.samples.capacity()
    }

    /// Drop all samples
    pub fn clear(&mut self) {
        self.samples.clear();
        self.sum = 0;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_average_is_zero() {
        let avg = MovingAverage::new(90);
        assert_eq!(avg.average(), 0);
        assert!(avg.is_empty());
        assert_eq!(avg.window(), 90);
    }

    #[test]
    fn test_average_truncates_toward_zero() {
        let mut avg = MovingAverage::new(4);
        avg.add_value(3);
        avg.add_value(4);
        assert_eq!(avg.average(), 3);

        let mut negative = MovingAverage::new(4);
        negative.add_value(-3);
        negative.add_value(-4);
        assert_eq!(negative.average(), -3);
    }

    #[test]
    fn test_window_evicts_oldest() {
        let mut avg = MovingAverage::new(3);
        avg.add_value(100);
        avg.add_value(0);
        avg.add_value(0);
        assert_eq!(avg.average(), 33);

        avg.add_value(0);
        assert_eq!(avg.average(), 0);
        assert_eq!(avg.len(), 3);
    }

    #[test]
    fn test_force_set_average() {
        let mut avg = MovingAverage::new(90);
        for _ in 0..50 {
            avg.add_value(10);
        }
        avg.force_set_average(-2);
        assert_eq!(avg.average(), -2);
        assert_eq!(avg.len(), 50);

        // New samples blend from the forced value
        avg.add_value(48);
        assert_eq!(avg.average(), (-2 * 50 + 48) / 51);
    }

    #[test]
    fn test_force_set_on_empty_window() {
        let mut avg = MovingAverage::new(5);
        avg.force_set_average(-7);
        assert_eq!(avg.average(), -7);
        assert_eq!(avg.len(), 1);
    }
}
