use serde::{Deserialize, Serialize};

/// A closed range of scalars, used for march distance bounds.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Interval {
    pub min: f32,
    pub max: f32,
}

impl Interval {
    /// Create a new interval given min and max values.
    pub fn new(min: f32, max: f32) -> Self {
        Self { min, max }
    }

    /// Returns the size of the interval (max - min).
    pub fn size(&self) -> f32 {
        self.max - self.min
    }

    /// Returns true if the interval contains at least one value.
    pub fn is_empty(&self) -> bool {
        !(self.min < self.max)
    }

    /// Position of x inside the interval, 0 at `min` and 1 at `max`, clamped.
    pub fn normalize(&self, x: f32) -> f32 {
        if self.is_empty() {
            return 0.0;
        }
        ((x - self.min) / self.size()).clamp(0.0, 1.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_interval_size() {
        assert_eq!(Interval::new(2.0, 7.0).size(), 5.0);
        assert_eq!(Interval::new(-5.0, 5.0).size(), 10.0);
    }

    #[test]
    fn test_interval_empty() {
        assert!(Interval::new(1.0, 1.0).is_empty());
        assert!(Interval::new(2.0, 1.0).is_empty());
        assert!(Interval::new(f32::NAN, 1.0).is_empty());
        assert!(!Interval::new(0.0, 1.0).is_empty());
    }

    #[test]
    fn test_interval_normalize() {
        let interval = Interval::new(2.0, 12.0);

        assert_eq!(interval.normalize(2.0), 0.0);
        assert_eq!(interval.normalize(7.0), 0.5);
        assert_eq!(interval.normalize(100.0), 1.0);
        assert_eq!(Interval::new(3.0, 3.0).normalize(3.0), 0.0);
    }
}
