use super::{IDataType, RawType};
use crate::GenerationError;
use rand::rngs::StdRng;
use rand::Rng;
use std::fmt::Display;

impl RawType {
    /// Create a blob type accepting between `min` and `max` bytes.
    pub fn new(min: usize, max: usize) -> Self {
        assert!(
            min <= max,
            "Invalid raw size range {}..={}. The lower bound must not exceed the upper bound.",
            min,
            max
        );
        Self { min, max }
    }

    /// Create a blob type accepting exactly `size` bytes.
    pub fn fixed(size: usize) -> Self {
        RawType::new(size, size)
    }

    #[inline]
    pub fn size_range(&self) -> (usize, usize) {
        (self.min, self.max)
    }
}

impl Display for RawType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Raw({}..={})", self.min, self.max)
    }
}

impl IDataType for RawType {
    fn candidate_lengths(&self, data: &[u8]) -> Vec<usize> {
        if data.len() < self.min {
            return Vec::new();
        }
        let upper = self.max.min(data.len());
        (self.min..=upper).rev().collect()
    }

    fn validate(&self, data: &[u8]) -> bool {
        data.len() >= self.min && data.len() <= self.max
    }

    fn generate(&self, rng: &mut StdRng) -> Result<Vec<u8>, GenerationError> {
        let size = rng.gen_range(self.min..=self.max);
        Ok((0..size).map(|_| rng.gen::<u8>()).collect())
    }
}
