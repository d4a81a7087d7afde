use super::{BitArrayType, IDataType};
use crate::GenerationError;
use rand::rngs::StdRng;
use rand::Rng;
use std::fmt::Display;

impl BitArrayType {
    /// Create a bit field accepting between `min_bits` and `max_bits` bits.
    /// Both bounds must be multiples of 8: values are framed on whole bytes.
    pub fn new(min_bits: usize, max_bits: usize) -> Self {
        assert!(
            min_bits <= max_bits,
            "Invalid bit size range {}..={}.",
            min_bits,
            max_bits
        );
        assert!(
            min_bits % 8 == 0 && max_bits % 8 == 0,
            "Bit field bounds {}..={} do not align on byte boundaries.",
            min_bits,
            max_bits
        );
        Self { min_bits, max_bits }
    }

    /// Create a bit field of exactly `bits` bits.
    pub fn fixed(bits: usize) -> Self {
        BitArrayType::new(bits, bits)
    }

    #[inline]
    fn byte_range(&self) -> (usize, usize) {
        (self.min_bits / 8, self.max_bits / 8)
    }
}

impl Display for BitArrayType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "BitArray({}..={})", self.min_bits, self.max_bits)
    }
}

impl IDataType for BitArrayType {
    fn candidate_lengths(&self, data: &[u8]) -> Vec<usize> {
        let (min, max) = self.byte_range();
        if data.len() < min {
            return Vec::new();
        }
        (min..=max.min(data.len())).rev().collect()
    }

    fn validate(&self, data: &[u8]) -> bool {
        let (min, max) = self.byte_range();
        data.len() >= min && data.len() <= max
    }

    fn generate(&self, rng: &mut StdRng) -> Result<Vec<u8>, GenerationError> {
        let (min, max) = self.byte_range();
        let size = rng.gen_range(min..=max);
        Ok((0..size).map(|_| rng.gen::<u8>()).collect())
    }
}
