use super::{Endianness, IDataType, IntegerType, Sign, UnitSize};
use crate::util::bits;
use crate::GenerationError;
use rand::rngs::StdRng;
use rand::Rng;
use std::fmt::Display;

impl IntegerType {
    pub fn new(unit: UnitSize, endianness: Endianness, sign: Sign) -> Self {
        Self {
            unit,
            endianness,
            sign,
            interval: None,
        }
    }

    /// Network order unsigned 8 bit integer.
    pub fn u8() -> Self {
        IntegerType::new(UnitSize::Size8, Endianness::Big, Sign::Unsigned)
    }

    /// Network order unsigned 16 bit integer.
    pub fn u16() -> Self {
        IntegerType::new(UnitSize::Size16, Endianness::Big, Sign::Unsigned)
    }

    /// Network order unsigned 32 bit integer.
    pub fn u32() -> Self {
        IntegerType::new(UnitSize::Size32, Endianness::Big, Sign::Unsigned)
    }

    /// Network order unsigned 64 bit integer.
    pub fn u64() -> Self {
        IntegerType::new(UnitSize::Size64, Endianness::Big, Sign::Unsigned)
    }

    pub fn little_endian(mut self) -> Self {
        self.endianness = Endianness::Little;
        self
    }

    pub fn signed(mut self) -> Self {
        self.sign = Sign::Signed;
        self
    }

    /// Restrict the accepted and generated values to `low..=high`.
    pub fn bounded(mut self, low: i128, high: i128) -> Self {
        assert!(
            low <= high,
            "Invalid integer interval {}..={}.",
            low,
            high
        );
        self.interval = Some((low, high));
        self
    }

    #[inline]
    pub fn width(&self) -> usize {
        self.unit.bytes()
    }

    #[inline]
    pub fn endianness(&self) -> Endianness {
        self.endianness
    }

    fn value_bounds(&self) -> (i128, i128) {
        if let Some(interval) = self.interval {
            return interval;
        }
        let bits = self.unit.bits() as u32;
        match self.sign {
            Sign::Unsigned => (0, (1i128 << bits) - 1),
            Sign::Signed => (-(1i128 << (bits - 1)), (1i128 << (bits - 1)) - 1),
        }
    }

    /// Decode `data` according to the endianness and sign of the type.
    pub fn decode(&self, data: &[u8]) -> i128 {
        match self.sign {
            Sign::Unsigned => bits::decode_unsigned(data, self.endianness) as i128,
            Sign::Signed => bits::decode_signed(data, self.endianness),
        }
    }

    /// Encode `value` on the unit width of the type.
    pub fn encode(&self, value: i128) -> Vec<u8> {
        bits::encode_integer(value, self.width(), self.endianness)
    }
}

impl Display for IntegerType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let sign = match self.sign {
            Sign::Unsigned => "u",
            Sign::Signed => "i",
        };
        let order = match self.endianness {
            Endianness::Big => "be",
            Endianness::Little => "le",
        };
        write!(f, "Integer({}{}, {})", sign, self.unit.bits(), order)
    }
}

impl IDataType for IntegerType {
    fn candidate_lengths(&self, data: &[u8]) -> Vec<usize> {
        if data.len() >= self.width() {
            vec![self.width()]
        } else {
            Vec::new()
        }
    }

    fn validate(&self, data: &[u8]) -> bool {
        if data.len() != self.width() {
            return false;
        }
        let (low, high) = self.value_bounds();
        let value = self.decode(data);
        value >= low && value <= high
    }

    fn generate(&self, rng: &mut StdRng) -> Result<Vec<u8>, GenerationError> {
        let (low, high) = self.value_bounds();
        Ok(self.encode(rng.gen_range(low..=high)))
    }
}
