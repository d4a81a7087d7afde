//! Wire level data types carried by the leaf variables of a vocabulary.
//!
//! Each type knows how to validate a byte slice, how to enumerate the
//! acceptable prefix lengths while parsing and how to draw a random value
//! while specializing. Integers carry an explicit endianness, sign and unit
//! size; text carries a charset and an optional terminator; raw and bit
//! array types are bounded blobs.
mod bit_array;
mod integer;
mod raw;
mod text;

use crate::GenerationError;
use once_cell::sync::Lazy;
use rand::rngs::StdRng;
use regex::bytes::Regex;
use std::fmt::Display;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
/// Byte order of a multi byte value on the wire.
pub enum Endianness {
    Big,
    Little,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
/// Signedness of an integer value.
pub enum Sign {
    Signed,
    Unsigned,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
/// Unit size of an integer, in bits.
pub enum UnitSize {
    Size8,
    Size16,
    Size32,
    Size64,
}

impl UnitSize {
    #[inline]
    pub fn bits(&self) -> usize {
        match self {
            UnitSize::Size8 => 8,
            UnitSize::Size16 => 16,
            UnitSize::Size32 => 32,
            UnitSize::Size64 => 64,
        }
    }

    #[inline]
    pub fn bytes(&self) -> usize {
        self.bits() / 8
    }
}

#[derive(Debug, Clone)]
/// Accepted alphabet of a [TextType] value.
pub enum Charset {
    /// Printable ASCII, space included.
    Ascii,
    /// Any valid UTF-8 sequence.
    Utf8,
    /// Bytes matching the given anchored pattern.
    Pattern(Regex),
}

pub(crate) static ASCII_PRINTABLE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[\x20-\x7e]*$").expect("charset pattern"));

/// An interface implemented by all wire data types.
///
/// The parse side of the engine asks a type for the prefix lengths worth
/// trying on a buffer; the specialize side asks it to draw a random value.
pub trait IDataType: Display {
    /// Candidate prefix lengths for parsing `data`, ordered by preference
    /// (longest first).
    fn candidate_lengths(&self, data: &[u8]) -> Vec<usize>;

    /// Whether `data`, taken as a whole, is a valid value of the type.
    fn validate(&self, data: &[u8]) -> bool;

    /// Draw a random value of the type.
    fn generate(&self, rng: &mut StdRng) -> Result<Vec<u8>, GenerationError>;
}

#[derive(Debug, Clone)]
/// A bounded blob of opaque bytes.
pub struct RawType {
    min: usize,
    max: usize,
}

#[derive(Debug, Clone)]
/// A bounded character string with a charset and an optional terminator.
pub struct TextType {
    charset: Charset,
    min: usize,
    max: usize,
    terminator: Option<Vec<u8>>,
}

#[derive(Debug, Clone)]
/// A fixed width integer with explicit endianness and sign, optionally
/// restricted to a value interval.
pub struct IntegerType {
    unit: UnitSize,
    endianness: Endianness,
    sign: Sign,
    interval: Option<(i128, i128)>,
}

#[derive(Debug, Clone)]
/// A bounded bit field. Sizes are expressed in bits and must align on byte
/// boundaries: the engine frames whole bytes.
pub struct BitArrayType {
    min_bits: usize,
    max_bits: usize,
}
