use super::{Charset, IDataType, TextType, ASCII_PRINTABLE};
use crate::{ConfigurationError, GenerationError};
use rand::rngs::StdRng;
use rand::Rng;
use regex::bytes::Regex;
use std::fmt::Display;

impl Charset {
    fn accepts(&self, data: &[u8]) -> bool {
        match self {
            Charset::Ascii => ASCII_PRINTABLE.is_match(data),
            Charset::Utf8 => std::str::from_utf8(data).is_ok(),
            Charset::Pattern(pattern) => pattern.is_match(data),
        }
    }
}

impl Display for Charset {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Charset::Ascii => write!(f, "ascii"),
            Charset::Utf8 => write!(f, "utf-8"),
            Charset::Pattern(pattern) => write!(f, "/{}/", pattern),
        }
    }
}

impl TextType {
    /// Create a printable ASCII string type accepting between `min` and
    /// `max` characters.
    pub fn ascii(min: usize, max: usize) -> Self {
        TextType::with_charset(Charset::Ascii, min, max)
    }

    /// Create a UTF-8 string type bounded in bytes.
    pub fn utf8(min: usize, max: usize) -> Self {
        TextType::with_charset(Charset::Utf8, min, max)
    }

    /// Create a string type whose values must match the given anchored
    /// pattern. Pattern constrained strings can be parsed but not randomly
    /// generated; specializing one requires a preset or a constant value.
    pub fn pattern(pattern: &str, min: usize, max: usize) -> Result<Self, ConfigurationError> {
        let compiled = Regex::new(pattern).map_err(|err| {
            ConfigurationError::new(
                "InvalidPattern".into(),
                format!("Failed to compile charset pattern {:?}: {}.", pattern, err),
            )
        })?;
        Ok(TextType::with_charset(Charset::Pattern(compiled), min, max))
    }

    pub fn with_charset(charset: Charset, min: usize, max: usize) -> Self {
        assert!(
            min <= max,
            "Invalid text size range {}..={}. The lower bound must not exceed the upper bound.",
            min,
            max
        );
        Self {
            charset,
            min,
            max,
            terminator: None,
        }
    }

    /// Terminate values of this type with the given byte sequence. The
    /// terminator bounds the value on the wire instead of the size range;
    /// it is consumed with the value and re-emitted after generation.
    pub fn terminated(mut self, terminator: impl Into<Vec<u8>>) -> Self {
        let terminator = terminator.into();
        assert!(
            !terminator.is_empty(),
            "A text terminator should not be empty."
        );
        self.terminator = Some(terminator);
        self
    }

    fn split_terminator<'d>(&self, data: &'d [u8]) -> Option<&'d [u8]> {
        match &self.terminator {
            Some(terminator) if data.len() >= terminator.len() => {
                let body_len = data.len() - terminator.len();
                (&data[body_len..] == terminator.as_slice()).then(|| &data[..body_len])
            }
            Some(_) => None,
            None => Some(data),
        }
    }
}

impl Display for TextType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Text({}, {}..={})", self.charset, self.min, self.max)
    }
}

impl IDataType for TextType {
    fn candidate_lengths(&self, data: &[u8]) -> Vec<usize> {
        match &self.terminator {
            Some(terminator) => {
                // Every occurrence of the terminator bounds one candidate.
                let mut candidates = Vec::new();
                let mut from = 0;
                while from + terminator.len() <= data.len() {
                    match data[from..]
                        .windows(terminator.len())
                        .position(|window| window == terminator.as_slice())
                    {
                        Some(offset) => {
                            candidates.push(from + offset + terminator.len());
                            from += offset + 1;
                        }
                        None => break,
                    }
                }
                candidates.reverse();
                candidates
            }
            None => {
                if data.len() < self.min {
                    return Vec::new();
                }
                let upper = self.max.min(data.len());
                (self.min..=upper).rev().collect()
            }
        }
    }

    fn validate(&self, data: &[u8]) -> bool {
        match self.split_terminator(data) {
            Some(body) => {
                body.len() >= self.min && body.len() <= self.max && self.charset.accepts(body)
            }
            None => false,
        }
    }

    fn generate(&self, rng: &mut StdRng) -> Result<Vec<u8>, GenerationError> {
        let size = rng.gen_range(self.min..=self.max);
        let mut value: Vec<u8> = match self.charset {
            Charset::Ascii => (0..size).map(|_| rng.gen_range(0x20u8..=0x7e)).collect(),
            Charset::Utf8 => (0..size).map(|_| rng.gen_range(b'a'..=b'z')).collect(),
            Charset::Pattern(_) => {
                return Err(GenerationError::Unsupported(
                    "a pattern constrained text cannot be drawn at random; pin it with a preset or a constant value".into(),
                ))
            }
        };
        if let Some(terminator) = &self.terminator {
            value.extend_from_slice(terminator);
        }
        Ok(value)
    }
}
