use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::{Result, ScrambleError};

pub const DEFAULT_R_MAX: u32 = 255;
pub const DEFAULT_S_MAX: u32 = 127;

/// A row-major grid of `height × width × channels` 8-bit samples.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Frame {
    height: usize,
    width: usize,
    channels: usize,
    data: Vec<u8>,
}

impl Frame {
    pub fn new(height: usize, width: usize, channels: usize) -> Self {
        Self {
            height,
            width,
            channels,
            data: vec![0; height * width * channels],
        }
    }

    pub fn from_raw(height: usize, width: usize, channels: usize, data: Vec<u8>) -> Result<Self> {
        let expected = height * width * channels;
        if data.len() != expected {
            return Err(ScrambleError::DimensionMismatch {
                expected,
                actual: data.len(),
            });
        }
        Ok(Self {
            height,
            width,
            channels,
            data,
        })
    }

    /// Builds a frame by handing each zeroed row to `fill(y, row)`.
    pub fn from_fn(
        height: usize,
        width: usize,
        channels: usize,
        mut fill: impl FnMut(usize, &mut [u8]),
    ) -> Self {
        let mut frame = Self::new(height, width, channels);
        for y in 0..height {
            fill(y, frame.row_mut(y));
        }
        frame
    }

    #[inline]
    pub fn height(&self) -> usize {
        self.height
    }

    #[inline]
    pub fn width(&self) -> usize {
        self.width
    }

    #[inline]
    pub fn channels(&self) -> usize {
        self.channels
    }

    /// Bytes per row.
    #[inline]
    pub fn stride(&self) -> usize {
        self.width * self.channels
    }

    #[inline]
    pub fn row(&self, y: usize) -> &[u8] {
        let stride = self.stride();
        &self.data[y * stride..(y + 1) * stride]
    }

    #[inline]
    pub fn row_mut(&mut self, y: usize) -> &mut [u8] {
        let stride = self.stride();
        &mut self.data[y * stride..(y + 1) * stride]
    }

    #[inline]
    pub fn as_bytes(&self) -> &[u8] {
        &self.data
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }
}

/// The `(R, S)` pair: `R` is the offset and `2S + 1` the step of the permutation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct Key {
    pub r: u32,
    pub s: u32,
}

impl Key {
    pub const fn new(r: u32, s: u32) -> Self {
        Self { r, s }
    }

    /// Parses key components typed into text fields. Empty fields default to zero.
    pub fn parse(r: &str, s: &str) -> Result<Self> {
        Ok(Self {
            r: parse_component("R", r)?,
            s: parse_component("S", s)?,
        })
    }

    /// Like [`Key::parse`], but keeps `previous` when the input is rejected.
    pub fn parse_or(previous: Key, r: &str, s: &str) -> (Self, Option<ScrambleError>) {
        match Self::parse(r, s) {
            Ok(key) => (key, None),
            Err(e) => (previous, Some(e)),
        }
    }

    /// The odd step `2S + 1`.
    #[inline]
    pub fn step(&self) -> u64 {
        2 * self.s as u64 + 1
    }
}

fn parse_component(name: &str, text: &str) -> Result<u32> {
    let text = text.trim();
    if text.is_empty() {
        return Ok(0);
    }

    let value: i64 = text.parse().map_err(|_| {
        ScrambleError::InvalidKey(format!("{} is not an integer: {:?}", name, text))
    })?;

    if value < 0 {
        return Err(ScrambleError::InvalidKey(format!(
            "{} must be non-negative, got {}",
            name, value
        )));
    }

    u32::try_from(value)
        .map_err(|_| ScrambleError::InvalidKey(format!("{} is out of range: {}", name, value)))
}

impl fmt::Display for Key {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "(R={}, S={})", self.r, self.s)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ScrambleDirection {
    Forward,
    Inverse,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Mode {
    #[default]
    Passthrough,
    Forward,
    Inverse,
}

impl Mode {
    pub fn direction(self) -> Option<ScrambleDirection> {
        match self {
            Mode::Passthrough => None,
            Mode::Forward => Some(ScrambleDirection::Forward),
            Mode::Inverse => Some(ScrambleDirection::Inverse),
        }
    }
}

impl fmt::Display for Mode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Mode::Passthrough => write!(f, "passthrough"),
            Mode::Forward => write!(f, "forward"),
            Mode::Inverse => write!(f, "inverse"),
        }
    }
}

/// A contiguous power-of-two run of rows permuted as one unit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Block {
    pub start: usize,
    pub size: usize,
}

impl Block {
    #[inline]
    pub fn end(&self) -> usize {
        self.start + self.size
    }
}

/// Inclusive key grid explored by the brute-force search.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchBounds {
    pub r_max: u32,
    pub s_max: u32,
}

impl Default for SearchBounds {
    fn default() -> Self {
        Self {
            r_max: DEFAULT_R_MAX,
            s_max: DEFAULT_S_MAX,
        }
    }
}

impl SearchBounds {
    pub const fn new(r_max: u32, s_max: u32) -> Self {
        Self { r_max, s_max }
    }

    /// Number of keys in the grid.
    pub fn candidate_count(&self) -> usize {
        (self.r_max as usize + 1) * (self.s_max as usize + 1)
    }

    /// Keys in search order: `R` outer, `S` inner.
    pub fn keys(&self) -> impl Iterator<Item = Key> + use<> {
        let s_max = self.s_max;
        (0..=self.r_max).flat_map(move |r| (0..=s_max).map(move |s| Key::new(r, s)))
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FramePair {
    pub original: Frame,
    pub transformed: Frame,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_empty_defaults_to_zero() {
        assert_eq!(Key::parse("", " ").unwrap(), Key::new(0, 0));
    }

    #[test]
    fn test_parse_rejects_negative_and_garbage() {
        assert!(matches!(
            Key::parse("-1", "3"),
            Err(ScrambleError::InvalidKey(_))
        ));
        assert!(matches!(
            Key::parse("4", "2.5"),
            Err(ScrambleError::InvalidKey(_))
        ));
        assert!(matches!(
            Key::parse("99999999999", "0"),
            Err(ScrambleError::InvalidKey(_))
        ));
    }

    #[test]
    fn test_parse_or_keeps_previous() {
        let prev = Key::new(7, 9);
        let (key, err) = Key::parse_or(prev, "abc", "1");
        assert_eq!(key, prev);
        assert!(err.is_some());

        let (key, err) = Key::parse_or(prev, "12", "3");
        assert_eq!(key, Key::new(12, 3));
        assert!(err.is_none());
    }

    #[test]
    fn test_from_raw_checks_length() {
        assert!(Frame::from_raw(2, 3, 3, vec![0; 18]).is_ok());
        assert!(matches!(
            Frame::from_raw(2, 3, 3, vec![0; 17]),
            Err(ScrambleError::DimensionMismatch {
                expected: 18,
                actual: 17
            })
        ));
    }

    #[test]
    fn test_bounds_order() {
        let bounds = SearchBounds::new(1, 2);
        let keys: Vec<_> = bounds.keys().collect();
        assert_eq!(keys.len(), bounds.candidate_count());
        assert_eq!(keys[0], Key::new(0, 0));
        assert_eq!(keys[2], Key::new(0, 2));
        assert_eq!(keys[3], Key::new(1, 0));
    }
}
