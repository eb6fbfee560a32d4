//! Typed storage for raw height samples.
//!
//! Terrain providers deliver heights with whatever element width suits their
//! encoding: single-byte digits for packed RGB heightmaps, `u16` for quantized
//! heightmaps, `f32` for raw elevation grids. [`HeightBuffer`] keeps the
//! samples in their native type so that subsetting can copy them verbatim and
//! interpolation can write results back in the same representation.

use std::ops::Range;

use crate::error::{DecodeError, DecodeResult};

/// Numeric element type of a [`HeightBuffer`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SampleType {
    U8,
    I8,
    U16,
    I16,
    U32,
    I32,
    F32,
    F64,
}

impl SampleType {
    /// Size of one element in bytes.
    #[must_use]
    pub fn size(self) -> usize {
        match self {
            Self::U8 | Self::I8 => 1,
            Self::U16 | Self::I16 => 2,
            Self::U32 | Self::I32 | Self::F32 => 4,
            Self::F64 => 8,
        }
    }
}

/// A flat array of height elements.
#[derive(Debug, Clone, PartialEq)]
pub enum HeightBuffer {
    U8(Vec<u8>),
    I8(Vec<i8>),
    U16(Vec<u16>),
    I16(Vec<i16>),
    U32(Vec<u32>),
    I32(Vec<i32>),
    F32(Vec<f32>),
    F64(Vec<f64>),
}

/// Run an expression against the inner vector, whatever its element type.
macro_rules! with_samples {
    ($buffer:expr, $samples:ident => $body:expr) => {
        match $buffer {
            HeightBuffer::U8($samples) => $body,
            HeightBuffer::I8($samples) => $body,
            HeightBuffer::U16($samples) => $body,
            HeightBuffer::I16($samples) => $body,
            HeightBuffer::U32($samples) => $body,
            HeightBuffer::I32($samples) => $body,
            HeightBuffer::F32($samples) => $body,
            HeightBuffer::F64($samples) => $body,
        }
    };
}

/// Build a new buffer of the same element type from the inner vector.
macro_rules! map_samples {
    ($buffer:expr, $samples:ident => $body:expr) => {
        match $buffer {
            HeightBuffer::U8($samples) => HeightBuffer::U8($body),
            HeightBuffer::I8($samples) => HeightBuffer::I8($body),
            HeightBuffer::U16($samples) => HeightBuffer::U16($body),
            HeightBuffer::I16($samples) => HeightBuffer::I16($body),
            HeightBuffer::U32($samples) => HeightBuffer::U32($body),
            HeightBuffer::I32($samples) => HeightBuffer::I32($body),
            HeightBuffer::F32($samples) => HeightBuffer::F32($body),
            HeightBuffer::F64($samples) => HeightBuffer::F64($body),
        }
    };
}

impl HeightBuffer {
    /// Create a buffer of `len` zeroed elements.
    #[must_use]
    pub fn zeroed(sample_type: SampleType, len: usize) -> Self {
        match sample_type {
            SampleType::U8 => Self::U8(vec![0; len]),
            SampleType::I8 => Self::I8(vec![0; len]),
            SampleType::U16 => Self::U16(vec![0; len]),
            SampleType::I16 => Self::I16(vec![0; len]),
            SampleType::U32 => Self::U32(vec![0; len]),
            SampleType::I32 => Self::I32(vec![0; len]),
            SampleType::F32 => Self::F32(vec![0.0; len]),
            SampleType::F64 => Self::F64(vec![0.0; len]),
        }
    }

    /// Reinterpret little-endian bytes as a buffer of `sample_type` elements.
    ///
    /// # Errors
    ///
    /// Returns an error if the byte count is not a multiple of the element size.
    pub fn from_le_bytes(sample_type: SampleType, bytes: &[u8]) -> DecodeResult<Self> {
        let size = sample_type.size();
        if !bytes.len().is_multiple_of(size) {
            return Err(DecodeError::InvalidFormat {
                context: "height buffer",
                detail: format!(
                    "{} bytes is not a multiple of the {size}-byte element size",
                    bytes.len()
                ),
            });
        }

        macro_rules! collect {
            ($ty:ty) => {
                bytes
                    .chunks_exact(size)
                    .map(|chunk| {
                        let mut raw = [0u8; std::mem::size_of::<$ty>()];
                        raw.copy_from_slice(chunk);
                        <$ty>::from_le_bytes(raw)
                    })
                    .collect()
            };
        }

        Ok(match sample_type {
            SampleType::U8 => Self::U8(bytes.to_vec()),
            SampleType::I8 => Self::I8(collect!(i8)),
            SampleType::U16 => Self::U16(collect!(u16)),
            SampleType::I16 => Self::I16(collect!(i16)),
            SampleType::U32 => Self::U32(collect!(u32)),
            SampleType::I32 => Self::I32(collect!(i32)),
            SampleType::F32 => Self::F32(collect!(f32)),
            SampleType::F64 => Self::F64(collect!(f64)),
        })
    }

    /// Element type of this buffer.
    #[must_use]
    pub fn sample_type(&self) -> SampleType {
        match self {
            Self::U8(_) => SampleType::U8,
            Self::I8(_) => SampleType::I8,
            Self::U16(_) => SampleType::U16,
            Self::I16(_) => SampleType::I16,
            Self::U32(_) => SampleType::U32,
            Self::I32(_) => SampleType::I32,
            Self::F32(_) => SampleType::F32,
            Self::F64(_) => SampleType::F64,
        }
    }

    /// Number of elements (not heights) in the buffer.
    #[must_use]
    pub fn len(&self) -> usize {
        with_samples!(self, samples => samples.len())
    }

    /// Check if the buffer holds no elements.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Read one element as `f64`.
    ///
    /// # Panics
    ///
    /// Panics if `index` is out of bounds.
    #[must_use]
    pub fn get(&self, index: usize) -> f64 {
        match self {
            Self::U8(samples) => f64::from(samples[index]),
            Self::I8(samples) => f64::from(samples[index]),
            Self::U16(samples) => f64::from(samples[index]),
            Self::I16(samples) => f64::from(samples[index]),
            Self::U32(samples) => f64::from(samples[index]),
            Self::I32(samples) => f64::from(samples[index]),
            Self::F32(samples) => f64::from(samples[index]),
            Self::F64(samples) => samples[index],
        }
    }

    /// Write one element, converting from `f64` the way a typed array store
    /// does for integer types: the fraction is truncated and out-of-range
    /// values saturate.
    ///
    /// # Panics
    ///
    /// Panics if `index` is out of bounds.
    pub fn set(&mut self, index: usize, value: f64) {
        match self {
            Self::U8(samples) => samples[index] = value as u8,
            Self::I8(samples) => samples[index] = value as i8,
            Self::U16(samples) => samples[index] = value as u16,
            Self::I16(samples) => samples[index] = value as i16,
            Self::U32(samples) => samples[index] = value as u32,
            Self::I32(samples) => samples[index] = value as i32,
            Self::F32(samples) => samples[index] = value as f32,
            Self::F64(samples) => samples[index] = value,
        }
    }

    /// Copy the given element ranges, in order, into a new buffer of the same
    /// element type.
    ///
    /// # Panics
    ///
    /// Panics if any range is out of bounds.
    #[must_use]
    pub fn gather<I>(&self, ranges: I) -> Self
    where
        I: IntoIterator<Item = Range<usize>>,
    {
        map_samples!(self, samples => ranges
            .into_iter()
            .flat_map(|range| samples[range].iter().copied())
            .collect())
    }
}

macro_rules! impl_from_vec {
    ($($ty:ty => $variant:ident),* $(,)?) => {
        $(
            impl From<Vec<$ty>> for HeightBuffer {
                fn from(samples: Vec<$ty>) -> Self {
                    Self::$variant(samples)
                }
            }
        )*
    };
}

impl_from_vec! {
    u8 => U8,
    i8 => I8,
    u16 => U16,
    i16 => I16,
    u32 => U32,
    i32 => I32,
    f32 => F32,
    f64 => F64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_zeroed_matches_type_and_length() {
        let buffer = HeightBuffer::zeroed(SampleType::I16, 9);
        assert_eq!(buffer.sample_type(), SampleType::I16);
        assert_eq!(buffer.len(), 9);
        assert!((0..9).all(|i| buffer.get(i) == 0.0));
    }

    #[test]
    fn test_set_truncates_and_saturates_integers() {
        let mut buffer = HeightBuffer::from(vec![0u8; 3]);
        buffer.set(0, 12.9);
        buffer.set(1, 300.0);
        buffer.set(2, -4.0);
        assert_eq!(buffer, HeightBuffer::U8(vec![12, 255, 0]));
    }

    #[test]
    fn test_set_keeps_fraction_for_floats() {
        let mut buffer = HeightBuffer::from(vec![0.0f32; 1]);
        buffer.set(0, 12.5);
        assert!((buffer.get(0) - 12.5).abs() < f64::EPSILON);
    }

    #[test]
    fn test_gather_preserves_type() {
        let buffer = HeightBuffer::from(vec![1i32, 2, 3, 4, 5, 6]);
        let gathered = buffer.gather([0..2, 4..6]);
        assert_eq!(gathered, HeightBuffer::I32(vec![1, 2, 5, 6]));
    }

    #[test]
    fn test_from_le_bytes_u16() {
        let bytes = [0x01, 0x00, 0x00, 0x01, 0xFF, 0xFF];
        let buffer = HeightBuffer::from_le_bytes(SampleType::U16, &bytes).unwrap();
        assert_eq!(buffer, HeightBuffer::U16(vec![1, 256, 65535]));
    }

    #[test]
    fn test_from_le_bytes_f32() {
        let bytes = 1.5f32.to_le_bytes();
        let buffer = HeightBuffer::from_le_bytes(SampleType::F32, &bytes).unwrap();
        assert_eq!(buffer, HeightBuffer::F32(vec![1.5]));
    }

    #[test]
    fn test_from_le_bytes_misaligned() {
        let result = HeightBuffer::from_le_bytes(SampleType::U32, &[0, 1, 2]);
        assert!(matches!(result, Err(DecodeError::InvalidFormat { .. })));
    }
}
