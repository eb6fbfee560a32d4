//! Mixed-radix height packing.
//!
//! Some terrain encodings spread one height across several buffer elements,
//! e.g. the R, G and B bytes of an image pixel. The elements are the digits of
//! a number in base `element_multiplier`; `is_big_endian` selects whether the
//! first element is the most or the least significant digit.

use crate::buffer::HeightBuffer;

/// Layout of the heights inside a [`HeightBuffer`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HeightCodec {
    /// Number of consecutive elements that make up one height.
    pub elements_per_height: usize,
    /// Radix of each element.
    pub element_multiplier: f64,
    /// Number of elements between the start of consecutive heights.
    pub stride: usize,
    /// Whether the first element is the most significant digit.
    pub is_big_endian: bool,
}

impl Default for HeightCodec {
    fn default() -> Self {
        Self {
            elements_per_height: 1,
            element_multiplier: 256.0,
            stride: 1,
            is_big_endian: false,
        }
    }
}

impl HeightCodec {
    /// Read the encoded height of sample `index`.
    ///
    /// No scale or offset is applied.
    ///
    /// # Panics
    ///
    /// Panics if the sample lies outside `buffer`.
    #[must_use]
    pub fn decode(&self, buffer: &HeightBuffer, index: usize) -> f64 {
        if self.stride == 1 {
            return buffer.get(index);
        }

        let start = index * self.stride;
        let digits = start..start + self.elements_per_height;
        if self.is_big_endian {
            digits.fold(0.0, |height, i| {
                height * self.element_multiplier + buffer.get(i)
            })
        } else {
            digits.rev().fold(0.0, |height, i| {
                height * self.element_multiplier + buffer.get(i)
            })
        }
    }

    /// Write `height` as the encoded height of sample `index`.
    ///
    /// Every element but the least significant one receives a truncated
    /// quotient; the least significant element receives the remainder.
    ///
    /// # Panics
    ///
    /// Panics if the sample lies outside `buffer`.
    pub fn encode(&self, buffer: &mut HeightBuffer, index: usize, height: f64) {
        if self.stride == 1 {
            buffer.set(index, height);
            return;
        }

        let start = index * self.stride;
        let last = self.elements_per_height - 1;
        let mut divisor = self.element_multiplier.powi(last as i32);
        let mut remainder = height;

        for digit in 0..last {
            let element = if self.is_big_endian {
                start + digit
            } else {
                start + last - digit
            };
            buffer.set(element, (remainder / divisor).trunc());
            remainder -= buffer.get(element) * divisor;
            divisor /= self.element_multiplier;
        }

        let least_significant = if self.is_big_endian {
            start + last
        } else {
            start
        };
        buffer.set(least_significant, remainder);
    }

    /// Number of distinct encoded heights this codec can represent.
    #[must_use]
    pub fn capacity(&self) -> f64 {
        self.element_multiplier.powi(self.elements_per_height as i32)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn rgb(is_big_endian: bool) -> HeightCodec {
        HeightCodec {
            elements_per_height: 3,
            element_multiplier: 256.0,
            stride: 4,
            is_big_endian,
        }
    }

    #[test]
    fn test_stride_one_is_direct_access() {
        let codec = HeightCodec::default();
        let mut buffer = HeightBuffer::from(vec![0.0f32; 4]);
        codec.encode(&mut buffer, 2, 123.25);
        assert_eq!(buffer, HeightBuffer::F32(vec![0.0, 0.0, 123.25, 0.0]));
        assert!((codec.decode(&buffer, 2) - 123.25).abs() < f64::EPSILON);
    }

    #[test]
    fn test_decode_big_endian_digits() {
        // Second sample: digits 1, 2, 3 then an unused alpha element.
        let buffer = HeightBuffer::from(vec![0u8, 0, 0, 255, 1, 2, 3, 255]);
        let height = rgb(true).decode(&buffer, 1);
        assert!((height - f64::from(0x01_02_03)).abs() < f64::EPSILON);
    }

    #[test]
    fn test_decode_little_endian_digits() {
        let buffer = HeightBuffer::from(vec![1u8, 2, 3, 255]);
        let height = rgb(false).decode(&buffer, 0);
        assert!((height - f64::from(0x03_02_01)).abs() < f64::EPSILON);
    }

    #[test]
    fn test_encode_leaves_padding_untouched() {
        let mut buffer = HeightBuffer::from(vec![9u8; 8]);
        rgb(true).encode(&mut buffer, 1, f64::from(0x0A_0B_0C));
        assert_eq!(buffer, HeightBuffer::U8(vec![9, 9, 9, 9, 0x0A, 0x0B, 0x0C, 9]));
    }

    #[test]
    fn test_encode_little_endian_order() {
        let mut buffer = HeightBuffer::from(vec![0u8; 4]);
        rgb(false).encode(&mut buffer, 0, f64::from(0x0A_0B_0C));
        assert_eq!(buffer, HeightBuffer::U8(vec![0x0C, 0x0B, 0x0A, 0]));
    }

    #[test]
    fn test_capacity() {
        assert!((rgb(true).capacity() - 16_777_216.0).abs() < f64::EPSILON);
    }

    fn codec_and_height() -> impl Strategy<Value = (HeightCodec, u64)> {
        (1usize..=4, any::<bool>(), 0usize..=2).prop_flat_map(
            |(elements_per_height, is_big_endian, padding)| {
                let codec = HeightCodec {
                    elements_per_height,
                    element_multiplier: 256.0,
                    // Always exercise the multi-element path.
                    stride: elements_per_height + padding.max(1),
                    is_big_endian,
                };
                let max = 256u64.pow(elements_per_height as u32) - 1;
                (Just(codec), 0..=max)
            },
        )
    }

    proptest! {
        #[test]
        fn prop_decode_inverts_encode((codec, height) in codec_and_height(), index in 0usize..3) {
            let mut buffer = HeightBuffer::from(vec![0u8; codec.stride * 3]);
            codec.encode(&mut buffer, index, height as f64);
            prop_assert_eq!(codec.decode(&buffer, index), height as f64);
        }

        #[test]
        fn prop_decode_inverts_encode_wide_elements(
            elements_per_height in 1usize..=4,
            is_big_endian in any::<bool>(),
            digits in proptest::collection::vec(0u16..1000, 4),
        ) {
            let codec = HeightCodec {
                elements_per_height,
                element_multiplier: 1000.0,
                stride: elements_per_height + 1,
                is_big_endian,
            };
            let height = digits[..elements_per_height]
                .iter()
                .fold(0.0, |acc, &digit| acc * 1000.0 + f64::from(digit));
            let mut buffer = HeightBuffer::from(vec![0u16; codec.stride]);
            codec.encode(&mut buffer, 0, height);
            prop_assert_eq!(codec.decode(&buffer, 0), height);
        }
    }
}
