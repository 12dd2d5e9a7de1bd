//! Decoding of the packed Sentinel-2 QA60 quality band
//!
//! QA60 encodes per-pixel conditions as individual bits. Bit 10 flags
//! opaque clouds and bit 11 flags cirrus; a pixel is clear iff both bits
//! are zero. The decode must stay bit-exact: any deviation from the
//! two-bit test silently changes classification.

use crate::types::{MaskData, QaData};
use std::collections::HashMap;

/// QA60 bit position for opaque clouds.
pub const QA_CLOUD_BIT: u8 = 10;

/// QA60 bit position for cirrus.
pub const QA_CIRRUS_BIT: u8 = 11;

/// Decode a single bit of the QA band into a boolean raster:
/// `(value >> bit) & 1 == 1`.
pub fn decode_flag(qa: &QaData, bit: u8) -> MaskData {
    qa.mapv(|v| (v >> bit) & 1 == 1)
}

/// Decode several named flags in one pass.
///
/// Returns one boolean raster per (name, bit) pair.
pub fn decode_flags(qa: &QaData, flags: &[(&str, u8)]) -> HashMap<String, MaskData> {
    flags
        .iter()
        .map(|&(name, bit)| (name.to_string(), decode_flag(qa, bit)))
        .collect()
}

/// Authoritative cloud flag from QA60: opaque cloud OR cirrus.
pub fn qa_cloud_mask(qa: &QaData) -> MaskData {
    qa.mapv(|v| (v >> QA_CLOUD_BIT) & 1 == 1 || (v >> QA_CIRRUS_BIT) & 1 == 1)
}

/// Clear-sky flag: negation of [`qa_cloud_mask`] (both bits zero).
pub fn qa_clear_mask(qa: &QaData) -> MaskData {
    qa.mapv(|v| (v >> QA_CLOUD_BIT) & 1 == 0 && (v >> QA_CIRRUS_BIT) & 1 == 0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    #[test]
    fn test_cloud_bits_exhaustive() {
        // All four combinations of bits 10 and 11.
        let qa = array![[
            0_u16,              // neither
            1 << 10,            // opaque cloud only
            1 << 11,            // cirrus only
            (1 << 10) | (1 << 11), // both
        ]];

        let cloud = qa_cloud_mask(&qa);
        assert!(!cloud[[0, 0]]);
        assert!(cloud[[0, 1]]);
        assert!(cloud[[0, 2]]);
        assert!(cloud[[0, 3]]);

        let clear = qa_clear_mask(&qa);
        assert!(clear[[0, 0]]);
        assert!(!clear[[0, 1]]);
        assert!(!clear[[0, 2]]);
        assert!(!clear[[0, 3]]);
    }

    #[test]
    fn test_other_bits_ignored() {
        // Low bits and bit 12 must not leak into the cloud flag.
        let qa = array![[0b0000_0011_1111_1111_u16, 1 << 12]];
        let cloud = qa_cloud_mask(&qa);
        assert!(!cloud[[0, 0]]);
        assert!(!cloud[[0, 1]]);
    }

    #[test]
    fn test_decode_flag() {
        let qa = array![[0b100_u16, 0b010]];
        let flag = decode_flag(&qa, 2);
        assert!(flag[[0, 0]]);
        assert!(!flag[[0, 1]]);
    }

    #[test]
    fn test_decode_flags_named() {
        let qa = array![[(1 << 10) as u16]];
        let flags = decode_flags(&qa, &[("cloud", QA_CLOUD_BIT), ("cirrus", QA_CIRRUS_BIT)]);

        assert!(flags["cloud"][[0, 0]]);
        assert!(!flags["cirrus"][[0, 0]]);
    }
}
