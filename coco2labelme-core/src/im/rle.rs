// Copyright (c) 2025, Tom Ouellette
// Licensed under the BSD 3-Clause License

use crate::constant::RLE_CHAR_OFFSET;
use crate::error::ConvertError;
use crate::im::BinaryMask;

/// A run-length encoded binary mask
///
/// Counts alternate between runs of background and foreground pixels,
/// always starting with background. Pixels are visited in column-major
/// order so pixel (x, y) sits at position `y + h * x`.
///
/// # Examples
///
/// ```
/// use coco2labelme_core::im::Rle;
///
/// let rle = Rle::new(2, 2, vec![1, 2, 1]);
/// let mask = rle.decode().unwrap();
///
/// assert_eq!(mask.as_raw(), &[0, 1, 1, 0]);
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct Rle {
    pub h: u32,
    pub w: u32,
    pub counts: Vec<u32>,
}

impl Rle {
    /// Initialize an uncompressed run-length encoding
    ///
    /// # Arguments
    ///
    /// * `h` - Height of the encoded mask
    /// * `w` - Width of the encoded mask
    /// * `counts` - Alternating background/foreground run lengths
    pub fn new(h: u32, w: u32, counts: Vec<u32>) -> Self {
        Rle { h, w, counts }
    }

    /// Parse the compressed string counts used in COCO json files
    ///
    /// Every count is stored as groups of 5 bits offset into printable
    /// characters with bit 0x20 marking a continuation. Counts after the
    /// third are stored as a difference to the count two positions before.
    ///
    /// # Arguments
    ///
    /// * `counts` - Compressed counts string
    /// * `h` - Height of the encoded mask
    /// * `w` - Width of the encoded mask
    ///
    /// # Examples
    ///
    /// ```
    /// use coco2labelme_core::im::Rle;
    ///
    /// let rle = Rle::from_compressed("52203", 4, 4).unwrap();
    /// assert_eq!(rle.counts, vec![5, 2, 2, 2, 5]);
    ///
    /// assert!(Rle::from_compressed("5 2", 4, 4).is_err());
    /// ```
    pub fn from_compressed(counts: &str, h: u32, w: u32) -> Result<Self, ConvertError> {
        let bytes = counts.as_bytes();
        let mut decoded: Vec<u32> = Vec::with_capacity(bytes.len());
        let mut position = 0;

        while position < bytes.len() {
            let mut value: i64 = 0;
            let mut group = 0;

            loop {
                let byte = *bytes.get(position).ok_or_else(|| {
                    ConvertError::RleDecodeError(
                        "Compressed counts end in the middle of a run".to_string(),
                    )
                })?;

                if !(RLE_CHAR_OFFSET..RLE_CHAR_OFFSET + 64).contains(&byte) {
                    return Err(ConvertError::RleDecodeError(format!(
                        "Invalid character {:?} at position {} of compressed counts",
                        byte as char, position
                    )));
                }

                if group == 12 {
                    return Err(ConvertError::RleDecodeError(
                        "Compressed run length overflows 64 bits".to_string(),
                    ));
                }

                let c = (byte - RLE_CHAR_OFFSET) as i64;
                value |= (c & 0x1f) << (5 * group);
                position += 1;
                group += 1;

                if c & 0x20 == 0 {
                    if c & 0x10 != 0 {
                        value |= -1i64 << (5 * group);
                    }
                    break;
                }
            }

            let m = decoded.len();
            if m > 2 {
                value += decoded[m - 2] as i64;
            }

            if value < 0 || value > u32::MAX as i64 {
                return Err(ConvertError::RleDecodeError(format!(
                    "Run {} has an invalid length {}",
                    m, value
                )));
            }

            decoded.push(value as u32);
        }

        Ok(Rle::new(h, w, decoded))
    }

    /// Number of foreground pixels
    pub fn area(&self) -> u64 {
        self.counts.iter().skip(1).step_by(2).map(|&c| c as u64).sum()
    }

    /// Decode into a row-major binary mask
    ///
    /// Runs that stop short of `h * w` leave the remaining pixels as
    /// background. Runs extending past the end of the mask are an error.
    pub fn decode(&self) -> Result<BinaryMask, ConvertError> {
        let h = self.h as usize;
        let w = self.w as usize;
        let n = h * w;

        let mut buffer = vec![0u8; n];
        let mut start = 0usize;
        let mut foreground = false;

        for &count in &self.counts {
            let end = start + count as usize;

            if end > n {
                return Err(ConvertError::RleDecodeError(format!(
                    "Run lengths exceed the {}x{} mask size",
                    self.h, self.w
                )));
            }

            if foreground {
                for idx in start..end {
                    buffer[(idx % h) * w + idx / h] = 1;
                }
            }

            start = end;
            foreground = !foreground;
        }

        BinaryMask::new(self.w, self.h, buffer)
    }
}
