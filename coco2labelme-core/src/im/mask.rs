// Copyright (c) 2025, Tom Ouellette
// Licensed under the BSD 3-Clause License

use crate::cv::find_external_contours;
use crate::error::ConvertError;

/// A row-major container storing binary mask pixels
///
/// Non-zero pixels are foreground. The length of the container must be
/// equal to the product of `w` * `h`.
///
/// # Examples
///
/// ```
/// use coco2labelme_core::im::BinaryMask;
///
/// let width = 10;
/// let height = 10;
/// let mask = BinaryMask::new(width, height, vec![0u8; (width * height) as usize]);
///
/// assert_eq!(mask.unwrap().len(), (width * height) as usize);
/// ```
///
/// ```
/// use coco2labelme_core::im::BinaryMask;
///
/// let mask = BinaryMask::new(10, 10, vec![0u8; 10]);
///
/// assert!(mask.is_err()); // Buffer size does not match dimensions
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct BinaryMask {
    w: u32,           // Width
    h: u32,           // Height
    buffer: Vec<u8>, // Row-major pixels
}

impl BinaryMask {
    /// Initialize a new binary mask
    ///
    /// # Arguments
    ///
    /// * `width` - Mask width
    /// * `height` - Mask height
    /// * `buffer` - Row-major pixels
    pub fn new(width: u32, height: u32, buffer: Vec<u8>) -> Result<BinaryMask, ConvertError> {
        if (width as usize) * (height as usize) == buffer.len() {
            Ok(BinaryMask {
                w: width,
                h: height,
                buffer,
            })
        } else {
            Err(ConvertError::BufferSizeError)
        }
    }
}

// >>> PROPERTY METHODS

impl BinaryMask {
    /// Width of the mask
    pub fn width(&self) -> u32 {
        self.w
    }

    /// Height of the mask
    pub fn height(&self) -> u32 {
        self.h
    }

    /// Shape/dimensions of the mask
    pub fn shape(&self) -> (u32, u32) {
        (self.h, self.w)
    }

    /// Length of the raw mask
    pub fn len(&self) -> usize {
        self.buffer.len()
    }

    /// Check if mask has no pixels
    pub fn is_empty(&self) -> bool {
        self.buffer.is_empty()
    }

    /// Number of foreground pixels
    pub fn area(&self) -> usize {
        self.buffer.iter().filter(|&&pixel| pixel != 0).count()
    }
}

// <<< PROPERTY METHODS

// >>> CONVERSION METHODS

impl BinaryMask {
    /// Returns a reference to the raw mask
    pub fn as_raw(&self) -> &[u8] {
        &self.buffer
    }

    /// Foreground value at (x, y)
    pub fn get(&self, x: u32, y: u32) -> Option<bool> {
        if x >= self.w || y >= self.h {
            return None;
        }

        Some(self.buffer[(y as usize) * (self.w as usize) + x as usize] != 0)
    }

    /// Extract the simplified outer contour of each top-level object
    pub fn contours(&self) -> Vec<Vec<[u32; 2]>> {
        find_external_contours(self.w, self.h, &self.buffer)
    }

    /// Contour points of all top-level objects flattened in contour order
    ///
    /// # Examples
    ///
    /// ```
    /// use coco2labelme_core::im::BinaryMask;
    ///
    /// let mask = BinaryMask::new(3, 3, vec![1, 0, 0, 0, 0, 0, 0, 0, 1]).unwrap();
    ///
    /// assert_eq!(mask.points(), vec![[2, 2], [0, 0]]);
    /// ```
    pub fn points(&self) -> Vec<[u32; 2]> {
        self.contours().into_iter().flatten().collect()
    }
}

// <<< CONVERSION METHODS

#[cfg(test)]
mod test {

    use super::*;

    #[test]
    fn test_mask_new_success() {
        let mask = BinaryMask::new(2, 3, vec![0, 1, 0, 1, 0, 1]);
        assert!(mask.is_ok());
    }

    #[test]
    fn test_mask_new_error() {
        let mask = BinaryMask::new(3, 3, vec![0, 1, 0, 1, 0, 1]);
        assert_eq!(mask, Err(ConvertError::BufferSizeError));
    }

    #[test]
    fn test_mask_shape() {
        let mask = BinaryMask::new(2, 3, vec![0u8; 6]).unwrap();
        assert_eq!(mask.shape(), (3, 2));
        assert_eq!(mask.len(), 6);
        assert!(!mask.is_empty());
    }

    #[test]
    fn test_mask_get() {
        let mask = BinaryMask::new(2, 2, vec![0, 1, 0, 0]).unwrap();

        assert_eq!(mask.get(1, 0), Some(true));
        assert_eq!(mask.get(0, 1), Some(false));
        assert_eq!(mask.get(2, 0), None);
    }

    #[test]
    fn test_mask_area() {
        let mask = BinaryMask::new(2, 2, vec![0, 1, 255, 0]).unwrap();
        assert_eq!(mask.area(), 2);
    }

    #[test]
    fn test_mask_points_square() {
        let mut buffer = vec![0u8; 16];
        buffer[5] = 1;
        buffer[6] = 1;
        buffer[9] = 1;
        buffer[10] = 1;

        let mask = BinaryMask::new(4, 4, buffer).unwrap();

        assert_eq!(mask.points(), vec![[1, 1], [1, 2], [2, 2], [2, 1]]);
    }

    #[test]
    fn test_mask_points_empty() {
        let mask = BinaryMask::new(4, 4, vec![0u8; 16]).unwrap();
        assert!(mask.points().is_empty());
    }
}
