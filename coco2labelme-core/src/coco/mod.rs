// Copyright (c) 2025, Tom Ouellette
// Licensed under the BSD 3-Clause License

use std::fs::File;
use std::io::BufReader;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::ConvertError;
use crate::im::Rle;

mod index;

pub use index::{CategoryMap, ImageIndex, IndexedImage, OrphanPolicy, index_annotations};

/// Top-level COCO dataset
///
/// The `images`, `annotations` and `categories` tables are required. Any
/// other top-level keys (e.g. `info`, `licenses`) are ignored.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Dataset {
    pub images: Vec<Image>,
    pub annotations: Vec<Annotation>,
    pub categories: Vec<Category>,
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct Image {
    pub id: u64,
    pub width: u32,
    pub height: u32,
    pub file_name: String,
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct Annotation {
    #[serde(default)]
    pub id: u64,
    pub image_id: u64,
    pub category_id: u64,
    #[serde(default)]
    pub segmentation: Option<Segmentation>,
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct Category {
    pub id: u64,
    pub name: String,
    #[serde(default)]
    pub supercategory: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Segmentation {
    /// Polygon format: list of polygons, each a flat list of [x, y, x, y, ...] coordinates.
    Polygon(Vec<Vec<f64>>),
    /// Compressed RLE format (as stored in COCO json results).
    CompressedRle { size: [u32; 2], counts: String },
    /// Uncompressed RLE format.
    UncompressedRle { size: [u32; 2], counts: Vec<u32> },
}

// >>> I/O METHODS

impl Dataset {
    /// Open a COCO annotation file
    ///
    /// # Arguments
    ///
    /// * `path` - Path to a COCO json file
    ///
    /// # Examples
    ///
    /// ```no_run
    /// use coco2labelme_core::coco::Dataset;
    /// let dataset = Dataset::open("instances_val2017.json");
    /// ```
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Dataset, ConvertError> {
        let path = path.as_ref();

        let file = File::open(path)
            .map_err(|err| ConvertError::DatasetReadError(format!("{}: {}", path.display(), err)))?;

        serde_json::from_reader(BufReader::new(file))
            .map_err(|err| ConvertError::DatasetReadError(format!("{}: {}", path.display(), err)))
    }

    /// Parse a COCO dataset from a json string
    ///
    /// # Examples
    ///
    /// ```
    /// use coco2labelme_core::coco::Dataset;
    ///
    /// let dataset = Dataset::from_json(r#"{"images": [], "annotations": [], "categories": []}"#);
    /// assert!(dataset.is_ok());
    ///
    /// let dataset = Dataset::from_json(r#"{"images": [], "annotations": []}"#);
    /// assert!(dataset.is_err());
    /// ```
    pub fn from_json(contents: &str) -> Result<Dataset, ConvertError> {
        serde_json::from_str(contents)
            .map_err(|err| ConvertError::DatasetReadError(err.to_string()))
    }
}

// <<< I/O METHODS

impl Annotation {
    /// Run-length encoding of the annotation mask
    ///
    /// The encoded size must match the (height, width) of the owning image.
    /// Polygon segmentations and annotations without a segmentation are
    /// not supported.
    ///
    /// # Arguments
    ///
    /// * `image` - Image the annotation belongs to
    pub fn rle(&self, image: &Image) -> Result<Rle, ConvertError> {
        let (size, rle) = match &self.segmentation {
            Some(Segmentation::CompressedRle { size, counts }) => {
                (size, Rle::from_compressed(counts, size[0], size[1])?)
            }
            Some(Segmentation::UncompressedRle { size, counts }) => {
                (size, Rle::new(size[0], size[1], counts.clone()))
            }
            Some(Segmentation::Polygon(_)) | None => {
                return Err(ConvertError::UnsupportedSegmentation);
            }
        };

        if size[0] != image.height || size[1] != image.width {
            return Err(ConvertError::RleDecodeError(format!(
                "Segmentation size {}x{} does not match image {} of size {}x{}",
                size[0], size[1], image.id, image.height, image.width
            )));
        }

        Ok(rle)
    }
}

#[cfg(test)]
mod test {

    use super::*;

    const TEST_DATASET: &str = r#"{
        "info": {"year": 2017},
        "licenses": [],
        "images": [
            {"id": 1, "width": 4, "height": 4, "file_name": "a.jpg", "license": 3}
        ],
        "annotations": [
            {"id": 7, "image_id": 1, "category_id": 5, "iscrowd": 0,
             "segmentation": {"size": [4, 4], "counts": "52203"}},
            {"image_id": 1, "category_id": 5, "iscrowd": 1,
             "segmentation": {"size": [4, 4], "counts": [5, 2, 2, 2, 5]}},
            {"id": 9, "image_id": 1, "category_id": 5,
             "segmentation": [[0.0, 0.0, 2.0, 0.0, 2.0, 2.0]]}
        ],
        "categories": [{"id": 5, "name": "cat", "supercategory": "animal"}]
    }"#;

    #[test]
    fn test_dataset_from_json() {
        let dataset = Dataset::from_json(TEST_DATASET).unwrap();

        assert_eq!(dataset.images.len(), 1);
        assert_eq!(dataset.annotations.len(), 3);
        assert_eq!(dataset.categories[0].name, "cat");
        assert_eq!(dataset.annotations[1].id, 0);
    }

    #[test]
    fn test_dataset_missing_key() {
        let dataset = Dataset::from_json(r#"{"images": [], "categories": []}"#);
        assert!(matches!(dataset, Err(ConvertError::DatasetReadError(_))));
    }

    #[test]
    fn test_dataset_open_missing_file() {
        let dataset = Dataset::open("does_not_exist.json");
        assert!(dataset.is_err());
    }

    #[test]
    fn test_annotation_rle_compressed_and_uncompressed() {
        let dataset = Dataset::from_json(TEST_DATASET).unwrap();
        let image = &dataset.images[0];

        let compressed = dataset.annotations[0].rle(image).unwrap();
        let uncompressed = dataset.annotations[1].rle(image).unwrap();

        assert_eq!(compressed, uncompressed);
    }

    #[test]
    fn test_annotation_rle_polygon() {
        let dataset = Dataset::from_json(TEST_DATASET).unwrap();
        let rle = dataset.annotations[2].rle(&dataset.images[0]);

        assert_eq!(rle, Err(ConvertError::UnsupportedSegmentation));
    }

    #[test]
    fn test_annotation_rle_size_mismatch() {
        let dataset = Dataset::from_json(TEST_DATASET).unwrap();
        let image = Image {
            id: 1,
            width: 5,
            height: 4,
            file_name: "a.jpg".to_string(),
        };

        let rle = dataset.annotations[0].rle(&image);
        assert!(matches!(rle, Err(ConvertError::RleDecodeError(_))));
    }
}
