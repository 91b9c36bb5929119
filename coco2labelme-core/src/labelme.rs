// Copyright (c) 2025, Tom Ouellette
// Licensed under the BSD 3-Clause License

use std::collections::BTreeMap;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::constant::{LABELME_FILL_COLOR, LABELME_LINE_COLOR, LABELME_VERSION};
use crate::error::ConvertError;
use crate::io::{to_pretty_json, write_atomic};

/// Geometry of a LabelMe shape, decided by its number of points
#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ShapeType {
    Point,
    Line,
    Polygon,
}

impl ShapeType {
    /// Classify a shape by its number of points
    ///
    /// # Examples
    ///
    /// ```
    /// use coco2labelme_core::labelme::ShapeType;
    ///
    /// assert_eq!(ShapeType::from_point_count(0), None);
    /// assert_eq!(ShapeType::from_point_count(1), Some(ShapeType::Point));
    /// assert_eq!(ShapeType::from_point_count(2), Some(ShapeType::Line));
    /// assert_eq!(ShapeType::from_point_count(7), Some(ShapeType::Polygon));
    /// ```
    pub fn from_point_count(n: usize) -> Option<ShapeType> {
        match n {
            0 => None,
            1 => Some(ShapeType::Point),
            2 => Some(ShapeType::Line),
            _ => Some(ShapeType::Polygon),
        }
    }
}

// Fields are declared in key order so serialized records are sorted.

/// A labelled shape within a LabelMe record
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LabelmeShape {
    pub fill_color: Option<[u8; 4]>,
    pub flags: BTreeMap<String, bool>,
    pub label: Option<String>,
    pub line_color: Option<[u8; 4]>,
    pub points: Vec<[u32; 2]>,
    pub shape_type: ShapeType,
}

impl LabelmeShape {
    /// Initialize a shape from contour points
    ///
    /// Returns `None` when there are no points.
    ///
    /// # Arguments
    ///
    /// * `points` - Pixel coordinates in traversal order
    /// * `label` - Category name
    pub fn new(points: Vec<[u32; 2]>, label: Option<String>) -> Option<LabelmeShape> {
        let shape_type = ShapeType::from_point_count(points.len())?;

        Some(LabelmeShape {
            fill_color: None,
            flags: BTreeMap::new(),
            label,
            line_color: None,
            points,
            shape_type,
        })
    }
}

/// Per-image LabelMe annotation record
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LabelmeRecord {
    #[serde(rename = "fillColor")]
    pub fill_color: [u8; 4],
    pub flags: BTreeMap<String, bool>,
    #[serde(rename = "imageData")]
    pub image_data: Option<String>,
    #[serde(rename = "imageHeight")]
    pub image_height: u32,
    #[serde(rename = "imagePath")]
    pub image_path: String,
    #[serde(rename = "imageWidth")]
    pub image_width: u32,
    #[serde(rename = "lineColor")]
    pub line_color: [u8; 4],
    pub shapes: Vec<LabelmeShape>,
    pub version: String,
}

impl LabelmeRecord {
    /// Initialize an empty record for an image
    ///
    /// # Arguments
    ///
    /// * `width` - Image width
    /// * `height` - Image height
    /// * `image_path` - Path to the image relative to the record
    pub fn new(width: u32, height: u32, image_path: String) -> Self {
        LabelmeRecord {
            fill_color: LABELME_FILL_COLOR,
            flags: BTreeMap::new(),
            image_data: None,
            image_height: height,
            image_path,
            image_width: width,
            line_color: LABELME_LINE_COLOR,
            shapes: Vec::new(),
            version: LABELME_VERSION.to_string(),
        }
    }

    /// Number of shapes in the record
    pub fn len(&self) -> usize {
        self.shapes.len()
    }

    /// Check if record has no shapes
    pub fn is_empty(&self) -> bool {
        self.shapes.is_empty()
    }

    /// Serialize as sorted, 4-space indented json
    ///
    /// # Examples
    ///
    /// ```
    /// use coco2labelme_core::labelme::LabelmeRecord;
    ///
    /// let record = LabelmeRecord::new(4, 4, "a.jpg".to_string());
    /// let json = record.to_json().unwrap();
    ///
    /// assert!(json.starts_with("{\n    \"fillColor\": [\n        255,"));
    /// assert!(json.contains("\"shapes\": [],"));
    /// ```
    pub fn to_json(&self) -> Result<String, ConvertError> {
        to_pretty_json(self)
    }

    /// Save the record at the provided path
    ///
    /// The record is written to a temporary sibling file first and then
    /// renamed onto `path`.
    ///
    /// # Arguments
    ///
    /// * `path` - Path to save record
    ///
    /// # Examples
    ///
    /// ```no_run
    /// use coco2labelme_core::labelme::LabelmeRecord;
    /// let record = LabelmeRecord::new(640, 480, "images/a.jpg".to_string());
    /// record.save("labels/a.json").unwrap();
    /// ```
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<(), ConvertError> {
        write_atomic(path, self.to_json()?.as_bytes())
    }

    /// Open a record from the provided path
    pub fn open<P: AsRef<Path>>(path: P) -> Result<LabelmeRecord, ConvertError> {
        let path = path.as_ref();
        let contents = std::fs::read_to_string(path)
            .map_err(|err| ConvertError::PathError(format!("{}: {}", path.display(), err)))?;

        serde_json::from_str(&contents)
            .map_err(|err| ConvertError::PathError(format!("{}: {}", path.display(), err)))
    }
}

#[cfg(test)]
mod test {

    use super::*;

    fn record_with_shape() -> LabelmeRecord {
        let mut record = LabelmeRecord::new(4, 4, "../images/a.jpg".to_string());
        record.shapes.push(
            LabelmeShape::new(
                vec![[1, 1], [1, 2], [2, 2], [2, 1]],
                Some("cat".to_string()),
            )
            .unwrap(),
        );
        record
    }

    fn key_positions(json: &str, keys: &[&str]) -> Vec<usize> {
        keys.iter()
            .map(|key| json.find(&format!("\"{}\":", key)).unwrap())
            .collect()
    }

    #[test]
    fn test_shape_new_empty() {
        assert_eq!(LabelmeShape::new(vec![], None), None);
    }

    #[test]
    fn test_shape_new_types() {
        let point = LabelmeShape::new(vec![[0, 0]], None).unwrap();
        let line = LabelmeShape::new(vec![[0, 0], [1, 1]], None).unwrap();
        let polygon = LabelmeShape::new(vec![[0, 0], [1, 1], [0, 1]], None).unwrap();

        assert_eq!(point.shape_type, ShapeType::Point);
        assert_eq!(line.shape_type, ShapeType::Line);
        assert_eq!(polygon.shape_type, ShapeType::Polygon);
    }

    #[test]
    fn test_record_keys_sorted() {
        let json = record_with_shape().to_json().unwrap();

        let record_keys = [
            "fillColor",
            "flags",
            "imageData",
            "imageHeight",
            "imagePath",
            "imageWidth",
            "lineColor",
            "shapes",
            "version",
        ];

        let positions = key_positions(&json, &record_keys);
        assert!(positions.windows(2).all(|w| w[0] < w[1]), "{}", json);

        let shape = &json[json.find("\"shapes\":").unwrap()..];
        let shape_keys = [
            "fill_color",
            "flags",
            "label",
            "line_color",
            "points",
            "shape_type",
        ];

        let positions = key_positions(shape, &shape_keys);
        assert!(positions.windows(2).all(|w| w[0] < w[1]), "{}", json);
    }

    #[test]
    fn test_record_json_values() {
        let json = record_with_shape().to_json().unwrap();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();

        assert_eq!(value["version"], "3.16.7");
        assert_eq!(value["imageData"], serde_json::Value::Null);
        assert_eq!(value["fillColor"], serde_json::json!([255, 0, 0, 128]));
        assert_eq!(value["lineColor"], serde_json::json!([0, 255, 0, 128]));
        assert_eq!(value["flags"], serde_json::json!({}));
        assert_eq!(value["shapes"][0]["shape_type"], "polygon");
        assert_eq!(value["shapes"][0]["label"], "cat");
        assert_eq!(value["shapes"][0]["line_color"], serde_json::Value::Null);
        assert_eq!(
            value["shapes"][0]["points"],
            serde_json::json!([[1, 1], [1, 2], [2, 2], [2, 1]])
        );
    }

    #[test]
    fn test_record_null_label() {
        let mut record = LabelmeRecord::new(1, 1, "a.jpg".to_string());
        record.shapes.push(LabelmeShape::new(vec![[0, 0]], None).unwrap());

        let json = record.to_json().unwrap();
        assert!(json.contains("\"label\": null,"));
        assert!(json.contains("\"shape_type\": \"point\""));
    }

    #[test]
    fn test_record_save_open() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("a.json");

        let record = record_with_shape();
        record.save(&path).unwrap();

        assert_eq!(LabelmeRecord::open(&path).unwrap(), record);
        assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 1);
    }
}
