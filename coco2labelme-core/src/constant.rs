// Copyright (c) 2025, Tom Ouellette
// Licensed under the BSD 3-Clause License

// Supported COCO annotation file formats
pub const SUPPORTED_ANNOTATION_FORMATS: [&str; 1] = ["json"];

// Extension of written LabelMe records
pub const LABELME_EXTENSION: &str = "json";

// LabelMe schema version stamped on every record
pub const LABELME_VERSION: &str = "3.16.7";

// Default RGBA colors of a LabelMe record
pub const LABELME_FILL_COLOR: [u8; 4] = [255, 0, 0, 128];
pub const LABELME_LINE_COLOR: [u8; 4] = [0, 255, 0, 128];

// Indentation used when serializing LabelMe records
pub const LABELME_INDENT: &[u8] = b"    ";

// Offset of the first printable character in compressed COCO counts
pub const RLE_CHAR_OFFSET: u8 = 48;

// Tag prefixed to console output
pub const LOG_TAG: &str = "coco2labelme";

// Brand color of the console tag
pub const LOG_TAG_COLOR: [u8; 3] = [103, 194, 69];
