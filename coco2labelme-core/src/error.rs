// Copyright (c) 2025, Tom Ouellette
// Licensed under the MIT License

use std::fmt;

#[derive(Debug, Clone, PartialEq)]
pub enum ConvertError {
    BufferSizeError,
    DatasetReadError(String),
    OrphanAnnotationError { annotation: usize, image_id: u64 },
    RleDecodeError(String),
    UnsupportedSegmentation,
    RecordWriteError(String),
    DuplicateOutputError(String),
    PathError(String),
    DirError(String),
}

impl fmt::Display for ConvertError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            ConvertError::BufferSizeError => {
                write!(
                    f,
                    "[coco2labelme::BufferSizeError] The buffer does not match provided size."
                )
            }
            ConvertError::DatasetReadError(message) => {
                write!(
                    f,
                    "[coco2labelme::DatasetReadError] Failed to read COCO dataset. {}.",
                    message
                )
            }
            ConvertError::OrphanAnnotationError {
                annotation,
                image_id,
            } => {
                write!(
                    f,
                    "[coco2labelme::OrphanAnnotationError] Annotation {} references image id {} which does not exist.",
                    annotation, image_id
                )
            }
            ConvertError::RleDecodeError(message) => {
                write!(
                    f,
                    "[coco2labelme::RleDecodeError] Failed to decode segmentation. {}.",
                    message
                )
            }
            ConvertError::UnsupportedSegmentation => {
                write!(
                    f,
                    "[coco2labelme::UnsupportedSegmentation] Only run-length encoded segmentations are supported."
                )
            }
            ConvertError::RecordWriteError(message) => {
                write!(
                    f,
                    "[coco2labelme::RecordWriteError] Failed to write LabelMe record. {}.",
                    message
                )
            }
            ConvertError::DuplicateOutputError(name) => {
                write!(
                    f,
                    "[coco2labelme::DuplicateOutputError] Output file {} is already claimed by another image.",
                    name
                )
            }
            ConvertError::PathError(message) => {
                write!(
                    f,
                    "[coco2labelme::PathError] Could not resolve path. {}.",
                    message
                )
            }
            ConvertError::DirError(message) => {
                write!(
                    f,
                    "[coco2labelme::DirError] Directory could not be created. {}.",
                    message
                )
            }
        }
    }
}

impl std::error::Error for ConvertError {}
