// Copyright (c) 2025, Tom Ouellette
// Licensed under the BSD 3-Clause License

use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};

use kdam::TqdmParallelIterator;
use rayon::iter::{IntoParallelIterator, ParallelIterator};

use crate::coco::{
    Annotation, CategoryMap, Dataset, Image, IndexedImage, OrphanPolicy, index_annotations,
};
use crate::error::ConvertError;
use crate::labelme::{LabelmeRecord, LabelmeShape};
use crate::ut;

/// How annotations whose segmentation cannot be decoded are handled
#[derive(Debug, Copy, Clone, PartialEq, Eq, Default)]
pub enum DecodeErrorPolicy {
    /// Drop the annotation and keep converting the image
    #[default]
    Skip,
    /// Fail the whole image
    Fail,
}

/// Shared, read-only state for converting a dataset
///
/// # Examples
///
/// ```
/// use coco2labelme_core::coco::{Dataset, OrphanPolicy};
/// use coco2labelme_core::convert::ConvertContext;
///
/// let dataset = Dataset::from_json(r#"{"images": [], "annotations": [], "categories": []}"#).unwrap();
///
/// let context = ConvertContext::new(&dataset, "coco/annotations.json", "labels")
///     .with_orphan_policy(OrphanPolicy::Skip);
///
/// assert_eq!(context.image_root(), std::path::Path::new("coco"));
/// ```
#[derive(Debug, Clone)]
pub struct ConvertContext {
    categories: CategoryMap,
    image_root: PathBuf,
    output: PathBuf,
    orphans: OrphanPolicy,
    decode_errors: DecodeErrorPolicy,
}

impl ConvertContext {
    /// Initialize a conversion context
    ///
    /// # Arguments
    ///
    /// * `dataset` - COCO dataset providing the category table
    /// * `input` - Path of the COCO annotation file; image file names are relative to its directory
    /// * `output` - Directory receiving the LabelMe records
    pub fn new<P: AsRef<Path>, Q: AsRef<Path>>(dataset: &Dataset, input: P, output: Q) -> Self {
        let image_root = input
            .as_ref()
            .parent()
            .map(Path::to_path_buf)
            .unwrap_or_default();

        ConvertContext {
            categories: CategoryMap::new(&dataset.categories),
            image_root,
            output: output.as_ref().to_path_buf(),
            orphans: OrphanPolicy::default(),
            decode_errors: DecodeErrorPolicy::default(),
        }
    }

    pub fn with_orphan_policy(mut self, policy: OrphanPolicy) -> Self {
        self.orphans = policy;
        self
    }

    pub fn with_decode_error_policy(mut self, policy: DecodeErrorPolicy) -> Self {
        self.decode_errors = policy;
        self
    }

    pub fn categories(&self) -> &CategoryMap {
        &self.categories
    }

    pub fn image_root(&self) -> &Path {
        &self.image_root
    }

    pub fn output(&self) -> &Path {
        &self.output
    }

    pub fn orphan_policy(&self) -> OrphanPolicy {
        self.orphans
    }

    pub fn decode_error_policy(&self) -> DecodeErrorPolicy {
        self.decode_errors
    }

    /// Path of an image relative to the output directory
    pub fn image_path(&self, image: &Image) -> Result<String, ConvertError> {
        let image_path = self.image_root.join(&image.file_name);
        let relative = ut::path::relative_path(image_path, &self.output)?;
        Ok(relative.to_string_lossy().into_owned())
    }
}

/// Convert a single annotation into a LabelMe shape
///
/// Returns `Ok(None)` when the decoded mask has no foreground and the
/// annotation contributes no shape.
///
/// # Arguments
///
/// * `annotation` - COCO annotation with a run-length encoded segmentation
/// * `image` - Image the annotation belongs to
/// * `categories` - Category id to name lookup
///
/// # Examples
///
/// ```
/// use coco2labelme_core::coco::{Annotation, CategoryMap, Category, Image, Segmentation};
/// use coco2labelme_core::convert::annotation_to_shape;
/// use coco2labelme_core::labelme::ShapeType;
///
/// let image = Image { id: 1, width: 4, height: 4, file_name: "a.jpg".to_string() };
/// let annotation = Annotation {
///     id: 1,
///     image_id: 1,
///     category_id: 5,
///     segmentation: Some(Segmentation::CompressedRle { size: [4, 4], counts: "52203".to_string() }),
/// };
/// let categories = CategoryMap::new(&[Category { id: 5, name: "cat".to_string(), supercategory: None }]);
///
/// let shape = annotation_to_shape(&annotation, &image, &categories).unwrap().unwrap();
///
/// assert_eq!(shape.shape_type, ShapeType::Polygon);
/// assert_eq!(shape.label.as_deref(), Some("cat"));
/// assert_eq!(shape.points, vec![[1, 1], [1, 2], [2, 2], [2, 1]]);
/// ```
pub fn annotation_to_shape(
    annotation: &Annotation,
    image: &Image,
    categories: &CategoryMap,
) -> Result<Option<LabelmeShape>, ConvertError> {
    let mask = annotation.rle(image)?.decode()?;
    let label = categories.get(annotation.category_id).map(str::to_string);

    Ok(LabelmeShape::new(mask.points(), label))
}

/// A converted image record with the annotations that were dropped
#[derive(Debug, Clone)]
pub struct ConvertedImage {
    pub record: LabelmeRecord,
    /// Position within the image's annotations and the decode error
    pub dropped: Vec<(usize, ConvertError)>,
}

/// Convert an image and its annotations into a LabelMe record
///
/// # Arguments
///
/// * `indexed` - Image paired with its annotations
/// * `context` - Conversion context
pub fn convert_image(
    indexed: &IndexedImage,
    context: &ConvertContext,
) -> Result<ConvertedImage, ConvertError> {
    let image = indexed.image;
    let mut record = LabelmeRecord::new(image.width, image.height, context.image_path(image)?);
    let mut dropped = Vec::new();

    for (idx, annotation) in indexed.annotations.iter().enumerate() {
        match annotation_to_shape(annotation, image, &context.categories) {
            Ok(Some(shape)) => record.shapes.push(shape),
            Ok(None) => {}
            Err(err) => match context.decode_errors {
                DecodeErrorPolicy::Skip => dropped.push((idx, err)),
                DecodeErrorPolicy::Fail => return Err(err),
            },
        }
    }

    Ok(ConvertedImage { record, dropped })
}

/// An annotation left out of its image's record
#[derive(Debug, Clone, PartialEq)]
pub struct DroppedAnnotation {
    /// File name of the image the annotation belongs to
    pub file_name: String,
    /// COCO id of the annotation
    pub annotation_id: u64,
    pub error: ConvertError,
}

/// Summary of a dataset conversion
#[derive(Debug, Clone, Default)]
pub struct ConversionReport {
    /// Number of records written
    pub converted: usize,
    /// Number of shapes across all written records
    pub shapes: usize,
    /// Number of images never started because the run was stopped
    pub not_started: usize,
    /// Positions of annotations skipped for referencing a missing image
    pub orphans: Vec<usize>,
    /// Annotations dropped because they could not be decoded
    pub dropped: Vec<DroppedAnnotation>,
    /// Image file name and error for each image that was not written
    pub failed: Vec<(String, ConvertError)>,
}

impl ConversionReport {
    /// Check if every image was converted
    pub fn is_complete(&self) -> bool {
        self.failed.is_empty() && self.not_started == 0
    }
}

enum ImageOutcome {
    Converted {
        shapes: usize,
        dropped: Vec<(usize, ConvertError)>,
    },
    Failed(ConvertError),
    NotStarted,
}

/// Convert every image of a dataset and write one record per image
///
/// Images are converted in parallel. Before an image is started the
/// `stop` flag is checked; once it is set no further images are started
/// while images already in progress are completed.
///
/// # Arguments
///
/// * `dataset` - COCO dataset
/// * `context` - Conversion context; a missing output directory is created
///   once every annotation has been indexed
/// * `stop` - Flag requesting the run to stop
/// * `verbose` - Show a progress bar
pub fn convert_dataset(
    dataset: &Dataset,
    context: &ConvertContext,
    stop: &AtomicBool,
    verbose: bool,
) -> Result<ConversionReport, ConvertError> {
    let index = index_annotations(&dataset.images, &dataset.annotations, context.orphans)?;
    let names = claim_record_names(&dataset.images);

    ut::path::create_directory(&context.output)?;

    let pb = ut::track::progress_bar(index.images.len(), "Converting images", verbose);

    let mut outcomes: Vec<(usize, ImageOutcome)> = (0..index.images.len())
        .into_par_iter()
        .tqdm_with_bar(pb)
        .map(|idx| {
            if stop.load(Ordering::SeqCst) {
                return (idx, ImageOutcome::NotStarted);
            }

            let outcome = match write_image(&index.images[idx], &names[idx], context) {
                Ok(converted) => ImageOutcome::Converted {
                    shapes: converted.record.len(),
                    dropped: converted.dropped,
                },
                Err(err) => ImageOutcome::Failed(err),
            };

            (idx, outcome)
        })
        .collect();

    outcomes.sort_by_key(|(idx, _)| *idx);

    let mut report = ConversionReport {
        orphans: index.orphans,
        ..Default::default()
    };

    for (idx, outcome) in outcomes {
        let indexed = &index.images[idx];
        let file_name = &indexed.image.file_name;

        match outcome {
            ImageOutcome::Converted { shapes, dropped } => {
                report.converted += 1;
                report.shapes += shapes;
                report
                    .dropped
                    .extend(dropped.into_iter().map(|(position, error)| DroppedAnnotation {
                        file_name: file_name.clone(),
                        annotation_id: indexed.annotations[position].id,
                        error,
                    }));
            }
            ImageOutcome::Failed(err) => report.failed.push((file_name.clone(), err)),
            ImageOutcome::NotStarted => report.not_started += 1,
        }
    }

    Ok(report)
}

fn write_image(
    indexed: &IndexedImage,
    name: &Result<String, ConvertError>,
    context: &ConvertContext,
) -> Result<ConvertedImage, ConvertError> {
    let name = name.as_ref().map_err(Clone::clone)?;
    let converted = convert_image(indexed, context)?;
    converted.record.save(context.output.join(name))?;
    Ok(converted)
}

/// Record file name of each image; later images repeating a name fail
fn claim_record_names(images: &[Image]) -> Vec<Result<String, ConvertError>> {
    let mut claimed: HashSet<String> = HashSet::with_capacity(images.len());

    images
        .iter()
        .map(|image| {
            let name = ut::path::record_file_name(&image.file_name)?;
            if claimed.insert(name.clone()) {
                Ok(name)
            } else {
                Err(ConvertError::DuplicateOutputError(name))
            }
        })
        .collect()
}
