// Copyright (c) 2025, Tom Ouellette
// Licensed under the BSD 3-Clause License

use std::collections::HashMap;

use crate::coco::{Annotation, Category, Image};
use crate::error::ConvertError;

/// How annotations referencing an unknown image id are handled
#[derive(Debug, Copy, Clone, PartialEq, Eq, Default)]
pub enum OrphanPolicy {
    /// Abort indexing with an error
    #[default]
    Error,
    /// Drop the annotation and record its position
    Skip,
}

/// An image paired with the annotations that reference it
#[derive(Debug, Clone)]
pub struct IndexedImage<'a> {
    pub image: &'a Image,
    pub annotations: Vec<&'a Annotation>,
}

/// Images grouped with their annotations
///
/// `images` is aligned with the input image order. `orphans` holds the
/// positions of annotations that were skipped because their image id did
/// not exist.
#[derive(Debug, Clone)]
pub struct ImageIndex<'a> {
    pub images: Vec<IndexedImage<'a>>,
    pub orphans: Vec<usize>,
}

/// Group annotations by the image they belong to
///
/// Images keep their input order and each image keeps the relative
/// input order of its annotations. If two images share an id, the
/// annotations are assigned to the first one.
///
/// # Arguments
///
/// * `images` - COCO image table
/// * `annotations` - COCO annotation table
/// * `policy` - Handling of annotations referencing a missing image
///
/// # Examples
///
/// ```
/// use coco2labelme_core::coco::{Annotation, Image, OrphanPolicy, index_annotations};
///
/// let image = |id: u64| Image { id, width: 2, height: 2, file_name: format!("{}.jpg", id) };
/// let annotation = |image_id: u64| Annotation { id: 0, image_id, category_id: 1, segmentation: None };
///
/// let images = vec![image(1), image(2)];
/// let annotations = vec![annotation(2), annotation(1), annotation(2)];
///
/// let index = index_annotations(&images, &annotations, OrphanPolicy::Error).unwrap();
///
/// assert_eq!(index.images[0].annotations.len(), 1);
/// assert_eq!(index.images[1].annotations.len(), 2);
/// ```
pub fn index_annotations<'a>(
    images: &'a [Image],
    annotations: &'a [Annotation],
    policy: OrphanPolicy,
) -> Result<ImageIndex<'a>, ConvertError> {
    let mut positions: HashMap<u64, usize> = HashMap::with_capacity(images.len());
    for (idx, image) in images.iter().enumerate() {
        positions.entry(image.id).or_insert(idx);
    }

    let mut indexed: Vec<IndexedImage<'a>> = images
        .iter()
        .map(|image| IndexedImage {
            image,
            annotations: Vec::new(),
        })
        .collect();

    let mut orphans = Vec::new();

    for (idx, annotation) in annotations.iter().enumerate() {
        match positions.get(&annotation.image_id) {
            Some(&position) => indexed[position].annotations.push(annotation),
            None => match policy {
                OrphanPolicy::Error => {
                    return Err(ConvertError::OrphanAnnotationError {
                        annotation: idx,
                        image_id: annotation.image_id,
                    });
                }
                OrphanPolicy::Skip => orphans.push(idx),
            },
        }
    }

    Ok(ImageIndex {
        images: indexed,
        orphans,
    })
}

/// Lookup table from category id to category name
///
/// When ids repeat, the first category with a given id wins.
///
/// # Examples
///
/// ```
/// use coco2labelme_core::coco::{Category, CategoryMap};
///
/// let categories = vec![Category { id: 5, name: "cat".to_string(), supercategory: None }];
/// let map = CategoryMap::new(&categories);
///
/// assert_eq!(map.get(5), Some("cat"));
/// assert_eq!(map.get(6), None);
/// ```
#[derive(Debug, Clone, Default)]
pub struct CategoryMap {
    names: HashMap<u64, String>,
}

impl CategoryMap {
    pub fn new(categories: &[Category]) -> Self {
        let mut names = HashMap::with_capacity(categories.len());
        for category in categories {
            names
                .entry(category.id)
                .or_insert_with(|| category.name.clone());
        }

        CategoryMap { names }
    }

    /// Name of the category with the provided id
    pub fn get(&self, id: u64) -> Option<&str> {
        self.names.get(&id).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }
}
