// Copyright (c) 2025, Tom Ouellette
// Licensed under the MIT License

use std::path::{Component, Path, PathBuf};

use crate::constant::LABELME_EXTENSION;
use crate::error::ConvertError;

/// Ensures an output directory exists, creating missing parents
///
/// # Arguments
///
/// * `directory` - Path to output directory; an existing directory is reused
///
/// # Examples
///
/// ```
/// use coco2labelme_core::ut::path::create_directory;
///
/// let base = std::env::temp_dir().join("TEST_CREATE_DIRECTORY").join("nested");
///
/// create_directory(&base).unwrap();
/// create_directory(&base).unwrap();
/// assert!(base.is_dir());
///
/// std::fs::remove_dir_all(base.parent().unwrap()).unwrap();
/// ```
pub fn create_directory<P: AsRef<Path>>(directory: P) -> Result<PathBuf, ConvertError> {
    let directory = directory.as_ref();

    if directory.exists() && !directory.is_dir() {
        return Err(ConvertError::DirError(format!(
            "{} exists and is not a directory",
            directory.display()
        )));
    }

    std::fs::create_dir_all(directory)
        .map_err(|err| ConvertError::DirError(format!("{}: {}", directory.display(), err)))?;

    Ok(directory.to_path_buf())
}

/// Name of the LabelMe record written for an image file
///
/// The directory part of the image name is dropped and the last
/// extension is replaced.
///
/// # Arguments
///
/// * `file_name` - Image file name as stored in the COCO image table
///
/// # Examples
///
/// ```
/// use coco2labelme_core::ut::path::record_file_name;
///
/// assert_eq!(record_file_name("train/000001.jpg").unwrap(), "000001.json");
/// assert_eq!(record_file_name("scan.v2.png").unwrap(), "scan.v2.json");
/// assert!(record_file_name("").is_err());
/// ```
pub fn record_file_name(file_name: &str) -> Result<String, ConvertError> {
    let stem = Path::new(file_name)
        .file_stem()
        .and_then(|stem| stem.to_str())
        .ok_or_else(|| {
            ConvertError::PathError(format!("Image file name {:?} has no base name", file_name))
        })?;

    Ok(format!("{}.{}", stem, LABELME_EXTENSION))
}

/// Lexically resolve a path against the current directory
///
/// `.` components are dropped and `..` removes the preceding component.
/// Symbolic links are not followed.
pub fn absolute_path<P: AsRef<Path>>(path: P) -> Result<PathBuf, ConvertError> {
    let path = path.as_ref();

    let joined = if path.is_absolute() {
        path.to_path_buf()
    } else {
        std::env::current_dir()
            .map_err(|err| ConvertError::PathError(err.to_string()))?
            .join(path)
    };

    Ok(normalize(&joined))
}

fn normalize(path: &Path) -> PathBuf {
    let mut normalized = PathBuf::new();

    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                normalized.pop();
            }
            other => normalized.push(other.as_os_str()),
        }
    }

    normalized
}

/// Path of `path` relative to the directory `base`
///
/// Both paths are resolved with [`absolute_path`] first.
///
/// # Arguments
///
/// * `path` - Target path
/// * `base` - Directory the result is relative to
///
/// # Examples
///
/// ```
/// use std::path::PathBuf;
/// use coco2labelme_core::ut::path::relative_path;
///
/// let relative = relative_path("/data/coco/images/a.jpg", "/data/labels").unwrap();
/// assert_eq!(relative, PathBuf::from("../coco/images/a.jpg"));
/// ```
pub fn relative_path<P, Q>(path: P, base: Q) -> Result<PathBuf, ConvertError>
where
    P: AsRef<Path>,
    Q: AsRef<Path>,
{
    let path = absolute_path(path)?;
    let base = absolute_path(base)?;

    let path_components: Vec<Component> = path.components().collect();
    let base_components: Vec<Component> = base.components().collect();

    let common = path_components
        .iter()
        .zip(base_components.iter())
        .take_while(|(a, b)| a == b)
        .count();

    if common == 0 {
        return Err(ConvertError::PathError(format!(
            "{} and {} do not share a root",
            path.display(),
            base.display()
        )));
    }

    let mut relative = PathBuf::new();

    for _ in common..base_components.len() {
        relative.push("..");
    }

    for component in &path_components[common..] {
        relative.push(component.as_os_str());
    }

    if relative.as_os_str().is_empty() {
        relative.push(".");
    }

    Ok(relative)
}
