// Copyright (c) 2025, Tom Ouellette
// Licensed under the BSD 3-Clause License

use std::collections::VecDeque;

// Clockwise 8-neighbourhood starting west (y points down)
const NEIGHBOURS: [[i32; 2]; 8] = [
    [-1, 0],  // West
    [-1, -1], // Northwest
    [0, -1],  // North
    [1, -1],  // Northeast
    [1, 0],   // East
    [1, 1],   // Southeast
    [0, 1],   // South
    [-1, 1],  // Southwest
];

/// Find all borders of a binary mask using 8-connectivity
///
/// Borders are returned in raster order of their starting pixel. Each
/// border records whether it is an outer border or a hole border and
/// the index of its parent border (`None` for borders directly inside
/// the image frame).
///
/// # Arguments
///
/// * `width` - Width of mask
/// * `height` - Height of mask
/// * `pixels` - A row-major mask buffer where non-zero pixels are foreground
///
/// # References
///
/// Suzuki, S. and Abe, K. (1985). Topological structural analysis of
/// digitized binary images by border following.
///
/// Adapted/modified from: https://github.com/image-rs/imageproc
///
/// # Examples
///
/// ```
/// use coco2labelme_core::cv::contours::{BorderType, find_contours};
///
/// let pixels: Vec<u8> = vec![1, 1, 1, 1, 0, 1, 1, 1, 1];
/// let contours = find_contours(3, 3, &pixels);
///
/// assert_eq!(contours.len(), 2);
/// assert_eq!(contours[0].border_type(), &BorderType::Outer);
/// assert_eq!(contours[1].border_type(), &BorderType::Hole);
/// assert_eq!(contours[1].parent(), Some(0));
/// ```
pub fn find_contours(width: u32, height: u32, pixels: &[u8]) -> Vec<Contour> {
    let width = width as usize;
    let height = height as usize;
    let padded_width = width + 2;
    let padded_height = height + 2;

    let at = |x: usize, y: usize| x + padded_width * y;

    let mut image_values = vec![0i32; padded_height * padded_width];

    for y in 0..height {
        for x in 0..width {
            if pixels[y * width + x] != 0 {
                image_values[at(x + 1, y + 1)] = 1;
            }
        }
    }

    let mut contours: Vec<Contour> = Vec::new();
    let mut curr_border_num = 1;

    for y in 1..=height {
        let mut last_border_num = 1;

        for x in 1..=width {
            let value = image_values[at(x, y)];

            if value == 0 {
                continue;
            }

            let start = if value == 1 && image_values[at(x - 1, y)] == 0 {
                Some((BorderType::Outer, [x as i32 - 1, y as i32]))
            } else if value >= 1 && image_values[at(x + 1, y)] == 0 {
                if value > 1 {
                    last_border_num = value;
                }
                Some((BorderType::Hole, [x as i32 + 1, y as i32]))
            } else {
                None
            };

            if let Some((border_type, adjacent)) = start {
                curr_border_num += 1;

                let parent = parent_border(&contours, border_type, last_border_num);
                let points = follow_border(
                    &mut image_values,
                    padded_width,
                    [x as i32, y as i32],
                    adjacent,
                    curr_border_num,
                );

                contours.push(Contour::new(points, border_type, parent));
            }

            let value = image_values[at(x, y)];
            if value != 1 {
                last_border_num = value.abs();
            }
        }
    }

    contours
}

/// Find the simplified outer contour of every top-level object
///
/// Holes and objects nested inside holes are ignored. Each contour only
/// keeps the vertices where the boundary changes direction. Contours are
/// returned in reverse raster order of their starting pixel, so the object
/// found last comes first.
///
/// # Arguments
///
/// * `width` - Width of mask
/// * `height` - Height of mask
/// * `pixels` - A row-major mask buffer where non-zero pixels are foreground
///
/// # Examples
///
/// ```
/// use coco2labelme_core::cv::find_external_contours;
///
/// let pixels: Vec<u8> = vec![1, 1, 0, 1, 1, 0, 0, 0, 0];
/// let contours = find_external_contours(3, 3, &pixels);
///
/// assert_eq!(contours, [[[0, 0], [0, 1], [1, 1], [1, 0]]]);
///
/// let pixels: Vec<u8> = vec![1, 0, 0, 0, 0, 0, 0, 0, 1];
/// let contours = find_external_contours(3, 3, &pixels);
///
/// assert_eq!(contours, [[[2, 2]], [[0, 0]]]);
/// ```
pub fn find_external_contours(width: u32, height: u32, pixels: &[u8]) -> Vec<Vec<[u32; 2]>> {
    let mut contours: Vec<Vec<[u32; 2]>> = find_contours(width, height, pixels)
        .into_iter()
        .filter(|contour| {
            contour.border_type() == &BorderType::Outer && contour.parent().is_none()
        })
        .map(|contour| approximate_chain(contour.as_points()))
        .collect();

    contours.reverse();
    contours
}

/// Drop contour points lying inside straight horizontal, vertical or diagonal runs
///
/// The first point is always kept. A point is kept when the direction
/// towards the next point differs from the direction it was reached from.
///
/// # Examples
///
/// ```
/// use coco2labelme_core::cv::contours::approximate_chain;
///
/// let line = [[0, 2], [1, 2], [2, 2], [1, 2]];
/// assert_eq!(approximate_chain(&line), vec![[0, 2], [2, 2]]);
/// ```
pub fn approximate_chain(points: &[[u32; 2]]) -> Vec<[u32; 2]> {
    let n = points.len();

    if n < 3 {
        return points.to_vec();
    }

    let direction = |idx: usize| {
        let [x0, y0] = points[idx];
        let [x1, y1] = points[(idx + 1) % n];
        [x1 as i64 - x0 as i64, y1 as i64 - y0 as i64]
    };

    let mut approximated = vec![points[0]];
    let mut previous = direction(0);

    for idx in 1..n {
        let current = direction(idx);
        if current != previous {
            approximated.push(points[idx]);
        }
        previous = current;
    }

    approximated
}

/// Trace a single border and mark its pixels with the border number
fn follow_border(
    image_values: &mut [i32],
    padded_width: usize,
    start: [i32; 2],
    adjacent: [i32; 2],
    border_num: i32,
) -> Vec<[u32; 2]> {
    let at = |p: [i32; 2]| p[0] as usize + padded_width * p[1] as usize;
    let step = |p: [i32; 2], d: [i32; 2]| [p[0] + d[0], p[1] + d[1]];
    let unpad = |p: [i32; 2]| [p[0] as u32 - 1, p[1] as u32 - 1];

    let mut diffs = VecDeque::from(NEIGHBOURS);
    let mut points: Vec<[u32; 2]> = Vec::new();

    rotate_to_value(&mut diffs, [adjacent[0] - start[0], adjacent[1] - start[1]]);

    let first = diffs
        .iter()
        .map(|&diff| step(start, diff))
        .find(|&p| image_values[at(p)] != 0);

    let Some(first) = first else {
        points.push(unpad(start));
        image_values[at(start)] = -border_num;
        return points;
    };

    let mut previous = first;
    let mut current = start;

    loop {
        points.push(unpad(current));
        rotate_to_value(
            &mut diffs,
            [previous[0] - current[0], previous[1] - current[1]],
        );

        // The previous pixel is last in counterclockwise order and always
        // non-zero, so the search terminates.
        let mut next = previous;
        let mut is_right_edge = false;

        for &diff in diffs.iter().rev() {
            let p = step(current, diff);
            if image_values[at(p)] != 0 {
                next = p;
                break;
            }
            if diff == [1, 0] {
                is_right_edge = true;
            }
        }

        let idx = at(current);
        if is_right_edge {
            image_values[idx] = -border_num;
        } else if image_values[idx] == 1 {
            image_values[idx] = border_num;
        }

        if next == start && current == first {
            break;
        }

        previous = current;
        current = next;
    }

    points
}

/// Parent of a new border given the last border crossed on its row
fn parent_border(
    contours: &[Contour],
    border_type: BorderType,
    last_border_num: i32,
) -> Option<usize> {
    // Border number 1 is the image frame
    if last_border_num < 2 {
        return None;
    }

    let last_index = (last_border_num - 2) as usize;
    let last_contour = &contours[last_index];

    if (border_type == BorderType::Outer) ^ (last_contour.border_type == BorderType::Outer) {
        Some(last_index)
    } else {
        last_contour.parent
    }
}

///  Contour for storing outlines of segmented objects
#[derive(Debug, Clone)]
pub struct Contour {
    points: Vec<[u32; 2]>,
    border_type: BorderType,
    parent: Option<usize>,
}

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum BorderType {
    Outer,
    Hole,
}

impl Contour {
    pub fn new(points: Vec<[u32; 2]>, border_type: BorderType, parent: Option<usize>) -> Self {
        Contour {
            points,
            border_type,
            parent,
        }
    }

    pub fn as_points(&self) -> &Vec<[u32; 2]> {
        &self.points
    }

    pub fn border_type(&self) -> &BorderType {
        &self.border_type
    }

    pub fn parent(&self) -> Option<usize> {
        self.parent
    }
}

fn rotate_to_value(values: &mut VecDeque<[i32; 2]>, value: [i32; 2]) {
    if let Some(pos) = values.iter().position(|&v| v == value) {
        values.rotate_left(pos);
    }
}
