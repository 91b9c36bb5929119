pub mod contours;

pub use contours::{find_contours, find_external_contours};
