// Copyright (c) 2025, Tom Ouellette
// Licensed under the MIT License

use colored::*;
use kdam::{Bar, tqdm};

use crate::constant::{LOG_TAG, LOG_TAG_COLOR};

/// Progress bar over the images of a conversion run
///
/// A disabled bar is returned when `verbose` is false so that parallel
/// iterators can be wrapped unconditionally.
pub fn progress_bar(n: usize, desc: &str, verbose: bool) -> Bar {
    if !verbose {
        return tqdm!(disable = true);
    }

    tqdm!(
        total = n,
        force_refresh = false,
        desc = progress_timestamp(desc),
        bar_format =
            "{desc suffix=' '}[{percentage:.0}%] ({rate:.1}/s, eta: {remaining human=true})"
    )
}

/// Prefix a description with the local time and the colored tool tag
pub fn progress_timestamp(desc: &str) -> String {
    let time = chrono::Local::now().format("%Y-%m-%d | %H:%M:%S");
    let [r, g, b] = LOG_TAG_COLOR;

    format!(
        "{} {} {} {} {} {}",
        "[".bold(),
        time,
        "|".bold(),
        LOG_TAG.truecolor(r, g, b).bold(),
        "]".bold(),
        desc,
    )
}

/// Print a timestamped line to stdout when verbose
pub fn progress_log(desc: &str, verbose: bool) {
    if verbose {
        println!("{}", progress_timestamp(desc));
    }
}

/// Line reporting an error, as written to stderr
///
/// # Examples
///
/// ```
/// use coco2labelme_core::ut::track::error_line;
///
/// assert_eq!(error_line("Input missing."), "[coco2labelme] ERROR: Input missing.");
/// ```
pub fn error_line(message: &str) -> String {
    format!("[{}] ERROR: {}", LOG_TAG, message)
}

/// Line reporting a recoverable problem, as written to stderr
pub fn warning_line(message: &str) -> String {
    format!("[{}] WARNING: {}", LOG_TAG, message)
}

/// Print an error to stderr regardless of verbosity
pub fn log_error(message: &str) {
    eprintln!("{}", error_line(message));
}

/// Print a warning to stderr regardless of verbosity
pub fn log_warning(message: &str) {
    eprintln!("{}", warning_line(message));
}

/// Format numbers to readable thousands format
///
/// # Examples
///
/// ```
/// use coco2labelme_core::ut::track::thousands_format;
///
/// assert_eq!(thousands_format(1234), "1234");
/// assert_eq!(thousands_format(118287), "118,287");
/// ```
pub fn thousands_format<T>(number: T) -> String
where
    T: std::fmt::Display,
{
    let number = number.to_string();
    if number.len() > 4 {
        number
            .as_bytes()
            .rchunks(3)
            .rev()
            .filter_map(|chunk| std::str::from_utf8(chunk).ok())
            .collect::<Vec<&str>>()
            .join(",")
    } else {
        number
    }
}

/// Count followed by a noun, pluralized with a trailing `s`
///
/// # Examples
///
/// ```
/// use coco2labelme_core::ut::track::quantity;
///
/// assert_eq!(quantity(1, "image"), "1 image");
/// assert_eq!(quantity(0, "shape"), "0 shapes");
/// assert_eq!(quantity(12000, "annotation"), "12,000 annotations");
/// ```
pub fn quantity(count: usize, noun: &str) -> String {
    let suffix = if count == 1 { "" } else { "s" };
    format!("{} {}{}", thousands_format(count), noun, suffix)
}

#[cfg(test)]
mod test {

    use super::*;

    #[test]
    fn test_thousands_format_boundaries() {
        assert_eq!(thousands_format(0), "0");
        assert_eq!(thousands_format(9999), "9999");
        assert_eq!(thousands_format(10000), "10,000");
        assert_eq!(thousands_format(1234567), "1,234,567");
    }

    #[test]
    fn test_log_lines() {
        assert_eq!(
            warning_line("Dropped annotation 3 of a.jpg."),
            "[coco2labelme] WARNING: Dropped annotation 3 of a.jpg."
        );
        assert!(error_line("x").starts_with("[coco2labelme] ERROR: "));
    }

    #[test]
    fn test_progress_timestamp_contains_tag() {
        let line = progress_timestamp("Converting images");
        assert!(line.contains("coco2labelme"));
        assert!(line.ends_with("Converting images"));
    }
}
