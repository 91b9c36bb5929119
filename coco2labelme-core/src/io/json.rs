// Copyright (c) 2025, Tom Ouellette
// Licensed under the BSD 3-Clause License

use std::ffi::OsString;
use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};

use serde::Serialize;
use serde_json::ser::{Formatter, PrettyFormatter, Serializer};

use crate::constant::LABELME_INDENT;
use crate::error::ConvertError;

/// Pretty formatter writing every character outside printable ASCII as a
/// `\uXXXX` escape, with UTF-16 surrogate pairs above the basic plane
struct AsciiFormatter<'a> {
    pretty: PrettyFormatter<'a>,
}

impl<'a> AsciiFormatter<'a> {
    fn with_indent(indent: &'a [u8]) -> Self {
        AsciiFormatter {
            pretty: PrettyFormatter::with_indent(indent),
        }
    }
}

impl Formatter for AsciiFormatter<'_> {
    fn begin_array<W: ?Sized + Write>(&mut self, writer: &mut W) -> io::Result<()> {
        self.pretty.begin_array(writer)
    }

    fn end_array<W: ?Sized + Write>(&mut self, writer: &mut W) -> io::Result<()> {
        self.pretty.end_array(writer)
    }

    fn begin_array_value<W: ?Sized + Write>(
        &mut self,
        writer: &mut W,
        first: bool,
    ) -> io::Result<()> {
        self.pretty.begin_array_value(writer, first)
    }

    fn end_array_value<W: ?Sized + Write>(&mut self, writer: &mut W) -> io::Result<()> {
        self.pretty.end_array_value(writer)
    }

    fn begin_object<W: ?Sized + Write>(&mut self, writer: &mut W) -> io::Result<()> {
        self.pretty.begin_object(writer)
    }

    fn end_object<W: ?Sized + Write>(&mut self, writer: &mut W) -> io::Result<()> {
        self.pretty.end_object(writer)
    }

    fn begin_object_key<W: ?Sized + Write>(
        &mut self,
        writer: &mut W,
        first: bool,
    ) -> io::Result<()> {
        self.pretty.begin_object_key(writer, first)
    }

    fn begin_object_value<W: ?Sized + Write>(&mut self, writer: &mut W) -> io::Result<()> {
        self.pretty.begin_object_value(writer)
    }

    fn end_object_value<W: ?Sized + Write>(&mut self, writer: &mut W) -> io::Result<()> {
        self.pretty.end_object_value(writer)
    }

    fn write_string_fragment<W: ?Sized + Write>(
        &mut self,
        writer: &mut W,
        fragment: &str,
    ) -> io::Result<()> {
        let mut start = 0;

        for (idx, ch) in fragment.char_indices() {
            if ch.is_ascii() && ch != '\u{7f}' {
                continue;
            }

            writer.write_all(fragment[start..idx].as_bytes())?;

            let mut units = [0u16; 2];
            for unit in ch.encode_utf16(&mut units).iter() {
                write!(writer, "\\u{:04x}", unit)?;
            }

            start = idx + ch.len_utf8();
        }

        writer.write_all(fragment[start..].as_bytes())
    }
}

/// Serialize a value as 4-space indented json
///
/// Characters outside printable ASCII are written as `\uXXXX` escapes.
///
/// # Arguments
///
/// * `value` - Any serializable value
///
/// # Examples
///
/// ```
/// use coco2labelme_core::io::to_pretty_json;
///
/// let json = to_pretty_json(&vec![[1, 2]]).unwrap();
/// assert_eq!(json, "[\n    [\n        1,\n        2\n    ]\n]");
/// ```
pub fn to_pretty_json<T: Serialize>(value: &T) -> Result<String, ConvertError> {
    let mut buffer = Vec::new();
    let formatter = AsciiFormatter::with_indent(LABELME_INDENT);
    let mut serializer = Serializer::with_formatter(&mut buffer, formatter);

    value
        .serialize(&mut serializer)
        .map_err(|err| ConvertError::RecordWriteError(err.to_string()))?;

    String::from_utf8(buffer).map_err(|err| ConvertError::RecordWriteError(err.to_string()))
}

/// Write bytes to a file without exposing a partially written file
///
/// Contents go to `<path>.tmp` first, which is then renamed onto `path`.
/// On failure the temporary file is removed and `path` is left untouched.
///
/// # Arguments
///
/// * `path` - Destination file
/// * `contents` - Bytes to write
pub fn write_atomic<P: AsRef<Path>>(path: P, contents: &[u8]) -> Result<(), ConvertError> {
    let path = path.as_ref();
    let temporary = temporary_path(path);

    let written = File::create(&temporary).and_then(|file| {
        let mut writer = BufWriter::new(file);
        writer.write_all(contents)?;
        writer.into_inner()?.sync_all()
    });

    let result = written.and_then(|_| std::fs::rename(&temporary, path));

    if let Err(err) = result {
        let _ = std::fs::remove_file(&temporary);
        return Err(ConvertError::RecordWriteError(format!(
            "{}: {}",
            path.display(),
            err
        )));
    }

    Ok(())
}

fn temporary_path(path: &Path) -> PathBuf {
    let mut name: OsString = path.as_os_str().to_owned();
    name.push(".tmp");
    PathBuf::from(name)
}

#[cfg(test)]
mod test {

    use super::*;

    #[test]
    fn test_pretty_json_empty_containers() {
        let json = to_pretty_json(&serde_json::json!({"a": {}, "b": []})).unwrap();
        assert_eq!(json, "{\n    \"a\": {},\n    \"b\": []\n}");
    }

    #[test]
    fn test_pretty_json_escapes_non_ascii() {
        let json = to_pretty_json(&vec!["café/猫.jpg", "🐱", "tab\t\u{7f}"]).unwrap();
        assert_eq!(
            json,
            "[\n    \"caf\\u00e9/\\u732b.jpg\",\n    \"\\ud83d\\udc31\",\n    \"tab\\t\\u007f\"\n]"
        );
    }

    #[test]
    fn test_pretty_json_round_trip_non_ascii() {
        let json = to_pretty_json(&"große Katze").unwrap();
        let value: String = serde_json::from_str(&json).unwrap();
        assert_eq!(value, "große Katze");
    }

    #[test]
    fn test_write_atomic() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("record.json");

        write_atomic(&path, b"first").unwrap();
        write_atomic(&path, b"second").unwrap();

        assert_eq!(std::fs::read_to_string(&path).unwrap(), "second");
        assert!(!temporary_path(&path).exists());
    }

    #[test]
    fn test_write_atomic_missing_directory() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("missing").join("record.json");

        let result = write_atomic(&path, b"contents");

        assert!(matches!(result, Err(ConvertError::RecordWriteError(_))));
        assert!(!path.exists());
    }
}
