// Copyright (c) 2025, Tom Ouellette
// Licensed under the BSD 3-Clause License

use std::path::{Path, PathBuf};

use assert_cmd::Command;
use predicates::prelude::*;
use serde_json::{Value, json};

fn write_dataset(dir: &Path, dataset: Value) -> PathBuf {
    let path = dir.join("coco.json");
    std::fs::write(&path, dataset.to_string()).unwrap();
    path
}

fn square_dataset() -> Value {
    json!({
        "images": [
            {"id": 1, "width": 4, "height": 4, "file_name": "a.jpg"},
            {"id": 2, "width": 4, "height": 4, "file_name": "b.jpg"}
        ],
        "annotations": [
            {
                "id": 10,
                "image_id": 1,
                "category_id": 5,
                "segmentation": {"size": [4, 4], "counts": "52203"}
            }
        ],
        "categories": [{"id": 5, "name": "cat", "supercategory": "animal"}],
        "info": {"year": 2017}
    })
}

fn read_json(path: &Path) -> Value {
    serde_json::from_str(&std::fs::read_to_string(path).unwrap()).unwrap()
}

fn coco2labelme() -> Command {
    Command::cargo_bin("coco2labelme").unwrap()
}

#[test]
fn test_cli_converts_dataset() {
    let dir = tempfile::tempdir().unwrap();
    let input = write_dataset(dir.path(), square_dataset());
    let output = dir.path().join("labels").join("train");

    coco2labelme()
        .arg("-i")
        .arg(&input)
        .arg("-o")
        .arg(&output)
        .assert()
        .success();

    let a = read_json(&output.join("a.json"));
    let b = read_json(&output.join("b.json"));

    assert_eq!(a["imagePath"], "../../a.jpg");
    assert_eq!(a["imageWidth"], 4);
    assert_eq!(a["shapes"][0]["label"], "cat");
    assert_eq!(a["shapes"][0]["shape_type"], "polygon");
    assert_eq!(
        a["shapes"][0]["points"],
        json!([[1, 1], [1, 2], [2, 2], [2, 1]])
    );
    assert_eq!(b["shapes"], json!([]));
}

#[test]
fn test_cli_output_format() {
    let dir = tempfile::tempdir().unwrap();
    let input = write_dataset(dir.path(), square_dataset());
    let output = dir.path().join("labels");

    coco2labelme()
        .args(["--threads", "2", "-i"])
        .arg(&input)
        .arg("-o")
        .arg(&output)
        .assert()
        .success();

    let contents = std::fs::read_to_string(output.join("b.json")).unwrap();

    assert!(contents.starts_with("{\n    \"fillColor\": [\n        255,"));
    assert!(contents.ends_with("\n    \"version\": \"3.16.7\"\n}"));
    assert!(contents.contains("\n    \"imageData\": null,\n"));
}

#[test]
fn test_cli_rerun_identical() {
    let dir = tempfile::tempdir().unwrap();
    let input = write_dataset(dir.path(), square_dataset());
    let output = dir.path().join("labels");

    let run = || {
        coco2labelme()
            .arg("-i")
            .arg(&input)
            .arg("-o")
            .arg(&output)
            .assert()
            .success();
        std::fs::read(output.join("a.json")).unwrap()
    };

    assert_eq!(run(), run());
}

#[test]
fn test_cli_orphan_policies() {
    let dir = tempfile::tempdir().unwrap();

    let mut dataset = square_dataset();
    dataset["annotations"][0]["image_id"] = json!(99);
    let input = write_dataset(dir.path(), dataset);
    let output = dir.path().join("labels");

    coco2labelme()
        .arg("-i")
        .arg(&input)
        .arg("-o")
        .arg(&output)
        .assert()
        .failure()
        .code(1)
        .stderr(predicate::str::contains("99"));

    assert!(!output.exists());

    coco2labelme()
        .args(["--orphans", "skip", "-v", "-i"])
        .arg(&input)
        .arg("-o")
        .arg(&output)
        .assert()
        .success()
        .stdout(predicate::str::contains("Skipped 1 annotation referencing"));

    assert_eq!(read_json(&output.join("a.json"))["shapes"], json!([]));
}

#[test]
fn test_cli_decode_error_policies() {
    let dir = tempfile::tempdir().unwrap();

    let mut dataset = square_dataset();
    dataset["annotations"][0]["segmentation"]["counts"] = json!("O");
    let input = write_dataset(dir.path(), dataset);
    let output = dir.path().join("labels");

    coco2labelme()
        .arg("-i")
        .arg(&input)
        .arg("-o")
        .arg(&output)
        .assert()
        .success()
        .stderr(predicate::str::contains("Dropped annotation 10 of a.jpg"));

    assert_eq!(read_json(&output.join("a.json"))["shapes"], json!([]));

    std::fs::remove_file(output.join("a.json")).unwrap();

    coco2labelme()
        .args(["--decode-errors", "fail", "-i"])
        .arg(&input)
        .arg("-o")
        .arg(&output)
        .assert()
        .failure()
        .code(1)
        .stderr(predicate::str::contains("a.jpg failed"));

    assert!(!output.join("a.json").exists());
    assert!(output.join("b.json").exists());
}

#[test]
fn test_cli_invalid_extension() {
    let dir = tempfile::tempdir().unwrap();
    let input = dir.path().join("coco.txt");
    std::fs::write(&input, "{}").unwrap();

    coco2labelme()
        .arg("-i")
        .arg(&input)
        .arg("-o")
        .arg(dir.path().join("labels"))
        .assert()
        .failure()
        .code(1)
        .stderr(predicate::str::contains("[coco2labelme] ERROR"));
}

#[test]
fn test_cli_missing_keys() {
    let dir = tempfile::tempdir().unwrap();
    let input = write_dataset(dir.path(), json!({"images": [], "annotations": []}));
    let output = dir.path().join("labels");

    coco2labelme()
        .arg("-i")
        .arg(&input)
        .arg("-o")
        .arg(&output)
        .assert()
        .failure()
        .code(1)
        .stderr(predicate::str::contains("categories"));

    assert!(!output.exists());
}

#[test]
fn test_cli_zero_threads() {
    let dir = tempfile::tempdir().unwrap();
    let input = write_dataset(dir.path(), square_dataset());

    coco2labelme()
        .args(["-t", "0", "-i"])
        .arg(&input)
        .arg("-o")
        .arg(dir.path().join("labels"))
        .assert()
        .failure()
        .code(1);
}

#[test]
fn test_cli_missing_output_argument() {
    coco2labelme().args(["-i", "coco.json"]).assert().failure();
}
