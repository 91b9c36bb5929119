// Copyright (c) 2025, Tom Ouellette
// Licensed under the BSD 3-Clause License

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::atomic::AtomicBool;

use clap::{Args, ValueEnum};

use coco2labelme_core::coco::{Dataset, OrphanPolicy};
use coco2labelme_core::constant;
use coco2labelme_core::convert::{
    ConversionReport, ConvertContext, DecodeErrorPolicy, convert_dataset,
};
use coco2labelme_core::ut;

use crate::interrupt;

#[derive(Debug, Copy, Clone, PartialEq, Eq, ValueEnum)]
pub enum OrphanArg {
    /// Stop before writing anything
    Error,
    /// Skip the annotation and report it
    Skip,
}

impl From<OrphanArg> for OrphanPolicy {
    fn from(arg: OrphanArg) -> Self {
        match arg {
            OrphanArg::Error => OrphanPolicy::Error,
            OrphanArg::Skip => OrphanPolicy::Skip,
        }
    }
}

#[derive(Debug, Copy, Clone, PartialEq, Eq, ValueEnum)]
pub enum DecodeErrorArg {
    /// Drop the annotation and keep converting the image
    Skip,
    /// Fail the whole image
    Fail,
}

impl From<DecodeErrorArg> for DecodeErrorPolicy {
    fn from(arg: DecodeErrorArg) -> Self {
        match arg {
            DecodeErrorArg::Skip => DecodeErrorPolicy::Skip,
            DecodeErrorArg::Fail => DecodeErrorPolicy::Fail,
        }
    }
}

#[derive(Debug, Args)]
pub struct ConvertArgs {
    #[arg(short = 'i', long, help = "COCO annotation file (.json).", required = true)]
    pub input: PathBuf,

    #[arg(short = 'o', long, help = "Output directory for LabelMe files.", required = true)]
    pub output: PathBuf,

    #[arg(short = 'v', long, help = "Verbose output.")]
    pub verbose: bool,

    #[arg(short = 't', long, help = "Number of threads.")]
    pub threads: Option<usize>,

    #[arg(
        long,
        value_enum,
        default_value_t = OrphanArg::Error,
        help = "Handling of annotations referencing a missing image."
    )]
    pub orphans: OrphanArg,

    #[arg(
        long,
        value_enum,
        default_value_t = DecodeErrorArg::Skip,
        help = "Handling of annotations whose segmentation cannot be decoded."
    )]
    pub decode_errors: DecodeErrorArg,
}

fn exit_with_error(message: &str) -> ! {
    ut::track::log_error(message);
    std::process::exit(1);
}

/// Convert a COCO annotation file into per-image LabelMe files
pub fn convert(args: &ConvertArgs) {
    if let Some(threads) = args.threads {
        if threads < 1 {
            exit_with_error("Threads must be set to a positive integer if provided.");
        }

        rayon::ThreadPoolBuilder::new()
            .num_threads(threads)
            .build_global()
            .unwrap_or_else(|err| exit_with_error(&format!("Could not start threads. {}", err)));
    }

    validate_input(&args.input);

    let dataset =
        Dataset::open(&args.input).unwrap_or_else(|err| exit_with_error(&err.to_string()));

    ut::track::progress_log(
        &format!(
            "Detected {}, {} and {} categories.",
            ut::track::quantity(dataset.images.len(), "image"),
            ut::track::quantity(dataset.annotations.len(), "annotation"),
            ut::track::thousands_format(dataset.categories.len()),
        ),
        args.verbose,
    );

    let context = ConvertContext::new(&dataset, &args.input, &args.output)
        .with_orphan_policy(args.orphans.into())
        .with_decode_error_policy(args.decode_errors.into());

    let stop = Arc::new(AtomicBool::new(false));
    interrupt::listen(Arc::clone(&stop), args.verbose);

    let report = convert_dataset(&dataset, &context, &stop, args.verbose)
        .unwrap_or_else(|err| exit_with_error(&err.to_string()));

    if args.verbose {
        println!()
    }

    summarize(&report, args.verbose);

    if !report.is_complete() {
        std::process::exit(1);
    }
}

fn validate_input(input: &Path) {
    let extension = input
        .extension()
        .and_then(|s| s.to_str())
        .map(|s| s.to_lowercase());

    let supported = extension
        .as_deref()
        .is_some_and(|ext| constant::SUPPORTED_ANNOTATION_FORMATS.contains(&ext));

    if !supported {
        exit_with_error(&format!(
            "Invalid input extension. Must be one of: {:?}.",
            constant::SUPPORTED_ANNOTATION_FORMATS
        ));
    }

    if !input.is_file() {
        exit_with_error(&format!("Input file {} does not exist.", input.display()));
    }
}

fn summarize(report: &ConversionReport, verbose: bool) {
    for (file_name, err) in report.failed.iter() {
        ut::track::log_error(&format!("{} failed. {}", file_name, err));
    }

    for dropped in report.dropped.iter() {
        ut::track::log_warning(&format!(
            "Dropped annotation {} of {}. {}",
            dropped.annotation_id, dropped.file_name, dropped.error
        ));
    }

    if !report.orphans.is_empty() {
        ut::track::progress_log(
            &format!(
                "Skipped {} referencing missing images.",
                ut::track::quantity(report.orphans.len(), "annotation")
            ),
            verbose,
        );
    }

    if !report.dropped.is_empty() {
        ut::track::progress_log(
            &format!(
                "Dropped {} that could not be decoded.",
                ut::track::quantity(report.dropped.len(), "annotation")
            ),
            verbose,
        );
    }

    let converted = format!(
        "{} converted with {}.",
        ut::track::quantity(report.converted, "image"),
        ut::track::quantity(report.shapes, "shape"),
    );

    let message = if report.not_started > 0 {
        format!(
            "Interrupted. {} {} failed. {} not started.",
            converted,
            ut::track::quantity(report.failed.len(), "image"),
            ut::track::quantity(report.not_started, "image"),
        )
    } else if !report.failed.is_empty() {
        format!(
            "Complete. {} {} failed.",
            converted,
            ut::track::quantity(report.failed.len(), "image"),
        )
    } else {
        format!("Complete. {}", converted)
    };

    ut::track::progress_log(&message, verbose);
}

#[cfg(test)]
mod test {

    use super::*;

    #[test]
    fn test_policy_from_args() {
        assert_eq!(OrphanPolicy::from(OrphanArg::Skip), OrphanPolicy::Skip);
        assert_eq!(OrphanPolicy::from(OrphanArg::Error), OrphanPolicy::Error);
        assert_eq!(
            DecodeErrorPolicy::from(DecodeErrorArg::Fail),
            DecodeErrorPolicy::Fail
        );
        assert_eq!(
            DecodeErrorPolicy::from(DecodeErrorArg::Skip),
            DecodeErrorPolicy::Skip
        );
    }
}
