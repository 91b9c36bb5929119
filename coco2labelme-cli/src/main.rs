// Copyright (c) 2025, Tom Ouellette
// Licensed under the BSD 3-Clause License

use clap::Parser;
use coco2labelme_cli::convert;

#[derive(Parser)]
#[command(version, long_about = None)]
#[command(about = "Convert COCO run-length encoded annotations to LabelMe files.")]
struct Cli {
    #[command(flatten)]
    convert: convert::ConvertArgs,
}

fn main() {
    let cli = Cli::parse();
    convert::convert(&cli.convert);
}
