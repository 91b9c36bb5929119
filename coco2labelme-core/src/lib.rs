// Copyright (c) 2025, Tom Ouellette
// Licensed under the BSD 3-Clause License

pub mod coco;
pub mod constant;
pub mod convert;
pub mod cv;
pub mod error;
pub mod im;
pub mod io;
pub mod labelme;
pub mod ut;
