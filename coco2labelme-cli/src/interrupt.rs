// Copyright (c) 2025, Tom Ouellette
// Licensed under the BSD 3-Clause License

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use coco2labelme_core::ut;

/// Exit status after a second interrupt
pub const INTERRUPTED_EXIT_CODE: i32 = 130;

/// Listen for Ctrl-C on a background thread
///
/// The first interrupt sets `stop` so that no further images are started
/// and in-flight records finish writing. A second interrupt exits
/// immediately.
///
/// # Arguments
///
/// * `stop` - Flag shared with the conversion workers
/// * `verbose` - Log when an interrupt is received
pub fn listen(stop: Arc<AtomicBool>, verbose: bool) {
    std::thread::spawn(move || wait_for_interrupts(stop, verbose));
}

#[tokio::main(flavor = "current_thread")]
async fn wait_for_interrupts(stop: Arc<AtomicBool>, verbose: bool) {
    if tokio::signal::ctrl_c().await.is_err() {
        return;
    }

    stop.store(true, Ordering::SeqCst);

    if verbose {
        println!();
    }

    ut::track::progress_log(
        "Interrupted. Finishing images in progress, press Ctrl-C again to exit now.",
        verbose,
    );

    if tokio::signal::ctrl_c().await.is_ok() {
        ut::track::log_error("Interrupted.");
        std::process::exit(INTERRUPTED_EXIT_CODE);
    }
}
