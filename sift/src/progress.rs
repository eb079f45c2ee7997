//! Progress reporting seam.
//!
//! The mining driver talks to a thin trait pair so the caller chooses the
//! presentation: [`ConsoleProgress`] draws an indicatif bar, [`Silent`]
//! draws nothing (batch runs, tests).

use indicatif::{ProgressBar, ProgressStyle};

/// Hands out progress bars for a run.
pub trait ProgressFactory {
    type Bar: MineProgress;

    fn new_bar(&self, len: u64) -> Self::Bar;
}

/// The calls the mining driver makes against a progress bar. Styling is
/// entirely up to the implementation.
pub trait MineProgress: Clone {
    fn inc(&self, delta: u64);
    fn set_message(&self, msg: &str);
    fn finish_and_clear(&self);
}

/// No-op progress.
#[derive(Clone, Copy, Debug, Default)]
pub struct Silent;

impl ProgressFactory for Silent {
    type Bar = Silent;

    fn new_bar(&self, _len: u64) -> Silent {
        Silent
    }
}

impl MineProgress for Silent {
    fn inc(&self, _delta: u64) {}
    fn set_message(&self, _msg: &str) {}
    fn finish_and_clear(&self) {}
}

/// Progress on stderr via indicatif.
#[derive(Clone, Debug, Default)]
pub struct ConsoleProgress;

#[derive(Clone)]
pub struct ConsoleBar {
    bar: ProgressBar,
}

impl ProgressFactory for ConsoleProgress {
    type Bar = ConsoleBar;

    fn new_bar(&self, len: u64) -> ConsoleBar {
        let bar = ProgressBar::new(len);
        bar.set_style(
            ProgressStyle::default_bar().template("{msg} {wide_bar} {pos}/{len} [{elapsed}]"),
        );
        ConsoleBar { bar }
    }
}

impl MineProgress for ConsoleBar {
    fn inc(&self, delta: u64) {
        self.bar.inc(delta);
    }

    fn set_message(&self, msg: &str) {
        self.bar.set_message(msg);
    }

    fn finish_and_clear(&self) {
        self.bar.finish_and_clear();
    }
}
