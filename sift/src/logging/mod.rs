//! Structured records of a mining run.
//!
//! Data that logically belongs together is split between a builder and a
//! record: the builder accumulates per-pass data while the run is live,
//! the finished [`RunRecord`] is handed to a [`MineLogger`] once the run
//! is complete, when all of its fields are known.

pub use records::{PassRecord, RunRecord, RunRecordBuilder};

pub mod records;

/// Receiver of finished run records.
pub trait MineLogger {
    fn record(&mut self, rec: RunRecord);
}

/// Logger that drops every record.
#[derive(Clone, Copy, Debug, Default)]
pub struct NullLogger;

impl MineLogger for NullLogger {
    fn record(&mut self, _rec: RunRecord) {}
}

/// Logger that keeps every record in memory.
#[derive(Clone, Debug, Default)]
pub struct MemoryLogger {
    pub records: Vec<RunRecord>,
}

impl MineLogger for MemoryLogger {
    fn record(&mut self, rec: RunRecord) {
        self.records.push(rec);
    }
}
