//! Progress reporting for long scans.
//!
//! Workers call these hooks concurrently, so implementations must be
//! `Send + Sync` and should not assume ordered delivery of `on_instrument`.

use swingscan_core::SignalRecord;

use crate::aggregate::ScanReport;
use crate::export::{format_price, format_ratio_pair};

pub trait ScanProgress: Send + Sync {
    /// Universe and benchmark are ready; evaluation is about to start.
    fn on_start(&self, _total: usize, _benchmark: &str, _benchmark_return: f64) {}

    /// An instrument passed every gate.
    fn on_signal(&self, _record: &SignalRecord) {}

    /// `done` instruments out of `total` have finished (in any order).
    fn on_instrument(&self, _done: usize, _total: usize) {}

    fn on_complete(&self, _report: &ScanReport) {}
}

/// Discards all progress.
pub struct NoProgress;

impl ScanProgress for NoProgress {}

/// Console progress in the style of the daily scan printout.
pub struct StdoutScanProgress {
    every: usize,
}

impl StdoutScanProgress {
    /// Print a progress line every `every` instruments (0 disables them).
    pub fn new(every: usize) -> Self {
        Self { every }
    }
}

impl ScanProgress for StdoutScanProgress {
    fn on_start(&self, total: usize, benchmark: &str, benchmark_return: f64) {
        println!(
            "✓ {benchmark} 1-month return: {:+.2}%",
            benchmark_return * 100.0
        );
        println!("\nScanning {total} stocks...\n");
    }

    fn on_signal(&self, record: &SignalRecord) {
        println!(
            "FOUND: {} @ {} | RR: {} | Risk: {:.1}%",
            record.symbol,
            format_price(record.price),
            format_ratio_pair(&record.reward_ratios),
            record.risk_pct
        );
    }

    fn on_instrument(&self, done: usize, total: usize) {
        if self.every > 0 && done % self.every == 0 {
            println!("→ {done}/{total} scanned...");
        }
    }

    fn on_complete(&self, report: &ScanReport) {
        let rule = "=".repeat(70);
        println!("\n{rule}");
        println!(
            "FINAL RESULT: {} HIGH-PROBABILITY SWINGS FOUND",
            report.signals().len()
        );
        println!("{rule}\n");
    }
}
