/// Soft device statistics - counters for the work a device has performed
///
/// Counters are atomics so they can be read while the device is in use.
/// `print_stats_report` prints a coloured summary to stdout.

use colored::*;
use std::sync::atomic::{AtomicU64, Ordering};

/// Snapshot of a device's counters
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct DeviceStats {
    pub buffers_generated: u64,
    pub buffers_deleted: u64,
    /// `buffer_data` calls (storage (re)allocations)
    pub allocations: u64,
    /// `buffer_sub_data` calls
    pub uploads: u64,
    pub bytes_uploaded: u64,
    /// Device-side copies
    pub copies: u64,
    pub bytes_copied: u64,
    pub maps: u64,
    pub draws: u64,
    /// Calls rejected with an error
    pub errors: u64,
}

impl DeviceStats {
    /// Buffers still alive on the device
    pub fn live_buffers(&self) -> u64 {
        self.buffers_generated - self.buffers_deleted
    }
}

/// Thread-safe statistics tracker
#[derive(Default)]
pub(crate) struct StatsTracker {
    buffers_generated: AtomicU64,
    buffers_deleted: AtomicU64,
    allocations: AtomicU64,
    uploads: AtomicU64,
    bytes_uploaded: AtomicU64,
    copies: AtomicU64,
    bytes_copied: AtomicU64,
    maps: AtomicU64,
    draws: AtomicU64,
    errors: AtomicU64,
}

impl StatsTracker {
    pub(crate) fn buffer_generated(&self) {
        self.buffers_generated.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn buffer_deleted(&self) {
        self.buffers_deleted.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn allocation(&self) {
        self.allocations.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn upload(&self, bytes: usize) {
        self.uploads.fetch_add(1, Ordering::Relaxed);
        self.bytes_uploaded.fetch_add(bytes as u64, Ordering::Relaxed);
    }

    pub(crate) fn copy(&self, bytes: u64) {
        self.copies.fetch_add(1, Ordering::Relaxed);
        self.bytes_copied.fetch_add(bytes, Ordering::Relaxed);
    }

    pub(crate) fn map(&self) {
        self.maps.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn draw(&self) {
        self.draws.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn error(&self) {
        self.errors.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn snapshot(&self) -> DeviceStats {
        DeviceStats {
            buffers_generated: self.buffers_generated.load(Ordering::Relaxed),
            buffers_deleted: self.buffers_deleted.load(Ordering::Relaxed),
            allocations: self.allocations.load(Ordering::Relaxed),
            uploads: self.uploads.load(Ordering::Relaxed),
            bytes_uploaded: self.bytes_uploaded.load(Ordering::Relaxed),
            copies: self.copies.load(Ordering::Relaxed),
            bytes_copied: self.bytes_copied.load(Ordering::Relaxed),
            maps: self.maps.load(Ordering::Relaxed),
            draws: self.draws.load(Ordering::Relaxed),
            errors: self.errors.load(Ordering::Relaxed),
        }
    }
}

/// Print a device statistics report
pub fn print_stats_report(stats: &DeviceStats) {
    if *stats == DeviceStats::default() {
        println!("\n{}", "✓ No device activity".green().bold());
        return;
    }

    println!("\n{}", "=== Soft Device Statistics Report ===".bright_blue().bold());

    println!("  {} {} generated, {} deleted, {} live",
        "Buffers:".white().bold(),
        stats.buffers_generated,
        stats.buffers_deleted,
        stats.live_buffers()
    );
    println!("  {} {}", "Allocations:".cyan(), stats.allocations);
    println!("  {} {} ({} bytes)", "Uploads:".cyan(), stats.uploads, stats.bytes_uploaded);
    println!("  {} {} ({} bytes)", "Copies:".cyan(), stats.copies, stats.bytes_copied);
    println!("  {} {}", "Maps:".cyan(), stats.maps);
    println!("  {} {}", "Draws:".cyan(), stats.draws);

    if stats.errors > 0 {
        println!("  {} {}", "Errors:".red().bold(), stats.errors);
    }

    println!("{}\n", "=====================================".bright_blue().bold());
}
