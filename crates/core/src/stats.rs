//! Memory-access statistics.
//!
//! Tracks the request and hit counters for both caches and renders the
//! report block appended to the output file after termination. A hit counts
//! one request and one hit; a miss counts one request when the fill starts
//! and nothing while it completes, so `requests - hits` is the miss count.

use std::fmt::Write as _;

/// Cache request/hit counters.
#[derive(Debug, Clone, Copy, Default)]
pub struct MemStats {
    /// Instruction-cache access requests.
    pub i_requests: u64,
    /// Instruction-cache hits.
    pub i_hits: u64,
    /// Data-cache access requests.
    pub d_requests: u64,
    /// Data-cache hits.
    pub d_hits: u64,
}

impl MemStats {
    /// Instruction-cache misses.
    pub fn i_misses(&self) -> u64 {
        self.i_requests - self.i_hits
    }

    /// Data-cache misses.
    pub fn d_misses(&self) -> u64 {
        self.d_requests - self.d_hits
    }

    /// The report block appended to the output file, byte for byte.
    pub fn report(&self) -> String {
        let mut out = String::new();
        let _ = write!(
            out,
            "\nTotal number of access requests for instruction cache: {}\n\
             Number of instruction cache hits: {}\n\
             \n\
             Total number of access requests for data cache: {}\n\
             Number of data cache hits: {}\n",
            self.i_requests, self.i_hits, self.d_requests, self.d_hits
        );
        out
    }
}
