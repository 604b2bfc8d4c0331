//! Configuration for the simulator.
//!
//! This module defines the configuration structures used to parameterize a
//! run. It provides:
//! 1. **Defaults:** The baseline machine constants (RAM geometry, cache
//!    shapes, miss and drain timings, output padding).
//! 2. **Structures:** `GeneralConfig` and `MemoryConfig` under a root
//!    [`Config`].
//!
//! Configuration can be deserialized from JSON via the CLI's `--config`
//! flag; `Config::default()` is the standard machine.

use serde::Deserialize;

/// Baseline machine constants.
pub mod defaults {
    /// Size of main memory in bytes; one word slot per four bytes.
    pub const RAM_BYTES: usize = 512;

    /// Byte offset where the data segment begins.
    pub const DATA_BASE: usize = 0x100;

    /// Maximum number of source lines a program may have.
    pub const PROGRAM_MAX_LINES: usize = 256;

    /// Instruction cache: number of direct-mapped blocks.
    pub const ICACHE_BLOCKS: usize = 2;

    /// Instruction cache: words per block.
    pub const ICACHE_WORDS: usize = 8;

    /// Data cache: number of direct-mapped blocks.
    pub const DCACHE_BLOCKS: usize = 4;

    /// Data cache: words per block.
    pub const DCACHE_WORDS: usize = 4;

    /// Remaining cycles charged to an instruction-cache fill once it has
    /// started (8 words at 3 cycles each, minus the starting cycle).
    pub const I_FILL_CYCLES: u32 = 23;

    /// Remaining cycles charged to a data-cache fill once it has started
    /// (4 words at 3 cycles each, minus the starting cycle).
    pub const D_FILL_CYCLES: u32 = 11;

    /// Cycles a write-buffer drain holds the memory port after the starting
    /// cycle. The timer is decremented before it is tested, so one drain
    /// spans three ticks in total.
    pub const DRAIN_CYCLES: u32 = 2;

    /// Width the original source line is right-padded to for output.
    pub const TEXT_PAD: usize = 35;
}

/// Direct-mapped cache geometry. Both dimensions must be powers of two.
#[derive(Debug, Clone, Copy, Deserialize)]
#[serde(default)]
pub struct CacheShape {
    /// Number of blocks.
    pub blocks: usize,
    /// Words per block.
    pub words_per_block: usize,
}

impl Default for CacheShape {
    fn default() -> Self {
        Self {
            blocks: defaults::DCACHE_BLOCKS,
            words_per_block: defaults::DCACHE_WORDS,
        }
    }
}

/// High-level run options.
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct GeneralConfig {
    /// Print the pipeline occupancy line every tick.
    pub dump_pipeline: bool,
    /// Print the register file after the run.
    pub dump_registers: bool,
    /// Emit per-stage diagnostics to stderr.
    pub trace: bool,
}

/// Memory subsystem parameters.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct MemoryConfig {
    /// Instruction cache geometry.
    pub icache: CacheShape,
    /// Data cache geometry.
    pub dcache: CacheShape,
    /// Instruction-cache fill timer reload value.
    pub i_fill_cycles: u32,
    /// Data-cache fill timer reload value.
    pub d_fill_cycles: u32,
    /// Write-buffer drain timer reload value.
    pub drain_cycles: u32,
}

impl Default for MemoryConfig {
    fn default() -> Self {
        Self {
            icache: CacheShape {
                blocks: defaults::ICACHE_BLOCKS,
                words_per_block: defaults::ICACHE_WORDS,
            },
            dcache: CacheShape {
                blocks: defaults::DCACHE_BLOCKS,
                words_per_block: defaults::DCACHE_WORDS,
            },
            i_fill_cycles: defaults::I_FILL_CYCLES,
            d_fill_cycles: defaults::D_FILL_CYCLES,
            drain_cycles: defaults::DRAIN_CYCLES,
        }
    }
}

/// Root configuration type.
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct Config {
    /// High-level run options.
    pub general: GeneralConfig,
    /// Memory subsystem parameters.
    pub memory: MemoryConfig,
}
