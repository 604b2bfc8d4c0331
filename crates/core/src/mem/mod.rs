//! Memory subsystem.
//!
//! This module owns everything behind the pipeline's two memory ports:
//! 1. **RAM:** A flat byte-addressed array of word slots holding both
//!    instructions and data.
//! 2. **Caches:** The split direct-mapped instruction and data caches.
//! 3. **Write buffer:** Pending stores drained between other accesses.
//! 4. **Arbitration:** Single-ported RAM shared by the instruction fill,
//!    the data fill, and the write-buffer drain, with the instruction fill
//!    taking priority and the drain running only when both fills are idle.
//!
//! An access either completes (`Access::Ready`) or asks the pipeline to
//! insert a bubble (`Access::Busy`); genuine faults come back as errors.

/// Direct-mapped cache.
pub mod cache;
/// Write buffer.
pub mod write_buffer;

use crate::common::error::SimError;
use crate::config::{defaults, MemoryConfig};
use crate::isa::Instruction;
use crate::stats::MemStats;
use self::cache::Cache;
use self::write_buffer::WriteBuffer;

/// A word in memory: either a raw data value or an instruction. Which one a
/// slot is treated as depends on the access path (fetch vs load), not on
/// the word itself.
#[derive(Debug, Clone, PartialEq)]
pub enum Word {
    /// A raw signed 32-bit value.
    Data(i32),
    /// An assembled instruction.
    Inst(Instruction),
}

impl Word {
    /// The integer seen when this word is read as data. Instructions carry
    /// zero, except `j`, which carries its pre-scaled target.
    pub fn value(&self) -> i32 {
        match self {
            Word::Data(v) => *v,
            Word::Inst(inst) => inst.op.raw_value(),
        }
    }
}

/// Which pipeline stage a busy memory port stalls.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BusyAt {
    /// Fetch must retry; freeze the front of the pipeline.
    Fetch,
    /// The MEM stage (or a fetch blocked behind the write buffer) must
    /// retry; insert the bubble behind MEM.
    Mem,
}

/// Outcome of a cache access: the value, or a stall while the port works.
#[derive(Debug, Clone, PartialEq)]
pub enum Access<T> {
    /// The access completed this tick.
    Ready(T),
    /// The port is busy; stall the given stage and retry next tick.
    Busy(BusyAt),
}

/// Main memory with its caches, write buffer, and port arbitration state.
pub struct MemorySystem {
    ram: Vec<Option<Word>>,
    icache: Cache,
    dcache: Cache,
    i_timer: u32,
    d_timer: u32,
    if_busy: bool,
    mem_busy: bool,
    write_buffer: WriteBuffer,
    i_fill_cycles: u32,
    d_fill_cycles: u32,
    /// Cache request/hit counters.
    pub stats: MemStats,
}

impl MemorySystem {
    /// Builds RAM from an assembled program: data words at the data base,
    /// then instructions from address zero, so instructions win any
    /// overlap.
    pub fn new(
        config: &MemoryConfig,
        instructions: &[Instruction],
        data: &[i32],
    ) -> Result<Self, SimError> {
        let mut ram: Vec<Option<Word>> = vec![None; defaults::RAM_BYTES];

        if defaults::DATA_BASE + 4 * data.len() > defaults::RAM_BYTES {
            return Err(SimError::DataTooLarge { words: data.len() });
        }
        for (j, &value) in data.iter().enumerate() {
            ram[defaults::DATA_BASE + 4 * j] = Some(Word::Data(value));
        }

        if 4 * instructions.len() > defaults::RAM_BYTES {
            return Err(SimError::ProgramTooLarge {
                words: instructions.len(),
            });
        }
        for (i, inst) in instructions.iter().enumerate() {
            ram[4 * i] = Some(Word::Inst(inst.clone()));
        }

        Ok(Self {
            ram,
            icache: Cache::new(config.icache.blocks, config.icache.words_per_block),
            dcache: Cache::new(config.dcache.blocks, config.dcache.words_per_block),
            i_timer: 0,
            d_timer: 0,
            if_busy: false,
            mem_busy: false,
            write_buffer: WriteBuffer::new(config.drain_cycles),
            i_fill_cycles: config.i_fill_cycles,
            d_fill_cycles: config.d_fill_cycles,
            stats: MemStats::default(),
        })
    }

    fn checked(address: i32) -> Result<usize, SimError> {
        if address < 0 || address as usize >= defaults::RAM_BYTES {
            return Err(SimError::AddressOutOfRange { address });
        }
        Ok(address as usize)
    }

    fn cached_instruction(&self, addr: usize) -> Result<Instruction, SimError> {
        match self.icache.fetch(addr) {
            Some(Word::Inst(inst)) => Ok(inst.clone()),
            Some(Word::Data(_)) => Err(SimError::NotAnInstruction {
                address: addr as i32,
            }),
            None => Err(SimError::EmptyWord {
                address: addr as i32,
            }),
        }
    }

    /// Fetches the instruction at `address` through the instruction cache.
    ///
    /// A miss starts a fill and stalls fetch until the fill timer runs out;
    /// while the write buffer holds the port the stall lands behind MEM
    /// instead. Retries during a fill decrement the timer and count neither
    /// requests nor hits.
    pub fn fetch_instr(&mut self, address: i32) -> Result<Access<Instruction>, SimError> {
        let addr = Self::checked(address)?;

        if self.icache.hit(addr) {
            self.stats.i_requests += 1;
            self.stats.i_hits += 1;
            return Ok(Access::Ready(self.cached_instruction(addr)?));
        }
        if self.write_buffer.busy() {
            return Ok(Access::Busy(BusyAt::Mem));
        }
        if !self.if_busy {
            self.stats.i_requests += 1;
            self.if_busy = true;
            self.i_timer = self.i_fill_cycles;
            return Ok(Access::Busy(BusyAt::Fetch));
        }
        if self.i_timer == 0 {
            self.if_busy = false;
            self.icache.populate(addr, &self.ram);
            return Ok(Access::Ready(self.cached_instruction(addr)?));
        }
        self.i_timer -= 1;
        Ok(Access::Busy(BusyAt::Fetch))
    }

    fn cached_data(&self, addr: usize) -> Result<i32, SimError> {
        match self.dcache.fetch(addr) {
            Some(word) => Ok(word.value()),
            None => Err(SimError::EmptyWord {
                address: addr as i32,
            }),
        }
    }

    /// Reads the data word at `address` through the data cache.
    ///
    /// An in-flight instruction fill has priority on the port: while its
    /// timer runs, a data miss works that timer down and stalls MEM.
    pub fn fetch_data(&mut self, address: i32) -> Result<Access<i32>, SimError> {
        let addr = Self::checked(address)?;

        if self.dcache.hit(addr) {
            self.stats.d_requests += 1;
            self.stats.d_hits += 1;
            return Ok(Access::Ready(self.cached_data(addr)?));
        }
        if self.i_timer != 0 {
            self.i_timer -= 1;
            return Ok(Access::Busy(BusyAt::Mem));
        }
        if self.write_buffer.busy() {
            return Ok(Access::Busy(BusyAt::Mem));
        }
        if !self.mem_busy {
            self.stats.d_requests += 1;
            self.mem_busy = true;
            self.d_timer = self.d_fill_cycles;
            return Ok(Access::Busy(BusyAt::Mem));
        }
        if self.d_timer == 0 {
            self.mem_busy = false;
            self.dcache.populate(addr, &self.ram);
            return Ok(Access::Ready(self.cached_data(addr)?));
        }
        self.d_timer -= 1;
        Ok(Access::Busy(BusyAt::Mem))
    }

    /// Writes `value` to `address`: write-through into the data cache plus
    /// an entry in the write buffer. Follows the same miss/stall protocol
    /// as [`fetch_data`](Self::fetch_data); a miss fills the block first.
    pub fn write_word(&mut self, value: i32, address: i32) -> Result<Access<()>, SimError> {
        let addr = Self::checked(address)?;

        if self.dcache.hit(addr) {
            self.stats.d_requests += 1;
            self.stats.d_hits += 1;
            let word = Word::Data(value);
            self.dcache.write(word.clone(), addr);
            self.write_buffer.push(word, addr);
            return Ok(Access::Ready(()));
        }
        if self.i_timer != 0 {
            self.i_timer -= 1;
            return Ok(Access::Busy(BusyAt::Mem));
        }
        if self.write_buffer.busy() {
            return Ok(Access::Busy(BusyAt::Mem));
        }
        if !self.mem_busy {
            self.stats.d_requests += 1;
            self.mem_busy = true;
            self.d_timer = self.d_fill_cycles;
            return Ok(Access::Busy(BusyAt::Mem));
        }
        if self.d_timer == 0 {
            self.mem_busy = false;
            self.dcache.populate(addr, &self.ram);
            let word = Word::Data(value);
            self.dcache.write(word.clone(), addr);
            self.write_buffer.push(word, addr);
            return Ok(Access::Ready(()));
        }
        self.d_timer -= 1;
        Ok(Access::Busy(BusyAt::Mem))
    }

    /// Attempts one step of the write-buffer drain. Returns `true` only
    /// when the buffer was already empty. The drain may start only while
    /// both fill timers are idle.
    pub fn drain_write_buffer(&mut self) -> bool {
        let port_idle = self.i_timer == 0 && self.d_timer == 0;
        self.write_buffer.drain_into(&mut self.ram, port_idle)
    }

    /// The padded source text of the instruction at `address`, if that slot
    /// holds one. Bypasses the caches; used to label flush bubbles.
    pub fn peek_text(&self, address: i32) -> Option<String> {
        if address < 0 || address as usize >= defaults::RAM_BYTES {
            return None;
        }
        match &self.ram[address as usize] {
            Some(Word::Inst(inst)) => inst.text.clone(),
            _ => None,
        }
    }

    /// The raw word at `address`, bypassing the caches. Test and driver
    /// visibility into RAM.
    pub fn peek(&self, address: usize) -> Option<&Word> {
        self.ram.get(address).and_then(|slot| slot.as_ref())
    }

    /// True when no write is pending.
    pub fn write_buffer_empty(&self) -> bool {
        self.write_buffer.is_empty()
    }
}
