//! The pipeline engine.
//!
//! [`Cpu`] owns the six-slot pipeline, the clock, the program counter, the
//! register file, the forwarding tables, the memory subsystem, and the
//! output sink. [`Cpu::tick`] advances the machine by exactly one clock
//! cycle:
//!
//! 1. Increment the clock; advance the PC by 4 unless latched.
//! 2. Retire the oldest slot (WB), dump the pipeline if enabled, and emit
//!    the retiree's output line.
//! 3. Attempt one step of the write-buffer drain.
//! 4. Run `MEM, EX3, EX2, EX1, ID` in that order: MEM must see the rows WB
//!    just consumed from, and EX1 must see last tick's EX2 rows, not this
//!    tick's.
//! 5. If the retiree was the synthetic terminator and the write buffer is
//!    empty, report completion.
//! 6. Fetch the next instruction (or enqueue a terminator once the PC is
//!    latched) and stamp its IF exit.
//!
//! A `Stall` from any step inserts a bubble at the stalling position,
//! rewinds the PC, and abandons the rest of the tick; a `Flush` prepends a
//! bubble in place of the discarded speculative fetch.

use std::fmt::Write as _;
use std::io::Write;

use crate::asm::Program;
use crate::common::error::SimError;
use crate::common::reg::RegisterFile;
use crate::config::Config;
use crate::core::pipeline::forwarding::Forwarding;
use crate::core::pipeline::stages::{decode, execute, memory, writeback, StageCtx};
use crate::core::pipeline::{ExecSlot, StageEvent, PIPE_SLOTS, T_ID, T_IF};
use crate::isa::{Instruction, Op};
use crate::mem::{Access, MemorySystem};

/// PC value once a `hlt` has been fetched; stops both fetch and the
/// per-tick increment.
pub const PC_HALTED: i32 = -1;

/// The pipeline engine.
pub struct Cpu {
    /// In-flight slots, newest first: `IF, EX1, EX2, EX3, MEM, WB`.
    pub pipe: Vec<ExecSlot>,
    /// The register file.
    pub regs: RegisterFile,
    /// The forwarding tables.
    pub fwd: Forwarding,
    /// The memory subsystem.
    pub mem: MemorySystem,
    /// Byte address of the next fetch, pre-incremented each tick.
    pub pc: i32,
    /// Ticks elapsed.
    pub clock: u64,
    /// Print the pipeline occupancy line every tick.
    pub dump_pipeline: bool,
    /// Emit per-stage diagnostics to stderr.
    pub trace: bool,
    out: Box<dyn Write>,
}

impl Cpu {
    /// Builds a CPU around an assembled program, writing per-retirement
    /// output to `out`. The pipeline starts as six bubbles and the PC one
    /// slot before the first instruction.
    pub fn new(program: &Program, config: &Config, out: Box<dyn Write>) -> Result<Self, SimError> {
        let mem = MemorySystem::new(&config.memory, &program.instructions, &program.data)?;
        Ok(Self {
            pipe: (0..PIPE_SLOTS).map(|_| ExecSlot::bubble()).collect(),
            regs: RegisterFile::new(),
            fwd: Forwarding::default(),
            mem,
            pc: -4,
            clock: 0,
            dump_pipeline: config.general.dump_pipeline,
            trace: config.general.trace,
            out,
        })
    }

    /// Advances the machine by one tick. Returns `false` once the
    /// terminator has retired with an empty write buffer.
    pub fn tick(&mut self) -> Result<bool, SimError> {
        self.clock += 1;
        if self.pc != PC_HALTED {
            self.pc += 4;
        }

        let mut retiree = self
            .pipe
            .pop()
            .expect("pipeline always holds six slots between ticks");
        {
            let mut ctx = self.stage_ctx();
            writeback::wb_stage(&mut retiree, &mut ctx);
        }

        if self.dump_pipeline {
            self.dump_pipe();
        }
        self.emit_retirement(&retiree)?;

        let buffer_empty = self.mem.drain_write_buffer();

        for pos in (0..PIPE_SLOTS - 1).rev() {
            let (slot, older) = match self.pipe[pos..].split_first_mut() {
                Some(pair) => pair,
                None => break,
            };
            let mut ctx = StageCtx {
                regs: &mut self.regs,
                fwd: &mut self.fwd,
                mem: &mut self.mem,
                pc: &mut self.pc,
                clock: self.clock,
                trace: self.trace,
            };
            let event = match pos {
                4 => memory::mem_stage(slot, &mut ctx)?,
                3 => execute::ex3_stage(slot, &mut ctx),
                2 => execute::ex2_stage(slot, &mut ctx),
                1 => execute::ex1_stage(slot, &mut ctx)?,
                _ => decode::id_stage(slot, older, &mut ctx),
            };
            match event {
                StageEvent::Continue => {}
                StageEvent::Stall(at) => {
                    self.stall(at);
                    return Ok(true);
                }
                StageEvent::Flush { shadow } => {
                    self.pipe.insert(0, ExecSlot::shadow_bubble(shadow));
                    return Ok(true);
                }
            }
        }

        if matches!(retiree.inst.op, Op::Stop) && buffer_empty {
            return Ok(false);
        }

        let next = if self.pc < 0 {
            ExecSlot::new(Instruction::stop())
        } else {
            match self.mem.fetch_instr(self.pc)? {
                Access::Ready(inst) => {
                    if matches!(inst.op, Op::Halt) {
                        // Latch the PC so nothing is fetched past the halt;
                        // the halt itself still drains through the pipeline.
                        self.pc = PC_HALTED;
                    }
                    ExecSlot::new(inst)
                }
                Access::Busy(at) => {
                    self.stall(memory::busy_pos(at));
                    return Ok(true);
                }
            }
        };

        self.pipe.insert(0, next);
        if let Some(head) = self.pipe.first_mut() {
            head.stamp(T_IF, self.clock);
        }

        Ok(true)
    }

    fn stage_ctx(&mut self) -> StageCtx<'_> {
        StageCtx {
            regs: &mut self.regs,
            fwd: &mut self.fwd,
            mem: &mut self.mem,
            pc: &mut self.pc,
            clock: self.clock,
            trace: self.trace,
        }
    }

    /// Inserts a bubble at `pos` and rewinds the PC unless latched.
    fn stall(&mut self, pos: usize) {
        self.pipe.insert(pos, ExecSlot::bubble());
        if self.pc != PC_HALTED {
            self.pc -= 4;
        }
    }

    /// Writes the retiree's output line: five timestamps for ordinary
    /// instructions, two for branches and jumps, the captured source text
    /// alone for flush bubbles, nothing for plain bubbles and the
    /// terminator.
    fn emit_retirement(&mut self, slot: &ExecSlot) -> Result<(), SimError> {
        let t = &slot.times;
        match slot.inst.op {
            Op::Stop => {}
            Op::Nop => {
                if let Some(text) = &slot.inst.text {
                    writeln!(self.out, "{}", text)?;
                }
            }
            Op::Branch { .. } | Op::Jump { .. } => {
                let text = slot.inst.text.as_deref().unwrap_or_default();
                writeln!(self.out, "{} {} {}", text, t[T_IF], t[T_ID])?;
            }
            _ => {
                let text = slot.inst.text.as_deref().unwrap_or_default();
                writeln!(
                    self.out,
                    "{} {} {} {} {} {}",
                    text, t[0], t[1], t[2], t[3], t[4]
                )?;
            }
        }
        Ok(())
    }

    /// Prints the occupancy of the five slots still in flight this tick.
    pub fn dump_pipe(&self) {
        let mut line = String::new();
        for slot in &self.pipe {
            let name = slot.inst.text.as_deref().map(str::trim).unwrap_or("NOP");
            let _ = write!(line, "[{}]  =>  ", name);
        }
        println!("{}", line);
    }

    /// Prints the register file.
    pub fn dump_regs(&self) {
        self.regs.dump();
    }

    /// Appends the cache statistics block to the output sink.
    pub fn write_stats(&mut self) -> Result<(), SimError> {
        self.out.write_all(self.mem.stats.report().as_bytes())?;
        Ok(())
    }

    /// Flushes the output sink.
    pub fn flush_output(&mut self) -> Result<(), SimError> {
        self.out.flush()?;
        Ok(())
    }
}
