//! Simulation driver.
//!
//! [`Simulator`] wires an assembled program into a [`Cpu`] and runs the
//! tick loop to completion, appending the cache statistics block once the
//! machine reports done. On an error the output written so far is flushed
//! and the statistics block is withheld.

/// Program loading.
pub mod loader;

use std::io::Write;

use crate::asm::Program;
use crate::common::error::SimError;
use crate::config::Config;
use crate::core::Cpu;

/// Owns a [`Cpu`] and drives it to termination.
pub struct Simulator {
    /// The machine under simulation.
    pub cpu: Cpu,
}

impl Simulator {
    /// Builds a simulator for `program`, writing output to `out`.
    pub fn new(program: &Program, config: &Config, out: Box<dyn Write>) -> Result<Self, SimError> {
        Ok(Self {
            cpu: Cpu::new(program, config, out)?,
        })
    }

    /// Runs to completion. On success the statistics block has been
    /// appended and the sink flushed.
    pub fn run(&mut self) -> Result<(), SimError> {
        loop {
            match self.cpu.tick() {
                Ok(true) => {}
                Ok(false) => break,
                Err(e) => {
                    let _ = self.cpu.flush_output();
                    return Err(e);
                }
            }
        }
        self.cpu.write_stats()?;
        self.cpu.flush_output()
    }
}
